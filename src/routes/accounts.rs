/// Account Routes
///
/// One set of handlers serves both roles; `configure_role::<R>` mounts them
/// under the role's scope. Sessions travel in the `refreshToken` cookie, the
/// access token is returned in the body.
use actix_web::cookie::{time::Duration, Cookie};
use actix_web::{guard, web, HttpMessage, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::accounts::Role;
use crate::auth::{Claims, TokenIssuer, TokenPair};
use crate::error::{AppError, AuthError, ErrorContext};
use crate::logger::RequestId;
use crate::middleware::JwtMiddleware;
use crate::service::{AccountChanges, AccountService, NewAccount};

pub const REFRESH_COOKIE: &str = "refreshToken";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub login: String,
    #[serde(alias = "admin_password", alias = "author_password")]
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgetPasswordRequest {
    #[serde(alias = "admin_email", alias = "author_email")]
    pub email: String,
}

/// Mount the account routes of role `R`.
///
/// Fixed paths are registered before `/{id}` so they are never captured as
/// an id. Only PUT and DELETE on `/{id}` go through the JWT middleware.
pub fn configure_role<R: Role>(tokens: TokenIssuer) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(
            web::resource("")
                .route(web::get().to(list::<R>))
                .route(web::post().to(register::<R>)),
        )
        .route("/login", web::post().to(login::<R>))
        .route("/logout", web::post().to(logout::<R>))
        .route("/refresh", web::get().to(refresh::<R>))
        .route("/activate/{link}", web::get().to(activate::<R>))
        .route("/forgetpassword", web::post().to(forget_password::<R>))
        .service(
            web::resource("/{id}")
                .guard(guard::Any(guard::Put()).or(guard::Delete()))
                .wrap(JwtMiddleware::<R>::new(tokens))
                .route(web::put().to(update::<R>))
                .route(web::delete().to(delete::<R>)),
        )
        .service(web::resource("/{id}").route(web::get().to(get::<R>)));
    }
}

/// GET /api/{role}
pub async fn list<R: Role>(service: web::Data<AccountService<R>>) -> Result<HttpResponse, AppError> {
    let accounts = service.list().await?;
    Ok(HttpResponse::Ok().json(accounts))
}

/// GET /api/{role}/{id}
///
/// # Errors
/// - 400: malformed id
/// - 404: no account of this role with that id
pub async fn get<R: Role>(
    path: web::Path<String>,
    service: web::Data<AccountService<R>>,
) -> Result<HttpResponse, AppError> {
    let account = service.get(&path).await?;
    Ok(HttpResponse::Ok().json(account))
}

/// POST /api/{role}
///
/// Registers a pending account, mails its activation link and opens the
/// first session right away.
///
/// # Errors
/// - 400: invalid email, empty password, missing author nick name
/// - 409: author nick name already taken
/// - 503: activation mail could not be sent
pub async fn register<R: Role>(
    req: HttpRequest,
    form: web::Json<NewAccount<R::Profile>>,
    service: web::Data<AccountService<R>>,
) -> Result<HttpResponse, AppError> {
    let context = request_context(&req, "account_registration");

    let registration = service
        .register(form.into_inner())
        .await
        .map_err(|e| log_failure(&context, e))?;

    tracing::info!(
        request_id = %context.request_id,
        account_id = %registration.account.id,
        role = %R::KIND,
        "Registration completed"
    );

    Ok(HttpResponse::Created()
        .cookie(refresh_cookie(service.get_ref(), &registration.tokens.refresh_token))
        .json(registration))
}

/// POST /api/{role}/login
///
/// # Errors
/// - 401: unknown login or wrong password, indistinguishably
pub async fn login<R: Role>(
    req: HttpRequest,
    form: web::Json<LoginRequest>,
    service: web::Data<AccountService<R>>,
) -> Result<HttpResponse, AppError> {
    let context = request_context(&req, "account_login");

    let tokens = service
        .login(&form.login, &form.password)
        .await
        .map_err(|e| log_failure(&context, e))?;

    Ok(session_response(service.get_ref(), tokens))
}

/// POST /api/{role}/logout
///
/// Ends the session named by the cookie and clears the cookie.
pub async fn logout<R: Role>(
    req: HttpRequest,
    service: web::Data<AccountService<R>>,
) -> Result<HttpResponse, AppError> {
    let token = refresh_token_from(&req)?;
    let account = service.logout(&token).await?;

    let mut removal = Cookie::build(REFRESH_COOKIE, "").path("/").finish();
    removal.make_removal();

    Ok(HttpResponse::Ok().cookie(removal).json(account))
}

/// GET /api/{role}/refresh
///
/// # Errors
/// - 401: missing, invalid, expired or foreign-role token
/// - 404: the token is no longer the account's current one
pub async fn refresh<R: Role>(
    req: HttpRequest,
    service: web::Data<AccountService<R>>,
) -> Result<HttpResponse, AppError> {
    let token = refresh_token_from(&req)?;
    let tokens = service.refresh(&token).await?;
    Ok(session_response(service.get_ref(), tokens))
}

/// GET /api/{role}/activate/{link}
pub async fn activate<R: Role>(
    path: web::Path<String>,
    service: web::Data<AccountService<R>>,
) -> Result<HttpResponse, AppError> {
    let account = service.activate(&path).await?;
    Ok(HttpResponse::Ok().json(account))
}

/// POST /api/{role}/forgetpassword
pub async fn forget_password<R: Role>(
    req: HttpRequest,
    form: web::Json<ForgetPasswordRequest>,
    service: web::Data<AccountService<R>>,
) -> Result<HttpResponse, AppError> {
    let context = request_context(&req, "forget_password");

    service
        .forget_password(&form.email)
        .await
        .map_err(|e| log_failure(&context, e))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "A new password has been sent to your email"
    })))
}

/// PUT /api/{role}/{id}
///
/// Profile fields sit at the top level of the body; absent ones are kept.
pub async fn update<R: Role>(
    path: web::Path<String>,
    form: web::Json<AccountChanges<R::ProfileChanges>>,
    service: web::Data<AccountService<R>>,
) -> Result<HttpResponse, AppError> {
    let account = service.update(&path, form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(account))
}

/// DELETE /api/{role}/{id}
///
/// # Errors
/// - 403: an author deleting someone else's account
/// - 404: nothing to delete
pub async fn delete<R: Role>(
    req: HttpRequest,
    path: web::Path<String>,
    claims: web::ReqData<Claims<R::Flags>>,
    service: web::Data<AccountService<R>>,
) -> Result<HttpResponse, AppError> {
    let actor = claims.account_id()?;
    let context = request_context(&req, "account_delete").with_account_id(actor);

    service
        .delete(&path, actor)
        .await
        .map_err(|e| log_failure(&context, e))?;

    Ok(HttpResponse::NoContent().finish())
}

fn refresh_token_from(req: &HttpRequest) -> Result<String, AppError> {
    req.cookie(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::MissingToken.into())
}

fn refresh_cookie<R: Role>(service: &AccountService<R>, token: &str) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .max_age(Duration::milliseconds(service.token_issuer().settings().refresh_ms))
        .finish()
}

fn session_response<R: Role>(service: &AccountService<R>, tokens: TokenPair) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(refresh_cookie(service, &tokens.refresh_token))
        .json(tokens)
}

fn request_context(req: &HttpRequest, operation: &str) -> ErrorContext {
    let context = ErrorContext::new(operation);
    match req.extensions().get::<RequestId>() {
        Some(id) => context.with_request_id(id.as_str()),
        None => context,
    }
}

fn log_failure(context: &ErrorContext, error: AppError) -> AppError {
    context.log_error(&error);
    error
}
