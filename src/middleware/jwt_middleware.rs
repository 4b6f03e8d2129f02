/// JWT Authentication Middleware
///
/// Validates the Bearer access token of a request against the role the
/// route belongs to and injects the claims into request extensions, where
/// handlers pick them up as `web::ReqData<Claims<R::Flags>>`.
use std::marker::PhantomData;
use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;

use crate::accounts::Role;
use crate::auth::{Claims, TokenIssuer};
use crate::error::{AppError, AuthError};

/// JWT middleware for protecting the routes of one role
pub struct JwtMiddleware<R: Role> {
    tokens: TokenIssuer,
    role: PhantomData<R>,
}

impl<R: Role> JwtMiddleware<R> {
    pub fn new(tokens: TokenIssuer) -> Self {
        Self {
            tokens,
            role: PhantomData,
        }
    }
}

impl<S, B, R> Transform<S, ServiceRequest> for JwtMiddleware<R>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    R: Role,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S, R>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
            role: PhantomData,
        }))
    }
}

pub struct JwtMiddlewareService<S, R: Role> {
    service: Rc<S>,
    tokens: TokenIssuer,
    role: PhantomData<R>,
}

impl<S, R: Role> JwtMiddlewareService<S, R> {
    fn authenticate(&self, req: &ServiceRequest) -> Result<Claims<R::Flags>, AuthError> {
        let token = bearer_token(req).ok_or(AuthError::MissingToken)?;
        let claims: Claims<R::Flags> = self.tokens.verify_access(token)?;

        // an admin token must not open author routes and vice versa
        if claims.role != R::KIND {
            return Err(AuthError::TokenInvalid);
        }
        Ok(claims)
    }
}

impl<S, B, R> Service<ServiceRequest> for JwtMiddlewareService<S, R>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    R: Role,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.authenticate(&req) {
            Ok(claims) => {
                tracing::debug!(
                    account_id = %claims.sub,
                    role = %claims.role,
                    "JWT validated successfully"
                );
                req.extensions_mut().insert(claims);

                let service = Rc::clone(&self.service);
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(path = %req.path(), "JWT validation failed: {}", e);
                Box::pin(async move { Err(AppError::from(e).into()) })
            }
        }
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
