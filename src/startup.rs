use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};

use crate::accounts::{AccountStore, Admin, Author};
use crate::auth::TokenIssuer;
use crate::configuration::Settings;
use crate::email_client::Mailer;
use crate::logger::LoggerMiddleware;
use crate::routes::{configure_role, health_check};
use crate::service::AccountService;

/// Build the HTTP server on an already bound listener.
///
/// Both roles share one store, one mailer and one token issuer; each gets its
/// own `AccountService` registered as app data.
pub fn run(
    listener: TcpListener,
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn Mailer>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let tokens = TokenIssuer::new(settings.jwt.clone());
    let api_url = settings.application.api_url.clone();

    let admins = web::Data::new(AccountService::<Admin>::new(
        Arc::clone(&store),
        Arc::clone(&mailer),
        tokens.clone(),
        api_url.clone(),
    ));
    let authors = web::Data::new(AccountService::<Author>::new(store, mailer, tokens.clone(), api_url));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .app_data(admins.clone())
            .app_data(authors.clone())
            .route("/health_check", web::get().to(health_check))
            .service(web::scope("/api/admin").configure(configure_role::<Admin>(tokens.clone())))
            .service(web::scope("/api/author").configure(configure_role::<Author>(tokens.clone())))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
