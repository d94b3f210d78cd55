pub mod books;
pub mod user_auth;

use crate::config::Config;
use crate::handlers::auth::SessionIssuer;
use crate::handlers::db::Store;
use crate::handlers::token::TokenCodec;
use actix_web::{web, HttpResponse};
use books::config_book_routes;
use std::sync::Arc;
use user_auth::config_user_auth_routes;

/// Shared state plus every route. The token codec is built once at startup
/// and handed to both the session issuer and the auth gates.
pub fn config_app(
    store: Arc<dyn Store>,
    config: Config,
    codec: Arc<TokenCodec>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::from(store))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(SessionIssuer::new(codec.clone())))
            .route(
                "/",
                web::get().to(|| async { HttpResponse::Ok().body("Bookstore API") }),
            );
        config_user_auth_routes(cfg, codec.clone());
        config_book_routes(cfg, codec);
    }
}
