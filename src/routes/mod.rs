// Route exports
pub mod auth;
pub mod dogs;
pub mod health;
pub mod users;

use actix_web::web;
use std::sync::Arc;
use crate::error::{handle_json_payload_error, handle_path_error, handle_query_payload_error};
use crate::services::{AdoptionStore, TokenIssuer};

pub use auth::AuthenticatedUser;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AdoptionStore>,
    pub tokens: Arc<TokenIssuer>,
}

/// Register state, extractor error handlers and every route
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(state))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .configure(configure_routes);
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(health::configure)
            .configure(users::configure)
            .configure(dogs::configure),
    );
}
