pub mod handlers;

use crate::{config::Config, orchestrator::Orchestrator};
use actix_web::{web, App, HttpServer};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/detect", web::post().to(handlers::detect))
        .route("/chat", web::post().to(handlers::chat));
}

pub async fn run(config: &Config, state: AppState) -> std::io::Result<()> {
    let port = config.port_or_default();
    crate::logger::log_startup_info(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        &config.host,
        port,
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(configure)
    })
    .bind((config.host.as_str(), port))?
    .run()
    .await
}
