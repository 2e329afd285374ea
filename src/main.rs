//src/main.rs

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

mod common;
mod config;
mod db;
mod handlers;
mod models;
mod services;

use crate::{
    common::logging::LogControl,
    config::{AppConfig, AppState},
    models::forms::FormType,
};

fn app(app_state: AppState) -> Router {
    let form_routes = Router::new()
        .route("/cliente", post(handlers::forms::submit_cliente))
        .route("/cliente/change", post(handlers::forms::change_cliente))
        .route("/cliente/whatsapp", post(handlers::forms::whatsapp_cliente))
        .route("/lead", post(handlers::forms::submit_lead))
        .route("/lead/change", post(handlers::forms::change_lead))
        .route("/lead/whatsapp", post(handlers::forms::whatsapp_lead));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/forms", form_routes)
        .route(
            "/api/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = AppConfig::from_env()?;

    let log_control = LogControl::init(config.log);
    let app_state = AppState::new(&config, log_control).await?;

    let endpoint = app_state.config_repo.endpoint_config();
    for form_type in [FormType::Cliente, FormType::Lead] {
        if endpoint.is_configured_for(form_type) {
            tracing::info!("✅ Webhook configurado para o formulário de {form_type}");
        } else {
            tracing::warn!("⚠️ Webhook não configurado para {form_type}: os envios vão oferecer o WhatsApp");
        }
    }

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app(app_state)).await?;

    Ok(())
}
