// src/handlers/settings.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{
        error::AppError,
        logging::{LogLevel, LogSettings},
    },
    config::AppState,
    models::{
        forms::FormType,
        settings::{is_plausible_webhook_url, SettingsView, UpdateSettingsRequest},
    },
};

fn current_view(app_state: &AppState) -> SettingsView {
    let repo = &app_state.config_repo;
    let log = app_state.log_control.current();

    SettingsView {
        webhook_url: repo.get(),
        cliente_webhook_url: repo.form_url(FormType::Cliente),
        lead_webhook_url: repo.form_url(FormType::Lead),
        configured: repo.is_configured(),
        log_enabled: log.enabled,
        log_level: log.level,
    }
}

// Em branco = "não mexer" (URL padrão) ou "remover override" (por tipo).
fn check_url(url: Option<&str>) -> Result<(), AppError> {
    match url.map(str::trim) {
        Some(url) if !url.is_empty() && !is_plausible_webhook_url(url) => Err(AppError::InvalidWebhookUrl),
        _ => Ok(()),
    }
}

// GET /api/settings
pub async fn get_settings(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok((StatusCode::OK, Json(current_view(&app_state))))
}

// PUT /api/settings
pub async fn update_settings(
    State(app_state): State<AppState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Valida tudo antes de gravar qualquer coisa.
    check_url(payload.webhook_url.as_deref())?;
    check_url(payload.cliente_webhook_url.as_deref())?;
    check_url(payload.lead_webhook_url.as_deref())?;

    let current = app_state.log_control.current();
    let level = match payload.log_level.as_deref() {
        Some(raw) => raw.parse::<LogLevel>()?,
        None => current.level,
    };
    let log = LogSettings {
        enabled: payload.log_enabled.unwrap_or(current.enabled),
        level,
    };

    let repo = &app_state.config_repo;
    if let Some(url) = payload.webhook_url.as_deref() {
        repo.set(url).await?;
    }
    if let Some(url) = payload.cliente_webhook_url.as_deref() {
        repo.set_form_url(FormType::Cliente, url).await?;
    }
    if let Some(url) = payload.lead_webhook_url.as_deref() {
        repo.set_form_url(FormType::Lead, url).await?;
    }

    if log != current {
        repo.set_log_settings(log).await?;
        app_state.log_control.apply(log)?;
        tracing::info!("Configuração de log atualizada: ativo={} nível={}", log.enabled, log.level);
    }

    Ok((StatusCode::OK, Json(current_view(&app_state))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app,
        handlers::tests::{send, test_state},
    };
    use serde_json::json;
    use tempfile::TempDir;

    const URL: &str = "https://script.google.com/macros/s/abc/exec";

    #[tokio::test]
    async fn fresh_store_reports_unconfigured() {
        let dir = TempDir::new().unwrap();
        let (state, _) = test_state(&dir, None).await;

        let (status, view) = send(app(state), "GET", "/api/settings", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["webhookUrl"], "");
        assert_eq!(view["configured"], false);
        assert_eq!(view["logLevel"], "info");
        assert_eq!(view["logEnabled"], true);
    }

    #[tokio::test]
    async fn saves_url_and_log_settings() {
        let dir = TempDir::new().unwrap();
        let (state, _) = test_state(&dir, None).await;

        let body = json!({
            "webhookUrl": URL,
            "leadWebhookUrl": "https://script.google.com/macros/s/lead/exec",
            "logLevel": "warning",
            "logEnabled": false
        });
        let (status, view) = send(app(state.clone()), "PUT", "/api/settings", Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["webhookUrl"], URL);
        assert_eq!(view["leadWebhookUrl"], "https://script.google.com/macros/s/lead/exec");
        assert_eq!(view["configured"], true);
        assert_eq!(view["logLevel"], "warn");
        assert_eq!(view["logEnabled"], false);

        assert_eq!(state.log_control.current(), LogSettings { enabled: false, level: LogLevel::Warn });
        assert_eq!(state.config_repo.get(), URL);
    }

    #[tokio::test]
    async fn malformed_url_is_rejected_without_writing() {
        let dir = TempDir::new().unwrap();
        let (state, _) = test_state(&dir, None).await;

        let body = json!({ "webhookUrl": URL, "clienteWebhookUrl": "http://example.com/exec" });
        let (status, response) = send(app(state.clone()), "PUT", "/api/settings", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], "Por favor, forneça uma URL válida do Google Apps Script.");
        assert_eq!(state.config_repo.get(), "");
    }

    #[tokio::test]
    async fn unknown_log_level_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let (state, _) = test_state(&dir, None).await;

        let body = json!({ "logLevel": "verbose" });
        let (status, _) = send(app(state), "PUT", "/api/settings", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
