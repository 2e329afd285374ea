// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    common::logging::{LogControl, LogLevel, LogSettings},
    db::ConfigRepository,
    services::{
        sheets_transport::{
            build_http_client, ArtifactRegistry, AutoTransport, FormPostTransport, JsonPostTransport,
            SheetTransport,
        },
        submission_service::{Backoff, RetryPolicy},
        transport_monitor::MonitoredTransport,
        whatsapp_service::WhatsAppFallback,
        SubmissionService,
    },
};

const DEFAULT_WHATSAPP_NUMBER: &str = "558293460460";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Json,
    Form,
    Auto,
}

impl FromStr for TransportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(TransportKind::Json),
            "form" => Ok(TransportKind::Form),
            "auto" => Ok(TransportKind::Auto),
            other => anyhow::bail!("TRANSPORT desconhecido: {other} (use form, json ou auto)"),
        }
    }
}

/// Configuração lida do ambiente (.env incluído).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub config_store_path: String,
    pub google_sheets_url: Option<String>,
    pub sheet_view_url: Option<String>,
    pub whatsapp_number: String,
    pub retry: RetryPolicy,
    pub transport: TransportKind,
    pub frame_timeout: Duration,
    pub log: LogSettings,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} inválido ({raw}): {e}")),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let retry = RetryPolicy {
            max_retries: parse_var("MAX_RETRIES", 3u32)?,
            retry_delay: Duration::from_millis(parse_var("RETRY_DELAY_MS", 1000u64)?),
            backoff: parse_var("RETRY_BACKOFF", Backoff::Linear)?,
            retry_logical_failures: parse_var("RETRY_ON_LOGICAL_FAILURE", false)?,
            auto_fallback: parse_var("AUTO_FALLBACK", false)?,
        };

        Ok(Self {
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            config_store_path: var_or("CONFIG_STORE_PATH", ".delta-intake.json"),
            google_sheets_url: optional_var("GOOGLE_SHEETS_URL"),
            sheet_view_url: optional_var("SHEET_VIEW_URL"),
            whatsapp_number: var_or("WHATSAPP_NUMBER", DEFAULT_WHATSAPP_NUMBER),
            retry,
            transport: parse_var("TRANSPORT", TransportKind::Form)?,
            frame_timeout: Duration::from_secs(parse_var("FRAME_TIMEOUT_SECS", 60u64)?),
            log: LogSettings {
                enabled: parse_var("LOG_ENABLED", true)?,
                level: parse_var("LOG_LEVEL", LogLevel::Info)?,
            },
        })
    }
}

fn build_transport(config: &AppConfig) -> anyhow::Result<Arc<dyn SheetTransport>> {
    let http = build_http_client(config.frame_timeout).context("Falha ao criar o cliente HTTP")?;
    let json = || JsonPostTransport::new(http.clone(), config.frame_timeout);
    let form = || FormPostTransport::new(http.clone(), config.frame_timeout, ArtifactRegistry::default());

    // No modo auto o monitor fica em cada perna: a falha do JSON é registrada
    // mesmo quando o formulário entrega.
    let transport: Arc<dyn SheetTransport> = match config.transport {
        TransportKind::Json => Arc::new(MonitoredTransport::new(json())),
        TransportKind::Form => Arc::new(MonitoredTransport::new(form())),
        TransportKind::Auto => Arc::new(AutoTransport::new(
            Arc::new(MonitoredTransport::new(json())),
            Arc::new(MonitoredTransport::new(form())),
        )),
    };
    Ok(transport)
}

#[derive(Clone)]
pub struct AppState {
    pub config_repo: ConfigRepository,
    pub submission_service: SubmissionService,
    pub log_control: LogControl,
}

impl AppState {
    pub async fn new(config: &AppConfig, log_control: LogControl) -> anyhow::Result<Self> {
        let config_repo = ConfigRepository::open(&config.config_store_path)
            .with_context(|| format!("Falha ao abrir {}", config.config_store_path))?;
        config_repo.seed_default(config.google_sheets_url.as_deref()).await?;

        // O que foi salvo pela tela de configurações vence o ambiente.
        log_control.apply(config_repo.log_settings(config.log))?;

        let transport = build_transport(config)?;
        tracing::info!("📨 Transporte de envio: {}", transport.name());

        Ok(Self::from_parts(config, config_repo, transport, log_control))
    }

    /// Monta o grafo de dependências a partir de peças já criadas.
    pub fn from_parts(
        config: &AppConfig,
        config_repo: ConfigRepository,
        transport: Arc<dyn SheetTransport>,
        log_control: LogControl,
    ) -> Self {
        let submission_service = SubmissionService::new(
            transport,
            config.retry.clone(),
            WhatsAppFallback::new(&config.whatsapp_number),
            config.sheet_view_url.clone(),
        );

        Self {
            config_repo,
            submission_service,
            log_control,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_kind_parsing() {
        assert_eq!("FORM".parse::<TransportKind>().unwrap(), TransportKind::Form);
        assert_eq!(" auto ".parse::<TransportKind>().unwrap(), TransportKind::Auto);
        assert!("iframe".parse::<TransportKind>().is_err());
    }

    #[test]
    fn every_transport_kind_builds() {
        for (kind, name) in [
            (TransportKind::Json, "json"),
            (TransportKind::Form, "form"),
            (TransportKind::Auto, "auto"),
        ] {
            let dir = tempfile::TempDir::new().unwrap();
            let config = AppConfig {
                bind_addr: "127.0.0.1:0".into(),
                config_store_path: dir.path().join("config.json").display().to_string(),
                google_sheets_url: None,
                sheet_view_url: None,
                whatsapp_number: DEFAULT_WHATSAPP_NUMBER.into(),
                retry: RetryPolicy::default(),
                transport: kind,
                frame_timeout: Duration::from_secs(5),
                log: LogSettings { enabled: true, level: LogLevel::Info },
            };
            assert_eq!(build_transport(&config).unwrap().name(), name);
        }
    }

    #[test]
    fn absent_variables_use_defaults() {
        assert_eq!(parse_var("DELTA_INTAKE_TESTE_INEXISTENTE", 7u32).unwrap(), 7);
        assert_eq!(var_or("DELTA_INTAKE_TESTE_INEXISTENTE", "padrão"), "padrão");
        assert_eq!(optional_var("DELTA_INTAKE_TESTE_INEXISTENTE"), None);
    }
}
