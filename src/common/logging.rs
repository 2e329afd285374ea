// src/common/logging.rs

use std::{
    fmt,
    str::FromStr,
    sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing_subscriber::{
    filter::LevelFilter, fmt as tracing_fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
    Registry,
};

use crate::common::error::AppError;

// Níveis de log em ordem de prioridade (a ordem das variantes é a ordem total).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(AppError::InvalidLogLevel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSettings {
    pub enabled: bool,
    pub level: LogLevel,
}

impl LogSettings {
    // Um registro sai só se o log estiver ligado e o nível for >= o mínimo.
    fn level_filter(&self) -> LevelFilter {
        if !self.enabled {
            return LevelFilter::OFF;
        }
        match self.level {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Controle do filtro global do `tracing`, ajustável em tempo de execução
/// pela tela de configurações.
#[derive(Clone)]
pub struct LogControl {
    settings: Arc<RwLock<LogSettings>>,
    handle: Option<reload::Handle<LevelFilter, Registry>>,
}

impl LogControl {
    /// Instala o subscriber global (formato compacto, sem target, com timestamp).
    pub fn init(settings: LogSettings) -> Self {
        let (filter, handle) = reload::Layer::new(settings.level_filter());

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_fmt::layer().with_target(false).compact())
            .init();

        Self {
            settings: Arc::new(RwLock::new(settings)),
            handle: Some(handle),
        }
    }

    /// Controle sem subscriber global, usado nos testes.
    #[cfg(test)]
    pub fn detached(settings: LogSettings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            handle: None,
        }
    }

    pub fn current(&self) -> LogSettings {
        *self.settings.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn apply(&self, settings: LogSettings) -> Result<(), AppError> {
        if let Some(handle) = &self.handle {
            handle
                .modify(|filter| *filter = settings.level_filter())
                .map_err(|e| anyhow::anyhow!("Falha ao recarregar o filtro de log: {e}"))?;
        }

        *self.settings.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = settings;
        Ok(())
    }
}

fn mentions_cors(message: &str, data: Option<&Value>) -> bool {
    message.contains("CORS") || data.is_some_and(|d| d.to_string().contains("CORS"))
}

/// Registro com dados estruturados anexados. O filtro de nível/ligado é o do
/// subscriber global.
pub fn log(level: LogLevel, message: &str, data: Option<&Value>) {
    // O campo `data` só aparece quando há dados.
    macro_rules! emit {
        ($event:ident) => {
            match data {
                Some(data) => tracing::$event!(data = %data, "{}", message),
                None => tracing::$event!("{}", message),
            }
        };
    }

    match level {
        LogLevel::Debug => emit!(debug),
        LogLevel::Info => emit!(info),
        LogLevel::Warn => emit!(warn),
        LogLevel::Error => emit!(error),
    }

    if mentions_cors(message, data) && level != LogLevel::Warn {
        tracing::warn!("⚠️ Possível problema de CORS detectado! Verificando rede...");
    }
}
