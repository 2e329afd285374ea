// src/models/settings.rs

use serde::{Deserialize, Serialize};

use crate::{common::logging::LogLevel, models::forms::FormType};

// Fragmento obrigatório na URL do webhook.
pub const EXPECTED_HOST_FRAGMENT: &str = "script.google.com";

/// Checagem de forma usada tanto pelo pipeline quanto pela tela de configurações.
pub fn is_plausible_webhook_url(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && url.starts_with("https://") && url.contains(EXPECTED_HOST_FRAGMENT)
}

/// URLs do webhook: uma padrão e, opcionalmente, uma por tipo de formulário.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    pub default_url: String,
    pub cliente_url: Option<String>,
    pub lead_url: Option<String>,
}

impl EndpointConfig {
    pub fn single(url: impl Into<String>) -> Self {
        Self {
            default_url: url.into(),
            ..Default::default()
        }
    }

    /// URL a usar para o tipo de formulário; o override por tipo vence se preenchido.
    pub fn resolve(&self, form_type: FormType) -> &str {
        let specific = match form_type {
            FormType::Cliente => self.cliente_url.as_deref(),
            FormType::Lead => self.lead_url.as_deref(),
        };

        specific
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(self.default_url.trim())
    }

    pub fn is_configured_for(&self, form_type: FormType) -> bool {
        is_plausible_webhook_url(self.resolve(form_type))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub webhook_url: String,
    pub cliente_webhook_url: Option<String>,
    pub lead_webhook_url: Option<String>,
    pub configured: bool,
    pub log_enabled: bool,
    pub log_level: LogLevel,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub webhook_url: Option<String>,
    pub cliente_webhook_url: Option<String>,
    pub lead_webhook_url: Option<String>,
    pub log_enabled: Option<bool>,
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://script.google.com/macros/s/abc/exec";

    #[test]
    fn shape_check() {
        assert!(is_plausible_webhook_url(URL));
        assert!(!is_plausible_webhook_url(""));
        assert!(!is_plausible_webhook_url("http://script.google.com/macros/s/abc/exec"));
        assert!(!is_plausible_webhook_url("https://example.com/exec"));
    }

    #[test]
    fn per_type_url_overrides_default() {
        let config = EndpointConfig {
            default_url: URL.into(),
            cliente_url: None,
            lead_url: Some("https://script.google.com/macros/s/lead/exec".into()),
        };

        assert_eq!(config.resolve(FormType::Cliente), URL);
        assert_eq!(config.resolve(FormType::Lead), "https://script.google.com/macros/s/lead/exec");
    }

    #[test]
    fn blank_override_falls_back_to_default() {
        let config = EndpointConfig {
            default_url: URL.into(),
            cliente_url: Some("   ".into()),
            lead_url: None,
        };
        assert_eq!(config.resolve(FormType::Cliente), URL);
        assert!(config.is_configured_for(FormType::Cliente));
        assert!(!EndpointConfig::default().is_configured_for(FormType::Lead));
    }
}
