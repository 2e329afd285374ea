// src/db/config_repo.rs

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use tokio::sync::Mutex;

use crate::{
    common::{
        error::AppError,
        logging::{LogLevel, LogSettings},
    },
    models::{
        forms::FormType,
        settings::{is_plausible_webhook_url, EndpointConfig},
    },
};

pub const KEY_WEBHOOK_URL: &str = "google_sheets_webhook_url";
pub const KEY_WEBHOOK_URL_LEAD: &str = "google_sheets_webhook_url_lead";
pub const KEY_WEBHOOK_URL_CLIENTE: &str = "google_sheets_webhook_url_cliente";
pub const KEY_LOG_LEVEL: &str = "log_level";
pub const KEY_LOG_ENABLED: &str = "log_enabled";

fn form_key(form_type: FormType) -> &'static str {
    match form_type {
        FormType::Cliente => KEY_WEBHOOK_URL_CLIENTE,
        FormType::Lead => KEY_WEBHOOK_URL_LEAD,
    }
}

fn persist(path: &Path, json: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)
}

/// Armazenamento chave/valor persistido num arquivo JSON. Compartilhado pelo
/// processo inteiro; sobrevive a reinícios.
#[derive(Clone)]
pub struct ConfigRepository {
    path: PathBuf,
    entries: Arc<RwLock<BTreeMap<String, String>>>,
    // Um gravador por vez.
    writer: Arc<Mutex<()>>,
}

impl ConfigRepository {
    /// Abre o arquivo, se existir. Arquivo ausente = armazenamento vazio.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };

        tracing::info!("🗂️ Configurações carregadas de {} ({} chaves)", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Arc::new(RwLock::new(entries)),
            writer: Arc::new(Mutex::new(())),
        })
    }

    fn read(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    // A mudança é aplicada numa cópia; a memória só muda depois que o arquivo
    // foi gravado.
    async fn write<F>(&self, change: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _writer = self.writer.lock().await;

        let mut next = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        change(&mut next);

        let json = serde_json::to_string_pretty(&next)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist(&path, &json))
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao gravar as configurações: {e}"))??;

        *self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = next;
        Ok(())
    }

    // =========================================================================
    //  URL DO WEBHOOK
    // =========================================================================

    /// URL padrão salva, ou `""`.
    pub fn get(&self) -> String {
        self.read(KEY_WEBHOOK_URL).unwrap_or_default()
    }

    /// Entrada em branco é ignorada.
    pub async fn set(&self, url: &str) -> Result<(), AppError> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(());
        }

        self.write(|entries| {
            entries.insert(KEY_WEBHOOK_URL.to_string(), url.to_string());
        })
        .await?;
        tracing::info!("URL do webhook atualizada");
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        is_plausible_webhook_url(&self.get())
    }

    pub fn form_url(&self, form_type: FormType) -> Option<String> {
        self.read(form_key(form_type)).filter(|url| !url.trim().is_empty())
    }

    /// URL específica do tipo de formulário. Em branco remove o override.
    pub async fn set_form_url(&self, form_type: FormType, url: &str) -> Result<(), AppError> {
        let url = url.trim();
        self.write(|entries| {
            if url.is_empty() {
                entries.remove(form_key(form_type));
            } else {
                entries.insert(form_key(form_type).to_string(), url.to_string());
            }
        })
        .await
    }

    pub fn endpoint_config(&self) -> EndpointConfig {
        EndpointConfig {
            default_url: self.get(),
            cliente_url: self.form_url(FormType::Cliente),
            lead_url: self.form_url(FormType::Lead),
        }
    }

    /// Usa a URL do ambiente só se nada tiver sido salvo ainda.
    pub async fn seed_default(&self, url: Option<&str>) -> Result<(), AppError> {
        match url {
            Some(url) if self.get().is_empty() && !url.trim().is_empty() => {
                tracing::info!("URL do webhook inicializada a partir de GOOGLE_SHEETS_URL");
                self.set(url).await
            }
            _ => Ok(()),
        }
    }

    // =========================================================================
    //  LOG
    // =========================================================================

    /// Configuração de log salva; valores ausentes ou ilegíveis ficam com o `fallback`.
    pub fn log_settings(&self, fallback: LogSettings) -> LogSettings {
        let level = self
            .read(KEY_LOG_LEVEL)
            .and_then(|raw| raw.parse::<LogLevel>().ok())
            .unwrap_or(fallback.level);
        let enabled = self
            .read(KEY_LOG_ENABLED)
            .and_then(|raw| raw.parse::<bool>().ok())
            .unwrap_or(fallback.enabled);

        LogSettings { enabled, level }
    }

    pub async fn set_log_settings(&self, settings: LogSettings) -> Result<(), AppError> {
        self.write(|entries| {
            entries.insert(KEY_LOG_LEVEL.to_string(), settings.level.to_string());
            entries.insert(KEY_LOG_ENABLED.to_string(), settings.enabled.to_string());
        })
        .await
    }
}
