// src/services/sheets_transport.rs

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{header::LOCATION, redirect, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::forms::FormPayload;

// Um Web App do Apps Script que não está publicado para "Qualquer pessoa"
// redireciona para o login do Google: é o equivalente do bloqueio de CORS.
pub const GOOGLE_SIGN_IN_HOST: &str = "accounts.google.com";

const DEFAULT_SUCCESS_MESSAGE: &str = "Dados enviados com sucesso!";
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Falha de rede (network): {0}")]
    Network(String),

    #[error("Requisição bloqueada (CORS): {0}")]
    CrossOrigin(String),

    #[error("Tempo limite de {}s excedido", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("Erro HTTP: {0}")]
    Http(u16),

    #[error("Resposta do servidor não está no formato JSON esperado")]
    InvalidResponse,

    #[error("{0}")]
    Rejected(String),
}

impl TransportError {
    /// Erros de transporte (antes de haver resposta lógica) são repetidos;
    /// os demais são respostas determinísticas do endpoint.
    pub fn is_transport_class(&self) -> bool {
        matches!(
            self,
            TransportError::Network(_) | TransportError::CrossOrigin(_) | TransportError::Timeout(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    pub status: u16,
    pub message: String,
}

#[async_trait]
pub trait SheetTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, url: &str, payload: &FormPayload) -> Result<TransportReply, TransportError>;
}

// O script de exemplo responde `{ result: "success" }`; o publicado responde
// `{ success: true }`. Aceitamos os dois.
#[derive(Debug, Default, Deserialize)]
struct WebhookResponse {
    result: Option<String>,
    success: Option<bool>,
    message: Option<String>,
}

impl WebhookResponse {
    fn is_success(&self) -> bool {
        self.result.as_deref() == Some("success") || self.success == Some(true)
    }

    fn is_explicit_failure(&self) -> bool {
        self.result.as_deref().is_some_and(|r| r != "success") || self.success == Some(false)
    }
}

/// Cliente HTTP compartilhado pelos transportes. Não segue o redirecionamento
/// para a tela de login do Google, para que ele possa ser detectado.
pub fn build_http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    let policy = redirect::Policy::custom(|attempt| {
        if attempt.url().host_str() == Some(GOOGLE_SIGN_IN_HOST) {
            attempt.stop()
        } else if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error("redirecionamentos demais")
        } else {
            attempt.follow()
        }
    });

    let client = reqwest::Client::builder()
        .redirect(policy)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Network(err.to_string())
    }
}

fn sign_in_redirect(status: StatusCode, location: Option<&str>) -> Option<TransportError> {
    let location = location?;
    if status.is_redirection() && location.contains(GOOGLE_SIGN_IN_HOST) {
        return Some(TransportError::CrossOrigin(format!(
            "o Web App redirecionou para o login ({location}); publique-o com acesso para qualquer pessoa"
        )));
    }
    None
}

struct RawResponse {
    status: StatusCode,
    location: Option<String>,
    body: String,
}

async fn read_response(response: reqwest::Response) -> Result<RawResponse, reqwest::Error> {
    let status = response.status();
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = response.text().await?;
    Ok(RawResponse { status, location, body })
}

// =============================================================================
//  POST JSON direto
// =============================================================================

pub struct JsonPostTransport {
    http: reqwest::Client,
    timeout: Duration,
}

impl JsonPostTransport {
    pub fn new(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }
}

#[async_trait]
impl SheetTransport for JsonPostTransport {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn deliver(&self, url: &str, payload: &FormPayload) -> Result<TransportReply, TransportError> {
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| classify(e, self.timeout))?;

        let raw = read_response(response)
            .await
            .map_err(|e| classify(e, self.timeout))?;

        if let Some(err) = sign_in_redirect(raw.status, raw.location.as_deref()) {
            return Err(err);
        }
        if !raw.status.is_success() {
            return Err(TransportError::Http(raw.status.as_u16()));
        }

        let parsed: WebhookResponse =
            serde_json::from_str(&raw.body).map_err(|_| TransportError::InvalidResponse)?;

        if parsed.is_success() {
            Ok(TransportReply {
                status: raw.status.as_u16(),
                message: parsed.message.unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
            })
        } else {
            Err(TransportError::Rejected(
                parsed.message.unwrap_or_else(|| "Erro ao enviar dados".to_string()),
            ))
        }
    }
}

// =============================================================================
//  POST de formulário (campo único `data`)
// =============================================================================

/// Registro dos recursos transitórios (um por tentativa de envio por formulário).
#[derive(Clone, Default)]
pub struct ArtifactRegistry {
    live: Arc<Mutex<HashSet<Uuid>>>,
}

impl ArtifactRegistry {
    pub fn acquire(&self) -> FrameSlot {
        let id = Uuid::new_v4();
        self.live
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id);
        tracing::trace!(%id, "slot de envio criado");
        FrameSlot { id, registry: self.clone() }
    }

    pub fn live(&self) -> usize {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}

/// Liberado no `Drop`, em qualquer caminho de saída (sucesso, erro ou timeout).
pub struct FrameSlot {
    id: Uuid,
    registry: ArtifactRegistry,
}

impl FrameSlot {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for FrameSlot {
    fn drop(&mut self) {
        self.registry
            .live
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.id);
        tracing::trace!(id = %self.id, "slot de envio removido");
    }
}

pub struct FormPostTransport {
    http: reqwest::Client,
    timeout: Duration,
    artifacts: ArtifactRegistry,
}

impl FormPostTransport {
    pub fn new(http: reqwest::Client, timeout: Duration, artifacts: ArtifactRegistry) -> Self {
        Self { http, timeout, artifacts }
    }
}

#[async_trait]
impl SheetTransport for FormPostTransport {
    fn name(&self) -> &'static str {
        "form"
    }

    async fn deliver(&self, url: &str, payload: &FormPayload) -> Result<TransportReply, TransportError> {
        let slot = self.artifacts.acquire();

        let data = serde_json::to_string(payload)
            .map_err(|e| TransportError::Rejected(format!("Falha ao serializar os dados: {e}")))?;

        let exchange = async {
            let response = self.http.post(url).form(&[("data", data)]).send().await?;
            read_response(response).await
        };

        let raw = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
            .map_err(|e| classify(e, self.timeout))?;

        tracing::debug!(
            slot = %slot.id(),
            ativos = self.artifacts.live(),
            status = raw.status.as_u16(),
            "envio por formulário concluído"
        );

        if let Some(err) = sign_in_redirect(raw.status, raw.location.as_deref()) {
            return Err(err);
        }
        if !raw.status.is_success() {
            return Err(TransportError::Http(raw.status.as_u16()));
        }

        // A conclusão do envio já é sinal de sucesso; só um corpo que se declara
        // falha muda isso.
        let parsed: WebhookResponse = serde_json::from_str(&raw.body).unwrap_or_default();
        if parsed.is_explicit_failure() {
            return Err(TransportError::Rejected(
                parsed.message.unwrap_or_else(|| "Erro ao enviar dados".to_string()),
            ));
        }

        Ok(TransportReply {
            status: raw.status.as_u16(),
            message: parsed.message.unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
        })
    }
}

// =============================================================================
//  Automático: JSON primeiro, formulário se o JSON nem chegar ao servidor
// =============================================================================

/// Cada perna é um transporte completo (normalmente já monitorado), então a
/// falha do JSON aparece nos logs mesmo quando o formulário entrega.
pub struct AutoTransport {
    json: Arc<dyn SheetTransport>,
    form: Arc<dyn SheetTransport>,
}

impl AutoTransport {
    pub fn new(json: Arc<dyn SheetTransport>, form: Arc<dyn SheetTransport>) -> Self {
        Self { json, form }
    }
}

#[async_trait]
impl SheetTransport for AutoTransport {
    fn name(&self) -> &'static str {
        "auto"
    }

    async fn deliver(&self, url: &str, payload: &FormPayload) -> Result<TransportReply, TransportError> {
        match self.json.deliver(url, payload).await {
            Err(err) if err.is_transport_class() => {
                tracing::info!(erro = %err, "POST JSON falhou no transporte, tentando por formulário");
                self.form.deliver(url, payload).await
            }
            other => other,
        }
    }
}
