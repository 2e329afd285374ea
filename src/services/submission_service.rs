// src/services/submission_service.rs

use std::{str::FromStr, sync::Arc, time::Duration};

use serde_json::json;

use crate::{
    common::logging::{log, LogLevel},
    models::{
        forms::FormPayload,
        settings::{is_plausible_webhook_url, EndpointConfig},
        submission::{FailureKind, FallbackLink, SubmissionResult, SubmissionState},
    },
    services::{
        sheets_transport::{SheetTransport, TransportReply},
        whatsapp_service::WhatsAppFallback,
    },
};

const CONFIG_ERROR_MESSAGE: &str =
    "URL do webhook não configurada ou inválida. Por favor, configure o webhook nas configurações.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    // RETRY_DELAY entre todas as tentativas
    Flat,
    // RETRY_DELAY * número da tentativa
    Linear,
}

impl FromStr for Backoff {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Backoff::Flat),
            "linear" => Ok(Backoff::Linear),
            other => anyhow::bail!("RETRY_BACKOFF desconhecido: {other} (use flat ou linear)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub backoff: Backoff,
    // Se uma falha lógica do servidor também consome o orçamento de tentativas.
    pub retry_logical_failures: bool,
    // Falha final já entrega o link do WhatsApp como "enviado".
    pub auto_fallback: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            backoff: Backoff::Linear,
            retry_logical_failures: false,
            auto_fallback: false,
        }
    }
}

impl RetryPolicy {
    /// Espera depois da tentativa `attempt` (1-based), antes da próxima.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Flat => self.retry_delay,
            Backoff::Linear => self.retry_delay.saturating_mul(attempt),
        }
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

fn transition(state: &mut SubmissionState, next: SubmissionState) {
    tracing::debug!(from = ?state, to = ?next, "estado do envio");
    *state = next;
}

#[derive(Clone)]
pub struct SubmissionService {
    transport: Arc<dyn SheetTransport>,
    policy: RetryPolicy,
    fallback: WhatsAppFallback,
    sheet_view_url: Option<String>,
}

impl SubmissionService {
    pub fn new(
        transport: Arc<dyn SheetTransport>,
        policy: RetryPolicy,
        fallback: WhatsAppFallback,
        sheet_view_url: Option<String>,
    ) -> Self {
        Self { transport, policy, fallback, sheet_view_url }
    }

    /// Link de fallback disparado pelo próprio usuário.
    pub fn fallback_link(&self, payload: &FormPayload) -> FallbackLink {
        log(LogLevel::Info, "Redirecionando para envio via WhatsApp", Some(&payload.summary()));
        FallbackLink {
            url: self.fallback.link(payload),
            state: SubmissionState::FallbackSent,
        }
    }

    /// Executa o pipeline completo. Depende apenas dos argumentos e da política.
    pub async fn submit(&self, payload: &FormPayload, endpoint: &EndpointConfig) -> SubmissionResult {
        let mut state = SubmissionState::Idle;
        let form_type = payload.form_type();
        let url = endpoint.resolve(form_type);

        // Pré-condição: sem URL válida não há nenhuma chamada de rede.
        if !is_plausible_webhook_url(url) {
            log(
                LogLevel::Warn,
                "URL do webhook não configurada ou inválida",
                Some(&json!({ "formType": form_type })),
            );
            transition(&mut state, SubmissionState::Failed);
            let result = SubmissionResult::failed(FailureKind::Configuration, CONFIG_ERROR_MESSAGE, 0);
            return self.offer_fallback(result, payload);
        }

        transition(&mut state, SubmissionState::Submitting);
        log(LogLevel::Info, &format!("Formulário de {form_type} - Submissão iniciada"), Some(&payload.summary()));

        let max = self.policy.attempts();
        let mut errors: Vec<String> = Vec::new();
        let mut last_kind = FailureKind::Transport;

        for attempt in 1..=max {
            log(LogLevel::Info, &format!("Formulário de {form_type} - Tentativa {attempt}/{max} de envio"), None);

            match self.transport.deliver(url, payload).await {
                Ok(reply) => {
                    transition(&mut state, SubmissionState::Succeeded);
                    log(LogLevel::Info, &format!("Formulário de {form_type} - Envio bem-sucedido"), None);
                    return self.succeeded(reply, attempt);
                }
                Err(err) => {
                    log(
                        LogLevel::Warn,
                        &format!("Formulário de {form_type} - Erro na tentativa {attempt}"),
                        Some(&json!({ "erro": err.to_string() })),
                    );
                    errors.push(format!("tentativa {attempt}: {err}"));

                    if err.is_transport_class() {
                        last_kind = FailureKind::Transport;
                    } else {
                        last_kind = FailureKind::Logical;
                        // Rejeição determinística: não gasta as tentativas restantes.
                        if !self.policy.retry_logical_failures {
                            transition(&mut state, SubmissionState::Failed);
                            let result = SubmissionResult::failed(
                                FailureKind::Logical,
                                format!("Erro ao enviar para a planilha: {err}"),
                                attempt,
                            );
                            return self.offer_fallback(result, payload);
                        }
                    }
                }
            }

            if attempt < max {
                tokio::time::sleep(self.policy.delay_after(attempt)).await;
            }
        }

        transition(&mut state, SubmissionState::Failed);
        let message = format!(
            "Erro ao enviar para a planilha após {max} tentativas: {}",
            errors.join("; ")
        );
        log(LogLevel::Warn, &format!("Formulário de {form_type} - Falha no envio"), Some(&json!({ "errorMsg": message })));

        let result = SubmissionResult::failed(last_kind, message, max);
        self.offer_fallback(result, payload)
    }

    fn succeeded(&self, reply: TransportReply, attempts: u32) -> SubmissionResult {
        let mut result = SubmissionResult::succeeded(reply.message, attempts);
        if let Some(sheet_url) = &self.sheet_view_url {
            result.redirect_hint = Some(true);
            result.sheet_url = Some(sheet_url.clone());
        }
        result
    }

    // Falha terminal: os dados do formulário são preservados e o WhatsApp é oferecido.
    fn offer_fallback(&self, mut result: SubmissionResult, payload: &FormPayload) -> SubmissionResult {
        result.fallback_url = Some(self.fallback.link(payload));

        if self.policy.auto_fallback {
            log(LogLevel::Info, "Ativando fallback para WhatsApp", Some(&payload.summary()));
            result.state = SubmissionState::FallbackSent;
            result.message.push_str(" Dados enviados para WhatsApp como alternativa.");
        } else {
            result.state = SubmissionState::FallbackOffered;
            result.message.push_str(" Você pode enviar os dados pelo WhatsApp.");
        }
        result
    }
}
