// src/models/submission.rs

use serde::Serialize;

// Idle → Submitting → {Succeeded, Failed}; Failed → FallbackOffered → FallbackSent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded,
    Failed,
    FallbackOffered,
    FallbackSent,
}

// Por que a execução falhou; decide o status HTTP devolvido à interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Configuration,
    Transport,
    Logical,
}

/// Resultado uniforme de uma execução do pipeline, qualquer que tenha sido o transporte.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub success: bool,
    pub message: String,
    pub state: SubmissionState,
    pub attempts: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,

    // Sucesso: a interface pode mostrar o link da planilha.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_hint: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_url: Option<String>,

    // Falha: link wa.me com os dados preenchidos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_url: Option<String>,
}

impl SubmissionResult {
    pub fn succeeded(message: impl Into<String>, attempts: u32) -> Self {
        Self {
            success: true,
            message: message.into(),
            state: SubmissionState::Succeeded,
            attempts,
            failure: None,
            redirect_hint: None,
            sheet_url: None,
            fallback_url: None,
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>, attempts: u32) -> Self {
        Self {
            success: false,
            message: message.into(),
            state: SubmissionState::Failed,
            attempts,
            failure: Some(kind),
            redirect_hint: None,
            sheet_url: None,
            fallback_url: None,
        }
    }
}

/// Link de fallback pedido explicitamente pelo usuário.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackLink {
    pub url: String,
    pub state: SubmissionState,
}
