// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Erros da camada HTTP. Falhas de envio para a planilha NÃO passam por aqui:
// elas viram um `SubmissionResult` (ver services::submission_service).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("URL do webhook inválida. Deve ser uma URL segura do Google Apps Script")]
    InvalidWebhookUrl,

    #[error("Nível de log desconhecido: {0}")]
    InvalidLogLevel(String),

    #[error("Erro ao acessar o arquivo de configurações: {0}")]
    ConfigStoreIo(#[from] std::io::Error),

    #[error("Arquivo de configurações corrompido: {0}")]
    ConfigStoreFormat(#[from] serde_json::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidWebhookUrl => (
                StatusCode::BAD_REQUEST,
                "Por favor, forneça uma URL válida do Google Apps Script.".to_string(),
            ),
            AppError::InvalidLogLevel(ref level) => (
                StatusCode::BAD_REQUEST,
                format!("Nível de log inválido: '{level}'. Use debug, info, warn ou error."),
            ),

            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_are_reported_per_field() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("regex");
        err.message = Some("Telefone inválido".into());
        errors.add("telefone", err);

        let response = AppError::ValidationError(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["details"]["telefone"][0], "Telefone inválido");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response = AppError::InternalServerError(anyhow::anyhow!("disco cheio")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Ocorreu um erro inesperado.");
    }
}
