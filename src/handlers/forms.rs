// src/handlers/forms.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        forms::{CustomerSubmission, FormPayload, LeadSubmission},
        submission::{FailureKind, SubmissionResult},
    },
    services::{
        draft_service::{CustomerDraft, CustomerField, LeadDraft, LeadField},
        pricing_service::{compute_total, TotalInputs},
    },
};

// =============================================================================
//  ENVIO
// =============================================================================

fn status_for(result: &SubmissionResult) -> StatusCode {
    match result.failure {
        None => StatusCode::CREATED,
        Some(FailureKind::Configuration) => StatusCode::SERVICE_UNAVAILABLE,
        Some(FailureKind::Transport | FailureKind::Logical) => StatusCode::BAD_GATEWAY,
    }
}

async fn run_submission(app_state: &AppState, payload: FormPayload) -> (StatusCode, Json<SubmissionResult>) {
    let endpoint = app_state.config_repo.endpoint_config();
    let result = app_state.submission_service.submit(&payload, &endpoint).await;
    (status_for(&result), Json(result))
}

// valorTotal nunca vem do cliente: é sempre recalculado aqui.
fn customer_payload(customer: CustomerSubmission) -> FormPayload {
    let valor_total = compute_total(&TotalInputs::from(&customer));
    FormPayload::Cliente(customer.into_record(valor_total))
}

// POST /api/forms/cliente
pub async fn submit_cliente(
    State(app_state): State<AppState>,
    Json(payload): Json<CustomerSubmission>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(run_submission(&app_state, customer_payload(payload)).await)
}

// POST /api/forms/lead
pub async fn submit_lead(
    State(app_state): State<AppState>,
    Json(payload): Json<LeadSubmission>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(run_submission(&app_state, FormPayload::Lead(payload.into())).await)
}

// =============================================================================
//  FALLBACK MANUAL (botão "Enviar via WhatsApp")
// =============================================================================

// POST /api/forms/cliente/whatsapp
pub async fn whatsapp_cliente(
    State(app_state): State<AppState>,
    Json(payload): Json<CustomerSubmission>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let link = app_state.submission_service.fallback_link(&customer_payload(payload));
    Ok((StatusCode::OK, Json(link)))
}

// POST /api/forms/lead/whatsapp
pub async fn whatsapp_lead(
    State(app_state): State<AppState>,
    Json(payload): Json<LeadSubmission>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let link = app_state.submission_service.fallback_link(&FormPayload::Lead(payload.into()));
    Ok((StatusCode::OK, Json(link)))
}

// =============================================================================
//  RASCUNHO (máscaras + valor total enquanto o usuário digita)
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerChange {
    #[serde(default)]
    pub draft: CustomerDraft,
    pub field: CustomerField,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadChange {
    #[serde(default)]
    pub draft: LeadDraft,
    pub field: LeadField,
    #[serde(default)]
    pub value: String,
}

// POST /api/forms/cliente/change
pub async fn change_cliente(Json(change): Json<CustomerChange>) -> impl IntoResponse {
    let mut draft = change.draft;
    draft.recompute_total();
    draft.on_change(change.field, &change.value);
    Json(draft)
}

// POST /api/forms/lead/change
pub async fn change_lead(Json(change): Json<LeadChange>) -> impl IntoResponse {
    let mut draft = change.draft;
    draft.on_change(change.field, &change.value);
    Json(draft)
}
