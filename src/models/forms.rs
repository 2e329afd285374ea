// src/models/forms.rs

use std::{fmt, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

// --- ENUMS ---

// Discriminador enviado ao Apps Script: decide a aba da planilha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormType {
    Cliente,
    Lead,
}

impl FormType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Cliente => "cliente",
            FormType::Lead => "lead",
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const GENEROS: [&str; 3] = ["Masculino", "Feminino", "Outro"];
pub const FORMAS_PAGAMENTO: [&str; 4] = ["PIX", "Débito", "Crédito", "Dinheiro"];
pub const STATUS_LEAD: [&str; 4] = ["Novo", "Em negociação", "Qualificado", "Não qualificado"];

// Valor do select de cupom/juros que libera o campo de texto livre.
pub const PERSONALIZADO: &str = "Personalizado";

// Formato das datas no momento do envio (não no momento da captura).
pub const SUBMISSION_DATE_FORMAT: &str = "%d/%m/%y";

// --- VALIDADORES ---

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{2}\) \d{5}-\d{4}$").expect("regex de telefone"));
static CPF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}\.\d{3}\.\d{3}-\d{2}$").expect("regex de CPF"));

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(value) {
        return Ok(());
    }
    Err(invalid("regex", "Telefone inválido"))
}

// CPF é opcional: vazio conta como ausente.
fn validate_cpf(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || CPF_RE.is_match(value) {
        return Ok(());
    }
    Err(invalid("regex", "CPF inválido"))
}

fn validate_genero(value: &str) -> Result<(), ValidationError> {
    if GENEROS.contains(&value) {
        return Ok(());
    }
    Err(invalid("enum", "Gênero deve ser Masculino, Feminino ou Outro"))
}

fn validate_forma_pagamento(value: &str) -> Result<(), ValidationError> {
    if FORMAS_PAGAMENTO.contains(&value) {
        return Ok(());
    }
    Err(invalid("enum", "Forma de pagamento deve ser PIX, Débito, Crédito ou Dinheiro"))
}

fn validate_status_lead(value: &str) -> Result<(), ValidationError> {
    if STATUS_LEAD.contains(&value) {
        return Ok(());
    }
    Err(invalid("enum", "Status do lead inválido"))
}

// Aceita o ISO do seletor de datas ("2025-03-15", com ou sem horário) e a
// máscara digitada ("15/03/25" ou "15/03/2025").
fn deserialize_flexible_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    let parsed = if raw.contains('-') {
        let day = raw.split('T').next().unwrap_or(&raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
    } else if raw.len() == 8 {
        NaiveDate::parse_from_str(&raw, "%d/%m/%y")
    } else {
        NaiveDate::parse_from_str(&raw, "%d/%m/%Y")
    };

    parsed
        .map(Some)
        .map_err(|_| de::Error::custom(format!("data inválida: {raw}")))
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(SUBMISSION_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn non_blank(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

// O texto livre substitui o marcador "Personalizado" no envio.
fn resolve_custom(selected: String, custom: Option<String>) -> String {
    if selected == PERSONALIZADO {
        non_blank(custom)
    } else {
        selected
    }
}

// --- CLIENTE ---

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerSubmission {
    #[validate(length(min = 3, message = "Nome deve ter pelo menos 3 caracteres"))]
    pub nome: String,

    #[validate(custom(function = "validate_cpf"))]
    pub cpf: Option<String>,

    #[validate(custom(function = "validate_phone"))]
    pub telefone: String,

    #[validate(custom(function = "validate_genero"))]
    pub genero: String,

    #[validate(length(min = 1, message = "Linha é obrigatória"))]
    pub linha: String,

    #[validate(length(min = 1, message = "Tipo é obrigatório"))]
    pub tipo: String,

    #[validate(length(min = 1, message = "Cor é obrigatória"))]
    pub cor: String,

    #[validate(length(min = 1, message = "Tamanho é obrigatório"))]
    pub tamanho: String,

    #[validate(length(min = 1, message = "Valor é obrigatório"))]
    pub valor: String,

    #[validate(custom(function = "validate_forma_pagamento"))]
    pub forma_pagamento: String,

    // Ex: "5x com juros"
    pub parcelamento: String,
    pub juros_aplicado: String,
    pub juros_personalizado: Option<String>,

    // Ex: "10% OFF" ou "Personalizado"
    pub cupom: String,
    pub cupom_personalizado: Option<String>,

    pub localizacao: Option<String>,

    #[validate(length(min = 1, message = "Frete é obrigatório"))]
    pub frete: String,

    #[validate(required(message = "Data de pagamento é obrigatória"))]
    #[serde(deserialize_with = "deserialize_flexible_date")]
    pub data_pagamento: Option<NaiveDate>,

    #[validate(required(message = "Data de entrega é obrigatória"))]
    #[serde(deserialize_with = "deserialize_flexible_date")]
    pub data_entrega: Option<NaiveDate>,

    pub observacao: Option<String>,
}

/// Linha de cliente como o Apps Script espera receber (datas já formatadas).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub nome: String,
    pub cpf: String,
    pub telefone: String,
    pub genero: String,
    pub linha: String,
    pub tipo: String,
    pub cor: String,
    pub tamanho: String,
    pub valor: String,
    pub forma_pagamento: String,
    pub parcelamento: String,
    pub juros_aplicado: String,
    pub cupom: String,
    pub localizacao: String,
    pub frete: String,
    pub data_pagamento: String,
    pub data_entrega: String,
    pub valor_total: String,
    pub observacao: String,
}

impl CustomerSubmission {
    /// `valor_total` vem sempre do cálculo do servidor, nunca do cliente.
    pub fn into_record(self, valor_total: String) -> CustomerRecord {
        CustomerRecord {
            data_pagamento: format_date(self.data_pagamento),
            data_entrega: format_date(self.data_entrega),
            cupom: resolve_custom(self.cupom, self.cupom_personalizado),
            juros_aplicado: resolve_custom(self.juros_aplicado, self.juros_personalizado),
            nome: self.nome.trim().to_string(),
            cpf: non_blank(self.cpf),
            telefone: self.telefone,
            genero: self.genero,
            linha: self.linha,
            tipo: self.tipo,
            cor: self.cor,
            tamanho: self.tamanho,
            valor: self.valor,
            forma_pagamento: self.forma_pagamento,
            parcelamento: self.parcelamento,
            localizacao: non_blank(self.localizacao),
            frete: self.frete,
            valor_total,
            observacao: non_blank(self.observacao),
        }
    }
}

// --- LEAD ---

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadSubmission {
    #[validate(length(min = 3, message = "Nome deve ter pelo menos 3 caracteres"))]
    pub nome: String,

    #[validate(custom(function = "validate_phone"))]
    pub telefone: String,

    pub instagram: Option<String>,

    #[validate(length(min = 1, message = "Interesse é obrigatório"))]
    pub interesse: String,

    #[validate(custom(function = "validate_status_lead"))]
    pub status_lead: String,

    #[validate(required(message = "Data de lembrete é obrigatória"))]
    #[serde(deserialize_with = "deserialize_flexible_date")]
    pub data_lembrete: Option<NaiveDate>,

    #[validate(length(min = 1, message = "Motivo do lembrete é obrigatório"))]
    pub motivo_lembrete: String,

    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub nome: String,
    pub telefone: String,
    pub instagram: String,
    pub interesse: String,
    pub status_lead: String,
    pub data_lembrete: String,
    pub motivo_lembrete: String,
    pub observacoes: String,
}

impl From<LeadSubmission> for LeadRecord {
    fn from(lead: LeadSubmission) -> Self {
        Self {
            nome: lead.nome.trim().to_string(),
            telefone: lead.telefone,
            instagram: non_blank(lead.instagram),
            interesse: lead.interesse,
            status_lead: lead.status_lead,
            data_lembrete: format_date(lead.data_lembrete),
            motivo_lembrete: lead.motivo_lembrete,
            observacoes: non_blank(lead.observacoes),
        }
    }
}

// --- PAYLOAD ENVIADO ---

/// Corpo do POST para o webhook: todos os campos + `formType`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "formType", rename_all = "lowercase")]
pub enum FormPayload {
    Cliente(CustomerRecord),
    Lead(LeadRecord),
}

impl FormPayload {
    pub fn form_type(&self) -> FormType {
        match self {
            FormPayload::Cliente(_) => FormType::Cliente,
            FormPayload::Lead(_) => FormType::Lead,
        }
    }

    // Só para logs: nunca registra CPF ou observações.
    pub fn summary(&self) -> serde_json::Value {
        match self {
            FormPayload::Cliente(c) => serde_json::json!({
                "formType": "cliente", "nome": c.nome, "telefone": c.telefone, "valorTotal": c.valor_total,
            }),
            FormPayload::Lead(l) => serde_json::json!({
                "formType": "lead", "nome": l.nome, "telefone": l.telefone, "statusLead": l.status_lead,
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn valid_customer() -> CustomerSubmission {
        CustomerSubmission {
            nome: "Maria Souza".into(),
            cpf: Some("123.456.789-01".into()),
            telefone: "(82) 99346-0460".into(),
            genero: "Feminino".into(),
            linha: "Premium".into(),
            tipo: "Camiseta".into(),
            cor: "Preta".into(),
            tamanho: "M".into(),
            valor: "R$ 100,00".into(),
            forma_pagamento: "Crédito".into(),
            parcelamento: "5x com juros".into(),
            cupom: "10% OFF".into(),
            frete: "R$ 15,00".into(),
            data_pagamento: NaiveDate::from_ymd_opt(2025, 3, 15),
            data_entrega: NaiveDate::from_ymd_opt(2025, 3, 20),
            ..Default::default()
        }
    }

    pub(crate) fn valid_lead() -> LeadSubmission {
        LeadSubmission {
            nome: "João Lima".into(),
            telefone: "(82) 98888-7777".into(),
            instagram: Some("@joaolima".into()),
            interesse: "Linha fitness".into(),
            status_lead: "Novo".into(),
            data_lembrete: NaiveDate::from_ymd_opt(2025, 4, 2),
            motivo_lembrete: "Retornar orçamento".into(),
            observacoes: None,
        }
    }

    #[test]
    fn valid_customer_passes() {
        assert!(valid_customer().validate().is_ok());
    }

    #[test]
    fn customer_errors_are_annotated_per_field() {
        let mut customer = valid_customer();
        customer.nome = "Al".into();
        customer.telefone = "82 9999".into();
        customer.genero = "X".into();
        customer.data_entrega = None;

        let errors = customer.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("nome"));
        assert!(fields.contains_key("telefone"));
        assert!(fields.contains_key("genero"));
        assert!(fields.contains_key("data_entrega"));
        assert!(!fields.contains_key("cpf"));
    }

    #[test]
    fn blank_cpf_is_accepted_but_malformed_is_not() {
        let mut customer = valid_customer();
        customer.cpf = Some(String::new());
        assert!(customer.validate().is_ok());

        customer.cpf = Some("123456".into());
        assert!(customer.validate().unwrap_err().field_errors().contains_key("cpf"));
    }

    #[test]
    fn lead_requires_reminder_and_known_status() {
        let mut lead = valid_lead();
        assert!(lead.validate().is_ok());

        lead.status_lead = "Perdido".into();
        lead.data_lembrete = None;
        let errors = lead.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("status_lead"));
        assert!(errors.field_errors().contains_key("data_lembrete"));
    }

    #[test]
    fn payload_carries_form_type_and_formatted_dates() {
        let payload = FormPayload::Cliente(valid_customer().into_record("R$ 110,70".into()));
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["formType"], "cliente");
        assert_eq!(json["dataPagamento"], "15/03/25");
        assert_eq!(json["dataEntrega"], "20/03/25");
        assert_eq!(json["valorTotal"], "R$ 110,70");
        assert_eq!(json["formaPagamento"], "Crédito");
    }

    #[test]
    fn custom_coupon_text_replaces_marker() {
        let mut customer = valid_customer();
        customer.cupom = PERSONALIZADO.into();
        customer.cupom_personalizado = Some("  20% amigo ".into());

        let record = customer.into_record(String::new());
        assert_eq!(record.cupom, "20% amigo");
    }

    #[test]
    fn dates_accept_iso_and_masked_input() {
        let json = serde_json::json!({
            "nome": "Ana Paula",
            "dataPagamento": "2025-03-15T03:00:00.000Z",
            "dataEntrega": "20/03/25",
        });
        let customer: CustomerSubmission = serde_json::from_value(json).unwrap();
        assert_eq!(customer.data_pagamento, NaiveDate::from_ymd_opt(2025, 3, 15));
        assert_eq!(customer.data_entrega, NaiveDate::from_ymd_opt(2025, 3, 20));

        let lead: LeadSubmission =
            serde_json::from_value(serde_json::json!({ "dataLembrete": "02/04/2025" })).unwrap();
        assert_eq!(lead.data_lembrete, NaiveDate::from_ymd_opt(2025, 4, 2));

        let bad = serde_json::from_value::<LeadSubmission>(serde_json::json!({ "dataLembrete": "ontem" }));
        assert!(bad.is_err());
    }

    #[test]
    fn lead_payload_serializes_flat() {
        let payload = FormPayload::Lead(valid_lead().into());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["formType"], "lead");
        assert_eq!(json["dataLembrete"], "02/04/25");
        assert_eq!(json["observacoes"], "");
        assert_eq!(payload.form_type(), FormType::Lead);
    }
}
