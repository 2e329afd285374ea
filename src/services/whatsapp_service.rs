// src/services/whatsapp_service.rs

use std::fmt::Write;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::models::forms::{CustomerRecord, FormPayload, LeadRecord};

// Mesmo conjunto do `encodeURIComponent`: espaço vira %20, nunca `+`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const FALLBACK_DISCLAIMER: &str = "⚠️ *DADOS ENVIADOS AUTOMATICAMENTE COMO FALLBACK* ⚠️";

/// Monta o link `wa.me` com o resumo do formulário já preenchido.
#[derive(Debug, Clone)]
pub struct WhatsAppFallback {
    number: String,
}

impl WhatsAppFallback {
    pub fn new(number: impl Into<String>) -> Self {
        let number: String = number.into();
        Self {
            number: number.chars().filter(|c| c.is_ascii_digit()).collect(),
        }
    }

    pub fn link(&self, payload: &FormPayload) -> String {
        let text = message(payload);
        format!(
            "https://wa.me/{}?text={}",
            self.number,
            utf8_percent_encode(&text, URI_COMPONENT)
        )
    }
}

fn line(out: &mut String, emoji: &str, label: &str, value: &str) {
    let _ = writeln!(out, "{emoji} *{label}:* {value}");
}

fn optional_line(out: &mut String, emoji: &str, label: &str, value: &str) {
    if !value.trim().is_empty() {
        line(out, emoji, label, value);
    }
}

fn customer_message(out: &mut String, c: &CustomerRecord) {
    out.push_str("CLIENTE*\n\n");
    line(out, "👤", "Nome", &c.nome);
    optional_line(out, "🆔", "CPF", &c.cpf);
    line(out, "📱", "Telefone", &c.telefone);
    line(out, "⚧", "Gênero", &c.genero);
    line(out, "📦", "Produto", &format!("{} {}", c.linha, c.tipo));
    line(out, "🎨", "Cor", &c.cor);
    line(out, "📏", "Tamanho", &c.tamanho);
    line(out, "💰", "Valor", &c.valor);
    line(out, "💳", "Forma Pagamento", &c.forma_pagamento);
    optional_line(out, "📍", "Localização", &c.localizacao);
    line(out, "🚚", "Frete", &c.frete);
    line(out, "📅", "Data Pagamento", &c.data_pagamento);
    line(out, "📅", "Data Entrega", &c.data_entrega);
    line(out, "💵", "Valor Total", &c.valor_total);
    optional_line(out, "📝", "Observação", &c.observacao);
}

fn lead_message(out: &mut String, l: &LeadRecord) {
    out.push_str("LEAD*\n\n");
    line(out, "👤", "Nome", &l.nome);
    line(out, "📱", "Telefone", &l.telefone);
    optional_line(out, "📸", "Instagram", &l.instagram);
    line(out, "🎯", "Interesse", &l.interesse);
    line(out, "🚩", "Status", &l.status_lead);
    line(out, "📅", "Data Lembrete", &l.data_lembrete);
    line(out, "🔔", "Motivo Lembrete", &l.motivo_lembrete);
    optional_line(out, "📝", "Observações", &l.observacoes);
}

/// Texto (ainda não codificado) enviado ao WhatsApp.
pub fn message(payload: &FormPayload) -> String {
    let mut out = String::from("📋 *DADOS DO ");

    match payload {
        FormPayload::Cliente(c) => customer_message(&mut out, c),
        FormPayload::Lead(l) => lead_message(&mut out, l),
    }

    out.push('\n');
    out.push_str(FALLBACK_DISCLAIMER);
    out
}
