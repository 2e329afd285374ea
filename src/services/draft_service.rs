// src/services/draft_service.rs

// Rascunhos dos formulários enquanto o usuário digita. Toda alteração passa por
// um único despachante: formata o valor do campo e, se o campo for entrada do
// valor total, recalcula o total.

use serde::{Deserialize, Serialize};

use crate::{
    common::formatters::{format_cpf, format_currency, format_date, format_phone},
    models::forms::PERSONALIZADO,
    services::pricing_service::{compute_total, TotalInputs},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CustomerField {
    Nome,
    Cpf,
    Telefone,
    Genero,
    Linha,
    Tipo,
    Cor,
    Tamanho,
    Valor,
    FormaPagamento,
    Parcelamento,
    JurosAplicado,
    JurosPersonalizado,
    Cupom,
    CupomPersonalizado,
    Localizacao,
    Frete,
    DataPagamento,
    DataEntrega,
    Observacao,
}

// Campos que alimentam o valor total.
pub const TOTAL_INPUTS: [CustomerField; 8] = [
    CustomerField::Valor,
    CustomerField::Frete,
    CustomerField::Cupom,
    CustomerField::CupomPersonalizado,
    CustomerField::FormaPagamento,
    CustomerField::Parcelamento,
    CustomerField::JurosAplicado,
    CustomerField::JurosPersonalizado,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerDraft {
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
    pub juros_personalizado: String,
    pub cupom: String,
    pub cupom_personalizado: String,
    pub localizacao: String,
    pub frete: String,
    pub data_pagamento: String,
    pub data_entrega: String,
    pub observacao: String,

    // Somente leitura para o usuário: sobrescrito a cada recálculo.
    pub valor_total: String,
}

impl Default for CustomerDraft {
    fn default() -> Self {
        Self {
            nome: String::new(),
            cpf: String::new(),
            telefone: String::new(),
            genero: "Masculino".into(),
            linha: String::new(),
            tipo: String::new(),
            cor: String::new(),
            tamanho: String::new(),
            valor: String::new(),
            forma_pagamento: "PIX".into(),
            parcelamento: String::new(),
            juros_aplicado: String::new(),
            juros_personalizado: String::new(),
            cupom: String::new(),
            cupom_personalizado: String::new(),
            localizacao: String::new(),
            frete: "R$ 15,00".into(),
            data_pagamento: String::new(),
            data_entrega: String::new(),
            observacao: String::new(),
            valor_total: "R$ 15,00".into(),
        }
    }
}

impl CustomerDraft {
    fn slot(&mut self, field: CustomerField) -> &mut String {
        match field {
            CustomerField::Nome => &mut self.nome,
            CustomerField::Cpf => &mut self.cpf,
            CustomerField::Telefone => &mut self.telefone,
            CustomerField::Genero => &mut self.genero,
            CustomerField::Linha => &mut self.linha,
            CustomerField::Tipo => &mut self.tipo,
            CustomerField::Cor => &mut self.cor,
            CustomerField::Tamanho => &mut self.tamanho,
            CustomerField::Valor => &mut self.valor,
            CustomerField::FormaPagamento => &mut self.forma_pagamento,
            CustomerField::Parcelamento => &mut self.parcelamento,
            CustomerField::JurosAplicado => &mut self.juros_aplicado,
            CustomerField::JurosPersonalizado => &mut self.juros_personalizado,
            CustomerField::Cupom => &mut self.cupom,
            CustomerField::CupomPersonalizado => &mut self.cupom_personalizado,
            CustomerField::Localizacao => &mut self.localizacao,
            CustomerField::Frete => &mut self.frete,
            CustomerField::DataPagamento => &mut self.data_pagamento,
            CustomerField::DataEntrega => &mut self.data_entrega,
            CustomerField::Observacao => &mut self.observacao,
        }
    }

    pub fn total_inputs(&self) -> TotalInputs {
        TotalInputs {
            valor: self.valor.clone(),
            frete: self.frete.clone(),
            cupom: self.cupom.clone(),
            cupom_personalizado: self.cupom_personalizado.clone(),
            parcelamento: self.parcelamento.clone(),
            juros_aplicado: self.juros_aplicado.clone(),
            juros_personalizado: self.juros_personalizado.clone(),
        }
    }

    pub fn recompute_total(&mut self) {
        self.valor_total = compute_total(&self.total_inputs());
    }

    /// `onChange(campo, formatador(valorCru))`
    pub fn on_change(&mut self, field: CustomerField, raw: &str) {
        let value = match field {
            CustomerField::Cpf => format_cpf(raw),
            CustomerField::Telefone => format_phone(raw),
            CustomerField::Valor | CustomerField::Frete => format_currency(raw),
            CustomerField::DataPagamento | CustomerField::DataEntrega => format_date(raw),
            _ => raw.to_string(),
        };
        *self.slot(field) = value;

        // Select e texto livre andam juntos.
        match field {
            CustomerField::Cupom if self.cupom != PERSONALIZADO => self.cupom_personalizado.clear(),
            CustomerField::CupomPersonalizado => {
                self.cupom = if self.cupom_personalizado.is_empty() {
                    String::new()
                } else {
                    PERSONALIZADO.to_string()
                };
            }
            CustomerField::JurosAplicado if self.juros_aplicado != PERSONALIZADO => {
                self.juros_personalizado.clear()
            }
            CustomerField::JurosPersonalizado => {
                self.juros_aplicado = if self.juros_personalizado.is_empty() {
                    String::new()
                } else {
                    PERSONALIZADO.to_string()
                };
            }
            _ => {}
        }

        if TOTAL_INPUTS.contains(&field) {
            self.recompute_total();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeadField {
    Nome,
    Telefone,
    Instagram,
    Interesse,
    StatusLead,
    DataLembrete,
    MotivoLembrete,
    Observacoes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadDraft {
    pub nome: String,
    pub telefone: String,
    pub instagram: String,
    pub interesse: String,
    pub status_lead: String,
    pub data_lembrete: String,
    pub motivo_lembrete: String,
    pub observacoes: String,
}

impl Default for LeadDraft {
    fn default() -> Self {
        Self {
            nome: String::new(),
            telefone: String::new(),
            instagram: String::new(),
            interesse: String::new(),
            status_lead: "Novo".into(),
            data_lembrete: String::new(),
            motivo_lembrete: String::new(),
            observacoes: String::new(),
        }
    }
}

impl LeadDraft {
    pub fn on_change(&mut self, field: LeadField, raw: &str) {
        match field {
            LeadField::Nome => self.nome = raw.to_string(),
            LeadField::Telefone => self.telefone = format_phone(raw),
            LeadField::Instagram => self.instagram = raw.trim().to_string(),
            LeadField::Interesse => self.interesse = raw.to_string(),
            LeadField::StatusLead => self.status_lead = raw.to_string(),
            LeadField::DataLembrete => self.data_lembrete = format_date(raw),
            LeadField::MotivoLembrete => self.motivo_lembrete = raw.to_string(),
            LeadField::Observacoes => self.observacoes = raw.to_string(),
        }
    }
}
