// src/services/pricing_service.rs

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use crate::{
    common::formatters::{format_currency, format_decimal_currency, parse_currency},
    models::forms::{CustomerSubmission, PERSONALIZADO},
};

// Frete padrão do formulário (R$ 15,00), usado quando o cálculo falha sem frete legível.
pub const DEFAULT_FRETE_CENTS: u32 = 1500;

// Juros padrão: 3% por parcela acima da terceira.
const INTEREST_PER_INSTALLMENT: Decimal = Decimal::from_parts(3, 0, 0, false, 2);
const INTEREST_FREE_INSTALLMENTS: u32 = 3;

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("regex de número"));

/// Entradas do valor total, enumeradas explicitamente.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TotalInputs {
    pub valor: String,
    pub frete: String,
    pub cupom: String,
    pub cupom_personalizado: String,
    pub parcelamento: String,
    pub juros_aplicado: String,
    pub juros_personalizado: String,
}

impl From<&CustomerSubmission> for TotalInputs {
    fn from(customer: &CustomerSubmission) -> Self {
        Self {
            valor: customer.valor.clone(),
            frete: customer.frete.clone(),
            cupom: customer.cupom.clone(),
            cupom_personalizado: customer.cupom_personalizado.clone().unwrap_or_default(),
            parcelamento: customer.parcelamento.clone(),
            juros_aplicado: customer.juros_aplicado.clone(),
            juros_personalizado: customer.juros_personalizado.clone().unwrap_or_default(),
        }
    }
}

fn first_number(text: &str) -> Option<u32> {
    FIRST_NUMBER.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Percentual de desconto do cupom (5/10/15 fixos ou o primeiro número do texto livre).
pub fn discount_percent(cupom: &str, cupom_personalizado: &str) -> u32 {
    match cupom {
        "5% OFF" => 5,
        "10% OFF" => 10,
        "15% OFF" => 15,
        PERSONALIZADO => first_number(cupom_personalizado).unwrap_or(0),
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallmentPlan {
    pub count: u32,
    pub with_interest: bool,
}

impl InstallmentPlan {
    // "5x com juros" → 5 parcelas com juros
    pub fn parse(plan: &str) -> Option<Self> {
        let plan = plan.trim();
        if plan.is_empty() {
            return None;
        }

        let count = plan.split(['x', 'X']).next()?.trim().parse().ok()?;
        Some(Self {
            count,
            with_interest: plan.contains("com juros"),
        })
    }

    fn default_rate(&self) -> Decimal {
        if !self.with_interest || self.count <= INTEREST_FREE_INSTALLMENTS {
            return Decimal::ZERO;
        }
        INTEREST_PER_INSTALLMENT * Decimal::from(self.count - INTEREST_FREE_INSTALLMENTS)
    }
}

/// Taxa de juros como fração. O juros personalizado vale para qualquer plano
/// preenchido; sem ele, aplica a política padrão do plano.
pub fn interest_rate(parcelamento: &str, juros_aplicado: &str, juros_personalizado: &str) -> Decimal {
    if parcelamento.trim().is_empty() {
        return Decimal::ZERO;
    }

    if juros_aplicado == PERSONALIZADO && !juros_personalizado.trim().is_empty() {
        return first_number(juros_personalizado)
            .map(|pct| Decimal::from(pct) / Decimal::ONE_HUNDRED)
            .unwrap_or(Decimal::ZERO);
    }

    InstallmentPlan::parse(parcelamento)
        .map(|plan| plan.default_rate())
        .unwrap_or(Decimal::ZERO)
}

fn try_total(inputs: &TotalInputs) -> Option<Decimal> {
    let price = parse_currency(&inputs.valor);
    let shipping = parse_currency(&inputs.frete);

    let discount = Decimal::from(discount_percent(&inputs.cupom, &inputs.cupom_personalizado));
    let discounted = price.checked_sub(price.checked_mul(discount)?.checked_div(Decimal::ONE_HUNDRED)?)?;

    let rate = interest_rate(&inputs.parcelamento, &inputs.juros_aplicado, &inputs.juros_personalizado);
    let with_interest = discounted.checked_mul(Decimal::ONE.checked_add(rate)?)?;

    let total = with_interest.checked_add(shipping)?;
    Some(total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Valor total formatado. Em caso de falha aritmética devolve o frete como total.
pub fn compute_total(inputs: &TotalInputs) -> String {
    let formatted = try_total(inputs).and_then(|total| {
        tracing::debug!(
            valor = %inputs.valor,
            frete = %inputs.frete,
            cupom = %inputs.cupom,
            parcelamento = %inputs.parcelamento,
            total = %total,
            "Valores atualizados"
        );
        format_decimal_currency(total)
    });

    formatted.unwrap_or_else(|| {
        tracing::error!(valor = %inputs.valor, "Erro ao calcular valor total");
        let default_frete = || format_currency(&DEFAULT_FRETE_CENTS.to_string());
        let shipping = parse_currency(&inputs.frete);
        if shipping.is_zero() {
            default_frete()
        } else {
            format_decimal_currency(shipping).unwrap_or_else(default_frete)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(valor: &str, frete: &str) -> TotalInputs {
        TotalInputs {
            valor: valor.into(),
            frete: frete.into(),
            ..Default::default()
        }
    }

    #[test]
    fn price_plus_shipping() {
        assert_eq!(compute_total(&inputs("R$ 100,00", "R$ 15,00")), "R$ 115,00");
    }

    #[test]
    fn coupon_discounts_price_only() {
        let mut i = inputs("R$ 100,00", "R$ 0,00");
        i.cupom = "10% OFF".into();
        assert_eq!(compute_total(&i), "R$ 90,00");

        i.frete = "R$ 15,00".into();
        assert_eq!(compute_total(&i), "R$ 105,00");
    }

    #[test]
    fn default_interest_policy_above_three_installments() {
        let mut i = inputs("R$ 100,00", "R$ 0,00");
        i.parcelamento = "5x com juros".into();
        assert_eq!(compute_total(&i), "R$ 106,00");

        i.parcelamento = "3x com juros".into();
        assert_eq!(compute_total(&i), "R$ 100,00");

        i.parcelamento = "10x sem juros".into();
        assert_eq!(compute_total(&i), "R$ 100,00");
    }

    #[test]
    fn custom_coupon_uses_first_number() {
        let mut i = inputs("R$ 200,00", "");
        i.cupom = PERSONALIZADO.into();
        i.cupom_personalizado = "amigo 25% e mais 3".into();
        assert_eq!(compute_total(&i), "R$ 150,00");
    }

    #[test]
    fn custom_interest_overrides_default_policy() {
        let mut i = inputs("R$ 100,00", "R$ 0,00");
        i.parcelamento = "2x sem juros".into();
        i.juros_aplicado = PERSONALIZADO.into();
        i.juros_personalizado = "7%".into();
        assert_eq!(compute_total(&i), "R$ 107,00");
    }

    #[test]
    fn discount_and_interest_compose() {
        let mut i = inputs("R$ 100,00", "R$ 15,00");
        i.cupom = "10% OFF".into();
        i.parcelamento = "5x com juros".into();
        // 90 * 1.06 + 15
        assert_eq!(compute_total(&i), "R$ 110,40");
    }

    #[test]
    fn rounds_at_cent_boundary() {
        let mut i = inputs("R$ 33,33", "");
        i.cupom = "10% OFF".into();
        // 29.997
        assert_eq!(compute_total(&i), "R$ 30,00");
    }

    #[test]
    fn empty_inputs_are_zero() {
        assert_eq!(compute_total(&TotalInputs::default()), "R$ 0,00");
    }

    #[test]
    fn overflow_falls_back_to_shipping() {
        let mut i = inputs("9999999999999999999999999999", "R$ 20,00");
        i.parcelamento = "2x".into();
        i.juros_aplicado = PERSONALIZADO.into();
        i.juros_personalizado = "900".into();
        assert_eq!(compute_total(&i), "R$ 20,00");

        i.frete = String::new();
        assert_eq!(compute_total(&i), "R$ 15,00");
    }

    #[test]
    fn cents_overflow_without_interest_falls_back_to_shipping() {
        let i = inputs("9999999999999999999999999999", "");
        assert_eq!(compute_total(&i), "R$ 15,00");

        let i = inputs("9999999999999999999999999999", "R$ 20,00");
        assert_eq!(compute_total(&i), "R$ 20,00");
    }

    #[test]
    fn uppercase_x_in_plan() {
        let mut i = inputs("R$ 100,00", "R$ 0,00");
        i.parcelamento = "5X com juros".into();
        assert_eq!(compute_total(&i), "R$ 106,00");
    }

    #[test]
    fn plan_parsing() {
        assert_eq!(
            InstallmentPlan::parse("12x com juros"),
            Some(InstallmentPlan { count: 12, with_interest: true })
        );
        assert_eq!(
            InstallmentPlan::parse("12X com juros"),
            Some(InstallmentPlan { count: 12, with_interest: true })
        );
        assert_eq!(InstallmentPlan::parse("à vista"), None);
        assert_eq!(InstallmentPlan::parse(""), None);
    }
}
