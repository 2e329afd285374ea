// src/common/formatters.rs

// Máscaras dos campos do formulário. Todas são puras: recebem o texto cru
// digitado e devolvem a string de exibição, descartando o que não é dígito.

use std::str::FromStr;

use rust_decimal::Decimal;

fn digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

// CPF: XXX.XXX.XXX-XX
pub fn format_cpf(value: &str) -> String {
    let d = digits(value);

    match d.len() {
        0..=3 => d,
        4..=6 => format!("{}.{}", &d[..3], &d[3..]),
        7..=9 => format!("{}.{}.{}", &d[..3], &d[3..6], &d[6..]),
        _ => {
            let end = d.len().min(11);
            format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..end])
        }
    }
}

// Telefone: (XX) XXXXX-XXXX
pub fn format_phone(value: &str) -> String {
    let d = digits(value);

    match d.len() {
        0 => String::new(),
        1..=2 => format!("({d}"),
        3..=7 => format!("({}) {}", &d[..2], &d[2..]),
        _ => {
            let end = d.len().min(11);
            format!("({}) {}-{}", &d[..2], &d[2..7], &d[7..end])
        }
    }
}

/// Interpreta os dígitos como centavos e formata em reais: `R$ 1.234,56`.
///
/// Trabalha direto na string de dígitos, então não existe limite de tamanho e
/// formatar um valor já formatado devolve o mesmo texto.
pub fn format_currency(value: &str) -> String {
    let d = digits(value);
    if d.is_empty() {
        return String::new();
    }

    let trimmed = d.trim_start_matches('0');
    let padded = format!("{trimmed:0>3}");
    let (reais, centavos) = padded.split_at(padded.len() - 2);

    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (i, c) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("R$ {grouped},{centavos}")
}

// Data: DD/MM/YY
pub fn format_date(value: &str) -> String {
    let d = digits(value);

    match d.len() {
        0..=2 => d,
        3..=4 => format!("{}/{}", &d[..2], &d[2..]),
        _ => {
            let end = d.len().min(6);
            format!("{}/{}/{}", &d[..2], &d[2..4], &d[4..end])
        }
    }
}

/// Converte um texto monetário ("R$ 1.234,56", "15,00") em `Decimal`.
/// Mantém só dígitos e vírgula; qualquer coisa ilegível vale zero.
pub fn parse_currency(value: &str) -> Decimal {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();

    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(&cleaned.replacen(',', ".", 1)).unwrap_or(Decimal::ZERO)
}

/// Formata um valor (duas casas) como moeda. `None` quando os centavos não
/// cabem num `Decimal`.
pub fn format_decimal_currency(value: Decimal) -> Option<String> {
    let cents = value.round_dp(2).checked_mul(Decimal::ONE_HUNDRED)?.trunc();
    Some(format_currency(&cents.abs().to_string()))
}
