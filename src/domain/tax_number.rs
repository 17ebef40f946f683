use crate::utils::error::{CorreiosError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxNumberKind {
    /// CPF (people) or CNPJ (companies).
    Federal,
    /// Inscrição estadual.
    State,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "number", rename_all = "lowercase")]
pub enum TaxNumber {
    Federal(String),
    State(String),
}

impl TaxNumber {
    pub fn new(kind: TaxNumberKind, raw: &str) -> Result<Self> {
        match kind {
            TaxNumberKind::Federal => Ok(TaxNumber::Federal(validate_federal(raw)?)),
            TaxNumberKind::State => Ok(TaxNumber::State(validate_state(raw)?)),
        }
    }

    pub fn kind(&self) -> TaxNumberKind {
        match self {
            TaxNumber::Federal(_) => TaxNumberKind::Federal,
            TaxNumber::State(_) => TaxNumberKind::State,
        }
    }

    /// Canonical digits.
    pub fn number(&self) -> &str {
        match self {
            TaxNumber::Federal(number) | TaxNumber::State(number) => number,
        }
    }

    pub fn display(&self) -> String {
        match self {
            TaxNumber::Federal(n) if n.len() == 11 => {
                format!("{}.{}.{}-{}", &n[..3], &n[3..6], &n[6..9], &n[9..])
            }
            TaxNumber::Federal(n) => format!(
                "{}.{}.{}/{}-{}",
                &n[..2],
                &n[2..5],
                &n[5..8],
                &n[8..12],
                &n[12..]
            ),
            TaxNumber::State(n) => n.clone(),
        }
    }
}

impl fmt::Display for TaxNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

fn invalid(raw: &str, reason: &str) -> CorreiosError {
    CorreiosError::InvalidTaxNumber {
        value: raw.to_string(),
        reason: reason.to_string(),
    }
}

fn digits_of(raw: &str) -> Vec<u32> {
    raw.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        0 | 1 => 0,
        rest => 11 - rest,
    }
}

const CPF_WEIGHTS: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

fn validate_federal(raw: &str) -> Result<String> {
    let digits = digits_of(raw);
    let weights: &[u32] = match digits.len() {
        11 => &CPF_WEIGHTS,
        14 => &CNPJ_WEIGHTS,
        _ => return Err(invalid(raw, "must have 11 (CPF) or 14 (CNPJ) digits")),
    };

    if digits.iter().all(|&d| d == digits[0]) {
        return Err(invalid(raw, "repeated digits"));
    }

    let base = digits.len() - 2;
    let first = check_digit(&digits[..base], &weights[1..]);
    let second = check_digit(&digits[..=base], weights);
    if digits[base] != first || digits[base + 1] != second {
        return Err(invalid(raw, "invalid check digits"));
    }

    Ok(digits.iter().map(u32::to_string).collect())
}

// Per-state checksums vary by state and are left to the postal service.
fn validate_state(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if !(2..=14).contains(&digits.len()) {
        return Err(invalid(raw, "must have between 2 and 14 digits"));
    }
    Ok(digits)
}
