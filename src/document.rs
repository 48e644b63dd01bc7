use std::fmt;

use serde::{Deserialize, Serialize};

const CPF_WEIGHTS_FIRST: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];
const CPF_WEIGHTS_SECOND: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Identity document families accepted at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentKind {
    Cpf,
    Cnpj,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Cpf => write!(f, "CPF"),
            DocumentKind::Cnpj => write!(f, "CNPJ"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCheck {
    /// Digits remaining after formatting characters are stripped.
    pub digits: String,
    /// Family inferred from the digit count, when the count matches one.
    pub kind: Option<DocumentKind>,
    pub valid: bool,
}

/// Strips formatting and verifies the check digits of a CPF or CNPJ.
///
/// Punctuation such as `.`, `-` and `/` is ignored, so formatted and raw
/// inputs validate identically. Digit counts other than 11 or 14 never
/// validate and carry no inferred kind.
pub fn check_document(document_id: &str) -> DocumentCheck {
    let digits: String = document_id.chars().filter(|c| c.is_ascii_digit()).collect();
    let values = digit_values(&digits);
    let (kind, valid) = match values.len() {
        11 => (Some(DocumentKind::Cpf), valid_cpf(&values)),
        14 => (Some(DocumentKind::Cnpj), valid_cnpj(&values)),
        _ => (None, false),
    };
    DocumentCheck { digits, kind, valid }
}

fn digit_values(digits: &str) -> Vec<u32> {
    digits.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_repeated(values: &[u32]) -> bool {
    values.windows(2).all(|pair| pair[0] == pair[1])
}

fn check_digit(values: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = values.iter().zip(weights.iter()).map(|(v, w)| v * w).sum();
    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

fn valid_cpf(values: &[u32]) -> bool {
    if all_repeated(values) {
        return false;
    }
    values[9] == check_digit(&values[..9], &CPF_WEIGHTS_FIRST)
        && values[10] == check_digit(&values[..10], &CPF_WEIGHTS_SECOND)
}

fn valid_cnpj(values: &[u32]) -> bool {
    if all_repeated(values) {
        return false;
    }
    values[12] == check_digit(&values[..12], &CNPJ_WEIGHTS_FIRST)
        && values[13] == check_digit(&values[..13], &CNPJ_WEIGHTS_SECOND)
}
