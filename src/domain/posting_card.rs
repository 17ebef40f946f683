use crate::domain::tax_number::TaxNumber;
use crate::utils::error::{CorreiosError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

fn digits_field(field: &str, value: &str, max_len: usize) -> Result<String> {
    let digits = value.trim().to_string();
    if digits.is_empty() || digits.len() > max_len || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CorreiosError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: format!("must be numeric with at most {} digits", max_len),
        });
    }
    Ok(digits)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub number: String,
    pub customer_code: u64,
    pub regional_direction: u32,
    #[serde(default)]
    pub regional_direction_name: String,
}

impl Contract {
    pub fn new(number: &str, customer_code: u64, regional_direction: u32) -> Result<Self> {
        Ok(Self {
            number: digits_field("contract.number", number, 10)?,
            customer_code,
            regional_direction,
            regional_direction_name: String::new(),
        })
    }

    /// Two-digit regional direction code, as sent in the posting list.
    pub fn regional_direction_code(&self) -> String {
        format!("{:02}", self.regional_direction)
    }
}

/// Account-level posting authorization issued under a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingCard {
    pub number: String,
    pub administrative_code: String,
    pub contract: Contract,
}

impl PostingCard {
    pub fn new(number: &str, administrative_code: &str, contract: Contract) -> Result<Self> {
        let number = digits_field("posting_card.number", number, 10)?;
        let administrative_code =
            digits_field("posting_card.administrative_code", administrative_code, 8)?;
        Ok(Self {
            number: format!("{:0>10}", number),
            administrative_code: format!("{:0>8}", administrative_code),
            contract,
        })
    }
}

impl fmt::Display for PostingCard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.number)
    }
}

/// Customer record returned by the user lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub federal_tax_number: TaxNumber,
    pub state_tax_number: Option<TaxNumber>,
    pub status_number: u32,
    pub contracts: Vec<Contract>,
    pub posting_cards: Vec<PostingCard>,
}

impl User {
    pub fn find_posting_card(&self, number: &str) -> Option<&PostingCard> {
        let number = format!("{:0>10}", number.trim());
        self.posting_cards.iter().find(|card| card.number == number)
    }
}
