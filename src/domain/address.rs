use crate::utils::error::{CorreiosError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn only_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Brazilian postal code (CEP), stored as 8 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZipCode(String);

impl ZipCode {
    pub fn new(value: &str) -> Result<Self> {
        let digits = only_digits(value);
        if digits.len() != 8 {
            return Err(CorreiosError::InvalidZipCode {
                value: value.to_string(),
                reason: "must have 8 digits".to_string(),
            });
        }
        Ok(Self(digits))
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    /// Check digit printed next to the zip code: distance from the digit sum
    /// to the next multiple of ten.
    pub fn digit(&self) -> u8 {
        let total: u32 = self.0.bytes().map(|b| u32::from(b - b'0')).sum();
        ((10 - total % 10) % 10) as u8
    }

    pub fn prefix(&self) -> &str {
        &self.0[..5]
    }

    pub fn display(&self) -> String {
        format!("{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ZipCode {
    type Err = CorreiosError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ZipCode {
    type Error = CorreiosError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<ZipCode> for String {
    fn from(zip: ZipCode) -> Self {
        zip.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    pub fn new(value: &str) -> Self {
        Self(only_digits(value))
    }

    pub fn number(&self) -> &str {
        &self.0
    }

    /// Digits without the country code.
    pub fn short(&self) -> &str {
        if self.0.len() > 11 && self.0.starts_with("55") {
            &self.0[2..]
        } else {
            &self.0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Phone {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub street: String,
    pub number: String,
    pub city: String,
    pub state: String,
    pub zip_code: ZipCode,
    #[serde(default)]
    pub complement: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub phone: Phone,
    #[serde(default)]
    pub cellphone: Phone,
    #[serde(default)]
    pub email: String,
}

impl Address {
    /// Numeric part of the street number, zero-padded to 5 digits.
    pub fn zip_complement(&self) -> String {
        let digits: String = self
            .number
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        let digits = &digits[digits.len().saturating_sub(5)..];
        format!("{:0>5}", digits)
    }

    pub fn basic_address(&self) -> String {
        if self.complement.is_empty() {
            format!("{}, {}", self.street, self.number)
        } else {
            format!("{}, {} - {}", self.street, self.number, self.complement)
        }
    }
}
