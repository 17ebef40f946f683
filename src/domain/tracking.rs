//! Postal tracking codes (UPU S10 style) and the events attached to them.

use crate::utils::error::{CorreiosError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DIGIT_WEIGHTS: [u32; 8] = [8, 6, 4, 2, 3, 5, 9, 7];

/// Computes the modulo-11 check digit of an 8-digit serial.
pub fn calculate_digit(number: &str) -> Result<u8> {
    if number.len() != 8 || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(CorreiosError::tracking_code(
            number,
            "number must have exactly 8 digits",
        ));
    }

    let sum: u32 = number
        .bytes()
        .zip(DIGIT_WEIGHTS)
        .map(|(b, weight)| u32::from(b - b'0') * weight)
        .sum();

    let digit = match sum % 11 {
        0 => 5,
        1 => 0,
        rest => 11 - rest,
    };
    Ok(digit as u8)
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingCode {
    prefix: String,
    number: String,
    suffix: String,
    digit: u8,
    pub category: Option<String>,
    pub name: Option<String>,
    pub initials: Option<String>,
    events: Vec<TrackingEvent>,
}

impl TrackingCode {
    /// Parses a code with or without check digit, e.g. `DL746686536BR`,
    /// `DL74668653BR` or `DL74668653 BR`.
    pub fn new(code: &str) -> Result<Self> {
        let chars: Vec<char> = code.chars().collect();
        if !(11..=13).contains(&chars.len()) {
            return Err(CorreiosError::tracking_code(
                code,
                "must have between 11 and 13 characters",
            ));
        }

        let prefix: String = chars[..2].iter().collect::<String>().to_uppercase();
        let number: String = chars[2..10].iter().filter(|c| c.is_ascii_digit()).collect();
        let suffix: String = chars[chars.len() - 2..]
            .iter()
            .collect::<String>()
            .to_uppercase();

        let supplied_digit = if chars.len() == 13 && chars[10] != ' ' {
            let digit = chars[10].to_digit(10).ok_or_else(|| {
                CorreiosError::tracking_code(code, "check digit must be numeric")
            })?;
            Some(digit as u8)
        } else {
            None
        };

        Self::from_parts(code, prefix, number, suffix, supplied_digit)
    }

    /// Builds a code from its numeric serial, computing the digit.
    pub fn create(prefix: &str, number: u32, suffix: &str) -> Result<Self> {
        let raw = format!("{}{:08}{}", prefix, number, suffix);
        Self::from_parts(
            &raw,
            prefix.to_uppercase(),
            format!("{:08}", number),
            suffix.to_uppercase(),
            None,
        )
    }

    fn from_parts(
        raw: &str,
        prefix: String,
        number: String,
        suffix: String,
        supplied_digit: Option<u8>,
    ) -> Result<Self> {
        if prefix.len() != 2 || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CorreiosError::tracking_code(raw, "invalid prefix"));
        }
        if suffix.len() != 2 || !suffix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CorreiosError::tracking_code(raw, "invalid suffix"));
        }
        if number.len() != 8 {
            return Err(CorreiosError::tracking_code(raw, "invalid number"));
        }

        let digit = calculate_digit(&number)?;
        if let Some(supplied) = supplied_digit {
            if supplied != digit {
                return Err(CorreiosError::tracking_code(
                    raw,
                    format!("invalid digit {} (expected {})", supplied, digit),
                ));
            }
        }

        Ok(Self {
            prefix,
            number,
            suffix,
            digit,
            category: None,
            name: None,
            initials: None,
            events: Vec::new(),
        })
    }

    /// Expands a contiguous range of codes, both ends included.
    pub fn create_range(start: &TrackingCode, end: &TrackingCode) -> Result<Vec<TrackingCode>> {
        if start.prefix != end.prefix {
            return Err(CorreiosError::tracking_code(
                &start.short(),
                format!("range prefix mismatch ({} != {})", start.prefix, end.prefix),
            ));
        }
        if start.suffix != end.suffix {
            return Err(CorreiosError::tracking_code(
                &start.short(),
                format!("range suffix mismatch ({} != {})", start.suffix, end.suffix),
            ));
        }

        let first = start.serial();
        let last = end.serial();
        if first > last {
            return Err(CorreiosError::tracking_code(
                &start.short(),
                format!("range start is after its end ({})", end.short()),
            ));
        }

        (first..=last)
            .map(|number| Self::create(&start.prefix, number, &start.suffix))
            .collect()
    }

    /// Expands the `"START,END"` string returned by the tracking code request.
    pub fn parse_range(range: &str) -> Result<Vec<TrackingCode>> {
        let (start, end) = range
            .split_once(',')
            .ok_or_else(|| CorreiosError::tracking_code(range, "range must be 'START,END'"))?;
        let start = Self::new(start.trim())?;
        let end = Self::new(end.trim())?;
        Self::create_range(&start, &end)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn digit(&self) -> u8 {
        self.digit
    }

    fn serial(&self) -> u32 {
        // number is validated as 8 ASCII digits
        self.number
            .bytes()
            .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
    }

    /// Full 13-character code.
    pub fn code(&self) -> String {
        format!("{}{}{}{}", self.prefix, self.number, self.digit, self.suffix)
    }

    pub fn nodigit(&self) -> String {
        format!("{} {} {}", self.prefix, self.number, self.suffix)
    }

    /// Code without check digit; posting lists are keyed by this form.
    pub fn short(&self) -> String {
        format!("{}{}{}", self.prefix, self.number, self.suffix)
    }

    pub fn splitted(&self) -> String {
        let code = self.code();
        format!(
            "{} {} {} {} {}",
            &code[..2],
            &code[2..5],
            &code[5..8],
            &code[8..11],
            &code[11..]
        )
    }

    pub fn add_event(&mut self, event: TrackingEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[TrackingEvent] {
        &self.events
    }
}

impl fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for TrackingCode {
    type Err = CorreiosError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for TrackingCode {
    type Error = CorreiosError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<TrackingCode> for String {
    fn from(code: TrackingCode) -> Self {
        code.code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingCategory {
    Posted,
    InTransit,
    WaitingRetrieval,
    OutForDelivery,
    Delivered,
    Returned,
    Failure,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingStatus {
    pub event_type: &'static str,
    pub status: u32,
    pub category: TrackingCategory,
    pub description: &'static str,
}

static TRACKING_STATUSES: &[TrackingStatus] = &[
    TrackingStatus { event_type: "PO", status: 0, category: TrackingCategory::Posted, description: "Objeto postado" },
    TrackingStatus { event_type: "PO", status: 1, category: TrackingCategory::Posted, description: "Objeto postado" },
    TrackingStatus { event_type: "PO", status: 9, category: TrackingCategory::Posted, description: "Objeto postado após o horário limite da agência" },
    TrackingStatus { event_type: "RO", status: 1, category: TrackingCategory::InTransit, description: "Objeto encaminhado" },
    TrackingStatus { event_type: "DO", status: 1, category: TrackingCategory::InTransit, description: "Objeto encaminhado" },
    TrackingStatus { event_type: "OEC", status: 0, category: TrackingCategory::OutForDelivery, description: "Objeto saiu para entrega ao destinatário" },
    TrackingStatus { event_type: "LDI", status: 0, category: TrackingCategory::WaitingRetrieval, description: "Objeto aguardando retirada no endereço indicado" },
    TrackingStatus { event_type: "LDI", status: 1, category: TrackingCategory::WaitingRetrieval, description: "Objeto aguardando retirada no endereço indicado" },
    TrackingStatus { event_type: "BDE", status: 0, category: TrackingCategory::Delivered, description: "Objeto entregue ao destinatário" },
    TrackingStatus { event_type: "BDE", status: 1, category: TrackingCategory::Delivered, description: "Objeto entregue ao destinatário" },
    TrackingStatus { event_type: "BDI", status: 0, category: TrackingCategory::Delivered, description: "Objeto entregue ao destinatário" },
    TrackingStatus { event_type: "BDI", status: 1, category: TrackingCategory::Delivered, description: "Objeto entregue ao destinatário" },
    TrackingStatus { event_type: "BDE", status: 23, category: TrackingCategory::Returned, description: "Objeto devolvido ao remetente" },
    TrackingStatus { event_type: "BDI", status: 23, category: TrackingCategory::Returned, description: "Objeto devolvido ao remetente" },
    TrackingStatus { event_type: "BDE", status: 2, category: TrackingCategory::Failure, description: "Destinatário ausente" },
    TrackingStatus { event_type: "BDE", status: 3, category: TrackingCategory::Failure, description: "Objeto não procurado" },
    TrackingStatus { event_type: "BDE", status: 7, category: TrackingCategory::Failure, description: "Empresa sem expediente" },
    TrackingStatus { event_type: "BDE", status: 9, category: TrackingCategory::Failure, description: "Objeto extraviado" },
    TrackingStatus { event_type: "BDE", status: 12, category: TrackingCategory::Failure, description: "Remetente não retirou objeto na unidade" },
    TrackingStatus { event_type: "BDE", status: 33, category: TrackingCategory::Failure, description: "Destinatário não apresentou documento exigido" },
];

impl TrackingStatus {
    pub fn get(event_type: &str, status: u32) -> Option<&'static TrackingStatus> {
        TRACKING_STATUSES
            .iter()
            .find(|s| s.event_type.eq_ignore_ascii_case(event_type) && s.status == status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub timestamp: NaiveDateTime,
    pub event_type: String,
    pub status: u32,
    pub description: String,
    pub comment: Option<String>,
    pub location: String,
    pub location_zip_code: Option<String>,
    pub city: String,
    pub state: String,
}

impl TrackingEvent {
    pub fn category(&self) -> TrackingCategory {
        TrackingStatus::get(&self.event_type, self.status)
            .map(|s| s.category)
            .unwrap_or(TrackingCategory::Unknown)
    }
}
