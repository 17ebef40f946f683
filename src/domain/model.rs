use crate::domain::address::ZipCode;
use crate::domain::package::Package;
use crate::domain::services::{ExtraService, Service, EXTRA_SERVICE_AR, EXTRA_SERVICE_MP};
use crate::domain::tracking::TrackingEvent;
use crate::utils::error::{CorreiosError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Renders a decimal with two places and a comma separator ("12,50").
pub fn format_decimal(value: Decimal) -> String {
    format!("{:.2}", value).replace('.', ",")
}

/// Parses "1.021,80" / "21,80" style values returned by the postal service.
pub fn parse_decimal(value: &str) -> Result<Decimal> {
    let normalized = value.trim().replace('.', "").replace(',', ".");
    Decimal::from_str(&normalized).map_err(|e| CorreiosError::InvalidResponse {
        operation: "decimal".to_string(),
        message: format!("'{}': {}", value, e),
    })
}

/// Payload of the posting list close call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosePostingListRequest {
    pub xml: String,
    pub custom_id: u64,
    pub posting_card: String,
    pub tracking_codes: Vec<String>,
}

/// Tracking data returned for one code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingObject {
    pub code: String,
    pub initials: String,
    pub name: String,
    pub category: String,
    pub error: Option<String>,
    pub events: Vec<TrackingEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FreightRequest {
    pub services: Vec<&'static Service>,
    pub from: ZipCode,
    pub to: ZipCode,
    pub package: Package,
    pub value: Decimal,
    pub extra_services: Vec<&'static ExtraService>,
}

impl FreightRequest {
    pub fn new(services: Vec<&'static Service>, from: ZipCode, to: ZipCode, package: Package) -> Self {
        Self {
            services,
            from,
            to,
            package,
            value: Decimal::ZERO,
            extra_services: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: Decimal) -> Self {
        self.value = value;
        self
    }

    pub fn with_extra_service(mut self, extra_service: &'static ExtraService) -> Self {
        self.extra_services.push(extra_service);
        self
    }

    pub fn own_hands(&self) -> bool {
        self.extra_services.iter().any(|es| es.number == EXTRA_SERVICE_MP)
    }

    pub fn receipt_notice(&self) -> bool {
        self.extra_services.iter().any(|es| es.number == EXTRA_SERVICE_AR)
    }

    pub fn service_codes(&self) -> String {
        self.services
            .iter()
            .map(|s| s.code_display())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Posting weight in kilograms, comma separated.
    pub fn weight_kg(&self) -> String {
        format!("{:.3}", self.package.posting_weight() / 1000.0).replace('.', ",")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightResponse {
    pub service_code: String,
    pub total: Decimal,
    pub value: Decimal,
    pub declared_value: Decimal,
    pub delivery_time: u32,
    pub home_delivery: bool,
    pub saturday_delivery: bool,
    pub error_code: String,
    pub error_message: String,
}

impl FreightResponse {
    pub fn is_error(&self) -> bool {
        !matches!(self.error_code.trim(), "" | "0" | "000")
    }
}
