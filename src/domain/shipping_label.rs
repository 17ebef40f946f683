use crate::domain::address::Address;
use crate::domain::package::Package;
use crate::domain::posting_card::PostingCard;
use crate::domain::services::{ExtraService, Service};
use crate::domain::tracking::TrackingCode;
use crate::utils::error::{CorreiosError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub const VARIABLE_DATA_IDENTIFIER: u8 = 51;
const MAX_DATAMATRIX_EXTRA_SERVICES: usize = 6;
/// Largest amount, in cents, the 5-digit datamatrix value field can hold.
const MAX_DATAMATRIX_VALUE_CENTS: i64 = 99_999;

/// Left-pads with `fill` after keeping at most `width` characters.
fn pad_left(value: &str, width: usize, fill: char) -> String {
    let kept: String = value.chars().take(width).collect();
    let padding: String = std::iter::repeat(fill)
        .take(width - kept.chars().count())
        .collect();
    padding + &kept
}

/// Right-pads with spaces after keeping at most `width` characters.
fn pad_right(value: &str, width: usize) -> String {
    let kept: String = value.chars().take(width).collect();
    format!("{:<width$}", kept, width = width)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShippingLabel {
    pub posting_card: PostingCard,
    pub sender: Address,
    pub receiver: Address,
    pub service: &'static Service,
    pub tracking_code: TrackingCode,
    pub package: Package,
    extra_services: Vec<&'static ExtraService>,
    real_value: Decimal,
    pub billing: Decimal,
    pub order: String,
    pub invoice_number: String,
    pub invoice_series: String,
    pub invoice_type: String,
    pub text: String,
    pub latitude: f64,
    pub longitude: f64,
    pub posting_list_group: u8,
    posting_list: Option<u64>,
}

impl ShippingLabel {
    pub fn builder(
        posting_card: PostingCard,
        sender: Address,
        receiver: Address,
        service: &'static Service,
        tracking_code: TrackingCode,
        package: Package,
    ) -> ShippingLabelBuilder {
        ShippingLabelBuilder {
            label: ShippingLabel {
                posting_card,
                sender,
                receiver,
                service,
                tracking_code,
                package,
                extra_services: Vec::new(),
                real_value: Decimal::ZERO,
                billing: Decimal::ZERO,
                order: String::new(),
                invoice_number: String::new(),
                invoice_series: String::new(),
                invoice_type: String::new(),
                text: String::new(),
                latitude: 0.0,
                longitude: 0.0,
                posting_list_group: 0,
                posting_list: None,
            },
            extra_services: Vec::new(),
        }
    }

    /// Resolves `id` (number or mnemonic) and appends it. A declared-value
    /// entry is swapped for the one matching this label's service. Entries
    /// are not deduplicated.
    pub fn add_extra_service(&mut self, id: &str) -> Result<()> {
        let mut extra_service = ExtraService::resolve(id)?;
        if extra_service.is_declared_value() {
            extra_service = self.service.declared_value_extra_service()?;
        }
        self.push_extra_service(extra_service)
    }

    pub fn add_extra_service_number(&mut self, number: u32) -> Result<()> {
        let extra_service = ExtraService::get(number)?;
        self.push_extra_service(extra_service)
    }

    fn push_extra_service(&mut self, extra_service: &'static ExtraService) -> Result<()> {
        if extra_service.is_declared_value() {
            self.service.validate_declared_value(self.value())?;
        }
        self.extra_services.push(extra_service);
        Ok(())
    }

    pub fn extra_services(&self) -> &[&'static ExtraService] {
        &self.extra_services
    }

    pub fn has_declared_value(&self) -> bool {
        self.extra_services.iter().any(|es| es.is_declared_value())
    }

    pub fn real_value(&self) -> Decimal {
        self.real_value
    }

    /// Declared value, never below the service minimum.
    pub fn value(&self) -> Decimal {
        self.real_value.max(self.service.min_declared_value())
    }

    pub fn posting_list(&self) -> Option<u64> {
        self.posting_list
    }

    pub(crate) fn set_posting_list(&mut self, custom_id: u64) {
        self.posting_list = Some(custom_id);
    }

    fn extra_services_info(&self) -> String {
        let numbers: String = self
            .extra_services
            .iter()
            .take(MAX_DATAMATRIX_EXTRA_SERVICES)
            .map(|es| format!("{:02}", es.number))
            .collect();
        let numbers: String = numbers.chars().take(12).collect();
        format!("{:0<12}", numbers)
    }

    /// Fixed-width payload encoded in the label's 2D barcode.
    pub fn datamatrix_payload(&self) -> String {
        // the field saturates instead of growing past 5 digits
        let value_cents = (self.value() * Decimal::ONE_HUNDRED)
            .trunc()
            .to_i64()
            .unwrap_or(0)
            .clamp(0, MAX_DATAMATRIX_VALUE_CENTS);

        [
            pad_left(self.receiver.zip_code.code(), 8, '0'),
            self.receiver.zip_complement(),
            pad_left(self.sender.zip_code.code(), 8, '0'),
            self.sender.zip_complement(),
            self.receiver.zip_code.digit().to_string(),
            format!("{:02}", VARIABLE_DATA_IDENTIFIER),
            self.tracking_code.code(),
            self.extra_services_info(),
            pad_left(&self.posting_card.number, 10, '0'),
            self.service.code_display(),
            format!("{:02}", self.posting_list_group),
            pad_left(&self.receiver.number, 5, '0'),
            pad_right(&self.receiver.complement, 20),
            format!("{:05}", value_cents),
            pad_left(self.receiver.phone.short(), 12, '0'),
            format!("{:+010.6}", self.latitude),
            format!("{:+010.6}", self.longitude),
            "|".to_string(),
            pad_right(&self.text, 30),
        ]
        .concat()
    }
}

pub struct ShippingLabelBuilder {
    label: ShippingLabel,
    extra_services: Vec<String>,
}

impl ShippingLabelBuilder {
    pub fn value(mut self, value: Decimal) -> Self {
        self.label.real_value = value;
        self
    }

    pub fn extra_service(mut self, id: impl Into<String>) -> Self {
        self.extra_services.push(id.into());
        self
    }

    pub fn billing(mut self, billing: Decimal) -> Self {
        self.label.billing = billing;
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.label.order = order.into();
        self
    }

    pub fn invoice(
        mut self,
        number: impl Into<String>,
        series: impl Into<String>,
        invoice_type: impl Into<String>,
    ) -> Self {
        self.label.invoice_number = number.into();
        self.label.invoice_series = series.into();
        self.label.invoice_type = invoice_type.into();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.label.text = text.into();
        self
    }

    pub fn coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.label.latitude = latitude;
        self.label.longitude = longitude;
        self
    }

    pub fn posting_list_group(mut self, group: u8) -> Self {
        self.label.posting_list_group = group;
        self
    }

    pub fn build(self) -> Result<ShippingLabel> {
        let mut label = self.label;
        if label.sender == label.receiver {
            return Err(CorreiosError::InvalidAddresses);
        }

        for extra_service in label.service.default_extra_services()? {
            label.push_extra_service(extra_service)?;
        }
        for id in &self.extra_services {
            label.add_extra_service(id)?;
        }

        Ok(label)
    }
}
