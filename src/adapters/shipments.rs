//! Shipment files: one CSV row per package to post.

use crate::domain::address::{Address, Phone, ZipCode};
use crate::domain::package::{Dimensions, Package, PackageLimits, PackageType};
use crate::domain::posting_card::PostingCard;
use crate::domain::services::Service;
use crate::domain::shipping_label::ShippingLabel;
use crate::domain::tracking::TrackingCode;
use crate::utils::error::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub tracking_code: String,
    pub service: String,
    pub package_type: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub diameter: Option<f64>,
    pub weight: f64,
    pub receiver_name: String,
    pub receiver_street: String,
    pub receiver_number: String,
    #[serde(default)]
    pub receiver_complement: String,
    #[serde(default)]
    pub receiver_neighborhood: String,
    pub receiver_city: String,
    pub receiver_state: String,
    pub receiver_zip_code: String,
    #[serde(default)]
    pub receiver_phone: String,
    #[serde(default)]
    pub receiver_email: String,
    #[serde(default)]
    pub value: Option<Decimal>,
    /// Numbers or mnemonics separated by `;`.
    #[serde(default)]
    pub extra_services: String,
    #[serde(default)]
    pub order: String,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub text: String,
}

impl ShipmentRecord {
    pub fn receiver(&self) -> Result<Address> {
        Ok(Address {
            name: self.receiver_name.clone(),
            street: self.receiver_street.clone(),
            number: self.receiver_number.clone(),
            city: self.receiver_city.clone(),
            state: self.receiver_state.clone(),
            zip_code: ZipCode::new(&self.receiver_zip_code)?,
            complement: self.receiver_complement.clone(),
            neighborhood: self.receiver_neighborhood.clone(),
            phone: Phone::new(&self.receiver_phone),
            cellphone: Phone::default(),
            email: self.receiver_email.clone(),
        })
    }

    pub fn into_label(
        self,
        posting_card: &PostingCard,
        sender: &Address,
        limits: &PackageLimits,
    ) -> Result<ShippingLabel> {
        let service = Service::resolve(&self.service)?;
        let package_type: PackageType = self.package_type.parse()?;
        let dimensions = Dimensions {
            width: self.width.unwrap_or_default(),
            height: self.height.unwrap_or_default(),
            length: self.length.unwrap_or_default(),
            diameter: self.diameter.unwrap_or_default(),
        };
        let package = Package::with_limits(
            package_type,
            dimensions,
            self.weight,
            Some(service),
            (1, 1),
            *limits,
        )?;
        let tracking_code = TrackingCode::new(&self.tracking_code)?;
        let receiver = self.receiver()?;

        let mut builder = ShippingLabel::builder(
            posting_card.clone(),
            sender.clone(),
            receiver,
            service,
            tracking_code,
            package,
        )
        .order(self.order)
        .invoice(self.invoice_number, "", "")
        .text(self.text);

        if let Some(value) = self.value {
            builder = builder.value(value);
        }
        for id in self.extra_services.split(';').map(str::trim) {
            if !id.is_empty() {
                builder = builder.extra_service(id);
            }
        }

        builder.build()
    }
}

pub fn read_shipments_from<R: Read>(reader: R) -> Result<Vec<ShipmentRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    tracing::debug!("📦 Read {} shipment rows", records.len());
    Ok(records)
}

pub fn read_shipments<P: AsRef<Path>>(path: P) -> Result<Vec<ShipmentRecord>> {
    let file = std::fs::File::open(path)?;
    read_shipments_from(file)
}
