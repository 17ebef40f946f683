pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ClientConfig;

pub use adapters::{PostingListSerializer, SoapGateway};
pub use core::Correios;
pub use domain::package::{Package, PackageType};
pub use domain::posting_list::PostingList;
pub use domain::shipping_label::ShippingLabel;
pub use domain::tracking::TrackingCode;
pub use utils::error::{CorreiosError, Result};
