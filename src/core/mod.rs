pub mod client;

pub use crate::domain::ports::{ConfigProvider, PostalGateway};
pub use crate::utils::error::Result;
pub use client::{Correios, MAX_TRACKING_CODES_PER_REQUEST};
