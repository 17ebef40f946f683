// Domain layer: postal models, reference data and ports. No transport code here.

pub mod address;
pub mod model;
pub mod package;
pub mod ports;
pub mod posting_card;
pub mod posting_list;
pub mod services;
pub mod shipping_label;
pub mod tax_number;
pub mod tracking;
