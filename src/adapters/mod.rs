// Adapters layer: SOAP transport, posting list XML and shipment files.

pub mod shipments;
pub mod soap;
pub mod xml;

pub use shipments::{read_shipments, ShipmentRecord};
pub use soap::SoapGateway;
pub use xml::PostingListSerializer;
