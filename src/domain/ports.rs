use crate::domain::model::{ClosePostingListRequest, FreightRequest, FreightResponse, TrackingObject};
use crate::domain::posting_card::User;
use crate::domain::services::Service;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait ConfigProvider: Send + Sync {
    fn username(&self) -> &str;
    fn password(&self) -> &str;
    fn sigep_url(&self) -> &str;
    fn tracking_url(&self) -> &str;
    fn freight_url(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
}

/// Request/response contract of the postal service web services.
#[async_trait]
pub trait PostalGateway: Send + Sync {
    async fn get_user(&self, contract_number: &str, posting_card_number: &str) -> Result<User>;

    /// Returns the raw `"START,END"` range of reserved codes (no check digits).
    async fn request_tracking_codes(
        &self,
        customer_tax_number: &str,
        service: &Service,
        quantity: u32,
    ) -> Result<String>;

    /// Returns the posting list number assigned by the postal service.
    async fn close_posting_list(&self, request: &ClosePostingListRequest) -> Result<u64>;

    async fn get_tracking_events(&self, tracking_codes: &[String]) -> Result<Vec<TrackingObject>>;

    async fn calculate_freights(&self, request: &FreightRequest) -> Result<Vec<FreightResponse>>;
}
