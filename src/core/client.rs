use crate::adapters::xml::PostingListSerializer;
use crate::domain::model::{ClosePostingListRequest, FreightRequest, FreightResponse};
use crate::domain::ports::PostalGateway;
use crate::domain::posting_card::User;
use crate::domain::posting_list::PostingList;
use crate::domain::services::Service;
use crate::domain::tracking::TrackingCode;
use crate::utils::error::{CorreiosError, Result};

pub const MAX_TRACKING_CODES_PER_REQUEST: usize = 50;

/// Entry point of the library: domain operations over a [`PostalGateway`].
pub struct Correios<G: PostalGateway> {
    gateway: G,
    serializer: PostingListSerializer,
}

impl<G: PostalGateway> Correios<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            serializer: PostingListSerializer::new(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub async fn get_user(&self, contract_number: &str, posting_card_number: &str) -> Result<User> {
        tracing::info!(
            "📡 Looking up user for contract {} / posting card {}",
            contract_number,
            posting_card_number
        );
        self.gateway
            .get_user(contract_number, posting_card_number)
            .await
    }

    /// Reserves `quantity` codes for `service` and expands the returned range.
    pub async fn request_tracking_codes(
        &self,
        user: &User,
        service: &Service,
        quantity: u32,
    ) -> Result<Vec<TrackingCode>> {
        tracing::info!(
            "📡 Requesting {} tracking codes for {}",
            quantity,
            service.display_name
        );
        let range = self
            .gateway
            .request_tracking_codes(user.federal_tax_number.number(), service, quantity)
            .await?;
        let codes = TrackingCode::parse_range(&range)?;
        tracing::debug!("Received range {} ({} codes)", range, codes.len());
        Ok(codes)
    }

    /// Serializes and submits the list, then marks it closed with the
    /// number assigned by the postal service.
    pub async fn close_posting_list(&self, posting_list: &mut PostingList) -> Result<u64> {
        let xml = self.serializer.serialize(posting_list)?;
        let posting_card = posting_list
            .posting_card()
            .map(|card| card.number.clone())
            .ok_or_else(|| CorreiosError::posting_list("posting list has no posting card"))?;

        let request = ClosePostingListRequest {
            xml,
            custom_id: posting_list.custom_id,
            posting_card,
            tracking_codes: posting_list.get_tracking_codes(),
        };

        tracing::info!(
            "📦 Closing posting list {} with {} labels",
            posting_list.custom_id,
            request.tracking_codes.len()
        );
        let number = self.gateway.close_posting_list(&request).await?;
        posting_list.close_with_id(number);
        Ok(number)
    }

    /// Loads events for at most [`MAX_TRACKING_CODES_PER_REQUEST`] codes and
    /// attaches them, with the object metadata, to the matching codes.
    pub async fn get_tracking_code_events(&self, tracking_codes: &mut [TrackingCode]) -> Result<()> {
        if tracking_codes.len() > MAX_TRACKING_CODES_PER_REQUEST {
            return Err(CorreiosError::TrackingCodesLimitExceeded {
                count: tracking_codes.len(),
                limit: MAX_TRACKING_CODES_PER_REQUEST,
            });
        }
        if tracking_codes.is_empty() {
            return Ok(());
        }

        let codes: Vec<String> = tracking_codes.iter().map(TrackingCode::code).collect();
        let objects = self.gateway.get_tracking_events(&codes).await?;
        tracing::info!("📡 Received tracking data for {} objects", objects.len());

        for object in objects {
            if let Some(error) = &object.error {
                tracing::warn!("⚠️ Tracking {}: {}", object.code, error);
                continue;
            }

            let Some(tracking_code) = tracking_codes
                .iter_mut()
                .find(|code| code.code().eq_ignore_ascii_case(object.code.trim()))
            else {
                tracing::warn!("⚠️ Unexpected tracking object {}", object.code);
                continue;
            };

            tracking_code.category = Some(object.category);
            tracking_code.name = Some(object.name);
            tracking_code.initials = Some(object.initials);
            for event in object.events {
                tracking_code.add_event(event);
            }
        }

        Ok(())
    }

    pub async fn calculate_freights(&self, request: &FreightRequest) -> Result<Vec<FreightResponse>> {
        tracing::info!(
            "📡 Calculating freight {} -> {} for services {}",
            request.from.code(),
            request.to.code(),
            request.service_codes()
        );
        let freights = self.gateway.calculate_freights(request).await?;
        for freight in freights.iter().filter(|f| f.is_error()) {
            tracing::warn!(
                "⚠️ Freight for service {} failed: {} {}",
                freight.service_code,
                freight.error_code,
                freight.error_message
            );
        }
        Ok(freights)
    }
}
