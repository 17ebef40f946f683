use crate::domain::address::Address;
use crate::domain::posting_card::{Contract, PostingCard};
use crate::domain::shipping_label::ShippingLabel;
use crate::utils::error::{CorreiosError, Result};
use std::collections::HashMap;

/// Manifest (PLP) batching shipping labels of one posting card.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingList {
    pub custom_id: u64,
    number: Option<u64>,
    shipping_labels: Vec<ShippingLabel>,
    index: HashMap<String, usize>,
    posting_card: Option<PostingCard>,
    sender: Option<Address>,
}

impl PostingList {
    pub fn new(custom_id: u64) -> Self {
        Self {
            custom_id,
            number: None,
            shipping_labels: Vec::new(),
            index: HashMap::new(),
            posting_card: None,
            sender: None,
        }
    }

    pub fn add_shipping_label(&mut self, mut shipping_label: ShippingLabel) -> Result<()> {
        if let Some(number) = self.number {
            return Err(CorreiosError::posting_list(format!(
                "posting list {} is closed",
                number
            )));
        }

        let key = shipping_label.tracking_code.short();
        if self.index.contains_key(&key) {
            return Err(CorreiosError::posting_list(format!(
                "shipping label {} already in posting list",
                key
            )));
        }

        match &self.posting_card {
            Some(card) if card.number != shipping_label.posting_card.number => {
                return Err(CorreiosError::posting_list(format!(
                    "invalid posting card {} (posting list uses {})",
                    shipping_label.posting_card.number, card.number
                )));
            }
            Some(_) => {}
            None => {
                self.posting_card = Some(shipping_label.posting_card.clone());
                self.sender = Some(shipping_label.sender.clone());
            }
        }

        tracing::debug!(
            "📦 Posting list {}: adding {} ({} labels)",
            self.custom_id,
            key,
            self.shipping_labels.len() + 1
        );

        shipping_label.set_posting_list(self.custom_id);
        self.index.insert(key, self.shipping_labels.len());
        self.shipping_labels.push(shipping_label);
        Ok(())
    }

    /// Records the number the postal service assigned when the list was closed.
    pub fn close_with_id(&mut self, number: u64) {
        tracing::info!("📦 Posting list {} closed as {}", self.custom_id, number);
        self.number = Some(number);
    }

    pub fn closed(&self) -> bool {
        self.number.is_some()
    }

    pub fn number(&self) -> Option<u64> {
        self.number
    }

    /// Short tracking codes in insertion order.
    pub fn get_tracking_codes(&self) -> Vec<String> {
        self.shipping_labels
            .iter()
            .map(|label| label.tracking_code.short())
            .collect()
    }

    pub fn get(&self, short_code: &str) -> Option<&ShippingLabel> {
        self.index
            .get(short_code)
            .map(|&position| &self.shipping_labels[position])
    }

    pub fn shipping_labels(&self) -> &[ShippingLabel] {
        &self.shipping_labels
    }

    pub fn len(&self) -> usize {
        self.shipping_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shipping_labels.is_empty()
    }

    pub fn posting_card(&self) -> Option<&PostingCard> {
        self.posting_card.as_ref()
    }

    pub fn contract(&self) -> Option<&Contract> {
        self.posting_card.as_ref().map(|card| &card.contract)
    }

    pub fn sender(&self) -> Option<&Address> {
        self.sender.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::address::{Phone, ZipCode};
    use crate::domain::package::{Dimensions, Package, PackageType};
    use crate::domain::posting_card::Contract;
    use crate::domain::services::{Service, SERVICE_PAC};
    use crate::domain::tracking::TrackingCode;

    fn address(name: &str, zip: &str) -> Address {
        Address {
            name: name.to_string(),
            street: "Rua XV de Novembro".to_string(),
            number: "100".to_string(),
            city: "Curitiba".to_string(),
            state: "PR".to_string(),
            zip_code: ZipCode::new(zip).unwrap(),
            complement: String::new(),
            neighborhood: "Centro".to_string(),
            phone: Phone::default(),
            cellphone: Phone::default(),
            email: String::new(),
        }
    }

    fn posting_card(number: &str) -> PostingCard {
        let contract = Contract::new("9912208555", 279311, 10).unwrap();
        PostingCard::new(number, "08082650", contract).unwrap()
    }

    fn label(code: &str, card: &str) -> ShippingLabel {
        let service = Service::get(SERVICE_PAC).unwrap();
        let package = Package::new(
            PackageType::Envelope,
            Dimensions::default(),
            120.0,
            Some(service),
            (1, 1),
        )
        .unwrap();
        ShippingLabel::builder(
            posting_card(card),
            address("Loja", "80020-000"),
            address("Cliente", "80010-010"),
            service,
            TrackingCode::new(code).unwrap(),
            package,
        )
        .build()
        .unwrap()
    }

    #[test]
    fn test_first_label_sets_card_and_sender() {
        let mut list = PostingList::new(1);
        assert!(list.posting_card().is_none());

        list.add_shipping_label(label("PH185560916BR", "0057018901")).unwrap();
        assert_eq!(list.posting_card().unwrap().number, "0057018901");
        assert_eq!(list.contract().unwrap().number, "9912208555");
        assert_eq!(list.sender().unwrap().name, "Loja");
        assert_eq!(list.get("PH18556091BR").unwrap().posting_list(), Some(1));
    }

    #[test]
    fn test_duplicate_tracking_code_rejected() {
        let mut list = PostingList::new(1);
        list.add_shipping_label(label("PH185560916BR", "0057018901")).unwrap();
        let result = list.add_shipping_label(label("PH18556091BR", "0057018901"));
        assert!(matches!(result, Err(CorreiosError::PostingList { .. })));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_other_posting_card_rejected() {
        let mut list = PostingList::new(1);
        list.add_shipping_label(label("PH185560916BR", "0057018901")).unwrap();
        let result = list.add_shipping_label(label("PH18556092BR", "0057018902"));
        assert!(matches!(result, Err(CorreiosError::PostingList { .. })));
    }

    #[test]
    fn test_close_lifecycle() {
        let mut list = PostingList::new(7);
        list.add_shipping_label(label("PH185560916BR", "0057018901")).unwrap();
        list.add_shipping_label(label("PH18556092BR", "0057018901")).unwrap();
        assert!(!list.closed());
        assert_eq!(list.get_tracking_codes(), ["PH18556091BR", "PH18556092BR"]);

        list.close_with_id(999);
        assert!(list.closed());
        assert_eq!(list.number(), Some(999));

        let result = list.add_shipping_label(label("PH18556093BR", "0057018901"));
        assert!(matches!(result, Err(CorreiosError::PostingList { .. })));
    }
}
