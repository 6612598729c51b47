//! Response types for Apple's `shop/fulfillment-messages` endpoint.
//!
//! ## Observed shape (hk-zh storefront, pickup query with `pl=true`)
//!
//! ```text
//! body.content.pickupMessage.stores[]
//!   storeName: "Causeway Bay"
//!   partsAvailability:
//!     "MG8G4ZA/A":
//!       buyability: { isBuyable: false, reason: "...", inventory: 0 }
//! ```
//!
//! ### `partsAvailability`
//! Keyed by part number. A store that does not carry the part omits the key
//! entirely; we treat that as not buyable with unknown inventory.
//!
//! ### `inventory`
//! Usually an integer, but has been seen as a string and as `null`. Absent or
//! `null` normalizes to [`UNKNOWN_INVENTORY`]; anything else is rendered as text.
//!
//! ### `isBuyable`
//! Boolean. Absent or `null` normalizes to `false`.

use std::collections::HashMap;

use serde::Deserialize;
use stockwatch_core::{StoreRecord, UNKNOWN_INVENTORY};

/// Top-level response from `GET shop/fulfillment-messages`.
#[derive(Debug, Deserialize)]
pub struct FulfillmentResponse {
    pub body: FulfillmentBody,
}

#[derive(Debug, Deserialize)]
pub struct FulfillmentBody {
    pub content: FulfillmentContent,
}

#[derive(Debug, Deserialize)]
pub struct FulfillmentContent {
    #[serde(rename = "pickupMessage")]
    pub pickup_message: PickupMessage,
}

#[derive(Debug, Deserialize)]
pub struct PickupMessage {
    pub stores: Vec<PickupStore>,
}

/// One retail store entry in the pickup message.
#[derive(Debug, Deserialize)]
pub struct PickupStore {
    #[serde(rename = "storeName")]
    pub store_name: String,

    #[serde(rename = "partsAvailability", default)]
    pub parts_availability: HashMap<String, PartAvailability>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartAvailability {
    #[serde(default)]
    pub buyability: Buyability,
}

#[derive(Debug, Default, Deserialize)]
pub struct Buyability {
    #[serde(rename = "isBuyable", default)]
    pub is_buyable: Option<bool>,

    #[serde(default)]
    pub inventory: Option<serde_json::Value>,
}

impl PickupStore {
    /// Normalizes this store's availability of `part_number`.
    #[must_use]
    pub fn to_record(&self, part_number: &str) -> StoreRecord {
        let buyability = self
            .parts_availability
            .get(part_number)
            .map(|p| &p.buyability);

        let is_buyable = buyability.and_then(|b| b.is_buyable).unwrap_or(false);
        let inventory_label = match buyability.and_then(|b| b.inventory.as_ref()) {
            None | Some(serde_json::Value::Null) => UNKNOWN_INVENTORY.to_owned(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        StoreRecord {
            name: self.store_name.clone(),
            is_buyable,
            inventory_label,
        }
    }
}
