use serde::{Deserialize, Serialize};

use super::deck::CardId;

/// One card of the user's physical collection.
///
/// The collection service has reported the copy count as either `copies` or `quantity`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCard {
    pub card_id: CardId,
    #[serde(default)]
    pub copies: Option<u32>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl CollectionCard {
    pub fn owned_copies(&self) -> u32 {
        self.copies.or(self.quantity).unwrap_or(0)
    }
}
