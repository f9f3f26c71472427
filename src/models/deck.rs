use serde::{Deserialize, Serialize};

pub type DeckId = i64;
pub type CardId = i64;

/// Deck metadata as returned by the deck service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeckRecord {
    pub deck_id: DeckId,
    pub name: String,
    pub format: String,
    #[serde(default)]
    pub deck_color: Option<String>,
    #[serde(default)]
    pub total_cards: u32,
}

/// One row of a deck's contents on the wire.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeckEntryRecord {
    pub card_id: CardId,
    pub card_name: String,
    #[serde(default)]
    pub card_type: String,
    #[serde(default)]
    pub mana_cost: String,
    pub copies: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCardRequest {
    pub card_id: CardId,
    pub copies: u32,
}

#[derive(Debug, Serialize)]
pub struct UpdateCopiesRequest {
    pub copies: u32,
}
