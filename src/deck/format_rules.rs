use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::errors::FormatError;

/// The deck-building ruleset governing copy limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameFormat {
    Standard,
    Commander,
}

impl Display for GameFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            GameFormat::Standard => "Standard",
            GameFormat::Commander => "Commander",
        };
        write!(f, "{}", str)
    }
}

impl FromStr for GameFormat {
    type Err = FormatError;

    /// Parses the deck service's format value. Unknown formats are an error, never a default.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "STANDARD" => Ok(GameFormat::Standard),
            "COMMANDER" => Ok(GameFormat::Commander),
            _ => Err(FormatError::UnknownFormat(value.to_string())),
        }
    }
}

/// Rules-relevant classification of a card, decided once when the card is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardKind {
    BasicLand,
    NonBasic,
}

impl CardKind {
    pub fn classify(card_type: &str) -> Self {
        if is_basic_land(card_type) {
            CardKind::BasicLand
        } else {
            CardKind::NonBasic
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyLimit {
    Unbounded,
    AtMost(u32),
}

impl CopyLimit {
    pub fn permits(&self, copies: u32) -> bool {
        match self {
            CopyLimit::Unbounded => true,
            CopyLimit::AtMost(max) => copies <= *max,
        }
    }
}

/// True iff the type line contains both "basic" and "land", ignoring case.
///
/// The catalog must spell basic lands out literally ("Basic Land — Forest") for this to hold.
pub fn is_basic_land(card_type: &str) -> bool {
    let lowered = card_type.to_lowercase();
    lowered.contains("basic") && lowered.contains("land")
}

pub fn max_copies_for(format: GameFormat, kind: CardKind) -> CopyLimit {
    match (kind, format) {
        (CardKind::BasicLand, _) => CopyLimit::Unbounded,
        (CardKind::NonBasic, GameFormat::Commander) => CopyLimit::AtMost(1),
        (CardKind::NonBasic, GameFormat::Standard) => CopyLimit::AtMost(4),
    }
}

pub fn can_increase(current_copies: u32, format: GameFormat, kind: CardKind) -> bool {
    match max_copies_for(format, kind) {
        CopyLimit::Unbounded => true,
        CopyLimit::AtMost(max) => current_copies < max,
    }
}

/// Message shown when a change would exceed the format's copy limit.
pub fn violation_message(format: GameFormat, kind: CardKind) -> String {
    match (kind, max_copies_for(format, kind)) {
        (CardKind::BasicLand, _) | (_, CopyLimit::Unbounded) => {
            concat!(
                "Basic lands have no copy limit, but the change was rejected. ",
                "Reload the deck and try again."
            )
            .to_string()
        }
        (CardKind::NonBasic, CopyLimit::AtMost(1)) => {
            format!("{format} format only allows 1 copy of each non-basic card")
        }
        (CardKind::NonBasic, CopyLimit::AtMost(max)) => {
            format!("{format} format only allows {max} copies of each non-basic card")
        }
    }
}
