use crate::deck::format_rules::{CardKind, GameFormat};
use crate::deck::grouping::{BaseType, Groupable};
use crate::models::deck::{CardId, DeckEntryRecord, DeckId, DeckRecord};
use crate::utils::errors::FormatError;

/// A deck and its entries as last confirmed by the deck service.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub deck_id: DeckId,
    pub name: String,
    pub format: GameFormat,
    /// Recomputed server side after every mutation.
    pub deck_color: Option<String>,
    /// Only trustworthy right after a refetch.
    pub total_cards: u32,
    pub entries: Vec<DeckEntry>,
}

impl Deck {
    /// Converts the wire records, failing on a format this client has no rules for.
    pub fn ingest(record: DeckRecord, entries: Vec<DeckEntryRecord>) -> Result<Self, FormatError> {
        let format = record.format.parse::<GameFormat>()?;
        Ok(Self {
            deck_id: record.deck_id,
            name: record.name,
            format,
            deck_color: record.deck_color,
            total_cards: record.total_cards,
            entries: entries.into_iter().map(DeckEntry::from).collect(),
        })
    }

    pub fn entry(&self, card_id: CardId) -> Option<&DeckEntry> {
        self.entries.iter().find(|e| e.card_id == card_id)
    }
}

/// A deck row with its rules classification settled at ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckEntry {
    pub card_id: CardId,
    pub card_name: String,
    pub card_type: String,
    pub mana_cost: ManaCost,
    /// Last count confirmed by the server.
    pub copies: u32,
    pub kind: CardKind,
    pub base_type: BaseType,
}

impl From<DeckEntryRecord> for DeckEntry {
    fn from(record: DeckEntryRecord) -> Self {
        Self {
            kind: CardKind::classify(&record.card_type),
            base_type: BaseType::classify(&record.card_type),
            mana_cost: ManaCost::parse(&record.mana_cost),
            card_id: record.card_id,
            card_name: record.card_name,
            card_type: record.card_type,
            copies: record.copies,
        }
    }
}

impl Groupable for DeckEntry {
    fn base_type(&self) -> BaseType {
        self.base_type
    }

    fn sort_name(&self) -> &str {
        &self.card_name
    }
}

/// A cost encoded as bracketed symbols, e.g. `{2}{W}{W}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManaCost {
    pub symbols: Vec<String>,
}

impl ManaCost {
    /// Malformed text (unbalanced or stray characters) yields an empty cost.
    pub fn parse(encoded: &str) -> Self {
        let mut symbols = Vec::new();
        let mut rest = encoded.trim();
        while !rest.is_empty() {
            let Some(inner) = rest.strip_prefix('{') else {
                return ManaCost::default();
            };
            let Some(end) = inner.find('}') else {
                return ManaCost::default();
            };
            symbols.push(inner[..end].to_string());
            rest = &inner[end + 1..];
        }
        Self { symbols }
    }

    pub fn mana_value(&self) -> u32 {
        self.symbols
            .iter()
            .map(|symbol| match symbol.parse::<u32>() {
                Ok(generic) => generic,
                Err(_) if symbol.eq_ignore_ascii_case("X") => 0,
                Err(_) => 1,
            })
            .sum()
    }
}
