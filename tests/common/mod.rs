#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use deck_workbench::api::client::{CatalogApi, CollectionApi, DeckApi};
use deck_workbench::deck::composer::{ComposerConfig, DeckComposer};
use deck_workbench::models::card::{CardSearchFilters, CardSummary};
use deck_workbench::models::collection::CollectionCard;
use deck_workbench::models::deck::{CardId, DeckEntryRecord, DeckId, DeckRecord};
use deck_workbench::utils::errors::ApiError;
use deck_workbench::utils::retry::RetryPolicy;

/// Scripted outcome for one `update_entry_quantity` call.
pub struct UpdateScript {
    pub release: Option<oneshot::Receiver<()>>,
    pub outcome: Result<(), ApiError>,
}

#[derive(Default)]
pub struct FakeState {
    pub deck: Option<DeckRecord>,
    pub entries: Vec<DeckEntryRecord>,
    pub catalog: Vec<CardSummary>,
    pub collection: Vec<CollectionCard>,
    pub collection_fails: bool,
    pub deck_read_failures: VecDeque<ApiError>,
    pub entries_missing: bool,
    pub update_scripts: VecDeque<UpdateScript>,
    pub add_failure: Option<ApiError>,
    pub add_gate: Option<oneshot::Receiver<()>>,
    pub update_calls: Vec<(DeckId, CardId, u32)>,
    pub add_calls: Vec<(DeckId, CardId)>,
    pub remove_calls: Vec<(DeckId, CardId)>,
    pub color_calls: u32,
    pub deck_reads: u32,
    pub collection_reads: u32,
    pub deleted: bool,
}

/// In-memory stand-in for the deck, catalog and collection services.
#[derive(Clone, Default)]
pub struct FakeDeckService {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeDeckService {
    pub fn with_deck(deck_id: DeckId, format: &str, entries: Vec<DeckEntryRecord>) -> Self {
        let service = FakeDeckService::default();
        {
            let mut state = service.state.lock().unwrap();
            state.deck = Some(DeckRecord {
                deck_id,
                name: "Test deck".to_string(),
                format: format.to_string(),
                deck_color: None,
                total_cards: entries.iter().map(|e| e.copies).sum(),
            });
            state.entries = entries;
        }
        service
    }

    pub fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Holds the next update until the returned sender fires, then applies `outcome`.
    pub fn gate_next_update(&self, outcome: Result<(), ApiError>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().update_scripts.push_back(UpdateScript {
            release: Some(rx),
            outcome,
        });
        tx
    }

    /// Holds the next add until the returned sender fires.
    pub fn gate_next_add(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().add_gate = Some(rx);
        tx
    }

    pub fn fail_next_update(&self, error: ApiError) {
        self.lock().update_scripts.push_back(UpdateScript {
            release: None,
            outcome: Err(error),
        });
    }

    pub fn composer(&self) -> DeckComposer {
        let api = Arc::new(self.clone());
        DeckComposer::new(api.clone(), api.clone(), api, test_config())
    }
}

pub fn test_config() -> ComposerConfig {
    ComposerConfig {
        retry: RetryPolicy {
            attempts: 3,
            backoff: Duration::from_millis(1),
        },
        success_ttl: Duration::from_secs(3),
        error_ttl: Duration::from_secs(10),
    }
}

pub fn record(card_id: CardId, name: &str, card_type: &str, copies: u32) -> DeckEntryRecord {
    DeckEntryRecord {
        card_id,
        card_name: name.to_string(),
        card_type: card_type.to_string(),
        mana_cost: "{1}".to_string(),
        copies,
    }
}

pub fn summary(card_id: CardId, name: &str, card_type: &str) -> CardSummary {
    CardSummary {
        card_id,
        card_name: name.to_string(),
        card_type: card_type.to_string(),
        mana_cost: "{2}{G}".to_string(),
        set_code: Some("TST".to_string()),
    }
}

#[async_trait]
impl DeckApi for FakeDeckService {
    async fn get_deck(&self, deck_id: DeckId) -> Result<DeckRecord, ApiError> {
        let mut state = self.lock();
        state.deck_reads += 1;
        if let Some(error) = state.deck_read_failures.pop_front() {
            return Err(error);
        }
        match &state.deck {
            Some(deck) if deck.deck_id == deck_id && !state.deleted => {
                let mut deck = deck.clone();
                deck.total_cards = state.entries.iter().map(|e| e.copies).sum();
                Ok(deck)
            }
            _ => Err(ApiError::NotFound(format!("deck {deck_id}"))),
        }
    }

    async fn get_deck_entries(&self, deck_id: DeckId) -> Result<Vec<DeckEntryRecord>, ApiError> {
        let state = self.lock();
        if state.entries_missing {
            return Err(ApiError::NotFound(format!("entries of deck {deck_id}")));
        }
        Ok(state.entries.clone())
    }

    async fn add_card_to_deck(&self, deck_id: DeckId, card_id: CardId) -> Result<(), ApiError> {
        let gate = {
            let mut state = self.lock();
            state.add_calls.push((deck_id, card_id));
            state.add_gate.take()
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let mut state = self.lock();
        if let Some(error) = state.add_failure.clone() {
            return Err(error);
        }
        let card = state
            .catalog
            .iter()
            .find(|c| c.card_id == card_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("card {card_id}")))?;
        state.entries.push(DeckEntryRecord {
            card_id,
            card_name: card.card_name,
            card_type: card.card_type,
            mana_cost: card.mana_cost,
            copies: 1,
        });
        Ok(())
    }

    async fn update_entry_quantity(
        &self,
        deck_id: DeckId,
        card_id: CardId,
        copies: u32,
    ) -> Result<(), ApiError> {
        let script = {
            let mut state = self.lock();
            state.update_calls.push((deck_id, card_id, copies));
            state.update_scripts.pop_front()
        };
        let outcome = match script {
            Some(UpdateScript { release, outcome }) => {
                if let Some(release) = release {
                    let _ = release.await;
                }
                outcome
            }
            None => Ok(()),
        };
        if outcome.is_ok() {
            let mut state = self.lock();
            if let Some(entry) = state.entries.iter_mut().find(|e| e.card_id == card_id) {
                entry.copies = copies;
            }
        }
        outcome
    }

    async fn remove_entry_from_deck(
        &self,
        deck_id: DeckId,
        card_id: CardId,
    ) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.remove_calls.push((deck_id, card_id));
        let before = state.entries.len();
        state.entries.retain(|e| e.card_id != card_id);
        if state.entries.len() == before {
            return Err(ApiError::NotFound(format!("card {card_id}")));
        }
        Ok(())
    }

    async fn recompute_deck_color(&self, _deck_id: DeckId) -> Result<(), ApiError> {
        self.lock().color_calls += 1;
        Ok(())
    }

    async fn delete_deck(&self, _deck_id: DeckId) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.deleted = true;
        state.entries.clear();
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for FakeDeckService {
    async fn search_cards(
        &self,
        filters: &CardSearchFilters,
    ) -> Result<Vec<CardSummary>, ApiError> {
        let needle = filters.name.clone().unwrap_or_default().to_lowercase();
        Ok(self
            .lock()
            .catalog
            .iter()
            .filter(|c| c.card_name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CollectionApi for FakeDeckService {
    async fn get_user_collection_cards(&self) -> Result<Vec<CollectionCard>, ApiError> {
        let mut state = self.lock();
        state.collection_reads += 1;
        if state.collection_fails {
            return Err(ApiError::Timeout);
        }
        Ok(state.collection.clone())
    }
}
