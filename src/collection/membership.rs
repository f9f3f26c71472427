use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api::client::CollectionApi;
use crate::deck::contents::DeckEntry;
use crate::logger;
use crate::models::collection::CollectionCard;
use crate::models::deck::CardId;

/// Which cards the user owns at least one physical copy of.
///
/// Informational only. An empty map answers "owned" for every card so nothing is
/// flagged as missing before the collection has arrived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionMembershipMap {
    owned: HashMap<CardId, bool>,
}

impl CollectionMembershipMap {
    pub fn from_cards(cards: &[CollectionCard]) -> Self {
        let mut owned = HashMap::with_capacity(cards.len());
        for card in cards {
            let entry = owned.entry(card.card_id).or_insert(false);
            *entry = *entry || card.owned_copies() > 0;
        }
        Self { owned }
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    pub fn is_card_in_collection(&self, card_id: CardId) -> bool {
        if self.owned.is_empty() {
            return true;
        }
        self.owned.get(&card_id).copied().unwrap_or(false)
    }
}

/// Loads and caches the membership map, reloading only when the deck's card set changes.
pub struct MembershipResolver {
    api: Arc<dyn CollectionApi>,
    membership: RwLock<CollectionMembershipMap>,
    loaded_for: RwLock<Option<Vec<CardId>>>,
}

impl MembershipResolver {
    pub fn new(api: Arc<dyn CollectionApi>) -> Self {
        Self {
            api,
            membership: RwLock::new(CollectionMembershipMap::default()),
            loaded_for: RwLock::new(None),
        }
    }

    /// Fetches the collection and rebuilds the map. A failed fetch leaves the map empty.
    pub async fn load_membership(&self, entries: &[DeckEntry]) -> CollectionMembershipMap {
        let card_ids = sorted_ids(entries);
        let map = match self.api.get_user_collection_cards().await {
            Ok(cards) => {
                logger!(DEBUG, "[COLLECTION] Loaded {} collection cards", cards.len());
                CollectionMembershipMap::from_cards(&cards)
            }
            Err(error) => {
                logger!(WARN, "[COLLECTION] Unable to load collection ({error})");
                CollectionMembershipMap::default()
            }
        };

        *self.membership.write().await = map.clone();
        *self.loaded_for.write().await = Some(card_ids);
        map
    }

    /// Reloads when `entries` holds a different set of cards than the last load.
    pub async fn sync(&self, entries: &[DeckEntry]) -> bool {
        let card_ids = sorted_ids(entries);
        if self.loaded_for.read().await.as_ref() == Some(&card_ids) {
            return false;
        }
        self.load_membership(entries).await;
        true
    }

    pub async fn is_card_in_collection(&self, card_id: CardId) -> bool {
        self.membership.read().await.is_card_in_collection(card_id)
    }

    pub async fn snapshot(&self) -> CollectionMembershipMap {
        self.membership.read().await.clone()
    }
}

fn sorted_ids(entries: &[DeckEntry]) -> Vec<CardId> {
    let mut ids: Vec<CardId> = entries.iter().map(|e| e.card_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::deck::DeckEntryRecord;
    use crate::utils::errors::ApiError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeCollection {
        cards: Option<Vec<CollectionCard>>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl CollectionApi for FakeCollection {
        async fn get_user_collection_cards(&self) -> Result<Vec<CollectionCard>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.cards
                .clone()
                .ok_or_else(|| ApiError::Network("connection reset".into()))
        }
    }

    fn owned(card_id: CardId, copies: Option<u32>, quantity: Option<u32>) -> CollectionCard {
        CollectionCard {
            card_id,
            copies,
            quantity,
        }
    }

    fn entry(card_id: CardId) -> DeckEntry {
        DeckEntry::from(DeckEntryRecord {
            card_id,
            card_name: format!("Card {card_id}"),
            card_type: "Instant".into(),
            mana_cost: "{R}".into(),
            copies: 1,
        })
    }

    #[test]
    fn test_empty_map_fails_open() {
        let map = CollectionMembershipMap::default();
        assert!(map.is_card_in_collection(12345));
    }

    #[test]
    fn test_map_uses_both_count_fields() {
        let map = CollectionMembershipMap::from_cards(&[
            owned(1, Some(2), None),
            owned(2, None, Some(1)),
            owned(3, Some(0), None),
        ]);
        assert!(map.is_card_in_collection(1));
        assert!(map.is_card_in_collection(2));
        assert!(!map.is_card_in_collection(3));
        assert!(!map.is_card_in_collection(4));
    }

    #[tokio::test]
    async fn test_failed_load_reports_everything_owned() {
        let resolver = MembershipResolver::new(Arc::new(FakeCollection {
            cards: None,
            calls: AtomicU32::new(0),
        }));
        let map = resolver.load_membership(&[entry(1)]).await;
        assert!(map.is_empty());
        assert!(resolver.is_card_in_collection(1).await);
    }

    #[tokio::test]
    async fn test_sync_reloads_only_on_card_set_change() {
        let api = Arc::new(FakeCollection {
            cards: Some(vec![owned(1, Some(1), None)]),
            calls: AtomicU32::new(0),
        });
        let resolver = MembershipResolver::new(api.clone());

        assert!(resolver.sync(&[entry(1)]).await);
        assert!(!resolver.sync(&[entry(1)]).await);
        assert!(resolver.sync(&[entry(1), entry(2)]).await);
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
        assert!(!resolver.is_card_in_collection(2).await);
    }
}
