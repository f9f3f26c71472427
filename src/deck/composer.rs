use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::api::client::{CatalogApi, CollectionApi, DeckApi};
use crate::collection::membership::MembershipResolver;
use crate::deck::contents::{Deck, DeckEntry};
use crate::deck::format_rules::{can_increase, max_copies_for, violation_message};
use crate::deck::grouping::{group_entries, BaseType, CardGroup, Groupable};
use crate::deck::notices::NoticeBoard;
use crate::deck::state::QuantityOverlay;
use crate::logger;
use crate::models::card::{CardSearchFilters, CardSummary};
use crate::models::deck::{CardId, DeckId};
use crate::models::settings::Settings;
use crate::utils::errors::{ApiError, CompositionError, DeckLoadError};
use crate::utils::retry::{retry_read, RetryOutcome, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposerConfig {
    pub retry: RetryPolicy,
    pub success_ttl: Duration,
    pub error_ttl: Duration,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        ComposerConfig::from(&Settings::default())
    }
}

impl From<&Settings> for ComposerConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            retry: settings.retry_policy(),
            success_ttl: settings.success_notice_ttl(),
            error_ttl: settings.error_notice_ttl(),
        }
    }
}

/// What a quantity request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Applied(u32),
    /// Zero targets are ignored, as is a second add of a card whose first add is in flight.
    Ignored,
    Unchanged,
    /// A newer request for the same card was issued before this one settled.
    Superseded,
}

/// One row of the rendered deck listing.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryView {
    pub entry: DeckEntry,
    /// The optimistic count, which may differ from `entry.copies` while pending.
    pub copies: u32,
    pub pending: bool,
    pub in_collection: bool,
    pub can_increase: bool,
    pub can_decrease: bool,
}

impl Groupable for EntryView {
    fn base_type(&self) -> BaseType {
        self.entry.base_type
    }

    fn sort_name(&self) -> &str {
        &self.entry.card_name
    }
}

/// Owns a deck's working entry list for one editing session.
///
/// Every mutation goes through the format rules, an optimistic overlay update, the
/// deck service, and then either an authoritative refetch or a rollback.
pub struct DeckComposer {
    deck_api: Arc<dyn DeckApi>,
    catalog: Arc<dyn CatalogApi>,
    membership: MembershipResolver,
    config: ComposerConfig,
    notices: NoticeBoard,
    deck: Arc<RwLock<Option<Deck>>>,
    overlay: Arc<RwLock<QuantityOverlay>>,
    edit_mode: Arc<RwLock<bool>>,
    /// Cards with an add request in flight.
    adding: Arc<RwLock<HashSet<CardId>>>,
    disposed: Arc<RwLock<bool>>,
}

impl DeckComposer {
    pub fn new(
        deck_api: Arc<dyn DeckApi>,
        catalog: Arc<dyn CatalogApi>,
        collection: Arc<dyn CollectionApi>,
        config: ComposerConfig,
    ) -> Self {
        Self {
            deck_api,
            catalog,
            membership: MembershipResolver::new(collection),
            notices: NoticeBoard::new(config.success_ttl, config.error_ttl),
            config,
            deck: Arc::new(RwLock::new(None)),
            overlay: Arc::new(RwLock::new(QuantityOverlay::default())),
            edit_mode: Arc::new(RwLock::new(false)),
            adding: Arc::new(RwLock::new(HashSet::new())),
            disposed: Arc::new(RwLock::new(false)),
        }
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub async fn deck(&self) -> Option<Deck> {
        self.deck.read().await.clone()
    }

    /// The copy count currently shown for `card_id`.
    pub async fn displayed_copies(&self, card_id: CardId) -> Option<u32> {
        self.overlay.read().await.displayed(card_id)
    }

    pub async fn is_disposed(&self) -> bool {
        *self.disposed.read().await
    }

    /// Marks the view as torn down; responses still in flight are discarded when they land.
    pub async fn dispose(&self) {
        *self.disposed.write().await = true;
        logger!(DEBUG, "[DECK] Composer disposed");
    }

    /// Initial load of deck, entries and collection membership.
    ///
    /// Failures are terminal for this load; calling `load` again is the manual retry.
    pub async fn load(&self, deck_id: DeckId) -> Result<(), DeckLoadError> {
        let deck = self.fetch_deck(deck_id).await?;
        if self.is_disposed().await {
            return Ok(());
        }
        logger!(
            INFO,
            "[DECK] Loaded `{}` ({}, {} entries)",
            &deck.name,
            deck.format,
            deck.entries.len()
        );
        self.membership.load_membership(&deck.entries).await;
        self.install(deck).await;
        Ok(())
    }

    /// Refetches the deck after a mutation so server-derived fields stay consistent.
    pub async fn refresh(&self) -> Result<(), CompositionError> {
        let deck_id = self.deck_id().await?;
        match self.fetch_deck(deck_id).await {
            Ok(deck) => {
                if self.is_disposed().await {
                    return Err(CompositionError::Disposed);
                }
                self.membership.sync(&deck.entries).await;
                self.install(deck).await;
                Ok(())
            }
            Err(error) => {
                logger!(ERROR, "[DECK] Refresh of deck {deck_id} failed ({error})");
                if !self.is_disposed().await {
                    self.notices.post_error(error.user_message()).await;
                }
                match error {
                    DeckLoadError::Api(api) | DeckLoadError::RetriesExhausted { last: api, .. } => {
                        Err(CompositionError::Api(api))
                    }
                    DeckLoadError::Format(format) => {
                        Err(CompositionError::FormatViolation(format.to_string()))
                    }
                }
            }
        }
    }

    /// Requests an absolute copy count for a card already in the deck.
    pub async fn change_quantity(
        &self,
        card_id: CardId,
        requested: u32,
    ) -> Result<QuantityChange, CompositionError> {
        if self.is_disposed().await {
            return Err(CompositionError::Disposed);
        }
        if requested == 0 {
            return Ok(QuantityChange::Ignored);
        }

        let (deck_id, format, entry) = {
            let guard = self.deck.read().await;
            let deck = guard.as_ref().ok_or(CompositionError::NoDeckLoaded)?;
            let entry = deck
                .entry(card_id)
                .cloned()
                .ok_or(CompositionError::UnknownCard(card_id))?;
            (deck.deck_id, deck.format, entry)
        };

        let ticket = {
            let mut overlay = self.overlay.write().await;
            let current = overlay.displayed(card_id).unwrap_or(entry.copies);
            if requested == current {
                return Ok(QuantityChange::Unchanged);
            }
            if requested > current
                && (!can_increase(current, format, entry.kind)
                    || !max_copies_for(format, entry.kind).permits(requested))
            {
                drop(overlay);
                let message = violation_message(format, entry.kind);
                logger!(
                    WARN,
                    "[DECK] Rejected {} -> {requested} copies of `{}` ({message})",
                    current,
                    &entry.card_name
                );
                self.notices.post_error(message.clone()).await;
                return Err(CompositionError::FormatViolation(message));
            }
            overlay
                .begin(card_id, requested)
                .ok_or(CompositionError::UnknownCard(card_id))?
        };

        logger!(
            DEBUG,
            "[DECK] Updating `{}` to {requested} copies (v{})",
            &entry.card_name,
            ticket.version
        );
        let result = self.update_and_recolor(deck_id, card_id, requested).await;

        if self.is_disposed().await {
            logger!(DEBUG, "[DECK] Discarding response for card {card_id} after dispose");
            return Err(CompositionError::Disposed);
        }

        match result {
            Ok(()) => {
                if !self.overlay.write().await.confirm(ticket) {
                    // The server holds the older value now; refetch so the view follows it.
                    logger!(
                        DEBUG,
                        "[DECK] Stale success for card {card_id} (v{}), refreshing",
                        ticket.version
                    );
                    let _ = self.refresh().await;
                    return Ok(QuantityChange::Superseded);
                }
                self.notices.dismiss_error().await;
                let _ = self.refresh().await;
                Ok(QuantityChange::Applied(requested))
            }
            Err(error) => {
                match self.overlay.write().await.roll_back(ticket) {
                    Some(restored) => logger!(
                        WARN,
                        "[DECK] Rolled `{}` back to {restored} copies ({error})",
                        &entry.card_name
                    ),
                    None => {
                        logger!(
                            DEBUG,
                            "[DECK] Stale failure for card {card_id} (v{}) ignored",
                            ticket.version
                        );
                        return Ok(QuantityChange::Superseded);
                    }
                }
                self.notices
                    .post_error(error.user_message("Failed to update card quantity"))
                    .await;
                Err(CompositionError::Api(error))
            }
        }
    }

    pub async fn increase(&self, card_id: CardId) -> Result<QuantityChange, CompositionError> {
        let current = self
            .displayed_copies(card_id)
            .await
            .ok_or(CompositionError::UnknownCard(card_id))?;
        self.change_quantity(card_id, current + 1).await
    }

    /// Decrements stop at one copy.
    pub async fn decrease(&self, card_id: CardId) -> Result<QuantityChange, CompositionError> {
        let current = self
            .displayed_copies(card_id)
            .await
            .ok_or(CompositionError::UnknownCard(card_id))?;
        if current <= 1 {
            return Ok(QuantityChange::Ignored);
        }
        self.change_quantity(card_id, current - 1).await
    }

    pub async fn can_increase(&self, card_id: CardId) -> bool {
        let guard = self.deck.read().await;
        let Some(deck) = guard.as_ref() else {
            return false;
        };
        let Some(entry) = deck.entry(card_id) else {
            return false;
        };
        let current = self.overlay.read().await.displayed(card_id).unwrap_or(entry.copies);
        can_increase(current, deck.format, entry.kind)
    }

    /// Whether the decrement control is enabled.
    pub async fn can_decrease(&self, card_id: CardId) -> bool {
        matches!(self.displayed_copies(card_id).await, Some(copies) if copies > 1)
    }

    /// Adds a search result to the deck with one copy.
    ///
    /// A card already in the deck goes through `change_quantity` instead so the copy
    /// limit is checked before anything is sent. Adds are not idempotent, so a repeated
    /// add while the first is still in flight is ignored.
    pub async fn add_card(&self, card: &CardSummary) -> Result<QuantityChange, CompositionError> {
        if self.is_disposed().await {
            return Err(CompositionError::Disposed);
        }
        let deck_id = self.deck_id().await?;
        if let Some(current) = self.displayed_copies(card.card_id).await {
            return self.change_quantity(card.card_id, current + 1).await;
        }

        if !self.adding.write().await.insert(card.card_id) {
            logger!(DEBUG, "[DECK] Add of `{}` already in flight", &card.card_name);
            return Ok(QuantityChange::Ignored);
        }
        let outcome = self.send_add(deck_id, card).await;
        self.adding.write().await.remove(&card.card_id);
        outcome
    }

    async fn send_add(
        &self,
        deck_id: DeckId,
        card: &CardSummary,
    ) -> Result<QuantityChange, CompositionError> {
        let result = match self.deck_api.add_card_to_deck(deck_id, card.card_id).await {
            Ok(()) => {
                self.recolor(deck_id).await;
                Ok(())
            }
            Err(error) => Err(error),
        };
        if self.is_disposed().await {
            return Err(CompositionError::Disposed);
        }

        match result {
            Ok(()) => {
                logger!(INFO, "[DECK] Added `{}` to deck {deck_id}", &card.card_name);
                self.notices
                    .post_success(format!("{} added to deck", card.card_name))
                    .await;
                let _ = self.refresh().await;
                Ok(QuantityChange::Applied(1))
            }
            Err(error) => {
                logger!(ERROR, "[DECK] Unable to add `{}` ({error})", &card.card_name);
                self.notices
                    .post_error(error.user_message("Failed to add card to deck"))
                    .await;
                Err(CompositionError::Api(error))
            }
        }
    }

    /// Deletes a card's entry regardless of its copy count.
    ///
    /// The listing only changes once the refetch lands.
    pub async fn remove_card(&self, card_id: CardId) -> Result<(), CompositionError> {
        if self.is_disposed().await {
            return Err(CompositionError::Disposed);
        }
        let deck_id = self.deck_id().await?;

        let result = match self.deck_api.remove_entry_from_deck(deck_id, card_id).await {
            Ok(()) | Err(ApiError::NotFound(_)) => {
                self.recolor(deck_id).await;
                Ok(())
            }
            Err(error) => Err(error),
        };
        if self.is_disposed().await {
            return Err(CompositionError::Disposed);
        }

        match result {
            Ok(()) => {
                logger!(INFO, "[DECK] Removed card {card_id} from deck {deck_id}");
                let _ = self.refresh().await;
                Ok(())
            }
            Err(error) => {
                logger!(ERROR, "[DECK] Unable to remove card {card_id} ({error})");
                self.notices
                    .post_error(error.user_message("Failed to remove card from deck"))
                    .await;
                Err(CompositionError::Api(error))
            }
        }
    }

    /// Deletes the whole deck and tears the composer down.
    pub async fn delete_deck(&self) -> Result<(), CompositionError> {
        let deck_id = self.deck_id().await?;
        match self.deck_api.delete_deck(deck_id).await {
            Ok(()) | Err(ApiError::NotFound(_)) => {
                logger!(INFO, "[DECK] Deleted deck {deck_id}");
                self.dispose().await;
                *self.deck.write().await = None;
                Ok(())
            }
            Err(error) => {
                self.notices
                    .post_error(error.user_message("Failed to delete deck"))
                    .await;
                Err(CompositionError::Api(error))
            }
        }
    }

    pub async fn search(
        &self,
        filters: &CardSearchFilters,
    ) -> Result<Vec<CardSummary>, CompositionError> {
        self.catalog.search_cards(filters).await.map_err(|error| {
            logger!(WARN, "[DECK] Card search failed ({error})");
            CompositionError::Api(error)
        })
    }

    /// An empty deck is always in edit mode.
    pub async fn edit_mode(&self) -> bool {
        let empty = self
            .deck
            .read()
            .await
            .as_ref()
            .map_or(true, |d| d.entries.is_empty());
        empty || *self.edit_mode.read().await
    }

    pub async fn toggle_edit_mode(&self) -> bool {
        if self.deck_is_empty().await {
            return true;
        }
        let mut edit_mode = self.edit_mode.write().await;
        *edit_mode = !*edit_mode;
        *edit_mode
    }

    pub async fn is_card_in_collection(&self, card_id: CardId) -> bool {
        self.membership.is_card_in_collection(card_id).await
    }

    /// The deck listing: buckets in display order, names sorted within each bucket.
    pub async fn grouped(&self) -> Vec<CardGroup<EntryView>> {
        let Some(deck) = self.deck().await else {
            return Vec::new();
        };
        let membership = self.membership.snapshot().await;
        let overlay = self.overlay.read().await;

        let views = deck
            .entries
            .into_iter()
            .map(|entry| {
                let copies = overlay.displayed(entry.card_id).unwrap_or(entry.copies);
                EntryView {
                    copies,
                    pending: overlay.is_pending(entry.card_id),
                    in_collection: membership.is_card_in_collection(entry.card_id),
                    can_increase: can_increase(copies, deck.format, entry.kind),
                    can_decrease: copies > 1,
                    entry,
                }
            })
            .collect();
        group_entries(views)
    }

    async fn deck_id(&self) -> Result<DeckId, CompositionError> {
        self.deck
            .read()
            .await
            .as_ref()
            .map(|d| d.deck_id)
            .ok_or(CompositionError::NoDeckLoaded)
    }

    async fn deck_is_empty(&self) -> bool {
        self.deck
            .read()
            .await
            .as_ref()
            .map_or(true, |d| d.entries.is_empty())
    }

    async fn fetch_deck(&self, deck_id: DeckId) -> Result<Deck, DeckLoadError> {
        let policy = self.config.retry;
        let record = retry_read(policy, "getDeck", move || async move {
            self.deck_api.get_deck(deck_id).await
        })
        .await
        .map_err(into_load_error)?;
        let entries = retry_read(policy, "getDeckEntries", move || async move {
            match self.deck_api.get_deck_entries(deck_id).await {
                Err(ApiError::NotFound(_)) => Ok(Vec::new()),
                other => other,
            }
        })
        .await
        .map_err(into_load_error)?;
        Ok(Deck::ingest(record, entries)?)
    }

    /// Stores an authoritative deck and re-seeds the overlay from it.
    async fn install(&self, deck: Deck) {
        self.overlay.write().await.seed(&deck.entries);
        if deck.entries.is_empty() {
            *self.edit_mode.write().await = true;
        }
        *self.deck.write().await = Some(deck);
    }

    async fn update_and_recolor(
        &self,
        deck_id: DeckId,
        card_id: CardId,
        copies: u32,
    ) -> Result<(), ApiError> {
        self.deck_api
            .update_entry_quantity(deck_id, card_id, copies)
            .await?;
        self.recolor(deck_id).await;
        Ok(())
    }

    /// Deck color is derived data; a failed recompute is logged and left to the next mutation.
    async fn recolor(&self, deck_id: DeckId) {
        if let Err(error) = self.deck_api.recompute_deck_color(deck_id).await {
            logger!(WARN, "[DECK] Color recompute for deck {deck_id} failed ({error})");
        }
    }
}

fn into_load_error(outcome: RetryOutcome) -> DeckLoadError {
    match outcome {
        RetryOutcome::Failed(error) => DeckLoadError::Api(error),
        RetryOutcome::Exhausted {
            attempts,
            last_error,
        } => DeckLoadError::RetriesExhausted {
            attempts,
            last: last_error,
        },
    }
}
