use std::collections::HashMap;

use crate::deck::contents::DeckEntry;
use crate::models::deck::CardId;

/// Lifecycle of one card's copy count while the deck is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Confirmed(u32),
    /// A request for `requested` copies is in flight; `confirmed` is the rollback target.
    Pending {
        confirmed: u32,
        requested: u32,
        version: u64,
    },
}

/// Handed out when a change starts and redeemed when its response settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeTicket {
    pub card_id: CardId,
    pub version: u64,
    pub requested: u32,
}

/// Optimistic copy counts shown before the server confirms them.
///
/// Only the latest ticket issued for a card may settle it; older completions are stale.
#[derive(Debug, Default)]
pub struct QuantityOverlay {
    states: HashMap<CardId, EntryState>,
    next_version: u64,
}

impl QuantityOverlay {
    /// Re-seeds from an authoritative entry list.
    ///
    /// Cards still pending keep their optimistic value but adopt the new confirmed count.
    pub fn seed(&mut self, entries: &[DeckEntry]) {
        let mut seeded = HashMap::with_capacity(entries.len());
        for entry in entries {
            let state = match self.states.get(&entry.card_id) {
                Some(EntryState::Pending {
                    requested, version, ..
                }) => EntryState::Pending {
                    confirmed: entry.copies,
                    requested: *requested,
                    version: *version,
                },
                _ => EntryState::Confirmed(entry.copies),
            };
            seeded.insert(entry.card_id, state);
        }
        self.states = seeded;
    }

    pub fn state(&self, card_id: CardId) -> Option<EntryState> {
        self.states.get(&card_id).copied()
    }

    /// The copy count to render for `card_id`.
    pub fn displayed(&self, card_id: CardId) -> Option<u32> {
        self.states.get(&card_id).map(|state| match state {
            EntryState::Confirmed(copies) => *copies,
            EntryState::Pending { requested, .. } => *requested,
        })
    }

    pub fn is_pending(&self, card_id: CardId) -> bool {
        matches!(self.states.get(&card_id), Some(EntryState::Pending { .. }))
    }

    /// Applies `requested` optimistically. Returns `None` for a card the overlay does not track.
    pub fn begin(&mut self, card_id: CardId, requested: u32) -> Option<ChangeTicket> {
        let confirmed = match self.states.get(&card_id)? {
            EntryState::Confirmed(copies) => *copies,
            EntryState::Pending { confirmed, .. } => *confirmed,
        };
        self.next_version += 1;
        let version = self.next_version;
        self.states.insert(
            card_id,
            EntryState::Pending {
                confirmed,
                requested,
                version,
            },
        );
        Some(ChangeTicket {
            card_id,
            version,
            requested,
        })
    }

    /// Settles a successful change. Returns false when the ticket is stale.
    ///
    /// A stale success still moves the rollback target of a newer pending change, since the
    /// server now holds `ticket.requested`.
    pub fn confirm(&mut self, ticket: ChangeTicket) -> bool {
        if !self.is_latest(ticket) {
            if let Some(EntryState::Pending { confirmed, .. }) =
                self.states.get_mut(&ticket.card_id)
            {
                *confirmed = ticket.requested;
            }
            return false;
        }
        self.states
            .insert(ticket.card_id, EntryState::Confirmed(ticket.requested));
        true
    }

    /// Settles a failed change, returning the restored count. `None` when the ticket is stale.
    pub fn roll_back(&mut self, ticket: ChangeTicket) -> Option<u32> {
        if !self.is_latest(ticket) {
            return None;
        }
        let Some(EntryState::Pending { confirmed, .. }) = self.states.get(&ticket.card_id).copied()
        else {
            return None;
        };
        self.states
            .insert(ticket.card_id, EntryState::Confirmed(confirmed));
        Some(confirmed)
    }

    fn is_latest(&self, ticket: ChangeTicket) -> bool {
        matches!(
            self.states.get(&ticket.card_id),
            Some(EntryState::Pending { version, .. }) if *version == ticket.version
        )
    }
}
