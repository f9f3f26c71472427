use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::api::session::Session;
use crate::logger;
use crate::models::card::{CardSearchFilters, CardSummary};
use crate::models::collection::CollectionCard;
use crate::models::deck::{
    AddCardRequest, CardId, DeckEntryRecord, DeckId, DeckRecord, UpdateCopiesRequest,
};
use crate::models::http_response::ErrorBody;
use crate::models::settings::Settings;
use crate::utils::errors::ApiError;

/// Deck read and mutation operations offered by the deck service.
#[async_trait]
pub trait DeckApi: Send + Sync {
    async fn get_deck(&self, deck_id: DeckId) -> Result<DeckRecord, ApiError>;

    /// A deck without entries support answers 404, which reads as an empty list.
    async fn get_deck_entries(&self, deck_id: DeckId) -> Result<Vec<DeckEntryRecord>, ApiError>;

    async fn add_card_to_deck(&self, deck_id: DeckId, card_id: CardId) -> Result<(), ApiError>;

    async fn update_entry_quantity(
        &self,
        deck_id: DeckId,
        card_id: CardId,
        copies: u32,
    ) -> Result<(), ApiError>;

    /// Idempotent: removing an absent entry succeeds.
    async fn remove_entry_from_deck(&self, deck_id: DeckId, card_id: CardId)
        -> Result<(), ApiError>;

    async fn recompute_deck_color(&self, deck_id: DeckId) -> Result<(), ApiError>;

    async fn delete_deck(&self, deck_id: DeckId) -> Result<(), ApiError>;
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn search_cards(&self, filters: &CardSearchFilters) -> Result<Vec<CardSummary>, ApiError>;
}

#[async_trait]
pub trait CollectionApi: Send + Sync {
    async fn get_user_collection_cards(&self) -> Result<Vec<CollectionCard>, ApiError>;
}

/// REST implementation of every collaborator trait.
pub struct HttpApi {
    client: reqwest::Client,
    api_server: String,
    session: Arc<Session>,
}

impl HttpApi {
    pub fn new(settings: &Settings, session: Arc<Session>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ApiError::from_transport(&e))?;
        Ok(HttpApi::with_client(client, &settings.api_server, session))
    }

    pub fn with_client(client: reqwest::Client, api_server: &str, session: Arc<Session>) -> Self {
        Self {
            client,
            api_server: api_server.trim_end_matches('/').to_string(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_server, path)
    }

    /// Sends an authenticated request and maps non-success statuses to errors.
    ///
    /// A 401/403 gets one session refresh and one replay of the same request.
    async fn send<F>(&self, resource: &str, build: F) -> Result<Response, ApiError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder + Send + Sync,
    {
        let response = self.send_once(&build).await?;
        if !is_auth_status(response.status()) {
            return HttpApi::check(response, resource).await;
        }

        logger!(WARN, "[API] `{resource}` answered {}, refreshing session", response.status());
        match self.session.refresh().await {
            Ok(()) => {
                let replay = self.send_once(&build).await?;
                HttpApi::check(replay, resource).await
            }
            Err(error) => {
                logger!(ERROR, "[API] Unable to refresh session ({error})");
                HttpApi::check(response, resource).await
            }
        }
    }

    async fn send_once<F>(&self, build: &F) -> Result<Response, ApiError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder + Send + Sync,
    {
        let mut request = build(&self.client);
        if let Some(token) = self.session.token().await {
            request = request.bearer_auth(token);
        }
        request.send().await.map_err(|e| ApiError::from_transport(&e))
    }

    async fn check(response: Response, resource: &str) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(
            status,
            resource,
            ErrorBody::message_from(&body),
        ))
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
        type_name: &str,
    ) -> Result<T, ApiError> {
        response.json::<T>().await.map_err(|e| {
            logger!(ERROR, "[API] {}", e.to_string());
            ApiError::InvalidResponseBody(type_name.to_string())
        })
    }
}

fn is_auth_status(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Treats 404 as success for deletes.
fn tolerate_missing(result: Result<Response, ApiError>) -> Result<(), ApiError> {
    match result {
        Ok(_) | Err(ApiError::NotFound(_)) => Ok(()),
        Err(error) => Err(error),
    }
}

#[async_trait]
impl DeckApi for HttpApi {
    async fn get_deck(&self, deck_id: DeckId) -> Result<DeckRecord, ApiError> {
        let url = self.url(&format!("/api/decks/{deck_id}"));
        let response = self
            .send(&format!("deck {deck_id}"), |c| c.get(&url))
            .await?;
        HttpApi::read_json(response, "DeckRecord").await
    }

    async fn get_deck_entries(&self, deck_id: DeckId) -> Result<Vec<DeckEntryRecord>, ApiError> {
        let url = self.url(&format!("/api/decks/{deck_id}/cards"));
        match self
            .send(&format!("entries of deck {deck_id}"), |c| c.get(&url))
            .await
        {
            Ok(response) => HttpApi::read_json(response, "Vec<DeckEntryRecord>").await,
            Err(ApiError::NotFound(_)) => {
                logger!(DEBUG, "[API] Deck {deck_id} has no entries endpoint, using empty list");
                Ok(Vec::new())
            }
            Err(error) => Err(error),
        }
    }

    async fn add_card_to_deck(&self, deck_id: DeckId, card_id: CardId) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/decks/{deck_id}/cards"));
        let body = AddCardRequest { card_id, copies: 1 };
        self.send(&format!("deck {deck_id}"), |c| c.post(&url).json(&body))
            .await?;
        Ok(())
    }

    async fn update_entry_quantity(
        &self,
        deck_id: DeckId,
        card_id: CardId,
        copies: u32,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/decks/{deck_id}/cards/{card_id}"));
        let body = UpdateCopiesRequest { copies };
        self.send(&format!("card {card_id} in deck {deck_id}"), |c| {
            c.put(&url).json(&body)
        })
        .await?;
        Ok(())
    }

    async fn remove_entry_from_deck(
        &self,
        deck_id: DeckId,
        card_id: CardId,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/decks/{deck_id}/cards/{card_id}"));
        tolerate_missing(
            self.send(&format!("card {card_id} in deck {deck_id}"), |c| {
                c.delete(&url)
            })
            .await,
        )
    }

    async fn recompute_deck_color(&self, deck_id: DeckId) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/decks/{deck_id}/color"));
        self.send(&format!("deck {deck_id}"), |c| c.post(&url))
            .await?;
        Ok(())
    }

    async fn delete_deck(&self, deck_id: DeckId) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/decks/{deck_id}"));
        tolerate_missing(
            self.send(&format!("deck {deck_id}"), |c| c.delete(&url))
                .await,
        )
    }
}

#[async_trait]
impl CatalogApi for HttpApi {
    async fn search_cards(
        &self,
        filters: &CardSearchFilters,
    ) -> Result<Vec<CardSummary>, ApiError> {
        let url = self.url("/api/cards/search");
        let response = self
            .send("card search", |c| c.get(&url).query(filters))
            .await?;
        HttpApi::read_json(response, "Vec<CardSummary>").await
    }
}

#[async_trait]
impl CollectionApi for HttpApi {
    async fn get_user_collection_cards(&self) -> Result<Vec<CollectionCard>, ApiError> {
        let url = self.url("/api/collection/cards");
        let response = self.send("collection", |c| c.get(&url)).await?;
        HttpApi::read_json(response, "Vec<CollectionCard>").await
    }
}
