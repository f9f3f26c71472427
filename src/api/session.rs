use reqwest::StatusCode;
use tokio::sync::RwLock;

use crate::logger;
use crate::models::http_response::{ErrorBody, RefreshTokenRequest, RefreshTokenResponse};
use crate::models::settings::Settings;
use crate::utils::errors::{ApiError, SessionError};

#[derive(Debug, Default)]
struct Credentials {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Authentication state for one application session.
///
/// Opened explicitly from settings and closed on teardown; every API client borrows it.
pub struct Session {
    client: reqwest::Client,
    auth_server: String,
    credentials: RwLock<Option<Credentials>>,
}

impl Session {
    pub fn open(settings: &Settings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ApiError::from_transport(&e))?;
        Ok(Session::with_client(
            client,
            &settings.auth_server,
            settings.access_token.clone(),
            settings.refresh_token.clone(),
        ))
    }

    pub fn with_client(
        client: reqwest::Client,
        auth_server: &str,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            client,
            auth_server: auth_server.trim_end_matches('/').to_string(),
            credentials: RwLock::new(Some(Credentials {
                access_token,
                refresh_token,
            })),
        }
    }

    pub async fn is_open(&self) -> bool {
        self.credentials.read().await.is_some()
    }

    /// The bearer token to attach to requests, if any.
    pub async fn token(&self) -> Option<String> {
        self.credentials
            .read()
            .await
            .as_ref()
            .and_then(|c| c.access_token.clone())
    }

    /// Exchanges the refresh token for a new access token.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let refresh_token = match self.credentials.read().await.as_ref() {
            None => return Err(SessionError::Closed),
            Some(credentials) => credentials
                .refresh_token
                .clone()
                .ok_or(SessionError::MissingRefreshToken)?,
        };

        let api_url = format!("{}/api/auth/refresh", self.auth_server);
        let response = self
            .client
            .post(api_url)
            .json(&RefreshTokenRequest { refresh_token })
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;

        match response.status() {
            StatusCode::OK => {
                let tokens = response.json::<RefreshTokenResponse>().await.map_err(|e| {
                    logger!(ERROR, "[SESSION] {}", e.to_string());
                    ApiError::InvalidResponseBody("RefreshTokenResponse".to_string())
                })?;

                let mut guard = self.credentials.write().await;
                let credentials = guard.as_mut().ok_or(SessionError::Closed)?;
                credentials.access_token = Some(tokens.access_token);
                if let Some(rotated) = tokens.refresh_token {
                    credentials.refresh_token = Some(rotated);
                }
                logger!(INFO, "[SESSION] Access token refreshed");
                Ok(())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(SessionError::RefreshFailed(ApiError::from_status(
                    status,
                    "session",
                    ErrorBody::message_from(&body),
                )))
            }
        }
    }

    /// Drops the credentials. Later refreshes fail with `SessionError::Closed`.
    pub async fn close(&self) {
        *self.credentials.write().await = None;
        logger!(INFO, "[SESSION] Session closed");
    }
}
