use serde::{Deserialize, Serialize};

/// Error payload returned by the services on non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Extracts a human readable message from a raw response body, if there is one.
    pub fn message_from(body: &str) -> Option<String> {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.message.or(parsed.error),
            Err(_) if !body.trim().is_empty() && !body.trim_start().starts_with('{') => {
                Some(body.trim().to_string())
            }
            Err(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
