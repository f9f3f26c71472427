use reqwest::StatusCode;
use thiserror::Error;

/// Failures reported by the external deck, catalog and collection services.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Unable to reach the server: {0}")]
    Network(String),
    #[error("The request timed out")]
    Timeout,
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized request")]
    Unauthorized,
    #[error("Forbidden request")]
    Forbidden,
    #[error("Request rejected ({status}): {}", .message.as_deref().unwrap_or("NO MESSAGE"))]
    Rejected { status: u16, message: Option<String> },
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("NO MESSAGE"))]
    Server { status: u16, message: Option<String> },
    #[error("Invalid response body, expected `{0}`")]
    InvalidResponseBody(String),
}

impl ApiError {
    /// Maps a non-success HTTP status and its optional body message into an error.
    pub fn from_status(status: StatusCode, resource: &str, message: Option<String>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden,
            StatusCode::NOT_FOUND => ApiError::NotFound(resource.to_string()),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ApiError::Timeout,
            s if s.is_client_error() => ApiError::Rejected {
                status: s.as_u16(),
                message,
            },
            s => ApiError::Server {
                status: s.as_u16(),
                message,
            },
        }
    }

    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(error.to_string())
        }
    }

    /// True for 401/403-class failures which need re-authentication rather than a retry.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden)
    }

    /// True for failures worth retrying on read paths.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Timeout | ApiError::Server { .. }
        )
    }

    /// The single message shown to the user for this failure.
    ///
    /// A server supplied message is preferred verbatim over the generic wording.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Network(_) | ApiError::Timeout => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ApiError::Unauthorized | ApiError::Forbidden => {
                "Your session has expired, please login again.".to_string()
            }
            ApiError::Rejected {
                message: Some(message),
                ..
            }
            | ApiError::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormatError {
    #[error("Unknown deck format `{0}`")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompositionError {
    #[error("{0}")]
    FormatViolation(String),
    #[error("Card `{0}` is not part of this deck")]
    UnknownCard(i64),
    #[error("No deck has been loaded")]
    NoDeckLoaded,
    #[error("The deck view has been closed")]
    Disposed,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Terminal failures of the initial deck load; the caller may retry the load manually.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeckLoadError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: ApiError },
}

impl DeckLoadError {
    pub fn user_message(&self) -> String {
        match self {
            DeckLoadError::Api(error) | DeckLoadError::RetriesExhausted { last: error, .. } => {
                error.user_message("Failed to load deck")
            }
            DeckLoadError::Format(error) => error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error("No refresh token available")]
    MissingRefreshToken,
    #[error("The session has been closed")]
    Closed,
    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[from] ApiError),
}
