//! Error types for webhook validation, board API calls, and card reconciliation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::models::BoardColumn;

/// Errors raised while validating or decoding an inbound webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Content type is neither JSON nor form-encoded
    #[error("webhook request has unsupported Content-Type {0:?}")]
    UnsupportedContentType(String),

    /// Form-encoded body without a `payload` field
    #[error("webhook form body has no payload field")]
    MissingFormPayload,

    /// Form payload could not be URL-decoded
    #[error("webhook form payload is not valid UTF-8: {0}")]
    FormDecode(String),

    /// Secret configured but no signature header present
    #[error("missing signature")]
    MissingSignature,

    /// Signature header present but malformed or not matching the body
    #[error("payload signature check failed")]
    InvalidSignature,

    /// No `X-GitHub-Event` header
    #[error("missing X-GitHub-Event header")]
    MissingEventType,

    /// Payload JSON does not match the announced event
    #[error("failed to parse {event_type} event: {source}")]
    Parse {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

impl WebhookError {
    /// HTTP status the webhook endpoint answers with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingEventType | Self::Parse { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Errors returned by a [`crate::board::BoardClient`].
#[derive(Debug, Error)]
pub enum BoardError {
    /// The API answered with a non-success status
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },

    /// Request never produced a response
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl BoardError {
    /// Upstream status code, when the API produced one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            Self::Decode(_) => None,
        }
    }
}

/// Errors that abort a card reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to list projects: {0}")]
    ProjectLookup(#[source] BoardError),

    #[error("project {name} not found")]
    ProjectNotFound { name: String },

    #[error("failed to list project columns: {0}")]
    ColumnLookup(#[source] BoardError),

    #[error("column {0} does not exist")]
    ColumnMissing(BoardColumn),

    #[error("failed to list cards for column {column}: {source}")]
    CardListing {
        column: BoardColumn,
        #[source]
        source: BoardError,
    },

    #[error("failed to create card for pull request {title}: {source}")]
    CardCreate {
        title: String,
        #[source]
        source: BoardError,
    },

    #[error("failed to move card {card_id} for pull request {title}: {source}")]
    CardMove {
        card_id: i64,
        title: String,
        #[source]
        source: BoardError,
    },
}

impl ReconcileError {
    /// HTTP status the webhook endpoint answers with.
    ///
    /// Lookup failures are reported as unauthorized. Card operations surface
    /// the upstream status, falling back to unauthorized when there was none.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ProjectLookup(_)
            | Self::ProjectNotFound { .. }
            | Self::ColumnLookup(_)
            | Self::ColumnMissing(_) => StatusCode::UNAUTHORIZED,
            Self::CardListing { source, .. }
            | Self::CardCreate { source, .. }
            | Self::CardMove { source, .. } => {
                source.status().unwrap_or(StatusCode::UNAUTHORIZED)
            }
        }
    }
}
