//! Webhook payload validation, signature verification, and event decoding.

use axum::http::{header::CONTENT_TYPE, HeaderMap};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

use crate::error::WebhookError;

/// Header carrying the HMAC-SHA256 signature.
pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";
/// Legacy header carrying the HMAC-SHA1 signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";
/// Header naming the event type.
pub const EVENT_TYPE_HEADER: &str = "x-github-event";
/// Header carrying the unique delivery ID.
pub const DELIVERY_ID_HEADER: &str = "x-github-delivery";

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Verify a `<algorithm>=<hex>` signature header against `body`.
///
/// Supports `sha1`, `sha256` and `sha512`. Comparison is constant-time.
#[must_use]
pub fn verify_webhook_signature(body: &[u8], signature: &str, secret: &str) -> bool {
    let Some((algorithm, hex_digest)) = signature.split_once('=') else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };

    match algorithm {
        "sha1" => verify_mac::<Hmac<Sha1>>(body, &expected, secret),
        "sha256" => verify_mac::<Hmac<Sha256>>(body, &expected, secret),
        "sha512" => verify_mac::<Hmac<Sha512>>(body, &expected, secret),
        _ => false,
    }
}

fn verify_mac<M: Mac + KeyInit>(body: &[u8], expected: &[u8], secret: &str) -> bool {
    let Ok(mut mac) = <M as KeyInit>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    Mac::update(&mut mac, body);
    let computed = mac.finalize().into_bytes();
    computed.as_slice().ct_eq(expected).into()
}

/// Extract the event payload from a webhook request and check its signature.
///
/// JSON bodies are returned as-is; form-encoded bodies yield the decoded
/// `payload` field. The signature always covers the raw body. An empty
/// `secret` skips signature verification.
///
/// # Errors
/// Fails on unsupported content types, malformed form bodies, and missing
/// or mismatched signatures.
pub fn validate_payload(
    headers: &HeaderMap,
    body: &[u8],
    secret: &str,
) -> Result<Vec<u8>, WebhookError> {
    let content_type = header_str(headers, CONTENT_TYPE.as_str()).unwrap_or_default();
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let payload = match media_type.as_str() {
        JSON_CONTENT_TYPE => body.to_vec(),
        FORM_CONTENT_TYPE => form_payload(body)?.into_bytes(),
        _ => return Err(WebhookError::UnsupportedContentType(content_type)),
    };

    if !secret.is_empty() {
        let parsed = WebhookHeaders::from_header_map(headers);
        let signature = parsed
            .signature_256
            .or(parsed.signature)
            .ok_or(WebhookError::MissingSignature)?;
        if !verify_webhook_signature(body, &signature, secret) {
            return Err(WebhookError::InvalidSignature);
        }
    }

    Ok(payload)
}

/// Decode the `payload` field of a form-encoded body.
fn form_payload(body: &[u8]) -> Result<String, WebhookError> {
    let form = std::str::from_utf8(body).map_err(|e| WebhookError::FormDecode(e.to_string()))?;
    let raw = form
        .split('&')
        .find_map(|pair| pair.strip_prefix("payload="))
        .ok_or(WebhookError::MissingFormPayload)?;

    urlencoding::decode(&raw.replace('+', " "))
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| WebhookError::FormDecode(e.to_string()))
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Decoded webhook event.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    /// `pull_request` event
    PullRequest(PullRequestEvent),
    /// `ping` event sent when the hook is created
    Ping(PingEvent),
    /// Any other event type
    Other(String),
}

impl WebhookEvent {
    /// Event type name as announced in the request.
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::PullRequest(_) => "pull_request",
            Self::Ping(_) => "ping",
            Self::Other(name) => name,
        }
    }
}

/// Decode a validated payload according to its event type header.
///
/// # Errors
/// Fails when the event type is missing or the payload does not match it.
pub fn parse_webhook(event_type: Option<&str>, payload: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let event_type = event_type
        .filter(|t| !t.is_empty())
        .ok_or(WebhookError::MissingEventType)?;

    let parse_error = |source: serde_json::Error| WebhookError::Parse {
        event_type: event_type.to_string(),
        source,
    };

    match event_type {
        "pull_request" => serde_json::from_slice(payload)
            .map(WebhookEvent::PullRequest)
            .map_err(parse_error),
        "ping" => serde_json::from_slice(payload)
            .map(WebhookEvent::Ping)
            .map_err(parse_error),
        other => serde_json::from_slice::<serde_json::Value>(payload)
            .map(|_| WebhookEvent::Other(other.to_string()))
            .map_err(parse_error),
    }
}

/// GitHub `pull_request` event payload (simplified)
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    /// Action type (opened, closed, synchronize, ...)
    pub action: String,
    /// Pull request details
    pub pull_request: PullRequest,
    /// Repository info
    #[serde(default)]
    pub repository: Option<Repository>,
}

/// GitHub Pull Request
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    /// Numeric ID, used as card content ID
    pub id: i64,
    /// GraphQL node ID, used to match existing cards
    pub node_id: String,
    /// PR number
    pub number: u64,
    /// PR title
    #[serde(default)]
    pub title: String,
    /// PR HTML URL
    #[serde(default)]
    pub html_url: Option<String>,
    /// API URL of the issue behind the PR; cards reference it as `content_url`
    #[serde(default)]
    pub issue_url: Option<String>,
}

/// GitHub Repository
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    /// Repository name
    pub name: String,
    /// Full name (owner/repo)
    pub full_name: String,
}

/// GitHub `ping` event payload
#[derive(Debug, Clone, Deserialize)]
pub struct PingEvent {
    #[serde(default)]
    pub zen: Option<String>,
    #[serde(default)]
    pub hook_id: Option<i64>,
}

/// Parsed webhook headers
#[derive(Debug, Clone, Default)]
pub struct WebhookHeaders {
    /// Unique delivery ID
    pub delivery_id: Option<String>,
    /// Event type
    pub event_type: Option<String>,
    /// HMAC-SHA256 signature
    pub signature_256: Option<String>,
    /// Legacy HMAC-SHA1 signature
    pub signature: Option<String>,
}

impl WebhookHeaders {
    /// Parse headers from a request
    #[must_use]
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        Self {
            delivery_id: header_str(headers, DELIVERY_ID_HEADER),
            event_type: header_str(headers, EVENT_TYPE_HEADER),
            signature_256: header_str(headers, SIGNATURE_256_HEADER),
            signature: header_str(headers, SIGNATURE_HEADER),
        }
    }
}
