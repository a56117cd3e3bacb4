//! HTTP server for GitHub webhooks.

use axum::{
    body::Bytes,
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::board::BoardClient;
use crate::config::Config;
use crate::error::BoardError;
use crate::github_client::GitHubBoardClient;
use crate::reconciler::{CardReconciler, ReconcileOutcome};
use crate::webhooks::{parse_webhook, validate_payload, WebhookEvent, WebhookHeaders};

/// Path GitHub delivers webhooks to.
pub const WEBHOOK_PATH: &str = "/api/projectbot";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Configuration.
    pub config: Arc<Config>,
    /// Card reconciler bound to the configured board.
    pub reconciler: CardReconciler,
}

impl AppState {
    /// Build state backed by the GitHub API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: Config) -> Result<Self, BoardError> {
        let client = GitHubBoardClient::with_url(&config.github_token, &config.github_api_url)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Build state around any board client.
    #[must_use]
    pub fn with_client(config: Config, client: Arc<dyn BoardClient>) -> Self {
        let reconciler = CardReconciler::new(client, config.board.clone());
        Self {
            config: Arc::new(config),
            reconciler,
        }
    }
}

/// Build the HTTP router for the webhook service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Webhook endpoint
        .route(WEBHOOK_PATH, post(webhook_handler).options(preflight))
        // Health check
        .route("/", get(health_check).options(preflight))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> StatusCode {
    info!("🚑 healthcheck ok!");
    StatusCode::OK
}

/// Preflight responder with permissive CORS headers.
async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "X-Requested-With"),
            (ACCESS_CONTROL_ALLOW_METHODS, "POST, GET, PUT, DELETE, OPTIONS"),
        ],
    )
}

/// Plain-text error body, one line.
fn error_response(status: StatusCode, err: &dyn std::error::Error) -> Response {
    (status, format!("{err}\n")).into_response()
}

/// Handle incoming GitHub webhooks.
///
/// This handler:
/// 1. Verifies the payload signature and extracts the payload
/// 2. Decodes the event named by `X-GitHub-Event`
/// 3. Reconciles the board for pull request events
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let meta = WebhookHeaders::from_header_map(&headers);
    info!(
        event_type = meta.event_type.as_deref().unwrap_or("unknown"),
        delivery_id = meta.delivery_id.as_deref().unwrap_or("unknown"),
        "Received GitHub webhook"
    );

    let payload = match validate_payload(&headers, &body, &state.config.webhook_secret) {
        Ok(payload) => payload,
        Err(e) => {
            error!(error = %e, "🚨 error validating request body");
            return error_response(e.status_code(), &e);
        }
    };

    let event = match parse_webhook(meta.event_type.as_deref(), &payload) {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "🚨 error could not parse webhook");
            return error_response(e.status_code(), &e);
        }
    };

    let pr_event = match event {
        WebhookEvent::PullRequest(pr_event) => pr_event,
        other => {
            info!(event_type = %other.event_type(), "🤷‍♀️ unhandled event type");
            return StatusCode::OK.into_response();
        }
    };

    match state.reconciler.reconcile(&pr_event).await {
        Ok(ReconcileOutcome::Ignored { .. }) => StatusCode::ACCEPTED.into_response(),
        Ok(ReconcileOutcome::Created { .. } | ReconcileOutcome::Moved { .. }) => {
            StatusCode::CREATED.into_response()
        }
        Err(e) => error_response(e.status_code(), &e),
    }
}
