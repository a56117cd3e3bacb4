//! GitHub webhook service that keeps pull request cards in the review column.
//!
//! This crate provides:
//! - Webhook payload validation, signature verification and event decoding
//! - A project board client trait with a GitHub REST implementation
//! - The card reconciler that creates or moves a pull request's card
//! - HTTP server exposing the webhook and health endpoints

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Every board call can fail

pub mod board;
pub mod config;
pub mod error;
pub mod github_client;
pub mod models;
pub mod reconciler;
pub mod server;
pub mod webhooks;

pub use board::BoardClient;
pub use config::{BoardConfig, Config};
pub use error::{BoardError, ReconcileError, WebhookError};
pub use github_client::GitHubBoardClient;
pub use models::*;
pub use reconciler::{CardReconciler, ReconcileOutcome};
pub use webhooks::{parse_webhook, validate_payload, verify_webhook_signature, WebhookEvent};
