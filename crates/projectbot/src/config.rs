//! Configuration for the projectbot service.

use std::env;
use std::fmt;

use crate::github_client::GITHUB_API_URL;

/// Repository whose project board is managed.
pub const DEFAULT_OWNER: &str = "iamhopaul123";
/// Repository name.
pub const DEFAULT_REPO: &str = "penghaoh-flask-app";
/// Project that must be the repository's first project.
pub const DEFAULT_PROJECT_NAME: &str = "Sprint";

/// Webhook service configuration.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// Token for project board API calls.
    pub github_token: String,
    /// Webhook signing secret. Empty disables signature checks.
    pub webhook_secret: String,
    /// GitHub API base URL.
    pub github_api_url: String,
    /// Target board location.
    pub board: BoardConfig,
}

/// Where the tracked board lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Expected project name.
    pub project_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: env::var("PROJECTBOT_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(80),
            github_token: env::var("GITHUB_TOKEN").unwrap_or_default(),
            webhook_secret: env::var("WEBHOOK_SECRET").unwrap_or_default(),
            github_api_url: env::var("GITHUB_API_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| GITHUB_API_URL.to_string()),
            board: BoardConfig::default(),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("github_token_set", &!self.github_token.is_empty())
            .field("webhook_secret_set", &!self.webhook_secret.is_empty())
            .field("github_api_url", &self.github_api_url)
            .field("board", &self.board)
            .finish()
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            owner: env::var("PROJECTBOT_OWNER").unwrap_or_else(|_| DEFAULT_OWNER.to_string()),
            repo: env::var("PROJECTBOT_REPO").unwrap_or_else(|_| DEFAULT_REPO.to_string()),
            project_name: env::var("PROJECTBOT_PROJECT")
                .unwrap_or_else(|_| DEFAULT_PROJECT_NAME.to_string()),
        }
    }
}
