//! Project board abstraction used by the reconciler.

use async_trait::async_trait;

use crate::error::BoardError;
use crate::models::{CardCreateOptions, CardMoveOptions, Project, ProjectCard, ProjectColumn};

/// Remote project board operations.
///
/// Implemented over the GitHub REST API by
/// [`GitHubBoardClient`](crate::github_client::GitHubBoardClient).
#[async_trait]
pub trait BoardClient: Send + Sync {
    /// List the projects attached to `owner/repo`.
    async fn list_projects(&self, owner: &str, repo: &str) -> Result<Vec<Project>, BoardError>;

    /// List the columns of a project.
    async fn list_project_columns(&self, project_id: i64)
        -> Result<Vec<ProjectColumn>, BoardError>;

    /// List the cards in a column.
    async fn list_project_cards(&self, column_id: i64) -> Result<Vec<ProjectCard>, BoardError>;

    /// Create a card in a column.
    async fn create_project_card(
        &self,
        column_id: i64,
        options: &CardCreateOptions,
    ) -> Result<ProjectCard, BoardError>;

    /// Move a card within or across columns.
    async fn move_project_card(
        &self,
        card_id: i64,
        options: &CardMoveOptions,
    ) -> Result<(), BoardError>;
}
