//! Card reconciliation for opened pull requests.
//!
//! For every `opened` pull request the reconciler makes sure a card for it
//! sits in the "In review" column: an existing card anywhere on the board is
//! moved there, otherwise a new card is created there.

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::board::BoardClient;
use crate::config::BoardConfig;
use crate::error::ReconcileError;
use crate::models::{
    BoardColumn, CardCreateOptions, CardMoveOptions, ColumnMap, Project, ProjectCard,
};
use crate::webhooks::{PullRequest, PullRequestEvent};

/// The only pull request action that triggers a card update.
pub const OPENED_ACTION: &str = "opened";

/// What a reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Action was not `opened`; nothing was called.
    Ignored { action: String },
    /// A new card was created in "In review".
    Created { card_id: i64 },
    /// An existing card was moved to the bottom of "In review".
    Moved { card_id: i64 },
}

/// Moves pull request cards into the review column.
#[derive(Clone)]
pub struct CardReconciler {
    client: Arc<dyn BoardClient>,
    board: BoardConfig,
}

impl CardReconciler {
    #[must_use]
    pub fn new(client: Arc<dyn BoardClient>, board: BoardConfig) -> Self {
        Self { client, board }
    }

    /// Reconcile the board with a pull request event.
    ///
    /// Issues at most six reads and exactly one write for an `opened`
    /// event. The first failure aborts; nothing is retried.
    #[instrument(
        skip(self, event),
        fields(action = %event.action, pr_number = event.pull_request.number)
    )]
    pub async fn reconcile(
        &self,
        event: &PullRequestEvent,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if event.action != OPENED_ACTION {
            debug!("Ignoring pull request action");
            return Ok(ReconcileOutcome::Ignored {
                action: event.action.clone(),
            });
        }

        let pr = &event.pull_request;
        let project = self.find_project().await?;
        let columns = self.resolve_columns(&project).await?;
        let cards = self.list_cards(&columns).await?;
        let in_review = columns.id(BoardColumn::InReview);

        match find_card(&cards, pr) {
            None => {
                let card = self
                    .client
                    .create_project_card(in_review, &CardCreateOptions::pull_request(pr.id))
                    .await
                    .map_err(|source| {
                        error!(title = %pr.title, error = %source, "🚨 error creating project card");
                        ReconcileError::CardCreate {
                            title: pr.title.clone(),
                            source,
                        }
                    })?;
                info!(card_id = card.id, column_id = in_review, "Created card in review column");
                Ok(ReconcileOutcome::Created { card_id: card.id })
            }
            Some(card_id) => {
                self.client
                    .move_project_card(card_id, &CardMoveOptions::bottom_of(in_review))
                    .await
                    .map_err(|source| {
                        error!(title = %pr.title, error = %source, "🚨 error moving project card");
                        ReconcileError::CardMove {
                            card_id,
                            title: pr.title.clone(),
                            source,
                        }
                    })?;
                info!(card_id, column_id = in_review, "Moved card to review column");
                Ok(ReconcileOutcome::Moved { card_id })
            }
        }
    }

    /// The repository's first project, which must carry the expected name.
    async fn find_project(&self) -> Result<Project, ReconcileError> {
        let projects = self
            .client
            .list_projects(&self.board.owner, &self.board.repo)
            .await
            .map_err(|e| {
                error!(error = %e, "🚨 error getting project name");
                ReconcileError::ProjectLookup(e)
            })?;

        match projects.into_iter().next() {
            Some(project) if project.name == self.board.project_name => Ok(project),
            other => {
                let name = other.map_or_else(|| self.board.project_name.clone(), |p| p.name);
                error!(
                    expected = %self.board.project_name,
                    found = %name,
                    "🚨 error project not found"
                );
                Err(ReconcileError::ProjectNotFound { name })
            }
        }
    }

    async fn resolve_columns(&self, project: &Project) -> Result<ColumnMap, ReconcileError> {
        let columns = self
            .client
            .list_project_columns(project.id)
            .await
            .map_err(|e| {
                error!(project_id = project.id, error = %e, "🚨 error getting project columns");
                ReconcileError::ColumnLookup(e)
            })?;

        ColumnMap::resolve(&columns).map_err(|missing| {
            error!(project_id = project.id, column = %missing, "🚨 error getting project columns");
            ReconcileError::ColumnMissing(missing)
        })
    }

    /// Cards of every known column, in board order.
    async fn list_cards(&self, columns: &ColumnMap) -> Result<Vec<ProjectCard>, ReconcileError> {
        let mut cards = Vec::new();
        for column in BoardColumn::ALL {
            let column_cards = self
                .client
                .list_project_cards(columns.id(column))
                .await
                .map_err(|source| {
                    error!(column = %column, error = %source, "🚨 error listing project cards");
                    ReconcileError::CardListing { column, source }
                })?;
            cards.extend(column_cards);
        }
        debug!(count = cards.len(), "Collected project cards");
        Ok(cards)
    }
}

/// First card pointing at the pull request, in board order.
///
/// A card matches on the pull request's node ID, or on its issue URL, which is
/// what GitHub reports as the card's `content_url`.
fn find_card(cards: &[ProjectCard], pr: &PullRequest) -> Option<i64> {
    cards
        .iter()
        .find(|card| {
            card.node_id.as_deref() == Some(pr.node_id.as_str())
                || (pr.issue_url.is_some() && card.content_url == pr.issue_url)
        })
        .map(|card| card.id)
}
