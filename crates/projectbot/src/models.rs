//! Type definitions for project board entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content type GitHub expects when a card wraps a pull request.
pub const PULL_REQUEST_CONTENT_TYPE: &str = "PullRequest";

/// Position used when moving a card into its destination column.
pub const MOVE_TO_BOTTOM: &str = "bottom";

/// Project attached to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project ID
    pub id: i64,
    /// Project name
    pub name: String,
    /// GraphQL node ID
    #[serde(default)]
    pub node_id: Option<String>,
    /// Board URL
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Column (lane) of a project board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectColumn {
    /// Column ID
    pub id: i64,
    /// Column name
    pub name: String,
}

/// Card on a project board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCard {
    /// Card ID
    pub id: i64,
    /// GraphQL node ID
    #[serde(default)]
    pub node_id: Option<String>,
    /// Free-form note for cards without content
    #[serde(default)]
    pub note: Option<String>,
    /// API URL of the issue or pull request behind the card
    #[serde(default)]
    pub content_url: Option<String>,
}

/// Body of a card creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardCreateOptions {
    pub content_id: i64,
    pub content_type: String,
}

impl CardCreateOptions {
    /// Card content pointing at a pull request.
    #[must_use]
    pub fn pull_request(content_id: i64) -> Self {
        Self {
            content_id,
            content_type: PULL_REQUEST_CONTENT_TYPE.to_string(),
        }
    }
}

/// Body of a card move request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMoveOptions {
    pub position: String,
    pub column_id: i64,
}

impl CardMoveOptions {
    /// Move to the bottom of `column_id`.
    #[must_use]
    pub fn bottom_of(column_id: i64) -> Self {
        Self {
            position: MOVE_TO_BOTTOM.to_string(),
            column_id,
        }
    }
}

/// The well-known columns every tracked board must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardColumn {
    Backlog,
    InProgress,
    InReview,
    PendingRelease,
}

impl BoardColumn {
    /// All columns in board order. Card lookups walk this order.
    pub const ALL: [Self; 4] = [
        Self::Backlog,
        Self::InProgress,
        Self::InReview,
        Self::PendingRelease,
    ];

    /// Column name as shown on the board.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::InProgress => "In progress",
            Self::InReview => "In review",
            Self::PendingRelease => "Pending release",
        }
    }

    /// Parse an exact board column name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BoardColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Remote IDs for every [`BoardColumn`].
///
/// Only constructible through [`ColumnMap::resolve`], so holding one means
/// all four columns exist on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    ids: [i64; 4],
}

impl ColumnMap {
    /// Match listed columns against the well-known names.
    ///
    /// Columns with other names are ignored. When a name appears twice the
    /// last listed column wins.
    ///
    /// # Errors
    /// Returns the first missing column in board order.
    pub fn resolve(columns: &[ProjectColumn]) -> Result<Self, BoardColumn> {
        let mut found: [Option<i64>; 4] = [None; 4];
        for column in columns {
            if let Some(known) = BoardColumn::from_name(&column.name) {
                found[known.index()] = Some(column.id);
            }
        }

        let mut ids = [0; 4];
        for column in BoardColumn::ALL {
            ids[column.index()] = found[column.index()].ok_or(column)?;
        }
        Ok(Self { ids })
    }

    /// Remote ID of `column`.
    #[must_use]
    pub const fn id(&self, column: BoardColumn) -> i64 {
        self.ids[column.index()]
    }
}
