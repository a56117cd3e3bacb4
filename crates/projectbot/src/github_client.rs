//! GitHub REST client for classic project boards.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::board::BoardClient;
use crate::error::BoardError;
use crate::models::{CardCreateOptions, CardMoveOptions, Project, ProjectCard, ProjectColumn};

/// Default GitHub API endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Media type that enables the projects API.
const PROJECTS_PREVIEW: &str = "application/vnd.github.inertia-preview+json";

/// Listing calls fetch a single page of this size.
const PER_PAGE: &str = "100";

/// GitHub API client for project boards.
#[derive(Debug, Clone)]
pub struct GitHubBoardClient {
    client: reqwest::Client,
    token: String,
    api_url: String,
}

/// Error body returned by the GitHub API.
#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

impl GitHubBoardClient {
    /// Create a client against the public GitHub API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(token: &str) -> Result<Self, BoardError> {
        Self::with_url(token, GITHUB_API_URL)
    }

    /// Create a client against a custom API URL (GitHub Enterprise, tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_url(token: &str, api_url: &str) -> Result<Self, BoardError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(PROJECTS_PREVIEW));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("projectbot/1.0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            token: token.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Attach the bearer token; requests go out anonymously without one.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.header(AUTHORIZATION, format!("Bearer {}", self.token))
        }
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, BoardError> {
        let url = format!("{}{path}", self.api_url);
        let response = self
            .authorize(self.client.get(&url))
            .query(&[("per_page", PER_PAGE)])
            .send()
            .await?;

        decode(check(response).await?).await
    }

    async fn post<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, BoardError> {
        let url = format!("{}{path}", self.api_url);
        let response = self
            .authorize(self.client.post(&url))
            .json(body)
            .send()
            .await?;

        check(response).await
    }
}

/// Turn a non-success response into [`BoardError::Api`].
async fn check(response: Response) -> Result<Response, BoardError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GitHubErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);
    Err(BoardError::Api { status, message })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BoardError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| BoardError::Decode(e.to_string()))
}

#[async_trait]
impl BoardClient for GitHubBoardClient {
    #[instrument(skip(self))]
    async fn list_projects(&self, owner: &str, repo: &str) -> Result<Vec<Project>, BoardError> {
        let projects: Vec<Project> = self
            .get_list(&format!("/repos/{owner}/{repo}/projects"))
            .await?;
        debug!(count = projects.len(), "Listed projects");
        Ok(projects)
    }

    #[instrument(skip(self))]
    async fn list_project_columns(
        &self,
        project_id: i64,
    ) -> Result<Vec<ProjectColumn>, BoardError> {
        let columns: Vec<ProjectColumn> = self
            .get_list(&format!("/projects/{project_id}/columns"))
            .await?;
        debug!(count = columns.len(), "Listed project columns");
        Ok(columns)
    }

    #[instrument(skip(self))]
    async fn list_project_cards(&self, column_id: i64) -> Result<Vec<ProjectCard>, BoardError> {
        let cards: Vec<ProjectCard> = self
            .get_list(&format!("/projects/columns/{column_id}/cards"))
            .await?;
        debug!(count = cards.len(), "Listed project cards");
        Ok(cards)
    }

    #[instrument(skip(self))]
    async fn create_project_card(
        &self,
        column_id: i64,
        options: &CardCreateOptions,
    ) -> Result<ProjectCard, BoardError> {
        let response = self
            .post(&format!("/projects/columns/{column_id}/cards"), options)
            .await?;
        decode(response).await
    }

    #[instrument(skip(self))]
    async fn move_project_card(
        &self,
        card_id: i64,
        options: &CardMoveOptions,
    ) -> Result<(), BoardError> {
        self.post(&format!("/projects/columns/cards/{card_id}/moves"), options)
            .await?;
        Ok(())
    }
}
