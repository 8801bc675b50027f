use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Serialize;
use tracing::debug;

use crate::types::{Forge, PullRequestRef, Review};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

// Single page only; pull requests with more reviews are not handled.
const REVIEWS_PER_PAGE: u8 = 100;

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
}

#[derive(Serialize)]
struct DismissalBody<'a> {
    message: &'a str,
    event: &'static str,
}

/// [`Forge`] backed by the GitHub REST API.
pub struct GitHub {
    client: Octocrab,
}

impl GitHub {
    /// Creates a client authenticated with `token` against `api_url`.
    pub fn new(token: &str, api_url: &str) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_url)
            .with_context(|| format!("Invalid GitHub API URL: '{}'", api_url))?
            .build()
            .context("Failed to create GitHub client")?;
        Ok(Self { client })
    }
}

fn reviews_route(pr: &PullRequestRef) -> String {
    format!(
        "/repos/{}/{}/pulls/{}/reviews",
        pr.repo.owner(),
        pr.repo.name(),
        pr.number
    )
}

fn dismissal_route(pr: &PullRequestRef, review_id: u64) -> String {
    format!("{}/{}/dismissals", reviews_route(pr), review_id)
}

// GitHub API errors carry the response's `message` (e.g. "Not Found");
// surface that text as-is rather than octocrab's wrapper.
fn api_error(err: octocrab::Error) -> anyhow::Error {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            debug!(documentation_url = ?source.documentation_url, "GitHub API error");
            anyhow::anyhow!(source.message)
        }
        other => anyhow::Error::new(other),
    }
}

#[async_trait]
impl Forge for GitHub {
    async fn list_reviews(&self, pr: &PullRequestRef) -> Result<Vec<Review>> {
        let route = reviews_route(pr);
        debug!(%route, "Listing reviews");

        let params = PageParams {
            per_page: REVIEWS_PER_PAGE,
        };
        self.client
            .get(route, Some(&params))
            .await
            .map_err(api_error)
    }

    async fn dismiss_review(
        &self,
        pr: &PullRequestRef,
        review_id: u64,
        message: &str,
    ) -> Result<()> {
        let route = dismissal_route(pr, review_id);
        debug!(%route, "Dismissing review");

        let body = DismissalBody {
            message,
            event: "DISMISS",
        };
        let _: serde_json::Value = self
            .client
            .put(route, Some(&body))
            .await
            .map_err(api_error)?;
        Ok(())
    }
}
