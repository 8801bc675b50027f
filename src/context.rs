use std::{fmt, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::{PullRequestRef, Repo};

const MISSING_PULL_REQUEST: &str = "event context does not contain pull request data - ensure this action was triggered on a `pull_request` event";

const MISSING_REPOSITORY: &str =
    "context.repo requires a GITHUB_REPOSITORY environment variable like 'owner/repo'";

/// The triggering event carried no pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingPullRequest;

impl fmt::Display for MissingPullRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MISSING_PULL_REQUEST)
    }
}

impl std::error::Error for MissingPullRequest {}

#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    #[serde(default)]
    pull_request: Option<PullRequestPayload>,
    #[serde(default)]
    repository: Option<RepositoryPayload>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct RepositoryPayload {
    name: String,
    owner: OwnerPayload,
}

#[derive(Debug, Deserialize)]
struct OwnerPayload {
    login: String,
}

/// The triggering event, reduced to what a run needs.
///
/// Built once at startup and passed explicitly to the orchestrator. Neither
/// field is validated for presence here; [`TriggerContext::pull_request_ref`]
/// reports what is missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TriggerContext {
    pub repo: Option<Repo>,
    pub pull_request: Option<u64>,
}

impl TriggerContext {
    pub fn new(repo: Option<Repo>, pull_request: Option<u64>) -> Self {
        Self { repo, pull_request }
    }

    /// Reads the event payload at `event_path`.
    ///
    /// A path that does not exist yields an empty payload, as does no path
    /// at all. `repository` (the `GITHUB_REPOSITORY` value) takes precedence
    /// over the payload's repository object.
    pub fn load(event_path: Option<&Path>, repository: Option<&str>) -> Result<Self> {
        let Some(path) = event_path else {
            debug!("No event path configured, using an empty payload");
            return Self::from_payload("{}", repository);
        };

        if !path.exists() {
            warn!("GITHUB_EVENT_PATH {} does not exist", path.display());
            return Self::from_payload("{}", repository);
        }

        let payload = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event payload: '{}'", path.display()))?;
        Self::from_payload(&payload, repository)
            .with_context(|| format!("Invalid event payload in '{}'", path.display()))
    }

    pub fn from_payload(payload: &str, repository: Option<&str>) -> Result<Self> {
        let event: EventPayload =
            serde_json::from_str(payload).context("Event payload is not valid JSON")?;

        let repo = match repository.map(str::trim).filter(|r| !r.is_empty()) {
            Some(full_name) => Some(Repo::parse(full_name)?),
            None => event
                .repository
                .map(|r| Repo::new(r.owner.login, r.name))
                .transpose()?,
        };

        Ok(Self {
            repo,
            pull_request: event.pull_request.map(|pr| pr.number),
        })
    }

    /// Resolves the pull request this run targets.
    ///
    /// Fails with [`MissingPullRequest`] when the event is not a pull request
    /// event, before looking at the repository.
    pub fn pull_request_ref(&self) -> Result<PullRequestRef> {
        let number = self.pull_request.ok_or(MissingPullRequest)?;
        let repo = self
            .repo
            .clone()
            .ok_or_else(|| anyhow::anyhow!(MISSING_REPOSITORY))?;
        Ok(PullRequestRef::new(repo, number))
    }
}
