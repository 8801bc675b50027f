use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// Reasons a repository string failed to parse as `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    MissingSeparator(String),
    EmptyOwner(String),
    EmptyName(String),
    TooManySegments(String),
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoError::MissingSeparator(s) => {
                write!(f, "repository must be in format 'owner/repo', got: '{}'", s)
            }
            RepoError::EmptyOwner(s) => write!(f, "repository owner is empty in '{}'", s),
            RepoError::EmptyName(s) => write!(f, "repository name is empty in '{}'", s),
            RepoError::TooManySegments(s) => {
                write!(f, "repository has more than two path segments: '{}'", s)
            }
        }
    }
}

impl std::error::Error for RepoError {}

/// A GitHub repository identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repo {
    owner: String,
    name: String,
}

impl Repo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, RepoError> {
        let owner = owner.into();
        let name = name.into();
        let full = format!("{}/{}", owner, name);

        if owner.is_empty() {
            return Err(RepoError::EmptyOwner(full));
        }
        if name.is_empty() {
            return Err(RepoError::EmptyName(full));
        }
        if owner.contains('/') || name.contains('/') {
            return Err(RepoError::TooManySegments(full));
        }

        Ok(Self { owner, name })
    }

    /// Parses the `owner/repo` form used by `GITHUB_REPOSITORY`.
    pub fn parse(s: &str) -> Result<Self, RepoError> {
        let (owner, name) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| RepoError::MissingSeparator(s.to_string()))?;
        Self::new(owner, name)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The pull request a run operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub repo: Repo,
    pub number: u64,
}

impl PullRequestRef {
    pub fn new(repo: Repo, number: u64) -> Self {
        Self { repo, number }
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// Review states as reported by the REST API.
///
/// Matching is exact and case-sensitive; anything unrecognised becomes
/// `Unknown` and is never treated as an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Pending,
    Dismissed,
    #[serde(other)]
    Unknown,
}

impl ReviewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewState::Approved => "APPROVED",
            ReviewState::ChangesRequested => "CHANGES_REQUESTED",
            ReviewState::Commented => "COMMENTED",
            ReviewState::Pending => "PENDING",
            ReviewState::Dismissed => "DISMISSED",
            ReviewState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The account that submitted a review.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewAuthor {
    pub login: String,
}

/// A pull request review snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Review {
    pub id: u64,
    pub state: ReviewState,
    #[serde(default)]
    pub user: Option<ReviewAuthor>,
}

impl Review {
    pub fn new(id: u64, state: ReviewState) -> Self {
        Self {
            id,
            state,
            user: None,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.state == ReviewState::Approved
    }

    /// Login of the reviewer, or "ghost" for deleted accounts.
    pub fn author(&self) -> &str {
        self.user.as_ref().map_or("ghost", |u| u.login.as_str())
    }
}

/// The remote review API a run talks to.
#[async_trait]
pub trait Forge {
    /// Lists the reviews of a pull request in upstream order.
    async fn list_reviews(&self, pr: &PullRequestRef) -> Result<Vec<Review>>;

    /// Dismisses a single review with the given message.
    async fn dismiss_review(&self, pr: &PullRequestRef, review_id: u64, message: &str)
    -> Result<()>;
}
