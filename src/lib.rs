//! dismiss-approvals: reset pull request approvals when new changes land.
//!
//! Runs as a GitHub Actions step on pull request events. Reads the
//! triggering event, lists the pull request's reviews, and dismisses every
//! approving review so the new changes must be approved again.

pub mod actions;
pub mod approvals;
pub mod cli;
pub mod context;
pub mod github;
pub mod run;
pub mod types;

pub use approvals::{DEFAULT_REASON, approved_reviews, dismiss_all, list_approvals};
pub use cli::{Config, display_request, parse_args};
pub use context::{MissingPullRequest, TriggerContext};
pub use github::GitHub;
pub use run::{
    Outcome, PERMISSIONS_HINT, RunOptions, RunSummary, run, run_action, signal_failure,
};
pub use types::{Forge, PullRequestRef, Repo, RepoError, Review, ReviewAuthor, ReviewState};
