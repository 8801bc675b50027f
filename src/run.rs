use std::{
    io::{self, Write},
    process::ExitCode,
};

use anyhow::Result;
use tracing::{debug, error, info};

use crate::{
    actions,
    approvals::{DEFAULT_REASON, dismiss_all, list_approvals},
    cli::Config,
    context::TriggerContext,
    types::{Forge, PullRequestRef},
};

pub const PERMISSIONS_HINT: &str = "Did you set the correct permissions?";

/// Per-run behaviour taken from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub reason: String,
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            reason: DEFAULT_REASON.to_string(),
            dry_run: false,
        }
    }
}

impl From<&Config> for RunOptions {
    fn from(config: &Config) -> Self {
        Self {
            reason: config.reason.clone(),
            dry_run: config.dry_run,
        }
    }
}

/// What a successful run found and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub pr: PullRequestRef,
    pub approvals: Vec<u64>,
    /// Approvals were listed but left in place.
    pub dry_run: bool,
}

impl RunSummary {
    /// Review ids this run dismissed.
    pub fn dismissed(&self) -> &[u64] {
        if self.dry_run { &[] } else { self.approvals.as_slice() }
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    Success(RunSummary),
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Outcome::Success(_) => ExitCode::SUCCESS,
            Outcome::Failure(_) => ExitCode::FAILURE,
        }
    }
}

/// Finds the approvals on the triggering pull request and dismisses them.
///
/// The pull request is resolved before any remote call, so a non pull
/// request event fails without touching the API.
pub async fn run<F>(
    trigger: &TriggerContext,
    forge: &F,
    options: &RunOptions,
) -> Result<RunSummary>
where
    F: Forge + Sync,
{
    let pr = trigger.pull_request_ref()?;
    info!(pr = %pr, "Looking for approvals");

    let approvals = list_approvals(forge, &pr).await?;
    for review in &approvals {
        info!(pr = %pr, review_id = review.id, author = review.author(), "Found approval");
    }
    let approval_ids: Vec<u64> = approvals.iter().map(|r| r.id).collect();

    if options.dry_run {
        info!(
            pr = %pr,
            count = approval_ids.len(),
            "Dry run, leaving approvals in place"
        );
        return Ok(RunSummary {
            pr,
            approvals: approval_ids,
            dry_run: true,
        });
    }

    dismiss_all(forge, &pr, &approval_ids, &options.reason).await?;

    Ok(RunSummary {
        pr,
        approvals: approval_ids,
        dry_run: false,
    })
}

/// Tells whether an error looks like the API hiding a resource from a token
/// that lacks permission.
pub fn is_not_found(message: &str) -> bool {
    message.contains("Not Found")
}

fn write_failure<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    if is_not_found(message) {
        actions::warning(out, PERMISSIONS_HINT)?;
    }
    actions::error(out, message)?;
    out.flush()
}

/// Converts an error into the failure signal: an optional permissions
/// warning followed by an error annotation on `out`.
pub fn signal_failure<W: Write>(err: &anyhow::Error, out: &mut W) -> Outcome {
    let message = format!("{:#}", err);
    debug!(error = ?err, "Run failed");

    if let Err(e) = write_failure(out, &message) {
        error!(error = %e, failure = %message, "Failed to write failure annotation");
    }

    Outcome::Failure(message)
}

/// Runs the pipeline and reports its outcome exactly once.
pub async fn run_action<F, W>(
    trigger: &TriggerContext,
    forge: &F,
    options: &RunOptions,
    out: &mut W,
) -> Outcome
where
    F: Forge + Sync,
    W: Write,
{
    match run(trigger, forge, options).await {
        Ok(summary) => {
            info!(
                pr = %summary.pr,
                approvals = summary.approvals.len(),
                dismissed = summary.dismissed().len(),
                "Run complete"
            );
            Outcome::Success(summary)
        }
        Err(err) => signal_failure(&err, out),
    }
}
