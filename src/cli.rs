use std::{fmt, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{approvals::DEFAULT_REASON, github::DEFAULT_API_URL, types::Repo};

const BUILD_INFO_HUMAN: &str = env!("BUILD_INFO_HUMAN");

#[derive(Parser, Default, Debug)]
#[command(
    name = "dismiss-approvals",
    about = "Dismiss existing approvals on a pull request so new changes must be re-approved"
)]
#[command(long_version = BUILD_INFO_HUMAN)]
struct CliArgs {
    /// Token used to authenticate GitHub API calls
    #[arg(
        long = "github-token",
        env = "INPUT_GITHUB-TOKEN",
        value_name = "TOKEN",
        hide_env_values = true
    )]
    pub github_token: Option<String>,

    /// Message attached to every dismissal
    #[arg(long, env = "INPUT_REASON", value_name = "TEXT")]
    pub reason: Option<String>,

    /// Path to the triggering event payload
    #[arg(long = "event-path", env = "GITHUB_EVENT_PATH", value_name = "PATH")]
    pub event_path: Option<PathBuf>,

    /// Repository the pull request belongs to (overrides the event payload)
    #[arg(long, env = "GITHUB_REPOSITORY", value_name = "OWNER/REPO")]
    pub repository: Option<String>,

    /// GitHub REST API base URL
    #[arg(long = "api-url", env = "GITHUB_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// List the approvals that would be dismissed without dismissing them
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Action input form of --dry-run (true/false, empty means false)
    #[arg(
        long = "dry-run-input",
        env = "INPUT_DRY-RUN",
        value_name = "BOOL",
        hide = true
    )]
    pub dry_run_input: Option<String>,
}

/// Validated run configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub token: String,
    pub reason: String,
    pub event_path: Option<PathBuf>,
    pub repository: Option<String>,
    pub api_url: String,
    pub dry_run: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("reason", &self.reason)
            .field("event_path", &self.event_path)
            .field("repository", &self.repository)
            .field("api_url", &self.api_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

// Inputs arrive untrimmed and unset ones may be empty strings.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_input(value: Option<String>, name: &str) -> Result<String> {
    non_blank(value).with_context(|| format!("Input required and not supplied: {}", name))
}

// Accepts the boolean spellings Actions workflows commonly pass.
fn boolean_input(value: Option<String>, name: &str) -> Result<bool> {
    let Some(value) = non_blank(value) else {
        return Ok(false);
    };

    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => anyhow::bail!(
            "Input '{}' must be one of true, false, 1 or 0, got: '{}'",
            name,
            value
        ),
    }
}

fn parse_api_url(api_url: &str) -> Result<String> {
    let url = url::Url::parse(api_url)
        .with_context(|| format!("Failed to parse API URL: '{}'", api_url))?;

    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("API URL must use http or https, got: '{}'", api_url);
    }

    Ok(api_url.trim_end_matches('/').to_string())
}

fn config_from_cli(cli: CliArgs) -> Result<Config> {
    let token = required_input(cli.github_token, "github-token")?;

    let repository = non_blank(cli.repository);
    if let Some(repo) = &repository {
        Repo::parse(repo)
            .map_err(|e| anyhow::anyhow!("Invalid repository format '{}': {}", repo, e))?;
    }

    let api_url = match non_blank(cli.api_url) {
        Some(url) => parse_api_url(&url)?,
        None => DEFAULT_API_URL.to_string(),
    };

    let dry_run = cli.dry_run || boolean_input(cli.dry_run_input, "dry-run")?;

    Ok(Config {
        token,
        reason: non_blank(cli.reason).unwrap_or_else(|| DEFAULT_REASON.to_string()),
        event_path: cli.event_path.filter(|p| !p.as_os_str().is_empty()),
        repository,
        api_url,
        dry_run,
    })
}

/// Returns the clap error when `err` is a `--help` or `--version` request,
/// which should be printed as-is rather than reported as a failure.
pub fn display_request(err: &anyhow::Error) -> Option<&clap::Error> {
    use clap::error::ErrorKind;

    err.downcast_ref::<clap::Error>().filter(|clap_err| {
        matches!(
            clap_err.kind(),
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
        )
    })
}

/// Parses command-line arguments, with environment fallbacks, into a
/// validated [`Config`].
///
/// Every flag can also be supplied through the variable GitHub Actions sets
/// for it, so the binary runs unmodified as an action step.
pub fn parse_args<I, T>(args: I) -> Result<Config>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    config_from_cli(cli)
}
