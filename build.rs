//! Build script for dismiss-approvals - embeds version information.
//!
//! The version string is `<pkg version> (<git version>) <rustc version>`,
//! where the git version is the output of `git describe --tags --always
//! --dirty` when a tag is reachable, and otherwise a pseudo-version of the
//! form `v{CARGO_PKG_VERSION}-{timestamp}-{commit}`. Components that cannot
//! be determined (no git, no rustc on PATH) are omitted.

use std::process::Command;

use chrono::Utc;

fn main() {
    ["src", "build.rs", "Cargo.toml"]
        .iter()
        .for_each(|path| println!("cargo:rerun-if-changed={path}"));

    println!("cargo:rustc-env=BUILD_INFO_HUMAN={}", build_info());
}

fn capture(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn git_version() -> Option<String> {
    let described = capture("git", &["describe", "--tags", "--always", "--dirty"])?;

    // A bare commit hash means no tag is reachable.
    if described.contains('v') || described.contains("-g") {
        return Some(described);
    }

    let commit = capture("git", &["rev-parse", "--short=12", "HEAD"])?;
    let timestamp = capture("git", &["log", "-1", "--format=%ct"])
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
        .format("%Y%m%d%H%M%S");
    let dirty = if described.ends_with("-dirty") {
        "+dirty"
    } else {
        ""
    };

    Some(format!(
        "v{}-{timestamp}-{commit}{dirty}",
        env!("CARGO_PKG_VERSION")
    ))
}

fn build_info() -> String {
    [
        Some(env!("CARGO_PKG_VERSION").to_string()),
        git_version().map(|v| format!("({v})")),
        capture("rustc", &["--version"]),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
}
