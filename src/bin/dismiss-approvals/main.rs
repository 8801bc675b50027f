use std::process::ExitCode;

use anyhow::Result;
use dismiss_approvals::{
    Config, GitHub, RunOptions, TriggerContext, display_request, parse_args, run_action,
    signal_failure,
};

fn print_clap_output(clap_err: &clap::Error) -> ExitCode {
    print!("{clap_err}");
    ExitCode::SUCCESS
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn setup(config: &Config) -> Result<(TriggerContext, GitHub)> {
    let trigger = TriggerContext::load(config.event_path.as_deref(), config.repository.as_deref())?;
    let forge = GitHub::new(&config.token, &config.api_url)?;
    Ok((trigger, forge))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let mut stdout = std::io::stdout();

    let config = match parse_args(std::env::args_os()) {
        Ok(config) => config,
        Err(err) => {
            if let Some(clap_err) = display_request(&err) {
                return print_clap_output(clap_err);
            }
            return signal_failure(&err, &mut stdout).exit_code();
        }
    };
    tracing::debug!(?config, "Loaded configuration");

    let outcome = match setup(&config) {
        Ok((trigger, forge)) => {
            run_action(&trigger, &forge, &RunOptions::from(&config), &mut stdout).await
        }
        Err(err) => signal_failure(&err, &mut stdout),
    };

    outcome.exit_code()
}
