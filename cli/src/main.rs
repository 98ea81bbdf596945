//! `logbook`: terminal front end for the visitor logbook.

mod commands;
mod prompt;
mod render;
mod session_store;
mod settings;
mod transport;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use logbook_core::{ApiClient, LogbookClient};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, Runner, Terminal, TerminalNavigator};
use crate::settings::Settings;
use crate::transport::UreqTransport;

#[derive(Debug, Parser)]
#[command(name = "logbook", version, about = "Visitor logbook client")]
struct Cli {
    /// Configuration file (defaults to ./logbook.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides the configured one
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Never prompt; missing input is reported as an error
    #[arg(long, global = true)]
    no_input: bool,

    #[command(subcommand)]
    command: Command,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(url) = cli.api_url {
        settings.api.base_url = url;
    }
    init_logging(&settings.logging.level);
    debug!(base_url = %settings.api.base_url, prefix = %settings.api.prefix, "settings loaded");

    let jar = session_store::load(&settings.session.file)?;
    let api = ApiClient::with_navigator(
        LogbookClient::with_prefix(&settings.api.base_url, &settings.api.prefix),
        UreqTransport::new(),
        TerminalNavigator::default(),
    )
    .login_location(settings.api.login_location.clone())
    .cookies(jar);

    let mut runner = Runner {
        api,
        term: Terminal {
            out: io::stdout().lock(),
            err: io::stderr().lock(),
        },
        interactive: !cli.no_input && io::stdin().is_terminal(),
    };
    let outcome = runner.run(&cli.command);

    // Save whatever the server handed out, even when the command failed.
    session_store::save(&settings.session.file, &runner.api.cookie_jar())?;
    Ok(outcome?.into())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
