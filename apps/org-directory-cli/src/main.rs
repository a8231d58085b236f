mod commands;
mod config;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use org_directory::auth::AuthError;
use org_directory::{DirectoryError, OrgDirectoryModule};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::commands::Command;
use crate::config::AppConfig;

/// Exit status when a query ran fine but found nothing.
const EXIT_EMPTY_RESULT: u8 = 3;
/// Exit status when the access key is missing or wrong.
const EXIT_UNAUTHORIZED: u8 = 4;

/// Organization directory - buildings, categories and proximity queries
#[derive(Parser)]
#[command(name = "orgdir")]
#[command(about = "Organization directory - buildings, categories and proximity queries")]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print effective configuration (JSON, secrets redacted) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Access key checked against the configured `api_key`
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit_code(&err)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref(), cli.verbose)?;
    logging::init(&config.logging)?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    let AppConfig {
        api_key,
        auth,
        directory,
        ..
    } = config;
    let command = cli.command.unwrap_or(Command::Check);

    if !matches!(command, Command::Check) {
        match auth.guard(api_key)? {
            Some(guard) => guard.verify(cli.api_key.as_deref())?,
            None => warn!("Access check is disabled by auth.disabled"),
        }
    }

    let module = OrgDirectoryModule::init(&directory).await?;
    let cancel = cancel_on_ctrl_c();

    let output = command.execute(&module, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling the running query");
            on_signal.cancel();
        }
    });
    cancel
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    if let Some(e) = err.downcast_ref::<DirectoryError>()
        && e.is_empty_result()
    {
        return ExitCode::from(EXIT_EMPTY_RESULT);
    }
    if err.downcast_ref::<AuthError>().is_some() {
        return ExitCode::from(EXIT_UNAUTHORIZED);
    }
    ExitCode::FAILURE
}
