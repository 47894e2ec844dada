use clap::Parser;
use log::{error, info, warn, LevelFilter};
use nsx::RunReport;
use nsx_core::{config, logging, NsxClient, Orchestrator};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod args;
pub mod error;

use args::{Cli, Commands};
use error::{CliError, Result};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_file, LevelFilter::Debug) {
        let err = CliError::Logger {
            path: cli.log_file.clone(),
            source: e,
        };
        eprintln!("{}", err);
        return ExitCode::from(err.exit_code());
    }

    match execute(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn execute(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Run {
            config: user,
            defaults,
        } => run(&defaults, &user).await,
        Commands::Render {
            config: user,
            defaults,
            output,
        } => {
            let resolved = config::load(&defaults, &user)?;
            match output {
                Some(path) => {
                    config::write_rendered(&resolved, &path)?;
                    println!("Resolved configuration written to {}", path.display());
                }
                None => println!("{}", config::render(&resolved)?),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::ResetDefaults { path } => {
            config::reset_defaults(&path)?;
            println!("Defaults written to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::ResetConfig { path } => {
            config::reset_config(&path)?;
            println!("Empty configuration written to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(defaults: &Path, user: &Path) -> Result<ExitCode> {
    info!(
        "Starting installer run (defaults: {}, config: {})",
        defaults.display(),
        user.display()
    );
    let resolved = config::load(defaults, user)?;
    let client = NsxClient::new(&resolved.connection)?;
    println!("Installing against {}", client.base_url());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current request");
            on_signal.cancel();
        }
    });

    let report = Orchestrator::new(Arc::new(client))
        .run_with_cancel(&resolved, cancel)
        .await;
    print_report(&report);

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(error::EXIT_ITEM_FAILURE))
    }
}

fn print_report(report: &RunReport) {
    for result in report.results() {
        println!("  {}", result);
    }
    println!("Summary: {}", report);
}
