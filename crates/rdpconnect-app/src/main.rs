// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rdpconnect: kiosk-style FreeRDP launcher
//
// Entry point.  Initialises logging, parses the command line, opens the
// launcher services and runs one command.

mod cli;
mod services;

use std::process::ExitCode;

use clap::Parser;
use rdpconnect_core::error::{LauncherError, Result};
use rdpconnect_core::human_errors::{HumanError, humanize_error, humanize_failure};
use rdpconnect_core::types::{LoginPrompt, TerminalEvent};

use cli::{Cli, Commands, FolderCommand};
use services::launcher::{FolderAction, Launcher};
use services::paths::LauncherPaths;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "rdpconnect starting");

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            report(&humanize_error(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let paths = LauncherPaths::resolve(cli.config_dir)?;
    let mut launcher = Launcher::open(&paths, cli.client)?.with_admin_password(cli.admin_password);

    match cli.command {
        Commands::Show => println!("{}", launcher.show()?),

        Commands::Set {
            category,
            option,
            value,
        } => launcher.set(category, &option, &value)?,

        Commands::Folders { action } => {
            let (action, path) = match action {
                FolderCommand::Add { path } => (FolderAction::Add, path),
                FolderCommand::Remove { path } => (FolderAction::Remove, path),
                FolderCommand::Enable { path } => (FolderAction::Enable, path),
                FolderCommand::Disable { path } => (FolderAction::Disable, path),
            };
            if !launcher.folders(action, &path)? {
                eprintln!("No redirected folder {path:?}.");
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Logo { file } => {
            let adopted = launcher.adopt_logo(&file)?;
            println!("{}", adopted.display());
        }

        Commands::Export { file } => launcher.export_to(&file)?,

        Commands::Import { file } => launcher.import_from(&file)?,

        Commands::Printers => {
            for printer in launcher.printers() {
                match printer.driver {
                    Some(driver) => println!("{}\t{driver}", printer.name),
                    None => println!("{}", printer.name),
                }
            }
        }

        Commands::Command(login) => {
            let line = launcher.command_line(&LoginPrompt::from(login)).await;
            println!("{line}");
        }

        Commands::Connect(login) => return connect(&launcher, LoginPrompt::from(login)).await,
    }

    Ok(ExitCode::SUCCESS)
}

async fn connect(launcher: &Launcher, prompt: LoginPrompt) -> Result<ExitCode> {
    let config = launcher.effective_config(&prompt);
    if config.general.server_address.is_empty() {
        return Err(LauncherError::InvalidValue {
            category: "General".into(),
            option: "Server Address".into(),
            reason: "no server address configured or given with --server".into(),
        });
    }

    let orchestrator = launcher.orchestrator()?;
    let handle = orchestrator.connect(&config)?;
    let canceller = handle.canceller();
    tracing::info!(id = %handle.id(), server = %config.general.server_address, "connecting");

    let wait = handle.wait();
    tokio::pin!(wait);
    let report = tokio::select! {
        report = &mut wait => report,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, cancelling connection");
            canceller.cancel().await;
            wait.await
        }
    };

    let elapsed = report.finished_at - report.started_at;
    tracing::info!(
        id = %report.id,
        event = ?report.event,
        seconds = elapsed.num_seconds(),
        "session ended"
    );

    match report.event {
        TerminalEvent::Succeeded => Ok(ExitCode::SUCCESS),
        TerminalEvent::Cancelled => {
            eprintln!("Connection cancelled.");
            Ok(ExitCode::from(130))
        }
        TerminalEvent::Failed(detail) => {
            report_failure(&humanize_failure(&detail));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report(human: &HumanError) {
    eprintln!("{}", human.message);
    eprintln!("{}", human.suggestion);
}

fn report_failure(human: &HumanError) {
    report(human);
    if human.retriable {
        eprintln!("You can try connecting again.");
    }
}
