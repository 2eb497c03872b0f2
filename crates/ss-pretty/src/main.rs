mod config;
mod control;
mod controller;
mod error;
mod logging;
mod source;

use clap::Parser;
use config::{format_catalog, Args, SessionConfig};
use control::{RawModeGuard, CONTROL_QUEUE_CAPACITY};
use controller::{Controller, Outcome};
use error::AppError;
use source::SsCommand;
use ss_pretty_core::FieldCatalog;
use std::{io, process::ExitCode};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = logging::init_logging(&args);

    match run(args).await {
        Ok(outcome) => {
            info!(event = "exit", outcome = ?outcome);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(event = "fatal", error = %err);
            eprintln!("ss-pretty: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<Outcome, AppError> {
    let catalog = FieldCatalog::standard();
    if args.list_fields {
        print!("{}", format_catalog(&catalog));
        return Ok(Outcome::Completed);
    }

    let config = SessionConfig::from_args(&args, &catalog)?;
    info!(
        event = "session_start",
        fields = %config.fields.join(","),
        filter = %config.filter,
        interval_ms = config.interval.as_millis() as u64,
        duration_ms = ?config.duration.map(|duration| duration.as_millis() as u64),
        format = %config.format
    );

    let (control_tx, mut control_rx) = mpsc::channel(CONTROL_QUEUE_CAPACITY);
    let raw_mode = RawModeGuard::enable_if_terminal()?;
    let key_listener = raw_mode
        .is_enabled()
        .then(|| control::spawn_key_listener(control_tx.clone()));
    let interrupt_listener = control::spawn_interrupt_listener(control_tx);

    let source = SsCommand::from_config(&config);
    let mut controller = Controller::new(config, catalog, source, io::stdout());
    let result = controller.run(&mut control_rx).await;

    if let Some(listener) = key_listener {
        listener.abort();
    }
    interrupt_listener.abort();
    drop(raw_mode);
    result
}
