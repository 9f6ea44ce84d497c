//! # lambda-view-console
//!
//! Operator console for running strategies.
//!
//! ## Usage
//!
//! ```bash
//! # Environments and their instances
//! lambda-view envs
//!
//! # Live states and params of one instance
//! lambda-view watch Local swap-mm-ethusd
//!
//! # Edit a parameter, start and stop
//! lambda-view set Local swap-mm-ethusd size 42
//! lambda-view start Local swap-mm-ethusd
//! lambda-view stop Local swap-mm-ethusd
//!
//! # Point at another host
//! lambda-view --host redis://127.0.0.1:6379 watch Local latency-mm
//! ```
//!
//! Logging goes to stderr and is controlled by `LAMBDA_VIEW_LOG`
//! (an `EnvFilter` directive, default `warn`).

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;

use std::time::Duration;

use lambda_view_sync::{SyncConfig, TargetController};
use tracing_subscriber::EnvFilter;

pub use cli::{Cli, Command};
pub use config::ConsoleConfig;
pub use error::{ConsoleError, Result};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "LAMBDA_VIEW_LOG";

/// Install the stderr log subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run one command.
pub async fn run(cli: Cli) -> Result<()> {
    let config = ConsoleConfig::resolve(cli.config.as_deref())?;
    let host = cli.host.as_deref();
    let mut out = std::io::stdout();
    let mut controller = TargetController::with_config(&SyncConfig::default());

    match cli.command {
        Command::Envs => commands::envs(&config, &mut out),
        Command::Watch(args) => {
            let target = commands::resolve_target(&config, &args, host)?;
            let shutdown = async {
                // Without a signal handler, run until the process is killed.
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            };
            commands::watch(&mut controller, target, shutdown, &mut out).await
        }
        Command::Set {
            target,
            key,
            value,
            timeout,
        } => {
            let target = commands::resolve_target(&config, &target, host)?;
            let wait = Duration::from_secs(timeout);
            commands::set(&mut controller, target, &key, &value, wait, &mut out).await
        }
        Command::Start(args) => {
            let target = commands::resolve_target(&config, &args, host)?;
            commands::set_running(&mut controller, target, true, &mut out).await
        }
        Command::Stop(args) => {
            let target = commands::resolve_target(&config, &args, host)?;
            commands::set_running(&mut controller, target, false, &mut out).await
        }
    }
}
