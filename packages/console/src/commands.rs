//! Command implementations.
//!
//! Each command writes its report to `out` so it can be exercised against
//! an in-memory buffer.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use lambda_view_core::{Entry, Group, RowId, Target};
use lambda_view_sync::{Ack, TargetController};
use tracing::{debug, warn};

use crate::cli::TargetArgs;
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};
use crate::render::render_rows;

/// Turn `<env> <instance>` into a target. `host` overrides the
/// environment's host.
pub fn resolve_target(
    config: &ConsoleConfig,
    args: &TargetArgs,
    host: Option<&str>,
) -> Result<Target> {
    let env = config.environment(&args.env)?;
    if !env.instances.is_empty() && !env.instances.contains(&args.instance) {
        warn!(env = %env.name, instance = %args.instance, "instance not listed for environment");
    }
    let host = host.unwrap_or(&env.host);
    Ok(Target::new(host, args.instance.as_str()))
}

/// List environments and instances.
pub fn envs(config: &ConsoleConfig, out: &mut impl Write) -> Result<()> {
    for env in &config.environments {
        writeln!(out, "{}\t{}", env.name, env.host)?;
        for instance in &env.instances {
            writeln!(out, "  {}", instance)?;
        }
    }
    Ok(())
}

/// Print the rows of `target` on every change until `shutdown` resolves.
pub async fn watch(
    controller: &mut TargetController,
    target: Target,
    shutdown: impl Future<Output = ()>,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "watching {}", target)?;
    // Subscribe to changes first so the first snapshot is not missed.
    let mut changes = controller.changes();
    controller.select(Some(target)).await?;

    let mut shown: Option<Vec<Entry>> = None;
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let rows = controller.rows();
                if shown.as_ref() != Some(&rows) {
                    writeln!(out)?;
                    write!(out, "{}", render_rows(&rows))?;
                    out.flush()?;
                    shown = Some(rows);
                }
            }
        }
    }

    controller.clear().await;
    debug!("watch stopped");
    Ok(())
}

/// Wait until `key` has been reported, then edit it.
pub async fn set(
    controller: &mut TargetController,
    target: Target,
    key: &str,
    value: &str,
    wait: Duration,
    out: &mut impl Write,
) -> Result<()> {
    controller.select(Some(target)).await?;
    wait_for_key(controller, key, wait).await?;
    let ack = controller.submit_edit(key, value).await?;
    report(&ack, out)?;
    controller.clear().await;
    Ok(())
}

/// Publish the Start or Stop run state.
pub async fn set_running(
    controller: &mut TargetController,
    target: Target,
    running: bool,
    out: &mut impl Write,
) -> Result<()> {
    controller.select(Some(target)).await?;
    let ack = controller.set_running(running).await?;
    report(&ack, out)?;
    controller.clear().await;
    Ok(())
}

fn report(ack: &Ack, out: &mut impl Write) -> Result<()> {
    writeln!(out, "sent {} = {} to {}", ack.entry.key, ack.entry.value, ack.channel)?;
    Ok(())
}

async fn wait_for_key(controller: &TargetController, key: &str, wait: Duration) -> Result<()> {
    let store = controller.store();
    let reported = || {
        store.find(&RowId::new(Group::Param, key)).is_some()
            || store.find(&RowId::new(Group::State, key)).is_some()
    };

    let mut changes = controller.changes();
    let found = tokio::time::timeout(wait, async {
        while !reported() {
            if changes.changed().await.is_err() {
                break;
            }
        }
    })
    .await;

    match found {
        Ok(()) => Ok(()),
        Err(_) => Err(ConsoleError::Timeout {
            seconds: wait.as_secs(),
            what: format!("`{}` to be reported", key),
        }),
    }
}
