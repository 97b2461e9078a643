//! Command handlers: wire config, window, session and runner together.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::time::Duration;

use crate::cli::{AwrArgs, SnapshotsArgs, TargetArgs};
use crate::config::{env_optional, load_config, resolve_config_path, GatherConfig};
use crate::ocp::{OcpClient, Target};
use crate::runner::{run_all, GatheredArtifact, RunSettings};
use crate::session::GatherSession;
use crate::snapshots::select_snapshots;
use crate::summary::{append_summary, render_summary};
use crate::timeutil::{format_datetime, now_local};
use crate::window::{self, TimeWindow, WindowOptions};

fn load_targets(args: &TargetArgs) -> Result<(GatherConfig, Vec<Target>)> {
    let path = resolve_config_path(args.config.clone());
    let mut config = load_config(&path)?;
    config.apply_env_overrides(env_optional);
    finish_config(config, args)
}

fn finish_config(config: GatherConfig, args: &TargetArgs) -> Result<(GatherConfig, Vec<Target>)> {
    config.validate()?;
    let targets = config.resolve_targets(&args.clusters)?;
    Ok((config, targets))
}

fn resolve_window(options: WindowOptions) -> Result<TimeWindow> {
    let window = window::resolve(&options, now_local()).context("failed to resolve time window")?;
    tracing::info!(from = %window.from_time_str(), to = %window.to_time_str(), "resolved time window");
    Ok(window)
}

fn apply_awr_overrides(config: &mut GatherConfig, args: &AwrArgs) {
    if let Some(store_dir) = &args.store_dir {
        config.store_dir = store_dir.clone();
    }
    if let Some(interval) = args.poll_interval {
        config.polling.interval_seconds = interval;
        config.polling.max_interval_seconds = config.polling.max_interval_seconds.max(interval);
    }
    if let Some(timeout) = args.task_timeout {
        config.polling.timeout_seconds = timeout;
    }
    if let Some(timeout) = args.target_timeout {
        config.target_timeout_seconds = timeout;
    }
}

/// `awr`: one pack dir per invocation, one report per target, one summary.
pub fn gather_awr(args: AwrArgs) -> Result<Vec<GatheredArtifact>> {
    let window = resolve_window(args.window.clone().into())?;

    let path = resolve_config_path(args.targets.config.clone());
    let mut config = load_config(&path)?;
    config.apply_env_overrides(env_optional);
    apply_awr_overrides(&mut config, &args);
    let (config, targets) = finish_config(config, &args.targets)?;

    let session = GatherSession::start(&config.store_dir, window, now_local())?;
    let settings = RunSettings {
        poll: config.poll_policy(),
        target_timeout: config.target_timeout(),
    };
    let http_timeout = config.http_timeout();

    let artifacts = run_all(
        &targets,
        |target| OcpClient::new(target, http_timeout),
        &session,
        &settings,
    );

    let rendered = render_summary(&artifacts);
    println!("{rendered}");
    append_summary(&session.summary_path(), &rendered).with_context(|| {
        format!(
            "Failed to write summary to {}",
            session.summary_path().display()
        )
    })?;
    let failed = artifacts.iter().filter(|a| a.is_error).count();
    tracing::info!(
        targets = artifacts.len(),
        failed,
        started_at = %format_datetime(session.started_at),
        from = %session.from_time(),
        to = %session.to_time(),
        pack_dir = %session.pack_dir.display(),
        "gather finished"
    );
    Ok(artifacts)
}

/// `snapshots`: show what a gather over the same window would pick.
pub fn list_snapshots(args: SnapshotsArgs) -> Result<()> {
    let window = resolve_window(args.window.clone().into())?;
    let (config, targets) = load_targets(&args.targets)?;
    let stdout = io::stdout();
    write_snapshot_listing(&mut stdout.lock(), &targets, &window, config.http_timeout())
        .context("Failed to write snapshot listing")
}

/// One block per target. A failing target prints its error and the listing
/// moves on.
fn write_snapshot_listing<W: Write>(
    out: &mut W,
    targets: &[Target],
    window: &TimeWindow,
    http_timeout: Duration,
) -> io::Result<()> {
    for target in targets {
        writeln!(out, "{} ({}):", target.cluster_name, window.widened())?;
        let selected = OcpClient::new(target, http_timeout)
            .and_then(|client| select_snapshots(&client, &target.cluster_name, window));
        match selected {
            Ok(snapshots) if snapshots.is_empty() => writeln!(out, "  no snapshots")?,
            Ok(snapshots) => {
                for snapshot in snapshots {
                    writeln!(
                        out,
                        "  {:>10}  {}",
                        snapshot.snapshot_id,
                        format_datetime(snapshot.snapshot_time)
                    )?;
                }
            }
            Err(err) => {
                tracing::warn!(cluster = %target.cluster_name, error = %err, "snapshot listing failed");
                writeln!(out, "  error: {err}")?;
            }
        }
    }
    Ok(())
}
