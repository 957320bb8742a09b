// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! ZoneWatch - zone-based vehicle monitoring with manager alerts
//!
//! Watches a camera feed, assigns each newly tracked vehicle to the zone it
//! first appears in and notifies that zone's manager.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use zonewatch::core::{EventPayload, Monitor};
use zonewatch::detection::simulated_pipeline;
use zonewatch::{Config, ContactRouter, Rect, NAME, VERSION};

/// ZoneWatch - zone-based vehicle monitoring
#[derive(Parser, Debug)]
#[command(name = "zonewatch")]
#[command(author = "bad-antics")]
#[command(version = VERSION)]
#[command(about = "Assign tracked vehicles to zones and alert zone managers")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Zone layout to monitor (defaults to the first layout in the config)
    #[arg(short, long)]
    layout: Option<String>,

    /// Demo mode with a simulated camera and detector
    #[arg(long)]
    demo: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    run_for_secs: Option<u64>,

    /// Write an N x N grid layout into the config file and exit
    #[arg(long, value_name = "N")]
    generate_grid: Option<u32>,

    /// Screen region covered by --generate-grid
    #[arg(long, value_name = "X0,Y0,X1,Y1", value_parser = parse_region, default_value = "0,0,1280,720")]
    region: Rect,

    /// Append delivery outcomes to this JSON-lines file
    #[arg(long)]
    journal: Option<PathBuf>,

    /// List configured layouts and exit
    #[arg(long)]
    list_layouts: bool,
}

fn parse_region(s: &str) -> Result<Rect, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid coordinate in '{}': {}", s, e))?;

    match parts.as_slice() {
        &[x0, y0, x1, y1] => {
            let rect = Rect::new(x0, y0, x1, y1);
            if rect.is_well_formed() {
                Ok(rect)
            } else {
                Err(format!("region '{}' must satisfy x0 <= x1 and y0 <= y1", s))
            }
        }
        _ => Err(format!("expected four comma-separated numbers, got '{}'", s)),
    }
}

/// Log directive: --trace/--debug first, then RUST_LOG, then the config file
fn log_directive(args: &Args, config: &Config, env: Option<String>) -> String {
    if args.trace {
        "trace".to_string()
    } else if args.debug {
        "debug".to_string()
    } else {
        env.filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| config.log_level.clone())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)
        .with_context(|| format!("failed to load configuration from {:?}", config_path))?;

    // Initialize logging
    let directive = log_directive(&args, &config, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log level '{}'", directive))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{} v{}", NAME, VERSION);
    info!("Configuration loaded from {:?}", config_path);

    if let Some(size) = args.generate_grid {
        let name = config.apply_grid(size, args.region)?;
        config.save(&config_path)?;
        info!("Wrote {} grid layout '{}' over {:?} to {:?}", size, name, args.region, config_path);
        return Ok(());
    }

    if args.list_layouts {
        for id in config.layout_ids() {
            let zones = config.layouts.get(id).map(|l| l.zones.len()).unwrap_or(0);
            println!("{}\t{} zones", id, zones);
        }
        return Ok(());
    }

    // Override with command line args
    if args.demo {
        config.demo_mode = true;
    }
    if let Some(path) = args.journal.clone() {
        config.journal.enabled = true;
        config.journal.path = path;
    }

    let layout = match args.layout.clone() {
        Some(layout) => layout,
        None => config
            .layout_ids()
            .first()
            .map(|s| s.to_string())
            .context("configuration defines no zone layouts")?,
    };
    info!("Demo mode: {}", config.demo_mode);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, layout, args.run_for_secs))
}

async fn run(config: Config, layout: String, run_for_secs: Option<u64>) -> Result<()> {
    if !config.demo_mode {
        bail!("no live frame source is built into this binary; run with --demo to use the simulator");
    }

    let sink = Arc::new(ContactRouter::from_config(&config.dispatch)?);
    let (camera, detector) = simulated_pipeline(1280, 720, None);

    let mut monitor = Monitor::new(config, sink);
    monitor.start(&layout, Box::new(camera), Box::new(detector))?;

    let mut events = monitor.event_bus().subscribe_events();
    let watcher = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match event.payload {
                    EventPayload::Alert { zone_id, track_id, class_label, .. } => {
                        info!("🚚 {} {} entered zone {}", class_label, track_id, zone_id)
                    }
                    EventPayload::CycleSkipped { stage, error } => {
                        warn!("Cycle skipped at {}: {}", stage, error)
                    }
                    _ => {}
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event watcher lagged, {} events missed", n)
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    info!("🚀 {} monitoring layout '{}'", NAME, layout);
    match run_for_secs {
        Some(secs) => {
            info!("   Running for {}s", secs);
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
        None => {
            info!("   Press Ctrl+C to shutdown");
            tokio::signal::ctrl_c().await?;
            info!("Shutdown signal received, cleaning up...");
        }
    }

    let diagnostics = monitor.diagnostics();
    let summary = monitor.stop().await?;
    watcher.abort();

    info!(
        "Session summary: {} cycles ({} failed, {} deadline misses), {} objects tracked at exit",
        summary.scheduler.total_cycles,
        diagnostics.cycles_failed,
        summary.scheduler.deadline_misses,
        diagnostics.tracked_objects
    );
    info!(
        "Alerts: {} raised, {} delivered, {} failed, {} timed out, {} undeliverable, {} dropped",
        summary.dispatch.enqueued,
        summary.dispatch.delivered,
        summary.dispatch.failed,
        summary.dispatch.timed_out,
        summary.dispatch.undeliverable,
        summary.dispatch.dropped_on_shutdown
    );
    info!("{} shutdown complete", NAME);

    Ok(())
}
