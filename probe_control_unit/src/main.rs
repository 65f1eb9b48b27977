//! # Probe Control Unit
//!
//! Deterministic firing controller for a safety-interlocked probe
//! driver. Loads the probe profile table and intensity LUT from a
//! TOML config, then enters the paced tick loop until shutdown.
//!
//! The binary drives the controller with a scripted exercise sequence
//! (enable → start → arm → periodic trigger pulses) so the full state
//! machine can be observed end to end on a bench without host register
//! plumbing. A host integration replaces the input closure.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use probe_common::config::load_config;
use probe_control_unit::controller::{FiringController, TickInputs};
use probe_control_unit::runner::TickRunner;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Probe Control Unit — deterministic firing state machine
#[derive(Parser, Debug)]
#[command(name = "probe_control_unit")]
#[command(version)]
#[command(about = "Safety-interlocked probe firing controller")]
struct Args {
    /// Path to the configuration TOML.
    #[arg(default_value = "config/probe.toml")]
    config: PathBuf,

    /// Probe table slot to drive (0-3).
    #[arg(long, default_value_t = 0)]
    profile: u8,

    /// Intensity request [%].
    #[arg(long, default_value_t = 50)]
    intensity: u8,

    /// Ticks between scripted trigger pulses.
    #[arg(long, default_value_t = 5000)]
    trigger_interval: u64,

    /// Stop after this many ticks (default: run until signalled).
    #[arg(long)]
    ticks: Option<u64>,

    /// Stop the loop on the first hard fault.
    #[arg(long)]
    halt_on_fault: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!(
        "Probe Control Unit v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Probe Control Unit shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    info!(
        "Config OK: tick_rate={}Hz, profiles={}",
        config.controller.tick_rate_hz,
        config.profiles.len(),
    );

    let table = config.build_table()?;
    let lut = config.lut.build_lut();
    let controller = FiringController::new(table, lut, &config.controller);

    let mut runner = TickRunner::new(controller, &config.controller);
    runner.halt_on_fault = args.halt_on_fault;

    // Setup signal handler for graceful shutdown.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    info!("TickRunner initialized, entering tick loop");

    let profile = args.profile;
    let intensity = args.intensity;
    let interval = args.trigger_interval.max(1);
    let reason = runner.run(
        move |tick| TickInputs {
            enable: true,
            start: true,
            arm: true,
            trigger: tick % interval == 0 && tick > 0,
            profile_select: profile,
            intensity_percent: intensity,
            ..TickInputs::default()
        },
        &running,
        args.ticks,
    );

    let stats = &runner.stats;
    info!(
        "Loop done ({reason:?}): ticks={}, avg={}ns, max={}ns, overruns={}",
        stats.tick_count,
        stats.avg_tick_ns(),
        stats.max_tick_ns,
        stats.overruns,
    );

    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
