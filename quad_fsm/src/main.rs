//! # Quadruped Control FSM
//!
//! Runs the control-mode state machine in a fixed-period loop. The
//! configuration file selects the robot, running mode, gains and an
//! optional scripted schedule of mode requests; the loop runs until
//! `--ticks` cycles have executed or SIGINT/SIGTERM arrives.

use clap::Parser;
use quad_common::consts::DEFAULT_CONFIG_PATH;
use quad_fsm::config::{LoadedConfig, load_config};
use quad_fsm::cycle::{CycleRunner, RtSettings};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Quadruped control FSM, fixed-period control loop
#[derive(Parser, Debug)]
#[command(name = "quad_fsm")]
#[command(version)]
#[command(about = "Control-mode state machine for a quadruped controller")]
struct Args {
    /// Path to the FSM configuration TOML.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stop after this many cycles (default: run until signalled).
    #[arg(long)]
    ticks: Option<u64>,

    /// CPU core to pin the control thread to (default: no pinning).
    #[arg(long)]
    cpu_core: Option<usize>,

    /// SCHED_FIFO priority, 1-99 (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    // Loaded before tracing so `[shared] log_level` can set the default filter.
    let loaded = load_config(&args.config);
    let directive = match (&loaded, args.verbose) {
        (_, true) => "debug",
        (Ok(cfg), false) => cfg.shared.log_level.as_directive(),
        (Err(_), false) => "info",
    };
    setup_tracing(&args, directive);

    info!("Quad FSM v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = loaded
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|cfg| run(&args, cfg));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Quad FSM shutdown complete");
}

fn run(args: &Args, loaded: LoadedConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Config OK: service={}, dt={}s, robot={:?}, running_mode={:?}",
        loaded.shared.service_name,
        loaded.control.controller_dt,
        loaded.control.robot_type,
        loaded.control.running_mode,
    );

    let rt = RtSettings {
        cpu_core: args.cpu_core,
        priority: args.rt_priority,
    };
    rt.apply()?;
    info!(
        "RT setup complete (cpu_core={:?}, priority={})",
        rt.cpu_core, rt.priority
    );

    let mut runner = CycleRunner::new(loaded)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        flag.store(true, Ordering::SeqCst);
    })?;

    let result = runner.run(args.ticks, &shutdown);

    let fsm = runner.fsm();
    let stats = runner.stats();
    info!(
        "Stopped after {} ticks in {}: transitions={}, estops={}, faults={:?}, defects={}, avg={}ns, max={}ns, overruns={}",
        runner.tick(),
        fsm.state(),
        fsm.stats().transitions,
        fsm.stats().estops,
        fsm.faults(),
        fsm.fault_count(),
        stats.avg_cycle_ns(),
        stats.max_cycle_ns,
        stats.overruns,
    );

    if let Err(e) = result {
        error!("RT loop error: {e}");
        return Err(Box::new(e));
    }
    Ok(())
}

/// Setup tracing subscriber. `RUST_LOG` overrides `directive`.
fn setup_tracing(args: &Args, directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

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
