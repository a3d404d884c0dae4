//! NIGHTLOOP headless runner CLI.
//!
//! Runs a scripted session and logs every outbound event. With `--realtime`
//! the session runs on the 30Hz game loop thread instead of as fast as the
//! engine can tick.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nightloop_app::game_loop::spawn_game_loop;
use nightloop_app::script::{run_session, Script};
use nightloop_app::settings::load_or_default;
use nightloop_app::AppError;
use nightloop_core::state::LoopSnapshot;
use nightloop_sim::{LoopEngine, SimConfig};

#[derive(Parser, Debug)]
#[command(name = "nightloop")]
#[command(about = "Run a headless NIGHTLOOP session", long_about = None)]
struct Args {
    /// RNG seed for the break-in deadlines
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Session length in seconds
    #[arg(short = 't', long, default_value = "120")]
    seconds: f64,

    /// JSON config file overriding the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON script of timed player commands (defaults to a built-in demo)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Hold the first loop for the intro until FinishOpening is issued
    #[arg(long)]
    opening: bool,

    /// Tick on the 30Hz game loop thread
    #[arg(long)]
    realtime: bool,
}

fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(err) = run(&args) {
        error!(error = %err, "session failed");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn run(args: &Args) -> Result<(), AppError> {
    let loop_config = load_or_default(args.config.as_deref())?;
    let script = match &args.script {
        Some(path) => Script::load(path)?,
        None => Script::demo(),
    };
    info!(seed = args.seed, seconds = args.seconds, steps = script.len(), "starting session");

    let mut engine = LoopEngine::new(SimConfig {
        seed: args.seed,
        skip_opening: !args.opening,
        loop_config,
    })?;

    if args.realtime {
        run_realtime(engine, &script, args.seconds)
    } else {
        run_session(&mut engine, &script, args.seconds, log_events);
        Ok(())
    }
}

/// Feed the script to the game loop thread on wall-clock time.
fn run_realtime(engine: LoopEngine, script: &Script, seconds: f64) -> Result<(), AppError> {
    let (snap_tx, snap_rx) = mpsc::channel::<LoopSnapshot>();
    let handle = spawn_game_loop(engine, move |snapshot| {
        let _ = snap_tx.send(snapshot.clone());
    });

    let start = Instant::now();
    let deadline = Duration::from_secs_f64(seconds.max(0.0));
    let mut steps = script.steps().iter().peekable();

    while start.elapsed() < deadline {
        let elapsed = start.elapsed().as_secs_f64();
        while let Some(step) = steps.next_if(|s| s.at_secs <= elapsed) {
            handle.send(step.command.clone())?;
        }
        for snapshot in snap_rx.try_iter() {
            log_events(&snapshot);
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    if let Some(snapshot) = handle.latest() {
        info!(
            loop_index = snapshot.loop_state.loop_index,
            phase = ?snapshot.phase,
            "realtime session finished"
        );
    }
    handle.shutdown()
}

fn log_events(snapshot: &LoopSnapshot) {
    for event in &snapshot.events {
        info!(
            t = snapshot.time.elapsed_secs,
            loop_index = snapshot.loop_state.loop_index,
            ?event,
            "event"
        );
    }
}
