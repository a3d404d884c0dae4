//! Game loop thread: runs the simulation engine at 30Hz and hands out
//! snapshots.
//!
//! The engine is built by the caller (construction can fail on a bad
//! config) and moved into the thread. Commands arrive via an `mpsc` channel.
//! Each snapshot goes to the caller's sink and is stored in shared state for
//! synchronous polling.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use nightloop_core::constants::TICK_RATE;
use nightloop_core::state::LoopSnapshot;
use nightloop_sim::LoopEngine;

use crate::state::{GameLoopCommand, LoopHandle};

/// Nominal duration of one tick.
const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICK_RATE as u64);

/// Spawns the game loop in a new thread.
pub fn spawn_game_loop<F>(engine: LoopEngine, on_snapshot: F) -> LoopHandle
where
    F: FnMut(&LoopSnapshot) + Send + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel::<GameLoopCommand>();
    let latest_snapshot = Arc::new(Mutex::new(None));
    let shared = Arc::clone(&latest_snapshot);

    let thread = std::thread::Builder::new()
        .name("nightloop-game-loop".into())
        .spawn(move || {
            run_game_loop(engine, cmd_rx, &shared, on_snapshot);
        })
        .expect("Failed to spawn game loop thread");

    LoopHandle {
        command_tx: cmd_tx,
        latest_snapshot,
        thread: Some(thread),
    }
}

/// The game loop. Runs until Shutdown command or channel disconnect.
fn run_game_loop<F>(
    mut engine: LoopEngine,
    cmd_rx: mpsc::Receiver<GameLoopCommand>,
    latest_snapshot: &Mutex<Option<LoopSnapshot>>,
    mut on_snapshot: F,
) where
    F: FnMut(&LoopSnapshot),
{
    info!("game loop started");
    let mut next_tick_time = Instant::now();

    loop {
        // 1. Drain all pending commands
        loop {
            match cmd_rx.try_recv() {
                Ok(GameLoopCommand::PlayerCommand(cmd)) => {
                    engine.queue_command(cmd);
                }
                Ok(GameLoopCommand::Shutdown) | Err(mpsc::TryRecvError::Disconnected) => {
                    info!(tick = engine.time().tick, "game loop stopped");
                    return;
                }
                Err(mpsc::TryRecvError::Empty) => break,
            }
        }

        // 2. Advance one tick (engine handles pause internally)
        let snapshot = engine.tick();

        // 3. Store latest snapshot for synchronous polling (before the sink)
        if let Ok(mut lock) = latest_snapshot.lock() {
            *lock = Some(snapshot.clone());
        }

        // 4. Hand the snapshot to the sink
        on_snapshot(&snapshot);

        // 5. Sleep until next tick
        next_tick_time += TICK_DURATION;
        let now = Instant::now();
        if next_tick_time > now {
            std::thread::sleep(next_tick_time - now);
        } else if now - next_tick_time > TICK_DURATION * 2 {
            // Too far behind: reset to avoid catch-up spiral
            debug!("game loop behind schedule, resetting tick clock");
            next_tick_time = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightloop_core::commands::PlayerCommand;
    use nightloop_core::enums::{DoorId, DoorState, GamePhase};
    use nightloop_sim::SimConfig;

    #[test]
    fn test_command_channel_round_trip() {
        let (tx, rx) = mpsc::channel::<GameLoopCommand>();

        tx.send(GameLoopCommand::PlayerCommand(PlayerCommand::RemoveBattery))
            .unwrap();
        tx.send(GameLoopCommand::PlayerCommand(PlayerCommand::Pause))
            .unwrap();
        tx.send(GameLoopCommand::Shutdown).unwrap();

        let commands: Vec<_> = rx.try_iter().collect();

        assert_eq!(commands.len(), 3);
        assert!(matches!(
            commands[0],
            GameLoopCommand::PlayerCommand(PlayerCommand::RemoveBattery)
        ));
        assert!(matches!(
            commands[1],
            GameLoopCommand::PlayerCommand(PlayerCommand::Pause)
        ));
        assert!(matches!(commands[2], GameLoopCommand::Shutdown));
    }

    #[test]
    fn test_snapshot_serialization_under_3ms() {
        let mut engine = LoopEngine::new(SimConfig::default()).unwrap();
        for _ in 0..(25 * TICK_RATE) {
            engine.tick();
        }

        let snapshot = engine.tick();
        let start = Instant::now();
        let json = serde_json::to_string(&snapshot).unwrap();
        let elapsed = start.elapsed();

        assert!(
            elapsed < Duration::from_millis(3),
            "Snapshot serialization took {:?}, should be <3ms",
            elapsed
        );
        assert!(!json.is_empty());
    }

    #[test]
    fn test_loop_thread_applies_commands() {
        let engine = LoopEngine::new(SimConfig::default()).unwrap();
        let (snap_tx, snap_rx) = mpsc::channel();
        let handle = spawn_game_loop(engine, move |snapshot| {
            let _ = snap_tx.send(snapshot.clone());
        });

        handle
            .send(PlayerCommand::InteractHandle {
                door: DoorId::Interior,
            })
            .unwrap();

        let locked = snap_rx
            .iter()
            .take(60)
            .any(|snap| snap.doors.iter().any(|d| d.door == DoorId::Interior && d.state == DoorState::Locked));
        assert!(locked);

        let latest = handle.latest().unwrap();
        assert_eq!(latest.phase, GamePhase::Looping);
        handle.shutdown().unwrap();
    }

    #[test]
    fn test_latest_is_set_when_sink_sees_first_snapshot() {
        let engine = LoopEngine::new(SimConfig::default()).unwrap();
        let (snap_tx, snap_rx) = mpsc::channel();
        let handle = spawn_game_loop(engine, move |snapshot| {
            let _ = snap_tx.send(snapshot.time.tick);
        });

        let first = snap_rx.recv().unwrap();
        // The loop may have moved on, never back.
        let latest = handle.latest().unwrap();
        assert!(latest.time.tick >= first);
        handle.shutdown().unwrap();
    }

    #[test]
    fn test_tick_duration_constant() {
        // 30Hz = 33.333ms per tick
        let expected_nanos = 1_000_000_000u64 / 30;
        assert_eq!(TICK_DURATION.as_nanos(), expected_nanos as u128);
    }
}
