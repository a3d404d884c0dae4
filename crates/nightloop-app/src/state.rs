//! Handle to a running game loop, shared with whoever feeds it input.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use nightloop_core::commands::PlayerCommand;
use nightloop_core::state::LoopSnapshot;

use crate::error::AppError;

/// Commands sent to the game loop thread.
#[derive(Debug)]
pub enum GameLoopCommand {
    /// A player command to forward to the simulation engine.
    PlayerCommand(PlayerCommand),
    /// Shut down the game loop thread gracefully.
    Shutdown,
}

/// Owning handle returned by [`crate::game_loop::spawn_game_loop`].
///
/// The latest snapshot is kept behind `Arc<Mutex<..>>` so it can be polled
/// synchronously while the loop thread keeps ticking.
pub struct LoopHandle {
    pub(crate) command_tx: mpsc::Sender<GameLoopCommand>,
    pub(crate) latest_snapshot: Arc<Mutex<Option<LoopSnapshot>>>,
    pub(crate) thread: Option<JoinHandle<()>>,
}

impl LoopHandle {
    /// Forward a player command to the loop thread.
    pub fn send(&self, command: PlayerCommand) -> Result<(), AppError> {
        self.command_tx
            .send(GameLoopCommand::PlayerCommand(command))
            .map_err(|_| AppError::LoopStopped)
    }

    /// Most recent snapshot, if the loop has ticked at least once.
    pub fn latest(&self) -> Option<LoopSnapshot> {
        self.latest_snapshot.lock().ok().and_then(|lock| lock.clone())
    }

    /// Stop the loop and wait for the thread to exit.
    pub fn shutdown(mut self) -> Result<(), AppError> {
        // The thread may already be gone; joining still reports a panic.
        let _ = self.command_tx.send(GameLoopCommand::Shutdown);
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| AppError::LoopPanicked),
            None => Ok(()),
        }
    }
}
