//! NIGHTLOOP headless runner.
//!
//! Wires the simulation engine to a fixed-rate game loop thread, loads
//! session configuration from disk and drives scripted sessions.

pub mod error;
pub mod game_loop;
pub mod script;
pub mod settings;
pub mod state;

pub use error::AppError;
pub use nightloop_core as core;
