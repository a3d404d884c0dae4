//! Intruder AI for NIGHTLOOP.
//!
//! Implements the loop intruder's interruptible scripted state machine, the
//! end-game pursuer, and the per-kind behavior profiles both read.
//! No ECS dependency: brains talk to the world through [`nav::Navigator`]
//! and plain data.

pub mod fsm;
pub mod nav;
pub mod profiles;
pub mod pursuit;

pub use nightloop_core as core;

#[cfg(test)]
mod tests;
