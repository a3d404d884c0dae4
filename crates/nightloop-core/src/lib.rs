//! Core types and definitions for the NIGHTLOOP simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! components, commands, events, configuration, state snapshots and
//! constants. It also hosts the two small state machines every other
//! crate leans on: the door rule table and the reset registry.
//! It has no dependency on the ECS or any runtime framework.

pub mod commands;
pub mod components;
pub mod config;
pub mod constants;
pub mod door;
pub mod enums;
pub mod error;
pub mod events;
pub mod reset;
pub mod state;
pub mod types;

pub use error::CoreError;

#[cfg(test)]
mod tests;
