//! ECS components for hecs entities.
//!
//! Components are plain data. Game logic lives in systems, with one
//! exception: fixtures carry their own small rule tables (doors, battery
//! lock, hide zone, medicine) because the player and the intruder both drive them.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::VisionConfig;
use crate::door::{DoorMachine, InteractOutcome};
use crate::enums::*;
use crate::reset::Resettable;
use crate::types::Position;

/// Marks the player entity. The player also carries a `Pose`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Player;

/// Marks an actor hunting the player.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Intruder {
    /// Session-unique serial, used in events.
    pub serial: u32,
    pub kind: IntruderKind,
}

/// Navigation agent state. Written by the actor's brain, consumed by the
/// movement system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NavAgent {
    pub destination: Option<Position>,
    pub stopped: bool,
    /// Walking speed (m/s).
    pub speed: f64,
    /// A fresh destination has not been planned yet; remaining distance is
    /// unknown until the movement system clears this.
    pub path_pending: bool,
}

impl NavAgent {
    pub fn new(speed: f64) -> Self {
        Self {
            destination: None,
            stopped: true,
            speed,
            path_pending: false,
        }
    }
}

/// Result of the most recent sight check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VisibilitySample {
    pub is_visible: bool,
    /// Target's feet position when last seen.
    pub last_seen_position: Option<Position>,
    /// Session time of the last positive check.
    pub last_seen_time: Option<f64>,
}

/// Periodic sight sensor carried by the loop intruder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VisionSensor {
    pub config: VisionConfig,
    pub sample: VisibilitySample,
    /// Seconds accumulated since the last check.
    pub timer: f64,
}

impl VisionSensor {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config,
            sample: VisibilitySample::default(),
            timer: 0.0,
        }
    }
}

/// A player request against a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Click on a door leaf.
    Door,
    /// Click on a door handle.
    Handle,
    RemoveBattery,
    Enter,
    Leave,
    TakeMedicine,
}

/// Something the player can click or walk into.
pub trait Interactable {
    fn interact(&mut self, interaction: Interaction) -> InteractOutcome;
}

/// Interactive world objects. Every fixture is a registered resettable.
#[derive(Debug, Clone)]
pub enum Fixture {
    Door(DoorMachine),
    /// Entry keypad; pulling the battery delays the break-in once per loop.
    BatteryLock { removed: bool },
    /// Spot the player can hide in.
    HideZone { occupied: bool },
    /// Kitchen medicine: forces reality for a while, once per loop.
    Medicine { used: bool, once_per_loop: bool },
}

impl Fixture {
    pub fn as_door(&self) -> Option<&DoorMachine> {
        match self {
            Fixture::Door(door) => Some(door),
            _ => None,
        }
    }

    pub fn as_door_mut(&mut self) -> Option<&mut DoorMachine> {
        match self {
            Fixture::Door(door) => Some(door),
            _ => None,
        }
    }
}

impl Interactable for Fixture {
    fn interact(&mut self, interaction: Interaction) -> InteractOutcome {
        match (self, interaction) {
            (Fixture::Door(door), Interaction::Door) => door.interact_door(),
            (Fixture::Door(door), Interaction::Handle) => door.interact_handle(),
            (Fixture::BatteryLock { removed }, Interaction::RemoveBattery) => {
                if *removed {
                    return InteractOutcome::Rejected("battery already removed");
                }
                *removed = true;
                info!("keypad battery removed");
                InteractOutcome::Accepted
            }
            (Fixture::HideZone { occupied }, Interaction::Enter) => {
                if *occupied {
                    return InteractOutcome::Rejected("already hidden");
                }
                *occupied = true;
                InteractOutcome::Accepted
            }
            (Fixture::HideZone { occupied }, Interaction::Leave) => {
                if !*occupied {
                    return InteractOutcome::Rejected("not hidden");
                }
                *occupied = false;
                InteractOutcome::Accepted
            }
            (Fixture::Medicine { used, once_per_loop }, Interaction::TakeMedicine) => {
                if *used {
                    return InteractOutcome::Rejected("medicine already taken this loop");
                }
                *used = *once_per_loop;
                info!("medicine taken");
                InteractOutcome::Accepted
            }
            _ => InteractOutcome::Rejected("nothing to do"),
        }
    }
}

impl Resettable for Fixture {
    fn reset_state(&mut self) {
        match self {
            Fixture::Door(door) => door.reset(),
            Fixture::BatteryLock { removed } => *removed = false,
            Fixture::HideZone { occupied } => *occupied = false,
            Fixture::Medicine { used, .. } => *used = false,
        }
    }
}
