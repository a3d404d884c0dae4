//! Player commands sent from the input layer to the simulation.
//!
//! Commands are queued and processed at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::enums::DoorId;
use crate::types::Pose;

/// All player commands the simulation understands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerCommand {
    /// Click the door leaf: open/close toggle.
    InteractDoor { door: DoorId },
    /// Click the door handle: lock/unlock toggle.
    InteractHandle { door: DoorId },
    /// Pull the battery out of the entry keypad.
    RemoveBattery,
    /// Step into the hide zone.
    EnterHideZone,
    /// Step out of the hide zone.
    LeaveHideZone,
    /// Movement from the input/locomotion layer.
    MovePlayer { pose: Pose },
    /// Debug hotkey: restart the loop.
    DebugResetLoop,
    /// Examine a clue; new evidence raises the reality meter.
    InspectEvidence { evidence: String },
    /// Take the kitchen medicine.
    TakeMedicine,
    /// Place the emergency call. Starts the ending if the player sees
    /// reality and knows the address.
    ReportEmergencyCall,
    /// Player stepped onto the exit trigger.
    ReachExit,
    /// Intro finished; start the first loop.
    FinishOpening,
    Pause,
    Resume,
}
