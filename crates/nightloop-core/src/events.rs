//! Events emitted by the simulation for presentation and UI feedback.
//!
//! Events are appended to the tick's ordered list in the producer's control
//! flow and handed out with the snapshot at the end of the tick.

use serde::{Deserialize, Serialize};

use crate::enums::*;

/// Outbound simulation events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoopEvent {
    /// A new loop began.
    LoopStarted { loop_index: u32 },
    /// The intruder is coming in through the entry door.
    BreakInSucceeded { method: BreakInMethod },
    /// First attempt failed (battery pulled); retry at `deadline` loop seconds.
    BreakInDelayed { deadline: f64 },
    /// A door accepted a transition.
    DoorStateChanged {
        door: DoorId,
        old: DoorState,
        new: DoorState,
        reason: String,
        mode: TransitionMode,
    },
    /// The player interacted with something that refused the request.
    InteractionRejected { reason: String },
    /// Keypad battery pulled this loop.
    BatteryRemoved,
    /// An intruder entered the world.
    IntruderSpawned { intruder: u32, kind: IntruderKind },
    /// An intruder left the world.
    IntruderDespawned { intruder: u32, kind: IntruderKind },
    /// One-shot line spoken on entrance.
    IntruderLine { intruder: u32, line: String },
    /// The vision sensor acquired the player.
    TargetSpotted { intruder: u32 },
    /// The loop intruder switched step.
    IntruderStateChanged {
        intruder: u32,
        old: IntruderStep,
        new: IntruderStep,
        reason: String,
    },
    /// The player was grabbed; the catch resolves after a hold.
    PlayerCaught { kind: CatchKind },
    /// Perception flipped between hallucination and reality.
    PerceptionChanged {
        old: PerceptionState,
        new: PerceptionState,
        reason: String,
    },
    /// A clue was found for the first time.
    EvidenceDiscovered { evidence: String, reality_meter: f64 },
    MedicineTaken { reality_secs: f64 },
    /// The emergency call was placed but did not go through.
    EmergencyCallFailed { reason: CallFailure },
    /// Outbound request for the UI layer to close any open interaction panel.
    InteractionUiClosed,
    /// Terminal phase began.
    EndingStarted,
    /// End-game catch rolled the world back to the checkpoint.
    CheckpointRestored { rollback_count: u32 },
    /// The player reached the exit during the ending.
    EscapeSucceeded,
}
