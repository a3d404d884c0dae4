//! Loop snapshot: the debug HUD view of the simulation after each tick.

use serde::{Deserialize, Serialize};

use crate::components::VisibilitySample;
use crate::enums::*;
use crate::events::LoopEvent;
use crate::types::{Pose, SimTime};

/// Complete visible state after one tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopSnapshot {
    pub time: SimTime,
    pub phase: GamePhase,
    pub loop_state: LoopView,
    pub doors: Vec<DoorView>,
    pub player: Option<PlayerView>,
    pub intruders: Vec<IntruderView>,
    pub ending: EndingView,
    pub perception: PerceptionView,
    /// Events produced during this tick, in order.
    pub events: Vec<LoopEvent>,
}

/// Time-loop kernel state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopView {
    pub loop_index: u32,
    /// Seconds into the current loop.
    pub elapsed_secs: f64,
    pub break_in_deadline: f64,
    pub emergency_deadline: Option<f64>,
    pub break_in_phase: BreakInPhase,
    pub battery_removed: bool,
    pub reset_blocked: bool,
    pub scenario_blocked: bool,
    pub reset_in_flight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorView {
    pub door: DoorId,
    pub state: DoorState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub pose: Pose,
    pub hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntruderView {
    pub serial: u32,
    pub kind: IntruderKind,
    pub pose: Pose,
    /// Only the loop intruder runs the scripted steps.
    pub step: Option<IntruderStep>,
    pub visibility: Option<VisibilitySample>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndingView {
    pub stage: EndingStage,
    pub rollback_count: u32,
    pub checkpoint_captured: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerceptionView {
    pub state: PerceptionState,
    pub reality_meter: f64,
    /// Evidence found so far, sorted.
    pub evidence: Vec<String>,
    pub forced_remaining_secs: Option<f64>,
    pub medicine_available: bool,
}
