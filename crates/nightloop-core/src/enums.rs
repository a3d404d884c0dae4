//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Door state shared by every door in the house.
///
/// `Broken` is absorbing: only a checkpoint rollback leaves it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorState {
    Open,
    #[default]
    Closed,
    Locked,
    Broken,
}

impl DoorState {
    /// Whether an actor can walk through the doorway.
    pub fn is_passable(self) -> bool {
        matches!(self, DoorState::Open | DoorState::Broken)
    }

    /// Whether the door leaf blocks sight through the doorway.
    pub fn blocks_sight(self) -> bool {
        matches!(self, DoorState::Closed | DoorState::Locked)
    }
}

/// How a door transition should be presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionMode {
    /// Normal play: hinge animation, sounds.
    #[default]
    Animated,
    /// Reset or rollback: snap to the final pose.
    Instant,
}

/// The two doors the loop revolves around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorId {
    /// Interior room door (the bathroom the player hides in).
    Interior,
    /// Main entry door the intruder breaks in through.
    Entry,
}

/// Break-in phase of the current loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakInPhase {
    /// Waiting for the first break-in deadline.
    #[default]
    FirstAttempt,
    /// Battery was pulled; the intruder is fetching the emergency key.
    WaitingEmergencyKey,
    /// Break-in resolved (or suppressed) for this loop.
    Done,
}

/// How the intruder got through the entry door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakInMethod {
    /// Keypad lock still powered.
    Primary,
    /// Battery removed, emergency key used after the delay.
    Secondary,
}

/// Scripted steps of the loop intruder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntruderStep {
    #[default]
    Entrance,
    GoToDoor,
    SearchForKey,
    ReturnToDoor,
    UnlockAndEnter,
    WaitInside,
    GoToWatchPointA,
    WatchA,
    GoToWatchPointB,
    WatchB,
    Chasing,
}

/// Which kind of actor is after the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntruderKind {
    /// Scripted loop intruder with a vision sensor.
    #[default]
    Loop,
    /// End-game pursuer that always knows where the player is.
    Pursuer,
}

/// Who caught the player; decides what the catch resolves into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatchKind {
    /// Resolves into a full loop reset.
    Loop,
    /// Resolves into a checkpoint rollback.
    Pursuer,
}

impl From<IntruderKind> for CatchKind {
    fn from(kind: IntruderKind) -> Self {
        match kind {
            IntruderKind::Loop => CatchKind::Loop,
            IntruderKind::Pursuer => CatchKind::Pursuer,
        }
    }
}

/// How the player currently perceives the house.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerceptionState {
    #[default]
    Hallucination,
    Reality,
}

/// Why an emergency call did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallFailure {
    /// The player is hallucinating and cannot read the phone.
    NotInReality,
    /// The player has not found the house address yet.
    AddressUnknown,
}

/// Top-level game phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Non-interactive intro; the loop clock is frozen.
    #[default]
    Opening,
    /// Normal time-loop play.
    Looping,
    /// Terminal checkpoint phase.
    Ending,
    /// Player escaped.
    Finished,
    /// Paused by the player.
    Paused,
}

/// Stage of the end-game sub-sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndingStage {
    #[default]
    Inactive,
    /// Counting down to the entry door being smashed.
    AwaitingBreak,
    /// Door is down, pursuer not yet in.
    AwaitingSpawn,
    /// Pursuer is in the house.
    Pursuit,
    /// Escape completed.
    Complete,
}
