//! Simulation constants and default tuning parameters.
//!
//! Every value here is a default for a field of [`crate::config::LoopConfig`].

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 30;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Break-in timeline ---

/// Earliest first break-in, seconds into the loop.
pub const BREAK_IN_MIN_SECS: f64 = 16.0;

/// Latest first break-in (exclusive).
pub const BREAK_IN_MAX_SECS: f64 = 20.0;

/// Emergency key delay after a failed first attempt (lower bound).
pub const EMERGENCY_DELAY_MIN_SECS: f64 = 35.0;

/// Emergency key delay (exclusive upper bound).
pub const EMERGENCY_DELAY_MAX_SECS: f64 = 40.0;

// --- Reset ---

/// Window after a reset during which further reset requests are dropped.
pub const RESET_COOLDOWN_SECS: f64 = 0.5;

/// Lift applied to the player when placed at the loop-start pose.
pub const SPAWN_HEIGHT_OFFSET: f64 = 0.5;

// --- Vision ---

pub const VISION_DISTANCE: f64 = 10.0;

/// Full cone angle in degrees.
pub const VISION_ANGLE_DEG: f64 = 90.0;

pub const VISION_CHECK_INTERVAL_SECS: f64 = 0.1;

/// Height above the player's feet the sensor aims at.
pub const VISION_AIM_HEIGHT: f64 = 1.0;

/// Height of the intruder's eyes above its feet.
pub const INTRUDER_EYE_HEIGHT: f64 = 1.6;

// --- Loop intruder ---

pub const INTRUDER_WALK_SPEED: f64 = 2.0;
pub const INTRUDER_CHASE_SPEED: f64 = 3.5;

pub const ENTRANCE_DELAY_SECS: f64 = 2.0;
pub const KEY_SEARCH_SECS: f64 = 60.0;
pub const WAIT_INSIDE_SECS: f64 = 30.0;
pub const WATCH_A_SECS: f64 = 10.0;
pub const WATCH_B_SECS: f64 = 10.0;

/// Pause after the intruder unlocks a door.
pub const UNLOCK_DELAY_SECS: f64 = 1.0;

/// Pause after the intruder opens a door.
pub const OPEN_DELAY_SECS: f64 = 0.5;

pub const CHASE_REFRESH_SECS: f64 = 0.1;

/// How long the player may stay unseen before the chase is dropped.
pub const CHASE_RETURN_SECS: f64 = 1.0;

pub const KILL_RADIUS: f64 = 1.0;
pub const ARRIVE_TOLERANCE: f64 = 1.0;

// --- Entry door flow ---

pub const ENTRY_OPEN_DELAY_SECS: f64 = 0.2;
pub const EMERGENCY_UNLOCK_DELAY_SECS: f64 = 1.5;

// --- End-game pursuer ---

pub const PURSUER_SPEED: f64 = 3.0;
pub const PURSUER_REFRESH_SECS: f64 = 0.5;
pub const PURSUER_DOOR_BREAK_RADIUS: f64 = 1.0;

// --- Catch ---

pub const CATCH_HOLD_SECS: f64 = 1.2;

// --- Ending ---

pub const ENDING_BREAK_DELAY_SECS: f64 = 3.0;
pub const ENDING_SPAWN_DELAY_SECS: f64 = 1.0;

// --- Perception ---

/// How often a random reality glimpse is rolled while hallucinating.
pub const PERCEPTION_CHECK_INTERVAL_SECS: f64 = 2.0;

/// Glimpse chance per roll with an empty reality meter.
pub const BASE_REALITY_CHANCE: f64 = 0.05;

/// Extra glimpse chance at a full reality meter.
pub const METER_CHANCE_MULTIPLIER: f64 = 0.1;

pub const RANDOM_REALITY_SECS: f64 = 2.0;
pub const EVIDENCE_GLIMPSE_SECS: f64 = 1.0;

/// Reality meter gain per piece of evidence.
pub const EVIDENCE_METER_GAIN: f64 = 0.1;

/// Forced reality after taking the medicine.
pub const MEDICINE_REALITY_SECS: f64 = 30.0;

/// Evidence the emergency call needs.
pub const ADDRESS_EVIDENCE_ID: &str = "address";
