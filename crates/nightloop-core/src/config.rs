//! Tunable configuration for a session.
//!
//! Every section carries `#[serde(default)]`, so a JSON file only needs the
//! fields it overrides.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::PerceptionState;
use crate::error::CoreError;
use crate::types::{Pose, Position};

/// Full session configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub break_in: BreakInConfig,
    pub reset: ResetConfig,
    pub vision: VisionConfig,
    pub intruder: IntruderConfig,
    pub pursuer: PursuerConfig,
    pub catch: CatchConfig,
    pub ending: EndingConfig,
    pub perception: PerceptionConfig,
    pub layout: LayoutConfig,
}

/// Break-in timeline. Ranges are half-open `[min, max)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakInConfig {
    pub min_secs: f64,
    pub max_secs: f64,
    pub emergency_min_secs: f64,
    pub emergency_max_secs: f64,
}

impl Default for BreakInConfig {
    fn default() -> Self {
        Self {
            min_secs: BREAK_IN_MIN_SECS,
            max_secs: BREAK_IN_MAX_SECS,
            emergency_min_secs: EMERGENCY_DELAY_MIN_SECS,
            emergency_max_secs: EMERGENCY_DELAY_MAX_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetConfig {
    pub cooldown_secs: f64,
    pub spawn_height_offset: f64,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: RESET_COOLDOWN_SECS,
            spawn_height_offset: SPAWN_HEIGHT_OFFSET,
        }
    }
}

/// Vision sensor settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Maximum sight range (m).
    pub distance: f64,
    /// Full cone angle (degrees).
    pub angle_deg: f64,
    pub check_interval_secs: f64,
    /// Offset above the target's feet used as the aim point.
    pub aim_height: f64,
    /// Offset above the sensor owner's feet used as the eye.
    pub eye_height: f64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            distance: VISION_DISTANCE,
            angle_deg: VISION_ANGLE_DEG,
            check_interval_secs: VISION_CHECK_INTERVAL_SECS,
            aim_height: VISION_AIM_HEIGHT,
            eye_height: INTRUDER_EYE_HEIGHT,
        }
    }
}

/// Loop intruder timings and distances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntruderConfig {
    pub walk_speed: f64,
    pub chase_speed: f64,
    pub entrance_delay_secs: f64,
    pub key_search_secs: f64,
    pub wait_inside_secs: f64,
    pub watch_a_secs: f64,
    pub watch_b_secs: f64,
    pub unlock_delay_secs: f64,
    pub open_delay_secs: f64,
    pub chase_refresh_secs: f64,
    pub chase_return_secs: f64,
    pub kill_radius: f64,
    pub arrive_tolerance: f64,
    pub entry_open_delay_secs: f64,
    pub emergency_unlock_delay_secs: f64,
}

impl Default for IntruderConfig {
    fn default() -> Self {
        Self {
            walk_speed: INTRUDER_WALK_SPEED,
            chase_speed: INTRUDER_CHASE_SPEED,
            entrance_delay_secs: ENTRANCE_DELAY_SECS,
            key_search_secs: KEY_SEARCH_SECS,
            wait_inside_secs: WAIT_INSIDE_SECS,
            watch_a_secs: WATCH_A_SECS,
            watch_b_secs: WATCH_B_SECS,
            unlock_delay_secs: UNLOCK_DELAY_SECS,
            open_delay_secs: OPEN_DELAY_SECS,
            chase_refresh_secs: CHASE_REFRESH_SECS,
            chase_return_secs: CHASE_RETURN_SECS,
            kill_radius: KILL_RADIUS,
            arrive_tolerance: ARRIVE_TOLERANCE,
            entry_open_delay_secs: ENTRY_OPEN_DELAY_SECS,
            emergency_unlock_delay_secs: EMERGENCY_UNLOCK_DELAY_SECS,
        }
    }
}

/// End-game pursuer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuerConfig {
    pub speed: f64,
    pub refresh_secs: f64,
    pub kill_radius: f64,
    /// The pursuer smashes a shut interior door when this close to it.
    pub door_break_radius: f64,
}

impl Default for PursuerConfig {
    fn default() -> Self {
        Self {
            speed: PURSUER_SPEED,
            refresh_secs: PURSUER_REFRESH_SECS,
            kill_radius: KILL_RADIUS,
            door_break_radius: PURSUER_DOOR_BREAK_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatchConfig {
    /// How long the catch presentation holds before resolving.
    pub hold_secs: f64,
}

impl Default for CatchConfig {
    fn default() -> Self {
        Self {
            hold_secs: CATCH_HOLD_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndingConfig {
    /// Delay from ending start until the entry door is smashed.
    pub break_delay_secs: f64,
    /// Delay from the smash until the pursuer spawns.
    pub spawn_delay_secs: f64,
}

impl Default for EndingConfig {
    fn default() -> Self {
        Self {
            break_delay_secs: ENDING_BREAK_DELAY_SECS,
            spawn_delay_secs: ENDING_SPAWN_DELAY_SECS,
        }
    }
}

/// Hallucination/reality rules and the evidence catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    pub initial_state: PerceptionState,
    /// Interval between random glimpse rolls.
    pub check_interval_secs: f64,
    pub base_reality_chance: f64,
    /// Added to the glimpse chance, scaled by the reality meter.
    pub meter_chance_multiplier: f64,
    pub random_reality_secs: f64,
    /// Finding new evidence gives a short glimpse of reality.
    pub glimpse_on_evidence: bool,
    pub evidence_glimpse_secs: f64,
    pub medicine_reality_secs: f64,
    pub medicine_once_per_loop: bool,
    /// Evidence id the emergency call requires.
    pub address_evidence: String,
    pub evidence: Vec<EvidenceConfig>,
}

/// One discoverable clue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceConfig {
    pub id: String,
    /// Reality meter gain, in `[0, 1]`.
    pub meter_gain: f64,
}

impl EvidenceConfig {
    pub fn new(id: impl Into<String>, meter_gain: f64) -> Self {
        Self {
            id: id.into(),
            meter_gain,
        }
    }
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            initial_state: PerceptionState::Hallucination,
            check_interval_secs: PERCEPTION_CHECK_INTERVAL_SECS,
            base_reality_chance: BASE_REALITY_CHANCE,
            meter_chance_multiplier: METER_CHANCE_MULTIPLIER,
            random_reality_secs: RANDOM_REALITY_SECS,
            glimpse_on_evidence: true,
            evidence_glimpse_secs: EVIDENCE_GLIMPSE_SECS,
            medicine_reality_secs: MEDICINE_REALITY_SECS,
            medicine_once_per_loop: true,
            address_evidence: ADDRESS_EVIDENCE_ID.to_string(),
            evidence: vec![
                EvidenceConfig::new(ADDRESS_EVIDENCE_ID, EVIDENCE_METER_GAIN),
                EvidenceConfig::new("family_photo", EVIDENCE_METER_GAIN),
                EvidenceConfig::new("prescription", EVIDENCE_METER_GAIN),
            ],
        }
    }
}

impl PerceptionConfig {
    pub fn evidence(&self, id: &str) -> Option<&EvidenceConfig> {
        self.evidence.iter().find(|e| e.id == id)
    }
}

/// House layout: floor plan plus the named points actors use.
///
/// Waypoints are optional; an intruder step whose waypoint is absent halts
/// for the rest of the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Floor plan rows, first row northmost. `#` wall, `.` floor,
    /// `I` interior door, `E` entry door.
    pub floor_plan: Vec<String>,
    /// Edge length of one plan cell (m).
    pub cell_size: f64,
    pub player_start: Option<Pose>,
    pub checkpoint_pose: Pose,
    pub intruder_spawn: Pose,
    pub pursuer_spawn: Pose,
    /// Approach point in front of the interior door.
    pub interior_door_point: Option<Position>,
    pub key_point: Option<Position>,
    pub watch_point_a: Option<Position>,
    pub watch_point_b: Option<Position>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        use std::f64::consts::FRAC_PI_2;

        let rows = [
            "####################",
            "#.....#............#",
            "#.....#............#",
            "#.....I............#",
            "#.....#............#",
            "#######............#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "##########E#########",
        ];

        Self {
            floor_plan: rows.iter().map(|r| r.to_string()).collect(),
            cell_size: 1.0,
            player_start: Some(Pose::new(Position::new(3.5, 8.5, 0.0), FRAC_PI_2)),
            checkpoint_pose: Pose::new(Position::new(2.5, 9.5, 0.0), FRAC_PI_2),
            intruder_spawn: Pose::new(Position::new(10.5, 1.5, 0.0), 0.0),
            pursuer_spawn: Pose::new(Position::new(10.5, 1.5, 0.0), 0.0),
            interior_door_point: Some(Position::new(8.0, 8.5, 0.0)),
            key_point: Some(Position::new(17.5, 2.5, 0.0)),
            watch_point_a: Some(Position::new(14.5, 8.5, 0.0)),
            watch_point_b: Some(Position::new(16.5, 4.5, 0.0)),
        }
    }
}

impl LoopConfig {
    /// Reject configurations that would break the timeline or the sensors.
    pub fn validate(&self) -> Result<(), CoreError> {
        let b = &self.break_in;
        check_range("break_in", b.min_secs, b.max_secs)?;
        check_range("break_in.emergency", b.emergency_min_secs, b.emergency_max_secs)?;

        check_positive("reset.cooldown_secs", self.reset.cooldown_secs)?;
        check_positive("vision.distance", self.vision.distance)?;
        check_positive("vision.check_interval_secs", self.vision.check_interval_secs)?;
        if !(self.vision.angle_deg > 0.0 && self.vision.angle_deg <= 360.0) {
            return Err(CoreError::invalid_config(format!(
                "vision.angle_deg must be in (0, 360], got {}",
                self.vision.angle_deg
            )));
        }

        let i = &self.intruder;
        check_positive("intruder.walk_speed", i.walk_speed)?;
        check_positive("intruder.chase_speed", i.chase_speed)?;
        check_positive("intruder.chase_refresh_secs", i.chase_refresh_secs)?;
        check_positive("intruder.kill_radius", i.kill_radius)?;
        check_positive("intruder.arrive_tolerance", i.arrive_tolerance)?;
        check_positive("pursuer.speed", self.pursuer.speed)?;
        check_positive("pursuer.refresh_secs", self.pursuer.refresh_secs)?;

        let p = &self.perception;
        check_positive("perception.check_interval_secs", p.check_interval_secs)?;
        check_unit("perception.base_reality_chance", p.base_reality_chance)?;
        check_unit("perception.meter_chance_multiplier", p.meter_chance_multiplier)?;
        check_positive("perception.medicine_reality_secs", p.medicine_reality_secs)?;
        for (i, evidence) in p.evidence.iter().enumerate() {
            if evidence.id.trim().is_empty() {
                return Err(CoreError::invalid_config("perception.evidence has an empty id"));
            }
            if p.evidence[..i].iter().any(|e| e.id == evidence.id) {
                return Err(CoreError::invalid_config(format!(
                    "perception.evidence id {:?} is listed twice",
                    evidence.id
                )));
            }
            check_unit("perception.evidence.meter_gain", evidence.meter_gain)?;
        }
        if p.evidence(&p.address_evidence).is_none() {
            return Err(CoreError::invalid_config(format!(
                "perception.address_evidence {:?} is not in the evidence list",
                p.address_evidence
            )));
        }

        let plan = &self.layout.floor_plan;
        check_positive("layout.cell_size", self.layout.cell_size)?;
        if plan.is_empty() {
            return Err(CoreError::invalid_config("layout.floor_plan is empty"));
        }
        let width = plan[0].chars().count();
        if plan.iter().any(|row| row.chars().count() != width) {
            return Err(CoreError::invalid_config(
                "layout.floor_plan rows differ in width",
            ));
        }

        Ok(())
    }
}

fn check_range(name: &str, min: f64, max: f64) -> Result<(), CoreError> {
    if min < 0.0 || min >= max {
        return Err(CoreError::invalid_config(format!(
            "{name} range [{min}, {max}) is empty or negative"
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<(), CoreError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(CoreError::invalid_config(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(())
}

fn check_unit(name: &str, value: f64) -> Result<(), CoreError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CoreError::invalid_config(format!(
            "{name} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}
