//! Scripted sessions: timed player commands fed to an engine as fast as it
//! can tick.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use nightloop_core::commands::PlayerCommand;
use nightloop_core::constants::TICK_RATE;
use nightloop_core::enums::{DoorId, GamePhase};
use nightloop_core::events::LoopEvent;
use nightloop_core::state::LoopSnapshot;
use nightloop_sim::LoopEngine;

use crate::error::AppError;

/// One command, issued once session time reaches `at_secs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptStep {
    pub at_secs: f64,
    pub command: PlayerCommand,
}

/// Timed commands, kept sorted by time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    steps: Vec<ScriptStep>,
}

impl Script {
    pub fn new(mut steps: Vec<ScriptStep>) -> Self {
        steps.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        Self { steps }
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Read a JSON array of steps.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|source| AppError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let steps: Vec<ScriptStep> = serde_json::from_str(&text).map_err(|source| AppError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(steps))
    }

    /// Pull the battery, lock the bedroom door, then sit out one reset.
    pub fn demo() -> Self {
        Self::new(vec![
            ScriptStep {
                at_secs: 2.0,
                command: PlayerCommand::RemoveBattery,
            },
            ScriptStep {
                at_secs: 4.0,
                command: PlayerCommand::InteractHandle {
                    door: DoorId::Interior,
                },
            },
            ScriptStep {
                at_secs: 6.0,
                command: PlayerCommand::EnterHideZone,
            },
            ScriptStep {
                at_secs: 70.0,
                command: PlayerCommand::DebugResetLoop,
            },
        ])
    }
}

/// What happened during a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub ticks: u64,
    pub loops_started: u32,
    pub break_ins: u32,
    pub catches: u32,
    pub rollbacks: u32,
    pub final_phase: GamePhase,
}

impl SessionSummary {
    fn record(&mut self, event: &LoopEvent) {
        match event {
            LoopEvent::LoopStarted { .. } => self.loops_started += 1,
            LoopEvent::BreakInSucceeded { .. } => self.break_ins += 1,
            LoopEvent::PlayerCaught { .. } => self.catches += 1,
            LoopEvent::CheckpointRestored { .. } => self.rollbacks += 1,
            _ => {}
        }
    }
}

/// Tick `engine` for `seconds` of session time, issuing `script` commands
/// on schedule. `on_snapshot` sees every tick. Stops early once the game
/// is finished.
pub fn run_session(
    engine: &mut LoopEngine,
    script: &Script,
    seconds: f64,
    mut on_snapshot: impl FnMut(&LoopSnapshot),
) -> SessionSummary {
    let total_ticks = (seconds * TICK_RATE as f64).ceil() as u64;
    let mut summary = SessionSummary::default();
    let mut next = 0;

    for _ in 0..total_ticks {
        let now = engine.time().elapsed_secs;
        while let Some(step) = script.steps.get(next).filter(|s| s.at_secs <= now) {
            debug!(at = step.at_secs, command = ?step.command, "script step");
            engine.queue_command(step.command.clone());
            next += 1;
        }

        let snapshot = engine.tick();
        summary.ticks += 1;
        for event in &snapshot.events {
            summary.record(event);
        }
        on_snapshot(&snapshot);

        if snapshot.phase == GamePhase::Finished {
            break;
        }
    }

    summary.final_phase = engine.phase();
    info!(?summary, "session finished");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightloop_sim::SimConfig;

    #[test]
    fn test_steps_sorted_by_time() {
        let script = Script::new(vec![
            ScriptStep {
                at_secs: 5.0,
                command: PlayerCommand::ReachExit,
            },
            ScriptStep {
                at_secs: 1.0,
                command: PlayerCommand::RemoveBattery,
            },
        ]);
        assert_eq!(script.steps[0].at_secs, 1.0);
        assert_eq!(script.len(), 2);
    }

    #[test]
    fn test_script_parses_tagged_commands() {
        let json = r#"[
            { "at_secs": 3.0, "command": { "type": "InteractDoor", "door": "Entry" } },
            { "at_secs": 1.0, "command": { "type": "RemoveBattery" } }
        ]"#;
        let steps: Vec<ScriptStep> = serde_json::from_str(json).unwrap();
        let script = Script::new(steps);
        assert!(matches!(script.steps[0].command, PlayerCommand::RemoveBattery));
        assert!(matches!(
            script.steps[1].command,
            PlayerCommand::InteractDoor { door: DoorId::Entry }
        ));
    }

    #[test]
    fn test_demo_session_delays_break_in_and_resets() {
        let mut engine = LoopEngine::new(SimConfig::default()).unwrap();
        let mut delayed = 0;
        let summary = run_session(&mut engine, &Script::demo(), 75.0, |snap| {
            delayed += snap
                .events
                .iter()
                .filter(|e| matches!(e, LoopEvent::BreakInDelayed { .. }))
                .count();
        });

        assert_eq!(delayed, 1);
        assert_eq!(summary.ticks, 75 * TICK_RATE as u64);
        // Loop 1 plus the debug reset at 70s.
        assert_eq!(summary.loops_started, 2);
        assert_eq!(summary.final_phase, GamePhase::Looping);
    }

    #[test]
    fn test_session_stops_when_finished() {
        let mut engine = LoopEngine::new(SimConfig::default()).unwrap();
        let script = Script::new(vec![
            ScriptStep {
                at_secs: 0.2,
                command: PlayerCommand::InspectEvidence {
                    evidence: "address".into(),
                },
            },
            ScriptStep {
                at_secs: 0.3,
                command: PlayerCommand::TakeMedicine,
            },
            ScriptStep {
                at_secs: 0.5,
                command: PlayerCommand::ReportEmergencyCall,
            },
            // Entry door is smashed 3s into the ending.
            ScriptStep {
                at_secs: 5.0,
                command: PlayerCommand::ReachExit,
            },
        ]);
        let summary = run_session(&mut engine, &script, 30.0, |_| {});

        assert_eq!(summary.final_phase, GamePhase::Finished);
        assert!(summary.ticks < 6 * TICK_RATE as u64);
        assert_eq!(summary.rollbacks, 0);
    }
}
