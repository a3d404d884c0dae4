//! Perception controller: whether the player sees the house as it is.
//!
//! The player starts out hallucinating. Reality shows through in three ways:
//! short glimpses rolled on an interval (likelier as the reality meter
//! fills), a glimpse whenever new evidence is found, and a long forced
//! stretch after taking the medicine. The emergency call only goes through
//! in reality and once the address evidence has been found.
//!
//! Perception belongs to the player, not the house: loop resets leave it
//! alone.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::{debug, info};

use nightloop_core::config::PerceptionConfig;
use nightloop_core::door::InteractOutcome;
use nightloop_core::enums::{CallFailure, PerceptionState};
use nightloop_core::events::LoopEvent;
use nightloop_core::state::PerceptionView;

#[derive(Debug, Clone)]
pub struct PerceptionController {
    config: PerceptionConfig,
    state: PerceptionState,
    reality_meter: f64,
    forced_remaining: Option<f64>,
    glimpse_remaining: Option<f64>,
    check_timer: f64,
    discovered: BTreeSet<String>,
}

impl PerceptionController {
    pub fn new(config: PerceptionConfig) -> Self {
        Self {
            state: config.initial_state,
            config,
            reality_meter: 0.0,
            forced_remaining: None,
            glimpse_remaining: None,
            check_timer: 0.0,
            discovered: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> PerceptionState {
        self.state
    }

    pub fn reality_meter(&self) -> f64 {
        self.reality_meter
    }

    pub fn is_forced(&self) -> bool {
        self.forced_remaining.is_some()
    }

    pub fn has_evidence(&self, id: &str) -> bool {
        self.discovered.contains(id)
    }

    /// Run the forced and glimpse timers, then the random glimpse roll.
    pub fn tick<R: Rng>(&mut self, dt: f64, rng: &mut R, events: &mut Vec<LoopEvent>) {
        if let Some(remaining) = self.forced_remaining {
            let remaining = remaining - dt;
            if remaining > 0.0 {
                self.forced_remaining = Some(remaining);
                return;
            }
            self.forced_remaining = None;
            self.set_state(PerceptionState::Hallucination, "forced reality ended", events);
        }

        if let Some(remaining) = self.glimpse_remaining {
            let remaining = remaining - dt;
            if remaining > 0.0 {
                self.glimpse_remaining = Some(remaining);
            } else {
                self.glimpse_remaining = None;
                self.set_state(PerceptionState::Hallucination, "glimpse ended", events);
            }
        }

        if self.state == PerceptionState::Reality {
            return;
        }
        self.check_timer += dt;
        if self.check_timer < self.config.check_interval_secs {
            return;
        }
        self.check_timer = 0.0;

        let chance = (self.config.base_reality_chance
            + self.reality_meter * self.config.meter_chance_multiplier)
            .min(1.0);
        let roll: f64 = rng.gen();
        if roll < chance {
            self.enter_glimpse(self.config.random_reality_secs, "random glimpse", events);
        }
    }

    /// Record a clue. Each id counts once; unknown ids are refused.
    pub fn discover(&mut self, evidence: &str, events: &mut Vec<LoopEvent>) -> InteractOutcome {
        let Some(gain) = self.config.evidence(evidence).map(|e| e.meter_gain) else {
            return InteractOutcome::Rejected("nothing to find here");
        };
        if !self.discovered.insert(evidence.to_string()) {
            debug!(evidence, "evidence already found");
            return InteractOutcome::Rejected("evidence already found");
        }

        let old = self.reality_meter;
        self.reality_meter = (old + gain).min(1.0);
        info!(evidence, old, new = self.reality_meter, "evidence found");
        events.push(LoopEvent::EvidenceDiscovered {
            evidence: evidence.to_string(),
            reality_meter: self.reality_meter,
        });

        if self.config.glimpse_on_evidence {
            self.enter_glimpse(self.config.evidence_glimpse_secs, "evidence glimpse", events);
        }
        InteractOutcome::Accepted
    }

    /// Hold reality for `duration` seconds, replacing any glimpse.
    pub fn force_reality(&mut self, duration: f64, reason: &str, events: &mut Vec<LoopEvent>) {
        if duration <= 0.0 {
            return;
        }
        self.forced_remaining = Some(duration);
        self.glimpse_remaining = None;
        self.set_state(PerceptionState::Reality, reason, events);
    }

    /// Whether an emergency call would go through right now.
    pub fn check_call(&self) -> Result<(), CallFailure> {
        if self.state != PerceptionState::Reality {
            return Err(CallFailure::NotInReality);
        }
        if !self.has_evidence(&self.config.address_evidence) {
            return Err(CallFailure::AddressUnknown);
        }
        Ok(())
    }

    pub fn view(&self, medicine_available: bool) -> PerceptionView {
        PerceptionView {
            state: self.state,
            reality_meter: self.reality_meter,
            evidence: self.discovered.iter().cloned().collect(),
            forced_remaining_secs: self.forced_remaining,
            medicine_available,
        }
    }

    /// Short stretch of reality. Ignored while reality is forced.
    fn enter_glimpse(&mut self, duration: f64, reason: &str, events: &mut Vec<LoopEvent>) {
        if duration <= 0.0 || self.is_forced() {
            return;
        }
        self.glimpse_remaining = Some(duration);
        self.set_state(PerceptionState::Reality, reason, events);
    }

    fn set_state(&mut self, new: PerceptionState, reason: &str, events: &mut Vec<LoopEvent>) {
        let old = self.state;
        if old == new {
            return;
        }
        self.state = new;
        info!(?old, ?new, reason, "perception changed");
        events.push(LoopEvent::PerceptionChanged {
            old,
            new,
            reason: reason.to_string(),
        });
    }
}
