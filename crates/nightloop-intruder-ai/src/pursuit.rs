//! End-game pursuer: always knows where the player is.
//!
//! No script and no sensor. The destination is refreshed toward the player
//! on a fixed interval and a catch is requested inside the kill radius.

use tracing::debug;

use nightloop_core::types::Position;

use crate::nav::Navigator;
use crate::profiles::BehaviorProfile;

#[derive(Debug, Clone)]
pub struct PursuerBrain {
    profile: BehaviorProfile,
    refresh_timer: f64,
    started: bool,
}

impl PursuerBrain {
    pub fn new(profile: BehaviorProfile) -> Self {
        Self {
            profile,
            refresh_timer: 0.0,
            started: false,
        }
    }

    /// Advance one tick. Returns true when the player is within reach.
    pub fn tick(&mut self, dt: f64, nav: &mut dyn Navigator, target: Option<Position>) -> bool {
        let Some(target) = target else {
            return false;
        };

        if !self.started {
            self.started = true;
            nav.set_stopped(false);
            nav.set_speed(self.profile.chase_speed);
            nav.set_destination(target);
            debug!(?target, "pursuer started");
        }

        self.refresh_timer += dt;
        if self.refresh_timer >= self.profile.chase_refresh {
            self.refresh_timer = 0.0;
            nav.set_destination(target);
        }

        nav.position().horizontal_range_to(&target) <= self.profile.kill_radius
    }
}
