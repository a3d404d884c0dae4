//! Kind-specific behavioral profiles.
//!
//! Consolidates per-kind parameters for the intruder brains.

use nightloop_core::config::LoopConfig;
use nightloop_core::enums::IntruderKind;

/// Behavioral profile for an intruder kind.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorProfile {
    /// Speed while walking the script (m/s).
    pub walk_speed: f64,
    /// Speed while chasing (m/s).
    pub chase_speed: f64,
    pub entrance_delay: f64,
    pub key_search: f64,
    pub wait_inside: f64,
    pub watch_a: f64,
    pub watch_b: f64,
    pub unlock_delay: f64,
    pub open_delay: f64,
    /// How often the chase destination is refreshed (s).
    pub chase_refresh: f64,
    /// Unseen time after which a chase is dropped (s). Infinite for kinds
    /// that never lose the player.
    pub chase_return: f64,
    /// Horizontal distance at which the player is caught (m).
    pub kill_radius: f64,
    pub arrive_tolerance: f64,
}

/// Get the behavioral profile for a given kind under `config`.
pub fn get_profile(kind: IntruderKind, config: &LoopConfig) -> BehaviorProfile {
    let i = &config.intruder;

    match kind {
        IntruderKind::Loop => BehaviorProfile {
            walk_speed: i.walk_speed,
            chase_speed: i.chase_speed,
            entrance_delay: i.entrance_delay_secs,
            key_search: i.key_search_secs,
            wait_inside: i.wait_inside_secs,
            watch_a: i.watch_a_secs,
            watch_b: i.watch_b_secs,
            unlock_delay: i.unlock_delay_secs,
            open_delay: i.open_delay_secs,
            chase_refresh: i.chase_refresh_secs,
            chase_return: i.chase_return_secs,
            kill_radius: i.kill_radius,
            arrive_tolerance: i.arrive_tolerance,
        },
        IntruderKind::Pursuer => {
            let p = &config.pursuer;
            BehaviorProfile {
                walk_speed: p.speed,
                chase_speed: p.speed,
                entrance_delay: 0.0,
                key_search: 0.0,
                wait_inside: 0.0,
                watch_a: 0.0,
                watch_b: 0.0,
                unlock_delay: 0.0,
                open_delay: 0.0,
                chase_refresh: p.refresh_secs,
                chase_return: f64::INFINITY,
                kill_radius: p.kill_radius,
                arrive_tolerance: i.arrive_tolerance,
            }
        }
    }
}
