#[cfg(test)]
mod tests {
    use nightloop_core::components::VisibilitySample;
    use nightloop_core::config::LoopConfig;
    use nightloop_core::constants::DT;
    use nightloop_core::door::DoorMachine;
    use nightloop_core::enums::{DoorId, DoorState, IntruderKind, IntruderStep};
    use nightloop_core::types::Position;

    use crate::fsm::{IntruderBrain, IntruderContext, IntruderOutput, Route, StepChange};
    use crate::nav::Navigator;
    use crate::profiles::{get_profile, BehaviorProfile};
    use crate::pursuit::PursuerBrain;

    const PLAYER: Position = Position {
        x: 3.5,
        y: 8.5,
        z: 0.0,
    };

    /// Navigator stand-in: paths are pending until the test says the agent
    /// arrived.
    struct FakeNav {
        pos: Position,
        dest: Option<Position>,
        stopped: bool,
        speed: f64,
        remaining: Option<f64>,
        destinations_set: usize,
    }

    impl FakeNav {
        fn at(pos: Position) -> Self {
            Self {
                pos,
                dest: None,
                stopped: true,
                speed: 0.0,
                remaining: None,
                destinations_set: 0,
            }
        }

        /// Report arrival without moving (keeps the player out of reach).
        fn arrive(&mut self) {
            self.remaining = Some(0.0);
        }
    }

    impl Navigator for FakeNav {
        fn position(&self) -> Position {
            self.pos
        }

        fn set_destination(&mut self, destination: Position) {
            self.dest = Some(destination);
            self.remaining = None;
            self.destinations_set += 1;
        }

        fn set_stopped(&mut self, stopped: bool) {
            self.stopped = stopped;
        }

        fn set_speed(&mut self, speed: f64) {
            self.speed = speed;
        }

        fn remaining_distance(&self) -> Option<f64> {
            self.remaining
        }
    }

    fn fast_profile() -> BehaviorProfile {
        let mut p = get_profile(IntruderKind::Loop, &LoopConfig::default());
        p.entrance_delay = 0.1;
        p.key_search = 0.2;
        p.wait_inside = 5.0;
        p.watch_a = 0.2;
        p.watch_b = 0.2;
        p.unlock_delay = 0.1;
        p.open_delay = 0.1;
        p
    }

    fn full_route() -> Route {
        Route {
            door_point: Some(Position::new(8.0, 8.5, 0.0)),
            key_point: Some(Position::new(17.5, 2.5, 0.0)),
            watch_point_a: Some(Position::new(14.5, 8.5, 0.0)),
            watch_point_b: Some(Position::new(16.5, 4.5, 0.0)),
        }
    }

    fn ticks(secs: f64) -> usize {
        (secs / DT).ceil() as usize
    }

    struct Harness {
        brain: IntruderBrain,
        nav: FakeNav,
        door: Option<DoorMachine>,
        sight: VisibilitySample,
        now: f64,
        changes: Vec<StepChange>,
    }

    impl Harness {
        fn new(route: Route) -> Self {
            Self {
                brain: IntruderBrain::new(route, fast_profile()),
                nav: FakeNav::at(Position::new(10.5, 1.5, 0.0)),
                door: Some(DoorMachine::new(DoorId::Interior, DoorState::Closed)),
                sight: VisibilitySample::default(),
                now: 0.0,
                changes: Vec::new(),
            }
        }

        fn tick(&mut self) -> IntruderOutput {
            self.now += DT;
            let mut ctx = IntruderContext {
                now: self.now,
                dt: DT,
                nav: &mut self.nav,
                door: self.door.as_mut(),
                sight: Some(self.sight),
                target: Some(PLAYER),
            };
            let out = self.brain.tick(&mut ctx);
            self.changes.extend(out.changes.iter().cloned());
            out
        }

        fn run(&mut self, secs: f64) {
            for _ in 0..ticks(secs) {
                self.tick();
            }
        }

        fn see_player(&mut self) {
            self.sight = VisibilitySample {
                is_visible: true,
                last_seen_position: Some(PLAYER),
                last_seen_time: Some(self.now),
            };
        }

        fn lose_player(&mut self) {
            self.sight.is_visible = false;
        }

        fn door_state(&self) -> Option<DoorState> {
            self.door.as_ref().map(|d| d.state())
        }

        fn steps(&self) -> Vec<IntruderStep> {
            self.changes.iter().map(|c| c.new).collect()
        }
    }

    #[test]
    fn test_entrance_waits_stopped_then_heads_for_door() {
        let mut h = Harness::new(full_route());
        h.brain.set_entrance_line("open up");

        let out = h.tick();
        assert_eq!(out.line.as_deref(), Some("open up"));
        assert!(h.nav.stopped, "intruder must stand still during entrance");
        assert_eq!(h.brain.step(), IntruderStep::Entrance);

        h.run(0.2);
        assert_eq!(h.brain.step(), IntruderStep::GoToDoor);
        assert!(!h.nav.stopped);
        assert_eq!(h.nav.dest, full_route().door_point);
        assert_eq!(h.nav.speed, fast_profile().walk_speed);
    }

    #[test]
    fn test_entrance_line_emitted_once() {
        let mut h = Harness::new(full_route());
        h.brain.set_entrance_line("open up");
        assert!(h.tick().line.is_some());
        assert!(h.tick().line.is_none());
    }

    #[test]
    fn test_entrance_with_player_visible_goes_to_chase() {
        let mut h = Harness::new(full_route());
        h.tick();
        h.see_player();
        h.run(0.2);
        assert_eq!(h.brain.step(), IntruderStep::Chasing);
        assert_eq!(h.nav.speed, fast_profile().chase_speed);
    }

    #[test]
    fn test_spotted_mid_transit_cancels_move() {
        let mut h = Harness::new(full_route());
        h.run(0.2);
        assert_eq!(h.brain.step(), IntruderStep::GoToDoor);

        h.see_player();
        h.brain.on_target_spotted();
        h.tick();
        assert_eq!(h.brain.step(), IntruderStep::Chasing);
        assert_eq!(h.nav.dest, Some(PLAYER), "chase must retarget immediately");

        // The old move's arrival must not run any of its branches.
        h.nav.arrive();
        h.run(0.5);
        assert_eq!(h.brain.step(), IntruderStep::Chasing);
        assert_eq!(h.door_state(), Some(DoorState::Closed), "door untouched");
        assert_eq!(
            h.steps(),
            vec![IntruderStep::GoToDoor, IntruderStep::Chasing],
            "no arrival transition after cancellation"
        );
    }

    #[test]
    fn test_visible_while_moving_interrupts_without_event() {
        let mut h = Harness::new(full_route());
        h.run(0.2);
        h.see_player();
        h.tick();
        assert_eq!(h.brain.step(), IntruderStep::Chasing);
        assert_eq!(h.changes.last().map(|c| c.old), Some(IntruderStep::GoToDoor));
    }

    #[test]
    fn test_spotted_while_chasing_is_ignored() {
        let mut h = Harness::new(full_route());
        h.see_player();
        h.brain.on_target_spotted();
        h.tick();
        let before = h.changes.len();
        h.brain.on_target_spotted();
        h.tick();
        assert_eq!(h.changes.len(), before);
    }

    #[test]
    fn test_unlocked_door_entered_directly() {
        let mut h = Harness::new(full_route());
        h.run(0.2);
        h.nav.arrive();
        h.tick();
        assert_eq!(h.brain.step(), IntruderStep::UnlockAndEnter);
        assert_eq!(h.door_state(), Some(DoorState::Open));

        h.run(0.3);
        assert_eq!(h.brain.step(), IntruderStep::WaitInside);
        assert!(h.nav.stopped);
    }

    #[test]
    fn test_locked_door_sends_intruder_for_key() {
        let mut h = Harness::new(full_route());
        if let Some(door) = h.door.as_mut() {
            door.interact_handle();
        }

        h.run(0.2);
        h.nav.arrive();
        h.tick();
        assert_eq!(h.brain.step(), IntruderStep::SearchForKey);
        assert_eq!(h.nav.dest, full_route().key_point);

        h.nav.arrive();
        h.run(0.3);
        assert_eq!(h.brain.step(), IntruderStep::ReturnToDoor);
        assert_eq!(h.nav.dest, full_route().door_point);

        h.nav.arrive();
        h.run(0.5);
        assert_eq!(
            h.steps(),
            vec![
                IntruderStep::GoToDoor,
                IntruderStep::SearchForKey,
                IntruderStep::ReturnToDoor,
                IntruderStep::UnlockAndEnter,
                IntruderStep::WaitInside,
            ]
        );
        assert_eq!(h.door_state(), Some(DoorState::Open));
    }

    #[test]
    fn test_relocked_door_sends_intruder_back_to_door() {
        let mut h = Harness::new(full_route());
        if let Some(door) = h.door.as_mut() {
            door.interact_handle();
        }
        h.run(0.2);
        h.nav.arrive();
        h.tick();
        h.nav.arrive();
        h.run(0.3);
        h.nav.arrive();
        h.tick();
        assert_eq!(h.brain.step(), IntruderStep::UnlockAndEnter);
        assert_eq!(h.door_state(), Some(DoorState::Closed), "intruder unlocked it");

        // Player locks it again during the unlock pause.
        if let Some(door) = h.door.as_mut() {
            door.interact_handle();
        }
        h.run(0.5);
        assert_eq!(h.brain.step(), IntruderStep::GoToDoor);
        assert_eq!(h.door_state(), Some(DoorState::Locked));
    }

    #[test]
    fn test_watch_points_cycle() {
        let mut h = Harness::new(full_route());
        h.run(0.2);
        h.nav.arrive();
        h.tick();
        h.run(0.2);
        assert_eq!(h.brain.step(), IntruderStep::WaitInside);

        h.run(5.1);
        assert_eq!(h.brain.step(), IntruderStep::GoToWatchPointA);
        assert_eq!(h.nav.dest, full_route().watch_point_a);

        h.nav.arrive();
        h.tick();
        assert_eq!(h.brain.step(), IntruderStep::WatchA);
        assert!(h.nav.stopped);

        h.run(0.3);
        assert_eq!(h.brain.step(), IntruderStep::GoToWatchPointB);
        h.nav.arrive();
        h.tick();
        h.run(0.3);

        let steps = h.steps();
        assert_eq!(
            &steps[steps.len() - 6..],
            &[
                IntruderStep::WaitInside,
                IntruderStep::GoToWatchPointA,
                IntruderStep::WatchA,
                IntruderStep::GoToWatchPointB,
                IntruderStep::WatchB,
                IntruderStep::GoToWatchPointA,
            ]
        );
    }

    #[test]
    fn test_chase_dropped_after_grace() {
        let mut h = Harness::new(full_route());
        h.see_player();
        h.brain.on_target_spotted();
        h.tick();
        h.lose_player();

        h.run(0.5);
        assert_eq!(h.brain.step(), IntruderStep::Chasing, "still within grace");

        h.run(0.6);
        assert_eq!(h.brain.step(), IntruderStep::GoToWatchPointA);
        assert_eq!(h.nav.dest, full_route().watch_point_a);
    }

    #[test]
    fn test_chase_refreshes_destination_on_interval() {
        let mut h = Harness::new(full_route());
        h.see_player();
        h.brain.on_target_spotted();
        h.tick();
        let after_entry = h.nav.destinations_set;

        h.run(1.0);
        let refreshes = h.nav.destinations_set - after_entry;
        assert!(
            (6..=11).contains(&refreshes),
            "expected roughly 10 refreshes in 1s at 0.1s interval, got {refreshes}"
        );
    }

    #[test]
    fn test_chase_requests_catch_in_kill_radius() {
        let mut h = Harness::new(full_route());
        h.see_player();
        h.brain.on_target_spotted();
        assert!(!h.tick().catch_requested);

        h.nav.pos = Position::new(PLAYER.x + 0.5, PLAYER.y, 0.0);
        assert!(h.tick().catch_requested);
    }

    #[test]
    fn test_missing_waypoint_halts_step() {
        let route = Route {
            door_point: None,
            ..full_route()
        };
        let mut h = Harness::new(route);
        h.run(0.2);
        assert_eq!(h.brain.step(), IntruderStep::GoToDoor);
        assert!(h.brain.is_halted());
        assert!(h.nav.stopped);

        let before = h.changes.len();
        h.run(2.0);
        assert_eq!(h.changes.len(), before, "halted intruder stays frozen");
    }

    #[test]
    fn test_missing_door_halts_on_arrival() {
        let mut h = Harness::new(full_route());
        h.door = None;
        h.run(0.2);
        h.nav.arrive();
        h.tick();
        assert_eq!(h.brain.step(), IntruderStep::GoToDoor);
        assert!(h.brain.is_halted());
    }

    #[test]
    fn test_halted_intruder_still_reacts_to_sight() {
        let route = Route {
            door_point: None,
            ..full_route()
        };
        let mut h = Harness::new(route);
        h.run(0.2);
        assert!(h.brain.is_halted());

        h.see_player();
        h.brain.on_target_spotted();
        h.tick();
        assert_eq!(h.brain.step(), IntruderStep::Chasing);
        assert!(!h.brain.is_halted());
    }

    #[test]
    fn test_pursuer_refresh_and_catch() {
        let profile = get_profile(IntruderKind::Pursuer, &LoopConfig::default());
        let mut brain = PursuerBrain::new(profile);
        let mut nav = FakeNav::at(Position::new(0.0, 0.0, 0.0));
        let far = Position::new(10.0, 0.0, 0.0);

        assert!(!brain.tick(DT, &mut nav, Some(far)));
        assert!(!nav.stopped);
        assert_eq!(nav.destinations_set, 1);

        for _ in 0..ticks(0.3) {
            brain.tick(DT, &mut nav, Some(far));
        }
        assert_eq!(nav.destinations_set, 1, "no refresh before 0.5s");

        for _ in 0..ticks(0.3) {
            brain.tick(DT, &mut nav, Some(far));
        }
        assert_eq!(nav.destinations_set, 2);

        nav.pos = Position::new(9.5, 0.0, 0.0);
        assert!(brain.tick(DT, &mut nav, Some(far)));
    }

    #[test]
    fn test_pursuer_profile_never_loses_target() {
        let profile = get_profile(IntruderKind::Pursuer, &LoopConfig::default());
        assert!(profile.chase_return.is_infinite());
        assert_eq!(profile.chase_speed, LoopConfig::default().pursuer.speed);
    }
}
