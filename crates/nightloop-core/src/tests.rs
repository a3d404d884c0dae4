#[cfg(test)]
mod tests {
    use crate::commands::PlayerCommand;
    use crate::components::{Fixture, Interactable, Interaction};
    use crate::config::{EvidenceConfig, LoopConfig};
    use crate::door::{DoorMachine, InteractOutcome};
    use crate::enums::*;
    use crate::events::LoopEvent;
    use crate::reset::{ResetRegistry, Resettable};
    use crate::state::LoopSnapshot;
    use crate::types::{Pose, Position, SimTime};

    fn closed_door() -> DoorMachine {
        DoorMachine::new(DoorId::Interior, DoorState::Closed)
    }

    // --- Door rules ---

    #[test]
    fn test_handle_locks_and_unlocks_closed_door() {
        let mut door = closed_door();

        assert_eq!(door.interact_handle(), InteractOutcome::Accepted);
        assert_eq!(door.state(), DoorState::Locked);

        assert_eq!(door.interact_handle(), InteractOutcome::Accepted);
        assert_eq!(door.state(), DoorState::Closed);

        let transitions = door.drain_transitions();
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].old, DoorState::Closed);
        assert_eq!(transitions[0].new, DoorState::Locked);
        assert_eq!(transitions[1].new, DoorState::Closed);
        assert!(transitions
            .iter()
            .all(|t| t.mode == TransitionMode::Animated));
    }

    #[test]
    fn test_door_click_on_locked_door_does_nothing() {
        let mut door = closed_door();
        door.interact_handle();
        door.drain_transitions();

        let outcome = door.interact_door();
        assert!(!outcome.is_accepted(), "locked door must refuse a click");
        assert_eq!(door.state(), DoorState::Locked);
        assert!(
            door.drain_transitions().is_empty(),
            "rejected click must not emit a transition"
        );
    }

    #[test]
    fn test_door_click_toggles_open_closed() {
        let mut door = closed_door();
        door.interact_door();
        assert_eq!(door.state(), DoorState::Open);
        door.interact_door();
        assert_eq!(door.state(), DoorState::Closed);
    }

    #[test]
    fn test_handle_refused_while_open_or_broken() {
        let mut door = closed_door();
        door.interact_door();
        assert!(!door.interact_handle().is_accepted());
        assert_eq!(door.state(), DoorState::Open);

        door.force_break("test");
        assert!(!door.interact_handle().is_accepted());
        assert!(!door.interact_door().is_accepted());
        assert_eq!(door.state(), DoorState::Broken);
    }

    #[test]
    fn test_intruder_try_open_table() {
        let mut door = closed_door();
        assert!(door.try_open("test"), "closed door opens");
        assert_eq!(door.state(), DoorState::Open);
        assert!(door.try_open("test"), "open door is already passable");

        let mut locked = closed_door();
        locked.interact_handle();
        assert!(!locked.try_open("test"), "locked door refuses");
        assert_eq!(locked.state(), DoorState::Locked);

        let mut broken = closed_door();
        broken.force_break("test");
        assert!(broken.try_open("test"), "broken door counts as open");
    }

    #[test]
    fn test_intruder_try_unlock_only_from_locked() {
        let mut door = closed_door();
        assert!(!door.try_unlock("test"));
        door.interact_handle();
        assert!(door.try_unlock("test"));
        assert_eq!(door.state(), DoorState::Closed);
    }

    #[test]
    fn test_force_break_is_idempotent() {
        let mut door = closed_door();
        door.force_break("first");
        door.force_break("second");
        assert_eq!(door.drain_transitions().len(), 1);
    }

    #[test]
    fn test_rollback_leaves_broken_with_instant_mode() {
        let mut door = DoorMachine::new(DoorId::Entry, DoorState::Closed);
        door.force_break("smash");
        door.drain_transitions();

        door.force_set_for_rollback(DoorState::Locked, "rollback");
        assert_eq!(door.state(), DoorState::Locked);
        let transitions = door.drain_transitions();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].mode, TransitionMode::Instant);
        assert_eq!(transitions[0].door, DoorId::Entry);
    }

    #[test]
    fn test_same_state_request_emits_nothing() {
        let mut door = closed_door();
        door.force_set_for_rollback(DoorState::Closed, "noop");
        door.reset();
        assert!(door.drain_transitions().is_empty());
    }

    #[test]
    fn test_reset_restores_initial_instantly() {
        let mut door = closed_door();
        door.interact_door();
        door.drain_transitions();

        door.reset();
        assert_eq!(door.state(), DoorState::Closed);
        let transitions = door.drain_transitions();
        assert_eq!(transitions[0].mode, TransitionMode::Instant);
    }

    #[test]
    fn test_transition_converts_to_event() {
        let mut door = closed_door();
        door.interact_door();
        let event: LoopEvent = door.drain_transitions().remove(0).into();
        match event {
            LoopEvent::DoorStateChanged { door, old, new, .. } => {
                assert_eq!(door, DoorId::Interior);
                assert_eq!(old, DoorState::Closed);
                assert_eq!(new, DoorState::Open);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    // --- Reset registry ---

    #[test]
    fn test_registry_register_is_idempotent() {
        let mut registry = ResetRegistry::new();
        assert!(registry.register(1u32));
        assert!(!registry.register(1u32));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_unregister_is_idempotent() {
        let mut registry = ResetRegistry::new();
        registry.register(7u32);
        assert!(registry.unregister(7));
        assert!(!registry.unregister(7));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_broadcast_visits_in_registration_order() {
        let mut registry = ResetRegistry::new();
        for h in [3u32, 1, 2] {
            registry.register(h);
        }
        let mut visited = Vec::new();
        let report = registry.broadcast_reset(|h| {
            visited.push(h);
            true
        });
        assert_eq!(visited, vec![3, 1, 2]);
        assert_eq!(report.restored, 3);
        assert!(report.stale.is_empty());
    }

    #[test]
    fn test_broadcast_skips_stale_handles() {
        let mut registry = ResetRegistry::new();
        registry.register(1u32);
        registry.register(2u32);
        let report = registry.broadcast_reset(|h| h != 2);
        assert_eq!(report.restored, 1);
        assert_eq!(report.stale, vec![2]);
    }

    #[test]
    fn test_unregistered_handle_not_restored() {
        let mut registry = ResetRegistry::new();
        registry.register(1u32);
        registry.register(2u32);
        registry.unregister(1);
        let mut visited = Vec::new();
        registry.broadcast_reset(|h| {
            visited.push(h);
            true
        });
        assert_eq!(visited, vec![2]);
    }

    // --- Fixtures ---

    #[test]
    fn test_battery_removed_once_per_loop() {
        let mut lock = Fixture::BatteryLock { removed: false };
        assert!(lock.interact(Interaction::RemoveBattery).is_accepted());
        assert!(!lock.interact(Interaction::RemoveBattery).is_accepted());
        lock.reset_state();
        assert!(lock.interact(Interaction::RemoveBattery).is_accepted());
    }

    #[test]
    fn test_hide_zone_enter_leave() {
        let mut zone = Fixture::HideZone { occupied: false };
        assert!(zone.interact(Interaction::Enter).is_accepted());
        assert!(!zone.interact(Interaction::Enter).is_accepted());
        zone.reset_state();
        assert!(matches!(zone, Fixture::HideZone { occupied: false }));
    }

    #[test]
    fn test_fixture_door_dispatch() {
        let mut fixture = Fixture::Door(closed_door());
        assert!(fixture.interact(Interaction::Handle).is_accepted());
        assert_eq!(fixture.as_door().map(|d| d.state()), Some(DoorState::Locked));
        assert!(!fixture.interact(Interaction::RemoveBattery).is_accepted());
        fixture.reset_state();
        assert_eq!(fixture.as_door().map(|d| d.state()), Some(DoorState::Closed));
    }

    #[test]
    fn test_medicine_taken_once_per_loop() {
        let mut medicine = Fixture::Medicine {
            used: false,
            once_per_loop: true,
        };
        assert!(medicine.interact(Interaction::TakeMedicine).is_accepted());
        assert_eq!(
            medicine.interact(Interaction::TakeMedicine),
            InteractOutcome::Rejected("medicine already taken this loop")
        );
        medicine.reset_state();
        assert!(medicine.interact(Interaction::TakeMedicine).is_accepted());
    }

    #[test]
    fn test_unlimited_medicine_never_runs_out() {
        let mut medicine = Fixture::Medicine {
            used: false,
            once_per_loop: false,
        };
        for _ in 0..3 {
            assert!(medicine.interact(Interaction::TakeMedicine).is_accepted());
        }
        assert!(!medicine.interact(Interaction::Door).is_accepted());
    }

    // --- Config ---

    #[test]
    fn test_default_config_is_valid() {
        assert!(LoopConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_break_in_range_rejected() {
        let mut config = LoopConfig::default();
        config.break_in.min_secs = 20.0;
        config.break_in.max_secs = 16.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ragged_floor_plan_rejected() {
        let mut config = LoopConfig::default();
        config.layout.floor_plan = vec!["###".into(), "#.".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_call_evidence_must_be_catalogued() {
        let mut config = LoopConfig::default();
        config.perception.address_evidence = "street_sign".into();
        assert!(config.validate().is_err());

        let mut config = LoopConfig::default();
        config.perception.evidence.push(EvidenceConfig::new("address", 0.3));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reality_chance_must_be_a_probability() {
        let mut config = LoopConfig::default();
        config.perception.base_reality_chance = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_json_fills_defaults() {
        let config: LoopConfig =
            serde_json::from_str(r#"{ "break_in": { "min_secs": 5.0 } }"#).unwrap();
        assert_eq!(config.break_in.min_secs, 5.0);
        assert_eq!(config.break_in.max_secs, crate::constants::BREAK_IN_MAX_SECS);
        assert_eq!(config.catch.hold_secs, crate::constants::CATCH_HOLD_SECS);
    }

    // --- Geometry ---

    #[test]
    fn test_bearing_and_forward_agree() {
        let origin = Position::new(0.0, 0.0, 0.0);
        let east = Position::new(5.0, 0.0, 0.0);
        let bearing = origin.bearing_to(&east);
        assert!((bearing - std::f64::consts::FRAC_PI_2).abs() < 1e-9);

        let pose = Pose::new(origin, bearing);
        let fwd = pose.forward();
        assert!((fwd.x - 1.0).abs() < 1e-9);
        assert!(fwd.y.abs() < 1e-9);
    }

    #[test]
    fn test_sim_time_advance() {
        let mut t = SimTime::default();
        for _ in 0..30 {
            t.advance();
        }
        assert_eq!(t.tick, 30);
        assert!((t.elapsed_secs - 1.0).abs() < 1e-9);
    }

    // --- Serde ---

    #[test]
    fn test_event_serde_tagged() {
        let event = LoopEvent::BreakInSucceeded {
            method: BreakInMethod::Secondary,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"BreakInSucceeded\""));
        let back: LoopEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_command_serde() {
        let cmd = PlayerCommand::InteractHandle {
            door: DoorId::Interior,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let back: PlayerCommand = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            back,
            PlayerCommand::InteractHandle {
                door: DoorId::Interior
            }
        ));
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = LoopSnapshot {
            events: vec![LoopEvent::LoopStarted { loop_index: 2 }],
            ..Default::default()
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: LoopSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.events.len(), 1);
    }
}
