//! Simulation engine: the explicit context everything else hangs off.
//!
//! `LoopEngine` owns the hecs world, the loop kernel (and through it the
//! reset registry), the intruder director, the catch director, the
//! perception controller and the ending controller. It processes player commands at tick boundaries, runs
//! the systems in a fixed order and produces a `LoopSnapshot` per tick.
//! Completely headless.

use std::collections::VecDeque;

use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use nightloop_core::commands::PlayerCommand;
use nightloop_core::components::{Fixture, Interactable, Interaction};
use nightloop_core::config::LoopConfig;
use nightloop_core::door::InteractOutcome;
use nightloop_core::enums::{CatchKind, GamePhase};
use nightloop_core::events::LoopEvent;
use nightloop_core::reset::Resettable;
use nightloop_core::state::LoopSnapshot;
use nightloop_core::types::{Pose, SimTime};
use nightloop_core::CoreError;
use nightloop_floorplan::FloorPlan;

use crate::catch::CatchDirector;
use crate::director::IntruderDirector;
use crate::ending::EndingController;
use crate::kernel::{LoopHost, LoopKernel};
use crate::perception::PerceptionController;
use crate::systems;
use crate::world_setup::{self, House};

/// ChaCha stream for perception rolls, so glimpses never shift the
/// break-in deadlines drawn from the main stream.
const PERCEPTION_RNG_STREAM: u64 = 1;

/// Configuration for starting a new session.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same deadlines.
    pub seed: u64,
    /// Start straight into the first loop instead of holding for the intro.
    pub skip_opening: bool,
    pub loop_config: LoopConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            skip_opening: true,
            loop_config: LoopConfig::default(),
        }
    }
}

/// World-side half of a loop reset.
struct WorldHost<'a> {
    world: &'a mut World,
    player: Entity,
}

impl LoopHost for WorldHost<'_> {
    type Handle = Entity;

    fn restore(&mut self, handle: Entity) -> bool {
        match self.world.get::<&mut Fixture>(handle) {
            Ok(mut fixture) => {
                fixture.reset_state();
                true
            }
            Err(_) => false,
        }
    }

    fn place_player(&mut self, pose: Pose) -> Result<(), CoreError> {
        let mut current = self
            .world
            .get::<&mut Pose>(self.player)
            .map_err(|_| CoreError::missing("player"))?;
        *current = pose;
        Ok(())
    }

    fn collect_events(&mut self, events: &mut Vec<LoopEvent>) {
        systems::doors::drain_transitions(self.world, events);
    }
}

pub struct LoopEngine {
    world: World,
    time: SimTime,
    phase: GamePhase,
    paused_from: Option<GamePhase>,
    rng: ChaCha8Rng,
    perception_rng: ChaCha8Rng,
    config: LoopConfig,
    plan: FloorPlan,
    house: House,
    kernel: LoopKernel<Entity>,
    director: IntruderDirector,
    catch: CatchDirector,
    perception: PerceptionController,
    ending: EndingController,
    command_queue: VecDeque<PlayerCommand>,
    events: Vec<LoopEvent>,
}

impl LoopEngine {
    /// Build the house and start loop 1.
    pub fn new(config: SimConfig) -> Result<Self, CoreError> {
        let loop_config = config.loop_config;
        loop_config.validate()?;
        let plan = FloorPlan::from_rows(&loop_config.layout.floor_plan, loop_config.layout.cell_size)?;

        let mut world = World::new();
        let mut kernel = LoopKernel::new(
            loop_config.break_in.clone(),
            loop_config.reset.clone(),
            loop_config.layout.player_start,
        );
        let house = world_setup::setup_house(&mut world, &loop_config, kernel.registry_mut());
        let mut perception_rng = ChaCha8Rng::seed_from_u64(config.seed);
        perception_rng.set_stream(PERCEPTION_RNG_STREAM);

        let mut engine = Self {
            world,
            time: SimTime::default(),
            phase: GamePhase::Looping,
            paused_from: None,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            perception_rng,
            plan,
            house,
            kernel,
            director: IntruderDirector::new(house.entry_door),
            catch: CatchDirector::new(loop_config.catch.hold_secs),
            perception: PerceptionController::new(loop_config.perception.clone()),
            ending: EndingController::new(loop_config.ending.clone(), loop_config.layout.checkpoint_pose),
            config: loop_config,
            command_queue: VecDeque::new(),
            events: Vec::new(),
        };

        let mut host = WorldHost {
            world: &mut engine.world,
            player: engine.house.player,
        };
        engine
            .kernel
            .start_new_loop(&mut host, &mut engine.rng, &mut engine.events);

        if !config.skip_opening {
            engine.kernel.prepare_for_opening("intro sequence");
            engine.phase = GamePhase::Opening;
        }
        info!(seed = config.seed, phase = ?engine.phase, "loop engine ready");
        Ok(engine)
    }

    /// Queue a player command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance one tick and return the resulting snapshot.
    pub fn tick(&mut self) -> LoopSnapshot {
        let mark = self.events.len();
        if self.phase != GamePhase::Paused {
            self.service_reset();
        }
        self.process_commands();

        if self.phase != GamePhase::Paused {
            self.run_systems(mark);
            self.time.advance();
        }

        let events = std::mem::take(&mut self.events);
        let medicine_available = systems::snapshot::medicine_available(&self.world, &self.house);
        systems::snapshot::build_snapshot(
            &self.world,
            &self.time,
            self.phase,
            self.kernel.view(),
            self.ending.view(),
            self.perception.view(medicine_available),
            &self.house,
            events,
        )
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn house(&self) -> &House {
        &self.house
    }

    pub fn kernel(&self) -> &LoopKernel<Entity> {
        &self.kernel
    }

    pub fn director(&self) -> &IntruderDirector {
        &self.director
    }

    pub fn perception(&self) -> &PerceptionController {
        &self.perception
    }

    pub fn ending(&self) -> &EndingController {
        &self.ending
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    fn service_reset(&mut self) {
        let mut host = WorldHost {
            world: &mut self.world,
            player: self.house.player,
        };
        if self
            .kernel
            .service_reset(&mut host, &mut self.rng, &mut self.events)
        {
            self.catch.clear();
        }
    }

    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
            systems::doors::drain_transitions(&mut self.world, &mut self.events);
        }
    }

    fn handle_command(&mut self, command: PlayerCommand) {
        if self.phase == GamePhase::Paused && !matches!(command, PlayerCommand::Resume) {
            debug!(?command, "command ignored while paused");
            return;
        }

        match command {
            PlayerCommand::InteractDoor { door } => {
                self.interact(self.house.door(door), Interaction::Door);
            }
            PlayerCommand::InteractHandle { door } => {
                self.interact(self.house.door(door), Interaction::Handle);
            }
            PlayerCommand::RemoveBattery => {
                if self
                    .interact(self.house.battery_lock, Interaction::RemoveBattery)
                    .is_accepted()
                {
                    self.kernel.set_battery_removed(true);
                    self.events.push(LoopEvent::BatteryRemoved);
                }
            }
            PlayerCommand::EnterHideZone => {
                self.interact(self.house.hide_zone, Interaction::Enter);
            }
            PlayerCommand::LeaveHideZone => {
                self.interact(self.house.hide_zone, Interaction::Leave);
            }
            PlayerCommand::MovePlayer { pose } => {
                if let Ok(mut current) = self.world.get::<&mut Pose>(self.house.player) {
                    *current = pose;
                }
            }
            PlayerCommand::DebugResetLoop => {
                self.kernel.request_reset("debug reset");
            }
            PlayerCommand::InspectEvidence { evidence } => {
                if let InteractOutcome::Rejected(reason) =
                    self.perception.discover(&evidence, &mut self.events)
                {
                    self.reject(reason);
                }
            }
            PlayerCommand::TakeMedicine => {
                if self
                    .interact(self.house.medicine, Interaction::TakeMedicine)
                    .is_accepted()
                {
                    let reality_secs = self.config.perception.medicine_reality_secs;
                    self.events.push(LoopEvent::MedicineTaken { reality_secs });
                    self.perception
                        .force_reality(reality_secs, "medicine", &mut self.events);
                }
            }
            PlayerCommand::ReportEmergencyCall => {
                if self.phase != GamePhase::Looping {
                    debug!(phase = ?self.phase, "emergency call ignored");
                    return;
                }
                match self.perception.check_call() {
                    Ok(()) => self.begin_ending(),
                    Err(reason) => {
                        info!(?reason, "emergency call failed");
                        self.events.push(LoopEvent::EmergencyCallFailed { reason });
                    }
                }
            }
            PlayerCommand::ReachExit => self.reach_exit(),
            PlayerCommand::FinishOpening => {
                if self.phase == GamePhase::Opening {
                    self.kernel.begin_game_from_opening("intro finished");
                    self.phase = GamePhase::Looping;
                }
            }
            PlayerCommand::Pause => {
                if self.phase != GamePhase::Finished {
                    self.paused_from = Some(self.phase);
                    self.phase = GamePhase::Paused;
                }
            }
            PlayerCommand::Resume => {
                if let Some(previous) = self.paused_from.take() {
                    self.phase = previous;
                }
            }
        }
    }

    fn interact(&mut self, fixture: Entity, interaction: Interaction) -> InteractOutcome {
        let outcome = match self.world.get::<&mut Fixture>(fixture) {
            Ok(mut fixture) => fixture.interact(interaction),
            Err(_) => InteractOutcome::Rejected("fixture missing"),
        };
        if let InteractOutcome::Rejected(reason) = outcome {
            self.reject(reason);
        }
        outcome
    }

    fn reject(&mut self, reason: &str) {
        debug!(reason, "interaction rejected");
        self.events.push(LoopEvent::InteractionRejected {
            reason: reason.to_string(),
        });
    }

    fn entry_door_passable(&self) -> bool {
        self.world
            .get::<&Fixture>(self.house.entry_door)
            .ok()
            .and_then(|fixture| fixture.as_door().map(|door| door.state().is_passable()))
            .unwrap_or(false)
    }

    /// Switch from loops to the end-game.
    fn begin_ending(&mut self) {
        info!("ending begins");
        self.kernel.set_reset_blocked(true);
        self.kernel.set_scenario_blocked(true, "ending");
        self.director
            .set_blocked(true, &mut self.world, self.kernel.registry_mut(), &mut self.events);
        self.events.push(LoopEvent::InteractionUiClosed);
        self.catch.clear();
        self.ending.begin(&mut self.world, &self.house, &mut self.events);
        self.phase = GamePhase::Ending;
    }

    fn reach_exit(&mut self) {
        match self.phase {
            GamePhase::Looping => {
                self.kernel.request_reset("player reached the exit");
            }
            GamePhase::Ending => {
                // The exit is outside; the entry door has to be down first.
                if !self.entry_door_passable() {
                    self.reject("the front door is shut");
                    return;
                }
                if self
                    .ending
                    .escape(&mut self.world, self.kernel.registry_mut(), &mut self.events)
                {
                    self.kernel.set_reset_blocked(false);
                    self.phase = GamePhase::Finished;
                }
            }
            _ => debug!(phase = ?self.phase, "exit ignored"),
        }
    }

    fn run_systems(&mut self, mark: usize) {
        let dt = self.time.dt();
        let now = self.time.elapsed_secs;

        // 1. Loop clock and break-in timeline
        self.kernel.tick(dt, &mut self.rng, &mut self.events);
        // 2. Director reacts to this tick's loop events
        self.dispatch_loop_events(mark);
        // 3. Entry door flow
        self.director.tick(dt, &mut self.world, &self.config);
        systems::doors::drain_transitions(&mut self.world, &mut self.events);
        // 4. Ending sub-sequence
        self.ending.tick(
            dt,
            &mut self.world,
            &self.house,
            &self.config,
            &mut self.director,
            &mut self.events,
        );
        systems::doors::drain_transitions(&mut self.world, &mut self.events);
        // 5. Perception timers and glimpse roll
        self.perception
            .tick(dt, &mut self.perception_rng, &mut self.events);
        // 6. Vision
        let spotted = systems::vision::run(
            &mut self.world,
            dt,
            now,
            &self.plan,
            &self.house,
            &mut self.events,
        );
        // 7. Loop intruder brains
        let loop_catch = systems::intruder_ai::run(
            &mut self.world,
            dt,
            now,
            &self.house,
            &spotted,
            &mut self.events,
        );
        systems::doors::drain_transitions(&mut self.world, &mut self.events);
        // 8. Pursuer
        let pursuer_catch = systems::pursuer::run(
            &mut self.world,
            dt,
            &self.plan,
            &self.house,
            &self.config.pursuer,
        );
        systems::doors::drain_transitions(&mut self.world, &mut self.events);
        // 9. Movement
        systems::movement::run(&mut self.world, dt);
        // 10. Catch
        if loop_catch {
            self.catch.request(CatchKind::Loop, &mut self.events);
        }
        if pursuer_catch {
            self.catch.request(CatchKind::Pursuer, &mut self.events);
        }
        if let Some(kind) = self.catch.tick(dt) {
            self.resolve_catch(kind);
        }
    }

    fn dispatch_loop_events(&mut self, mark: usize) {
        let loop_events: Vec<LoopEvent> = self.events[mark..]
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    LoopEvent::LoopStarted { .. }
                        | LoopEvent::BreakInSucceeded { .. }
                        | LoopEvent::BreakInDelayed { .. }
                )
            })
            .cloned()
            .collect();

        for event in loop_events {
            match event {
                LoopEvent::LoopStarted { .. } => self.director.on_loop_started(
                    &mut self.world,
                    self.kernel.registry_mut(),
                    &mut self.events,
                ),
                LoopEvent::BreakInSucceeded { method } => {
                    self.director
                        .on_break_in(method, &mut self.world, &self.config, &mut self.events)
                }
                LoopEvent::BreakInDelayed { deadline } => self.director.on_break_in_delayed(deadline),
                _ => {}
            }
        }
    }

    fn resolve_catch(&mut self, kind: CatchKind) {
        match kind {
            CatchKind::Loop => {
                if !self.kernel.request_reset("caught by intruder") {
                    self.catch.clear();
                }
            }
            CatchKind::Pursuer => {
                self.ending.rollback(
                    &mut self.world,
                    &self.house,
                    self.kernel.registry_mut(),
                    &mut self.events,
                );
                self.catch.clear();
            }
        }
    }
}
