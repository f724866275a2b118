//! The simulated entity aggregate.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use glam::{Quat, Vec3};
use vantage_physics::{
    CharacterMotor, GroundPhase, InputRecord, LookRotation, MovementConfig, MovementStepper, PawnState,
    PhysicalState, StepError, Tick,
};

use crate::error::SimulationError;
use crate::events::{LandingEvent, MovementEvent};
use crate::gravity::{GravityTarget, GravityVolumeBridge, ReplayContext};
use crate::history::InputHistory;
use crate::simulation::{PeerRole, SimulationConfig, TickKind};

/// Unique identifier for entities.
pub type EntityId = u32;

/// What the visual layer reads once per tick. It smooths toward these on
/// its own and never writes back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTargets {
    pub position: Vec3,
    pub rotation: Quat,
    pub look: LookRotation,
    pub crouch_height: f32,
    /// Drives jump, fall and land animation.
    pub ground_phase: GroundPhase,
}

/// One simulated character.
///
/// Owns its physical and pawn state and holds a shared reference to the
/// collision collaborator it moves through.
pub struct Entity {
    /// Unique entity ID.
    pub id: EntityId,

    /// Kinematic state.
    pub physical: PhysicalState,

    /// Jump count, gravity override, look and stance.
    pub pawn: PawnState,

    controlled: bool,
    motor: Arc<dyn CharacterMotor>,

    pub(crate) history: InputHistory,
    /// Received inputs for ticks not simulated yet.
    pub(crate) pending: BTreeMap<Tick, InputRecord>,
    /// Most recent real (not predicted) input.
    pub(crate) last_input: Option<InputRecord>,
    pub(crate) last_snapshot_tick: Option<Tick>,
}

/// How a single tick is being executed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TickExecution {
    pub tick: Tick,
    pub kind: TickKind,
    pub role: PeerRole,
    pub delta_time: f32,
    /// Look to use instead of applying the input's look delta.
    pub pinned_look: Option<LookRotation>,
    pub context: ReplayContext,
}

impl Entity {
    /// Whether this peer produces the entity's input.
    #[inline]
    pub fn is_controlled(&self) -> bool {
        self.controlled
    }

    pub fn motor(&self) -> &dyn CharacterMotor {
        self.motor.as_ref()
    }

    pub fn history(&self) -> &InputHistory {
        &self.history
    }

    /// Tick of the last snapshot applied.
    pub fn last_snapshot_tick(&self) -> Option<Tick> {
        self.last_snapshot_tick
    }

    pub fn render_targets(&self, config: &MovementConfig) -> RenderTargets {
        RenderTargets {
            position: self.physical.position,
            rotation: self.physical.rotation,
            look: self.pawn.look,
            crouch_height: self.pawn.crouch_height,
            ground_phase: self.pawn.ground_phase(&self.physical, config),
        }
    }

    /// Run one tick. On failure the entity is left exactly as it was and
    /// no events are emitted.
    pub(crate) fn execute(
        &mut self,
        input: &InputRecord,
        execution: &TickExecution,
        stepper: &MovementStepper,
        volumes: &mut GravityVolumeBridge,
        events: &mut Vec<MovementEvent>,
    ) -> Result<(), StepError> {
        let physical = self.physical;
        let pawn = self.pawn;
        let emitted = events.len();

        let result = self.run_tick(input, execution, stepper, volumes, events);
        if result.is_err() {
            self.physical = physical;
            self.pawn = pawn;
            events.truncate(emitted);
        }
        result
    }

    fn run_tick(
        &mut self,
        input: &InputRecord,
        execution: &TickExecution,
        stepper: &MovementStepper,
        volumes: &mut GravityVolumeBridge,
        events: &mut Vec<MovementEvent>,
    ) -> Result<(), StepError> {
        let config = &stepper.config;
        let replay = execution.kind.is_replay();

        // Look is baked into replayed state and must not be applied twice
        match execution.pinned_look {
            Some(look) => self.pawn.look = look,
            None if !replay => self.pawn.apply_look(input.look, config),
            None => {}
        }

        if input.wants_jump() && self.pawn.try_jump(&mut self.physical, config, replay) {
            events.push(MovementEvent::Jumped {
                entity: self.id,
                tick: execution.tick,
                is_replay: replay,
            });
        }
        self.pawn.reset_jumps_if_grounded(&self.physical);

        self.pawn.set_sprint(input.wants_sprint());
        // Observers otherwise keep the crouch the authority last sent
        if self.controlled || execution.role == PeerRole::Server || execution.kind == TickKind::ReplayedCreated {
            self.pawn.set_crouch(input.wants_crouch());
            self.pawn.update_crouch_height(config);
        }

        let intent = self.pawn.move_intent(input.horizontal, input.vertical, config);
        let gravity = self.pawn.active_gravity(config);
        let outcome = stepper.step(&self.physical, &intent, gravity, execution.delta_time, self.motor.as_ref())?;
        self.physical = outcome.state;

        if outcome.landed() {
            events.push(MovementEvent::Landed(LandingEvent {
                entity: self.id,
                tick: execution.tick,
                landed_velocity: outcome.landed_velocity,
                is_authority: execution.role == PeerRole::Server,
                is_replay: replay,
                grounded: self.physical.is_grounded(),
            }));
        }

        if !volumes.is_empty() {
            let position = self.physical.position;
            volumes.update(self, position, &execution.context);
        }

        Ok(())
    }
}

impl GravityTarget for Entity {
    fn gravity_entity(&self) -> EntityId {
        self.id
    }

    fn set_gravity(&mut self, gravity: Vec3, context: &ReplayContext) -> bool {
        if context.is_replaying_entity(self.id) {
            log::debug!("ignoring gravity change to {} for entity {} during replay", gravity, self.id);
            return false;
        }
        self.pawn.set_gravity(gravity, &mut self.physical)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("controlled", &self.controlled)
            .field("physical", &self.physical)
            .field("pawn", &self.pawn)
            .field("history_len", &self.history.len())
            .field("pending", &self.pending.len())
            .field("last_snapshot_tick", &self.last_snapshot_tick)
            .finish_non_exhaustive()
    }
}

/// Explicit construction sequence for an [`Entity`].
///
/// The motor and pawn state are required. The physical state is either
/// given directly or produced by settling at a spawn point.
#[derive(Default)]
pub struct EntityBuilder {
    id: EntityId,
    controlled: bool,
    motor: Option<Arc<dyn CharacterMotor>>,
    physical: Option<PhysicalState>,
    pawn: Option<PawnState>,
    spawn: Option<Vec3>,
}

impl EntityBuilder {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Mark the entity as controlled by this peer.
    pub fn controlled(mut self, controlled: bool) -> Self {
        self.controlled = controlled;
        self
    }

    pub fn motor(mut self, motor: Arc<dyn CharacterMotor>) -> Self {
        self.motor = Some(motor);
        self
    }

    pub fn physical(mut self, physical: PhysicalState) -> Self {
        self.physical = Some(physical);
        self
    }

    pub fn pawn(mut self, pawn: PawnState) -> Self {
        self.pawn = Some(pawn);
        self
    }

    /// Settle on the ground below `position` when built.
    pub fn spawn_at(mut self, position: Vec3) -> Self {
        self.spawn = Some(position);
        self
    }

    pub fn build(self, config: &SimulationConfig) -> Result<Entity, SimulationError> {
        let motor = self
            .motor
            .ok_or(SimulationError::MissingCollaborator { component: "character motor" })?;
        let pawn = self
            .pawn
            .ok_or(SimulationError::MissingCollaborator { component: "pawn state" })?;

        let mut physical = match (self.physical, self.spawn) {
            (Some(physical), None) => physical,
            (physical, Some(spawn)) => {
                let mut physical = physical.unwrap_or_default();
                let stepper = MovementStepper::new(config.movement.clone());
                if !stepper.spawn_at(&mut physical, spawn, motor.as_ref()) {
                    log::warn!("no ground below spawn point {} for entity {}", spawn, self.id);
                }
                physical
            }
            (None, None) => {
                return Err(SimulationError::MissingCollaborator { component: "physical state" });
            }
        };
        physical.rotation = pawn.look.body_rotation();

        Ok(Entity {
            id: self.id,
            physical,
            pawn,
            controlled: self.controlled,
            motor,
            history: InputHistory::new(config.history_capacity),
            pending: BTreeMap::new(),
            last_input: None,
            last_snapshot_tick: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_physics::PlaneWorld;

    fn config() -> SimulationConfig {
        SimulationConfig::default()
    }

    #[test]
    fn test_builder_requires_motor() {
        let config = config();
        let result = EntityBuilder::new(1)
            .pawn(PawnState::new(&config.movement))
            .physical(PhysicalState::default())
            .build(&config);

        assert!(matches!(
            result,
            Err(SimulationError::MissingCollaborator { component: "character motor" })
        ));
    }

    #[test]
    fn test_builder_requires_pawn() {
        let config = config();
        let result = EntityBuilder::new(1)
            .motor(Arc::new(PlaneWorld::flat(0.0)))
            .physical(PhysicalState::default())
            .build(&config);

        assert!(matches!(
            result,
            Err(SimulationError::MissingCollaborator { component: "pawn state" })
        ));
    }

    #[test]
    fn test_builder_requires_physical_or_spawn() {
        let config = config();
        let result = EntityBuilder::new(1)
            .motor(Arc::new(PlaneWorld::flat(0.0)))
            .pawn(PawnState::new(&config.movement))
            .build(&config);

        assert!(matches!(
            result,
            Err(SimulationError::MissingCollaborator { component: "physical state" })
        ));
    }

    #[test]
    fn test_spawn_settles_on_ground() {
        let config = config();
        let entity = EntityBuilder::new(3)
            .controlled(true)
            .motor(Arc::new(PlaneWorld::flat(1.0)))
            .pawn(PawnState::new(&config.movement))
            .spawn_at(Vec3::new(4.0, 1.5, 0.0))
            .build(&config)
            .unwrap();

        assert!(entity.is_controlled());
        assert!(entity.physical.is_grounded());
        assert!((entity.physical.position.y - 1.0).abs() < 1e-5);
        assert_eq!(entity.history().capacity(), config.history_capacity);
    }

    #[test]
    fn test_gravity_ignored_while_replaying_entity() {
        let config = config();
        let mut entity = EntityBuilder::new(5)
            .motor(Arc::new(PlaneWorld::flat(0.0)))
            .pawn(PawnState::new(&config.movement))
            .physical(PhysicalState::default())
            .build(&config)
            .unwrap();
        let up = Vec3::new(0.0, 9.81, 0.0);

        assert!(!entity.set_gravity(up, &ReplayContext::replay(5, 10, 12)));
        assert_eq!(entity.pawn.gravity_override, config.movement.gravity);

        // Another entity's replay does not block this one
        assert!(entity.set_gravity(up, &ReplayContext::replay(6, 10, 12)));
        assert_eq!(entity.pawn.gravity_override, up);
        assert!(!entity.physical.constrained_to_ground);
    }
}
