//! Predicted simulation loop.
//!
//! Every peer runs the same loop at a fixed tick rate. For each entity and
//! tick it resolves exactly one input record (local, received or
//! predicted), steps the entity and dispatches the resulting events. The
//! authority then snapshots every entity; a client queues its own inputs
//! for the authority.

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use vantage_physics::{CharacterMotor, InputRecord, MovementConfig, MovementStepper, PawnState, Tick};

use crate::entity::{Entity, EntityBuilder, EntityId, RenderTargets, TickExecution};
use crate::error::SimulationError;
use crate::events::{MovementEvent, MovementListener};
use crate::gravity::{GravityTarget, GravityVolumeBridge, ReplayContext, Volume};
use crate::history::HistoryEntry;
use crate::input::LookSettings;
use crate::snapshot::ReconciliationSnapshot;

/// Which side of the connection this simulation runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerRole {
    /// Authoritative simulation.
    Server,
    /// Predicting follower.
    Client,
}

/// How a tick is being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// First execution of the tick.
    Live,
    /// Re-execution after a reconciliation.
    Replayed,
    /// Re-execution of a tick whose real input arrived after it was first
    /// simulated with a prediction.
    ReplayedCreated,
}

impl TickKind {
    #[inline]
    pub fn is_replay(self) -> bool {
        !matches!(self, TickKind::Live)
    }
}

/// Record substituted when no input arrived for a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingInputPolicy {
    /// Keep the last real axes and held buttons, drop jump and look.
    #[default]
    RepeatLast,
    /// All axes and buttons released.
    Neutral,
}

impl MissingInputPolicy {
    pub fn predict(self, last: Option<&InputRecord>, tick: Tick) -> InputRecord {
        match (self, last) {
            (MissingInputPolicy::RepeatLast, Some(last)) => InputRecord::predicted_from(last, tick),
            _ => InputRecord::neutral(tick),
        }
    }
}

/// Simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulation tick rate (ticks per second).
    pub tick_rate: u32,

    /// Movement physics configuration.
    pub movement: MovementConfig,

    /// Look sensitivity for the local sampler.
    pub look: LookSettings,

    /// Ticks of input kept for replay. Should cover the longest tolerated
    /// round trip.
    pub history_capacity: usize,

    /// What to do when a tick has no input.
    pub missing_input: MissingInputPolicy,

    /// How many recent inputs a client sends each tick, for loss tolerance.
    pub input_redundancy: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            movement: MovementConfig::default(),
            look: LookSettings::default(),
            history_capacity: 128,
            missing_input: MissingInputPolicy::RepeatLast,
            input_redundancy: 3,
        }
    }
}

impl SimulationConfig {
    /// Get the time step per tick in seconds.
    pub fn delta_time(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}

/// Messages the simulation wants delivered to the other side.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// Most recent inputs of a controlled entity, oldest first.
    Inputs { entity: EntityId, records: Vec<InputRecord> },
    /// Authoritative state after a tick.
    Snapshot(ReconciliationSnapshot),
}

/// Result of one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    pub tick: Tick,
    /// Entities whose step failed. Their state was left at the previous tick.
    pub failures: Vec<SimulationError>,
}

/// The predicted simulation for one peer.
pub struct Simulation {
    /// Simulation configuration.
    pub config: SimulationConfig,

    role: PeerRole,

    /// Last completed tick.
    tick: Tick,

    pub(crate) stepper: MovementStepper,
    pub(crate) entities: Vec<Entity>,
    pub(crate) volumes: GravityVolumeBridge,
    listeners: Vec<Box<dyn MovementListener>>,
    outbox: Vec<Outgoing>,
}

impl Simulation {
    /// Create a new simulation with the given configuration and role.
    pub fn new(config: SimulationConfig, role: PeerRole) -> Self {
        let stepper = MovementStepper::new(config.movement.clone());
        let volumes = GravityVolumeBridge::new(config.movement.gravity);

        Self {
            config,
            role,
            tick: 0,
            stepper,
            entities: Vec::new(),
            volumes,
            listeners: Vec::new(),
            outbox: Vec::new(),
        }
    }

    pub fn server(config: SimulationConfig) -> Self {
        Self::new(config, PeerRole::Server)
    }

    pub fn client(config: SimulationConfig) -> Self {
        Self::new(config, PeerRole::Client)
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    pub fn is_authority(&self) -> bool {
        self.role == PeerRole::Server
    }

    /// Last completed tick.
    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn delta_time(&self) -> f32 {
        self.config.delta_time()
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Add a fully built entity.
    pub fn add_entity(&mut self, entity: Entity) -> Result<(), SimulationError> {
        if self.entity(entity.id).is_some() {
            return Err(SimulationError::DuplicateEntity(entity.id));
        }
        self.entities.push(entity);
        Ok(())
    }

    /// Build and add an entity with fresh pawn state, settled at `spawn`.
    pub fn spawn_entity(
        &mut self,
        id: EntityId,
        controlled: bool,
        motor: Arc<dyn CharacterMotor>,
        spawn: Vec3,
    ) -> Result<(), SimulationError> {
        let entity = EntityBuilder::new(id)
            .controlled(controlled)
            .motor(motor)
            .pawn(PawnState::new(&self.config.movement))
            .spawn_at(spawn)
            .build(&self.config)?;
        self.add_entity(entity)
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|entity| entity.id == id)?;
        self.volumes.remove_entity(id);
        Some(self.entities.remove(index))
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub(crate) fn index_of(&self, id: EntityId) -> Result<usize, SimulationError> {
        self.entities
            .iter()
            .position(|entity| entity.id == id)
            .ok_or(SimulationError::UnknownEntity(id))
    }

    pub fn render_targets(&self, id: EntityId) -> Option<RenderTargets> {
        let config = &self.config.movement;
        self.entity(id).map(|entity| entity.render_targets(config))
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    pub fn add_listener(&mut self, listener: Box<dyn MovementListener>) {
        self.listeners.push(listener);
    }

    pub fn add_volume(&mut self, volume: Volume) {
        self.volumes.add_volume(volume);
    }

    /// Set an entity's gravity from outside a tick.
    pub fn set_gravity(&mut self, id: EntityId, gravity: Vec3) -> Result<bool, SimulationError> {
        let index = self.index_of(id)?;
        Ok(self.entities[index].set_gravity(gravity, &ReplayContext::live()))
    }

    pub(crate) fn dispatch(&mut self, events: &[MovementEvent]) {
        for event in events {
            for listener in &mut self.listeners {
                listener.on_movement_event(event);
            }
        }
    }

    /// Take everything queued for the other side.
    pub fn drain_outgoing(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.outbox)
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Accept an input record for an entity this peer does not control.
    ///
    /// On the authority, inputs for future ticks are queued; late ones are
    /// dropped. On a client, a late input for an observed entity replaces
    /// the prediction in its history and is replayed on the next snapshot.
    /// Duplicates (same tick) are ignored.
    ///
    /// Returns whether the record was accepted.
    pub fn receive_input(&mut self, id: EntityId, input: InputRecord) -> Result<bool, SimulationError> {
        let index = self.index_of(id)?;
        let tick = self.tick;
        let capacity = self.config.history_capacity;
        let role = self.role;
        let entity = &mut self.entities[index];

        if entity.is_controlled() {
            log::debug!("ignoring remote input for locally controlled entity {}", id);
            return Ok(false);
        }

        let input = input.sanitized();
        if input.tick > tick {
            if (input.tick - tick) as usize > capacity {
                log::trace!("dropping input for entity {} tick {}: too far ahead", id, input.tick);
                return Ok(false);
            }
            if entity.pending.contains_key(&input.tick) {
                return Ok(false);
            }
            entity.pending.insert(input.tick, input);
            return Ok(true);
        }

        match role {
            PeerRole::Server => {
                log::trace!("dropping late input for entity {} tick {} (at {})", id, input.tick, tick);
                Ok(false)
            }
            PeerRole::Client => {
                let already_real = entity.history.get(input.tick).is_some_and(|entry| entry.fresh);
                Ok(!already_real && entity.history.replace_with_fresh(input))
            }
        }
    }

    /// Input for `entity` at `tick`: local if provided, queued if received,
    /// otherwise predicted.
    fn resolve_input(&mut self, index: usize, tick: Tick, local: Option<&InputRecord>) -> InputRecord {
        let policy = self.config.missing_input;
        let entity = &mut self.entities[index];

        // Inputs for ticks that have passed are no longer usable
        while let Some((&queued, _)) = entity.pending.first_key_value() {
            if queued >= tick {
                break;
            }
            entity.pending.remove(&queued);
        }

        let real = if entity.is_controlled() {
            local.copied()
        } else {
            entity.pending.remove(&tick)
        };

        match real {
            Some(input) => {
                let input = input.sanitized().with_tick(tick);
                entity.last_input = Some(input);
                input
            }
            None => {
                log::trace!("no input for entity {} at tick {}, predicting", entity.id, tick);
                policy.predict(entity.last_input.as_ref(), tick)
            }
        }
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the simulation by one tick.
    ///
    /// # Arguments
    ///
    /// * `local_inputs` - Sampled inputs for the entities this peer controls
    pub fn tick(&mut self, local_inputs: &[(EntityId, InputRecord)]) -> TickReport {
        let tick = self.tick + 1;
        let delta_time = self.config.delta_time();
        let mut report = TickReport {
            tick,
            failures: Vec::new(),
        };

        for index in 0..self.entities.len() {
            let id = self.entities[index].id;
            let local = local_inputs
                .iter()
                .find(|(entity, _)| *entity == id)
                .map(|(_, input)| input);
            let input = self.resolve_input(index, tick, local);

            let execution = TickExecution {
                tick,
                kind: TickKind::Live,
                role: self.role,
                delta_time,
                pinned_look: None,
                context: ReplayContext::live(),
            };

            let mut events = Vec::new();
            let entity = &mut self.entities[index];
            if let Err(source) = entity.execute(&input, &execution, &self.stepper, &mut self.volumes, &mut events) {
                log::error!("entity {} failed tick {}: {}", id, tick, source);
                report.failures.push(SimulationError::Step { entity: id, tick, source });
            }

            entity.history.push(HistoryEntry {
                tick,
                input,
                look: entity.pawn.look,
                fresh: false,
            });

            self.dispatch(&events);
        }

        self.tick = tick;
        self.queue_outgoing(tick);
        report
    }

    fn queue_outgoing(&mut self, tick: Tick) {
        match self.role {
            PeerRole::Server => {
                for entity in &self.entities {
                    self.outbox.push(Outgoing::Snapshot(ReconciliationSnapshot::capture(entity, tick)));
                }
            }
            PeerRole::Client => {
                let redundancy = self.config.input_redundancy.max(1);
                for entity in self.entities.iter().filter(|entity| entity.is_controlled()) {
                    self.outbox.push(Outgoing::Inputs {
                        entity: entity.id,
                        records: entity.history.recent_inputs(redundancy),
                    });
                }
            }
        }
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("role", &self.role)
            .field("tick", &self.tick)
            .field("entities", &self.entities)
            .field("listeners", &self.listeners.len())
            .field("outbox", &self.outbox.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
