//! Gravity regions and the replay context.
//!
//! Volumes are checked after every step. Entering a gravity volume sets the
//! entity's gravity override, leaving the last one restores the base gravity.
//! Gravity calls that happen while the entity is being replayed are ignored:
//! the authoritative snapshot already carries the override the replay starts
//! from, and applying it again would pause the ground constraint mid-replay.

use std::collections::{BTreeSet, HashMap};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use vantage_physics::Tick;

use crate::entity::EntityId;

/// Whether the current execution is a reconciliation replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayContext {
    replay: Option<ReplayWindow>,
}

/// The entity and tick range being replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayWindow {
    pub entity: EntityId,
    /// Snapshot tick the replay starts after.
    pub from: Tick,
    /// Last tick that will be replayed.
    pub to: Tick,
}

impl ReplayContext {
    /// Context for a live tick or an out-of-tick call.
    pub fn live() -> Self {
        Self { replay: None }
    }

    pub fn replay(entity: EntityId, from: Tick, to: Tick) -> Self {
        Self {
            replay: Some(ReplayWindow { entity, from, to }),
        }
    }

    pub fn is_replaying(&self) -> bool {
        self.replay.is_some()
    }

    /// Whether `entity` is the one being replayed.
    pub fn is_replaying_entity(&self, entity: EntityId) -> bool {
        self.replay.is_some_and(|window| window.entity == entity)
    }

    pub fn window(&self) -> Option<ReplayWindow> {
        self.replay
    }
}

/// Something whose gravity a region can change.
pub trait GravityTarget {
    fn gravity_entity(&self) -> EntityId;

    /// Apply a gravity vector. Returns whether the active gravity changed.
    fn set_gravity(&mut self, gravity: Vec3, context: &ReplayContext) -> bool;
}

/// What a volume does to entities inside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VolumeKind {
    /// Overrides gravity while inside.
    Gravity(Vec3),
    /// Recognised but does not change movement.
    Swim,
}

/// Axis-aligned trigger volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub min: Vec3,
    pub max: Vec3,
    pub kind: VolumeKind,
}

impl Volume {
    pub fn new(min: Vec3, max: Vec3, kind: VolumeKind) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            kind,
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Tracks which volumes each entity is in and forwards gravity changes.
#[derive(Debug, Clone)]
pub struct GravityVolumeBridge {
    base_gravity: Vec3,
    volumes: Vec<Volume>,
    occupancy: HashMap<EntityId, BTreeSet<usize>>,
    deferred: HashMap<EntityId, Vec3>,
}

impl GravityVolumeBridge {
    pub fn new(base_gravity: Vec3) -> Self {
        Self {
            base_gravity,
            volumes: Vec::new(),
            occupancy: HashMap::new(),
            deferred: HashMap::new(),
        }
    }

    pub fn add_volume(&mut self, volume: Volume) {
        self.volumes.push(volume);
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Forget an entity (despawned).
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.occupancy.remove(&entity);
        self.deferred.remove(&entity);
    }

    /// Take the gravity change held back while `entity` was being replayed.
    pub fn take_deferred(&mut self, entity: EntityId) -> Option<Vec3> {
        self.deferred.remove(&entity)
    }

    /// Check `position` against every volume and forward enter/exit
    /// transitions to `target`.
    ///
    /// Occupancy is tracked in replays too, so the first live tick after a
    /// replay does not report a transition the replay already crossed. A
    /// change the target refuses during its own replay is held until
    /// [`Self::take_deferred`].
    pub fn update(&mut self, target: &mut dyn GravityTarget, position: Vec3, context: &ReplayContext) {
        let entity = target.gravity_entity();
        let inside: BTreeSet<usize> = self
            .volumes
            .iter()
            .enumerate()
            .filter(|(_, volume)| volume.contains(position))
            .map(|(index, _)| index)
            .collect();

        let previous = self.occupancy.entry(entity).or_default();
        if *previous == inside {
            return;
        }

        let mut gravity_changed = false;
        for &index in previous.symmetric_difference(&inside) {
            let entered = inside.contains(&index);
            match self.volumes[index].kind {
                VolumeKind::Gravity(_) => gravity_changed = true,
                VolumeKind::Swim => {
                    log::debug!(
                        "entity {} {} swim volume {}",
                        entity,
                        if entered { "entered" } else { "left" },
                        index
                    );
                }
            }
        }
        *previous = inside;

        if gravity_changed {
            // Most recently added volume wins when they overlap
            let gravity = previous
                .iter()
                .rev()
                .find_map(|&index| match self.volumes[index].kind {
                    VolumeKind::Gravity(gravity) => Some(gravity),
                    VolumeKind::Swim => None,
                })
                .unwrap_or(self.base_gravity);
            if context.is_replaying_entity(entity) {
                if !target.set_gravity(gravity, context) {
                    self.deferred.insert(entity, gravity);
                }
            } else {
                self.deferred.remove(&entity);
                target.set_gravity(gravity, context);
            }
        }
    }
}
