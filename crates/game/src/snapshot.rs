//! Authoritative state snapshots.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use vantage_physics::{LookRotation, PhysicalState, Tick};

use crate::entity::{Entity, EntityId};

/// Everything a follower needs to resynchronise one entity at one tick.
///
/// Built by the authority after the tick completes and treated as an
/// immutable message from then on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSnapshot {
    pub entity: EntityId,
    pub tick: Tick,
    pub physical: PhysicalState,
    pub jump_count: u32,
    /// Gravity override in effect.
    pub gravity: Vec3,
    pub look: LookRotation,
    pub crouch_height: f32,
    pub crouch_intent: bool,
}

impl ReconciliationSnapshot {
    /// Capture the current state of `entity` as the result of `tick`.
    pub fn capture(entity: &Entity, tick: Tick) -> Self {
        Self {
            entity: entity.id,
            tick,
            physical: entity.physical,
            jump_count: entity.pawn.jump_count,
            gravity: entity.pawn.gravity_override,
            look: entity.pawn.look,
            crouch_height: entity.pawn.crouch_height,
            crouch_intent: entity.pawn.crouch_intent,
        }
    }

    /// Overwrite the entity's state with this snapshot.
    ///
    /// Physical state, jump count and gravity are written verbatim (a
    /// gravity change here does not pause the ground constraint). Look and
    /// crouch are only taken for entities this peer does not control.
    pub fn apply_to(&self, entity: &mut Entity) {
        entity.physical = self.physical;
        entity.pawn.jump_count = self.jump_count;
        entity.pawn.gravity_override = self.gravity;

        if !entity.is_controlled() {
            entity.pawn.look = self.look;
            entity.pawn.crouch_height = self.crouch_height;
            entity.pawn.crouch_intent = self.crouch_intent;
        }
    }
}
