//! Post-step movement events and listeners.
//!
//! Events are dispatched synchronously from the simulation loop, for live
//! ticks and replayed ticks alike. Each event says whether it came from the
//! authority and whether it is a replay, so listeners can keep gameplay side
//! effects to one per real occurrence.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use glam::Vec3;
use vantage_physics::Tick;

use crate::entity::EntityId;

/// The entity touched walkable ground after being airborne.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandingEvent {
    pub entity: EntityId,
    pub tick: Tick,

    /// Velocity just before the landing was resolved.
    pub landed_velocity: Vec3,

    /// Emitted by the authoritative simulation.
    pub is_authority: bool,

    /// Emitted while replaying an already simulated tick.
    pub is_replay: bool,

    /// The entity is grounded after the step.
    pub grounded: bool,
}

/// Events produced by a tick step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementEvent {
    Jumped {
        entity: EntityId,
        tick: Tick,
        is_replay: bool,
    },
    Landed(LandingEvent),
}

impl MovementEvent {
    pub fn entity(&self) -> EntityId {
        match self {
            MovementEvent::Jumped { entity, .. } => *entity,
            MovementEvent::Landed(landing) => landing.entity,
        }
    }

    pub fn is_replay(&self) -> bool {
        match self {
            MovementEvent::Jumped { is_replay, .. } => *is_replay,
            MovementEvent::Landed(landing) => landing.is_replay,
        }
    }
}

/// Receives movement events.
pub trait MovementListener: Send {
    fn on_movement_event(&mut self, event: &MovementEvent);
}

impl<L: MovementListener + ?Sized> MovementListener for Arc<Mutex<L>> {
    fn on_movement_event(&mut self, event: &MovementEvent) {
        let mut listener = self.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        listener.on_movement_event(event);
    }
}

/// A landing that should trigger gameplay effects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedLanding {
    pub entity: EntityId,
    pub tick: Tick,
    pub velocity: Vec3,
}

/// Reference landing listener.
///
/// Genuine landings (fall damage) are only taken from the authority, only
/// when the entity ended up grounded, and only once per landing velocity: a
/// repeated report of the same landing is ignored until the entity jumps
/// again. Audible landings are every non-replay landing.
#[derive(Debug, Default)]
pub struct LandingTracker {
    previous_landed_velocity: HashMap<EntityId, Vec3>,
    genuine: Vec<RecordedLanding>,
    audible: Vec<RecordedLanding>,
}

impl LandingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Landings that should apply fall damage.
    pub fn genuine_landings(&self) -> &[RecordedLanding] {
        &self.genuine
    }

    /// Landings that should play a sound.
    pub fn audible_landings(&self) -> &[RecordedLanding] {
        &self.audible
    }

    pub fn clear(&mut self) {
        self.genuine.clear();
        self.audible.clear();
    }

    fn on_landed(&mut self, landing: &LandingEvent) {
        let record = RecordedLanding {
            entity: landing.entity,
            tick: landing.tick,
            velocity: landing.landed_velocity,
        };

        let previous = self
            .previous_landed_velocity
            .insert(landing.entity, landing.landed_velocity)
            .unwrap_or(Vec3::ZERO);

        if landing.is_authority && previous != landing.landed_velocity && landing.grounded {
            log::debug!(
                "entity {} landed at tick {} with velocity {}",
                landing.entity,
                landing.tick,
                landing.landed_velocity
            );
            self.genuine.push(record);
        }

        if !landing.is_replay {
            self.audible.push(record);
        }
    }
}

impl MovementListener for LandingTracker {
    fn on_movement_event(&mut self, event: &MovementEvent) {
        match event {
            MovementEvent::Jumped { entity, .. } => {
                self.previous_landed_velocity.insert(*entity, Vec3::ZERO);
            }
            MovementEvent::Landed(landing) => self.on_landed(landing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landing(velocity: Vec3, is_authority: bool, is_replay: bool) -> MovementEvent {
        MovementEvent::Landed(LandingEvent {
            entity: 1,
            tick: 10,
            landed_velocity: velocity,
            is_authority,
            is_replay,
            grounded: true,
        })
    }

    #[test]
    fn test_authority_landing_is_genuine_once() {
        let mut tracker = LandingTracker::new();
        let velocity = Vec3::new(0.0, -6.0, 0.0);

        tracker.on_movement_event(&landing(velocity, true, false));
        tracker.on_movement_event(&landing(velocity, true, false));

        assert_eq!(tracker.genuine_landings().len(), 1);
        assert_eq!(tracker.audible_landings().len(), 2);
    }

    #[test]
    fn test_jump_rearms_genuine_landing() {
        let mut tracker = LandingTracker::new();
        let velocity = Vec3::new(0.0, -6.0, 0.0);

        tracker.on_movement_event(&landing(velocity, true, false));
        tracker.on_movement_event(&MovementEvent::Jumped {
            entity: 1,
            tick: 20,
            is_replay: false,
        });
        tracker.on_movement_event(&landing(velocity, true, false));

        assert_eq!(tracker.genuine_landings().len(), 2);
    }

    #[test]
    fn test_replayed_landing_is_silent() {
        let mut tracker = LandingTracker::new();
        tracker.on_movement_event(&landing(Vec3::new(0.0, -3.0, 0.0), false, true));

        assert!(tracker.audible_landings().is_empty());
        assert!(tracker.genuine_landings().is_empty());
    }

    #[test]
    fn test_ungrounded_landing_is_not_genuine() {
        let mut tracker = LandingTracker::new();
        let mut event = landing(Vec3::new(0.0, -3.0, 0.0), true, false);
        if let MovementEvent::Landed(landing) = &mut event {
            landing.grounded = false;
        }
        tracker.on_movement_event(&event);

        assert!(tracker.genuine_landings().is_empty());
        assert_eq!(tracker.audible_landings().len(), 1);
    }

    #[test]
    fn test_shared_listener() {
        let shared = Arc::new(Mutex::new(LandingTracker::new()));
        let mut handle = shared.clone();
        handle.on_movement_event(&landing(Vec3::new(0.0, -2.0, 0.0), true, false));

        assert_eq!(shared.lock().unwrap().genuine_landings().len(), 1);
    }
}
