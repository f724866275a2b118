//! Jump and ground state.
//!
//! Jumps are counted per airborne stretch and the count resets the tick the
//! character is found grounded. Replays of an already-simulated tick still
//! apply the jump velocity (the trajectory must be reproduced) but never
//! increment the count a second time.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::config::MovementConfig;
use super::state::{PawnState, PhysicalState};

/// Where the character is relative to the ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroundPhase {
    /// On walkable ground with the constraint active.
    Grounded,
    /// Still touching ground but free to leave it (just jumped, or gravity changed).
    ConstraintPaused,
    /// Moving away from the ground after a jump.
    Ascending,
    /// Airborne and not rising from a jump.
    Falling,
}

impl GroundPhase {
    /// Classify the current state. `up` is the negated active gravity direction.
    pub fn classify(physical: &PhysicalState, pawn: &PawnState, up: Vec3) -> Self {
        if physical.is_grounded() {
            GroundPhase::Grounded
        } else if !physical.constrained_to_ground && physical.on_walkable_ground() {
            GroundPhase::ConstraintPaused
        } else if pawn.jump_count > 0 && physical.speed_along(up) > 0.0 {
            GroundPhase::Ascending
        } else {
            GroundPhase::Falling
        }
    }

    pub fn is_airborne(self) -> bool {
        matches!(self, GroundPhase::Ascending | GroundPhase::Falling)
    }
}

/// Up axis for a gravity vector. Zero gravity falls back to world up.
pub(crate) fn up_axis(gravity: Vec3) -> Vec3 {
    (-gravity).try_normalize().unwrap_or(Vec3::Y)
}

impl PawnState {
    /// Current phase of the jump and ground state machine.
    pub fn ground_phase(&self, physical: &PhysicalState, config: &MovementConfig) -> GroundPhase {
        GroundPhase::classify(physical, self, up_axis(self.active_gravity(config)))
    }

    /// Whether another jump is allowed right now.
    pub fn can_jump(&self, config: &MovementConfig) -> bool {
        config.can_jump_ever && self.jump_count < config.max_jump_count
    }

    /// Launch the character if a jump is available.
    ///
    /// Pauses the ground constraint and raises the speed along the up axis to
    /// at least the jump impulse, never lowering a larger upward speed. The
    /// jump count only increments when `replay` is false.
    ///
    /// Returns whether the jump happened.
    pub fn try_jump(
        &mut self,
        physical: &mut PhysicalState,
        config: &MovementConfig,
        replay: bool,
    ) -> bool {
        if !self.can_jump(config) {
            return false;
        }

        physical.pause_ground_constraint();

        let axis = up_axis(self.active_gravity(config));
        let current = physical.velocity.dot(axis);
        let target = current.max(config.jump_impulse);
        physical.velocity += axis * (target - current);

        if !replay {
            self.jump_count += 1;
        }
        true
    }

    /// Reset the jump count when grounded. Returns whether it reset.
    pub fn reset_jumps_if_grounded(&mut self, physical: &PhysicalState) -> bool {
        if physical.is_grounded() {
            self.jump_count = 0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grounded_state() -> PhysicalState {
        let mut state = PhysicalState::new(Vec3::ZERO);
        state.hit_ground = true;
        state.is_walkable = true;
        state
    }

    #[test]
    fn test_basic_jump() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);
        let mut physical = grounded_state();

        assert!(pawn.try_jump(&mut physical, &config, false));
        assert!((physical.velocity.y - 6.5).abs() < 1e-5);
        assert_eq!(pawn.jump_count, 1);
        assert!(!physical.constrained_to_ground);
    }

    #[test]
    fn test_replayed_jump_does_not_count() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);
        let mut physical = grounded_state();

        assert!(pawn.try_jump(&mut physical, &config, true));
        assert!((physical.velocity.y - 6.5).abs() < 1e-5);
        assert_eq!(pawn.jump_count, 0);
    }

    #[test]
    fn test_jump_keeps_larger_upward_speed() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);
        let mut physical = grounded_state();
        physical.velocity = Vec3::new(1.0, 10.0, 0.0);

        pawn.try_jump(&mut physical, &config, false);
        assert!((physical.velocity - Vec3::new(1.0, 10.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_jump_cancels_downward_speed() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);
        let mut physical = PhysicalState::new(Vec3::ZERO);
        physical.velocity = Vec3::new(0.0, -4.0, 2.0);

        pawn.try_jump(&mut physical, &config, false);
        assert!((physical.velocity.y - 6.5).abs() < 1e-5);
        assert_eq!(physical.velocity.z, 2.0);
    }

    #[test]
    fn test_jump_count_never_exceeds_max() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);
        let mut physical = PhysicalState::new(Vec3::new(0.0, 5.0, 0.0));

        for _ in 0..5 {
            pawn.try_jump(&mut physical, &config, false);
            assert!(pawn.jump_count <= config.max_jump_count);
        }
        assert_eq!(pawn.jump_count, config.max_jump_count);
        assert!(!pawn.can_jump(&config));
    }

    #[test]
    fn test_jump_follows_gravity_override() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);
        let mut physical = PhysicalState::new(Vec3::ZERO);
        pawn.gravity_override = Vec3::new(9.81, 0.0, 0.0);

        pawn.try_jump(&mut physical, &config, false);
        assert!((physical.velocity.x + 6.5).abs() < 1e-5);
        assert!(physical.velocity.y.abs() < 1e-6);
    }

    #[test]
    fn test_reset_only_when_grounded() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);
        let mut physical = grounded_state();

        pawn.try_jump(&mut physical, &config, false);
        // Constraint paused by the jump: not grounded yet
        assert!(!pawn.reset_jumps_if_grounded(&physical));
        assert_eq!(pawn.jump_count, 1);

        physical.constrained_to_ground = true;
        assert!(pawn.reset_jumps_if_grounded(&physical));
        assert_eq!(pawn.jump_count, 0);
    }

    #[test]
    fn test_disabled_jump() {
        let config = MovementConfig {
            can_jump_ever: false,
            ..Default::default()
        };
        let mut pawn = PawnState::new(&config);
        let mut physical = grounded_state();

        assert!(!pawn.try_jump(&mut physical, &config, false));
        assert_eq!(physical.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_ground_phase_transitions() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);
        let mut physical = grounded_state();

        assert_eq!(GroundPhase::classify(&physical, &pawn, Vec3::Y), GroundPhase::Grounded);

        pawn.try_jump(&mut physical, &config, false);
        assert_eq!(GroundPhase::classify(&physical, &pawn, Vec3::Y), GroundPhase::ConstraintPaused);

        physical.hit_ground = false;
        assert_eq!(GroundPhase::classify(&physical, &pawn, Vec3::Y), GroundPhase::Ascending);

        physical.velocity.y = -1.0;
        let phase = GroundPhase::classify(&physical, &pawn, Vec3::Y);
        assert_eq!(phase, GroundPhase::Falling);
        assert!(phase.is_airborne());
    }

    #[test]
    fn test_ground_phase_follows_gravity_override() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);
        let mut physical = grounded_state();
        physical.hit_ground = false;
        physical.constrained_to_ground = false;
        pawn.jump_count = 1;
        physical.velocity = Vec3::new(0.0, -3.0, 0.0);

        assert_eq!(pawn.ground_phase(&physical, &config), GroundPhase::Falling);

        // Inverted gravity: moving down is moving up
        pawn.gravity_override = Vec3::new(0.0, 9.81, 0.0);
        assert_eq!(pawn.ground_phase(&physical, &config), GroundPhase::Ascending);
    }
}
