//! Look, stance intents and gravity override.

use glam::{Vec2, Vec3};

use super::config::MovementConfig;
use super::state::{LookRotation, PawnState, PhysicalState};

/// Everything the stepper needs from the pawn for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveIntent {
    /// Strafe axis (-1.0 to 1.0).
    pub horizontal: f32,
    /// Forward axis (-1.0 to 1.0).
    pub vertical: f32,
    /// Look the movement basis is built from.
    pub look: LookRotation,
    /// Effective crouch (intent and ability).
    pub crouched: bool,
    /// Effective sprint (intent and ability).
    pub sprinting: bool,
}

impl PawnState {
    /// Add a look delta (yaw, pitch) and clamp pitch to the configured limits.
    pub fn apply_look(&mut self, delta: Vec2, config: &MovementConfig) {
        self.look = self.look.rotated(delta, config.min_pitch, config.max_pitch);
    }

    /// Overwrite the look rotation (reconciliation of observed entities).
    pub fn set_look(&mut self, look: LookRotation, config: &MovementConfig) {
        self.look = LookRotation::new(look.pitch.clamp(config.min_pitch, config.max_pitch), look.yaw);
    }

    pub fn set_sprint(&mut self, sprint: bool) {
        self.sprint_intent = sprint;
    }

    pub fn set_crouch(&mut self, crouch: bool) {
        self.crouch_intent = crouch;
    }

    pub fn is_sprinting(&self, config: &MovementConfig) -> bool {
        self.sprint_intent && config.can_sprint_ever
    }

    pub fn is_crouched(&self, config: &MovementConfig) -> bool {
        self.crouch_intent && config.can_crouch_ever
    }

    /// Update the root height target from the crouch state.
    pub fn update_crouch_height(&mut self, config: &MovementConfig) {
        self.crouch_height = config.root_height(self.is_crouched(config));
    }

    /// Speed cap for the current intents.
    pub fn max_speed(&self, config: &MovementConfig) -> f32 {
        config.max_speed(self.is_crouched(config), self.is_sprinting(config))
    }

    // ========================================================================
    // Gravity
    // ========================================================================

    /// Set the gravity override. A change pauses the ground constraint so the
    /// character is not snapped back down under the new direction.
    ///
    /// Returns whether the override changed.
    pub fn set_gravity(&mut self, gravity: Vec3, physical: &mut PhysicalState) -> bool {
        if gravity == self.gravity_override {
            return false;
        }
        physical.pause_ground_constraint();
        self.gravity_override = gravity;
        true
    }

    /// Whether a gravity region currently overrides the base gravity.
    pub fn is_gravity_altered(&self, config: &MovementConfig) -> bool {
        self.gravity_override != config.gravity
    }

    /// Gravity the stepper should use this tick.
    pub fn active_gravity(&self, config: &MovementConfig) -> Vec3 {
        if self.is_gravity_altered(config) {
            self.gravity_override
        } else {
            config.gravity
        }
    }

    /// Build the stepper intent for the given axes.
    pub fn move_intent(&self, horizontal: f32, vertical: f32, config: &MovementConfig) -> MoveIntent {
        MoveIntent {
            horizontal,
            vertical,
            look: self.look,
            crouched: self.is_crouched(config),
            sprinting: self.is_sprinting(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_pitch_is_clamped() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);

        let deltas = [3.0, -0.2, -10.0, 0.5, 100.0, -0.01];
        for delta in deltas {
            pawn.apply_look(Vec2::new(0.0, delta), &config);
            assert!(pawn.look.pitch >= config.min_pitch);
            assert!(pawn.look.pitch <= config.max_pitch);
        }
    }

    #[test]
    fn test_yaw_wraps() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);

        pawn.apply_look(Vec2::new(PI * 1.5, 0.0), &config);
        assert!((pawn.look.yaw + PI * 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_crouch_overrides_sprint() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);
        pawn.set_sprint(true);
        pawn.set_crouch(true);

        assert_eq!(pawn.max_speed(&config), config.max_speed_crouched);
    }

    #[test]
    fn test_crouch_height_target() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);

        pawn.set_crouch(true);
        pawn.update_crouch_height(&config);
        assert_eq!(pawn.crouch_height, config.crouched_height);

        pawn.set_crouch(false);
        pawn.update_crouch_height(&config);
        assert_eq!(pawn.crouch_height, config.uncrouched_height);
    }

    #[test]
    fn test_crouch_disabled() {
        let config = MovementConfig {
            can_crouch_ever: false,
            ..Default::default()
        };
        let mut pawn = PawnState::new(&config);
        pawn.set_crouch(true);
        assert!(!pawn.is_crouched(&config));
        assert_eq!(pawn.max_speed(&config), config.max_speed_walking);
    }

    #[test]
    fn test_gravity_override_enter_and_exit() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);
        let mut physical = PhysicalState::new(Vec3::ZERO);
        let region = Vec3::new(0.0, 9.81, 0.0);

        assert!(pawn.set_gravity(region, &mut physical));
        assert!(!physical.constrained_to_ground);
        assert_eq!(pawn.active_gravity(&config), region);

        physical.constrained_to_ground = true;
        assert!(pawn.set_gravity(config.gravity, &mut physical));
        assert_eq!(pawn.active_gravity(&config), config.gravity);
        assert!(!pawn.is_gravity_altered(&config));
    }

    #[test]
    fn test_unchanged_gravity_keeps_constraint() {
        let config = MovementConfig::default();
        let mut pawn = PawnState::new(&config);
        let mut physical = PhysicalState::new(Vec3::ZERO);

        assert!(!pawn.set_gravity(config.gravity, &mut physical));
        assert!(physical.constrained_to_ground);
    }
}
