//! Physical and pawn state.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::config::MovementConfig;

/// Kinematic state owned by the simulation.
///
/// Mutated only inside a tick step or a reconciliation overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalState {
    /// Position in world space (feet).
    pub position: Vec3,

    /// Body orientation (yaw about world up).
    pub rotation: Quat,

    /// Velocity in world space (meters/second).
    pub velocity: Vec3,

    /// Whether the character is held onto walkable ground.
    pub constrained_to_ground: bool,

    /// Time since the ground constraint was last paused (seconds).
    /// Only advances while the constraint is paused.
    pub unconstrained_time: f32,

    /// The last move found ground below the character.
    pub hit_ground: bool,

    /// The ground found by the last move is walkable.
    pub is_walkable: bool,
}

impl Default for PhysicalState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            constrained_to_ground: true,
            unconstrained_time: 0.0,
            hit_ground: false,
            is_walkable: false,
        }
    }
}

impl PhysicalState {
    /// Create a new state at the given position.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Standing on walkable ground with the constraint active.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.constrained_to_ground && self.on_walkable_ground()
    }

    /// The last move touched walkable ground, regardless of the constraint.
    #[inline]
    pub fn on_walkable_ground(&self) -> bool {
        self.hit_ground && self.is_walkable
    }

    /// Let the character leave the ground plane immediately.
    pub fn pause_ground_constraint(&mut self) {
        self.constrained_to_ground = false;
        self.unconstrained_time = 0.0;
    }

    /// Advance the pause timer and restore the constraint once `pause` has elapsed.
    pub fn advance_ground_constraint(&mut self, pause: f32, delta_time: f32) {
        if self.constrained_to_ground {
            return;
        }
        self.unconstrained_time += delta_time;
        if self.unconstrained_time >= pause {
            self.constrained_to_ground = true;
        }
    }

    /// Speed along `up`.
    #[inline]
    pub fn speed_along(&self, up: Vec3) -> f32 {
        self.velocity.dot(up)
    }

    /// Speed perpendicular to `up`.
    pub fn planar_speed(&self, up: Vec3) -> f32 {
        (self.velocity - up * self.velocity.dot(up)).length()
    }

    /// All components are finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.rotation.is_finite()
            && self.unconstrained_time.is_finite()
    }
}

/// Look orientation (radians).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LookRotation {
    /// Up/down, clamped to the configured pitch limits.
    pub pitch: f32,

    /// Left/right, normalised to -PI..PI.
    pub yaw: f32,
}

impl LookRotation {
    pub fn new(pitch: f32, yaw: f32) -> Self {
        Self { pitch, yaw }
    }

    /// Horizontal forward direction for this yaw.
    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(cos_yaw, 0.0, sin_yaw)
    }

    /// Horizontal right direction for this yaw.
    pub fn right(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(-sin_yaw, 0.0, cos_yaw)
    }

    /// Body rotation matching this yaw (+X rotated onto [`Self::forward`]).
    pub fn body_rotation(&self) -> Quat {
        Quat::from_rotation_y(-self.yaw)
    }

    /// Add a (yaw, pitch) delta. Yaw wraps to -PI..PI and pitch is clamped.
    pub fn rotated(self, delta: Vec2, min_pitch: f32, max_pitch: f32) -> Self {
        Self {
            pitch: (self.pitch + delta.y).clamp(min_pitch, max_pitch),
            yaw: wrap_angle(self.yaw + delta.x),
        }
    }
}

/// Normalize an angle to -PI..PI.
fn wrap_angle(mut angle: f32) -> f32 {
    while angle > std::f32::consts::PI {
        angle -= std::f32::consts::TAU;
    }
    while angle < -std::f32::consts::PI {
        angle += std::f32::consts::TAU;
    }
    angle
}

/// Gameplay-facing state of the controlled character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PawnState {
    /// Jumps used since last grounded. Never exceeds the configured maximum.
    pub jump_count: u32,

    /// Gravity override set by gravity regions. Equal to the base gravity
    /// when no region applies.
    pub gravity_override: Vec3,

    /// Current look rotation.
    pub look: LookRotation,

    /// Root height the visual layer eases toward.
    pub crouch_height: f32,

    /// Sprint intent from the most recent input.
    pub sprint_intent: bool,

    /// Crouch intent from the most recent applied input.
    pub crouch_intent: bool,
}

impl PawnState {
    /// Fresh pawn state for the given configuration.
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            jump_count: 0,
            gravity_override: config.gravity,
            look: LookRotation::default(),
            crouch_height: config.uncrouched_height,
            sprint_intent: false,
            crouch_intent: false,
        }
    }
}
