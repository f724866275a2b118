//! Movement configuration constants.
//!
//! All movement parameters are grouped here for easy tuning. Units are
//! metric (meters, seconds) and angles are radians.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Configuration for character movement physics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementConfig {
    // ========================================================================
    // Movement Speeds
    // ========================================================================
    /// Walking speed cap (meters/second).
    pub max_speed_walking: f32,

    /// Sprinting speed cap (meters/second).
    pub max_speed_sprinting: f32,

    /// Crouched speed cap (meters/second).
    pub max_speed_crouched: f32,

    // ========================================================================
    // Acceleration and Friction
    // ========================================================================
    /// Grounded acceleration (meters/second²).
    pub acceleration: f32,

    /// Grounded braking deceleration when there is no input (meters/second²).
    /// Airborne deceleration is always zero.
    pub deceleration: f32,

    /// Grounded friction coefficient.
    pub ground_friction: f32,

    /// Airborne friction coefficient.
    pub air_friction: f32,

    /// Fraction of grounded acceleration available while airborne (0.0..=1.0).
    pub air_control: f32,

    // ========================================================================
    // Gravity and Jumping
    // ========================================================================
    /// Base gravity vector (meters/second²). Gravity regions may override it.
    pub gravity: Vec3,

    /// Whether the character may ever jump.
    pub can_jump_ever: bool,

    /// Jumps allowed before touching the ground again.
    pub max_jump_count: u32,

    /// Minimum speed along the up axis right after a jump (meters/second).
    pub jump_impulse: f32,

    /// How long the ground constraint stays paused after a jump or a
    /// gravity change (seconds).
    pub ground_constraint_pause: f32,

    // ========================================================================
    // Stance
    // ========================================================================
    /// Whether the character may ever sprint.
    pub can_sprint_ever: bool,

    /// Whether the character may ever crouch.
    pub can_crouch_ever: bool,

    /// Root (eye pivot) height while standing (meters).
    pub uncrouched_height: f32,

    /// Root (eye pivot) height while crouched (meters).
    pub crouched_height: f32,

    // ========================================================================
    // Look
    // ========================================================================
    /// Lowest allowed pitch (radians).
    pub min_pitch: f32,

    /// Highest allowed pitch (radians).
    pub max_pitch: f32,

    // ========================================================================
    // Integration
    // ========================================================================
    /// Largest delta time a single step will integrate (seconds).
    pub max_delta_time: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            // Speeds
            max_speed_walking: 5.0,
            max_speed_sprinting: 8.0,
            max_speed_crouched: 3.0,

            // Acceleration and friction
            acceleration: 20.0,
            deceleration: 20.0,
            ground_friction: 8.0,
            air_friction: 0.5,
            air_control: 0.3,

            // Gravity and jumping
            gravity: Vec3::new(0.0, -9.81, 0.0),
            can_jump_ever: true,
            max_jump_count: 2,
            jump_impulse: 6.5,
            ground_constraint_pause: 0.1,

            // Stance
            can_sprint_ever: true,
            can_crouch_ever: true,
            uncrouched_height: 1.5,
            crouched_height: 1.0,

            // Look (±80 degrees)
            min_pitch: (-80.0f32).to_radians(),
            max_pitch: 80.0f32.to_radians(),

            max_delta_time: 0.1,
        }
    }
}

impl MovementConfig {
    /// Create a "fast arcade" movement config.
    pub fn arcade() -> Self {
        Self {
            max_speed_walking: 7.0,
            max_speed_sprinting: 11.0,
            max_speed_crouched: 4.0,
            acceleration: 35.0,
            air_control: 0.6,
            jump_impulse: 7.5,
            max_jump_count: 3,
            ..Default::default()
        }
    }

    /// Create a "tactical" movement config (slower, single jump).
    pub fn tactical() -> Self {
        Self {
            max_speed_walking: 3.5,
            max_speed_sprinting: 5.5,
            max_speed_crouched: 1.5,
            acceleration: 14.0,
            ground_friction: 10.0,
            air_control: 0.1,
            jump_impulse: 4.5,
            max_jump_count: 1,
            ..Default::default()
        }
    }

    /// Get the speed cap for the given intents. Crouching overrides sprinting.
    pub fn max_speed(&self, is_crouched: bool, is_sprinting: bool) -> f32 {
        if is_crouched {
            self.max_speed_crouched
        } else if is_sprinting {
            self.max_speed_sprinting
        } else {
            self.max_speed_walking
        }
    }

    /// Get the root height target for the given crouch state.
    pub fn root_height(&self, is_crouched: bool) -> f32 {
        if is_crouched {
            self.crouched_height
        } else {
            self.uncrouched_height
        }
    }
}
