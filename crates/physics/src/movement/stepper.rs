//! Movement stepper.
//!
//! This is the per-tick movement entry point. It turns input axes into a
//! desired velocity, applies the grounded or airborne acceleration model and
//! gravity, and delegates integration and contact resolution to the
//! collision collaborator.

use glam::Vec3;
use thiserror::Error;

use crate::collision::{CharacterMotor, MotorRequest};

use super::config::MovementConfig;
use super::jump::up_axis;
use super::pawn::MoveIntent;
use super::state::PhysicalState;

/// Speed below which braking stops the character completely (meters/second).
const STOP_SPEED: f32 = 0.01;

/// Errors a single step can produce.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("invalid delta time: {0}")]
    InvalidDeltaTime(f32),

    #[error("movement produced a non-finite state (position {position}, velocity {velocity})")]
    NonFiniteState { position: Vec3, velocity: Vec3 },
}

/// Result of one movement step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// State after the step.
    pub state: PhysicalState,
    /// Velocity at landing, zero unless the character landed this step.
    pub landed_velocity: Vec3,
}

impl StepOutcome {
    pub fn landed(&self) -> bool {
        self.landed_velocity != Vec3::ZERO
    }
}

/// Movement stepper.
///
/// Holds only configuration; all state comes in through [`Self::step`].
///
/// # Example
///
/// ```ignore
/// let stepper = MovementStepper::new(MovementConfig::default());
/// let intent = pawn.move_intent(input.horizontal, input.vertical, &stepper.config);
/// let outcome = stepper.step(&physical, &intent, pawn.active_gravity(&stepper.config), dt, &world)?;
/// physical = outcome.state;
/// ```
#[derive(Debug, Clone)]
pub struct MovementStepper {
    /// Movement configuration.
    pub config: MovementConfig,
}

impl MovementStepper {
    /// Create a new stepper with the given configuration.
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    /// Create a stepper with default configuration.
    pub fn with_default_config() -> Self {
        Self::new(MovementConfig::default())
    }

    /// Place a character on the ground below a spawn point.
    ///
    /// Probes from slightly above the spawn point along the base gravity. When
    /// no ground is found the spawn point is used as-is. Returns whether
    /// ground was found.
    pub fn spawn_at(&self, state: &mut PhysicalState, spawn_pos: Vec3, motor: &dyn CharacterMotor) -> bool {
        let up = up_axis(self.config.gravity);

        match motor.find_ground(spawn_pos + up, up, 3.0) {
            Some(contact) => {
                state.position = contact.position;
                state.hit_ground = true;
                state.is_walkable = contact.walkable;
                true
            }
            None => {
                state.position = spawn_pos;
                state.hit_ground = false;
                state.is_walkable = false;
                false
            }
        }
    }

    /// Advance movement by one tick.
    ///
    /// The grounded/walkable flags in `state` come from the previous tick's
    /// move and select this tick's regime.
    ///
    /// # Arguments
    ///
    /// * `state` - Physical state at the start of the tick
    /// * `intent` - Axes, look basis and stance for this tick
    /// * `gravity` - Active gravity vector
    /// * `delta_time` - Time step in seconds
    /// * `motor` - Collision collaborator
    pub fn step(
        &self,
        state: &PhysicalState,
        intent: &MoveIntent,
        gravity: Vec3,
        delta_time: f32,
        motor: &dyn CharacterMotor,
    ) -> Result<StepOutcome, StepError> {
        if !delta_time.is_finite() || delta_time <= 0.0 {
            return Err(StepError::InvalidDeltaTime(delta_time));
        }
        if delta_time > self.config.max_delta_time {
            log::trace!(
                "clamping step delta {:.4}s to {:.4}s",
                delta_time,
                self.config.max_delta_time
            );
        }
        let delta_time = delta_time.min(self.config.max_delta_time);

        let up = up_axis(gravity);
        let grounded = state.is_grounded();

        let mut next = *state;
        next.rotation = intent.look.body_rotation();

        // Split velocity into the part along up and the planar part
        let vertical = up * state.velocity.dot(up);
        let planar = state.velocity - vertical;

        let desired = self.desired_velocity(intent, up);
        let planar = if grounded {
            self.compute_velocity(
                planar,
                desired,
                self.config.acceleration,
                self.config.deceleration,
                self.config.ground_friction,
                delta_time,
            )
        } else {
            // No active braking in the air
            self.compute_velocity(
                planar,
                desired,
                self.config.acceleration * self.config.air_control,
                0.0,
                self.config.air_friction,
                delta_time,
            )
        };

        let velocity = if grounded {
            planar
        } else {
            planar + vertical + gravity * delta_time
        };

        next.advance_ground_constraint(self.config.ground_constraint_pause, delta_time);

        let result = motor.move_character(&MotorRequest {
            position: state.position,
            velocity,
            up,
            constrain_to_ground: next.constrained_to_ground,
            was_on_ground: state.on_walkable_ground(),
            delta_time,
        });

        next.position = result.position;
        next.velocity = result.velocity;
        next.hit_ground = result.hit_ground;
        next.is_walkable = result.is_walkable;

        if !next.is_finite() || !result.landed_velocity.is_finite() {
            return Err(StepError::NonFiniteState {
                position: next.position,
                velocity: next.velocity,
            });
        }

        Ok(StepOutcome {
            state: next,
            landed_velocity: result.landed_velocity,
        })
    }

    /// Desired planar velocity from input axes in the look basis.
    ///
    /// The input vector is clamped to unit length before scaling by the
    /// speed cap, so diagonals are not faster.
    pub fn desired_velocity(&self, intent: &MoveIntent, up: Vec3) -> Vec3 {
        let forward = intent.look.forward().reject_from(up).normalize_or_zero();
        let right = intent.look.right().reject_from(up).normalize_or_zero();

        let direction = (right * intent.horizontal + forward * intent.vertical).clamp_length_max(1.0);
        let max_speed = self.config.max_speed(intent.crouched, intent.sprinting);

        direction * max_speed
    }

    // ========================================================================
    // Velocity Model
    // ========================================================================

    fn compute_velocity(
        &self,
        velocity: Vec3,
        desired: Vec3,
        acceleration: f32,
        deceleration: f32,
        friction: f32,
        delta_time: f32,
    ) -> Vec3 {
        let desired_speed = desired.length();

        // No input: brake
        if desired_speed < 1e-4 {
            return brake(velocity, friction, deceleration, delta_time);
        }

        let direction = desired / desired_speed;
        let mut velocity = velocity;

        // Over the cap (sprint released, external push): shed the excess
        // but never below the cap
        let over_cap = velocity.length() > desired_speed;
        if over_cap {
            let braked = brake(velocity, friction, deceleration, delta_time);
            velocity = if braked.length() < desired_speed {
                braked.normalize_or_zero() * desired_speed
            } else {
                braked
            };
        }

        // Friction bends the velocity toward the input direction
        let speed = velocity.length();
        velocity -= (velocity - direction * speed) * (friction * delta_time).min(1.0);

        // Accelerate
        velocity += direction * (acceleration * delta_time);

        let cap = if over_cap { speed } else { desired_speed };
        velocity.clamp_length_max(cap)
    }
}

fn brake(velocity: Vec3, friction: f32, deceleration: f32, delta_time: f32) -> Vec3 {
    let speed = velocity.length();
    if speed < STOP_SPEED {
        return Vec3::ZERO;
    }

    let drop = (friction * speed + deceleration) * delta_time;
    let new_speed = (speed - drop).max(0.0);
    if new_speed < STOP_SPEED {
        return Vec3::ZERO;
    }

    velocity * (new_speed / speed)
}

// ============================================================================
// Tests
// ============================================================================
