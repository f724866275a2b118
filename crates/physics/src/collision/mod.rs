//! Collision collaborator boundary.
//!
//! The movement core does not resolve collisions itself. Each tick the
//! [`MovementStepper`](crate::MovementStepper) computes a velocity and hands
//! it to a [`CharacterMotor`], which integrates position, resolves contacts
//! and reports what the character is standing on.
//!
//! # Key Types
//!
//! - [`CharacterMotor`]: The capability the stepper consumes
//! - [`MotorRequest`] / [`MotorResult`]: One move in, one resolved move out
//! - [`PlaneWorld`]: Reference motor built from infinite planes

mod plane;

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use plane::{GroundPlane, PlaneWorld};

/// One move handed to the collision collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorRequest {
    /// Position before the move.
    pub position: Vec3,
    /// Velocity to integrate (meters/second).
    pub velocity: Vec3,
    /// Up axis (negated active gravity direction).
    pub up: Vec3,
    /// Whether the ground constraint may hold the character down.
    pub constrain_to_ground: bool,
    /// Whether the previous move ended on walkable ground.
    pub was_on_ground: bool,
    /// Time step (seconds).
    pub delta_time: f32,
}

/// Result of a resolved move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorResult {
    /// Position after the move.
    pub position: Vec3,
    /// Velocity after contact resolution.
    pub velocity: Vec3,
    /// Ground was found below the character.
    pub hit_ground: bool,
    /// That ground is walkable.
    pub is_walkable: bool,
    /// Velocity at the moment of landing, zero unless the character landed this move.
    pub landed_velocity: Vec3,
}

/// Ground found by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundContact {
    /// Point on the ground directly below the probe origin.
    pub position: Vec3,
    /// Surface normal.
    pub normal: Vec3,
    /// Whether the surface is walkable for the probe's up axis.
    pub walkable: bool,
}

/// Collision capability consumed by the movement core.
///
/// Implementations must be deterministic: the same request must always
/// produce the same result, or replays will diverge.
pub trait CharacterMotor: Send + Sync {
    /// Integrate and resolve one move.
    fn move_character(&self, request: &MotorRequest) -> MotorResult;

    /// Look for ground along `-up` within `max_distance` of `position`.
    fn find_ground(&self, position: Vec3, up: Vec3, max_distance: f32) -> Option<GroundContact>;
}
