//! Vantage Movement Physics
//!
//! A deterministic first-person character movement core, designed for
//! client-side prediction with server reconciliation. Every function that
//! advances state is pure with respect to its explicit arguments, so a tick
//! replayed after a rollback produces exactly what the first execution did.
//!
//! # Architecture
//!
//! - **Movement**: Per-tick input, pawn state (look, jump, crouch, sprint,
//!   gravity override) and the [`MovementStepper`] that turns input into a
//!   desired velocity and hands it to the collision collaborator.
//! - **Collision**: The [`CharacterMotor`] boundary. Collision resolution is
//!   external; [`PlaneWorld`] is a small reference motor for tests and demos.

pub mod collision;
pub mod movement;

// Re-export commonly used types
pub use collision::{CharacterMotor, GroundContact, GroundPlane, MotorRequest, MotorResult, PlaneWorld};
pub use movement::{
    CommandButtons, GroundPhase, InputRecord, LookRotation, MoveIntent, MovementConfig,
    MovementStepper, PawnState, PhysicalState, StepError, StepOutcome, Tick,
};
