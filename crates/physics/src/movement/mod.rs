//! Player movement physics system.
//!
//! This module implements the movement half of a predicted FPS character:
//!
//! - Grounded and airborne regimes with different acceleration and friction
//! - Jumping with a bounded jump count (double jump by default)
//! - Crouch and sprint intents with crouch taking priority
//! - A pausable ground constraint and an overridable gravity vector
//!
//! # Design
//!
//! [`MovementStepper::step`] takes the current [`PhysicalState`], a
//! [`MoveIntent`], the active gravity and the tick delta and returns the next
//! state. It never mutates anything it was not handed. The one-shot side
//! effects that must survive rollback (the jump count) live on
//! [`PawnState`] and are guarded by an explicit replay flag.

mod config;
mod input;
mod jump;
mod pawn;
mod state;
mod stepper;

pub use config::MovementConfig;
pub use input::{CommandButtons, InputRecord, Tick};
pub use jump::GroundPhase;
pub use pawn::MoveIntent;
pub use state::{LookRotation, PawnState, PhysicalState};
pub use stepper::{MovementStepper, StepError, StepOutcome};
