//! Vantage Predicted Simulation
//!
//! This crate contains the tick-driven side of the movement core:
//!
//! - Input sampling on the controlling peer
//! - The entity aggregate and its input history
//! - The predicted simulation loop run by every peer
//! - Reconciliation against authoritative snapshots with rollback and replay
//! - Gravity regions, movement events and the tick clock
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ InputRecord ┌────────────────────────┐ Snapshot ┌──────────────────┐
//! │ InputSampler │────────────►│ Simulation::tick       │─────────►│ apply_snapshot   │
//! │ (controller) │             │ (every peer, fixed dt) │          │ (overwrite +     │
//! └──────────────┘             └───────────┬────────────┘          │  replay history) │
//!                                          │ events                └──────────────────┘
//!                                          ▼
//!                                  MovementListener
//! ```
//!
//! Every state transition happens synchronously inside a tick or a replay.
//! The visual layer only reads [`RenderTargets`].

pub mod clock;
pub mod entity;
pub mod error;
pub mod events;
pub mod gravity;
pub mod history;
pub mod input;
pub mod reconcile;
pub mod simulation;
pub mod snapshot;

// Re-export main types
pub use clock::{SubscriberId, TickClock, TickListener};
pub use entity::{Entity, EntityBuilder, EntityId, RenderTargets};
pub use error::SimulationError;
pub use events::{LandingEvent, LandingTracker, MovementEvent, MovementListener, RecordedLanding};
pub use gravity::{GravityTarget, GravityVolumeBridge, ReplayContext, Volume, VolumeKind};
pub use history::{HistoryEntry, InputHistory};
pub use input::{FrameInput, InputSampler, LookSettings};
pub use reconcile::ReconcileOutcome;
pub use simulation::{MissingInputPolicy, Outgoing, PeerRole, Simulation, SimulationConfig, TickKind, TickReport};
pub use snapshot::ReconciliationSnapshot;

// Re-export physics types for convenience
pub use vantage_physics::{
    CharacterMotor, CommandButtons, GroundPhase, InputRecord, LookRotation, MovementConfig, PawnState,
    PhysicalState, PlaneWorld, Tick,
};
