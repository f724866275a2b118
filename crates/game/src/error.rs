//! Simulation errors.

use thiserror::Error;
use vantage_physics::{StepError, Tick};

use crate::entity::EntityId;

/// Errors surfaced by the predicted simulation.
///
/// Stale snapshots and missing input are expected under unreliable delivery
/// and are never reported through this type.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("entity is missing a required component: {component}")]
    MissingCollaborator { component: &'static str },

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("entity {0} already exists")]
    DuplicateEntity(EntityId),

    #[error("entity {entity} failed to step tick {tick}: {source}")]
    Step {
        entity: EntityId,
        tick: Tick,
        #[source]
        source: StepError,
    },
}
