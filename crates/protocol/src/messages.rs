//! Network message types.
//!
//! Inputs flow from the controlling peer to the authority, snapshots from
//! the authority to every peer. Both are tagged with their tick and tolerate
//! loss, duplication and reordering, so every message goes over an
//! unreliable channel.

use serde::{Deserialize, Serialize};
use vantage_game::{EntityId, Outgoing, ReconcileOutcome, ReconciliationSnapshot, Simulation, SimulationError};
use vantage_physics::{InputRecord, Tick};

/// All possible messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NetMessage {
    /// Input for a single tick.
    Input(InputMessage),

    /// Several recent inputs, sent together for loss tolerance.
    InputBatch(InputBatchMessage),

    /// Authoritative state for one entity at one tick.
    Reconcile(ReconciliationSnapshot),
}

/// Input for a single tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMessage {
    pub entity: EntityId,
    pub input: InputRecord,
}

/// Batch of inputs for consecutive ticks, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBatchMessage {
    pub entity: EntityId,
    pub inputs: Vec<InputRecord>,
}

/// What delivering a message to a simulation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Number of input records accepted (duplicates and late ones are not).
    Inputs { accepted: usize },
    Reconciled(ReconcileOutcome),
}

impl NetMessage {
    /// Most recent tick the message carries.
    pub fn tick(&self) -> Option<Tick> {
        match self {
            NetMessage::Input(message) => Some(message.input.tick),
            NetMessage::InputBatch(message) => message.inputs.iter().map(|input| input.tick).max(),
            NetMessage::Reconcile(snapshot) => Some(snapshot.tick),
        }
    }

    pub fn entity(&self) -> EntityId {
        match self {
            NetMessage::Input(message) => message.entity,
            NetMessage::InputBatch(message) => message.entity,
            NetMessage::Reconcile(snapshot) => snapshot.entity,
        }
    }

    /// Hand the message to a simulation.
    pub fn deliver(&self, simulation: &mut Simulation) -> Result<Delivery, SimulationError> {
        match self {
            NetMessage::Input(message) => {
                let accepted = simulation.receive_input(message.entity, message.input)?;
                Ok(Delivery::Inputs {
                    accepted: usize::from(accepted),
                })
            }
            NetMessage::InputBatch(message) => {
                let mut accepted = 0;
                for input in &message.inputs {
                    if simulation.receive_input(message.entity, *input)? {
                        accepted += 1;
                    }
                }
                Ok(Delivery::Inputs { accepted })
            }
            NetMessage::Reconcile(snapshot) => Ok(Delivery::Reconciled(simulation.apply_snapshot(snapshot)?)),
        }
    }
}

impl From<Outgoing> for NetMessage {
    fn from(outgoing: Outgoing) -> Self {
        match outgoing {
            Outgoing::Inputs { entity, mut records } if records.len() == 1 => NetMessage::Input(InputMessage {
                entity,
                input: records.remove(0),
            }),
            Outgoing::Inputs { entity, records } => NetMessage::InputBatch(InputBatchMessage {
                entity,
                inputs: records,
            }),
            Outgoing::Snapshot(snapshot) => NetMessage::Reconcile(snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use glam::{Vec2, Vec3};
    use vantage_game::SimulationConfig;
    use vantage_physics::{CommandButtons, PlaneWorld};

    fn forward(tick: Tick) -> InputRecord {
        InputRecord::new(0.0, 1.0, CommandButtons::default(), Vec2::ZERO).with_tick(tick)
    }

    fn server() -> Simulation {
        let mut sim = Simulation::server(SimulationConfig::default());
        sim.spawn_entity(1, false, Arc::new(PlaneWorld::flat(0.0)), Vec3::ZERO)
            .unwrap();
        sim
    }

    #[test]
    fn test_batch_delivery_skips_duplicates() {
        let mut sim = server();
        let first = NetMessage::InputBatch(InputBatchMessage {
            entity: 1,
            inputs: vec![forward(1), forward(2), forward(3)],
        });
        let overlapping = NetMessage::InputBatch(InputBatchMessage {
            entity: 1,
            inputs: vec![forward(2), forward(3), forward(4)],
        });

        assert_eq!(first.deliver(&mut sim).unwrap(), Delivery::Inputs { accepted: 3 });
        assert_eq!(overlapping.deliver(&mut sim).unwrap(), Delivery::Inputs { accepted: 1 });
        assert_eq!(overlapping.tick(), Some(4));
    }

    #[test]
    fn test_from_outgoing() {
        let single = NetMessage::from(Outgoing::Inputs {
            entity: 4,
            records: vec![forward(9)],
        });
        assert!(matches!(single, NetMessage::Input(ref message) if message.input.tick == 9));

        let batch = NetMessage::from(Outgoing::Inputs {
            entity: 4,
            records: vec![forward(8), forward(9)],
        });
        assert!(matches!(batch, NetMessage::InputBatch(ref message) if message.inputs.len() == 2));
        assert_eq!(batch.entity(), 4);
    }

    #[test]
    fn test_snapshot_round_trip_through_simulations() {
        let mut server = server();
        let mut client = Simulation::client(SimulationConfig::default());
        client
            .spawn_entity(1, true, Arc::new(PlaneWorld::flat(0.0)), Vec3::ZERO)
            .unwrap();

        for tick in 1..=5 {
            client.tick(&[(1, forward(tick))]);
            for outgoing in client.drain_outgoing() {
                NetMessage::from(outgoing).deliver(&mut server).unwrap();
            }
            server.tick(&[]);
        }

        let snapshots: Vec<NetMessage> = server.drain_outgoing().into_iter().map(NetMessage::from).collect();
        let last = snapshots.last().unwrap();
        assert_eq!(last.tick(), Some(5));

        let delivery = last.deliver(&mut client).unwrap();
        assert_eq!(delivery, Delivery::Reconciled(ReconcileOutcome::Applied { replayed: 0 }));
        // Both sides ran the same inputs
        assert_eq!(
            client.entity(1).unwrap().physical,
            server.entity(1).unwrap().physical
        );

        // Re-delivery is stale
        assert_eq!(last.deliver(&mut client).unwrap(), Delivery::Reconciled(ReconcileOutcome::Stale));
    }

    #[test]
    fn test_unknown_entity_is_an_error() {
        let mut sim = server();
        let message = NetMessage::Input(InputMessage {
            entity: 99,
            input: forward(1),
        });
        assert!(matches!(message.deliver(&mut sim), Err(SimulationError::UnknownEntity(99))));
    }
}
