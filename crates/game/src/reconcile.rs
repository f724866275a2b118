//! Reconciliation: overwrite with authoritative state, then replay.

use crate::entity::TickExecution;
use crate::error::SimulationError;
use crate::gravity::{GravityTarget, ReplayContext};
use crate::history::HistoryEntry;
use crate::simulation::{PeerRole, Simulation, TickKind};
use crate::snapshot::ReconciliationSnapshot;

/// What applying a snapshot did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The authority does not reconcile against itself.
    Ignored,
    /// Older than (or the same as) a snapshot already applied.
    Stale,
    /// State overwritten and `replayed` buffered ticks re-simulated.
    Applied { replayed: usize },
}

impl Simulation {
    /// Apply an authoritative snapshot and replay every buffered tick after
    /// it, oldest first.
    ///
    /// Stale and duplicate snapshots are dropped silently. A snapshot ahead
    /// of the local tick is applied without replay.
    pub fn apply_snapshot(&mut self, snapshot: &ReconciliationSnapshot) -> Result<ReconcileOutcome, SimulationError> {
        if self.role() == PeerRole::Server {
            log::debug!("authority ignoring snapshot for entity {}", snapshot.entity);
            return Ok(ReconcileOutcome::Ignored);
        }

        let index = self.index_of(snapshot.entity)?;
        let current = self.current_tick();
        let role = self.role();
        let delta_time = self.config.delta_time();
        let entity = &mut self.entities[index];

        if entity.last_snapshot_tick.is_some_and(|last| snapshot.tick <= last) {
            log::trace!(
                "discarding stale snapshot for entity {} tick {} (applied {:?})",
                entity.id,
                snapshot.tick,
                entity.last_snapshot_tick
            );
            return Ok(ReconcileOutcome::Stale);
        }

        snapshot.apply_to(entity);
        entity.last_snapshot_tick = Some(snapshot.tick);

        let entries: Vec<HistoryEntry> = entity.history.entries_after(snapshot.tick).copied().collect();
        entity.history.discard_up_to(snapshot.tick);
        entity.history.mark_replayed_after(snapshot.tick);

        if snapshot.tick >= current {
            if snapshot.tick > current {
                log::debug!(
                    "snapshot for entity {} tick {} is ahead of local tick {}",
                    entity.id,
                    snapshot.tick,
                    current
                );
            }
            return Ok(ReconcileOutcome::Applied { replayed: 0 });
        }

        log::debug!("replaying entity {} ticks {}..={}", entity.id, snapshot.tick + 1, current);

        let context = ReplayContext::replay(entity.id, snapshot.tick, current);
        let mut events = Vec::new();
        let mut expected = snapshot.tick + 1;
        let mut replayed = 0;

        for entry in &entries {
            if entry.tick != expected {
                log::warn!(
                    "input history gap for entity {}: expected tick {}, found {}",
                    entity.id,
                    expected,
                    entry.tick
                );
            }
            expected = entry.tick + 1;

            let execution = TickExecution {
                tick: entry.tick,
                kind: if entry.fresh {
                    TickKind::ReplayedCreated
                } else {
                    TickKind::Replayed
                },
                role,
                delta_time,
                pinned_look: entity.is_controlled().then_some(entry.look),
                context,
            };

            if let Err(source) = entity.execute(&entry.input, &execution, &self.stepper, &mut self.volumes, &mut events) {
                log::error!("entity {} failed replaying tick {}: {}", entity.id, entry.tick, source);
                break;
            }
            replayed += 1;
        }

        log::debug!("replayed {} ticks for entity {}", replayed, entity.id);

        if let Some(gravity) = self.volumes.take_deferred(entity.id) {
            log::debug!("applying gravity {} deferred during replay of entity {}", gravity, entity.id);
            entity.set_gravity(gravity, &ReplayContext::live());
        }

        self.dispatch(&events);
        Ok(ReconcileOutcome::Applied { replayed })
    }
}
