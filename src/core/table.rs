//! # Unit table.
//!
//! Generational arena holding one [`UnitRecord`] per registered unit. A
//! [`UnitKey`] names a slot *and* the registration that filled it, so a key
//! held by an outstanding update stops resolving once its unit is
//! unregistered, even if the slot is reused by a later registration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::recovery::Health;
use crate::tracker::ErrorHistory;
use crate::units::{UnitRef, UnitSpec};

/// Stable handle to one registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct UnitKey {
    index: u32,
    generation: u32,
}

/// Lifetime counters of one registration.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Counters {
    pub updates_succeeded: u64,
    pub updates_failed: u64,
    pub errors_recorded: u64,
    pub recoveries_succeeded: u64,
    pub recoveries_failed: u64,
}

/// Everything the dashboard knows about one unit.
pub(crate) struct UnitRecord {
    pub id: Arc<str>,
    pub unit: UnitRef,
    pub interval: Duration,
    pub priority: i32,
    pub visible: bool,
    /// Registration order, the last scheduling tie-breaker.
    pub seq: u64,
    pub last_run_at: Option<Instant>,
    /// Next update while active, next recovery attempt while isolated.
    pub next_due_at: Instant,
    pub in_flight: bool,
    /// Bumped on every isolation; an update started under an older epoch is
    /// stale and its result is dropped.
    pub epoch: u32,
    /// One verification update is owed after recovery, visible or not.
    pub verification_pending: bool,
    pub errors: ErrorHistory,
    pub health: Health,
    pub counters: Counters,
}

impl UnitRecord {
    /// Fresh active record, due at `now`.
    pub fn new(spec: UnitSpec, seq: u64, now: Instant) -> Self {
        Self {
            id: spec.shared_id(),
            unit: Arc::clone(spec.unit()),
            interval: spec.interval(),
            priority: spec.priority(),
            visible: spec.visible(),
            seq,
            last_run_at: None,
            next_due_at: now,
            in_flight: false,
            epoch: 0,
            verification_pending: false,
            errors: ErrorHistory::default(),
            health: Health::Active,
            counters: Counters::default(),
        }
    }

    /// True if the scheduler may dispatch an update for this unit at `now`.
    pub fn is_dispatchable(&self, now: Instant) -> bool {
        self.health.is_active()
            && !self.in_flight
            && (self.visible || self.verification_pending)
            && self.next_due_at <= now
    }

    /// True if a recovery attempt for this unit is due at `now`.
    pub fn is_recovery_due(&self, now: Instant) -> bool {
        matches!(self.health, Health::Isolated(_)) && self.next_due_at <= now
    }
}

struct Slot {
    generation: u32,
    record: Option<UnitRecord>,
}

/// Arena of unit records with an id index.
#[derive(Default)]
pub(crate) struct UnitTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_id: HashMap<Arc<str>, UnitKey>,
    next_seq: u64,
}

impl UnitTable {
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Inserts a record built from the next registration sequence number.
    /// The caller checks for duplicates first.
    pub fn insert(&mut self, make: impl FnOnce(u64) -> UnitRecord) -> UnitKey {
        let seq = self.next_seq;
        self.next_seq += 1;
        let record = make(seq);
        let id = Arc::clone(&record.id);

        let key = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.record = Some(record);
                UnitKey {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    record: Some(record),
                });
                UnitKey {
                    index,
                    generation: 0,
                }
            }
        };
        self.by_id.insert(id, key);
        key
    }

    /// Removes a unit by id, invalidating its key.
    pub fn remove(&mut self, id: &str) -> Option<UnitRecord> {
        let key = self.by_id.remove(id)?;
        let slot = self.slots.get_mut(key.index as usize)?;
        let record = slot.record.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        record
    }

    pub fn key_of(&self, id: &str) -> Option<UnitKey> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, key: UnitKey) -> Option<&UnitRecord> {
        self.slots
            .get(key.index as usize)
            .filter(|s| s.generation == key.generation)
            .and_then(|s| s.record.as_ref())
    }

    pub fn get_mut(&mut self, key: UnitKey) -> Option<&mut UnitRecord> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|s| s.generation == key.generation)
            .and_then(|s| s.record.as_mut())
    }

    pub fn by_id(&self, id: &str) -> Option<&UnitRecord> {
        self.key_of(id).and_then(|k| self.get(k))
    }

    pub fn by_id_mut(&mut self, id: &str) -> Option<&mut UnitRecord> {
        let key = self.key_of(id)?;
        self.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitKey, &UnitRecord)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.record.as_ref().map(|r| {
                (
                    UnitKey {
                        index: i as u32,
                        generation: s.generation,
                    },
                    r,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut UnitRecord> {
        self.slots.iter_mut().filter_map(|s| s.record.as_mut())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpdateError;
    use crate::units::UnitFn;

    fn spec(id: &str) -> UnitSpec {
        UnitSpec::new(
            id,
            UnitFn::arc(|| async { Ok::<_, UpdateError>(()) }),
            Duration::from_secs(1),
            0,
        )
    }

    #[test]
    fn stale_key_does_not_resolve_after_reuse() {
        let now = Instant::now();
        let mut table = UnitTable::default();
        let a = table.insert(|seq| UnitRecord::new(spec("a"), seq, now));
        assert!(table.remove("a").is_some());
        assert!(table.get(a).is_none());

        let b = table.insert(|seq| UnitRecord::new(spec("b"), seq, now));
        assert_eq!(a.index, b.index);
        assert!(table.get(a).is_none());
        assert_eq!(table.get(b).map(|r| &*r.id), Some("b"));
    }

    #[test]
    fn sequence_follows_registration_order() {
        let now = Instant::now();
        let mut table = UnitTable::default();
        table.insert(|seq| UnitRecord::new(spec("a"), seq, now));
        table.insert(|seq| UnitRecord::new(spec("b"), seq, now));
        table.remove("a");
        table.insert(|seq| UnitRecord::new(spec("c"), seq, now));

        let seqs: Vec<_> = ["b", "c"]
            .iter()
            .map(|id| table.by_id(id).map(|r| r.seq))
            .collect();
        assert_eq!(seqs, vec![Some(1), Some(2)]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn hidden_units_are_not_dispatchable_unless_verifying() {
        let now = Instant::now();
        let mut rec = UnitRecord::new(spec("a").with_visible(false), 0, now);
        assert!(!rec.is_dispatchable(now));
        rec.verification_pending = true;
        assert!(rec.is_dispatchable(now));
        rec.in_flight = true;
        assert!(!rec.is_dispatchable(now));
    }
}
