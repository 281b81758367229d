//! # Dispatch selection.
//!
//! Pure functions over the [`UnitTable`] deciding what runs on a tick:
//!
//! - [`due_recoveries`] isolated units whose attempt time has come, oldest first;
//! - [`select_due`] active units to update, in dispatch order, at most `budget`.
//!
//! ## Dispatch order
//! 1. priority, descending
//! 2. `next_due_at`, ascending (most overdue first)
//! 3. registration order
//!
//! Units not selected stay due and are reconsidered on the next tick.

use std::cmp::Reverse;

use tokio::time::Instant;

use crate::core::table::{UnitKey, UnitTable};

/// Units to update at `now`, in dispatch order, truncated to `budget`.
pub(crate) fn select_due(table: &UnitTable, now: Instant, budget: usize) -> Vec<UnitKey> {
    if budget == 0 {
        return Vec::new();
    }
    let mut due: Vec<_> = table
        .iter()
        .filter(|(_, r)| r.is_dispatchable(now))
        .map(|(k, r)| (Reverse(r.priority), r.next_due_at, r.seq, k))
        .collect();
    due.sort_unstable_by_key(|&(p, at, seq, _)| (p, at, seq));
    due.into_iter().take(budget).map(|(.., k)| k).collect()
}

/// Isolated units whose next recovery attempt is due, oldest timer first.
pub(crate) fn due_recoveries(table: &UnitTable, now: Instant) -> Vec<UnitKey> {
    let mut due: Vec<_> = table
        .iter()
        .filter(|(_, r)| r.is_recovery_due(now))
        .map(|(k, r)| (r.next_due_at, r.seq, k))
        .collect();
    due.sort_unstable_by_key(|&(at, seq, _)| (at, seq));
    due.into_iter().map(|(.., k)| k).collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::table::UnitRecord;
    use crate::error::UpdateError;
    use crate::units::{UnitFn, UnitSpec};

    fn add(table: &mut UnitTable, id: &str, priority: i32, due: Instant) {
        let spec = UnitSpec::new(
            id,
            UnitFn::arc(|| async { Ok::<_, UpdateError>(()) }),
            Duration::from_secs(1),
            priority,
        );
        table.insert(|seq| {
            let mut rec = UnitRecord::new(spec, seq, due);
            rec.next_due_at = due;
            rec
        });
    }

    fn ids(table: &UnitTable, keys: &[UnitKey]) -> Vec<String> {
        keys.iter()
            .filter_map(|k| table.get(*k))
            .map(|r| r.id.to_string())
            .collect()
    }

    #[test]
    fn orders_by_priority_then_overdue_then_registration() {
        let now = Instant::now();
        let mut table = UnitTable::default();
        add(&mut table, "low", 1, now - Duration::from_secs(5));
        add(&mut table, "high-late", 9, now);
        add(&mut table, "high-early", 9, now - Duration::from_secs(1));
        add(&mut table, "mid-a", 5, now);
        add(&mut table, "mid-b", 5, now);
        add(&mut table, "future", 100, now + Duration::from_secs(1));

        let picked = select_due(&table, now, 10);
        assert_eq!(
            ids(&table, &picked),
            ["high-early", "high-late", "mid-a", "mid-b", "low"]
        );
    }

    #[test]
    fn budget_truncates() {
        let now = Instant::now();
        let mut table = UnitTable::default();
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            add(&mut table, id, i as i32, now);
        }
        assert_eq!(ids(&table, &select_due(&table, now, 2)), ["c", "b"]);
        assert!(select_due(&table, now, 0).is_empty());
    }
}
