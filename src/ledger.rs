//! Ordered ledger engine.
//!
//! Every list keeps its item priorities as a dense run `1..=N`. Each mutation
//! is planned as at most one [`Shift`] of a contiguous priority range followed
//! by a single row write, and runs inside the caller's immediate transaction,
//! so the run is never observed with a gap or a duplicate.

use crate::storage;
use crate::types::{Item, ItemId, ListId, Status};
use chrono::{DateTime, Utc};
use eyre::Result;
use rusqlite::{Connection, params};

/// Uniform adjustment of every priority in `from..=to` (open-ended when `to`
/// is `None`) by `delta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub from: i64,
    pub to: Option<i64>,
    pub delta: i64,
}

/// Priority an inserted item ends up at, given the current maximum.
/// Omitted means tail; anything else is clamped to `[1, max + 1]`.
pub fn resolve_insert_priority(requested: Option<i64>, max: i64) -> i64 {
    let tail = max + 1;
    match requested {
        None => tail,
        Some(p) => p.clamp(1, tail),
    }
}

/// Priority a moved item ends up at. Moves stay within the occupied range
/// `[1, max]`; appending is an insert.
pub fn resolve_move_priority(requested: i64, max: i64) -> i64 {
    requested.clamp(1, max.max(1))
}

/// Opening a gap at `target` for an insert.
pub fn plan_insert(target: i64) -> Shift {
    Shift {
        from: target,
        to: None,
        delta: 1,
    }
}

/// Closing the gap left behind by deleting the item at `removed`.
pub fn plan_delete(removed: i64) -> Shift {
    Shift {
        from: removed + 1,
        to: None,
        delta: -1,
    }
}

/// Shift of the neighbours when an item travels from `current` to `target`.
/// `None` when nothing else has to move.
pub fn plan_move(current: i64, target: i64) -> Option<Shift> {
    if target < current {
        Some(Shift {
            from: target,
            to: Some(current - 1),
            delta: 1,
        })
    } else if target > current {
        Some(Shift {
            from: current + 1,
            to: Some(target),
            delta: -1,
        })
    } else {
        None
    }
}

/// Apply a shift to one list. Returns the number of rows touched.
fn apply_shift(conn: &Connection, list_id: ListId, shift: Shift) -> Result<usize> {
    log::debug!("list {}: shift {:?}", list_id, shift);
    let changed = conn.execute(
        r#"
        UPDATE items SET priority = priority + ?1
        WHERE list_id = ?2 AND priority >= ?3 AND (?4 IS NULL OR priority <= ?4)
        "#,
        params![shift.delta, list_id, shift.from, shift.to],
    )?;
    Ok(changed)
}

/// Insert a new item, opening a gap at its resolved priority.
pub(crate) fn insert(
    conn: &Connection,
    list_id: ListId,
    name: &str,
    status: Status,
    requested: Option<i64>,
    now: DateTime<Utc>,
) -> Result<Item> {
    let max = storage::max_priority(conn, list_id)?;
    let priority = resolve_insert_priority(requested, max);

    if priority <= max {
        apply_shift(conn, list_id, plan_insert(priority))?;
    }

    conn.execute(
        "INSERT INTO items (list_id, name, priority, status, created_at) VALUES (?, ?, ?, ?, ?)",
        params![list_id, name, priority, status.as_str(), now.to_rfc3339()],
    )?;

    Ok(Item {
        id: conn.last_insert_rowid(),
        list_id,
        name: name.to_string(),
        priority,
        status,
        created_at: now,
    })
}

/// Move an item to a new priority. `Ok(None)` if the item is not in the list.
pub(crate) fn move_item(conn: &Connection, list_id: ListId, item_id: ItemId, requested: i64) -> Result<Option<Item>> {
    let Some(item) = storage::get_item(conn, list_id, item_id)? else {
        return Ok(None);
    };

    let max = storage::max_priority(conn, list_id)?;
    let target = resolve_move_priority(requested, max);

    let Some(shift) = plan_move(item.priority, target) else {
        return Ok(Some(item));
    };

    apply_shift(conn, list_id, shift)?;
    conn.execute(
        "UPDATE items SET priority = ? WHERE list_id = ? AND id = ?",
        params![target, list_id, item_id],
    )?;

    Ok(Some(Item {
        priority: target,
        ..item
    }))
}

/// Delete an item and close the gap. `Ok(None)` if the item is not in the list.
pub(crate) fn delete(conn: &Connection, list_id: ListId, item_id: ItemId) -> Result<Option<Item>> {
    let Some(item) = storage::get_item(conn, list_id, item_id)? else {
        return Ok(None);
    };

    conn.execute(
        "DELETE FROM items WHERE list_id = ? AND id = ?",
        params![list_id, item_id],
    )?;
    apply_shift(conn, list_id, plan_delete(item.priority))?;

    Ok(Some(item))
}

/// Result of checking one list against the density invariant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DensityReport {
    pub count: i64,
    /// Priorities in `1..=count` that no item holds.
    pub missing: Vec<i64>,
    /// Priorities held by more than one item.
    pub duplicated: Vec<i64>,
    /// Priorities outside `1..=count`.
    pub out_of_range: Vec<i64>,
}

impl DensityReport {
    pub fn is_dense(&self) -> bool {
        self.missing.is_empty() && self.duplicated.is_empty() && self.out_of_range.is_empty()
    }
}

/// Build a density report from priorities sorted ascending.
pub fn density_report(sorted: &[i64]) -> DensityReport {
    let count = sorted.len() as i64;
    let mut report = DensityReport {
        count,
        ..Default::default()
    };

    for (i, p) in sorted.iter().enumerate() {
        if *p < 1 || *p > count {
            report.out_of_range.push(*p);
        }
        if i > 0 && sorted[i - 1] == *p && report.duplicated.last() != Some(p) {
            report.duplicated.push(*p);
        }
    }
    report.missing = (1..=count).filter(|p| sorted.binary_search(p).is_err()).collect();

    report
}

pub(crate) fn check(conn: &Connection, list_id: ListId) -> Result<DensityReport> {
    let mut stmt = conn.prepare("SELECT priority FROM items WHERE list_id = ? ORDER BY priority ASC")?;
    let priorities = stmt
        .query_map(params![list_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(density_report(&priorities))
}

/// Rewrite priorities to `1..=N` keeping the current (priority, id) order.
/// Returns the number of items whose priority changed.
pub(crate) fn renumber(conn: &Connection, list_id: ListId) -> Result<usize> {
    let items = storage::items_ordered(conn, list_id)?;
    let mut changed = 0;

    for (rank, item) in (1..).zip(items.iter()) {
        if item.priority != rank {
            conn.execute(
                "UPDATE items SET priority = ? WHERE id = ?",
                params![rank, item.id],
            )?;
            changed += 1;
        }
    }

    if changed > 0 {
        log::warn!("list {}: renumbered {} item(s)", list_id, changed);
    }
    Ok(changed)
}
