use chrono::TimeDelta;
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::warn;

use super::{RowEvents, SortColumn};
use crate::duration::parse_duration;

/// Tables at least this large are sorted on the rayon pool.
const PAR_SORT_THRESHOLD: usize = 1_024;

struct SortEntry<'a> {
    key: &'a str,
    value: &'a str,
    duration: Option<TimeDelta>,
}

/// Orders two cells. Durations compare by magnitude and sort ahead of
/// anything else; all other values compare as plain strings.
///
/// A duration against a non-duration is not compared lexically: mixing the
/// two orders is intransitive (`9s < 10m < 5x < 9s`), and the std and rayon
/// sorts may panic on an order that is not total.
fn compare_cells(a: &SortEntry<'_>, b: &SortEntry<'_>) -> Ordering {
    match (a.duration, b.duration) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.value.cmp(b.value),
    }
}

fn effective_column(rows: &RowEvents, default_col: usize, requested: usize) -> usize {
    let Some(width) = rows.values().next().map(|r| r.fields.len()) else {
        return requested;
    };
    if requested < width {
        return requested;
    }
    warn!(requested, width, default_col, "sort column out of range, using default");
    default_col
}

/// Writes the keys of `rows` into `keys` in display order.
///
/// Rows are ordered by the cell at the effective column in the requested
/// direction, ties broken by key ascending. `keys` must be sized to `rows.len()`.
pub fn sort_rows(rows: &RowEvents, default_col: usize, sc: &SortColumn, keys: &mut [String]) {
    debug_assert_eq!(keys.len(), rows.len(), "key buffer must match row count");

    let col = effective_column(rows, default_col, sc.index);
    let mut entries: Vec<SortEntry<'_>> = rows
        .iter()
        .map(|(key, evt)| {
            let value = evt.fields.get(col).map(String::as_str).unwrap_or_default();
            SortEntry {
                key,
                value,
                duration: parse_duration(value),
            }
        })
        .collect();

    let asc = sc.asc;
    let cmp = |a: &SortEntry<'_>, b: &SortEntry<'_>| {
        let ord = compare_cells(a, b);
        let ord = if asc { ord } else { ord.reverse() };
        ord.then_with(|| a.key.cmp(b.key))
    };

    if entries.len() >= PAR_SORT_THRESHOLD {
        entries.par_sort_unstable_by(cmp);
    } else {
        entries.sort_unstable_by(cmp);
    }

    for (slot, entry) in keys.iter_mut().zip(&entries) {
        slot.clear();
        slot.push_str(entry.key);
    }
}
