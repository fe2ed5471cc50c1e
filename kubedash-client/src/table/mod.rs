//! Keyed resource rows fed by a watch, read back in sorted order.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use crate::error::{Error, Result};

pub mod sort;
pub mod watch;

pub use sort::sort_rows;
pub use watch::{spawn_row_watcher, DefaultRows, PodRows, RowBuilder, RowWatcher};

pub type Row = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Updated,
    Unchanged,
}

/// The current display fields of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowEvent {
    pub kind: EventKind,
    pub fields: Row,
    /// Fields before the last update, empty unless `kind` is `Updated`.
    pub delta: Row,
}

impl RowEvent {
    pub fn new(kind: EventKind, fields: Row) -> Self {
        Self {
            kind,
            fields,
            delta: Row::new(),
        }
    }
}

pub type RowEvents = HashMap<String, RowEvent>;

/// A sort request: column, expected row count and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortColumn {
    pub index: usize,
    pub row_count: usize,
    pub asc: bool,
}

impl SortColumn {
    pub fn new(index: usize, asc: bool) -> Self {
        Self {
            index,
            row_count: 0,
            asc,
        }
    }
}

/// A change delivered by the resource watch. Last write per key wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowChange {
    Upsert { key: String, fields: Row },
    Delete { key: String },
}

/// The table's rows, guarded so a reader never sees a half-written row.
#[derive(Debug)]
pub struct TableData {
    header: Vec<String>,
    rows: RwLock<RowEvents>,
}

impl TableData {
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: RwLock::new(RowEvents::new()),
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn field_count(&self) -> usize {
        self.header.len()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RowEvents>> {
        self.rows.read().map_err(|_| Error::LockPoisoned("table"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RowEvents>> {
        self.rows.write().map_err(|_| Error::LockPoisoned("table"))
    }

    /// Inserts or replaces the row for `key`.
    pub fn upsert(&self, key: impl Into<String>, fields: Row) -> Result<EventKind> {
        if fields.len() != self.field_count() {
            warn!(
                expected = self.field_count(),
                got = fields.len(),
                "rejecting row with wrong field count"
            );
            return Err(Error::Schema {
                expected: self.field_count(),
                got: fields.len(),
            });
        }

        let mut rows = self.write()?;
        let key = key.into();
        let event = match rows.remove(&key) {
            None => RowEvent::new(EventKind::Added, fields),
            Some(prev) if prev.fields == fields => RowEvent::new(EventKind::Unchanged, fields),
            Some(prev) => RowEvent {
                kind: EventKind::Updated,
                fields,
                delta: prev.fields,
            },
        };
        let kind = event.kind;
        rows.insert(key, event);
        Ok(kind)
    }

    pub fn delete(&self, key: &str) -> Result<Option<RowEvent>> {
        Ok(self.write()?.remove(key))
    }

    pub fn apply(&self, change: RowChange) -> Result<()> {
        match change {
            RowChange::Upsert { key, fields } => self.upsert(key, fields).map(|_| ()),
            RowChange::Delete { key } => self.delete(&key).map(|_| ()),
        }
    }

    /// Drops every row whose key fails `keep`, returning how many were removed.
    pub fn retain(&self, keep: impl Fn(&str) -> bool) -> Result<usize> {
        let mut rows = self.write()?;
        let before = rows.len();
        rows.retain(|key, _| keep(key));
        Ok(before - rows.len())
    }

    pub fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<RowEvent>> {
        Ok(self.read()?.get(key).cloned())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Keys in display order, computed from one consistent snapshot.
    pub fn sorted_keys(&self, default_col: usize, sc: &SortColumn) -> Result<Vec<String>> {
        let rows = self.read()?;
        let mut keys = vec![String::new(); rows.len()];
        sort_rows(&rows, default_col, sc, &mut keys);
        Ok(keys)
    }

    /// Keys and fields in display order, computed from one consistent snapshot.
    pub fn sorted_rows(&self, default_col: usize, sc: &SortColumn) -> Result<Vec<(String, Row)>> {
        let rows = self.read()?;
        let mut keys = vec![String::new(); rows.len()];
        sort_rows(&rows, default_col, sc, &mut keys);
        Ok(keys
            .into_iter()
            .filter_map(|k| {
                let fields = rows.get(&k)?.fields.clone();
                Some((k, fields))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn row(fields: &[&str]) -> Row {
        fields.iter().map(|s| s.to_string()).collect()
    }

    fn table() -> TableData {
        TableData::new(["NAME", "AGE"])
    }

    #[test]
    fn test_upsert_kinds_and_delta() {
        let t = table();
        assert_eq!(t.upsert("a", row(&["a", "1m"])).unwrap(), EventKind::Added);
        assert_eq!(t.upsert("a", row(&["a", "1m"])).unwrap(), EventKind::Unchanged);
        assert_eq!(t.upsert("a", row(&["a", "2m"])).unwrap(), EventKind::Updated);

        let evt = t.get("a").unwrap().unwrap();
        assert_eq!(evt.fields, row(&["a", "2m"]));
        assert_eq!(evt.delta, row(&["a", "1m"]));
        assert_eq!(t.len().unwrap(), 1);
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let t = table();
        let err = t.upsert("a", row(&["a"])).unwrap_err();
        assert!(matches!(err, Error::Schema { expected: 2, got: 1 }));
        assert!(t.is_empty().unwrap());
    }

    #[test]
    fn test_apply_and_delete() {
        let t = table();
        t.apply(RowChange::Upsert {
            key: "a".into(),
            fields: row(&["a", "1m"]),
        })
        .unwrap();
        t.apply(RowChange::Upsert {
            key: "b".into(),
            fields: row(&["b", "1m"]),
        })
        .unwrap();
        t.apply(RowChange::Delete { key: "a".into() }).unwrap();
        // deleting a missing key is harmless
        t.apply(RowChange::Delete { key: "zz".into() }).unwrap();

        assert_eq!(t.sorted_keys(0, &SortColumn::new(0, true)).unwrap(), vec!["b"]);
    }

    #[test]
    fn test_retain_and_clear() {
        let t = table();
        for k in ["a", "b", "c"] {
            t.upsert(k, row(&[k, "1s"])).unwrap();
        }
        assert_eq!(t.retain(|k| k != "b").unwrap(), 1);
        assert_eq!(t.len().unwrap(), 2);
        t.clear().unwrap();
        assert!(t.is_empty().unwrap());
    }

    #[test]
    fn test_sorted_rows() {
        let t = table();
        t.upsert("default/web", row(&["web", "2175h48m0.06015s"])).unwrap();
        t.upsert("default/db", row(&["db", "403h42m34.060166s"])).unwrap();

        let rows = t.sorted_rows(0, &SortColumn::new(1, true)).unwrap();
        assert_eq!(rows[0].0, "default/db");
        assert_eq!(rows[1].1, row(&["web", "2175h48m0.06015s"]));
    }

    #[test]
    fn test_concurrent_writers_and_sorts() {
        let t = Arc::new(table());
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let t = t.clone();
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("w{w}-{}", i % 50);
                        t.upsert(key.clone(), vec![key, format!("{i}s")]).unwrap();
                    }
                })
            })
            .collect();

        for _ in 0..50 {
            let keys = t.sorted_keys(0, &SortColumn::new(1, false)).unwrap();
            let mut dedup = keys.clone();
            dedup.sort();
            dedup.dedup();
            assert_eq!(dedup.len(), keys.len());
        }

        for w in writers {
            w.join().unwrap();
        }
        assert_eq!(t.len().unwrap(), 200);
        for (key, fields) in t.sorted_rows(0, &SortColumn::new(0, true)).unwrap() {
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[0], key);
        }
    }
}
