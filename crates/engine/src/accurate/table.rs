use rustc_hash::FxHashMap;

use protocol::StatRecord;

use super::PluginOwnership;
use crate::error::{EngineError, EngineResult};

/// What the previous backup recorded about one path.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FileStateEntry {
    mtime: i64,
    ctime: i64,
    seen: bool,
}

impl FileStateEntry {
    /// Creates an unseen entry.
    #[must_use]
    pub const fn new(mtime: i64, ctime: i64) -> Self {
        Self {
            mtime,
            ctime,
            seen: false,
        }
    }

    /// Modification time recorded by the previous backup.
    #[must_use]
    pub const fn mtime(&self) -> i64 {
        self.mtime
    }

    /// Status change time recorded by the previous backup.
    #[must_use]
    pub const fn ctime(&self) -> i64 {
        self.ctime
    }

    /// Reports whether the walker visited the path during this job.
    #[must_use]
    pub const fn is_seen(&self) -> bool {
        self.seen
    }
}

/// Prior file list of an accurate job, keyed by saved path.
///
/// Directories are keyed with their trailing separator, exactly as their
/// attributes record names them.
#[derive(Debug, Default)]
pub struct AccurateTable {
    entries: FxHashMap<Vec<u8>, FileStateEntry>,
}

impl AccurateTable {
    /// Allocates a table sized for `expected` entries.
    ///
    /// Allocation failure is reported instead of aborting the process.
    pub fn init(expected: usize) -> EngineResult<Self> {
        let mut entries = FxHashMap::default();
        entries
            .try_reserve(expected)
            .map_err(|_| EngineError::TableAllocation { entries: expected })?;
        Ok(Self { entries })
    }

    /// Adds or replaces the entry for `path`.
    pub fn insert(&mut self, path: impl Into<Vec<u8>>, mtime: i64, ctime: i64) {
        self.entries
            .insert(path.into(), FileStateEntry::new(mtime, ctime));
    }

    /// Returns a copy of the entry for `path`.
    #[must_use]
    pub fn lookup(&self, path: &[u8]) -> Option<FileStateEntry> {
        self.entries.get(path).copied()
    }

    /// Marks `path` as visited. Returns `false` when the path is unknown.
    pub fn mark_seen(&mut self, path: &[u8]) -> bool {
        match self.entries.get_mut(path) {
            Some(entry) => {
                entry.seen = true;
                true
            }
            None => false,
        }
    }

    /// Decides whether `path` must be saved again.
    ///
    /// Unknown paths are new and therefore changed. A path visited earlier
    /// in this job is reported unchanged. Otherwise mtime, then ctime unless
    /// `mtime_only`, is compared against `fresh`. A known path is marked
    /// seen whatever the outcome.
    pub fn check_changed(&mut self, path: &[u8], fresh: &StatRecord, mtime_only: bool) -> bool {
        let Some(entry) = self.entries.get_mut(path) else {
            logging::trace_accurate!(trace, path = %String::from_utf8_lossy(path), "not found");
            return true;
        };
        if entry.seen {
            logging::trace_accurate!(trace, path = %String::from_utf8_lossy(path), "already seen");
            return false;
        }
        let changed = if entry.mtime != fresh.mtime {
            logging::trace_accurate!(
                debug,
                path = %String::from_utf8_lossy(path),
                recorded = entry.mtime,
                current = fresh.mtime,
                "st_mtime differs"
            );
            true
        } else if !mtime_only && entry.ctime != fresh.ctime {
            logging::trace_accurate!(
                debug,
                path = %String::from_utf8_lossy(path),
                recorded = entry.ctime,
                current = fresh.ctime,
                "st_ctime differs"
            );
            true
        } else {
            false
        };
        entry.seen = true;
        changed
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries not visited so far.
    #[must_use]
    pub fn unseen(&self) -> usize {
        self.entries.values().filter(|entry| !entry.seen).count()
    }

    /// Calls `emit` once for every unvisited path that no plugin owns, in
    /// path order, then releases the table.
    ///
    /// Stops at the first error returned by `emit`. Returns the number of
    /// paths emitted.
    pub fn drain_deleted<P, F, E>(self, plugin: &P, mut emit: F) -> Result<u64, E>
    where
        P: PluginOwnership + ?Sized,
        F: FnMut(&[u8], FileStateEntry) -> Result<(), E>,
    {
        let mut deleted: Vec<(Vec<u8>, FileStateEntry)> = self
            .entries
            .into_iter()
            .filter(|(path, entry)| !entry.seen && !plugin.owns(path))
            .collect();
        deleted.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut emitted = 0;
        for (path, entry) in deleted {
            logging::trace_accurate!(debug, path = %String::from_utf8_lossy(&path), "deleted");
            emit(&path, entry)?;
            emitted += 1;
        }
        Ok(emitted)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::accurate::NoPluginOwnership;

    fn stat(mtime: i64, ctime: i64) -> StatRecord {
        StatRecord {
            mtime,
            ctime,
            ..StatRecord::default()
        }
    }

    fn table() -> AccurateTable {
        let mut table = AccurateTable::init(3).expect("init");
        table.insert(&b"/data/a"[..], 100, 200);
        table.insert(&b"/data/b"[..], 100, 200);
        table.insert(&b"/data/c"[..], 100, 200);
        table
    }

    fn drain(table: AccurateTable) -> Vec<Vec<u8>> {
        let mut names = Vec::new();
        table
            .drain_deleted(&NoPluginOwnership, |path, _| {
                names.push(path.to_vec());
                Ok::<(), Infallible>(())
            })
            .expect("drain");
        names
    }

    #[test]
    fn unknown_paths_are_changed() {
        let mut table = table();
        assert!(table.check_changed(b"/data/new", &stat(100, 200), false));
        assert_eq!(table.lookup(b"/data/new"), None);
    }

    #[test]
    fn identical_times_are_unchanged_and_marked_seen() {
        let mut table = table();
        assert!(!table.check_changed(b"/data/a", &stat(100, 200), false));
        assert!(table.lookup(b"/data/a").expect("entry").is_seen());
    }

    #[test]
    fn mtime_difference_is_a_change() {
        let mut table = table();
        assert!(table.check_changed(b"/data/a", &stat(101, 200), false));
        assert!(table.lookup(b"/data/a").expect("entry").is_seen());
    }

    #[test]
    fn ctime_difference_respects_mtime_only() {
        let mut table = table();
        assert!(table.check_changed(b"/data/a", &stat(100, 201), false));
        assert!(!table.check_changed(b"/data/b", &stat(100, 201), true));
    }

    #[test]
    fn second_visit_is_unchanged() {
        let mut table = table();
        assert!(table.check_changed(b"/data/a", &stat(999, 999), false));
        assert!(!table.check_changed(b"/data/a", &stat(999, 999), false));
    }

    #[test]
    fn duplicates_overwrite() {
        let mut table = table();
        table.insert(&b"/data/a"[..], 5, 6);
        assert_eq!(table.len(), 3);
        let entry = table.lookup(b"/data/a").expect("entry");
        assert_eq!((entry.mtime(), entry.ctime()), (5, 6));
    }

    #[test]
    fn mark_seen_is_idempotent() {
        let mut table = table();
        assert!(table.mark_seen(b"/data/a"));
        assert!(table.mark_seen(b"/data/a"));
        assert!(!table.mark_seen(b"/missing"));
        assert_eq!(table.unseen(), 2);
    }

    #[test]
    fn drain_reports_only_unvisited_paths() {
        let mut table = table();
        table.check_changed(b"/data/a", &stat(100, 200), false);
        table.check_changed(b"/data/c", &stat(100, 200), false);
        assert_eq!(drain(table), vec![b"/data/b".to_vec()]);
    }

    #[test]
    fn drain_emits_in_path_order() {
        assert_eq!(
            drain(table()),
            vec![b"/data/a".to_vec(), b"/data/b".to_vec(), b"/data/c".to_vec()]
        );
    }

    #[test]
    fn plugin_owned_paths_are_not_deleted() {
        let plugin = |path: &[u8]| path.starts_with(b"/data/b");
        let mut names = Vec::new();
        let count = table()
            .drain_deleted(&plugin, |path, entry| {
                assert_eq!(entry.mtime(), 100);
                names.push(path.to_vec());
                Ok::<(), Infallible>(())
            })
            .expect("drain");
        assert_eq!(count, 2);
        assert_eq!(names, vec![b"/data/a".to_vec(), b"/data/c".to_vec()]);
    }

    #[test]
    fn drain_stops_at_first_error() {
        let mut calls = 0;
        let result = table().drain_deleted(&NoPluginOwnership, |_, _| {
            calls += 1;
            Err("send failed")
        });
        assert_eq!(result, Err("send failed"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn impossible_reservation_is_reported() {
        let err = AccurateTable::init(usize::MAX).expect_err("capacity overflow");
        assert!(matches!(
            err,
            EngineError::TableAllocation { entries } if entries == usize::MAX
        ));
    }
}
