//! Accurate-mode change detection.
//!
//! At the start of an accurate incremental or differential job the
//! coordinator streams the file list of the previous backup. The
//! [`AccurateTable`] built from it answers two questions during the job:
//! whether a visited file changed since then, and, once the walk is over,
//! which previously saved files were not visited at all. The latter are sent
//! as deleted notices by [`AccurateTable::drain_deleted`].

mod ingest;
mod table;

pub use ingest::ingest_accurate_list;
pub use table::{AccurateTable, FileStateEntry};

/// Lets a plugin claim paths so they are not reported deleted.
pub trait PluginOwnership {
    /// Returns `true` when `path` is managed by a plugin.
    fn owns(&self, path: &[u8]) -> bool;
}

/// Ownership check for jobs without plugins.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NoPluginOwnership;

impl PluginOwnership for NoPluginOwnership {
    fn owns(&self, _path: &[u8]) -> bool {
        false
    }
}

impl<F> PluginOwnership for F
where
    F: Fn(&[u8]) -> bool,
{
    fn owns(&self, path: &[u8]) -> bool {
        self(path)
    }
}
