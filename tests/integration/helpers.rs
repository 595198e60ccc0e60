//! Shared helpers for the end-to-end tests.
//!
//! Each helper runs a complete job in memory: the save side writes into a
//! `Vec<u8>`, [`StorageRelay`] re-frames it the way a storage agent sends it
//! back, and the restore side reads from that buffer.

#![allow(dead_code)]

use std::path::Path;

use filed::{
    AccurateTable, Backends, FileOptions, JobConfig, JobContext, JobCounters, JobStatus,
    RestoreSession, RestoreSummary, SaveSession,
};
use test_support::{SavedRecord, StorageRelay, split_records};

/// Outcome of a backup run through [`backup`].
pub struct Backup {
    pub wire: Vec<u8>,
    pub messages: String,
    pub counters: JobCounters,
    pub status: JobStatus,
    pub deleted: u64,
}

impl Backup {
    pub fn records(&self) -> Vec<SavedRecord> {
        split_records(&self.wire).expect("split records")
    }

    pub fn streams_of(&self, file_index: u32) -> Vec<i32> {
        self.records()
            .iter()
            .filter(|record| record.header.file_index == file_index)
            .map(|record| record.header.stream)
            .collect()
    }
}

/// Saves every tree in `roots` with the native backends.
pub fn backup(config: JobConfig, options: &FileOptions, roots: &[&Path]) -> Backup {
    backup_with_table(config, options, roots, None)
}

pub fn backup_with_table(
    config: JobConfig,
    options: &FileOptions,
    roots: &[&Path],
    table: Option<AccurateTable>,
) -> Backup {
    let job = JobContext::new(config, Vec::new());
    let mut session = SaveSession::new(job, Vec::new(), Backends::native());
    if let Some(table) = table {
        session = session.with_accurate_table(table);
    }
    for root in roots {
        session.save_tree(root, options).expect("save tree");
    }
    let deleted = session.finish_backup().expect("finish backup");
    let status = session.status();
    let counters = session.counters();
    let (job, wire) = session.into_parts();
    Backup {
        wire,
        messages: String::from_utf8(job.into_messages()).expect("utf8 messages"),
        counters,
        status,
        deleted,
    }
}

/// Restores `backup` below `root` with the native backends.
pub fn restore(backup: &Backup, root: &Path) -> (RestoreSummary, String) {
    let relayed = StorageRelay::default()
        .relay(&backup.wire)
        .expect("relay records");
    let config = JobConfig::new().restore_location(Some(root));
    let mut session = RestoreSession::new(JobContext::new(config, Vec::new()), Backends::native());
    let summary = session.run(relayed.as_slice()).expect("restore");
    let messages = String::from_utf8(session.into_job().into_messages()).expect("utf8 messages");
    (summary, messages)
}

/// Where `path` lands when restored below `root`.
pub fn relocated(root: &Path, path: &Path) -> std::path::PathBuf {
    root.join(path.strip_prefix("/").expect("absolute path"))
}
