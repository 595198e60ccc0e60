//! Filesystem walk that feeds the save path.
//!
//! Entries come out sorted by name. A directory is announced with
//! [`FileType::DirectoryBegin`] before its children and saved as
//! [`FileType::DirectoryEnd`] after them, so restoring it last sets its
//! timestamps once every child exists.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

use jwalk::{DirEntryIter, Parallelism, WalkDir};
use protocol::{FileType, StatRecord};

use crate::save::FileEntry;

/// Depth-first walk producing [`FileEntry`] values.
pub struct TreeWalk {
    root: PathBuf,
    inner: Option<DirEntryIter<((), ())>>,
    open_dirs: Vec<(usize, PathBuf, StatRecord)>,
    pending: VecDeque<FileEntry>,
    one_file_system: bool,
    root_dev: Option<u64>,
    pruned: Option<PathBuf>,
}

impl TreeWalk {
    /// Walks `root` without following symlinks.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let inner = WalkDir::new(&root)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .parallelism(Parallelism::Serial)
            .into_iter();
        Self {
            root,
            inner: Some(inner),
            open_dirs: Vec::new(),
            pending: VecDeque::new(),
            one_file_system: false,
            root_dev: None,
            pruned: None,
        }
    }

    /// Stops at directories on another filesystem than `root`, reporting
    /// them as [`FileType::NoFsChange`].
    #[must_use]
    pub fn one_file_system(mut self, enabled: bool) -> Self {
        self.one_file_system = enabled;
        self
    }

    fn close_dirs_at_or_below(&mut self, depth: usize) {
        while let Some((open_depth, _, _)) = self.open_dirs.last() {
            if *open_depth < depth {
                break;
            }
            if let Some((_, path, stat)) = self.open_dirs.pop() {
                self.pending
                    .push_back(FileEntry::new(FileType::DirectoryEnd, path, stat));
            }
        }
    }

    fn is_pruned(&mut self, path: &Path) -> bool {
        let inside = self
            .pruned
            .as_deref()
            .is_some_and(|pruned| path.starts_with(pruned) && path != pruned);
        if !inside {
            self.pruned = None;
        }
        inside
    }

    fn push_entry(&mut self, depth: usize, path: PathBuf) {
        let entry = FileEntry::classify(&path);
        if entry.file_type() != FileType::DirectoryEnd {
            self.pending.push_back(entry);
            return;
        }
        let stat = *entry.stat();
        if depth == 0 {
            self.root_dev = Some(stat.dev);
        } else if self.one_file_system && self.root_dev.is_some_and(|dev| dev != stat.dev) {
            self.pending.push_back(
                FileEntry::new(FileType::NoFsChange, path.clone(), stat)
                    .with_top_level(self.root.clone()),
            );
            self.pruned = Some(path);
            return;
        }
        self.pending
            .push_back(FileEntry::new(FileType::DirectoryBegin, path.clone(), stat));
        self.open_dirs.push((depth, path, stat));
    }
}

impl Iterator for TreeWalk {
    type Item = FileEntry;

    fn next(&mut self) -> Option<FileEntry> {
        loop {
            if let Some(entry) = self.pending.pop_front() {
                return Some(entry);
            }
            let next = self.inner.as_mut()?.next();
            match next {
                None => {
                    self.inner = None;
                    self.close_dirs_at_or_below(0);
                }
                Some(Ok(dir_entry)) => {
                    let path = dir_entry.path();
                    if self.is_pruned(&path) {
                        continue;
                    }
                    self.close_dirs_at_or_below(dir_entry.depth);
                    self.push_entry(dir_entry.depth, path);
                }
                Some(Err(error)) => {
                    let path = error
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    logging::trace_save!(debug, path = %path.display(), %error, "walk error");
                    self.pending.push_back(
                        FileEntry::new(FileType::NoOpen, path, StatRecord::default())
                            .with_error(io::Error::other(error.to_string())),
                    );
                }
            }
        }
    }
}
