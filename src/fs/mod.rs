// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// What a path points at, as reported by `lstat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    Symlink,
}

impl FileKind {
    pub fn is_dir(self) -> bool {
        matches!(self, FileKind::Dir)
    }
}

/// Abstract filesystem interface.
///
/// The watcher only needs to stat paths; keeping this behind a trait lets
/// the debatcher be tested against [`mock::MockFileSystem`].
pub trait FileSystem: Send + Sync + Debug {
    /// `lstat` the path (symlinks are not followed).
    fn stat(&self, path: &Path) -> Result<FileKind>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn stat(&self, path: &Path) -> Result<FileKind> {
        let meta = fs::symlink_metadata(path).with_context(|| format!("stat {:?}", path))?;
        let ft = meta.file_type();
        Ok(if ft.is_dir() {
            FileKind::Dir
        } else if ft.is_symlink() {
            FileKind::Symlink
        } else {
            FileKind::File
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }
}
