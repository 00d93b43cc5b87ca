// src/watch/events.rs

//! Raw filesystem events as seen by the detector.

use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;

/// Kind of change reported for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileOp {
    Create,
    Write,
    Remove,
    Rename,
}

impl FileOp {
    /// Remove and Rename both mean "the old path is gone".
    pub fn is_removal(self) -> bool {
        matches!(self, FileOp::Remove | FileOp::Rename)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    pub op: FileOp,
}

impl FileEvent {
    pub fn new(path: impl Into<PathBuf>, op: FileOp) -> Self {
        Self {
            path: path.into(),
            op,
        }
    }
}

/// Translate a `notify` event into zero or more [`FileEvent`]s.
///
/// Access events are dropped. A rename carrying both paths becomes a
/// `Rename` of the old path plus a `Create` of the new one; a rename that
/// only names the destination is reported as a `Create`.
pub fn from_notify(event: &notify::Event) -> Vec<FileEvent> {
    let paths = &event.paths;
    match event.kind {
        EventKind::Create(_) => with_op(paths, FileOp::Create),
        EventKind::Remove(_) => with_op(paths, FileOp::Remove),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::To => with_op(paths, FileOp::Create),
            RenameMode::From => with_op(paths, FileOp::Rename),
            RenameMode::Both if paths.len() == 2 => vec![
                FileEvent::new(paths[0].clone(), FileOp::Rename),
                FileEvent::new(paths[1].clone(), FileOp::Create),
            ],
            _ => paths
                .iter()
                .map(|p| {
                    let op = if p.exists() {
                        FileOp::Create
                    } else {
                        FileOp::Rename
                    };
                    FileEvent::new(p.clone(), op)
                })
                .collect(),
        },
        EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
            with_op(paths, FileOp::Write)
        }
        EventKind::Access(_) => Vec::new(),
    }
}

fn with_op(paths: &[PathBuf], op: FileOp) -> Vec<FileEvent> {
    paths.iter().map(|p| FileEvent::new(p.clone(), op)).collect()
}
