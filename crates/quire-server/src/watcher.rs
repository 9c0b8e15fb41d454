//! File watching for automatic rebuilds.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use regex::Regex;
use tokio::sync::mpsc;

/// Editor swap, backup and hidden files that never trigger a rebuild.
static IGNORED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\..*|.*~|.*\.sw[a-p]|#.*#|4913)$").expect("ignore pattern is valid")
});

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Modified => f.write_str("modified"),
            Self::Removed => f.write_str("removed"),
        }
    }
}

/// A change to a file below one of the watched roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

/// File watcher for detecting source changes.
///
/// Events are forwarded unbatched; consumers decide how to coalesce them.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    roots: Vec<PathBuf>,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Paths that do not exist are skipped with a warning. Returns the
    /// watcher and a channel to receive events.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, mpsc::UnboundedReceiver<WatchEvent>), notify::Error> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    for path in event.paths {
                        if let Some(e) = classify_event(&path, &event.kind) {
                            let _ = tx.send(e);
                        }
                    }
                }
                Err(e) => tracing::warn!("File watch error: {}", e),
            }
        })?;

        let mut roots = Vec::new();
        for path in paths {
            if path.exists() {
                watcher.watch(path, RecursiveMode::Recursive)?;
                tracing::debug!("Watching {}", path.display());
                roots.push(path.clone());
            } else {
                tracing::warn!("Not watching {}: path does not exist", path.display());
            }
        }

        Ok((Self { watcher, roots }, rx))
    }

    /// Roots actually being watched.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Stop watching. The event channel closes once the watcher is gone.
    pub fn close(mut self) {
        for root in &self.roots {
            if let Err(e) = self.watcher.unwatch(root) {
                tracing::debug!("Failed to unwatch {}: {}", root.display(), e);
            }
        }
        tracing::debug!("File watcher closed");
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &EventKind) -> Option<WatchEvent> {
    if is_ignored(path) {
        return None;
    }

    let kind = match kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Remove(_) => ChangeKind::Removed,
        EventKind::Modify(ModifyKind::Metadata(_)) => return None,
        EventKind::Modify(_) => ChangeKind::Modified,
        _ => return None,
    };

    Some(WatchEvent {
        kind,
        path: path.to_path_buf(),
    })
}

fn is_ignored(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| IGNORED.is_match(name))
}
