//! Batch progress as an immutable snapshot.
//!
//! Every change is described by a [`ProgressUpdate`] and folded into the
//! latest snapshot by the pure [`reduce`] function, which always builds a
//! brand-new file list. Two tasks reporting in the same scheduling turn
//! therefore never overwrite each other: the second update is applied to
//! the list that already contains the first.

use filechat_protocol::{FileId, FileProgress, UploadStatus};
use serde::Serialize;
use tokio::sync::watch;

/// Progress of every file in the current batch, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSnapshot {
    pub files: Vec<FileProgress>,
}

impl BatchSnapshot {
    pub fn get(&self, id: FileId) -> Option<&FileProgress> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// `true` while any file still shows a busy indicator.
    pub fn any_in_progress(&self) -> bool {
        self.files.iter().any(FileProgress::in_progress)
    }
}

/// A single change to batch progress.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// Files added to the selection.
    Selected(Vec<FileProgress>),
    /// A file dropped from the selection.
    Removed(FileId),
    /// Upload started with a fixed chunk size.
    Started {
        id: FileId,
        chunk_size: u64,
        total_chunks: u64,
    },
    /// `uploaded_chunks` chunks of the file have been emitted.
    ChunkSent { id: FileId, uploaded_chunks: u64 },
    Completed { id: FileId },
    Failed { id: FileId, error: String },
    Cancelled { id: FileId },
    /// Batch finished and was reset.
    Cleared,
}

/// Derives the next snapshot from `prev` without touching it.
///
/// Updates naming a file that is no longer in the batch are ignored, as
/// are chunk and terminal updates for a file that already reached a
/// terminal state. `Started` always applies so a retained batch can be
/// submitted again.
pub fn reduce(prev: &BatchSnapshot, update: &ProgressUpdate) -> BatchSnapshot {
    let files = match update {
        ProgressUpdate::Selected(added) => prev.files.iter().chain(added).cloned().collect(),
        ProgressUpdate::Removed(id) => prev.files.iter().filter(|f| f.id != *id).cloned().collect(),
        ProgressUpdate::Cleared => Vec::new(),
        ProgressUpdate::Started {
            id,
            chunk_size,
            total_chunks,
        } => map_file(prev, *id, |f| FileProgress {
            chunk_size: *chunk_size,
            total_chunks: *total_chunks,
            uploaded_chunks: 0,
            status: UploadStatus::Uploading,
            error: String::new(),
            ..f.clone()
        }),
        ProgressUpdate::ChunkSent {
            id,
            uploaded_chunks,
        } => map_live_file(prev, *id, |f| FileProgress {
            uploaded_chunks: *uploaded_chunks,
            ..f.clone()
        }),
        ProgressUpdate::Completed { id } => map_live_file(prev, *id, |f| FileProgress {
            status: UploadStatus::Completed,
            ..f.clone()
        }),
        ProgressUpdate::Failed { id, error } => map_live_file(prev, *id, |f| FileProgress {
            status: UploadStatus::Failed,
            error: error.clone(),
            ..f.clone()
        }),
        ProgressUpdate::Cancelled { id } => map_live_file(prev, *id, |f| FileProgress {
            status: UploadStatus::Cancelled,
            ..f.clone()
        }),
    };
    BatchSnapshot { files }
}

fn map_file(
    prev: &BatchSnapshot,
    id: FileId,
    f: impl Fn(&FileProgress) -> FileProgress,
) -> Vec<FileProgress> {
    prev.files
        .iter()
        .map(|p| if p.id == id { f(p) } else { p.clone() })
        .collect()
}

fn map_live_file(
    prev: &BatchSnapshot,
    id: FileId,
    f: impl Fn(&FileProgress) -> FileProgress,
) -> Vec<FileProgress> {
    map_file(prev, id, |p| {
        if p.status.is_terminal() {
            p.clone()
        } else {
            f(p)
        }
    })
}

// ---------------------------------------------------------------------------
// ProgressTracker
// ---------------------------------------------------------------------------

/// Publishes batch snapshots to any number of observers.
///
/// Observers hold a `watch::Receiver` and always see the latest snapshot;
/// intermediate snapshots may be skipped if they read slowly.
pub struct ProgressTracker {
    tx: watch::Sender<BatchSnapshot>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(BatchSnapshot::default());
        Self { tx }
    }

    /// Applies `update` to the latest snapshot and publishes the result.
    pub fn apply(&self, update: ProgressUpdate) {
        self.tx.send_modify(|current| {
            let next = reduce(current, &update);
            *current = next;
        });
    }

    /// Returns a copy of the latest snapshot.
    pub fn snapshot(&self) -> BatchSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribes to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<BatchSnapshot> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(name: &str, size: u64) -> FileProgress {
        FileProgress {
            id: FileId::new(),
            name: name.into(),
            size,
            chunk_size: 0,
            total_chunks: 0,
            uploaded_chunks: 0,
            status: UploadStatus::Pending,
            error: String::new(),
        }
    }

    fn selected(files: &[FileProgress]) -> BatchSnapshot {
        reduce(
            &BatchSnapshot::default(),
            &ProgressUpdate::Selected(files.to_vec()),
        )
    }

    #[test]
    fn reduce_leaves_previous_snapshot_untouched() {
        let a = pending("a.png", 10);
        let before = selected(&[a.clone()]);
        let after = reduce(
            &before,
            &ProgressUpdate::Started {
                id: a.id,
                chunk_size: 4,
                total_chunks: 3,
            },
        );
        assert_eq!(before.files[0].status, UploadStatus::Pending);
        assert_eq!(after.files[0].status, UploadStatus::Uploading);
        assert_eq!(after.files[0].total_chunks, 3);
    }

    #[test]
    fn same_turn_updates_do_not_clobber_each_other() {
        let a = pending("a.png", 8);
        let b = pending("b.png", 8);
        let tracker = ProgressTracker::new();
        tracker.apply(ProgressUpdate::Selected(vec![a.clone(), b.clone()]));

        // Both tasks report back-to-back without any other progress in between.
        tracker.apply(ProgressUpdate::ChunkSent {
            id: a.id,
            uploaded_chunks: 1,
        });
        tracker.apply(ProgressUpdate::ChunkSent {
            id: b.id,
            uploaded_chunks: 2,
        });

        let snap = tracker.snapshot();
        assert_eq!(snap.get(a.id).unwrap().uploaded_chunks, 1);
        assert_eq!(snap.get(b.id).unwrap().uploaded_chunks, 2);
    }

    #[test]
    fn terminal_state_is_sticky() {
        let a = pending("a.png", 8);
        let mut snap = selected(&[a.clone()]);
        snap = reduce(
            &snap,
            &ProgressUpdate::Failed {
                id: a.id,
                error: "disk gone".into(),
            },
        );
        snap = reduce(
            &snap,
            &ProgressUpdate::ChunkSent {
                id: a.id,
                uploaded_chunks: 5,
            },
        );
        snap = reduce(&snap, &ProgressUpdate::Completed { id: a.id });

        let f = snap.get(a.id).unwrap();
        assert_eq!(f.status, UploadStatus::Failed);
        assert_eq!(f.uploaded_chunks, 0);
        assert_eq!(f.error, "disk gone");
    }

    #[test]
    fn restart_clears_failure() {
        let a = pending("a.png", 8);
        let mut snap = selected(&[a.clone()]);
        snap = reduce(
            &snap,
            &ProgressUpdate::Failed {
                id: a.id,
                error: "boom".into(),
            },
        );
        snap = reduce(
            &snap,
            &ProgressUpdate::Started {
                id: a.id,
                chunk_size: 4,
                total_chunks: 2,
            },
        );
        let f = snap.get(a.id).unwrap();
        assert_eq!(f.status, UploadStatus::Uploading);
        assert!(f.error.is_empty());
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let a = pending("a.png", 8);
        let snap = selected(&[a.clone()]);
        let next = reduce(&snap, &ProgressUpdate::Completed { id: FileId::new() });
        assert_eq!(snap, next);
    }

    #[test]
    fn remove_and_clear() {
        let a = pending("a.png", 8);
        let b = pending("b.png", 8);
        let snap = selected(&[a.clone(), b.clone()]);

        let snap = reduce(&snap, &ProgressUpdate::Removed(a.id));
        assert_eq!(snap.files.len(), 1);
        assert_eq!(snap.files[0].id, b.id);

        let snap = reduce(&snap, &ProgressUpdate::Cleared);
        assert!(snap.is_empty());
    }

    #[test]
    fn any_in_progress_matches_file_indicator() {
        let a = pending("a.png", 8);
        let snap = selected(&[a.clone()]);
        // Selected files show the busy indicator before they start.
        assert!(snap.any_in_progress());
        assert_eq!(snap.any_in_progress(), snap.files[0].in_progress());
        let snap = reduce(
            &snap,
            &ProgressUpdate::Started {
                id: a.id,
                chunk_size: 8,
                total_chunks: 1,
            },
        );
        assert!(snap.any_in_progress());
        let snap = reduce(&snap, &ProgressUpdate::Completed { id: a.id });
        assert!(!snap.any_in_progress());
        assert!(!BatchSnapshot::default().any_in_progress());
    }

    #[test]
    fn snapshot_serializes_for_ui() {
        let a = pending("a.png", 8);
        let json = serde_json::to_value(selected(&[a])).unwrap();
        assert_eq!(json["files"][0]["name"], "a.png");
        assert_eq!(json["files"][0]["status"], "pending");
        assert_eq!(json["files"][0]["uploadedChunks"], 0);
    }

    #[tokio::test]
    async fn subscribers_see_latest_snapshot() {
        let tracker = ProgressTracker::new();
        let mut rx = tracker.subscribe();
        let a = pending("a.png", 8);

        tracker.apply(ProgressUpdate::Selected(vec![a.clone()]));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().files.len(), 1);

        tracker.apply(ProgressUpdate::Cleared);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_empty());
    }
}
