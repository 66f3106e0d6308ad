//! Bookmark and solved-set bookkeeping with local/cloud dual write
//!
//! Exactly one source is active at a time: the guest file for signed-out use,
//! or the remote progress store for a signed-in user. Local state changes
//! first; remote writes are returned to the caller to dispatch and are
//! tracked as pending, committed or failed so failures can be retried.

pub mod guest;

use std::collections::HashSet;

use anyhow::Result;

pub use guest::{GuestProgress, GuestStore};

use crate::backend::{BackendError, MarkKind, ProgressStore};
use crate::model::QuestionId;

/// Where progress currently lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressSource {
    Guest,
    Cloud { user_id: String },
}

/// In-memory view of the active source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProgress {
    pub bookmarks: HashSet<QuestionId>,
    pub solved: HashSet<QuestionId>,
}

impl From<GuestProgress> for UserProgress {
    fn from(g: GuestProgress) -> Self {
        Self { bookmarks: g.bookmarks.into_iter().collect(), solved: g.solved.into_iter().collect() }
    }
}

impl From<&UserProgress> for GuestProgress {
    fn from(p: &UserProgress) -> Self {
        Self { bookmarks: p.bookmarks.iter().copied().collect(), solved: p.solved.iter().copied().collect() }
    }
}

/// A remote row change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Insert(MarkKind, QuestionId),
    Delete(MarkKind, QuestionId),
}

impl WriteOp {
    /// The row this op touches
    fn target(self) -> (MarkKind, QuestionId) {
        match self {
            WriteOp::Insert(kind, qid) | WriteOp::Delete(kind, qid) => (kind, qid),
        }
    }
}

/// A remote write to dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteWrite {
    pub id: u64,
    pub user_id: String,
    pub op: WriteOp,
}

impl RemoteWrite {
    /// Send the write to the progress store
    pub async fn send(&self, store: &dyn ProgressStore) -> Result<(), BackendError> {
        match self.op {
            WriteOp::Insert(kind, qid) => store.insert_mark(kind, &self.user_id, qid).await,
            WriteOp::Delete(kind, qid) => store.delete_mark(kind, &self.user_id, qid).await,
        }
    }
}

/// Lifecycle of a remote write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    Pending,
    Committed,
    Failed(String),
}

#[derive(Debug, Clone)]
struct TrackedWrite {
    write: RemoteWrite,
    status: WriteStatus,
}

/// Progress state for the active source
#[derive(Debug)]
pub struct ProgressSync {
    source: ProgressSource,
    progress: UserProgress,
    guest: GuestStore,
    writes: Vec<TrackedWrite>,
    next_write: u64,
    cloud_loaded: bool,
}

impl ProgressSync {
    /// Start signed out, reading the guest file
    pub fn guest(store: GuestStore) -> Result<Self> {
        let progress = store.load()?.into();
        Ok(Self {
            source: ProgressSource::Guest,
            progress,
            guest: store,
            writes: Vec::new(),
            next_write: 1,
            cloud_loaded: false,
        })
    }

    pub fn source(&self) -> &ProgressSource {
        &self.source
    }

    pub fn user_id(&self) -> Option<&str> {
        match &self.source {
            ProgressSource::Cloud { user_id } => Some(user_id),
            ProgressSource::Guest => None,
        }
    }

    /// False while a signed-in user's rows are still being fetched
    pub fn is_loaded(&self) -> bool {
        matches!(self.source, ProgressSource::Guest) || self.cloud_loaded
    }

    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    pub fn solved(&self) -> &HashSet<QuestionId> {
        &self.progress.solved
    }

    pub fn is_bookmarked(&self, id: QuestionId) -> bool {
        self.progress.bookmarks.contains(&id)
    }

    pub fn is_solved(&self, id: QuestionId) -> bool {
        self.progress.solved.contains(&id)
    }

    /// Flip a bookmark
    pub fn toggle_bookmark(&mut self, id: QuestionId) -> Result<Option<RemoteWrite>> {
        if self.progress.bookmarks.remove(&id) {
            self.record(WriteOp::Delete(MarkKind::Bookmark, id))
        } else {
            self.progress.bookmarks.insert(id);
            self.record(WriteOp::Insert(MarkKind::Bookmark, id))
        }
    }

    /// Add to the solved set; a question already solved is left alone
    pub fn mark_solved(&mut self, id: QuestionId) -> Result<Option<RemoteWrite>> {
        if !self.progress.solved.insert(id) {
            return Ok(None);
        }
        self.record(WriteOp::Insert(MarkKind::Solved, id))
    }

    /// Remove from the solved set (explicit reset)
    pub fn unmark_solved(&mut self, id: QuestionId) -> Result<Option<RemoteWrite>> {
        if !self.progress.solved.remove(&id) {
            return Ok(None);
        }
        self.record(WriteOp::Delete(MarkKind::Solved, id))
    }

    /// Persist a local change, or queue the matching remote write
    fn record(&mut self, op: WriteOp) -> Result<Option<RemoteWrite>> {
        match &self.source {
            ProgressSource::Guest => {
                self.guest.save(&GuestProgress::from(&self.progress))?;
                Ok(None)
            }
            ProgressSource::Cloud { user_id } => {
                let write = RemoteWrite { id: self.next_write, user_id: user_id.clone(), op };
                self.next_write += 1;
                // a newer op on the same row makes older failures obsolete
                self.writes.retain(|w| {
                    w.write.op.target() != op.target() || w.status == WriteStatus::Pending
                });
                self.writes.push(TrackedWrite { write: write.clone(), status: WriteStatus::Pending });
                Ok(Some(write))
            }
        }
    }

    /// Switch to a signed-in user; guest data is not carried over
    pub fn switch_to_cloud(&mut self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        tracing::info!(%user_id, "Progress source switched to cloud");
        self.source = ProgressSource::Cloud { user_id };
        self.progress = UserProgress::default();
        self.writes.clear();
        self.cloud_loaded = false;
    }

    /// Install the rows fetched for `user_id`; ignored if another user is active
    pub fn load_cloud(
        &mut self,
        user_id: &str,
        bookmarks: Vec<QuestionId>,
        solved: Vec<QuestionId>,
    ) -> bool {
        if self.user_id() != Some(user_id) {
            tracing::debug!(%user_id, "Dropping progress fetched for an inactive user");
            return false;
        }
        self.progress = UserProgress {
            bookmarks: bookmarks.into_iter().collect(),
            solved: solved.into_iter().collect(),
        };
        self.cloud_loaded = true;
        true
    }

    /// Switch back to the guest file
    pub fn switch_to_guest(&mut self) -> Result<()> {
        tracing::info!("Progress source switched to guest");
        self.source = ProgressSource::Guest;
        self.writes.clear();
        self.cloud_loaded = false;
        self.progress = self.guest.load()?.into();
        Ok(())
    }

    /// Record the outcome of a dispatched write
    pub fn finish_write(&mut self, id: u64, result: Result<(), String>) {
        let Some(idx) = self.writes.iter().position(|w| w.write.id == id) else {
            return;
        };
        match result {
            Ok(()) => {
                self.writes.remove(idx);
            }
            Err(message) => {
                tracing::warn!(write = id, %message, "Progress write failed");
                let target = self.writes[idx].write.op.target();
                let superseded =
                    self.writes[idx + 1..].iter().any(|w| w.write.op.target() == target);
                if superseded {
                    self.writes.remove(idx);
                } else {
                    self.writes[idx].status = WriteStatus::Failed(message);
                }
            }
        }
    }

    pub fn status(&self, id: u64) -> Option<WriteStatus> {
        match self.writes.iter().find(|w| w.write.id == id) {
            Some(w) => Some(w.status.clone()),
            // committed writes are dropped from the ledger
            None if id < self.next_write => Some(WriteStatus::Committed),
            None => None,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.writes.iter().filter(|w| w.status == WriteStatus::Pending).count()
    }

    pub fn failed_count(&self) -> usize {
        self.writes.iter().filter(|w| matches!(w.status, WriteStatus::Failed(_))).count()
    }

    /// Most recent failure message
    pub fn last_failure(&self) -> Option<&str> {
        self.writes.iter().rev().find_map(|w| match &w.status {
            WriteStatus::Failed(msg) => Some(msg.as_str()),
            _ => None,
        })
    }

    /// Mark failed writes pending again and hand them back for dispatch
    pub fn retry_failed(&mut self) -> Vec<RemoteWrite> {
        self.writes
            .iter_mut()
            .filter(|w| matches!(w.status, WriteStatus::Failed(_)))
            .map(|w| {
                w.status = WriteStatus::Pending;
                w.write.clone()
            })
            .collect()
    }

    /// Merge a set of newly correct answers (test submission)
    pub fn merge_solved(&mut self, ids: &[QuestionId]) -> Result<Vec<RemoteWrite>> {
        let mut writes = Vec::new();
        for &id in ids {
            if let Some(write) = self.mark_solved(id)? {
                writes.push(write);
            }
        }
        Ok(writes)
    }
}
