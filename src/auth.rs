//! Bridges identity changes to the progress source
//!
//! Sign-in switches progress to the remote store and fetches the user's rows
//! (guest data is not merged). Sign-out calls the provider and then purges
//! the locally stored session so a stale session cannot reappear on restart.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;

use crate::backend::{AuthEvent, BackendError, IdentityProvider, MarkKind, ProgressStore, TokenVault};
use crate::model::{Identity, QuestionId, TestResult};
use crate::sync::ProgressSync;

/// What the caller should do after an identity change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceChange {
    /// Now signed in; fetch this user's progress
    FetchCloud { user_id: String },
    /// Now signed out; guest progress is active
    Guest,
    /// Repeated notification, nothing to do
    Unchanged,
}

/// A signed-in user's remote progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudSnapshot {
    pub user_id: String,
    pub bookmarks: Vec<QuestionId>,
    pub solved: Vec<QuestionId>,
    pub history: Vec<TestResult>,
}

/// Fetch bookmarks, solved questions and history together
pub async fn fetch_cloud(
    store: &dyn ProgressStore,
    user_id: &str,
) -> Result<CloudSnapshot, BackendError> {
    let (bookmarks, solved, history) = tokio::try_join!(
        store.list_marks(MarkKind::Bookmark, user_id),
        store.list_marks(MarkKind::Solved, user_id),
        store.list_results(user_id),
    )?;
    Ok(CloudSnapshot { user_id: user_id.to_string(), bookmarks, solved, history })
}

/// Session handling on top of the identity provider
#[derive(Clone)]
pub struct AuthBridge {
    identity: Arc<dyn IdentityProvider>,
    vault: Arc<dyn TokenVault>,
}

impl AuthBridge {
    pub fn new(identity: Arc<dyn IdentityProvider>, vault: Arc<dyn TokenVault>) -> Self {
        Self { identity, vault }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.identity.subscribe()
    }

    /// Session carried over from a previous run
    pub async fn restore(&self) -> Result<Option<Identity>, BackendError> {
        self.identity.current_session().await
    }

    /// Sign out with the provider, then purge any stored tokens
    pub async fn sign_out(&self) -> Result<(), BackendError> {
        let provider_result = self.identity.sign_out().await;
        if let Err(e) = &provider_result {
            tracing::warn!("Provider sign-out failed, purging local session anyway: {}", e);
        }
        self.vault.purge()?;
        provider_result
    }

    /// Switch the progress source for an identity change
    pub fn apply(event: &AuthEvent, sync: &mut ProgressSync) -> Result<SourceChange> {
        match event {
            AuthEvent::SignedIn(identity) => {
                if sync.user_id() == Some(identity.user_id.as_str()) {
                    return Ok(SourceChange::Unchanged);
                }
                sync.switch_to_cloud(identity.user_id.clone());
                Ok(SourceChange::FetchCloud { user_id: identity.user_id.clone() })
            }
            AuthEvent::SignedOut => {
                if sync.user_id().is_none() {
                    return Ok(SourceChange::Unchanged);
                }
                sync.switch_to_guest()?;
                Ok(SourceChange::Guest)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, MemoryVault, StoredSession};
    use crate::model::Role;
    use crate::sync::GuestStore;
    use std::collections::HashSet;

    fn identity(id: &str) -> Identity {
        Identity { user_id: id.into(), email: format!("{}@targetup.in", id), role: Role::Student }
    }

    #[test]
    fn sign_in_switches_to_cloud_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut sync = ProgressSync::guest(GuestStore::new(dir.path().join("g.json"))).unwrap();

        let event = AuthEvent::SignedIn(identity("u1"));
        assert_eq!(
            AuthBridge::apply(&event, &mut sync).unwrap(),
            SourceChange::FetchCloud { user_id: "u1".into() }
        );
        assert_eq!(AuthBridge::apply(&event, &mut sync).unwrap(), SourceChange::Unchanged);

        assert_eq!(AuthBridge::apply(&AuthEvent::SignedOut, &mut sync).unwrap(), SourceChange::Guest);
        assert_eq!(AuthBridge::apply(&AuthEvent::SignedOut, &mut sync).unwrap(), SourceChange::Unchanged);
    }

    #[tokio::test]
    async fn guest_bookmarks_are_replaced_by_remote_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut sync = ProgressSync::guest(GuestStore::new(dir.path().join("g.json"))).unwrap();
        sync.toggle_bookmark(5).unwrap();

        let backend = MemoryBackend::new();
        backend.seed_mark(MarkKind::Bookmark, "u1", 11);
        backend.seed_mark(MarkKind::Bookmark, "u1", 12);

        let change = AuthBridge::apply(&AuthEvent::SignedIn(identity("u1")), &mut sync).unwrap();
        let SourceChange::FetchCloud { user_id } = change else { panic!("expected fetch") };
        let snapshot = fetch_cloud(&backend, &user_id).await.unwrap();
        sync.load_cloud(&snapshot.user_id, snapshot.bookmarks, snapshot.solved);

        assert_eq!(sync.progress().bookmarks, HashSet::from([11, 12]));
    }

    #[tokio::test]
    async fn sign_out_purges_stored_tokens() {
        let backend = Arc::new(MemoryBackend::new().with_account("a@b.in", "pw", Role::Student));
        let vault = Arc::new(MemoryVault::default());
        let identity = backend.sign_in("a@b.in", "pw").await.unwrap();
        vault
            .store(&StoredSession { access_token: "tok".into(), refresh_token: None, identity })
            .unwrap();

        let bridge = AuthBridge::new(backend.clone(), vault.clone());
        bridge.sign_out().await.unwrap();

        assert_eq!(vault.load().unwrap(), None);
        assert_eq!(bridge.restore().await.unwrap(), None);
    }
}
