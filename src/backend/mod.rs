//! Backend-as-a-service access
//!
//! The app talks to three remote collaborators: the content store (exams and
//! questions), the user-progress store (bookmarks, solved questions and test
//! history) and the identity provider. Each sits behind an async trait so the
//! HTTPS client can be swapped for the in-process [`MemoryBackend`].

pub mod error;
pub mod memory;
pub mod rest;
pub mod vault;
mod wire;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

pub use error::BackendError;
pub use memory::MemoryBackend;
pub use rest::RestClient;
pub use vault::{KeyringVault, MemoryVault, StoredSession, TokenVault};

use crate::model::{Exam, Identity, NewQuestion, NewTestResult, Question, QuestionId, TestResult};

/// Row filter for question listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub exam_id: Option<String>,
    pub subject: Option<String>,
    pub chapter: Option<String>,
}

impl QuestionFilter {
    pub fn matches(&self, q: &Question) -> bool {
        self.exam_id.as_ref().is_none_or(|e| &q.exam_id == e)
            && self.subject.as_ref().is_none_or(|s| &q.subject == s)
            && self.chapter.as_ref().is_none_or(|c| &q.chapter == c)
    }
}

/// The two per-user question sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Bookmark,
    Solved,
}

impl MarkKind {
    /// Backing table name
    pub fn table(&self) -> &'static str {
        match self {
            MarkKind::Bookmark => "bookmarks",
            MarkKind::Solved => "solved_questions",
        }
    }
}

/// Identity changes pushed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

/// Exams, questions and file storage
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Public exams plus those matching `access_code`, ascending by id
    async fn list_exams(&self, access_code: Option<&str>) -> Result<Vec<Exam>, BackendError>;

    /// Questions matching `filter`, newest first
    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, BackendError>;

    async fn insert_exam(&self, exam: &Exam) -> Result<(), BackendError>;

    async fn update_exam(&self, exam: &Exam) -> Result<(), BackendError>;

    async fn delete_exam(&self, exam_id: &str) -> Result<(), BackendError>;

    async fn insert_question(&self, question: &NewQuestion) -> Result<QuestionId, BackendError>;

    async fn update_question(
        &self,
        id: QuestionId,
        question: &NewQuestion,
    ) -> Result<(), BackendError>;

    async fn delete_question(&self, id: QuestionId) -> Result<(), BackendError>;

    /// Insert a batch in one call, returning the number of rows written
    async fn bulk_insert_questions(&self, questions: &[NewQuestion]) -> Result<usize, BackendError>;

    /// Store a file and return its public URL
    async fn upload_file(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError>;
}

/// Per-user bookmarks, solved questions and test history
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn list_marks(&self, kind: MarkKind, user_id: &str) -> Result<Vec<QuestionId>, BackendError>;

    async fn insert_mark(
        &self,
        kind: MarkKind,
        user_id: &str,
        question_id: QuestionId,
    ) -> Result<(), BackendError>;

    async fn delete_mark(
        &self,
        kind: MarkKind,
        user_id: &str,
        question_id: QuestionId,
    ) -> Result<(), BackendError>;

    /// Test history, newest first
    async fn list_results(&self, user_id: &str) -> Result<Vec<TestResult>, BackendError>;

    async fn insert_result(&self, result: &NewTestResult) -> Result<(), BackendError>;
}

/// Sign-in, sign-up, OAuth and sign-out
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The session restored at start-up, if any
    async fn current_session(&self) -> Result<Option<Identity>, BackendError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, BackendError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, BackendError>;

    /// Redirect URL that starts a third-party OAuth flow
    fn oauth_url(&self, provider: &str) -> Result<String, BackendError>;

    /// Finish an OAuth flow with the access token from the redirect
    async fn complete_oauth(&self, access_token: &str) -> Result<Identity, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Receive sign-in and sign-out notifications
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// The three collaborators bundled for the app
#[derive(Clone)]
pub struct Backend {
    pub content: Arc<dyn ContentStore>,
    pub progress: Arc<dyn ProgressStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Backend {
    /// Use one value for all three roles
    pub fn from_shared<T>(inner: Arc<T>) -> Self
    where
        T: ContentStore + ProgressStore + IdentityProvider + 'static,
    {
        Self { content: inner.clone(), progress: inner.clone(), identity: inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::fixtures::question;

    #[test]
    fn empty_filter_matches_everything() {
        let q = question(1, "JEE", "Maths", "Algebra");
        assert!(QuestionFilter::default().matches(&q));
    }

    #[test]
    fn filter_is_exact_and_case_sensitive() {
        let q = question(1, "JEE", "Maths", "Algebra");
        let filter = QuestionFilter {
            exam_id: Some("JEE".into()),
            subject: Some("Maths".into()),
            chapter: Some("algebra".into()),
        };
        assert!(!filter.matches(&q));
    }

    #[test]
    fn mark_tables() {
        assert_eq!(MarkKind::Bookmark.table(), "bookmarks");
        assert_eq!(MarkKind::Solved.table(), "solved_questions");
    }
}
