//! In-process backend used for offline mode and tests

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;

use super::error::BackendError;
use super::{AuthEvent, ContentStore, IdentityProvider, MarkKind, ProgressStore, QuestionFilter};
use crate::model::{
    Difficulty, Exam, Identity, NewQuestion, NewTestResult, OptionKey, Question, QuestionId, Role,
    TestResult,
};

#[derive(Default)]
struct Tables {
    exams: BTreeMap<String, Exam>,
    questions: BTreeMap<QuestionId, Question>,
    next_question_id: QuestionId,
    marks: HashMap<(MarkKind, String), Vec<QuestionId>>,
    results: Vec<TestResult>,
    files: HashMap<String, Vec<u8>>,
    accounts: HashMap<String, (String, Identity)>,
    session: Option<Identity>,
    fail_writes: bool,
}

/// Backend kept entirely in memory
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self { tables: Mutex::new(Tables { next_question_id: 1, ..Default::default() }), events }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend holding the four standard exams and a few sample questions
    pub fn seeded() -> Self {
        let backend = Self::new();
        backend.with_tables(|t| {
            for exam in default_exams() {
                t.exams.insert(exam.id.clone(), exam);
            }
            for q in sample_questions() {
                let id = t.next_question_id;
                t.next_question_id += 1;
                t.questions.insert(id, q.with_id(id));
            }
        });
        backend
    }

    /// Register an account that can sign in
    pub fn with_account(self, email: &str, password: &str, role: Role) -> Self {
        self.with_tables(|t| {
            let identity =
                Identity { user_id: format!("user-{}", t.accounts.len() + 1), email: email.to_string(), role };
            t.accounts.insert(email.to_string(), (password.to_string(), identity));
        });
        self
    }

    /// Make every progress write fail (for exercising retry paths)
    pub fn set_fail_writes(&self, fail: bool) {
        self.with_tables(|t| t.fail_writes = fail);
    }

    /// Insert a question directly, bypassing the admin check
    pub fn seed_question(&self, question: Question) {
        self.with_tables(|t| {
            t.next_question_id = t.next_question_id.max(question.id + 1);
            t.questions.insert(question.id, question);
        });
    }

    pub fn seed_exam(&self, exam: Exam) {
        self.with_tables(|t| {
            t.exams.insert(exam.id.clone(), exam);
        });
    }

    /// Insert a progress row directly
    pub fn seed_mark(&self, kind: MarkKind, user_id: &str, question_id: QuestionId) {
        self.with_tables(|t| t.marks.entry((kind, user_id.to_string())).or_default().push(question_id));
    }

    /// Current rows of a progress table
    pub fn marks(&self, kind: MarkKind, user_id: &str) -> Vec<QuestionId> {
        self.with_tables(|t| t.marks.get(&(kind, user_id.to_string())).cloned().unwrap_or_default())
    }

    pub fn results(&self) -> Vec<TestResult> {
        self.with_tables(|t| t.results.clone())
    }

    pub fn question_count(&self) -> usize {
        self.with_tables(|t| t.questions.len())
    }

    fn with_tables<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut guard = match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    fn require_admin(t: &Tables) -> Result<(), BackendError> {
        match &t.session {
            Some(identity) if identity.is_admin() => Ok(()),
            Some(_) => Err(BackendError::Forbidden),
            None => Err(BackendError::NotSignedIn),
        }
    }

    fn check_writable(t: &Tables) -> Result<(), BackendError> {
        if t.fail_writes {
            return Err(BackendError::ApiError { status: 503, message: "Service unavailable".into() });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryBackend {
    async fn list_exams(&self, access_code: Option<&str>) -> Result<Vec<Exam>, BackendError> {
        Ok(self.with_tables(|t| {
            t.exams.values().filter(|e| e.is_visible_with(access_code)).cloned().collect()
        }))
    }

    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, BackendError> {
        Ok(self.with_tables(|t| {
            t.questions.values().rev().filter(|q| filter.matches(q)).cloned().collect()
        }))
    }

    async fn insert_exam(&self, exam: &Exam) -> Result<(), BackendError> {
        self.with_tables(|t| {
            Self::require_admin(t)?;
            if t.exams.contains_key(&exam.id) {
                return Err(BackendError::ApiError {
                    status: 409,
                    message: format!("exam {} already exists", exam.id),
                });
            }
            t.exams.insert(exam.id.clone(), exam.clone());
            Ok(())
        })
    }

    async fn update_exam(&self, exam: &Exam) -> Result<(), BackendError> {
        self.with_tables(|t| {
            Self::require_admin(t)?;
            match t.exams.get_mut(&exam.id) {
                Some(slot) => {
                    *slot = exam.clone();
                    Ok(())
                }
                None => Err(BackendError::NotFound(format!("exam {}", exam.id))),
            }
        })
    }

    async fn delete_exam(&self, exam_id: &str) -> Result<(), BackendError> {
        self.with_tables(|t| {
            Self::require_admin(t)?;
            t.exams.remove(exam_id);
            Ok(())
        })
    }

    async fn insert_question(&self, question: &NewQuestion) -> Result<QuestionId, BackendError> {
        self.with_tables(|t| {
            Self::require_admin(t)?;
            let id = t.next_question_id;
            t.next_question_id += 1;
            t.questions.insert(id, question.clone().with_id(id));
            Ok(id)
        })
    }

    async fn update_question(
        &self,
        id: QuestionId,
        question: &NewQuestion,
    ) -> Result<(), BackendError> {
        self.with_tables(|t| {
            Self::require_admin(t)?;
            match t.questions.get_mut(&id) {
                Some(slot) => {
                    *slot = question.clone().with_id(id);
                    Ok(())
                }
                None => Err(BackendError::NotFound(format!("question {}", id))),
            }
        })
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), BackendError> {
        self.with_tables(|t| {
            Self::require_admin(t)?;
            t.questions.remove(&id);
            Ok(())
        })
    }

    async fn bulk_insert_questions(&self, questions: &[NewQuestion]) -> Result<usize, BackendError> {
        self.with_tables(|t| {
            Self::require_admin(t)?;
            for q in questions {
                let id = t.next_question_id;
                t.next_question_id += 1;
                t.questions.insert(id, q.clone().with_id(id));
            }
            Ok(questions.len())
        })
    }

    async fn upload_file(
        &self,
        name: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, BackendError> {
        self.with_tables(|t| {
            Self::require_admin(t)?;
            t.files.insert(name.to_string(), bytes);
            Ok(format!("memory://images/{}", name))
        })
    }
}

#[async_trait]
impl ProgressStore for MemoryBackend {
    async fn list_marks(&self, kind: MarkKind, user_id: &str) -> Result<Vec<QuestionId>, BackendError> {
        Ok(self.marks(kind, user_id))
    }

    async fn insert_mark(
        &self,
        kind: MarkKind,
        user_id: &str,
        question_id: QuestionId,
    ) -> Result<(), BackendError> {
        self.with_tables(|t| {
            Self::check_writable(t)?;
            t.marks.entry((kind, user_id.to_string())).or_default().push(question_id);
            Ok(())
        })
    }

    async fn delete_mark(
        &self,
        kind: MarkKind,
        user_id: &str,
        question_id: QuestionId,
    ) -> Result<(), BackendError> {
        self.with_tables(|t| {
            Self::check_writable(t)?;
            if let Some(rows) = t.marks.get_mut(&(kind, user_id.to_string())) {
                rows.retain(|id| *id != question_id);
            }
            Ok(())
        })
    }

    async fn list_results(&self, user_id: &str) -> Result<Vec<TestResult>, BackendError> {
        Ok(self.with_tables(|t| {
            t.results.iter().rev().filter(|r| r.user_id == user_id).cloned().collect()
        }))
    }

    async fn insert_result(&self, result: &NewTestResult) -> Result<(), BackendError> {
        self.with_tables(|t| {
            Self::check_writable(t)?;
            let id = t.results.len() as i64 + 1;
            t.results.push(TestResult {
                id,
                user_id: result.user_id.clone(),
                title: result.title.clone(),
                score: result.score,
                max_score: result.max_score,
                correct_count: result.correct_count,
                wrong_count: result.wrong_count,
                created_at: Utc::now(),
            });
            Ok(())
        })
    }
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
    async fn current_session(&self) -> Result<Option<Identity>, BackendError> {
        Ok(self.with_tables(|t| t.session.clone()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        let identity = self.with_tables(|t| match t.accounts.get(email) {
            Some((stored, identity)) if stored == password => {
                t.session = Some(identity.clone());
                Ok(identity.clone())
            }
            _ => Err(BackendError::InvalidCredentials),
        })?;
        let _ = self.events.send(AuthEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        let identity = self.with_tables(|t| {
            if t.accounts.contains_key(email) {
                return Err(BackendError::ApiError { status: 422, message: "User already registered".into() });
            }
            let identity = Identity {
                user_id: format!("user-{}", t.accounts.len() + 1),
                email: email.to_string(),
                role: Role::Student,
            };
            t.accounts.insert(email.to_string(), (password.to_string(), identity.clone()));
            t.session = Some(identity.clone());
            Ok(identity)
        })?;
        let _ = self.events.send(AuthEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    fn oauth_url(&self, provider: &str) -> Result<String, BackendError> {
        Ok(format!("memory://auth/authorize?provider={}", provider))
    }

    async fn complete_oauth(&self, access_token: &str) -> Result<Identity, BackendError> {
        // offline mode treats the token as the email of an existing account
        let identity = self.with_tables(|t| match t.accounts.get(access_token) {
            Some((_, identity)) => {
                t.session = Some(identity.clone());
                Ok(identity.clone())
            }
            None => Err(BackendError::InvalidCredentials),
        })?;
        let _ = self.events.send(AuthEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.with_tables(|t| t.session = None);
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

/// The four exam categories offered out of the box
pub fn default_exams() -> Vec<Exam> {
    let exam = |id: &str, name: &str, subjects: &[&str]| Exam {
        id: id.to_string(),
        name: name.to_string(),
        subjects: subjects.iter().map(|s| s.to_string()).collect(),
        icon_url: None,
        access_code: None,
    };
    vec![
        exam("JEE", "JEE Main", &["Physics", "Chemistry", "Maths"]),
        exam("NEET", "NEET", &["Physics", "Chemistry", "Biology"]),
        exam("SSC", "SSC / Govt", &["GK", "Reasoning", "English", "Maths"]),
        exam("UPSC", "UPSC", &["GK", "History", "Geography"]),
    ]
}

fn sample_questions() -> Vec<NewQuestion> {
    let q = |exam: &str, subject: &str, chapter: &str, text: &str, options: [&str; 4], correct, solution: &str| {
        NewQuestion {
            exam_id: exam.to_string(),
            subject: subject.to_string(),
            chapter: chapter.to_string(),
            text: text.to_string(),
            option_a: options[0].to_string(),
            option_b: options[1].to_string(),
            option_c: options[2].to_string(),
            option_d: options[3].to_string(),
            correct,
            difficulty: Difficulty::Easy,
            year: None,
            solution: Some(solution.to_string()),
            image_url: None,
        }
    };
    vec![
        q("JEE", "Maths", "Algebra", "If x + 1/x = 2, then x^2 + 1/x^2 equals", ["0", "2", "4", "1"], OptionKey::B,
          "Square both sides: x^2 + 2 + 1/x^2 = 4."),
        q("JEE", "Physics", "Kinematics", "SI unit of acceleration is", ["m/s", "m/s^2", "m^2/s", "s/m"], OptionKey::B,
          "Acceleration is change of velocity per second."),
        q("NEET", "Biology", "Cell", "Powerhouse of the cell is", ["Nucleus", "Ribosome", "Mitochondria", "Golgi body"],
          OptionKey::C, "Mitochondria produce ATP."),
        q("SSC", "GK", "History", "The Battle of Plassey was fought in", ["1757", "1764", "1857", "1526"], OptionKey::A,
          "Robert Clive defeated Siraj-ud-Daulah in 1757."),
        q("SSC", "GK", "Polity", "The CAG is appointed by the", ["Prime Minister", "President", "Chief Justice", "Parliament"],
          OptionKey::B, "Article 148."),
        q("UPSC", "Geography", "Rivers", "Which river is called the Sorrow of Bihar?", ["Kosi", "Ganga", "Son", "Gandak"],
          OptionKey::A, "The Kosi frequently changes course and floods."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn questions_list_newest_first() {
        let backend = MemoryBackend::seeded();
        let questions = backend.list_questions(&QuestionFilter::default()).await.unwrap();
        assert!(questions.windows(2).all(|w| w[0].id > w[1].id));
    }

    #[tokio::test]
    async fn content_writes_need_admin_role() {
        let backend = MemoryBackend::seeded()
            .with_account("student@targetup.in", "pw", Role::Student)
            .with_account("admin@targetup.in", "pw", Role::Admin);

        let err = backend.delete_question(1).await.unwrap_err();
        assert!(matches!(err, BackendError::NotSignedIn));

        backend.sign_in("student@targetup.in", "pw").await.unwrap();
        assert!(matches!(backend.delete_question(1).await, Err(BackendError::Forbidden)));

        backend.sign_in("admin@targetup.in", "pw").await.unwrap();
        let before = backend.question_count();
        backend.delete_question(1).await.unwrap();
        assert_eq!(backend.question_count(), before - 1);
    }

    #[tokio::test]
    async fn sign_in_notifies_subscribers() {
        let backend = MemoryBackend::new().with_account("a@b.in", "pw", Role::Student);
        let mut rx = backend.subscribe();
        backend.sign_in("a@b.in", "pw").await.unwrap();
        assert!(matches!(rx.recv().await.unwrap(), AuthEvent::SignedIn(_)));
        backend.sign_out().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn coded_exams_are_hidden_without_code() {
        let backend = MemoryBackend::seeded();
        backend.seed_exam(Exam {
            id: "BATCH".into(),
            name: "Batch 7".into(),
            subjects: vec!["GK".into()],
            icon_url: None,
            access_code: Some("B7".into()),
        });
        assert_eq!(backend.list_exams(None).await.unwrap().len(), 4);
        assert_eq!(backend.list_exams(Some("B7")).await.unwrap().len(), 5);
    }
}
