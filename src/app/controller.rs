//! Applies key presses, commands and backend results to [`AppState`]
//!
//! Remote calls run as tokio tasks and report back over an mpsc channel as
//! [`BackendEvent`]s, so the event loop never waits on the network. Identity
//! changes arrive separately on the provider's broadcast channel.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{broadcast, mpsc};

use super::command::{Command, HELP_TEXT, ParseResult, parse_command};
use super::input::{Action, key_with_modifier_to_action};
use super::state::{
    AdminTab, AppState, BackOutcome, Dialog, MAX_TEST_SIZE, MIN_TEST_SIZE, PendingConfirm, Screen,
    SetupField,
};
use crate::admin::{self, exam_from_fields, parse_fields, question_from_fields};
use crate::auth::{AuthBridge, CloudSnapshot, SourceChange, fetch_cloud};
use crate::backend::{AuthEvent, Backend, QuestionFilter, TokenVault};
use crate::config::Config;
use crate::model::{Exam, Identity, NewQuestion, NewTestResult, OptionKey, Question, TestResult};
use crate::quiz::{AnswerOutcome, TestConfig, TestReport, TestSession};
use crate::sync::{ProgressSync, RemoteWrite};
use crate::theme::ThemeMode;

/// Outcome of a finished remote call
#[derive(Debug)]
pub enum BackendEvent {
    ExamsLoaded(Result<Vec<Exam>, String>),
    QuestionsLoaded(Result<Vec<Question>, String>),
    SessionRestored(Result<Option<Identity>, String>),
    CloudLoaded(Result<CloudSnapshot, String>),
    HistoryLoaded { user_id: String, result: Result<Vec<TestResult>, String> },
    WriteFinished { id: u64, result: Result<(), String> },
    ResultSaved { user_id: String, result: Result<(), String> },
    AuthFinished(Result<Identity, String>),
    SignedOut(Result<(), String>),
    /// A content write finished; `Ok` carries the status message
    AdminFinished(Result<String, String>),
    Uploaded(Result<String, String>),
}

/// Whether the event loop should keep running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Controller {
    pub state: AppState,
    config: Config,
    backend: Backend,
    auth: AuthBridge,
    auth_events: broadcast::Receiver<AuthEvent>,
    tx: mpsc::UnboundedSender<BackendEvent>,
    rx: mpsc::UnboundedReceiver<BackendEvent>,
    rng: StdRng,
    save_config: bool,
}

impl Controller {
    pub fn new(
        config: Config,
        backend: Backend,
        vault: Arc<dyn TokenVault>,
        progress: ProgressSync,
    ) -> Self {
        let auth = AuthBridge::new(backend.identity.clone(), vault);
        let auth_events = auth.subscribe();
        let (tx, rx) = mpsc::unbounded_channel();
        let state = AppState::new(progress, config.default_test_size);
        Self {
            state,
            config,
            backend,
            auth,
            auth_events,
            tx,
            rx,
            rng: StdRng::from_os_rng(),
            save_config: false,
        }
    }

    /// Write theme and access-code changes back to config.json
    pub fn persist_config(mut self) -> Self {
        self.save_config = true;
        self
    }

    /// Use a fixed seed for test sampling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// State to draw, alongside the settings that style it
    pub fn view(&mut self) -> (&mut AppState, &Config) {
        (&mut self.state, &self.config)
    }

    /// Fetch content and restore any stored session
    pub fn start(&mut self) {
        self.refresh_content();
        let auth = self.auth.clone();
        self.spawn(async move {
            BackendEvent::SessionRestored(auth.restore().await.map_err(|e| e.to_string()))
        });
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = BackendEvent> + Send + 'static,
    {
        self.state.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
    }

    fn refresh_content(&mut self) {
        let content = self.backend.content.clone();
        let code = self.config.access_code.clone();
        self.spawn(async move {
            BackendEvent::ExamsLoaded(
                content.list_exams(code.as_deref()).await.map_err(|e| e.to_string()),
            )
        });

        let content = self.backend.content.clone();
        self.spawn(async move {
            BackendEvent::QuestionsLoaded(
                content.list_questions(&QuestionFilter::default()).await.map_err(|e| e.to_string()),
            )
        });
    }

    fn dispatch(&mut self, write: RemoteWrite) {
        let store = self.backend.progress.clone();
        self.spawn(async move {
            let result = write.send(store.as_ref()).await.map_err(|e| {
                if e.is_recoverable() {
                    tracing::warn!(id = write.id, "Progress write failed: {}", e);
                } else {
                    tracing::error!(id = write.id, "Progress write rejected: {}", e);
                }
                e.to_string()
            });
            BackendEvent::WriteFinished { id: write.id, result }
        });
    }

    fn dispatch_all(&mut self, writes: Vec<RemoteWrite>) {
        for write in writes {
            self.dispatch(write);
        }
    }

    /// Apply whatever has arrived without waiting
    pub fn drain_events(&mut self) -> Result<()> {
        self.drain_auth()?;
        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(event)?;
            self.drain_auth()?;
        }
        Ok(())
    }

    /// Wait until every spawned call has reported back
    pub async fn settle(&mut self) -> Result<()> {
        loop {
            self.drain_auth()?;
            if self.state.in_flight == 0 {
                return Ok(());
            }
            match self.rx.recv().await {
                Some(event) => self.handle_event(event)?,
                None => return Ok(()),
            }
        }
    }

    fn drain_auth(&mut self) -> Result<()> {
        loop {
            match self.auth_events.try_recv() {
                Ok(event) => self.on_auth_event(event)?,
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Missed identity notifications");
                }
                Err(_) => return Ok(()),
            }
        }
    }

    fn on_auth_event(&mut self, event: AuthEvent) -> Result<()> {
        match &event {
            AuthEvent::SignedIn(identity) => {
                self.state.identity = Some(identity.clone());
            }
            AuthEvent::SignedOut => {
                self.state.identity = None;
                self.state.history.clear();
                if self.state.screen() == Screen::AdminDashboard {
                    self.state.enter(Screen::Home);
                }
            }
        }

        match AuthBridge::apply(&event, &mut self.state.progress)? {
            SourceChange::FetchCloud { user_id } => {
                let store = self.backend.progress.clone();
                self.spawn(async move {
                    BackendEvent::CloudLoaded(
                        fetch_cloud(store.as_ref(), &user_id).await.map_err(|e| e.to_string()),
                    )
                });
            }
            SourceChange::Guest | SourceChange::Unchanged => {}
        }
        Ok(())
    }

    /// Apply a finished remote call
    pub fn handle_event(&mut self, event: BackendEvent) -> Result<()> {
        self.state.in_flight = self.state.in_flight.saturating_sub(1);

        match event {
            BackendEvent::ExamsLoaded(Ok(exams)) => {
                tracing::debug!(count = exams.len(), "Exams loaded");
                self.state.exams = exams;
                let len = self.state.list_len();
                self.state.list.clamp(len);
            }
            BackendEvent::QuestionsLoaded(Ok(questions)) => {
                tracing::debug!(count = questions.len(), "Questions loaded");
                self.state.questions = questions;
                let len = self.state.list_len();
                self.state.list.clamp(len);
            }
            BackendEvent::ExamsLoaded(Err(e)) | BackendEvent::QuestionsLoaded(Err(e)) => {
                self.state.dialog = Some(Dialog::error("Could not load content", e));
            }
            BackendEvent::SessionRestored(Ok(Some(identity))) => {
                tracing::info!(email = %identity.email, "Session restored");
                self.on_auth_event(AuthEvent::SignedIn(identity))?;
            }
            BackendEvent::SessionRestored(Ok(None)) => {}
            BackendEvent::SessionRestored(Err(e)) => {
                tracing::warn!("Could not restore session: {}", e);
                self.state.command_line.set_error("Could not restore your session; sign in again");
            }
            BackendEvent::CloudLoaded(Ok(snapshot)) => {
                let CloudSnapshot { user_id, bookmarks, solved, history } = snapshot;
                if self.state.progress.load_cloud(&user_id, bookmarks, solved) {
                    self.state.history = history;
                }
            }
            BackendEvent::CloudLoaded(Err(e)) => {
                self.state.dialog = Some(Dialog::error("Could not load your progress", e));
            }
            BackendEvent::HistoryLoaded { user_id, result } => match result {
                Ok(history) if self.signed_in_as(&user_id) => self.state.history = history,
                Ok(_) => {}
                Err(e) => self.state.command_line.set_error(format!("Could not load history: {}", e)),
            },
            BackendEvent::WriteFinished { id, result } => {
                if let Err(e) = &result {
                    self.state.command_line.set_error(format!("Sync failed: {} (R to retry)", e));
                }
                self.state.progress.finish_write(id, result);
            }
            BackendEvent::ResultSaved { user_id, result } => match result {
                Ok(()) => {
                    let store = self.backend.progress.clone();
                    self.spawn(async move {
                        let result = store.list_results(&user_id).await.map_err(|e| e.to_string());
                        BackendEvent::HistoryLoaded { user_id, result }
                    });
                }
                Err(e) => self.state.dialog = Some(Dialog::error("Could not save result", e)),
            },
            BackendEvent::AuthFinished(Ok(identity)) => {
                self.state.command_line.set_message(format!("Signed in as {}", identity.email));
                self.state.sign_in.clear();
                if self.state.screen() == Screen::SignIn {
                    self.state.enter(Screen::Home);
                }
                self.on_auth_event(AuthEvent::SignedIn(identity))?;
            }
            BackendEvent::AuthFinished(Err(e)) => {
                self.state.dialog = Some(Dialog::error("Sign-in failed", e));
            }
            BackendEvent::SignedOut(result) => {
                if let Err(e) = result {
                    self.state.command_line.set_error(format!("Signed out locally: {}", e));
                } else {
                    self.state.command_line.set_message("Signed out");
                }
                self.on_auth_event(AuthEvent::SignedOut)?;
            }
            BackendEvent::AdminFinished(Ok(message)) => {
                self.state.command_line.set_message(message);
                self.refresh_content();
            }
            BackendEvent::AdminFinished(Err(e)) => {
                self.state.dialog = Some(Dialog::error("Admin action failed", e));
            }
            BackendEvent::Uploaded(Ok(url)) => {
                self.state.dialog = Some(Dialog::info("Uploaded", url));
            }
            BackendEvent::Uploaded(Err(e)) => {
                self.state.dialog = Some(Dialog::error("Upload failed", e));
            }
        }
        Ok(())
    }

    fn signed_in_as(&self, user_id: &str) -> bool {
        self.state.identity.as_ref().is_some_and(|i| i.user_id == user_id)
    }

    /// Advance the test clock; called once per elapsed second
    pub fn tick_second(&mut self) -> Result<()> {
        if self.state.screen() != Screen::TestActive {
            return Ok(());
        }
        let report = self.state.test.as_mut().and_then(TestSession::tick);
        if let Some(report) = report {
            self.state.command_line.set_message("Time's up! Your test was submitted");
            self.finish_test(report)?;
        }
        Ok(())
    }

    /// Handle a key press
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Flow> {
        if self.state.dialog.is_some() {
            return self.handle_dialog_key(key.code);
        }
        if self.state.command_line.is_input_mode() {
            return self.handle_command_key(key.code);
        }
        if self.state.screen() == Screen::SignIn {
            if let Some(flow) = self.handle_sign_in_key(key) {
                return Ok(flow);
            }
        }
        match key_with_modifier_to_action(key.code, key.modifiers) {
            Some(action) => self.handle_action(action),
            None => Ok(Flow::Continue),
        }
    }

    fn handle_dialog_key(&mut self, code: KeyCode) -> Result<Flow> {
        match code {
            KeyCode::Enter | KeyCode::Char('y') => {
                if let Some(dialog) = self.state.dialog.take() {
                    if let Some(action) = dialog.confirm {
                        self.run_confirmed(action)?;
                    }
                }
            }
            KeyCode::Esc | KeyCode::Char('n') => {
                self.state.dialog = None;
            }
            _ => {}
        }
        Ok(Flow::Continue)
    }

    fn handle_command_key(&mut self, code: KeyCode) -> Result<Flow> {
        let cl = &mut self.state.command_line;
        match code {
            KeyCode::Enter => {
                let input = cl.input.clone();
                cl.add_to_history(input.clone());
                cl.exit_input_mode();
                return self.execute(&input);
            }
            KeyCode::Esc => cl.exit_input_mode(),
            KeyCode::Backspace => {
                if cl.input.is_empty() {
                    cl.exit_input_mode();
                } else {
                    cl.delete_char();
                }
            }
            KeyCode::Left => cl.move_left(),
            KeyCode::Right => cl.move_right(),
            KeyCode::Up => cl.history_up(),
            KeyCode::Down => cl.history_down(),
            KeyCode::Char(c) => cl.insert_char(c),
            _ => {}
        }
        Ok(Flow::Continue)
    }

    /// Text entry on the sign-in screen; `None` falls through to the key map
    fn handle_sign_in_key(&mut self, key: KeyEvent) -> Option<Flow> {
        let form = &mut self.state.sign_in;
        match key.code {
            KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                form.sign_up = !form.sign_up;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return None,
            KeyCode::Char(c) => form.field_mut().push(c),
            KeyCode::Backspace => {
                form.field_mut().pop();
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_focus(),
            KeyCode::Enter => {
                if form.email.trim().is_empty() || form.password.is_empty() {
                    self.state.dialog =
                        Some(Dialog::error("Sign in", "Please enter email and password"));
                } else {
                    let (email, password) = (form.email.trim().to_string(), form.password.clone());
                    let sign_up = form.sign_up;
                    self.sign_in(email, password, sign_up);
                }
            }
            _ => return None,
        }
        Some(Flow::Continue)
    }

    /// Apply a mapped key action
    pub fn handle_action(&mut self, action: Action) -> Result<Flow> {
        let screen = self.state.screen();
        match action {
            Action::Quit => return Ok(Flow::Quit),
            Action::Command => self.state.command_line.enter_command_mode(),
            Action::Help => self.state.dialog = Some(Dialog::info("Help", HELP_TEXT)),
            Action::ToggleTheme => self.set_theme(None),
            Action::Retry => self.retry(),
            Action::Refresh => self.refresh_content(),
            Action::Back => self.back(),
            Action::Home => self.home(),

            Action::OpenSaved
            | Action::OpenTest
            | Action::OpenProfile
            | Action::OpenSettings
            | Action::OpenAdmin
            | Action::OpenSignIn
                if screen == Screen::TestActive => {}
            Action::OpenSaved => self.state.enter(Screen::Saved),
            Action::OpenTest => self.open_test_setup(),
            Action::OpenProfile => self.state.enter(Screen::Profile),
            Action::OpenSettings => self.state.enter(Screen::Settings),
            Action::OpenAdmin => {
                if self.state.is_admin() {
                    self.state.enter(Screen::AdminDashboard);
                } else {
                    self.state.command_line.set_error("Admin access required");
                }
            }
            Action::OpenSignIn => match &self.state.identity {
                Some(identity) => {
                    let msg = format!("Already signed in as {}", identity.email);
                    self.state.command_line.set_message(msg);
                }
                None => self.state.enter(Screen::SignIn),
            },

            Action::Up | Action::Down | Action::Top | Action::Bottom => self.move_cursor(action),
            Action::Left | Action::Right => self.move_sideways(action == Action::Right),
            Action::Select => self.select()?,

            Action::Choose(option) => match screen {
                Screen::Questions | Screen::Saved => self.answer_practice(option)?,
                Screen::TestActive => {
                    if let Some(test) = self.state.test.as_mut() {
                        test.select(option);
                    }
                }
                _ => {}
            },
            Action::Reset => {
                if matches!(screen, Screen::Questions | Screen::Saved) {
                    self.reset_focused()?;
                }
            }
            Action::ToggleBookmark => self.toggle_bookmark()?,
            Action::Submit => {
                if screen == Screen::TestActive {
                    let unanswered = self.state.test.as_ref().map_or(0, |t| {
                        t.questions().len().saturating_sub(t.answered_count())
                    });
                    self.state.dialog = Some(Dialog::confirm(
                        format!("Submit the test? {} question(s) unanswered.", unanswered),
                        PendingConfirm::SubmitTest,
                    ));
                }
            }

            Action::New | Action::Edit | Action::Delete if screen == Screen::AdminDashboard => {
                self.admin_list_action(action);
            }
            Action::New | Action::Edit | Action::Delete => {}
        }
        Ok(Flow::Continue)
    }

    fn move_cursor(&mut self, action: Action) {
        match self.state.screen() {
            Screen::TestSetup => {
                let setup = &mut self.state.setup;
                setup.focus = match action {
                    Action::Up => setup.focus.prev(),
                    Action::Down => setup.focus.next(),
                    Action::Top => SetupField::Exam,
                    _ => SetupField::Count,
                };
            }
            Screen::TestActive => {
                if let Some(test) = self.state.test.as_mut() {
                    match action {
                        Action::Up => test.prev(),
                        Action::Down => test.next(),
                        _ => {}
                    }
                }
            }
            _ => {
                let len = self.state.list_len();
                let list = &mut self.state.list;
                match action {
                    Action::Up => list.up(),
                    Action::Down => list.down(len),
                    Action::Top => list.top(),
                    _ => list.bottom(len),
                }
            }
        }
    }

    fn move_sideways(&mut self, forward: bool) {
        match self.state.screen() {
            Screen::TestSetup => {
                let state = &mut self.state;
                state.setup.cycle(forward, &state.exams, &state.questions);
            }
            Screen::TestActive => {
                if let Some(test) = self.state.test.as_mut() {
                    if forward { test.next() } else { test.prev() }
                }
            }
            Screen::AdminDashboard => {
                self.state.admin_tab = match self.state.admin_tab {
                    AdminTab::Questions => AdminTab::Exams,
                    AdminTab::Exams => AdminTab::Questions,
                };
                self.state.list.top();
            }
            _ => {}
        }
    }

    fn select(&mut self) -> Result<()> {
        let index = self.state.list.selected;
        match self.state.screen() {
            Screen::Home => {
                if let Some(id) = self.state.home_exams().get(index).map(|e| e.id.clone()) {
                    self.state.nav.select_exam(id);
                    self.state.after_move(Screen::Home);
                }
            }
            Screen::SubjectSelect => {
                if let Some(row) = self.state.subject_rows().into_iter().nth(index) {
                    self.state.nav.select_subject(row.name);
                    self.state.after_move(Screen::SubjectSelect);
                }
            }
            Screen::ChapterSelect => {
                if let Some(row) = self.state.chapter_rows().into_iter().nth(index) {
                    self.state.nav.select_chapter(row.name);
                    self.state.after_move(Screen::ChapterSelect);
                }
            }
            Screen::TestSetup => self.start_test(),
            Screen::TestResult => self.open_test_setup(),
            Screen::Settings => self.set_theme(None),
            _ => {}
        }
        Ok(())
    }

    fn back(&mut self) {
        let from = self.state.screen();
        let outcome = self.state.nav.go_back();
        self.after_leave(from, outcome);
    }

    fn home(&mut self) {
        let from = self.state.screen();
        let outcome = self.state.nav.go_home();
        self.after_leave(from, outcome);
    }

    fn after_leave(&mut self, from: Screen, outcome: BackOutcome) {
        match outcome {
            BackOutcome::Moved(_) => self.state.after_move(from),
            BackOutcome::NeedsConfirmation(target) => {
                self.state.dialog = Some(Dialog::confirm(
                    "Abandon this test? No result will be recorded.",
                    PendingConfirm::LeaveTest(target),
                ));
            }
            BackOutcome::Stayed => {}
        }
    }

    fn run_confirmed(&mut self, action: PendingConfirm) -> Result<()> {
        match action {
            PendingConfirm::LeaveTest(target) => {
                if self.state.screen() == Screen::TestActive {
                    tracing::info!("Test abandoned");
                    self.state.nav.confirm_leave(target);
                    self.state.after_move(Screen::TestActive);
                }
            }
            PendingConfirm::SubmitTest => {
                let report = self.state.test.as_mut().and_then(TestSession::submit);
                if let Some(report) = report {
                    self.finish_test(report)?;
                }
            }
            PendingConfirm::DeleteExam(id) => {
                let content = self.backend.content.clone();
                self.spawn(async move {
                    let result = content.delete_exam(&id).await;
                    BackendEvent::AdminFinished(
                        result.map(|()| format!("Exam {} deleted", id)).map_err(|e| e.to_string()),
                    )
                });
            }
            PendingConfirm::DeleteQuestion(id) => {
                let content = self.backend.content.clone();
                self.spawn(async move {
                    let result = content.delete_question(id).await;
                    BackendEvent::AdminFinished(
                        result.map(|()| format!("Question {} deleted", id)).map_err(|e| e.to_string()),
                    )
                });
            }
        }
        Ok(())
    }

    fn answer_practice(&mut self, option: OptionKey) -> Result<()> {
        let Some(question) = self.state.focused_question().cloned() else {
            return Ok(());
        };
        if self.state.practice.select(&question, option) == AnswerOutcome::Correct {
            if let Some(write) = self.state.progress.mark_solved(question.id)? {
                self.dispatch(write);
            }
        }
        Ok(())
    }

    fn reset_focused(&mut self) -> Result<()> {
        let Some(id) = self.state.focused_question().map(|q| q.id) else {
            return Ok(());
        };
        self.state.practice.reset(id);
        if let Some(write) = self.state.progress.unmark_solved(id)? {
            self.dispatch(write);
        }
        Ok(())
    }

    fn toggle_bookmark(&mut self) -> Result<()> {
        let id = match self.state.screen() {
            Screen::Questions | Screen::Saved => self.state.focused_question().map(|q| q.id),
            Screen::TestActive => {
                self.state.test.as_ref().and_then(|t| t.current_question()).map(|q| q.id)
            }
            _ => None,
        };
        let Some(id) = id else {
            return Ok(());
        };
        if let Some(write) = self.state.progress.toggle_bookmark(id)? {
            self.dispatch(write);
        }
        let len = self.state.list_len();
        self.state.list.clamp(len);
        Ok(())
    }

    fn open_test_setup(&mut self) {
        let setup = &mut self.state.setup;
        if setup.exam.is_none() {
            setup.exam = self
                .state
                .nav
                .selection()
                .exam
                .clone()
                .or_else(|| self.state.exams.first().map(|e| e.id.clone()));
        }
        self.state.enter(Screen::TestSetup);
    }

    fn start_test(&mut self) {
        let setup = &self.state.setup;
        let Some(exam_id) = setup.exam.clone() else {
            self.state.dialog = Some(Dialog::error("Mock test", "Choose an exam first"));
            return;
        };
        let exam_name = self
            .state
            .exams
            .iter()
            .find(|e| e.id == exam_id)
            .map_or_else(|| exam_id.clone(), |e| e.name.clone());

        let mut config = TestConfig::new(exam_id, setup.count);
        config.subject = setup.subject.clone();
        config.chapter = setup.chapter.clone();
        let title = config.title(&exam_name);

        match TestSession::start(&self.state.questions, &config, title, &mut self.rng) {
            Ok(session) => {
                self.state.test = Some(session);
                self.state.last_report = None;
                self.state.enter(Screen::TestActive);
            }
            Err(e) => {
                self.state.dialog = Some(Dialog::info("Mock test", e.to_string()));
            }
        }
    }

    /// Record a submitted test and show the result
    fn finish_test(&mut self, report: TestReport) -> Result<()> {
        tracing::info!(score = report.score, max = report.max_score, "Test submitted");
        let writes = self.state.progress.merge_solved(&report.correct_ids)?;
        self.dispatch_all(writes);

        if let Some(identity) = &self.state.identity {
            let row = NewTestResult {
                user_id: identity.user_id.clone(),
                title: report.title.clone(),
                score: report.score,
                max_score: report.max_score,
                correct_count: report.correct,
                wrong_count: report.wrong,
            };
            let store = self.backend.progress.clone();
            self.spawn(async move {
                let result = store.insert_result(&row).await.map_err(|e| e.to_string());
                BackendEvent::ResultSaved { user_id: row.user_id, result }
            });
        }

        self.state.last_report = Some(report);
        self.state.nav.confirm_leave(Screen::TestResult);
        self.state.after_move(Screen::TestActive);
        Ok(())
    }

    fn retry(&mut self) {
        let writes = self.state.progress.retry_failed();
        if writes.is_empty() {
            self.state.command_line.set_message("Nothing to retry");
        } else {
            self.state.command_line.set_message(format!("Retrying {} write(s)", writes.len()));
            self.dispatch_all(writes);
        }
    }

    fn set_theme(&mut self, mode: Option<ThemeMode>) {
        self.config.theme = mode.unwrap_or_else(|| self.config.theme.toggled());
        self.save_config();
        self.state.command_line.set_message(format!("{} theme", self.config.theme.label()));
    }

    fn save_config(&self) {
        if self.save_config {
            if let Err(e) = self.config.save() {
                tracing::warn!("Failed to save config: {}", e);
            }
        }
    }

    fn sign_in(&mut self, email: String, password: String, sign_up: bool) {
        let identity = self.backend.identity.clone();
        self.spawn(async move {
            let result = if sign_up {
                identity.sign_up(&email, &password).await
            } else {
                identity.sign_in(&email, &password).await
            };
            BackendEvent::AuthFinished(result.map_err(|e| e.to_string()))
        });
    }

    fn admin_list_action(&mut self, action: Action) {
        let index = self.state.list.selected;
        match (self.state.admin_tab, action) {
            (AdminTab::Questions, Action::New) => self.state.command_line.prefill("question-add "),
            (AdminTab::Exams, Action::New) => self.state.command_line.prefill("exam-add "),
            (AdminTab::Questions, Action::Edit) => {
                if let Some(q) = self.state.questions.get(index) {
                    let text = format!("question-edit {} ", q.id);
                    self.state.command_line.prefill(&text);
                }
            }
            (AdminTab::Exams, Action::Edit) => {
                if let Some(e) = self.state.exams.get(index) {
                    let text = format!("exam-edit {} ", e.id);
                    self.state.command_line.prefill(&text);
                }
            }
            (AdminTab::Questions, _) => {
                if let Some(q) = self.state.questions.get(index) {
                    self.state.dialog = Some(Dialog::confirm(
                        format!("Delete question {}?", q.id),
                        PendingConfirm::DeleteQuestion(q.id),
                    ));
                }
            }
            (AdminTab::Exams, _) => {
                if let Some(e) = self.state.exams.get(index) {
                    self.state.dialog = Some(Dialog::confirm(
                        format!("Delete exam {}?", e.name),
                        PendingConfirm::DeleteExam(e.id.clone()),
                    ));
                }
            }
        }
    }

    /// Run a command typed on the command line
    pub fn execute(&mut self, input: &str) -> Result<Flow> {
        match parse_command(input) {
            ParseResult::Ok(command) => self.run_command(command),
            ParseResult::UnknownCommand(cmd) => {
                self.state.command_line.set_error(format!("Unknown command: {}", cmd));
                Ok(Flow::Continue)
            }
            ParseResult::MissingArgument(cmd) => {
                self.state.command_line.set_error(format!("{} needs an argument", cmd));
                Ok(Flow::Continue)
            }
            ParseResult::InvalidArgument(what) => {
                self.state.command_line.set_error(format!("Invalid {}", what));
                Ok(Flow::Continue)
            }
        }
    }

    fn run_command(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Nop => self.state.command_line.clear_message(),
            Command::Help => self.state.dialog = Some(Dialog::info("Help", HELP_TEXT)),
            Command::Home => self.home(),
            Command::Login { email, password } => self.sign_in(email, password, false),
            Command::SignUp { email, password } => self.sign_in(email, password, true),
            Command::OAuth(provider) => match self.backend.identity.oauth_url(&provider) {
                Ok(url) => {
                    self.state.dialog = Some(Dialog::info(
                        format!("Sign in with {}", provider),
                        format!(
                            "Open this URL in a browser, then run :token <access_token> with the token from the redirect.\n\n{}",
                            url
                        ),
                    ));
                }
                Err(e) => self.state.dialog = Some(Dialog::error("OAuth", e.to_string())),
            },
            Command::Token(token) => {
                let identity = self.backend.identity.clone();
                self.spawn(async move {
                    BackendEvent::AuthFinished(
                        identity.complete_oauth(&token).await.map_err(|e| e.to_string()),
                    )
                });
            }
            Command::Logout => {
                if self.state.identity.is_none() {
                    self.state.command_line.set_message("Not signed in");
                } else {
                    let auth = self.auth.clone();
                    self.spawn(async move {
                        BackendEvent::SignedOut(auth.sign_out().await.map_err(|e| e.to_string()))
                    });
                }
            }
            Command::Test(count) => {
                if self.state.screen() != Screen::TestActive {
                    if let Some(count) = count {
                        self.state.setup.count = count.clamp(MIN_TEST_SIZE, MAX_TEST_SIZE);
                    }
                    self.open_test_setup();
                }
            }
            Command::Retry => self.retry(),
            Command::Refresh => self.refresh_content(),
            Command::Code(code) => {
                self.config.access_code = code;
                self.save_config();
                self.refresh_content();
            }
            Command::Theme(mode) => self.set_theme(mode),
            Command::ExamAdd(form) => {
                if let Some(exam) = self.admin_form(|| exam_from_fields(parse_fields(&form)?, None)) {
                    let content = self.backend.content.clone();
                    self.spawn(async move {
                        let result = content.insert_exam(&exam).await;
                        BackendEvent::AdminFinished(
                            result.map(|()| format!("Exam {} added", exam.id)).map_err(|e| e.to_string()),
                        )
                    });
                }
            }
            Command::ExamEdit { id, form } => {
                let base = self.state.exams.iter().find(|e| e.id == id).cloned();
                let Some(base) = base else {
                    self.state.dialog = Some(Dialog::error("Edit exam", format!("No exam {}", id)));
                    return Ok(Flow::Continue);
                };
                if let Some(exam) =
                    self.admin_form(|| exam_from_fields(parse_fields(&form)?, Some(&base)))
                {
                    let content = self.backend.content.clone();
                    self.spawn(async move {
                        let result = content.update_exam(&exam).await;
                        BackendEvent::AdminFinished(
                            result.map(|()| format!("Exam {} updated", exam.id)).map_err(|e| e.to_string()),
                        )
                    });
                }
            }
            Command::ExamDelete(id) => {
                if self.require_admin() {
                    self.state.dialog = Some(Dialog::confirm(
                        format!("Delete exam {}?", id),
                        PendingConfirm::DeleteExam(id),
                    ));
                }
            }
            Command::QuestionAdd(form) => {
                if let Some(question) =
                    self.admin_form(|| question_from_fields(parse_fields(&form)?, None))
                {
                    let content = self.backend.content.clone();
                    self.spawn(async move {
                        let result = content.insert_question(&question).await;
                        BackendEvent::AdminFinished(
                            result.map(|id| format!("Question {} added", id)).map_err(|e| e.to_string()),
                        )
                    });
                }
            }
            Command::QuestionEdit { id, form } => {
                let base = self.state.questions.iter().find(|q| q.id == id).map(NewQuestion::from);
                let Some(base) = base else {
                    self.state.dialog =
                        Some(Dialog::error("Edit question", format!("No question {}", id)));
                    return Ok(Flow::Continue);
                };
                if let Some(question) =
                    self.admin_form(|| question_from_fields(parse_fields(&form)?, Some(&base)))
                {
                    let content = self.backend.content.clone();
                    self.spawn(async move {
                        let result = content.update_question(id, &question).await;
                        BackendEvent::AdminFinished(
                            result.map(|()| format!("Question {} updated", id)).map_err(|e| e.to_string()),
                        )
                    });
                }
            }
            Command::QuestionDelete(id) => {
                if self.require_admin() {
                    self.state.dialog = Some(Dialog::confirm(
                        format!("Delete question {}?", id),
                        PendingConfirm::DeleteQuestion(id),
                    ));
                }
            }
            Command::Import(path) => self.import(&path),
            Command::Upload(path) => {
                if self.require_admin() {
                    let content = self.backend.content.clone();
                    self.spawn(async move {
                        let result = admin::upload_image(content.as_ref(), &path).await;
                        BackendEvent::Uploaded(result.map_err(|e| e.to_string()))
                    });
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn require_admin(&mut self) -> bool {
        if self.state.is_admin() {
            return true;
        }
        self.state.dialog = Some(Dialog::error("Admin", "Admin access required"));
        false
    }

    /// Validate a form locally; errors become a blocking dialog
    fn admin_form<T>(
        &mut self,
        build: impl FnOnce() -> Result<T, admin::FormError>,
    ) -> Option<T> {
        if !self.require_admin() {
            return None;
        }
        match build() {
            Ok(value) => Some(value),
            Err(e) => {
                self.state.dialog = Some(Dialog::error("Invalid form", e.to_string()));
                None
            }
        }
    }

    fn import(&mut self, path: &Path) {
        if !self.require_admin() {
            return;
        }
        let questions = match admin::read_questions(path) {
            Ok(questions) => questions,
            Err(e) => {
                self.state.dialog = Some(Dialog::error("Import failed", e.to_string()));
                return;
            }
        };
        let content = self.backend.content.clone();
        self.spawn(async move {
            let result = admin::import_batch(content.as_ref(), &questions).await;
            BackendEvent::AdminFinished(
                result.map(|n| format!("Imported {} questions", n)).map_err(|e| e.to_string()),
            )
        });
    }
}
