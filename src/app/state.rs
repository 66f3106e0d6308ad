//! Application state definitions

use crate::model::{Exam, Identity, Question, QuestionId, TestResult};
use crate::progress::{self, GroupProgress};
use crate::quiz::{PracticeSession, TestReport, TestSession};
use crate::sync::ProgressSync;

/// Which screen is currently displayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Screen {
    #[default]
    Home,
    SubjectSelect,
    ChapterSelect,
    Questions,
    Saved,
    TestSetup,
    TestActive,
    TestResult,
    Profile,
    Settings,
    AdminDashboard,
    SignIn,
}

impl Screen {
    /// The single predecessor reached by going back
    pub fn back_target(self) -> Option<Screen> {
        match self {
            Screen::Home => None,
            Screen::SubjectSelect => Some(Screen::Home),
            Screen::ChapterSelect => Some(Screen::SubjectSelect),
            Screen::Questions => Some(Screen::ChapterSelect),
            Screen::Saved
            | Screen::TestSetup
            | Screen::TestResult
            | Screen::Profile
            | Screen::AdminDashboard
            | Screen::SignIn => Some(Screen::Home),
            Screen::Settings => Some(Screen::Profile),
            Screen::TestActive => Some(Screen::TestSetup),
        }
    }

    /// Leaving this screen needs the user to confirm
    pub fn is_guarded(self) -> bool {
        self == Screen::TestActive
    }

    /// Leaving this screen discards the selected answers
    pub fn holds_answers(self) -> bool {
        matches!(self, Screen::Questions | Screen::Saved | Screen::TestActive)
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::SubjectSelect => "Subjects",
            Screen::ChapterSelect => "Chapters",
            Screen::Questions => "Practice",
            Screen::Saved => "Saved",
            Screen::TestSetup => "Mock Test",
            Screen::TestActive => "Test in progress",
            Screen::TestResult => "Result",
            Screen::Profile => "Profile",
            Screen::Settings => "Settings",
            Screen::AdminDashboard => "Admin",
            Screen::SignIn => "Sign in",
        }
    }
}

/// Exam, subject and chapter picked while drilling down
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub exam: Option<String>,
    pub subject: Option<String>,
    pub chapter: Option<String>,
}

/// Result of a back or home request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    Moved(Screen),
    /// Nothing changed; the caller must ask before leaving
    NeedsConfirmation(Screen),
    /// Already at the root
    Stayed,
}

/// Current screen plus the drill-down selection
#[derive(Debug, Clone, Default)]
pub struct Navigation {
    screen: Screen,
    selection: Selection,
}

impl Navigation {
    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select_exam(&mut self, exam_id: impl Into<String>) {
        self.selection = Selection { exam: Some(exam_id.into()), subject: None, chapter: None };
        self.screen = Screen::SubjectSelect;
    }

    pub fn select_subject(&mut self, subject: impl Into<String>) {
        self.selection.subject = Some(subject.into());
        self.selection.chapter = None;
        self.screen = Screen::ChapterSelect;
    }

    pub fn select_chapter(&mut self, chapter: impl Into<String>) {
        self.selection.chapter = Some(chapter.into());
        self.screen = Screen::Questions;
    }

    /// Jump straight to a screen that needs no selection
    pub fn open(&mut self, screen: Screen) {
        self.screen = screen;
        if screen == Screen::Home {
            self.selection = Selection::default();
        }
    }

    /// Move to the predecessor, unless the current screen is guarded
    pub fn go_back(&mut self) -> BackOutcome {
        match self.screen.back_target() {
            None => BackOutcome::Stayed,
            Some(target) => self.leave_to(target),
        }
    }

    /// Move to Home, unless the current screen is guarded
    pub fn go_home(&mut self) -> BackOutcome {
        if self.screen == Screen::Home {
            return BackOutcome::Stayed;
        }
        self.leave_to(Screen::Home)
    }

    /// Leave a guarded screen after the user confirmed
    pub fn confirm_leave(&mut self, target: Screen) {
        self.open(target);
    }

    fn leave_to(&mut self, target: Screen) -> BackOutcome {
        if self.screen.is_guarded() {
            return BackOutcome::NeedsConfirmation(target);
        }
        self.open(target);
        BackOutcome::Moved(target)
    }
}

/// Cursor over a vertical list
#[derive(Debug, Clone, Default)]
pub struct ListCursor {
    /// Currently selected row
    pub selected: usize,
    /// First visible row
    pub scroll_offset: usize,
    /// Visible height in rows (updated on render)
    pub visible_height: usize,
}

impl ListCursor {
    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.ensure_selection_visible();
    }

    pub fn down(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
        self.ensure_selection_visible();
    }

    pub fn top(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn bottom(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
        self.ensure_selection_visible();
    }

    /// Keep the cursor inside a list that may have shrunk
    pub fn clamp(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        self.ensure_selection_visible();
    }

    /// Ensure the selected item is visible by adjusting scroll offset
    pub fn ensure_selection_visible(&mut self) {
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        }
        let visible = self.visible_height.max(1);
        if self.selected >= self.scroll_offset + visible {
            self.scroll_offset = self.selected + 1 - visible;
        }
    }
}

/// Test setup field with focus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SetupField {
    #[default]
    Exam,
    Subject,
    Chapter,
    Count,
}

impl SetupField {
    pub const ALL: [SetupField; 4] =
        [SetupField::Exam, SetupField::Subject, SetupField::Chapter, SetupField::Count];

    pub fn next(self) -> Self {
        match self {
            SetupField::Exam => SetupField::Subject,
            SetupField::Subject => SetupField::Chapter,
            SetupField::Chapter | SetupField::Count => SetupField::Count,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            SetupField::Exam | SetupField::Subject => SetupField::Exam,
            SetupField::Chapter => SetupField::Subject,
            SetupField::Count => SetupField::Chapter,
        }
    }
}

/// Smallest and largest selectable test size
pub const MIN_TEST_SIZE: usize = 1;
pub const MAX_TEST_SIZE: usize = 100;
/// The setup screen moves the count in steps of this size
pub const TEST_SIZE_STEP: usize = 5;

/// Test configuration being edited; `None` subject or chapter means "All"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSetupForm {
    pub exam: Option<String>,
    pub subject: Option<String>,
    pub chapter: Option<String>,
    pub count: usize,
    pub focus: SetupField,
}

impl TestSetupForm {
    pub fn new(count: usize) -> Self {
        Self { count: count.clamp(MIN_TEST_SIZE, MAX_TEST_SIZE), ..Default::default() }
    }

    /// Step the focused field through its options
    pub fn cycle(&mut self, forward: bool, exams: &[Exam], questions: &[Question]) {
        match self.focus {
            SetupField::Exam => {
                let ids: Vec<Option<String>> = exams.iter().map(|e| Some(e.id.clone())).collect();
                self.exam = step(&ids, &self.exam, forward).flatten();
                self.subject = None;
                self.chapter = None;
            }
            SetupField::Subject => {
                let subjects = self.subject_options(exams);
                self.subject = step(&subjects, &self.subject, forward).flatten();
                self.chapter = None;
            }
            SetupField::Chapter => {
                let chapters = self.chapter_options(questions);
                self.chapter = step(&chapters, &self.chapter, forward).flatten();
            }
            SetupField::Count => {
                // snap to the step grid, with the minimum below the first step
                self.count = if forward {
                    ((self.count / TEST_SIZE_STEP + 1) * TEST_SIZE_STEP).min(MAX_TEST_SIZE)
                } else if self.count <= TEST_SIZE_STEP {
                    MIN_TEST_SIZE
                } else {
                    (self.count - 1) / TEST_SIZE_STEP * TEST_SIZE_STEP
                };
            }
        }
    }

    /// "All" followed by the chosen exam's subjects
    pub fn subject_options(&self, exams: &[Exam]) -> Vec<Option<String>> {
        let mut options = vec![None];
        if let Some(exam) = exams.iter().find(|e| Some(&e.id) == self.exam.as_ref()) {
            options.extend(exam.subjects.iter().cloned().map(Some));
        }
        options
    }

    /// "All" followed by the distinct chapters in scope, first-seen order
    pub fn chapter_options(&self, questions: &[Question]) -> Vec<Option<String>> {
        let mut options: Vec<Option<String>> = vec![None];
        for q in questions {
            let in_scope = self.exam.as_ref() == Some(&q.exam_id)
                && self.subject.as_ref().is_none_or(|s| s == &q.subject);
            if in_scope && !options.iter().any(|c| c.as_ref() == Some(&q.chapter)) {
                options.push(Some(q.chapter.clone()));
            }
        }
        options
    }
}

fn step<T: Clone + PartialEq>(options: &[T], current: &T, forward: bool) -> Option<T> {
    if options.is_empty() {
        return None;
    }
    let len = options.len();
    let next = match options.iter().position(|o| o == current) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    Some(options[next].clone())
}

/// Sign-in form input field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignInField {
    #[default]
    Email,
    Password,
}

/// Email/password form on the sign-in screen
#[derive(Debug, Clone, Default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
    pub focus: SignInField,
    /// Create an account instead of signing in
    pub sign_up: bool,
}

impl SignInForm {
    pub fn field_mut(&mut self) -> &mut String {
        match self.focus {
            SignInField::Email => &mut self.email,
            SignInField::Password => &mut self.password,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            SignInField::Email => SignInField::Password,
            SignInField::Password => SignInField::Email,
        };
    }

    pub fn clear(&mut self) {
        *self = Self { email: std::mem::take(&mut self.email), ..Default::default() };
    }
}

/// Admin dashboard tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdminTab {
    #[default]
    Questions,
    Exams,
}

/// An action waiting for the user to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConfirm {
    /// Abandon the running test and go to the screen
    LeaveTest(Screen),
    SubmitTest,
    DeleteExam(String),
    DeleteQuestion(QuestionId),
}

/// Modal dialog; blocks all other input until dismissed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub title: String,
    pub message: String,
    pub is_error: bool,
    pub confirm: Option<PendingConfirm>,
}

impl Dialog {
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { title: title.into(), message: message.into(), is_error: true, confirm: None }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { title: title.into(), message: message.into(), is_error: false, confirm: None }
    }

    pub fn confirm(message: impl Into<String>, action: PendingConfirm) -> Self {
        Self {
            title: "Confirm".to_string(),
            message: message.into(),
            is_error: false,
            confirm: Some(action),
        }
    }
}

/// Command line mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommandMode {
    /// Command line hidden or showing status
    #[default]
    Normal,
    /// Accepting : commands
    Command,
}

/// State for the command line input
#[derive(Debug, Clone, Default)]
pub struct CommandLineState {
    pub mode: CommandMode,
    pub input: String,
    /// Cursor position in input (characters)
    pub cursor: usize,
    /// Status/error message to display (when not in input mode)
    pub message: Option<String>,
    pub is_error: bool,
    pub history: Vec<String>,
    pub history_index: Option<usize>,
}

impl CommandLineState {
    /// Maximum number of history entries to keep
    const MAX_HISTORY: usize = 200;

    pub fn enter_command_mode(&mut self) {
        self.prefill("");
    }

    /// Start command mode with text already typed
    pub fn prefill(&mut self, text: &str) {
        self.mode = CommandMode::Command;
        self.input = text.to_string();
        self.cursor = self.char_count();
        self.message = None;
        self.history_index = None;
    }

    pub fn exit_input_mode(&mut self) {
        self.mode = CommandMode::Normal;
        self.input.clear();
        self.cursor = 0;
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.is_error = false;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.is_error = true;
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    fn char_to_byte_index(&self, char_idx: usize) -> usize {
        self.input.char_indices().nth(char_idx).map(|(i, _)| i).unwrap_or(self.input.len())
    }

    fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = self.char_to_byte_index(self.cursor);
        self.input.insert(byte_idx, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_idx = self.char_to_byte_index(self.cursor);
            self.input.remove(byte_idx);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn is_input_mode(&self) -> bool {
        self.mode == CommandMode::Command
    }

    pub fn add_to_history(&mut self, cmd: String) {
        if !cmd.is_empty() && self.history.last() != Some(&cmd) {
            if self.history.len() >= Self::MAX_HISTORY {
                self.history.remove(0);
            }
            self.history.push(cmd);
        }
    }

    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        match self.history_index {
            None => self.history_index = Some(self.history.len() - 1),
            Some(i) if i > 0 => self.history_index = Some(i - 1),
            _ => {}
        }
        if let Some(i) = self.history_index {
            self.input = self.history[i].clone();
            self.cursor = self.char_count();
        }
    }

    pub fn history_down(&mut self) {
        if let Some(i) = self.history_index {
            if i + 1 < self.history.len() {
                self.history_index = Some(i + 1);
                self.input = self.history[i + 1].clone();
                self.cursor = self.char_count();
            } else {
                self.history_index = None;
                self.input.clear();
                self.cursor = 0;
            }
        }
    }
}

/// Full application state
#[derive(Debug)]
pub struct AppState {
    pub nav: Navigation,

    /// Exams visible with the current access code
    pub exams: Vec<Exam>,

    /// Every question, newest first
    pub questions: Vec<Question>,

    /// Signed-in user, if any
    pub identity: Option<Identity>,

    /// Bookmarks and solved set of the active source
    pub progress: ProgressSync,

    /// Test history of the signed-in user, newest first
    pub history: Vec<TestResult>,

    /// Answers picked on the current question set
    pub practice: PracticeSession,

    pub test: Option<TestSession>,
    pub setup: TestSetupForm,
    pub last_report: Option<TestReport>,

    pub list: ListCursor,
    pub admin_tab: AdminTab,
    pub sign_in: SignInForm,

    pub dialog: Option<Dialog>,
    pub command_line: CommandLineState,

    /// Remote calls still running
    pub in_flight: usize,
}

impl AppState {
    pub fn new(progress: ProgressSync, default_test_size: usize) -> Self {
        Self {
            nav: Navigation::default(),
            exams: Vec::new(),
            questions: Vec::new(),
            identity: None,
            progress,
            history: Vec::new(),
            practice: PracticeSession::new(),
            test: None,
            setup: TestSetupForm::new(default_test_size),
            last_report: None,
            list: ListCursor::default(),
            admin_tab: AdminTab::default(),
            sign_in: SignInForm::default(),
            dialog: None,
            command_line: CommandLineState::default(),
            in_flight: 0,
        }
    }

    pub fn screen(&self) -> Screen {
        self.nav.screen()
    }

    pub fn is_admin(&self) -> bool {
        self.identity.as_ref().is_some_and(Identity::is_admin)
    }

    /// Exams offered for practice on the Home screen
    pub fn home_exams(&self) -> Vec<&Exam> {
        self.exams.iter().filter(|e| e.is_practicable()).collect()
    }

    pub fn current_exam(&self) -> Option<&Exam> {
        let id = self.nav.selection().exam.as_ref()?;
        self.exams.iter().find(|e| &e.id == id)
    }

    pub fn exam_progress(&self, exam_id: &str) -> u8 {
        progress::exam_progress(&self.questions, self.progress.solved(), exam_id)
    }

    pub fn subject_rows(&self) -> Vec<GroupProgress> {
        match self.current_exam() {
            Some(exam) => progress::subjects_for(&self.questions, self.progress.solved(), exam),
            None => Vec::new(),
        }
    }

    pub fn chapter_rows(&self) -> Vec<GroupProgress> {
        let selection = self.nav.selection();
        match (&selection.exam, &selection.subject) {
            (Some(exam), Some(subject)) => {
                progress::chapters_for(&self.questions, self.progress.solved(), exam, subject)
            }
            _ => Vec::new(),
        }
    }

    /// Questions shown on the Questions or Saved screen
    ///
    /// Questions without a complete exam/subject/chapter selection resolve to
    /// an empty set.
    pub fn visible_questions(&self) -> Vec<&Question> {
        match self.screen() {
            Screen::Questions => {
                let selection = self.nav.selection();
                let (Some(exam), Some(subject), Some(chapter)) =
                    (&selection.exam, &selection.subject, &selection.chapter)
                else {
                    return Vec::new();
                };
                self.questions
                    .iter()
                    .filter(|q| &q.exam_id == exam && &q.subject == subject && &q.chapter == chapter)
                    .collect()
            }
            Screen::Saved => {
                self.questions.iter().filter(|q| self.progress.is_bookmarked(q.id)).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Question under the cursor on a question list screen
    pub fn focused_question(&self) -> Option<&Question> {
        self.visible_questions().get(self.list.selected).copied()
    }

    /// Length of the list the cursor moves over on the current screen
    pub fn list_len(&self) -> usize {
        match self.screen() {
            Screen::Home => self.home_exams().len(),
            Screen::SubjectSelect => self.subject_rows().len(),
            Screen::ChapterSelect => self.chapter_rows().len(),
            Screen::Questions | Screen::Saved => self.visible_questions().len(),
            Screen::Profile => self.history.len(),
            Screen::AdminDashboard => match self.admin_tab {
                AdminTab::Questions => self.questions.len(),
                AdminTab::Exams => self.exams.len(),
            },
            _ => 0,
        }
    }

    /// Move to another screen, resetting per-screen state
    pub fn enter(&mut self, screen: Screen) {
        let from = self.screen();
        self.nav.open(screen);
        self.after_move(from);
    }

    /// Bookkeeping after the navigation moved from `from`
    pub fn after_move(&mut self, from: Screen) {
        let to = self.screen();
        if from == to {
            return;
        }
        if from.holds_answers() {
            self.practice.clear();
        }
        if from == Screen::TestActive {
            self.test = None;
        }
        self.list = ListCursor { visible_height: self.list.visible_height, ..Default::default() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::fixtures::question;
    use crate::sync::GuestStore;
    use pretty_assertions::assert_eq;

    fn state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let sync = ProgressSync::guest(GuestStore::new(dir.path().join("guest.json"))).unwrap();
        (dir, AppState::new(sync, 10))
    }

    #[test]
    fn drill_down_and_back() {
        let mut nav = Navigation::default();
        nav.select_exam("SSC");
        nav.select_subject("GK");
        nav.select_chapter("History");
        assert_eq!(nav.screen(), Screen::Questions);

        assert_eq!(nav.go_back(), BackOutcome::Moved(Screen::ChapterSelect));
        assert_eq!(nav.go_back(), BackOutcome::Moved(Screen::SubjectSelect));
        assert_eq!(nav.go_back(), BackOutcome::Moved(Screen::Home));
        assert_eq!(nav.go_back(), BackOutcome::Stayed);
        assert_eq!(nav.selection(), &Selection::default());
    }

    #[test]
    fn every_screen_has_one_predecessor_reaching_home() {
        let all = [
            Screen::SubjectSelect,
            Screen::ChapterSelect,
            Screen::Questions,
            Screen::Saved,
            Screen::TestSetup,
            Screen::TestActive,
            Screen::TestResult,
            Screen::Profile,
            Screen::Settings,
            Screen::AdminDashboard,
            Screen::SignIn,
        ];
        for screen in all {
            let mut current = screen;
            let mut steps = 0;
            while let Some(prev) = current.back_target() {
                current = prev;
                steps += 1;
                assert!(steps < 5, "{:?} does not reach Home", screen);
            }
            assert_eq!(current, Screen::Home);
        }
        assert_eq!(Screen::Settings.back_target(), Some(Screen::Profile));
    }

    #[test]
    fn leaving_active_test_needs_confirmation() {
        let mut nav = Navigation::default();
        nav.open(Screen::TestActive);
        assert_eq!(nav.go_back(), BackOutcome::NeedsConfirmation(Screen::TestSetup));
        assert_eq!(nav.screen(), Screen::TestActive);
        assert_eq!(nav.go_home(), BackOutcome::NeedsConfirmation(Screen::Home));

        nav.confirm_leave(Screen::TestSetup);
        assert_eq!(nav.screen(), Screen::TestSetup);
    }

    #[test]
    fn questions_without_selection_are_empty() {
        let (_dir, mut state) = state();
        state.questions = vec![question(1, "SSC", "GK", "History")];
        state.nav.open(Screen::Questions);
        assert!(state.visible_questions().is_empty());
    }

    #[test]
    fn questions_filter_by_exact_selection() {
        let (_dir, mut state) = state();
        state.questions = vec![
            question(1, "SSC", "GK", "History"),
            question(2, "SSC", "GK", "history"),
            question(3, "SSC", "GK", "Polity"),
        ];
        state.nav.select_exam("SSC");
        state.nav.select_subject("GK");
        state.nav.select_chapter("History");
        let ids: Vec<_> = state.visible_questions().iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn leaving_questions_discards_answers() {
        let (_dir, mut state) = state();
        let q = question(1, "SSC", "GK", "History");
        state.questions = vec![q.clone()];
        state.nav.select_exam("SSC");
        state.nav.select_subject("GK");
        state.nav.select_chapter("History");
        state.practice.select(&q, crate::model::OptionKey::A);

        state.enter(Screen::Home);
        assert_eq!(state.practice.answered_count(), 0);
    }

    #[test]
    fn setup_cycles_subjects_and_chapters() {
        let exams = crate::backend::memory::default_exams();
        let questions = vec![
            question(1, "SSC", "GK", "History"),
            question(2, "SSC", "GK", "Polity"),
            question(3, "SSC", "Maths", "Algebra"),
        ];
        let mut form = TestSetupForm::new(10);
        form.exam = Some("SSC".into());

        form.focus = SetupField::Subject;
        form.cycle(true, &exams, &questions);
        assert_eq!(form.subject.as_deref(), Some("GK"));

        form.focus = SetupField::Chapter;
        assert_eq!(
            form.chapter_options(&questions),
            vec![None, Some("History".to_string()), Some("Polity".to_string())]
        );
        form.cycle(false, &exams, &questions);
        assert_eq!(form.chapter.as_deref(), Some("Polity"));

        form.focus = SetupField::Count;
        form.cycle(false, &exams, &questions);
        assert_eq!(form.count, 5);
        form.cycle(false, &exams, &questions);
        assert_eq!(form.count, MIN_TEST_SIZE);
        form.cycle(false, &exams, &questions);
        assert_eq!(form.count, 1);
        form.cycle(true, &exams, &questions);
        assert_eq!(form.count, 5);
    }

    #[test]
    fn setup_count_steps_stay_within_bounds() {
        let mut form = TestSetupForm::new(98);
        form.focus = SetupField::Count;
        form.cycle(true, &[], &[]);
        assert_eq!(form.count, MAX_TEST_SIZE);
        form.cycle(true, &[], &[]);
        assert_eq!(form.count, MAX_TEST_SIZE);

        let mut form = TestSetupForm::new(7);
        form.focus = SetupField::Count;
        form.cycle(false, &[], &[]);
        assert_eq!(form.count, 5);
        assert_eq!(TestSetupForm::new(0).count, 1);
    }

    #[test]
    fn cursor_scrolls_with_selection() {
        let mut cursor = ListCursor { visible_height: 3, ..Default::default() };
        for _ in 0..5 {
            cursor.down(10);
        }
        assert_eq!(cursor.selected, 5);
        assert_eq!(cursor.scroll_offset, 3);
        cursor.clamp(2);
        assert_eq!(cursor.selected, 1);
        assert_eq!(cursor.scroll_offset, 1);
    }
}
