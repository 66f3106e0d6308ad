//! Practice-mode answer selection

use std::collections::HashMap;

use crate::model::{OptionKey, Question, QuestionId};

/// What happened when an option was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The question already had an answer; nothing changed
    Ignored,
    Correct,
    Incorrect,
}

/// How an option should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    /// Question unanswered, option can be picked
    Open,
    /// The correct option of an answered question
    Correct,
    /// The user's pick, which was wrong
    WrongPick,
    /// Any other option of an answered question
    Dimmed,
}

/// Selected answers for the question set currently on screen
#[derive(Debug, Clone, Default)]
pub struct PracticeSession {
    selected: HashMap<QuestionId, OptionKey>,
}

impl PracticeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the first pick for a question; later picks are no-ops
    pub fn select(&mut self, question: &Question, option: OptionKey) -> AnswerOutcome {
        if self.selected.contains_key(&question.id) {
            return AnswerOutcome::Ignored;
        }
        self.selected.insert(question.id, option);
        if question.is_correct(option) {
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect
        }
    }

    /// Return a question to unanswered, true if it had an answer
    pub fn reset(&mut self, id: QuestionId) -> bool {
        self.selected.remove(&id).is_some()
    }

    pub fn selected(&self, id: QuestionId) -> Option<OptionKey> {
        self.selected.get(&id).copied()
    }

    pub fn is_answered(&self, id: QuestionId) -> bool {
        self.selected.contains_key(&id)
    }

    pub fn answered_count(&self) -> usize {
        self.selected.len()
    }

    /// Drop every selection (leaving the screen)
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn option_state(&self, question: &Question, option: OptionKey) -> OptionState {
        let Some(picked) = self.selected(question.id) else {
            return OptionState::Open;
        };
        if question.is_correct(option) {
            OptionState::Correct
        } else if picked == option {
            OptionState::WrongPick
        } else {
            OptionState::Dimmed
        }
    }

    /// Solution text, only once the question is answered
    pub fn solution<'q>(&self, question: &'q Question) -> Option<&'q str> {
        if self.is_answered(question.id) { question.solution.as_deref() } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::fixtures::question;
    use proptest::prelude::*;

    fn option_strategy() -> impl Strategy<Value = OptionKey> {
        prop::sample::select(OptionKey::ALL.to_vec())
    }

    #[test]
    fn wrong_pick_marks_correct_and_pick_differently() {
        let q = question(1, "JEE", "Maths", "Algebra");
        let mut session = PracticeSession::new();

        assert_eq!(session.select(&q, OptionKey::C), AnswerOutcome::Incorrect);
        assert_eq!(session.selected(1), Some(OptionKey::C));
        assert_eq!(session.option_state(&q, OptionKey::B), OptionState::Correct);
        assert_eq!(session.option_state(&q, OptionKey::C), OptionState::WrongPick);
        assert_eq!(session.option_state(&q, OptionKey::A), OptionState::Dimmed);
        assert_eq!(session.option_state(&q, OptionKey::D), OptionState::Dimmed);
    }

    #[test]
    fn unanswered_options_are_open() {
        let q = question(1, "JEE", "Maths", "Algebra");
        let session = PracticeSession::new();
        for key in OptionKey::ALL {
            assert_eq!(session.option_state(&q, key), OptionState::Open);
        }
    }

    #[test]
    fn second_pick_is_ignored() {
        let q = question(1, "JEE", "Maths", "Algebra");
        let mut session = PracticeSession::new();
        assert_eq!(session.select(&q, OptionKey::B), AnswerOutcome::Correct);
        assert_eq!(session.select(&q, OptionKey::B), AnswerOutcome::Ignored);
        assert_eq!(session.select(&q, OptionKey::A), AnswerOutcome::Ignored);
        assert_eq!(session.selected(1), Some(OptionKey::B));
    }

    #[test]
    fn reset_allows_a_new_pick() {
        let q = question(1, "JEE", "Maths", "Algebra");
        let mut session = PracticeSession::new();
        session.select(&q, OptionKey::A);
        assert!(session.reset(1));
        assert!(!session.is_answered(1));
        assert!(!session.reset(1));
        assert_eq!(session.select(&q, OptionKey::B), AnswerOutcome::Correct);
    }

    #[test]
    fn solution_is_gated_on_answer() {
        let mut q = question(1, "JEE", "Maths", "Algebra");
        q.solution = Some("Factorise first.".into());
        let mut session = PracticeSession::new();
        assert_eq!(session.solution(&q), None);
        session.select(&q, OptionKey::D);
        assert_eq!(session.solution(&q), Some("Factorise first."));
    }

    proptest! {
        #[test]
        fn first_pick_sticks(first in option_strategy(), rest in prop::collection::vec(option_strategy(), 0..10)) {
            let q = question(1, "JEE", "Maths", "Algebra");
            let mut session = PracticeSession::new();
            session.select(&q, first);
            for key in rest {
                prop_assert_eq!(session.select(&q, key), AnswerOutcome::Ignored);
            }
            prop_assert_eq!(session.selected(1), Some(first));
        }
    }
}
