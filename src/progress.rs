//! Completion percentages derived from the question list and solved set
//!
//! Everything here is recomputed on demand; callers memoize if they need to.

use std::collections::HashSet;

use crate::model::{Exam, Question, QuestionId};

/// Completion of one grouping (a subject or a chapter)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupProgress {
    pub name: String,
    pub total: usize,
    pub solved: usize,
    pub percent: u8,
}

/// Rounded percentage, half rounds up; 0 when `total` is 0
pub fn percent(solved: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let scaled = (solved.min(total) * 200 + total) / (2 * total);
    scaled as u8
}

/// Percent of an exam's questions that are solved
pub fn exam_progress(questions: &[Question], solved: &HashSet<QuestionId>, exam_id: &str) -> u8 {
    let (total, done) = questions
        .iter()
        .filter(|q| q.exam_id == exam_id)
        .fold((0, 0), |(t, d), q| (t + 1, d + usize::from(solved.contains(&q.id))));
    percent(done, total)
}

/// Per-chapter progress for an exam and subject, in first-discovery order
pub fn chapters_for(
    questions: &[Question],
    solved: &HashSet<QuestionId>,
    exam_id: &str,
    subject: &str,
) -> Vec<GroupProgress> {
    let mut groups: Vec<GroupProgress> = Vec::new();

    for q in questions.iter().filter(|q| q.exam_id == exam_id && q.subject == subject) {
        let idx = match groups.iter().position(|g| g.name == q.chapter) {
            Some(i) => i,
            None => {
                groups.push(GroupProgress {
                    name: q.chapter.clone(),
                    total: 0,
                    solved: 0,
                    percent: 0,
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        group.total += 1;
        if solved.contains(&q.id) {
            group.solved += 1;
        }
    }

    for group in &mut groups {
        group.percent = percent(group.solved, group.total);
    }
    groups
}

/// Per-subject progress for an exam, in the exam's subject order
pub fn subjects_for(
    questions: &[Question],
    solved: &HashSet<QuestionId>,
    exam: &Exam,
) -> Vec<GroupProgress> {
    exam.subjects
        .iter()
        .map(|subject| {
            let (total, done) = questions
                .iter()
                .filter(|q| q.exam_id == exam.id && &q.subject == subject)
                .fold((0, 0), |(t, d), q| (t + 1, d + usize::from(solved.contains(&q.id))));
            GroupProgress {
                name: subject.clone(),
                total,
                solved: done,
                percent: percent(done, total),
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::model::{Difficulty, OptionKey, Question, QuestionId};

    pub fn question(id: QuestionId, exam: &str, subject: &str, chapter: &str) -> Question {
        Question {
            id,
            exam_id: exam.to_string(),
            subject: subject.to_string(),
            chapter: chapter.to_string(),
            text: format!("Question {}", id),
            option_a: "first".into(),
            option_b: "second".into(),
            option_c: "third".into(),
            option_d: "fourth".into(),
            correct: OptionKey::B,
            difficulty: Difficulty::Easy,
            year: None,
            solution: None,
            image_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::question;
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn exam_without_questions_is_zero_percent() {
        let questions = vec![question(1, "JEE", "Maths", "Algebra")];
        let solved = HashSet::from([1]);
        assert_eq!(exam_progress(&questions, &solved, "NEET"), 0);
        assert_eq!(exam_progress(&[], &HashSet::new(), "JEE"), 0);
    }

    #[test]
    fn exam_progress_rounds_half_up() {
        let questions: Vec<_> = (1..=8).map(|i| question(i, "JEE", "Maths", "Algebra")).collect();
        let solved = HashSet::from([1]);
        // 12.5% rounds to 13
        assert_eq!(exam_progress(&questions, &solved, "JEE"), 13);
    }

    #[test]
    fn chapter_progress_scenario() {
        let questions = vec![
            question(1, "SSC", "GK", "History"),
            question(2, "SSC", "GK", "History"),
            question(3, "SSC", "GK", "Polity"),
            question(4, "SSC", "GK", "Polity"),
        ];
        let solved = HashSet::from([2]);

        let chapters = chapters_for(&questions, &solved, "SSC", "GK");
        assert_eq!(
            chapters,
            vec![
                GroupProgress { name: "History".into(), total: 2, solved: 1, percent: 50 },
                GroupProgress { name: "Polity".into(), total: 2, solved: 0, percent: 0 },
            ]
        );
    }

    #[test]
    fn chapters_keep_first_discovery_order_and_exact_names() {
        let questions = vec![
            question(9, "SSC", "GK", "Polity"),
            question(8, "SSC", "GK", "History"),
            question(7, "SSC", "GK", "polity"),
            question(6, "SSC", "Maths", "Algebra"),
        ];
        let names: Vec<_> = chapters_for(&questions, &HashSet::new(), "SSC", "GK")
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["Polity", "History", "polity"]);
    }

    #[test]
    fn subjects_follow_exam_order() {
        let exam = Exam {
            id: "SSC".into(),
            name: "SSC / Govt".into(),
            subjects: vec!["GK".into(), "Reasoning".into()],
            icon_url: None,
            access_code: None,
        };
        let questions = vec![question(1, "SSC", "Reasoning", "Series"), question(2, "SSC", "GK", "Polity")];
        let subjects = subjects_for(&questions, &HashSet::from([1]), &exam);
        assert_eq!(subjects[0].name, "GK");
        assert_eq!(subjects[0].percent, 0);
        assert_eq!(subjects[1].percent, 100);
    }

    proptest! {
        #[test]
        fn percent_is_bounded(solved in 0usize..500, total in 0usize..500) {
            let p = percent(solved, total);
            prop_assert!(p <= 100);
            if total == 0 {
                prop_assert_eq!(p, 0);
            }
        }
    }
}
