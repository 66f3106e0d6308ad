//! Core content and progress records

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Question identifiers are assigned by the content store
pub type QuestionId = i64;

/// One of the four answer options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    /// All options in display order
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    /// Parse an option tag ("A".."D", case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }

    /// Map a pressed key to an option
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'a' => Some(Self::A),
            'b' => Some(Self::B),
            'c' => Some(Self::C),
            'd' => Some(Self::D),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty tag shown on each question card
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

/// An exam category offered for practice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    /// Short identifier, e.g. "JEE"
    pub id: String,
    /// Display name, e.g. "JEE Main"
    pub name: String,
    /// Subjects in display order
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Icon reference (public URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// Access code; absent means public
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
}

impl Exam {
    /// Whether the exam can be practised (it has at least one subject)
    pub fn is_practicable(&self) -> bool {
        !self.subjects.is_empty()
    }

    /// Whether the exam is visible to a caller holding `code`
    pub fn is_visible_with(&self, code: Option<&str>) -> bool {
        match self.access_code.as_deref() {
            None | Some("") => true,
            Some(required) => code.is_some_and(|c| c == required),
        }
    }
}

/// A multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub exam_id: String,
    pub subject: String,
    /// Free-text grouping key, compared by exact string equality
    pub chapter: String,
    #[serde(rename = "question_text")]
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    #[serde(rename = "correct_option")]
    pub correct: OptionKey,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Year or source tag, e.g. "JEE 2023"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Question {
    /// Text of the given option
    pub fn option(&self, key: OptionKey) -> &str {
        match key {
            OptionKey::A => &self.option_a,
            OptionKey::B => &self.option_b,
            OptionKey::C => &self.option_c,
            OptionKey::D => &self.option_d,
        }
    }

    pub fn is_correct(&self, key: OptionKey) -> bool {
        self.correct == key
    }
}

/// Question fields without the store-assigned id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub exam_id: String,
    pub subject: String,
    pub chapter: String,
    #[serde(rename = "question_text")]
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    #[serde(rename = "correct_option")]
    pub correct: OptionKey,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NewQuestion {
    pub fn with_id(self, id: QuestionId) -> Question {
        Question {
            id,
            exam_id: self.exam_id,
            subject: self.subject,
            chapter: self.chapter,
            text: self.text,
            option_a: self.option_a,
            option_b: self.option_b,
            option_c: self.option_c,
            option_d: self.option_d,
            correct: self.correct,
            difficulty: self.difficulty,
            year: self.year,
            solution: self.solution,
            image_url: self.image_url,
        }
    }
}

impl From<&Question> for NewQuestion {
    fn from(q: &Question) -> Self {
        Self {
            exam_id: q.exam_id.clone(),
            subject: q.subject.clone(),
            chapter: q.chapter.clone(),
            text: q.text.clone(),
            option_a: q.option_a.clone(),
            option_b: q.option_b.clone(),
            option_c: q.option_c.clone(),
            option_d: q.option_d.clone(),
            correct: q.correct,
            difficulty: q.difficulty,
            year: q.year.clone(),
            solution: q.solution.clone(),
            image_url: q.image_url.clone(),
        }
    }
}

/// A scored timed-test attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub score: i32,
    pub max_score: i32,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub created_at: DateTime<Utc>,
}

/// A test result about to be appended to history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTestResult {
    pub user_id: String,
    pub title: String,
    pub score: i32,
    pub max_score: i32,
    pub correct_count: u32,
    pub wrong_count: u32,
}

/// Role claim carried by the identity provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_key_parses_case_insensitively() {
        assert_eq!(OptionKey::parse("b"), Some(OptionKey::B));
        assert_eq!(OptionKey::parse(" D "), Some(OptionKey::D));
        assert_eq!(OptionKey::parse("E"), None);
    }

    #[test]
    fn public_exam_is_visible_without_code() {
        let exam = Exam {
            id: "JEE".into(),
            name: "JEE Main".into(),
            subjects: vec!["Maths".into()],
            icon_url: None,
            access_code: None,
        };
        assert!(exam.is_visible_with(None));
        assert!(exam.is_visible_with(Some("anything")));
    }

    #[test]
    fn coded_exam_requires_matching_code() {
        let exam = Exam {
            id: "BATCH".into(),
            name: "Coaching Batch".into(),
            subjects: vec!["GK".into()],
            icon_url: None,
            access_code: Some("X42".into()),
        };
        assert!(!exam.is_visible_with(None));
        assert!(!exam.is_visible_with(Some("x42")));
        assert!(exam.is_visible_with(Some("X42")));
    }

    #[test]
    fn question_deserializes_from_table_row() {
        let json = r#"{
            "id": 7, "exam_id": "SSC", "subject": "GK", "chapter": "Polity",
            "question_text": "Who appoints the CAG?",
            "option_a": "PM", "option_b": "President", "option_c": "CJI", "option_d": "Parliament",
            "correct_option": "B", "difficulty": "Medium"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.correct, OptionKey::B);
        assert_eq!(q.option(OptionKey::B), "President");
        assert!(q.solution.is_none());
    }
}
