//! `key=value` forms for creating and editing exams and questions
//!
//! A form is a whitespace-separated list of `key=value` pairs typed on the
//! command line. Values containing spaces are double-quoted; `\"` and `\\`
//! escape inside quotes. Edits start from the existing record so only the
//! changed fields need to be given.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{Difficulty, Exam, NewQuestion, OptionKey};

/// Client-side validation failures, reported before any remote call
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Expected key=value, found '{0}'")]
    Malformed(String),

    #[error("Unterminated quote in value for '{0}'")]
    UnterminatedQuote(String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Please fill all fields: {0} is required")]
    Missing(&'static str),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Parsed `key=value` pairs; later duplicates win
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(BTreeMap<String, String>);

impl FormFields {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn take(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Fail on any field the form did not consume
    fn finish(self) -> Result<(), FormError> {
        match self.0.into_keys().next() {
            Some(key) => Err(FormError::UnknownField(key)),
            None => Ok(()),
        }
    }
}

/// Tokenize a form line
pub fn parse_fields(input: &str) -> Result<FormFields, FormError> {
    let mut fields = BTreeMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }
        if chars.next_if_eq(&'=').is_none() || key.is_empty() {
            return Err(FormError::Malformed(key));
        }

        let mut value = String::new();
        if chars.next_if_eq(&'"').is_some() {
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    other => value.push(other),
                }
            }
            if !closed {
                return Err(FormError::UnterminatedQuote(key));
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                value.push(c);
            }
        }

        fields.insert(key.to_lowercase(), value);
    }

    Ok(FormFields(fields))
}

fn required(value: String, field: &'static str) -> Result<String, FormError> {
    if value.trim().is_empty() {
        Err(FormError::Missing(field))
    } else {
        Ok(value.trim().to_string())
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Build an exam from a form, starting from `base` when editing
///
/// Fields: `id`, `name`, `subjects` (comma-separated), `icon`, `code`.
pub fn exam_from_fields(mut fields: FormFields, base: Option<&Exam>) -> Result<Exam, FormError> {
    let mut exam = base.cloned().unwrap_or_else(|| Exam {
        id: String::new(),
        name: String::new(),
        subjects: Vec::new(),
        icon_url: None,
        access_code: None,
    });

    if let Some(id) = fields.take("id") {
        if base.is_some_and(|b| b.id != id.trim()) {
            return Err(FormError::Invalid { field: "id", reason: "cannot be changed".into() });
        }
        exam.id = id;
    }
    if let Some(name) = fields.take("name") {
        exam.name = name;
    }
    if let Some(subjects) = fields.take("subjects") {
        exam.subjects = subjects
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(icon) = fields.take("icon") {
        exam.icon_url = optional(Some(icon));
    }
    if let Some(code) = fields.take("code") {
        exam.access_code = optional(Some(code));
    }
    fields.finish()?;

    exam.id = required(exam.id, "id")?;
    exam.name = required(exam.name, "name")?;
    if exam.subjects.is_empty() {
        return Err(FormError::Missing("subjects"));
    }
    Ok(exam)
}

/// Build a question from a form, starting from `base` when editing
///
/// Fields: `exam`, `subject`, `chapter`, `text`, `a`..`d`, `correct`,
/// `difficulty`, `year`, `solution`, `image`. New questions default to the
/// "General" chapter and Easy difficulty.
pub fn question_from_fields(
    mut fields: FormFields,
    base: Option<&NewQuestion>,
) -> Result<NewQuestion, FormError> {
    let mut q = base.cloned().unwrap_or_else(|| NewQuestion {
        exam_id: String::new(),
        subject: String::new(),
        chapter: "General".to_string(),
        text: String::new(),
        option_a: String::new(),
        option_b: String::new(),
        option_c: String::new(),
        option_d: String::new(),
        correct: OptionKey::A,
        difficulty: Difficulty::Easy,
        year: None,
        solution: None,
        image_url: None,
    });
    let mut correct_given = base.is_some();

    for (key, slot) in [
        ("exam", &mut q.exam_id),
        ("subject", &mut q.subject),
        ("chapter", &mut q.chapter),
        ("text", &mut q.text),
        ("a", &mut q.option_a),
        ("b", &mut q.option_b),
        ("c", &mut q.option_c),
        ("d", &mut q.option_d),
    ] {
        if let Some(value) = fields.take(key) {
            *slot = value;
        }
    }

    if let Some(correct) = fields.take("correct") {
        q.correct = OptionKey::parse(&correct).ok_or_else(|| FormError::Invalid {
            field: "correct",
            reason: format!("'{}' is not one of A, B, C, D", correct),
        })?;
        correct_given = true;
    }
    if let Some(difficulty) = fields.take("difficulty") {
        q.difficulty = Difficulty::parse(&difficulty).ok_or_else(|| FormError::Invalid {
            field: "difficulty",
            reason: format!("'{}' is not Easy, Medium or Hard", difficulty),
        })?;
    }
    if let Some(year) = fields.take("year") {
        q.year = optional(Some(year));
    }
    if let Some(solution) = fields.take("solution") {
        q.solution = optional(Some(solution));
    }
    if let Some(image) = fields.take("image") {
        q.image_url = optional(Some(image));
    }
    fields.finish()?;

    q.exam_id = required(q.exam_id, "exam")?;
    q.subject = required(q.subject, "subject")?;
    q.chapter = required(q.chapter, "chapter")?;
    q.text = required(q.text, "text")?;
    q.option_a = required(q.option_a, "a")?;
    q.option_b = required(q.option_b, "b")?;
    q.option_c = required(q.option_c, "c")?;
    q.option_d = required(q.option_d, "d")?;
    if !correct_given {
        return Err(FormError::Missing("correct"));
    }
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FULL: &str = r#"exam=SSC subject=GK text="Capital of India?" a=Delhi b=Mumbai c=Pune d="Navi Mumbai" correct=a"#;

    #[test]
    fn tokenizer_handles_quotes_and_escapes() {
        let fields = parse_fields(r#"text="He said \"hi\"" a=1"#).unwrap();
        assert_eq!(fields.get("text"), Some(r#"He said "hi""#));
        assert_eq!(fields.get("a"), Some("1"));
    }

    #[test]
    fn tokenizer_rejects_bare_words() {
        assert_eq!(parse_fields("exam=JEE oops"), Err(FormError::Malformed("oops".into())));
        assert_eq!(
            parse_fields(r#"text="never closed"#),
            Err(FormError::UnterminatedQuote("text".into()))
        );
    }

    #[test]
    fn question_form_with_defaults() {
        let q = question_from_fields(parse_fields(FULL).unwrap(), None).unwrap();
        assert_eq!(q.text, "Capital of India?");
        assert_eq!(q.option_d, "Navi Mumbai");
        assert_eq!(q.correct, OptionKey::A);
        assert_eq!(q.chapter, "General");
        assert_eq!(q.difficulty, Difficulty::Easy);
    }

    #[test]
    fn question_form_requires_text() {
        let input = "exam=SSC subject=GK a=1 b=2 c=3 d=4 correct=B";
        assert_eq!(
            question_from_fields(parse_fields(input).unwrap(), None),
            Err(FormError::Missing("text"))
        );
    }

    #[test]
    fn question_form_requires_correct_for_new_questions() {
        let input = r#"exam=SSC subject=GK text=x a=1 b=2 c=3 d=4"#;
        assert_eq!(
            question_from_fields(parse_fields(input).unwrap(), None),
            Err(FormError::Missing("correct"))
        );
    }

    #[test]
    fn question_form_rejects_unknown_option_and_field() {
        let bad_option = format!("{} correct=E", FULL);
        assert!(matches!(
            question_from_fields(parse_fields(&bad_option).unwrap(), None),
            Err(FormError::Invalid { field: "correct", .. })
        ));

        let unknown = format!("{} colour=red", FULL);
        assert_eq!(
            question_from_fields(parse_fields(&unknown).unwrap(), None),
            Err(FormError::UnknownField("colour".into()))
        );
    }

    #[test]
    fn edit_only_changes_given_fields() {
        let base = question_from_fields(parse_fields(FULL).unwrap(), None).unwrap();
        let edited =
            question_from_fields(parse_fields("difficulty=hard correct=b").unwrap(), Some(&base))
                .unwrap();
        assert_eq!(edited.difficulty, Difficulty::Hard);
        assert_eq!(edited.correct, OptionKey::B);
        assert_eq!(edited.text, base.text);
    }

    #[test]
    fn exam_form_splits_subjects() {
        let exam = exam_from_fields(
            parse_fields(r#"id=CUET name="CUET UG" subjects="English, GK,,Maths""#).unwrap(),
            None,
        )
        .unwrap();
        assert_eq!(exam.subjects, vec!["English", "GK", "Maths"]);
        assert!(exam.access_code.is_none());
    }

    #[test]
    fn exam_form_needs_subjects_and_fixed_id() {
        assert_eq!(
            exam_from_fields(parse_fields("id=X name=Y").unwrap(), None),
            Err(FormError::Missing("subjects"))
        );

        let base = exam_from_fields(parse_fields("id=X name=Y subjects=GK").unwrap(), None).unwrap();
        assert!(matches!(
            exam_from_fields(parse_fields("id=Z").unwrap(), Some(&base)),
            Err(FormError::Invalid { field: "id", .. })
        ));
    }
}
