//! Bulk question import from CSV
//!
//! The header row names the columns. The question text, exam, four options
//! and correct option are mandatory and checked on every row before anything
//! is sent; the rest fall back to defaults when absent or empty.

use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use thiserror::Error;

use crate::model::{Difficulty, NewQuestion, OptionKey};

/// Columns every row must fill
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "question_text",
    "exam_id",
    "option_a",
    "option_b",
    "option_c",
    "option_d",
    "correct_option",
];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV has no '{0}' column")]
    MissingColumn(&'static str),

    #[error("Row {row}: {column} is empty")]
    EmptyField { row: usize, column: &'static str },

    #[error("Row {row}: invalid {column} '{value}'")]
    InvalidValue { row: usize, column: &'static str, value: String },

    #[error("CSV contains no question rows")]
    NoRows,
}

struct Columns {
    headers: StringRecord,
}

impl Columns {
    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        let index = self.headers.iter().position(|h| h.trim() == name)?;
        record.get(index).map(str::trim).filter(|v| !v.is_empty())
    }

    fn text(&self, record: &StringRecord, name: &str, default: &str) -> String {
        self.get(record, name).unwrap_or(default).to_string()
    }

    fn required(&self, record: &StringRecord, row: usize, name: &'static str) -> Result<String, ImportError> {
        self.get(record, name)
            .map(str::to_string)
            .ok_or(ImportError::EmptyField { row, column: name })
    }
}

/// Parse and validate all rows from a CSV file
pub fn read_questions(path: &Path) -> Result<Vec<NewQuestion>, ImportError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    parse_questions(file)
}

/// Parse and validate all rows; rows are numbered from 1 after the header
pub fn parse_questions<R: Read>(reader: R) -> Result<Vec<NewQuestion>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);
    let columns = Columns { headers: rdr.headers()?.clone() };

    for column in REQUIRED_COLUMNS {
        if !columns.headers.iter().any(|h| h.trim() == column) {
            return Err(ImportError::MissingColumn(column));
        }
    }

    let mut questions = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row = index + 1;

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let [text, exam_id, a, b, c, d, correct] = REQUIRED_COLUMNS;
        let text = columns.required(&record, row, text)?;
        let exam_id = columns.required(&record, row, exam_id)?;
        let option_a = columns.required(&record, row, a)?;
        let option_b = columns.required(&record, row, b)?;
        let option_c = columns.required(&record, row, c)?;
        let option_d = columns.required(&record, row, d)?;
        let correct_value = columns.required(&record, row, correct)?;
        let correct = OptionKey::parse(&correct_value).ok_or(ImportError::InvalidValue {
            row,
            column: correct,
            value: correct_value,
        })?;
        let difficulty = match columns.get(&record, "difficulty") {
            Some(value) => Difficulty::parse(value).ok_or_else(|| ImportError::InvalidValue {
                row,
                column: "difficulty",
                value: value.to_string(),
            })?,
            None => Difficulty::Easy,
        };

        questions.push(NewQuestion {
            exam_id,
            subject: columns.text(&record, "subject", "General"),
            chapter: columns.text(&record, "chapter", "General"),
            text,
            option_a,
            option_b,
            option_c,
            option_d,
            correct,
            difficulty,
            year: columns.get(&record, "year").map(str::to_string),
            solution: columns.get(&record, "solution").map(str::to_string),
            image_url: columns.get(&record, "image_url").map(str::to_string),
        });
    }

    if questions.is_empty() {
        return Err(ImportError::NoRows);
    }
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "exam_id,subject,chapter,question_text,option_a,option_b,option_c,option_d,correct_option,difficulty\n";

    #[test]
    fn parses_rows_with_defaults() {
        let csv = format!(
            "{}SSC,GK,Polity,Who appoints the CAG?,PM,President,CJI,Parliament,B,Medium\nSSC,,,Plassey year?,1757,1764,1857,1526,a,\n",
            HEADER
        );
        let questions = parse_questions(csv.as_bytes()).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].correct, OptionKey::B);
        assert_eq!(questions[0].difficulty, Difficulty::Medium);
        assert_eq!(questions[1].subject, "General");
        assert_eq!(questions[1].correct, OptionKey::A);
    }

    #[test]
    fn every_row_is_checked_for_mandatory_columns() {
        let csv = format!(
            "{}SSC,GK,Polity,Q1,a,b,c,d,A,Easy\nSSC,GK,Polity,Q2,a,b,c,d,A,Easy\n,GK,Polity,Q3,a,b,c,d,A,Easy\n",
            HEADER
        );
        match parse_questions(csv.as_bytes()) {
            Err(ImportError::EmptyField { row, column }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "exam_id");
            }
            other => panic!("expected empty field error, got {:?}", other),
        }

        let blank_option = format!("{}SSC,GK,Polity,Q1,a,,c,d,A,Easy\n", HEADER);
        assert!(matches!(
            parse_questions(blank_option.as_bytes()),
            Err(ImportError::EmptyField { row: 1, column: "option_b" })
        ));

        let blank_correct = format!("{}SSC,GK,Polity,Q1,a,b,c,d,,Easy\n", HEADER);
        assert!(matches!(
            parse_questions(blank_correct.as_bytes()),
            Err(ImportError::EmptyField { row: 1, column: "correct_option" })
        ));
    }

    #[test]
    fn option_columns_are_mandatory() {
        let csv = "exam_id,question_text\nJEE,What is 2+2?\n";
        assert!(matches!(
            parse_questions(csv.as_bytes()),
            Err(ImportError::MissingColumn("option_a"))
        ));
    }

    #[test]
    fn missing_header_is_reported() {
        let csv = "exam_id,subject\nJEE,Maths\n";
        assert!(matches!(
            parse_questions(csv.as_bytes()),
            Err(ImportError::MissingColumn("question_text"))
        ));
    }

    #[test]
    fn invalid_option_tag_names_the_row() {
        let csv = format!("{}JEE,Maths,Algebra,Q,a,b,c,d,E,Easy\n", HEADER);
        assert!(matches!(
            parse_questions(csv.as_bytes()),
            Err(ImportError::InvalidValue { row: 1, column: "correct_option", .. })
        ));
    }

    #[test]
    fn header_only_file_has_no_rows() {
        assert!(matches!(parse_questions(HEADER.as_bytes()), Err(ImportError::NoRows)));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.csv");
        std::fs::write(&path, format!("{}NEET,Biology,Cell,Q,a,b,c,d,C,Hard\n", HEADER)).unwrap();
        let questions = read_questions(&path).unwrap();
        assert_eq!(questions[0].exam_id, "NEET");
    }
}
