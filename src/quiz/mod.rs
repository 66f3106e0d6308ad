//! Answer-selection sessions
//!
//! `practice` covers the browse-and-answer flow over a question set;
//! `test` is the sampled, time-boxed mock test with negative marking.

pub mod practice;

pub use practice::{AnswerOutcome, OptionState, PracticeSession};
pub use test::{SECONDS_PER_QUESTION, TestConfig, TestReport, TestSession, TestSetupError};
