//! Practice workflows: build the practice tables, author problems and grade
//! learner answers.
//!
//! A learner's SQL always passes through the guard before it reaches the
//! database, and the comparator's verdict is final regardless of what the
//! tutor says about the answer.

mod error;
mod options;
mod outcome;
mod workflow;

pub use error::{JudgeError, JudgeResult};
pub use options::JudgeOptions;
pub use outcome::{AnswerCheck, CreatedTables, GeneratedProblem, Grade, TableOverview};
pub use workflow::Judge;
