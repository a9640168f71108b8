//! Chat-completions client and tutoring prompts for SQLCoach.
//!
//! The model is asked for JSON; [`parse`] pulls the payload out of whatever
//! prose or code fences surround it and [`model`] validates the shape.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod parse;
pub mod prompts;
pub mod tutor;

pub use client::{ChatCompletion, ChatMessage, ChatRole, CompletionOverrides, LlmClient};
pub use config::LlmConfig;
pub use error::{LlmError, LlmResult};
pub use model::{AnswerReview, ProblemDraft, TableBlueprint};
pub use parse::{extract_json_text, parse_json_response};
pub use tutor::{AnswerSubmission, LlmTutor, Tutor};
