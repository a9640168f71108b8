use std::ops::RangeInclusive;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct JudgeOptions {
    /// Limit for running a learner's query.
    pub answer_timeout: Duration,
    /// Limit for running a generated problem's reference query.
    pub generation_timeout: Duration,
    /// Longest accepted free-text prompt, in characters.
    pub max_prompt_chars: usize,
    /// Row counts outside this range are logged, not rejected.
    pub expected_rows: RangeInclusive<usize>,
}

impl Default for JudgeOptions {
    fn default() -> Self {
        Self {
            answer_timeout: Duration::from_secs(5),
            generation_timeout: Duration::from_secs(10),
            max_prompt_chars: 1000,
            expected_rows: 3..=10,
        }
    }
}
