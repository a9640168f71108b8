use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlcoach_core::{ResultRow, TableSchema};

use crate::client::{ChatMessage, CompletionOverrides, LlmClient};
use crate::error::LlmResult;
use crate::model::{AnswerReview, ProblemDraft, TableBlueprint};
use crate::parse::parse_json_response;
use crate::prompts;

/// Everything the reviewer sees about a graded answer.
#[derive(Debug, Clone, Copy)]
pub struct AnswerSubmission<'a> {
    pub user_sql: &'a str,
    pub user_result: &'a [ResultRow],
    pub expected_result: &'a [ResultRow],
    pub table_schemas: &'a [TableSchema],
}

/// The language-model side of the practice workflows.
#[async_trait]
pub trait Tutor: Send + Sync {
    async fn generate_tables(&self, user_prompt: Option<&str>) -> LlmResult<TableBlueprint>;

    async fn generate_problem(
        &self,
        schemas: &[TableSchema],
        user_prompt: Option<&str>,
    ) -> LlmResult<ProblemDraft>;

    async fn review_answer(&self, submission: AnswerSubmission<'_>) -> LlmResult<AnswerReview>;

    async fn check_health(&self) -> bool;
}

/// [`Tutor`] backed by a chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmTutor {
    client: LlmClient,
}

impl LlmTutor {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }

    async fn ask<T: DeserializeOwned>(&self, messages: &[ChatMessage]) -> LlmResult<T> {
        let completion = self
            .client
            .chat_completion(messages, CompletionOverrides::default())
            .await?;
        parse_json_response(LlmClient::extract_content(&completion))
    }
}

#[async_trait]
impl Tutor for LlmTutor {
    async fn generate_tables(&self, user_prompt: Option<&str>) -> LlmResult<TableBlueprint> {
        let messages = prompts::table_generation_messages(user_prompt);
        let blueprint = self.ask::<TableBlueprint>(&messages).await?.cleaned();
        tracing::info!(
            event = "tables_generated",
            theme = %blueprint.theme,
            statements = blueprint.sql_statements.len()
        );
        Ok(blueprint)
    }

    async fn generate_problem(
        &self,
        schemas: &[TableSchema],
        user_prompt: Option<&str>,
    ) -> LlmResult<ProblemDraft> {
        let messages = prompts::problem_generation_messages(schemas, user_prompt);
        let draft: ProblemDraft = self.ask(&messages).await?;
        tracing::info!(event = "problem_drafted", difficulty = draft.difficulty.as_str());
        Ok(draft)
    }

    async fn review_answer(&self, submission: AnswerSubmission<'_>) -> LlmResult<AnswerReview> {
        let messages = prompts::answer_review_messages(
            submission.user_sql,
            submission.user_result,
            submission.expected_result,
            submission.table_schemas,
        );
        let review: AnswerReview = self.ask(&messages).await?;
        tracing::info!(event = "answer_reviewed", is_correct = review.is_correct);
        Ok(review)
    }

    async fn check_health(&self) -> bool {
        self.client.check_health().await
    }
}
