use serde::Serialize;
use sqlcoach_core::{ResultRow, TableSchema};

use crate::client::ChatMessage;

const TABLE_DESIGN_SYSTEM: &str = r#"You are the table design assistant of a SQL practice app.

Goal: create tables and sample data that learners can practice SQL against.

Requirements:
1. Create 2-4 tables.
2. Connect the tables with appropriate foreign keys.
3. Insert roughly 10-50 rows of realistic sample data into each table.
4. Pick a realistic scenario that suits learning.

Output format:
```json
{
  "theme": "theme name (for example: employee management, library, e-commerce)",
  "description": "short description of the theme",
  "sql_statements": [
    "CREATE TABLE ...",
    "INSERT INTO ...",
    ...
  ]
}
```

Notes:
- Output only CREATE TABLE and INSERT statements.
- Use PostgreSQL syntax.
- Make the data varied enough to practice JOIN, GROUP BY and aggregate functions.
"#;

const PROBLEM_DESIGN_SYSTEM: &str = r#"You are the problem authoring assistant of a SQL practice app.

Goal: write a SQL practice problem for the table structure below.

Current tables:
{schemas}

Requirements:
1. Learners see the result and must work out the query that produces it.
2. Keep the difficulty between beginner and intermediate.
3. The result should have about 3-10 rows.
4. Use JOIN, GROUP BY and aggregate functions where they fit.

Output format:
```json
{
  "difficulty": "easy|medium|hard",
  "correct_sql": "the SELECT statement",
  "expected_result": [
    {"column1": "value1", "column2": "value2"},
    ...
  ],
  "hint": "optional hint"
}
```

Notes:
- Use a single SELECT statement only.
- The query must run against the tables above.
- Column names must match the actual tables.
- expected_result must have the same shape as the real query result.
"#;

const ANSWER_REVIEW_SYSTEM: &str = r#"You are the grading assistant of a SQL practice app.

Tables:
{schemas}

Grading criteria:
1. Does the result match the expected result exactly?
2. Is the SQL well written (efficient, readable)?
3. Is the feedback useful to the learner?

Output format:
```json
{
  "is_correct": true,
  "score": 0,
  "feedback": "detailed feedback",
  "improvement_suggestions": ["suggestion 1", "suggestion 2"],
  "hint": "hint when the answer is wrong"
}
```

Feedback guidelines:
- When correct, point out what was done well.
- When wrong, say concretely what is wrong.
- Keep the tone constructive and encouraging.
"#;

/// Render table schemas as an indented outline for prompts.
pub fn format_table_schemas(schemas: &[TableSchema]) -> String {
    if schemas.is_empty() {
        return "(no tables)".to_string();
    }

    schemas
        .iter()
        .map(|table| {
            let mut block = format!("Table: {}", table.table_name);
            for column in &table.columns {
                let nullable = if column.is_nullable { "NULL" } else { "NOT NULL" };
                block.push_str(&format!(
                    "\n  - {}: {} {}",
                    column.column_name, column.data_type, nullable
                ));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn table_generation_messages(user_prompt: Option<&str>) -> Vec<ChatMessage> {
    let user = match non_blank(user_prompt) {
        Some(prompt) => format!("Create the tables following these instructions:\n{prompt}"),
        None => "Create tables and sample data suitable for practice. Pick any theme.".to_string(),
    };
    vec![ChatMessage::system(TABLE_DESIGN_SYSTEM), ChatMessage::user(user)]
}

pub fn problem_generation_messages(
    schemas: &[TableSchema],
    user_prompt: Option<&str>,
) -> Vec<ChatMessage> {
    let system = PROBLEM_DESIGN_SYSTEM.replace("{schemas}", &format_table_schemas(schemas));
    let user = match non_blank(user_prompt) {
        Some(prompt) => format!("Write a problem that meets these conditions:\n{prompt}"),
        None => "Write a SQL practice problem of suitable difficulty.".to_string(),
    };
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

pub fn answer_review_messages(
    user_sql: &str,
    user_result: &[ResultRow],
    expected_result: &[ResultRow],
    schemas: &[TableSchema],
) -> Vec<ChatMessage> {
    let system = ANSWER_REVIEW_SYSTEM.replace("{schemas}", &format_table_schemas(schemas));
    let user = format!(
        "Learner SQL:\n```sql\n{user_sql}\n```\n\n\
         Learner result:\n```json\n{}\n```\n\n\
         Expected result:\n```json\n{}\n```\n\n\
         Grade this answer and give feedback.",
        pretty_json(user_result),
        pretty_json(expected_result),
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

fn non_blank(prompt: Option<&str>) -> Option<&str> {
    prompt.map(str::trim).filter(|prompt| !prompt.is_empty())
}

fn pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| format!("<unserializable: {err}>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatRole;
    use sqlcoach_core::{ColumnSchema, Scalar};

    fn employees() -> TableSchema {
        TableSchema {
            table_name: "employees".to_string(),
            columns: vec![
                ColumnSchema {
                    column_name: "id".to_string(),
                    data_type: "INTEGER".to_string(),
                    is_nullable: false,
                    is_primary_key: true,
                    foreign_key: None,
                },
                ColumnSchema {
                    column_name: "manager".to_string(),
                    data_type: "TEXT".to_string(),
                    is_nullable: true,
                    is_primary_key: false,
                    foreign_key: None,
                },
            ],
        }
    }

    #[test]
    fn formats_schemas_as_outline() {
        assert_eq!(
            format_table_schemas(&[employees()]),
            "Table: employees\n  - id: INTEGER NOT NULL\n  - manager: TEXT NULL"
        );
        assert_eq!(format_table_schemas(&[]), "(no tables)");
    }

    #[test]
    fn blank_prompt_uses_default_request() {
        let messages = table_generation_messages(Some("   "));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[1].content.starts_with("Create tables and sample data"));
    }

    #[test]
    fn problem_prompt_embeds_schema() {
        let messages = problem_generation_messages(&[employees()], Some("use GROUP BY"));
        assert!(messages[0].content.contains("Table: employees"));
        assert!(!messages[0].content.contains("{schemas}"));
        assert!(messages[1].content.ends_with("use GROUP BY"));
    }

    #[test]
    fn review_prompt_includes_both_results() {
        let user = vec![ResultRow::from([("n", Scalar::Int(1))])];
        let expected = vec![ResultRow::from([("n", Scalar::Int(2))])];
        let messages = answer_review_messages("SELECT 1 AS n", &user, &expected, &[]);
        let body = &messages[1].content;
        assert!(body.contains("SELECT 1 AS n"));
        assert!(body.contains("\"n\": 1"));
        assert!(body.contains("\"n\": 2"));
    }
}
