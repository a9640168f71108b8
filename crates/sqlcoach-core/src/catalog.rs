use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structure of one practice table in the `public` schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
}

/// Column metadata shown to learners and fed into prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnSchema {
    pub column_name: String,
    /// Uppercased `information_schema` data type (e.g. `CHARACTER VARYING`).
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
}

/// Target of a single-column foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

const THEMES: &[(&[&str], &str)] = &[
    (&["employee", "department"], "employee management"),
    (&["product", "order", "customer"], "e-commerce"),
    (&["student", "course", "enrollment"], "school"),
    (&["book", "author", "library"], "library"),
];

/// Guess a practice theme from table names. Returns `"unknown"` when no
/// keyword matches.
pub fn infer_theme<S: AsRef<str>>(table_names: &[S]) -> &'static str {
    let lowered: Vec<String> = table_names
        .iter()
        .map(|name| name.as_ref().to_lowercase())
        .collect();

    THEMES
        .iter()
        .find(|(keywords, _)| {
            lowered
                .iter()
                .any(|name| keywords.iter().any(|keyword| name.contains(keyword)))
        })
        .map(|(_, theme)| *theme)
        .unwrap_or("unknown")
}
