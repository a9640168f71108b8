use std::collections::{BTreeMap, BTreeSet};

use sqlcoach_core::{ColumnSchema, Difficulty, ForeignKeyRef, Problem, TableSchema};

use super::queries::{RawColumn, RawForeignKey, RawProblem};

pub fn map_table(
    table_name: String,
    columns: Vec<RawColumn>,
    primary_key: Vec<String>,
    foreign_keys: Vec<RawForeignKey>,
) -> TableSchema {
    let primary_key: BTreeSet<String> = primary_key.into_iter().collect();
    let mut foreign_keys: BTreeMap<String, ForeignKeyRef> = foreign_keys
        .into_iter()
        .map(|fk| {
            (
                fk.column,
                ForeignKeyRef {
                    table: fk.referenced_table,
                    column: fk.referenced_column,
                },
            )
        })
        .collect();

    let columns = columns
        .into_iter()
        .map(|column| ColumnSchema {
            is_primary_key: primary_key.contains(&column.name),
            foreign_key: foreign_keys.remove(&column.name),
            data_type: column.data_type.to_uppercase(),
            is_nullable: column.is_nullable,
            column_name: column.name,
        })
        .collect();

    TableSchema {
        table_name,
        columns,
    }
}

pub fn map_problem(raw: RawProblem) -> Problem {
    Problem {
        id: raw.id,
        theme: raw.theme,
        difficulty: Difficulty::parse_lenient(&raw.difficulty),
        correct_sql: raw.correct_sql,
        expected_result: raw.expected_result,
        table_schemas: raw.table_schemas,
        hint: raw.hint,
        created_at: raw.created_at,
    }
}

/// Quote an identifier for interpolation into DDL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
