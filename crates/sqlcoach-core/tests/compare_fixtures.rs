use std::fs;
use std::path::Path;

use sqlcoach_core::{parse_result_set, results_equal, ResultSet};

fn load(name: &str) -> ResultSet {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let contents = fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("missing fixture at {}", path.display()));
    parse_result_set(&contents).expect("parse fixture")
}

#[test]
fn learner_result_with_shuffled_rows_and_columns_matches() {
    let expected = load("department_averages.expected.json");
    let actual = load("department_averages.shuffled.json");
    assert!(results_equal(&actual, &expected));
}

#[test]
fn learner_result_missing_a_row_does_not_match() {
    let expected = load("department_averages.expected.json");
    let mut actual = load("department_averages.shuffled.json");
    actual.pop();
    assert!(!results_equal(&actual, &expected));
}

#[test]
fn learner_result_with_renamed_column_does_not_match() {
    let expected = load("department_averages.expected.json");
    let actual = load("department_averages.renamed.json");
    assert!(!results_equal(&actual, &expected));
}
