//! Order-insensitive equality of two query results.
//!
//! Rows are normalized into column-sorted, type-tagged tuples, both sides are
//! sorted, and the sorted lists are compared pairwise. Floats compare with a
//! combined relative/absolute tolerance; everything else compares exactly.
//! Tolerant equality is not transitive, so this assumes float noise is small
//! relative to the spacing between distinct rows.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::values::{ResultRow, Scalar};

pub const REL_TOLERANCE: f64 = 1e-9;
pub const ABS_TOLERANCE: f64 = 1e-12;

/// Non-float values. Text and temporal values share the string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Exact<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Str(&'a str),
}

#[derive(Debug, Clone, Copy)]
enum Tagged<'a> {
    Float(f64),
    Other(Exact<'a>),
}

impl Ord for Tagged<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Tagged::Float(left), Tagged::Float(right)) => left.total_cmp(right),
            (Tagged::Float(_), Tagged::Other(_)) => Ordering::Less,
            (Tagged::Other(_), Tagged::Float(_)) => Ordering::Greater,
            (Tagged::Other(left), Tagged::Other(right)) => left.cmp(right),
        }
    }
}

impl PartialOrd for Tagged<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Tagged<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Tagged<'_> {}

type NormalizedRow<'a> = Vec<(&'a str, Tagged<'a>)>;

fn tag(value: &Scalar) -> Tagged<'_> {
    match value {
        // -0.0 and 0.0 are equal under tolerance and must sort together.
        Scalar::Float(value) if *value == 0.0 => Tagged::Float(0.0),
        Scalar::Float(value) => Tagged::Float(*value),
        Scalar::Null => Tagged::Other(Exact::Null),
        Scalar::Bool(value) => Tagged::Other(Exact::Bool(*value)),
        Scalar::Int(value) => Tagged::Other(Exact::Int(*value)),
        Scalar::Text(value) | Scalar::Temporal(value) => Tagged::Other(Exact::Str(value)),
    }
}

fn normalize_row(row: &ResultRow) -> NormalizedRow<'_> {
    let mut normalized: NormalizedRow<'_> =
        row.iter().map(|(column, value)| (column, tag(value))).collect();
    normalized.sort_by(|left, right| left.0.cmp(right.0));
    normalized
}

fn normalize_all(rows: &[ResultRow]) -> Vec<NormalizedRow<'_>> {
    let mut normalized: Vec<_> = rows.iter().map(normalize_row).collect();
    normalized.sort();
    normalized
}

/// Tolerant float equality: `|a-b| <= max(rel * max(|a|,|b|), abs)`.
///
/// Identical values (including equal infinities) are close; NaN is never close.
pub fn floats_close(left: f64, right: f64) -> bool {
    if left == right {
        return true;
    }
    if !left.is_finite() || !right.is_finite() {
        return false;
    }
    let diff = (left - right).abs();
    diff <= (REL_TOLERANCE * left.abs().max(right.abs())).max(ABS_TOLERANCE)
}

fn rows_equal(left: &NormalizedRow<'_>, right: &NormalizedRow<'_>) -> bool {
    left.iter()
        .zip(right.iter())
        .all(|((left_column, left_value), (right_column, right_value))| {
            if left_column != right_column {
                return false;
            }
            match (left_value, right_value) {
                (Tagged::Float(left), Tagged::Float(right)) => floats_close(*left, *right),
                (Tagged::Other(left), Tagged::Other(right)) => left == right,
                _ => false,
            }
        })
}

/// Decide whether two result sets hold the same rows, ignoring row order and
/// column order.
///
/// Only the first row of each side is used for the column-set check; all rows
/// of one side are assumed to share that column set.
pub fn results_equal(actual: &[ResultRow], expected: &[ResultRow]) -> bool {
    if actual.len() != expected.len() {
        return false;
    }

    if actual.is_empty() && expected.is_empty() {
        return true;
    }

    let (Some(first_actual), Some(first_expected)) = (actual.first(), expected.first()) else {
        return false;
    };

    let actual_columns: BTreeSet<&str> = first_actual.columns().collect();
    let expected_columns: BTreeSet<&str> = first_expected.columns().collect();
    if actual_columns != expected_columns {
        return false;
    }

    let actual_rows = normalize_all(actual);
    let expected_rows = normalize_all(expected);

    actual_rows
        .iter()
        .zip(expected_rows.iter())
        .all(|(left, right)| rows_equal(left, right))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row<const N: usize>(entries: [(&str, Scalar); N]) -> ResultRow {
        ResultRow::from(entries)
    }

    #[test]
    fn empty_sets_are_equal() {
        assert!(results_equal(&[], &[]));
    }

    #[test]
    fn length_mismatch_short_circuits() {
        let one = vec![row([("a", Scalar::Int(1))])];
        assert!(!results_equal(&one, &[]));
        assert!(!results_equal(&[], &one));
    }

    #[test]
    fn column_order_is_ignored() {
        let actual = vec![row([("a", Scalar::Int(1)), ("b", Scalar::Int(2))])];
        let expected = vec![row([("b", Scalar::Int(2)), ("a", Scalar::Int(1))])];
        assert!(results_equal(&actual, &expected));
    }

    #[test]
    fn row_order_is_ignored() {
        let actual = vec![row([("a", Scalar::Int(1))]), row([("a", Scalar::Int(2))])];
        let expected = vec![row([("a", Scalar::Int(2))]), row([("a", Scalar::Int(1))])];
        assert!(results_equal(&actual, &expected));
    }

    #[test]
    fn duplicate_rows_count_as_a_multiset() {
        let actual = vec![
            row([("a", Scalar::Int(1))]),
            row([("a", Scalar::Int(1))]),
            row([("a", Scalar::Int(2))]),
        ];
        let expected = vec![
            row([("a", Scalar::Int(1))]),
            row([("a", Scalar::Int(2))]),
            row([("a", Scalar::Int(2))]),
        ];
        assert!(!results_equal(&actual, &expected));
    }

    #[test]
    fn float_rounding_is_absorbed() {
        let actual = vec![row([("a", Scalar::Float(0.1 + 0.2))])];
        let expected = vec![row([("a", Scalar::Float(0.3))])];
        assert!(results_equal(&actual, &expected));
    }

    #[test]
    fn float_differences_beyond_tolerance_fail() {
        let actual = vec![row([("avg", Scalar::Float(10.0))])];
        let expected = vec![row([("avg", Scalar::Float(10.001))])];
        assert!(!results_equal(&actual, &expected));
    }

    #[test]
    fn int_and_string_do_not_coerce() {
        let actual = vec![row([("a", Scalar::Int(1))])];
        let expected = vec![row([("a", Scalar::from("1"))])];
        assert!(!results_equal(&actual, &expected));
    }

    #[test]
    fn int_and_float_have_different_tags() {
        let actual = vec![row([("a", Scalar::Int(1))])];
        let expected = vec![row([("a", Scalar::Float(1.0))])];
        assert!(!results_equal(&actual, &expected));
    }

    #[test]
    fn column_names_must_match() {
        let actual = vec![row([("a", Scalar::Int(1)), ("b", Scalar::Int(2))])];
        let expected = vec![row([("a", Scalar::Int(1)), ("c", Scalar::Int(2))])];
        assert!(!results_equal(&actual, &expected));
    }

    #[test]
    fn temporal_matches_its_string_form() {
        let actual = vec![row([("d", Scalar::Temporal("2024-01-31".to_string()))])];
        let expected = vec![row([("d", Scalar::from("2024-01-31"))])];
        assert!(results_equal(&actual, &expected));
    }

    #[test]
    fn nulls_sort_alongside_values() {
        let actual = vec![
            row([("a", Scalar::Null), ("b", Scalar::from("x"))]),
            row([("a", Scalar::Int(3)), ("b", Scalar::Null)]),
        ];
        let expected = vec![
            row([("b", Scalar::Null), ("a", Scalar::Int(3))]),
            row([("b", Scalar::from("x")), ("a", Scalar::Null)]),
        ];
        assert!(results_equal(&actual, &expected));
    }

    #[test]
    fn close_floats_match_across_reordered_rows() {
        let actual = vec![
            row([("dept", Scalar::from("b")), ("avg", Scalar::Float(2.0 / 3.0))]),
            row([("dept", Scalar::from("a")), ("avg", Scalar::Float(0.1 + 0.7))]),
        ];
        let expected = vec![
            row([("dept", Scalar::from("a")), ("avg", Scalar::Float(0.8))]),
            row([("dept", Scalar::from("b")), ("avg", Scalar::Float(0.6666666666666666))]),
        ];
        assert!(results_equal(&actual, &expected));
    }

    #[test]
    fn signed_zeros_sort_together() {
        let actual = vec![
            row([("a", Scalar::Float(-0.0)), ("b", Scalar::Int(1))]),
            row([("a", Scalar::Float(0.0)), ("b", Scalar::Int(0))]),
        ];
        let expected = vec![
            row([("a", Scalar::Float(0.0)), ("b", Scalar::Int(1))]),
            row([("a", Scalar::Float(-0.0)), ("b", Scalar::Int(0))]),
        ];
        assert!(results_equal(&actual, &expected));
        assert!(results_equal(&expected, &actual));
    }

    #[test]
    fn floats_close_edges() {
        assert!(floats_close(f64::INFINITY, f64::INFINITY));
        assert!(!floats_close(f64::INFINITY, f64::NEG_INFINITY));
        assert!(!floats_close(f64::NAN, f64::NAN));
        assert!(floats_close(0.0, 1e-13));
        assert!(!floats_close(0.0, 1e-11));
        assert!(floats_close(1e12, 1e12 + 1e2));
    }
}
