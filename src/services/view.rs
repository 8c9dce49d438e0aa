//! Derived-view pipeline: sort, then filter.
//!
//! Everything here borrows from the record store and returns references, so
//! building the view never copies or mutates a record.

use crate::models::{FieldValue, Record, SortConfig, SortDirection};
use std::cmp::Ordering;
use unicase::UniCase;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Order records by the configured key and direction.
///
/// With no key the fetch order is returned. The sort is stable, so records
/// with equal keys keep their fetch order in both directions.
pub fn sort_records<'a>(records: &'a [Record], sort: &SortConfig) -> Vec<&'a Record> {
    let mut rows: Vec<&Record> = records.iter().collect();

    if let Some(key) = sort.key.as_deref() {
        rows.sort_by(|a, b| {
            let ordering = compare_field(a.field(key), b.field(key));
            match sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }

    rows
}

/// Keep rows whose name contains `search`, ignoring case. Empty search keeps all.
pub fn filter_records<'a>(rows: Vec<&'a Record>, search: &str) -> Vec<&'a Record> {
    if search.is_empty() {
        return rows;
    }

    let needle = search.to_lowercase();
    rows.into_iter().filter(|r| r.name_contains(&needle)).collect()
}

/// Full pipeline used for rendering.
pub fn derive_view<'a>(records: &'a [Record], sort: &SortConfig, search: &str) -> Vec<&'a Record> {
    filter_records(sort_records(records, sort), search)
}

/// Compare two field values by their runtime type.
///
/// Strings use [`locale_compare`], numbers compare numerically. Integers are
/// compared exactly, including against floats. Mixed kinds under one key fall
/// back to a fixed kind order (numbers, then strings, then anything else) so
/// the comparator stays a total order.
pub fn compare_field(a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Text(x), FieldValue::Text(y)) => locale_compare(x, y),
        (FieldValue::Integer(x), FieldValue::Integer(y)) => x.cmp(&y),
        (FieldValue::Float(x), FieldValue::Float(y)) => x.total_cmp(&y),
        (FieldValue::Integer(i), FieldValue::Float(f)) => compare_integer_float(i, f),
        (FieldValue::Float(f), FieldValue::Integer(i)) => compare_integer_float(i, f).reverse(),
        (x, y) => kind_rank(x).cmp(&kind_rank(y)),
    }
}

fn kind_rank(value: FieldValue<'_>) -> u8 {
    match value {
        FieldValue::Integer(_) | FieldValue::Float(_) => 0,
        FieldValue::Text(_) => 1,
        FieldValue::Other => 2,
    }
}

/// 2^65. Every JSON integer (i64 or u64) lies strictly inside ±2^65, and every
/// float inside it truncates to an exact `i128`.
const INTEGER_BOUND: f64 = 36_893_488_147_419_103_232.0;

fn compare_integer_float(i: i128, f: f64) -> Ordering {
    if f.is_nan() || f >= INTEGER_BOUND {
        return Ordering::Less;
    }
    if f <= -INTEGER_BOUND {
        return Ordering::Greater;
    }

    let whole = f.trunc();
    let fraction = f - whole;
    i.cmp(&(whole as i128)).then(if fraction > 0.0 {
        Ordering::Less
    } else if fraction < 0.0 {
        Ordering::Greater
    } else {
        Ordering::Equal
    })
}

/// Locale-style string ordering.
///
/// Levels, each consulted only when the previous one ties:
/// 1. base letters, ignoring accents and case ("Émile" < "Zed")
/// 2. accents, unaccented first ("resume" < "résumé")
/// 3. case, lowercase first ("ann" < "Ann")
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| UniCase::new(a).cmp(&UniCase::new(b)))
        .then_with(|| b.cmp(a))
}

fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(rows: &[&Record]) -> Vec<String> {
        rows.iter().map(|r| r.name.clone()).collect()
    }

    fn sample() -> Vec<Record> {
        vec![
            Record::new(3, "carol", "c@x.com"),
            Record::new(1, "Bob", "b@x.com"),
            Record::new(2, "Ann", "a@x.com"),
        ]
    }

    #[test]
    fn test_no_key_keeps_fetch_order() {
        let records = sample();
        let rows = sort_records(&records, &SortConfig::default());
        assert_eq!(names(&rows), vec!["carol", "Bob", "Ann"]);
    }

    #[test]
    fn test_string_sort_ignores_case() {
        let records = sample();
        let rows = sort_records(&records, &SortConfig::by("name", SortDirection::Ascending));
        assert_eq!(names(&rows), vec!["Ann", "Bob", "carol"]);

        let rows = sort_records(&records, &SortConfig::by("name", SortDirection::Descending));
        assert_eq!(names(&rows), vec!["carol", "Bob", "Ann"]);
    }

    #[test]
    fn test_numeric_sort_by_id() {
        let records = sample();
        let rows = sort_records(&records, &SortConfig::by("id", SortDirection::Ascending));
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let rows = sort_records(&records, &SortConfig::by("id", SortDirection::Descending));
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_numbers_are_not_compared_as_text() {
        let mut records = Vec::new();
        for (id, score) in [(1, 10), (2, 9), (3, 100)] {
            let mut r = Record::new(id, format!("u{}", id), "x@x.com");
            r.extra.insert("score".to_string(), json!(score));
            records.push(r);
        }

        let rows = sort_records(&records, &SortConfig::by("score", SortDirection::Ascending));
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_equal_keys_keep_fetch_order() {
        let records = vec![
            Record::new(1, "Sam", "first@x.com"),
            Record::new(2, "Ann", "a@x.com"),
            Record::new(3, "sam", "second@x.com"),
            Record::new(4, "Sam", "third@x.com"),
        ];

        let rows = sort_records(&records, &SortConfig::by("name", SortDirection::Ascending));
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        // "sam" sorts before "Sam"; the two "Sam" rows stay in fetch order
        assert_eq!(ids, vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_unknown_key_leaves_order() {
        let records = sample();
        let rows = sort_records(&records, &SortConfig::by("nope", SortDirection::Descending));
        assert_eq!(names(&rows), vec!["carol", "Bob", "Ann"]);
    }

    #[test]
    fn test_filter_matches_name_only() {
        let records = sample();
        let rows = filter_records(records.iter().collect(), "A");
        assert_eq!(names(&rows), vec!["carol", "Ann"]);

        // Email is never searched
        let rows = filter_records(records.iter().collect(), "x.com");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_filter_empty_search_keeps_everything() {
        let records = sample();
        let rows = filter_records(records.iter().collect(), "");
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_view_scenario_sort_toggle() {
        let records = vec![
            Record::new(1, "Bob", "b@x.com"),
            Record::new(2, "Ann", "a@x.com"),
        ];

        let sort = SortConfig::default().clicked("name");
        assert_eq!(names(&derive_view(&records, &sort, "")), vec!["Ann", "Bob"]);

        let sort = sort.clicked("name");
        assert_eq!(names(&derive_view(&records, &sort, "")), vec!["Bob", "Ann"]);
    }

    #[test]
    fn test_view_scenario_search_independent_of_sort() {
        let records = vec![
            Record::new(1, "Bob", "b@x.com"),
            Record::new(2, "Ann", "a@x.com"),
        ];

        for sort in [
            SortConfig::default(),
            SortConfig::by("name", SortDirection::Ascending),
            SortConfig::by("name", SortDirection::Descending),
            SortConfig::by("id", SortDirection::Descending),
        ] {
            assert_eq!(names(&derive_view(&records, &sort, "an")), vec!["Ann"]);
        }
    }

    #[test]
    fn test_view_returns_references_into_store() {
        let records = sample();
        let rows = derive_view(&records, &SortConfig::by("id", SortDirection::Ascending), "");
        assert!(rows.iter().all(|row| records.iter().any(|r| std::ptr::eq(*row, r))));
    }

    #[test]
    fn test_locale_compare() {
        assert_eq!(locale_compare("ann", "Bob"), Ordering::Less);
        assert_eq!(locale_compare("Zed", "alpha"), Ordering::Greater);
        assert_eq!(locale_compare("ann", "Ann"), Ordering::Less);
        assert_eq!(locale_compare("Ann", "Ann"), Ordering::Equal);
    }

    #[test]
    fn test_locale_compare_ignores_accents_first() {
        assert_eq!(locale_compare("Émile", "Zed"), Ordering::Less);
        assert_eq!(locale_compare("émile", "Emma"), Ordering::Less);
        assert_eq!(locale_compare("Zoë", "Zoey"), Ordering::Less);
        assert_eq!(locale_compare("resume", "résumé"), Ordering::Less);
        assert_eq!(locale_compare("résumé", "Resume"), Ordering::Greater);
        // Composed and decomposed forms share a base
        assert_eq!(locale_compare("e\u{301}a", "éb"), Ordering::Less);
    }

    #[test]
    fn test_accented_names_sort_among_their_letter() {
        let records = vec![
            Record::new(1, "Zed", "z@x.com"),
            Record::new(2, "Émile", "e@x.com"),
            Record::new(3, "Ann", "a@x.com"),
        ];

        let rows = sort_records(&records, &SortConfig::by("name", SortDirection::Ascending));
        assert_eq!(names(&rows), vec!["Ann", "Émile", "Zed"]);
    }

    #[test]
    fn test_ids_beyond_float_precision_sort_exactly() {
        let records = vec![
            Record::new(9_007_199_254_740_993, "a", "a@x.com"),
            Record::new(9_007_199_254_740_992, "b", "b@x.com"),
            Record::new(i64::MAX, "c", "c@x.com"),
            Record::new(i64::MAX - 1, "d", "d@x.com"),
        ];

        let rows = sort_records(&records, &SortConfig::by("id", SortDirection::Ascending));
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![9_007_199_254_740_992, 9_007_199_254_740_993, i64::MAX - 1, i64::MAX]
        );
    }

    #[test]
    fn test_integers_against_floats() {
        let int = |i: i128| FieldValue::Integer(i);
        let float = FieldValue::Float;

        assert_eq!(compare_field(int(4), float(4.5)), Ordering::Less);
        assert_eq!(compare_field(float(4.5), int(4)), Ordering::Greater);
        assert_eq!(compare_field(int(-4), float(-4.5)), Ordering::Greater);
        assert_eq!(compare_field(int(5), float(5.0)), Ordering::Equal);
        assert_eq!(compare_field(int(5), float(-0.0)), Ordering::Greater);
        assert_eq!(compare_field(int(0), float(-0.0)), Ordering::Equal);
        // 2^53 + 1 is not representable as f64; the float below is 2^53
        assert_eq!(
            compare_field(int(9_007_199_254_740_993), float(9_007_199_254_740_992.0)),
            Ordering::Greater
        );
        assert_eq!(compare_field(int(i128::from(u64::MAX)), float(1e30)), Ordering::Less);
        assert_eq!(compare_field(int(i128::from(i64::MIN)), float(-1e30)), Ordering::Greater);
    }

    #[test]
    fn test_mixed_kinds_have_fixed_order() {
        assert_eq!(
            compare_field(FieldValue::Integer(5), FieldValue::Text("a")),
            Ordering::Less
        );
        assert_eq!(
            compare_field(FieldValue::Other, FieldValue::Text("a")),
            Ordering::Greater
        );
        assert_eq!(
            compare_field(FieldValue::Text("a"), FieldValue::Float(5.0)),
            Ordering::Greater
        );
        assert_eq!(compare_field(FieldValue::Other, FieldValue::Other), Ordering::Equal);
    }
}
