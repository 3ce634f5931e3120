//! Property tests for the blank-input guards.
//!
//! Whatever the caller passes, a clause with missing input must vanish from
//! the request instead of producing an invalid body.

use esdsl::bulk::{BulkOperation, BulkRequest};
use esdsl::query::{bool_query, Query, SpanContainingQuery, SpanTermQuery, TermQuery};
use esdsl::Aggregations;
use proptest::prelude::*;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Empty or whitespace-only strings.
fn blank() -> impl Strategy<Value = String> {
    "[ \t\n]{0,4}"
}

/// Strings with at least one visible character.
fn word() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

fn maybe_value() -> impl Strategy<Value = Option<i64>> {
    proptest::option::of(any::<i64>())
}

proptest! {
    #[test]
    fn test_blank_term_is_omitted_from_bool(field in word(), value in blank()) {
        let query = bool_query(|b| {
            b.must(|c| {
                c.term("status", "active");
                c.term(&field, value.as_str());
                c.term(&field, None::<&str>);
            });
        });
        let Some(Query::Bool(bool_query)) = query else {
            panic!("bool query expected");
        };
        prop_assert_eq!(bool_query.must.len(), 1);
    }

    #[test]
    fn test_blank_term_field_is_omitted(field in blank(), value in word()) {
        prop_assert!(TermQuery::new(&field, value.as_str()).is_none());
    }

    #[test]
    fn test_terms_drop_nulls(values in proptest::collection::vec(maybe_value(), 0..12)) {
        let expected: Vec<Value> = values.iter().flatten().map(|v| json!(v)).collect();
        let query = esdsl::query::query(|c| {
            c.terms("tag", values.clone());
        });
        match query {
            Some(q) => {
                let body = serde_json::to_value(q).unwrap();
                prop_assert_eq!(&body["terms"]["tag"], &Value::Array(expected));
            }
            None => prop_assert!(expected.is_empty()),
        }
    }

    #[test]
    fn test_span_containing_needs_two_spans(big in proptest::option::of(word()), little in proptest::option::of(word())) {
        let span = |value: &Option<String>| {
            value.as_deref().and_then(|v| SpanTermQuery::new("body", v))
        };
        let containing = SpanContainingQuery::new(span(&big), span(&little));
        prop_assert_eq!(containing.is_some(), big.is_some() && little.is_some());

        // A non-span query never qualifies.
        let mixed = SpanContainingQuery::new(span(&big), TermQuery::new("body", "x"));
        prop_assert!(mixed.is_none());
    }

    #[test]
    fn test_blank_aggregation_names_never_stored(names in proptest::collection::vec(prop_oneof![blank(), word()], 0..10)) {
        let aggs = Aggregations::build(|a| {
            for name in &names {
                a.avg(name, "price");
            }
        });
        prop_assert!(aggs.names().all(|n| !n.trim().is_empty()));
        let mut distinct: Vec<&String> = names.iter().filter(|n| !n.trim().is_empty()).collect();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(aggs.len(), distinct.len());
    }

    #[test]
    fn test_bulk_ndjson_shape(ops in proptest::collection::vec((0u8..4, proptest::option::of(word())), 0..16)) {
        let mut bulk = BulkRequest::new().with_index("docs");
        let mut expected_lines = 0;
        for (kind, id) in &ops {
            let id = id.as_deref().unwrap_or("");
            match kind {
                0 => {
                    bulk.add(BulkOperation::index(json!({"n": 1})).unwrap().with_id(id));
                    expected_lines += 2;
                }
                1 => {
                    bulk.add(BulkOperation::create(json!({"n": 2})).unwrap().with_id(id));
                    expected_lines += 2;
                }
                2 => {
                    let update = BulkOperation::update(id, json!({"n": 3})).unwrap();
                    if update.is_some() {
                        expected_lines += 2;
                    }
                    bulk.add(update);
                }
                _ => {
                    let delete = BulkOperation::delete(id);
                    if delete.is_some() {
                        expected_lines += 1;
                    }
                    bulk.add(delete);
                }
            }
        }

        let body = bulk.to_ndjson().unwrap();
        prop_assert_eq!(body.lines().count(), expected_lines);
        if expected_lines > 0 {
            prop_assert!(body.ends_with('\n'));
        }

        // Every action line with a source is directly followed by it.
        let lines: Vec<Value> = body.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        let mut i = 0;
        while i < lines.len() {
            let action = lines[i].as_object().unwrap().keys().next().unwrap().clone();
            if action == "delete" {
                i += 1;
            } else {
                prop_assert!(lines[i + 1].get("n").is_some() || lines[i + 1].get("doc").is_some());
                i += 2;
            }
        }
    }
}
