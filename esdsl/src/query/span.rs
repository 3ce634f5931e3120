//! Span queries
//!
//! Span queries only compose with other span queries. Builders take generic
//! clauses and reclassify them with [`SpanQuery::try_from`]; a clause that is
//! not a span query makes the enclosing span query disappear.

use super::{Clause, FuzzyQuery, PrefixQuery, Query, RangeQuery, RegexpQuery, WildcardQuery};
use crate::error::DslError;
use crate::field_value::{FieldValue, IntoFieldValue};
use crate::one_field_map::{field_keyed_serialize, OneFieldMap};
use crate::util::non_blank;
use serde::Serialize;

/// The span subset of [`Query`], plus `span_gap` which only exists inside
/// `span_near`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SpanQuery {
    #[serde(rename = "span_term")]
    Term(SpanTermQuery),
    #[serde(rename = "span_near")]
    Near(SpanNearQuery),
    #[serde(rename = "span_or")]
    Or(SpanOrQuery),
    #[serde(rename = "span_not")]
    Not(SpanNotQuery),
    #[serde(rename = "span_first")]
    First(SpanFirstQuery),
    #[serde(rename = "span_containing")]
    Containing(SpanContainingQuery),
    #[serde(rename = "span_within")]
    Within(SpanWithinQuery),
    #[serde(rename = "span_multi")]
    Multi(SpanMultiTermQuery),
    #[serde(rename = "field_masking_span")]
    FieldMasking(FieldMaskingSpanQuery),
    #[serde(rename = "span_gap")]
    Gap(SpanGapQuery),
}

impl TryFrom<Query> for SpanQuery {
    type Error = DslError;

    fn try_from(query: Query) -> Result<Self, Self::Error> {
        match query {
            Query::SpanTerm(q) => Ok(SpanQuery::Term(q)),
            Query::SpanNear(q) => Ok(SpanQuery::Near(q)),
            Query::SpanOr(q) => Ok(SpanQuery::Or(q)),
            Query::SpanNot(q) => Ok(SpanQuery::Not(q)),
            Query::SpanFirst(q) => Ok(SpanQuery::First(q)),
            Query::SpanContaining(q) => Ok(SpanQuery::Containing(q)),
            Query::SpanWithin(q) => Ok(SpanQuery::Within(q)),
            Query::SpanMulti(q) => Ok(SpanQuery::Multi(q)),
            Query::FieldMaskingSpan(q) => Ok(SpanQuery::FieldMasking(q)),
            other => Err(DslError::NotASpanQuery(other.kind())),
        }
    }
}

impl SpanQuery {
    /// Back to a top-level query. `span_gap` has no top-level form.
    pub fn into_query(self) -> Option<Query> {
        match self {
            SpanQuery::Term(q) => Some(Query::SpanTerm(q)),
            SpanQuery::Near(q) => Some(Query::SpanNear(q)),
            SpanQuery::Or(q) => Some(Query::SpanOr(q)),
            SpanQuery::Not(q) => Some(Query::SpanNot(q)),
            SpanQuery::First(q) => Some(Query::SpanFirst(q)),
            SpanQuery::Containing(q) => Some(Query::SpanContaining(q)),
            SpanQuery::Within(q) => Some(Query::SpanWithin(q)),
            SpanQuery::Multi(q) => Some(Query::SpanMulti(q)),
            SpanQuery::FieldMasking(q) => Some(Query::FieldMaskingSpan(q)),
            SpanQuery::Gap(_) => None,
        }
    }
}

impl Clause for SpanQuery {
    fn into_clause(self) -> Option<Query> {
        self.into_query()
    }
}

impl Clause for Option<SpanQuery> {
    fn into_clause(self) -> Option<Query> {
        self.and_then(SpanQuery::into_query)
    }
}

/// Resolves a clause to a span query, logging why it was rejected.
fn to_span(clause: impl Clause) -> Option<SpanQuery> {
    match SpanQuery::try_from(clause.into_clause()?) {
        Ok(span) => Some(span),
        Err(e) => {
            tracing::debug!(error = %e, "non-span clause dropped");
            None
        }
    }
}

fn to_spans(clauses: Vec<Query>) -> Vec<SpanQuery> {
    clauses.into_iter().filter_map(to_span).collect()
}

// ============================================================================
// span_term / span_gap
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SpanTermQuery {
    pub field: String,
    pub params: SpanTermParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanTermParams {
    pub value: FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl SpanTermQuery {
    pub fn new(field: &str, value: impl IntoFieldValue) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            params: SpanTermParams {
                value: value.into_field_value()?,
                boost: None,
            },
        })
    }
}

with_setters!(SpanTermQuery {
    with_boost => params.boost: f64,
});

field_keyed_serialize!(SpanTermQuery);

/// `{"span_gap": {"<field>": width}}`, a positional gap inside `span_near`
#[derive(Debug, Clone, PartialEq)]
pub struct SpanGapQuery {
    pub field: String,
    pub width: i32,
}

impl SpanGapQuery {
    pub fn new(field: &str, width: i32) -> Option<Self> {
        if width < 0 {
            return None;
        }
        Some(Self {
            field: non_blank(field)?,
            width,
        })
    }
}

impl Serialize for SpanGapQuery {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OneFieldMap::new(&self.field, &self.width).serialize(serializer)
    }
}

// ============================================================================
// span_near / span_or
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanNearQuery {
    pub clauses: Vec<SpanQuery>,
    pub slop: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_order: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl SpanNearQuery {
    /// Keeps the span clauses; `None` when none survive or `slop` is negative.
    pub fn new(clauses: Vec<Query>, slop: i32) -> Option<Self> {
        if slop < 0 {
            tracing::debug!(slop, "span_near with negative slop dropped");
            return None;
        }
        let clauses = to_spans(clauses);
        if clauses.is_empty() {
            return None;
        }
        Some(Self {
            clauses,
            slop,
            in_order: None,
            boost: None,
        })
    }

    /// Appends a `span_gap` clause; invalid gaps are ignored.
    pub fn with_gap(mut self, field: &str, width: i32) -> Self {
        if let Some(gap) = SpanGapQuery::new(field, width) {
            self.clauses.push(SpanQuery::Gap(gap));
        }
        self
    }
}

with_setters!(SpanNearQuery {
    with_in_order => in_order: bool,
    with_boost => boost: f64,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanOrQuery {
    pub clauses: Vec<SpanQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl SpanOrQuery {
    pub fn new(clauses: Vec<Query>) -> Option<Self> {
        let clauses = to_spans(clauses);
        (!clauses.is_empty()).then_some(Self {
            clauses,
            boost: None,
        })
    }
}

with_setters!(SpanOrQuery {
    with_boost => boost: f64,
});

// ============================================================================
// span_not / span_first / span_containing / span_within
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanNotQuery {
    pub include: Box<SpanQuery>,
    pub exclude: Box<SpanQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dist: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl SpanNotQuery {
    pub fn new(include: impl Clause, exclude: impl Clause) -> Option<Self> {
        Self::build(include, exclude, |_| {})
    }

    /// Like [`SpanNotQuery::new`], then configures `pre`, `post`, `dist`.
    /// Any negative distance drops the query.
    pub fn build(
        include: impl Clause,
        exclude: impl Clause,
        configure: impl FnOnce(&mut SpanNotQuery),
    ) -> Option<Self> {
        let mut query = Self {
            include: Box::new(to_span(include)?),
            exclude: Box::new(to_span(exclude)?),
            pre: None,
            post: None,
            dist: None,
            boost: None,
        };
        configure(&mut query);
        let negative = [query.pre, query.post, query.dist]
            .into_iter()
            .flatten()
            .any(|d| d < 0);
        if negative {
            tracing::debug!("span_not with negative distance dropped");
            return None;
        }
        Some(query)
    }
}

mut_setters!(SpanNotQuery {
    pre => pre: i32,
    post => post: i32,
    dist => dist: i32,
    boost => boost: f64,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanFirstQuery {
    #[serde(rename = "match")]
    pub span: Box<SpanQuery>,
    pub end: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl SpanFirstQuery {
    pub fn new(span: impl Clause, end: i32) -> Option<Self> {
        if end < 0 {
            tracing::debug!(end, "span_first with negative end dropped");
            return None;
        }
        Some(Self {
            span: Box::new(to_span(span)?),
            end,
            boost: None,
        })
    }
}

with_setters!(SpanFirstQuery {
    with_boost => boost: f64,
});

/// Matches `big` spans that contain a `little` span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanContainingQuery {
    pub big: Box<SpanQuery>,
    pub little: Box<SpanQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl SpanContainingQuery {
    pub fn new(big: impl Clause, little: impl Clause) -> Option<Self> {
        Some(Self {
            big: Box::new(to_span(big)?),
            little: Box::new(to_span(little)?),
            boost: None,
        })
    }
}

with_setters!(SpanContainingQuery {
    with_boost => boost: f64,
});

/// Matches `little` spans enclosed in a `big` span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanWithinQuery {
    pub big: Box<SpanQuery>,
    pub little: Box<SpanQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl SpanWithinQuery {
    pub fn new(big: impl Clause, little: impl Clause) -> Option<Self> {
        Some(Self {
            big: Box::new(to_span(big)?),
            little: Box::new(to_span(little)?),
            boost: None,
        })
    }
}

with_setters!(SpanWithinQuery {
    with_boost => boost: f64,
});

// ============================================================================
// span_multi / field_masking_span
// ============================================================================

/// Queries `span_multi` can wrap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MultiTermQuery {
    #[serde(rename = "prefix")]
    Prefix(PrefixQuery),
    #[serde(rename = "wildcard")]
    Wildcard(WildcardQuery),
    #[serde(rename = "regexp")]
    Regexp(RegexpQuery),
    #[serde(rename = "fuzzy")]
    Fuzzy(FuzzyQuery),
    #[serde(rename = "range")]
    Range(RangeQuery),
}

impl TryFrom<Query> for MultiTermQuery {
    type Error = DslError;

    fn try_from(query: Query) -> Result<Self, Self::Error> {
        match query {
            Query::Prefix(q) => Ok(MultiTermQuery::Prefix(q)),
            Query::Wildcard(q) => Ok(MultiTermQuery::Wildcard(q)),
            Query::Regexp(q) => Ok(MultiTermQuery::Regexp(q)),
            Query::Fuzzy(q) => Ok(MultiTermQuery::Fuzzy(q)),
            Query::Range(q) => Ok(MultiTermQuery::Range(q)),
            other => Err(DslError::NotAMultiTermQuery(other.kind())),
        }
    }
}

impl From<MultiTermQuery> for Query {
    fn from(query: MultiTermQuery) -> Self {
        match query {
            MultiTermQuery::Prefix(q) => Query::Prefix(q),
            MultiTermQuery::Wildcard(q) => Query::Wildcard(q),
            MultiTermQuery::Regexp(q) => Query::Regexp(q),
            MultiTermQuery::Fuzzy(q) => Query::Fuzzy(q),
            MultiTermQuery::Range(q) => Query::Range(q),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanMultiTermQuery {
    #[serde(rename = "match")]
    pub query: Box<MultiTermQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl SpanMultiTermQuery {
    /// `None` unless the clause is a prefix, wildcard, regexp, fuzzy or range query.
    pub fn new(query: impl Clause) -> Option<Self> {
        match MultiTermQuery::try_from(query.into_clause()?) {
            Ok(query) => Some(Self {
                query: Box::new(query),
                boost: None,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "span_multi clause dropped");
                None
            }
        }
    }
}

with_setters!(SpanMultiTermQuery {
    with_boost => boost: f64,
});

/// Lets span queries on different fields combine by faking the field name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMaskingSpanQuery {
    pub query: Box<SpanQuery>,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl FieldMaskingSpanQuery {
    pub fn new(query: impl Clause, field: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            query: Box::new(to_span(query)?),
            boost: None,
        })
    }
}

with_setters!(FieldMaskingSpanQuery {
    with_boost => boost: f64,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{query, QueryClauses, QueryKind, TermQuery};
    use serde_json::json;

    fn span_term(field: &str, value: &str) -> Option<SpanTermQuery> {
        SpanTermQuery::new(field, value)
    }

    // ========================================================================
    // Classification
    // ========================================================================

    #[test]
    fn test_try_from_span_variant() {
        let q = Query::from(span_term("user", "kimchy").unwrap());
        let span = SpanQuery::try_from(q).unwrap();
        assert!(matches!(span, SpanQuery::Term(_)));
    }

    #[test]
    fn test_try_from_rejects_non_span() {
        let err = SpanQuery::try_from(Query::match_all()).unwrap_err();
        assert!(matches!(err, DslError::NotASpanQuery(QueryKind::MatchAll)));
        assert_eq!(err.to_string(), "Query of kind 'match_all' is not a span query");
    }

    #[test]
    fn test_multi_term_classification() {
        assert!(MultiTermQuery::try_from(Query::from(PrefixQuery::new("a", "b").unwrap())).is_ok());
        let err = MultiTermQuery::try_from(Query::from(TermQuery::new("a", "b").unwrap()));
        assert!(matches!(err, Err(DslError::NotAMultiTermQuery(QueryKind::Term))));
    }

    #[test]
    fn test_gap_has_no_top_level_form() {
        let gap = SpanQuery::Gap(SpanGapQuery::new("body", 2).unwrap());
        assert!(gap.into_query().is_none());
    }

    // ========================================================================
    // Guards
    // ========================================================================

    #[test]
    fn test_span_containing_requires_spans() {
        assert!(SpanContainingQuery::new(span_term("f", "a"), span_term("f", "b")).is_some());
        assert!(SpanContainingQuery::new(span_term("f", "a"), TermQuery::new("f", "b")).is_none());
        assert!(SpanContainingQuery::new(None::<Query>, span_term("f", "b")).is_none());
        assert!(SpanContainingQuery::new(span_term("f", "a"), span_term("f", "")).is_none());
    }

    #[test]
    fn test_span_near_guards() {
        let clauses = || {
            QueryClauses::collect(|c| {
                c.span_term("body", "quick");
                c.term("body", "not-a-span");
                c.span_term("body", "fox");
            })
        };
        let near = SpanNearQuery::new(clauses(), 3).unwrap();
        assert_eq!(near.clauses.len(), 2);
        assert!(SpanNearQuery::new(clauses(), -1).is_none());
        assert!(SpanNearQuery::new(Vec::new(), 0).is_none());
    }

    #[test]
    fn test_span_first_guards() {
        assert!(SpanFirstQuery::new(span_term("f", "a"), 3).is_some());
        assert!(SpanFirstQuery::new(span_term("f", "a"), -1).is_none());
        assert!(SpanFirstQuery::new(Query::match_all(), 3).is_none());
    }

    #[test]
    fn test_span_not_distances() {
        assert!(SpanNotQuery::build(span_term("f", "a"), span_term("f", "b"), |n| {
            n.pre(1).post(2);
        })
        .is_some());
        assert!(SpanNotQuery::build(span_term("f", "a"), span_term("f", "b"), |n| {
            n.dist(-1);
        })
        .is_none());
    }

    #[test]
    fn test_span_multi_accepts_multi_term_only() {
        assert!(SpanMultiTermQuery::new(WildcardQuery::new("user", "ki*")).is_some());
        assert!(SpanMultiTermQuery::new(TermQuery::new("user", "kimchy")).is_none());
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    #[test]
    fn test_span_near_serialization() {
        let q = query(|c| {
            c.span_near(12, |n| {
                n.span_term("field", "value1");
                n.span_term("field", "value2");
            });
        })
        .unwrap();
        assert_eq!(
            serde_json::to_value(q).unwrap(),
            json!({"span_near": {
                "clauses": [
                    {"span_term": {"field": {"value": "value1"}}},
                    {"span_term": {"field": {"value": "value2"}}}
                ],
                "slop": 12
            }})
        );
    }

    #[test]
    fn test_span_near_with_gap() {
        let near = SpanNearQuery::new(
            QueryClauses::collect(|c| {
                c.span_term("body", "quick");
            }),
            0,
        )
        .unwrap()
        .with_gap("body", 2)
        .with_in_order(true);
        assert_eq!(
            serde_json::to_value(Query::from(near)).unwrap(),
            json!({"span_near": {
                "clauses": [
                    {"span_term": {"body": {"value": "quick"}}},
                    {"span_gap": {"body": 2}}
                ],
                "slop": 0,
                "in_order": true
            }})
        );
    }

    #[test]
    fn test_span_first_and_multi_serialization() {
        let first = SpanFirstQuery::new(span_term("user", "kimchy"), 3).unwrap();
        assert_eq!(
            serde_json::to_value(Query::from(first)).unwrap(),
            json!({"span_first": {"match": {"span_term": {"user": {"value": "kimchy"}}}, "end": 3}})
        );

        let multi = SpanMultiTermQuery::new(PrefixQuery::new("user", "ki")).unwrap();
        assert_eq!(
            serde_json::to_value(Query::from(multi)).unwrap(),
            json!({"span_multi": {"match": {"prefix": {"user": {"value": "ki"}}}}})
        );
    }

    #[test]
    fn test_field_masking_span() {
        let q = query(|c| {
            c.field_masking_span("text", |m| {
                m.span_term("text.stems", "fox");
            });
        })
        .unwrap();
        assert_eq!(
            serde_json::to_value(q).unwrap(),
            json!({"field_masking_span": {
                "query": {"span_term": {"text.stems": {"value": "fox"}}},
                "field": "text"
            }})
        );
    }

    #[test]
    fn test_single_span_wrappers_keep_first_clause() {
        let clauses = QueryClauses::collect(|c| {
            c.span_first(2, |f| {
                f.span_term("user", "kimchy");
                f.span_term("user", "other");
            });
            c.span_multi(|m| {
                m.term("user", "");
                m.prefix("user", "ki");
                m.wildcard("user", "k*");
            });
            c.field_masking_span("text", |m| {
                m.span_term("text.stems", "fox");
                m.span_term("text.stems", "dog");
            });
        });
        assert_eq!(
            serde_json::to_value(clauses).unwrap(),
            json!([
                {"span_first": {"match": {"span_term": {"user": {"value": "kimchy"}}}, "end": 2}},
                {"span_multi": {"match": {"prefix": {"user": {"value": "ki"}}}}},
                {"field_masking_span": {
                    "query": {"span_term": {"text.stems": {"value": "fox"}}},
                    "field": "text"
                }}
            ])
        );
    }

    #[test]
    fn test_span_or_and_containing_via_clauses() {
        let clauses = QueryClauses::collect(|c| {
            c.span_or(|o| {
                o.span_term("f", "a");
                o.match_all();
            });
            c.span_or(|o| {
                o.match_all();
            });
            c.span_containing(span_term("f", "big"), span_term("f", "little"));
            c.span_within(span_term("f", "big"), TermQuery::new("f", "little"));
        });
        let kinds: Vec<_> = clauses.iter().map(Query::kind).collect();
        assert_eq!(kinds, vec![QueryKind::SpanOr, QueryKind::SpanContaining]);
    }
}
