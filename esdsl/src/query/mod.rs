//! Elasticsearch Query DSL
//!
//! [`Query`] is the tagged union of every supported query. Leaf queries are
//! built with constructors that return `None` when a required input is blank,
//! then refined with `with_*` setters. Compound queries are filled through
//! closures receiving a [`QueryClauses`] container, which silently skips any
//! clause that did not survive its guards.
//!
//! ```
//! use esdsl::query::{query, TermQuery};
//!
//! let q = query(|c| {
//!     c.add(TermQuery::new("status", "active").map(|t| t.with_boost(2.0)));
//!     c.term("tag", None::<&str>);
//! });
//! assert_eq!(
//!     serde_json::to_value(q).unwrap(),
//!     serde_json::json!({"term": {"status": {"value": "active", "boost": 2.0}}})
//! );
//! ```

mod clauses;
pub mod compound;
pub mod full_text;
pub mod function_score;
pub mod script;
pub mod span;
pub mod term_level;

pub use clauses::QueryClauses;
pub use compound::{
    BoolQuery, BoostingQuery, ChildScoreMode, ConstantScoreQuery, DisMaxQuery, InnerHits,
    NestedQuery,
};
pub use full_text::{
    MatchBoolPrefixQuery, MatchPhrasePrefixQuery, MatchPhraseQuery, MatchQuery, MultiMatchQuery,
    Operator, QueryStringQuery, SimpleQueryStringQuery, TextQueryType, ZeroTermsQuery,
};
pub use function_score::{
    DecayFunction, DecayKind, FieldValueFactorFunction, FieldValueFactorModifier,
    FunctionBoostMode, FunctionScore, FunctionScoreMode, FunctionScoreQuery, MultiValueMode,
    RandomScoreFunction, ScoreFunction, ScriptScoreFunction,
};
pub use script::Script;
pub use span::{
    FieldMaskingSpanQuery, MultiTermQuery, SpanContainingQuery, SpanFirstQuery, SpanGapQuery,
    SpanMultiTermQuery, SpanNearQuery, SpanNotQuery, SpanOrQuery, SpanQuery, SpanTermQuery,
    SpanWithinQuery,
};
pub use term_level::{
    ExistsQuery, FuzzyQuery, IdsQuery, MatchAllQuery, MatchNoneQuery, PrefixQuery, RangeQuery,
    RangeRelation, RegexpQuery, TermQuery, TermsQuery, WildcardQuery,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Anything that may turn into a query clause.
///
/// Implemented for [`Query`], every concrete query type and the `Option`s of
/// those, so constructors returning `Option<T>` plug straight into
/// [`QueryClauses::add`].
pub trait Clause {
    fn into_clause(self) -> Option<Query>;
}

impl Clause for Query {
    fn into_clause(self) -> Option<Query> {
        Some(self)
    }
}

impl Clause for Option<Query> {
    fn into_clause(self) -> Option<Query> {
        self
    }
}

macro_rules! query_variants {
    ($($(#[$meta:meta])* $variant:ident($ty:ty) => $name:literal),* $(,)?) => {
        /// A single Elasticsearch query
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub enum Query {
            $(
                $(#[$meta])*
                #[serde(rename = $name)]
                $variant($ty),
            )*
            /// Pre-built JSON, sent as-is
            #[serde(untagged)]
            Raw(Value),
        }

        /// The tag of a [`Query`], used for classification and diagnostics
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum QueryKind {
            $($variant,)*
            Raw,
        }

        impl QueryKind {
            /// Elasticsearch name of the query
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(QueryKind::$variant => $name,)*
                    QueryKind::Raw => "raw",
                }
            }
        }

        impl Query {
            pub fn kind(&self) -> QueryKind {
                match self {
                    $(Query::$variant(_) => QueryKind::$variant,)*
                    Query::Raw(_) => QueryKind::Raw,
                }
            }
        }

        $(
            impl From<$ty> for Query {
                fn from(query: $ty) -> Self {
                    Query::$variant(query)
                }
            }

            impl Clause for $ty {
                fn into_clause(self) -> Option<Query> {
                    Some(Query::$variant(self))
                }
            }

            impl Clause for Option<$ty> {
                fn into_clause(self) -> Option<Query> {
                    self.map(Query::$variant)
                }
            }
        )*
    };
}

query_variants! {
    MatchAll(MatchAllQuery) => "match_all",
    MatchNone(MatchNoneQuery) => "match_none",
    Term(TermQuery) => "term",
    Terms(TermsQuery) => "terms",
    Range(RangeQuery) => "range",
    Exists(ExistsQuery) => "exists",
    Prefix(PrefixQuery) => "prefix",
    Wildcard(WildcardQuery) => "wildcard",
    Regexp(RegexpQuery) => "regexp",
    Fuzzy(FuzzyQuery) => "fuzzy",
    Ids(IdsQuery) => "ids",
    Match(MatchQuery) => "match",
    MatchPhrase(MatchPhraseQuery) => "match_phrase",
    MatchPhrasePrefix(MatchPhrasePrefixQuery) => "match_phrase_prefix",
    MatchBoolPrefix(MatchBoolPrefixQuery) => "match_bool_prefix",
    MultiMatch(MultiMatchQuery) => "multi_match",
    QueryString(QueryStringQuery) => "query_string",
    SimpleQueryString(SimpleQueryStringQuery) => "simple_query_string",
    Bool(BoolQuery) => "bool",
    ConstantScore(ConstantScoreQuery) => "constant_score",
    DisMax(DisMaxQuery) => "dis_max",
    Boosting(BoostingQuery) => "boosting",
    Nested(NestedQuery) => "nested",
    FunctionScore(FunctionScoreQuery) => "function_score",
    SpanTerm(SpanTermQuery) => "span_term",
    SpanNear(SpanNearQuery) => "span_near",
    SpanOr(SpanOrQuery) => "span_or",
    SpanNot(SpanNotQuery) => "span_not",
    SpanFirst(SpanFirstQuery) => "span_first",
    SpanContaining(SpanContainingQuery) => "span_containing",
    SpanWithin(SpanWithinQuery) => "span_within",
    SpanMulti(SpanMultiTermQuery) => "span_multi",
    FieldMaskingSpan(FieldMaskingSpanQuery) => "field_masking_span",
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Query {
    pub fn match_all() -> Self {
        Query::MatchAll(MatchAllQuery::default())
    }

    pub fn match_none() -> Self {
        Query::MatchNone(MatchNoneQuery::default())
    }

    /// Wraps already-built JSON. Returns `None` for JSON `null`.
    pub fn raw(json: Value) -> Option<Self> {
        (!json.is_null()).then_some(Query::Raw(json))
    }
}

/// `minimum_should_match` accepts either a count or an expression such as `"75%"`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MinimumShouldMatch {
    Count(i32),
    Expression(String),
}

impl From<i32> for MinimumShouldMatch {
    fn from(count: i32) -> Self {
        MinimumShouldMatch::Count(count)
    }
}

impl From<&str> for MinimumShouldMatch {
    fn from(expr: &str) -> Self {
        MinimumShouldMatch::Expression(expr.to_string())
    }
}

impl From<String> for MinimumShouldMatch {
    fn from(expr: String) -> Self {
        MinimumShouldMatch::Expression(expr)
    }
}

/// Builds a root query from a block of clauses.
///
/// No surviving clause yields `None`, one clause is returned as-is, and
/// several are combined into a `bool` query with every clause under `must`.
pub fn query(configure: impl FnOnce(&mut QueryClauses)) -> Option<Query> {
    let mut clauses = QueryClauses::new();
    configure(&mut clauses);
    clauses.into_query()
}

/// Builds a `bool` query, `None` when it ends up without any clause.
pub fn bool_query(configure: impl FnOnce(&mut BoolQuery)) -> Option<Query> {
    BoolQuery::build(configure).map(Query::Bool)
}

/// Builds a `dis_max` query, `None` without any sub-query.
pub fn dis_max(configure: impl FnOnce(&mut DisMaxQuery)) -> Option<Query> {
    DisMaxQuery::build(configure).map(Query::DisMax)
}

/// Builds a `function_score` query, `None` without inner query and functions.
pub fn function_score(configure: impl FnOnce(&mut FunctionScoreQuery)) -> Option<Query> {
    FunctionScoreQuery::build(configure).map(Query::FunctionScore)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_kind_names() {
        assert_eq!(Query::match_all().kind(), QueryKind::MatchAll);
        assert_eq!(QueryKind::SpanNear.as_str(), "span_near");
        assert_eq!(QueryKind::FieldMaskingSpan.to_string(), "field_masking_span");
    }

    #[test]
    fn test_match_all_serialization() {
        assert_eq!(
            serde_json::to_value(Query::match_all()).unwrap(),
            json!({"match_all": {}})
        );
        assert_eq!(
            serde_json::to_value(Query::match_none()).unwrap(),
            json!({"match_none": {}})
        );
    }

    #[test]
    fn test_raw_query_passthrough() {
        let raw = Query::raw(json!({"script": {"script": "doc['a'].value > 1"}})).unwrap();
        assert_eq!(raw.kind(), QueryKind::Raw);
        assert_eq!(
            serde_json::to_value(&raw).unwrap(),
            json!({"script": {"script": "doc['a'].value > 1"}})
        );
        assert!(Query::raw(Value::Null).is_none());
    }

    #[test]
    fn test_root_query_collapse() {
        assert!(query(|_| {}).is_none());

        let single = query(|c| {
            c.exists("user");
        })
        .unwrap();
        assert_eq!(single.kind(), QueryKind::Exists);

        let several = query(|c| {
            c.exists("user");
            c.term("status", "active");
        })
        .unwrap();
        assert_eq!(
            serde_json::to_value(several).unwrap(),
            json!({"bool": {"must": [
                {"exists": {"field": "user"}},
                {"term": {"status": {"value": "active"}}}
            ]}})
        );
    }

    #[test]
    fn test_minimum_should_match_forms() {
        assert_eq!(
            serde_json::to_value(MinimumShouldMatch::from(2)).unwrap(),
            json!(2)
        );
        assert_eq!(
            serde_json::to_value(MinimumShouldMatch::from("75%")).unwrap(),
            json!("75%")
        );
    }
}
