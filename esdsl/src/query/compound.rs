//! Compound queries: bool, constant_score, dis_max, boosting and nested

use super::{Clause, MinimumShouldMatch, Query, QueryClauses};
use crate::util::non_blank;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// bool
// ============================================================================

/// `bool` query, filled occurrence by occurrence.
///
/// ```
/// use esdsl::query::BoolQuery;
///
/// let q = BoolQuery::build(|b| {
///     b.should(|c| {
///         c.term("tag", "rust");
///         c.term("tag", "search");
///     });
///     b.minimum_should_match(1);
/// })
/// .unwrap();
/// assert_eq!(q.should.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoolQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Query>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Query>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Query>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Query>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<MinimumShouldMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
    #[serde(rename = "_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl BoolQuery {
    /// `None` when no occurrence holds a clause.
    pub fn build(configure: impl FnOnce(&mut BoolQuery)) -> Option<Self> {
        let mut query = BoolQuery::default();
        configure(&mut query);
        if query.is_empty() {
            tracing::debug!("bool query without clauses dropped");
            None
        } else {
            Some(query)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
    }

    pub fn must(&mut self, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.must.extend(QueryClauses::collect(configure));
        self
    }

    pub fn should(&mut self, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.should.extend(QueryClauses::collect(configure));
        self
    }

    pub fn must_not(&mut self, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.must_not.extend(QueryClauses::collect(configure));
        self
    }

    pub fn filter(&mut self, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.filter.extend(QueryClauses::collect(configure));
        self
    }
}

mut_setters!(BoolQuery {
    minimum_should_match => minimum_should_match: impl Into<MinimumShouldMatch>,
    boost => boost: f64,
    name => name: impl Into<String>,
});

// ============================================================================
// constant_score / dis_max / boosting
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantScoreQuery {
    pub filter: Box<Query>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl ConstantScoreQuery {
    pub fn new(filter: impl Clause) -> Option<Self> {
        Some(Self {
            filter: Box::new(filter.into_clause()?),
            boost: None,
        })
    }
}

with_setters!(ConstantScoreQuery {
    with_boost => boost: f64,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisMaxQuery {
    pub queries: Vec<Query>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tie_breaker: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl DisMaxQuery {
    /// `None` when no sub-query survived.
    pub fn build(configure: impl FnOnce(&mut DisMaxQuery)) -> Option<Self> {
        let mut query = DisMaxQuery::default();
        configure(&mut query);
        (!query.queries.is_empty()).then_some(query)
    }

    pub fn queries(&mut self, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.queries.extend(QueryClauses::collect(configure));
        self
    }
}

mut_setters!(DisMaxQuery {
    tie_breaker => tie_breaker: f64,
    boost => boost: f64,
});

/// Demotes documents matching `negative` instead of excluding them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoostingQuery {
    pub positive: Box<Query>,
    pub negative: Box<Query>,
    pub negative_boost: f64,
}

impl BoostingQuery {
    /// Both queries are required and `negative_boost` must lie in `[0, 1]`.
    pub fn new(positive: impl Clause, negative: impl Clause, negative_boost: f64) -> Option<Self> {
        if !(0.0..=1.0).contains(&negative_boost) {
            tracing::debug!(negative_boost, "boosting query with invalid negative_boost dropped");
            return None;
        }
        Some(Self {
            positive: Box::new(positive.into_clause()?),
            negative: Box::new(negative.into_clause()?),
            negative_boost,
        })
    }
}

// ============================================================================
// nested
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildScoreMode {
    Avg,
    Max,
    Min,
    None,
    Sum,
}

/// `inner_hits` of a nested query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InnerHits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(rename = "_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

with_setters!(InnerHits {
    with_name => name: impl Into<String>,
    with_from => from: u32,
    with_size => size: u32,
    with_source => source: Value,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedQuery {
    pub path: String,
    pub query: Box<Query>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_mode: Option<ChildScoreMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_unmapped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_hits: Option<InnerHits>,
}

impl NestedQuery {
    pub fn new(path: &str, query: impl Clause) -> Option<Self> {
        Some(Self {
            path: non_blank(path)?,
            query: Box::new(query.into_clause()?),
            score_mode: None,
            ignore_unmapped: None,
            inner_hits: None,
        })
    }
}

with_setters!(NestedQuery {
    with_score_mode => score_mode: ChildScoreMode,
    with_ignore_unmapped => ignore_unmapped: bool,
    with_inner_hits => inner_hits: InnerHits,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{bool_query, dis_max, query, TermQuery};
    use serde_json::json;

    #[test]
    fn test_bool_query_shape() {
        let q = bool_query(|b| {
            b.must(|c| {
                c.match_query("title", "search");
            });
            b.filter(|c| {
                c.term("status", "published");
            });
            b.must_not(|c| {
                c.exists("deleted_at");
            });
            b.boost(1.5);
        })
        .unwrap();
        assert_eq!(
            serde_json::to_value(q).unwrap(),
            json!({"bool": {
                "must": [{"match": {"title": {"query": "search"}}}],
                "must_not": [{"exists": {"field": "deleted_at"}}],
                "filter": [{"term": {"status": {"value": "published"}}}],
                "boost": 1.5
            }})
        );
    }

    #[test]
    fn test_bool_omits_blank_term() {
        let q = BoolQuery::build(|b| {
            b.must(|c| {
                c.term("status", "active");
                c.term("owner", "");
                c.term("owner", None::<&str>);
            });
        })
        .unwrap();
        assert_eq!(q.must.len(), 1);
    }

    #[test]
    fn test_empty_bool_is_omitted() {
        assert!(BoolQuery::build(|b| {
            b.must(|c| {
                c.term("status", "");
            });
            b.minimum_should_match(1);
        })
        .is_none());

        let outer = query(|c| {
            c.bool(|_| {});
        });
        assert!(outer.is_none());
    }

    #[test]
    fn test_occurrences_accumulate() {
        let q = BoolQuery::build(|b| {
            b.should(|c| {
                c.term("a", 1);
            });
            b.should(|c| {
                c.term("b", 2);
            });
        })
        .unwrap();
        assert_eq!(q.should.len(), 2);
    }

    #[test]
    fn test_dis_max() {
        let q = dis_max(|d| {
            d.queries(|c| {
                c.term("title", "quick");
                c.term("body", "quick");
            });
            d.tie_breaker(0.5);
        })
        .unwrap();
        assert_eq!(
            serde_json::to_value(q).unwrap(),
            json!({"dis_max": {
                "queries": [
                    {"term": {"title": {"value": "quick"}}},
                    {"term": {"body": {"value": "quick"}}}
                ],
                "tie_breaker": 0.5
            }})
        );
        assert!(dis_max(|d| {
            d.tie_breaker(0.5);
        })
        .is_none());
    }

    #[test]
    fn test_boosting_requires_both_sides() {
        let q = BoostingQuery::new(
            TermQuery::new("text", "apple"),
            TermQuery::new("text", "pie"),
            0.5,
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(Query::from(q)).unwrap(),
            json!({"boosting": {
                "positive": {"term": {"text": {"value": "apple"}}},
                "negative": {"term": {"text": {"value": "pie"}}},
                "negative_boost": 0.5
            }})
        );
        assert!(BoostingQuery::new(TermQuery::new("text", "apple"), None::<Query>, 0.5).is_none());
        assert!(BoostingQuery::new(Query::match_all(), Query::match_none(), 1.5).is_none());
    }

    #[test]
    fn test_nested_query() {
        let q = NestedQuery::new("comments", TermQuery::new("comments.author", "kim"))
            .unwrap()
            .with_score_mode(ChildScoreMode::Max)
            .with_inner_hits(InnerHits::default().with_size(3));
        assert_eq!(
            serde_json::to_value(Query::from(q)).unwrap(),
            json!({"nested": {
                "path": "comments",
                "query": {"term": {"comments.author": {"value": "kim"}}},
                "score_mode": "max",
                "inner_hits": {"size": 3}
            }})
        );
        assert!(NestedQuery::new("", Query::match_all()).is_none());
        assert!(NestedQuery::new("comments", None::<Query>).is_none());
    }

    #[test]
    fn test_constant_score_boost() {
        let q = ConstantScoreQuery::new(TermQuery::new("user", "kimchy"))
            .unwrap()
            .with_boost(1.25);
        assert_eq!(
            serde_json::to_value(Query::from(q)).unwrap(),
            json!({"constant_score": {"filter": {"term": {"user": {"value": "kimchy"}}}, "boost": 1.25}})
        );
    }
}
