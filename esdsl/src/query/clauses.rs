//! Ordered container of built clauses

use super::*;
use crate::field_value::IntoFieldValue;

/// Append-only list of clauses filled by a closure.
///
/// Every method pushes the clause only when its constructor accepted the
/// inputs, so `c.term("status", "")` is a no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryClauses {
    clauses: Vec<Query>,
}

impl QueryClauses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the clauses produced by `configure`.
    pub fn collect(configure: impl FnOnce(&mut QueryClauses)) -> Vec<Query> {
        let mut clauses = QueryClauses::new();
        configure(&mut clauses);
        clauses.into_vec()
    }

    /// Appends a clause if it resolved to a query.
    pub fn add(&mut self, clause: impl Clause) -> &mut Self {
        if let Some(query) = clause.into_clause() {
            self.clauses.push(query);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Query> {
        self.clauses.iter()
    }

    pub fn into_vec(self) -> Vec<Query> {
        self.clauses
    }

    /// First clause produced by `configure`, for wrappers that take exactly
    /// one inner query. Further clauses are dropped.
    pub fn first(configure: impl FnOnce(&mut QueryClauses)) -> Option<Query> {
        let mut clauses = QueryClauses::collect(configure).into_iter();
        let first = clauses.next();
        let extra = clauses.count();
        if extra > 0 {
            tracing::debug!(extra, "clauses after the first dropped from single-query wrapper");
        }
        first
    }

    /// Collapses the clauses into one query: a single clause is returned
    /// unchanged, several are wrapped in `bool.must`.
    pub fn into_query(mut self) -> Option<Query> {
        match self.clauses.len() {
            0 => None,
            1 => self.clauses.pop(),
            _ => Some(Query::Bool(BoolQuery {
                must: self.clauses,
                ..Default::default()
            })),
        }
    }

    // Term level

    pub fn match_all(&mut self) -> &mut Self {
        self.add(Query::match_all())
    }

    pub fn match_none(&mut self) -> &mut Self {
        self.add(Query::match_none())
    }

    pub fn term(&mut self, field: &str, value: impl IntoFieldValue) -> &mut Self {
        self.add(TermQuery::new(field, value))
    }

    pub fn terms<I>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: IntoFieldValue,
    {
        self.add(TermsQuery::new(field, values))
    }

    pub fn range(&mut self, field: &str, configure: impl FnOnce(&mut RangeQuery)) -> &mut Self {
        self.add(RangeQuery::build(field, configure))
    }

    pub fn exists(&mut self, field: &str) -> &mut Self {
        self.add(ExistsQuery::new(field))
    }

    pub fn prefix(&mut self, field: &str, value: &str) -> &mut Self {
        self.add(PrefixQuery::new(field, value))
    }

    pub fn wildcard(&mut self, field: &str, value: &str) -> &mut Self {
        self.add(WildcardQuery::new(field, value))
    }

    pub fn regexp(&mut self, field: &str, value: &str) -> &mut Self {
        self.add(RegexpQuery::new(field, value))
    }

    pub fn fuzzy(&mut self, field: &str, value: impl IntoFieldValue) -> &mut Self {
        self.add(FuzzyQuery::new(field, value))
    }

    pub fn ids<I, S>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add(IdsQuery::new(values))
    }

    // Full text

    pub fn match_query(&mut self, field: &str, query: impl IntoFieldValue) -> &mut Self {
        self.add(MatchQuery::new(field, query))
    }

    pub fn match_phrase(&mut self, field: &str, query: &str) -> &mut Self {
        self.add(MatchPhraseQuery::new(field, query))
    }

    pub fn match_phrase_prefix(&mut self, field: &str, query: &str) -> &mut Self {
        self.add(MatchPhrasePrefixQuery::new(field, query))
    }

    pub fn match_bool_prefix(&mut self, field: &str, query: &str) -> &mut Self {
        self.add(MatchBoolPrefixQuery::new(field, query))
    }

    pub fn multi_match<I, S>(&mut self, query: &str, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add(MultiMatchQuery::new(query, fields))
    }

    pub fn query_string(&mut self, query: &str) -> &mut Self {
        self.add(QueryStringQuery::new(query))
    }

    pub fn simple_query_string(&mut self, query: &str) -> &mut Self {
        self.add(SimpleQueryStringQuery::new(query))
    }

    // Compound

    pub fn bool(&mut self, configure: impl FnOnce(&mut BoolQuery)) -> &mut Self {
        self.add(BoolQuery::build(configure))
    }

    pub fn dis_max(&mut self, configure: impl FnOnce(&mut DisMaxQuery)) -> &mut Self {
        self.add(DisMaxQuery::build(configure))
    }

    /// `constant_score` around the clauses of `filter`.
    pub fn constant_score(&mut self, filter: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.add(ConstantScoreQuery::new(query(filter)))
    }

    pub fn nested(&mut self, path: &str, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.add(NestedQuery::new(path, query(configure)))
    }

    /// `boosting` with the clauses of `positive` and `negative`, each
    /// collapsed like a root query.
    pub fn boosting(
        &mut self,
        positive: impl FnOnce(&mut QueryClauses),
        negative: impl FnOnce(&mut QueryClauses),
        negative_boost: f64,
    ) -> &mut Self {
        self.add(BoostingQuery::new(
            query(positive),
            query(negative),
            negative_boost,
        ))
    }

    pub fn function_score(
        &mut self,
        configure: impl FnOnce(&mut FunctionScoreQuery),
    ) -> &mut Self {
        self.add(FunctionScoreQuery::build(configure))
    }

    // Span

    pub fn span_term(&mut self, field: &str, value: impl IntoFieldValue) -> &mut Self {
        self.add(SpanTermQuery::new(field, value))
    }

    /// `span_near` over the span clauses of `configure`; non-span clauses
    /// are dropped and a negative `slop` drops the whole query.
    pub fn span_near(&mut self, slop: i32, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.add(SpanNearQuery::new(QueryClauses::collect(configure), slop))
    }

    pub fn span_or(&mut self, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.add(SpanOrQuery::new(QueryClauses::collect(configure)))
    }

    pub fn span_first(&mut self, end: i32, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.add(SpanFirstQuery::new(QueryClauses::first(configure), end))
    }

    pub fn span_not(&mut self, include: impl Clause, exclude: impl Clause) -> &mut Self {
        self.add(SpanNotQuery::new(include, exclude))
    }

    pub fn span_containing(&mut self, big: impl Clause, little: impl Clause) -> &mut Self {
        self.add(SpanContainingQuery::new(big, little))
    }

    pub fn span_within(&mut self, big: impl Clause, little: impl Clause) -> &mut Self {
        self.add(SpanWithinQuery::new(big, little))
    }

    pub fn span_multi(&mut self, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.add(SpanMultiTermQuery::new(QueryClauses::first(configure)))
    }

    pub fn field_masking_span(
        &mut self,
        field: &str,
        configure: impl FnOnce(&mut QueryClauses),
    ) -> &mut Self {
        self.add(FieldMaskingSpanQuery::new(QueryClauses::first(configure), field))
    }
}

impl IntoIterator for QueryClauses {
    type Item = Query;
    type IntoIter = std::vec::IntoIter<Query>;

    fn into_iter(self) -> Self::IntoIter {
        self.clauses.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryClauses {
    type Item = &'a Query;
    type IntoIter = std::slice::Iter<'a, Query>;

    fn into_iter(self) -> Self::IntoIter {
        self.clauses.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_inputs_are_skipped() {
        let clauses = QueryClauses::collect(|c| {
            c.term("status", "");
            c.term("", "value");
            c.term("status", None::<String>);
            c.exists(" ");
            c.match_query("title", "");
            c.prefix("name", "");
            c.ids(Vec::<String>::new());
            c.terms("tags", [None::<&str>, Some("")]);
            c.range("age", |_| {});
        });
        assert!(clauses.is_empty());
    }

    #[test]
    fn test_order_is_preserved() {
        let clauses = QueryClauses::collect(|c| {
            c.term("a", 1).exists("b").match_all();
        });
        let kinds: Vec<_> = clauses.iter().map(Query::kind).collect();
        assert_eq!(
            kinds,
            vec![QueryKind::Term, QueryKind::Exists, QueryKind::MatchAll]
        );
    }

    #[test]
    fn test_add_accepts_options_and_queries() {
        let mut c = QueryClauses::new();
        c.add(TermQuery::new("a", "x"));
        c.add(None::<TermQuery>);
        c.add(Query::match_none());
        c.add(None::<Query>);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_nested_and_constant_score() {
        let clauses = QueryClauses::collect(|c| {
            c.nested("comments", |n| {
                n.term("comments.author", "kim");
            });
            c.nested("comments", |_| {});
            c.constant_score(|f| {
                f.term("flag", true);
            });
        });
        assert_eq!(clauses.len(), 2);
        assert_eq!(
            serde_json::to_value(&clauses[1]).unwrap(),
            json!({"constant_score": {"filter": {"term": {"flag": {"value": true}}}}})
        );
    }
}
