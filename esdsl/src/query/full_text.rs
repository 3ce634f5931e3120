//! Full-text queries

use super::MinimumShouldMatch;
use crate::field_value::{FieldValue, IntoFieldValue};
use crate::one_field_map::field_keyed_serialize;
use crate::util::{non_blank, non_blank_strings};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroTermsQuery {
    All,
    None,
}

/// `type` of a `multi_match` query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextQueryType {
    BestFields,
    MostFields,
    CrossFields,
    Phrase,
    PhrasePrefix,
    BoolPrefix,
}

// ============================================================================
// match
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MatchQuery {
    pub field: String,
    pub params: MatchParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchParams {
    pub query: FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzziness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_expansions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<MinimumShouldMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lenient: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zero_terms_query: Option<ZeroTermsQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_generate_synonyms_phrase_query: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
    #[serde(rename = "_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MatchQuery {
    pub fn new(field: &str, query: impl IntoFieldValue) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            params: MatchParams {
                query: query.into_field_value()?,
                analyzer: None,
                operator: None,
                fuzziness: None,
                prefix_length: None,
                max_expansions: None,
                minimum_should_match: None,
                lenient: None,
                zero_terms_query: None,
                auto_generate_synonyms_phrase_query: None,
                boost: None,
                name: None,
            },
        })
    }
}

with_setters!(MatchQuery {
    with_analyzer => params.analyzer: impl Into<String>,
    with_operator => params.operator: Operator,
    with_fuzziness => params.fuzziness: impl Into<String>,
    with_prefix_length => params.prefix_length: u32,
    with_max_expansions => params.max_expansions: u32,
    with_minimum_should_match => params.minimum_should_match: impl Into<MinimumShouldMatch>,
    with_lenient => params.lenient: bool,
    with_zero_terms_query => params.zero_terms_query: ZeroTermsQuery,
    with_auto_generate_synonyms_phrase_query => params.auto_generate_synonyms_phrase_query: bool,
    with_boost => params.boost: f64,
    with_name => params.name: impl Into<String>,
});

// ============================================================================
// phrase family
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MatchPhraseQuery {
    pub field: String,
    pub params: PhraseParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchPhrasePrefixQuery {
    pub field: String,
    pub params: PhraseParams,
}

/// Body shared by `match_phrase` and `match_phrase_prefix`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhraseParams {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slop: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_expansions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zero_terms_query: Option<ZeroTermsQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
    #[serde(rename = "_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PhraseParams {
    fn new(query: &str) -> Option<Self> {
        Some(Self {
            query: non_blank(query)?,
            analyzer: None,
            slop: None,
            max_expansions: None,
            zero_terms_query: None,
            boost: None,
            name: None,
        })
    }
}

impl MatchPhraseQuery {
    pub fn new(field: &str, query: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            params: PhraseParams::new(query)?,
        })
    }
}

impl MatchPhrasePrefixQuery {
    pub fn new(field: &str, query: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            params: PhraseParams::new(query)?,
        })
    }
}

with_setters!(MatchPhraseQuery {
    with_analyzer => params.analyzer: impl Into<String>,
    with_slop => params.slop: u32,
    with_zero_terms_query => params.zero_terms_query: ZeroTermsQuery,
    with_boost => params.boost: f64,
    with_name => params.name: impl Into<String>,
});

with_setters!(MatchPhrasePrefixQuery {
    with_analyzer => params.analyzer: impl Into<String>,
    with_slop => params.slop: u32,
    with_max_expansions => params.max_expansions: u32,
    with_zero_terms_query => params.zero_terms_query: ZeroTermsQuery,
    with_boost => params.boost: f64,
    with_name => params.name: impl Into<String>,
});

#[derive(Debug, Clone, PartialEq)]
pub struct MatchBoolPrefixQuery {
    pub field: String,
    pub params: MatchBoolPrefixParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchBoolPrefixParams {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<MinimumShouldMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzziness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl MatchBoolPrefixQuery {
    pub fn new(field: &str, query: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            params: MatchBoolPrefixParams {
                query: non_blank(query)?,
                analyzer: None,
                operator: None,
                minimum_should_match: None,
                fuzziness: None,
                boost: None,
            },
        })
    }
}

with_setters!(MatchBoolPrefixQuery {
    with_analyzer => params.analyzer: impl Into<String>,
    with_operator => params.operator: Operator,
    with_minimum_should_match => params.minimum_should_match: impl Into<MinimumShouldMatch>,
    with_fuzziness => params.fuzziness: impl Into<String>,
    with_boost => params.boost: f64,
});

field_keyed_serialize!(
    MatchQuery,
    MatchPhraseQuery,
    MatchPhrasePrefixQuery,
    MatchBoolPrefixQuery,
);

// ============================================================================
// multi_match / query_string / simple_query_string
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiMatchQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub query_type: Option<TextQueryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tie_breaker: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzziness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<MinimumShouldMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slop: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
    #[serde(rename = "_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MultiMatchQuery {
    /// Blank fields are dropped. An empty field list is allowed and lets
    /// Elasticsearch fall back to `index.query.default_field`.
    pub fn new<I, S>(query: &str, fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Some(Self {
            query: non_blank(query)?,
            fields: non_blank_strings(fields),
            query_type: None,
            operator: None,
            analyzer: None,
            tie_breaker: None,
            fuzziness: None,
            minimum_should_match: None,
            slop: None,
            boost: None,
            name: None,
        })
    }
}

with_setters!(MultiMatchQuery {
    with_type => query_type: TextQueryType,
    with_operator => operator: Operator,
    with_analyzer => analyzer: impl Into<String>,
    with_tie_breaker => tie_breaker: f64,
    with_fuzziness => fuzziness: impl Into<String>,
    with_minimum_should_match => minimum_should_match: impl Into<MinimumShouldMatch>,
    with_slop => slop: u32,
    with_boost => boost: f64,
    with_name => name: impl Into<String>,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryStringQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_field: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_operator: Option<Operator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_leading_wildcard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyze_wildcard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzziness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lenient: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<MinimumShouldMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl QueryStringQuery {
    pub fn new(query: &str) -> Option<Self> {
        Some(Self {
            query: non_blank(query)?,
            default_field: None,
            fields: Vec::new(),
            default_operator: None,
            analyzer: None,
            allow_leading_wildcard: None,
            analyze_wildcard: None,
            fuzziness: None,
            lenient: None,
            minimum_should_match: None,
            time_zone: None,
            boost: None,
        })
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fields = non_blank_strings(fields);
        self
    }
}

with_setters!(QueryStringQuery {
    with_default_field => default_field: impl Into<String>,
    with_default_operator => default_operator: Operator,
    with_analyzer => analyzer: impl Into<String>,
    with_allow_leading_wildcard => allow_leading_wildcard: bool,
    with_analyze_wildcard => analyze_wildcard: bool,
    with_fuzziness => fuzziness: impl Into<String>,
    with_lenient => lenient: bool,
    with_minimum_should_match => minimum_should_match: impl Into<MinimumShouldMatch>,
    with_time_zone => time_zone: impl Into<String>,
    with_boost => boost: f64,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleQueryStringQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_operator: Option<Operator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lenient: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<MinimumShouldMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl SimpleQueryStringQuery {
    pub fn new(query: &str) -> Option<Self> {
        Some(Self {
            query: non_blank(query)?,
            fields: Vec::new(),
            default_operator: None,
            analyzer: None,
            flags: None,
            lenient: None,
            minimum_should_match: None,
            boost: None,
        })
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fields = non_blank_strings(fields);
        self
    }
}

with_setters!(SimpleQueryStringQuery {
    with_default_operator => default_operator: Operator,
    with_analyzer => analyzer: impl Into<String>,
    with_flags => flags: impl Into<String>,
    with_lenient => lenient: bool,
    with_minimum_should_match => minimum_should_match: impl Into<MinimumShouldMatch>,
    with_boost => boost: f64,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use serde_json::{json, Value};

    fn to_json(q: impl Into<Query>) -> Value {
        serde_json::to_value(q.into()).unwrap()
    }

    #[test]
    fn test_match_query() {
        let q = MatchQuery::new("title", "rust search")
            .unwrap()
            .with_operator(Operator::And)
            .with_minimum_should_match("75%");
        assert_eq!(
            to_json(q),
            json!({"match": {"title": {
                "query": "rust search",
                "operator": "and",
                "minimum_should_match": "75%"
            }}})
        );
    }

    #[test]
    fn test_match_query_numeric_value() {
        assert_eq!(
            to_json(MatchQuery::new("year", 2024).unwrap()),
            json!({"match": {"year": {"query": 2024}}})
        );
    }

    #[test]
    fn test_match_phrase_with_slop() {
        let q = MatchPhraseQuery::new("body", "quick fox").unwrap().with_slop(2);
        assert_eq!(
            to_json(q),
            json!({"match_phrase": {"body": {"query": "quick fox", "slop": 2}}})
        );
    }

    #[test]
    fn test_phrase_prefix_and_bool_prefix() {
        assert_eq!(
            to_json(
                MatchPhrasePrefixQuery::new("title", "quick br")
                    .unwrap()
                    .with_max_expansions(10)
            ),
            json!({"match_phrase_prefix": {"title": {"query": "quick br", "max_expansions": 10}}})
        );
        assert_eq!(
            to_json(MatchBoolPrefixQuery::new("title", "quick br").unwrap()),
            json!({"match_bool_prefix": {"title": {"query": "quick br"}}})
        );
    }

    #[test]
    fn test_blank_text_rejected() {
        assert!(MatchQuery::new("title", "").is_none());
        assert!(MatchPhraseQuery::new("", "x").is_none());
        assert!(MultiMatchQuery::new(" ", ["a"]).is_none());
        assert!(QueryStringQuery::new("").is_none());
        assert!(SimpleQueryStringQuery::new("\n").is_none());
    }

    #[test]
    fn test_multi_match_drops_blank_fields() {
        let q = MultiMatchQuery::new("brown fox", ["subject^3", "", "message"])
            .unwrap()
            .with_type(TextQueryType::BestFields)
            .with_tie_breaker(0.5);
        assert_eq!(
            to_json(q),
            json!({"multi_match": {
                "query": "brown fox",
                "fields": ["subject^3", "message"],
                "type": "best_fields",
                "tie_breaker": 0.5
            }})
        );
    }

    #[test]
    fn test_query_string() {
        let q = QueryStringQuery::new("(new york city) OR (big apple)")
            .unwrap()
            .with_default_field("content")
            .with_default_operator(Operator::And);
        assert_eq!(
            to_json(q),
            json!({"query_string": {
                "query": "(new york city) OR (big apple)",
                "default_field": "content",
                "default_operator": "and"
            }})
        );
    }

    #[test]
    fn test_simple_query_string() {
        let q = SimpleQueryStringQuery::new("\"fried eggs\" +(eggplant | potato)")
            .unwrap()
            .with_fields(["title^5", "body"])
            .with_flags("OR|AND|PREFIX");
        assert_eq!(
            to_json(q),
            json!({"simple_query_string": {
                "query": "\"fried eggs\" +(eggplant | potato)",
                "fields": ["title^5", "body"],
                "flags": "OR|AND|PREFIX"
            }})
        );
    }
}
