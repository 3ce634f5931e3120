//! Search and count requests

use crate::aggregation::Aggregations;
use crate::endpoint::{join_indices, Endpoint, Method};
use crate::one_field_map::field_keyed_serialize;
use crate::query::{query, Clause, InnerHits, Query, QueryClauses};
use crate::util::{non_blank, non_blank_strings, to_json_data_or_none};
use crate::Result;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Sorting
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// How multi-valued fields are reduced for sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Min,
    Max,
    Sum,
    Avg,
    Median,
}

/// `{"<field>": {"order": ..}}`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSort {
    pub field: String,
    pub params: FieldSortParams,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldSortParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<SortMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmapped_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl FieldSort {
    pub fn new(field: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            params: FieldSortParams::default(),
        })
    }

    /// `_first`, `_last` or a substitute value.
    pub fn with_missing(mut self, missing: impl Serialize) -> Self {
        self.params.missing = to_json_data_or_none(Some(missing));
        self
    }
}

with_setters!(FieldSort {
    with_order => params.order: SortOrder,
    with_mode => params.mode: SortMode,
    with_unmapped_type => params.unmapped_type: impl Into<String>,
    with_format => params.format: impl Into<String>,
});

field_keyed_serialize!(FieldSort);

/// One entry of a `sort` list
#[derive(Debug, Clone, PartialEq)]
pub enum SortOptions {
    Field(FieldSort),
    /// `{"_score": {"order": ..}}`
    Score(Option<SortOrder>),
    /// `"_doc"`, index order
    Doc,
}

impl Serialize for SortOptions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            SortOptions::Field(sort) => sort.serialize(serializer),
            SortOptions::Score(order) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(
                    "_score",
                    &FieldSortParams {
                        order: *order,
                        ..Default::default()
                    },
                )?;
                map.end()
            }
            SortOptions::Doc => serializer.serialize_str("_doc"),
        }
    }
}

impl From<FieldSort> for SortOptions {
    fn from(sort: FieldSort) -> Self {
        SortOptions::Field(sort)
    }
}

/// Anything that may become a sort entry; blank field names yield nothing.
pub trait IntoSortOptions {
    fn into_sort(self) -> Option<SortOptions>;
}

impl IntoSortOptions for SortOptions {
    fn into_sort(self) -> Option<SortOptions> {
        Some(self)
    }
}

impl IntoSortOptions for Option<SortOptions> {
    fn into_sort(self) -> Option<SortOptions> {
        self
    }
}

impl IntoSortOptions for FieldSort {
    fn into_sort(self) -> Option<SortOptions> {
        Some(SortOptions::Field(self))
    }
}

impl IntoSortOptions for Option<FieldSort> {
    fn into_sort(self) -> Option<SortOptions> {
        self.map(SortOptions::Field)
    }
}

impl IntoSortOptions for &str {
    fn into_sort(self) -> Option<SortOptions> {
        FieldSort::new(self).map(SortOptions::Field)
    }
}

// ============================================================================
// _source, highlight, collapse, track_total_hits
// ============================================================================

/// `_source` filtering
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SourceConfig {
    Enabled(bool),
    Filter {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        includes: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        excludes: Vec<String>,
    },
}

impl SourceConfig {
    pub fn includes<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SourceConfig::Filter {
            includes: non_blank_strings(fields),
            excludes: Vec::new(),
        }
    }

    pub fn excludes<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SourceConfig::Filter {
            includes: Vec::new(),
            excludes: non_blank_strings(fields),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HighlightField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_fragments: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_tags: Vec<String>,
}

mut_setters!(HighlightField {
    fragment_size => fragment_size: u32,
    number_of_fragments => number_of_fragments: u32,
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Highlight {
    pub fields: Vec<(String, HighlightField)>,
    pub pre_tags: Vec<String>,
    pub post_tags: Vec<String>,
    pub fragment_size: Option<u32>,
    pub number_of_fragments: Option<u32>,
    pub require_field_match: Option<bool>,
}

impl Highlight {
    pub fn field(&mut self, name: &str, configure: impl FnOnce(&mut HighlightField)) -> &mut Self {
        if let Some(name) = non_blank(name) {
            let mut field = HighlightField::default();
            configure(&mut field);
            self.fields.push((name, field));
        }
        self
    }

    /// Ignored unless both tags are non-blank.
    pub fn tags(&mut self, pre: &str, post: &str) -> &mut Self {
        if let (Some(pre), Some(post)) = (non_blank(pre), non_blank(post)) {
            self.pre_tags = vec![pre];
            self.post_tags = vec![post];
        }
        self
    }
}

mut_setters!(Highlight {
    fragment_size => fragment_size: u32,
    number_of_fragments => number_of_fragments: u32,
    require_field_match => require_field_match: bool,
});

impl Serialize for Highlight {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        struct Fields<'a>(&'a [(String, HighlightField)]);

        impl Serialize for Fields<'_> {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (name, field) in self.0 {
                    map.serialize_entry(name, field)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("fields", &Fields(&self.fields))?;
        if !self.pre_tags.is_empty() {
            map.serialize_entry("pre_tags", &self.pre_tags)?;
        }
        if !self.post_tags.is_empty() {
            map.serialize_entry("post_tags", &self.post_tags)?;
        }
        if let Some(size) = self.fragment_size {
            map.serialize_entry("fragment_size", &size)?;
        }
        if let Some(n) = self.number_of_fragments {
            map.serialize_entry("number_of_fragments", &n)?;
        }
        if let Some(require) = self.require_field_match {
            map.serialize_entry("require_field_match", &require)?;
        }
        map.end()
    }
}

/// `track_total_hits`: exact/approximate flag or a count threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TrackHits {
    Track(bool),
    Count(u32),
}

impl From<bool> for TrackHits {
    fn from(track: bool) -> Self {
        TrackHits::Track(track)
    }
}

impl From<u32> for TrackHits {
    fn from(count: u32) -> Self {
        TrackHits::Count(count)
    }
}

/// Field collapsing on a keyword or numeric field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCollapse {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_hits: Option<InnerHits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_group_searches: Option<u32>,
}

impl FieldCollapse {
    pub fn new(field: &str) -> Option<Self> {
        Some(Self {
            field: non_blank(field)?,
            inner_hits: None,
            max_concurrent_group_searches: None,
        })
    }
}

with_setters!(FieldCollapse {
    with_inner_hits => inner_hits: InnerHits,
    with_max_concurrent_group_searches => max_concurrent_group_searches: u32,
});

// ============================================================================
// SearchRequest
// ============================================================================

/// `POST /<indices>/_search`
///
/// ```
/// use esdsl::search::{SearchRequest, SortOrder};
///
/// let request = SearchRequest::build(["logs-*"], |s| {
///     s.query(|c| {
///         c.match_query("message", "timeout");
///     });
///     s.sort_by("@timestamp", SortOrder::Desc).size(20);
/// });
/// let body = request.body().unwrap();
/// assert_eq!(body["size"], 20);
/// assert!(body.get("indices").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchRequest {
    #[serde(skip)]
    pub indices: Vec<String>,
    #[serde(skip)]
    pub routing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_filter: Option<Query>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortOptions>,
    #[serde(rename = "_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceConfig>,
    #[serde(skip_serializing_if = "Aggregations::is_empty")]
    pub aggs: Aggregations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_total_hits: Option<TrackHits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_after: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse: Option<FieldCollapse>,
}

impl SearchRequest {
    /// Targets `indices`; an empty list searches every index.
    pub fn new<I, S>(indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            indices: non_blank_strings(indices),
            ..Default::default()
        }
    }

    pub fn build<I, S>(indices: I, configure: impl FnOnce(&mut SearchRequest)) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut request = Self::new(indices);
        configure(&mut request);
        request
    }

    /// Root query from the clauses; several clauses are combined under
    /// `bool.must`, none leaves the query unset.
    pub fn query(&mut self, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.query = query(configure);
        self
    }

    pub fn set_query(&mut self, query: impl Clause) -> &mut Self {
        self.query = query.into_clause();
        self
    }

    pub fn post_filter(&mut self, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.post_filter = query(configure);
        self
    }

    pub fn aggs(&mut self, configure: impl FnOnce(&mut Aggregations)) -> &mut Self {
        configure(&mut self.aggs);
        self
    }

    pub fn sort(&mut self, sort: impl IntoSortOptions) -> &mut Self {
        if let Some(sort) = sort.into_sort() {
            self.sort.push(sort);
        }
        self
    }

    pub fn sort_by(&mut self, field: &str, order: SortOrder) -> &mut Self {
        self.sort(FieldSort::new(field).map(|s| s.with_order(order)))
    }

    pub fn highlight(&mut self, configure: impl FnOnce(&mut Highlight)) -> &mut Self {
        let mut highlight = Highlight::default();
        configure(&mut highlight);
        self.highlight = (!highlight.fields.is_empty()).then_some(highlight);
        self
    }

    pub fn track_total_hits(&mut self, track: impl Into<TrackHits>) -> &mut Self {
        self.track_total_hits = Some(track.into());
        self
    }

    /// Sort values of the last hit of the previous page; nulls are kept
    /// since they are legitimate sort values.
    pub fn search_after<I, T>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        self.search_after = values
            .into_iter()
            .filter_map(|v| serde_json::to_value(v).ok())
            .collect();
        self
    }

    pub fn collapse(&mut self, collapse: Option<FieldCollapse>) -> &mut Self {
        self.collapse = collapse;
        self
    }

    pub fn routing(&mut self, routing: &str) -> &mut Self {
        self.routing = non_blank(routing);
        self
    }

    pub fn timeout(&mut self, timeout: &str) -> &mut Self {
        self.timeout = non_blank(timeout);
        self
    }

    /// The JSON request body.
    pub fn body(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

mut_setters!(SearchRequest {
    from => from: u32,
    size => size: u32,
    source => source: SourceConfig,
    min_score => min_score: f64,
});

impl Endpoint for SearchRequest {
    fn method(&self) -> Method {
        Method::Post
    }

    fn path_segments(&self) -> Vec<String> {
        join_indices(&self.indices)
            .into_iter()
            .chain(std::iter::once("_search".to_string()))
            .collect()
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        self.routing
            .iter()
            .map(|r| ("routing", r.clone()))
            .collect()
    }

    fn name(&self) -> &'static str {
        "search"
    }
}

// ============================================================================
// CountRequest
// ============================================================================

/// `POST /<indices>/_count`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CountRequest {
    #[serde(skip)]
    pub indices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,
}

impl CountRequest {
    pub fn new<I, S>(indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            indices: non_blank_strings(indices),
            query: None,
        }
    }

    pub fn build<I, S>(indices: I, configure: impl FnOnce(&mut QueryClauses)) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut request = Self::new(indices);
        request.query = query(configure);
        request
    }

    pub fn with_query(mut self, query: impl Clause) -> Self {
        self.query = query.into_clause();
        self
    }
}

impl From<&SearchRequest> for CountRequest {
    fn from(search: &SearchRequest) -> Self {
        Self {
            indices: search.indices.clone(),
            query: search.query.clone(),
        }
    }
}

impl Endpoint for CountRequest {
    fn method(&self) -> Method {
        Method::Post
    }

    fn path_segments(&self) -> Vec<String> {
        join_indices(&self.indices)
            .into_iter()
            .chain(std::iter::once("_count".to_string()))
            .collect()
    }

    fn name(&self) -> &'static str {
        "count"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_search_body() {
        let request = SearchRequest::build(["products"], |s| {
            s.query(|c| {
                c.match_query("name", "phone");
                c.range("price", |r| {
                    r.lte(500);
                });
            });
            s.post_filter(|c| {
                c.term("color", "red");
            });
            s.from(10).size(5).min_score(0.5);
            s.sort_by("price", SortOrder::Asc);
            s.sort(SortOptions::Score(None));
            s.sort(SortOptions::Doc);
            s.sort("");
            s.source(SourceConfig::includes(["name", "price"]));
            s.aggs(|a| {
                a.terms("colors", "color", |_| {});
            });
            s.track_total_hits(true);
            s.search_after([json!(499), json!("sku-1")]);
            s.timeout("5s");
            s.collapse(FieldCollapse::new("brand"));
        });

        assert_eq!(
            request.body().unwrap(),
            json!({
                "query": {"bool": {"must": [
                    {"match": {"name": {"query": "phone"}}},
                    {"range": {"price": {"lte": 500}}}
                ]}},
                "post_filter": {"term": {"color": {"value": "red"}}},
                "from": 10,
                "size": 5,
                "sort": [{"price": {"order": "asc"}}, {"_score": {}}, "_doc"],
                "_source": {"includes": ["name", "price"]},
                "aggs": {"colors": {"terms": {"field": "color"}}},
                "track_total_hits": true,
                "min_score": 0.5,
                "search_after": [499, "sku-1"],
                "timeout": "5s",
                "collapse": {"field": "brand"}
            })
        );
    }

    #[test]
    fn test_empty_search_body() {
        let request = SearchRequest::new(Vec::<String>::new());
        assert_eq!(request.body().unwrap(), json!({}));
        assert_eq!(request.path_segments(), vec!["_search".to_string()]);
    }

    #[test]
    fn test_search_endpoint() {
        let mut request = SearchRequest::new(["logs-a", "", "logs-b"]);
        request.routing("user-1");
        assert_eq!(request.method(), Method::Post);
        assert_eq!(
            request.path_segments(),
            vec!["logs-a,logs-b".to_string(), "_search".to_string()]
        );
        assert_eq!(
            request.query_params(),
            vec![("routing", "user-1".to_string())]
        );
    }

    #[test]
    fn test_highlight() {
        let request = SearchRequest::build(["docs"], |s| {
            s.highlight(|h| {
                h.field("content", |f| {
                    f.fragment_size(150).number_of_fragments(3);
                });
                h.field("", |_| {});
                h.tags("<em>", "</em>");
            });
        });
        assert_eq!(
            request.body().unwrap(),
            json!({"highlight": {
                "fields": {"content": {"fragment_size": 150, "number_of_fragments": 3}},
                "pre_tags": ["<em>"],
                "post_tags": ["</em>"]
            }})
        );
    }

    #[test]
    fn test_highlight_blank_tags_ignored() {
        let request = SearchRequest::build(["docs"], |s| {
            s.highlight(|h| {
                h.field("content", |_| {});
                h.tags("", "</em>");
            });
        });
        assert_eq!(
            request.body().unwrap(),
            json!({"highlight": {"fields": {"content": {}}}})
        );
    }

    #[test]
    fn test_highlight_without_fields_is_dropped() {
        let request = SearchRequest::build(["docs"], |s| {
            s.highlight(|h| {
                h.fragment_size(100);
            });
        });
        assert!(request.highlight.is_none());
    }

    #[test]
    fn test_track_total_hits_count() {
        let mut request = SearchRequest::new(["a"]);
        request.track_total_hits(10_000u32);
        assert_eq!(request.body().unwrap(), json!({"track_total_hits": 10000}));
    }

    #[test]
    fn test_count_request() {
        let count = CountRequest::build(["logs"], |c| {
            c.term("level", "error");
        });
        assert_eq!(
            count.path_segments(),
            vec!["logs".to_string(), "_count".to_string()]
        );
        assert_eq!(
            serde_json::to_value(&count).unwrap(),
            json!({"query": {"term": {"level": {"value": "error"}}}})
        );

        let search = SearchRequest::build(["logs"], |s| {
            s.query(|c| {
                c.exists("trace_id");
            });
            s.size(0);
        });
        let from_search = CountRequest::from(&search);
        assert_eq!(
            serde_json::to_value(&from_search).unwrap(),
            json!({"query": {"exists": {"field": "trace_id"}}})
        );
    }

    #[test]
    fn test_field_sort_options() {
        let sort = FieldSort::new("price")
            .unwrap()
            .with_order(SortOrder::Desc)
            .with_mode(SortMode::Avg)
            .with_missing("_last");
        assert_eq!(
            serde_json::to_value(SortOptions::from(sort)).unwrap(),
            json!({"price": {"order": "desc", "mode": "avg", "missing": "_last"}})
        );
    }

    #[test]
    fn test_field_sort_blank_options_omitted() {
        let sort = FieldSort::new("price")
            .unwrap()
            .with_format("")
            .with_unmapped_type(" ");
        assert_eq!(
            serde_json::to_value(SortOptions::from(sort)).unwrap(),
            json!({"price": {}})
        );
    }
}
