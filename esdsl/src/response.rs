//! Typed Elasticsearch response bodies

use crate::bulk::BulkAction;
use crate::cluster::HealthStatus;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardStats {
    pub total: u32,
    pub successful: u32,
    #[serde(default)]
    pub skipped: u32,
    pub failed: u32,
}

/// `_search` response; `T` is the document type of `_source`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct SearchResponse<T = Value> {
    pub took: u64,
    pub timed_out: bool,
    #[serde(rename = "_shards")]
    pub shards: ShardStats,
    pub hits: Hits<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<HashMap<String, Value>>,
    #[serde(rename = "_scroll_id", default, skip_serializing_if = "Option::is_none")]
    pub scroll_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Hits<T = Value> {
    /// Absent when `track_total_hits` is `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<TotalHits>,
    pub max_score: Option<f64>,
    pub hits: Vec<Hit<T>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotalHitsRelation {
    #[serde(rename = "eq")]
    Equal,
    #[serde(rename = "gte")]
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalHits {
    pub value: u64,
    pub relation: TotalHitsRelation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Hit<T = Value> {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_routing", default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,
    /// Missing when `_source` is disabled for the request.
    #[serde(rename = "_source", default = "Option::default")]
    pub source: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<HashMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_hits: Option<HashMap<String, Value>>,
}

impl<T> SearchResponse<T> {
    /// Total hit count, `0` when not tracked.
    pub fn total(&self) -> u64 {
        self.hits.total.as_ref().map(|t| t.value).unwrap_or(0)
    }

    /// Sources of every hit that has one, in ranking order.
    pub fn documents(&self) -> impl Iterator<Item = &T> {
        self.hits.hits.iter().filter_map(|h| h.source.as_ref())
    }

    pub fn into_documents(self) -> Vec<T> {
        self.hits.hits.into_iter().filter_map(|h| h.source).collect()
    }

    /// Sort values of the last hit, for `search_after` paging.
    pub fn last_sort(&self) -> Option<&[Value]> {
        self.hits
            .hits
            .last()
            .map(|h| h.sort.as_slice())
            .filter(|s| !s.is_empty())
    }

    /// Raw JSON of aggregation `name`.
    pub fn aggregation(&self, name: &str) -> Option<&Value> {
        self.aggregations.as_ref()?.get(name)
    }

    /// Aggregation `name` parsed into its common shape.
    pub fn aggregation_result(&self, name: &str) -> Option<AggregationResult> {
        serde_json::from_value(self.aggregation(name)?.clone()).ok()
    }

    /// Buckets of aggregation `name`; empty for metric aggregations.
    pub fn buckets(&self, name: &str) -> Vec<Bucket> {
        match self.aggregation_result(name) {
            Some(AggregationResult::Buckets { buckets }) => buckets,
            _ => Vec::new(),
        }
    }

    /// Single value of a metric aggregation such as `avg` or `cardinality`.
    pub fn value(&self, name: &str) -> Option<f64> {
        match self.aggregation_result(name)? {
            AggregationResult::Value { value } => value,
            _ => None,
        }
    }
}

/// Common shapes of aggregation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AggregationResult {
    Buckets {
        buckets: Vec<Bucket>,
    },
    Stats {
        count: u64,
        min: Option<f64>,
        max: Option<f64>,
        sum: Option<f64>,
        avg: Option<f64>,
    },
    Percentiles {
        values: HashMap<String, Option<f64>>,
    },
    Value {
        value: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Missing for `filters` buckets, which are keyed by name.
    #[serde(default)]
    pub key: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_as_string: Option<String>,
    pub doc_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
    #[serde(flatten)]
    pub sub_aggs: HashMap<String, Value>,
}

impl Bucket {
    /// Key as a string, preferring `key_as_string`.
    pub fn key_string(&self) -> String {
        match (&self.key_as_string, &self.key) {
            (Some(s), _) => s.clone(),
            (None, Value::String(s)) => s.clone(),
            (None, other) => other.to_string(),
        }
    }

    /// A sub-aggregation result parsed into its common shape.
    pub fn sub_aggregation(&self, name: &str) -> Option<AggregationResult> {
        serde_json::from_value(self.sub_aggs.get(name)?.clone()).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
    #[serde(rename = "_shards")]
    pub shards: ShardStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteResult {
    Created,
    Updated,
    Deleted,
    NotFound,
    Noop,
}

/// Response of single-document writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteResponse {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version", default)]
    pub version: Option<u64>,
    pub result: WriteResult,
    #[serde(rename = "_shards", default)]
    pub shards: Option<ShardStats>,
    #[serde(rename = "_seq_no", default)]
    pub seq_no: Option<u64>,
    #[serde(rename = "_primary_term", default)]
    pub primary_term: Option<u64>,
}

pub type IndexResponse = WriteResponse;
pub type DeleteResponse = WriteResponse;

/// `GET /<index>/_doc/<id>`; a missing document has `found: false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct GetResponse<T = Value> {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version", default)]
    pub version: Option<u64>,
    pub found: bool,
    #[serde(rename = "_source", default = "Option::default")]
    pub source: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkResponse {
    pub took: u64,
    pub errors: bool,
    pub items: Vec<HashMap<BulkAction, BulkItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkItem {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(rename = "_version", default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub error: Option<ErrorCause>,
}

impl BulkResponse {
    /// What the client returns for a bulk request with nothing to send.
    pub fn empty() -> Self {
        Self {
            took: 0,
            errors: false,
            items: Vec::new(),
        }
    }

    /// Items that failed, with their position in the request.
    pub fn failed_items(&self) -> Vec<(usize, BulkAction, &BulkItem)> {
        self.items
            .iter()
            .enumerate()
            .flat_map(|(position, item)| {
                item.iter()
                    .filter(|(_, result)| result.error.is_some() || result.status >= 300)
                    .map(move |(action, result)| (position, *action, result))
            })
            .collect()
    }
}

/// `GET /_cluster/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub cluster_name: String,
    pub status: HealthStatus,
    pub timed_out: bool,
    pub number_of_nodes: u32,
    pub number_of_data_nodes: u32,
    pub active_primary_shards: u32,
    pub active_shards: u32,
    pub relocating_shards: u32,
    pub initializing_shards: u32,
    pub unassigned_shards: u32,
    #[serde(default)]
    pub number_of_pending_tasks: u32,
    #[serde(default)]
    pub active_shards_percent_as_number: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<HashMap<String, Value>>,
}

/// `POST /<indices>/_refresh`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshResponse {
    #[serde(rename = "_shards")]
    pub shards: ShardStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcknowledgedResponse {
    pub acknowledged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shards_acknowledged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
}

/// `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoResponse {
    pub name: String,
    pub cluster_name: String,
    #[serde(default)]
    pub cluster_uuid: String,
    pub version: VersionInfo,
    #[serde(default)]
    pub tagline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub number: String,
    #[serde(default)]
    pub build_flavor: Option<String>,
    #[serde(default)]
    pub build_hash: Option<String>,
    #[serde(default)]
    pub lucene_version: Option<String>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorCause,
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCause {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub root_cause: Vec<ErrorCause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<Box<ErrorCause>>,
}

impl ErrorResponse {
    /// Parses an error body. Elasticsearch sometimes sends a bare string as
    /// `error`; that becomes the reason of an `unknown` error.
    pub fn parse(status: u16, body: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(body).ok()?;
        match value.get("error")? {
            Value::String(reason) => Some(Self {
                error: ErrorCause {
                    error_type: "unknown".to_string(),
                    reason: Some(reason.clone()),
                    root_cause: Vec::new(),
                    caused_by: None,
                },
                status,
            }),
            cause => Some(Self {
                error: serde_json::from_value(cause.clone()).ok()?,
                status,
            }),
        }
    }

    pub fn reason(&self) -> &str {
        self.error.reason.as_deref().unwrap_or("")
    }
}
