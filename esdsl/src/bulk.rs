//! Bulk requests, serialized as NDJSON
//!
//! Each operation becomes one action line, followed by a source line for
//! `index`, `create` and `update`. Every line, including the last, ends with
//! `\n`.

use crate::document::Refresh;
use crate::endpoint::{Endpoint, Method};
use crate::one_field_map::OneFieldMap;
use crate::util::non_blank;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Index,
    Create,
    Update,
    Delete,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Index => "index",
            BulkAction::Create => "create",
            BulkAction::Update => "update",
            BulkAction::Delete => "delete",
        }
    }

    /// Whether the action line is followed by a source line.
    pub fn has_source(&self) -> bool {
        !matches!(self, BulkAction::Delete)
    }
}

/// Metadata of an action line
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkMeta {
    #[serde(rename = "_index", skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
}

/// One operation of a bulk request
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOperation {
    pub action: BulkAction,
    pub meta: BulkMeta,
    pub source: Option<Value>,
}

impl BulkOperation {
    /// Index (create or replace) a document.
    pub fn index(document: impl Serialize) -> Result<Self> {
        Ok(Self {
            action: BulkAction::Index,
            meta: BulkMeta::default(),
            source: Some(serde_json::to_value(document)?),
        })
    }

    /// Create a document, failing on the server if the id exists.
    pub fn create(document: impl Serialize) -> Result<Self> {
        Ok(Self {
            action: BulkAction::Create,
            meta: BulkMeta::default(),
            source: Some(serde_json::to_value(document)?),
        })
    }

    /// Partial update; `None` for a blank id.
    pub fn update(id: &str, partial: impl Serialize) -> Result<Option<Self>> {
        let Some(id) = non_blank(id) else {
            return Ok(None);
        };
        Ok(Some(Self {
            action: BulkAction::Update,
            meta: BulkMeta {
                id: Some(id),
                ..Default::default()
            },
            source: Some(json!({ "doc": serde_json::to_value(partial)? })),
        }))
    }

    /// `None` for a blank id.
    pub fn delete(id: &str) -> Option<Self> {
        Some(Self {
            action: BulkAction::Delete,
            meta: BulkMeta {
                id: Some(non_blank(id)?),
                ..Default::default()
            },
            source: None,
        })
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.meta.id = non_blank(id);
        self
    }

    /// Overrides the request's default index for this operation.
    pub fn with_index(mut self, index: &str) -> Self {
        self.meta.index = non_blank(index);
        self
    }

    pub fn with_routing(mut self, routing: &str) -> Self {
        self.meta.routing = non_blank(routing);
        self
    }

    /// Makes an update insert the partial document when the target is missing.
    pub fn with_doc_as_upsert(mut self, upsert: bool) -> Self {
        if let (BulkAction::Update, Some(Value::Object(source))) = (self.action, &mut self.source) {
            source.insert("doc_as_upsert".to_string(), Value::Bool(upsert));
        }
        self
    }

    fn requires_id(&self) -> bool {
        matches!(self.action, BulkAction::Update | BulkAction::Delete)
    }
}

/// `POST /_bulk`
///
/// ```
/// use esdsl::bulk::{BulkOperation, BulkRequest};
/// use serde_json::json;
///
/// let mut bulk = BulkRequest::new().with_index("logs");
/// bulk.add(BulkOperation::index(json!({"msg": "a"})).unwrap().with_id("1"));
/// bulk.add(BulkOperation::delete("2"));
/// bulk.add(BulkOperation::delete("")); // no id, ignored
///
/// assert_eq!(
///     bulk.to_ndjson().unwrap(),
///     "{\"index\":{\"_index\":\"logs\",\"_id\":\"1\"}}\n{\"msg\":\"a\"}\n\
///      {\"delete\":{\"_index\":\"logs\",\"_id\":\"2\"}}\n"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkRequest {
    pub index: Option<String>,
    pub refresh: Option<Refresh>,
    pub pipeline: Option<String>,
    pub operations: Vec<BulkOperation>,
}

impl BulkRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default target index for operations without their own.
    pub fn with_index(mut self, index: &str) -> Self {
        self.index = non_blank(index);
        self
    }

    pub fn with_pipeline(mut self, pipeline: &str) -> Self {
        self.pipeline = non_blank(pipeline);
        self
    }

    pub fn with_refresh(mut self, refresh: Refresh) -> Self {
        self.refresh = Some(refresh);
        self
    }

    /// Appends an operation; `None` is ignored.
    pub fn add(&mut self, operation: impl Into<Option<BulkOperation>>) -> &mut Self {
        if let Some(operation) = operation.into() {
            self.operations.push(operation);
        }
        self
    }

    /// Appends an `index` operation for every document, with ids taken
    /// from `id_of`.
    pub fn index_all<T, I, F>(&mut self, documents: I, id_of: F) -> Result<&mut Self>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> Option<String>,
    {
        for document in documents {
            let id = id_of(&document);
            let mut operation = BulkOperation::index(&document)?;
            if let Some(id) = id {
                operation = operation.with_id(&id);
            }
            self.operations.push(operation);
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operations with a target index and, where needed, an id.
    pub fn valid_operations(&self) -> impl Iterator<Item = (&BulkOperation, String)> {
        self.operations.iter().filter_map(|op| {
            let Some(index) = op.meta.index.clone().or_else(|| self.index.clone()) else {
                tracing::warn!(
                    action = op.action.as_str(),
                    id = ?op.meta.id,
                    "bulk operation without target index dropped"
                );
                return None;
            };
            if op.requires_id() && op.meta.id.is_none() {
                tracing::warn!(action = op.action.as_str(), "bulk operation without id dropped");
                return None;
            }
            Some((op, index))
        })
    }

    /// NDJSON body. Empty when no operation is valid.
    pub fn to_ndjson(&self) -> Result<String> {
        let mut body = String::new();
        for (op, index) in self.valid_operations() {
            let meta = BulkMeta {
                index: Some(index),
                ..op.meta.clone()
            };
            body.push_str(&serde_json::to_string(&OneFieldMap::new(
                op.action.as_str(),
                &meta,
            ))?);
            body.push('\n');
            if op.action.has_source() {
                let source = op.source.as_ref().unwrap_or(&Value::Null);
                body.push_str(&serde_json::to_string(source)?);
                body.push('\n');
            }
        }
        Ok(body)
    }
}

impl Endpoint for BulkRequest {
    fn method(&self) -> Method {
        Method::Post
    }

    fn path_segments(&self) -> Vec<String> {
        vec!["_bulk".to_string()]
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(refresh) = self.refresh {
            params.push(("refresh", refresh.to_string()));
        }
        if let Some(pipeline) = &self.pipeline {
            params.push(("pipeline", pipeline.clone()));
        }
        params
    }

    fn name(&self) -> &'static str {
        "bulk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(body: &str) -> Vec<Value> {
        body.lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_ndjson_pairs_sources() {
        let mut bulk = BulkRequest::new().with_index("products");
        bulk.add(BulkOperation::index(json!({"name": "a"})).unwrap().with_id("1"));
        bulk.add(BulkOperation::create(json!({"name": "b"})).unwrap());
        bulk.add(BulkOperation::update("3", json!({"price": 10})).unwrap().map(|u| u.with_doc_as_upsert(true)));
        bulk.add(BulkOperation::delete("4").map(|d| d.with_index("archive")));

        let body = bulk.to_ndjson().unwrap();
        assert!(body.ends_with('\n'));
        assert_eq!(
            lines(&body),
            vec![
                json!({"index": {"_index": "products", "_id": "1"}}),
                json!({"name": "a"}),
                json!({"create": {"_index": "products"}}),
                json!({"name": "b"}),
                json!({"update": {"_index": "products", "_id": "3"}}),
                json!({"doc": {"price": 10}, "doc_as_upsert": true}),
                json!({"delete": {"_index": "archive", "_id": "4"}}),
            ]
        );
    }

    #[test]
    fn test_operations_without_index_are_dropped() {
        let mut bulk = BulkRequest::new();
        bulk.add(BulkOperation::index(json!({"a": 1})).unwrap());
        bulk.add(BulkOperation::index(json!({"b": 2})).unwrap().with_index("explicit"));
        let body = bulk.to_ndjson().unwrap();
        assert_eq!(
            lines(&body),
            vec![json!({"index": {"_index": "explicit"}}), json!({"b": 2})]
        );
    }

    #[test]
    fn test_blank_ids_rejected() {
        assert!(BulkOperation::delete(" ").is_none());
        assert!(BulkOperation::update("", json!({})).unwrap().is_none());

        let mut bulk = BulkRequest::new().with_index("x");
        bulk.add(BulkOperation::delete("1").map(|d| d.with_id("")));
        assert_eq!(bulk.len(), 1);
        assert_eq!(bulk.to_ndjson().unwrap(), "");
    }

    #[test]
    fn test_index_all_with_ids() {
        #[derive(Serialize)]
        struct Doc {
            id: u32,
        }
        let mut bulk = BulkRequest::new().with_index("docs");
        bulk.index_all(vec![Doc { id: 1 }, Doc { id: 2 }], |d| Some(d.id.to_string()))
            .unwrap();
        let body = bulk.to_ndjson().unwrap();
        assert_eq!(body.lines().count(), 4);
        assert_eq!(lines(&body)[2], json!({"index": {"_index": "docs", "_id": "2"}}));
    }

    #[test]
    fn test_bulk_endpoint() {
        let bulk = BulkRequest::new()
            .with_refresh(Refresh::WaitFor)
            .with_pipeline("ingest");
        assert_eq!(bulk.path_segments(), vec!["_bulk"]);
        assert_eq!(
            bulk.query_params(),
            vec![
                ("refresh", "wait_for".to_string()),
                ("pipeline", "ingest".to_string())
            ]
        );
    }
}
