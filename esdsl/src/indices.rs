//! Index lifecycle: creation with settings, mappings and aliases, deletion,
//! existence checks and refresh

use crate::endpoint::{join_indices, Endpoint, Method};
use crate::error::DslError;
use crate::query::{query, Query, QueryClauses};
use crate::util::{non_blank, non_blank_strings, to_json_data_or_none};
use crate::Result;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;

const MAX_INDEX_NAME_BYTES: usize = 255;

fn invalid_chars() -> &'static Regex {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    INVALID.get_or_init(|| Regex::new(r#"[\\/*?"<>| ,#:]"#).unwrap())
}

/// Checks `name` against the Elasticsearch index naming rules.
pub fn validate_index_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| DslError::InvalidIndexName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.len() > MAX_INDEX_NAME_BYTES {
        return Err(invalid("must be at most 255 bytes"));
    }
    if name == "." || name == ".." {
        return Err(invalid("must not be '.' or '..'"));
    }
    if name.starts_with(['-', '_', '+']) {
        return Err(invalid("must not start with '-', '_' or '+'"));
    }
    if name.chars().any(char::is_uppercase) {
        return Err(invalid("must be lowercase"));
    }
    if let Some(m) = invalid_chars().find(name) {
        return Err(invalid(&format!("must not contain '{}'", m.as_str())));
    }
    Ok(())
}

// ============================================================================
// Mappings
// ============================================================================

/// `dynamic` setting of a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DynamicMapping {
    True,
    False,
    Strict,
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorSimilarity {
    L2Norm,
    DotProduct,
    Cosine,
    MaxInnerProduct,
}

/// A typed field mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Property {
    Keyword {
        #[serde(skip_serializing_if = "Option::is_none")]
        ignore_above: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        normalizer: Option<String>,
    },
    Text {
        #[serde(skip_serializing_if = "Option::is_none")]
        analyzer: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        search_analyzer: Option<String>,
        #[serde(skip_serializing_if = "Properties::is_empty")]
        fields: Properties,
    },
    Long,
    Integer,
    Double,
    Float,
    Boolean,
    Date {
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    Object {
        #[serde(skip_serializing_if = "Properties::is_empty")]
        properties: Properties,
    },
    Nested {
        #[serde(skip_serializing_if = "Properties::is_empty")]
        properties: Properties,
    },
    GeoPoint,
    DenseVector {
        dims: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        similarity: Option<VectorSimilarity>,
    },
}

impl Property {
    pub fn keyword() -> Self {
        Property::Keyword {
            ignore_above: None,
            normalizer: None,
        }
    }

    pub fn text() -> Self {
        Property::Text {
            analyzer: None,
            search_analyzer: None,
            fields: Properties::default(),
        }
    }

    /// `text` with a `keyword` sub-field, the dynamic-mapping default for strings.
    pub fn text_with_keyword() -> Self {
        let mut fields = Properties::default();
        fields.add(
            "keyword",
            Property::Keyword {
                ignore_above: Some(256),
                normalizer: None,
            },
        );
        Property::Text {
            analyzer: None,
            search_analyzer: None,
            fields,
        }
    }

    pub fn date(format: Option<&str>) -> Self {
        Property::Date {
            format: format.and_then(non_blank),
        }
    }

    /// `None` for zero dimensions.
    pub fn dense_vector(dims: u32, similarity: Option<VectorSimilarity>) -> Option<Self> {
        (dims > 0).then_some(Property::DenseVector {
            dims,
            index: similarity.map(|_| true),
            similarity,
        })
    }
}

/// Field name to mapping, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: Vec<(String, Property)>,
}

impl Properties {
    pub fn build(configure: impl FnOnce(&mut Properties)) -> Self {
        let mut properties = Properties::default();
        configure(&mut properties);
        properties
    }

    /// Adds or replaces `name`; blank names are ignored.
    pub fn add(&mut self, name: &str, property: impl Into<Option<Property>>) -> &mut Self {
        if let (Some(name), Some(property)) = (non_blank(name), property.into()) {
            match self.entries.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = property,
                None => self.entries.push((name, property)),
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keyword(&mut self, name: &str) -> &mut Self {
        self.add(name, Property::keyword())
    }

    pub fn text(&mut self, name: &str) -> &mut Self {
        self.add(name, Property::text())
    }

    pub fn long(&mut self, name: &str) -> &mut Self {
        self.add(name, Property::Long)
    }

    pub fn integer(&mut self, name: &str) -> &mut Self {
        self.add(name, Property::Integer)
    }

    pub fn double(&mut self, name: &str) -> &mut Self {
        self.add(name, Property::Double)
    }

    pub fn float(&mut self, name: &str) -> &mut Self {
        self.add(name, Property::Float)
    }

    pub fn boolean(&mut self, name: &str) -> &mut Self {
        self.add(name, Property::Boolean)
    }

    pub fn date(&mut self, name: &str) -> &mut Self {
        self.add(name, Property::date(None))
    }

    pub fn geo_point(&mut self, name: &str) -> &mut Self {
        self.add(name, Property::GeoPoint)
    }

    pub fn dense_vector(&mut self, name: &str, dims: u32) -> &mut Self {
        self.add(name, Property::dense_vector(dims, None))
    }

    pub fn object(&mut self, name: &str, configure: impl FnOnce(&mut Properties)) -> &mut Self {
        self.add(
            name,
            Property::Object {
                properties: Properties::build(configure),
            },
        )
    }

    pub fn nested(&mut self, name: &str, configure: impl FnOnce(&mut Properties)) -> &mut Self {
        self.add(
            name,
            Property::Nested {
                properties: Properties::build(configure),
            },
        )
    }
}

impl Serialize for Properties {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, property) in &self.entries {
            map.serialize_entry(name, property)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mappings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<DynamicMapping>,
    #[serde(skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

impl Mappings {
    pub fn properties(&mut self, configure: impl FnOnce(&mut Properties)) -> &mut Self {
        configure(&mut self.properties);
        self
    }

    pub fn dynamic(&mut self, dynamic: DynamicMapping) -> &mut Self {
        self.dynamic = Some(dynamic);
        self
    }
}

// ============================================================================
// Settings and aliases
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_shards: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_replicas: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IndexSettings {
    pub fn is_empty(&self) -> bool {
        self.number_of_shards.is_none()
            && self.number_of_replicas.is_none()
            && self.refresh_interval.is_none()
            && self.extra.is_empty()
    }

    /// Any other setting, e.g. `"analysis"`; null values are ignored.
    pub fn set(&mut self, key: &str, value: impl Serialize) -> &mut Self {
        if let (Some(key), Some(value)) = (non_blank(key), to_json_data_or_none(Some(value))) {
            self.extra.insert(key, value);
        }
        self
    }

    pub fn refresh_interval(&mut self, interval: &str) -> &mut Self {
        self.refresh_interval = non_blank(interval);
        self
    }
}

mut_setters!(IndexSettings {
    number_of_shards => number_of_shards: u32,
    number_of_replicas => number_of_replicas: u32,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Alias {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Query>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_write_index: Option<bool>,
}

impl Alias {
    pub fn filter(&mut self, configure: impl FnOnce(&mut QueryClauses)) -> &mut Self {
        self.filter = query(configure);
        self
    }

    pub fn routing(&mut self, routing: &str) -> &mut Self {
        self.routing = non_blank(routing);
        self
    }
}

mut_setters!(Alias {
    is_write_index => is_write_index: bool,
});

struct Aliases<'a>(&'a [(String, Alias)]);

impl Serialize for Aliases<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, alias) in self.0 {
            map.serialize_entry(name, alias)?;
        }
        map.end()
    }
}

// ============================================================================
// Requests
// ============================================================================

/// `PUT /<index>`
///
/// ```
/// use esdsl::indices::CreateIndexRequest;
///
/// let request = CreateIndexRequest::build("products", |r| {
///     r.settings(|s| {
///         s.number_of_shards(1).number_of_replicas(0);
///     });
///     r.mappings(|m| {
///         m.properties(|p| {
///             p.keyword("sku").text("name").double("price");
///         });
///     });
/// })
/// .unwrap();
/// let body = serde_json::to_value(&request).unwrap();
/// assert_eq!(body["mappings"]["properties"]["sku"]["type"], "keyword");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexRequest {
    pub index: String,
    pub settings: IndexSettings,
    pub mappings: Mappings,
    pub aliases: Vec<(String, Alias)>,
}

impl CreateIndexRequest {
    /// Fails when `index` breaks the naming rules.
    pub fn new(index: &str) -> Result<Self> {
        validate_index_name(index)?;
        Ok(Self {
            index: index.to_string(),
            settings: IndexSettings::default(),
            mappings: Mappings::default(),
            aliases: Vec::new(),
        })
    }

    pub fn build(index: &str, configure: impl FnOnce(&mut CreateIndexRequest)) -> Result<Self> {
        let mut request = Self::new(index)?;
        configure(&mut request);
        Ok(request)
    }

    pub fn settings(&mut self, configure: impl FnOnce(&mut IndexSettings)) -> &mut Self {
        configure(&mut self.settings);
        self
    }

    pub fn mappings(&mut self, configure: impl FnOnce(&mut Mappings)) -> &mut Self {
        configure(&mut self.mappings);
        self
    }

    /// Adds or replaces alias `name`; blank names are ignored.
    pub fn alias(&mut self, name: &str, configure: impl FnOnce(&mut Alias)) -> &mut Self {
        if let Some(name) = non_blank(name) {
            let mut alias = Alias::default();
            configure(&mut alias);
            match self.aliases.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = alias,
                None => self.aliases.push((name, alias)),
            }
        }
        self
    }
}

impl Serialize for CreateIndexRequest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.settings.is_empty() {
            map.serialize_entry("settings", &self.settings)?;
        }
        if self.mappings.dynamic.is_some() || !self.mappings.properties.is_empty() {
            map.serialize_entry("mappings", &self.mappings)?;
        }
        if !self.aliases.is_empty() {
            map.serialize_entry("aliases", &Aliases(&self.aliases))?;
        }
        map.end()
    }
}

impl Endpoint for CreateIndexRequest {
    fn method(&self) -> Method {
        Method::Put
    }

    fn path_segments(&self) -> Vec<String> {
        vec![self.index.clone()]
    }

    fn name(&self) -> &'static str {
        "create_index"
    }
}

/// `DELETE /<indices>`; at least one index is required.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteIndexRequest {
    pub indices: Vec<String>,
    pub ignore_unavailable: Option<bool>,
}

impl DeleteIndexRequest {
    pub fn new<I, S>(indices: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let indices = non_blank_strings(indices);
        (!indices.is_empty()).then_some(Self {
            indices,
            ignore_unavailable: None,
        })
    }
}

with_setters!(DeleteIndexRequest {
    with_ignore_unavailable => ignore_unavailable: bool,
});

impl Endpoint for DeleteIndexRequest {
    fn method(&self) -> Method {
        Method::Delete
    }

    fn path_segments(&self) -> Vec<String> {
        vec![self.indices.join(",")]
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        self.ignore_unavailable
            .map(|v| vec![("ignore_unavailable", v.to_string())])
            .unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "delete_index"
    }
}

/// `HEAD /<indices>`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExistsRequest {
    pub indices: Vec<String>,
}

impl IndexExistsRequest {
    pub fn new<I, S>(indices: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let indices = non_blank_strings(indices);
        (!indices.is_empty()).then_some(Self { indices })
    }
}

impl Endpoint for IndexExistsRequest {
    fn method(&self) -> Method {
        Method::Head
    }

    fn path_segments(&self) -> Vec<String> {
        vec![self.indices.join(",")]
    }

    fn name(&self) -> &'static str {
        "index_exists"
    }
}

/// `POST /<indices>/_refresh`, or every index when empty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshRequest {
    pub indices: Vec<String>,
}

impl RefreshRequest {
    pub fn new<I, S>(indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            indices: non_blank_strings(indices),
        }
    }
}

impl Endpoint for RefreshRequest {
    fn method(&self) -> Method {
        Method::Post
    }

    fn path_segments(&self) -> Vec<String> {
        join_indices(&self.indices)
            .into_iter()
            .chain(std::iter::once("_refresh".to_string()))
            .collect()
    }

    fn name(&self) -> &'static str {
        "refresh"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ========================================================================
    // Name validation
    // ========================================================================

    #[test]
    fn test_valid_index_names() {
        for name in ["logs", "logs-2024.01.01", "my_index", ".internal", "a+b"] {
            assert!(validate_index_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_index_names() {
        let long = "a".repeat(256);
        for name in [
            "", ".", "..", "-logs", "_logs", "+logs", "Logs", "a b", "a,b", "a*", "a/b", "a:b",
            "a#b", long.as_str(),
        ] {
            assert!(validate_index_name(name).is_err(), "{name} should be invalid");
        }
    }

    #[test]
    fn test_invalid_name_reason() {
        let err = validate_index_name("a|b").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid index name 'a|b': must not contain '|'"
        );
    }

    // ========================================================================
    // Create index body
    // ========================================================================

    #[test]
    fn test_create_index_body() {
        let request = CreateIndexRequest::build("products", |r| {
            r.settings(|s| {
                s.number_of_shards(2)
                    .number_of_replicas(1)
                    .refresh_interval("30s")
                    .set("max_result_window", 50_000);
            });
            r.mappings(|m| {
                m.dynamic(DynamicMapping::Strict);
                m.properties(|p| {
                    p.keyword("sku")
                        .add("name", Property::text_with_keyword())
                        .long("stock")
                        .boolean("active")
                        .add("released", Property::date(Some("yyyy-MM-dd")))
                        .geo_point("location")
                        .dense_vector("embedding", 384)
                        .dense_vector("broken", 0)
                        .nested("reviews", |r| {
                            r.keyword("author").integer("stars");
                        });
                });
            });
            r.alias("products-current", |a| {
                a.is_write_index(true);
            });
            r.alias("", |_| {});
        })
        .unwrap();

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "settings": {
                    "number_of_shards": 2,
                    "number_of_replicas": 1,
                    "refresh_interval": "30s",
                    "max_result_window": 50000
                },
                "mappings": {
                    "dynamic": "strict",
                    "properties": {
                        "sku": {"type": "keyword"},
                        "name": {"type": "text", "fields": {"keyword": {"type": "keyword", "ignore_above": 256}}},
                        "stock": {"type": "long"},
                        "active": {"type": "boolean"},
                        "released": {"type": "date", "format": "yyyy-MM-dd"},
                        "location": {"type": "geo_point"},
                        "embedding": {"type": "dense_vector", "dims": 384},
                        "reviews": {"type": "nested", "properties": {
                            "author": {"type": "keyword"},
                            "stars": {"type": "integer"}
                        }}
                    }
                },
                "aliases": {"products-current": {"is_write_index": true}}
            })
        );
    }

    #[test]
    fn test_empty_create_index_body() {
        let request = CreateIndexRequest::new("empty").unwrap();
        assert_eq!(serde_json::to_value(&request).unwrap(), json!({}));
        assert_eq!(request.method(), Method::Put);
        assert_eq!(request.path_segments(), vec!["empty"]);
    }

    #[test]
    fn test_create_index_invalid_name() {
        assert!(CreateIndexRequest::new("UPPER").is_err());
    }

    #[test]
    fn test_lifecycle_endpoints() {
        assert!(DeleteIndexRequest::new([""]).is_none());
        let delete = DeleteIndexRequest::new(["a", "b"])
            .unwrap()
            .with_ignore_unavailable(true);
        assert_eq!(delete.path_segments(), vec!["a,b"]);
        assert_eq!(
            delete.query_params(),
            vec![("ignore_unavailable", "true".to_string())]
        );

        let exists = IndexExistsRequest::new(["logs"]).unwrap();
        assert_eq!(exists.method(), Method::Head);

        assert_eq!(
            RefreshRequest::new(Vec::<&str>::new()).path_segments(),
            vec!["_refresh"]
        );
        assert_eq!(
            RefreshRequest::new(["logs"]).path_segments(),
            vec!["logs", "_refresh"]
        );
    }
}
