use crate::util::non_blank;
use serde::Serialize;
use serde_json::{Map, Value};

/// Inline script used by `script_score` and scripted sorts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Script {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl Script {
    pub fn new(source: &str) -> Option<Self> {
        Some(Self {
            source: non_blank(source)?,
            lang: None,
            params: Map::new(),
        })
    }

    /// Adds a parameter; null values are skipped.
    pub fn with_param(mut self, name: &str, value: impl Serialize) -> Self {
        if let (Some(name), Some(value)) = (
            non_blank(name),
            crate::util::to_json_data_or_none(Some(value)),
        ) {
            self.params.insert(name, value);
        }
        self
    }
}

with_setters!(Script {
    with_lang => lang: impl Into<String>,
});
