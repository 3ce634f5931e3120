//! Single-document requests: index, get and delete

use crate::endpoint::{Endpoint, Method};
use crate::indices::validate_index_name;
use crate::util::{non_blank, non_blank_strings};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// `refresh` parameter of write requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Refresh {
    True,
    False,
    WaitFor,
}

impl Refresh {
    pub fn as_str(&self) -> &'static str {
        match self {
            Refresh::True => "true",
            Refresh::False => "false",
            Refresh::WaitFor => "wait_for",
        }
    }
}

impl fmt::Display for Refresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<bool> for Refresh {
    fn from(refresh: bool) -> Self {
        if refresh {
            Refresh::True
        } else {
            Refresh::False
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpType {
    Index,
    Create,
}

/// `PUT /<index>/_doc/<id>` or `POST /<index>/_doc`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRequest {
    pub index: String,
    pub id: Option<String>,
    pub document: Value,
    pub refresh: Option<Refresh>,
    pub routing: Option<String>,
    pub op_type: Option<OpType>,
    pub pipeline: Option<String>,
}

impl IndexRequest {
    /// Fails when the index name is invalid or the document does not
    /// serialize to JSON.
    pub fn new(index: &str, document: impl Serialize) -> Result<Self> {
        validate_index_name(index)?;
        Ok(Self {
            index: index.to_string(),
            id: None,
            document: serde_json::to_value(document)?,
            refresh: None,
            routing: None,
            op_type: None,
            pipeline: None,
        })
    }

    /// Blank ids leave the id to Elasticsearch.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = non_blank(id);
        self
    }

    pub fn with_routing(mut self, routing: &str) -> Self {
        self.routing = non_blank(routing);
        self
    }

    pub fn with_pipeline(mut self, pipeline: &str) -> Self {
        self.pipeline = non_blank(pipeline);
        self
    }
}

with_setters!(IndexRequest {
    with_refresh => refresh: Refresh,
    with_op_type => op_type: OpType,
});

impl Endpoint for IndexRequest {
    fn method(&self) -> Method {
        if self.id.is_some() {
            Method::Put
        } else {
            Method::Post
        }
    }

    fn path_segments(&self) -> Vec<String> {
        let create = self.op_type == Some(OpType::Create);
        match &self.id {
            Some(id) if create => vec![self.index.clone(), "_create".to_string(), id.clone()],
            Some(id) => vec![self.index.clone(), "_doc".to_string(), id.clone()],
            None => vec![self.index.clone(), "_doc".to_string()],
        }
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if self.id.is_none() && self.op_type == Some(OpType::Create) {
            params.push(("op_type", "create".to_string()));
        }
        if let Some(refresh) = self.refresh {
            params.push(("refresh", refresh.to_string()));
        }
        if let Some(routing) = &self.routing {
            params.push(("routing", routing.clone()));
        }
        if let Some(pipeline) = &self.pipeline {
            params.push(("pipeline", pipeline.clone()));
        }
        params
    }

    fn name(&self) -> &'static str {
        "index"
    }
}

/// `GET /<index>/_doc/<id>`
#[derive(Debug, Clone, PartialEq)]
pub struct GetRequest {
    pub index: String,
    pub id: String,
    pub routing: Option<String>,
    pub source_includes: Vec<String>,
    pub source_excludes: Vec<String>,
    pub realtime: Option<bool>,
}

impl GetRequest {
    pub fn new(index: &str, id: &str) -> Option<Self> {
        Some(Self {
            index: non_blank(index)?,
            id: non_blank(id)?,
            routing: None,
            source_includes: Vec::new(),
            source_excludes: Vec::new(),
            realtime: None,
        })
    }

    pub fn with_routing(mut self, routing: &str) -> Self {
        self.routing = non_blank(routing);
        self
    }

    pub fn with_source_includes<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.source_includes = non_blank_strings(fields);
        self
    }

    pub fn with_source_excludes<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.source_excludes = non_blank_strings(fields);
        self
    }
}

with_setters!(GetRequest {
    with_realtime => realtime: bool,
});

impl Endpoint for GetRequest {
    fn method(&self) -> Method {
        Method::Get
    }

    fn path_segments(&self) -> Vec<String> {
        vec![self.index.clone(), "_doc".to_string(), self.id.clone()]
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(routing) = &self.routing {
            params.push(("routing", routing.clone()));
        }
        if !self.source_includes.is_empty() {
            params.push(("_source_includes", self.source_includes.join(",")));
        }
        if !self.source_excludes.is_empty() {
            params.push(("_source_excludes", self.source_excludes.join(",")));
        }
        if let Some(realtime) = self.realtime {
            params.push(("realtime", realtime.to_string()));
        }
        params
    }

    fn name(&self) -> &'static str {
        "get"
    }
}

/// `DELETE /<index>/_doc/<id>`
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    pub index: String,
    pub id: String,
    pub refresh: Option<Refresh>,
    pub routing: Option<String>,
}

impl DeleteRequest {
    pub fn new(index: &str, id: &str) -> Option<Self> {
        Some(Self {
            index: non_blank(index)?,
            id: non_blank(id)?,
            refresh: None,
            routing: None,
        })
    }

    pub fn with_routing(mut self, routing: &str) -> Self {
        self.routing = non_blank(routing);
        self
    }
}

with_setters!(DeleteRequest {
    with_refresh => refresh: Refresh,
});

impl Endpoint for DeleteRequest {
    fn method(&self) -> Method {
        Method::Delete
    }

    fn path_segments(&self) -> Vec<String> {
        vec![self.index.clone(), "_doc".to_string(), self.id.clone()]
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(refresh) = self.refresh {
            params.push(("refresh", refresh.to_string()));
        }
        if let Some(routing) = &self.routing {
            params.push(("routing", routing.clone()));
        }
        params
    }

    fn name(&self) -> &'static str {
        "delete"
    }
}
