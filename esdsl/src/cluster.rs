//! Cluster health request

use crate::endpoint::{join_indices, Endpoint, Method};
use crate::util::{non_blank, non_blank_strings};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Red,
    Yellow,
    Green,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Green => "green",
            HealthStatus::Yellow => "yellow",
            HealthStatus::Red => "red",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detail level of the health report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Cluster,
    Indices,
    Shards,
}

impl HealthLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthLevel::Cluster => "cluster",
            HealthLevel::Indices => "indices",
            HealthLevel::Shards => "shards",
        }
    }
}

/// `GET /_cluster/health[/<indices>]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthRequest {
    pub indices: Vec<String>,
    pub wait_for_status: Option<HealthStatus>,
    pub timeout: Option<String>,
    pub level: Option<HealthLevel>,
}

impl HealthRequest {
    /// Health of the whole cluster.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indices<I, S>(mut self, indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.indices = non_blank_strings(indices);
        self
    }

    /// Server-side wait, e.g. `"30s"`.
    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.timeout = non_blank(timeout);
        self
    }
}

with_setters!(HealthRequest {
    with_wait_for_status => wait_for_status: HealthStatus,
    with_level => level: HealthLevel,
});

impl Endpoint for HealthRequest {
    fn method(&self) -> Method {
        Method::Get
    }

    fn path_segments(&self) -> Vec<String> {
        let mut segments = vec!["_cluster".to_string(), "health".to_string()];
        segments.extend(join_indices(&self.indices));
        segments
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.wait_for_status {
            params.push(("wait_for_status", status.to_string()));
        }
        if let Some(timeout) = &self.timeout {
            params.push(("timeout", timeout.clone()));
        }
        if let Some(level) = self.level {
            params.push(("level", level.as_str().to_string()));
        }
        params
    }

    fn name(&self) -> &'static str {
        "cluster_health"
    }
}
