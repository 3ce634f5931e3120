//! Synchronous client
//!
//! Drives [`ElasticsearchClient`] on an owned current-thread runtime. Must
//! not be used from inside another tokio runtime.

use crate::client::ElasticsearchClient;
use crate::config::ClientConfig;
use crate::error::Result;
use esdsl::bulk::BulkRequest;
use esdsl::cluster::HealthRequest;
use esdsl::document::{DeleteRequest, GetRequest, IndexRequest};
use esdsl::indices::{CreateIndexRequest, DeleteIndexRequest, IndexExistsRequest, RefreshRequest};
use esdsl::response::{
    AcknowledgedResponse, BulkResponse, CountResponse, DeleteResponse, GetResponse,
    HealthResponse, IndexResponse, InfoResponse, RefreshResponse, SearchResponse,
};
use esdsl::search::{CountRequest, SearchRequest};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct BlockingClient {
    inner: ElasticsearchClient,
    runtime: Runtime,
}

impl BlockingClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            inner: ElasticsearchClient::new(config)?,
            runtime,
        })
    }

    pub fn from_url(url: &str) -> Result<Self> {
        Self::new(&ClientConfig::with_url(url))
    }

    /// The async client behind this one.
    pub fn inner(&self) -> &ElasticsearchClient {
        &self.inner
    }

    pub fn info(&self) -> Result<InfoResponse> {
        self.runtime.block_on(self.inner.info())
    }

    pub fn ping(&self) -> bool {
        self.runtime.block_on(self.inner.ping())
    }

    pub fn search<T, I, S>(
        &self,
        indices: I,
        configure: impl FnOnce(&mut SearchRequest),
    ) -> Result<SearchResponse<T>>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.runtime.block_on(self.inner.search(indices, configure))
    }

    pub fn search_request<T: DeserializeOwned>(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchResponse<T>> {
        self.runtime.block_on(self.inner.search_request(request))
    }

    pub fn count(&self, request: &CountRequest) -> Result<CountResponse> {
        self.runtime.block_on(self.inner.count(request))
    }

    pub fn index(&self, request: &IndexRequest) -> Result<IndexResponse> {
        self.runtime.block_on(self.inner.index(request))
    }

    pub fn get<T: DeserializeOwned>(&self, request: &GetRequest) -> Result<GetResponse<T>> {
        self.runtime.block_on(self.inner.get(request))
    }

    pub fn delete(&self, request: &DeleteRequest) -> Result<DeleteResponse> {
        self.runtime.block_on(self.inner.delete(request))
    }

    pub fn bulk(&self, request: &BulkRequest) -> Result<BulkResponse> {
        self.runtime.block_on(self.inner.bulk(request))
    }

    pub fn refresh(&self, request: &RefreshRequest) -> Result<RefreshResponse> {
        self.runtime.block_on(self.inner.refresh(request))
    }

    pub fn create_index(&self, request: &CreateIndexRequest) -> Result<AcknowledgedResponse> {
        self.runtime.block_on(self.inner.create_index(request))
    }

    pub fn delete_index(&self, request: &DeleteIndexRequest) -> Result<AcknowledgedResponse> {
        self.runtime.block_on(self.inner.delete_index(request))
    }

    pub fn index_exists(&self, request: &IndexExistsRequest) -> Result<bool> {
        self.runtime.block_on(self.inner.index_exists(request))
    }

    pub fn cluster_health(&self, request: &HealthRequest) -> Result<HealthResponse> {
        self.runtime.block_on(self.inner.cluster_health(request))
    }

    /// Closes the client and stops its runtime. Never fails; tasks still
    /// running after the timeout are abandoned with a warning.
    pub fn close(self) {
        let Self { inner, runtime } = self;
        inner.close();
        let start = std::time::Instant::now();
        runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
        if start.elapsed() >= SHUTDOWN_TIMEOUT {
            tracing::warn!("blocking client runtime did not stop in time");
        }
    }
}
