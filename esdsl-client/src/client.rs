//! Async Elasticsearch client

use crate::config::ClientConfig;
use crate::error::Result;
use crate::metrics;
use crate::transport::{Body, Transport};
use esdsl::bulk::BulkRequest;
use esdsl::cluster::HealthRequest;
use esdsl::document::{DeleteRequest, GetRequest, IndexRequest};
use esdsl::endpoint::{Endpoint, Method};
use esdsl::indices::{CreateIndexRequest, DeleteIndexRequest, IndexExistsRequest, RefreshRequest};
use esdsl::response::{
    AcknowledgedResponse, BulkResponse, CountResponse, DeleteResponse, GetResponse,
    HealthResponse, IndexResponse, InfoResponse, RefreshResponse, SearchResponse,
};
use esdsl::search::{CountRequest, SearchRequest};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// `GET /` and `HEAD /`
struct Root(Method);

impl Endpoint for Root {
    fn method(&self) -> Method {
        self.0
    }

    fn path_segments(&self) -> Vec<String> {
        Vec::new()
    }

    fn name(&self) -> &'static str {
        match self.0 {
            Method::Head => "ping",
            _ => "info",
        }
    }
}

/// Elasticsearch client speaking the REST API.
///
/// Cheap to clone; clones share the connection pool.
///
/// ```no_run
/// # async fn run() -> esdsl_client::Result<()> {
/// use esdsl_client::ElasticsearchClient;
///
/// let client = ElasticsearchClient::from_url("http://localhost:9200")?;
/// let response: esdsl::response::SearchResponse = client
///     .search(["products"], |s| {
///         s.query(|q| {
///             q.match_query("name", "laptop");
///         });
///         s.size(10);
///     })
///     .await?;
/// println!("{} hits", response.total());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ElasticsearchClient {
    transport: Arc<Transport>,
}

impl ElasticsearchClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: Arc::new(Transport::new(config)?),
        })
    }

    pub fn from_url(url: &str) -> Result<Self> {
        Self::new(&ClientConfig::with_url(url))
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub async fn info(&self) -> Result<InfoResponse> {
        self.transport.send(&Root(Method::Get), None).await
    }

    /// `true` when the cluster answers; connection failures are `false`.
    pub async fn ping(&self) -> bool {
        match self.transport.exists(&Root(Method::Head)).await {
            Ok(up) => up,
            Err(e) => {
                tracing::debug!(error = %e, "ping failed");
                false
            }
        }
    }

    /// Builds and runs a search in one go.
    pub async fn search<T, I, S>(
        &self,
        indices: I,
        configure: impl FnOnce(&mut SearchRequest),
    ) -> Result<SearchResponse<T>>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let request = SearchRequest::build(indices, configure);
        self.search_request(&request).await
    }

    pub async fn search_request<T: DeserializeOwned>(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchResponse<T>> {
        let body = Body::Json(serde_json::to_vec(&request.body()?)?);
        self.transport.send(request, Some(body)).await
    }

    pub async fn count(&self, request: &CountRequest) -> Result<CountResponse> {
        self.transport.send(request, Some(Body::json(request)?)).await
    }

    pub async fn index(&self, request: &IndexRequest) -> Result<IndexResponse> {
        let body = Body::json(&request.document)?;
        self.transport.send(request, Some(body)).await
    }

    /// A missing document is `Ok` with `found == false`.
    pub async fn get<T: DeserializeOwned>(&self, request: &GetRequest) -> Result<GetResponse<T>> {
        self.transport.send_allow_not_found(request, None).await
    }

    /// A missing document is `Ok` with result `not_found`.
    pub async fn delete(&self, request: &DeleteRequest) -> Result<DeleteResponse> {
        self.transport.send_allow_not_found(request, None).await
    }

    /// Sends the NDJSON body. A request without any valid operation is not
    /// sent and yields an empty response.
    pub async fn bulk(&self, request: &BulkRequest) -> Result<BulkResponse> {
        let body = request.to_ndjson()?;
        if body.is_empty() {
            tracing::debug!(operations = request.len(), "bulk request has nothing to send");
            return Ok(BulkResponse::empty());
        }

        let response: BulkResponse = self.transport.send(request, Some(Body::NdJson(body))).await?;
        if response.errors {
            let failed = response.failed_items();
            metrics::record_bulk_failures(failed.len());
            tracing::warn!(
                failed = failed.len(),
                total = response.items.len(),
                "bulk request had failed items"
            );
        }
        Ok(response)
    }

    pub async fn refresh(&self, request: &RefreshRequest) -> Result<RefreshResponse> {
        self.transport.send(request, None).await
    }

    pub async fn create_index(&self, request: &CreateIndexRequest) -> Result<AcknowledgedResponse> {
        self.transport.send(request, Some(Body::json(request)?)).await
    }

    pub async fn delete_index(&self, request: &DeleteIndexRequest) -> Result<AcknowledgedResponse> {
        self.transport.send(request, None).await
    }

    pub async fn index_exists(&self, request: &IndexExistsRequest) -> Result<bool> {
        self.transport.exists(request).await
    }

    pub async fn cluster_health(&self, request: &HealthRequest) -> Result<HealthResponse> {
        self.transport.send(request, None).await
    }

    /// Releases the client. Connections close once every clone is dropped.
    pub fn close(self) {
        tracing::debug!(url = %self.transport.base_url(), "client closed");
    }
}
