//! HTTP transport: URL building, authentication, timeouts and status mapping

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::metrics;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use esdsl::endpoint::{Endpoint, Method};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use url::Url;

const OPAQUE_ID: &str = "x-opaque-id";
const NDJSON: &str = "application/x-ndjson";

/// Request body as sent on the wire
#[derive(Debug, Clone)]
pub enum Body {
    Json(Vec<u8>),
    NdJson(String),
}

impl Body {
    pub fn json(value: &impl Serialize) -> Result<Self> {
        Ok(Body::Json(serde_json::to_vec(value)?))
    }
}

/// Sends [`Endpoint`]s to one Elasticsearch cluster.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    base_url: Url,
}

impl Transport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "'{}' cannot be used as a base URL",
                config.url
            )));
        }

        let client = Client::builder()
            .default_headers(default_headers(config)?)
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        tracing::debug!(url = %base_url, "transport created");
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of `endpoint`, with path segments escaped.
    pub fn url_for<E: Endpoint + ?Sized>(&self, endpoint: &E) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(endpoint.path_segments());
        let params = endpoint.query_params();
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Sends the request and returns the response whatever its status.
    pub async fn perform<E: Endpoint + ?Sized>(
        &self,
        endpoint: &E,
        body: Option<Body>,
    ) -> Result<Response> {
        let url = self.url_for(endpoint)?;
        let opaque_id = uuid::Uuid::new_v4().to_string();
        let name = endpoint.name();
        let method = endpoint.method();

        let mut request = self
            .client
            .request(to_reqwest(method), url.clone())
            .header(OPAQUE_ID, &opaque_id);
        request = match body {
            Some(Body::Json(bytes)) => request.header(CONTENT_TYPE, "application/json").body(bytes),
            Some(Body::NdJson(text)) => request.header(CONTENT_TYPE, NDJSON).body(text),
            None => request,
        };

        tracing::debug!(endpoint = name, %method, %url, opaque_id = %opaque_id, "sending request");
        let start = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let error = ClientError::from(e);
                metrics::record_request_error(name, error.kind());
                tracing::warn!(endpoint = name, opaque_id = %opaque_id, error = %error, "request failed");
                return Err(error);
            }
        };
        let elapsed = start.elapsed();
        let status = response.status();
        metrics::record_request(name, method.as_str(), status.as_u16(), elapsed);
        tracing::info!(
            endpoint = name,
            status = status.as_u16(),
            took_ms = elapsed.as_millis() as u64,
            opaque_id = %opaque_id,
            "request completed"
        );
        Ok(response)
    }

    /// Sends the request and decodes a 2xx JSON body; other statuses become
    /// [`ClientError::Api`] or [`ClientError::Status`].
    pub async fn send<E, R>(&self, endpoint: &E, body: Option<Body>) -> Result<R>
    where
        E: Endpoint + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.perform(endpoint, body).await?;
        decode(response, &[]).await
    }

    /// Like [`send`](Self::send), but a 404 whose body still decodes as `R`
    /// is returned as a value (missing documents on get and delete).
    pub async fn send_allow_not_found<E, R>(&self, endpoint: &E, body: Option<Body>) -> Result<R>
    where
        E: Endpoint + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.perform(endpoint, body).await?;
        decode(response, &[StatusCode::NOT_FOUND]).await
    }

    /// HEAD-style existence check: 2xx is `true`, 404 is `false`.
    pub async fn exists<E: Endpoint + ?Sized>(&self, endpoint: &E) -> Result<bool> {
        let response = self.perform(endpoint, None).await?;
        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::from_response(status.as_u16(), &body))
        }
    }
}

async fn decode<R: DeserializeOwned>(response: Response, tolerated: &[StatusCode]) -> Result<R> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(serde_json::from_str(&body)?);
    }
    if tolerated.contains(&status) {
        if let Ok(value) = serde_json::from_str(&body) {
            return Ok(value);
        }
    }
    Err(ClientError::from_response(status.as_u16(), &body))
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
    }
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (key, value) in &config.headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ClientError::Config(format!("invalid header name '{key}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::Config(format!("invalid value for header '{key}': {e}")))?;
        headers.insert(name, value);
    }

    if let Some(auth) = authorization(config) {
        let mut value = HeaderValue::from_str(&auth)
            .map_err(|e| ClientError::Config(format!("invalid credentials: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// API key wins over basic auth when both are configured.
fn authorization(config: &ClientConfig) -> Option<String> {
    if let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        let encoded = if key.contains(':') {
            BASE64.encode(key)
        } else {
            key.to_string()
        };
        return Some(format!("ApiKey {encoded}"));
    }
    let username = config.username.as_deref().filter(|u| !u.is_empty())?;
    let password = config.password.as_deref().unwrap_or("");
    Some(format!(
        "Basic {}",
        BASE64.encode(format!("{username}:{password}"))
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use esdsl::document::GetRequest;
    use esdsl::search::SearchRequest;

    fn transport(url: &str) -> Transport {
        Transport::new(&ClientConfig::with_url(url)).unwrap()
    }

    #[test]
    fn test_url_for_escapes_segments() {
        let t = transport("http://localhost:9200");
        let get = GetRequest::new("logs", "a/b c")
            .unwrap()
            .with_routing("user 1");
        assert_eq!(
            t.url_for(&get).unwrap().as_str(),
            "http://localhost:9200/logs/_doc/a%2Fb%20c?routing=user+1"
        );
    }

    #[test]
    fn test_url_for_keeps_base_path() {
        let t = transport("https://proxy.example.com/es/");
        let search = SearchRequest::new(["a", "b"]);
        assert_eq!(
            t.url_for(&search).unwrap().as_str(),
            "https://proxy.example.com/es/a,b/_search"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(Transport::new(&ClientConfig::with_url("mailto:es@example.com")).is_err());
        assert!(Transport::new(&ClientConfig::with_url("not a url")).is_err());
    }

    #[test]
    fn test_authorization_header() {
        let mut config = ClientConfig::default();
        assert_eq!(authorization(&config), None);

        config.username = Some("elastic".into());
        config.password = Some("secret".into());
        assert_eq!(
            authorization(&config).as_deref(),
            Some("Basic ZWxhc3RpYzpzZWNyZXQ=")
        );

        config.api_key = Some("id:key".into());
        assert_eq!(authorization(&config).as_deref(), Some("ApiKey aWQ6a2V5"));

        config.api_key = Some("aWQ6a2V5".into());
        assert_eq!(authorization(&config).as_deref(), Some("ApiKey aWQ6a2V5"));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut config = ClientConfig::default();
        config.headers.insert("bad header".into(), "x".into());
        assert!(matches!(
            Transport::new(&config),
            Err(ClientError::Config(_))
        ));
    }
}
