//! Pinecone index client.
//!
//! Talks to the index's REST data plane directly with `reqwest`. The data-plane
//! host is taken from configuration or looked up once through the controller
//! for the configured environment.

use super::{RetrievedDocument, Retriever};
use crate::config::{PineconeSettings, Secrets};
use crate::embedding::Embedder;
use crate::error::{MortError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

const API_KEY_HEADER: &str = "Api-Key";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<PineconeMatch>,
}

/// A single scored match from a query.
#[derive(Debug, Clone, Deserialize)]
pub struct PineconeMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl PineconeMatch {
    pub fn into_document(self) -> RetrievedDocument {
        match &self.metadata {
            Some(metadata) => RetrievedDocument::from_metadata(metadata, self.score),
            None => RetrievedDocument {
                score: self.score,
                ..Default::default()
            },
        }
    }
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    status: IndexStatus,
}

#[derive(Deserialize)]
struct IndexStatus {
    host: String,
    #[serde(default)]
    ready: bool,
}

/// Handle to one Pinecone index.
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    host: Url,
    namespace: Option<String>,
}

impl PineconeIndex {
    /// Create a handle for a known data-plane host.
    pub fn new(host: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.to_string(),
            host: parse_host(host)?,
            namespace: None,
        })
    }

    /// Query within a namespace instead of the default one.
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }

    /// Connect using configuration, resolving the host when it isn't configured.
    pub async fn connect(settings: &PineconeSettings, secrets: &Secrets) -> Result<Self> {
        let host = match settings.host.as_deref().filter(|h| !h.trim().is_empty()) {
            Some(host) => host.to_string(),
            None => {
                let controller = controller_url(&secrets.pinecone_environment)?;
                let client = http_client(settings.request_timeout())?;
                describe_index_host(&client, &controller, &settings.index_name, &secrets.pinecone_api_key)
                    .await?
            }
        };

        info!("Using Pinecone index '{}' at {}", settings.index_name, host);

        Ok(Self::new(&host, &secrets.pinecone_api_key, settings.request_timeout())?
            .with_namespace(settings.namespace.clone()))
    }

    /// Return the `top_k` nearest neighbours of `vector`, with metadata.
    #[instrument(skip(self, vector), fields(dims = vector.len()))]
    pub async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<PineconeMatch>> {
        let url = self
            .host
            .join("query")
            .map_err(|e| MortError::Config(format!("Invalid Pinecone host: {}", e)))?;

        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MortError::Retrieval(format!("Pinecone query failed: {}", e)))?;

        let response = check_status(response, "query").await?;
        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| MortError::Retrieval(format!("Invalid Pinecone query response: {}", e)))?;

        debug!("Pinecone returned {} matches", parsed.matches.len());
        Ok(parsed.matches)
    }
}

/// Controller endpoint for a legacy (environment-scoped) project.
pub fn controller_url(environment: &str) -> Result<Url> {
    let environment = environment.trim();
    if environment.is_empty() {
        return Err(MortError::Config("Pinecone environment is empty".to_string()));
    }
    Url::parse(&format!("https://controller.{}.pinecone.io/", environment))
        .map_err(|e| MortError::Config(format!("Invalid Pinecone environment '{}': {}", environment, e)))
}

/// Look up an index's data-plane host through the controller.
pub(crate) async fn describe_index_host(
    client: &reqwest::Client,
    controller: &Url,
    index_name: &str,
    api_key: &str,
) -> Result<String> {
    let url = controller
        .join(&format!("databases/{}", index_name))
        .map_err(|e| MortError::Config(format!("Invalid index name '{}': {}", index_name, e)))?;

    let response = client
        .get(url)
        .header(API_KEY_HEADER, api_key)
        .send()
        .await
        .map_err(|e| MortError::Retrieval(format!("Pinecone controller unreachable: {}", e)))?;

    let response = check_status(response, "describe index").await?;
    let described: DescribeIndexResponse = response
        .json()
        .await
        .map_err(|e| MortError::Retrieval(format!("Invalid describe index response: {}", e)))?;

    if !described.status.ready {
        return Err(MortError::Retrieval(format!("Index '{}' is not ready", index_name)));
    }
    Ok(described.status.host)
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| MortError::Config(format!("Failed to create HTTP client: {}", e)))
}

fn parse_host(host: &str) -> Result<Url> {
    let host = host.trim().trim_end_matches('/');
    let with_scheme = if host.contains("://") {
        format!("{}/", host)
    } else {
        format!("https://{}/", host)
    };
    Url::parse(&with_scheme).map_err(|e| MortError::Config(format!("Invalid Pinecone host '{}': {}", host, e)))
}

/// Map non-success statuses. Only timeouts, rate limits and server errors are
/// worth retrying; other client errors fail on the first attempt.
async fn check_status(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(MortError::Config(format!(
            "Pinecone rejected the API key during {} ({})",
            action, status
        ))),
        StatusCode::NOT_FOUND => Err(MortError::Config(format!(
            "Pinecone {} returned 404: {}",
            action, body
        ))),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => Err(MortError::Retrieval(format!(
            "Pinecone {} returned {}: {}",
            action, status, body
        ))),
        s if s.is_server_error() => Err(MortError::Retrieval(format!(
            "Pinecone {} returned {}: {}",
            action, status, body
        ))),
        _ => Err(MortError::InvalidInput(format!(
            "Pinecone {} rejected the request ({}): {}",
            action, status, body
        ))),
    }
}

/// Embeds the question and queries Pinecone with the embedding.
pub struct PineconeRetriever {
    embedder: Arc<dyn Embedder>,
    index: PineconeIndex,
}

impl PineconeRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: PineconeIndex) -> Self {
        Self { embedder, index }
    }
}

#[async_trait]
impl Retriever for PineconeRetriever {
    #[instrument(skip(self))]
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDocument>> {
        let embedding = self.embedder.embed(query).await.map_err(|e| match e {
            permanent @ (MortError::Config(_) | MortError::InvalidInput(_)) => permanent,
            other => MortError::Retrieval(format!("Failed to embed query: {}", other)),
        })?;

        let matches = self.index.query(&embedding, top_k).await?;
        Ok(matches.into_iter().map(PineconeMatch::into_document).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::memory::KeywordEmbedder;
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn matches_body() -> Value {
        json!({
            "namespace": "",
            "matches": [
                {
                    "id": "a",
                    "score": 0.91,
                    "metadata": {
                        "title": "Rates",
                        "short_description": "About rates",
                        "child_url": "https://example.com/v?t=60",
                        "parent_url": "https://example.com/v",
                        "timestamp": "2024-01-01 00:01:00",
                        "text": "Fixed rates stay the same."
                    }
                },
                { "id": "b", "score": 0.5 }
            ]
        })
    }

    #[tokio::test]
    async fn test_query_sends_request_and_decodes_matches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(header(API_KEY_HEADER, "pc-key"))
            .and(body_partial_json(json!({
                "topK": 2,
                "includeMetadata": true,
                "namespace": "mortgage"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(matches_body()))
            .expect(1)
            .mount(&server)
            .await;

        let index = PineconeIndex::new(&server.uri(), "pc-key", Duration::from_secs(5))
            .unwrap()
            .with_namespace(Some("mortgage".to_string()));

        let matches = index.query(&[0.1, 0.2], 2).await.unwrap();
        assert_eq!(matches.len(), 2);

        let docs: Vec<_> = matches.into_iter().map(PineconeMatch::into_document).collect();
        assert_eq!(docs[0].title, "Rates");
        assert_eq!(docs[0].timestamp, "2024-01-01 00:01:00");
        assert!((docs[0].score - 0.91).abs() < 1e-6);
        assert_eq!(docs[1].title, "");
    }

    #[tokio::test]
    async fn test_unauthorized_is_a_config_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let index = PineconeIndex::new(&server.uri(), "bad", Duration::from_secs(5)).unwrap();
        let err = index.query(&[0.1], 1).await.unwrap_err();
        assert!(matches!(err, MortError::Config(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let index = PineconeIndex::new(&server.uri(), "k", Duration::from_secs(5)).unwrap();
        let err = index.query(&[0.1], 1).await.unwrap_err();
        assert!(matches!(err, MortError::Retrieval(ref msg) if msg.contains("overloaded")));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_bad_request_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(400).set_body_string("topK must be <= 10000"))
            .mount(&server)
            .await;

        let index = PineconeIndex::new(&server.uri(), "k", Duration::from_secs(5)).unwrap();
        let err = index.query(&[0.1], 100_000).await.unwrap_err();
        assert!(matches!(err, MortError::InvalidInput(ref msg) if msg.contains("topK")));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_rate_limit_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let index = PineconeIndex::new(&server.uri(), "k", Duration::from_secs(5)).unwrap();
        let err = index.query(&[0.1], 1).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_describe_index_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/databases/aimortgageapp"))
            .and(header(API_KEY_HEADER, "pc-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "database": { "name": "aimortgageapp", "dimension": 1536 },
                "status": { "ready": true, "host": "aimortgageapp-abc123.svc.us-east1-gcp.pinecone.io" }
            })))
            .mount(&server)
            .await;

        let controller = Url::parse(&format!("{}/", server.uri())).unwrap();
        let client = http_client(Duration::from_secs(5)).unwrap();
        let host = describe_index_host(&client, &controller, "aimortgageapp", "pc-key")
            .await
            .unwrap();
        assert_eq!(host, "aimortgageapp-abc123.svc.us-east1-gcp.pinecone.io");
    }

    #[tokio::test]
    async fn test_retriever_embeds_then_queries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_partial_json(json!({ "vector": [1.0, 0.0], "topK": 5 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(matches_body()))
            .mount(&server)
            .await;

        let embedder = Arc::new(KeywordEmbedder {
            keywords: vec!["rate", "fee"],
        });
        let index = PineconeIndex::new(&server.uri(), "k", Duration::from_secs(5)).unwrap();
        let retriever = PineconeRetriever::new(embedder, index);

        let docs = retriever.retrieve("current rate?", 5).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].short_description, "About rates");
    }

    #[test]
    fn test_parse_host_adds_scheme() {
        let url = parse_host("aimortgageapp-abc123.svc.us-east1-gcp.pinecone.io").unwrap();
        assert_eq!(url.as_str(), "https://aimortgageapp-abc123.svc.us-east1-gcp.pinecone.io/");
        assert_eq!(url.join("query").unwrap().path(), "/query");

        let url = parse_host("http://localhost:8080/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_controller_url() {
        let url = controller_url("us-east1-gcp").unwrap();
        assert_eq!(url.as_str(), "https://controller.us-east1-gcp.pinecone.io/");
        assert!(controller_url(" ").is_err());
    }
}
