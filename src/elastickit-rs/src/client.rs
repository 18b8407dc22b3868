use crate::{ClientError, Result};
use elastickit_core::builders::{Query, SearchSource, Source};
use elastickit_core::{CanonicalizeOptions, CanonicalizeReport, Canonicalizer, ClientConfig, Endpoint};
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

/// Search cluster REST API Client
///
/// Holds the canonical node list and spreads requests over it round-robin.
/// There is no retry: a failed request is returned to the caller as-is.
pub struct Client {
    endpoints: Vec<Endpoint>,
    next: AtomicUsize,
    client: HttpClient,
}

impl Client {
    /// Create a client from raw endpoint strings, canonicalized with defaults
    pub fn new<I, S>(urls: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let report = Canonicalizer::new(CanonicalizeOptions::default()).report(urls);
        Self::from_report(&report, HttpClient::new())
    }

    /// Create a client from a loaded configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let canonicalizer = Canonicalizer::new(config.canonicalize_options()?);
        let report = canonicalizer.report(&config.urls);
        Self::from_report(&report, Self::http_client(config)?)
    }

    /// Like [`Client::from_config`], but resolves fallback hosts off the
    /// async runtime and gives up when `cancel` fires
    pub async fn connect(config: &ClientConfig, cancel: &CancellationToken) -> Result<Self> {
        let canonicalizer = Canonicalizer::new(config.canonicalize_options()?);
        let report = canonicalizer.report_async(&config.urls, cancel).await;
        Self::from_report(&report, Self::http_client(config)?)
    }

    /// Create a client for already canonical endpoints
    pub fn with_endpoints(endpoints: Vec<Endpoint>, client: HttpClient) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(ClientError::NoAvailableEndpoints);
        }

        tracing::info!(
            endpoints = ?endpoints.iter().map(|e| e.redacted().to_string()).collect::<Vec<_>>(),
            "Client initialized"
        );

        Ok(Self {
            endpoints,
            next: AtomicUsize::new(0),
            client,
        })
    }

    fn from_report(report: &CanonicalizeReport, client: HttpClient) -> Result<Self> {
        for (input, reason) in report.dropped() {
            if input.contains('@') {
                tracing::warn!(%reason, "Ignoring endpoint");
            } else {
                tracing::warn!(input, %reason, "Ignoring endpoint");
            }
        }
        Self::with_endpoints(report.endpoints(), client)
    }

    fn http_client(config: &ClientConfig) -> Result<HttpClient> {
        Ok(HttpClient::builder()
            .timeout(config.request_timeout())
            .build()?)
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    fn next_endpoint(&self) -> &Endpoint {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        &self.endpoints[index]
    }

    /// Request builder for `path` on the next node, with basic auth taken
    /// from the endpoint's decoded userinfo
    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let endpoint = self.next_endpoint();
        let url = format!("{}/{}", endpoint.redacted(), path.trim_start_matches('/'));
        tracing::debug!(%method, %url, "Sending request");

        let builder = self.client.request(method, url);
        match endpoint.username() {
            Some(username) => builder.basic_auth(username, endpoint.password()),
            None => builder,
        }
    }

    async fn read_json(response: Response) -> Result<Value> {
        if !response.status().is_success() {
            return Err(ClientError::Server {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: Value = response.json().await?;
        Ok(body)
    }

    /// Run a search against `index`
    pub async fn search(&self, index: impl AsRef<str>, search: &SearchSource) -> Result<Value> {
        let path = format!("{}/_search", index.as_ref());

        let response = self
            .request(reqwest::Method::POST, &path)
            .json(&search.source())
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// Count documents in `index` matching `query`
    pub async fn count(&self, index: impl AsRef<str>, query: &dyn Query) -> Result<u64> {
        let path = format!("{}/_count", index.as_ref());

        let response = self
            .request(reqwest::Method::POST, &path)
            .json(&json!({ "query": query.source() }))
            .send()
            .await?;

        let body = Self::read_json(response).await?;
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or(ClientError::InvalidResponse)
    }

    /// Health check
    pub async fn ping(&self) -> Result<Value> {
        let response = self.request(reqwest::Method::GET, "/").send().await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_available_endpoints() {
        let result = Client::new(["ftp://example.com", "not a url"]);
        assert!(matches!(result, Err(ClientError::NoAvailableEndpoints)));

        let result = Client::new(Vec::<String>::new());
        assert!(matches!(result, Err(ClientError::NoAvailableEndpoints)));
    }

    #[test]
    fn test_endpoints_are_canonical() {
        let client = Client::new(["http://127.0.0.1:9200/ignored", "ftp://x", "https://node2:9243"]).unwrap();
        let endpoints: Vec<String> = client.endpoints().iter().map(|e| e.to_string()).collect();
        assert_eq!(endpoints, vec!["http://127.0.0.1:9200", "https://node2:9243"]);
    }

    #[test]
    fn test_round_robin() {
        let client = Client::new(["http://a:9200", "http://b:9200"]).unwrap();
        let picked: Vec<String> = (0..4).map(|_| client.next_endpoint().to_string()).collect();
        assert_eq!(
            picked,
            vec!["http://a:9200", "http://b:9200", "http://a:9200", "http://b:9200"]
        );
    }

    #[test]
    fn test_request_strips_userinfo_from_url() {
        let client = Client::new(["http://elastic:secret@a:9200"]).unwrap();
        let request = client
            .request(reqwest::Method::GET, "/_cluster/health")
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "http://a:9200/_cluster/health");
        assert!(request.headers().contains_key(reqwest::header::AUTHORIZATION));
    }

    #[test]
    fn test_basic_auth_uses_decoded_password() {
        let client = Client::new(["http://elastic:p%40ss@a:9200"]).unwrap();
        let request = client.request(reqwest::Method::GET, "/").build().unwrap();

        // base64("elastic:p@ss")
        assert_eq!(
            request.headers()[reqwest::header::AUTHORIZATION],
            "Basic ZWxhc3RpYzpwQHNz"
        );
    }

    #[test]
    fn test_from_config_rejects_bad_scheme() {
        let config = ClientConfig {
            fallback_scheme: "gopher".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(Client::from_config(&config), Err(ClientError::Config(_))));
    }

    #[tokio::test]
    async fn test_connect_with_defaults() {
        let client = Client::connect(&ClientConfig::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(client.endpoints().len(), 1);
        assert_eq!(client.endpoints()[0].to_string(), "http://127.0.0.1:9200");
    }

    #[tokio::test]
    async fn test_connect_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = Client::connect(&ClientConfig::default(), &cancel).await;
        assert!(matches!(result, Err(ClientError::NoAvailableEndpoints)));
    }
}
