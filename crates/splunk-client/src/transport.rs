//! Request transport.
//!
//! Entities and collections never talk HTTP directly; they go through a
//! [`Transport`], which takes a resource path and returns raw bytes. The
//! production implementation is [`HttpTransport`]. Tests substitute an
//! in-memory one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::atom;
use crate::config::{ClientConfig, Credentials};
use crate::error::{Result, SplunkError, TransportError};

/// A fetched representation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResponse {
    pub body: Vec<u8>,
    /// The `Content-Type` header, if any.
    pub content_type: Option<String>,
}

/// The three requests the entity engine makes.
///
/// Paths are whatever the caller handed to the engine: bare endpoint paths
/// (`data/inputs/tcp/raw/9999`), rooted paths (`/services/...`) or full
/// URLs. Implementations resolve them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a representation.
    async fn fetch(&self, path: &str) -> Result<FetchResponse>;

    /// POST form fields and return the response body.
    async fn submit(&self, path: &str, form: &[(String, String)]) -> Result<Vec<u8>>;

    /// DELETE a resource.
    async fn delete(&self, path: &str) -> Result<()>;
}

/// [`Transport`] over the Splunk management port.
pub struct HttpTransport {
    http: Client,
    base_url: String,
    namespace: Option<(String, String)>,
    credentials: Option<Credentials>,
}

impl HttpTransport {
    /// Build a transport from validated settings.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        if !config.verify_tls {
            warn!(base_url = %config.base_url, "TLS certificate verification disabled");
        }

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            namespace: config
                .namespace()
                .map(|(owner, app)| (owner.to_string(), app.to_string())),
            credentials: config.credentials.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a resource path to a request URL.
    ///
    /// Full URLs pass through. Rooted paths are appended to the base URL.
    /// Bare paths are placed under the configured namespace, or under
    /// `/services` when there is none.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            return format!("{}{}", self.base_url, path);
        }
        match &self.namespace {
            Some((owner, app)) => format!(
                "{}/servicesNS/{}/{}/{}",
                self.base_url,
                urlencoding::encode(owner),
                urlencoding::encode(app),
                path
            ),
            None => format!("{}/services/{}", self.base_url, path),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(Credentials::Token { token }) => request.bearer_auth(token),
            Some(Credentials::SessionKey { key }) => {
                request.header(AUTHORIZATION, format!("Splunk {key}"))
            }
            Some(Credentials::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            None => request,
        }
    }

    /// Map non-success statuses to errors.
    async fn check(&self, path: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(SplunkError::NotFound(path.to_string()));
        }

        let body = response.bytes().await.unwrap_or_default();
        let messages = atom::error_messages(&body);
        let message = if messages.is_empty() {
            String::from_utf8_lossy(&body).trim().to_string()
        } else {
            messages.join("; ")
        };

        warn!(path = %path, status = status.as_u16(), message = %message, "request failed");
        Err(TransportError::Status {
            status: status.as_u16(),
            message,
        }
        .into())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, path: &str) -> Result<FetchResponse> {
        let url = self.url(path);
        debug!(url = %url, "fetching");

        let response = self.authorize(self.http.get(&url)).send().await?;
        let response = self.check(path, response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.bytes().await?.to_vec();

        debug!(url = %url, size = body.len(), "fetched");
        Ok(FetchResponse { body, content_type })
    }

    async fn submit(&self, path: &str, form: &[(String, String)]) -> Result<Vec<u8>> {
        let url = self.url(path);
        debug!(url = %url, fields = form.len(), "submitting");

        let response = self
            .authorize(self.http.post(&url))
            .form(form)
            .send()
            .await?;
        let response = self.check(path, response).await?;

        Ok(response.bytes().await?.to_vec())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        debug!(url = %url, "deleting");

        let response = self.authorize(self.http.delete(&url)).send().await?;
        self.check(path, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn transport(server: &MockServer) -> HttpTransport {
        HttpTransport::new(&ClientConfig::new(server.uri())).unwrap()
    }

    #[test]
    fn test_url_resolution() {
        let plain = HttpTransport::new(&ClientConfig::new("https://localhost:8089/")).unwrap();
        assert_eq!(
            plain.url("data/indexes"),
            "https://localhost:8089/services/data/indexes"
        );
        assert_eq!(
            plain.url("/servicesNS/admin/search/saved/searches"),
            "https://localhost:8089/servicesNS/admin/search/saved/searches"
        );
        assert_eq!(
            plain.url("https://other:8089/services/data/indexes/main"),
            "https://other:8089/services/data/indexes/main"
        );

        let namespaced = HttpTransport::new(
            &ClientConfig::new("https://localhost:8089").with_namespace("nobody", "search"),
        )
        .unwrap();
        assert_eq!(
            namespaced.url("data/indexes"),
            "https://localhost:8089/servicesNS/nobody/search/data/indexes"
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = HttpTransport::new(&ClientConfig::new("ftp://localhost"));
        assert!(matches!(result, Err(SplunkError::Config(_))));
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data/indexes"))
            .and(query_param("count", "10"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<feed/>", "text/xml; charset=UTF-8"),
            )
            .mount(&server)
            .await;

        let response = transport(&server)
            .fetch("data/indexes?count=10")
            .await
            .unwrap();
        assert_eq!(response.body, b"<feed/>");
        assert_eq!(
            response.content_type.as_deref(),
            Some("text/xml; charset=UTF-8")
        );
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = transport(&server)
            .fetch("data/indexes/nope")
            .await
            .unwrap_err();
        assert!(matches!(err, SplunkError::NotFound(ref p) if p == "data/indexes/nope"));
    }

    #[tokio::test]
    async fn test_status_error_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/data/inputs/tcp/raw/9999"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"<response><messages><msg type="ERROR">Argument "bogus" is not supported</msg></messages></response>"#,
            ))
            .mount(&server)
            .await;

        let err = transport(&server)
            .submit(
                "data/inputs/tcp/raw/9999",
                &[("bogus".to_string(), "1".to_string())],
            )
            .await
            .unwrap_err();

        match err {
            SplunkError::Transport(TransportError::Status { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, r#"Argument "bogus" is not supported"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_sends_form_with_repeated_keys() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/data/inputs/win-wmi-collections/cpu"))
            .and(body_string("fields=Name&fields=Handle&interval=30"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let body = transport(&server)
            .submit(
                "data/inputs/win-wmi-collections/cpu",
                &[
                    ("fields".to_string(), "Name".to_string()),
                    ("fields".to_string(), "Handle".to_string()),
                    ("interval".to_string(), "30".to_string()),
                ],
            )
            .await
            .unwrap();
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn test_credentials_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/services/data/indexes/old"))
            .and(header("authorization", "Splunk abc123"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = ClientConfig::new(server.uri())
            .with_credentials(Credentials::SessionKey { key: "abc123".into() });
        HttpTransport::new(&config)
            .unwrap()
            .delete("data/indexes/old")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<feed/>"))
            .expect(1)
            .mount(&server)
            .await;

        let config = ClientConfig::new(server.uri())
            .with_credentials(Credentials::Token { token: "tok".into() });
        HttpTransport::new(&config)
            .unwrap()
            .fetch("data/indexes")
            .await
            .unwrap();
    }
}
