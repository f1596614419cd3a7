//! Header fetcher: one GET per hop, keeping only status and `Location`.
//!
//! The network call lives behind the [`HopTransport`] trait. The production
//! transport wraps a `reqwest` client with redirect following disabled, so
//! every hop of a chain is observed. [`HeaderFetcher`] validates the URL,
//! drives the transport and applies the retry policy.

use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use tracing::{debug, info, instrument};
use url::Url;

use super::error::{CheckError, TransportError};
use super::outcome::HopResult;
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use crate::user_agent;

/// A single request/response exchange against an already validated URL.
#[async_trait]
pub trait HopTransport: Send + Sync {
    /// Sends a GET and returns the status code and `Location` header.
    ///
    /// The response body must be consumed before returning.
    async fn get(&self, url: &Url) -> Result<HopResult, TransportError>;
}

/// `reqwest`-backed transport that never follows redirects itself.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport whose requests time out after `request_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(request_timeout: Duration) -> Result<Self, CheckError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(request_timeout)
            .user_agent(user_agent::default_checker_user_agent())
            .build()
            .map_err(CheckError::ClientBuild)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HopTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HopResult, TransportError> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status_code = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string);

        // Drain the body chunk by chunk so the connection goes back to the pool.
        while response
            .chunk()
            .await
            .map_err(map_reqwest_error)?
            .is_some()
        {}

        Ok(HopResult::new(status_code, location))
    }
}

/// Maps a reqwest error to a transport error, surfacing the underlying I/O
/// error when one exists so it can be classified.
fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        return TransportError::Timeout;
    }
    if let Some(io_error) = find_io_error(&error) {
        return TransportError::io(io_error.kind(), io_error.to_string());
    }
    TransportError::Http(error)
}

fn find_io_error(error: &reqwest::Error) -> Option<&std::io::Error> {
    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io_error) = cause.downcast_ref::<std::io::Error>() {
            return Some(io_error);
        }
        source = cause.source();
    }
    None
}

/// Validates that `raw` is an absolute http(s) URL with a host.
///
/// # Errors
///
/// Returns [`CheckError::MalformedUrl`] otherwise.
pub fn parse_check_url(raw: &str) -> Result<Url, CheckError> {
    let url = Url::parse(raw).map_err(|e| CheckError::malformed_url(raw, e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(CheckError::malformed_url(
                raw,
                format!("scheme '{scheme}' is not supported"),
            ));
        }
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(CheckError::malformed_url(raw, "URL has no host"));
    }

    Ok(url)
}

/// Fetches the status and `Location` of a URL with retry on transient failures.
///
/// Cheap to clone; clones share the underlying transport.
#[derive(Clone)]
pub struct HeaderFetcher {
    transport: Arc<dyn HopTransport>,
    retry_policy: RetryPolicy,
}

impl std::fmt::Debug for HeaderFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderFetcher")
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

impl HeaderFetcher {
    /// Creates a fetcher backed by `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(request_timeout: Duration, retry_policy: RetryPolicy) -> Result<Self, CheckError> {
        let transport = ReqwestTransport::new(request_timeout)?;
        Ok(Self::with_transport(Arc::new(transport), retry_policy))
    }

    /// Creates a fetcher over an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn HopTransport>, retry_policy: RetryPolicy) -> Self {
        Self {
            transport,
            retry_policy,
        }
    }

    /// Returns the retry policy in use.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Fetches `url` once, retrying transient failures with exponential backoff.
    ///
    /// # Errors
    ///
    /// - [`CheckError::MalformedUrl`] if `url` is not an absolute http(s) URL (no retry)
    /// - [`CheckError::Network`] if the failure is permanent or the retry budget is spent
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<HopResult, CheckError> {
        let parsed = parse_check_url(url)?;
        let mut retries = 0u32;

        loop {
            match self.transport.get(&parsed).await {
                Ok(hop) => {
                    debug!(
                        status = hop.status_code,
                        location = hop.location.as_deref().unwrap_or(""),
                        retries,
                        "fetched"
                    );
                    return Ok(hop);
                }
                Err(error) => {
                    let failure_type = classify_error(&error);
                    match self.retry_policy.should_retry(failure_type, retries) {
                        RetryDecision::Retry { delay, retry } => {
                            info!(
                                url,
                                retry,
                                max_retries = self.retry_policy.max_retries(),
                                delay_ms = delay.as_millis(),
                                error = %error,
                                "retrying fetch"
                            );
                            retries = retry;
                            tokio::time::sleep(delay).await;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(url, %reason, "not retrying fetch");
                            return Err(CheckError::network(url, retries + 1, error));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::ErrorKind;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::test_support::socket_guard::{
        closed_local_port, should_skip_socket_bound_test, start_mock_server_or_skip,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    /// Transport that replays a fixed script of results, then keeps returning 200.
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<HopResult, TransportError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn failing_then_ok(failures: usize) -> Self {
            let mut script = VecDeque::new();
            for _ in 0..failures {
                script.push_back(Err(TransportError::io(
                    ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )));
            }
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HopTransport for ScriptedTransport {
        async fn get(&self, _url: &Url) -> Result<HopResult, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(HopResult::new(200, None)))
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1))
    }

    /// Serves a non-HTTP reply on every connection and counts connections.
    async fn spawn_garbage_server() -> Option<(String, Arc<AtomicUsize>)> {
        if should_skip_socket_bound_test() {
            return None;
        }
        let listener = TcpListener::bind("127.0.0.1:0").await.ok()?;
        let addr = listener.local_addr().ok()?;
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(b"NOT-HTTP garbage\r\n\r\n").await;
                let _ = socket.shutdown().await;
            }
        });

        Some((format!("http://{addr}"), hits))
    }

    // ==================== URL Validation Tests ====================

    #[test]
    fn test_parse_check_url_accepts_http_and_https() {
        assert!(parse_check_url("http://a.example/old").is_ok());
        assert!(parse_check_url("https://a.example/new?x=1").is_ok());
    }

    #[test]
    fn test_parse_check_url_rejects_garbage() {
        let result = parse_check_url("not a url");
        assert!(matches!(result, Err(CheckError::MalformedUrl { .. })));
    }

    #[test]
    fn test_parse_check_url_rejects_unsupported_scheme() {
        let result = parse_check_url("ftp://a.example/file");
        match result {
            Err(CheckError::MalformedUrl { reason, .. }) => assert!(reason.contains("ftp")),
            other => panic!("Expected MalformedUrl, got: {other:?}"),
        }
    }

    // ==================== Retry Tests ====================

    #[tokio::test]
    async fn test_fetch_recovers_after_transient_failures_within_budget() {
        let transport = Arc::new(ScriptedTransport::failing_then_ok(2));
        let fetcher = HeaderFetcher::with_transport(transport.clone(), fast_policy(3));

        let hop = fetcher.fetch("http://a.example/old").await.unwrap();

        assert_eq!(hop, HopResult::new(200, None));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_fetch_recovers_when_last_retry_succeeds() {
        let transport = Arc::new(ScriptedTransport::failing_then_ok(3));
        let fetcher = HeaderFetcher::with_transport(transport.clone(), fast_policy(3));

        assert!(fetcher.fetch("http://a.example/old").await.is_ok());
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn test_fetch_surfaces_network_error_when_budget_spent() {
        let transport = Arc::new(ScriptedTransport::failing_then_ok(4));
        let fetcher = HeaderFetcher::with_transport(transport.clone(), fast_policy(3));

        let result = fetcher.fetch("http://a.example/old").await;

        match result {
            Err(CheckError::Network { attempts, .. }) => assert_eq!(attempts, 4),
            other => panic!("Expected Network error, got: {other:?}"),
        }
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn test_fetch_does_not_retry_permanent_failure() {
        let transport = Arc::new(ScriptedTransport {
            script: Mutex::new(VecDeque::from([Err(TransportError::io(
                ErrorKind::PermissionDenied,
                "denied",
            ))])),
            calls: AtomicUsize::new(0),
        });
        let fetcher = HeaderFetcher::with_transport(transport.clone(), fast_policy(3));

        let result = fetcher.fetch("http://a.example/old").await;

        assert!(matches!(
            result,
            Err(CheckError::Network { attempts: 1, .. })
        ));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_malformed_url_never_reaches_transport() {
        let transport = Arc::new(ScriptedTransport::failing_then_ok(0));
        let fetcher = HeaderFetcher::with_transport(transport.clone(), fast_policy(3));

        let result = fetcher.fetch("::not-a-url::").await;

        assert!(matches!(result, Err(CheckError::MalformedUrl { .. })));
        assert_eq!(transport.calls(), 0);
    }

    // ==================== reqwest Transport Tests ====================

    #[tokio::test]
    async fn test_reqwest_transport_captures_redirect_without_following() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("Location", "https://a.example/new")
                    .set_body_string("moved"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = HeaderFetcher::new(Duration::from_secs(5), fast_policy(0)).unwrap();
        let hop = fetcher
            .fetch(&format!("{}/old", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(
            hop,
            HopResult::new(301, Some("https://a.example/new".to_string()))
        );
    }

    #[tokio::test]
    async fn test_reqwest_transport_treats_empty_location_as_absent() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/blank"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", ""))
            .mount(&mock_server)
            .await;

        let fetcher = HeaderFetcher::new(Duration::from_secs(5), fast_policy(0)).unwrap();
        let hop = fetcher
            .fetch(&format!("{}/blank", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(hop, HopResult::new(302, None));
    }

    #[tokio::test]
    async fn test_reqwest_transport_error_status_is_a_result_not_an_error() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = HeaderFetcher::new(Duration::from_secs(5), fast_policy(0)).unwrap();
        let hop = fetcher
            .fetch(&format!("{}/gone", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(hop.status_code, 404);
        assert!(hop.location.is_none());
    }

    #[tokio::test]
    async fn test_reqwest_transport_streams_large_body_to_completion() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/report.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x25u8; 4 * 1024 * 1024]))
            .mount(&mock_server)
            .await;

        let fetcher = HeaderFetcher::new(Duration::from_secs(10), fast_policy(0)).unwrap();
        let hop = fetcher
            .fetch(&format!("{}/report.pdf", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(hop, HopResult::new(200, None));
    }

    #[tokio::test]
    async fn test_reqwest_transport_malformed_response_is_not_retried() {
        for route in ["/docs/old", "/docs/ssl-old", "/tls/handshake-certificate"] {
            let Some((base, hits)) = spawn_garbage_server().await else {
                return;
            };
            let fetcher = HeaderFetcher::new(Duration::from_secs(5), fast_policy(2)).unwrap();

            let result = fetcher.fetch(&format!("{base}{route}")).await;

            match result {
                Err(CheckError::Network {
                    attempts, source, ..
                }) => {
                    assert_eq!(attempts, 1, "route {route}");
                    assert!(
                        matches!(source, TransportError::Http(_)),
                        "route {route}: {source:?}"
                    );
                }
                other => panic!("Expected Network error for {route}, got: {other:?}"),
            }
            assert_eq!(hits.load(Ordering::SeqCst), 1, "route {route}");
        }
    }

    #[tokio::test]
    async fn test_reqwest_transport_connection_refused_is_retried() {
        if should_skip_socket_bound_test() {
            return;
        }
        let Some(port) = closed_local_port() else {
            return;
        };

        for route in ["/docs/old", "/docs/ssl-old"] {
            let fetcher = HeaderFetcher::new(Duration::from_secs(5), fast_policy(2)).unwrap();

            let result = fetcher
                .fetch(&format!("http://127.0.0.1:{port}{route}"))
                .await;

            match result {
                Err(CheckError::Network {
                    attempts, source, ..
                }) => {
                    assert_eq!(attempts, 3, "route {route}");
                    assert!(
                        matches!(
                            source,
                            TransportError::Io {
                                kind: ErrorKind::ConnectionRefused,
                                ..
                            }
                        ),
                        "route {route}: {source:?}"
                    );
                }
                other => panic!("Expected Network error for {route}, got: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_reqwest_transport_timeout_surfaces_network_error() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let fetcher = HeaderFetcher::new(Duration::from_millis(50), fast_policy(1)).unwrap();
        let result = fetcher.fetch(&format!("{}/slow", mock_server.uri())).await;

        match result {
            Err(CheckError::Network {
                attempts, source, ..
            }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(source, TransportError::Timeout));
            }
            other => panic!("Expected Network timeout, got: {other:?}"),
        }
    }
}
