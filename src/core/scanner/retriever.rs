// src/core/scanner/retriever.rs

use crate::config::ScannerConfig;
use crate::core::models::{AUTO, HTTP, HTTPS, HttpResponse, ResponseBundle, ScanOptions};
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, LOCATION, SET_COOKIE};
use reqwest::{Client, redirect};
use std::collections::BTreeMap;
use std::error::Error as _;
use std::io;
use std::net::IpAddr;
use tracing::{debug, error, info, warn};
use url::Url;

/// Whether `hostname` points back at this machine.
pub fn is_local_target(hostname: &str) -> bool {
    let host = hostname.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") || host.to_ascii_lowercase().ends_with(".localhost") {
        return true;
    }
    host.parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback() || ip.is_unspecified())
}

/// `scheme://hostname:port` with `path` set on it. `path` never picks the
/// host: leading slashes collapse to one, and a fragment is dropped.
fn target_url(scheme: &str, hostname: &str, port: u16, path: &str) -> Option<Url> {
    let mut url = Url::parse(&format!("{scheme}://{hostname}/")).ok()?;
    url.set_port(Some(port)).ok()?;
    let host = url.host_str()?.to_string();

    let path = path.split('#').next().unwrap_or_default();
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };
    url.set_path(&format!("/{}", path.trim_start_matches(['/', '\\'])));
    url.set_query(query);

    if url.host_str() != Some(host.as_str()) || url.port_or_known_default() != Some(port) {
        warn!(hostname, port, url = %url, "Target URL does not point at the requested host.");
        return None;
    }
    Some(url)
}

/// Headers every request carries: the caller's own, plus their cookies.
fn request_headers(options: &ScanOptions) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in &options.headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping header that is not valid HTTP."),
        }
    }

    if !options.cookies.is_empty() {
        let jar = options
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        match HeaderValue::from_str(&jar) {
            Ok(value) => {
                headers.insert(COOKIE, value);
            }
            Err(e) => warn!(error = %e, "Skipping cookies that do not form a valid header."),
        }
    }
    headers
}

fn build_client(options: &ScanOptions, config: &ScannerConfig, verify: bool) -> reqwest::Result<Client> {
    Client::builder()
        .use_rustls_tls()
        .user_agent(config.user_agent.as_str())
        .default_headers(request_headers(options))
        .timeout(config.timeout)
        .redirect(redirect::Policy::none())
        .danger_accept_invalid_certs(!verify)
        .build()
}

/// Reads at most `max_bytes` of the body, chunk by chunk.
async fn read_capped(mut response: reqwest::Response, max_bytes: usize) -> reqwest::Result<Vec<u8>> {
    let mut body = Vec::new();
    while body.len() < max_bytes {
        let Some(chunk) = response.chunk().await? else {
            break;
        };
        let room = max_bytes - body.len();
        body.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }
    Ok(body)
}

async fn snapshot(
    response: reqwest::Response,
    history: Vec<String>,
    verified: bool,
    max_body_bytes: usize,
) -> HttpResponse {
    let url = response.url().to_string();
    let status = response.status().as_u16();

    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    let mut set_cookies = Vec::new();
    for (name, value) in response.headers() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        if name == SET_COOKIE {
            set_cookies.push(value.clone());
        }
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    let body = match read_capped(response, max_body_bytes).await {
        Ok(bytes) => {
            debug!(url = %url, bytes = bytes.len(), "Read response body.");
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Failed to read response body.");
            None
        }
    };

    HttpResponse {
        url,
        status,
        headers,
        set_cookies,
        history,
        body,
        verified,
    }
}

/// GETs `start`, following redirects by hand so the chain can be recorded.
async fn follow(
    client: &Client,
    start: &Url,
    verified: bool,
    config: &ScannerConfig,
) -> reqwest::Result<HttpResponse> {
    let mut history = Vec::new();
    let mut current = start.clone();

    loop {
        let response = client.get(current.clone()).send().await?;
        let next = response
            .headers()
            .get(LOCATION)
            .and_then(|location| location.to_str().ok())
            .and_then(|location| current.join(location).ok());

        match next {
            Some(next) if response.status().is_redirection() && history.len() < config.max_redirects => {
                debug!(from = %current, to = %next, "Following redirect.");
                history.push(current.to_string());
                current = next;
            }
            _ => return Ok(snapshot(response, history, verified, config.max_body_bytes).await),
        }
    }
}

/// Whether `error` came out of the TLS handshake rather than from reaching
/// the host. rustls failures surface as `InvalidData` I/O errors.
fn is_tls_failure(error: &reqwest::Error) -> bool {
    if error.is_timeout() {
        return false;
    }
    let mut source = error.source();
    while let Some(inner) = source {
        if let Some(io_error) = inner.downcast_ref::<io::Error>() {
            return io_error.kind() == io::ErrorKind::InvalidData;
        }
        source = inner.source();
    }
    false
}

/// One retrieval strategy. A chain that fails in the TLS handshake is retried
/// without verification, and the response is marked unverified.
async fn fetch(strategy: &str, url: Option<Url>, clients: &(Client, Client), config: &ScannerConfig) -> Option<HttpResponse> {
    let url = url?;
    let (verifying, lenient) = clients;

    let first = match follow(verifying, &url, true, config).await {
        Ok(response) => {
            info!(strategy, url = %url, status = response.status, "Retrieved response.");
            return Some(response);
        }
        Err(e) => e,
    };
    if !is_tls_failure(&first) {
        error!(strategy, url = %url, error = %first, "HTTP request failed.");
        return None;
    }

    match follow(lenient, &url, false, config).await {
        Ok(response) => {
            warn!(strategy, url = %url, error = %first, "Retrieved response only without certificate verification.");
            Some(response)
        }
        Err(e) => {
            error!(strategy, url = %url, error = %e, "HTTP request failed.");
            None
        }
    }
}

/// Fetches every retrieval strategy for `hostname`.
///
/// Never fails: anything that goes wrong on the network shows up as a missing
/// entry, and a missing `auto` entry means the host is down.
pub async fn retrieve_all(hostname: &str, options: &ScanOptions, config: &ScannerConfig) -> ResponseBundle {
    info!(hostname, "Starting retrieval.");

    if !config.allow_localhost && is_local_target(hostname) {
        warn!(hostname, "Refusing to scan a local target.");
        return ResponseBundle::unreachable();
    }

    let clients = match (build_client(options, config, true), build_client(options, config, false)) {
        (Ok(verifying), Ok(lenient)) => (verifying, lenient),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "Failed to build HTTP client.");
            return ResponseBundle::unreachable();
        }
    };

    let http_url = target_url("http", hostname, options.http_port, &options.path);
    let https_url = target_url("https", hostname, options.https_port, &options.path);
    if http_url.is_none() && https_url.is_none() {
        error!(hostname, path = %options.path, "Could not build a URL for the target.");
        return ResponseBundle::unreachable();
    }

    let (http, https) = tokio::join!(
        fetch(HTTP, http_url, &clients, config),
        fetch(HTTPS, https_url, &clients, config)
    );
    let auto = https.clone().or_else(|| http.clone());
    info!(hostname, reachable = auto.is_some(), "Retrieval finished.");

    ResponseBundle::from_pairs([(AUTO, auto), (HTTP, http), (HTTPS, https)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_targets() {
        for host in ["localhost", "LOCALHOST", "app.localhost", "127.0.0.1", "127.1.2.3", "::1", "[::1]", "0.0.0.0"] {
            assert!(is_local_target(host), "{host}");
        }
        for host in ["example.com", "10.0.0.1", "localhost.example.com"] {
            assert!(!is_local_target(host), "{host}");
        }
    }

    #[test]
    fn urls_honour_ports_and_paths() {
        let url = target_url("https", "example.com", 8443, "/admin?x=1").unwrap();
        assert_eq!(url.as_str(), "https://example.com:8443/admin?x=1");

        let default_port = target_url("http", "example.com", 80, "/").unwrap();
        assert_eq!(default_port.as_str(), "http://example.com/");

        assert!(target_url("http", "bad host", 80, "/").is_none());
    }

    #[test]
    fn paths_never_change_the_host() {
        let cases = [
            ("//evil.test/x", "http://example.com:8080/evil.test/x"),
            ("///evil.test", "http://example.com:8080/evil.test"),
            ("\\\\evil.test/", "http://example.com:8080/evil.test/"),
            ("admin", "http://example.com:8080/admin"),
            ("", "http://example.com:8080/"),
            ("/a/b?x=1#top", "http://example.com:8080/a/b?x=1"),
            ("/#only-fragment", "http://example.com:8080/"),
            ("http://evil.test/", "http://example.com:8080/http://evil.test/"),
        ];
        for (path, expected) in cases {
            let url = target_url("http", "example.com", 8080, path).unwrap();
            assert_eq!(url.as_str(), expected, "path {path:?}");
            assert_eq!(url.host_str(), Some("example.com"), "path {path:?}");
            assert_eq!(url.port_or_known_default(), Some(8080), "path {path:?}");
        }
    }

    fn test_client() -> Client {
        build_client(&ScanOptions::default(), &ScannerConfig::default(), true).unwrap()
    }

    #[tokio::test]
    async fn refused_connections_are_not_tls_failures() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = test_client().get(format!("https://127.0.0.1:{port}/")).send().await.unwrap_err();
        assert!(!is_tls_failure(&err), "{err:?}");
    }

    #[tokio::test]
    async fn garbage_handshakes_are_tls_failures() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let _ = socket.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n").await;
                let _ = socket.shutdown().await;
            }
        });

        let err = test_client().get(format!("https://127.0.0.1:{port}/")).send().await.unwrap_err();
        assert!(is_tls_failure(&err), "{err:?}");
    }

    #[test]
    fn cookies_and_headers_are_sent_verbatim() {
        let mut options = ScanOptions::default();
        options.cookies.insert("session".into(), "abc".into());
        options.cookies.insert("theme".into(), "dark".into());
        options.headers.insert("X-Scan".into(), "yes".into());
        options.headers.insert("bad header".into(), "ignored".into());

        let headers = request_headers(&options);
        assert_eq!(headers.get(COOKIE).unwrap(), "session=abc; theme=dark");
        assert_eq!(headers.get("x-scan").unwrap(), "yes");
        assert_eq!(headers.len(), 2);
    }

    #[tokio::test]
    async fn local_targets_are_refused_by_default() {
        let bundle = retrieve_all("localhost", &ScanOptions::default(), &ScannerConfig::default()).await;
        assert!(!bundle.is_reachable());
        assert!(bundle.responses.is_empty());
    }
}
