//! The threaded request/response loop: bind, accept, and forward.
//!
//! One worker thread per inbound request (mirroring the original source's
//! `ThreadingHTTPServer`) keeps a single slow SSE client from blocking any
//! other connection. `tiny_http` writes each `Read` call's bytes straight
//! to the socket without its own buffering layer, so choosing a 16 KiB vs
//! 64 KiB chunk size on the upstream read is what gives SSE responses
//! their "flush per chunk" behavior — there is no separate flush call to
//! make.

use std::io::Read;
use std::net::ToSocketAddrs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tiny_http::{Header, Method as TinyMethod, Request, Response, Server, StatusCode};
use url::Url;

use crate::config::{ProxyConfig, MAX_CONTENT_LENGTH};
use crate::error::{ProxyError, ProxyResult};
use crate::headers::is_hop_by_hop;

const SSE_CHUNK: usize = 16 * 1024;
const DEFAULT_CHUNK: usize = 64 * 1024;

/// Bind `config.listen` and serve requests until a SIGINT/SIGTERM is
/// received, forwarding everything but `/health` to `config.target`.
///
/// # Errors
///
/// Returns [`ProxyError::BindFailure`] if the listen address cannot be
/// bound, or [`ProxyError::OutboundProxyRequired`] if `BROKER_REQUIRE_PROXY`
/// is set but no outbound proxy environment variable is present.
pub fn run(config: ProxyConfig) -> ProxyResult<()> {
    if broker_core::tunables::require_outbound_proxy() && !outbound_proxy_configured() {
        return Err(ProxyError::OutboundProxyRequired);
    }

    let addr = config
        .listen
        .to_socket_addrs()
        .map_err(|e| ProxyError::BindFailure {
            addr: config.listen.clone(),
            reason: e.to_string(),
        })?
        .next()
        .ok_or_else(|| ProxyError::BindFailure {
            addr: config.listen.clone(),
            reason: "listen address resolved to no socket addresses".to_string(),
        })?;

    let server = Server::http(addr).map_err(|e| ProxyError::BindFailure {
        addr: config.listen.clone(),
        reason: e.to_string(),
    })?;

    let client = reqwest::blocking::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| ProxyError::BindFailure {
            addr: config.listen.clone(),
            reason: e.to_string(),
        })?;

    let config = Arc::new(config);
    let client = Arc::new(client);
    let shutdown = Arc::new(AtomicBool::new(false));

    {
        let shutdown = Arc::clone(&shutdown);
        if let Err(err) = ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
        }) {
            tracing::warn!(error = %err, "failed to install SIGINT/SIGTERM handler, shutdown will be abrupt");
        }
    }

    tracing::info!(name = %config.name, listen = %config.listen, target = %config.target, "proxy listening");

    let mut workers = Vec::new();
    while !shutdown.load(Ordering::SeqCst) {
        match server.recv_timeout(Duration::from_millis(200)) {
            Ok(Some(request)) => {
                let config = Arc::clone(&config);
                let client = Arc::clone(&client);
                workers.push(std::thread::spawn(move || handle_request(&config, &client, request)));
            }
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(error = %err, "error accepting connection");
            }
        }
        workers.retain(|h| !h.is_finished());
    }

    for worker in workers {
        let _ = worker.join();
    }
    Ok(())
}

fn outbound_proxy_configured() -> bool {
    ["HTTPS_PROXY", "https_proxy", "HTTP_PROXY", "http_proxy"]
        .iter()
        .any(|var| std::env::var(var).is_ok())
}

/// Merge an inbound request path onto `target`, then force `scheme` and
/// host/port back to `target`'s so a path like `/../evil.example/x` can
/// never redirect the upstream connection.
fn merge_url(target: &Url, raw_path: &str) -> Option<Url> {
    let stripped = raw_path.trim_start_matches('/');
    let mut merged = target.join(stripped).ok()?;
    merged.set_scheme(target.scheme()).ok()?;
    merged.set_host(target.host_str()).ok()?;
    merged.set_port(target.port()).ok()?;
    Some(merged)
}

fn same_destination(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}

fn health_response(name: &str) -> Response<std::io::Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "status": "ok", "name": name }).to_string();
    Response::from_string(body).with_header(content_type_header("application/json"))
}

fn content_type_header(value: &str) -> Header {
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes())
        .expect("static header name/value is always valid")
}

fn forward_headers(request: &Request, config: &ProxyConfig) -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    for header in request.headers() {
        let name = header.field.as_str().as_str();
        if is_hop_by_hop(name) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            reqwest::header::HeaderName::from_bytes(name.as_bytes()),
            reqwest::header::HeaderValue::from_str(header.value.as_str()),
        ) {
            headers.append(name, value);
        }
    }

    headers.insert(
        "X-CA-Helper",
        reqwest::header::HeaderValue::from_str(&config.name).unwrap_or_else(|_| reqwest::header::HeaderValue::from_static("")),
    );
    if let Ok(agent) = std::env::var("CONTAINAI_AGENT_ID") {
        if let Ok(value) = reqwest::header::HeaderValue::from_str(&agent) {
            headers.insert("X-CA-Agent", value);
        }
    }
    if let Ok(session) = std::env::var("CONTAINAI_SESSION_ID") {
        if let Ok(value) = reqwest::header::HeaderValue::from_str(&session) {
            headers.insert("X-CA-Session", value);
        }
    }
    if let Some(bearer) = &config.bearer {
        if !headers.contains_key(reqwest::header::AUTHORIZATION) {
            if let Ok(value) = reqwest::header::HeaderValue::from_str(&format!("Bearer {bearer}")) {
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
        }
    }
    headers
}

fn to_reqwest_method(method: &TinyMethod) -> Option<reqwest::Method> {
    reqwest::Method::from_bytes(method.as_str().as_bytes()).ok()
}

fn respond_error(request: Request, status: u16) {
    let response = Response::empty(StatusCode(status));
    if let Err(err) = request.respond(response) {
        tracing::warn!(error = %err, status, "failed to write error response");
    }
}

fn handle_request(config: &ProxyConfig, client: &reqwest::blocking::Client, mut request: Request) {
    if request.url() == "/health" && *request.method() == TinyMethod::Get {
        if let Err(err) = request.respond(health_response(&config.name)) {
            tracing::warn!(error = %err, "failed to write health response");
        }
        return;
    }

    let Some(target_url) = merge_url(&config.target, request.url()) else {
        return respond_error(request, 502);
    };
    if !same_destination(&target_url, &config.target) {
        tracing::warn!(path = %request.url(), "rejected request outside the target allowlist");
        return respond_error(request, 403);
    }

    if let Some(len) = request.body_length() {
        if len as u64 > MAX_CONTENT_LENGTH {
            return respond_error(request, 413);
        }
    }

    let Some(method) = to_reqwest_method(request.method()) else {
        return respond_error(request, 502);
    };

    let mut body = Vec::new();
    if let Err(err) = request.as_reader().read_to_end(&mut body) {
        tracing::warn!(error = %err, "failed to read request body");
        return respond_error(request, 502);
    }

    let headers = forward_headers(&request, config);
    let upstream = client
        .request(method, target_url)
        .headers(headers)
        .body(body)
        .send();

    match upstream {
        Ok(upstream) => forward_response(request, upstream),
        Err(err) if err.is_timeout() => respond_error(request, 504),
        Err(err) if err.status().is_some() => {
            let status = err.status().map(|s| s.as_u16()).unwrap_or(502);
            respond_error(request, status);
        }
        Err(err) => {
            tracing::warn!(error = %err, "upstream request failed");
            respond_error(request, 502);
        }
    }
}

fn forward_response(request: Request, mut upstream: reqwest::blocking::Response) {
    let status = upstream.status().as_u16();
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    let is_sse = content_type.contains("text/event-stream");
    let chunk_size = if is_sse { SSE_CHUNK } else { DEFAULT_CHUNK };

    let mut headers = Vec::new();
    for (name, value) in upstream.headers() {
        if is_hop_by_hop(name.as_str()) {
            continue;
        }
        if let Ok(value) = value.to_str() {
            if let Ok(header) = Header::from_bytes(name.as_str().as_bytes(), value.as_bytes()) {
                headers.push(header);
            }
        }
    }

    let reader = ChunkedReader {
        inner: &mut upstream,
        chunk_size,
    };
    let response = Response::new(StatusCode(status), headers, reader, None, None);
    if let Err(err) = request.respond(response) {
        tracing::warn!(error = %err, "failed to stream upstream response");
    }
}

/// Caps each `read` call at `chunk_size` bytes so the number of bytes
/// handed to `tiny_http` (and therefore written to the socket) per call
/// matches the SSE-vs-bulk sizing the protocol specifies.
struct ChunkedReader<'a> {
    inner: &'a mut reqwest::blocking::Response,
    chunk_size: usize,
}

impl Read for ChunkedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let cap = buf.len().min(self.chunk_size);
        self.inner.read(&mut buf[..cap])
    }
}
