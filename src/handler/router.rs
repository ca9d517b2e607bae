//! Request middleware chain
//!
//! Entry point for HTTP request processing: access log, CORS, body-size
//! limit and body decoding wrap every route, in that order.

use crate::api::{self, ApiError, ErrorKind, STATUS_BODY_FAILED};
use crate::config::AppState;
use crate::handler::body;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{
    HeaderName, HeaderValue, ACCESS_CONTROL_REQUEST_HEADERS, CONTENT_LENGTH, CONTENT_TYPE, REFERER,
    SERVER, USER_AGENT,
};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let is_head = req.method() == Method::HEAD;
    let entry = state
        .access_log
        .then(|| access_entry(&req, remote_addr));

    let mut response = dispatch(req, &state).await;

    // CORS
    if state.config.http.enable_cors {
        http::apply_cors(&mut response);
    }
    if let Ok(server_name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server_name);
    }

    let body_bytes = response.body().size_hint().exact().unwrap_or(0);
    if is_head {
        let (mut parts, _) = response.into_parts();
        parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(body_bytes));
        response = Response::from_parts(parts, Full::new(Bytes::new()));
    }

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(body_bytes).unwrap_or(usize::MAX);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Preflight, body limit, body decoding, then the route itself
async fn dispatch<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let max_body_size = state.config.http.max_body_size;

    // 1. CORS preflight
    if req.method() == Method::OPTIONS {
        return http::build_options_response(
            state.config.http.enable_cors,
            req.headers().get(ACCESS_CONTROL_REQUEST_HEADERS),
        );
    }

    // 2. Check declared body size
    if let Some(resp) = check_body_size(&req, max_body_size) {
        return resp;
    }

    // 3. Decode body
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<http_body_util::LengthLimitError>().is_some() => {
            logger::log_warning(&format!(
                "Request body exceeded {max_body_size} bytes: {method} {path}"
            ));
            return http::build_413_response(max_body_size);
        }
        Err(e) => {
            let error = ApiError::new(
                ErrorKind::Unknown,
                body::BodyError::Read(e.to_string()).to_string(),
            );
            return api::error_response(state, method.as_str(), &path, error, STATUS_BODY_FAILED);
        }
    };

    let fields = match body::decode(content_type.as_deref(), &bytes) {
        Ok(fields) => fields,
        Err(e) => {
            let error = ApiError::invalid_input(e.to_string());
            return api::error_response(state, method.as_str(), &path, error, STATUS_BODY_FAILED);
        }
    };

    // 4. Route
    match api::route(&method, &path, &fields, state).await {
        Ok(resp) => resp,
        Err(never) => match never {},
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response(max_body_size))
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Capture request-side access log fields before the body is consumed
fn access_entry<B>(req: &Request<B>, remote_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = http_version(req.version()).to_string();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}

fn http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::store::{MemoryStore, UnavailableStore};
    use hyper::StatusCode;
    use serde_json::Value;

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(test_config(), Arc::new(MemoryStore::new())))
    }

    fn request(method: Method, uri: &str, content_type: Option<&str>, body: &str) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> (StatusCode, hyper::HeaderMap, Bytes) {
        let resp = handle_request(req, Arc::clone(state), peer()).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, headers, bytes)
    }

    fn json(bytes: &Bytes) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_json_save_scenario() {
        let state = state();
        let (status, headers, bytes) = send(
            &state,
            request(
                Method::POST,
                "/messages/save",
                Some("application/json"),
                r#"{"name":"Ana","message":"Hi"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["access-control-allow-origin"], "*");
        let saved = json(&bytes);
        let id = saved["message"]["_id"].as_str().unwrap().to_string();

        let (status, _, bytes) = send(
            &state,
            request(Method::GET, &format!("/messages/{id}"), None, ""),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = json(&bytes);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["name"], "Ana");
        assert_eq!(messages[0]["message"], "Hi");
        assert_eq!(messages[0]["createdAt"], saved["message"]["createdAt"]);
    }

    #[tokio::test]
    async fn test_form_encoded_save() {
        let state = state();
        let (status, _, bytes) = send(
            &state,
            request(
                Method::POST,
                "/messages/save",
                Some("application/x-www-form-urlencoded"),
                "name=Ana&message=Hello+there",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = json(&bytes);
        assert_eq!(body["message"]["name"], "Ana");
        assert_eq!(body["message"]["message"], "Hello there");
    }

    #[tokio::test]
    async fn test_malformed_json_body() {
        let state = state();
        let (status, _, bytes) = send(
            &state,
            request(Method::POST, "/messages/save", Some("application/json"), "{\"name\":"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&bytes)["status"], STATUS_BODY_FAILED);
    }

    #[tokio::test]
    async fn test_declared_body_too_large() {
        let mut cfg = test_config();
        cfg.http.max_body_size = 16;
        let state = Arc::new(AppState::new(cfg, Arc::new(MemoryStore::new())));

        let body = r#"{"name":"Ana","message":"a longer message"}"#;
        let req = Request::builder()
            .method(Method::POST)
            .uri("/messages/save")
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .body(Full::new(Bytes::from(body)))
            .unwrap();
        let (status, _, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_streamed_body_too_large() {
        let mut cfg = test_config();
        cfg.http.max_body_size = 16;
        let state = Arc::new(AppState::new(cfg, Arc::new(MemoryStore::new())));

        let (status, _, _) = send(
            &state,
            request(
                Method::POST,
                "/messages/save",
                Some("application/json"),
                r#"{"name":"Ana","message":"a longer message"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_preflight() {
        let state = state();
        let (status, headers, bytes) =
            send(&state, request(Method::OPTIONS, "/messages/save", None, "")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert!(headers.contains_key("access-control-allow-methods"));
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_preflight_allows_requested_headers() {
        let state = state();
        let mut req = request(Method::OPTIONS, "/messages/save", None, "");
        req.headers_mut().insert(
            ACCESS_CONTROL_REQUEST_HEADERS,
            HeaderValue::from_static("authorization,content-type"),
        );
        let (status, headers, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(
            headers["access-control-allow-headers"],
            "authorization,content-type"
        );
    }

    #[tokio::test]
    async fn test_cors_disabled() {
        let mut cfg = test_config();
        cfg.http.enable_cors = false;
        let state = Arc::new(AppState::new(cfg, Arc::new(MemoryStore::new())));
        let (_, headers, _) = send(&state, request(Method::GET, "/about", None, "")).await;
        assert!(!headers.contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let state = state();
        let (status, headers, bytes) = send(&state, request(Method::HEAD, "/about", None, "")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(bytes.is_empty());
        assert_ne!(headers[CONTENT_LENGTH], "0");
    }

    #[tokio::test]
    async fn test_fail_open_storage() {
        let state = Arc::new(AppState::new(
            test_config(),
            Arc::new(UnavailableStore::new("connection refused")),
        ));

        let (status, _, _) = send(&state, request(Method::GET, "/about", None, "")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, bytes) = send(&state, request(Method::GET, "/messages", None, "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&bytes)["status"], api::STATUS_RETRIEVE_FAILED);
    }

    #[test]
    fn test_access_entry_fields() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/messages?limit=5")
            .header(USER_AGENT, "curl/8.0")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let entry = access_entry(&req, peer());
        assert_eq!(entry.remote_addr, "127.0.0.1");
        assert_eq!(entry.path, "/messages");
        assert_eq!(entry.query.as_deref(), Some("limit=5"));
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(entry.referer, None);
    }
}
