//! HTTP response building module
//!
//! Provides builders for the JSON and protocol-level responses the server emits.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Methods answered in CORS preflight responses
pub const CORS_ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Endpoints listed in the 404 body
pub const AVAILABLE_ENDPOINTS: [&str; 4] = [
    "GET /about",
    "GET /messages",
    "GET /messages/:messageId",
    "POST /messages/save",
];

/// Build JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from_static(
                    br#"{"error":"Internal server error"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error"))));
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// Build 404 Not Found response
pub fn build_404_response(method: &str, path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "status": format!("cannot {method} {path}"),
        "available_endpoints": AVAILABLE_ENDPOINTS,
    });
    json_response(StatusCode::NOT_FOUND, &body)
}

/// Build 413 Payload Too Large response
pub fn build_413_response(max_body_size: u64) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": format!("request entity too large (limit: {max_body_size} bytes)"),
        "status": "failed to parse the request body",
    });
    json_response(StatusCode::PAYLOAD_TOO_LARGE, &body)
}

/// Build OPTIONS response (preflight request)
///
/// `request_headers` is the client's `Access-Control-Request-Headers`; it is
/// echoed back as the allowed header list, falling back to `Content-Type`.
pub fn build_options_response(
    enable_cors: bool,
    request_headers: Option<&HeaderValue>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", CORS_ALLOWED_METHODS)
        .header("Content-Length", 0);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Methods", CORS_ALLOWED_METHODS)
            .header(
                ACCESS_CONTROL_ALLOW_HEADERS,
                request_headers
                    .cloned()
                    .unwrap_or_else(|| HeaderValue::from_static("Content-Type")),
            )
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Allow any origin on a finished response
pub fn apply_cors(response: &mut Response<Full<Bytes>>) {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
