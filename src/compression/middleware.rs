//! Response compression middleware.

use axum::{
    body::{self, Body},
    extract::{Request, State},
    http::{header, response::Parts, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::compression::gzip::{accepts_gzip, gzip};
use crate::compression::policy::{CompressionCandidate, CompressionPolicy};
use crate::error::GatewayError;
use crate::http::response::is_passthrough;
use crate::http::server::AppState;
use crate::observability::metrics;

pub const X_COMPRESSION_STATUS: HeaderName = HeaderName::from_static("x-compression-status");

pub async fn compression_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let policy = state.compression.as_ref();
    let path = request.uri().path().to_string();
    let accepts = accepts_gzip(request.headers());
    let mut response = next.run(request).await;

    // Decided without touching the body so streamed responses stay streamed.
    if !policy.enabled() || is_passthrough(&response) || policy.is_excluded(&path) {
        response.headers_mut().insert(X_COMPRESSION_STATUS, HeaderValue::from_static("excluded"));
        metrics::record_compression("excluded");
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return GatewayError::Internal(format!("failed to buffer response body: {err}"))
                .into_response()
        }
    };

    compress_buffered(policy, &path, accepts, parts, bytes)
}

fn compress_buffered(
    policy: &CompressionPolicy,
    path: &str,
    accepts_gzip: bool,
    mut parts: Parts,
    bytes: Bytes,
) -> Response {
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let candidate = CompressionCandidate {
        path,
        passthrough: false,
        body_len: bytes.len(),
        content_type,
    };

    if !policy.should_compress(&candidate) {
        parts.headers.insert(X_COMPRESSION_STATUS, HeaderValue::from_static("excluded"));
        metrics::record_compression("excluded");
        return Response::from_parts(parts, Body::from(bytes));
    }

    parts.headers.insert(X_COMPRESSION_STATUS, HeaderValue::from_static("potential"));
    if !accepts_gzip || parts.headers.contains_key(header::CONTENT_ENCODING) {
        metrics::record_compression("identity");
        return Response::from_parts(parts, Body::from(bytes));
    }

    match gzip(&bytes, policy.level()) {
        Ok(compressed) if compressed.len() < bytes.len() => {
            tracing::debug!(
                path = %path,
                original = bytes.len(),
                compressed = compressed.len(),
                "Response compressed"
            );
            parts
                .headers
                .insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            parts
                .headers
                .append(header::VARY, HeaderValue::from_static("Accept-Encoding"));
            parts
                .headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from(compressed.len()));
            metrics::record_compression("gzip");
            Response::from_parts(parts, Body::from(compressed))
        }
        Ok(_) => {
            metrics::record_compression("identity");
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "Gzip failed, sending uncompressed body");
            metrics::record_compression("identity");
            Response::from_parts(parts, Body::from(bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressionConfig;
    use axum::http::StatusCode;

    fn parts(content_type: &'static str) -> Parts {
        let (parts, _) = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    fn policy() -> CompressionPolicy {
        CompressionPolicy::from_config(&CompressionConfig::default())
    }

    #[tokio::test]
    async fn test_large_json_is_gzipped() {
        let body = Bytes::from("a".repeat(4_096));
        let response = compress_buffered(&policy(), "/api/x", true, parts("application/json"), body);

        assert_eq!(response.headers()[X_COMPRESSION_STATUS], "potential");
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
        assert_eq!(response.headers()[header::VARY], "Accept-Encoding");
        let sent = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(sent.len() < 4_096);
    }

    #[tokio::test]
    async fn test_small_body_excluded_untouched() {
        let body = Bytes::from_static(b"{\"ok\":1}");
        let response =
            compress_buffered(&policy(), "/api/x", true, parts("application/json"), body.clone());

        assert_eq!(response.headers()[X_COMPRESSION_STATUS], "excluded");
        assert!(!response.headers().contains_key(header::CONTENT_ENCODING));
        let sent = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(sent, body);
    }

    #[tokio::test]
    async fn test_client_without_gzip_gets_identity() {
        let body = Bytes::from("a".repeat(4_096));
        let response =
            compress_buffered(&policy(), "/api/x", false, parts("application/json"), body);

        assert_eq!(response.headers()[X_COMPRESSION_STATUS], "potential");
        assert!(!response.headers().contains_key(header::CONTENT_ENCODING));
    }

    #[tokio::test]
    async fn test_incompressible_body_kept() {
        // Pseudo-random bytes do not shrink under gzip.
        let mut seed: u32 = 0x9e37_79b9;
        let noise: Vec<u8> = (0..2_048)
            .map(|_| {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                seed as u8
            })
            .collect();
        let body = Bytes::from(noise);
        let response =
            compress_buffered(&policy(), "/api/x", true, parts("application/json"), body.clone());

        assert!(!response.headers().contains_key(header::CONTENT_ENCODING));
        let sent = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(sent, body);
    }
}
