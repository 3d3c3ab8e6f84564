//! Gzip encoding and `Accept-Encoding` negotiation.

use std::io::Write;

use axum::http::{header, HeaderMap};
use flate2::{write::GzEncoder, Compression};

/// Gzip `data` at `level` (0-9, clamped).
pub fn gzip(data: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level.min(9)));
    encoder.write_all(data)?;
    encoder.finish()
}

/// Whether the client listed `gzip` (or `*`) with a non-zero quality.
pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|part| {
            let mut pieces = part.split(';');
            let coding = pieces.next().unwrap_or_default().trim();
            let quality = pieces
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (coding.eq_ignore_ascii_case("gzip") || coding == "*") && quality > 0.0
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_gzip_shrinks_and_restores() {
        let input = "{\"data\":\"".to_string() + &"x".repeat(10_000) + "\"}";
        let compressed = gzip(input.as_bytes(), 6).unwrap();
        assert!(compressed.len() < input.len());

        let mut restored = String::new();
        GzDecoder::new(&compressed[..])
            .read_to_string(&mut restored)
            .unwrap();
        assert_eq!(restored, input);
    }

    #[test]
    fn test_level_is_clamped() {
        assert!(gzip(b"hello hello hello", 42).is_ok());
    }

    #[test]
    fn test_accepts_gzip() {
        assert!(accepts_gzip(&accept("gzip")));
        assert!(accepts_gzip(&accept("br, GZIP;q=0.8")));
        assert!(accepts_gzip(&accept("*")));
        assert!(!accepts_gzip(&accept("gzip;q=0")));
        assert!(!accepts_gzip(&accept("br, deflate")));
        assert!(!accepts_gzip(&HeaderMap::new()));
    }
}
