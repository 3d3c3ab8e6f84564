//! Compression decision.
//!
//! A pure predicate over a finished response and the request path. It never
//! touches the body; the middleware acts on the answer.

use std::collections::HashSet;

use crate::config::CompressionConfig;

/// What the decision looks at for one response.
#[derive(Debug, Clone, Copy)]
pub struct CompressionCandidate<'a> {
    pub path: &'a str,
    /// Response was marked as streamed/passthrough by its handler.
    pub passthrough: bool,
    pub body_len: usize,
    pub content_type: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct CompressionPolicy {
    enabled: bool,
    level: u32,
    min_size: usize,
    mimetypes: HashSet<String>,
    exclude: HashSet<String>,
}

impl CompressionPolicy {
    pub fn from_config(config: &CompressionConfig) -> Self {
        Self {
            enabled: config.enabled,
            level: config.level,
            min_size: config.min_size,
            mimetypes: config
                .mimetypes
                .iter()
                .map(|m| m.trim().to_ascii_lowercase())
                .collect(),
            exclude: config.exclude.iter().map(|p| normalize(p).to_string()).collect(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.contains(normalize(path))
    }

    pub fn should_compress(&self, candidate: &CompressionCandidate<'_>) -> bool {
        if candidate.passthrough || self.is_excluded(candidate.path) {
            return false;
        }
        if candidate.body_len < self.min_size {
            return false;
        }
        candidate
            .content_type
            .map(mime_essence)
            .is_some_and(|mime| self.mimetypes.contains(&mime))
    }
}

fn normalize(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// `text/html; charset=utf-8` → `text/html`.
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
