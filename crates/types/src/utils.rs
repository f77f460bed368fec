//! Utility functions and helpers

use crate::Provider;

/// Make sure a maintenance page slug is an absolute path
pub fn normalize_slug(slug: &str) -> String {
    let slug = slug.trim();
    if slug.starts_with('/') {
        slug.to_string()
    } else {
        format!("/{}", slug)
    }
}

/// Composite cache key for a flag lookup
pub fn cache_key(provider: Provider, connection_string: &str, key: &str) -> String {
    format!("{}-{}-{}", provider, connection_string, key)
}

/// Validate HTTP(S) URL format
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
