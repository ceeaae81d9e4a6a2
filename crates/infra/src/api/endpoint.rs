//! URL resolution against the configured API base

use tracing::trace;
use url::Url;

/// Join `path` onto `base`. Absolute `http(s)://` paths pass through.
pub fn resolve_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    let base = base.trim_end_matches('/');
    if path.is_empty() {
        return base.to_string();
    }

    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Rewrite `http://` to `https://`, leaving host, path and query intact.
///
/// URLs that fail to parse are returned unchanged.
pub fn upgrade_insecure(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    if parsed.scheme() != "http" || parsed.set_scheme("https").is_err() {
        return url.to_string();
    }

    trace!(from = %url, to = %parsed, "Upgraded insecure request URL");
    parsed.to_string()
}
