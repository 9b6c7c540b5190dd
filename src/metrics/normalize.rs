/// Canonical lookup key for a URL: trailing slashes are dropped so that
/// `https://a.com` and `https://a.com/` address the same visits. A URL made
/// only of slashes collapses to `/`.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
