//! URL utilities for consistent endpoint construction.

/// Normalize a base URL by removing trailing slashes.
///
/// # Examples
///
/// ```
/// use bodhi::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.example.com/models"), "https://api.example.com/models");
/// assert_eq!(normalize_base_url("https://api.example.com/models/"), "https://api.example.com/models");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path without producing double slashes.
///
/// # Examples
///
/// ```
/// use bodhi::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.example.com/models/", "chat/completions"),
///     "https://api.example.com/models/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_any_number_of_trailing_slashes() {
        assert_eq!(normalize_base_url("https://a/b"), "https://a/b");
        assert_eq!(normalize_base_url("https://a/b/"), "https://a/b");
        assert_eq!(normalize_base_url("https://a/b///"), "https://a/b");
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn construct_handles_slash_combinations() {
        assert_eq!(
            construct_api_url("https://a/b", "chat/completions"),
            "https://a/b/chat/completions"
        );
        assert_eq!(
            construct_api_url("https://a/b/", "/chat/completions"),
            "https://a/b/chat/completions"
        );
    }
}
