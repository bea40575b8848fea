//! URL utilities for consistent URL handling
//!
//! The backend is mounted under a configurable base URL (for example
//! `https://chat.example.com/api/v1`). These helpers join that base with
//! resource paths without producing double slashes.

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use chatdeck::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.example.com/v1"), "https://api.example.com/v1");
/// assert_eq!(normalize_base_url("https://api.example.com/v1/"), "https://api.example.com/v1");
/// assert_eq!(normalize_base_url("https://api.example.com/v1///"), "https://api.example.com/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Construct a complete API endpoint URL from a base URL and endpoint path
///
/// The endpoint keeps any trailing slash it was given; collection routes on
/// the backend are declared with one (`/llm-configs/`).
///
/// # Examples
///
/// ```
/// use chatdeck::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.example.com/v1", "chat/"),
///     "https://api.example.com/v1/chat/"
/// );
/// assert_eq!(
///     construct_api_url("https://api.example.com/v1/", "/models/"),
///     "https://api.example.com/v1/models/"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}
