//! Shared helpers for credentials and endpoint URLs

use crate::config::ConfigError;

/// Reject values that cannot travel in an HTTP header
pub fn sanitize_for_header(value: &str) -> Result<&str, String> {
    if value.is_empty() {
        return Err("value is empty".to_string());
    }
    match value
        .char_indices()
        .find(|(_, ch)| ch.is_control() || *ch == '\u{7f}')
    {
        Some((index, ch)) => Err(format!(
            "contains a control character at position {} ({:#04x})",
            index, ch as u32
        )),
        None => Ok(value),
    }
}

/// Trim an API key and make sure it parses as a header value
pub fn validate_api_key(api_key: &str) -> Result<String, ConfigError> {
    let trimmed = api_key.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Err(ConfigError::InvalidApiKey("key is empty or 'none'".to_string()));
    }

    sanitize_for_header(trimmed).map_err(ConfigError::InvalidApiKey)?;
    trimmed
        .parse::<reqwest::header::HeaderValue>()
        .map_err(|e| ConfigError::InvalidApiKey(format!("{} ({} chars)", e, trimmed.len())))?;

    Ok(trimmed.to_string())
}

/// Check an http(s) base URL and strip trailing slashes
pub fn sanitize_base_url(url: &str, field: &'static str) -> Result<String, ConfigError> {
    let trimmed = url.trim();
    let invalid = |reason: &str| ConfigError::InvalidUrl {
        field,
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }
    // encoded separators usually mean the value was encoded twice
    if ["%2F", "%3D", "%20"].iter().any(|enc| trimmed.contains(enc)) {
        return Err(invalid("contains URL-encoded characters"));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(invalid("must start with http:// or https://"));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_for_header() {
        assert!(sanitize_for_header("AIzaSy-abc_123").is_ok());
        assert!(sanitize_for_header("abc\n123").is_err());
        assert!(sanitize_for_header("abc\x00123").is_err());
        assert!(sanitize_for_header("abc\x7f123").is_err());
        assert!(sanitize_for_header("").is_err());
    }

    #[test]
    fn test_validate_api_key() {
        assert_eq!(validate_api_key("  key-123 ").unwrap(), "key-123");
        assert!(validate_api_key("").is_err());
        assert!(validate_api_key("NONE").is_err());
        assert!(validate_api_key(" \n ").is_err());
        assert!(validate_api_key("ab\tcd").is_err());
    }

    #[test]
    fn test_sanitize_base_url() {
        assert_eq!(
            sanitize_base_url("https://generativelanguage.googleapis.com/", "base_url").unwrap(),
            "https://generativelanguage.googleapis.com"
        );
        assert!(sanitize_base_url("http://127.0.0.1:3000/api/chat", "endpoint_url").is_ok());
        assert!(sanitize_base_url("", "base_url").is_err());
        assert!(sanitize_base_url("localhost:3000", "base_url").is_err());
        assert!(sanitize_base_url("https://example%2Fcom", "base_url").is_err());
    }
}
