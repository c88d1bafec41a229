//! Message validation and sanitization
//!
//! Heuristic first-line filter for visitor input. This is not a security
//! boundary: whatever renders a message later is responsible for escaping it.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Maximum message length in characters
pub const MAX_MESSAGE_CHARS: usize = 500;
/// Minimum trimmed message length in characters
pub const MIN_MESSAGE_CHARS: usize = 2;

const MAX_SPECIAL_CHAR_RATIO: f64 = 0.3;
const MAX_REPEATED_RUN: usize = 10;

/// Sentence punctuation that does not count towards the special character ratio
const PLAIN_PUNCTUATION: &[char] = &['.', ',', '!', '?', '\'', '"'];

lazy_static! {
    static ref UNSAFE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)<\s*/?\s*(script|iframe|object|embed)\b").unwrap(),
        Regex::new(r"(?i)\bon[a-z]+\s*=").unwrap(),
        Regex::new(r"(?i)(javascript|vbscript|data)\s*:").unwrap(),
        Regex::new(r"(?i)expression\s*\(").unwrap(),
        Regex::new(r"(?i)@import").unwrap(),
        Regex::new(r"(?i)\b(binding|behavior)\s*:").unwrap(),
    ];

    static ref SQL_PATTERNS: Vec<Regex> = vec![
        Regex::new(
            r"(?is)\b(union|select|insert|update|delete|drop|create|alter|exec|execute)\b.*(--|/\*|;)"
        )
        .unwrap(),
        Regex::new(
            r"(?is)(--|/\*|;).*\b(union|select|insert|update|delete|drop|create|alter|exec|execute)\b"
        )
        .unwrap(),
        Regex::new(r"(?i)\b(or|and)\s+(\d+\s*=\s*\d+|'[^']*'\s*=\s*'[^']*')").unwrap(),
    ];

    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref ANGLE_BRACKET: Regex = Regex::new(r"[<>]").unwrap();
    static ref DANGEROUS_SCHEME: Regex =
        Regex::new(r"(?i)(javascript|vbscript|data)\s*:").unwrap();
    static ref EVENT_HANDLER: Regex = Regex::new(r"(?i)\bon[a-z]+\s*=").unwrap();
    static ref CSS_INJECTION: Regex =
        Regex::new(r"(?i)(expression\s*\(|@import|\b(binding|behavior)\s*:)").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message is required and must be a string.")]
    NotText,

    #[error("Please enter a message.")]
    Empty,

    #[error("Message is too short. Please enter at least 2 characters.")]
    TooShort,

    #[error("Message is too long. Please keep it under 500 characters.")]
    TooLong,

    #[error("Message contains content that isn't allowed.")]
    UnsafeContent,

    #[error("Message contains suspicious patterns. Please rephrase your question.")]
    SuspiciousQuery,

    #[error("Message contains too many special characters.")]
    TooManySpecialCharacters,

    #[error("Message contains too many repeated characters.")]
    RepeatedCharacters,
}

/// Validate a raw message and return its sanitized form
pub fn validate(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let length = trimmed.chars().count();
    if length < MIN_MESSAGE_CHARS {
        return Err(ValidationError::TooShort);
    }
    if length > MAX_MESSAGE_CHARS {
        return Err(ValidationError::TooLong);
    }

    if UNSAFE_PATTERNS.iter().any(|re| re.is_match(trimmed)) {
        return Err(ValidationError::UnsafeContent);
    }
    if SQL_PATTERNS.iter().any(|re| re.is_match(trimmed)) {
        return Err(ValidationError::SuspiciousQuery);
    }

    let special = trimmed
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !PLAIN_PUNCTUATION.contains(c))
        .count();
    if special as f64 / length as f64 > MAX_SPECIAL_CHAR_RATIO {
        return Err(ValidationError::TooManySpecialCharacters);
    }

    if longest_run(trimmed) > MAX_REPEATED_RUN {
        return Err(ValidationError::RepeatedCharacters);
    }

    let sanitized = sanitize(trimmed);
    if sanitized.is_empty() {
        return Err(ValidationError::Empty);
    }
    Ok(sanitized)
}

/// Strip markup and injection tokens, collapse whitespace, cap the length.
///
/// Idempotent: stripping runs to a fixpoint so removals cannot splice a new
/// token together.
pub fn sanitize(raw: &str) -> String {
    let mut text: String = raw
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    loop {
        let next = strip_once(&text);
        if next == text {
            break;
        }
        text = next;
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, MAX_MESSAGE_CHARS).trim_end().to_string()
}

/// First `max` characters of `text`
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn strip_once(text: &str) -> String {
    let t = HTML_TAG.replace_all(text, "");
    let t = ANGLE_BRACKET.replace_all(&t, "");
    let t = DANGEROUS_SCHEME.replace_all(&t, "");
    let t = EVENT_HANDLER.replace_all(&t, "");
    let t = CSS_INJECTION.replace_all(&t, "");
    t.into_owned()
}

fn longest_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous = None;
    for c in text.chars() {
        if Some(c) == previous {
            current += 1;
        } else {
            current = 1;
            previous = Some(c);
        }
        longest = longest.max(current);
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ordinary_questions() {
        let samples = [
            "hi",
            "What are your skills?",
            "Tell me about TrailMapper, please.",
            "Where did you study computer science?",
            "How can I contact you about a role at our company?",
            "Do you know Rust and TypeScript?",
        ];
        for sample in samples {
            let sanitized = validate(sample).unwrap_or_else(|e| panic!("{sample}: {e}"));
            assert!(sanitized.chars().count() <= MAX_MESSAGE_CHARS);
        }
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(validate(""), Err(ValidationError::Empty));
        assert_eq!(validate("   \n\t "), Err(ValidationError::Empty));
        assert_eq!(validate(" a "), Err(ValidationError::TooShort));
        assert_eq!(validate(&"ab ".repeat(200)), Err(ValidationError::TooLong));

        let exactly_max = "word ".repeat(100);
        assert!(validate(&exactly_max).is_ok());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let accented = "é".repeat(10) + " " + &"ü".repeat(10);
        assert!(validate(&accented).is_ok());
    }

    #[test]
    fn test_rejects_unsafe_markup() {
        for sample in [
            "<script>alert(1)</script>hello",
            "look <iframe src=x>",
            "<img src=x onerror=alert(1)>",
            "click javascript:alert(1)",
            "width: expression(alert(1))",
            "@import url(evil.css)",
            "-moz-binding: url(x)",
        ] {
            assert_eq!(validate(sample), Err(ValidationError::UnsafeContent), "{sample}");
        }
    }

    #[test]
    fn test_rejects_sql_heuristics() {
        for sample in [
            "1; DROP TABLE users",
            "' UNION SELECT password FROM users --",
            "admin' or 1=1",
            "x' OR 'a'='a'",
        ] {
            assert!(validate(sample).is_err(), "{sample}");
        }
        assert!(validate("Did you select Rust for the backend?").is_ok());
    }

    #[test]
    fn test_rejects_special_character_floods() {
        assert_eq!(
            validate("#$%^&*() hi"),
            Err(ValidationError::TooManySpecialCharacters)
        );
        assert!(validate("Hi!").is_ok());
    }

    #[test]
    fn test_repeated_characters() {
        assert_eq!(
            validate("helloooooooooooo"),
            Err(ValidationError::RepeatedCharacters)
        );
        assert!(validate("hellooooooooo").is_ok());
    }

    #[test]
    fn test_sanitize_script_scenario() {
        let out = sanitize("<script>alert(1)</script>hello");
        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
        assert!(!out.contains("script"));
        assert!(out.ends_with("hello"));
    }

    #[test]
    fn test_sanitize_spliced_tokens() {
        let out = sanitize("javajavascript:script:alert");
        assert!(!out.to_lowercase().contains("javascript:"));
        let out = sanitize("<<b>script>");
        assert!(!out.contains('<') && !out.contains('>'));
    }

    #[test]
    fn test_sanitize_whitespace_and_controls() {
        assert_eq!(sanitize("  hello \n\n  world\t "), "hello world");
        assert_eq!(sanitize("he\u{0007}llo"), "hello");
        assert_eq!(sanitize("java\u{0001}script:run"), "run");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(800);
        assert_eq!(sanitize(&long).chars().count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let long = "ab ".repeat(300);
        let samples = [
            "<script>alert(1)</script>hello",
            "  spaced   out\ttext  ",
            "onclick = steal() and onload=x",
            "data: vbscript: JavaScript :done",
            "<<<>>>",
            "behavior:url(x) expression (y) @import z",
            "plain question about your projects?",
            long.as_str(),
            "é\u{0000}\u{200B}ü",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "{sample:?}");
        }
    }
}
