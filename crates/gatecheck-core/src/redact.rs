//! Log hygiene: keep credentials and card numbers out of log lines.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Header names whose values are credentials (compared case-insensitively).
pub const SENSITIVE_HEADER_NAMES: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "x-auth-token",
    "x-access-token",
];

static PASSWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(password|passwd|pwd)\s*[=:]\s*("[^"]*"|'[^']*'|[^\s&,;]+)"#)
        .expect("password pattern compiles")
});

static SECRET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(access_token|refresh_token|token|apikey|api_key|api-key|secret|client_secret)\s*[=:]\s*("[^"]*"|'[^']*'|[^\s&,;]+)"#,
    )
    .expect("secret pattern compiles")
});

static BEARER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]+").expect("bearer pattern compiles")
});

/// Replace `key=value` / `key: value` credential assignments with `key=[REDACTED]`.
pub fn redact(text: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(text);
    for re in [&*PASSWORD_RE, &*SECRET_RE] {
        if re.is_match(&out) {
            out = Cow::Owned(re.replace_all(&out, "$1=[REDACTED]").into_owned());
        }
    }
    if BEARER_RE.is_match(&out) {
        out = Cow::Owned(BEARER_RE.replace_all(&out, "Bearer [REDACTED]").into_owned());
    }
    out
}

/// `****-****-****-NNNN`, or `[INVALID]` with fewer than four digits.
pub fn mask_card(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return "[INVALID]".to_string();
    }
    let last: String = digits[digits.len() - 4..].iter().collect();
    format!("****-****-****-{last}")
}

pub fn is_sensitive_header(name: &str) -> bool {
    let name = name.trim();
    SENSITIVE_HEADER_NAMES
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}
