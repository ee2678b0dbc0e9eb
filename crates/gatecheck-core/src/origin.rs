//! Cross-origin (CORS) decision against a fixed origin list.
//!
//! Matching is byte-equal on the serialized origin. The request's `Origin`
//! value is never copied into a response header; on a match the configured
//! entry is emitted instead.

use std::collections::BTreeSet;

use url::Url;

use crate::error::ConfigError;

pub const VARY: &str = "Vary";
pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ALLOW_CREDENTIALS: &str = "Access-Control-Allow-Credentials";

#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: BTreeSet<String>,
}

impl OriginPolicy {
    pub fn new<S: AsRef<str>>(allowed: impl IntoIterator<Item = S>) -> Result<Self, ConfigError> {
        let allowed = allowed
            .into_iter()
            .map(|o| check_origin_entry(o.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { allowed })
    }

    pub fn allowed(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    pub fn decide(&self, origin: &str) -> bool {
        let ok = self.allowed.contains(origin);
        if !ok {
            tracing::debug!(guard = "origin", reason = "ORIGIN_NOT_ALLOWED", "rejected");
        }
        ok
    }

    /// Headers for a response to a request carrying `origin`.
    pub fn response_headers(&self, origin: Option<&str>) -> Vec<(&'static str, String)> {
        let mut headers = vec![(VARY, "Origin".to_string())];
        if let Some(entry) = origin.and_then(|o| self.allowed.get(o)) {
            headers.push((ALLOW_ORIGIN, entry.clone()));
            headers.push((ALLOW_CREDENTIALS, "true".to_string()));
        }
        headers
    }
}

/// One-shot membership check.
pub fn decide<S: AsRef<str>>(origin: &str, allowed: impl IntoIterator<Item = S>) -> bool {
    allowed.into_iter().any(|a| a.as_ref() == origin)
}

/// Entries must already be in serialized origin form: `scheme://host[:port]`.
fn check_origin_entry(raw: &str) -> Result<String, ConfigError> {
    let entry = raw.trim();
    if entry == "*" || entry.eq_ignore_ascii_case("null") {
        return Err(ConfigError::allow_list(raw, "wildcard and null origins are refused"));
    }
    let url = Url::parse(entry).map_err(|e| ConfigError::allow_list(raw, e.to_string()))?;
    if !url.origin().is_tuple() {
        return Err(ConfigError::allow_list(raw, "not a tuple origin"));
    }
    let serialized = url.origin().ascii_serialization();
    if serialized != entry {
        return Err(ConfigError::allow_list(
            raw,
            format!("must be written as '{serialized}' (no path, query or trailing slash)"),
        ));
    }
    Ok(serialized)
}
