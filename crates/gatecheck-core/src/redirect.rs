//! Open-redirect guard.
//!
//! A candidate is first tried as an absolute URL; only if that fails is the
//! same-origin relative rule applied. Absolute parsing wins every ambiguity,
//! since it is the reading a browser would act on.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::error::{ConfigError, Rejection, ValidationResult};

pub const MAX_REDIRECT_LEN: usize = 2048;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectOptions {
    /// Refuse absolute targets that are not https even when the host is allowed.
    pub require_https: bool,
}

#[derive(Debug, Clone)]
pub struct RedirectGuard {
    allowed_hosts: HashSet<String>,
    options: RedirectOptions,
}

impl RedirectGuard {
    pub fn new<S: AsRef<str>>(
        allowed_hosts: impl IntoIterator<Item = S>,
        options: RedirectOptions,
    ) -> Result<Self, ConfigError> {
        let allowed_hosts = allowed_hosts
            .into_iter()
            .map(|h| normalize_host(h.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            allowed_hosts,
            options,
        })
    }

    pub fn is_allowed_host(&self, host: &str) -> bool {
        self.allowed_hosts.contains(host)
    }

    pub fn validate(&self, candidate: &str) -> ValidationResult<String> {
        self.check(candidate).map_err(|r| {
            tracing::debug!(guard = "redirect", reason = r.code(), "rejected");
            r
        })
    }

    fn check(&self, candidate: &str) -> ValidationResult<String> {
        if candidate.len() > MAX_REDIRECT_LEN {
            return Err(Rejection::InvalidRedirect);
        }

        if let Ok(url) = Url::parse(candidate) {
            let host_ok = url
                .host_str()
                .is_some_and(|h| self.allowed_hosts.contains(h));
            let scheme_ok = !self.options.require_https || url.scheme() == "https";
            return if host_ok && scheme_ok {
                Ok(url.as_str().to_string())
            } else {
                Err(Rejection::HostNotAllowed)
            };
        }

        if is_same_origin_path(candidate) {
            Ok(candidate.to_string())
        } else {
            Err(Rejection::InvalidRedirect)
        }
    }
}

/// One-shot form over a plain host set.
pub fn validate<S: AsRef<str>>(
    candidate: &str,
    allowed_hosts: impl IntoIterator<Item = S>,
) -> ValidationResult<String> {
    // Unparseable allow-list entries simply never match.
    let hosts: HashSet<String> = allowed_hosts
        .into_iter()
        .filter_map(|h| normalize_host(h.as_ref()).ok())
        .collect();
    RedirectGuard {
        allowed_hosts: hosts,
        options: RedirectOptions::default(),
    }
    .validate(candidate)
}

/// Exactly one leading `/`, never followed by `/` or `\`, and nothing a
/// browser would strip (tabs, newlines) to turn it into `//host`.
fn is_same_origin_path(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    if chars.next() != Some('/') {
        return false;
    }
    if matches!(chars.next(), Some('/') | Some('\\')) {
        return false;
    }
    !candidate
        .chars()
        .any(|c| c.is_control() || c.is_whitespace())
}

pub(crate) fn normalize_host(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::allow_list(raw, "empty host"));
    }
    let host = Host::parse(trimmed).map_err(|e| ConfigError::allow_list(raw, e.to_string()))?;
    Ok(host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> RedirectGuard {
        RedirectGuard::new(["example.com", "Trusted-Site.com"], RedirectOptions::default()).unwrap()
    }

    #[test]
    fn absolute_allowed_host() {
        let g = guard();
        assert_eq!(
            g.validate("https://example.com/x").unwrap(),
            "https://example.com/x"
        );
        assert!(g.validate("HTTPS://EXAMPLE.COM/x").is_ok());
        assert!(g.validate("https://trusted-site.com:8443/a?b=c").is_ok());
    }

    #[test]
    fn absolute_foreign_host() {
        let g = guard();
        for bad in [
            "https://evil.com/",
            "https://example.com.evil.com/",
            "https://example.com@evil.com/",
            "https:evil.com",
            "javascript:alert(1)",
            "data:text/html,<script>",
        ] {
            assert_eq!(g.validate(bad), Err(Rejection::HostNotAllowed), "{bad}");
        }
    }

    #[test]
    fn protocol_relative_is_invalid() {
        let g = guard();
        assert_eq!(g.validate("//evil.com"), Err(Rejection::InvalidRedirect));
        assert_eq!(g.validate("/\\evil.com"), Err(Rejection::InvalidRedirect));
        assert_eq!(g.validate("/\t/evil.com"), Err(Rejection::InvalidRedirect));
        assert_eq!(g.validate("/ /evil.com"), Err(Rejection::InvalidRedirect));
    }

    #[test]
    fn relative_paths() {
        let g = guard();
        assert_eq!(g.validate("/dashboard").unwrap(), "/dashboard");
        assert!(g.validate("/").is_ok());
        assert!(g.validate("/a/b?c=d#e").is_ok());
        assert_eq!(g.validate("dashboard"), Err(Rejection::InvalidRedirect));
        assert_eq!(g.validate(""), Err(Rejection::InvalidRedirect));
        assert_eq!(g.validate("\\\\evil.com"), Err(Rejection::InvalidRedirect));
    }

    #[test]
    fn require_https() {
        let g = RedirectGuard::new(
            ["example.com"],
            RedirectOptions {
                require_https: true,
            },
        )
        .unwrap();
        assert!(g.validate("https://example.com/").is_ok());
        assert_eq!(
            g.validate("http://example.com/"),
            Err(Rejection::HostNotAllowed)
        );
    }

    #[test]
    fn overlong_is_invalid() {
        let long = format!("/{}", "a".repeat(MAX_REDIRECT_LEN));
        assert_eq!(guard().validate(&long), Err(Rejection::InvalidRedirect));
    }

    #[test]
    fn bad_allow_list_entry_is_config_error() {
        assert!(RedirectGuard::new(["exa mple.com"], RedirectOptions::default()).is_err());
        assert!(RedirectGuard::new([""], RedirectOptions::default()).is_err());
    }

    #[test]
    fn free_function() {
        assert!(validate("https://example.com/x", ["example.com"]).is_ok());
        assert_eq!(
            validate("//evil.com", ["example.com"]),
            Err(Rejection::InvalidRedirect)
        );
    }
}
