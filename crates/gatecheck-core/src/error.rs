//! Rejection reasons and configuration errors.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Why a guard refused an input.
///
/// Variants carry no data: a rejection must never leak internal paths,
/// partial values or system detail back to the requester. Human-readable
/// context belongs in the caller's logs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rejection {
    /// Resolved path leaves the permitted directory.
    #[error("path escapes the permitted directory")]
    PathEscape,

    /// Target does not exist, is not a regular file, or could not be checked.
    #[error("file not found")]
    NotFound,

    /// Input does not satisfy the argument grammar.
    #[error("invalid argument")]
    InvalidArgument,

    /// Absolute URL whose host is not allow-listed.
    #[error("host not allowed")]
    HostNotAllowed,

    /// Relative redirect target that is not a same-origin path.
    #[error("invalid redirect target")]
    InvalidRedirect,

    /// Declared token algorithm differs from the pinned one (or is `none`).
    #[error("token algorithm mismatch")]
    AlgorithmMismatch,

    #[error("token signature invalid")]
    SignatureInvalid,

    #[error("token expired")]
    Expired,

    /// `nbf` lies in the future.
    #[error("token not yet valid")]
    NotYetValid,

    /// Issuer or audience does not match the configured values.
    #[error("token claims rejected")]
    ClaimMismatch,

    #[error("malformed token")]
    MalformedToken,

    /// Header asks the verifier to honour keys or extensions it never trusts.
    #[error("unsupported token header")]
    UnsupportedHeader,

    /// Outbound fetch over a scheme other than the permitted ones.
    #[error("insecure scheme")]
    InsecureScheme,

    /// Outbound fetch towards loopback, private or metadata addresses.
    #[error("internal address not allowed")]
    InternalAddress,

    #[error("invalid url")]
    InvalidUrl,
}

impl Rejection {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PathEscape => "PATH_ESCAPE",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::HostNotAllowed => "HOST_NOT_ALLOWED",
            Self::InvalidRedirect => "INVALID_REDIRECT",
            Self::AlgorithmMismatch => "ALGORITHM_MISMATCH",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::Expired => "EXPIRED",
            Self::NotYetValid => "NOT_YET_VALID",
            Self::ClaimMismatch => "CLAIM_MISMATCH",
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::UnsupportedHeader => "UNSUPPORTED_HEADER",
            Self::InsecureScheme => "INSECURE_SCHEME",
            Self::InternalAddress => "INTERNAL_ADDRESS",
            Self::InvalidUrl => "INVALID_URL",
        }
    }

    /// Suggested HTTP status for a dispatcher answering the requester.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::PathEscape | Self::InternalAddress => 403,
            Self::NotFound => 404,
            Self::InvalidArgument
            | Self::HostNotAllowed
            | Self::InvalidRedirect
            | Self::InsecureScheme
            | Self::InvalidUrl => 400,
            Self::AlgorithmMismatch
            | Self::SignatureInvalid
            | Self::Expired
            | Self::NotYetValid
            | Self::ClaimMismatch
            | Self::MalformedToken
            | Self::UnsupportedHeader => 401,
        }
    }

    /// Whether the rejection concerns a presented token.
    pub fn is_token_failure(&self) -> bool {
        self.http_status() == 401
    }
}

/// Accepted(normalized value) or Rejected(reason).
pub type ValidationResult<T> = Result<T, Rejection>;

/// Startup/configuration failures. Operator-facing, never returned to requesters.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid base directory {path}: {reason}")]
    BaseDir { path: PathBuf, reason: String },

    #[error("invalid argument pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid option '{key}': {reason}")]
    Option { key: String, reason: String },

    #[error("invalid allow-list entry '{entry}': {reason}")]
    AllowList { entry: String, reason: String },

    #[error("invalid token configuration: {reason}")]
    Token { reason: String },

    #[error("guard not configured: {0}")]
    Missing(&'static str),
}

impl ConfigError {
    pub(crate) fn option(key: &str, reason: impl Into<String>) -> Self {
        Self::Option {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn allow_list(entry: &str, reason: impl Into<String>) -> Self {
        Self::AllowList {
            entry: entry.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn token(reason: impl Into<String>) -> Self {
        Self::Token {
            reason: reason.into(),
        }
    }
}
