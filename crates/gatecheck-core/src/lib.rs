//! Request-boundary validation guards.
//!
//! Each guard takes one untrusted value and a piece of trusted configuration
//! and answers Accepted (with the normalized value) or Rejected (with a
//! symbolic [`Rejection`]):
//!
//! - [`PathGuard`]: confine a requested filename to one directory
//! - [`CommandArgGuard`]: grammar-check a value bound for an external process
//! - [`DefaultConfig::merge`]: merge user settings over an allow-list of defaults
//! - [`RedirectGuard`]: same-origin paths or allow-listed hosts only
//! - [`TokenVerifier`]: JWS verification with a pinned algorithm and key
//! - [`OriginPolicy`]: CORS decision against a fixed origin list
//! - [`OutboundUrlGuard`]: refuse fetches towards internal addresses
//!
//! plus [`escape_html`] and [`redact()`] for values leaving the process.
//!
//! # Quick Start
//!
//! ```no_run
//! use gatecheck_core::{GuardConfig, GuardSet};
//!
//! # fn example() -> Result<(), gatecheck_core::ConfigError> {
//! let mut config = GuardConfig::load("gatecheck.yaml")?;
//! config.apply_env();
//! let guards = GuardSet::from_config(&config)?;
//!
//! match guards.redirect().validate("/dashboard") {
//!     Ok(target) => println!("302 -> {target}"),
//!     Err(reason) => println!("{} {}", reason.http_status(), reason.code()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `GATECHECK_PATH_BASE_DIR` | Directory served by the path guard |
//! | `GATECHECK_REDIRECT_ALLOWED_HOSTS` | Comma-separated redirect hosts |
//! | `GATECHECK_ORIGIN_ALLOWED` | Comma-separated CORS origins |
//! | `GATECHECK_OUTBOUND_ALLOWED_HOSTS` | Comma-separated outbound hosts |
//! | `GATECHECK_TOKEN_ALGORITHM` | Pinned JWS algorithm (never `none`) |
//!
//! The HMAC secret is read from the variable named by `token.secret_env`.

pub mod command_arg;
pub mod config;
pub mod error;
pub mod escape;
pub mod guards;
pub mod merge;
pub mod origin;
pub mod outbound;
pub mod path_guard;
pub mod redact;
pub mod redirect;
pub mod token;

pub use command_arg::{ArgPolicy, CommandArgGuard, PreparedCommand};
pub use config::{
    GuardConfig, OriginConfig, OutboundConfig, PathConfig, RedirectConfig, TokenConfig,
};
pub use error::{ConfigError, Rejection, ValidationResult};
pub use escape::escape_html;
pub use guards::{GuardSet, SharedGuards};
pub use merge::{DefaultConfig, OptionSpec};
pub use origin::OriginPolicy;
pub use outbound::{OutboundOptions, OutboundUrlGuard};
pub use path_guard::PathGuard;
pub use redact::{is_sensitive_header, mask_card, redact};
pub use redirect::{RedirectGuard, RedirectOptions};
pub use token::{parse_algorithm, Claims, TokenVerifier, TrustedKeyMaterial};

/// Re-exported so callers can name algorithms without a direct dependency.
pub use jsonwebtoken::Algorithm;
