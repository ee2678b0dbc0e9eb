use std::fmt;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey};

use crate::error::ConfigError;

pub const DEFAULT_LEEWAY: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_TOKEN_BYTES: usize = 8192;
pub const MIN_HMAC_SECRET_BYTES: usize = 32;

/// Key family an algorithm belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    pub fn of(alg: Algorithm) -> Self {
        if matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            Self::Hmac
        } else if matches!(alg, Algorithm::ES256 | Algorithm::ES384) {
            Self::Ec
        } else if matches!(alg, Algorithm::EdDSA) {
            Self::Ed
        } else {
            Self::Rsa
        }
    }
}

/// Parse a configured algorithm name. `none` is refused in any casing.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("none") {
        return Err(ConfigError::token("algorithm 'none' cannot be configured"));
    }
    name.parse()
        .map_err(|_| ConfigError::token(format!("unknown algorithm '{name}'")))
}

/// The pinned algorithm, its verification key, and claim expectations.
///
/// Constructed from operator configuration only.
#[derive(Clone)]
pub struct TrustedKeyMaterial {
    pub(crate) algorithm: Algorithm,
    pub(crate) key: DecodingKey,
    pub(crate) issuer: Option<String>,
    pub(crate) audience: Vec<String>,
    pub(crate) leeway: Duration,
    pub(crate) max_token_bytes: usize,
}

impl fmt::Debug for TrustedKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustedKeyMaterial")
            .field("algorithm", &self.algorithm)
            .field("key", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway", &self.leeway)
            .field("max_token_bytes", &self.max_token_bytes)
            .finish()
    }
}

impl TrustedKeyMaterial {
    fn with_key(algorithm: Algorithm, key: DecodingKey) -> Self {
        Self {
            algorithm,
            key,
            issuer: None,
            audience: Vec::new(),
            leeway: DEFAULT_LEEWAY,
            max_token_bytes: DEFAULT_MAX_TOKEN_BYTES,
        }
    }

    fn expect_family(algorithm: Algorithm, family: KeyFamily) -> Result<(), ConfigError> {
        if KeyFamily::of(algorithm) == family {
            Ok(())
        } else {
            Err(ConfigError::token(format!(
                "{algorithm:?} cannot be used with a {family:?} key"
            )))
        }
    }

    /// Shared-secret key for HS256/HS384/HS512.
    pub fn hmac(algorithm: Algorithm, secret: &[u8]) -> Result<Self, ConfigError> {
        Self::expect_family(algorithm, KeyFamily::Hmac)?;
        if secret.len() < MIN_HMAC_SECRET_BYTES {
            return Err(ConfigError::token(format!(
                "HMAC secret must be at least {MIN_HMAC_SECRET_BYTES} bytes"
            )));
        }
        Ok(Self::with_key(algorithm, DecodingKey::from_secret(secret)))
    }

    /// RSA public key (PEM) for RS* and PS*.
    pub fn rsa_pem(algorithm: Algorithm, pem: &[u8]) -> Result<Self, ConfigError> {
        Self::expect_family(algorithm, KeyFamily::Rsa)?;
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| ConfigError::token(format!("bad RSA PEM: {e}")))?;
        Ok(Self::with_key(algorithm, key))
    }

    /// EC public key (PEM) for ES256/ES384.
    pub fn ec_pem(algorithm: Algorithm, pem: &[u8]) -> Result<Self, ConfigError> {
        Self::expect_family(algorithm, KeyFamily::Ec)?;
        let key = DecodingKey::from_ec_pem(pem)
            .map_err(|e| ConfigError::token(format!("bad EC PEM: {e}")))?;
        Ok(Self::with_key(algorithm, key))
    }

    /// Ed25519 public key (PEM) for EdDSA.
    pub fn ed_pem(algorithm: Algorithm, pem: &[u8]) -> Result<Self, ConfigError> {
        Self::expect_family(algorithm, KeyFamily::Ed)?;
        let key = DecodingKey::from_ed_pem(pem)
            .map_err(|e| ConfigError::token(format!("bad Ed25519 PEM: {e}")))?;
        Ok(Self::with_key(algorithm, key))
    }

    /// Pick the PEM loader matching the algorithm family.
    pub fn from_pem(algorithm: Algorithm, pem: &[u8]) -> Result<Self, ConfigError> {
        match KeyFamily::of(algorithm) {
            KeyFamily::Hmac => Err(ConfigError::token(
                "HMAC algorithms take a secret, not a PEM file",
            )),
            KeyFamily::Rsa => Self::rsa_pem(algorithm, pem),
            KeyFamily::Ec => Self::ec_pem(algorithm, pem),
            KeyFamily::Ed => Self::ed_pem(algorithm, pem),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience<S: Into<String>>(mut self, audience: impl IntoIterator<Item = S>) -> Self {
        self.audience = audience.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn with_max_token_bytes(mut self, max: usize) -> Self {
        self.max_token_bytes = max;
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    pub fn max_token_bytes(&self) -> usize {
        self.max_token_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn none_cannot_be_configured() {
        for name in ["none", "NONE", " None "] {
            assert!(matches!(
                parse_algorithm(name),
                Err(ConfigError::Token { .. })
            ));
        }
        assert_eq!(parse_algorithm("RS256").unwrap(), Algorithm::RS256);
        assert!(parse_algorithm("HS999").is_err());
    }

    #[test]
    fn families() {
        assert_eq!(KeyFamily::of(Algorithm::HS384), KeyFamily::Hmac);
        assert_eq!(KeyFamily::of(Algorithm::PS256), KeyFamily::Rsa);
        assert_eq!(KeyFamily::of(Algorithm::ES256), KeyFamily::Ec);
        assert_eq!(KeyFamily::of(Algorithm::EdDSA), KeyFamily::Ed);
    }

    #[test]
    fn algorithm_must_match_key_type() {
        assert!(TrustedKeyMaterial::hmac(Algorithm::HS256, SECRET).is_ok());
        assert!(TrustedKeyMaterial::hmac(Algorithm::RS256, SECRET).is_err());
        assert!(TrustedKeyMaterial::rsa_pem(Algorithm::HS256, b"pem").is_err());
        assert!(TrustedKeyMaterial::from_pem(Algorithm::HS256, b"pem").is_err());
        assert!(TrustedKeyMaterial::rsa_pem(Algorithm::RS256, b"not a pem").is_err());
    }

    #[test]
    fn short_hmac_secret_refused() {
        assert!(TrustedKeyMaterial::hmac(Algorithm::HS256, b"short").is_err());
    }

    #[test]
    fn debug_hides_key() {
        let k = TrustedKeyMaterial::hmac(Algorithm::HS256, SECRET)
            .unwrap()
            .with_issuer("https://auth.example.com");
        let dbg = format!("{k:?}");
        assert!(dbg.contains("<redacted>"));
        assert!(!dbg.contains("0123456789abcdef"));
    }
}
