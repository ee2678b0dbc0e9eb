//! Bearer token (JWS) verification against a pinned algorithm and key.
//!
//! The verifier never lets the token choose how it is verified: the declared
//! `alg` must equal the configured one before the key is touched, `none` is
//! always refused, and header members that point at other keys are refused
//! outright.

mod header;
mod key;


use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use header::{peek, PeekedHeader, FORBIDDEN_HEADER_FIELDS};
pub use key::{
    parse_algorithm, KeyFamily, TrustedKeyMaterial, DEFAULT_LEEWAY, DEFAULT_MAX_TOKEN_BYTES,
    MIN_HMAC_SECRET_BYTES,
};

use crate::error::{Rejection, ValidationResult};

/// Verified claim set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// String or array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct TokenVerifier {
    material: TrustedKeyMaterial,
}

impl TokenVerifier {
    pub fn new(material: TrustedKeyMaterial) -> Self {
        Self { material }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.material.algorithm
    }

    pub fn material(&self) -> &TrustedKeyMaterial {
        &self.material
    }

    pub fn verify(&self, token: &str) -> ValidationResult<Claims> {
        self.check(token).map_err(|r| {
            tracing::debug!(guard = "token", reason = r.code(), "rejected");
            r
        })
    }

    fn check(&self, token: &str) -> ValidationResult<Claims> {
        let m = &self.material;
        if token.len() > m.max_token_bytes {
            return Err(Rejection::MalformedToken);
        }

        let header = peek(token)?;
        if header.declares_none() || header.algorithm() != Some(m.algorithm) {
            return Err(Rejection::AlgorithmMismatch);
        }
        if let Some(field) = header.forbidden_fields().next() {
            tracing::debug!(guard = "token", field, "header member refused");
            return Err(Rejection::UnsupportedHeader);
        }

        let validation = self.validation();
        decode::<Claims>(token, &m.key, &validation)
            .map(|data| data.claims)
            .map_err(|e| map_error_kind(e.kind()))
    }

    fn validation(&self) -> Validation {
        let m = &self.material;
        let mut validation = Validation::new(m.algorithm);
        validation.leeway = m.leeway.as_secs();
        validation.validate_nbf = true;

        // A pinned claim must also be present.
        let mut required = vec!["exp"];
        if m.issuer.is_some() {
            required.push("iss");
        }
        if !m.audience.is_empty() {
            required.push("aud");
        }
        validation.set_required_spec_claims(&required);

        if let Some(iss) = &m.issuer {
            validation.set_issuer(&[iss]);
        }
        if m.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&m.audience);
        }
        validation
    }
}

fn map_error_kind(kind: &ErrorKind) -> Rejection {
    match kind {
        ErrorKind::ExpiredSignature => Rejection::Expired,
        ErrorKind::ImmatureSignature => Rejection::NotYetValid,
        ErrorKind::InvalidSignature => Rejection::SignatureInvalid,
        ErrorKind::InvalidAlgorithm => Rejection::AlgorithmMismatch,
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::MissingRequiredClaim(_) => Rejection::ClaimMismatch,
        _ => Rejection::MalformedToken,
    }
}

/// One-shot verification. `key` is the shared secret for HS*, otherwise a PEM
/// public key. Unusable key material verifies nothing.
pub fn verify(token: &str, algorithm: Algorithm, key: &[u8]) -> ValidationResult<Claims> {
    let material = match KeyFamily::of(algorithm) {
        KeyFamily::Hmac => TrustedKeyMaterial::hmac(algorithm, key),
        _ => TrustedKeyMaterial::from_pem(algorithm, key),
    };
    match material {
        Ok(m) => TokenVerifier::new(m).verify(token),
        Err(e) => {
            tracing::warn!(guard = "token", error = %e, "unusable key material");
            Err(Rejection::SignatureInvalid)
        }
    }
}
