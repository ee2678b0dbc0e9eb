//! Raw header inspection ahead of any key use.
//!
//! `jsonwebtoken::decode_header` cannot represent `"alg":"none"` and drops
//! fields it does not model, so the header segment is decoded by hand.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::Algorithm;
use serde_json::{Map, Value};

use crate::error::{Rejection, ValidationResult};

/// Header members that would let the token name its own key or extensions.
pub const FORBIDDEN_HEADER_FIELDS: &[&str] = &["crit", "jku", "jwk", "x5u", "x5c"];

/// What the token claims about itself, before anything is trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct PeekedHeader {
    /// Declared `alg`, verbatim.
    pub alg: String,
    /// The full header object.
    pub fields: Map<String, Value>,
}

impl PeekedHeader {
    pub fn declares_none(&self) -> bool {
        self.alg.trim().eq_ignore_ascii_case("none")
    }

    pub fn algorithm(&self) -> Option<Algorithm> {
        self.alg.parse().ok()
    }

    pub fn forbidden_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        FORBIDDEN_HEADER_FIELDS
            .iter()
            .copied()
            .filter(|f| self.fields.contains_key(*f))
    }
}

/// Split a compact JWS and decode its header segment.
pub fn peek(token: &str) -> ValidationResult<PeekedHeader> {
    let mut parts = token.split('.');
    let (Some(head), Some(_), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(Rejection::MalformedToken);
    };

    let raw = URL_SAFE_NO_PAD
        .decode(head)
        .map_err(|_| Rejection::MalformedToken)?;
    let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(&raw) else {
        return Err(Rejection::MalformedToken);
    };
    let alg = match fields.get("alg") {
        Some(Value::String(s)) => s.clone(),
        _ => return Err(Rejection::MalformedToken),
    };
    Ok(PeekedHeader { alg, fields })
}
