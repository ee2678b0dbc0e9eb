use gatecheck_core::{Rejection, ValidationResult};
use serde::Serialize;
use serde_json::Value;

use crate::exit_codes::{ACCEPTED, REJECTED};

/// One JSON object per invocation on stdout.
#[derive(Debug, Serialize, PartialEq)]
pub struct Report {
    pub guard: &'static str,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<&'static str>,
}

impl Report {
    pub fn accepted(guard: &'static str, value: Value) -> Self {
        Self {
            guard,
            accepted: true,
            value: Some(value),
            reason_code: None,
        }
    }

    pub fn rejected(guard: &'static str, reason: Rejection) -> Self {
        Self {
            guard,
            accepted: false,
            value: None,
            reason_code: Some(reason.code()),
        }
    }

    pub fn from_result(guard: &'static str, result: ValidationResult<Value>) -> Self {
        match result {
            Ok(v) => Self::accepted(guard, v),
            Err(r) => Self::rejected(guard, r),
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.accepted {
            ACCEPTED
        } else {
            REJECTED
        }
    }

    pub fn emit(&self) -> anyhow::Result<i32> {
        println!("{}", serde_json::to_string(self)?);
        Ok(self.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejected_shape_has_no_value() {
        let r = Report::rejected("redirect", Rejection::InvalidRedirect);
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"guard": "redirect", "accepted": false, "reason_code": "INVALID_REDIRECT"})
        );
        assert_eq!(r.exit_code(), REJECTED);
    }

    #[test]
    fn accepted_shape() {
        let r = Report::from_result("arg", Ok(json!("example.com")));
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"guard": "arg", "accepted": true, "value": "example.com"})
        );
        assert_eq!(r.exit_code(), ACCEPTED);
    }
}
