//! Per-option type and bounds declarations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DefaultConfig;
use crate::error::ConfigError;

pub const DEFAULT_TEXT_MAX_LEN: usize = 256;

fn default_text_max_len() -> usize {
    DEFAULT_TEXT_MAX_LEN
}

/// Declared shape of one settings key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptionSpec {
    Bool {
        default: bool,
    },
    Integer {
        default: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    Number {
        default: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Text {
        default: String,
        #[serde(default = "default_text_max_len")]
        max_len: usize,
    },
    Choice {
        default: String,
        choices: Vec<String>,
    },
    /// Nested shape; the only place merging recurses.
    Section {
        options: DefaultConfig,
    },
}

impl OptionSpec {
    pub fn text(default: &str, max_len: usize) -> Self {
        Self::Text {
            default: default.to_string(),
            max_len,
        }
    }

    pub fn choice(default: &str, choices: &[&str]) -> Self {
        Self::Choice {
            default: default.to_string(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn integer(default: i64, min: i64, max: i64) -> Self {
        Self::Integer {
            default,
            min: Some(min),
            max: Some(max),
        }
    }

    /// The default as a JSON value.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Bool { default } => Value::Bool(*default),
            Self::Integer { default, .. } => Value::from(*default),
            Self::Number { default, .. } => {
                serde_json::Number::from_f64(*default).map_or(Value::Null, Value::Number)
            }
            Self::Text { default, .. } | Self::Choice { default, .. } => {
                Value::String(default.clone())
            }
            Self::Section { options } => Value::Object(options.defaults()),
        }
    }

    /// Whether a scalar candidate value fits this option. Sections are handled by the merger.
    pub(crate) fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool { .. }, Value::Bool(_)) => true,
            (Self::Integer { min, max, .. }, Value::Number(n)) => n
                .as_i64()
                .is_some_and(|v| within(v, *min, *max)),
            (Self::Number { min, max, .. }, Value::Number(n)) => n
                .as_f64()
                .is_some_and(|v| v.is_finite() && within(v, *min, *max)),
            (Self::Text { max_len, .. }, Value::String(s)) => text_ok(s, *max_len),
            (Self::Choice { choices, .. }, Value::String(s)) => choices.iter().any(|c| c == s),
            _ => false,
        }
    }

    /// Check that the declared default satisfies the declared bounds.
    pub(crate) fn check(&self, key: &str) -> Result<(), ConfigError> {
        let inverted = match self {
            Self::Integer { min, max, .. } => bounds_inverted(min, max),
            Self::Number { min, max, .. } => bounds_inverted(min, max),
            _ => false,
        };
        if inverted {
            return Err(ConfigError::option(key, "min exceeds max"));
        }

        match self {
            Self::Bool { .. } | Self::Section { .. } => Ok(()),
            Self::Number { default, .. } if !default.is_finite() => {
                Err(ConfigError::option(key, "default must be finite"))
            }
            Self::Text { max_len: 0, .. } => {
                Err(ConfigError::option(key, "max_len must be positive"))
            }
            Self::Choice { choices, .. } if choices.is_empty() => {
                Err(ConfigError::option(key, "choices must not be empty"))
            }
            other if other.accepts(&other.default_value()) => Ok(()),
            _ => Err(ConfigError::option(key, "default violates its own bounds")),
        }
    }
}

fn within<T: PartialOrd>(v: T, min: Option<T>, max: Option<T>) -> bool {
    min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m)
}

fn bounds_inverted<T: PartialOrd>(min: &Option<T>, max: &Option<T>) -> bool {
    matches!((min, max), (Some(a), Some(b)) if a > b)
}

fn text_ok(s: &str, max_len: usize) -> bool {
    s.chars().count() <= max_len && !s.chars().any(char::is_control)
}
