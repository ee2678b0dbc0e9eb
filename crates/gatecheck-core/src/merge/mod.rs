//! Allow-list driven settings merge.
//!
//! The merge walks the keys of the [`DefaultConfig`] and never the keys of
//! the candidate, so attacker-chosen names (`__proto__`, `constructor`, any
//! spelling) are simply never read. Values are copied only when their JSON
//! type and declared bounds match; otherwise the default stays. The result is
//! always a complete, well-typed mapping.

mod options;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use options::{OptionSpec, DEFAULT_TEXT_MAX_LEN};

use crate::error::ConfigError;

/// Names that refer to the inheritance link of script-engine objects.
/// Refused as option names whatever their casing.
const RESERVED_KEYS: &[&str] = &["__proto__", "constructor", "prototype"];

/// Closed set of option names with their types, bounds and defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, OptionSpec>",
    into = "BTreeMap<String, OptionSpec>"
)]
pub struct DefaultConfig {
    options: BTreeMap<String, OptionSpec>,
}

impl TryFrom<BTreeMap<String, OptionSpec>> for DefaultConfig {
    type Error = ConfigError;

    fn try_from(options: BTreeMap<String, OptionSpec>) -> Result<Self, Self::Error> {
        for (key, spec) in &options {
            if key.is_empty() {
                return Err(ConfigError::option(key, "empty option name"));
            }
            if RESERVED_KEYS.iter().any(|r| key.eq_ignore_ascii_case(r)) {
                return Err(ConfigError::option(key, "reserved option name"));
            }
            spec.check(key)?;
        }
        Ok(Self { options })
    }
}

impl From<DefaultConfig> for BTreeMap<String, OptionSpec> {
    fn from(cfg: DefaultConfig) -> Self {
        cfg.options
    }
}

impl DefaultConfig {
    pub fn new<K: Into<String>>(
        options: impl IntoIterator<Item = (K, OptionSpec)>,
    ) -> Result<Self, ConfigError> {
        options
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect::<BTreeMap<_, _>>()
            .try_into()
    }

    /// theme / notifications / language, as served by the settings endpoint.
    pub fn workshop_settings() -> Self {
        let mut options = BTreeMap::new();
        options.insert(
            "theme".to_string(),
            OptionSpec::choice("light", &["light", "dark"]),
        );
        options.insert(
            "notifications".to_string(),
            OptionSpec::Bool { default: true },
        );
        options.insert("language".to_string(), OptionSpec::text("en", 8));
        Self { options }
    }

    pub fn get(&self, key: &str) -> Option<&OptionSpec> {
        self.options.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// A fresh copy of every default.
    pub fn defaults(&self) -> Map<String, Value> {
        self.options
            .iter()
            .map(|(k, spec)| (k.clone(), spec.default_value()))
            .collect()
    }

    /// Merge `candidate` over the defaults. Never fails.
    pub fn merge(&self, candidate: &Value) -> Map<String, Value> {
        let Some(obj) = candidate.as_object() else {
            tracing::debug!(guard = "merge", reason = "NOT_AN_OBJECT", "using defaults");
            return self.defaults();
        };

        let ignored = obj.keys().filter(|k| !self.options.contains_key(*k)).count();
        if ignored > 0 {
            tracing::debug!(guard = "merge", ignored, "candidate keys outside allow-list ignored");
        }

        let mut out = Map::new();
        for (key, spec) in &self.options {
            let merged = match (spec, obj.get(key)) {
                (OptionSpec::Section { options }, Some(nested)) => {
                    Value::Object(options.merge(nested))
                }
                (_, Some(v)) if spec.accepts(v) => v.clone(),
                _ => spec.default_value(),
            };
            out.insert(key.clone(), merged);
        }
        out
    }
}

/// Free-function form of [`DefaultConfig::merge`].
pub fn merge(defaults: &DefaultConfig, candidate: &Value) -> Map<String, Value> {
    defaults.merge(candidate)
}
