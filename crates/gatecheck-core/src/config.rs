//! YAML configuration with environment overrides.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command_arg::ArgPolicy;
use crate::error::ConfigError;
use crate::merge::DefaultConfig;
use crate::token::{parse_algorithm, KeyFamily, TrustedKeyMaterial};
use crate::token::{DEFAULT_LEEWAY, DEFAULT_MAX_TOKEN_BYTES};

pub const ENV_PATH_BASE_DIR: &str = "GATECHECK_PATH_BASE_DIR";
pub const ENV_REDIRECT_ALLOWED_HOSTS: &str = "GATECHECK_REDIRECT_ALLOWED_HOSTS";
pub const ENV_ORIGIN_ALLOWED: &str = "GATECHECK_ORIGIN_ALLOWED";
pub const ENV_OUTBOUND_ALLOWED_HOSTS: &str = "GATECHECK_OUTBOUND_ALLOWED_HOSTS";
pub const ENV_TOKEN_ALGORITHM: &str = "GATECHECK_TOKEN_ALGORITHM";

/// Every section is optional; absent sections fall back to fail-closed defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<ArgPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<OriginConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound: Option<OutboundConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenConfig>,
    /// Settings allow-list for the merge guard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<DefaultConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathConfig {
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedirectConfig {
    pub allowed_hosts: Vec<String>,
    pub require_https: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OriginConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutboundConfig {
    pub allowed_hosts: Vec<String>,
    pub allow_http: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenConfig {
    pub algorithm: String,
    /// Name of the environment variable holding the HMAC secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_env: Option<String>,
    /// PEM public key for RS*/PS*/ES*/EdDSA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    pub audience: Vec<String>,
    pub leeway_secs: u64,
    pub max_token_bytes: usize,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            algorithm: "HS256".to_string(),
            secret_env: None,
            key_file: None,
            issuer: None,
            audience: Vec::new(),
            leeway_secs: DEFAULT_LEEWAY.as_secs(),
            max_token_bytes: DEFAULT_MAX_TOKEN_BYTES,
        }
    }
}

impl TokenConfig {
    /// Resolve the configured algorithm and key into verifier material.
    pub fn key_material(&self) -> Result<TrustedKeyMaterial, ConfigError> {
        let algorithm = parse_algorithm(&self.algorithm)?;
        let material = match KeyFamily::of(algorithm) {
            KeyFamily::Hmac => {
                let var = self
                    .secret_env
                    .as_deref()
                    .ok_or_else(|| ConfigError::token("secret_env is required for HMAC"))?;
                let secret = env::var(var)
                    .map_err(|_| ConfigError::token(format!("environment variable {var} is not set")))?;
                TrustedKeyMaterial::hmac(algorithm, secret.as_bytes())?
            }
            _ => {
                let path = self
                    .key_file
                    .as_deref()
                    .ok_or_else(|| ConfigError::token("key_file is required for asymmetric algorithms"))?;
                let pem = std::fs::read(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                TrustedKeyMaterial::from_pem(algorithm, &pem)?
            }
        };

        let mut material = material
            .with_audience(self.audience.iter().cloned())
            .with_leeway(Duration::from_secs(self.leeway_secs))
            .with_max_token_bytes(self.max_token_bytes);
        if let Some(iss) = &self.issuer {
            material = material.with_issuer(iss.clone());
        }
        Ok(material)
    }
}

impl GuardConfig {
    /// Read and parse a YAML file. Env overrides are not applied.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loaded guard config");
        Ok(cfg)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Overlay `GATECHECK_*` variables onto the loaded file.
    pub fn apply_env(&mut self) {
        if let Ok(v) = env::var(ENV_PATH_BASE_DIR) {
            if v.trim().is_empty() {
                tracing::warn!(var = ENV_PATH_BASE_DIR, "empty value ignored");
            } else {
                self.path = Some(PathConfig {
                    base_dir: PathBuf::from(v.trim()),
                });
            }
        }

        if let Some(hosts) = env_list(ENV_REDIRECT_ALLOWED_HOSTS) {
            self.redirect.get_or_insert_with(Default::default).allowed_hosts = hosts;
        }

        if let Some(origins) = env_list(ENV_ORIGIN_ALLOWED) {
            self.origin.get_or_insert_with(Default::default).allowed_origins = origins;
        }

        if let Some(hosts) = env_list(ENV_OUTBOUND_ALLOWED_HOSTS) {
            self.outbound.get_or_insert_with(Default::default).allowed_hosts = hosts;
        }

        if let Ok(v) = env::var(ENV_TOKEN_ALGORITHM) {
            match self.token.as_mut() {
                Some(token) => token.algorithm = v.trim().to_string(),
                None => tracing::warn!(
                    var = ENV_TOKEN_ALGORITHM,
                    "ignored: no token section configured"
                ),
            }
        }
    }
}

fn env_list(var: &str) -> Option<Vec<String>> {
    let v = env::var(var).ok()?;
    Some(
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const SAMPLE: &str = r#"
path:
  base_dir: ./uploads
command:
  pattern: "^[a-z]+$"
  max_len: 16
redirect:
  allowed_hosts: [example.com, trusted-site.com]
origin:
  allowed_origins: ["https://good.test"]
outbound:
  allowed_hosts: [api.github.com]
token:
  algorithm: HS256
  secret_env: GATECHECK_TEST_SECRET
  audience: [gatecheck]
settings:
  theme: { type: choice, default: light, choices: [light, dark] }
"#;

    fn clear_env() {
        for var in [
            ENV_PATH_BASE_DIR,
            ENV_REDIRECT_ALLOWED_HOSTS,
            ENV_ORIGIN_ALLOWED,
            ENV_OUTBOUND_ALLOWED_HOSTS,
            ENV_TOKEN_ALGORITHM,
            "GATECHECK_TEST_SECRET",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn parses_all_sections() {
        let cfg = GuardConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(cfg.path.unwrap().base_dir, PathBuf::from("./uploads"));
        assert_eq!(cfg.command.unwrap().max_len, 16);
        assert_eq!(cfg.redirect.unwrap().allowed_hosts.len(), 2);
        let token = cfg.token.unwrap();
        assert_eq!(token.leeway_secs, 30);
        assert_eq!(token.max_token_bytes, 8192);
        assert_eq!(cfg.settings.unwrap().len(), 1);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(GuardConfig::from_yaml_str("").unwrap(), GuardConfig::default());
    }

    #[test]
    fn unknown_keys_are_errors() {
        assert!(GuardConfig::from_yaml_str("redirect: { allowed: [x] }").is_err());
        assert!(GuardConfig::from_yaml_str("cors: {}").is_err());
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(matches!(GuardConfig::load(&missing), Err(ConfigError::Read { .. })));

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "redirect: [").unwrap();
        assert!(matches!(GuardConfig::load(&bad), Err(ConfigError::Parse { .. })));

        let good = dir.path().join("good.yaml");
        std::fs::write(&good, SAMPLE).unwrap();
        assert!(GuardConfig::load(&good).is_ok());
    }

    #[test]
    #[serial]
    fn env_overrides() {
        clear_env();
        env::set_var(ENV_PATH_BASE_DIR, "/srv/files");
        env::set_var(ENV_REDIRECT_ALLOWED_HOSTS, "a.test, b.test,,");
        env::set_var(ENV_ORIGIN_ALLOWED, "https://x.test");
        env::set_var(ENV_TOKEN_ALGORITHM, "HS512");

        let mut cfg = GuardConfig::from_yaml_str(SAMPLE).unwrap();
        cfg.apply_env();
        clear_env();

        assert_eq!(cfg.path.unwrap().base_dir, PathBuf::from("/srv/files"));
        assert_eq!(
            cfg.redirect.unwrap().allowed_hosts,
            vec!["a.test".to_string(), "b.test".to_string()]
        );
        assert_eq!(cfg.origin.unwrap().allowed_origins, vec!["https://x.test"]);
        assert_eq!(cfg.outbound.unwrap().allowed_hosts, vec!["api.github.com"]);
        assert_eq!(cfg.token.unwrap().algorithm, "HS512");
    }

    #[test]
    #[serial]
    fn algorithm_override_without_token_section_is_ignored() {
        clear_env();
        env::set_var(ENV_TOKEN_ALGORITHM, "RS256");
        let mut cfg = GuardConfig::default();
        cfg.apply_env();
        clear_env();
        assert!(cfg.token.is_none());
    }

    #[test]
    #[serial]
    fn hmac_secret_comes_from_named_variable() {
        clear_env();
        let token = TokenConfig {
            secret_env: Some("GATECHECK_TEST_SECRET".to_string()),
            issuer: Some("https://auth.example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(token.key_material(), Err(ConfigError::Token { .. })));

        env::set_var("GATECHECK_TEST_SECRET", "0123456789abcdef0123456789abcdef");
        let material = token.key_material().unwrap();
        clear_env();
        assert_eq!(material.issuer(), Some("https://auth.example.com"));
        assert_eq!(material.leeway(), Duration::from_secs(30));
    }

    #[test]
    fn asymmetric_needs_key_file() {
        let token = TokenConfig {
            algorithm: "RS256".to_string(),
            ..Default::default()
        };
        assert!(matches!(token.key_material(), Err(ConfigError::Token { .. })));

        let none = TokenConfig {
            algorithm: "none".to_string(),
            ..Default::default()
        };
        assert!(none.key_material().is_err());
    }
}
