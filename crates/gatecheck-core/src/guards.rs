//! The assembled guard set and its reload handle.

use std::sync::{Arc, PoisonError, RwLock};

use crate::command_arg::CommandArgGuard;
use crate::config::GuardConfig;
use crate::error::ConfigError;
use crate::merge::DefaultConfig;
use crate::origin::OriginPolicy;
use crate::outbound::{OutboundOptions, OutboundUrlGuard};
use crate::path_guard::PathGuard;
use crate::redirect::{RedirectGuard, RedirectOptions};
use crate::token::TokenVerifier;

/// One guard per boundary, built from a single [`GuardConfig`].
///
/// `path` and `token` need operator-supplied material and stay `None` when
/// their section is absent. The allow-list guards default to empty lists,
/// which reject every absolute target.
#[derive(Debug, Clone)]
pub struct GuardSet {
    path: Option<PathGuard>,
    command: CommandArgGuard,
    redirect: RedirectGuard,
    origin: OriginPolicy,
    outbound: OutboundUrlGuard,
    token: Option<TokenVerifier>,
    settings: DefaultConfig,
}

impl GuardSet {
    pub fn from_config(config: &GuardConfig) -> Result<Self, ConfigError> {
        let path = config
            .path
            .as_ref()
            .map(|p| PathGuard::new(&p.base_dir))
            .transpose()?;

        let command = match &config.command {
            Some(policy) => CommandArgGuard::new(policy.clone())?,
            None => CommandArgGuard::default(),
        };

        let redirect = match &config.redirect {
            Some(r) => RedirectGuard::new(
                &r.allowed_hosts,
                RedirectOptions {
                    require_https: r.require_https,
                },
            )?,
            None => RedirectGuard::new(Vec::<String>::new(), RedirectOptions::default())?,
        };

        let origin = match &config.origin {
            Some(o) => OriginPolicy::new(&o.allowed_origins)?,
            None => OriginPolicy::default(),
        };

        let outbound = match &config.outbound {
            Some(o) => OutboundUrlGuard::new(
                &o.allowed_hosts,
                OutboundOptions {
                    allow_http: o.allow_http,
                },
            )?,
            None => OutboundUrlGuard::new(Vec::<String>::new(), OutboundOptions::default())?,
        };

        let token = config
            .token
            .as_ref()
            .map(|t| t.key_material().map(TokenVerifier::new))
            .transpose()?;

        let settings = config
            .settings
            .clone()
            .unwrap_or_else(DefaultConfig::workshop_settings);

        tracing::info!(
            path = path.is_some(),
            token = token.is_some(),
            settings = settings.len(),
            "guard set built"
        );

        Ok(Self {
            path,
            command,
            redirect,
            origin,
            outbound,
            token,
            settings,
        })
    }

    pub fn path(&self) -> Result<&PathGuard, ConfigError> {
        self.path.as_ref().ok_or(ConfigError::Missing("path"))
    }

    pub fn command(&self) -> &CommandArgGuard {
        &self.command
    }

    pub fn redirect(&self) -> &RedirectGuard {
        &self.redirect
    }

    pub fn origin(&self) -> &OriginPolicy {
        &self.origin
    }

    pub fn outbound(&self) -> &OutboundUrlGuard {
        &self.outbound
    }

    pub fn token(&self) -> Result<&TokenVerifier, ConfigError> {
        self.token.as_ref().ok_or(ConfigError::Missing("token"))
    }

    pub fn settings(&self) -> &DefaultConfig {
        &self.settings
    }
}

/// Snapshot-on-read holder for a [`GuardSet`] that may be swapped at runtime.
#[derive(Debug)]
pub struct SharedGuards {
    inner: RwLock<Arc<GuardSet>>,
}

impl SharedGuards {
    pub fn new(set: GuardSet) -> Self {
        Self {
            inner: RwLock::new(Arc::new(set)),
        }
    }

    /// The current set. Callers keep using their snapshot across a reload.
    pub fn current(&self) -> Arc<GuardSet> {
        // The guarded value is a single Arc, so a poisoned lock still holds a whole set.
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install `set` and return the one it replaced.
    pub fn replace(&self, set: GuardSet) -> Arc<GuardSet> {
        let next = Arc::new(set);
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, next)
    }

    /// Build from `config` and swap in; on error the current set stays.
    pub fn reload(&self, config: &GuardConfig) -> Result<(), ConfigError> {
        let set = GuardSet::from_config(config)?;
        self.replace(set);
        tracing::info!("guard set reloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PathConfig, RedirectConfig};
    use std::thread;

    fn config_with_hosts(hosts: &[&str]) -> GuardConfig {
        GuardConfig {
            redirect: Some(RedirectConfig {
                allowed_hosts: hosts.iter().map(|h| h.to_string()).collect(),
                require_https: false,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_without_sections() {
        let set = GuardSet::from_config(&GuardConfig::default()).unwrap();
        assert!(matches!(set.path(), Err(ConfigError::Missing("path"))));
        assert!(matches!(set.token(), Err(ConfigError::Missing("token"))));
        assert!(set.redirect().validate("/home").is_ok());
        assert!(set.redirect().validate("https://example.com/").is_err());
        assert!(!set.origin().decide("https://good.test"));
        assert_eq!(set.settings(), &DefaultConfig::workshop_settings());
        assert!(set.command().validate_arg("example.com").is_ok());
    }

    #[test]
    fn first_config_error_wins() {
        let cfg = GuardConfig {
            path: Some(PathConfig {
                base_dir: "/definitely/not/here".into(),
            }),
            ..Default::default()
        };
        assert!(matches!(
            GuardSet::from_config(&cfg),
            Err(ConfigError::BaseDir { .. })
        ));
        assert!(GuardSet::from_config(&config_with_hosts(&["bad host"])).is_err());
    }

    #[test]
    fn replace_is_atomic_for_readers() {
        let shared = Arc::new(SharedGuards::new(
            GuardSet::from_config(&config_with_hosts(&["a.test"])).unwrap(),
        ));
        let before = shared.current();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snap = shared.current();
                        let a = snap.redirect().is_allowed_host("a.test");
                        let b = snap.redirect().is_allowed_host("b.test");
                        // Exactly one generation is visible per snapshot.
                        assert!(a ^ b);
                    }
                })
            })
            .collect();

        shared.replace(GuardSet::from_config(&config_with_hosts(&["b.test"])).unwrap());
        for r in readers {
            r.join().unwrap();
        }

        assert!(before.redirect().is_allowed_host("a.test"));
        assert!(shared.current().redirect().is_allowed_host("b.test"));
    }

    #[test]
    fn failed_reload_keeps_current() {
        let shared = SharedGuards::new(
            GuardSet::from_config(&config_with_hosts(&["a.test"])).unwrap(),
        );
        assert!(shared.reload(&config_with_hosts(&["bad host"])).is_err());
        assert!(shared.current().redirect().is_allowed_host("a.test"));
        shared.reload(&config_with_hosts(&["c.test"])).unwrap();
        assert!(shared.current().redirect().is_allowed_host("c.test"));
    }
}
