use std::path::Path;

use anyhow::Context;
use gatecheck_core::{GuardConfig, GuardSet};
use serde_json::json;

use crate::cli::args::ConfigCmd;
use crate::cli::output::Report;
use crate::exit_codes::ACCEPTED;

/// File (if any) with `GATECHECK_*` overrides applied.
pub fn load(path: Option<&Path>) -> anyhow::Result<GuardConfig> {
    let mut cfg = match path {
        Some(p) => GuardConfig::load(p)?,
        None => {
            tracing::debug!("no config file given; using defaults");
            GuardConfig::default()
        }
    };
    cfg.apply_env();
    Ok(cfg)
}

pub fn run(cmd: ConfigCmd, cfg: &GuardConfig) -> anyhow::Result<i32> {
    match cmd {
        ConfigCmd::Check => check(cfg),
        ConfigCmd::Show => show(cfg),
    }
}

fn check(cfg: &GuardConfig) -> anyhow::Result<i32> {
    let set = GuardSet::from_config(cfg)?;
    let summary = json!({
        "path": set.path().ok().map(|p| p.base_dir().display().to_string()),
        "token": set.token().ok().map(|t| format!("{:?}", t.algorithm())),
        "redirect_hosts": cfg.redirect.as_ref().map_or(0, |r| r.allowed_hosts.len()),
        "origins": set.origin().allowed().collect::<Vec<_>>(),
        "outbound_hosts": cfg.outbound.as_ref().map_or(0, |o| o.allowed_hosts.len()),
        "settings": set.settings().keys().collect::<Vec<_>>(),
    });
    Report::accepted("config", summary).emit()
}

fn show(cfg: &GuardConfig) -> anyhow::Result<i32> {
    let yaml = cfg.to_yaml().context("failed to serialize config")?;
    print!("{yaml}");
    Ok(ACCEPTED)
}
