//! One handler per guard, each producing a single [`Report`].

use std::time::Duration;

use gatecheck_core::{escape_html, is_sensitive_header, mask_card, redact, GuardSet};
use serde_json::{json, Value};

use crate::cli::args::{ArgArgs, InputArgs, PathArgs, RedactArgs};
use crate::cli::output::Report;

pub fn redirect(guards: &GuardSet, a: &InputArgs) -> Report {
    Report::from_result(
        "redirect",
        guards.redirect().validate(&a.input).map(Value::String),
    )
}

pub fn token(guards: &GuardSet, a: &InputArgs) -> anyhow::Result<Report> {
    Ok(match guards.token()?.verify(&a.input) {
        Ok(claims) => Report::accepted("token", serde_json::to_value(claims)?),
        Err(r) => Report::rejected("token", r),
    })
}

pub fn outbound(guards: &GuardSet, a: &InputArgs) -> Report {
    Report::from_result(
        "outbound",
        guards
            .outbound()
            .validate(&a.input)
            .map(|u| Value::String(u.into())),
    )
}

pub fn escape(a: &InputArgs) -> Report {
    Report::accepted("escape", Value::String(escape_html(&a.input).into_owned()))
}

pub async fn path(guards: &GuardSet, a: PathArgs) -> anyhow::Result<Report> {
    let guard = guards.path()?;
    let resolved = guard
        .resolve_within(&a.name, Duration::from_millis(a.timeout_ms))
        .await
        .map(|p| Value::String(p.display().to_string()));
    Ok(Report::from_result("path", resolved))
}

pub async fn arg(guards: &GuardSet, a: ArgArgs) -> anyhow::Result<Report> {
    let guard = guards.command();
    let Some(program) = a.program.as_deref() else {
        return Ok(Report::from_result(
            "arg",
            guard.validate_arg(&a.value).map(Value::String),
        ));
    };

    let fixed: Vec<&str> = a.fixed.iter().map(String::as_str).collect();
    let prepared = match guard.prepare(program, &fixed, &a.value) {
        Ok(p) => p,
        Err(r) => return Ok(Report::rejected("arg", r)),
    };

    let mut argv = vec![prepared.program().to_string()];
    argv.extend(prepared.args().iter().cloned());
    if !a.exec {
        return Ok(Report::accepted("arg", json!(argv)));
    }

    let status = prepared.into_command().status().await?;
    Ok(Report::accepted(
        "arg",
        json!({"argv": argv, "status": status.code()}),
    ))
}

pub fn merge(guards: &GuardSet, a: &InputArgs) -> Report {
    let candidate = serde_json::from_str::<Value>(&a.input).unwrap_or_else(|_| {
        tracing::debug!(guard = "merge", reason = "NOT_JSON", "using defaults");
        Value::Null
    });
    Report::accepted("merge", Value::Object(guards.settings().merge(&candidate)))
}

pub fn origin(guards: &GuardSet, a: &InputArgs) -> Report {
    let policy = guards.origin();
    let allowed = policy.decide(&a.input);
    let headers: Vec<Value> = policy
        .response_headers(Some(&a.input))
        .into_iter()
        .map(|(name, value)| json!([name, value]))
        .collect();
    Report {
        guard: "origin",
        accepted: allowed,
        value: Some(json!({ "headers": headers })),
        reason_code: (!allowed).then_some("ORIGIN_NOT_ALLOWED"),
    }
}

pub fn redact_line(a: &RedactArgs) -> Report {
    let value = if a.card {
        Value::String(mask_card(&a.input))
    } else if a.header {
        json!({ "sensitive": is_sensitive_header(&a.input) })
    } else {
        Value::String(redact(&a.input).into_owned())
    };
    Report::accepted("redact", value)
}
