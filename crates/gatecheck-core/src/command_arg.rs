//! Grammar guard for values handed to external processes.
//!
//! Accepted values are still passed as a single argv entry: [`PreparedCommand`]
//! builds a `tokio::process::Command` with discrete `.arg()` calls and never
//! goes through a shell, so metacharacters are never re-parsed.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Rejection, ValidationResult};

/// Hostname-like token: leading alphanumeric, then alphanumerics, dots and dashes.
pub const DEFAULT_ARG_PATTERN: &str = "[A-Za-z0-9][A-Za-z0-9.-]*";
pub const DEFAULT_MAX_ARG_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArgPolicy {
    /// Grammar the whole argument must match. It is always anchored at both ends.
    pub pattern: String,
    pub max_len: usize,
}

impl Default for ArgPolicy {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_ARG_PATTERN.to_string(),
            max_len: DEFAULT_MAX_ARG_LEN,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandArgGuard {
    grammar: Regex,
    max_len: usize,
}

impl CommandArgGuard {
    pub fn new(policy: ArgPolicy) -> Result<Self, ConfigError> {
        if policy.max_len == 0 {
            return Err(ConfigError::option("command.max_len", "must be positive"));
        }
        let grammar = Regex::new(&format!("^(?:{})$", policy.pattern))?;
        Ok(Self {
            grammar,
            max_len: policy.max_len,
        })
    }

    pub fn validate_arg(&self, input: &str) -> ValidationResult<String> {
        if input.is_empty() || input.len() > self.max_len || !self.grammar.is_match(input) {
            tracing::debug!(
                guard = "command_arg",
                reason = Rejection::InvalidArgument.code(),
                len = input.len(),
                "rejected"
            );
            return Err(Rejection::InvalidArgument);
        }
        Ok(input.to_string())
    }

    /// Validate `input` and lay out `program fixed_args... input` as an argv.
    pub fn prepare(
        &self,
        program: &str,
        fixed_args: &[&str],
        input: &str,
    ) -> ValidationResult<PreparedCommand> {
        let arg = self.validate_arg(input)?;
        let mut args: Vec<String> = fixed_args.iter().map(|a| a.to_string()).collect();
        args.push(arg);
        Ok(PreparedCommand {
            program: program.to_string(),
            args,
        })
    }
}

impl Default for CommandArgGuard {
    fn default() -> Self {
        Self {
            grammar: Regex::new(&format!("^(?:{DEFAULT_ARG_PATTERN})$"))
                .expect("default argument grammar compiles"),
            max_len: DEFAULT_MAX_ARG_LEN,
        }
    }
}

/// Validate against the default hostname-like grammar.
pub fn validate_arg(input: &str) -> ValidationResult<String> {
    CommandArgGuard::default().validate_arg(input)
}

/// Program plus argument vector; never a shell string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedCommand {
    program: String,
    args: Vec<String>,
}

impl PreparedCommand {
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Build the process without spawning it; the caller owns supervision.
    pub fn into_command(self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        for arg in &self.args {
            cmd.arg(arg);
        }
        cmd.stdin(std::process::Stdio::null()).kill_on_drop(true);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hostnames() {
        let g = CommandArgGuard::default();
        assert_eq!(g.validate_arg("example.com").unwrap(), "example.com");
        assert!(g.validate_arg("10.0.0.1").is_ok());
        assert!(g.validate_arg("a").is_ok());
        assert!(g.validate_arg("my-host.internal").is_ok());
    }

    #[test]
    fn rejects_shell_metacharacters() {
        let g = CommandArgGuard::default();
        for bad in [
            "example.com; rm -rf /",
            "example.com && id",
            "$(whoami)",
            "`id`",
            "a|b",
            "host\nid",
            "host name",
            "-oProxyCommand=x",
            ".hidden",
            "",
        ] {
            assert_eq!(g.validate_arg(bad), Err(Rejection::InvalidArgument), "{bad:?}");
        }
    }

    #[test]
    fn length_is_bounded() {
        let g = CommandArgGuard::default();
        assert!(g.validate_arg(&"a".repeat(255)).is_ok());
        assert_eq!(
            g.validate_arg(&"a".repeat(256)),
            Err(Rejection::InvalidArgument)
        );
    }

    #[test]
    fn custom_pattern_is_anchored() {
        let g = CommandArgGuard::new(ArgPolicy {
            pattern: "[0-9]+".to_string(),
            max_len: 8,
        })
        .unwrap();
        assert!(g.validate_arg("1234").is_ok());
        // Unanchored match inside the string must not pass.
        assert!(g.validate_arg("x1234").is_err());
        assert!(g.validate_arg("1234;").is_err());

        let anchored = CommandArgGuard::new(ArgPolicy {
            pattern: "^[0-9]+$".to_string(),
            max_len: 8,
        })
        .unwrap();
        assert!(anchored.validate_arg("42").is_ok());
    }

    #[test]
    fn escaped_dollar_is_kept_literal() {
        let g = CommandArgGuard::new(ArgPolicy {
            pattern: r"^[0-9]+\$$".to_string(),
            max_len: 8,
        })
        .unwrap();
        assert_eq!(g.validate_arg("12$").unwrap(), "12$");
        assert!(g.validate_arg("12").is_err());
    }

    #[test]
    fn unknown_policy_keys_are_refused() {
        assert!(serde_yaml::from_str::<ArgPolicy>("max-len: 10\n").is_err());
        let p: ArgPolicy = serde_yaml::from_str("max_len: 10\n").unwrap();
        assert_eq!(p.max_len, 10);
        assert_eq!(p.pattern, DEFAULT_ARG_PATTERN);
    }

    #[test]
    fn invalid_policy_is_config_error() {
        assert!(matches!(
            CommandArgGuard::new(ArgPolicy {
                pattern: "[".to_string(),
                max_len: 8
            }),
            Err(ConfigError::Pattern(_))
        ));
        assert!(CommandArgGuard::new(ArgPolicy {
            pattern: "a".to_string(),
            max_len: 0
        })
        .is_err());
    }

    #[test]
    fn prepare_builds_argv_with_input_last() {
        let g = CommandArgGuard::default();
        let cmd = g.prepare("ping", &["-c", "1"], "example.com").unwrap();
        assert_eq!(cmd.program(), "ping");
        assert_eq!(cmd.args(), &["-c", "1", "example.com"]);
        assert!(g.prepare("ping", &["-c", "1"], "x; id").is_err());

        let std_cmd = cmd.into_command();
        let argv: Vec<_> = std_cmd.as_std().get_args().collect();
        assert_eq!(argv.len(), 3);
    }
}
