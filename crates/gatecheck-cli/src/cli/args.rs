use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gatecheck",
    version,
    about = "Check untrusted request values against request-boundary guards"
)]
pub struct Cli {
    /// Guard configuration (YAML). GATECHECK_* variables are applied on top.
    #[arg(long, global = true, env = "GATECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a filename inside path.base_dir
    Path(PathArgs),
    /// Validate a value bound for an external process
    Arg(ArgArgs),
    /// Merge a JSON settings object over the configured defaults
    Merge(InputArgs),
    /// Validate a post-login redirect target
    Redirect(InputArgs),
    /// Verify a bearer token
    Token(InputArgs),
    /// Decide a CORS request Origin
    Origin(InputArgs),
    /// Validate a URL the server would fetch
    Outbound(InputArgs),
    /// HTML-escape text
    Escape(InputArgs),
    /// Redact credentials from a log line
    Redact(RedactArgs),
    /// Validate or print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct InputArgs {
    #[arg(allow_hyphen_values = true)]
    pub input: String,
}

#[derive(Args, Debug)]
pub struct PathArgs {
    #[arg(allow_hyphen_values = true)]
    pub name: String,

    /// Bound on the existence check
    #[arg(long, default_value_t = 2000)]
    pub timeout_ms: u64,
}

#[derive(Args, Debug)]
pub struct ArgArgs {
    #[arg(allow_hyphen_values = true)]
    pub value: String,

    /// Program to lay the argument vector out for
    #[arg(long)]
    pub program: Option<String>,

    /// Fixed arguments placed before the value (repeatable)
    #[arg(long = "fixed", allow_hyphen_values = true, requires = "program")]
    pub fixed: Vec<String>,

    /// Run the prepared command and report its exit status
    #[arg(long, requires = "program")]
    pub exec: bool,
}

#[derive(Args, Debug)]
pub struct RedactArgs {
    #[arg(allow_hyphen_values = true)]
    pub input: String,

    /// Treat input as a card number and mask it
    #[arg(long, conflicts_with = "header")]
    pub card: bool,

    /// Treat input as a header name and report whether it is sensitive
    #[arg(long)]
    pub header: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigCmd {
    /// Build every configured guard and report what is active
    Check,
    /// Print the effective configuration as YAML
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn hyphen_values_are_positional() {
        let cli = Cli::try_parse_from(["gatecheck", "arg", "-oProxyCommand=x"]).unwrap();
        match cli.cmd {
            Command::Arg(a) => assert_eq!(a.value, "-oProxyCommand=x"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fixed_requires_program() {
        assert!(Cli::try_parse_from(["gatecheck", "arg", "x", "--fixed", "-c"]).is_err());
        let cli = Cli::try_parse_from([
            "gatecheck", "arg", "example.com", "--program", "ping", "--fixed", "-c", "--fixed", "1",
        ])
        .unwrap();
        match cli.cmd {
            Command::Arg(a) => assert_eq!(a.fixed, vec!["-c", "1"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["gatecheck", "escape", "<b>", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
