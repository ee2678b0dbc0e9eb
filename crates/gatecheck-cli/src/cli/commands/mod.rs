use gatecheck_core::GuardSet;

use super::args::{Cli, Command};

pub mod check;
pub mod config;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let cfg = config::load(cli.config.as_deref())?;
    let guards = || GuardSet::from_config(&cfg);

    let report = match cli.cmd {
        Command::Config(args) => return config::run(args.cmd, &cfg),
        Command::Path(a) => check::path(&guards()?, a).await?,
        Command::Arg(a) => check::arg(&guards()?, a).await?,
        Command::Merge(a) => check::merge(&guards()?, &a),
        Command::Redirect(a) => check::redirect(&guards()?, &a),
        Command::Token(a) => check::token(&guards()?, &a)?,
        Command::Origin(a) => check::origin(&guards()?, &a),
        Command::Outbound(a) => check::outbound(&guards()?, &a),
        Command::Escape(a) => check::escape(&a),
        Command::Redact(a) => check::redact_line(&a),
    };
    report.emit()
}
