//! Shell meta-commands (lines starting with `.`).

use std::path::PathBuf;

use indi_engine::StoreName;

use crate::formatter::OutputFormat;

/// A parsed meta-command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `.help`
    Help,
    /// `.quit` / `.exit`
    Quit,
    /// `.stats` — print cache counters.
    Stats,
    /// `.stores` — list enabled stores.
    Stores,
    /// `.store <name>` / `.store all` — switch the execution target.
    Target(Option<StoreName>),
    /// `.format <table|json|raw>`
    Format(OutputFormat),
    /// `.provision <file>` — run a DDL batch against the relational store.
    Provision(PathBuf),
}

/// Outcome of a meta-command for the REPL loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// Keep reading input.
    Continue,
    /// Leave the shell.
    Exit,
}

impl Command {
    /// Parse a `.`-prefixed line; `Err` holds a message for the user.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let head = parts.next().unwrap_or_default();
        match head {
            ".help" | ".h" => Ok(Self::Help),
            ".quit" | ".exit" | ".q" => Ok(Self::Quit),
            ".stats" => Ok(Self::Stats),
            ".stores" => Ok(Self::Stores),
            ".store" => match parts.next() {
                None => Err("usage: .store <name|all>".to_string()),
                Some("all") => Ok(Self::Target(None)),
                Some(name) => name
                    .parse::<StoreName>()
                    .map(|n| Self::Target(Some(n)))
                    .map_err(|e| e.to_string()),
            },
            ".format" => match parts.next() {
                Some("table") => Ok(Self::Format(OutputFormat::Table)),
                Some("json") => Ok(Self::Format(OutputFormat::Json)),
                Some("raw") => Ok(Self::Format(OutputFormat::Raw)),
                _ => Err("usage: .format <table|json|raw>".to_string()),
            },
            ".provision" => match parts.next() {
                Some(path) => Ok(Self::Provision(PathBuf::from(path))),
                None => Err("usage: .provision <file>".to_string()),
            },
            other => Err(format!("unknown command '{other}', try .help")),
        }
    }
}

/// The `.help` text.
pub const HELP: &str = "\
INDI shell commands:
  .help                 show this help
  .quit                 exit the shell
  .stats                print query cache counters
  .stores               list enabled stores
  .store <name|all>     target one store (unchecked) or all (checked)
  .format <table|json|raw>
  .provision <file>     run a DDL batch against the relational store

Anything else is evaluated as an INDI statement, e.g.:
  CREATE IN nonsense FIELDS (a, b, c) VALUES (\"big\", \"scare\", \"today\")
  READ IN nonsense id 1 FIELDS (a, b, c)
";
