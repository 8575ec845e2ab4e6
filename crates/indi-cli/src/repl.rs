//! Interactive shell: line editing, history, keyword completion.

use std::borrow::Cow;

use anyhow::Result;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Editor, Helper};
use tracing::debug;

use indi_engine::{Indi, StoreName, Target};
use indi_lang::{Parser, Verb};

use crate::commands::{Command, CommandResult, HELP};
use crate::formatter::{self, OutputFormat};

const PROMPT: &str = "indi> ";
const HISTORY_FILE: &str = ".indi_history";

/// Rustyline helper: completes INDI keywords.
struct ReplHelper;

const KEYWORDS: &[&str] = &[
    "READ", "CREATE", "UPDATE", "DELETE", "IN", "ALL", "RECORDS", "FIELDS", "VALUES", "id",
];

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || c == '(')
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = line[start..pos].to_uppercase();
        let matches: Vec<Pair> = KEYWORDS
            .iter()
            .filter(|kw| !word.is_empty() && kw.to_uppercase().starts_with(&word))
            .map(|kw| Pair {
                display: (*kw).to_string(),
                replacement: (*kw).to_string(),
            })
            .collect();
        Ok((start, matches))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(&'s self, prompt: &'p str, _default: bool) -> Cow<'b, str> {
        Cow::Borrowed(prompt)
    }
}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}

/// The interactive shell.
pub struct Repl {
    editor: Editor<ReplHelper, DefaultHistory>,
    engine: Indi,
    format: OutputFormat,
    target: Option<StoreName>,
}

impl Repl {
    /// Build a shell over an open engine.
    pub fn new(engine: Indi, format: OutputFormat) -> Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(ReplHelper));
        let _ = editor.load_history(HISTORY_FILE);
        Ok(Self {
            editor,
            engine,
            format,
            target: None,
        })
    }

    /// Print the startup banner.
    pub fn print_banner(&self) {
        println!("INDI shell — one statement, every store.");
        println!(
            "Enabled stores: {}",
            self.engine
                .stores()
                .names()
                .iter()
                .map(StoreName::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("Type .help for commands.");
    }

    /// Read-eval-print until `.quit` or EOF.
    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(&line);
                    if self.dispatch(&line) == CommandResult::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }
        let _ = self.editor.save_history(HISTORY_FILE);
        Ok(())
    }

    fn dispatch(&mut self, line: &str) -> CommandResult {
        if line.starts_with('.') {
            return match Command::parse(line) {
                Ok(command) => self.run_command(command),
                Err(message) => {
                    eprintln!("{message}");
                    CommandResult::Continue
                }
            };
        }
        self.evaluate_and_print(line);
        CommandResult::Continue
    }

    fn run_command(&mut self, command: Command) -> CommandResult {
        match command {
            Command::Help => print!("{HELP}"),
            Command::Quit => return CommandResult::Exit,
            Command::Stats => {
                let stats = self.engine.cache_stats();
                println!(
                    "hits: {}  misses: {}  insertions: {}  evictions: {}",
                    stats.hits, stats.misses, stats.insertions, stats.evictions
                );
            }
            Command::Stores => {
                for name in self.engine.stores().names() {
                    println!("{name}");
                }
            }
            Command::Target(target) => {
                self.target = target;
                match target {
                    Some(name) => println!("targeting {name} (unchecked)"),
                    None => println!("targeting all stores (checked)"),
                }
            }
            Command::Format(format) => self.format = format,
            Command::Provision(path) => match std::fs::read_to_string(&path) {
                Ok(ddl) => {
                    if let Err(e) = self.engine.provision(&ddl) {
                        eprintln!("{e}");
                    }
                }
                Err(e) => eprintln!("cannot read {}: {e}", path.display()),
            },
        }
        CommandResult::Continue
    }

    /// Evaluate one INDI statement and print its result.
    pub fn evaluate_and_print(&self, text: &str) {
        debug!(statement = text, "evaluating");
        let target = match self.target {
            Some(name) => Target::Store(name),
            None => Target::All,
        };
        match self.engine.evaluate_on(text, target) {
            Ok(rows) => {
                let headers = read_headers(text);
                if rows.is_empty() {
                    println!("ok ({} rows)", rows.len());
                } else {
                    println!("{}", formatter::format_result(&headers, &rows, self.format));
                }
            }
            Err(e) => eprintln!("{e}"),
        }
    }
}

/// Field names of a READ statement, for result headers. Empty for anything
/// unparseable; evaluation reports the parse error itself.
fn read_headers(text: &str) -> Vec<String> {
    match Parser::parse(text) {
        Ok(statement) if statement.verb == Verb::Read => statement.fields,
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_headers_from_statement() {
        assert_eq!(
            read_headers("READ IN nonsense id 1 FIELDS (a, b)"),
            vec!["a", "b"]
        );
        assert!(read_headers("DELETE IN nonsense id 1").is_empty());
        assert!(read_headers("garbage").is_empty());
    }
}
