use std::io::{BufRead, Write};
use std::process::ExitCode;
use clap::Parser as ClapParser;
use rill_lang::{interpret, run_file, Config};
use rill_lang::interpreter::scope::{Scope, ScopeRef};

fn main() -> ExitCode {
    let config: Config = Config::parse();

    match config.script {
        Some(path) => match run_file(&path, config.verbose) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) if err.kind() == std::io::ErrorKind::InvalidData => ExitCode::FAILURE,
            Err(err) => {
                eprintln!("Error reading {}: {}", path.display(), err);
                ExitCode::FAILURE
            },
        },
        None => repl(),
    }
}

/// Interactive session state. One scope lives for the whole session, so
/// definitions from earlier lines stay visible. A bare `>>` switches to
/// multi-line mode, where lines accumulate until `<<` runs them as one
/// chunk; a bare `>` switches back without discarding the buffer; `exit`
/// ends a single-line session.
struct Session {
    scope: ScopeRef,
    buffer: String,
    multi_line: bool,
}

impl Session {
    fn new() -> Session {
        Session {
            scope: Scope::new_root(),
            buffer: String::new(),
            multi_line: false,
        }
    }

    fn prompt(&self) -> &'static str {
        if self.multi_line { ">> " } else { "> " }
    }

    /// Consumes one input line; returns `false` when the session ends.
    /// Mode-switch lines are always consumed as such, never buffered or
    /// interpreted.
    fn handle(&mut self, line: &str) -> bool {
        if line == ">>" {
            self.multi_line = true;
        } else if line == ">" {
            self.multi_line = false;
        } else if self.multi_line {
            if line == "<<" {
                let source = std::mem::take(&mut self.buffer);
                self.run(&source);
            } else {
                self.buffer.push_str(line);
                self.buffer.push('\n');
            }
        } else if line == "exit" {
            return false;
        } else {
            self.run(line);
        }

        true
    }

    fn run(&self, source: &str) {
        if let Err(err) = interpret(source, &self.scope) {
            eprintln!("{}", err);
        }
    }
}

fn repl() -> ExitCode {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut lines = stdin.lock().lines();

    let mut session = Session::new();

    loop {
        print!("{}", session.prompt());

        if stdout.flush().is_err() {
            break;
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            _ => break,
        };

        if !session.handle(line.trim_end_matches(['\n', '\r'])) {
            break;
        }
    }

    println!("== Bye ==");
    ExitCode::SUCCESS
}
