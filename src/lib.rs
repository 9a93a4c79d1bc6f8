pub mod util;
pub mod interpreter;

use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use clap::Parser as ClapParser;
use crate::interpreter::evaluator::{self, RuntimeError};
use crate::interpreter::lexer::{self, LexerError};
use crate::interpreter::parser::{self, ParseError};
use crate::interpreter::scope::{Scope, ScopeRef};

#[derive(ClapParser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Config {
    #[clap(help = "Script file to run; starts an interactive session when omitted")]
    pub script: Option<PathBuf>,

    #[clap(short, long, help = "Print verbose log output")]
    pub verbose: bool,
}

/// Any fault a piece of source can produce, from scanning through
/// execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptError {
    Lex(LexerError),
    Parse(ParseError),
    Runtime(RuntimeError),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptError::Lex(err) => write!(f, "Lexing error: {}", err),
            ScriptError::Parse(err) => write!(f, "Parsing error: {}", err),
            ScriptError::Runtime(err) => write!(f, "Runtime error: {}", err),
        }
    }
}

impl From<LexerError> for ScriptError {
    fn from(err: LexerError) -> ScriptError {
        ScriptError::Lex(err)
    }
}

impl From<ParseError> for ScriptError {
    fn from(err: ParseError) -> ScriptError {
        ScriptError::Parse(err)
    }
}

impl From<RuntimeError> for ScriptError {
    fn from(err: RuntimeError) -> ScriptError {
        ScriptError::Runtime(err)
    }
}

/// Runs a chunk of source text against the given scope. Declarations
/// persist in the scope afterwards, so repeated calls against the same
/// scope build on each other.
pub fn interpret(source: &str, scope: &ScopeRef) -> Result<(), ScriptError> {
    let tokens = lexer::tokenize(source)?;
    let program = parser::parse(tokens)?;
    evaluator::execute(&program, scope)?;

    Ok(())
}

pub fn run_file(path: &PathBuf, verbose: bool) -> Result<(), std::io::Error> {
    let source = std::fs::read_to_string(path)?;

    let tokens = match lexer::tokenize(&source) {
        Ok(tokens) => tokens,
        Err(err) => {
            eprintln!("Lexing error: {}", err);
            return Err(std::io::Error::from(std::io::ErrorKind::InvalidData));
        },
    };

    let program = match parser::parse(tokens) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("Parsing error: {}", err);
            return Err(std::io::Error::from(std::io::ErrorKind::InvalidData));
        },
    };

    if verbose {
        println!("{:#?}", program.statements);
    }

    let scope = Scope::new_root();

    if let Err(err) = evaluator::execute(&program, &scope) {
        eprintln!("Runtime error: {}", err);
        return Err(std::io::Error::from(std::io::ErrorKind::InvalidData));
    }

    Ok(())
}
