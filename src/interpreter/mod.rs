pub mod lexer;
pub mod ast;
pub mod parser;
pub mod value;
pub mod scope;
pub mod evaluator;
