//! A small SQL engine over CSV files.
//!
//! One query of the form
//! `SELECT cols [WHERE expr] [ORDER BY keys] FROM tables` is tokenized, parsed, bound
//! against the FROM tables (each read from `<name>.csv`), run as a cross join with an
//! optional filter and sort, and written out as CSV.

pub mod analyzer;
pub mod ast;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod expression;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod table;
pub mod tuple;

use std::path::Path;

pub use engine::{Config, Engine, QueryResult};
pub use error::{Error, Result, ResultCode};

/// Runs `sql` against the CSV files in the working directory and writes the result to
/// `output_path`.
pub fn execute(sql: &str, output_path: impl AsRef<Path>) -> ResultCode {
    Engine::default().execute(sql, output_path.as_ref())
}
