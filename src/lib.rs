//! Crate root: wires together the translation pipeline.
//!
//! The compiler is single-pass by design: `parser` pulls tokens from
//! `scanner` one at a time and drives `codegen` as a side effect of
//! recognising each production, with `symtable` backing the semantic
//! checks. There is no intermediate tree and no fix-up phase – instructions
//! are streamed to the output as they are produced, and any nonzero
//! completion status means the stream must be discarded.

pub mod error;
pub mod parser;
pub mod scanner;
pub mod symtable;

mod codegen;

pub use error::{CompileError, CompileResult};

use std::io::Write;

/// Translate a source program into stack-machine code, streaming the
/// instructions to `output`.
pub fn translate<W: Write>(source: &str, output: W) -> CompileResult<()> {
  let scanner = scanner::Scanner::new(source);
  let mut parser = parser::Parser::new(scanner, output);
  parser.parse_program()
}
