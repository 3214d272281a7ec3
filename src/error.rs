//! Shared error utilities used across the translation pipeline.
//!
//! Every error class carries the numeric completion status the driver must
//! exit with, plus a message anchored at the source position where the
//! translator gave up. The first error constructed is the one reported –
//! productions propagate it with `?` and nothing ever overwrites it.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// Errors produced while translating a source program.
///
/// `ArgCount` and `TypeIncompatible` are reserved classes: argument-count
/// mismatches resolve through the arity-keyed symbol lookup and surface as
/// `Undefined`, and no type-compatibility check is performed at this layer.
#[derive(Debug, Snafu)]
pub enum CompileError {
  #[snafu(display("Error 1 at line {line}, column {column}: {message}"))]
  Lexical {
    message: String,
    line: u32,
    column: u32,
  },

  #[snafu(display("Error 2 at line {line}, column {column}: {message}"))]
  Syntax {
    message: String,
    line: u32,
    column: u32,
  },

  #[snafu(display("Error 3 at line {line}, column {column}: {message}"))]
  Undefined {
    message: String,
    line: u32,
    column: u32,
  },

  #[snafu(display("Error 4 at line {line}, column {column}: {message}"))]
  Redefinition {
    message: String,
    line: u32,
    column: u32,
  },

  #[snafu(display("Error 5 at line {line}, column {column}: {message}"))]
  ArgCount {
    message: String,
    line: u32,
    column: u32,
  },

  #[snafu(display("Error 6 at line {line}, column {column}: {message}"))]
  TypeIncompatible {
    message: String,
    line: u32,
    column: u32,
  },

  #[snafu(display("Error 10 at line {line}, column {column}: {message}"))]
  OtherSemantic {
    message: String,
    line: u32,
    column: u32,
  },

  #[snafu(display("Error 99: {message}"))]
  Internal { message: String },

  #[snafu(context(false), display("Error 99: failed to write target code: {source}"))]
  Output { source: std::io::Error },
}

impl CompileError {
  pub fn lexical(message: impl Into<String>, line: u32, column: u32) -> Self {
    Self::Lexical {
      message: message.into(),
      line,
      column,
    }
  }

  pub fn syntax(message: impl Into<String>, line: u32, column: u32) -> Self {
    Self::Syntax {
      message: message.into(),
      line,
      column,
    }
  }

  pub fn undefined(message: impl Into<String>, line: u32, column: u32) -> Self {
    Self::Undefined {
      message: message.into(),
      line,
      column,
    }
  }

  pub fn redefinition(message: impl Into<String>, line: u32, column: u32) -> Self {
    Self::Redefinition {
      message: message.into(),
      line,
      column,
    }
  }

  pub fn other_semantic(message: impl Into<String>, line: u32, column: u32) -> Self {
    Self::OtherSemantic {
      message: message.into(),
      line,
      column,
    }
  }

  pub fn internal(message: impl Into<String>) -> Self {
    Self::Internal {
      message: message.into(),
    }
  }

  /// The process completion status this error maps to.
  pub fn exit_code(&self) -> i32 {
    match self {
      Self::Lexical { .. } => 1,
      Self::Syntax { .. } => 2,
      Self::Undefined { .. } => 3,
      Self::Redefinition { .. } => 4,
      Self::ArgCount { .. } => 5,
      Self::TypeIncompatible { .. } => 6,
      Self::OtherSemantic { .. } => 10,
      Self::Internal { .. } | Self::Output { .. } => 99,
    }
  }
}
