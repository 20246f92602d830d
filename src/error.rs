//! Shared error utilities used across the compilation pipeline.
//!
//! Every failure is fatal: compilation either produces a complete program or
//! one of these errors, never partial output. The three variants mirror the
//! three places a program can be rejected – the character level, the grammar
//! level, and the meaning level.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
pub enum CompileError {
  #[snafu(display("lex error at line {line}: {message}"))]
  Lex { message: String, line: usize },

  #[snafu(display("syntax error at line {line}: {message}"))]
  Syntax { message: String, line: usize },

  #[snafu(display("semantic error at line {line}: {message}"))]
  Semantic { message: String, line: usize },
}

impl CompileError {
  /// An unrecognised character or malformed literal.
  pub fn lex(line: usize, message: impl Into<String>) -> Self {
    Self::Lex {
      message: message.into(),
      line,
    }
  }

  /// A token sequence that does not match the grammar.
  pub fn syntax(line: usize, message: impl Into<String>) -> Self {
    Self::Syntax {
      message: message.into(),
      line,
    }
  }

  /// A well-formed construct the language rejects: undeclared or redeclared
  /// variables, names longer than one character, unsupported operators.
  pub fn semantic(line: usize, message: impl Into<String>) -> Self {
    Self::Semantic {
      message: message.into(),
      line,
    }
  }
}
