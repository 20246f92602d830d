//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable so they can be evolved
//! independently:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic and semantic knowledge and returns a
//!   validated program with its symbol table.
//! - `codegen` lowers the program into Brainfuck for a byte-cell tape
//!   machine.
//! - `error` centralises the error taxonomy shared by the other stages.

pub mod error;
pub mod parser;
pub mod symbols;
pub mod tokenizer;

mod codegen;

pub use error::{CompileError, CompileResult};

/// Compile a source string into a Brainfuck program.
pub fn compile(source: &str) -> CompileResult<String> {
  let tokens = tokenizer::tokenize(source)?;
  let program = parser::parse(tokens, source)?;
  Ok(codegen::generate(&program))
}
