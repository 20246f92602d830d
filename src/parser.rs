//! Recursive-descent parser producing the program AST.
//!
//! The parser consumes tokens strictly left-to-right with one token of
//! lookahead and fails fast on the first mismatch – there is no recovery and
//! no partial AST. It also owns all semantic checking: declarations are
//! registered in the symbol table as they are parsed and every reference is
//! resolved immediately, so code generation never sees an invalid program.

use log::debug;

use crate::error::{CompileError, CompileResult};
use crate::symbols::SymbolTable;
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Binary operators with code generation support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
  Add,
  Sub,
}

/// Comparison operators allowed in a `WHILE` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
  Gt,
  Lt,
  Ge,
  Le,
  Eq,
}

/// Expression tree produced by the parser. The grammar admits at most one
/// binary operator, so `Binary` operands are always `Num` or `Var`.
#[derive(Debug, Clone)]
pub enum Expr {
  Num(u8),
  Var(char),
  Binary {
    op: BinOp,
    lhs: Box<Expr>,
    rhs: Box<Expr>,
  },
}

/// A `WHILE` head: one declared variable against one literal.
#[derive(Debug, Clone)]
pub struct Comparison {
  pub name: char,
  pub op: CmpOp,
  pub literal: u8,
}

#[derive(Debug, Clone)]
pub enum Stmt {
  VarDecl { name: char, init: Expr },
  Assign { name: char, value: Expr },
  Print { value: Expr },
  While { cond: Comparison, body: Vec<Stmt> },
}

/// A fully validated compilation unit: the statement list plus the symbol
/// table that maps every referenced variable to its tape cell.
#[derive(Debug)]
pub struct Program {
  pub stmts: Vec<Stmt>,
  pub symbols: SymbolTable,
}

/// Parse a token stream into a program, building the symbol table as
/// declarations are encountered.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Program> {
  let mut stream = TokenStream::new(tokens, source);
  let mut symbols = SymbolTable::new();
  let mut stmts = Vec::new();

  while !stream.is_eof() {
    stmts.push(parse_stmt(&mut stream, &mut symbols)?);
  }

  debug!("parsed {} statements, {} variables", stmts.len(), symbols.len());
  Ok(Program { stmts, symbols })
}

fn parse_stmt(stream: &mut TokenStream, symbols: &mut SymbolTable) -> CompileResult<Stmt> {
  match stream.current_kind() {
    TokenKind::Var => parse_var_decl(stream, symbols),
    TokenKind::Print => parse_print(stream, symbols),
    TokenKind::While => parse_while(stream, symbols),
    TokenKind::Ident => parse_assign(stream, symbols),
    _ => {
      let got = describe_token(stream.peek(), stream.source);
      Err(CompileError::syntax(
        stream.line(),
        format!("unexpected token \"{got}\""),
      ))
    }
  }
}

fn parse_var_decl(stream: &mut TokenStream, symbols: &mut SymbolTable) -> CompileResult<Stmt> {
  stream.expect(TokenKind::Var)?;
  let (text, line) = stream.get_ident()?;
  stream.expect(TokenKind::Assign)?;
  let init = parse_expr(stream, symbols)?;

  // Declare after the initialiser is parsed, so `VAR z = z` is rejected as
  // a reference to an undeclared variable.
  let (name, _) = symbols.declare(text, line)?;
  Ok(Stmt::VarDecl { name, init })
}

fn parse_assign(stream: &mut TokenStream, symbols: &mut SymbolTable) -> CompileResult<Stmt> {
  let (text, line) = stream.get_ident()?;
  let (name, _) = symbols.resolve(text, line)?;
  stream.expect(TokenKind::Assign)?;
  let value = parse_expr(stream, symbols)?;
  Ok(Stmt::Assign { name, value })
}

fn parse_print(stream: &mut TokenStream, symbols: &mut SymbolTable) -> CompileResult<Stmt> {
  stream.expect(TokenKind::Print)?;
  let value = parse_expr(stream, symbols)?;
  Ok(Stmt::Print { value })
}

fn parse_while(stream: &mut TokenStream, symbols: &mut SymbolTable) -> CompileResult<Stmt> {
  stream.expect(TokenKind::While)?;

  let (text, line) = stream.get_ident()?;
  let (name, _) = symbols.resolve(text, line)?;

  let op = match stream.current_kind() {
    TokenKind::Gt => CmpOp::Gt,
    TokenKind::Lt => CmpOp::Lt,
    TokenKind::Ge => CmpOp::Ge,
    TokenKind::Le => CmpOp::Le,
    TokenKind::Eq => CmpOp::Eq,
    _ => {
      let got = describe_token(stream.peek(), stream.source);
      return Err(CompileError::syntax(
        stream.line(),
        format!("expected a comparison operator, but got \"{got}\""),
      ));
    }
  };
  stream.advance();

  if stream.current_kind() == TokenKind::Ident {
    return Err(CompileError::semantic(
      stream.line(),
      "comparing two variables is not supported",
    ));
  }
  let (value, value_line) = stream.get_number()?;
  let literal = byte_literal(value, value_line)?;

  let mut body = Vec::new();
  while !stream.is_eof() && stream.current_kind() != TokenKind::End {
    body.push(parse_stmt(stream, symbols)?);
  }
  stream.expect(TokenKind::End)?;

  Ok(Stmt::While {
    cond: Comparison { name, op, literal },
    body,
  })
}

/// expr := term (("+" | "-") term)?
fn parse_expr(stream: &mut TokenStream, symbols: &mut SymbolTable) -> CompileResult<Expr> {
  let lhs = parse_term(stream, symbols)?;

  let op = match stream.current_kind() {
    TokenKind::Plus => BinOp::Add,
    TokenKind::Minus => BinOp::Sub,
    TokenKind::Star => {
      return Err(CompileError::semantic(
        stream.line(),
        "multiplication is not supported",
      ));
    }
    TokenKind::Slash => {
      return Err(CompileError::semantic(
        stream.line(),
        "division is not supported",
      ));
    }
    _ => return Ok(lhs),
  };
  stream.advance();

  let rhs = parse_term(stream, symbols)?;
  Ok(Expr::Binary {
    op,
    lhs: Box::new(lhs),
    rhs: Box::new(rhs),
  })
}

/// term := NUMBER | IDENT
fn parse_term(stream: &mut TokenStream, symbols: &mut SymbolTable) -> CompileResult<Expr> {
  match stream.current_kind() {
    TokenKind::Num => {
      let (value, line) = stream.get_number()?;
      Ok(Expr::Num(byte_literal(value, line)?))
    }
    TokenKind::Ident => {
      let (text, line) = stream.get_ident()?;
      let (name, _) = symbols.resolve(text, line)?;
      Ok(Expr::Var(name))
    }
    _ => {
      let got = describe_token(stream.peek(), stream.source);
      Err(CompileError::syntax(
        stream.line(),
        format!("expected a number or variable, but got \"{got}\""),
      ))
    }
  }
}

/// Target cells are single bytes, so every literal must fit one.
fn byte_literal(value: i64, line: usize) -> CompileResult<u8> {
  u8::try_from(value).map_err(|_| {
    CompileError::semantic(
      line,
      format!("number literal {value} does not fit in a byte cell (0-255)"),
    )
  })
}

/// Lightweight cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  /// Kind of the current token; the stream always ends with `Eof`, so a
  /// position past the end reads as `Eof` too.
  fn current_kind(&self) -> TokenKind {
    self.peek().map(|token| token.kind).unwrap_or(TokenKind::Eof)
  }

  /// Source line of the current token, for diagnostics.
  fn line(&self) -> usize {
    match self.peek() {
      Some(token) => token.line,
      None => self.tokens.last().map(|token| token.line).unwrap_or(1),
    }
  }

  fn advance(&mut self) {
    self.pos += 1;
  }

  /// Consume the current token, which must be of the given kind.
  fn expect(&mut self, kind: TokenKind) -> CompileResult<()> {
    if self.current_kind() == kind {
      self.advance();
      return Ok(());
    }
    let got = describe_token(self.peek(), self.source);
    Err(CompileError::syntax(
      self.line(),
      format!("expected \"{}\", but got \"{got}\"", kind_name(kind)),
    ))
  }

  /// Consume the current token as an integer literal.
  fn get_number(&mut self) -> CompileResult<(i64, usize)> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Num
    {
      let line = token.line;
      let value = token.value.ok_or_else(|| {
        CompileError::syntax(line, "internal error: numeric token missing value")
      })?;
      self.advance();
      return Ok((value, line));
    }

    let got = describe_token(self.peek(), self.source);
    Err(CompileError::syntax(
      self.line(),
      format!("expected a number, but got \"{got}\""),
    ))
  }

  /// Consume the current token as an identifier, returning its text.
  fn get_ident(&mut self) -> CompileResult<(&'a str, usize)> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Ident
    {
      let text = token_text(token, self.source);
      let line = token.line;
      self.advance();
      return Ok((text, line));
    }

    let got = describe_token(self.peek(), self.source);
    Err(CompileError::syntax(
      self.line(),
      format!("expected an identifier, but got \"{got}\""),
    ))
  }

  fn is_eof(&self) -> bool {
    self.current_kind() == TokenKind::Eof
  }
}

fn kind_name(kind: TokenKind) -> &'static str {
  match kind {
    TokenKind::Var => "VAR",
    TokenKind::Print => "PRINT",
    TokenKind::While => "WHILE",
    TokenKind::End => "END",
    TokenKind::Ident => "an identifier",
    TokenKind::Num => "a number",
    TokenKind::Assign => "=",
    TokenKind::Plus => "+",
    TokenKind::Minus => "-",
    TokenKind::Star => "*",
    TokenKind::Slash => "/",
    TokenKind::Eq => "==",
    TokenKind::Gt => ">",
    TokenKind::Lt => "<",
    TokenKind::Ge => ">=",
    TokenKind::Le => "<=",
    TokenKind::Eof => "EOF",
  }
}
