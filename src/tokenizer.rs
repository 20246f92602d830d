//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer is intentionally tiny – it knows nothing about semantics
//! beyond recognising keywords, identifiers, numbers and operators.
//! Multi-character operators are matched before single-character ones to
//! avoid ambiguity, and `#` comments are skipped like whitespace.

use log::debug;

use crate::error::{CompileError, CompileResult};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Var,
  Print,
  While,
  End,
  Ident,
  Num,
  /// `=`
  Assign,
  Plus,
  Minus,
  Star,
  Slash,
  /// `==`
  Eq,
  Gt,
  Lt,
  Ge,
  Le,
  Eof,
}

/// Thin wrapper for lexical information needed by later stages.
#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokenKind,
  pub loc: usize,
  pub len: usize,
  pub line: usize,
  pub value: Option<i64>,
}

impl Token {
  /// Convenience constructor to keep the `tokenize` loop readable.
  pub fn new(kind: TokenKind, loc: usize, len: usize, line: usize, value: Option<i64>) -> Self {
    Self {
      kind,
      loc,
      len,
      line,
      value,
    }
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;
  let mut line = 1;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      if c == b'\n' {
        line += 1;
      }
      i += 1;
      continue;
    }

    // A `#` comment runs to the end of the line; the newline itself is left
    // for the whitespace arm so line counting stays in one place.
    if c == b'#' {
      while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
      }
      continue;
    }

    if c.is_ascii_alphabetic() {
      let start = i;
      i += 1;
      while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
      }
      let kind = match &input[start..i] {
        "VAR" => TokenKind::Var,
        "PRINT" => TokenKind::Print,
        "WHILE" => TokenKind::While,
        "END" => TokenKind::End,
        _ => TokenKind::Ident,
      };
      tokens.push(Token::new(kind, start, i - start, line, None));
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      let text = &input[start..i];
      let value = text
        .parse::<i64>()
        .map_err(|err| CompileError::lex(line, format!("invalid number: {err}")))?;
      tokens.push(Token::new(TokenKind::Num, start, i - start, line, Some(value)));
      continue;
    }

    if let Some((op, kind)) = [
      ("==", TokenKind::Eq),
      (">=", TokenKind::Ge),
      ("<=", TokenKind::Le),
    ]
    .into_iter()
    .find(|(op, _)| input[i..].starts_with(op))
    {
      tokens.push(Token::new(kind, i, op.len(), line, None));
      i += op.len();
      continue;
    }

    let kind = match c {
      b'=' => Some(TokenKind::Assign),
      b'+' => Some(TokenKind::Plus),
      b'-' => Some(TokenKind::Minus),
      b'*' => Some(TokenKind::Star),
      b'/' => Some(TokenKind::Slash),
      b'>' => Some(TokenKind::Gt),
      b'<' => Some(TokenKind::Lt),
      _ => None,
    };
    if let Some(kind) = kind {
      tokens.push(Token::new(kind, i, 1, line, None));
      i += 1;
      continue;
    }

    let invalid_char = input[i..].chars().next().unwrap_or('\0');
    return Err(CompileError::lex(
      line,
      format!("unexpected character: '{invalid_char}'"),
    ));
  }

  tokens.push(Token::new(TokenKind::Eof, input.len(), 0, line, None));
  debug!("tokenized {} tokens", tokens.len());
  Ok(tokens)
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "EOF".to_string(),
      _ => token_text(t, source).to_string(),
    },
    None => "EOF".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input)
      .unwrap()
      .into_iter()
      .map(|t| t.kind)
      .collect()
  }

  #[test]
  fn keywords_and_identifiers() {
    assert_eq!(
      kinds("VAR x PRINT WHILE END"),
      vec![
        TokenKind::Var,
        TokenKind::Ident,
        TokenKind::Print,
        TokenKind::While,
        TokenKind::End,
        TokenKind::Eof,
      ]
    );
    // Maximal munch: a keyword prefix inside a longer word is an identifier.
    assert_eq!(kinds("VARx"), vec![TokenKind::Ident, TokenKind::Eof]);
    assert_eq!(kinds("var"), vec![TokenKind::Ident, TokenKind::Eof]);
  }

  #[test]
  fn greedy_operators() {
    assert_eq!(kinds("=="), vec![TokenKind::Eq, TokenKind::Eof]);
    assert_eq!(kinds(">="), vec![TokenKind::Ge, TokenKind::Eof]);
    assert_eq!(kinds("<="), vec![TokenKind::Le, TokenKind::Eof]);
    assert_eq!(
      kinds("= > <"),
      vec![
        TokenKind::Assign,
        TokenKind::Gt,
        TokenKind::Lt,
        TokenKind::Eof,
      ]
    );
    // `==` must not split into two `=`.
    assert_eq!(
      kinds("x == 1"),
      vec![
        TokenKind::Ident,
        TokenKind::Eq,
        TokenKind::Num,
        TokenKind::Eof,
      ]
    );
  }

  #[test]
  fn numbers_carry_values() {
    let tokens = tokenize("12 + 340").unwrap();
    assert_eq!(tokens[0].value, Some(12));
    assert_eq!(tokens[1].kind, TokenKind::Plus);
    assert_eq!(tokens[2].value, Some(340));
  }

  #[test]
  fn comments_and_whitespace_are_skipped() {
    assert_eq!(
      kinds("VAR x = 1 # the counter\n# full-line comment\nPRINT x"),
      vec![
        TokenKind::Var,
        TokenKind::Ident,
        TokenKind::Assign,
        TokenKind::Num,
        TokenKind::Print,
        TokenKind::Ident,
        TokenKind::Eof,
      ]
    );
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
    assert_eq!(kinds("   \n\t "), vec![TokenKind::Eof]);
  }

  #[test]
  fn lines_are_tracked() {
    let tokens = tokenize("VAR x = 1\nPRINT x\n\nEND").unwrap();
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[4].line, 2);
    assert_eq!(tokens[6].line, 4);
  }

  #[test]
  fn unexpected_character_is_a_lex_error() {
    let err = tokenize("VAR x = 1\nx = x ! 1").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("'!'"), "{message}");
    assert!(message.contains("line 2"), "{message}");
  }

  #[test]
  fn star_and_slash_are_lexed() {
    assert_eq!(
      kinds("* /"),
      vec![TokenKind::Star, TokenKind::Slash, TokenKind::Eof]
    );
  }

  #[test]
  fn token_text_recovers_the_lexeme() {
    let source = "VAR count = 42";
    let tokens = tokenize(source).unwrap();
    assert_eq!(token_text(&tokens[1], source), "count");
    assert_eq!(describe_token(Some(&tokens[3]), source), "42");
    assert_eq!(describe_token(tokens.last(), source), "EOF");
  }
}
