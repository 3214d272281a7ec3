//! Lexical analysis: classifies the raw source into tokens on demand.
//!
//! The scanner knows nothing about grammar or semantics – it hands the
//! translator one classified token per call. End-of-line is a significant
//! terminal here, not whitespace: statements and headers are terminated by
//! it. Malformed input never fails the scanner; it is reported through a
//! token of kind [`TokenKind::Error`] carrying the offending character.

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  // Special tokens
  Eof,
  Eol,
  Error,

  // Identifiers
  Identifier,
  GlobalIdentifier,

  // Literals
  IntLiteral,
  FloatLiteral,
  StringLiteral,
  MultilineStringLiteral,
  Null,

  // Keywords
  Class,
  If,
  Else,
  Is,
  Return,
  Var,
  While,
  Static,
  Import,
  For,
  Num,
  StringType,
  NullType,

  // Built-in namespace
  IfjNamespace,

  // Operators and punctuation
  Plus,
  Minus,
  Multiply,
  Divide,
  Assign,
  Less,
  Greater,
  LessEqual,
  GreaterEqual,
  Equal,
  NotEqual,
  LeftParen,
  RightParen,
  LeftBrace,
  RightBrace,
  Comma,
  Dot,
  Colon,
  Question,

  // Range operators (reserved by the language, unused by the grammar)
  RangeExclusive,
  RangeInclusive,

  // Boolean operators (reserved by the language, unused by the grammar)
  And,
  Or,
  Not,
}

impl TokenKind {
  /// Human-friendly description used in diagnostics.
  pub fn describe(self) -> &'static str {
    match self {
      Self::Eof => "end of file",
      Self::Eol => "end of line",
      Self::Identifier => "identifier",
      Self::StringLiteral => "string literal",
      Self::Class => "'class'",
      Self::Else => "'else'",
      Self::Import => "'import'",
      Self::For => "'for'",
      Self::IfjNamespace => "'Ifj'",
      Self::Assign => "'='",
      Self::LeftParen => "'('",
      Self::RightParen => "')'",
      Self::LeftBrace => "'{'",
      Self::RightBrace => "'}'",
      Self::Dot => "'.'",
      _ => "token",
    }
  }
}

/// One classified lexeme with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub value: Option<String>,
  pub line: u32,
  pub column: u32,
}

impl Token {
  pub fn new(kind: TokenKind, value: Option<String>, line: u32, column: u32) -> Self {
    Self {
      kind,
      value,
      line,
      column,
    }
  }
}

const KEYWORDS: &[(&str, TokenKind)] = &[
  ("class", TokenKind::Class),
  ("if", TokenKind::If),
  ("else", TokenKind::Else),
  ("is", TokenKind::Is),
  ("null", TokenKind::Null),
  ("return", TokenKind::Return),
  ("var", TokenKind::Var),
  ("while", TokenKind::While),
  ("Ifj", TokenKind::IfjNamespace),
  ("static", TokenKind::Static),
  ("import", TokenKind::Import),
  ("for", TokenKind::For),
  ("Num", TokenKind::Num),
  ("String", TokenKind::StringType),
  ("Null", TokenKind::NullType),
];

fn keyword_kind(spelling: &str) -> Option<TokenKind> {
  KEYWORDS
    .iter()
    .find(|(keyword, _)| *keyword == spelling)
    .map(|(_, kind)| *kind)
}

/// Character cursor over the source with line/column bookkeeping.
pub struct Scanner {
  chars: Vec<char>,
  next: usize,
  current: Option<char>,
  line: u32,
  column: u32,
}

impl Scanner {
  pub fn new(source: &str) -> Self {
    let mut scanner = Self {
      chars: source.chars().collect(),
      next: 0,
      current: None,
      line: 1,
      column: 0,
    };
    scanner.advance();
    scanner
  }

  fn advance(&mut self) -> Option<char> {
    self.current = self.chars.get(self.next).copied();
    self.next += 1;
    match self.current {
      Some('\n') => {
        self.line += 1;
        self.column = 0;
      }
      Some(_) => self.column += 1,
      None => {}
    }
    self.current
  }

  fn peek(&self) -> Option<char> {
    self.chars.get(self.next).copied()
  }

  fn peek2(&self) -> Option<char> {
    self.chars.get(self.next + 1).copied()
  }

  fn skip_whitespace(&mut self) {
    loop {
      while matches!(self.current, Some(c) if c.is_ascii_whitespace() && c != '\n') {
        self.advance();
      }

      if self.current != Some('/') {
        break;
      }
      match self.peek() {
        Some('/') => {
          // A line comment runs to the end of the line and swallows the
          // terminating newline, so no EOL token is produced for it.
          while self.current.is_some() && self.current != Some('\n') {
            self.advance();
          }
          if self.current == Some('\n') {
            self.advance();
          }
        }
        Some('*') => self.skip_block_comment(),
        _ => break,
      }
    }
  }

  /// Block comments nest.
  fn skip_block_comment(&mut self) {
    let mut nesting = 1;
    self.advance(); // skip '/'
    self.advance(); // skip '*'

    while nesting > 0 && self.current.is_some() {
      if self.current == Some('/') && self.peek() == Some('*') {
        nesting += 1;
        self.advance();
        self.advance();
      } else if self.current == Some('*') && self.peek() == Some('/') {
        nesting -= 1;
        self.advance();
        self.advance();
      } else {
        self.advance();
      }
    }
  }

  /// Produce the next token; the scanner is exhausted once it yields `Eof`
  /// and keeps yielding `Eof` afterwards.
  pub fn next_token(&mut self) -> Token {
    self.skip_whitespace();

    let (line, column) = (self.line, self.column);
    let Some(c) = self.current else {
      return Token::new(TokenKind::Eof, None, line, column);
    };

    if c.is_ascii_alphabetic() || c == '_' {
      return self.read_identifier();
    }
    if c.is_ascii_digit() {
      return self.read_number();
    }
    if c == '"' {
      return self.read_string();
    }

    match c {
      '\n' => {
        self.advance();
        Token::new(TokenKind::Eol, None, line, column)
      }
      '+' => self.single(TokenKind::Plus, line, column),
      '-' => self.single(TokenKind::Minus, line, column),
      '*' => self.single(TokenKind::Multiply, line, column),
      '/' => self.single(TokenKind::Divide, line, column),
      '(' => self.single(TokenKind::LeftParen, line, column),
      ')' => self.single(TokenKind::RightParen, line, column),
      '{' => self.single(TokenKind::LeftBrace, line, column),
      '}' => self.single(TokenKind::RightBrace, line, column),
      ',' => self.single(TokenKind::Comma, line, column),
      ':' => self.single(TokenKind::Colon, line, column),
      '?' => self.single(TokenKind::Question, line, column),
      '=' => self.one_or_two('=', TokenKind::Assign, TokenKind::Equal, line, column),
      '<' => self.one_or_two('=', TokenKind::Less, TokenKind::LessEqual, line, column),
      '>' => self.one_or_two('=', TokenKind::Greater, TokenKind::GreaterEqual, line, column),
      '!' => self.one_or_two('=', TokenKind::Not, TokenKind::NotEqual, line, column),
      '.' => {
        self.advance();
        if self.current == Some('.') && self.peek() == Some('.') {
          self.advance();
          self.advance();
          Token::new(TokenKind::RangeInclusive, None, line, column)
        } else if self.current == Some('.') {
          self.advance();
          Token::new(TokenKind::RangeExclusive, None, line, column)
        } else {
          Token::new(TokenKind::Dot, None, line, column)
        }
      }
      '&' if self.peek() == Some('&') => {
        self.advance();
        self.advance();
        Token::new(TokenKind::And, None, line, column)
      }
      '|' if self.peek() == Some('|') => {
        self.advance();
        self.advance();
        Token::new(TokenKind::Or, None, line, column)
      }
      other => {
        self.advance();
        Token::new(TokenKind::Error, Some(other.to_string()), line, column)
      }
    }
  }

  fn single(&mut self, kind: TokenKind, line: u32, column: u32) -> Token {
    self.advance();
    Token::new(kind, None, line, column)
  }

  fn one_or_two(
    &mut self,
    follow: char,
    short: TokenKind,
    long: TokenKind,
    line: u32,
    column: u32,
  ) -> Token {
    self.advance();
    if self.current == Some(follow) {
      self.advance();
      Token::new(long, None, line, column)
    } else {
      Token::new(short, None, line, column)
    }
  }

  fn read_identifier(&mut self) -> Token {
    let (line, column) = (self.line, self.column);
    let mut spelling = String::new();

    // Identifiers spelled with a leading double underscore address the
    // global frame and are a distinct terminal.
    let global = self.current == Some('_') && self.peek() == Some('_');

    while matches!(self.current, Some(c) if c.is_ascii_alphanumeric() || c == '_') {
      spelling.push(self.current.unwrap_or('\0'));
      self.advance();
    }

    if global {
      return Token::new(TokenKind::GlobalIdentifier, Some(spelling), line, column);
    }
    let kind = keyword_kind(&spelling).unwrap_or(TokenKind::Identifier);
    Token::new(kind, Some(spelling), line, column)
  }

  fn read_number(&mut self) -> Token {
    let (line, column) = (self.line, self.column);
    let mut spelling = String::new();
    let mut is_float = false;

    if self.current == Some('0') && matches!(self.peek(), Some('x') | Some('X')) {
      // Hexadecimal literal; the spelling keeps its prefix.
      spelling.push('0');
      self.advance();
      spelling.push(self.current.unwrap_or('x'));
      self.advance();
      while matches!(self.current, Some(c) if c.is_ascii_hexdigit()) {
        spelling.push(self.current.unwrap_or('0'));
        self.advance();
      }
    } else {
      while matches!(self.current, Some(c) if c.is_ascii_digit()) {
        spelling.push(self.current.unwrap_or('0'));
        self.advance();
      }

      if self.current == Some('.') {
        is_float = true;
        spelling.push('.');
        self.advance();
        while matches!(self.current, Some(c) if c.is_ascii_digit()) {
          spelling.push(self.current.unwrap_or('0'));
          self.advance();
        }
      }

      if matches!(self.current, Some('e') | Some('E')) {
        is_float = true;
        spelling.push(self.current.unwrap_or('e'));
        self.advance();
        if matches!(self.current, Some('+') | Some('-')) {
          spelling.push(self.current.unwrap_or('+'));
          self.advance();
        }
        while matches!(self.current, Some(c) if c.is_ascii_digit()) {
          spelling.push(self.current.unwrap_or('0'));
          self.advance();
        }
      }
    }

    let kind = if is_float {
      TokenKind::FloatLiteral
    } else {
      TokenKind::IntLiteral
    };
    Token::new(kind, Some(spelling), line, column)
  }

  fn read_escape_sequence(&mut self) -> char {
    self.advance(); // skip backslash
    match self.current {
      Some('n') => {
        self.advance();
        '\n'
      }
      Some('r') => {
        self.advance();
        '\r'
      }
      Some('t') => {
        self.advance();
        '\t'
      }
      Some('\\') => {
        self.advance();
        '\\'
      }
      Some('"') => {
        self.advance();
        '"'
      }
      Some('x') => {
        self.advance();
        let mut hex = String::new();
        for _ in 0..2 {
          match self.current {
            Some(c) if c.is_ascii_hexdigit() => {
              hex.push(c);
              self.advance();
            }
            _ => break,
          }
        }
        u8::from_str_radix(&hex, 16).unwrap_or(0) as char
      }
      Some(other) => {
        self.advance();
        other
      }
      None => '\0',
    }
  }

  fn read_string(&mut self) -> Token {
    let (line, column) = (self.line, self.column);
    let mut value = String::new();

    let multiline = self.peek() == Some('"') && self.peek2() == Some('"');
    if multiline {
      self.advance();
      self.advance();
      self.advance();
    } else {
      self.advance(); // skip opening quote
    }

    if multiline {
      // Multiline strings are exempt from escape processing.
      while self.current.is_some() {
        if self.current == Some('"') && self.peek() == Some('"') && self.peek2() == Some('"') {
          self.advance();
          self.advance();
          self.advance();
          break;
        }
        value.push(self.current.unwrap_or('\0'));
        self.advance();
      }
      return Token::new(TokenKind::MultilineStringLiteral, Some(value), line, column);
    }

    while self.current.is_some() && self.current != Some('"') {
      match self.current {
        Some('\\') => {
          let escaped = self.read_escape_sequence();
          value.push(escaped);
        }
        // A plain string cannot span lines.
        Some('\n') => break,
        Some(c) => {
          value.push(c);
          self.advance();
        }
        None => break,
      }
    }
    if self.current == Some('"') {
      self.advance(); // skip closing quote
    }

    Token::new(TokenKind::StringLiteral, Some(value), line, column)
  }
}
