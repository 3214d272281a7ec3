//! The translator: a recursive-descent parser fused with code emission.
//!
//! No syntax tree is materialized – every production performs its semantic
//! checks against the symbol tables and appends target instructions the
//! moment it is recognised, so the emitted stream has to be right on first
//! pass. The grammar is LL(1) except for two spots that need one token of
//! lookahead with pushback: telling an assignment from a bare call
//! statement, and telling a call from a plain expression on the right-hand
//! side of `=`.

use std::io::Write;

use crate::codegen::CodeGen;
use crate::error::{CompileError, CompileResult};
use crate::scanner::{Scanner, Token, TokenKind};
use crate::symtable::{CallableKind, SymTable, Symbol, ValueType};

/// Callees spelled with this prefix are runtime built-ins and bypass the
/// symbol table.
const BUILTIN_PREFIX: &str = "Ifj.";

/// Binary arithmetic operators recognised by the expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
}

/// Relational operators; all are lowered through stack equality/less-than.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
  Eq,
  Ne,
  Lt,
  Gt,
  Le,
  Ge,
}

/// Type names usable on the right of `is`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
  Num,
  Str,
  Null,
}

fn relational_op(kind: TokenKind) -> Option<RelOp> {
  match kind {
    TokenKind::Equal => Some(RelOp::Eq),
    TokenKind::NotEqual => Some(RelOp::Ne),
    TokenKind::Less => Some(RelOp::Lt),
    TokenKind::Greater => Some(RelOp::Gt),
    TokenKind::LessEqual => Some(RelOp::Le),
    TokenKind::GreaterEqual => Some(RelOp::Ge),
    _ => None,
  }
}

fn type_name(kind: TokenKind) -> Option<TypeName> {
  match kind {
    TokenKind::Num => Some(TypeName::Num),
    TokenKind::StringType => Some(TypeName::Str),
    TokenKind::NullType => Some(TypeName::Null),
    _ => None,
  }
}

/// Translator state threaded through every production.
pub struct Parser<W: Write> {
  scanner: Scanner,
  token: Token,
  pushback: Option<Token>,
  globals: SymTable,
  locals: SymTable,
  r#gen: CodeGen<W>,
  current_function: Option<String>,
}

impl<W: Write> Parser<W> {
  pub fn new(scanner: Scanner, output: W) -> Self {
    Self {
      scanner,
      token: Token::new(TokenKind::Eof, None, 0, 0),
      pushback: None,
      globals: SymTable::new(),
      locals: SymTable::new(),
      r#gen: CodeGen::new(output),
      current_function: None,
    }
  }

  /// Translate one whole program:
  /// `program := prolog class '{' EOL function* '}'`.
  ///
  /// The target header and program prolog are emitted before the first
  /// token is read; on error the stream is left wherever translation
  /// stopped, and consumers must discard it.
  pub fn parse_program(&mut self) -> CompileResult<()> {
    self.r#gen.header()?;
    self.r#gen.program_prolog()?;

    self.advance()?;
    self.parse_prolog()?;
    self.parse_class()?;
    self.parse_function_definitions()?;
    self.program_epilog()
  }

  /// The epilog calls the entry point, so `main_0` must exist by now. The
  /// check is deliberately late: it only runs once the whole class body has
  /// translated.
  fn program_epilog(&mut self) -> CompileResult<()> {
    if self.globals.find("main_0").is_none() {
      return Err(self.undefined_error("entry point 'main' with no parameters is not defined"));
    }
    self.r#gen.program_epilog()?;
    Ok(())
  }

  fn advance(&mut self) -> CompileResult<()> {
    self.token = match self.pushback.take() {
      Some(token) => token,
      None => self.scanner.next_token(),
    };
    if self.token.kind == TokenKind::Error {
      let offending = self.token.value.clone().unwrap_or_default();
      return Err(CompileError::lexical(
        format!("invalid character '{offending}'"),
        self.token.line,
        self.token.column,
      ));
    }
    Ok(())
  }

  /// Rewind the one-token lookahead: `token` becomes current again and the
  /// in-flight token is replayed on the next advance.
  fn unread(&mut self, token: Token) {
    self.pushback = Some(std::mem::replace(&mut self.token, token));
  }

  fn expect(&mut self, kind: TokenKind) -> CompileResult<()> {
    if self.token.kind == kind {
      Ok(())
    } else {
      Err(self.syntax_error(format!(
        "expected {}, but got {}",
        kind.describe(),
        self.token.kind.describe()
      )))
    }
  }

  fn syntax_error(&self, message: impl Into<String>) -> CompileError {
    CompileError::syntax(message, self.token.line, self.token.column)
  }

  fn undefined_error(&self, message: impl Into<String>) -> CompileError {
    CompileError::undefined(message, self.token.line, self.token.column)
  }

  fn redefinition_error(&self, message: impl Into<String>) -> CompileError {
    CompileError::redefinition(message, self.token.line, self.token.column)
  }

  fn other_semantic_error(&self, message: impl Into<String>) -> CompileError {
    CompileError::other_semantic(message, self.token.line, self.token.column)
  }

  /// `import "ifj25" for Ifj` – the one mandated header line.
  fn parse_prolog(&mut self) -> CompileResult<()> {
    self.expect(TokenKind::Import)?;
    self.advance()?;

    self.expect(TokenKind::StringLiteral)?;
    if self.token.value.as_deref() != Some("ifj25") {
      return Err(self.syntax_error("expected \"ifj25\" in the import declaration"));
    }
    self.advance()?;

    self.expect(TokenKind::For)?;
    self.advance()?;
    self.expect(TokenKind::IfjNamespace)?;
    self.advance()?;
    self.expect(TokenKind::Eol)?;
    self.advance()
  }

  /// `class Program {` – the class name is mandated.
  fn parse_class(&mut self) -> CompileResult<()> {
    self.expect(TokenKind::Class)?;
    self.advance()?;

    self.expect(TokenKind::Identifier)?;
    if self.token.value.as_deref() != Some("Program") {
      return Err(self.syntax_error("expected 'Program' as the class name"));
    }
    self.advance()?;

    self.expect(TokenKind::LeftBrace)?;
    self.advance()?;
    self.expect(TokenKind::Eol)?;
    self.advance()
  }

  fn parse_function_definitions(&mut self) -> CompileResult<()> {
    while self.token.kind != TokenKind::RightBrace {
      match self.token.kind {
        TokenKind::Static => self.parse_function()?,
        TokenKind::Eol => self.advance()?,
        _ => {
          return Err(self.syntax_error("expected a function definition or the end of the class"));
        }
      }
    }
    self.advance()
  }

  /// One `static` member: a plain function, a getter (no parameter list at
  /// all) or a setter (`name = (param)`), distinguished by one token of
  /// lookahead after the name.
  fn parse_function(&mut self) -> CompileResult<()> {
    self.advance()?; // consume 'static'

    self.expect(TokenKind::Identifier)?;
    let name = self.token.value.clone().unwrap_or_default();
    let (line, column) = (self.token.line, self.token.column);
    self.advance()?;

    match self.token.kind {
      TokenKind::LeftBrace => self.parse_getter(name, line, column),
      TokenKind::Assign => self.parse_setter(name, line, column),
      _ => self.parse_plain_function(name, line, column),
    }
  }

  fn parse_plain_function(&mut self, name: String, line: u32, column: u32) -> CompileResult<()> {
    self.expect(TokenKind::LeftParen)?;
    self.advance()?;

    let mut params = Vec::new();
    if self.token.kind != TokenKind::RightParen {
      self.expect(TokenKind::Identifier)?;
      params.push(self.token.value.clone().unwrap_or_default());
      self.advance()?;
      while self.token.kind == TokenKind::Comma {
        self.advance()?;
        self.expect(TokenKind::Identifier)?;
        params.push(self.token.value.clone().unwrap_or_default());
        self.advance()?;
      }
    }
    self.expect(TokenKind::RightParen)?;
    self.advance()?;

    let arity = params.len();
    self.declare_callable(&name, CallableKind::Function, params, line, column)?;
    self.r#gen.function_prolog(&name, arity)?;
    self.enter_function(name);
    self.parse_block()?;
    self.finish_function()
  }

  /// A getter is an arity-0 callable; its body is a plain block.
  fn parse_getter(&mut self, name: String, line: u32, column: u32) -> CompileResult<()> {
    self.declare_callable(&name, CallableKind::Getter, Vec::new(), line, column)?;
    self.r#gen.function_prolog(&name, 0)?;
    self.enter_function(name);
    self.parse_block()?;
    self.finish_function()
  }

  /// A setter is an arity-1 callable; unlike plain function parameters its
  /// parameter is registered as a local variable before the body parses.
  fn parse_setter(&mut self, name: String, line: u32, column: u32) -> CompileResult<()> {
    self.advance()?; // consume '='

    self.expect(TokenKind::LeftParen)?;
    self.advance()?;
    self.expect(TokenKind::Identifier)?;
    let param = self.token.value.clone().unwrap_or_default();
    self.advance()?;
    self.expect(TokenKind::RightParen)?;
    self.advance()?;

    self.declare_callable(&name, CallableKind::Setter, vec![param.clone()], line, column)?;
    self.r#gen.function_prolog(&name, 1)?;
    self.enter_function(name);
    self.locals.insert(
      &param,
      Symbol::Variable {
        ty: ValueType::Null,
      },
    );
    self.parse_block()?;
    self.finish_function()
  }

  /// Callables are keyed `name_arity`: the same name at two arities is two
  /// symbols, the same name at the same arity is a redefinition.
  fn declare_callable(
    &mut self,
    name: &str,
    kind: CallableKind,
    params: Vec<String>,
    line: u32,
    column: u32,
  ) -> CompileResult<()> {
    let arity = params.len();
    let key = format!("{name}_{arity}");
    if self.globals.find(&key).is_some() {
      return Err(CompileError::redefinition(
        format!("'{name}' with {arity} parameter(s) is already defined"),
        line,
        column,
      ));
    }
    self.globals.insert(
      &key,
      Symbol::Callable {
        kind,
        arity,
        params,
      },
    );
    Ok(())
  }

  /// Local scope never survives a function boundary: the previous table is
  /// discarded wholesale, never merged.
  fn enter_function(&mut self, name: String) {
    self.current_function = Some(name);
    self.locals = SymTable::new();
  }

  fn finish_function(&mut self) -> CompileResult<()> {
    let implicit_nil = self.current_function.as_deref() == Some("main");
    self.r#gen.function_epilog(implicit_nil)?;
    self.current_function = None;
    Ok(())
  }

  /// `block := '{' EOL (statement EOL?)* '}'`; the EOL after a statement is
  /// required except immediately before the closing brace.
  fn parse_block(&mut self) -> CompileResult<()> {
    self.expect(TokenKind::LeftBrace)?;
    self.advance()?;
    self.expect(TokenKind::Eol)?;
    self.advance()?;

    while self.token.kind != TokenKind::RightBrace {
      self.parse_statement()?;
      if self.token.kind != TokenKind::RightBrace {
        self.expect(TokenKind::Eol)?;
        self.advance()?;
      }
    }
    self.advance()
  }

  fn parse_statement(&mut self) -> CompileResult<()> {
    match self.token.kind {
      TokenKind::Var => self.parse_var_declaration(),
      TokenKind::If => self.parse_if_statement(),
      TokenKind::While => self.parse_while_statement(),
      TokenKind::Return => self.parse_return(),
      TokenKind::Identifier | TokenKind::GlobalIdentifier => {
        let target = self.token.clone();
        self.advance()?;
        if self.token.kind == TokenKind::Assign {
          self.parse_assignment(target)
        } else {
          self.unread(target);
          Err(self.other_semantic_error("a function call must be assigned to a variable"))
        }
      }
      _ => Err(self.syntax_error("invalid statement")),
    }
  }

  /// `var id` – declares a local, initialized to nil in the emitted code.
  fn parse_var_declaration(&mut self) -> CompileResult<()> {
    self.advance()?; // consume 'var'

    self.expect(TokenKind::Identifier)?;
    let name = self.token.value.clone().unwrap_or_default();
    if self.locals.find(&name).is_some() {
      // Blocks do not open scopes: one function, one namespace of locals.
      return Err(self.redefinition_error(format!("variable '{name}' is already declared")));
    }
    self.locals.insert(
      &name,
      Symbol::Variable {
        ty: ValueType::Null,
      },
    );
    self.r#gen.declare_local(&name)?;
    self.advance()
  }

  /// `id = …` with the `=` already consumed by the statement lookahead.
  /// Locals must be declared before assignment; global-frame names spring
  /// into being on first write.
  fn parse_assignment(&mut self, target: Token) -> CompileResult<()> {
    let name = target.value.clone().unwrap_or_default();
    let global = target.kind == TokenKind::GlobalIdentifier;

    if !global && self.locals.find(&name).is_none() {
      return Err(CompileError::undefined(
        format!("undefined local variable '{name}'"),
        target.line,
        target.column,
      ));
    }

    self.advance()?; // step onto the first right-hand-side token

    match self.token.kind {
      TokenKind::Identifier => {
        // A call, or an expression starting with a variable: one token of
        // lookahead decides.
        let callee = self.token.clone();
        self.advance()?;
        if self.token.kind == TokenKind::LeftParen {
          let callee_name = callee.value.clone().unwrap_or_default();
          self.parse_function_call(&callee_name, callee.line, callee.column)?;
        } else {
          self.unread(callee);
          self.parse_expression()?;
        }
      }
      TokenKind::IfjNamespace => {
        let (line, column) = (self.token.line, self.token.column);
        self.advance()?;
        self.expect(TokenKind::Dot)?;
        self.advance()?;
        self.expect(TokenKind::Identifier)?;
        let callee_name = format!(
          "{BUILTIN_PREFIX}{}",
          self.token.value.clone().unwrap_or_default()
        );
        self.advance()?;
        self.parse_function_call(&callee_name, line, column)?;
      }
      _ => self.parse_expression()?,
    }

    self.r#gen.store(&name, global)?;
    Ok(())
  }

  /// Arguments are comma-separated expressions, each leaving its value on
  /// the stack in call order. Resolution is purely by `name_argCount` key –
  /// a wrong argument count is indistinguishable from an unknown function.
  fn parse_function_call(&mut self, name: &str, line: u32, column: u32) -> CompileResult<()> {
    self.expect(TokenKind::LeftParen)?;
    self.advance()?;

    let mut arg_count = 0;
    if self.token.kind != TokenKind::RightParen {
      self.parse_expression()?;
      arg_count += 1;
      while self.token.kind == TokenKind::Comma {
        self.advance()?;
        self.parse_expression()?;
        arg_count += 1;
      }
    }
    self.expect(TokenKind::RightParen)?;
    self.advance()?;

    let builtin = name.starts_with(BUILTIN_PREFIX);
    if !builtin {
      let key = format!("{name}_{arg_count}");
      if self.globals.find(&key).is_none() {
        return Err(CompileError::undefined(
          format!("function '{name}' taking {arg_count} argument(s) is not defined"),
          line,
          column,
        ));
      }
    }
    self.r#gen.call(name, builtin)?;
    Ok(())
  }

  /// `if (expr) block else block`; `else` is mandatory.
  fn parse_if_statement(&mut self) -> CompileResult<()> {
    let else_label = self.r#gen.fresh_label();
    let end_label = self.r#gen.fresh_label();

    self.advance()?; // consume 'if'
    self.expect(TokenKind::LeftParen)?;
    self.advance()?;
    self.parse_expression()?;
    self.r#gen.branch_if_false(&else_label)?;
    self.expect(TokenKind::RightParen)?;
    self.advance()?;

    self.parse_block()?;
    self.r#gen.jump(&end_label)?;
    self.r#gen.label(&else_label)?;

    self.expect(TokenKind::Else)?;
    self.advance()?;
    self.parse_block()?;
    self.r#gen.label(&end_label)?;
    Ok(())
  }

  fn parse_while_statement(&mut self) -> CompileResult<()> {
    let start_label = self.r#gen.fresh_label();
    let end_label = self.r#gen.fresh_label();

    self.r#gen.label(&start_label)?;
    self.advance()?; // consume 'while'
    self.expect(TokenKind::LeftParen)?;
    self.advance()?;
    self.parse_expression()?;
    self.r#gen.branch_if_false(&end_label)?;
    self.expect(TokenKind::RightParen)?;
    self.advance()?;

    self.parse_block()?;
    self.r#gen.jump(&start_label)?;
    self.r#gen.label(&end_label)?;
    Ok(())
  }

  /// `return expr` – the value stays on the stack for the caller.
  fn parse_return(&mut self) -> CompileResult<()> {
    self.advance()?;
    self.parse_expression()
  }

  fn parse_expression(&mut self) -> CompileResult<()> {
    self.parse_is_expression()
  }

  /// `is` binds loosest and applies at most once per expression.
  fn parse_is_expression(&mut self) -> CompileResult<()> {
    self.parse_relation()?;
    if self.token.kind == TokenKind::Is {
      self.advance()?;
      let Some(expected) = type_name(self.token.kind) else {
        return Err(self.syntax_error("expected a type name after 'is'"));
      };
      self.advance()?;
      self.r#gen.type_test(expected)?;
    }
    Ok(())
  }

  /// Consecutive relational operators are allowed at this level; each is
  /// lowered immediately against whatever the previous pass left on the
  /// stack.
  fn parse_relation(&mut self) -> CompileResult<()> {
    self.parse_simple_expression()?;
    while let Some(op) = relational_op(self.token.kind) {
      self.advance()?;
      self.parse_simple_expression()?;
      self.r#gen.relational(op)?;
    }
    Ok(())
  }

  fn parse_simple_expression(&mut self) -> CompileResult<()> {
    self.parse_term()?;
    loop {
      let op = match self.token.kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        _ => break,
      };
      self.advance()?;
      self.parse_term()?;
      self.r#gen.arithmetic(op)?;
    }
    Ok(())
  }

  fn parse_term(&mut self) -> CompileResult<()> {
    self.parse_factor()?;
    loop {
      let op = match self.token.kind {
        TokenKind::Multiply => BinaryOp::Mul,
        TokenKind::Divide => BinaryOp::Div,
        _ => break,
      };
      self.advance()?;
      self.parse_factor()?;
      self.r#gen.arithmetic(op)?;
    }
    Ok(())
  }

  /// Factors push exactly one value. Plain identifiers must already be
  /// declared locals; global identifiers always read (uninitialized globals
  /// are nil at runtime). Calls are not reachable from here – they only
  /// occur through the assignment path.
  fn parse_factor(&mut self) -> CompileResult<()> {
    match self.token.kind {
      TokenKind::Identifier => {
        let name = self.token.value.clone().unwrap_or_default();
        if self.locals.find(&name).is_none() {
          return Err(self.undefined_error(format!("undefined variable '{name}'")));
        }
        self.r#gen.push_local(&name)?;
        self.advance()
      }
      TokenKind::GlobalIdentifier => {
        let name = self.token.value.clone().unwrap_or_default();
        self.r#gen.push_global(&name)?;
        self.advance()
      }
      TokenKind::IntLiteral => {
        let spelling = self.token.value.clone().unwrap_or_default();
        self.r#gen.push_int(&spelling)?;
        self.advance()
      }
      TokenKind::FloatLiteral => {
        let spelling = self.token.value.clone().unwrap_or_default();
        self.r#gen.push_float(&spelling)?;
        self.advance()
      }
      TokenKind::StringLiteral => {
        let value = self.token.value.clone().unwrap_or_default();
        self.r#gen.push_string(&value)?;
        self.advance()
      }
      TokenKind::Null => {
        self.r#gen.push_nil()?;
        self.advance()
      }
      TokenKind::LeftParen => {
        self.advance()?;
        self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        self.advance()
      }
      _ => Err(self.syntax_error("invalid expression factor")),
    }
  }
}
