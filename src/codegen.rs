//! Code emission: the fixed IFJcode25 idioms appended while parsing.
//!
//! There is no separate lowering pass – the translator calls these routines
//! as a side effect of recognising each production, so every idiom must be
//! structurally correct the moment it is written. The emitter owns the
//! monotonic label and temporary counters; a name handed out once is never
//! reused for the life of the translation.

use std::io::{self, Write};

use crate::parser::{BinaryOp, RelOp, TypeName};

pub struct CodeGen<W: Write> {
  out: W,
  label_counter: u32,
  temp_counter: u32,
}

impl<W: Write> CodeGen<W> {
  pub fn new(out: W) -> Self {
    Self {
      out,
      label_counter: 0,
      temp_counter: 0,
    }
  }

  pub fn fresh_label(&mut self) -> String {
    let label = format!("label_{}", self.label_counter);
    self.label_counter += 1;
    label
  }

  fn fresh_temp(&mut self) -> String {
    let temp = format!("temp_{}", self.temp_counter);
    self.temp_counter += 1;
    temp
  }

  pub fn header(&mut self) -> io::Result<()> {
    writeln!(self.out, ".IFJcode25")
  }

  /// A frame is created and pushed before any user code runs.
  pub fn program_prolog(&mut self) -> io::Result<()> {
    writeln!(self.out, "CREATEFRAME")?;
    writeln!(self.out, "PUSHFRAME")
  }

  pub fn program_epilog(&mut self) -> io::Result<()> {
    writeln!(self.out, "CALL $main")?;
    writeln!(self.out, "EXIT int@0")
  }

  /// Callers push arguments left to right, so the last-declared parameter
  /// is on top of the stack: slots are declared and popped from last to
  /// first.
  pub fn function_prolog(&mut self, name: &str, param_count: usize) -> io::Result<()> {
    writeln!(self.out, "LABEL ${name}")?;
    writeln!(self.out, "CREATEFRAME")?;
    writeln!(self.out, "PUSHFRAME")?;
    for i in (0..param_count).rev() {
      writeln!(self.out, "DEFVAR LF@param{i}")?;
      writeln!(self.out, "POPS LF@param{i}")?;
    }
    Ok(())
  }

  /// Only the callable named `main` gets an implicit nil result; any other
  /// callable that returns without an explicit `return` leaves the stack
  /// alone.
  pub fn function_epilog(&mut self, implicit_nil: bool) -> io::Result<()> {
    if implicit_nil {
      writeln!(self.out, "PUSHS nil@nil")?;
    }
    writeln!(self.out, "POPFRAME")?;
    writeln!(self.out, "RETURN")
  }

  pub fn declare_local(&mut self, name: &str) -> io::Result<()> {
    writeln!(self.out, "DEFVAR LF@{name}")?;
    writeln!(self.out, "MOVE LF@{name} nil@nil")
  }

  pub fn store(&mut self, name: &str, global: bool) -> io::Result<()> {
    if global {
      writeln!(self.out, "POPS GF@{name}")
    } else {
      writeln!(self.out, "POPS LF@{name}")
    }
  }

  pub fn push_local(&mut self, name: &str) -> io::Result<()> {
    writeln!(self.out, "PUSHS LF@{name}")
  }

  pub fn push_global(&mut self, name: &str) -> io::Result<()> {
    writeln!(self.out, "PUSHS GF@{name}")
  }

  pub fn push_int(&mut self, spelling: &str) -> io::Result<()> {
    writeln!(self.out, "PUSHS int@{spelling}")
  }

  pub fn push_float(&mut self, spelling: &str) -> io::Result<()> {
    writeln!(self.out, "PUSHS float@{spelling}")
  }

  pub fn push_string(&mut self, value: &str) -> io::Result<()> {
    writeln!(self.out, "PUSHS string@{value}")
  }

  pub fn push_nil(&mut self) -> io::Result<()> {
    writeln!(self.out, "PUSHS nil@nil")
  }

  pub fn call(&mut self, name: &str, builtin: bool) -> io::Result<()> {
    if builtin {
      // Built-ins bypass user code entirely; the arguments stay on the
      // stack for the runtime shim.
      writeln!(self.out, "# Call to built-in function {name}")
    } else {
      writeln!(self.out, "CALL ${name}")
    }
  }

  pub fn arithmetic(&mut self, op: BinaryOp) -> io::Result<()> {
    match op {
      BinaryOp::Add => writeln!(self.out, "ADDS"),
      BinaryOp::Sub => writeln!(self.out, "SUBS"),
      BinaryOp::Mul => writeln!(self.out, "MULS"),
      BinaryOp::Div => writeln!(self.out, "DIVS"),
    }
  }

  /// Lower a relational operator against the two values on top of the
  /// stack. Only less-than and equality exist natively; the rest are
  /// synthesized, swapping operands through scratch slots where the operand
  /// order must be reversed first.
  pub fn relational(&mut self, op: RelOp) -> io::Result<()> {
    match op {
      RelOp::Eq => writeln!(self.out, "EQS"),
      RelOp::Ne => {
        writeln!(self.out, "EQS")?;
        writeln!(self.out, "NOTS")
      }
      RelOp::Lt => writeln!(self.out, "LTS"),
      RelOp::Gt => {
        // a > b  ==  b < a
        self.swap_operands()?;
        writeln!(self.out, "LTS")
      }
      RelOp::Le => {
        // a <= b  ==  !(b < a)
        self.swap_operands()?;
        writeln!(self.out, "LTS")?;
        writeln!(self.out, "NOTS")
      }
      RelOp::Ge => {
        // a >= b  ==  !(a < b)
        writeln!(self.out, "LTS")?;
        writeln!(self.out, "NOTS")
      }
    }
  }

  fn swap_operands(&mut self) -> io::Result<()> {
    let rhs = self.fresh_temp();
    let lhs = self.fresh_temp();
    writeln!(self.out, "POPS LF@{rhs}")?;
    writeln!(self.out, "POPS LF@{lhs}")?;
    writeln!(self.out, "PUSHS LF@{rhs}")?;
    writeln!(self.out, "PUSHS LF@{lhs}")
  }

  /// Runtime type test: compare the operand's type tag against the tag the
  /// type token stands for.
  pub fn type_test(&mut self, expected: TypeName) -> io::Result<()> {
    let value = self.fresh_temp();
    let ty = self.fresh_temp();
    writeln!(self.out, "POPS LF@{value}")?;
    writeln!(self.out, "TYPE LF@{ty} LF@{value}")?;
    let tag = match expected {
      TypeName::Num => "float",
      TypeName::Str => "string",
      TypeName::Null => "nil",
    };
    writeln!(self.out, "PUSHS string@{tag}")?;
    writeln!(self.out, "PUSHS LF@{ty}")?;
    writeln!(self.out, "EQS")
  }

  pub fn label(&mut self, label: &str) -> io::Result<()> {
    writeln!(self.out, "LABEL {label}")
  }

  pub fn jump(&mut self, label: &str) -> io::Result<()> {
    writeln!(self.out, "JUMP {label}")
  }

  /// Pop the condition into a scratch slot and branch when it is false.
  pub fn branch_if_false(&mut self, label: &str) -> io::Result<()> {
    let cond = self.fresh_temp();
    writeln!(self.out, "POPS LF@{cond}")?;
    writeln!(self.out, "JUMPIFEQ {label} LF@{cond} bool@false")
  }
}
