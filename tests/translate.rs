//! End-to-end translation tests driven through the public API.

use rifjc::{CompileError, translate};

/// Translate `source`, returning the outcome together with whatever was
/// streamed to the output before translation stopped.
fn compile(source: &str) -> (Result<(), CompileError>, String) {
  let mut out = Vec::new();
  let result = translate(source, &mut out);
  let code = String::from_utf8(out).expect("target code is UTF-8");
  (result, code)
}

fn compile_ok(source: &str) -> String {
  let (result, code) = compile(source);
  if let Err(err) = result {
    panic!("translation failed: {err}\nemitted so far:\n{code}");
  }
  code
}

fn completion_status(source: &str) -> i32 {
  match compile(source).0 {
    Ok(()) => 0,
    Err(err) => err.exit_code(),
  }
}

/// Wrap function definitions in the mandatory prolog and class header.
fn program(functions: &str) -> String {
  format!("import \"ifj25\" for Ifj\nclass Program {{\n{functions}\n}}\n")
}

#[test]
fn translates_minimal_program() {
  let source = "import \"ifj25\" for Ifj\nclass Program {\nstatic main() {\nvar x\nx = 1\nreturn x\n}\n}";
  let code = compile_ok(source);
  let expected = "\
.IFJcode25
CREATEFRAME
PUSHFRAME
LABEL $main
CREATEFRAME
PUSHFRAME
DEFVAR LF@x
MOVE LF@x nil@nil
PUSHS int@1
POPS LF@x
PUSHS LF@x
PUSHS nil@nil
POPFRAME
RETURN
CALL $main
EXIT int@0
";
  assert_eq!(code, expected);
}

#[test]
fn same_name_at_two_arities_declares_two_symbols() {
  let source = program(
    "static f() {\nreturn null\n}\n\
     static f(a) {\nreturn null\n}\n\
     static main() {\nvar x\nx = f()\nx = f(1)\nreturn x\n}",
  );
  compile_ok(&source);
}

#[test]
fn same_name_and_arity_is_a_redefinition() {
  let source = program(
    "static f(a) {\nreturn null\n}\n\
     static f(b) {\nreturn null\n}\n\
     static main() {\nreturn null\n}",
  );
  assert_eq!(completion_status(&source), 4);
}

#[test]
fn wrong_argument_count_resolves_to_undefined() {
  let source = program(
    "static f(a) {\nreturn null\n}\n\
     static main() {\nvar x\nx = f()\nreturn x\n}",
  );
  assert_eq!(completion_status(&source), 3);
}

#[test]
fn locals_do_not_survive_function_boundaries() {
  // `v` is declared in `first` with the same name and order, but `second`
  // starts from a fresh local table.
  let assign = program(
    "static first() {\nvar v\nv = 1\nreturn v\n}\n\
     static second() {\nv = 2\nreturn null\n}",
  );
  assert_eq!(completion_status(&assign), 3);

  let read = program(
    "static first() {\nvar v\nv = 1\nreturn v\n}\n\
     static second() {\nreturn v\n}",
  );
  assert_eq!(completion_status(&read), 3);
}

#[test]
fn parameter_slots_pop_in_reverse_declaration_order() {
  let source = program(
    "static pair(a, b) {\nreturn null\n}\n\
     static main() {\nvar x\nx = pair(1, 2)\nreturn x\n}",
  );
  let code = compile_ok(&source);
  // Arguments are pushed left to right, so the second parameter is bound
  // first from the top of the stack.
  assert!(
    code.contains(
      "LABEL $pair\nCREATEFRAME\nPUSHFRAME\n\
       DEFVAR LF@param1\nPOPS LF@param1\n\
       DEFVAR LF@param0\nPOPS LF@param0\n"
    ),
    "unexpected prolog:\n{code}"
  );
  // The call site pushes in source order.
  assert!(code.contains("PUSHS int@1\nPUSHS int@2\nCALL $pair\n"));
}

#[test]
fn greater_than_swaps_operands_before_less_than() {
  let code = compile_ok(&program("static main() {\nvar x\nx = 1 > 2\nreturn x\n}"));
  assert!(
    code.contains(
      "PUSHS int@1\nPUSHS int@2\n\
       POPS LF@temp_0\nPOPS LF@temp_1\n\
       PUSHS LF@temp_0\nPUSHS LF@temp_1\nLTS\n"
    ),
    "unexpected lowering:\n{code}"
  );
}

#[test]
fn less_or_equal_swaps_then_negates() {
  let code = compile_ok(&program("static main() {\nvar x\nx = 1 <= 2\nreturn x\n}"));
  assert!(
    code.contains(
      "POPS LF@temp_0\nPOPS LF@temp_1\n\
       PUSHS LF@temp_0\nPUSHS LF@temp_1\nLTS\nNOTS\n"
    ),
    "unexpected lowering:\n{code}"
  );
}

#[test]
fn greater_or_equal_negates_in_place() {
  let code = compile_ok(&program("static main() {\nvar x\nx = 1 >= 2\nreturn x\n}"));
  assert!(
    code.contains("PUSHS int@1\nPUSHS int@2\nLTS\nNOTS\n"),
    "unexpected lowering:\n{code}"
  );
}

#[test]
fn inequality_negates_equality() {
  let code = compile_ok(&program("static main() {\nvar x\nx = 1 != 2\nreturn x\n}"));
  assert!(code.contains("PUSHS int@1\nPUSHS int@2\nEQS\nNOTS\n"));
}

#[test]
fn missing_entry_point_is_detected_after_the_whole_body() {
  let (result, code) = compile(&program("static helper() {\nreturn null\n}"));
  let err = result.expect_err("missing main must fail");
  assert_eq!(err.exit_code(), 3);
  // The class body was fully translated before the epilog check fired.
  assert!(code.contains("LABEL $helper"));
  assert!(code.contains("RETURN"));
  assert!(!code.contains("CALL $main"));
}

#[test]
fn variable_redeclaration_fails() {
  let source = program("static main() {\nvar x\nvar x\nreturn null\n}");
  assert_eq!(completion_status(&source), 4);
}

#[test]
fn blocks_do_not_open_scopes() {
  // The `var x` inside the if-branch collides with the function-level one.
  let source = program(
    "static main() {\nvar x\nx = 1\n\
     if (x < 2) {\nvar x\n} else {\nvar y\n}\n\
     return null\n}",
  );
  assert_eq!(completion_status(&source), 4);
}

#[test]
fn bare_call_statement_is_rejected() {
  let source = program("static main() {\nf()\nreturn null\n}");
  assert_eq!(completion_status(&source), 10);
}

#[test]
fn missing_else_is_a_syntax_error() {
  let source = program("static main() {\nvar x\nx = 1\nif (x < 2) {\nx = 2\n}\nreturn x\n}");
  assert_eq!(completion_status(&source), 2);
}

#[test]
fn if_lowers_to_two_labels() {
  let source = program(
    "static main() {\nvar x\nx = 0\n\
     if (x < 1) {\nx = 1\n} else {\nx = 2\n}\n\
     return x\n}",
  );
  let code = compile_ok(&source);
  assert!(
    code.contains(
      "PUSHS LF@x\nPUSHS int@1\nLTS\n\
       POPS LF@temp_0\nJUMPIFEQ label_0 LF@temp_0 bool@false\n\
       PUSHS int@1\nPOPS LF@x\n\
       JUMP label_1\nLABEL label_0\n\
       PUSHS int@2\nPOPS LF@x\n\
       LABEL label_1\n"
    ),
    "unexpected lowering:\n{code}"
  );
}

#[test]
fn while_re_evaluates_its_condition() {
  let source = program(
    "static main() {\nvar i\ni = 0\n\
     while (i < 3) {\ni = i + 1\n}\n\
     return i\n}",
  );
  let code = compile_ok(&source);
  assert!(
    code.contains(
      "LABEL label_0\n\
       PUSHS LF@i\nPUSHS int@3\nLTS\n\
       POPS LF@temp_0\nJUMPIFEQ label_1 LF@temp_0 bool@false\n\
       PUSHS LF@i\nPUSHS int@1\nADDS\nPOPS LF@i\n\
       JUMP label_0\nLABEL label_1\n"
    ),
    "unexpected lowering:\n{code}"
  );
}

#[test]
fn is_compares_the_runtime_type_tag() {
  let source = program(
    "static main() {\nvar x\nx = 1\n\
     x = x is Num\nx = x is String\nx = x is Null\n\
     return x\n}",
  );
  let code = compile_ok(&source);
  assert!(
    code.contains(
      "PUSHS LF@x\n\
       POPS LF@temp_0\nTYPE LF@temp_1 LF@temp_0\n\
       PUSHS string@float\nPUSHS LF@temp_1\nEQS\n"
    ),
    "unexpected lowering:\n{code}"
  );
  assert!(code.contains("PUSHS string@string\n"));
  assert!(code.contains("PUSHS string@nil\n"));
}

#[test]
fn getters_and_setters_share_the_arity_keyed_namespace() {
  let source = program(
    "static value {\nreturn 1\n}\n\
     static value = (v) {\nvar keep\nkeep = v\nreturn keep\n}\n\
     static main() {\nvar x\nx = value()\nreturn x\n}",
  );
  let code = compile_ok(&source);
  // The setter's parameter is bound like any single-parameter prolog, and
  // is addressable by name in its body.
  assert!(code.contains("DEFVAR LF@param0\nPOPS LF@param0\n"));
  assert!(code.contains("PUSHS LF@v\nPOPS LF@keep\n"));
  // The getter resolves through the arity-0 key.
  assert!(code.contains("CALL $value\n"));
}

#[test]
fn getter_and_function_cannot_share_name_and_arity() {
  let source = program(
    "static value {\nreturn 1\n}\n\
     static value() {\nreturn 2\n}\n\
     static main() {\nreturn null\n}",
  );
  assert_eq!(completion_status(&source), 4);
}

#[test]
fn globals_need_no_declaration() {
  let source = program(
    "static main() {\n__counter = 1\nvar x\nx = __counter + 1\nreturn x\n}",
  );
  let code = compile_ok(&source);
  assert!(code.contains("POPS GF@__counter\n"));
  assert!(code.contains("PUSHS GF@__counter\n"));
}

#[test]
fn builtin_calls_bypass_the_symbol_table() {
  let source = program("static main() {\nvar x\nx = Ifj.write(1)\nreturn x\n}");
  let code = compile_ok(&source);
  assert!(
    code.contains("PUSHS int@1\n# Call to built-in function Ifj.write\nPOPS LF@x\n"),
    "unexpected lowering:\n{code}"
  );
}

#[test]
fn arithmetic_and_grouping_lower_left_to_right() {
  let source = program(
    "static main() {\nvar x\nx = (1 + 2) * 3\nx = 6 / 2 - 1\nreturn x\n}",
  );
  let code = compile_ok(&source);
  assert!(code.contains("PUSHS int@1\nPUSHS int@2\nADDS\nPUSHS int@3\nMULS\n"));
  assert!(code.contains("PUSHS int@6\nPUSHS int@2\nDIVS\nPUSHS int@1\nSUBS\n"));
}

#[test]
fn literal_factors_keep_their_spelling() {
  let source = program(
    "static main() {\nvar x\nx = 1.5 + 2.5\nx = \"hi\"\nx = null\nreturn x\n}",
  );
  let code = compile_ok(&source);
  assert!(code.contains("PUSHS float@1.5\nPUSHS float@2.5\nADDS\n"));
  assert!(code.contains("PUSHS string@hi\n"));
  assert!(code.contains("PUSHS nil@nil\nPOPS LF@x\n"));
}

#[test]
fn prolog_deviations_are_syntax_errors() {
  assert_eq!(
    completion_status("import \"wrong\" for Ifj\nclass Program {\n}\n"),
    2
  );
  assert_eq!(
    completion_status("class Program {\n}\n"),
    2
  );
  assert_eq!(
    completion_status("import \"ifj25\" for Ifj\nclass Other {\n}\n"),
    2
  );
}

#[test]
fn lexical_errors_map_to_status_one() {
  let source = program("static main() {\nvar x\nx = @\nreturn x\n}");
  assert_eq!(completion_status(&source), 1);
}

#[test]
fn assigning_an_undeclared_local_is_undefined() {
  let source = program("static main() {\nx = 1\nreturn null\n}");
  assert_eq!(completion_status(&source), 3);
}
