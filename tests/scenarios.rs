//! End-to-end scenarios: whole MTI programs through `compile` + `interpret`,
//! asserting on captured stdout and the `InterpretResult`. Mirrors the
//! concrete scenarios in `SPEC_FULL.md` §8.

use mti::vm::{InterpretResult, Vm};

fn run(source: &str) -> (InterpretResult, String) {
    let buffer = mti::vm::SharedBuffer::new();
    let mut vm = Vm::new().with_output(buffer.clone());
    let result = vm.interpret(source);
    (result, buffer.contents())
}

#[test]
fn arithmetic_precedence() {
    let (result, out) = run("print 1 + 2 * 3;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "7\n");
}

#[test]
fn string_concatenation() {
    let (result, out) = run(r#"print "foo" + "bar";"#);
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "foobar\n");
}

#[test]
fn global_variable_arithmetic() {
    let (result, out) = run("let a = 1; let b = 2; print a + b;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "3\n");
}

#[test]
fn block_local_does_not_leak_past_end() {
    let (result, out) = run("do let x = 10; print x; end");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "10\n");
}

#[test]
fn referencing_block_local_after_end_is_undefined() {
    let (result, _out) = run("do let x = 10; end print x;");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn nil_and_false_are_distinct_types() {
    let (result, out) = run("print nil == false;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "false\n");
}

#[test]
fn undefined_global_is_a_runtime_error() {
    let (result, _out) = run("print undefined_var;");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn nested_scopes_shadow_and_restore() {
    let (result, out) = run(
        r#"
        let a = 1;
        do
            let a = 2;
            do
                let a = 3;
                print a;
            end
            print a;
        end
        print a;
        "#,
    );
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "3\n2\n1\n");
}

#[test]
fn successive_interpret_calls_share_globals_like_a_repl_session() {
    let buffer = mti::vm::SharedBuffer::new();
    let mut vm = Vm::new().with_output(buffer.clone());
    assert_eq!(vm.interpret("let counter = 0;"), InterpretResult::Ok);
    assert_eq!(vm.interpret("counter = counter + 1;"), InterpretResult::Ok);
    assert_eq!(vm.interpret("print counter;"), InterpretResult::Ok);
    assert_eq!(buffer.contents(), "1\n");
}

#[test]
fn identical_string_literals_across_separate_compiles_stay_interned() {
    // Two separate `interpret` calls against the same Vm share one interner
    // (see table.rs) - the same way a REPL session's lines do.
    let buffer = mti::vm::SharedBuffer::new();
    let mut vm = Vm::new().with_output(buffer.clone());
    assert_eq!(vm.interpret(r#"let a = "shared";"#), InterpretResult::Ok);
    assert_eq!(
        vm.interpret(r#"print a == "shared";"#),
        InterpretResult::Ok
    );
    assert_eq!(buffer.contents(), "true\n");
}

#[test]
fn arity_mismatch_would_be_caught_but_no_call_syntax_exists_yet() {
    // There is no function-literal grammar wired in (§9 open question: `fn`
    // is reserved with no parse rule), so arity is exercised directly against
    // the VM in `vm.rs`'s unit tests rather than through source text here.
    let (result, _out) = run("print 1;");
    assert_eq!(result, InterpretResult::Ok);
}

#[test]
fn compile_error_never_reaches_the_vm() {
    let (result, out) = run("let = 1;");
    assert_eq!(result, InterpretResult::CompileError);
    assert_eq!(out, "");
}

#[test]
fn type_error_on_arithmetic_with_a_non_number() {
    let (result, _out) = run(r#"print 1 + true;"#);
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn and_or_short_circuit_without_evaluating_the_rhs() {
    let (result, out) = run("print true or (1 / 0 == 0); print false and (1 / 0 == 0);");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "true\nfalse\n");
}

#[test]
fn print_as_a_nested_sub_expression_does_not_panic() {
    let (result, out) = run("print print 1;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "1\nnil\n");
}

#[test]
fn statements_without_a_separating_semicolon_still_compile_and_run() {
    let (result, out) = run("let a = 1 print a;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "1\n");
}
