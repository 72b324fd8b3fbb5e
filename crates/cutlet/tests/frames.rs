//! Variable resolution order, frame behavior, and environment fallbacks.

use std::rc::Rc;

use cutlet::{
    CmdResult, CollectPrint, ComponentRef, Interpreter, NoPrint, VarRef, Variable,
};
use pretty_assertions::assert_eq;

fn capture() -> (Interpreter, std::rc::Rc<std::cell::RefCell<String>>) {
    let output = CollectPrint::new();
    let buffer = output.buffer();
    (Interpreter::with_output(Box::new(output)), buffer)
}

#[test]
fn local_shadows_global() {
    let (mut interp, buffer) = capture();
    interp
        .run("global x = outer\ndef f {} { local x = inner; print $x }\nf\nprint $x\n")
        .expect("script runs cleanly");
    assert_eq!(buffer.borrow().as_str(), "inner\nouter\n");
}

#[test]
fn block_scope_falls_through_to_the_enclosing_frame() {
    let (mut interp, buffer) = capture();
    interp
        .run("def f {} { local x = 1; if {1 == 1} { print $x } }\nf\n")
        .expect("script runs cleanly");
    assert_eq!(buffer.borrow().as_str(), "1\n");
}

#[test]
fn block_assignment_targets_the_existing_binding() {
    let (mut interp, buffer) = capture();
    interp
        .run("def f {} { local x = 1; if {1 == 1} { local x = 2 }; print $x }\nf\n")
        .expect("script runs cleanly");
    assert_eq!(buffer.borrow().as_str(), "2\n");
}

#[test]
fn call_frames_do_not_see_caller_locals() {
    let mut interp = Interpreter::with_output(Box::new(NoPrint));
    let err = interp
        .run("def f {} { print $x }\ndef g {} { local x = 1; f }\ng\n")
        .expect_err("x must not resolve inside f");
    assert!(err.message().contains("Unable to resolve variable $x"));
}

#[test]
fn global_is_visible_everywhere() {
    let (mut interp, buffer) = capture();
    interp
        .run("global shared = 42\ndef f {} { print $shared }\nf\n")
        .expect("script runs cleanly");
    assert_eq!(buffer.borrow().as_str(), "42\n");
}

#[test]
fn variable_fallback_component_resolves_missing_globals() {
    let (mut interp, buffer) = capture();
    let fallback: ComponentRef = Rc::new(
        |_interp: &mut Interpreter, args: &[VarRef]| -> CmdResult {
            Ok(Some(Variable::text(format!("fell-back-{}", args[0]))))
        },
    );
    interp.add("¿variable?", fallback);
    interp.run("print $anything").expect("fallback resolves");
    assert_eq!(buffer.borrow().as_str(), "fell-back-anything\n");
}

#[test]
fn component_fallback_receives_the_missing_name() {
    let (mut interp, buffer) = capture();
    let fallback: ComponentRef = Rc::new(
        |interp: &mut Interpreter, args: &[VarRef]| -> CmdResult {
            let name = args[0].to_string();
            let rest: Vec<String> = args[1..].iter().map(ToString::to_string).collect();
            let line = format!("missing {name}: {}", rest.join(","));
            interp.write_output(&line)?;
            interp.write_output_char('\n')?;
            Ok(None)
        },
    );
    interp.add("¿component?", fallback);
    interp.run("gizmo 1 2").expect("fallback handles the call");
    assert_eq!(buffer.borrow().as_str(), "missing gizmo: 1,2\n");
}

#[test]
fn frame_locals_shadow_the_fallback() {
    let (mut interp, buffer) = capture();
    let fallback: ComponentRef = Rc::new(
        |_interp: &mut Interpreter, _args: &[VarRef]| -> CmdResult {
            Ok(Some(Variable::text("from-fallback")))
        },
    );
    interp.add("¿variable?", fallback);
    interp
        .run("local x = direct\nprint $x\nprint $other\n")
        .expect("script runs cleanly");
    assert_eq!(buffer.borrow().as_str(), "direct\nfrom-fallback\n");
}

#[test]
fn uplevel_crosses_block_frames() {
    let (mut interp, buffer) = capture();
    interp
        .run(
            "def helper {} { uplevel 1 { local seen = yes } }\n\
             def main {} { local seen = no; helper; print $seen }\n\
             main\n",
        )
        .expect("script runs cleanly");
    assert_eq!(buffer.borrow().as_str(), "yes\n");
}

#[test]
fn uplevel_out_of_range_fails() {
    let mut interp = Interpreter::with_output(Box::new(NoPrint));
    let err = interp
        .run("uplevel 99 { print nope }")
        .expect_err("deep uplevel must fail");
    assert!(err.message().contains("Frame level out of range"));
}

#[test]
fn uplevel_stops_at_a_sandbox_barrier() {
    let mut interp = Interpreter::with_output(Box::new(NoPrint));
    let err = interp
        .run(
            "local secret = 1\n\
             sandbox sb\n\
             $sb link uplevel print\n\
             $sb eval { uplevel 1 { print $secret } }\n",
        )
        .expect_err("uplevel must not escape the sandbox");
    assert!(err.message().contains("Frame level out of range"));
}

#[test]
fn sandbox_environment_is_restored_after_eval() {
    let (mut interp, buffer) = capture();
    interp
        .run(
            "sandbox sb\n$sb link print\n$sb eval { print inside }\n\
             print outside\n",
        )
        .expect("script runs cleanly");
    assert_eq!(buffer.borrow().as_str(), "inside\noutside\n");
}

#[test]
fn sandbox_environment_is_restored_after_an_error() {
    let (mut interp, buffer) = capture();
    let result = interp.run("sandbox sb\n$sb eval { nothing here }\n");
    assert!(result.is_err());
    // The global environment came back; print still resolves.
    interp.run("print recovered").expect("environment restored");
    assert_eq!(buffer.borrow().as_str(), "recovered\n");
}

#[test]
fn sandbox_expr_returns_a_value() {
    let (mut interp, buffer) = capture();
    interp
        .run("sandbox sb\n$sb link expr\nprint [$sb expr {expr 1 + 2}]\n")
        .expect("script runs cleanly");
    assert_eq!(buffer.borrow().as_str(), "3\n");
}

#[test]
fn return_value_reaches_the_host() {
    let mut interp = Interpreter::with_output(Box::new(NoPrint));
    interp.run("return 7").expect("script runs cleanly");
    let result = interp.result().expect("a result is present");
    assert_eq!(result.as_int().expect("result is numeric"), 7);
}

#[test]
fn script_without_return_keeps_the_default_result() {
    let mut interp = Interpreter::with_output(Box::new(NoPrint));
    interp.run("local x = 1").expect("script runs cleanly");
    let result = interp.result().expect("a result is present");
    assert_eq!(result.as_int().expect("result is numeric"), 0);
}

#[test]
fn statements_after_a_toplevel_return_do_not_run() {
    let (mut interp, buffer) = capture();
    interp
        .run("print before\nreturn 0\nprint after\n")
        .expect("script runs cleanly");
    assert_eq!(buffer.borrow().as_str(), "before\n");
}
