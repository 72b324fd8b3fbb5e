//! Syntax failures: what the tokenizer and grammar reject, and what they
//! report.

use cutlet::{CutletError, Interpreter, NoPrint, SyntaxError};

/// Compiles (without evaluating) and returns the syntax error.
fn compile_err(code: &str) -> SyntaxError {
    let mut interp = Interpreter::with_output(Box::new(NoPrint));
    match interp.compile(code).expect_err("compilation must fail") {
        CutletError::Syntax(err) => err,
        CutletError::Run(err) => panic!("expected a syntax error, got: {err}"),
    }
}

#[test]
fn unterminated_double_quote() {
    let err = compile_err("print \"oops\n");
    assert!(err.message.contains("Unmatched \""));
    assert_eq!(err.token.position, 6);
}

#[test]
fn unterminated_single_quote() {
    let err = compile_err("print 'oops\n");
    assert!(err.message.contains("Unmatched '"));
}

#[test]
fn unterminated_subcommand() {
    let err = compile_err("print [oops\n");
    assert!(err.message.contains("Unmatched ["));
    assert_eq!(err.token.position, 6);
}

#[test]
fn unterminated_block_reports_the_opener() {
    let err = compile_err("run {\n  nested {ok}\n");
    assert!(err.message.contains("Unmatched {"));
    assert_eq!(err.token.position, 4);
}

#[test]
fn newline_inside_subcommand_is_rejected_outside_braces() {
    let err = compile_err("print [a\nb]\n");
    assert!(err.message.contains("Unmatched ["));
}

#[test]
fn newline_inside_subcommand_braces_is_allowed() {
    let mut interp = Interpreter::with_output(Box::new(NoPrint));
    interp
        .compile("def f [list {a\nb}] {}\n")
        .expect("braced newlines inside subcommands compile");
}

#[test]
fn unmatched_brace_substitution_in_string() {
    let err = compile_err("print \"${oops\"\n");
    assert!(err.message.contains("Unmatched ${ in string"));
}

#[test]
fn unmatched_bracket_in_string() {
    let err = compile_err("print \"a [cmd\"\n");
    assert!(err.message.contains("Unmatched [ in string"));
}

#[test]
fn invalid_hex_escape_in_string() {
    let err = compile_err("print \"\\xZZ\"\n");
    assert!(err.message.contains("Invalid escaped hex value"));
}

#[test]
fn empty_source_compiles_to_an_empty_block() {
    let mut interp = Interpreter::with_output(Box::new(NoPrint));
    interp.compile("").expect("empty source compiles");
    interp.compile("\n\n# only a comment\n").expect("comments compile");
}

#[test]
fn syntax_errors_keep_the_offending_text() {
    let err = compile_err("print \"dangling\n");
    assert_eq!(err.token.text, "dangling");
}
