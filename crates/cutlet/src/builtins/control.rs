//! The standard command library: constants, expression evaluation, and
//! control flow.
//!
//! `if` and `while` conditions are evaluated as single commands, so
//! `{$i < 3}` dispatches the string `<` operator of `$i`'s value. The
//! `expr` command instead runs the infix evaluator over its joined
//! arguments, which is where arithmetic lives.

use crate::{
    exception::CutletError,
    expr as expression,
    frame::{Frame, FrameState},
    interp::Interpreter,
    value::{self, CmdResult, VarRef, Variable},
};

/// `true` — the true constant.
pub fn true_cmd(_interp: &mut Interpreter, _args: &[VarRef]) -> CmdResult {
    Ok(Some(Variable::truth(true)))
}

/// `false` — the false constant.
pub fn false_cmd(_interp: &mut Interpreter, _args: &[VarRef]) -> CmdResult {
    Ok(Some(Variable::truth(false)))
}

/// `eval *args` — evaluates the joined arguments as a script in the
/// current frame.
pub fn eval(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    interp.run(&value::join(args, " "))?;
    Ok(None)
}

/// `expr *args` — evaluates the joined arguments as an infix expression.
pub fn expr(_interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    let text = value::join(args, " ");
    Ok(Some(expression::evaluate(&text)?))
}

/// `if condition ¿then? body ¿elif condition ¿then? body …? ¿else body?`
pub fn if_cmd(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    let mut it = args.iter();

    let condition = next_arg(&mut it)?;
    let mut body = next_arg(&mut it)?;
    if body.to_string() == "then" {
        body = next_arg(&mut it)?;
    }

    if condition_holds(interp, condition)? {
        eval_block(interp, "then", &body.to_string())?;
        return Ok(None);
    }

    while let Some(keyword) = it.next() {
        match keyword.to_string().as_str() {
            "elif" => {
                let condition = next_arg(&mut it)?;
                let mut body = next_arg(&mut it)?;
                if body.to_string() == "then" {
                    body = next_arg(&mut it)?;
                }
                if condition_holds(interp, condition)? {
                    eval_block(interp, "then", &body.to_string())?;
                    return Ok(None);
                }
            }
            "else" => {
                let body = next_arg(&mut it)?;
                eval_block(interp, "else", &body.to_string())?;
                return Ok(None);
            }
            other => {
                return Err(CutletError::run(format!(
                    "Expected elif or else but got {other} instead."
                )));
            }
        }
    }

    Ok(None)
}

/// `while condition ¿do? body` — re-evaluates the condition before every
/// iteration; the body runs in a loop frame so `break` and `continue` land
/// here.
pub fn while_cmd(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    let mut it = args.iter();
    let condition = next_arg(&mut it)?;
    let mut body = next_arg(&mut it)?;
    if body.to_string() == "do" {
        body = next_arg(&mut it)?;
    }
    let body = body.to_string();

    let condition_node = interp.compile_command(&condition.to_string())?;
    let mut compiled_body = None;

    loop {
        let value = interp.eval_ast(&condition_node)?;
        if !value.is_some_and(|value| value.truthy()) {
            break;
        }

        let lexical = interp.frame().clone();
        interp.push_frame(Frame::loop_frame("while", lexical))?;

        let result = match &compiled_body {
            Some(ast) => interp.eval_ast(ast).map(|_| ()),
            None => match interp.compile(&body) {
                Ok(ast) => {
                    let eval_result = interp.eval_ast(&ast).map(|_| ());
                    compiled_body = Some(ast);
                    eval_result
                }
                Err(err) => Err(err),
            },
        };

        let state = interp.frame().borrow().state;
        interp.pop_frame();
        result?;

        if state == FrameState::Break {
            break;
        }
        // A `return` or `done` that reached the enclosing call frame ends
        // the loop as well.
        if Frame::effective_state(interp.frame()) != FrameState::Running {
            break;
        }
    }

    Ok(None)
}

/// `break` — marks the nearest loop frame for exit.
pub fn break_cmd(interp: &mut Interpreter, _args: &[VarRef]) -> CmdResult {
    let frame = interp.frame().clone();
    Frame::set_state(&frame, FrameState::Break);
    Ok(None)
}

/// `continue` — marks the nearest loop frame to skip to the next
/// iteration.
pub fn continue_cmd(interp: &mut Interpreter, _args: &[VarRef]) -> CmdResult {
    let frame = interp.frame().clone();
    Frame::set_state(&frame, FrameState::Continue);
    Ok(None)
}

/// `raise *args` — raises a runtime error whose message is the joined
/// arguments.
pub fn raise(_interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    Err(CutletError::run(value::join(args, " ")))
}

/// `try body ¿catch varname body?` — evaluates the body; on any error,
/// binds the message and runs the catch body. Without a catch clause the
/// error is discarded.
pub fn try_cmd(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    let mut it = args.iter();
    let body = next_arg(&mut it)?;

    if let Err(err) = eval_block(interp, "try", &body.to_string()) {
        if let Some(keyword) = it.next() {
            if keyword.to_string() != "catch" {
                return Err(CutletError::run(format!(
                    "Expected catch but got {keyword} instead."
                )));
            }
            let name = next_arg(&mut it)?.to_string();
            let handler = next_arg(&mut it)?.to_string();

            let lexical = interp.frame().clone();
            interp.push_frame(Frame::block("catch", lexical))?;
            interp.set_local(&name, Some(Variable::text(err.message())));
            let result = interp.run(&handler);
            interp.pop_frame();
            result?;
        }
    }

    Ok(None)
}

/// Evaluates a condition's text as a single command and reads the result's
/// truthiness.
fn condition_holds(interp: &mut Interpreter, condition: &VarRef) -> Result<bool, CutletError> {
    let value = interp.expr(&condition.to_string())?;
    Ok(value.is_some_and(|value| value.truthy()))
}

/// Evaluates a body in a fresh block frame, popping it on both paths.
fn eval_block(interp: &mut Interpreter, label: &str, body: &str) -> Result<(), CutletError> {
    let lexical = interp.frame().clone();
    interp.push_frame(Frame::block(label, lexical))?;
    let result = interp.run(body);
    interp.pop_frame();
    result.map(|_| ())
}

fn next_arg<'a>(it: &mut std::slice::Iter<'a, VarRef>) -> Result<&'a VarRef, CutletError> {
    it.next()
        .ok_or_else(|| CutletError::run("Expected more parameters."))
}
