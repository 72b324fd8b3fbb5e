//! The built-in command set.
//!
//! Registration happens in two layers, matching how the original system
//! splits them: the core commands every interpreter carries (`def`, `local`,
//! `print`, `import`, …) and the standard command library of control-flow
//! constructs (`if`, `while`, `try`, …). Both are registered into the
//! global environment when an interpreter is created.

mod control;
mod def;
mod io_cmds;
mod sandbox_cmd;
mod vars;

pub use def::Proc;
pub use sandbox_cmd::SandboxValue;

use crate::interp::Interpreter;

/// Registers every built-in command in the interpreter's global
/// environment.
pub fn register(interp: &mut Interpreter) {
    register_core(interp);
    register_stdlib(interp);
}

/// The core command set.
pub fn register_core(interp: &mut Interpreter) {
    interp.add_fn("print", io_cmds::print);
    interp.add_fn("global", vars::global);
    interp.add_fn("local", vars::local);
    interp.add_fn("uplevel", vars::uplevel);
    interp.add_fn("def", def::def);
    interp.add_fn("return", vars::ret);
    interp.add_fn("list", io_cmds::list);
    interp.add_fn("include", io_cmds::include);
    interp.add_fn("import", io_cmds::import);
    interp.add_fn("sandbox", sandbox_cmd::sandbox);
}

/// The standard command library: constants, expression evaluation, and
/// control flow.
pub fn register_stdlib(interp: &mut Interpreter) {
    interp.add_fn("true", control::true_cmd);
    interp.add_fn("false", control::false_cmd);
    interp.add_fn("eval", control::eval);
    interp.add_fn("expr", control::expr);
    interp.add_fn("if", control::if_cmd);
    interp.add_fn("while", control::while_cmd);
    interp.add_fn("break", control::break_cmd);
    interp.add_fn("continue", control::continue_cmd);
    interp.add_fn("raise", control::raise);
    interp.add_fn("try", control::try_cmd);
}
