//! The `sandbox` command and the sandbox value type.
//!
//! `sandbox name` creates an empty environment bound to a global variable.
//! The value answers the operators `eval`, `expr`, `link`, `unlink`,
//! `clear`, `global`, and `type`. Evaluation inside the sandbox swaps the
//! interpreter's global environment for the sandbox until the frame pops,
//! so scripts in the sandbox see only what was linked in.

use std::rc::Rc;

use crate::{
    exception::CutletError,
    frame::Frame,
    interp::Interpreter,
    sandbox::{Sandbox, SandboxRef},
    value::{CmdResult, OpaqueVariable, VarRef, Variable},
};

/// `sandbox name` — creates a named sandbox and binds it globally.
pub fn sandbox(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    if args.len() != 1 {
        return Err(CutletError::run(
            "Invalid number of arguments to sandbox name",
        ));
    }
    let name = args[0].to_string();
    let value = Variable::opaque(Rc::new(SandboxValue {
        sandbox: Sandbox::new(),
    }));
    interp.set_global(&name, Some(value.clone()));
    Ok(Some(value))
}

/// A sandbox bound to a script variable.
#[derive(Debug)]
pub struct SandboxValue {
    sandbox: SandboxRef,
}

impl SandboxValue {
    pub fn sandbox(&self) -> &SandboxRef {
        &self.sandbox
    }

    /// Runs each script inside the sandboxed environment, restoring the
    /// previous environment on every path.
    fn eval_op(&self, interp: &mut Interpreter, scripts: &[VarRef]) -> CmdResult {
        interp.push_frame_sandbox(Frame::call("sandbox"), self.sandbox.clone())?;
        let mut result = Ok(None);
        for script in scripts {
            if let Err(err) = interp.run(&script.to_string()) {
                result = Err(err);
                break;
            }
        }
        interp.pop_frame();
        result
    }

    /// Evaluates a single command inside the sandbox and returns its value.
    fn expr_op(&self, interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
        if args.len() != 2 {
            return Err(CutletError::run(format!(
                "Invalid number of arguments for $sandbox expr ({}).\n $sandbox expr body",
                args.len() - 1
            )));
        }
        interp.push_frame_sandbox(Frame::call("sandbox"), self.sandbox.clone())?;
        let result = interp.expr(&args[1].to_string());
        interp.pop_frame();
        result
    }

    /// `link component ¿as name?` / `link *components` — shares components
    /// from the enclosing environment into the sandbox.
    fn link_op(&self, interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
        if args.len() == 4 && args[2].to_string() == "as" {
            let source = args[1].to_string();
            let component = interp
                .get(&source)
                .ok_or_else(|| CutletError::run(format!("Unresolved component \"{source}\"")))?;
            self.sandbox
                .borrow_mut()
                .add(&args[3].to_string(), component);
            return Ok(None);
        }

        for name in &args[1..] {
            let name = name.to_string();
            let component = interp
                .get(&name)
                .ok_or_else(|| CutletError::run(format!("Unresolved component \"{name}\"")))?;
            self.sandbox.borrow_mut().add(&name, component);
        }
        Ok(None)
    }

    /// `$sandbox global name ¿=? ¿value?` — sets or removes a global inside
    /// the sandbox.
    fn global_op(&self, args: &[VarRef]) -> CmdResult {
        match args.len() {
            2 => {
                self.sandbox
                    .borrow_mut()
                    .set_variable(&args[1].to_string(), None);
            }
            3 => {
                self.sandbox
                    .borrow_mut()
                    .set_variable(&args[1].to_string(), Some(args[2].clone()));
            }
            4 => {
                let sep = args[2].to_string();
                if sep != "=" {
                    return Err(CutletError::run(format!(
                        "global name ¿=? value\n Expected = got {sep}"
                    )));
                }
                self.sandbox
                    .borrow_mut()
                    .set_variable(&args[1].to_string(), Some(args[3].clone()));
            }
            _ => {
                return Err(CutletError::run(
                    "Invalid arguments to sandbox operator global",
                ));
            }
        }
        Ok(None)
    }
}

impl OpaqueVariable for SandboxValue {
    fn type_name(&self) -> &'static str {
        "sandbox"
    }

    fn coerce(&self) -> String {
        "sandbox".to_owned()
    }

    fn invoke(&self, interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
        let op = args[0].to_string();

        match op.as_str() {
            "eval" => self.eval_op(interp, &args[1..]),
            "expr" => self.expr_op(interp, args),
            "link" => self.link_op(interp, args),
            "unlink" => {
                for name in &args[1..] {
                    self.sandbox.borrow_mut().remove(&name.to_string());
                }
                Ok(None)
            }
            "clear" => {
                if args.len() != 1 {
                    return Err(CutletError::run(
                        "Too many arguments to sandbox operator clear",
                    ));
                }
                self.sandbox.borrow_mut().clear();
                Ok(None)
            }
            "type" => {
                if args.len() != 1 {
                    return Err(CutletError::run(
                        "Too many arguments to sandbox operator type",
                    ));
                }
                Ok(Some(Variable::text("sandbox")))
            }
            "global" => self.global_op(args),
            _ => Err(CutletError::run(format!(
                "Unknown operator \"{op}\" for sandbox type."
            ))),
        }
    }
}
