//! The `def` command and the procedures it creates.

use std::{cell::RefCell, rc::Rc};

use crate::{
    ast::NodeRef,
    exception::CutletError,
    frame::Frame,
    interp::Interpreter,
    sandbox::Component,
    value::{CmdResult, VarRef, Variable},
};

/// `def name ¿parameters? body` — registers a user procedure as a
/// component. Parameters are a brace-block list: bare names bind
/// positionally, `{name default}` pairs supply defaults, and a trailing
/// `*args` collects the rest into a list bound as `$args`.
pub fn def(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    if args.len() < 2 || args.len() > 3 {
        let name = args.first().map_or_else(String::new, ToString::to_string);
        return Err(CutletError::run(format!(
            "Invalid number of parameters for def {name} (2 <= {} <= 3).\n def name ¿parameters? body",
            args.len()
        )));
    }

    let name = args[0].to_string();
    let (parameters, body) = if args.len() == 2 {
        (Vec::new(), args[1].to_string())
    } else {
        let list = interp.parse_list(&args[1].to_string())?;
        let items = match &*list {
            Variable::List(items) => items.borrow().clone(),
            _ => Vec::new(),
        };
        (items, args[2].to_string())
    };

    interp.add(
        &name,
        Rc::new(Proc {
            label: name.clone(),
            parameters,
            body,
            compiled: RefCell::new(None),
        }),
    );

    Ok(None)
}

/// A script-defined procedure.
///
/// Invocation pushes a fresh call frame, binds the parameters, and
/// evaluates the body; the frame's return value becomes the result. The
/// body is compiled on the first call and the tree reused afterwards.
pub struct Proc {
    label: String,
    parameters: Vec<VarRef>,
    body: String,
    compiled: RefCell<Option<NodeRef>>,
}

impl Component for Proc {
    fn invoke(&self, interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
        interp.push_frame(Frame::call(&self.label))?;
        let result = self.bind_and_run(interp, args);
        let value = interp.pop_frame();
        result?;
        Ok(value)
    }
}

impl Proc {
    fn bind_and_run(&self, interp: &mut Interpreter, args: &[VarRef]) -> Result<(), CutletError> {
        let mut supplied = args.iter();

        for parameter in &self.parameters {
            match &**parameter {
                // {name default} pairs.
                Variable::List(pair) => {
                    let pair = pair.borrow().clone();
                    let name = pair
                        .first()
                        .map_or_else(String::new, ToString::to_string);
                    match supplied.next() {
                        Some(value) => interp.set_local(&name, Some(value.clone())),
                        None => {
                            let default = pair.get(1).cloned().ok_or_else(|| {
                                CutletError::run(format!("Missing value for parameter {name}"))
                            })?;
                            interp.set_local(&name, Some(default));
                        }
                    }
                }
                _ => {
                    let name = parameter.to_string();
                    if name == "*args" {
                        let rest: Vec<VarRef> = supplied.by_ref().cloned().collect();
                        interp.set_local("args", Some(Variable::list(rest)));
                    } else {
                        match supplied.next() {
                            Some(value) => interp.set_local(&name, Some(value.clone())),
                            None => {
                                return Err(CutletError::run(format!(
                                    "Missing value for parameter {name}"
                                )));
                            }
                        }
                    }
                }
            }
        }

        let ast = {
            let cached = self.compiled.borrow().clone();
            match cached {
                Some(ast) => ast,
                None => {
                    let ast = interp.compile(&self.body)?;
                    *self.compiled.borrow_mut() = Some(ast.clone());
                    ast
                }
            }
        };

        interp.eval_ast(&ast)?;
        Ok(())
    }
}
