//! Variable and frame commands: `local`, `global`, `return`, `uplevel`.

use crate::{
    exception::CutletError,
    frame::Frame,
    interp::Interpreter,
    value::{CmdResult, VarRef},
};

/// `local name ¿=? value` — sets a variable in the current frame.
pub fn local(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    let (name, value) = name_value(args, "local")?;
    interp.set_local(&name, Some(value));
    Ok(None)
}

/// `global name ¿=? value` — sets a variable in the global environment.
pub fn global(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    let (name, value) = name_value(args, "global")?;
    interp.set_global(&name, Some(value));
    Ok(None)
}

fn name_value(args: &[VarRef], command: &str) -> Result<(String, VarRef), CutletError> {
    match args.len() {
        2 => Ok((args[0].to_string(), args[1].clone())),
        3 => {
            let sep = args[1].to_string();
            if sep != "=" {
                return Err(CutletError::run(format!(
                    "{command} name ¿=? value\n Expected = got {sep}"
                )));
            }
            Ok((args[0].to_string(), args[2].clone()))
        }
        _ => Err(CutletError::run(format!(
            "Invalid number of arguments to {command} name ¿=? value"
        ))),
    }
}

/// `return ¿value?` — ends the enclosing call frame with an optional
/// result.
pub fn ret(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    interp.frame_done(args.first().cloned());
    Ok(None)
}

/// `uplevel ¿n? body` — evaluates the body in the scope of the n-th
/// ancestor frame (default 1), without crossing a sandbox barrier.
pub fn uplevel(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    let (levels, body) = match args.len() {
        1 => (1, args[0].to_string()),
        2 => {
            let levels = args[0].as_int()?;
            let levels = usize::try_from(levels)
                .map_err(|_| CutletError::run("Frame level out of range"))?;
            (levels, args[1].to_string())
        }
        _ => {
            return Err(CutletError::run(
                "Invalid number of arguments to uplevel ¿levels? body",
            ));
        }
    };

    let target = interp.uplevel(levels)?;
    interp.push_frame(Frame::block("uplevel", target))?;
    let result = interp.run(&body);
    interp.pop_frame();
    result?;
    Ok(None)
}
