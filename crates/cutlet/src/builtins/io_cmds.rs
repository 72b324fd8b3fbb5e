//! `print`, `list`, `include`, and `import`.

use crate::{
    exception::CutletError,
    interp::Interpreter,
    value::{CmdResult, VarRef, Variable},
};

/// `print *args` — writes the arguments joined by single spaces, plus a
/// newline, through the interpreter's print writer.
pub fn print(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    for (i, value) in args.iter().enumerate() {
        if i > 0 {
            interp.write_output_char(' ')?;
        }
        interp.write_output(&value.to_string())?;
    }
    interp.write_output_char('\n')?;
    Ok(None)
}

/// `list *args` — with one argument, parses it as brace-block list syntax;
/// otherwise builds a list of the arguments verbatim.
pub fn list(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    let result = if args.len() == 1 {
        interp.parse_list(&args[0].to_string())?
    } else {
        Variable::list(args.to_vec())
    };
    Ok(Some(result))
}

/// `include path …` — evaluates each file literally in the current frame.
pub fn include(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    if args.is_empty() {
        return Err(CutletError::run("Invalid number of arguments to include path"));
    }
    for path in args {
        interp.run_file(&path.to_string())?;
    }
    Ok(None)
}

/// `import name …` — searches `library.path` for each library, evaluating
/// source libraries and loading native ones.
pub fn import(interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    if args.is_empty() {
        return Err(CutletError::run("Invalid number of arguments to import name"));
    }
    for name in args {
        interp.import(&name.to_string())?;
    }
    Ok(None)
}
