//! String operators.
//!
//! Indexing is 1-based and UTF-8 aware: positions count code points, not
//! bytes, and negative positions count back from the end. An operator that
//! isn't recognized falls through to command resolution under the string's
//! own text, which is what lets a variable hold a command name.

use crate::{
    exception::CutletError,
    interp::Interpreter,
    types::{arity_error, normalize_index},
    utf8,
    value::{CmdResult, VarRef, Variable},
};

pub fn invoke(self_ref: &VarRef, interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    let op = args[0].to_string();
    let text = self_ref.to_string();

    match op.as_str() {
        "type" => {
            check_arity(&op, args, 1)?;
            Ok(Some(Variable::text("string")))
        }

        "length" => {
            check_arity(&op, args, 1)?;
            // Code points, not bytes.
            let length = i64::try_from(utf8::count(&text)).unwrap_or(i64::MAX);
            Ok(Some(Variable::int(length)))
        }

        "==" | "=" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(text == args[1].to_string())))
        }

        "<>" | "!=" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(text != args[1].to_string())))
        }

        "<" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(text < args[1].to_string())))
        }

        "<=" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(text <= args[1].to_string())))
        }

        ">" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(text > args[1].to_string())))
        }

        ">=" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(text >= args[1].to_string())))
        }

        "startswith" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(
                text.starts_with(&args[1].to_string()),
            )))
        }

        "endswith" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(text.ends_with(&args[1].to_string()))))
        }

        "find" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(text.contains(&args[1].to_string()))))
        }

        "index" => {
            check_arity(&op, args, 2)?;
            let index = args[1].as_int()?;
            let length = utf8::count(&text);
            let offset = normalize_index(index, length, "String")?;
            let character = text
                .chars()
                .nth(offset)
                .expect("normalized offset is in range");
            Ok(Some(Variable::text(character.to_string())))
        }

        "insert" => {
            check_arity(&op, args, 3)?;
            let index = args[1].as_int()?;
            let length = utf8::count(&text);
            let offset = normalize_index(index, length, "String")?;
            let byte_offset = text
                .char_indices()
                .nth(offset)
                .map_or(text.len(), |(pos, _)| pos);
            match &**self_ref {
                Variable::Text(cell) => {
                    cell.borrow_mut()
                        .insert_str(byte_offset, &args[2].to_string());
                }
                _ => unreachable!("string operators dispatch on text values"),
            }
            Ok(None)
        }

        "substr" => {
            check_arity(&op, args, 3)?;
            let length = utf8::count(&text);
            let start = normalize_index(args[1].as_int()?, length, "String")?;
            let end = normalize_index(args[2].as_int()?, length, "String")?;
            let mut start_it = utf8::Cursor::new(&text);
            start_it.step(isize::try_from(start).unwrap_or(isize::MAX));
            let mut end_it = utf8::Cursor::new(&text);
            end_it.step(isize::try_from(end).unwrap_or(isize::MAX));
            let slice = start_it
                .substr(&end_it)
                .map_err(|err| CutletError::run(err.to_string()))?;
            Ok(Some(Variable::text(slice)))
        }

        // Unrecognized operators fall through: the string's text is treated
        // as a command name and the original arguments are forwarded.
        _ => interp.call(&text, args),
    }
}

fn check_arity(op: &str, args: &[VarRef], expected: usize) -> Result<(), CutletError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(arity_error("string", op).into())
    }
}
