//! Boolean operators.
//!
//! The right-hand operand of the binary operators is coerced with condition
//! truthiness: a boolean uses its bit, anything else is true unless its
//! text is `false`, `0`, or empty.

use crate::{
    exception::CutletError,
    interp::Interpreter,
    types::arity_error,
    value::{CmdResult, VarRef, Variable},
};

pub fn invoke(value: bool, _interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    let op = args[0].to_string();

    match op.as_str() {
        "not" => {
            check_arity(&op, args, 1)?;
            Ok(Some(Variable::truth(!value)))
        }

        "type" => {
            check_arity(&op, args, 1)?;
            Ok(Some(Variable::text("boolean")))
        }

        "==" | "=" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(value == args[1].truthy())))
        }

        "<>" | "!=" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(value != args[1].truthy())))
        }

        "and" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(value && args[1].truthy())))
        }

        "nand" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(!(value && args[1].truthy()))))
        }

        "or" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(value || args[1].truthy())))
        }

        "nor" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(!(value || args[1].truthy()))))
        }

        "xor" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(value != args[1].truthy())))
        }

        _ => Err(CutletError::run(format!(
            "Unknown operator {op} for boolean variable."
        ))),
    }
}

fn check_arity(op: &str, args: &[VarRef], expected: usize) -> Result<(), CutletError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(arity_error("boolean", op).into())
    }
}
