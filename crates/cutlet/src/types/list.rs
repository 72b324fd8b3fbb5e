//! List operators.
//!
//! Lists are ordered sequences of values behind a shared handle, so the
//! mutating operators (`append`, `index =`, `sort`, …) are visible through
//! every reference to the same list. Operators that run script bodies
//! (`foreach`, `sort` with a comparator) iterate over a snapshot of the
//! items so the body may safely mutate the list.

use crate::{
    exception::CutletError,
    frame::{Frame, FrameState},
    interp::Interpreter,
    types::{arity_error, normalize_index},
    value::{CmdResult, VarRef, Variable},
};

pub fn invoke(self_ref: &VarRef, interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    let op = args[0].to_string();

    match op.as_str() {
        "type" => {
            check_arity(&op, args, 1)?;
            Ok(Some(Variable::text("list")))
        }

        "size" => {
            check_arity(&op, args, 1)?;
            let size = i64::try_from(items(self_ref).len()).unwrap_or(i64::MAX);
            Ok(Some(Variable::int(size)))
        }

        "==" | "=" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(equal(self_ref, &args[1])?)))
        }

        "<>" | "!=" => {
            check_arity(&op, args, 2)?;
            Ok(Some(Variable::truth(!equal(self_ref, &args[1])?)))
        }

        "clear" => {
            check_arity(&op, args, 1)?;
            with_items_mut(self_ref, Vec::clear);
            Ok(None)
        }

        "append" => {
            with_items_mut(self_ref, |list| list.extend(args[1..].iter().cloned()));
            Ok(None)
        }

        "prepend" => {
            with_items_mut(self_ref, |list| {
                for item in &args[1..] {
                    list.insert(0, item.clone());
                }
            });
            Ok(None)
        }

        "extend" => {
            let mut incoming = Vec::new();
            for arg in &args[1..] {
                match &**arg {
                    Variable::List(other) => incoming.extend(other.borrow().iter().cloned()),
                    _ => {
                        return Err(CutletError::run(
                            "Arguments to $list extend must be lists",
                        ))
                    }
                }
            }
            with_items_mut(self_ref, |list| list.extend(incoming));
            Ok(None)
        }

        "index" => index_op(self_ref, args),

        "join" => {
            if args.len() > 2 {
                return Err(arity_error("list", &op).into());
            }
            let delim = args.get(1).map_or_else(|| " ".to_owned(), ToString::to_string);
            let joined = crate::value::join(&items(self_ref), &delim);
            Ok(Some(Variable::text(joined)))
        }

        "remove" => {
            if args.len() < 2 || args.len() > 3 {
                return Err(arity_error("list", &op).into());
            }
            let len = items(self_ref).len();
            let start = normalize_index(args[1].as_int()?, len, "List")?;
            let end = match args.get(2) {
                Some(arg) => normalize_index(arg.as_int()?, len, "List")?,
                None => start + 1,
            };
            if end < start {
                return Err(CutletError::run(format!(
                    "List remove range {}-{} out of order",
                    args[1], args[2]
                )));
            }
            with_items_mut(self_ref, |list| {
                list.drain(start..end.min(list.len()));
            });
            Ok(None)
        }

        "reverse" => {
            check_arity(&op, args, 1)?;
            with_items_mut(self_ref, |list| list.reverse());
            Ok(None)
        }

        "shuffle" => {
            check_arity(&op, args, 1)?;
            use rand::seq::SliceRandom;
            with_items_mut(self_ref, |list| list.shuffle(&mut rand::thread_rng()));
            Ok(None)
        }

        "sort" => {
            if args.len() > 2 {
                return Err(arity_error("list", &op).into());
            }
            let mut snapshot = items(self_ref);
            match args.get(1) {
                None => {
                    merge_sort(&mut snapshot, &mut |a, b| Ok(a.to_string() < b.to_string()))?;
                }
                Some(comparator) => {
                    let name = comparator.to_string();
                    merge_sort(&mut snapshot, &mut |a, b| {
                        let result = interp.call(&name, &[a.clone(), b.clone()])?;
                        Ok(result.is_some_and(|value| value.truthy()))
                    })?;
                }
            }
            with_items_mut(self_ref, |list| *list = snapshot);
            Ok(None)
        }

        "unique" => {
            check_arity(&op, args, 1)?;
            let mut snapshot = items(self_ref);
            merge_sort(&mut snapshot, &mut |a, b| Ok(a.to_string() < b.to_string()))?;
            snapshot.dedup_by(|a, b| a.to_string() == b.to_string());
            with_items_mut(self_ref, |list| *list = snapshot);
            Ok(None)
        }

        "foreach" => foreach_op(self_ref, interp, args),

        _ => Err(CutletError::run(format!(
            "Unknown operator {op} for list variable."
        ))),
    }
}

/// `$list index i` reads, `$list index i [=] value` writes; either way the
/// element at the index is returned.
fn index_op(self_ref: &VarRef, args: &[VarRef]) -> CmdResult {
    if args.len() < 2 || args.len() > 4 {
        return Err(CutletError::run(
            "Invalid number of arguments to $list index index ¿¿=? value?",
        ));
    }
    let len = items(self_ref).len();
    let offset = normalize_index(args[1].as_int()?, len, "List")?;

    if args.len() == 3 {
        // $list index i value
        with_items_mut(self_ref, |list| list[offset] = args[2].clone());
    } else if args.len() == 4 {
        // $list index i = value
        if args[2].to_string() != "=" {
            return Err(CutletError::run(format!(
                "Unexpected character {}, expected =",
                args[2]
            )));
        }
        with_items_mut(self_ref, |list| list[offset] = args[3].clone());
    }

    Ok(Some(items(self_ref)[offset].clone()))
}

/// `$list foreach name body` binds each item and evaluates the body in a
/// fresh loop frame, honoring `break` and `continue`.
fn foreach_op(self_ref: &VarRef, interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
    if args.len() != 3 {
        return Err(CutletError::run(
            "Invalid number of arguments to $list foreach item body",
        ));
    }
    let name = args[1].to_string();
    let body = args[2].to_string();
    let mut compiled = None;

    for item in items(self_ref) {
        let lexical = interp.frame().clone();
        interp.push_frame(Frame::loop_frame("foreach", lexical))?;
        interp.set_local(&name, Some(item));

        // Compile on the first pass, reuse the tree after.
        let result = match &compiled {
            Some(ast) => interp.eval_ast(ast).map(|_| ()),
            None => match interp.compile(&body) {
                Ok(ast) => {
                    let eval_result = interp.eval_ast(&ast).map(|_| ());
                    compiled = Some(ast);
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
        if Frame::effective_state(interp.frame()) != FrameState::Running {
            break;
        }
    }

    Ok(None)
}

fn items(self_ref: &VarRef) -> Vec<VarRef> {
    match &**self_ref {
        Variable::List(items) => items.borrow().clone(),
        _ => unreachable!("list operators dispatch on list values"),
    }
}

fn with_items_mut<R>(self_ref: &VarRef, func: impl FnOnce(&mut Vec<VarRef>) -> R) -> R {
    match &**self_ref {
        Variable::List(items) => func(&mut items.borrow_mut()),
        _ => unreachable!("list operators dispatch on list values"),
    }
}

fn equal(self_ref: &VarRef, other: &VarRef) -> Result<bool, CutletError> {
    let mine = items(self_ref);
    let Variable::List(theirs) = &**other else {
        return Err(CutletError::run("Expected a list value to compare against"));
    };
    let theirs = theirs.borrow();
    if mine.len() != theirs.len() {
        return Ok(false);
    }
    Ok(mine
        .iter()
        .zip(theirs.iter())
        .all(|(a, b)| a.to_string() == b.to_string()))
}

/// Stable merge sort with a fallible comparator, so script-defined
/// comparators can raise without poisoning the list.
fn merge_sort<F>(items: &mut Vec<VarRef>, less: &mut F) -> Result<(), CutletError>
where
    F: FnMut(&VarRef, &VarRef) -> Result<bool, CutletError>,
{
    if items.len() <= 1 {
        return Ok(());
    }
    let mid = items.len() / 2;
    let mut right = items.split_off(mid);
    merge_sort(items, less)?;
    merge_sort(&mut right, less)?;

    let mut merged = Vec::with_capacity(items.len() + right.len());
    let mut left_it = items.drain(..).peekable();
    let mut right_it = right.into_iter().peekable();
    loop {
        match (left_it.peek(), right_it.peek()) {
            (Some(a), Some(b)) => {
                // Take from the right only when strictly less, keeping the
                // sort stable.
                if less(b, a)? {
                    merged.push(right_it.next().expect("peeked item exists"));
                } else {
                    merged.push(left_it.next().expect("peeked item exists"));
                }
            }
            (Some(_), None) => merged.push(left_it.next().expect("peeked item exists")),
            (None, Some(_)) => merged.push(right_it.next().expect("peeked item exists")),
            (None, None) => break,
        }
    }
    drop(left_it);
    *items = merged;
    Ok(())
}

fn check_arity(op: &str, args: &[VarRef], expected: usize) -> Result<(), CutletError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(arity_error("list", op).into())
    }
}
