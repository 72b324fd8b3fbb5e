//! The abstract syntax tree and its tree-walk evaluator.
//!
//! Compilation produces a [`Node`] tree; evaluation walks it against an
//! [`Interpreter`]. Nodes are shared through reference-counted handles and
//! may be evaluated many times (procedure bodies, loop bodies).
//!
//! Dispatch for a command depends on how its head was written: a head that
//! was a variable reference or a nested subcommand invokes the resulting
//! value's own operator table; any other head is resolved as a command name
//! through the current environment.

use std::rc::Rc;

use smallvec::SmallVec;
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    exception::{CodeLoc, CutletError},
    frame::{Frame, FrameState},
    interp::Interpreter,
    token::Token,
    value::{CmdResult, Variable},
};

pub type NodeRef = Rc<Node>;

/// Kind tag for AST introspection (tracers, debuggers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum NodeKind {
    Block,
    Value,
    Variable,
    Command,
    StringInterp,
    Comment,
}

/// One piece of an interpolated string: a literal run or a substitution.
#[derive(Debug)]
pub enum StringPart {
    Literal(String),
    Substitution(NodeRef),
}

/// A compiled syntax tree node.
#[derive(Debug)]
pub enum Node {
    /// A sequence of statements.
    Block(Vec<NodeRef>),
    /// A literal word or braced block; evaluates to its token text.
    Value(Token),
    /// A variable reference, resolved at evaluation time.
    Variable { token: Token, name: String },
    /// A command: head plus arguments, evaluated left to right.
    Command {
        head: NodeRef,
        args: SmallVec<[NodeRef; 4]>,
    },
    /// A quoted string with interpolation.
    StringInterp {
        token: Token,
        parts: SmallVec<[StringPart; 4]>,
    },
    /// A comment; evaluates to nothing.
    Comment(Token),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Block(_) => NodeKind::Block,
            Self::Value(_) => NodeKind::Value,
            Self::Variable { .. } => NodeKind::Variable,
            Self::Command { .. } => NodeKind::Command,
            Self::StringInterp { .. } => NodeKind::StringInterp,
            Self::Comment(_) => NodeKind::Comment,
        }
    }

    /// Source location of the node's first character.
    pub fn location(&self) -> CodeLoc {
        match self {
            Self::Block(children) => children
                .first()
                .map_or(CodeLoc::new(0), |child| child.location()),
            Self::Value(token) | Self::Comment(token) => CodeLoc::new(token.position),
            Self::Variable { token, .. } | Self::StringInterp { token, .. } => {
                CodeLoc::new(token.position)
            }
            Self::Command { head, .. } => head.location(),
        }
    }
}

/// Evaluates a node, producing a value or nothing.
pub fn eval(interp: &mut Interpreter, node: &NodeRef) -> CmdResult {
    interp.trace_node(node.kind(), node.location());

    match &**node {
        Node::Block(children) => {
            for child in children {
                eval(interp, child)?;
                if Frame::effective_state(interp.frame()) != FrameState::Running {
                    break;
                }
            }
            Ok(None)
        }

        Node::Value(token) => Ok(Some(Variable::text(token.text.clone()))),

        Node::Comment(_) => Ok(None),

        Node::Variable { name, .. } => match interp.var(name) {
            Ok(value) => Ok(Some(value)),
            Err(err) => Err(attach_context(interp, err, node.location())),
        },

        Node::StringInterp { parts, .. } => {
            let mut result = String::new();
            for part in parts {
                match part {
                    StringPart::Literal(text) => result.push_str(text),
                    StringPart::Substitution(sub) => {
                        if let Some(value) = eval(interp, sub)? {
                            result.push_str(&value.to_string());
                        }
                    }
                }
            }
            Ok(Some(Variable::text(result)))
        }

        Node::Command { head, args } => {
            let head_value = eval(interp, head)?;

            let mut params = Vec::with_capacity(args.len());
            for arg in args.iter() {
                params.push(eval(interp, arg)?.unwrap_or_else(Variable::empty));
            }

            let result = match head.kind() {
                // `$value op …` and `[cmd] op …` route through the value's
                // own dispatch table.
                NodeKind::Variable | NodeKind::Command => {
                    let value = head_value.unwrap_or_else(Variable::empty);
                    Variable::invoke(&value, interp, &params)
                }
                _ => {
                    let name = head_value.map_or_else(String::new, |value| value.to_string());
                    interp.call(&name, &params)
                }
            };

            result.map_err(|err| attach_context(interp, err, node.location()))
        }
    }
}

/// Pins a runtime error to the node where it was first observed, capturing
/// the frame chain before it unwinds. Errors already located are passed
/// through untouched.
fn attach_context(interp: &Interpreter, err: CutletError, location: CodeLoc) -> CutletError {
    match err {
        CutletError::Run(err) => {
            let mut err = err.with_location(location);
            if err.trace.is_empty() {
                err.trace = interp.backtrace();
            }
            CutletError::Run(err)
        }
        other => other,
    }
}
