//! Error taxa for the interpreter.
//!
//! Two kinds of failure exist and stay distinct all the way to the host:
//!
//! - [`SyntaxError`] — produced by the tokenizer or the grammar. Carries the
//!   offending token (value and position) alongside the message.
//! - [`RunError`] — produced during evaluation. Carries the source location
//!   of the AST node where the error was first observed; re-wrapping while
//!   unwinding never overwrites the original location.
//!
//! Errors are not recovered inside the evaluator. They propagate until a
//! handler (the `try` command) consumes them, or reach the host, which
//! renders the message and the frame trace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{frame::StackFrame, token::Token};

/// A byte-offset location in the source most recently fed to the
/// interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLoc {
    pub offset: usize,
}

impl CodeLoc {
    pub fn new(offset: usize) -> Self {
        Self { offset }
    }
}

impl fmt::Display for CodeLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.offset)
    }
}

/// A tokenizer or grammar failure.
#[derive(Debug, Clone)]
pub struct SyntaxError {
    pub message: String,
    pub token: Token,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, token: Token) -> Self {
        Self {
            message: message.into(),
            token,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, \"{}\"", self.message, self.token.text)
    }
}

impl std::error::Error for SyntaxError {}

/// An evaluation failure.
///
/// The frame trace is captured where the error is first observed, before
/// the stack unwinds, so the host can still report the full chain.
#[derive(Debug, Clone)]
pub struct RunError {
    pub message: String,
    pub location: Option<CodeLoc>,
    pub trace: Vec<StackFrame>,
}

impl RunError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            trace: Vec::new(),
        }
    }

    /// Attaches a location unless one was already recorded further down the
    /// tree.
    pub fn with_location(mut self, location: CodeLoc) -> Self {
        if self.location.is_none() {
            self.location = Some(location);
        }
        self
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(f, "{}: {}", loc, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RunError {}

/// Any failure the interpreter can produce.
#[derive(Debug, Clone)]
pub enum CutletError {
    Syntax(SyntaxError),
    Run(RunError),
}

impl CutletError {
    /// Creates a runtime error with no location yet.
    pub fn run(message: impl Into<String>) -> Self {
        Self::Run(RunError::new(message))
    }

    /// The human-readable message without location decoration.
    pub fn message(&self) -> &str {
        match self {
            Self::Syntax(err) => &err.message,
            Self::Run(err) => &err.message,
        }
    }

}

impl fmt::Display for CutletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(err) => write!(f, "{err}"),
            Self::Run(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CutletError {}

impl From<SyntaxError> for CutletError {
    fn from(err: SyntaxError) -> Self {
        Self::Syntax(err)
    }
}

impl From<RunError> for CutletError {
    fn from(err: RunError) -> Self {
        Self::Run(err)
    }
}

impl From<std::io::Error> for CutletError {
    fn from(err: std::io::Error) -> Self {
        Self::run(err.to_string())
    }
}
