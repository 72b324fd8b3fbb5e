//! Execution frames.
//!
//! Frames form a singly-linked chain rooted at the global environment. Three
//! variants share one structure and differ only in how they resolve
//! variables and where control-flow states land:
//!
//! - **Call** frames (procedure bodies, the root): locals resolve here only,
//!   and `Done`/`Break`/`Continue` stop here.
//! - **Block** frames (`if` bodies, `try` bodies, `uplevel`): lookups fall
//!   through to the lexical parent, assignment targets the nearest existing
//!   binding, and control-flow states delegate upward.
//! - **Loop** frames (`while`/`foreach` bodies): like block frames, except
//!   `Break` and `Continue` are absorbed here for the loop construct to read
//!   after each iteration.
//!
//! A frame that entered a sandbox carries the previous global environment in
//! `saved_global`; popping it restores the environment, and the saved handle
//! doubles as the barrier `uplevel` refuses to cross.

use std::{cell::RefCell, rc::Rc};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    exception::RunError,
    sandbox::SandboxRef,
    value::VarRef,
};

pub type FrameRef = Rc<RefCell<Frame>>;

/// Which resolution and propagation policy a frame uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Call,
    Block,
    Loop,
}

/// Control-flow state of a frame.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum FrameState {
    Running,
    Done,
    Break,
    Continue,
}

/// One entry of a lexical scope chain.
#[derive(Debug)]
pub struct Frame {
    pub kind: FrameKind,
    /// Dynamic link: the frame that was on top when this one was pushed.
    /// Popping follows this chain.
    pub parent: Option<FrameRef>,
    /// Lexical link for block and loop frames: where lookups, assignments,
    /// and control-flow states fall through to. `uplevel` makes this differ
    /// from `parent`.
    pub lexical: Option<FrameRef>,
    pub state: FrameState,
    pub label: String,
    pub return_value: Option<VarRef>,
    pub locals: AHashMap<String, VarRef>,
    /// The global environment to restore on pop, present only on frames
    /// that entered a sandbox. Also acts as the `uplevel` barrier.
    pub saved_global: Option<SandboxRef>,
}

impl Frame {
    pub fn call(label: impl Into<String>) -> FrameRef {
        Rc::new(RefCell::new(Self {
            kind: FrameKind::Call,
            parent: None,
            lexical: None,
            state: FrameState::Running,
            label: label.into(),
            return_value: None,
            locals: AHashMap::new(),
            saved_global: None,
        }))
    }

    pub fn block(label: impl Into<String>, lexical: FrameRef) -> FrameRef {
        let frame = Self::call(label);
        {
            let mut inner = frame.borrow_mut();
            inner.kind = FrameKind::Block;
            inner.lexical = Some(lexical);
        }
        frame
    }

    pub fn loop_frame(label: impl Into<String>, lexical: FrameRef) -> FrameRef {
        let frame = Self::block(label, lexical);
        frame.borrow_mut().kind = FrameKind::Loop;
        frame
    }

    /// Resolves a variable: this frame's locals, then — for block and loop
    /// frames — the lexical chain up to and including the enclosing call
    /// frame.
    pub fn lookup(frame: &FrameRef, name: &str) -> Option<VarRef> {
        let mut current = frame.clone();
        loop {
            let next = {
                let inner = current.borrow();
                if let Some(value) = inner.locals.get(name) {
                    return Some(value.clone());
                }
                match inner.kind {
                    FrameKind::Call => return None,
                    FrameKind::Block | FrameKind::Loop => inner.lexical.clone()?,
                }
            };
            current = next;
        }
    }

    /// Assigns a variable. Call frames write their own locals. Block and
    /// loop frames write the nearest existing binding in the lexical chain,
    /// creating a new local here only when no binding exists anywhere.
    /// Assigning `None` removes the binding.
    pub fn assign(frame: &FrameRef, name: &str, value: Option<VarRef>) {
        // Find the frame that already binds the name.
        let mut current = frame.clone();
        let target = loop {
            let next = {
                let inner = current.borrow();
                if inner.locals.contains_key(name) {
                    break Some(current.clone());
                }
                match inner.kind {
                    FrameKind::Call => break None,
                    FrameKind::Block | FrameKind::Loop => match inner.lexical.clone() {
                        Some(lexical) => lexical,
                        None => break None,
                    },
                }
            };
            current = next;
        };

        let destination = target.unwrap_or_else(|| frame.clone());
        let mut inner = destination.borrow_mut();
        match value {
            Some(value) => {
                inner.locals.insert(name.to_owned(), value);
            }
            None => {
                inner.locals.remove(name);
            }
        }
    }

    /// The state that governs whether evaluation in this frame continues: a
    /// loop frame's own break/continue, otherwise whatever the enclosing
    /// call frame says.
    pub fn effective_state(frame: &FrameRef) -> FrameState {
        let mut current = frame.clone();
        loop {
            let next = {
                let inner = current.borrow();
                match inner.kind {
                    FrameKind::Call => return inner.state,
                    FrameKind::Loop if inner.state != FrameState::Running => return inner.state,
                    FrameKind::Block | FrameKind::Loop => match inner.lexical.clone() {
                        Some(lexical) => lexical,
                        None => return inner.state,
                    },
                }
            };
            current = next;
        }
    }

    /// Routes a control-flow state to the frame responsible for it: loop
    /// frames absorb `Break`/`Continue`, call frames absorb everything else.
    pub fn set_state(frame: &FrameRef, state: FrameState) {
        let mut current = frame.clone();
        loop {
            let next = {
                let mut inner = current.borrow_mut();
                let absorbs = match inner.kind {
                    FrameKind::Call => true,
                    FrameKind::Loop => {
                        matches!(state, FrameState::Break | FrameState::Continue)
                    }
                    FrameKind::Block => false,
                };
                if absorbs {
                    inner.state = state;
                    return;
                }
                match inner.lexical.clone() {
                    Some(lexical) => lexical,
                    None => {
                        inner.state = state;
                        return;
                    }
                }
            };
            current = next;
        }
    }

    /// Ends the enclosing call frame with an optional return value; `return`
    /// inside any nested block returns from the enclosing procedure.
    pub fn done(frame: &FrameRef, result: Option<VarRef>) {
        let mut current = frame.clone();
        loop {
            let next = {
                let mut inner = current.borrow_mut();
                match inner.kind {
                    FrameKind::Call => {
                        inner.state = FrameState::Done;
                        inner.return_value = result;
                        return;
                    }
                    FrameKind::Block | FrameKind::Loop => match inner.lexical.clone() {
                        Some(lexical) => lexical,
                        None => {
                            inner.state = FrameState::Done;
                            inner.return_value = result;
                            return;
                        }
                    },
                }
            };
            current = next;
        }
    }

    /// The n-th ancestor along the lexical-then-dynamic chain, refusing to
    /// cross a sandbox barrier.
    pub fn uplevel(frame: &FrameRef, levels: usize) -> Result<FrameRef, RunError> {
        let mut current = frame.clone();
        for _ in 0..levels {
            let next = {
                let inner = current.borrow();
                if inner.saved_global.is_some() {
                    return Err(RunError::new("Frame level out of range"));
                }
                inner.parent.clone()
            };
            match next {
                Some(parent) => current = parent,
                None => return Err(RunError::new("Frame level out of range")),
            }
        }
        Ok(current)
    }

    /// The display label, marked with the frame variant the way traces
    /// render it.
    pub fn display_label(&self) -> String {
        match self.kind {
            FrameKind::Call => self.label.clone(),
            FrameKind::Block => format!("^ {}", self.label),
            FrameKind::Loop => format!("@ {}", self.label),
        }
    }
}

/// One frame of a rendered stack trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackFrame {
    /// 1-based depth, the root frame being level 1.
    pub level: usize,
    pub label: String,
    pub state: FrameState,
    /// Currently bound locals with their string coercions, sorted by name.
    pub locals: Vec<(String, String)>,
}

/// Walks the dynamic chain from `top` rootward, producing one entry per
/// frame.
pub fn backtrace(top: &FrameRef) -> Vec<StackFrame> {
    let mut frames = Vec::new();
    let mut current = Some(top.clone());
    while let Some(frame) = current {
        let inner = frame.borrow();
        let mut locals: Vec<(String, String)> = inner
            .locals
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        locals.sort();
        frames.push(StackFrame {
            level: 0,
            label: inner.display_label(),
            state: inner.state,
            locals,
        });
        current = inner.parent.clone();
    }
    let depth = frames.len();
    for (i, frame) in frames.iter_mut().enumerate() {
        frame.level = depth - i;
    }
    frames
}

/// Renders a backtrace the way the driver prints it on an uncaught error.
pub fn render_backtrace(frames: &[StackFrame]) -> String {
    let mut out = String::new();
    for frame in frames {
        out.push_str(&format!("{}: {}", frame.level, frame.label));
        if frame.state != FrameState::Running {
            out.push_str(&format!(" ({})", frame.state));
        }
        out.push('\n');
        for (name, value) in &frame.locals {
            out.push_str(&format!("  ${name} = {value}\n"));
        }
    }
    out
}
