//! Evaluation tracing.
//!
//! The evaluator calls the interpreter's tracer once per AST node, right
//! before the node runs. The default [`NoopTracer`] costs a virtual call
//! and nothing else; hosts that want an execution log or programmatic
//! introspection (debuggers, coverage tooling) install one of the other
//! implementations or their own.

use std::{cell::RefCell, rc::Rc};

use crate::{ast::NodeKind, exception::CodeLoc};

/// Hook invoked before each AST node evaluation.
pub trait NodeTracer {
    /// Called with the node's kind tag and source location.
    fn on_node(&mut self, _kind: NodeKind, _location: CodeLoc) {}
}

/// Tracer that does nothing; the default.
#[derive(Debug, Default)]
pub struct NoopTracer;

impl NodeTracer for NoopTracer {}

/// Tracer that writes a human-readable line per node to stderr.
#[derive(Debug, Default)]
pub struct StderrTracer;

impl NodeTracer for StderrTracer {
    fn on_node(&mut self, kind: NodeKind, location: CodeLoc) {
        eprintln!("trace: {location}: {kind}");
    }
}

/// Tracer that records every event into a shared buffer.
///
/// The buffer handle survives handing the tracer to an interpreter, so the
/// events can be read back afterwards.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Rc<RefCell<Vec<(NodeKind, CodeLoc)>>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle onto the recorded events.
    pub fn events(&self) -> Rc<RefCell<Vec<(NodeKind, CodeLoc)>>> {
        self.events.clone()
    }
}

impl NodeTracer for RecordingTracer {
    fn on_node(&mut self, kind: NodeKind, location: CodeLoc) {
        self.events.borrow_mut().push((kind, location));
    }
}
