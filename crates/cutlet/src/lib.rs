#![doc = include_str!("../../../README.md")]

pub mod ast;
pub mod builtins;
pub mod exception;
pub mod expr;
pub mod frame;
pub mod interp;
pub mod io;
pub mod lexer;
pub mod loader;
pub mod parse;
pub mod sandbox;
pub mod token;
pub mod tracer;
pub mod types;
pub mod utf8;
pub mod value;

pub use crate::{
    ast::{Node, NodeKind, NodeRef},
    exception::{CodeLoc, CutletError, RunError, SyntaxError},
    frame::{backtrace, render_backtrace, Frame, FrameKind, FrameRef, FrameState, StackFrame},
    interp::{Interpreter, DEFAULT_MAX_FRAME_DEPTH, PATH_ENV_VAR, PKG_LIB_DIR},
    io::{CollectPrint, NoPrint, PrintWriter, StdPrint},
    lexer::Tokenizer,
    sandbox::{Component, ComponentRef, NativeFn, Sandbox, SandboxRef},
    token::{Token, TokenKind},
    tracer::{NodeTracer, NoopTracer, RecordingTracer, StderrTracer},
    value::{CmdResult, OpaqueVariable, VarRef, Variable},
};
