//! The interpreter facade.
//!
//! Ties the tokenizer, the grammar, the frame stack, and the global
//! environment together. Compilation turns source text into a block AST;
//! evaluation walks it on the caller's thread, synchronously, to completion
//! or error. One interpreter is single-threaded; independent interpreters
//! may coexist.
//!
//! Every successful frame or tokenizer-source push pairs with a pop on both
//! the normal and the error path; helpers here own that discipline so the
//! built-ins don't repeat it.

use std::{fs::File, io::BufReader, path::Path, rc::Rc};

use libloading::Library;

use crate::{
    ast::{self, NodeKind, NodeRef},
    builtins,
    exception::{CodeLoc, CutletError},
    frame::{self, Frame, FrameRef, FrameState, StackFrame},
    io::{PrintWriter, StdPrint},
    lexer::Tokenizer,
    loader,
    parse,
    sandbox::{self, ComponentRef, NativeFn, Sandbox, SandboxRef},
    token::{Token, TokenKind},
    tracer::{NodeTracer, NoopTracer},
    value::{CmdResult, VarRef, Variable},
};

/// Ceiling on the frame stack; deep recursion fails as a runtime error
/// instead of overflowing the native stack.
pub const DEFAULT_MAX_FRAME_DEPTH: usize = 1000;

/// Directory always appended to the library search path.
pub const PKG_LIB_DIR: &str = "/usr/local/lib/cutlet";

/// Environment variable prepended to the library search path at startup.
pub const PATH_ENV_VAR: &str = "CUTLETPATH";

/// An embeddable interpreter instance.
pub struct Interpreter {
    tokens: Tokenizer,
    global: SandboxRef,
    frame: FrameRef,
    depth: usize,
    max_depth: usize,
    compiled: Option<NodeRef>,
    out: Box<dyn PrintWriter>,
    tracer: Box<dyn NodeTracer>,
    libraries: Vec<Library>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter with the built-in command set registered and
    /// output going to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(StdPrint))
    }

    /// Creates an interpreter whose `print` output goes to `out`.
    pub fn with_output(out: Box<dyn PrintWriter>) -> Self {
        let frame = Frame::call("_main_");
        // Default program result when the script never calls `return`.
        frame.borrow_mut().return_value = Some(Variable::text("0"));

        let mut interp = Self {
            tokens: Tokenizer::new(),
            global: Sandbox::new(),
            frame,
            depth: 1,
            max_depth: DEFAULT_MAX_FRAME_DEPTH,
            compiled: None,
            out,
            tracer: Box::new(NoopTracer),
            libraries: Vec::new(),
        };

        builtins::register(&mut interp);
        interp.init_library_path();
        interp
    }

    /// Seeds `library.path` from the environment and the compiled-in
    /// fallback directory, and `library.dir` with the fallback itself.
    fn init_library_path(&mut self) {
        let mut paths: Vec<VarRef> = Vec::new();
        if let Ok(env_path) = std::env::var(PATH_ENV_VAR) {
            for dir in env_path.split(':').filter(|dir| !dir.is_empty()) {
                paths.push(Variable::text(dir));
            }
        }
        let pkglibdir = Variable::text(PKG_LIB_DIR);
        paths.push(pkglibdir.clone());
        self.set_global("library.path", Some(Variable::list(paths)));
        self.set_global("library.dir", Some(pkglibdir));
    }

    // ----- environment ------------------------------------------------

    /// The current global environment.
    pub fn global(&self) -> &SandboxRef {
        &self.global
    }

    /// Registers a native function in the global environment.
    pub fn add_fn(&mut self, name: &str, func: NativeFn) {
        self.global.borrow_mut().add_fn(name, func);
    }

    /// Registers a component in the global environment.
    pub fn add(&mut self, name: &str, component: ComponentRef) {
        self.global.borrow_mut().add(name, component);
    }

    /// Removes a component from the global environment.
    pub fn remove(&mut self, name: &str) {
        self.global.borrow_mut().remove(name);
    }

    /// The component registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<ComponentRef> {
        self.global.borrow().get(name)
    }

    /// Dispatches a command by name through the global environment.
    pub fn call(&mut self, name: &str, args: &[VarRef]) -> CmdResult {
        let global = self.global.clone();
        sandbox::call(&global, self, name, args)
    }

    // ----- variables --------------------------------------------------

    /// Resolves `$name`: the frame chain first, then the global sandbox
    /// (which may consult its fallback component).
    pub fn var(&mut self, name: &str) -> Result<VarRef, CutletError> {
        if let Some(value) = Frame::lookup(&self.frame, name) {
            return Ok(value);
        }
        let global = self.global.clone();
        if let Some(value) = sandbox::resolve_variable(&global, self, name) {
            return Ok(value);
        }
        Err(CutletError::run(format!(
            "Unable to resolve variable ${name}"
        )))
    }

    /// Writes a variable in the current frame; `None` removes it.
    pub fn set_local(&mut self, name: &str, value: Option<VarRef>) {
        Frame::assign(&self.frame, name, value);
    }

    /// Writes a global variable; `None` removes it.
    pub fn set_global(&mut self, name: &str, value: Option<VarRef>) {
        self.global.borrow_mut().set_variable(name, value);
    }

    // ----- frames -----------------------------------------------------

    /// The current top frame.
    pub fn frame(&self) -> &FrameRef {
        &self.frame
    }

    /// The control-flow state governing the current frame.
    pub fn frame_state(&self) -> FrameState {
        Frame::effective_state(&self.frame)
    }

    /// Ends the enclosing call frame with an optional result.
    pub fn frame_done(&mut self, result: Option<VarRef>) {
        Frame::done(&self.frame, result);
    }

    /// The n-th ancestor of the current frame, refusing to cross a sandbox
    /// barrier.
    pub fn uplevel(&self, levels: usize) -> Result<FrameRef, CutletError> {
        Frame::uplevel(&self.frame, levels).map_err(CutletError::Run)
    }

    /// Pushes a frame onto the stack.
    pub fn push_frame(&mut self, frame: FrameRef) -> Result<(), CutletError> {
        if self.depth >= self.max_depth {
            return Err(CutletError::run(format!(
                "Maximum frame depth of {} exceeded",
                self.max_depth
            )));
        }
        frame.borrow_mut().parent = Some(self.frame.clone());
        self.frame = frame;
        self.depth += 1;
        Ok(())
    }

    /// Pushes a frame and swaps the global environment for `sandbox` until
    /// the frame is popped.
    pub fn push_frame_sandbox(
        &mut self,
        frame: FrameRef,
        sandbox: SandboxRef,
    ) -> Result<(), CutletError> {
        frame.borrow_mut().saved_global = Some(self.global.clone());
        self.global = sandbox;
        self.push_frame(frame)
    }

    /// Pops the top frame, returning its return value and restoring a saved
    /// global environment if the frame carried one. The root frame is never
    /// removed; popping it just reads its return value.
    pub fn pop_frame(&mut self) -> Option<VarRef> {
        let (result, saved, parent) = {
            let inner = self.frame.borrow();
            (
                inner.return_value.clone(),
                inner.saved_global.clone(),
                inner.parent.clone(),
            )
        };
        if let Some(parent) = parent {
            self.frame = parent;
            self.depth -= 1;
        }
        if let Some(saved) = saved {
            self.global = saved;
        }
        result
    }

    /// Pops frames until `target` is on top again.
    pub fn pop_frame_until(&mut self, target: &FrameRef) {
        while !Rc::ptr_eq(&self.frame, target) {
            if self.frame.borrow().parent.is_none() {
                break;
            }
            self.pop_frame();
        }
    }

    /// Sets the frame-depth ceiling.
    pub fn set_max_frame_depth(&mut self, depth: usize) {
        self.max_depth = depth;
    }

    /// The return value of the current frame, used by drivers for the
    /// process exit status.
    pub fn result(&self) -> Option<VarRef> {
        self.frame.borrow().return_value.clone()
    }

    /// The frame chain rendered root-ward for error reporting.
    pub fn backtrace(&self) -> Vec<StackFrame> {
        frame::backtrace(&self.frame)
    }

    // ----- compilation and evaluation ---------------------------------

    /// Compiles source text to a block AST without evaluating it.
    pub fn compile(&mut self, code: &str) -> Result<NodeRef, CutletError> {
        self.tokens.push_source_str(code)?;
        let result = parse::parse_script(&mut self.tokens);
        self.tokens.pop_source();
        let node = result?;
        self.compiled = Some(node.clone());
        Ok(node)
    }

    /// The most recently compiled tree, if any.
    pub fn compiled(&self) -> Option<NodeRef> {
        self.compiled.clone()
    }

    /// Compiles source text as a single command.
    pub fn compile_command(&mut self, code: &str) -> Result<NodeRef, CutletError> {
        self.tokens.push_source_str(code)?;
        let result = parse::parse_command(&mut self.tokens);
        self.tokens.pop_source();
        result
    }

    /// Evaluates a compiled tree in the current frame.
    pub fn eval_ast(&mut self, node: &NodeRef) -> CmdResult {
        ast::eval(self, node)
    }

    /// Compiles and evaluates source text in the current frame.
    pub fn run(&mut self, code: &str) -> CmdResult {
        let node = self.compile(code)?;
        ast::eval(self, &node)
    }

    /// Compiles and evaluates a stream in the current frame. Brace blocks
    /// may span refills, which is what makes multi-line bodies work from
    /// pipes.
    pub fn run_stream(&mut self, stream: Box<dyn std::io::BufRead>) -> CmdResult {
        self.tokens.push_source_stream(stream)?;
        let result = parse::parse_script(&mut self.tokens);
        self.tokens.pop_source();
        let node = result?;
        self.compiled = Some(node.clone());
        ast::eval(self, &node)
    }

    /// Compiles and evaluates a file.
    pub fn run_file(&mut self, path: &str) -> CmdResult {
        let file = File::open(path)
            .map_err(|err| CutletError::run(format!("{path}: {err}")))?;
        self.run_stream(Box::new(BufReader::new(file)))
    }

    /// Evaluates source text as a single command and returns its value.
    /// This is the evaluation path `if` and `while` conditions take.
    pub fn expr(&mut self, code: &str) -> CmdResult {
        let node = self.compile_command(code)?;
        ast::eval(self, &node)
    }

    /// Parses brace-block list syntax into a list value: words become
    /// strings, nested braces become nested lists. Nothing is evaluated.
    pub fn parse_list(&mut self, code: &str) -> Result<VarRef, CutletError> {
        let token = Token::with_offset(TokenKind::Block, code, 0, 0);
        self.tokens.push_source_token(&token)?;
        let result = self.collect_list_items();
        self.tokens.pop_source();
        result
    }

    fn collect_list_items(&mut self) -> Result<VarRef, CutletError> {
        let mut items = Vec::new();
        while self.tokens.is_more() && !self.tokens.expect(TokenKind::Eof) {
            let token = self.tokens.get_token()?;
            match token.kind {
                TokenKind::Block => items.push(self.parse_list(&token.text)?),
                TokenKind::Eol => {}
                _ => items.push(Variable::text(token.text)),
            }
        }
        Ok(Variable::list(items))
    }

    // ----- libraries --------------------------------------------------

    /// Searches `library.path` for `name.cutlet` (source) or a native
    /// module, loading whichever is found first.
    pub fn import(&mut self, name: &str) -> Result<(), CutletError> {
        let paths = self.var("library.path")?;
        let dirs: Vec<String> = match &*paths {
            Variable::List(items) => items.borrow().iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        };

        for dir in dirs {
            let source = format!("{dir}/{name}.cutlet");
            if Path::new(&source).exists() {
                self.run_file(&source)?;
                return Ok(());
            }
            let native = format!("{dir}/{name}{}", loader::SO_EXT);
            if Path::new(&native).exists() {
                return self.load_library(&native);
            }
        }

        Err(CutletError::run(format!("Library {name} not found.")))
    }

    /// Loads a native module and retains its handle for the interpreter's
    /// lifetime.
    pub fn load_library(&mut self, path: &str) -> Result<(), CutletError> {
        let library = loader::load(self, path)?;
        self.libraries.push(library);
        Ok(())
    }

    // ----- output and tracing -----------------------------------------

    /// Writes through the interpreter's print writer.
    pub fn write_output(&mut self, text: &str) -> Result<(), CutletError> {
        self.out.write_text(text).map_err(CutletError::Run)
    }

    /// Writes a single character through the interpreter's print writer.
    pub fn write_output_char(&mut self, ch: char) -> Result<(), CutletError> {
        self.out.push_char(ch).map_err(CutletError::Run)
    }

    /// Installs an evaluation tracer.
    pub fn set_tracer(&mut self, tracer: Box<dyn NodeTracer>) {
        self.tracer = tracer;
    }

    /// Removes the current tracer, returning it for inspection.
    pub fn take_tracer(&mut self) -> Box<dyn NodeTracer> {
        std::mem::replace(&mut self.tracer, Box::new(NoopTracer))
    }

    pub(crate) fn trace_node(&mut self, kind: NodeKind, location: CodeLoc) {
        self.tracer.on_node(kind, location);
    }
}
