//! Named environments.
//!
//! A sandbox holds the two tables command dispatch and global-variable
//! resolution run against: named components (callables) and global
//! variables. The interpreter always has one current global sandbox;
//! sandbox values created by scripts swap it for the duration of an `eval`.
//!
//! Two reserved component names provide resolution fallbacks: `¿component?`
//! is consulted for unresolved command names and `¿variable?` for
//! unresolved global variable reads, each invoked with the missing name
//! prepended to the original arguments.

use std::{cell::RefCell, fmt, rc::Rc};

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::{
    exception::CutletError,
    interp::Interpreter,
    value::{CmdResult, VarRef, Variable},
};

/// Fallback component consulted for unresolved command names.
pub const COMPONENT_FALLBACK: &str = "¿component?";
/// Fallback component consulted for unresolved variable reads.
pub const VARIABLE_FALLBACK: &str = "¿variable?";

/// A named callable registered in a sandbox.
pub trait Component {
    fn invoke(&self, interp: &mut Interpreter, args: &[VarRef]) -> CmdResult;
}

pub type ComponentRef = Rc<dyn Component>;

/// Plain function components, the form all built-ins take.
pub type NativeFn = fn(&mut Interpreter, &[VarRef]) -> CmdResult;

/// Any plain function or closure with the right shape is a component.
impl<F> Component for F
where
    F: Fn(&mut Interpreter, &[VarRef]) -> CmdResult,
{
    fn invoke(&self, interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
        self(interp, args)
    }
}

pub type SandboxRef = Rc<RefCell<Sandbox>>;

/// A collection of components and global variables; the isolation unit.
#[derive(Default)]
pub struct Sandbox {
    variables: AHashMap<String, VarRef>,
    components: IndexMap<String, ComponentRef>,
}

impl fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sandbox")
            .field("variables", &self.variables.len())
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Sandbox {
    pub fn new() -> SandboxRef {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Registers a native function under `name`.
    pub fn add_fn(&mut self, name: &str, func: NativeFn) {
        let component: ComponentRef = Rc::new(func);
        self.components.insert(name.to_owned(), component);
    }

    /// Registers a component under `name`.
    pub fn add(&mut self, name: &str, component: ComponentRef) {
        self.components.insert(name.to_owned(), component);
    }

    /// Removes the component registered under `name`.
    pub fn remove(&mut self, name: &str) {
        self.components.shift_remove(name);
    }

    /// Drops every component and variable.
    pub fn clear(&mut self) {
        self.variables.clear();
        self.components.clear();
    }

    /// The component registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<ComponentRef> {
        self.components.get(name).cloned()
    }

    /// Reads a stored global variable without consulting the fallback.
    pub fn get_variable(&self, name: &str) -> Option<VarRef> {
        self.variables.get(name).cloned()
    }

    /// Writes a global variable; `None` removes the binding.
    pub fn set_variable(&mut self, name: &str, value: Option<VarRef>) {
        match value {
            Some(value) => {
                self.variables.insert(name.to_owned(), value);
            }
            None => {
                self.variables.remove(name);
            }
        }
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Iterates the registered component names in registration order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }
}

/// Resolves a global variable read, falling back to the sandbox's
/// `¿variable?` component when the name has no stored value. Fallback
/// failures read as "not found".
pub fn resolve_variable(sandbox: &SandboxRef, interp: &mut Interpreter, name: &str) -> Option<VarRef> {
    let fallback = {
        let inner = sandbox.borrow();
        if let Some(value) = inner.variables.get(name) {
            return Some(value.clone());
        }
        inner.components.get(VARIABLE_FALLBACK).cloned()
    };
    let fallback = fallback?;
    let args = [Variable::text(name)];
    match fallback.invoke(interp, &args) {
        Ok(value) => value,
        Err(_) => None,
    }
}

/// Dispatches a command through the sandbox: the named component if
/// registered, otherwise `¿component?` with the name prepended.
pub fn call(
    sandbox: &SandboxRef,
    interp: &mut Interpreter,
    name: &str,
    args: &[VarRef],
) -> CmdResult {
    let component = sandbox.borrow().components.get(name).cloned();
    if let Some(component) = component {
        return component.invoke(interp, args);
    }

    let fallback = sandbox.borrow().components.get(COMPONENT_FALLBACK).cloned();
    match fallback {
        Some(component) => {
            let mut forwarded = Vec::with_capacity(args.len() + 1);
            forwarded.push(Variable::text(name));
            forwarded.extend(args.iter().cloned());
            component.invoke(interp, &forwarded)
        }
        None => Err(CutletError::run(format!("Unresolved component \"{name}\""))),
    }
}
