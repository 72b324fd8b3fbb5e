//! Runtime values.
//!
//! A [`Variable`] is a tagged union of the primitive types the language
//! computes with: UTF-8 text, ordered lists, booleans, and opaque
//! host-defined values. Values are shared through reference-counted
//! [`VarRef`] handles; text and lists carry interior mutability because the
//! `insert` and list operators mutate in place.
//!
//! Reference counting means list-of-list cycles are never reclaimed before
//! the process exits. Scripts that build cyclic data keep it alive; nothing
//! else in the interpreter is affected.
//!
//! Every value coerces to a string, and that coercion is total. Method
//! dispatch treats the first argument of a value-as-command invocation as an
//! operator name; the per-type operator tables live in [`crate::types`].

use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    exception::{CutletError, RunError},
    interp::Interpreter,
    types,
};

/// Shared handle to a runtime value.
pub type VarRef = Rc<Variable>;

/// Result of invoking a value or a command: a value, nothing, or an error.
pub type CmdResult = Result<Option<VarRef>, CutletError>;

/// A runtime value.
#[derive(Debug)]
pub enum Variable {
    /// UTF-8 text. The workhorse type: words, quoted strings, and numbers
    /// all live here.
    Text(RefCell<String>),
    /// An ordered sequence of values.
    List(RefCell<Vec<VarRef>>),
    /// A single bit.
    Bool(bool),
    /// A host- or extension-defined value carrying its own dispatch table.
    Opaque(Rc<dyn OpaqueVariable>),
}

/// Extension point for values the core does not know about (sandbox handles,
/// extension-defined objects). Implementations provide their own operator
/// dispatch and string coercion.
pub trait OpaqueVariable: fmt::Debug {
    /// The name reported by the `type` operator.
    fn type_name(&self) -> &'static str;

    /// Operator dispatch for `$value op args…` invocations.
    fn invoke(&self, interp: &mut Interpreter, args: &[VarRef]) -> CmdResult;

    /// String coercion; defaults to the empty string.
    fn coerce(&self) -> String {
        String::new()
    }
}

impl Variable {
    pub fn text(value: impl Into<String>) -> VarRef {
        Rc::new(Self::Text(RefCell::new(value.into())))
    }

    pub fn int(value: i64) -> VarRef {
        Self::text(value.to_string())
    }

    pub fn list(items: Vec<VarRef>) -> VarRef {
        Rc::new(Self::List(RefCell::new(items)))
    }

    pub fn truth(value: bool) -> VarRef {
        Rc::new(Self::Bool(value))
    }

    pub fn opaque(value: Rc<dyn OpaqueVariable>) -> VarRef {
        Rc::new(Self::Opaque(value))
    }

    /// The empty string value, used where a command produced nothing but a
    /// value is still needed.
    pub fn empty() -> VarRef {
        Self::text("")
    }

    /// Parses a boolean from text: `true`, `yes`, and `on` (any case) are
    /// true, anything else is false.
    pub fn bool_from_str(value: &str) -> bool {
        let cooked = value.to_lowercase();
        cooked == "true" || cooked == "yes" || cooked == "on"
    }

    /// Condition truthiness: booleans use their bit; anything else is true
    /// unless its string form is `false`, `0`, or empty.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            other => {
                let value = other.to_string();
                !(value == "false" || value == "0" || value.is_empty())
            }
        }
    }

    /// Strict integer coercion; failures are runtime errors.
    pub fn as_int(&self) -> Result<i64, RunError> {
        let text = self.to_string();
        text.trim()
            .parse::<i64>()
            .map_err(|_| RunError::new(format!("Expected a number but got \"{text}\"")))
    }

    /// The name reported by the `type` operator.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "string",
            Self::List(_) => "list",
            Self::Bool(_) => "boolean",
            Self::Opaque(value) => value.type_name(),
        }
    }

    /// Invokes the value as a command: `$value op args…`.
    ///
    /// The first argument selects a per-type operator. A text value whose
    /// operator is unrecognized falls through to command resolution under
    /// its own string form; lists and booleans reject unknown operators.
    /// With no arguments at all the value echoes itself.
    pub fn invoke(self_ref: &VarRef, interp: &mut Interpreter, args: &[VarRef]) -> CmdResult {
        if args.is_empty() {
            return Ok(Some(self_ref.clone()));
        }
        match &**self_ref {
            Variable::Text(_) => types::str::invoke(self_ref, interp, args),
            Variable::List(_) => types::list::invoke(self_ref, interp, args),
            Variable::Bool(value) => types::boolean::invoke(*value, interp, args),
            Variable::Opaque(value) => value.clone().invoke(interp, args),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => write!(f, "{}", value.borrow()),
            Self::List(items) => {
                write!(f, "{{")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            Self::Bool(value) => write!(f, "{}", if *value { "true" } else { "false" }),
            Self::Opaque(value) => write!(f, "{}", value.coerce()),
        }
    }
}

impl From<bool> for Variable {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for Variable {
    fn from(value: String) -> Self {
        Self::Text(RefCell::new(value))
    }
}

impl From<&str> for Variable {
    fn from(value: &str) -> Self {
        Self::Text(RefCell::new(value.to_owned()))
    }
}

/// Joins values by their string coercions.
pub fn join(items: &[VarRef], delim: &str) -> String {
    let mut result = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            result.push_str(delim);
        }
        result.push_str(&item.to_string());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_coercion_is_total() {
        assert_eq!(Variable::text("abc").to_string(), "abc");
        assert_eq!(Variable::truth(true).to_string(), "true");
        assert_eq!(Variable::truth(false).to_string(), "false");
        let list = Variable::list(vec![Variable::text("a"), Variable::text("b")]);
        assert_eq!(list.to_string(), "{a b}");
    }

    #[test]
    fn boolean_parsing() {
        assert!(Variable::bool_from_str("TRUE"));
        assert!(Variable::bool_from_str("yes"));
        assert!(Variable::bool_from_str("On"));
        assert!(!Variable::bool_from_str("1"));
        assert!(!Variable::bool_from_str(""));
    }

    #[test]
    fn truthiness() {
        assert!(Variable::text("anything").truthy());
        assert!(!Variable::text("false").truthy());
        assert!(!Variable::text("0").truthy());
        assert!(!Variable::text("").truthy());
        assert!(!Variable::truth(false).truthy());
    }

    #[test]
    fn integer_coercion() {
        assert_eq!(Variable::text(" 42 ").as_int().unwrap(), 42);
        assert_eq!(Variable::text("-7").as_int().unwrap(), -7);
        assert!(Variable::text("nope").as_int().is_err());
    }

    #[test]
    fn join_values() {
        let items = vec![Variable::text("a"), Variable::int(2)];
        assert_eq!(join(&items, ", "), "a, 2");
    }
}
