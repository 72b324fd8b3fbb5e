//! Output plumbing for the `print` command.
//!
//! Hosts embed the interpreter in places where stdout is the wrong
//! destination (tests, editors, servers), so `print` writes through a
//! [`PrintWriter`] owned by the interpreter rather than touching
//! `std::io::stdout` directly.

use std::{
    cell::RefCell,
    io::{self, Write},
    rc::Rc,
};

use crate::exception::RunError;

/// Destination for `print` output.
pub trait PrintWriter {
    /// Writes one already-formatted chunk, no separators or terminator.
    fn write_text(&mut self, text: &str) -> Result<(), RunError>;

    /// Writes a single separator or terminator character.
    fn push_char(&mut self, ch: char) -> Result<(), RunError>;
}

/// Default writer: line-buffered stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn write_text(&mut self, text: &str) -> Result<(), RunError> {
        io::stdout()
            .write_all(text.as_bytes())
            .map_err(|err| RunError::new(err.to_string()))
    }

    fn push_char(&mut self, ch: char) -> Result<(), RunError> {
        let mut buf = [0u8; 4];
        let encoded = ch.encode_utf8(&mut buf);
        io::stdout()
            .write_all(encoded.as_bytes())
            .map_err(|err| RunError::new(err.to_string()))
    }
}

/// Writer that collects everything into a shared string buffer.
///
/// The buffer handle survives handing the writer to an interpreter, so tests
/// can read the output afterwards:
///
/// ```
/// use cutlet::{CollectPrint, Interpreter};
///
/// let output = CollectPrint::new();
/// let buffer = output.buffer();
/// let mut interp = Interpreter::with_output(Box::new(output));
/// interp.run("print hi").unwrap();
/// assert_eq!(buffer.borrow().as_str(), "hi\n");
/// ```
#[derive(Debug, Default)]
pub struct CollectPrint {
    buffer: Rc<RefCell<String>>,
}

impl CollectPrint {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle onto the shared buffer.
    pub fn buffer(&self) -> Rc<RefCell<String>> {
        self.buffer.clone()
    }
}

impl PrintWriter for CollectPrint {
    fn write_text(&mut self, text: &str) -> Result<(), RunError> {
        self.buffer.borrow_mut().push_str(text);
        Ok(())
    }

    fn push_char(&mut self, ch: char) -> Result<(), RunError> {
        self.buffer.borrow_mut().push(ch);
        Ok(())
    }
}

/// Writer that discards all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn write_text(&mut self, _text: &str) -> Result<(), RunError> {
        Ok(())
    }

    fn push_char(&mut self, _ch: char) -> Result<(), RunError> {
        Ok(())
    }
}
