//! Native extension loading.
//!
//! A native module is a shared library exposing one entry point:
//!
//! ```c
//! void init_cutlet(cutlet_interpreter *interp);
//! ```
//!
//! On load the interpreter resolves `init_cutlet` and calls it with itself,
//! letting the module register components and variables. The library handle
//! stays owned by the interpreter and is released when the interpreter is
//! dropped, so registered function pointers never outlive their code.

use libloading::Library;

use crate::{exception::CutletError, interp::Interpreter};

/// Registration entry point every native module must export.
pub type InitFn = unsafe extern "C" fn(*mut Interpreter);

pub const INIT_SYMBOL: &[u8] = b"init_cutlet\0";

/// Platform suffix for native modules.
#[cfg(target_os = "macos")]
pub const SO_EXT: &str = ".dylib";
#[cfg(target_os = "windows")]
pub const SO_EXT: &str = ".dll";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const SO_EXT: &str = ".so";

/// Loads the module at `path` and runs its registration entry point.
///
/// Returns the live library handle for the interpreter to retain.
pub fn load(interp: &mut Interpreter, path: &str) -> Result<Library, CutletError> {
    // SAFETY: loading runs the module's initializers, and the resolved
    // init_cutlet is called with a valid interpreter pointer. The caller
    // keeps the returned handle alive for as long as the interpreter can
    // reach anything the module registered.
    unsafe {
        let library = Library::new(path)
            .map_err(|err| CutletError::run(format!("Unable to load native library {path}: {err}")))?;
        let init: libloading::Symbol<'_, InitFn> = library.get(INIT_SYMBOL).map_err(|_| {
            CutletError::run(format!("init_cutlet missing in library {path}"))
        })?;
        init(std::ptr::from_mut(interp));
        Ok(library)
    }
}
