//! Source library loading through `import` and `include`.

use std::{fs, path::PathBuf};

use cutlet::{CollectPrint, Interpreter, NoPrint, Variable};
use pretty_assertions::assert_eq;

/// Creates a scratch directory holding a library file, returning the
/// directory path.
fn write_library(tag: &str, name: &str, body: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cutlet-test-{tag}-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("scratch directory is writable");
    fs::write(dir.join(format!("{name}.cutlet")), body).expect("library file is writable");
    dir
}

fn add_search_path(interp: &mut Interpreter, dir: &PathBuf) {
    let paths = interp.var("library.path").expect("library.path exists");
    if let Variable::List(items) = &*paths {
        items
            .borrow_mut()
            .push(Variable::text(dir.display().to_string()));
    }
}

#[test]
fn import_evaluates_a_source_library() {
    let dir = write_library("import", "greetings", "def greet {} { print imported }\n");

    let output = CollectPrint::new();
    let buffer = output.buffer();
    let mut interp = Interpreter::with_output(Box::new(output));
    add_search_path(&mut interp, &dir);

    interp.run("import greetings\ngreet\n").expect("import succeeds");
    assert_eq!(buffer.borrow().as_str(), "imported\n");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn import_missing_library_fails() {
    let mut interp = Interpreter::with_output(Box::new(NoPrint));
    let err = interp
        .run("import no-such-library")
        .expect_err("import must fail");
    assert!(err.message().contains("Library no-such-library not found."));
}

#[test]
fn include_evaluates_a_file_in_place() {
    let dir = write_library("include", "snippet", "local fromfile = 99\n");
    let path = dir.join("snippet.cutlet");

    let output = CollectPrint::new();
    let buffer = output.buffer();
    let mut interp = Interpreter::with_output(Box::new(output));
    interp
        .run(&format!("include {}\nprint $fromfile\n", path.display()))
        .expect("include succeeds");
    assert_eq!(buffer.borrow().as_str(), "99\n");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn include_missing_file_fails() {
    let mut interp = Interpreter::with_output(Box::new(NoPrint));
    assert!(interp.run("include /no/such/file.cutlet").is_err());
}

#[test]
fn library_path_is_seeded() {
    let mut interp = Interpreter::with_output(Box::new(NoPrint));
    let paths = interp.var("library.path").expect("library.path exists");
    match &*paths {
        Variable::List(items) => assert!(!items.borrow().is_empty()),
        _ => panic!("library.path must be a list"),
    }
    let dir = interp.var("library.dir").expect("library.dir exists");
    assert_eq!(dir.to_string(), cutlet::PKG_LIB_DIR);
}
