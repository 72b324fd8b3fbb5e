//! The `cutlet` command-line driver.
//!
//! Runs script files named on the command line, or reads from stdin: a
//! terminal gets a line-by-line read-eval loop, a pipe is read to EOF and
//! evaluated whole. The process exit code is the integer coercion of the
//! script's final return value, or 1 on a syntax or runtime error.

use std::{
    io::{self, BufRead, IsTerminal},
    process::ExitCode,
};

use cutlet::{render_backtrace, CutletError, Interpreter, Variable};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn help() {
    println!(
        "Cutlet v{VERSION}\n\n\
         cutlet [-i path] filename ...\n\
         cutlet -h\n\
         \x20 -i path      Include path to the library search\n\
         \x20 -V           Display the version\n\
         \x20 -h           Displays this help"
    );
}

fn version() {
    println!(
        "Cutlet Version {VERSION}\n\n\
         This is free software: you are free to change and redistribute it.\n\
         There is NO WARRANTY, to the extent permitted by law."
    );
}

/// Appends a directory to the `library.path` search list.
fn add_path(interp: &mut Interpreter, path: &str) -> Result<(), CutletError> {
    let paths = interp.var("library.path")?;
    if let Variable::List(items) = &*paths {
        items.borrow_mut().push(Variable::text(path));
    }
    Ok(())
}

fn run(interp: &mut Interpreter, files: &[String]) -> Result<(), CutletError> {
    if files.is_empty() {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            // Interactive: read and evaluate line by line.
            for line in stdin.lock().lines() {
                interp.run(&line?)?;
            }
        } else {
            // Piped input: evaluate the whole stream at once.
            interp.run_stream(Box::new(stdin.lock()))?;
        }
    } else {
        for file in files {
            interp.run_file(file)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let mut interp = Interpreter::new();
    let mut files = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" => {
                help();
                return ExitCode::SUCCESS;
            }
            "-V" => {
                version();
                return ExitCode::SUCCESS;
            }
            "-i" => {
                let Some(path) = args.next() else {
                    eprintln!("FATAL: -i requires a path argument");
                    return ExitCode::FAILURE;
                };
                if let Err(err) = add_path(&mut interp, &path) {
                    eprintln!("FATAL: {err}");
                    return ExitCode::FAILURE;
                }
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                eprintln!("FATAL: unknown option {flag}");
                return ExitCode::FAILURE;
            }
            file => files.push(file.to_owned()),
        }
    }

    match run(&mut interp, &files) {
        Ok(()) => {
            // The script's return value becomes the exit status.
            let status = interp
                .result()
                .map_or(0, |value| value.as_int().unwrap_or(0));
            ExitCode::from(u8::try_from(status.rem_euclid(256)).unwrap_or(1))
        }
        Err(CutletError::Syntax(err)) => {
            eprintln!("SYNTAX ERROR: {}, \"{}\"", err.message, err.token.text);
            ExitCode::FAILURE
        }
        Err(CutletError::Run(err)) => {
            eprintln!("ERROR: {err}");
            if err.trace.is_empty() {
                eprint!("{}", render_backtrace(&interp.backtrace()));
            } else {
                eprint!("{}", render_backtrace(&err.trace));
            }
            ExitCode::FAILURE
        }
    }
}
