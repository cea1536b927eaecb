//! # MTI CLI driver
//!
//! Thin collaborator only (see `SPEC_FULL.md` §1/E3): manual `env::args()`
//! parsing (no `clap`, matching the teacher's `main.rs`), `-h/--help` and
//! `-v/--version`, and REPL vs. file-path dispatch. Exit codes follow the
//! sysexits convention the spec calls for: 0 success, 65 compile error, 70
//! runtime error.
//!
//! Unlike the teacher's REPL, which re-spawns the binary against a temp file
//! per line because its embedded interpreter is itself a compiled script,
//! MTI's compiler and VM are in-process: one `Vm` lives for the whole REPL
//! session, so globals and interned strings naturally persist line to line
//! with no subprocess and no temp file.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use mti::vm::{InterpretResult, Vm};

const VERSION: &str = "0.1.0";

const EX_OK: u8 = 0;
const EX_DATAERR: u8 = 65;
const EX_SOFTWARE: u8 = 70;

fn usage() -> String {
    format!(
        r#"MTI v{VERSION}

Usage:
    mti [script]

Arguments:
    [script]
        Path to an MTI source file to execute. If omitted, starts an
        interactive REPL.

Options:
    -h, --help
        Show this help message and exit.
    -v, --version
        Show the interpreter version."#
    )
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() == 1 {
        repl();
        return ExitCode::from(EX_OK);
    }

    if args[1] == "-h" || args[1] == "--help" {
        println!("{}", usage());
        return ExitCode::from(EX_OK);
    }

    if args[1] == "-v" || args[1] == "--version" {
        println!("mti {VERSION}");
        return ExitCode::from(EX_OK);
    }

    run_file(&args[1])
}

fn run_file(path: &str) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not read file \"{path}\": {e}");
            return ExitCode::from(EX_DATAERR);
        }
    };

    let trace = env::var("MTI_TRACE").is_ok();
    let mut vm = Vm::new().with_trace(trace);
    match vm.interpret(&source) {
        InterpretResult::Ok => ExitCode::from(EX_OK),
        InterpretResult::CompileError => ExitCode::from(EX_DATAERR),
        InterpretResult::RuntimeError => ExitCode::from(EX_SOFTWARE),
    }
}

/// Read-eval-print loop: one `Vm` for the whole session, one `interpret`
/// call per line. Exits cleanly on EOF (Ctrl+D).
fn repl() {
    println!("MTI {VERSION} - type Ctrl+D to exit.");

    let trace = env::var("MTI_TRACE").is_ok();
    let mut vm = Vm::new().with_trace(trace);
    let mut line = String::new();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        line.clear();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {}
            Err(_) => break,
        }

        if line.trim().is_empty() {
            continue;
        }

        // Compile/runtime errors are already reported to stderr by
        // `interpret`; the REPL just keeps going on the next line.
        vm.interpret(&line);
    }
}
