pub mod check;
pub mod eval;
pub mod repl;
pub mod run;

use nest_runtime::Diagnostic;

/// Write a diagnostic to stderr in the requested format
pub fn report(diag: &Diagnostic, json: bool, human: fn(&Diagnostic) -> String) {
    if json {
        match diag.to_json_string() {
            Ok(text) => eprintln!("{}", text),
            Err(_) => eprint!("{}", human(diag)),
        }
    } else {
        eprint!("{}", human(diag));
    }
}
