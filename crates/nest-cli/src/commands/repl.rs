//! REPL command implementation

use anyhow::{Context, Result};
use nest_config::InterpreterConfig;
use nest_runtime::{ReplCore, ReplResult};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Run the interactive REPL
///
/// If `no_history` is true, disables history persistence.
pub fn run(
    interpreter: InterpreterConfig,
    no_history: bool,
    config: &crate::config::Config,
) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut repl = ReplCore::new(interpreter).context("Failed to create interpreter")?;

    let history_path = config.get_history_path();
    if !no_history {
        if let Some(ref path) = history_path {
            let _ = rl.load_history(path); // Ignore errors if file doesn't exist
        }
    }

    println!("Nest v{} REPL", nest_runtime::VERSION);
    println!("Type expressions or statements, or :quit to exit");
    println!();

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match trimmed {
                    ":quit" | ":q" => {
                        println!("Goodbye!");
                        break;
                    }
                    ":help" | ":h" => {
                        print_help();
                        continue;
                    }
                    ":vars" => {
                        let names = repl.handle().global_names();
                        if names.is_empty() {
                            println!("(no globals)");
                        }
                        for name in names {
                            if let Some(value) = repl.handle().global(&name) {
                                println!("{} = {}", name, value.render());
                            }
                        }
                        continue;
                    }
                    ":error" => {
                        let text = repl.handle().error();
                        if text.is_empty() {
                            println!("(no error)");
                        } else {
                            print!("{}", text);
                        }
                        continue;
                    }
                    _ => {}
                }

                let _ = rl.add_history_entry(&line);

                match repl.eval_line(&line) {
                    ReplResult::Value(text) => {
                        if !text.is_empty() {
                            println!("{}", text);
                        }
                    }
                    ReplResult::Executed => {}
                    ReplResult::Failed(diag) => print!("{}", diag.full_text()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                println!("Use :quit or :q to exit");
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if !no_history {
        if let Some(path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.save_history(&path);
        }
    }

    Ok(())
}

fn print_help() {
    println!("Nest REPL Commands:");
    println!("  :quit, :q         Exit the REPL");
    println!("  :help, :h         Show this help message");
    println!("  :vars             List globals and their values");
    println!("  :error            Show the last error with its traceback");
    println!();
    println!("A line that fails is rolled back; earlier definitions are kept.");
    println!("Examples:");
    println!("  >> let x = 42;");
    println!("  >> fn double(n) {{ return n * 2; }}");
    println!("  >> double(x)");
    println!("  >> let child = Interpreter();");
}
