//! Interactive REPL.

use crate::render::Printer;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config as EditorConfig, Editor};
use std::path::PathBuf;
use vendo_core::{Config, Effect, JsonFileSource, Machine};

const HELP_TEXT: &str = r#"
Machine commands:
  LIST                 Show products and prices
  COIN <coins> EXIT    Insert coins: 2e 1e 50c 20c 10c 5c 2c 1c (commas allowed)
  PRODUCT <code>       Buy the product with that two-digit code
  EXIT                 Take your change and leave

Console commands:
  :help                Show this help
  :state               Show balance and what the machine is waiting for
  :quit                Same as EXIT (Ctrl-D also works)
"#;

/// What the REPL should do after a console command.
enum Control {
    Continue(String),
    Quit,
}

pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let source = JsonFileSource::new(&config.catalog.path);
    let mut machine = Machine::open(&source).map_err(|e| {
        eprintln!("{} [{}]: {}", "Cannot start".red(), e.error_code(), e);
        e
    })?;
    let printer = Printer::new(&config.currency.symbol, true);

    println!("{}", "vendo".bold().cyan());
    println!(
        "{} products loaded from {}",
        machine.catalog().len(),
        config.catalog.path.display()
    );

    let editor_config = EditorConfig::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(editor_config)?;

    let history_path = history_path(config);
    let _ = rl.load_history(&history_path);

    println!("Type ':help' for available commands.\n");

    let mut effects: Vec<Effect> = Vec::new();

    while machine.is_running() {
        let prompt = config.repl.prompt.cyan().to_string();
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                if trimmed.starts_with(':') {
                    match console_command(&machine, trimmed) {
                        Control::Continue(output) => println!("{}\n", output),
                        Control::Quit => {
                            machine.finish(&mut effects);
                        }
                    }
                } else {
                    machine.feed_line(&line, &mut effects);
                }

                print_effects(&printer, &mut effects);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                machine.finish(&mut effects);
                print_effects(&printer, &mut effects);
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                machine.finish(&mut effects);
                print_effects(&printer, &mut effects);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);

    Ok(())
}

fn console_command(machine: &Machine, line: &str) -> Control {
    match line {
        ":help" | ":?" => Control::Continue(HELP_TEXT.to_string()),
        ":quit" | ":q" => Control::Quit,
        ":state" => Control::Continue(format!(
            "Balance: {}\nWaiting for: {}",
            machine.balance().to_string().bold(),
            waiting_for(machine).yellow()
        )),
        other => Control::Continue(format!(
            "Unknown console command: {}. Type ':help' for help.",
            other
        )),
    }
}

fn waiting_for(machine: &Machine) -> &'static str {
    match machine.lexer_state() {
        vendo_core::LexerState::Initial => "a command",
        vendo_core::LexerState::InsertingCoins => "coins",
        vendo_core::LexerState::SelectingProduct => "a product code",
    }
}

fn print_effects(printer: &Printer, effects: &mut Vec<Effect>) {
    let lines: Vec<String> = effects.drain(..).flat_map(|e| printer.lines(&e)).collect();
    if !lines.is_empty() {
        println!("{}\n", lines.join("\n"));
    }
}

fn history_path(config: &Config) -> PathBuf {
    if let Some(path) = &config.repl.history_file {
        return path.clone();
    }
    home::home_dir()
        .map(|h| h.join(".vendo_history"))
        .unwrap_or_else(|| ".vendo_history".into())
}
