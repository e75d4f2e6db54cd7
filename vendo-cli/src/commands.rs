//! Command execution.

use crate::render::Printer;
use crate::Commands;
use colored::Colorize;
use std::path::Path;
use vendo_core::{decompose, Config, Effect, JsonFileSource, Machine, Money};

/// Executes a command and returns the formatted output.
pub fn execute(config: &Config, cmd: Commands) -> Result<String, Box<dyn std::error::Error>> {
    let printer = Printer::new(&config.currency.symbol, false);

    match cmd {
        Commands::Repl => unreachable!(),

        Commands::List => {
            let machine = open_machine(config)?;
            let listing = machine.catalog().listing();
            Ok(printer.lines(&Effect::Catalog(listing)).join("\n"))
        }

        Commands::Change { amount } => Ok(change_table(&printer, amount)),

        Commands::Run { script } => run_script(config, &printer, &script),
    }
}

fn open_machine(config: &Config) -> Result<Machine, Box<dyn std::error::Error>> {
    let source = JsonFileSource::new(&config.catalog.path);
    Ok(Machine::open(&source)?)
}

fn change_table(printer: &Printer, amount: Money) -> String {
    let change = decompose(amount);
    let effect = Effect::ChangeReturned { amount, change };
    let mut lines = printer.lines(&effect);
    if amount.is_zero() {
        lines.push("  nothing to return".dimmed().to_string());
    }
    lines.join("\n")
}

/// Feeds a script through a fresh session and returns the transcript.
///
/// Blank lines and lines starting with `#` are skipped. If the script ends while the
/// session is still open, the balance is returned as change.
fn run_script(
    config: &Config,
    printer: &Printer,
    script: &Path,
) -> Result<String, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(script)
        .map_err(|e| format!("failed to read script '{}': {}", script.display(), e))?;
    let mut machine = open_machine(config)?;

    let mut output = Vec::new();
    let mut effects = Vec::new();

    for (number, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if !machine.is_running() {
            tracing::warn!("Session ended before line {}, ignoring the rest", number + 1);
            break;
        }

        output.push(format!("{}{}", config.repl.prompt, line).dimmed().to_string());
        machine.feed_line(line, &mut effects);
        output.extend(effects.drain(..).flat_map(|e| printer.lines(&e)));
    }

    if machine.finish(&mut effects) {
        output.extend(effects.drain(..).flat_map(|e| printer.lines(&e)));
    }

    Ok(output.join("\n"))
}
