//! vendo - Vending Machine
//!
//! Reads commands from standard input, one line at a time, and prints the machine's
//! responses on standard output. Logs go to standard error.

use std::io::{BufRead, IsTerminal, Write};
use tracing_subscriber::EnvFilter;
use vendo_core::{Config, Effect, JsonFileSource, Machine, TextReport};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration (from file if VENDO_CONFIG is set, then env overrides)
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!("Starting vendo");
    tracing::info!("  Catalog: {}", config.catalog.path.display());

    let source = JsonFileSource::new(&config.catalog.path);
    let mut machine = match Machine::open(&source) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("Failed to load catalog [{}]: {}", e.error_code(), e);
            return Err(e.into());
        }
    };

    let report = TextReport::new(config.currency.symbol.clone());
    let prompt = std::io::stdin()
        .is_terminal()
        .then_some(config.repl.prompt.as_str());
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();

    let result = serve(&mut machine, stdin.lock(), &mut stdout, &report, prompt);

    tracing::info!("Machine stopped");
    result.map_err(Into::into)
}

/// Feeds input lines to the machine until the session ends or input runs out.
///
/// Lines are decoded lossily, so bytes that are not UTF-8 lex as illegal characters.
/// However the loop ends, the remaining balance is returned as change.
fn serve(
    machine: &mut Machine,
    mut input: impl BufRead,
    out: &mut impl Write,
    report: &TextReport,
    prompt: Option<&str>,
) -> std::io::Result<()> {
    let mut effects: Vec<Effect> = Vec::new();
    let mut buf = Vec::new();
    let mut result = Ok(());

    while machine.is_running() {
        if let Some(prompt) = prompt {
            write!(out, "{}", prompt)?;
            out.flush()?;
        }

        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                machine.feed_line(&String::from_utf8_lossy(&buf), &mut effects);
                print_effects(out, report, &mut effects)?;
            }
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                result = Err(e);
                break;
            }
        }
    }

    // End of input still returns the customer's money
    if machine.finish(&mut effects) {
        print_effects(out, report, &mut effects)?;
    }

    result
}

fn print_effects(
    out: &mut impl Write,
    report: &TextReport,
    effects: &mut Vec<Effect>,
) -> std::io::Result<()> {
    for effect in effects.drain(..) {
        for text in report.lines(&effect) {
            writeln!(out, "{}", text)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vendo_core::{Catalog, Money, Product};

    fn machine() -> Machine {
        let catalog = Catalog::from_products(vec![Product::new(
            "01",
            "Water",
            2,
            Money::from_cents(80),
        )])
        .unwrap();
        Machine::new(catalog)
    }

    fn transcript(input: &[u8]) -> Vec<String> {
        let mut machine = machine();
        let mut out = Vec::new();
        serve(&mut machine, input, &mut out, &TextReport::default(), None).unwrap();
        assert!(!machine.is_running());
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_invalid_utf8_line_still_returns_change() {
        let lines = transcript(b"COIN 2e EXIT\n\xff\n");
        assert_eq!(
            lines,
            vec![
                "Current amount: 2.00",
                "Illegal character '\u{fffd}'",
                "1 coins of 2.00€",
                "Thank you for using our vending machine!",
            ]
        );
    }

    #[test]
    fn test_stops_reading_after_exit() {
        let lines = transcript(b"EXIT\nLIST\n");
        assert_eq!(lines, vec!["Thank you for using our vending machine!"]);
    }

    #[test]
    fn test_last_line_without_newline() {
        let lines = transcript(b"COIN 1e EXIT\nPRODUCT 01");
        assert_eq!(
            lines,
            vec![
                "Current amount: 1.00",
                "Product acquired: Water",
                "Current amount: 0.20€",
                "1 coins of 0.20€",
                "Thank you for using our vending machine!",
            ]
        );
    }
}
