//! Colored effect rendering for the terminal.

use colored::Colorize;
use vendo_core::{Effect, Listing, TextReport};

/// Formats effects for the REPL and script runner.
pub struct Printer {
    report: TextReport,
    verbose: bool,
}

impl Printer {
    /// `verbose` also reports coin acceptance and state changes, which the classic
    /// console output keeps silent.
    pub fn new(symbol: &str, verbose: bool) -> Self {
        Self {
            report: TextReport::new(symbol),
            verbose,
        }
    }

    pub fn lines(&self, effect: &Effect) -> Vec<String> {
        match effect {
            Effect::Catalog(listing) => self.catalog(listing),
            Effect::CoinEntryOpened if self.verbose => {
                vec!["Insert coins (2e 1e 50c 20c 10c 5c 2c 1c), EXIT when done"
                    .dimmed()
                    .to_string()]
            }
            Effect::SelectionOpened if self.verbose => {
                vec!["Type a product code".dimmed().to_string()]
            }
            Effect::CoinAccepted { coin, balance } if self.verbose => vec![format!(
                "{} {} (balance {})",
                "+".green(),
                self.report.amount(*coin),
                self.report.amount(*balance).bold()
            )],
            Effect::Purchased { .. } => self
                .report
                .lines(effect)
                .into_iter()
                .map(|l| l.green().to_string())
                .collect(),
            Effect::ChangeReturned { amount, change } => {
                let mut lines = vec![format!(
                    "{} {}",
                    "Change:".yellow(),
                    self.report.amount(*amount).bold()
                )];
                lines.extend(
                    change
                        .nonzero()
                        .map(|c| format!("  {} x {}", c.count, self.report.amount(c.denomination))),
                );
                lines
            }
            Effect::SessionClosed => self
                .report
                .lines(effect)
                .into_iter()
                .map(|l| l.cyan().to_string())
                .collect(),
            _ if effect.is_error() => self
                .report
                .lines(effect)
                .into_iter()
                .map(|l| l.red().to_string())
                .collect(),
            _ => self.report.lines(effect),
        }
    }

    fn catalog(&self, listing: &[Listing]) -> Vec<String> {
        if listing.is_empty() {
            return vec!["No products".yellow().to_string()];
        }

        let name_width = listing.iter().map(|l| l.name.chars().count()).max().unwrap_or(0);
        listing
            .iter()
            .map(|l| {
                let stock = if l.quantity == 0 {
                    "sold out".red().to_string()
                } else {
                    format!("{} left", l.quantity).dimmed().to_string()
                };
                format!(
                    "  {}  {:<width$}  {:>8}  {}",
                    l.code.cyan(),
                    l.name,
                    self.report.amount(l.price),
                    stock,
                    width = name_width
                )
            })
            .collect()
    }
}
