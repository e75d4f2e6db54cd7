//! Plain-text rendering of effects.

use crate::effect::Effect;
use crate::money::Money;

/// Turns effects into the machine's classic console lines.
#[derive(Debug, Clone)]
pub struct TextReport {
    symbol: String,
}

impl Default for TextReport {
    fn default() -> Self {
        Self::new("€")
    }
}

impl TextReport {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }

    /// Formats an amount with the currency symbol.
    pub fn amount(&self, amount: Money) -> String {
        format!("{}{}", amount, self.symbol)
    }

    /// Lines for one effect. Some effects are silent and return no lines.
    pub fn lines(&self, effect: &Effect) -> Vec<String> {
        match effect {
            Effect::Catalog(listing) => listing
                .iter()
                .map(|l| format!("{} - {} - {}", l.code, l.name, self.amount(l.price)))
                .collect(),
            Effect::CoinEntryOpened | Effect::SelectionOpened | Effect::CoinAccepted { .. } => {
                Vec::new()
            }
            Effect::Balance(balance) => vec![format!("Current amount: {}", balance)],
            Effect::Purchased { name, balance, .. } => vec![
                format!("Product acquired: {}", name),
                format!("Current amount: {}", self.amount(*balance)),
            ],
            Effect::PurchaseRejected(e) => vec![e.to_string()],
            Effect::ChangeReturned { change, .. } => change
                .nonzero()
                .map(|c| format!("{} coins of {}", c.count, self.amount(c.denomination)))
                .collect(),
            Effect::SessionClosed => vec!["Thank you for using our vending machine!".to_string()],
            Effect::IllegalCharacter { ch, .. } => vec![format!("Illegal character '{}'", ch)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Product};
    use crate::machine::Machine;

    fn transcript(input: &[&str]) -> Vec<String> {
        let catalog = Catalog::from_products(vec![
            Product::new("01", "Water", 2, Money::from_cents(80)),
            Product::new("02", "Crisps", 1, Money::from_cents(150)),
        ])
        .unwrap();
        let mut machine = Machine::new(catalog);
        let report = TextReport::default();

        let mut effects = Vec::new();
        for line in input {
            machine.feed_line(line, &mut effects);
        }
        effects.iter().flat_map(|e| report.lines(e)).collect()
    }

    #[test]
    fn test_classic_transcript() {
        let lines = transcript(&["LIST", "COIN 1e, 20c, 5c EXIT", "PRODUCT 01", "PRODUCT 02 EXIT"]);
        assert_eq!(
            lines,
            vec![
                "01 - Water - 0.80€",
                "02 - Crisps - 1.50€",
                "Current amount: 1.25",
                "Product acquired: Water",
                "Current amount: 0.45€",
                "Insufficient funds",
                "2 coins of 0.20€",
                "1 coins of 0.05€",
                "Thank you for using our vending machine!",
            ]
        );
    }

    #[test]
    fn test_illegal_character_line() {
        assert_eq!(transcript(&["?"]), vec!["Illegal character '?'"]);
    }

    #[test]
    fn test_custom_symbol() {
        let report = TextReport::new(" EUR");
        assert_eq!(report.amount(Money::from_cents(5)), "0.05 EUR");
    }
}
