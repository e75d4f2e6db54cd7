//! Change calculation.

use crate::money::Money;

/// Supported coin denominations, largest first.
///
/// Greedy decomposition is only optimal because this set is canonical (every prefix of
/// the table can be paid optimally by always taking the largest coin). Any change to the
/// table must keep that property or [`decompose`] stops returning the minimum coin count.
pub const DENOMINATIONS: [Money; 8] = [
    Money::from_cents(200),
    Money::from_cents(100),
    Money::from_cents(50),
    Money::from_cents(20),
    Money::from_cents(10),
    Money::from_cents(5),
    Money::from_cents(2),
    Money::from_cents(1),
];

/// Number of coins of one denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinCount {
    pub denomination: Money,
    pub count: u64,
}

/// Coin breakdown for an amount, one entry per denomination in [`DENOMINATIONS`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    coins: Vec<CoinCount>,
}

impl Change {
    /// All entries, including denominations with a zero count.
    pub fn coins(&self) -> &[CoinCount] {
        &self.coins
    }

    /// Entries with at least one coin.
    pub fn nonzero(&self) -> impl Iterator<Item = &CoinCount> + '_ {
        self.coins.iter().filter(|c| c.count > 0)
    }

    /// Total number of coins handed out.
    pub fn coin_count(&self) -> u64 {
        self.coins.iter().map(|c| c.count).sum()
    }

    /// Sum of all coins.
    pub fn total(&self) -> Money {
        Money::from_cents(
            self.coins
                .iter()
                .map(|c| c.denomination.cents() * c.count)
                .sum(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.coin_count() == 0
    }
}

/// Breaks `amount` into coins using the greedy algorithm over [`DENOMINATIONS`].
pub fn decompose(amount: Money) -> Change {
    let mut remaining = amount.cents();
    let coins = DENOMINATIONS
        .iter()
        .map(|&denomination| {
            let count = remaining / denomination.cents();
            remaining %= denomination.cents();
            CoinCount {
                denomination,
                count,
            }
        })
        .collect();

    Change { coins }
}
