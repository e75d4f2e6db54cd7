//! Effect reports emitted by the machine.
//!
//! The machine never prints. Every observable outcome of a token is pushed to an
//! [`EffectSink`] and the front end decides how to render it.

use crate::catalog::Listing;
use crate::change::Change;
use crate::error::PurchaseError;
use crate::lexer::LexerState;
use crate::money::Money;

/// Something the customer should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `LIST`: every product in catalog order.
    Catalog(Vec<Listing>),

    /// `COIN`: the machine now accepts coins.
    CoinEntryOpened,

    /// A coin was added to the balance.
    CoinAccepted { coin: Money, balance: Money },

    /// `EXIT` during coin entry: balance so far.
    Balance(Money),

    /// `PRODUCT`: the machine now waits for a product code.
    SelectionOpened,

    /// A product was dispensed.
    Purchased {
        code: String,
        name: String,
        price: Money,
        balance: Money,
    },

    /// A purchase attempt failed; nothing changed.
    PurchaseRejected(PurchaseError),

    /// Session exit: the balance returned as coins.
    ChangeReturned { amount: Money, change: Change },

    /// The session is over.
    SessionClosed,

    /// Input no rule of the active state accepts.
    IllegalCharacter { ch: char, state: LexerState },
}

impl Effect {
    /// Returns true for effects that report a customer mistake.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Effect::PurchaseRejected(_) | Effect::IllegalCharacter { .. }
        )
    }
}

/// Receives effects as the machine produces them.
pub trait EffectSink {
    fn emit(&mut self, effect: Effect);
}

impl EffectSink for Vec<Effect> {
    fn emit(&mut self, effect: Effect) {
        self.push(effect);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EffectSink for NullSink {
    fn emit(&mut self, _effect: Effect) {}
}
