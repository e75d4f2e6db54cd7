//! Vending machine automaton - applies tokens to the session and catalog.
//!
//! | Lexer state        | Token                   | Next state         |
//! |--------------------|-------------------------|--------------------|
//! | any                | `LIST`                  | unchanged          |
//! | `Initial`          | `COIN`                  | `InsertingCoins`   |
//! | `InsertingCoins`   | coin                    | `InsertingCoins`   |
//! | `InsertingCoins`   | `EXIT` (end coin entry) | `Initial`          |
//! | `Initial`          | `PRODUCT`               | `SelectingProduct` |
//! | `SelectingProduct` | product code            | `Initial`          |
//! | other              | `EXIT` (end session)    | unchanged          |
//! | any                | unrecognized            | unchanged          |
//!
//! Ending the session is signalled by [`MachineSession::is_running`], not by a lexer
//! state. Once it returns false every further token is ignored.

use crate::catalog::{Catalog, CatalogSource};
use crate::change::decompose;
use crate::effect::{Effect, EffectSink};
use crate::error::{CoreError, PurchaseError};
use crate::lexer::{Lexer, LexerState, Token};
use crate::money::Money;

/// Per-customer machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineSession {
    balance: Money,
    lexer_state: LexerState,
    running: bool,
}

impl Default for MachineSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MachineSession {
    pub fn new() -> Self {
        Self {
            balance: Money::ZERO,
            lexer_state: LexerState::Initial,
            running: true,
        }
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn lexer_state(&self) -> LexerState {
        self.lexer_state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn enter(&mut self, next: LexerState) {
        if self.lexer_state != next {
            tracing::debug!("Lexer state {} -> {}", self.lexer_state, next);
            self.lexer_state = next;
        }
    }
}

/// Applies one token.
///
/// Every failure is checked before anything is mutated, so a rejected purchase leaves
/// both `session` and `catalog` exactly as they were.
pub fn apply(
    session: &mut MachineSession,
    catalog: &mut Catalog,
    token: Token,
    sink: &mut dyn EffectSink,
) {
    if !session.running {
        tracing::debug!("Ignoring {} after session end", token.kind());
        return;
    }

    tracing::debug!("Applying {:?} in state {}", token, session.lexer_state);

    match (session.lexer_state, token) {
        (_, Token::ListRequest) => {
            sink.emit(Effect::Catalog(catalog.listing()));
        }

        (LexerState::Initial, Token::BeginCoinEntry) => {
            session.enter(LexerState::InsertingCoins);
            sink.emit(Effect::CoinEntryOpened);
        }

        (LexerState::InsertingCoins, Token::Coin(coin)) => {
            session.balance += coin;
            sink.emit(Effect::CoinAccepted {
                coin,
                balance: session.balance,
            });
        }

        (LexerState::InsertingCoins, Token::ExitRequest) => {
            session.enter(LexerState::Initial);
            sink.emit(Effect::Balance(session.balance));
        }

        (_, Token::ExitRequest) => {
            close_session(session, sink);
        }

        (LexerState::Initial, Token::BeginProductSelection) => {
            session.enter(LexerState::SelectingProduct);
            sink.emit(Effect::SelectionOpened);
        }

        (LexerState::SelectingProduct, Token::ProductCode(code)) => {
            session.enter(LexerState::Initial);
            match purchase(session, catalog, &code) {
                Ok(effect) => sink.emit(effect),
                Err(e) => {
                    tracing::warn!("Purchase of '{}' rejected [{}]: {}", code, e.error_code(), e);
                    sink.emit(Effect::PurchaseRejected(e));
                }
            }
        }

        (state, Token::Unrecognized(ch)) => {
            tracing::warn!("Illegal character {:?} in state {}", ch, state);
            sink.emit(Effect::IllegalCharacter { ch, state });
        }

        // The lexer only produces these tokens in the state that accepts them.
        (state, token) => {
            tracing::warn!("Token {} is not accepted in state {}", token.kind(), state);
        }
    }
}

fn purchase(
    session: &mut MachineSession,
    catalog: &mut Catalog,
    code: &str,
) -> Result<Effect, PurchaseError> {
    let product = catalog
        .get_mut(code)
        .ok_or_else(|| PurchaseError::NotFound {
            code: code.to_string(),
        })?;

    if !product.in_stock() {
        return Err(PurchaseError::OutOfStock {
            code: code.to_string(),
        });
    }

    let Some(balance) = session.balance.checked_sub(product.price) else {
        return Err(PurchaseError::InsufficientFunds {
            price: product.price,
            balance: session.balance,
        });
    };

    session.balance = balance;
    product.quantity -= 1;

    tracing::info!(
        "Dispensed {} ({}) for {}, {} left in stock",
        product.code,
        product.name,
        product.price,
        product.quantity
    );

    Ok(Effect::Purchased {
        code: product.code.clone(),
        name: product.name.clone(),
        price: product.price,
        balance,
    })
}

fn close_session(session: &mut MachineSession, sink: &mut dyn EffectSink) {
    let amount = session.balance;
    let change = decompose(amount);

    session.balance = Money::ZERO;
    session.running = false;

    tracing::info!("Session closed, returned {} in {} coins", amount, change.coin_count());
    sink.emit(Effect::ChangeReturned { amount, change });
    sink.emit(Effect::SessionClosed);
}

/// A catalog together with the session that owns it.
#[derive(Debug, Clone)]
pub struct Machine {
    session: MachineSession,
    catalog: Catalog,
}

impl Machine {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            session: MachineSession::new(),
            catalog,
        }
    }

    /// Loads the catalog and starts a session. Load failures are fatal.
    pub fn open(source: &dyn CatalogSource) -> Result<Self, CoreError> {
        Ok(Self::new(Catalog::load(source)?))
    }

    pub fn session(&self) -> &MachineSession {
        &self.session
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_running(&self) -> bool {
        self.session.running
    }

    pub fn balance(&self) -> Money {
        self.session.balance
    }

    pub fn lexer_state(&self) -> LexerState {
        self.session.lexer_state
    }

    pub fn apply(&mut self, token: Token, sink: &mut dyn EffectSink) {
        apply(&mut self.session, &mut self.catalog, token, sink);
    }

    /// Lexes and applies one input line.
    ///
    /// Each token is applied before the next one is classified, because the token may
    /// switch the lexer state. Stops at the end of the line or when the session ends.
    /// Returns the number of tokens applied.
    pub fn feed_line(&mut self, line: &str, sink: &mut dyn EffectSink) -> usize {
        let mut lexer = Lexer::new(line);
        let mut applied = 0;

        while self.session.running {
            let Some(lexeme) = lexer.next_token(self.session.lexer_state) else {
                break;
            };
            tracing::trace!(
                "Lexed {} via rule '{}' at {:?}",
                lexeme.token.kind(),
                lexeme.rule,
                lexeme.span
            );
            self.apply(lexeme.token, sink);
            applied += 1;
        }

        if !self.session.running && !lexer.remaining().trim().is_empty() {
            tracing::debug!("Discarding {:?} after session end", lexer.remaining());
        }

        applied
    }

    /// Ends the session at end of input, returning any balance as change.
    ///
    /// Returns false if the session had already ended.
    pub fn finish(&mut self, sink: &mut dyn EffectSink) -> bool {
        if !self.session.running {
            return false;
        }
        close_session(&mut self.session, sink);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use crate::effect::NullSink;
    use proptest::prelude::*;

    fn sample_catalog() -> Catalog {
        Catalog::from_products(vec![
            Product::new("01", "Water", 1, Money::from_units(1)),
            Product::new("02", "Coffee", 5, Money::from_cents(60)),
            Product::new("03", "Candy", 0, Money::from_cents(30)),
        ])
        .unwrap()
    }

    fn run(machine: &mut Machine, line: &str) -> Vec<Effect> {
        let mut effects = Vec::new();
        machine.feed_line(line, &mut effects);
        effects
    }

    fn quantity(machine: &Machine, code: &str) -> u32 {
        machine.catalog().get(code).unwrap().quantity
    }

    #[test]
    fn test_new_session() {
        let machine = Machine::new(sample_catalog());
        assert!(machine.is_running());
        assert_eq!(machine.balance(), Money::ZERO);
        assert_eq!(machine.lexer_state(), LexerState::Initial);
    }

    #[test]
    fn test_coin_entry_accumulates_balance() {
        let mut machine = Machine::new(sample_catalog());

        let effects = run(&mut machine, "COIN 1e, 50c");
        assert_eq!(machine.lexer_state(), LexerState::InsertingCoins);
        assert_eq!(machine.balance(), Money::from_cents(150));
        assert_eq!(
            effects,
            vec![
                Effect::CoinEntryOpened,
                Effect::CoinAccepted {
                    coin: Money::from_units(1),
                    balance: Money::from_units(1)
                },
                Effect::CoinAccepted {
                    coin: Money::from_cents(50),
                    balance: Money::from_cents(150)
                },
            ]
        );
    }

    #[test]
    fn test_coin_state_survives_across_lines() {
        let mut machine = Machine::new(sample_catalog());
        run(&mut machine, "COIN");
        run(&mut machine, "20c 20c");
        assert_eq!(machine.balance(), Money::from_cents(40));
        assert_eq!(machine.lexer_state(), LexerState::InsertingCoins);
    }

    #[test]
    fn test_local_exit_keeps_balance_and_session() {
        let mut machine = Machine::new(sample_catalog());

        let effects = run(&mut machine, "COIN 2e EXIT");
        assert_eq!(effects.last(), Some(&Effect::Balance(Money::from_units(2))));
        assert_eq!(machine.lexer_state(), LexerState::Initial);
        assert_eq!(machine.balance(), Money::from_units(2));
        assert!(machine.is_running());
    }

    #[test]
    fn test_session_exit_returns_change() {
        let mut machine = Machine::new(sample_catalog());
        run(&mut machine, "COIN 2e 10c EXIT");

        let effects = run(&mut machine, "EXIT");
        assert!(!machine.is_running());
        assert_eq!(machine.balance(), Money::ZERO);

        let Effect::ChangeReturned { amount, change } = &effects[0] else {
            panic!("expected change, got {:?}", effects);
        };
        assert_eq!(*amount, Money::from_cents(210));
        assert_eq!(change.total(), Money::from_cents(210));
        assert_eq!(effects[1], Effect::SessionClosed);
    }

    #[test]
    fn test_exit_from_product_selection_ends_session() {
        let mut machine = Machine::new(sample_catalog());
        run(&mut machine, "PRODUCT EXIT");
        assert!(!machine.is_running());
        assert_eq!(machine.lexer_state(), LexerState::SelectingProduct);
    }

    #[test]
    fn test_tokens_after_exit_are_ignored() {
        let mut machine = Machine::new(sample_catalog());

        let effects = run(&mut machine, "EXIT COIN 1e");
        assert_eq!(effects.len(), 2);
        assert_eq!(machine.lexer_state(), LexerState::Initial);

        assert!(run(&mut machine, "LIST").is_empty());
        assert!(!machine.finish(&mut NullSink));
    }

    #[test]
    fn test_list_in_every_state_keeps_state() {
        let mut machine = Machine::new(sample_catalog());

        for (setup, state) in [
            ("", LexerState::Initial),
            ("COIN", LexerState::InsertingCoins),
            ("EXIT PRODUCT", LexerState::SelectingProduct),
        ] {
            run(&mut machine, setup);
            let effects = run(&mut machine, "LIST");
            assert_eq!(machine.lexer_state(), state);
            let Effect::Catalog(listing) = &effects[0] else {
                panic!("expected catalog, got {:?}", effects);
            };
            assert_eq!(listing.len(), 3);
            assert_eq!(listing[0].name, "Water");
        }
    }

    #[test]
    fn test_product_code_always_returns_to_initial() {
        let mut machine = Machine::new(sample_catalog());
        for code in ["01", "03", "99"] {
            run(&mut machine, &format!("PRODUCT {}", code));
            assert_eq!(machine.lexer_state(), LexerState::Initial, "code {}", code);
        }
    }

    #[test]
    fn test_purchase_success() {
        let mut machine = Machine::new(sample_catalog());
        run(&mut machine, "COIN 1e EXIT");

        let effects = run(&mut machine, "PRODUCT 02");
        assert_eq!(
            effects[1],
            Effect::Purchased {
                code: "02".to_string(),
                name: "Coffee".to_string(),
                price: Money::from_cents(60),
                balance: Money::from_cents(40),
            }
        );
        assert_eq!(machine.balance(), Money::from_cents(40));
        assert_eq!(quantity(&machine, "02"), 4);
    }

    #[test]
    fn test_out_of_stock_checked_before_funds() {
        let mut machine = Machine::new(sample_catalog());

        // Candy is sold out and the balance is zero; stock is reported first
        let effects = run(&mut machine, "PRODUCT 03");
        assert_eq!(
            effects[1],
            Effect::PurchaseRejected(PurchaseError::OutOfStock {
                code: "03".to_string()
            })
        );
        if let Effect::PurchaseRejected(e) = &effects[1] {
            assert_eq!(e.error_code(), "OUT_OF_STOCK");
        }
    }

    #[test]
    fn test_insufficient_funds_reports_price() {
        let mut machine = Machine::new(sample_catalog());
        run(&mut machine, "COIN 50c EXIT");

        let effects = run(&mut machine, "PRODUCT 02");
        assert_eq!(
            effects[1],
            Effect::PurchaseRejected(PurchaseError::InsufficientFunds {
                price: Money::from_cents(60),
                balance: Money::from_cents(50),
            })
        );
        assert_eq!(machine.balance(), Money::from_cents(50));
        assert_eq!(quantity(&machine, "02"), 5);
    }

    #[test]
    fn test_exact_price_is_affordable() {
        let mut machine = Machine::new(sample_catalog());
        run(&mut machine, "COIN 50c 10c EXIT PRODUCT 02");
        assert_eq!(machine.balance(), Money::ZERO);
        assert_eq!(quantity(&machine, "02"), 4);
    }

    #[test]
    fn test_unrecognized_changes_nothing() {
        let mut machine = Machine::new(sample_catalog());
        run(&mut machine, "COIN 1e");
        let before = machine.session().clone();

        let effects = run(&mut machine, "x? 3e");
        assert!(effects.iter().all(Effect::is_error));
        assert_eq!(effects.len(), 4);
        assert_eq!(machine.session(), &before);
        assert_eq!(quantity(&machine, "01"), 1);
    }

    #[test]
    fn test_feed_line_counts_applied_tokens() {
        let mut machine = Machine::new(sample_catalog());
        assert_eq!(machine.feed_line("COIN 1e 1e EXIT", &mut NullSink), 4);
        assert_eq!(machine.feed_line("   ", &mut NullSink), 0);
        assert_eq!(machine.feed_line("EXIT LIST LIST", &mut NullSink), 1);
    }

    #[test]
    fn test_finish_returns_change_mid_coin_entry() {
        let mut machine = Machine::new(sample_catalog());
        run(&mut machine, "COIN 1e 2c");

        let mut effects = Vec::new();
        assert!(machine.finish(&mut effects));
        assert!(!machine.is_running());
        assert!(matches!(
            &effects[0],
            Effect::ChangeReturned { amount, .. } if *amount == Money::from_cents(102)
        ));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(&'static str, u64),
        Buy(&'static str),
        Garbage(char),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            prop::sample::select(vec![
                ("2e", 200u64),
                ("1e", 100),
                ("50c", 50),
                ("20c", 20),
                ("10c", 10),
                ("5c", 5),
                ("2c", 2),
                ("1c", 1),
            ])
            .prop_map(|(lit, cents)| Op::Insert(lit, cents)),
            prop::sample::select(vec!["01", "02", "03", "42"]).prop_map(Op::Buy),
            prop::sample::select(vec!['x', '#', '9', 'é']).prop_map(Op::Garbage),
        ]
    }

    proptest! {
        #[test]
        fn prop_balance_matches_coins_minus_purchases(ops in prop::collection::vec(op(), 0..40)) {
            let mut machine = Machine::new(sample_catalog());
            let prices = [("01", 100u64), ("02", 60), ("03", 30)];
            let mut stock = vec![("01", 1u32), ("02", 5), ("03", 0)];
            let mut expected = 0u64;

            for op in ops {
                match op {
                    Op::Insert(lit, cents) => {
                        machine.feed_line(&format!("COIN {} EXIT", lit), &mut NullSink);
                        expected += cents;
                    }
                    Op::Buy(code) => {
                        machine.feed_line(&format!("PRODUCT {}", code), &mut NullSink);
                        let price = prices.iter().find(|(c, _)| *c == code).map(|(_, p)| *p);
                        let slot = stock.iter_mut().find(|(c, _)| *c == code);
                        if let (Some(price), Some((_, qty))) = (price, slot) {
                            if *qty > 0 && expected >= price {
                                *qty -= 1;
                                expected -= price;
                            }
                        }
                    }
                    Op::Garbage(ch) => {
                        let state = machine.lexer_state();
                        machine.feed_line(&ch.to_string(), &mut NullSink);
                        prop_assert_eq!(machine.lexer_state(), state);
                    }
                }

                prop_assert_eq!(machine.balance(), Money::from_cents(expected));
                prop_assert_eq!(machine.lexer_state(), LexerState::Initial);
                for (code, qty) in &stock {
                    prop_assert_eq!(machine.catalog().get(code).unwrap().quantity, *qty);
                }
            }
        }
    }
}
