//! State-dependent command lexer.
//!
//! The machine accepts a different vocabulary depending on what the customer is doing.
//! Each [`LexerState`] owns an ordered list of rules; at the cursor the rules of the
//! active state are tried first, in declaration order, then the global rules. The first
//! rule that matches wins, regardless of match length, so more specific patterns must be
//! declared before general ones (`20c` before `2c`, the coin-entry `EXIT` before the
//! global `EXIT`).
//!
//! | State              | Rules                                        |
//! |--------------------|----------------------------------------------|
//! | `Initial`          | `COIN`, `PRODUCT`                            |
//! | `InsertingCoins`   | `2e 1e 50c 20c 10c 5c 2c 1c`, `EXIT` (local) |
//! | `SelectingProduct` | two-digit code                               |
//! | every state        | `LIST`, `EXIT`                               |
//!
//! Spaces, tabs and line breaks are skipped everywhere; commas are also skipped while
//! inserting coins. Anything else produces [`Token::Unrecognized`] for one character.

use crate::money::Money;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::ops::Range;

/// Which vocabulary the lexer currently accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LexerState {
    #[default]
    Initial,
    InsertingCoins,
    SelectingProduct,
}

impl LexerState {
    pub fn as_str(self) -> &'static str {
        match self {
            LexerState::Initial => "initial",
            LexerState::InsertingCoins => "inserting_coins",
            LexerState::SelectingProduct => "selecting_product",
        }
    }

    /// Characters discarded between tokens.
    fn skips(self, ch: char) -> bool {
        match ch {
            ' ' | '\t' | '\n' | '\r' => true,
            ',' => self == LexerState::InsertingCoins,
            _ => false,
        }
    }

    fn rules(self) -> &'static [Rule] {
        match self {
            LexerState::Initial => &INITIAL_RULES,
            LexerState::InsertingCoins => &INSERTING_COINS_RULES,
            LexerState::SelectingProduct => &SELECTING_PRODUCT_RULES,
        }
    }
}

impl fmt::Display for LexerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified piece of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An accepted coin and its value.
    Coin(Money),
    ListRequest,
    ExitRequest,
    BeginCoinEntry,
    BeginProductSelection,
    ProductCode(String),
    /// A character no eligible rule accepts.
    Unrecognized(char),
}

impl Token {
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Coin(_) => "COIN_VALUE",
            Token::ListRequest => "LIST",
            Token::ExitRequest => "EXIT",
            Token::BeginCoinEntry => "COIN",
            Token::BeginProductSelection => "PRODUCT",
            Token::ProductCode(_) => "PRODUCT_CODE",
            Token::Unrecognized(_) => "ERROR",
        }
    }
}

/// A token together with where it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    /// Byte range in the input line.
    pub span: Range<usize>,
    /// Name of the rule that produced the token (`"error"` for unrecognized input).
    pub rule: &'static str,
}

/// A pattern anchored at the cursor plus the token it builds.
struct Rule {
    name: &'static str,
    pattern: Regex,
    build: fn(&str) -> Option<Token>,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, build: fn(&str) -> Option<Token>) -> Self {
        let anchored = format!("^(?:{})", pattern);
        Self {
            name,
            pattern: Regex::new(&anchored).expect("lexer rule patterns are valid regexes"),
            build,
        }
    }

    /// Returns the token and its byte length if the rule matches at the start of `rest`.
    fn try_match(&self, rest: &str) -> Option<(Token, usize)> {
        let m = self.pattern.find(rest)?;
        if m.is_empty() {
            return None;
        }
        (self.build)(m.as_str()).map(|token| (token, m.end()))
    }
}

static GLOBAL_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new("list", "LIST", |_| Some(Token::ListRequest)),
        Rule::new("exit", "EXIT", |_| Some(Token::ExitRequest)),
    ]
});

static INITIAL_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new("begin_coins", "COIN", |_| Some(Token::BeginCoinEntry)),
        Rule::new("begin_product", "PRODUCT", |_| {
            Some(Token::BeginProductSelection)
        }),
    ]
});

static INSERTING_COINS_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new("coin", "2e|1e|50c|20c|10c|5c|2c|1c", |text| {
            parse_coin(text).map(Token::Coin)
        }),
        Rule::new("end_coins", "EXIT", |_| Some(Token::ExitRequest)),
    ]
});

static SELECTING_PRODUCT_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![Rule::new("product_code", "[0-9]{2}", |text| {
        Some(Token::ProductCode(text.to_string()))
    })]
});

/// Parses a coin literal: `<n>e` is `n` whole units, `<n>c` is `n` cents.
pub fn parse_coin(text: &str) -> Option<Money> {
    let unit = text.chars().last()?;
    let digits = &text[..text.len() - unit.len_utf8()];
    let value: u64 = digits.parse().ok()?;
    match unit {
        'e' => value.checked_mul(crate::money::CENTS_PER_UNIT).map(Money::from_cents),
        'c' => Some(Money::from_cents(value)),
        _ => None,
    }
}

/// Cursor over one input line.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Unconsumed input.
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Classifies the next token under `state`, or returns `None` at end of input.
    ///
    /// Always consumes at least one character when it returns a token.
    pub fn next_token(&mut self, state: LexerState) -> Option<Lexeme> {
        self.skip_ignored(state);

        let rest = self.remaining();
        let ch = rest.chars().next()?;
        let start = self.pos;

        let matched = state
            .rules()
            .iter()
            .chain(GLOBAL_RULES.iter())
            .find_map(|rule| rule.try_match(rest).map(|(tok, len)| (rule.name, tok, len)));

        let (rule, token, len) = match matched {
            Some(m) => m,
            None => ("error", Token::Unrecognized(ch), ch.len_utf8()),
        };

        self.pos += len;
        Some(Lexeme {
            token,
            span: start..self.pos,
            rule,
        })
    }

    fn skip_ignored(&mut self, state: LexerState) {
        let skipped: usize = self
            .remaining()
            .chars()
            .take_while(|&c| state.skips(c))
            .map(char::len_utf8)
            .sum();
        self.pos += skipped;
    }
}
