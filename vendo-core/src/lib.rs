//! # vendo-core
//!
//! Vending machine engine for vendo.
//!
//! This crate provides:
//! - A lexer whose vocabulary depends on the active lexer state
//! - The machine automaton that applies tokens to a balance and a catalog
//! - Product catalog loading
//! - Greedy change calculation over a fixed coin set
//! - Configuration and plain-text reporting shared by the front ends

pub mod catalog;
pub mod change;
pub mod config;
pub mod effect;
pub mod error;
pub mod lexer;
pub mod machine;
pub mod money;
pub mod report;

pub use catalog::{Catalog, CatalogSource, JsonFileSource, Listing, Product};
pub use change::{decompose, Change, CoinCount, DENOMINATIONS};
pub use config::{Config, ConfigError};
pub use effect::{Effect, EffectSink, NullSink};
pub use error::{CoreError, PurchaseError};
pub use lexer::{Lexeme, Lexer, LexerState, Token};
pub use machine::{Machine, MachineSession};
pub use money::Money;
pub use report::TextReport;
