//! Core error types.

use crate::money::Money;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that prevent a machine session from starting.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read catalog '{path}': {source}")]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    CatalogFormat(#[from] serde_json::Error),

    #[error("duplicate product code '{code}' in catalog")]
    DuplicateCode { code: String },

    #[error("invalid product '{code}': {reason}")]
    InvalidProduct { code: String, reason: String },
}

impl CoreError {
    /// Returns an error code suitable for diagnostics and exit reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::CatalogIo { .. } => "CATALOG_IO_ERROR",
            CoreError::CatalogFormat(_) => "CATALOG_FORMAT",
            CoreError::DuplicateCode { .. } => "DUPLICATE_CODE",
            CoreError::InvalidProduct { .. } => "INVALID_PRODUCT",
        }
    }
}

/// Why a purchase attempt was refused. None of these mutate the machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("Product not found")]
    NotFound { code: String },

    #[error("Product out of stock")]
    OutOfStock { code: String },

    #[error("Insufficient funds")]
    InsufficientFunds { price: Money, balance: Money },
}

impl PurchaseError {
    pub fn error_code(&self) -> &'static str {
        match self {
            PurchaseError::NotFound { .. } => "NOT_FOUND",
            PurchaseError::OutOfStock { .. } => "OUT_OF_STOCK",
            PurchaseError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
        }
    }
}
