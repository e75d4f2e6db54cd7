//! Product catalog.
//!
//! Catalog files are JSON arrays of product records:
//!
//! ```json
//! [
//!   {"code": "01", "name": "Water", "quantity": 8, "price": 0.80},
//!   {"codigo": "02", "nome": "Coffee", "quantidade": 3, "preco": "1.20"}
//! ]
//! ```
//!
//! The Portuguese field names are accepted for files written by the first version of the
//! machine.

use crate::error::CoreError;
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A product slot in the machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Selection code typed after `PRODUCT`.
    #[serde(alias = "codigo")]
    pub code: String,

    /// Display name.
    #[serde(alias = "nome")]
    pub name: String,

    /// Units left in the slot.
    #[serde(alias = "quantidade")]
    pub quantity: u32,

    /// Unit price.
    #[serde(alias = "preco")]
    pub price: Money,
}

impl Product {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        quantity: u32,
        price: Money,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            quantity,
            price,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// One line of a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub code: String,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
}

impl From<&Product> for Listing {
    fn from(p: &Product) -> Self {
        Self {
            code: p.code.clone(),
            name: p.name.clone(),
            price: p.price,
            quantity: p.quantity,
        }
    }
}

/// Products in load order, indexed by code.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate or empty codes.
    pub fn from_products(products: Vec<Product>) -> Result<Self, CoreError> {
        let mut index = HashMap::with_capacity(products.len());

        for (i, product) in products.iter().enumerate() {
            if product.code.trim().is_empty() {
                return Err(CoreError::InvalidProduct {
                    code: product.code.clone(),
                    reason: "empty product code".to_string(),
                });
            }
            if !is_selectable_code(&product.code) {
                tracing::warn!(
                    "Product '{}' ({}) has a code that cannot be typed at the selection prompt",
                    product.code,
                    product.name
                );
            }
            if index.insert(product.code.clone(), i).is_some() {
                return Err(CoreError::DuplicateCode {
                    code: product.code.clone(),
                });
            }
        }

        Ok(Self { products, index })
    }

    /// Loads a catalog from any source.
    pub fn load(source: &dyn CatalogSource) -> Result<Self, CoreError> {
        let products = source.load_products()?;
        let catalog = Self::from_products(products)?;
        tracing::info!(
            "Catalog loaded from {}: {} products",
            source.describe(),
            catalog.len()
        );
        Ok(catalog)
    }

    pub fn get(&self, code: &str) -> Option<&Product> {
        self.index.get(code).map(|&i| &self.products[i])
    }

    pub(crate) fn get_mut(&mut self, code: &str) -> Option<&mut Product> {
        match self.index.get(code) {
            Some(&i) => self.products.get_mut(i),
            None => None,
        }
    }

    pub fn listing(&self) -> Vec<Listing> {
        self.products.iter().map(Listing::from).collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Codes the product selection state can match: exactly two ASCII digits.
pub fn is_selectable_code(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_digit())
}

/// Supplies the product records a session starts with.
pub trait CatalogSource {
    /// Reads all product records, in listing order.
    fn load_products(&self) -> Result<Vec<Product>, CoreError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

/// A JSON catalog file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for JsonFileSource {
    fn load_products(&self) -> Result<Vec<Product>, CoreError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| CoreError::CatalogIo {
            path: self.path.clone(),
            source: e,
        })?;
        parse_products(&content)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl CatalogSource for Vec<Product> {
    fn load_products(&self) -> Result<Vec<Product>, CoreError> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Parses a JSON array of product records.
pub fn parse_products(json: &str) -> Result<Vec<Product>, CoreError> {
    Ok(serde_json::from_str(json)?)
}
