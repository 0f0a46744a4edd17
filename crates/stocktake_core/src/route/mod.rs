//! Logical address routing for the product table.
//!
//! # Responsibility
//! - Classify caller-supplied addresses into collection vs. single-item.
//! - Render canonical address strings for callers and the FFI layer.
//!
//! # Invariants
//! - Exactly two shapes are valid: `<authority>/<path>` and
//!   `<authority>/<path>/<non-negative integer>`.
//! - The route table is fixed at construction and never changes at runtime.

use crate::model::product::ProductId;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Authority used by the inventory app unless a caller overrides it.
pub const DEFAULT_AUTHORITY: &str = "app.stocktake";

/// Collection path segment for the product table.
pub const PRODUCTS_PATH: &str = "products";

/// Resolved logical address: the whole table or one row by surrogate id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    Collection,
    Item(ProductId),
}

impl Address {
    pub fn kind(&self) -> AddressKind {
        match self {
            Self::Collection => AddressKind::Collection,
            Self::Item(_) => AddressKind::Item,
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collection => write!(f, "collection"),
            Self::Item(id) => write!(f, "item:{id}"),
        }
    }
}

/// Content-kind classification of an address, the answer to "does this
/// address denote one row or the whole table".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Collection,
    Item,
}

impl AddressKind {
    /// Stable label for UI/FFI consumers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Item => "item",
        }
    }
}

impl Display for AddressKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum RouteError {
    /// The address matches neither the collection nor the item shape.
    UnrecognizedAddress(String),
    /// The authority/path pair could not be compiled into a route pattern.
    InvalidRoutePattern(regex::Error),
}

impl Display for RouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedAddress(address) => {
                write!(f, "unrecognized address: `{address}`")
            }
            Self::InvalidRoutePattern(err) => write!(f, "invalid route pattern: {err}"),
        }
    }
}

impl Error for RouteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnrecognizedAddress(_) => None,
            Self::InvalidRoutePattern(err) => Some(err),
        }
    }
}

/// Two-way route table for the product table, fixed at construction.
#[derive(Debug)]
pub struct Router {
    authority: String,
    path: String,
    pattern: Regex,
}

impl Router {
    /// Builds a router for `<authority>/<path>` addresses.
    pub fn new(authority: impl Into<String>, path: impl Into<String>) -> Result<Self, RouteError> {
        let authority = authority.into();
        let path = path.into();
        let pattern = Regex::new(&format!(
            "^{}/{}(?:/([0-9]+))?$",
            regex::escape(&authority),
            regex::escape(&path)
        ))
        .map_err(RouteError::InvalidRoutePattern)?;

        Ok(Self {
            authority,
            path,
            pattern,
        })
    }

    /// Builds the router used by the inventory app itself.
    pub fn with_defaults() -> Result<Self, RouteError> {
        Self::new(DEFAULT_AUTHORITY, PRODUCTS_PATH)
    }

    /// Classifies an address string into `Collection` or `Item(id)`.
    ///
    /// # Errors
    /// - `UnrecognizedAddress` for any other shape, including ids that
    ///   overflow the id type.
    pub fn classify(&self, address: &str) -> Result<Address, RouteError> {
        let captures = self
            .pattern
            .captures(address)
            .ok_or_else(|| RouteError::UnrecognizedAddress(address.to_string()))?;

        match captures.get(1) {
            None => Ok(Address::Collection),
            Some(segment) => segment
                .as_str()
                .parse::<ProductId>()
                .map(Address::Item)
                .map_err(|_| RouteError::UnrecognizedAddress(address.to_string())),
        }
    }

    /// Canonical address string for the whole product table.
    pub fn collection_address(&self) -> String {
        format!("{}/{}", self.authority, self.path)
    }

    /// Canonical address string for one product row.
    pub fn item_address(&self, id: ProductId) -> String {
        format!("{}/{}/{}", self.authority, self.path, id)
    }
}
