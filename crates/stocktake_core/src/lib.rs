//! Core data-access layer for the Stocktake inventory app.
//! This crate is the single source of truth for product invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod route;
pub mod service;

pub use logging::{default_log_level, init_logging};
pub use model::product::{
    validate_insert, validate_update, Product, ProductId, ProductValidationError, ProductValues,
    Provided,
};
pub use repo::product_repo::{
    OrderBy, ProductColumn, ProductRepository, RepoError, RepoResult, SqliteProductRepository,
};
pub use route::{Address, AddressKind, RouteError, Router};
pub use service::product_provider::{
    ChangeObserver, ProductProvider, ProviderError, ProviderResult, QuerySnapshot,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
