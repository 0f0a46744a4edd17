//! FFI use-case API for the Flutter-facing inventory screens.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Keep error semantics simple for UI integration: response envelopes
//!   with an `error` string instead of thrown exceptions.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - The database path is configured once per process.

use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::OnceLock;
use stocktake_core::db::open_db;
use stocktake_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, Address, Product,
    ProductProvider, ProductValues, Provided, Router, SqliteProductRepository,
};

const INVENTORY_DB_FILE_NAME: &str = "stocktake.sqlite3";
static INVENTORY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on
///   failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Fixes the inventory database directory for this process.
///
/// # FFI contract
/// - Must be called before any product operation.
/// - Repeat calls with the same directory are idempotent; a different
///   directory is rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_inventory_db(db_dir: String) -> String {
    let path = PathBuf::from(db_dir).join(INVENTORY_DB_FILE_NAME);
    let stored = INVENTORY_DB_PATH.get_or_init(|| path.clone());
    if *stored != path {
        return format!(
            "inventory db already configured at `{}`; refusing to switch to `{}`",
            stored.display(),
            path.display()
        );
    }
    String::new()
}

/// Product row shape shared with the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDto {
    pub id: i64,
    pub name: String,
    pub price: Option<i64>,
    pub quantity: Option<i64>,
    pub supplier_name: String,
    pub supplier_phone: String,
}

/// Response envelope for product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductListResponse {
    pub products: Vec<ProductDto>,
    /// Empty on success.
    pub error: String,
}

/// Response envelope for product creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddProductResponse {
    /// Absent when the input was rejected or the engine failed to persist.
    pub new_id: Option<i64>,
    /// Empty on success.
    pub error: String,
}

/// Response envelope for update/delete calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationResponse {
    pub affected: u32,
    /// Empty on success.
    pub error: String,
}

/// Response envelope for address-kind resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressKindResponse {
    /// `collection` or `item`; empty when the address is unrecognized.
    pub kind: String,
    /// Empty on success.
    pub error: String,
}

/// Lists all products in the inventory.
///
/// # FFI contract
/// - Sync call; performs one read-only database query.
/// - Never panics; failures come back in `error`.
#[flutter_rust_bridge::frb(sync)]
pub fn list_products() -> ProductListResponse {
    let conn = match open_inventory() {
        Ok(conn) => conn,
        Err(error) => {
            return ProductListResponse {
                products: Vec::new(),
                error,
            }
        }
    };
    let provider = match build_provider(&conn) {
        Ok(provider) => provider,
        Err(error) => {
            return ProductListResponse {
                products: Vec::new(),
                error,
            }
        }
    };

    let address = provider.router().collection_address();
    match provider.query(&address, &[], None, &[], None) {
        Ok(snapshot) => ProductListResponse {
            products: snapshot.rows.iter().map(to_dto).collect(),
            error: String::new(),
        },
        Err(err) => ProductListResponse {
            products: Vec::new(),
            error: err.to_string(),
        },
    }
}

/// Adds a product to the inventory.
///
/// # FFI contract
/// - Sync call; performs one insert statement.
/// - Validation failures and engine rejection come back in `error`;
///   `new_id` is set only on success.
#[flutter_rust_bridge::frb(sync)]
pub fn add_product(
    name: String,
    price: Option<i64>,
    quantity: Option<i64>,
    supplier_name: String,
    supplier_phone: String,
) -> AddProductResponse {
    let values = ProductValues::for_insert(name, price, quantity, supplier_name, supplier_phone);
    let outcome = open_inventory().and_then(|conn| {
        let provider = build_provider(&conn)?;
        let address = provider.router().collection_address();
        provider
            .insert(&address, &values)
            .map_err(|err| err.to_string())
    });

    match outcome {
        Ok(Some(Address::Item(id))) => AddProductResponse {
            new_id: Some(id),
            error: String::new(),
        },
        Ok(_) => AddProductResponse {
            new_id: None,
            error: "product could not be persisted".to_string(),
        },
        Err(error) => AddProductResponse {
            new_id: None,
            error,
        },
    }
}

/// Sets the on-hand quantity of one product.
///
/// # FFI contract
/// - Sync call; `affected` is 0 when the id does not exist.
#[flutter_rust_bridge::frb(sync)]
pub fn set_product_quantity(id: i64, quantity: i64) -> MutationResponse {
    let values = ProductValues {
        quantity: Provided::Value(quantity),
        ..ProductValues::default()
    };
    mutation_response(open_inventory().and_then(|conn| {
        let provider = build_provider(&conn)?;
        let address = provider.router().item_address(id);
        provider
            .update(&address, &values, None, &[])
            .map_err(|err| err.to_string())
    }))
}

/// Removes one product from the inventory.
///
/// # FFI contract
/// - Sync call; `affected` is 0 when the id does not exist.
#[flutter_rust_bridge::frb(sync)]
pub fn remove_product(id: i64) -> MutationResponse {
    mutation_response(open_inventory().and_then(|conn| {
        let provider = build_provider(&conn)?;
        let address = provider.router().item_address(id);
        provider
            .delete(&address, None, &[])
            .map_err(|err| err.to_string())
    }))
}

/// Resolves whether an address denotes the collection or one item.
///
/// # FFI contract
/// - Sync call, no database access.
#[flutter_rust_bridge::frb(sync)]
pub fn address_kind(address: String) -> AddressKindResponse {
    let resolved = Router::with_defaults()
        .map_err(|err| err.to_string())
        .and_then(|router| router.classify(&address).map_err(|err| err.to_string()));

    match resolved {
        Ok(resolved) => AddressKindResponse {
            kind: resolved.kind().as_str().to_string(),
            error: String::new(),
        },
        Err(error) => AddressKindResponse {
            kind: String::new(),
            error,
        },
    }
}

fn open_inventory() -> Result<Connection, String> {
    let path = INVENTORY_DB_PATH
        .get()
        .ok_or_else(|| "inventory db not configured; call configure_inventory_db".to_string())?;
    open_db(path).map_err(|err| err.to_string())
}

fn build_provider(
    conn: &Connection,
) -> Result<ProductProvider<SqliteProductRepository<'_>>, String> {
    let router = Router::with_defaults().map_err(|err| err.to_string())?;
    Ok(ProductProvider::new(
        router,
        SqliteProductRepository::new(conn),
    ))
}

fn mutation_response(outcome: Result<usize, String>) -> MutationResponse {
    match outcome {
        Ok(affected) => MutationResponse {
            affected: affected as u32,
            error: String::new(),
        },
        Err(error) => MutationResponse {
            affected: 0,
            error,
        },
    }
}

fn to_dto(product: &Product) -> ProductDto {
    ProductDto {
        id: product.id,
        name: product.name.clone().unwrap_or_default(),
        price: product.price,
        quantity: product.quantity,
        supplier_name: product.supplier_name.clone().unwrap_or_default(),
        supplier_phone: product.supplier_phone.clone().unwrap_or_default(),
    }
}
