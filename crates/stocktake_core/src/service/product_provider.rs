//! Product provider: the mediator between logical addresses and storage.
//!
//! # Responsibility
//! - Route each CRUD verb through the two-way address table.
//! - Enforce field validation before any mutation commits.
//! - Notify registered observers after every mutation that affected rows.
//!
//! # Invariants
//! - `Item(id)` requests force the filter to `id = ?`; caller filters are
//!   ignored for single-item addresses.
//! - A failed validation leaves storage untouched.
//! - Notifications are delivered synchronously before the call returns;
//!   observer failures are logged and swallowed.

use crate::model::product::{
    validate_insert, validate_update, Product, ProductValidationError, ProductValues,
};
use crate::repo::product_repo::{OrderBy, ProductColumn, ProductRepository, RepoError};
use crate::route::{Address, AddressKind, RouteError, Router};
use log::{debug, error, info, warn};
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Forced predicate for single-item addresses.
const ID_SELECTION: &str = "id = ?";

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Error taxonomy for provider operations.
#[derive(Debug)]
pub enum ProviderError {
    /// The address matches no known pattern; no partial effect.
    Route(RouteError),
    /// The verb is not defined for the resolved address kind.
    UnsupportedOperation {
        operation: &'static str,
        address: Address,
    },
    /// A field invariant failed; raised before any storage mutation.
    Validation(ProductValidationError),
    /// Storage-engine failure.
    Repo(RepoError),
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Route(err) => write!(f, "{err}"),
            Self::UnsupportedOperation { operation, address } => {
                write!(f, "{operation} is not supported for address {address}")
            }
            Self::Validation(err) => write!(f, "invalid field `{}`: {err}", err.field()),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Route(err) => Some(err),
            Self::UnsupportedOperation { .. } => None,
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RouteError> for ProviderError {
    fn from(value: RouteError) -> Self {
        Self::Route(value)
    }
}

impl From<ProductValidationError> for ProviderError {
    fn from(value: ProductValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ProviderError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Observer notified after a successful mutation under an address.
///
/// Delivery is fire-and-forget: a returned error is logged, never
/// surfaced as the operation's result.
pub trait ChangeObserver {
    fn on_change(&self, address: &Address) -> Result<(), String>;
}

/// Query result tagged with the address it was produced for, so callers
/// can refresh it when a notification for that address arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySnapshot {
    pub address: Address,
    pub rows: Vec<Product>,
}

/// Validated-CRUD mediator over one product table.
pub struct ProductProvider<R: ProductRepository> {
    router: Router,
    repo: R,
    observers: Vec<Box<dyn ChangeObserver>>,
}

impl<R: ProductRepository> ProductProvider<R> {
    pub fn new(router: Router, repo: R) -> Self {
        Self {
            router,
            repo,
            observers: Vec::new(),
        }
    }

    /// Registers an observer for change notifications.
    pub fn subscribe(&mut self, observer: Box<dyn ChangeObserver>) {
        self.observers.push(observer);
    }

    /// The route table this provider resolves addresses against.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Queries rows under an address.
    ///
    /// `Collection` passes the caller filter through; `Item(id)` forces
    /// the filter to the row id and ignores the caller filter.
    pub fn query(
        &self,
        address: &str,
        projection: &[ProductColumn],
        filter: Option<&str>,
        filter_args: &[Value],
        order: Option<OrderBy>,
    ) -> ProviderResult<QuerySnapshot> {
        let resolved = self.router.classify(address)?;

        let rows = match resolved {
            Address::Collection => self.repo.query_rows(projection, filter, filter_args, order)?,
            Address::Item(id) => {
                self.repo
                    .query_rows(projection, Some(ID_SELECTION), &[Value::Integer(id)], order)?
            }
        };

        debug!(
            "event=product_query module=provider status=ok address={resolved} rows={}",
            rows.len()
        );
        Ok(QuerySnapshot {
            address: resolved,
            rows,
        })
    }

    /// Inserts a new product under the collection address.
    ///
    /// Returns the new item's address, or `None` when the engine could
    /// not persist the validated row (no notification in that case).
    pub fn insert(
        &self,
        address: &str,
        values: &ProductValues,
    ) -> ProviderResult<Option<Address>> {
        let resolved = self.router.classify(address)?;
        if resolved != Address::Collection {
            return Err(ProviderError::UnsupportedOperation {
                operation: "insert",
                address: resolved,
            });
        }

        validate_insert(values)?;

        match self.repo.insert_row(values)? {
            Some(id) => {
                info!("event=product_insert module=provider status=ok id={id}");
                self.notify(Address::Collection);
                Ok(Some(Address::Item(id)))
            }
            None => {
                error!(
                    "event=product_insert module=provider status=error error_code=storage_insert_failed"
                );
                Ok(None)
            }
        }
    }

    /// Updates rows under an address with the present fields.
    ///
    /// An empty payload is a no-op returning 0 without touching storage.
    /// Notifies observers iff at least one row was affected.
    pub fn update(
        &self,
        address: &str,
        values: &ProductValues,
        filter: Option<&str>,
        filter_args: &[Value],
    ) -> ProviderResult<usize> {
        let resolved = self.router.classify(address)?;
        validate_update(values)?;

        if values.is_empty() {
            return Ok(0);
        }

        let affected = match resolved {
            Address::Collection => self.repo.update_rows(values, filter, filter_args)?,
            Address::Item(id) => {
                self.repo
                    .update_rows(values, Some(ID_SELECTION), &[Value::Integer(id)])?
            }
        };

        info!(
            "event=product_update module=provider status=ok address={resolved} affected={affected}"
        );
        if affected > 0 {
            self.notify(resolved);
        }
        Ok(affected)
    }

    /// Deletes rows under an address.
    ///
    /// Notifies observers iff at least one row was deleted.
    pub fn delete(
        &self,
        address: &str,
        filter: Option<&str>,
        filter_args: &[Value],
    ) -> ProviderResult<usize> {
        let resolved = self.router.classify(address)?;

        let deleted = match resolved {
            Address::Collection => self.repo.delete_rows(filter, filter_args)?,
            Address::Item(id) => self
                .repo
                .delete_rows(Some(ID_SELECTION), &[Value::Integer(id)])?,
        };

        info!(
            "event=product_delete module=provider status=ok address={resolved} deleted={deleted}"
        );
        if deleted > 0 {
            self.notify(resolved);
        }
        Ok(deleted)
    }

    /// Resolves whether an address denotes the collection or one item.
    pub fn resolve_kind(&self, address: &str) -> ProviderResult<AddressKind> {
        Ok(self.router.classify(address)?.kind())
    }

    fn notify(&self, address: Address) {
        for observer in &self.observers {
            if let Err(reason) = observer.on_change(&address) {
                warn!(
                    "event=change_notify module=provider status=error address={address} error={reason}"
                );
            }
        }
        debug!(
            "event=change_notify module=provider status=ok address={address} observers={}",
            self.observers.len()
        );
    }
}
