//! Product table persistence contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide parameterized query/insert/update/delete over `products`.
//! - Map the engine's insert-failure sentinel without surfacing it as an
//!   error (valid input the engine could not persist is not caller fault).
//!
//! # Invariants
//! - `id` is always part of the effective projection.
//! - Each call is a single atomic SQL statement; no cross-call transaction.

use crate::db::DbError;
use crate::model::product::{Product, ProductId, ProductValues, Provided};
use log::error;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PRODUCTS_TABLE: &str = "products";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for product storage operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted product data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Columns of the `products` table, the closed vocabulary for projections
/// and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductColumn {
    Id,
    Name,
    Price,
    Quantity,
    SupplierName,
    SupplierPhone,
}

impl ProductColumn {
    pub const ALL: [Self; 6] = [
        Self::Id,
        Self::Name,
        Self::Price,
        Self::Quantity,
        Self::SupplierName,
        Self::SupplierPhone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
            Self::Quantity => "quantity",
            Self::SupplierName => "supplier_name",
            Self::SupplierPhone => "supplier_phone",
        }
    }
}

/// Sort directive for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: ProductColumn,
    pub descending: bool,
}

impl OrderBy {
    pub fn ascending(column: ProductColumn) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    fn sql_fragment(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("{} {direction}", self.column.as_str())
    }
}

/// Storage-engine contract required by the product provider.
///
/// `filter` is a parameterized predicate fragment (`?` placeholders) and
/// `filter_args` its bind values, matching positionally.
pub trait ProductRepository {
    /// Returns rows matching the filter. An empty projection selects all
    /// columns; `id` is selected regardless.
    fn query_rows(
        &self,
        projection: &[ProductColumn],
        filter: Option<&str>,
        filter_args: &[Value],
        order: Option<OrderBy>,
    ) -> RepoResult<Vec<Product>>;

    /// Inserts one row. Returns `None` when the engine rejects the row
    /// (the insert-failure sentinel), `Some(id)` otherwise.
    fn insert_row(&self, values: &ProductValues) -> RepoResult<Option<ProductId>>;

    /// Updates matching rows with the present fields. Returns the number
    /// of rows affected; an empty payload affects zero rows.
    fn update_rows(
        &self,
        values: &ProductValues,
        filter: Option<&str>,
        filter_args: &[Value],
    ) -> RepoResult<usize>;

    /// Deletes matching rows and returns the number of rows deleted.
    fn delete_rows(&self, filter: Option<&str>, filter_args: &[Value]) -> RepoResult<usize>;
}

/// SQLite-backed product repository.
pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn query_rows(
        &self,
        projection: &[ProductColumn],
        filter: Option<&str>,
        filter_args: &[Value],
        order: Option<OrderBy>,
    ) -> RepoResult<Vec<Product>> {
        let columns = effective_projection(projection);
        let column_list = columns
            .iter()
            .map(|column| column.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {column_list} FROM {PRODUCTS_TABLE}");
        if let Some(predicate) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        if let Some(order) = order {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.sql_fragment());
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(filter_args.iter()))?;
        let mut products = Vec::new();

        while let Some(row) = rows.next()? {
            products.push(parse_product_row(row, &columns)?);
        }

        Ok(products)
    }

    fn insert_row(&self, values: &ProductValues) -> RepoResult<Option<ProductId>> {
        let (columns, binds) = present_columns(values);

        let sql = if columns.is_empty() {
            format!("INSERT INTO {PRODUCTS_TABLE} DEFAULT VALUES;")
        } else {
            let placeholders = vec!["?"; columns.len()].join(", ");
            format!(
                "INSERT INTO {PRODUCTS_TABLE} ({}) VALUES ({placeholders});",
                columns.join(", ")
            )
        };

        match self.conn.execute(&sql, params_from_iter(binds.iter())) {
            Ok(_) => Ok(Some(self.conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(ffi_err, message))
                if ffi_err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                // The engine refused a row that passed field validation.
                // Mirror the sentinel contract: absent id, not an error.
                error!(
                    "event=product_insert module=repo status=error error_code=constraint detail={}",
                    message.as_deref().unwrap_or("unknown")
                );
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_rows(
        &self,
        values: &ProductValues,
        filter: Option<&str>,
        filter_args: &[Value],
    ) -> RepoResult<usize> {
        let (columns, mut binds) = present_columns(values);
        if columns.is_empty() {
            return Ok(0);
        }

        let assignments = columns
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("UPDATE {PRODUCTS_TABLE} SET {assignments}");
        if let Some(predicate) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        binds.extend(filter_args.iter().cloned());

        let affected = self.conn.execute(&sql, params_from_iter(binds.iter()))?;
        Ok(affected)
    }

    fn delete_rows(&self, filter: Option<&str>, filter_args: &[Value]) -> RepoResult<usize> {
        let mut sql = format!("DELETE FROM {PRODUCTS_TABLE}");
        if let Some(predicate) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }

        let deleted = self
            .conn
            .execute(&sql, params_from_iter(filter_args.iter()))?;
        Ok(deleted)
    }
}

fn effective_projection(projection: &[ProductColumn]) -> Vec<ProductColumn> {
    if projection.is_empty() {
        return ProductColumn::ALL.to_vec();
    }

    let mut columns = vec![ProductColumn::Id];
    for &column in projection {
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    columns
}

fn parse_product_row(row: &Row<'_>, columns: &[ProductColumn]) -> RepoResult<Product> {
    let mut product = Product {
        id: row.get(ProductColumn::Id.as_str())?,
        name: None,
        price: None,
        quantity: None,
        supplier_name: None,
        supplier_phone: None,
    };

    for column in columns {
        match column {
            ProductColumn::Id => {}
            ProductColumn::Name => product.name = row.get(column.as_str())?,
            ProductColumn::Price => {
                product.price = checked_amount(row, *column)?;
            }
            ProductColumn::Quantity => {
                product.quantity = checked_amount(row, *column)?;
            }
            ProductColumn::SupplierName => product.supplier_name = row.get(column.as_str())?,
            ProductColumn::SupplierPhone => product.supplier_phone = row.get(column.as_str())?,
        }
    }

    Ok(product)
}

fn checked_amount(row: &Row<'_>, column: ProductColumn) -> RepoResult<Option<i64>> {
    let value: Option<i64> = row.get(column.as_str())?;
    if let Some(amount) = value {
        if amount < 0 {
            return Err(RepoError::InvalidData(format!(
                "negative value `{amount}` in products.{}",
                column.as_str()
            )));
        }
    }
    Ok(value)
}

fn present_columns(values: &ProductValues) -> (Vec<&'static str>, Vec<Value>) {
    let mut columns = Vec::new();
    let mut binds = Vec::new();

    push_text(&mut columns, &mut binds, ProductColumn::Name, &values.name);
    push_integer(&mut columns, &mut binds, ProductColumn::Price, &values.price);
    push_integer(
        &mut columns,
        &mut binds,
        ProductColumn::Quantity,
        &values.quantity,
    );
    push_text(
        &mut columns,
        &mut binds,
        ProductColumn::SupplierName,
        &values.supplier_name,
    );
    push_text(
        &mut columns,
        &mut binds,
        ProductColumn::SupplierPhone,
        &values.supplier_phone,
    );

    (columns, binds)
}

fn push_text(
    columns: &mut Vec<&'static str>,
    binds: &mut Vec<Value>,
    column: ProductColumn,
    slot: &Provided<String>,
) {
    match slot {
        Provided::Absent => {}
        Provided::Null => {
            columns.push(column.as_str());
            binds.push(Value::Null);
        }
        Provided::Value(text) => {
            columns.push(column.as_str());
            binds.push(Value::Text(text.clone()));
        }
    }
}

fn push_integer(
    columns: &mut Vec<&'static str>,
    binds: &mut Vec<Value>,
    column: ProductColumn,
    slot: &Provided<i64>,
) {
    match slot {
        Provided::Absent => {}
        Provided::Null => {
            columns.push(column.as_str());
            binds.push(Value::Null);
        }
        Provided::Value(amount) => {
            columns.push(column.as_str());
            binds.push(Value::Integer(*amount));
        }
    }
}
