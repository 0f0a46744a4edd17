use rusqlite::types::Value;
use rusqlite::Connection;
use std::cell::RefCell;
use std::rc::Rc;
use stocktake_core::db::open_db_in_memory;
use stocktake_core::{
    Address, AddressKind, ChangeObserver, ProductColumn, ProductProvider, ProductRepository,
    ProductValidationError, ProductValues, ProviderError, Provided, RepoResult, RouteError,
    Router, SqliteProductRepository,
};

struct RecordingObserver {
    seen: Rc<RefCell<Vec<Address>>>,
}

impl ChangeObserver for RecordingObserver {
    fn on_change(&self, address: &Address) -> Result<(), String> {
        self.seen.borrow_mut().push(*address);
        Ok(())
    }
}

struct FailingObserver;

impl ChangeObserver for FailingObserver {
    fn on_change(&self, _address: &Address) -> Result<(), String> {
        Err("observer is offline".to_string())
    }
}

fn provider(
    conn: &Connection,
) -> (
    ProductProvider<SqliteProductRepository<'_>>,
    Rc<RefCell<Vec<Address>>>,
) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut provider = ProductProvider::new(
        Router::with_defaults().unwrap(),
        SqliteProductRepository::new(conn),
    );
    provider.subscribe(Box::new(RecordingObserver { seen: seen.clone() }));
    (provider, seen)
}

fn collection() -> String {
    Router::with_defaults().unwrap().collection_address()
}

fn item(id: i64) -> String {
    Router::with_defaults().unwrap().item_address(id)
}

fn sample_values() -> ProductValues {
    ProductValues::for_insert("flux capacitor", Some(1200), Some(4), "Emmett", "5550001985")
}

#[test]
fn insert_returns_fresh_item_address_and_row_is_queryable() {
    let conn = open_db_in_memory().unwrap();
    let (provider, seen) = provider(&conn);

    let address = provider.insert(&collection(), &sample_values()).unwrap();
    let Some(Address::Item(id)) = address else {
        panic!("expected an item address, got {address:?}");
    };

    let snapshot = provider
        .query(&collection(), &[], None, &[], None)
        .unwrap();
    assert_eq!(snapshot.address, Address::Collection);
    assert_eq!(snapshot.rows.len(), 1);
    let row = &snapshot.rows[0];
    assert_eq!(row.id, id);
    assert_eq!(row.name.as_deref(), Some("flux capacitor"));
    assert_eq!(row.price, Some(1200));
    assert_eq!(row.quantity, Some(4));
    assert_eq!(row.supplier_name.as_deref(), Some("Emmett"));
    assert_eq!(row.supplier_phone.as_deref(), Some("5550001985"));

    assert_eq!(seen.borrow().as_slice(), &[Address::Collection]);
}

#[test]
fn insert_with_missing_name_fails_and_leaves_storage_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let (provider, seen) = provider(&conn);

    let mut values = sample_values();
    values.name = Provided::Absent;
    let err = provider.insert(&collection(), &values).unwrap_err();
    match err {
        ProviderError::Validation(inner) => {
            assert_eq!(inner, ProductValidationError::NameRequired);
            assert_eq!(inner.field(), "name");
        }
        other => panic!("unexpected error: {other}"),
    }

    let snapshot = provider
        .query(&collection(), &[], None, &[], None)
        .unwrap();
    assert!(snapshot.rows.is_empty());
    assert!(seen.borrow().is_empty());
}

#[test]
fn insert_price_zero_is_valid_but_negative_is_not() {
    let conn = open_db_in_memory().unwrap();
    let (provider, _) = provider(&conn);

    let mut values = sample_values();
    values.price = Provided::Value(-1);
    let err = provider.insert(&collection(), &values).unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Validation(ProductValidationError::NegativePrice(-1))
    ));

    values.price = Provided::Value(0);
    assert!(provider.insert(&collection(), &values).unwrap().is_some());
}

#[test]
fn insert_is_unsupported_for_item_addresses() {
    let conn = open_db_in_memory().unwrap();
    let (provider, seen) = provider(&conn);

    let err = provider.insert(&item(3), &sample_values()).unwrap_err();
    assert!(matches!(
        err,
        ProviderError::UnsupportedOperation {
            operation: "insert",
            address: Address::Item(3),
        }
    ));
    assert!(seen.borrow().is_empty());
}

#[test]
fn empty_update_is_a_noop_without_notification() {
    let conn = open_db_in_memory().unwrap();
    let (provider, seen) = provider(&conn);
    provider.insert(&collection(), &sample_values()).unwrap();
    seen.borrow_mut().clear();

    let affected = provider
        .update(&collection(), &ProductValues::default(), None, &[])
        .unwrap();
    assert_eq!(affected, 0);
    assert!(seen.borrow().is_empty());
}

#[test]
fn update_quantity_roundtrips_through_item_query() {
    let conn = open_db_in_memory().unwrap();
    let (provider, seen) = provider(&conn);

    let inserted = provider
        .insert(&collection(), &sample_values())
        .unwrap()
        .unwrap();
    let Address::Item(id) = inserted else {
        panic!("expected an item address");
    };
    seen.borrow_mut().clear();

    let values = ProductValues {
        quantity: Provided::Value(17),
        ..ProductValues::default()
    };
    let affected = provider.update(&item(id), &values, None, &[]).unwrap();
    assert_eq!(affected, 1);
    assert_eq!(seen.borrow().as_slice(), &[Address::Item(id)]);

    let snapshot = provider.query(&item(id), &[], None, &[], None).unwrap();
    assert_eq!(snapshot.address, Address::Item(id));
    assert_eq!(snapshot.rows.len(), 1);
    assert_eq!(snapshot.rows[0].quantity, Some(17));
}

#[test]
fn item_update_ignores_caller_filter() {
    let conn = open_db_in_memory().unwrap();
    let (provider, _) = provider(&conn);

    let inserted = provider
        .insert(&collection(), &sample_values())
        .unwrap()
        .unwrap();
    let Address::Item(id) = inserted else {
        panic!("expected an item address");
    };

    // A caller filter that matches nothing must still be overridden by
    // the forced id predicate.
    let values = ProductValues {
        quantity: Provided::Value(1),
        ..ProductValues::default()
    };
    let affected = provider
        .update(
            &item(id),
            &values,
            Some("name = ?"),
            &[Value::Text("no such product".to_string())],
        )
        .unwrap();
    assert_eq!(affected, 1);
}

#[test]
fn bulk_update_on_collection_applies_caller_filter() {
    let conn = open_db_in_memory().unwrap();
    let (provider, seen) = provider(&conn);

    provider.insert(&collection(), &sample_values()).unwrap();
    provider
        .insert(
            &collection(),
            &ProductValues::for_insert("sprocket", Some(30), Some(9), "Acme", "5550002222"),
        )
        .unwrap();
    seen.borrow_mut().clear();

    let values = ProductValues {
        quantity: Provided::Value(0),
        ..ProductValues::default()
    };
    let affected = provider
        .update(
            &collection(),
            &values,
            Some("supplier_name = ?"),
            &[Value::Text("Acme".to_string())],
        )
        .unwrap();
    assert_eq!(affected, 1);
    assert_eq!(seen.borrow().as_slice(), &[Address::Collection]);
}

#[test]
fn update_with_null_supplier_phone_fails_before_storage() {
    let conn = open_db_in_memory().unwrap();
    let (provider, _) = provider(&conn);

    let inserted = provider
        .insert(&collection(), &sample_values())
        .unwrap()
        .unwrap();
    let Address::Item(id) = inserted else {
        panic!("expected an item address");
    };

    let values = ProductValues {
        supplier_phone: Provided::Null,
        ..ProductValues::default()
    };
    let err = provider.update(&item(id), &values, None, &[]).unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Validation(ProductValidationError::SupplierPhoneRequired)
    ));

    let snapshot = provider.query(&item(id), &[], None, &[], None).unwrap();
    assert_eq!(snapshot.rows[0].supplier_phone.as_deref(), Some("5550001985"));
}

#[test]
fn delete_counts_and_notifications_match_affected_rows() {
    let conn = open_db_in_memory().unwrap();
    let (provider, seen) = provider(&conn);

    let inserted = provider
        .insert(&collection(), &sample_values())
        .unwrap()
        .unwrap();
    let Address::Item(id) = inserted else {
        panic!("expected an item address");
    };
    seen.borrow_mut().clear();

    let none_deleted = provider
        .delete(
            &collection(),
            Some("name = ?"),
            &[Value::Text("missing".to_string())],
        )
        .unwrap();
    assert_eq!(none_deleted, 0);
    assert!(seen.borrow().is_empty());

    let deleted = provider.delete(&item(id), None, &[]).unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(seen.borrow().as_slice(), &[Address::Item(id)]);
}

#[test]
fn query_for_absent_item_returns_empty_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let (provider, _) = provider(&conn);

    let snapshot = provider.query(&item(999), &[], None, &[], None).unwrap();
    assert_eq!(snapshot.address, Address::Item(999));
    assert!(snapshot.rows.is_empty());
}

#[test]
fn query_projection_limits_returned_columns() {
    let conn = open_db_in_memory().unwrap();
    let (provider, _) = provider(&conn);
    provider.insert(&collection(), &sample_values()).unwrap();

    let snapshot = provider
        .query(&collection(), &[ProductColumn::Name], None, &[], None)
        .unwrap();
    let row = &snapshot.rows[0];
    assert!(row.id > 0);
    assert_eq!(row.name.as_deref(), Some("flux capacitor"));
    assert_eq!(row.price, None);
    assert_eq!(row.supplier_name, None);
}

#[test]
fn query_orders_rows_when_a_sort_directive_is_given() {
    let conn = open_db_in_memory().unwrap();
    let (provider, _) = provider(&conn);

    provider.insert(&collection(), &sample_values()).unwrap();
    provider
        .insert(
            &collection(),
            &ProductValues::for_insert("sprocket", Some(9000), Some(1), "Acme", "5550002222"),
        )
        .unwrap();

    let snapshot = provider
        .query(
            &collection(),
            &[],
            None,
            &[],
            Some(stocktake_core::OrderBy {
                column: ProductColumn::Price,
                descending: true,
            }),
        )
        .unwrap();
    assert_eq!(snapshot.rows[0].price, Some(9000));
    assert_eq!(snapshot.rows[1].price, Some(1200));
}

#[test]
fn operations_on_unrecognized_addresses_fail_without_effect() {
    let conn = open_db_in_memory().unwrap();
    let (provider, seen) = provider(&conn);

    let bad = "app.stocktake/products/not-a-number";
    assert!(matches!(
        provider.query(bad, &[], None, &[], None),
        Err(ProviderError::Route(RouteError::UnrecognizedAddress(_)))
    ));
    assert!(matches!(
        provider.insert(bad, &sample_values()),
        Err(ProviderError::Route(RouteError::UnrecognizedAddress(_)))
    ));
    assert!(matches!(
        provider.delete(bad, None, &[]),
        Err(ProviderError::Route(RouteError::UnrecognizedAddress(_)))
    ));
    assert!(seen.borrow().is_empty());
}

#[test]
fn resolve_kind_classifies_both_shapes() {
    let conn = open_db_in_memory().unwrap();
    let (provider, _) = provider(&conn);

    assert_eq!(
        provider.resolve_kind(&collection()).unwrap(),
        AddressKind::Collection
    );
    assert_eq!(provider.resolve_kind(&item(12)).unwrap(), AddressKind::Item);
    assert!(provider.resolve_kind("nowhere").is_err());
}

#[test]
fn failing_observer_does_not_fail_the_mutation() {
    let conn = open_db_in_memory().unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut provider = ProductProvider::new(
        Router::with_defaults().unwrap(),
        SqliteProductRepository::new(&conn),
    );
    provider.subscribe(Box::new(FailingObserver));
    provider.subscribe(Box::new(RecordingObserver { seen: seen.clone() }));

    let inserted = provider.insert(&collection(), &sample_values()).unwrap();
    assert!(inserted.is_some());
    // The second observer is still reached after the first one failed.
    assert_eq!(seen.borrow().as_slice(), &[Address::Collection]);
}

/// Repository stub whose insert always reports the engine sentinel.
struct RejectingRepo;

impl ProductRepository for RejectingRepo {
    fn query_rows(
        &self,
        _projection: &[ProductColumn],
        _filter: Option<&str>,
        _filter_args: &[Value],
        _order: Option<stocktake_core::OrderBy>,
    ) -> RepoResult<Vec<stocktake_core::Product>> {
        Ok(Vec::new())
    }

    fn insert_row(&self, _values: &ProductValues) -> RepoResult<Option<i64>> {
        Ok(None)
    }

    fn update_rows(
        &self,
        _values: &ProductValues,
        _filter: Option<&str>,
        _filter_args: &[Value],
    ) -> RepoResult<usize> {
        Ok(0)
    }

    fn delete_rows(&self, _filter: Option<&str>, _filter_args: &[Value]) -> RepoResult<usize> {
        Ok(0)
    }
}

#[test]
fn engine_insert_failure_yields_absent_address_and_no_notification() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut provider = ProductProvider::new(Router::with_defaults().unwrap(), RejectingRepo);
    provider.subscribe(Box::new(RecordingObserver { seen: seen.clone() }));

    let inserted = provider.insert(&collection(), &sample_values()).unwrap();
    assert!(inserted.is_none());
    assert!(seen.borrow().is_empty());
}

#[test]
fn sqlite_repo_maps_constraint_violation_to_sentinel() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProductRepository::new(&conn);

    // An all-absent payload hits the NOT NULL constraints on insert.
    let inserted = repo.insert_row(&ProductValues::default()).unwrap();
    assert!(inserted.is_none());
}
