//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `stocktake_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use stocktake_core::db::open_db_in_memory;
use stocktake_core::{ProductProvider, ProductValues, Router, SqliteProductRepository};

fn main() {
    println!("stocktake_core version={}", stocktake_core::core_version());

    // Run one insert/query round-trip against an in-memory store to
    // verify provider wiring independently from the Flutter runtime.
    let outcome = smoke_roundtrip();
    match outcome {
        Ok(rows) => println!("stocktake_core smoke=ok rows={rows}"),
        Err(err) => {
            eprintln!("stocktake_core smoke=error detail={err}");
            std::process::exit(1);
        }
    }
}

fn smoke_roundtrip() -> Result<usize, Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    let provider = ProductProvider::new(
        Router::with_defaults()?,
        SqliteProductRepository::new(&conn),
    );

    let collection = provider.router().collection_address();
    let values = ProductValues::for_insert("smoke test item", Some(1), Some(1), "cli", "0000000000");
    provider.insert(&collection, &values)?;

    let snapshot = provider.query(&collection, &[], None, &[], None)?;
    Ok(snapshot.rows.len())
}
