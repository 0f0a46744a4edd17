//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage-engine contract the provider depends on.
//! - Isolate SQLite statement details from routing/validation logic.
//!
//! # Invariants
//! - Every statement is parameterized; callers never splice values into SQL.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod product_repo;
