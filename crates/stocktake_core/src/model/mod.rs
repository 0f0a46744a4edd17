//! Domain model for the inventory product table.
//!
//! # Responsibility
//! - Define the canonical product row shape and write payloads.
//! - Keep field-level validation pure and storage-independent.
//!
//! # Invariants
//! - Every persisted product is identified by a stable `ProductId`.
//! - Write payloads distinguish absent fields from explicit nulls.

pub mod product;
