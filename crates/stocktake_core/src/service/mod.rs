//! Provider layer: validated CRUD over the product table.
//!
//! # Responsibility
//! - Resolve logical addresses, validate payloads, execute storage calls.
//! - Deliver change notifications after successful mutations.
//!
//! # Invariants
//! - Validation always completes before any storage mutation starts.
//! - Observer behavior can never fail or roll back a committed mutation.

pub mod product_provider;
