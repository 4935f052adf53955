//! Relational table store for StashPoint.
//!
//! This module persists everything that is not blob content: vault records,
//! session rows, the denormalized file index, and the activity log. It is
//! the embedded stand-in for the hosted table store the system delegates to.
//!
//! # Design Principles
//! - One table per record kind, addressed through typed accessors
//! - Case-insensitive vault name uniqueness enforced at the schema level
//! - No business logic: tier decisions, expiry checks, and ordering policies
//!   beyond SQL sorting live in the vault layer

pub mod db;

pub use db::{ActivityRow, Database, FileRow, SessionRow, VaultRow};
