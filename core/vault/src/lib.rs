//! Vault access and catalog management for StashPoint.
//!
//! This module provides:
//! - Passkey-based identity resolution into authorization tiers
//! - Durable session tokens with expiry
//! - The per-vault file catalog over pluggable object storage
//! - The best-effort activity log
//!
//! # Architecture
//! The vault module sits between the caller-facing surface and the storage
//! backends. Identity is always passed explicitly as a session token or
//! resolved claims; there is no ambient session state.

pub mod activity;
pub mod catalog;
pub mod config;
pub mod identity;
pub mod manager;
pub mod session;

pub use activity::{ActionKind, ActivityLog, ActivityRecord};
pub use catalog::{Catalog, RESERVED_PREFIX};
pub use config::Config;
pub use identity::{IdentityResolver, ResolvedIdentity};
pub use manager::{Login, VaultManager};
pub use session::{SessionClaims, SessionStore};
