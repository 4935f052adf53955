//! Object storage abstraction for StashPoint.
//!
//! This module provides a trait-based interface for the per-vault blob
//! containers (remote bucket service, local filesystem, in-memory) and a
//! registry for dynamic backend resolution.
//!
//! # Design Principles
//! - Backend isolation: no backend-specific logic in the vault layer
//! - Async operations: all I/O operations are async
//! - Unified error semantics: consistent error types across backends

pub mod local;
pub mod memory;
pub mod provider;
pub mod registry;
pub mod remote;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use provider::{ObjectMeta, ObjectStore};
pub use registry::{create_default_registry, StoreFactory, StoreRegistry};
pub use remote::{RemoteConfig, RemoteStore};
