//! # Registrar
//!
//! An in-memory domain store for an academic department's book and material
//! orders: students, a product catalog with stock, per-student order lines,
//! research-submission tracking, messaging, and a capped activity ledger
//! with best-effort external mirroring.
//!
//! ## Core Concepts
//!
//! - **Registry**: single-writer owner of every collection, with
//!   soft no-op semantics for missing ids
//! - **Relations**: per-student order/research lines kept in lockstep with
//!   the catalogs on every add and delete
//! - **Stats**: revenue, collection rate, and per-product aggregates,
//!   recomputed from scratch on demand
//! - **Mirror**: fire-and-forget replication of log entries to an external
//!   store
//!
//! ## Example
//!
//! ```
//! use registrar::{AcademicYear, OrderField, Registry, RegistryConfig};
//!
//! let mut registry = Registry::new(RegistryConfig::default());
//!
//! let tools = registry.add_product("Tools", 120.0, 100);
//! let student = registry.add_student("Omar", "A", "0101", AcademicYear::Y25);
//!
//! registry.update_student_order(&student.id, &tools.id, OrderField::Selected, true);
//! registry.update_student_order(&student.id, &tools.id, OrderField::Paid, true);
//!
//! let stats = registry.stats();
//! assert_eq!(stats.total_revenue, 120.0);
//! ```

pub mod error;
pub mod logs;
pub mod mirror;
pub mod relations;
pub mod stats;
pub mod store;
pub mod types;

// Re-exports
pub use error::{Result, StoreError};
pub use logs::{LogRecorder, DEFAULT_LOG_CAPACITY};
pub use mirror::{LogMirror, MemoryMirror, MirrorHandle};
pub use stats::{ProductStat, Stats};
pub use store::{Registry, RegistryConfig};
pub use types::*;
