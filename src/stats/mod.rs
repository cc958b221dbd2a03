//! Derived statistics over the registry state.

mod engine;

pub use engine::{compute, total_revenue, ProductStat, Stats};
