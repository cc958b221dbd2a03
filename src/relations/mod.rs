//! Reconciliation of per-student lines against the catalogs.

mod manager;

pub use manager::{
    attach_order_line, attach_research_line, detach_order_lines, detach_research_lines,
    seed_order_lines, seed_research_lines,
};
