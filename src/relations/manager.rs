//! Keeps per-student order and research lines in sync with the catalogs.
//!
//! Invariant: at all times, the set of `product_id`s in every student's
//! `orders` equals the set of ids in the product catalog, and likewise for
//! `researches`. Every catalog mutation routes through these functions so
//! membership is never left stale.

use crate::types::{EntityId, Product, Research, Student, StudentOrder, StudentResearch};

/// Build the initial order lines for a new student: one per product, all
/// flags false.
pub fn seed_order_lines(products: &[Product]) -> Vec<StudentOrder> {
    products
        .iter()
        .map(|p| StudentOrder::new(p.id.clone()))
        .collect()
}

/// Build the initial research lines for a new student: one per research,
/// unsubmitted and pending.
pub fn seed_research_lines(researches: &[Research]) -> Vec<StudentResearch> {
    researches
        .iter()
        .map(|r| StudentResearch::new(r.id.clone()))
        .collect()
}

/// Append a fresh order line for a newly added product to every student.
pub fn attach_order_line(students: &mut [Student], product_id: &EntityId) {
    for student in students.iter_mut() {
        student.orders.push(StudentOrder::new(product_id.clone()));
    }
}

/// Remove the order line for a deleted product from every student.
///
/// Only the matching line is removed; all other lines keep their flags.
pub fn detach_order_lines(students: &mut [Student], product_id: &EntityId) {
    for student in students.iter_mut() {
        student.orders.retain(|o| o.product_id != *product_id);
    }
}

/// Append a fresh research line for a newly added research to every student.
pub fn attach_research_line(students: &mut [Student], research_id: &EntityId) {
    for student in students.iter_mut() {
        student
            .researches
            .push(StudentResearch::new(research_id.clone()));
    }
}

/// Remove the research line for a deleted research from every student.
pub fn detach_research_lines(students: &mut [Student], research_id: &EntityId) {
    for student in students.iter_mut() {
        student.researches.retain(|r| r.research_id != *research_id);
    }
}
