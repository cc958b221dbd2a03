//! Aggregation over students and the product catalog.
//!
//! Everything here is a pure function of the current state: no cache, full
//! recomputation on every call. The datasets are small (hundreds of
//! students), so a linear pass per call is fine.

use crate::types::{EntityId, Product, Student};
use serde::{Deserialize, Serialize};

/// Per-product sales aggregates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductStat {
    pub product_id: EntityId,
    pub name: String,
    /// Students whose line for this product is paid.
    pub sold: u32,
    /// Students whose line for this product is delivered, counted
    /// independently of payment.
    pub delivered: u32,
    /// Sold count times the product's current price.
    pub revenue: f64,
}

/// Aggregate view over the whole registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_students: u32,
    /// Students with at least one paid order line.
    pub paid_students: u32,
    /// Students with at least one selected line and every selected line
    /// delivered. A student with nothing selected never counts.
    pub delivered_students: u32,
    pub total_revenue: f64,
    /// Sum of current prices over every selected line, paid or not.
    pub expected_revenue: f64,
    /// `total_revenue / expected_revenue * 100`, or 0 when nothing is
    /// selected.
    pub collection_rate: f64,
    pub product_stats: Vec<ProductStat>,
}

/// Compute the full aggregate view.
///
/// Revenue is priced at the product's current price at computation time, not
/// at the price when the order was paid.
pub fn compute(students: &[Student], products: &[Product]) -> Stats {
    let total_students = students.len() as u32;
    let mut paid_students = 0u32;
    let mut delivered_students = 0u32;
    let mut total_revenue = 0.0f64;
    let mut expected_revenue = 0.0f64;

    let mut product_stats: Vec<ProductStat> = products
        .iter()
        .map(|p| ProductStat {
            product_id: p.id.clone(),
            name: p.name.clone(),
            sold: 0,
            delivered: 0,
            revenue: 0.0,
        })
        .collect();

    for student in students {
        let mut has_paid = false;
        let mut has_delivered = true;

        for order in &student.orders {
            let product = products.iter().find(|p| p.id == order.product_id);
            let mut stat = product_stats
                .iter_mut()
                .find(|ps| ps.product_id == order.product_id);

            if order.paid {
                if let Some(product) = product {
                    has_paid = true;
                    total_revenue += product.price;
                    if let Some(stat) = stat.as_deref_mut() {
                        stat.sold += 1;
                        stat.revenue += product.price;
                    }
                }
            }

            // Delivery is counted independently of payment.
            if order.delivered {
                if let Some(stat) = stat {
                    stat.delivered += 1;
                }
            }

            if order.selected {
                if let Some(product) = product {
                    expected_revenue += product.price;
                }
                if !order.delivered {
                    has_delivered = false;
                }
            }
        }

        if has_paid {
            paid_students += 1;
        }
        if has_delivered && student.orders.iter().any(|o| o.selected) {
            delivered_students += 1;
        }
    }

    let collection_rate = if expected_revenue > 0.0 {
        total_revenue / expected_revenue * 100.0
    } else {
        0.0
    };

    Stats {
        total_students,
        paid_students,
        delivered_students,
        total_revenue,
        expected_revenue,
        collection_rate,
        product_stats,
    }
}

/// Sum of current prices over every paid order line.
///
/// Duplicates the `total_revenue` field of [`compute`] as a standalone call,
/// kept separate for API parity with callers that only need the total.
pub fn total_revenue(students: &[Student], products: &[Product]) -> f64 {
    let mut total = 0.0;
    for student in students {
        for order in &student.orders {
            if order.paid {
                if let Some(product) = products.iter().find(|p| p.id == order.product_id) {
                    total += product.price;
                }
            }
        }
    }
    total
}
