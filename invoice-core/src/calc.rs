//! Invoice totals.
//!
//! Amounts are carried at full precision; rounding to two decimals is
//! left to whatever displays them.

use serde::{Deserialize, Serialize};

use crate::model::{DisplayFlags, LineItem};

/// A line item with its derived amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedLineItem {
    #[serde(flatten)]
    pub item: LineItem,
    pub discount_amount: f64,
    pub price_after_discount: f64,
    pub tax_amount: f64,
    pub total: f64,
}

impl ComputedLineItem {
    /// `quantity * unit_price`, before discount.
    pub fn line_subtotal(&self) -> f64 {
        self.item.quantity * self.item.unit_price
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    /// Sum of pre-discount line amounts.
    pub subtotal: f64,
    pub total_discount: f64,
    pub total_tax: f64,
    pub grand_total: f64,
}

fn compute_item(item: &LineItem, flags: &DisplayFlags) -> ComputedLineItem {
    let line_subtotal = item.quantity * item.unit_price;
    let discount_amount = if flags.show_discount {
        line_subtotal * item.discount_percent / 100.0
    } else {
        0.0
    };
    let price_after_discount = line_subtotal - discount_amount;
    let tax_amount = if flags.show_tax {
        price_after_discount * item.tax_percent / 100.0
    } else {
        0.0
    };
    ComputedLineItem {
        item: item.clone(),
        discount_amount,
        price_after_discount,
        tax_amount,
        total: price_after_discount + tax_amount,
    }
}

/// Per-item breakdowns, in input order, and their aggregate.
///
/// Inputs are assumed valid; see [`crate::validate`].
pub fn compute(items: &[LineItem], flags: &DisplayFlags) -> (Vec<ComputedLineItem>, InvoiceSummary) {
    let computed: Vec<ComputedLineItem> = items.iter().map(|item| compute_item(item, flags)).collect();

    let mut summary = InvoiceSummary::default();
    for c in &computed {
        summary.subtotal += c.line_subtotal();
        summary.total_discount += c.discount_amount;
        summary.total_tax += c.tax_amount;
    }
    summary.grand_total = summary.subtotal - summary.total_discount + summary.total_tax;

    tracing::debug!(
        items = computed.len(),
        grand_total = summary.grand_total,
        "computed invoice totals"
    );
    (computed, summary)
}
