//! Line-item ledger arithmetic.
//!
//! All monetary math runs on `Decimal`. Per-line amounts are rounded to two
//! decimal places before they are summed into document aggregates.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to two decimal places, midpoint away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Pricing inputs for a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePricing {
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub tax_rate: Decimal,
}

/// Computed amounts for a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAmounts {
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub line_amount: Decimal,
}

/// Document-level monetary aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub shipping_charges: Decimal,
    pub total_amount: Decimal,
}

/// Compute the discount, tax, and line amount for one line.
///
/// The discount applies to the gross amount (quantity x price); tax applies
/// to the net after discount.
pub fn compute_line(pricing: &LinePricing) -> LineAmounts {
    let gross = pricing.quantity * pricing.unit_price;
    let discount_amount = round2(gross * pricing.discount_percent / Decimal::ONE_HUNDRED);
    let net = gross - discount_amount;
    let tax_amount = round2(net * pricing.tax_rate / Decimal::ONE_HUNDRED);
    let line_amount = round2(net + tax_amount);
    LineAmounts {
        discount_amount,
        tax_amount,
        line_amount,
    }
}

/// Compute every line plus the document aggregates in one pass.
///
/// Subtotal is the pre-discount, pre-tax sum; the document discount and tax
/// are sums of the per-line rounded values, so summation order cannot change
/// the result.
pub fn compute_document(
    lines: &[LinePricing],
    shipping_charges: Decimal,
) -> (Vec<LineAmounts>, DocumentTotals) {
    let amounts: Vec<LineAmounts> = lines.iter().map(compute_line).collect();

    let subtotal = round2(
        lines
            .iter()
            .map(|l| l.quantity * l.unit_price)
            .sum::<Decimal>(),
    );
    let discount_amount = amounts.iter().map(|a| a.discount_amount).sum::<Decimal>();
    let tax_amount = amounts.iter().map(|a| a.tax_amount).sum::<Decimal>();
    let total_amount = subtotal - discount_amount + tax_amount + shipping_charges;

    (
        amounts,
        DocumentTotals {
            subtotal,
            discount_amount,
            tax_amount,
            shipping_charges,
            total_amount,
        },
    )
}
