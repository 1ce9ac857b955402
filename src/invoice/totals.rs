//! Totals arithmetic for line items and invoices.
//!
//! All money math happens on f64 euros and is rounded to cents at the
//! line-total boundary, so an invoice total is always a sum of exact
//! cent amounts.

use super::types::{Discount, Invoice, LineItem};

/// Round to whole cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

impl LineItem {
    /// Gross unit price (TTC) before discount.
    ///
    /// Prefers the stored gross price; derives it from the net price when
    /// only that was captured. Untaxed categories carry no VAT component,
    /// so net and gross coincide.
    pub fn effective_unit_ttc(&self, tax_rate: f64) -> f64 {
        if self.unit_price_ttc > 0.0 {
            self.unit_price_ttc
        } else if self.category.tax_included() {
            self.unit_price_ht * (1.0 + tax_rate)
        } else {
            self.unit_price_ht
        }
    }

    /// Net unit price (HT) before discount.
    pub fn effective_unit_ht(&self, tax_rate: f64) -> f64 {
        if self.unit_price_ht > 0.0 {
            self.unit_price_ht
        } else if self.category.tax_included() {
            self.unit_price_ttc / (1.0 + tax_rate)
        } else {
            self.unit_price_ttc
        }
    }

    /// Gross unit price after discount, clamped at zero.
    pub fn discounted_unit_ttc(&self, tax_rate: f64) -> f64 {
        let unit = self.effective_unit_ttc(tax_rate);
        let discounted = match self.discount {
            Discount::None => unit,
            Discount::Amount { value } => unit - value,
            Discount::Percent { value } => unit * (1.0 - value / 100.0),
        };
        discounted.max(0.0)
    }

    /// Line total: quantity × discounted gross unit price, in cents.
    pub fn line_total(&self, tax_rate: f64) -> f64 {
        round_cents(self.quantity.max(1) as f64 * self.discounted_unit_ttc(tax_rate))
    }

    /// Net line total, applying the discount proportionally.
    pub fn line_total_ht(&self, tax_rate: f64) -> f64 {
        let gross = self.line_total(tax_rate);
        if self.category.tax_included() {
            round_cents(gross / (1.0 + tax_rate))
        } else {
            gross
        }
    }
}

impl Invoice {
    /// Invoice total, gross (TTC).
    pub fn total(&self) -> f64 {
        round_cents(
            self.items
                .iter()
                .map(|item| item.line_total(self.tax_rate))
                .sum(),
        )
    }

    /// Invoice total, net (HT).
    pub fn total_ht(&self) -> f64 {
        round_cents(
            self.items
                .iter()
                .map(|item| item.line_total_ht(self.tax_rate))
                .sum(),
        )
    }

    /// VAT carried by the invoice.
    pub fn tax_amount(&self) -> f64 {
        round_cents(self.total() - self.total_ht())
    }

    /// Remaining amount after the deposit, never negative.
    pub fn balance_due(&self) -> f64 {
        round_cents((self.total() - self.payment.deposit).max(0.0))
    }
}
