//! # Sample Invoices
//!
//! Pre-built invoices for demos and tests: a one-line sale, a full
//! multi-line bedding order with discounts and a deposit, and a minimal
//! invoice exercising the defaults.

use chrono::NaiveDate;

use super::types::{Client, Discount, Invoice, LineItem, PaymentMethod, ProductCategory};

// ============================================================================
// SAMPLE TEMPLATES
// ============================================================================

/// One mattress, paid by card, nothing fancy.
pub fn demo_invoice() -> Invoice {
    let client = Client {
        name: "Jeanne Moreau".into(),
        address: "12 rue des Lilas".into(),
        postal_code: "75011".into(),
        city: "Paris".into(),
        phone: "06 12 34 56 78".into(),
        email: "jeanne.moreau@example.com".into(),
        siret: None,
    };

    let mut invoice = Invoice::new("2025-001", client)
        .with_item(
            LineItem::new("Matelas Memory Confort 140x190", 1, 899.0)
                .with_category(ProductCategory::Matelas),
        );
    invoice.issue_date = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
    invoice.advisor = Some("Sylvie".into());
    invoice.terms_accepted = true;
    invoice
}

/// Full bedding order: several categories, both discount kinds, a
/// deposit, and markdown notes.
pub fn literie_invoice() -> Invoice {
    let client = Client {
        name: "Bernard Tapie".into(),
        address: "3 avenue de la République".into(),
        postal_code: "13001".into(),
        city: "Marseille".into(),
        phone: "04 91 00 00 00".into(),
        email: "b.tapie@example.com".into(),
        siret: Some("123 456 789 00012".into()),
    };

    let mut invoice = Invoice::new("2025-042", client)
        .with_item(
            LineItem::new("Matelas Latex Naturel 160x200", 1, 1490.0)
                .with_category(ProductCategory::Matelas)
                .with_discount(Discount::Percent { value: 10.0 }),
        )
        .with_item(
            LineItem::new("Sur-matelas Climatisé 160x200", 1, 390.0)
                .with_category(ProductCategory::SurMatelas),
        )
        .with_item(
            LineItem::new("Oreiller Ergonomique", 2, 75.0)
                .with_category(ProductCategory::Oreiller)
                .with_discount(Discount::Amount { value: 10.0 }),
        )
        .with_item(
            LineItem::new("Couette 4 Saisons 240x260", 1, 189.0)
                .with_category(ProductCategory::Couette),
        );
    invoice.issue_date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
    invoice.payment.method = PaymentMethod::Cheque;
    invoice.payment.deposit = 500.0;
    invoice.advisor = Some("Marc".into());
    invoice.terms_accepted = true;
    invoice.notes = "Livraison **offerte** à partir du 22/03.\n\n\
- Reprise de l'ancienne literie incluse\n\
- Étage : 3e sans ascenseur"
        .into();
    invoice
}

/// Bare minimum: defaults everywhere, one accessory line.
pub fn minimal_invoice() -> Invoice {
    let mut invoice = Invoice::new(
        "2025-099",
        Client::new("Client Comptoir", "comptoir@example.com"),
    )
    .with_item(LineItem::new("Protège-matelas 90x190", 1, 39.0));
    invoice.issue_date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
    invoice
}

/// List available sample names
pub fn list_samples() -> &'static [&'static str] {
    &["demo", "literie", "minimal"]
}

/// Get a sample invoice by name
pub fn by_name(name: &str) -> Option<Invoice> {
    match name.to_lowercase().as_str() {
        "demo" => Some(demo_invoice()),
        "literie" => Some(literie_invoice()),
        "minimal" => Some(minimal_invoice()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_samples() {
        let samples = list_samples();
        assert!(samples.contains(&"demo"));
        assert!(samples.contains(&"literie"));
    }

    #[test]
    fn test_by_name() {
        assert!(by_name("demo").is_some());
        assert!(by_name("LITERIE").is_some());
        assert!(by_name("nonexistent").is_none());
    }

    #[test]
    fn test_demo_totals() {
        let inv = demo_invoice();
        assert_eq!(inv.total(), 899.0);
        assert_eq!(inv.balance_due(), 899.0);
    }

    #[test]
    fn test_literie_totals() {
        let inv = literie_invoice();
        // 1341 + 390 + 130 + 189 = 2050, minus 500 deposit
        assert_eq!(inv.total(), 2050.0);
        assert_eq!(inv.balance_due(), 1550.0);
    }
}
