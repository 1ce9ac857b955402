//! Invoice, client and line-item struct types.
//!
//! All types derive `Serialize + Deserialize` so the same types work for
//! both Rust API construction and JSON deserialization. Field defaults
//! follow the store's usual sale: one taxed product line, card payment,
//! 20% VAT.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Standard French VAT rate applied when an invoice does not override it.
pub const DEFAULT_TAX_RATE: f64 = 0.20;

fn default_tax_rate() -> f64 {
    DEFAULT_TAX_RATE
}

fn default_issue_date() -> NaiveDate {
    Utc::now().date_naive()
}

fn default_quantity() -> u32 {
    1
}

/// Custom deserializer for quantities: anything below 1 is clamped to 1.
pub(crate) fn deserialize_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let n = u32::deserialize(deserializer)?;
    Ok(n.max(1))
}

// ============================================================================
// PRODUCT CATALOG
// ============================================================================

/// Product categories sold by the store.
///
/// The category decides whether the quoted unit price carries VAT:
/// catalog goods are priced TTC on the floor, while `Divers` entries
/// (services, trade-ins) are recorded outside the VAT scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProductCategory {
    Matelas,
    SurMatelas,
    Couette,
    Oreiller,
    Plateau,
    #[default]
    Accessoires,
    Divers,
}

impl ProductCategory {
    /// Whether unit prices in this category include VAT.
    pub fn tax_included(&self) -> bool {
        !matches!(self, ProductCategory::Divers)
    }

    /// Display label as printed on the invoice.
    pub fn label(&self) -> &'static str {
        match self {
            ProductCategory::Matelas => "Matelas",
            ProductCategory::SurMatelas => "Sur-matelas",
            ProductCategory::Couette => "Couette",
            ProductCategory::Oreiller => "Oreiller",
            ProductCategory::Plateau => "Plateau",
            ProductCategory::Accessoires => "Accessoires",
            ProductCategory::Divers => "Divers",
        }
    }
}

// ============================================================================
// LINE ITEMS
// ============================================================================

/// Per-line discount: a fixed amount in euros or a percentage of the
/// gross unit price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Discount {
    #[default]
    None,
    Amount { value: f64 },
    Percent { value: f64 },
}

/// One product line on an invoice.
///
/// Both net (`unit_price_ht`) and gross (`unit_price_ttc`) unit prices are
/// stored; whichever one the caller omits is derived from the other using
/// the invoice tax rate and the category's tax-inclusion rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(default)]
    pub category: ProductCategory,
    #[serde(default = "default_quantity", deserialize_with = "deserialize_quantity")]
    pub quantity: u32,
    /// Unit price excluding tax (net).
    #[serde(default)]
    pub unit_price_ht: f64,
    /// Unit price including tax (gross).
    #[serde(default)]
    pub unit_price_ttc: f64,
    #[serde(default)]
    pub discount: Discount,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: ProductCategory::default(),
            quantity: 1,
            unit_price_ht: 0.0,
            unit_price_ttc: 0.0,
            discount: Discount::None,
        }
    }
}

impl LineItem {
    /// New line priced gross (TTC), the common case on the shop floor.
    pub fn new(name: impl Into<String>, quantity: u32, unit_price_ttc: f64) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.max(1),
            unit_price_ttc,
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: ProductCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = discount;
        self
    }
}

// ============================================================================
// CLIENT
// ============================================================================

/// A client record, owned independently of any one invoice.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Client {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    /// Company registration number, for business clients.
    #[serde(default)]
    pub siret: Option<String>,
}

impl Client {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// PAYMENT TERMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    Cheque,
    Transfer,
    Cash,
    /// Split payment through a financing partner.
    Installments,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "Carte bancaire",
            PaymentMethod::Cheque => "Chèque",
            PaymentMethod::Transfer => "Virement",
            PaymentMethod::Cash => "Espèces",
            PaymentMethod::Installments => "Paiement en plusieurs fois",
        }
    }
}

/// How the invoice is settled: method plus an up-front deposit (acompte).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaymentTerms {
    #[serde(default)]
    pub method: PaymentMethod,
    /// Deposit already collected, in euros gross.
    #[serde(default)]
    pub deposit: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

// ============================================================================
// INVOICE
// ============================================================================

/// A complete invoice as captured by the order form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique, caller-assigned (e.g. "2025-007").
    pub invoice_number: String,
    #[serde(default = "default_issue_date")]
    pub issue_date: NaiveDate,
    pub client: Client,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub payment: PaymentTerms,
    /// VAT rate as a fraction (0.20 = 20%).
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    /// Free-text notes, markdown accepted.
    #[serde(default)]
    pub notes: String,
    /// Opaque signature image: PNG data-URI or a fetchable URL.
    #[serde(default)]
    pub signature: Option<String>,
    /// Whether the client accepted the general sale terms.
    #[serde(default)]
    pub terms_accepted: bool,
    /// Name of the advisor who made the sale.
    #[serde(default)]
    pub advisor: Option<String>,
}

impl Invoice {
    pub fn new(invoice_number: impl Into<String>, client: Client) -> Self {
        Self {
            invoice_number: invoice_number.into(),
            issue_date: default_issue_date(),
            client,
            items: Vec::new(),
            payment: PaymentTerms::default(),
            tax_rate: DEFAULT_TAX_RATE,
            notes: String::new(),
            signature: None,
            terms_accepted: false,
            advisor: None,
        }
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    /// Suggested attachment filename for this invoice.
    pub fn filename(&self) -> String {
        format!("Facture_{}.pdf", self.invoice_number.replace([' ', '/'], "-"))
    }
}
