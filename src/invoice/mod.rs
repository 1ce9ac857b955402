//! # Invoice Model
//!
//! Structured invoice data: client, line items, payment terms, and the
//! arithmetic and formatting that goes with them.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Invoice, Client, LineItem and friends |
//! | [`totals`] | Line and invoice totals, deposit/balance |
//! | [`format`] | French locale money and date rendering |
//! | [`company`] | Seller identity block |
//! | [`samples`] | Built-in demo invoices |

pub mod company;
pub mod format;
pub mod samples;
pub mod totals;
pub mod types;

pub use company::CompanyInfo;
pub use types::{Client, Discount, Invoice, LineItem, PaymentMethod, PaymentTerms, ProductCategory};
