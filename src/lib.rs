//! # Facture - MYCONFORT Invoice Rendering and Delivery
//!
//! Facture renders MYCONFORT invoices to print-quality PDFs and hands
//! them to external delivery channels. It provides:
//!
//! - **Invoice model**: line items, tax math, French formatting
//! - **Sheet composition**: A4 page layout including markdown notes
//! - **Snapshots**: bitmap capture of composed sheets
//! - **PDF assembly**: JPEG-compressed pages bound into an A4 document
//! - **Delivery**: mail relay, cloud storage and custom endpoint
//!   backends behind one orchestrator with retries and diagnostics
//!
//! ## Quick Start
//!
//! ```no_run
//! use facture::{
//!     invoice::samples,
//!     pdf::{assemble, PdfOptions},
//!     sheet::compose,
//!     snapshot::{capture, AssetResolver, SnapshotOptions},
//! };
//!
//! # async fn example() -> Result<(), facture::FactureError> {
//! let invoice = samples::demo_invoice();
//!
//! // Lay out the pages
//! let sheets = compose(&invoice);
//!
//! // Capture each sheet as a bitmap
//! let resolver = AssetResolver::new();
//! let mut pages = Vec::new();
//! for sheet in &sheets {
//!     pages.push(capture(sheet, SnapshotOptions::print(), &resolver).await?);
//! }
//!
//! // Bind the pages into a PDF
//! let options = PdfOptions::print().with_title(format!("Facture {}", invoice.invoice_number));
//! let document = assemble(&pages, &options)?;
//! std::fs::write(invoice.filename(), &document.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`invoice`] | Invoice data model, totals, French formatting |
//! | [`sheet`] | A4 page composition |
//! | [`snapshot`] | Sheet rasterization |
//! | [`pdf`] | PDF assembly |
//! | [`delivery`] | Delivery backends and orchestration |
//! | [`encode`] | Base64 and data-URI helpers |
//! | [`server`] | HTTP service |
//! | [`error`] | Error types |

pub mod delivery;
pub mod encode;
pub mod error;
pub mod invoice;
pub mod pdf;
pub mod server;
pub mod sheet;
pub mod snapshot;

// Re-exports for convenience
pub use error::FactureError;
pub use invoice::Invoice;
pub use pdf::RenderedDocument;
