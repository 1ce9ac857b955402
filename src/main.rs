//! # Facture CLI
//!
//! Command-line interface for invoice rendering and delivery.
//!
//! ## Usage
//!
//! ```bash
//! # List sample invoices and delivery backends
//! facture list
//!
//! # Write a PNG preview of the demo invoice
//! facture preview --out preview.png
//!
//! # Render an invoice JSON file to a print-quality PDF
//! facture render --invoice facture.json
//!
//! # Deliver through every configured channel
//! facture send --invoice facture.json
//!
//! # Deliver through one channel only
//! facture send --invoice facture.json --channel endpoint
//!
//! # Probe the custom endpoint
//! facture probe https://script.example.com/exec
//!
//! # Run the HTTP service
//! facture serve --listen 0.0.0.0:3000
//! ```
//!
//! Delivery credentials come from the environment: `FACTURE_MAIL_SERVICE_ID`,
//! `FACTURE_MAIL_TEMPLATE_ID` and `FACTURE_MAIL_PUBLIC_KEY` for the mail
//! relay; `FACTURE_CLOUD_CLIENT_ID`, `FACTURE_CLOUD_CLIENT_SECRET`,
//! `FACTURE_CLOUD_REFRESH_TOKEN` and `FACTURE_CLOUD_FOLDER_ID` for cloud
//! storage; `FACTURE_ENDPOINT_URL` for the custom endpoint.

use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use facture::{
    delivery::{
        self, BackendKind, CloudBackend, CloudConfig, DeliveryBackend, EndpointBackend,
        EndpointConfig, MailRelayBackend, MailRelayConfig, Orchestrator,
    },
    invoice::{samples, Invoice},
    pdf::{assemble, PdfOptions},
    server::{self, BackendDefaults, ServerConfig},
    sheet::compose,
    snapshot::{capture, AssetResolver, SnapshotOptions},
    FactureError,
};

/// Facture - MYCONFORT invoice rendering and delivery utility
#[derive(Parser, Debug)]
#[command(name = "facture")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one invoice page as a PNG preview
    Preview {
        /// Invoice JSON file (omit to use a sample)
        #[arg(long, value_name = "FILE")]
        invoice: Option<PathBuf>,

        /// Sample invoice name (see `facture list`)
        #[arg(long, default_value = "demo")]
        sample: String,

        /// Zero-based page index
        #[arg(long, default_value = "0")]
        page: usize,

        /// Output file
        #[arg(long, value_name = "FILE", default_value = "preview.png")]
        out: PathBuf,
    },

    /// Render an invoice as a print-quality PDF
    Render {
        /// Invoice JSON file (omit to use a sample)
        #[arg(long, value_name = "FILE")]
        invoice: Option<PathBuf>,

        /// Sample invoice name (see `facture list`)
        #[arg(long, default_value = "demo")]
        sample: String,

        /// Output file (defaults to the invoice's own filename)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Render and deliver an invoice through the configured channels
    Send {
        /// Invoice JSON file (omit to use a sample)
        #[arg(long, value_name = "FILE")]
        invoice: Option<PathBuf>,

        /// Sample invoice name (see `facture list`)
        #[arg(long, default_value = "demo")]
        sample: String,

        /// Channel to dispatch to (repeatable); defaults to every
        /// configured channel
        #[arg(long = "channel")]
        channels: Vec<String>,
    },

    /// Probe a custom endpoint for connectivity
    Probe {
        /// Endpoint URL (defaults to FACTURE_ENDPOINT_URL)
        url: Option<String>,
    },

    /// Run the HTTP service
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:3000")]
        listen: String,
    },

    /// List sample invoices and delivery backends
    List,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<(), FactureError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Preview {
            invoice,
            sample,
            page,
            out,
        } => {
            let invoice = load_invoice(invoice.as_ref(), &sample)?;
            let sheets = compose(&invoice);
            let sheet = sheets.get(page).ok_or_else(|| {
                FactureError::TargetNotFound(format!(
                    "page {} out of range (document has {})",
                    page,
                    sheets.len()
                ))
            })?;

            println!(
                "Rendering page {} of {} ({}x{})...",
                page + 1,
                invoice.invoice_number,
                sheet.width,
                sheet.height
            );

            let resolver = AssetResolver::new();
            let bitmap = capture(sheet, SnapshotOptions::preview(), &resolver).await?;
            bitmap
                .save(&out)
                .map_err(|e| FactureError::Image(format!("Failed to save PNG: {}", e)))?;
            println!("Saved to {}", out.display());
        }

        Commands::Render {
            invoice,
            sample,
            out,
        } => {
            let invoice = load_invoice(invoice.as_ref(), &sample)?;
            let out = out.unwrap_or_else(|| PathBuf::from(invoice.filename()));

            println!("Rendering {}...", invoice.invoice_number);

            let resolver = AssetResolver::new();
            let sheets = compose(&invoice);
            let mut pages = Vec::with_capacity(sheets.len());
            for sheet in &sheets {
                pages.push(capture(sheet, SnapshotOptions::print(), &resolver).await?);
            }

            let options =
                PdfOptions::print().with_title(format!("Facture {}", invoice.invoice_number));
            let document = assemble(&pages, &options)?;

            std::fs::write(&out, &document.bytes)?;
            println!(
                "Saved {} page(s), {} bytes to {}",
                pages.len(),
                document.len(),
                out.display()
            );
        }

        Commands::Send {
            invoice,
            sample,
            channels,
        } => {
            let invoice = load_invoice(invoice.as_ref(), &sample)?;
            let backends = build_backends(&backend_defaults_from_env(), &channels)?;

            println!(
                "Sending {} via {} channel(s)...",
                invoice.invoice_number,
                backends.len()
            );

            let mut orchestrator = Orchestrator::new(Arc::new(AssetResolver::new()));
            let summary = orchestrator.run(&invoice, &backends).await?;

            for outcome in &summary.outcomes {
                let marker = if outcome.success { "ok" } else { "failed" };
                println!(
                    "  [{}] {} ({}ms): {}",
                    marker, outcome.backend, outcome.elapsed_ms, outcome.message
                );
                if let Some(hint) = &outcome.hint {
                    println!("       {}", hint);
                }
            }

            if !summary.success {
                return Err(FactureError::Unknown(
                    "No delivery channel accepted the document".to_string(),
                ));
            }
            println!("Delivered successfully!");
        }

        Commands::Probe { url } => {
            let url = url
                .or_else(|| env::var("FACTURE_ENDPOINT_URL").ok())
                .ok_or_else(|| {
                    FactureError::NotConfigured(
                        "no endpoint URL given and FACTURE_ENDPOINT_URL is unset".to_string(),
                    )
                })?;

            println!("Probing {}...", url);
            let backend = EndpointBackend::new(EndpointConfig::new(&url));
            let reply = backend.probe().await?;
            println!("Verdict: {}", reply.verdict);
            if !reply.raw_body.is_empty() {
                println!("Response: {}", reply.raw_body);
            }
        }

        Commands::Serve { listen } => {
            let config = ServerConfig {
                listen_addr: listen,
                defaults: backend_defaults_from_env(),
            };
            server::serve(config).await?;
        }

        Commands::List => {
            println!("Available sample invoices:");
            for name in samples::list_samples() {
                println!("  {}", name);
            }
            println!("\nDelivery backends:");
            for name in delivery::BACKENDS {
                println!("  {}", name);
            }
        }
    }

    Ok(())
}

/// Load an invoice from a JSON file, or fall back to a named sample.
fn load_invoice(path: Option<&PathBuf>, sample: &str) -> Result<Invoice, FactureError> {
    match path {
        Some(path) => {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str(&data).map_err(|e| {
                FactureError::Unknown(format!(
                    "Failed to parse invoice {}: {}",
                    path.display(),
                    e
                ))
            })
        }
        None => samples::by_name(sample).ok_or_else(|| {
            FactureError::TargetNotFound(format!(
                "Unknown sample invoice '{}'. Run `facture list` to see available samples.",
                sample
            ))
        }),
    }
}

/// Read delivery credentials from the environment.
fn backend_defaults_from_env() -> BackendDefaults {
    let mail_relay = match (
        env::var("FACTURE_MAIL_SERVICE_ID"),
        env::var("FACTURE_MAIL_TEMPLATE_ID"),
        env::var("FACTURE_MAIL_PUBLIC_KEY"),
    ) {
        (Ok(service), Ok(template), Ok(key)) => Some(MailRelayConfig::new(service, template, key)),
        _ => None,
    };

    let cloud = match (
        env::var("FACTURE_CLOUD_CLIENT_ID"),
        env::var("FACTURE_CLOUD_CLIENT_SECRET"),
        env::var("FACTURE_CLOUD_REFRESH_TOKEN"),
        env::var("FACTURE_CLOUD_FOLDER_ID"),
    ) {
        (Ok(id), Ok(secret), Ok(token), Ok(folder)) => {
            Some(CloudConfig::new(id, secret, token, folder))
        }
        _ => None,
    };

    let endpoint = env::var("FACTURE_ENDPOINT_URL")
        .ok()
        .map(EndpointConfig::new);

    BackendDefaults {
        mail_relay,
        cloud,
        endpoint,
    }
}

/// Turn channel names (or, when empty, every configured channel) into
/// backend instances.
fn build_backends(
    defaults: &BackendDefaults,
    channels: &[String],
) -> Result<Vec<Arc<dyn DeliveryBackend>>, FactureError> {
    let mut kinds: Vec<BackendKind> = Vec::new();
    if channels.is_empty() {
        if defaults.mail_relay.is_some() {
            kinds.push(BackendKind::MailRelay);
        }
        if defaults.cloud.is_some() {
            kinds.push(BackendKind::CloudStorage);
        }
        if defaults.endpoint.is_some() {
            kinds.push(BackendKind::Endpoint);
        }
        if kinds.is_empty() {
            return Err(FactureError::NotConfigured(
                "No delivery channel configured. Set FACTURE_MAIL_*, FACTURE_CLOUD_* or \
                 FACTURE_ENDPOINT_URL, or pass --channel."
                    .to_string(),
            ));
        }
    } else {
        for name in channels {
            let kind = BackendKind::by_name(name).ok_or_else(|| {
                FactureError::TargetNotFound(format!(
                    "Unknown delivery channel '{}'. Run `facture list` to see available backends.",
                    name
                ))
            })?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }

    Ok(kinds
        .into_iter()
        .map(|kind| -> Arc<dyn DeliveryBackend> {
            match kind {
                BackendKind::MailRelay => Arc::new(MailRelayBackend::new(
                    defaults
                        .mail_relay
                        .clone()
                        .unwrap_or_else(|| MailRelayConfig::new("", "", "")),
                )),
                BackendKind::CloudStorage => Arc::new(CloudBackend::new(
                    defaults
                        .cloud
                        .clone()
                        .unwrap_or_else(|| CloudConfig::new("", "", "", "")),
                )),
                BackendKind::Endpoint => Arc::new(EndpointBackend::new(
                    defaults
                        .endpoint
                        .clone()
                        .unwrap_or_else(|| EndpointConfig::new("")),
                )),
            }
        })
        .collect())
}
