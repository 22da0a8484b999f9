use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "inspection-station")]
#[command(about = "Warehouse inspection station for consigned goods")]
#[command(long_about = "Drives product inspections against the fulfillment dashboard: checks a \
                       session's progress, derives label tracking codes, previews the inspection \
                       verdict and confirms shelf storage.")]
pub struct Cli {
    /// Configuration file replacing inspection.toml / .inspection-rc
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show where a product's inspection stands
    Status {
        /// Product identifier
        product_id: String,
    },
    /// Derive the label tracking code for a delivery-plan SKU
    Tracking {
        /// SKU in PREFIX-TIMESTAMP-SERIAL1-SERIAL2 form
        sku: String,
    },
    /// Preview the verdict and resulting status from the saved checklist
    Classify {
        /// Product identifier
        product_id: String,
    },
    /// Confirm the shelf location and complete the inspection
    Store {
        /// Product identifier
        product_id: String,
        /// Shelf location code, e.g. STD-A-01
        #[arg(long, help = "Shelf location code (A-01, STD-A-01, HUM-01, TEMP-01, VAULT-01, ...)")]
        location: String,
    },
}
