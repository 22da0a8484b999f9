use anyhow::Result;
use clap::Parser;

mod cli;

use cli::commands::classify::ClassifyCommand;
use cli::commands::status::StatusCommand;
use cli::commands::store::StoreCommand;
use cli::commands::tracking::TrackingCommand;
use cli::commands::Command;
use cli::{Cli, Commands};
use fulfillment_inspection::config::InspectionConfig;
use fulfillment_inspection::{backend_metrics, init_telemetry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _ = InspectionConfig::load_env_file();
    let mut config = InspectionConfig::load_from(cli.config.as_deref())?;
    if cli.json_logs {
        config.observability.json_logs = true;
    }
    init_telemetry(&config.observability)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let result = match cli.command {
        Commands::Tracking { sku } => runtime.block_on(async {
            TrackingCommand { sku }.execute().await
        }),
        Commands::Status { product_id } => runtime.block_on(async {
            StatusCommand { config, product_id }.execute().await
        }),
        Commands::Classify { product_id } => runtime.block_on(async {
            ClassifyCommand { config, product_id }.execute().await
        }),
        Commands::Store {
            product_id,
            location,
        } => runtime.block_on(async {
            StoreCommand {
                config,
                product_id,
                location,
            }
            .execute()
            .await
        }),
    };

    backend_metrics().log_stats();
    result
}
