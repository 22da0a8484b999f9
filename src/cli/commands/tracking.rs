use anyhow::Result;
use fulfillment_inspection::inspection::{derive_tracking_number, TRACKING_SENTINEL};

use super::Command;

pub struct TrackingCommand {
    pub sku: String,
}

impl Command for TrackingCommand {
    async fn execute(&self) -> Result<()> {
        let code = derive_tracking_number(&self.sku);
        if code == TRACKING_SENTINEL {
            eprintln!("⚠️  '{}' is not a delivery-plan SKU", self.sku);
        }
        println!("{code}");
        Ok(())
    }
}
