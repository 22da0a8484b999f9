use anyhow::{bail, Result};
use fulfillment_inspection::config::InspectionConfig;
use fulfillment_inspection::inspection::InspectionStep;

use super::{open_session, Command};

pub struct StoreCommand {
    pub config: InspectionConfig,
    pub product_id: String,
    pub location: String,
}

impl Command for StoreCommand {
    async fn execute(&self) -> Result<()> {
        let mut workflow = open_session(&self.config, &self.product_id).await?;
        if workflow.current_step() != InspectionStep::ShelfStorage {
            bail!(
                "{} is at step {}, finish packaging before storing",
                self.product_id,
                workflow.current_step()
            );
        }

        let code = workflow.set_location_code(&self.location)?.clone();
        println!("🔄 Confirming shelf {code}...");
        let outcome = workflow.complete().await?;

        println!("✅ {} stored", outcome.product_id);
        println!(
            "   Shelf: {} ({}/{})",
            outcome.location.code, outcome.location.current_count, outcome.location.capacity
        );
        println!(
            "   Verdict: {} → {}",
            outcome.classification.verdict, outcome.classification.status
        );
        if outcome.skipped_photography {
            println!("   📷 Photography skipped");
        }
        Ok(())
    }
}
