use anyhow::Result;
use fulfillment_inspection::config::InspectionConfig;
use fulfillment_inspection::inspection::classifier::ChecklistTally;
use fulfillment_inspection::inspection::resulting_status;

use super::{open_session, Command};

pub struct ClassifyCommand {
    pub config: InspectionConfig,
    pub product_id: String,
}

impl Command for ClassifyCommand {
    async fn execute(&self) -> Result<()> {
        let workflow = open_session(&self.config, &self.product_id).await?;
        let session = workflow.session();

        let tally = ChecklistTally::from_flags(session.checklist().flags());
        let verdict = tally.verdict();
        let status = resulting_status(verdict, session.photography_done());

        println!("🔍 {} checklist: {}/{} checks passed", session.product_id(), tally.passed, tally.total);
        println!("   Verdict: {verdict}");
        println!("   Status after storage: {status}");

        let unvisited = session.checklist().unvisited();
        if !unvisited.is_empty() {
            println!(
                "   ⚠️  Preview only: categories not yet visited ({})",
                unvisited.join(", ")
            );
        }
        Ok(())
    }
}
