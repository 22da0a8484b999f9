use anyhow::Result;
use fulfillment_inspection::config::InspectionConfig;

use super::{open_session, Command};

pub struct StatusCommand {
    pub config: InspectionConfig,
    pub product_id: String,
}

impl Command for StatusCommand {
    async fn execute(&self) -> Result<()> {
        let workflow = open_session(&self.config, &self.product_id).await?;
        let session = workflow.session();
        let product = session.product();
        let photos = session.photos();

        println!("📦 {} ({})", product.name, product.id);
        println!("   SKU: {}  Category: {}  Status: {}", product.sku, product.category, product.status);
        println!("🧭 Step {}", session.current_step());
        println!("   Photography: {:?}", session.policy());
        println!(
            "📷 Photos: {}/{} uploaded, {} unassigned",
            photos.photo_count(),
            photos.max_photos(),
            session.unassigned_photos().len()
        );
        for slot in photos.slots() {
            let marker = match (slot.required, slot.is_filled()) {
                (_, true) => "✅",
                (true, false) => "❌",
                (false, false) => "▫️",
            };
            println!("   {marker} {} ({}): {} photo(s)", slot.label, slot.id, slot.photos.len());
        }

        let unvisited = session.checklist().unvisited();
        if !unvisited.is_empty() {
            println!("📝 Checklist not yet visited: {}", unvisited.join(", "));
        }
        if let Some(weight) = session.weight() {
            println!("⚖️  Weight: {weight}");
        }
        if !session.notes().is_empty() {
            println!("🗒️  Notes: {}", session.notes());
        }
        if let Some(saved) = session.last_updated() {
            println!("💾 Last saved: {}", saved.to_rfc3339());
        }
        Ok(())
    }
}
