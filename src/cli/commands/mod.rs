use anyhow::Result;
use fulfillment_inspection::config::InspectionConfig;
use fulfillment_inspection::inspection::{InspectionWorkflow, ProductId, SessionMode, WorkflowRules};
use fulfillment_inspection::{HttpBackend, InspectionBackend};
use std::sync::Arc;

pub mod classify;
pub mod status;
pub mod store;
pub mod tracking;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Opens the product's session against the configured dashboard backend.
pub async fn open_session(config: &InspectionConfig, product_id: &str) -> Result<InspectionWorkflow> {
    let backend: Arc<dyn InspectionBackend> = Arc::new(HttpBackend::from_config(&config.backend)?);
    let workflow = InspectionWorkflow::open(
        backend,
        &ProductId::new(product_id),
        WorkflowRules::from(&config.workflow),
        SessionMode::Full,
    )
    .await?;
    Ok(workflow)
}
