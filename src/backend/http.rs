//! [`InspectionBackend`] over the dashboard's JSON API.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use super::{BackendError, InspectionBackend};
use crate::config::BackendConfig;
use crate::inspection::types::{
    FinalizeRequest, LabelArtifact, PhotographyCommit, ProductId, ProductSummary,
    ProgressRecord, StorageLocation,
};

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("inspection-station/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::new(
            config.base_url.clone(),
            config.api_token.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "Backend request");
        let builder = self.client.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Maps 404 to `NotFound` and any other non-2xx status to `Http`.
    async fn check(response: Response, resource: &str) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::not_found(resource));
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), resource = %resource, "Backend request rejected");
        Err(BackendError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn read_json<T: DeserializeOwned>(
        builder: RequestBuilder,
        resource: &str,
    ) -> Result<T, BackendError> {
        let response = Self::check(builder.send().await?, resource).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn expect_ok(builder: RequestBuilder, resource: &str) -> Result<(), BackendError> {
        Self::check(builder.send().await?, resource).await?;
        Ok(())
    }
}

#[async_trait]
impl InspectionBackend for HttpBackend {
    async fn fetch_product(&self, product_id: &ProductId) -> Result<ProductSummary, BackendError> {
        let builder = self.request(Method::GET, &format!("/api/products/{product_id}"));
        Self::read_json(builder, &format!("product {product_id}")).await
    }

    async fn load_progress(&self, product_id: &ProductId) -> Result<ProgressRecord, BackendError> {
        let builder = self.request(
            Method::GET,
            &format!("/api/products/inspection/progress/{product_id}"),
        );
        Self::read_json(builder, &format!("progress for {product_id}")).await
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), BackendError> {
        let builder = self
            .request(Method::POST, "/api/products/inspection/progress")
            .json(record);
        Self::expect_ok(builder, &format!("progress for {}", record.product_id)).await
    }

    async fn commit_photography(&self, commit: &PhotographyCommit) -> Result<(), BackendError> {
        let builder = self
            .request(
                Method::POST,
                &format!("/api/products/{}/photography", commit.product_id),
            )
            .json(commit);
        Self::expect_ok(builder, &format!("product {}", commit.product_id)).await
    }

    async fn generate_label(
        &self,
        product_id: &ProductId,
        tracking_code: &str,
        notes: &str,
    ) -> Result<LabelArtifact, BackendError> {
        let builder = self
            .request(Method::POST, &format!("/api/products/{product_id}/label"))
            .json(&json!({
                "productId": product_id,
                "trackingCode": tracking_code,
                "notes": notes,
            }));
        Self::read_json(builder, &format!("product {product_id}")).await
    }

    async fn validate_location(&self, code: &str) -> Result<StorageLocation, BackendError> {
        let builder = self
            .request(Method::POST, "/api/locations/validate")
            .json(&json!({ "locationCode": code }));
        match Self::read_json(builder, &format!("location {code}")).await {
            Err(BackendError::Http { status: 400, .. }) => {
                Err(BackendError::not_found(format!("location {code}")))
            }
            other => other,
        }
    }

    async fn finalize_inspection(&self, request: &FinalizeRequest) -> Result<(), BackendError> {
        let builder = self
            .request(Method::POST, "/api/products/inspection")
            .json(request);
        match Self::expect_ok(builder, &format!("product {}", request.product_id)).await {
            Err(BackendError::Http { status: 409, .. }) => Err(BackendError::CapacityExceeded {
                location_id: request.location_id.clone(),
            }),
            other => other,
        }
    }
}
