use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::inspection::photo_slots::DEFAULT_MAX_PHOTOS;

/// Main configuration structure for the inspection station
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InspectionConfig {
    /// Dashboard backend connection
    pub backend: BackendConfig,
    /// Inspection workflow rules
    pub workflow: WorkflowConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the dashboard API
    pub base_url: String,
    /// Bearer token (can be set via env var)
    pub api_token: Option<String>,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            api_token: None,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Photo pool cap per session
    pub max_photos: usize,
    /// Photos needed to leave the photography step when photos are required
    pub min_photos: usize,
    /// Also demand every required slot be filled before packaging
    pub require_slot_coverage: bool,
    /// Categories that open with photography not required
    pub photography_exempt_categories: Vec<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_photos: DEFAULT_MAX_PHOTOS,
            min_photos: 1,
            require_slot_coverage: false,
            photography_exempt_categories: vec!["accessory".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or EnvFilter directive
    pub log_level: String,
    /// Emit JSON log lines
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl InspectionConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (inspection.toml, .inspection-rc)
    /// 3. Environment variables (prefixed with INSPECTION_, sections split by `__`)
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Like [`load`](Self::load), with an explicit file taking the place of the
    /// default file names.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path));
            }
            None => {
                if Path::new("inspection.toml").exists() {
                    builder = builder.add_source(File::with_name("inspection"));
                }
                if Path::new(".inspection-rc").exists() {
                    builder = builder.add_source(
                        File::with_name(".inspection-rc").format(config::FileFormat::Toml),
                    );
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("INSPECTION")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut inspection_config: InspectionConfig = builder.build()?.try_deserialize()?;

        if inspection_config.backend.api_token.is_none() {
            if let Ok(token) = std::env::var("INSPECTION_API_TOKEN") {
                inspection_config.backend.api_token = Some(token);
            }
        }

        Ok(inspection_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = InspectionConfig::default();
        assert_eq!(config.workflow.max_photos, 20);
        assert_eq!(config.workflow.min_photos, 1);
        assert!(!config.workflow.require_slot_coverage);
        assert_eq!(config.workflow.photography_exempt_categories, vec!["accessory"]);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_save_then_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("station.toml");

        let mut config = InspectionConfig::default();
        config.backend.base_url = "http://warehouse.local:8080".to_string();
        config.workflow.min_photos = 3;
        config.workflow.require_slot_coverage = true;
        config.save_to_file(&path).unwrap();

        let loaded = InspectionConfig::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.backend.base_url, "http://warehouse.local:8080");
        assert_eq!(loaded.workflow.min_photos, 3);
        assert!(loaded.workflow.require_slot_coverage);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[workflow]\nmax_photos = 8\n").unwrap();

        let loaded = InspectionConfig::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.workflow.max_photos, 8);
        assert_eq!(loaded.workflow.min_photos, 1);
        assert_eq!(loaded.backend, BackendConfig::default());
    }
}
