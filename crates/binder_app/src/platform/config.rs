//! Optional RON configuration file.
//!
//! ```ron
//! (
//!     site: (language: "hi", page_size: 20),
//!     request_timeout_secs: Some(60),
//! )
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use binder_engine::{EngineConfig, SiteConfig};
use binder_logging::binder_info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub output_dir: Option<PathBuf>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_bytes: Option<u64>,
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig =
            ron::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        binder_info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Build the engine configuration. `output_override` (the command line)
    /// wins over the file, which wins over the working directory.
    pub fn into_engine_config(self, output_override: Option<PathBuf>) -> EngineConfig {
        let output_dir = output_override
            .or(self.output_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = EngineConfig::default_with_output(output_dir);
        config.site = self.site;
        if let Some(secs) = self.connect_timeout_secs {
            config.fetch.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.request_timeout_secs {
            config.fetch.request_timeout = Duration::from_secs(secs);
        }
        if let Some(max_bytes) = self.max_bytes {
            config.fetch.max_bytes = max_bytes;
        }
        config.today = Arc::new(|| chrono::Local::now().date_naive());
        config
    }
}
