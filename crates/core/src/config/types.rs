use serde::{Deserialize, Serialize};

use crate::coordinator::CoordinatorConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

/// Remote ticket/analysis service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service base URL (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Directory view configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectoryConfig {
    /// Page size for the ready-ticket view.
    #[serde(default = "default_page_size")]
    pub ticket_page_size: u32,
    /// Page size for the analyzed-ticket view.
    #[serde(default = "default_page_size")]
    pub analyzed_page_size: u32,
    /// Page size for the run-history view.
    #[serde(default = "default_page_size")]
    pub run_page_size: u32,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            ticket_page_size: default_page_size(),
            analyzed_page_size: default_page_size(),
            run_page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    10
}
