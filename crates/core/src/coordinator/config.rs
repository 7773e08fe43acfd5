//! Coordinator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the analysis run coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Interval between run status checks (milliseconds).
    /// The first check fires immediately when a poller starts.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Maximum status checks before a poller gives up on a run
    /// (0 = poll until the server reports a terminal status).
    /// Giving up is handled like a run failure: claims are released
    /// and a failure event is published.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Page size used when fetching processing tickets during recovery.
    /// Large enough to approximate "all".
    #[serde(default = "default_recovery_page_size")]
    pub recovery_page_size: u32,

    /// Capacity of the run event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_poll_interval() -> u64 {
    4000 // 4 seconds
}

fn default_max_poll_attempts() -> u32 {
    900 // one hour at the default cadence
}

fn default_recovery_page_size() -> u32 {
    500
}

fn default_event_capacity() -> usize {
    64
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
            recovery_page_size: default_recovery_page_size(),
            event_capacity: default_event_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.poll_interval_ms, 4000);
        assert_eq!(config.max_poll_attempts, 900);
        assert_eq!(config.recovery_page_size, 500);
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            poll_interval_ms = 1000
        "#;
        let config: CoordinatorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.max_poll_attempts, 900);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            poll_interval_ms = 2000
            max_poll_attempts = 0
            recovery_page_size = 1000
            event_capacity = 16
        "#;
        let config: CoordinatorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.max_poll_attempts, 0);
        assert_eq!(config.recovery_page_size, 1000);
        assert_eq!(config.event_capacity, 16);
    }
}
