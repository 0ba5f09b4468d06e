//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the reconciliation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Remote folder holding one subfolder per case.
    #[serde(default = "default_remote_root")]
    pub remote_root: String,

    /// Seconds between scheduled sync cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Concurrent downloads within one sync cycle.
    #[serde(default = "default_download_concurrency")]
    pub download_concurrency: usize,

    /// Window for treating same-name, same-size observations as one event.
    #[serde(default = "default_near_duplicate_window")]
    pub near_duplicate_window_secs: i64,

    /// Slot guesses below this confidence fall back to the misc slot.
    #[serde(default = "default_min_slot_confidence")]
    pub min_slot_confidence: f64,
}

fn default_remote_root() -> String {
    "/CASES".to_string()
}

fn default_poll_interval() -> u64 {
    600
}

fn default_download_concurrency() -> usize {
    4
}

fn default_near_duplicate_window() -> i64 {
    300
}

fn default_min_slot_confidence() -> f64 {
    dossier_match::DEFAULT_MIN_CONFIDENCE
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            remote_root: default_remote_root(),
            poll_interval_secs: default_poll_interval(),
            download_concurrency: default_download_concurrency(),
            near_duplicate_window_secs: default_near_duplicate_window(),
            min_slot_confidence: default_min_slot_confidence(),
        }
    }
}

impl EngineConfig {
    pub fn near_duplicate_window_ms(&self) -> i64 {
        self.near_duplicate_window_secs.saturating_mul(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.remote_root, "/CASES");
        assert_eq!(config.poll_interval_secs, 600);
        assert!(config.download_concurrency >= 1);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str("remote_root = \"/SCANS\"").unwrap();
        assert_eq!(config.remote_root, "/SCANS");
        assert_eq!(config.poll_interval_secs, 600);
    }
}
