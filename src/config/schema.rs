//! Configuration schema for shipgen
//!
//! Configuration is stored at `~/.config/shipgen/config.toml`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Environment variable consulted when `api.key_env` is unset
pub const LEGACY_KEY_ENV: &str = "API_KEY";

/// Longest TTL, cooldown or interval honoured, in seconds (100 years).
/// Larger values are clamped.
pub const MAX_DURATION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

fn bounded_secs(secs: u64) -> u64 {
    secs.min(MAX_DURATION_SECS)
}

fn time_delta(secs: u64) -> chrono::Duration {
    // bounded_secs keeps this well inside TimeDelta's range
    chrono::Duration::try_seconds(bounded_secs(secs) as i64).unwrap_or(chrono::Duration::MAX)
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Image API settings
    pub api: ApiConfig,

    /// Request pacing
    pub queue: QueueConfig,

    /// Response cache
    pub cache: CacheConfig,

    /// Quota suspension
    pub quota: QuotaConfig,

    /// Placeholder images
    pub fallback: FallbackConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Image generation API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Model identifier sent with every request
    pub model: String,

    /// API root, without trailing slash
    pub base_url: String,

    /// Environment variable holding the API key
    pub key_env: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Aspect ratio hint for generated images
    pub aspect_ratio: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash-image".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 120,
            aspect_ratio: "16:9".to_string(),
        }
    }
}

impl ApiConfig {
    /// Look up the API key, trying `key_env` first and then `API_KEY`
    pub fn resolve_key(&self) -> Option<String> {
        [self.key_env.as_str(), LEGACY_KEY_ENV]
            .into_iter()
            .filter(|name| !name.is_empty())
            .find_map(|name| {
                std::env::var(name)
                    .ok()
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Request pacing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Minimum gap between the start of two outbound requests.
    /// 4100 ms keeps us under a 15 requests/minute limit.
    pub min_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 4100,
        }
    }
}

impl QueueConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms.min(MAX_DURATION_SECS * 1000))
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in seconds
    pub ttl_secs: u64,

    /// Period of the background sweep in seconds (0 = disabled)
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            sweep_interval_secs: 30 * 60,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        time_delta(self.ttl_secs)
    }

    /// `None` when sweeping is disabled
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0)
            .then(|| Duration::from_secs(bounded_secs(self.sweep_interval_secs)))
    }
}

/// Quota suspension configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// How long the API stays suspended after a quota error, in seconds
    pub cooldown_secs: u64,

    /// Persist the suspension flag to the state directory
    pub persist: bool,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 24 * 60 * 60,
            persist: true,
        }
    }
}

impl QuotaConfig {
    pub fn cooldown(&self) -> chrono::Duration {
        time_delta(self.cooldown_secs)
    }
}

/// Placeholder image pools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Pool used for factions without their own entry
    pub default_pool: Vec<String>,

    /// Per-faction pools, keyed by faction id
    pub factions: BTreeMap<String, Vec<String>>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        let placeholder = |bg: &str, fg: &str, text: &str| {
            format!("https://placehold.co/1600x900/{bg}/{fg}/png?text={text}")
        };

        let mut factions = BTreeMap::new();
        factions.insert(
            "horde".to_string(),
            vec![
                placeholder("1a0505", "ef4444", "HORDE+CONTACT"),
                placeholder("0a0a0a", "b91c1c", "BIO-SIGNATURE"),
            ],
        );
        factions.insert(
            "caverna".to_string(),
            vec![placeholder("f8fafc", "0ea5e9", "CAVERNA+SHIPYARD")],
        );
        factions.insert(
            "pjsc-empire".to_string(),
            vec![placeholder("0b1d3a", "facc15", "ORBITAL+MODULE")],
        );

        Self {
            default_pool: vec![
                placeholder("0a0a0a", "22d3ee", "SHIPYARD+OFFLINE"),
                placeholder("020617", "67e8f9", "SIGNAL+LOST"),
                placeholder("111827", "a5f3fc", "ARCHIVE+IMAGE"),
                placeholder("0f172a", "38bdf8", "NO+TELEMETRY"),
            ],
            factions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[queue]"));
        assert!(toml.contains("[fallback.factions]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api.model, "gemini-2.5-flash-image");
        assert_eq!(config.queue.min_interval_ms, 4100);
        assert_eq!(config.cache.ttl_secs, 86_400);
        assert_eq!(config.quota.cooldown_secs, 86_400);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [queue]
            min_interval_ms = 250
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.queue.min_interval(), Duration::from_millis(250));
        assert_eq!(config.cache.sweep_interval_secs, 1800); // default preserved
    }

    #[test]
    fn default_pools_are_not_empty() {
        let fallback = FallbackConfig::default();
        assert!(!fallback.default_pool.is_empty());
        assert!(fallback.factions.values().all(|pool| !pool.is_empty()));
    }

    #[test]
    fn sweep_interval_zero_disables_sweeping() {
        let cache = CacheConfig {
            sweep_interval_secs: 0,
            ..CacheConfig::default()
        };
        assert!(cache.sweep_interval().is_none());
        assert_eq!(
            CacheConfig::default().sweep_interval(),
            Some(Duration::from_secs(1800))
        );
        assert_eq!(CacheConfig::default().ttl(), chrono::Duration::hours(24));
    }

    #[test]
    fn huge_durations_are_clamped() {
        let cache = CacheConfig {
            ttl_secs: 100_000_000_000_000_000,
            sweep_interval_secs: u64::MAX,
        };
        let cap = chrono::Duration::seconds(MAX_DURATION_SECS as i64);
        assert_eq!(cache.ttl(), cap);
        assert_eq!(
            cache.sweep_interval(),
            Some(Duration::from_secs(MAX_DURATION_SECS))
        );

        let quota = QuotaConfig {
            cooldown_secs: u64::MAX,
            persist: false,
        };
        assert_eq!(quota.cooldown(), cap);

        let queue = QueueConfig {
            min_interval_ms: u64::MAX,
        };
        assert_eq!(queue.min_interval(), Duration::from_secs(MAX_DURATION_SECS));
    }

    #[test]
    #[serial_test::serial]
    fn resolve_key_prefers_configured_variable() {
        let api = ApiConfig {
            key_env: "SHIPGEN_TEST_KEY".to_string(),
            ..ApiConfig::default()
        };
        std::env::set_var("SHIPGEN_TEST_KEY", " primary ");
        std::env::set_var(LEGACY_KEY_ENV, "legacy");
        assert_eq!(api.resolve_key().as_deref(), Some("primary"));

        std::env::set_var("SHIPGEN_TEST_KEY", "");
        assert_eq!(api.resolve_key().as_deref(), Some("legacy"));

        std::env::remove_var("SHIPGEN_TEST_KEY");
        std::env::remove_var(LEGACY_KEY_ENV);
        assert!(api.resolve_key().is_none());
    }
}
