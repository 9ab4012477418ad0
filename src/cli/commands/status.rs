//! Status command - API key, configuration and quota at a glance

use crate::clock::SystemClock;
use crate::config::{Config, ConfigManager};
use crate::error::ShipgenResult;
use crate::quota::{FileFlagStore, QuotaGovernor, QuotaState};
use console::{style, Emoji};
use std::path::Path;
use std::sync::Arc;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(config: &Config, config_path: &Path) -> ShipgenResult<()> {
    println!("{}", style("Shipgen Status").bold().cyan());

    let key_ok = check_api_key(config);
    check_config(config_path);
    let quota_ok = check_quota(config).await;

    println!();
    println!("{}", style("Pacing:").bold());
    println!(
        "  {} {} ms between API calls, cache entries kept {}h",
        CHECK,
        config.queue.min_interval_ms,
        config.cache.ttl_secs / 3600
    );

    println!();
    if key_ok && quota_ok {
        println!("{}", style("Ready to generate images").green().bold());
    } else {
        println!(
            "{}",
            style("Ships will get placeholder images - see above").yellow().bold()
        );
    }

    Ok(())
}

fn check_api_key(config: &Config) -> bool {
    println!();
    println!("{}", style("Image API:").bold());
    println!("  {} Model: {}", CHECK, config.api.model);

    match config.api.resolve_key() {
        Some(key) => {
            println!("  {} API key: {}", CHECK, mask(&key));
            true
        }
        None => {
            println!(
                "  {} {} - export {}",
                CROSS,
                style("No API key").red(),
                config.api.key_env
            );
            false
        }
    }
}

fn check_config(config_path: &Path) {
    println!();
    println!("{}", style("Configuration:").bold());
    if config_path.exists() {
        println!("  {} {}", CHECK, config_path.display());
    } else {
        println!(
            "  {} {} - defaults in use (shipgen config init)",
            WARN,
            config_path.display()
        );
    }
    println!("  {} State: {}", CHECK, ConfigManager::state_dir().display());
}

async fn check_quota(config: &Config) -> bool {
    println!();
    println!("{}", style("Quota:").bold());

    let governor = QuotaGovernor::restore(
        config.quota.cooldown(),
        Arc::new(SystemClock),
        Arc::new(FileFlagStore::new(ConfigManager::quota_flag_path())),
    )
    .await;

    match governor.state() {
        QuotaState::Available => {
            println!("  {} {}", CHECK, style("Available").green());
            true
        }
        QuotaState::Suspended { until } => {
            println!(
                "  {} {} until {} - shipgen quota clear",
                WARN,
                style("Suspended").yellow(),
                until.format("%Y-%m-%d %H:%M UTC")
            );
            false
        }
    }
}

/// First and last four characters only
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_hides_middle() {
        assert_eq!(mask("AIzaSyD-0123456789abcd"), "AIza…abcd");
        assert_eq!(mask("short"), "*****");
    }
}
