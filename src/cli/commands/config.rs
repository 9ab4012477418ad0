//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, MAX_DURATION_SECS};
use crate::error::{ShipgenError, ShipgenResult};
use crate::ship::Faction;
use crate::ui::{self, UiContext};

/// Aspect ratios the image model accepts
const ASPECT_RATIOS: &[&str] = &[
    "1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9",
];

const VALID_KEYS: &[&str] = &[
    "general.verbose",
    "general.log_format",
    "api.model",
    "api.base_url",
    "api.key_env",
    "api.timeout_secs",
    "api.aspect_ratio",
    "queue.min_interval_ms",
    "cache.ttl_secs",
    "cache.sweep_interval_secs",
    "quota.cooldown_secs",
    "quota.persist",
    "fallback.default_pool",
    "fallback.factions.<faction-id>",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> ShipgenResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> ShipgenResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> ShipgenResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> ShipgenResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();

    if let Err(e) = apply(&mut config, key, value) {
        if matches!(e, ShipgenError::User(ref msg) if msg.starts_with("Unknown config key")) {
            ui::step_error_detail(&ctx, "Unknown config key", key);
            ui::remark(&ctx, "Valid keys:");
            for key in VALID_KEYS {
                eprintln!("  {}", key);
            }
        }
        return Err(e);
    }

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));
    Ok(())
}

/// Apply one dot-separated key to `config`
fn apply(config: &mut Config, key: &str, value: &str) -> ShipgenResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse_bool(value)?,
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(ShipgenError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )))
            }
        },

        ["api", "model"] => config.api.model = non_empty(key, value)?,
        ["api", "base_url"] => {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(ShipgenError::User(format!("Invalid URL: {}", value)));
            }
            config.api.base_url = value.trim_end_matches('/').to_string();
        }
        ["api", "key_env"] => config.api.key_env = non_empty(key, value)?,
        ["api", "timeout_secs"] => config.api.timeout_secs = parse_u64(value)?,
        ["api", "aspect_ratio"] => {
            if !ASPECT_RATIOS.contains(&value) {
                return Err(ShipgenError::User(format!(
                    "Unsupported aspect ratio: {}. Use one of {}",
                    value,
                    ASPECT_RATIOS.join(", ")
                )));
            }
            config.api.aspect_ratio = value.to_string();
        }

        ["queue", "min_interval_ms"] => {
            config.queue.min_interval_ms = parse_bounded(value, MAX_DURATION_SECS * 1000)?
        }

        ["cache", "ttl_secs"] => config.cache.ttl_secs = parse_bounded(value, MAX_DURATION_SECS)?,
        ["cache", "sweep_interval_secs"] => {
            config.cache.sweep_interval_secs = parse_bounded(value, MAX_DURATION_SECS)?
        }

        ["quota", "cooldown_secs"] => {
            config.quota.cooldown_secs = parse_bounded(value, MAX_DURATION_SECS)?
        }
        ["quota", "persist"] => config.quota.persist = parse_bool(value)?,

        ["fallback", "default_pool"] => config.fallback.default_pool = parse_list(value),
        ["fallback", "factions", faction] => {
            let faction: Faction = faction.parse()?;
            let pool = parse_list(value);
            if pool.is_empty() {
                config.fallback.factions.remove(faction.id());
            } else {
                config.fallback.factions.insert(faction.id().to_string(), pool);
            }
        }

        _ => return Err(ShipgenError::User(format!("Unknown config key: {}", key))),
    }

    Ok(())
}

fn parse_bool(value: &str) -> ShipgenResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ShipgenError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> ShipgenResult<u64> {
    value
        .parse()
        .map_err(|_| ShipgenError::User(format!("Invalid number: {}", value)))
}

fn parse_bounded(value: &str, max: u64) -> ShipgenResult<u64> {
    let parsed = parse_u64(value)?;
    if parsed > max {
        return Err(ShipgenError::User(format!(
            "Value {} is too large (maximum {})",
            parsed, max
        )));
    }
    Ok(parsed)
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(key: &str, value: &str) -> ShipgenResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ShipgenError::User(format!("{} cannot be empty", key)));
    }
    Ok(value.to_string())
}
