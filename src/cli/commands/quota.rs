//! Quota command - inspect or lift the API suspension

use crate::cli::args::{OutputFormat, QuotaAction, QuotaArgs};
use crate::clock::SystemClock;
use crate::config::{Config, ConfigManager};
use crate::error::ShipgenResult;
use crate::quota::{FileFlagStore, QuotaGovernor, QuotaState};
use crate::ui::{self, UiContext};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

/// Execute the quota command
pub async fn execute(args: QuotaArgs, config: &Config) -> ShipgenResult<()> {
    match args.action {
        None => status(config, OutputFormat::Text).await,
        Some(QuotaAction::Status { format }) => status(config, format).await,
        Some(QuotaAction::Clear { yes }) => clear(config, yes).await,
    }
}

async fn governor(config: &Config) -> QuotaGovernor {
    QuotaGovernor::restore(
        config.quota.cooldown(),
        Arc::new(SystemClock),
        Arc::new(FileFlagStore::new(ConfigManager::quota_flag_path())),
    )
    .await
}

async fn status(config: &Config, format: OutputFormat) -> ShipgenResult<()> {
    let ctx = UiContext::detect().with_quiet(format.is_json());
    let governor = governor(config).await;
    let flag = governor.flag();

    if format.is_json() {
        let output = json!({
            "suspended": flag.is_some(),
            "flag": flag,
            "persisted": config.quota.persist,
            "cooldown_secs": config.quota.cooldown_secs,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    ui::intro(&ctx, "Image API quota");
    match governor.state() {
        QuotaState::Available => ui::step_ok(&ctx, "Available"),
        QuotaState::Suspended { until } => {
            let remaining = until - Utc::now();
            ui::step_warn_hint(
                &ctx,
                &format!(
                    "Suspended until {} ({}h {}m left)",
                    until.format("%Y-%m-%d %H:%M UTC"),
                    remaining.num_hours(),
                    remaining.num_minutes() % 60
                ),
                "shipgen quota clear",
            );
            if let Some(flag) = flag {
                ui::key_value(&ctx, "Reason", &flag.reason);
            }
        }
    }
    if !config.quota.persist {
        ui::remark(
            &ctx,
            "quota.persist is off; suspensions only last for one run",
        );
    }
    Ok(())
}

async fn clear(config: &Config, yes: bool) -> ShipgenResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    let governor = governor(config).await;

    if governor.state().is_available() {
        ui::step_info(&ctx, "Image API is not suspended");
        return Ok(());
    }

    if !ui::confirm(&ctx, "Lift the quota suspension now?", false).await? {
        ui::step_info(&ctx, "Left unchanged (pass --yes to skip this prompt)");
        return Ok(());
    }

    governor.reset().await;
    ui::step_ok(&ctx, "Quota suspension cleared");
    Ok(())
}
