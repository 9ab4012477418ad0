//! Prompt command - show the request without sending it

use super::generate::ship_from_args;
use crate::cli::args::PromptArgs;
use crate::config::Config;
use crate::error::ShipgenResult;
use crate::prompt::build_request_with_ratio;
use console::style;
use serde_json::json;

/// Execute the prompt command
pub async fn execute(args: PromptArgs, config: &Config) -> ShipgenResult<()> {
    let ship = ship_from_args(&args.ship)?;
    let request = build_request_with_ratio(&ship, &config.api.aspect_ratio);

    if args.format.is_json() {
        let output = json!({
            "ship": ship,
            "fingerprint": ship.fingerprint(),
            "request": request,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} ({}, {}, class {} - {})",
        style("Ship:").bold(),
        ship.name,
        ship.faction.display_name(),
        ship.purpose,
        ship.size_index + 1,
        ship.size_class().label
    );
    println!("{} {}", style("Aspect ratio:").bold(), request.aspect_ratio);
    println!("{} {}", style("Fingerprint:").bold(), ship.fingerprint());
    println!();
    println!("{}", request.prompt);
    Ok(())
}
