//! Catalog command - factions, field rules and size tables

use crate::cli::args::CatalogArgs;
use crate::config::Config;
use crate::error::ShipgenResult;
use crate::ship::catalog::turret_range;
use crate::ship::{Faction, OriginRule, Purpose};
use console::style;
use serde_json::{json, Value};

/// Execute the catalog command
pub async fn execute(args: CatalogArgs, _config: &Config) -> ShipgenResult<()> {
    let factions: Vec<Faction> = match args.faction {
        Some(faction) => vec![faction],
        None => Faction::all().to_vec(),
    };

    if args.format.is_json() {
        let output = json!({
            "factions": factions.iter().map(|f| faction_json(*f)).collect::<Vec<_>>(),
            "size_classes": {
                "military": size_table_json(Purpose::Military),
                "civilian": size_table_json(Purpose::Civilian),
            },
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for faction in &factions {
        print_faction(*faction);
    }

    let purposes = match args.faction.and_then(|f| f.forced_purpose()) {
        Some(purpose) => vec![purpose],
        None => vec![Purpose::Military, Purpose::Civilian],
    };
    let bounds = args.faction.map(|f| f.size_bounds());
    for purpose in purposes {
        println!();
        println!("{}", style(format!("Size classes ({})", purpose)).bold());
        for (index, class) in purpose.size_classes().iter().enumerate() {
            if let Some(ref bounds) = bounds {
                if !bounds.contains(&index) {
                    continue;
                }
            }
            let turrets = turret_range(index);
            println!(
                "  {:>2}  {:<32} {:>6}-{:<6} m  turrets {}-{}{}",
                index + 1,
                class.label,
                class.min_length,
                class.max_length,
                turrets.start(),
                turrets.end(),
                if class.can_land { "  lands" } else { "" }
            );
        }
    }

    Ok(())
}

fn print_faction(faction: Faction) {
    let bounds = faction.size_bounds();
    println!();
    println!(
        "{} {}",
        style(faction.display_name()).cyan().bold(),
        style(format!("({})", faction.id())).dim()
    );
    println!("  {}", faction.description());
    println!(
        "  {} {}",
        style("Purpose:").dim(),
        faction
            .forced_purpose()
            .map(|p| format!("{} only", p))
            .unwrap_or_else(|| "military or civilian".to_string())
    );
    println!(
        "  {} {}-{}",
        style("Classes:").dim(),
        bounds.start() + 1,
        bounds.end() + 1
    );
    println!("  {} {}", style("Origin:").dim(), origin_text(faction.origin_rule()));
    println!("  {} {}", style("Style:").dim(), faction.style());
}

fn origin_text(rule: OriginRule) -> String {
    match rule {
        OriginRule::Editable {
            default,
            forbidden: Some(forbidden),
        } => format!("editable, default {}, never {}", default, forbidden),
        OriginRule::Editable { default, .. } => format!("editable, default {}", default),
        OriginRule::Fixed(origin) => format!("always {}", origin),
        OriginRule::None => "none".to_string(),
    }
}

fn faction_json(faction: Faction) -> Value {
    let bounds = faction.size_bounds();
    json!({
        "id": faction.id(),
        "name": faction.display_name(),
        "description": faction.description(),
        "style": faction.style(),
        "purpose": faction.forced_purpose(),
        "classes": [bounds.start() + 1, bounds.end() + 1],
        "origin": origin_text(faction.origin_rule()),
    })
}

fn size_table_json(purpose: Purpose) -> Vec<Value> {
    purpose
        .size_classes()
        .iter()
        .enumerate()
        .map(|(index, class)| {
            let turrets = turret_range(index);
            json!({
                "class": index + 1,
                "label": class.label,
                "min_length": class.min_length,
                "max_length": class.max_length,
                "can_land": class.can_land,
                "turrets": [turrets.start(), turrets.end()],
            })
        })
        .collect()
}
