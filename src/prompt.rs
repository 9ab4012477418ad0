//! Prompt construction for the image model
//!
//! Pure functions only: a ship configuration goes in, a text prompt and an
//! aspect ratio come out. Nothing here touches the network.

use crate::ship::{Faction, Purpose, ShipConfiguration};
use serde::Serialize;

/// Aspect ratio used when the caller has no preference
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

/// Everything the image backend needs for one call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub aspect_ratio: String,
}

/// Build the request for a ship with the default aspect ratio
pub fn build_request(ship: &ShipConfiguration) -> GenerationRequest {
    build_request_with_ratio(ship, DEFAULT_ASPECT_RATIO)
}

/// Build the request for a ship with an explicit aspect ratio
pub fn build_request_with_ratio(ship: &ShipConfiguration, aspect_ratio: &str) -> GenerationRequest {
    GenerationRequest {
        prompt: build_prompt(ship),
        aspect_ratio: aspect_ratio.to_string(),
    }
}

/// Derive the full prompt text.
///
/// Sections, in order: framing, background, faction style, purpose, size
/// class, weapons, faction addendum, closing constraints.
pub fn build_prompt(ship: &ShipConfiguration) -> String {
    let size = ship.size_class();
    let mut lines = vec![
        "Create a professional cinematic concept art of a single starship or orbital structure shown from a profile (side) view.".to_string(),
        background(ship.faction).to_string(),
        "The vessel is the main focal point, highly detailed, shown as a clear side projection.".to_string(),
        String::new(),
        format!("Style: {}", ship.faction.style()),
        format!("Purpose: {}.", purpose_statement(ship.purpose)),
        format!("Ship class: {}.", size.label),
        format!("Size context: approximately {} meters in length.", size.max_length),
        format!("Faction: {}.", ship.faction.display_name()),
        String::new(),
        "Design constraints:".to_string(),
        design_rules(ship.purpose).to_string(),
        weapons(ship),
    ];

    if let Some(addendum) = faction_addendum(ship.faction) {
        lines.push(String::new());
        lines.push(format!("Special instructions: {}", addendum));
    }

    lines.push(String::new());
    lines.push("Ensure it looks like high-end science fiction concept art.".to_string());
    lines.push("Absolutely NO text, labels or UI elements inside the generated image.".to_string());
    lines.push("Only one vessel in its environment.".to_string());
    lines.join("\n")
}

fn background(faction: Faction) -> &'static str {
    if faction.orbits_home_world() {
        "The background MUST be Earth seen from high orbit, with the day/night terminator visible, dark blue oceans and glowing city lights on the night side."
    } else {
        "The background MUST be deep dark space with a faint nebula, distant galaxies and stars."
    }
}

fn purpose_statement(purpose: Purpose) -> &'static str {
    match purpose {
        Purpose::Military => "Military / combat warship",
        Purpose::Civilian => "Civilian / transport / scientific vessel or orbital station",
    }
}

fn design_rules(purpose: Purpose) -> &'static str {
    match purpose {
        Purpose::Military => "The ship is a WARSHIP with visible tactical lighting and armor plating. The shape is aggressive, aerodynamic or wedge-shaped.",
        Purpose::Civilian => "The ship is a CIVILIAN vessel with a peaceful, non-aggressive silhouette built from rectangular, square or oval shapes: habitation modules, cargo containers, large viewports or industrial machinery.",
    }
}

/// Weapon requirement: turret count for armed factions, organic weapons
/// for the faction without machinery, nothing for civilian hulls.
fn weapons(ship: &ShipConfiguration) -> String {
    if ship.faction.has_organic_weapons() {
        return "The ship features biological protrusions, bone-like spikes and organic weapon pods, but no mechanical turrets.".to_string();
    }
    match ship.purpose {
        Purpose::Military => format!(
            "The ship MUST have {} visible turrets: prominent main guns or heavy batteries protruding from the hull, matching the {} aesthetic.",
            ship.turret_count,
            ship.faction.display_name()
        ),
        Purpose::Civilian => "No weapons of any kind are visible.".to_string(),
    }
}

fn faction_addendum(faction: Faction) -> Option<&'static str> {
    match faction {
        Faction::Caverna => Some("The ship is pristine and snow-white, with very smooth aerodynamic curves and glowing high-tech accents."),
        Faction::PjscEmpire => Some("The ship looks like a realistic early space-age station, similar to the ISS, with modular white segments, solar panels and golden thermal foil."),
        _ => None,
    }
}
