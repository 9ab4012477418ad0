//! Ship configurations and their content fingerprints
//!
//! A [`ShipConfiguration`] is an immutable value: normalisation and random
//! generation return new values. The [`Fingerprint`] of a configuration is a
//! content address over the fields that affect the rendered image, so two
//! equal configurations always share a cache entry.

pub mod catalog;

pub use catalog::{Faction, OriginRule, Purpose, SizeClass};

use crate::error::{ShipgenError, ShipgenResult};
use catalog::{turret_range, MAX_NAME_LEN, SIZE_CLASS_COUNT};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Everything the user picks about a ship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipConfiguration {
    pub name: String,
    pub faction: Faction,
    pub purpose: Purpose,
    /// Index into the size table of `purpose`
    pub size_index: usize,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub turret_count: u32,
    /// Generated by `random`; field rules are not applied
    #[serde(default)]
    pub random: bool,
}

impl Default for ShipConfiguration {
    fn default() -> Self {
        Self {
            name: "LEVIATHAN-IX".to_string(),
            faction: Faction::Empire,
            purpose: Purpose::Military,
            size_index: 0,
            origin: "Gerbera".to_string(),
            turret_count: 2,
            random: false,
        }
    }
}

impl ShipConfiguration {
    /// Roll a random ship. The name follows the `X-XXXXX` pattern, the
    /// origin is left empty and the caller's turret count is kept as is.
    pub fn random<R: Rng>(rng: &mut R, turret_count: u32) -> Self {
        let factions = Faction::all();
        let faction = factions[rng.gen_range(0..factions.len())];
        let purpose = if rng.gen_bool(0.5) {
            Purpose::Military
        } else {
            Purpose::Civilian
        };
        let size_index = rng.gen_range(0..SIZE_CLASS_COUNT);
        let suffix: String = (0..5)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();

        Self {
            name: format!("X-{}", suffix),
            faction,
            purpose,
            size_index,
            origin: String::new(),
            turret_count,
            random: true,
        }
    }

    /// Reject values the tables cannot serve
    pub fn validate(&self) -> ShipgenResult<()> {
        if self.size_index >= SIZE_CLASS_COUNT {
            return Err(ShipgenError::InvalidShip(format!(
                "size index {} out of range (0..={})",
                self.size_index,
                SIZE_CLASS_COUNT - 1
            )));
        }
        Ok(())
    }

    /// Apply the faction coupling rules: forced purpose, size bounds, origin
    /// handling, turret range and name length. Random ships are returned as-is.
    pub fn normalized(&self) -> Self {
        let mut ship = self.clone();
        if ship.random {
            return ship;
        }

        if let Some(purpose) = ship.faction.forced_purpose() {
            ship.purpose = purpose;
        }

        let bounds = ship.faction.size_bounds();
        ship.size_index = ship.size_index.clamp(*bounds.start(), *bounds.end());

        ship.origin = match ship.faction.origin_rule() {
            OriginRule::Fixed(origin) => origin.to_string(),
            OriginRule::None => String::new(),
            OriginRule::Editable { default, forbidden } => {
                let trimmed = ship.origin.trim();
                if trimmed.is_empty() || Some(trimmed) == forbidden {
                    default.to_string()
                } else {
                    truncate_chars(trimmed, MAX_NAME_LEN)
                }
            }
        };

        let turrets = turret_range(ship.size_index);
        ship.turret_count = ship.turret_count.clamp(*turrets.start(), *turrets.end());
        ship.name = truncate_chars(ship.name.trim(), MAX_NAME_LEN);
        ship
    }

    /// Size class entry for this configuration
    pub fn size_class(&self) -> &'static SizeClass {
        let classes = self.purpose.size_classes();
        &classes[self.size_index.min(classes.len() - 1)]
    }

    /// Content address of the output-affecting fields
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self)
    }

    /// File name offered when saving the image
    pub fn download_file_name(&self, extension: &str) -> String {
        let name: String = self
            .name
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let name = if name.is_empty() { "ship".to_string() } else { name };
        format!(
            "{}_{}_class{}.{}",
            name,
            self.faction.id(),
            self.size_index + 1,
            extension
        )
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Deterministic cache key for a ship configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash name, faction, purpose, size index, origin and turret count.
    /// Each field is length-prefixed so no two field splits collide.
    pub fn of(ship: &ShipConfiguration) -> Self {
        let size = ship.size_index.to_string();
        let turrets = ship.turret_count.to_string();
        let fields: [&str; 6] = [
            &ship.name,
            ship.faction.id(),
            ship.purpose.id(),
            &size,
            &ship.origin,
            &turrets,
        ];

        let mut hasher = Sha256::new();
        for field in fields {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        let result = hasher.finalize();

        // 16 bytes is plenty for a content key
        Self(hex::encode(&result[..16]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
