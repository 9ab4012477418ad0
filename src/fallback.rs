//! Deterministic placeholder selection
//!
//! The fingerprint string is hashed with 64-bit FNV-1a and reduced modulo the
//! pool size. A faction with its own non-empty pool uses it; every other
//! faction uses the default pool.

use crate::config::FallbackConfig;
use crate::image::{FallbackReason, ShipImage};
use crate::ship::{Faction, ShipConfiguration};
use std::collections::HashMap;
use tracing::{debug, warn};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Used when the configured default pool is empty
const LAST_RESORT: &str = "https://placehold.co/1600x900/000000/22d3ee/png?text=NO+SIGNAL";

/// 64-bit FNV-1a over the UTF-8 bytes of `input`
pub fn fnv1a_64(input: &str) -> u64 {
    input.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Picks placeholder images from faction or default pools
#[derive(Debug, Clone)]
pub struct FallbackResolver {
    default_pool: Vec<String>,
    factions: HashMap<Faction, Vec<String>>,
}

impl FallbackResolver {
    pub fn new(config: &FallbackConfig) -> Self {
        let mut factions = HashMap::new();
        for (id, pool) in &config.factions {
            match id.parse::<Faction>() {
                Ok(faction) if !pool.is_empty() => {
                    factions.insert(faction, pool.clone());
                }
                Ok(faction) => debug!("Empty fallback pool for {}, using default", faction),
                Err(_) => warn!("Ignoring fallback pool for unknown faction '{}'", id),
            }
        }

        Self {
            default_pool: config.default_pool.clone(),
            factions,
        }
    }

    /// Pool that serves `faction`
    pub fn pool_for(&self, faction: Faction) -> &[String] {
        self.factions
            .get(&faction)
            .map(Vec::as_slice)
            .unwrap_or(&self.default_pool)
    }

    /// Choose the placeholder URL for `ship`. Same fingerprint, same URL.
    pub fn select(&self, ship: &ShipConfiguration) -> &str {
        let pool = self.pool_for(ship.faction);
        if pool.is_empty() {
            return LAST_RESORT;
        }

        let fingerprint = ship.fingerprint();
        let index = (fnv1a_64(fingerprint.as_str()) % pool.len() as u64) as usize;
        debug!(
            "Fallback for {}: slot {} of {}",
            fingerprint.short(),
            index,
            pool.len()
        );
        &pool[index]
    }

    /// Placeholder image tagged with why it was used
    pub fn resolve(&self, ship: &ShipConfiguration, reason: FallbackReason) -> ShipImage {
        ShipImage::fallback(self.select(ship), reason)
    }
}

impl Default for FallbackResolver {
    fn default() -> Self {
        Self::new(&FallbackConfig::default())
    }
}
