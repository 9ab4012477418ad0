//! Batch command - resolve a fleet file through one service
//!
//! ```toml
//! [[ship]]
//! name = "VANGUARD"
//! faction = "empire"
//! purpose = "military"
//! size_index = 4
//! turret_count = 6
//!
//! [[ship]]
//! name = "unused"
//! faction = "horde"
//! purpose = "military"
//! size_index = 0
//! random = true
//! ```

use super::generate::save_image;
use crate::cli::args::BatchArgs;
use crate::config::Config;
use crate::error::{ShipgenError, ShipgenResult};
use crate::image::ShipImage;
use crate::service::ShipImageService;
use crate::ship::ShipConfiguration;
use crate::ui::{self, TaskSpinner, UiContext};
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Contents of a fleet file
#[derive(Debug, Default, Deserialize)]
pub struct FleetFile {
    #[serde(default)]
    pub ship: Vec<ShipConfiguration>,
}

impl FleetFile {
    pub async fn load(path: &Path) -> ShipgenResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ShipgenError::io(format!("reading {}", path.display()), e))?;
        toml::from_str(&content).map_err(|e| ShipgenError::User(format!(
            "Invalid fleet file {}: {}",
            path.display(),
            e
        )))
    }

    /// Normalised ships; `random = true` entries are rolled fresh
    pub fn ships(&self) -> ShipgenResult<Vec<ShipConfiguration>> {
        let mut rng = rand::thread_rng();
        self.ship
            .iter()
            .map(|entry| {
                let ship = if entry.random {
                    ShipConfiguration::random(&mut rng, entry.turret_count)
                } else {
                    entry.normalized()
                };
                ship.validate()?;
                Ok(ship)
            })
            .collect()
    }
}

/// Execute the batch command
pub async fn execute(args: BatchArgs, config: &Config) -> ShipgenResult<()> {
    let ctx = UiContext::detect().with_quiet(args.format.is_json());
    let ships = FleetFile::load(&args.file).await?.ships()?;
    if ships.is_empty() {
        return Err(ShipgenError::User(format!(
            "No [[ship]] entries in {}",
            args.file.display()
        )));
    }

    let service = ShipImageService::builder(config.clone()).build().await;
    ui::intro(&ctx, &format!("Shipgen batch: {} ships", ships.len()));
    info!("Resolving {} ships from {}", ships.len(), args.file.display());

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Resolving 0/{}", ships.len()));

    // submit everything at once; the queue spaces the API calls
    let mut pending: FuturesUnordered<_> = ships
        .iter()
        .enumerate()
        .map(|(index, ship)| {
            let service = &service;
            async move { (index, service.generate_ship_image(ship).await) }
        })
        .collect();

    let mut results: Vec<Option<ShipImage>> = vec![None; ships.len()];
    let mut done = 0;
    while let Some((index, image)) = pending.next().await {
        done += 1;
        spinner.message(&format!("Resolving {}/{}", done, ships.len()));
        results[index] = Some(image);
    }
    drop(pending);
    spinner.stop(&format!("Resolved {} ships", ships.len()));

    let mut report = Vec::with_capacity(ships.len());
    for (ship, image) in ships.iter().zip(results.into_iter().flatten()) {
        let saved = match &args.out_dir {
            Some(dir) => save_to_dir(&image, ship, dir).await?,
            None => None,
        };

        if !args.format.is_json() {
            ui::ship_image(&ctx, &ship.name, &image);
            if let Some(ref path) = saved {
                ui::remark(&ctx, &format!("saved to {}", path.display()));
            }
        }
        report.push(json!({
            "ship": ship,
            "fingerprint": ship.fingerprint(),
            "image": image,
            "saved_to": saved,
        }));
    }

    let stats = service.stats();
    if args.format.is_json() {
        let output = json!({ "results": report, "stats": stats });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        ui::section(&ctx, "Summary");
        ui::key_value(&ctx, "Generated", &stats.generated.to_string());
        ui::key_value(&ctx, "Placeholders", &stats.fallbacks.to_string());
        ui::key_value(&ctx, "Cache hits", &stats.cache_hits.to_string());
        ui::key_value(&ctx, "API calls", &stats.dispatched.to_string());
        if stats.fallbacks > 0 {
            ui::outro_warn(&ctx, "Some ships got placeholder images");
        } else {
            ui::outro_success(&ctx, "All ships generated");
        }
    }

    service.shutdown().await;
    Ok(())
}

async fn save_to_dir(
    image: &ShipImage,
    ship: &ShipConfiguration,
    dir: &Path,
) -> ShipgenResult<Option<PathBuf>> {
    let path = dir.join(ship.download_file_name(image.image.extension()));
    if save_image(image, &path).await? {
        Ok(Some(path))
    } else {
        debug!("Nothing to save for {}", ship.name);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ship::{Faction, Purpose};

    #[test]
    fn fleet_file_parses_and_normalises() {
        let fleet: FleetFile = toml::from_str(
            r#"
            [[ship]]
            name = "CARGO"
            faction = "construction-cartel"
            purpose = "military"
            size_index = 0

            [[ship]]
            name = "ignored"
            faction = "empire"
            purpose = "military"
            size_index = 3
            random = true
            "#,
        )
        .unwrap();

        let ships = fleet.ships().unwrap();
        assert_eq!(ships.len(), 2);
        assert_eq!(ships[0].faction, Faction::ConstructionCartel);
        assert_eq!(ships[0].purpose, Purpose::Civilian);
        assert_eq!(ships[0].size_index, 2);
        assert_eq!(ships[0].origin, "Pompada");
        assert!(ships[1].random);
        assert!(ships[1].name.starts_with("X-"));
    }

    #[test]
    fn empty_fleet_file_has_no_ships() {
        let fleet: FleetFile = toml::from_str("").unwrap();
        assert!(fleet.ships().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = FleetFile::load(Path::new("/nonexistent/fleet.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShipgenError::Io { .. }));
    }
}
