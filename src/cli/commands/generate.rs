//! Generate command - resolve one ship to an image

use crate::cli::args::{GenerateArgs, ShipArgs};
use crate::config::Config;
use crate::error::{ShipgenError, ShipgenResult};
use crate::image::ShipImage;
use crate::service::ShipImageService;
use crate::ship::ShipConfiguration;
use crate::ui::{self, TaskSpinner, UiContext};
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Execute the generate command
pub async fn execute(args: GenerateArgs, config: &Config) -> ShipgenResult<()> {
    let ctx = UiContext::detect().with_quiet(args.format.is_json());
    let ship = ship_from_args(&args.ship)?;

    // one-shot run: no point sweeping a cache that dies with the process
    let service = ShipImageService::builder(config.clone())
        .sweep(false)
        .build()
        .await;

    ui::intro(&ctx, "Shipgen");
    if !service.has_backend() {
        ui::step_warn_hint(
            &ctx,
            "No API key found",
            &format!("export {} to generate real images", config.api.key_env),
        );
    }

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Generating {} ...", ship.name));
    let image = service.generate_ship_image(&ship).await;
    if image.is_fallback() {
        spinner.stop_warn(&format!("Using a placeholder ({})", image.origin));
    } else {
        spinner.stop("Image generated");
    }

    let target = match (&args.output, &args.out_dir) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(dir)) => Some(dir.join(ship.download_file_name(image.image.extension()))),
        (None, None) => None,
    };
    let saved = match target {
        Some(path) => save_image(&image, &path).await?.then_some(path),
        None => None,
    };

    if args.format.is_json() {
        let output = json!({
            "ship": ship,
            "fingerprint": ship.fingerprint(),
            "file_name": ship.download_file_name(image.image.extension()),
            "image": image,
            "saved_to": saved,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        ui::ship_image(&ctx, &ship.name, &image);
        match (&saved, &args.output, &args.out_dir) {
            (Some(path), _, _) => ui::step_ok_detail(&ctx, "Saved", &path.display().to_string()),
            (None, Some(_), _) | (None, _, Some(_)) => {
                ui::step_warn(&ctx, "Placeholder is a URL; nothing was written")
            }
            _ => {}
        }
    }

    service.shutdown().await;
    Ok(())
}

/// Turn CLI flags into a validated configuration. Random ships skip the
/// faction rules; everything else is normalised.
pub(crate) fn ship_from_args(args: &ShipArgs) -> ShipgenResult<ShipConfiguration> {
    let ship = if args.random {
        ShipConfiguration::random(&mut rand::thread_rng(), args.turrets)
    } else {
        args.to_configuration().normalized()
    };
    ship.validate()?;
    debug!("Resolved ship {:?} ({})", ship.name, ship.fingerprint().short());
    Ok(ship)
}

/// Write inline image bytes to `path`. Returns `false` for URL images.
pub(crate) async fn save_image(image: &ShipImage, path: &Path) -> ShipgenResult<bool> {
    let Some(bytes) = image.image.decode()? else {
        return Ok(false);
    };

    if let Some(parent) = non_empty_parent(path) {
        fs::create_dir_all(&parent)
            .await
            .map_err(|e| ShipgenError::io(format!("creating {}", parent.display()), e))?;
    }
    fs::write(path, &bytes)
        .await
        .map_err(|e| ShipgenError::io(format!("writing {}", path.display()), e))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(true)
}

fn non_empty_parent(path: &Path) -> Option<PathBuf> {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
