//! Shipgen - starship concept art generator
//!
//! Turns a ship configuration into an image prompt, sends it to a
//! text-to-image API through a paced queue, caches results by content
//! fingerprint, and falls back to deterministic placeholders when the API
//! is unavailable or over quota.

pub mod backend;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod fallback;
pub mod image;
pub mod prompt;
pub mod queue;
pub mod quota;
pub mod service;
pub mod ship;
pub mod ui;

pub use error::{ShipgenError, ShipgenResult};
pub use image::{FallbackReason, ImageOrigin, ImageRef, ShipImage};
pub use service::{ServiceStats, ShipImageService};
pub use ship::{Faction, Fingerprint, Purpose, ShipConfiguration};
