//! CLI argument definitions using clap derive

use crate::ship::catalog::SIZE_CLASS_COUNT;
use crate::ship::{Faction, OriginRule, Purpose, ShipConfiguration};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shipgen - starship concept art from a handful of parameters
///
/// Builds an image prompt from faction, purpose, size class and armament,
/// sends it to the image API at a steady pace, and falls back to a
/// placeholder when the API is unavailable.
#[derive(Parser, Debug)]
#[command(name = "shipgen")]
#[command(
    author,
    version,
    about = "Shipgen - starship concept art from a handful of parameters",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHIPGEN_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate an image for one ship
    Generate(GenerateArgs),

    /// Print the prompt that would be sent, without calling the API
    Prompt(PromptArgs),

    /// Generate images for every ship in a TOML file
    Batch(BatchArgs),

    /// List factions, their rules and the size classes
    Catalog(CatalogArgs),

    /// Inspect or clear the quota suspension
    Quota(QuotaArgs),

    /// Show API key, config and quota state
    Status,

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Ship parameters shared by `generate` and `prompt`
#[derive(Args, Debug, Clone)]
pub struct ShipArgs {
    /// Ship name (max 30 characters)
    #[arg(short, long, default_value = "LEVIATHAN-IX")]
    pub name: String,

    /// Faction id (e.g. empire, free-fleet, horde)
    #[arg(short, long, default_value = "empire")]
    pub faction: Faction,

    /// military or civilian; forced for some factions
    #[arg(short, long, default_value = "military")]
    pub purpose: Purpose,

    /// Size class, 1 (smallest) to 11
    #[arg(long = "class", default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=SIZE_CLASS_COUNT as i64))]
    pub class: u8,

    /// Home world; ignored for factions with a fixed or no origin
    #[arg(long)]
    pub origin: Option<String>,

    /// Visible turrets on military ships; clamped to the class range
    #[arg(short, long, default_value_t = 2)]
    pub turrets: u32,

    /// Ignore the other ship flags and roll a random ship
    #[arg(long)]
    pub random: bool,
}

impl ShipArgs {
    /// The configuration as entered, before faction rules are applied
    pub fn to_configuration(&self) -> ShipConfiguration {
        let origin = match (&self.origin, self.faction.origin_rule()) {
            (Some(origin), _) => origin.clone(),
            (None, OriginRule::Editable { default, .. }) => default.to_string(),
            (None, OriginRule::Fixed(origin)) => origin.to_string(),
            (None, OriginRule::None) => String::new(),
        };

        ShipConfiguration {
            name: self.name.clone(),
            faction: self.faction,
            purpose: self.purpose,
            size_index: usize::from(self.class) - 1,
            origin,
            turret_count: self.turrets,
            random: false,
        }
    }
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub ship: ShipArgs,

    /// Write the image to this file (inline images only)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write into this directory under the ship's download name
    #[arg(long, conflicts_with = "output")]
    pub out_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the prompt command
#[derive(Parser, Debug)]
pub struct PromptArgs {
    #[command(flatten)]
    pub ship: ShipArgs,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the batch command
#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// TOML file with one `[[ship]]` table per ship
    pub file: PathBuf,

    /// Save inline images into this directory
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the catalog command
#[derive(Parser, Debug)]
pub struct CatalogArgs {
    /// Show a single faction
    #[arg(short, long)]
    pub faction: Option<Faction>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the quota command
#[derive(Parser, Debug)]
pub struct QuotaArgs {
    #[command(subcommand)]
    pub action: Option<QuotaAction>,
}

/// Quota subcommands
#[derive(Subcommand, Debug)]
pub enum QuotaAction {
    /// Show whether the API is suspended and until when
    Status {
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Lift the suspension now
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., queue.min_interval_ms)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable
    Text,
    /// JSON on stdout, nothing else
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        self == Self::Json
    }
}
