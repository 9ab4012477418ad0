//! Static ship tables: factions, purposes, size classes and the field rules
//! that couple them.

use crate::error::ShipgenError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Number of entries in each size table
pub const SIZE_CLASS_COUNT: usize = 11;

/// Longest accepted ship name, in characters
pub const MAX_NAME_LEN: usize = 30;

/// Fleet factions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Faction {
    Empire,
    FreeFleet,
    WarOrphans,
    Kovarol,
    Horde,
    ConstructionCartel,
    Caverna,
    PjscEmpire,
}

impl Faction {
    /// All factions in catalog order
    pub fn all() -> &'static [Self] {
        &[
            Self::Empire,
            Self::FreeFleet,
            Self::WarOrphans,
            Self::Kovarol,
            Self::Horde,
            Self::ConstructionCartel,
            Self::Caverna,
            Self::PjscEmpire,
        ]
    }

    /// Stable identifier used in config files and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            Self::Empire => "empire",
            Self::FreeFleet => "free-fleet",
            Self::WarOrphans => "war-orphans",
            Self::Kovarol => "kovarol",
            Self::Horde => "horde",
            Self::ConstructionCartel => "construction-cartel",
            Self::Caverna => "caverna",
            Self::PjscEmpire => "pjsc-empire",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Empire => "Empire",
            Self::FreeFleet => "Free Fleet",
            Self::WarOrphans => "War Orphans",
            Self::Kovarol => "Kovarol",
            Self::Horde => "Horde",
            Self::ConstructionCartel => "Construction Cartel",
            Self::Caverna => "Caverna",
            Self::PjscEmpire => "PJSC Empire",
        }
    }

    /// Visual style descriptor fed to the image model. One per faction.
    pub fn style(&self) -> &'static str {
        match self {
            Self::Empire => "Neutral, utilitarian, massive, geometric. Reminiscent of Star Wars Star Destroyer, Mon Calamari cruisers. Clean lines, grey hull.",
            Self::FreeFleet => "Rusty, patched-up, industrial, jury-rigged. Visible pipes, missing plating, dark browns and oranges. Heavily weathered scrap-metal look.",
            Self::WarOrphans => "Sleek, aerodynamic, black matte, stealth, futuristic. Smooth curves, minimal visible engines, silent silhouette.",
            Self::Kovarol => "Gothic cathedral architecture merged with starship engines. Flying buttresses, stained glass elements, ornate sculptures, grimdark, Warhammer 40k style.",
            Self::Horde => "Bio-mechanical, insectoid, skeletal, organic horror. Chitinous plates, spiky limbs, glowing organic lights.",
            Self::ConstructionCartel => "Functional industrial megastructures, massive cranes, spherical fuel tanks, modular habitation units, exposed trusses, vivid yellow and white colors.",
            Self::Caverna => "Elegant, snow-white, polished hull, sleek aerodynamic curves, high-tech minimalism, futuristic glow, like Apple-designed spacecraft.",
            Self::PjscEmpire => "Hard sci-fi, realistic modular design, 21st-century technology, similar to ISS (International Space Station), golden foil insulation, solar panels, visible trusses, white pressure modules, functional industrial look.",
        }
    }

    /// One-line lore blurb for the catalog listing
    pub fn description(&self) -> &'static str {
        match self {
            Self::Empire => "Imperial style: strict geometry, wedge-shaped hulls.",
            Self::FreeFleet => "Old, rusty vessels carrying plenty of battle damage.",
            Self::WarOrphans => "Black stealth ships with streamlined forms.",
            Self::Kovarol => "Gothic style: flying cathedrals and massive guns.",
            Self::Horde => "Sinister insectoid ships of bone and chitin.",
            Self::ConstructionCartel => "Giant industrial platforms and freighters.",
            Self::Caverna => "Snow-white streamlined ships of the future.",
            Self::PjscEmpire => "Dawn of the era: realistic 21st-century design.",
        }
    }

    /// Purpose this faction is locked to, if any
    pub fn forced_purpose(&self) -> Option<Purpose> {
        match self {
            Self::Horde | Self::WarOrphans => Some(Purpose::Military),
            Self::ConstructionCartel | Self::PjscEmpire => Some(Purpose::Civilian),
            _ => None,
        }
    }

    /// Size indices this faction may build
    pub fn size_bounds(&self) -> RangeInclusive<usize> {
        match self {
            Self::Kovarol => 0..=4,
            Self::FreeFleet => 0..=7,
            Self::WarOrphans => 0..=5,
            Self::Caverna | Self::PjscEmpire => 0..=2,
            Self::ConstructionCartel => 2..=9,
            Self::Empire | Self::Horde => 0..=SIZE_CLASS_COUNT - 1,
        }
    }

    /// How the origin field behaves for this faction
    pub fn origin_rule(&self) -> OriginRule {
        match self {
            Self::Empire => OriginRule::Editable {
                default: "Gerbera",
                forbidden: Some("Coruscant"),
            },
            Self::ConstructionCartel => OriginRule::Editable {
                default: "Pompada",
                forbidden: None,
            },
            Self::Kovarol => OriginRule::Fixed("Kovarol"),
            Self::FreeFleet => OriginRule::Fixed("Ghoul"),
            Self::PjscEmpire => OriginRule::Fixed("Earth"),
            Self::Horde | Self::WarOrphans | Self::Caverna => OriginRule::None,
        }
    }

    /// Faction whose home world is rendered behind its ships
    pub fn orbits_home_world(&self) -> bool {
        matches!(self, Self::PjscEmpire)
    }

    /// Faction whose aesthetic excludes mechanical weapons
    pub fn has_organic_weapons(&self) -> bool {
        matches!(self, Self::Horde)
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Faction {
    type Err = ShipgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', ' '], "-");
        Self::all()
            .iter()
            .copied()
            .find(|faction| faction.id() == wanted)
            .ok_or_else(|| ShipgenError::UnknownFaction(s.to_string()))
    }
}

/// Origin field behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginRule {
    /// User-editable, with a default for empty input and an optional banned value
    Editable {
        default: &'static str,
        forbidden: Option<&'static str>,
    },
    /// Always this value
    Fixed(&'static str),
    /// Faction has no origin
    None,
}

/// Ship role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Military,
    Civilian,
}

impl Purpose {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Military => "military",
            Self::Civilian => "civilian",
        }
    }

    /// Size table for this purpose
    pub fn size_classes(&self) -> &'static [SizeClass; SIZE_CLASS_COUNT] {
        match self {
            Self::Military => &MILITARY_CLASSES,
            Self::Civilian => &CIVILIAN_CLASSES,
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Purpose {
    type Err = ShipgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "military" | "combat" | "warship" => Ok(Self::Military),
            "civilian" | "civil" => Ok(Self::Civilian),
            other => Err(ShipgenError::InvalidShip(format!(
                "unknown purpose '{}', use military or civilian",
                other
            ))),
        }
    }
}

/// A hull size class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeClass {
    pub label: &'static str,
    /// Typical minimum length in meters
    pub min_length: u32,
    /// Typical maximum length in meters
    pub max_length: u32,
    /// Whether the hull can land on a planet
    pub can_land: bool,
}

const fn class(label: &'static str, min_length: u32, max_length: u32, can_land: bool) -> SizeClass {
    SizeClass {
        label,
        min_length,
        max_length,
        can_land,
    }
}

pub static MILITARY_CLASSES: [SizeClass; SIZE_CLASS_COUNT] = [
    class("Shuttle", 5, 15, true),
    class("Fighter / Attack craft", 10, 50, true),
    class("Corvette / Destroyer", 80, 250, true),
    class("Light cruiser", 250, 500, true),
    class("Cruiser", 500, 1000, true),
    class("Heavy cruiser", 1000, 2000, true),
    class("Battleship", 2000, 5000, false),
    class("Flying spaceport", 5000, 10000, false),
    class("Grand flying spaceport", 10000, 30000, false),
    class("Inhabited asteroid (fortress)", 1000, 15000, false),
    class("Assault continent", 50000, 100000, false),
];

pub static CIVILIAN_CLASSES: [SizeClass; SIZE_CLASS_COUNT] = [
    class("Lifeboat / Capsule", 5, 10, true),
    class("Yacht / Schooner / Shuttle", 10, 80, true),
    class("Light transport / Launch", 80, 200, true),
    class("Bulk carrier / Liner", 200, 500, true),
    class("Heavy light transport", 500, 1000, true),
    class("Tanker / Freighter", 1000, 2000, true),
    class("Orbital freighter / Ark", 2000, 5000, false),
    class("Flying city / Factory", 5000, 10000, false),
    class("Space city", 10000, 30000, false),
    class("Inhabited asteroid (civilian)", 1000, 15000, false),
    class("Space continent", 50000, 100000, false),
];

/// Allowed turret counts for a size index
pub fn turret_range(size_index: usize) -> RangeInclusive<u32> {
    match size_index {
        0 | 1 => 0..=3,
        2 => 1..=5,
        3 => 1..=6,
        4 => 2..=8,
        5 => 2..=10,
        6 => 2..=12,
        _ => 2..=16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faction_ids_round_trip() {
        for faction in Faction::all() {
            assert_eq!(faction.id().parse::<Faction>().unwrap(), *faction);
        }
        assert_eq!("PJSC Empire".parse::<Faction>().unwrap(), Faction::PjscEmpire);
        assert_eq!(
            "construction_cartel".parse::<Faction>().unwrap(),
            Faction::ConstructionCartel
        );
        assert!("klingon".parse::<Faction>().is_err());
    }

    #[test]
    fn faction_serde_uses_ids() {
        let json = serde_json::to_string(&Faction::WarOrphans).unwrap();
        assert_eq!(json, "\"war-orphans\"");
    }

    #[test]
    fn size_bounds_fit_tables() {
        for faction in Faction::all() {
            assert!(*faction.size_bounds().end() < SIZE_CLASS_COUNT);
        }
    }

    #[test]
    fn size_tables_are_ordered_by_id() {
        assert_eq!(MILITARY_CLASSES[0].label, "Shuttle");
        assert_eq!(MILITARY_CLASSES[10].max_length, 100_000);
        assert_eq!(CIVILIAN_CLASSES[4].max_length, 1000);
    }

    #[test]
    fn turret_ranges_widen_with_size() {
        assert_eq!(turret_range(0), 0..=3);
        assert_eq!(turret_range(4), 2..=8);
        assert_eq!(turret_range(10), 2..=16);
    }

    #[test]
    fn purpose_parses_aliases() {
        assert_eq!("Military".parse::<Purpose>().unwrap(), Purpose::Military);
        assert_eq!("civil".parse::<Purpose>().unwrap(), Purpose::Civilian);
        assert!("pirate".parse::<Purpose>().is_err());
    }
}
