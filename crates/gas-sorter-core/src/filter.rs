//! Gas selection inferred from names.
//!
//! There is no gas-type registry on the host side: sorters carry placeholder
//! "gas items" in their filter lists and tanks only expose definition names.
//! Both are classified here by case-insensitive substring match so callers
//! never look at the strings themselves.

use crate::block::ItemFilter;
use serde::{Deserialize, Serialize};

const OXYGEN: &str = "oxygen";
const HYDROGEN: &str = "hydrogen";

/// Which gases a sorter lets through, derived from its item filter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// No gas items in the filter list. No restriction.
    #[default]
    None,
    OxygenOnly,
    HydrogenOnly,
    /// Both gas items present. No restriction.
    Both,
}

impl FilterMode {
    /// Whether a transfer between tanks of these gas types is allowed.
    pub fn admits(self, forward: GasType, backward: GasType) -> bool {
        match self {
            FilterMode::None | FilterMode::Both => true,
            FilterMode::OxygenOnly => forward == GasType::Oxygen && backward == GasType::Oxygen,
            FilterMode::HydrogenOnly => {
                forward == GasType::Hydrogen && backward == GasType::Hydrogen
            }
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FilterMode::None => "None",
            FilterMode::OxygenOnly => "OxygenOnly",
            FilterMode::HydrogenOnly => "HydrogenOnly",
            FilterMode::Both => "Both",
        };
        f.write_str(s)
    }
}

/// The gas a tank holds, as far as its names tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GasType {
    #[default]
    Unknown,
    Oxygen,
    Hydrogen,
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_ascii_lowercase().contains(needle_lower)
}

/// Infer the gas filter mode from a sorter's filter list.
///
/// Entries with an empty subtype are skipped. Never fails.
pub fn infer_filter_mode(filters: &[ItemFilter]) -> FilterMode {
    let mut has_oxygen = false;
    let mut has_hydrogen = false;

    for filter in filters {
        let subtype = filter.subtype.as_str();
        if subtype.is_empty() {
            continue;
        }
        has_oxygen |= contains_ignore_case(subtype, OXYGEN);
        has_hydrogen |= contains_ignore_case(subtype, HYDROGEN);
    }

    match (has_oxygen, has_hydrogen) {
        (true, true) => FilterMode::Both,
        (true, false) => FilterMode::OxygenOnly,
        (false, true) => FilterMode::HydrogenOnly,
        (false, false) => FilterMode::None,
    }
}

/// Classify a tank by its subtype, falling back to its display name.
///
/// Hydrogen is tested first: some modded subtypes mention both.
pub fn classify_gas(subtype: &str, display_name: &str) -> GasType {
    for name in [subtype, display_name] {
        if name.is_empty() {
            continue;
        }
        if contains_ignore_case(name, HYDROGEN) {
            return GasType::Hydrogen;
        }
        if contains_ignore_case(name, OXYGEN) {
            return GasType::Oxygen;
        }
    }
    GasType::Unknown
}
