//! Text for the sorter's info panel.

use crate::filter::FilterMode;

/// Render the Gas Control section of a sorter's info panel.
///
/// Every line ends with `\n` so hosts can append it to their own text.
pub fn render_custom_info(enabled: bool, mode: FilterMode) -> String {
    let mut out = String::from("Gas Control:\n");
    if !enabled {
        out.push_str("  Status: DISABLED\n");
        out.push_str("  Mode: Vanilla gas flow\n");
        return out;
    }

    out.push_str("  Status: ENABLED\n");
    out.push_str("  Mode: Directional valve\n");
    out.push_str("  Gas Filter: ");
    out.push_str(match mode {
        FilterMode::OxygenOnly => "Oxygen only",
        FilterMode::HydrogenOnly => "Hydrogen only",
        FilterMode::Both => "Oxygen + Hydrogen",
        FilterMode::None => "(none / items only)",
    });
    out.push('\n');
    out
}
