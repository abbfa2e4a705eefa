//! Property-based tests for the Gas Sorter core.
//!
//! Uses proptest to generate filter lists, free text and tank layouts, then
//! checks the invariants every scan must keep.

use gas_sorter_core::block::ItemFilter;
use gas_sorter_core::custom_data::{GAS_CONTROL_KEY, find_value, set_value};
use gas_sorter_core::filter::{FilterMode, infer_filter_mode};
use gas_sorter_core::fixed::Fixed64;
use gas_sorter_core::gas_control::gas_control_in_text;
use gas_sorter_core::grid::{Direction, GridPosition};
use gas_sorter_core::session::GasSorterSession;
use gas_sorter_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_subtype() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("OxygenGasItem".to_string()),
        Just("HydrogenGasItem".to_string()),
        Just("oxygen".to_string()),
        Just("HYDROGEN_bottle".to_string()),
        Just(String::new()),
        "[A-Za-z]{0,12}",
    ]
}

/// Free-text lines that never contain our key.
fn arb_unrelated_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}=[a-z0-9]{0,6}",
        "# [ -~]{0,20}",
        Just(String::new()),
        Just("[Other]Mode=fast".to_string()),
    ]
}

fn arb_ratio() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(1.0), 0.0..=1.0f64]
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Filter mode is fully determined by which gas names appear.
    #[test]
    fn filter_mode_matches_gas_names(subtypes in proptest::collection::vec(arb_subtype(), 0..6)) {
        let filters: Vec<ItemFilter> = subtypes.iter().map(|s| ItemFilter::gas(s)).collect();
        let has_o = subtypes.iter().any(|s| s.to_ascii_lowercase().contains("oxygen"));
        let has_h = subtypes.iter().any(|s| s.to_ascii_lowercase().contains("hydrogen"));
        let expected = match (has_o, has_h) {
            (true, true) => FilterMode::Both,
            (true, false) => FilterMode::OxygenOnly,
            (false, true) => FilterMode::HydrogenOnly,
            (false, false) => FilterMode::None,
        };
        prop_assert_eq!(infer_filter_mode(&filters), expected);
    }

    /// Setting the flag is read back regardless of surrounding text, and the
    /// surrounding lines survive untouched.
    #[test]
    fn gas_control_round_trip(
        before in proptest::collection::vec(arb_unrelated_line(), 0..5),
        after in proptest::collection::vec(arb_unrelated_line(), 0..5),
        on in any::<bool>(),
    ) {
        let mut text = String::new();
        for line in &before {
            text.push_str(line);
            text.push('\n');
        }
        let mut full = set_value(&text, GAS_CONTROL_KEY, if on { "1" } else { "0" });
        for line in &after {
            full.push_str(line);
            full.push('\n');
        }

        prop_assert_eq!(gas_control_in_text(&full), on);
        for line in before.iter().chain(after.iter()).filter(|l| !l.is_empty()) {
            prop_assert!(full.lines().any(|l| l == line.as_str()));
        }
    }

    /// Writing the same value twice changes nothing.
    #[test]
    fn set_value_is_idempotent(
        lines in proptest::collection::vec(arb_unrelated_line(), 0..6),
        value in "[01]",
    ) {
        let text = lines.join("\n");
        let once = set_value(&text, GAS_CONTROL_KEY, &value);
        let twice = set_value(&once, GAS_CONTROL_KEY, &value);
        prop_assert_eq!(find_value(&once, GAS_CONTROL_KEY), Some(value.as_str()));
        prop_assert_eq!(once, twice);
    }

    /// Over many scans, every transfer conserves the pair total and no ratio
    /// leaves [0, 1].
    #[test]
    fn transfers_conserve_and_stay_in_bounds(
        back in arb_ratio(),
        fwd in arb_ratio(),
        scans in 1..40u64,
    ) {
        let mut world = TestWorld::new();
        let grid = world.add_grid();
        let origin = GridPosition::new(0, 0, 0);
        let sorter = world.add_sorter(grid, origin, Direction::Left);
        world.enable_gas_control(sorter);
        let f = world.add_tank(grid, origin.step(Direction::Left), oxygen_tank(fwd));
        let b = world.add_tank(grid, origin.step(Direction::Right), oxygen_tank(back));
        let total = world.ratio(f) + world.ratio(b);
        let mut session = GasSorterSession::default();
        let mut chat = RecordingNotifier::new();

        for i in 1..=scans {
            session.on_tick(i * 30, &mut world, &mut chat);
            let (rf, rb) = (world.ratio(f), world.ratio(b));
            prop_assert!(rf >= Fixed64::ZERO && rf <= ratio(1.0));
            prop_assert!(rb >= Fixed64::ZERO && rb <= ratio(1.0));
            prop_assert_eq!(rf + rb, total);
        }
        prop_assert!(world.ratio(f) >= ratio(fwd));
    }
}
