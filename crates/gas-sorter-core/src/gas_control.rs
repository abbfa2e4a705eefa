//! The per-sorter Gas Control switch, persisted in the block's free text.

use crate::custom_data::{GAS_CONTROL_KEY, encode_flag, find_value, parse_flag, set_value};
use crate::host::{HostError, World};
use crate::id::BlockId;

/// Read the switch from raw free text. Absent or malformed means off.
pub fn gas_control_in_text(text: &str) -> bool {
    find_value(text, GAS_CONTROL_KEY).is_some_and(parse_flag)
}

/// Whether Gas Control is on for `block`. Unknown blocks read as off.
pub fn is_gas_control_enabled<W: World + ?Sized>(world: &W, block: BlockId) -> bool {
    world
        .custom_data(block)
        .is_some_and(|text| gas_control_in_text(&text))
}

/// Turn Gas Control on or off for `block`, preserving unrelated text.
pub fn set_gas_control_enabled<W: World + ?Sized>(
    world: &mut W,
    block: BlockId,
    enabled: bool,
) -> Result<(), HostError> {
    let current = world
        .custom_data(block)
        .ok_or(HostError::BlockNotFound(block))?;
    let updated = set_value(&current, GAS_CONTROL_KEY, encode_flag(enabled));
    world.set_custom_data(block, updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Direction, GridPosition};
    use crate::test_utils::TestWorld;

    #[test]
    fn default_is_off() {
        let mut world = TestWorld::new();
        let grid = world.add_grid();
        let sorter = world.add_sorter(grid, GridPosition::new(0, 0, 0), Direction::Forward);
        assert!(!is_gas_control_enabled(&world, sorter));
    }

    #[test]
    fn unknown_block_is_off_and_cannot_be_set() {
        let mut world = TestWorld::new();
        assert!(!is_gas_control_enabled(&world, BlockId(999)));
        assert_eq!(
            set_gas_control_enabled(&mut world, BlockId(999), true),
            Err(HostError::BlockNotFound(BlockId(999)))
        );
    }

    #[test]
    fn set_then_read_round_trip() {
        let mut world = TestWorld::new();
        let grid = world.add_grid();
        let sorter = world.add_sorter(grid, GridPosition::new(0, 0, 0), Direction::Forward);

        set_gas_control_enabled(&mut world, sorter, true).unwrap();
        assert!(is_gas_control_enabled(&world, sorter));

        set_gas_control_enabled(&mut world, sorter, false).unwrap();
        assert!(!is_gas_control_enabled(&world, sorter));
    }

    #[test]
    fn round_trip_with_unrelated_text_around_the_key() {
        let mut world = TestWorld::new();
        let grid = world.add_grid();
        let sorter = world.add_sorter(grid, GridPosition::new(0, 0, 0), Direction::Forward);
        world.set_custom_data(sorter, "[Other]Mode=fast\n".to_string()).unwrap();

        set_gas_control_enabled(&mut world, sorter, true).unwrap();
        let mut text = world.custom_data(sorter).unwrap();
        text.push_str("more notes\n");
        world.set_custom_data(sorter, text).unwrap();

        assert!(is_gas_control_enabled(&world, sorter));
        assert_eq!(
            world.custom_data(sorter).unwrap(),
            "[Other]Mode=fast\n[GasSorter]GasControl=1\nmore notes\n"
        );
    }

    #[test]
    fn explicit_zero_is_off() {
        assert!(!gas_control_in_text("[GasSorter]GasControl=0"));
        assert!(!gas_control_in_text("[GasSorter]GasControl=maybe"));
        assert!(gas_control_in_text("[GasSorter]GasControl=1"));
    }
}
