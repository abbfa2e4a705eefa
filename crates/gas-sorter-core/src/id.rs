use serde::{Deserialize, Serialize};

/// Identifies a block (sorter, tank or anything else) across the whole world.
/// Stable for the lifetime of the block; cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u64);

/// Identifies a grid (a ship or station made of blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridId(pub u64);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

impl std::fmt::Display for GridId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "grid#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_id_equality() {
        assert_eq!(BlockId(7), BlockId(7));
        assert_ne!(BlockId(7), BlockId(8));
    }

    #[test]
    fn ids_are_ordered_for_btree_keys() {
        use std::collections::BTreeMap;
        let mut map = BTreeMap::new();
        map.insert(BlockId(3), "c");
        map.insert(BlockId(1), "a");
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec![BlockId(1), BlockId(3)]);
    }

    #[test]
    fn display_includes_kind() {
        assert_eq!(BlockId(42).to_string(), "block#42");
        assert_eq!(GridId(2).to_string(), "grid#2");
    }
}
