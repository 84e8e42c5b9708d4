use crate::{addr::BlockId, config::MappingDirection};

impl MappingDirection {
    /// index of the set `block` is placed in, out of `set_count` sets.
    #[inline]
    pub fn set_index(self, block: BlockId, set_count: usize) -> usize {
        let folded = block.into_inner() as usize % set_count;
        match self {
            MappingDirection::Forward => folded,
            MappingDirection::Reverse => set_count - 1 - folded,
        }
    }
}
