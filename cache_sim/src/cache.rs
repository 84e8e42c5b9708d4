//! FIFO cache model

use std::{collections::VecDeque, fmt};

use serde::Serialize;

use crate::{
    addr::{Addr, BlockId},
    config::{CacheConfig, Geometry, LookupScope, MappingDirection, Result},
};

/// Content of one cache line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    #[default]
    Empty,
    Resident(BlockId),
}

impl Slot {
    pub fn is_valid(&self) -> bool {
        matches!(self, Slot::Resident(_))
    }
    pub fn block(&self) -> Option<BlockId> {
        match self {
            Slot::Empty => None,
            Slot::Resident(b) => Some(*b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Hit { slot: usize },
    Miss { slot: usize, evicted: Option<BlockId> },
}

impl Access {
    pub fn is_hit(&self) -> bool {
        matches!(self, Access::Hit { .. })
    }
    pub fn slot(&self) -> usize {
        match self {
            Access::Hit { slot } | Access::Miss { slot, .. } => *slot,
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Hit { slot } => write!(f, "hit at line {slot:03}"),
            Access::Miss {
                slot,
                evicted: None,
            } => write!(f, "miss, filled line {slot:03}"),
            Access::Miss {
                slot,
                evicted: Some(old),
            } => write!(f, "miss, replaced {old} at line {slot:03}"),
        }
    }
}

/// admission order of the lines of one set.
///
/// Holds the positions of lines filled at least once, oldest first.
#[derive(Debug, Default)]
struct FifoOrder {
    queue: VecDeque<usize>,
}

impl FifoOrder {
    fn admit(&mut self, slot: usize) {
        self.queue.push_back(slot);
    }
    /// takes the oldest line and re-admits it at the back.
    fn rotate(&mut self) -> Option<usize> {
        let victim = self.queue.pop_front()?;
        self.queue.push_back(victim);
        Some(victim)
    }
}

pub struct Cache {
    geometry: Geometry,
    mapping: MappingDirection,
    lookup: LookupScope,
    /// set `i` owns `slots[i * set_size..(i + 1) * set_size]`
    slots: Vec<Slot>,
    order: Vec<FifoOrder>,
}

impl Cache {
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let geometry = config.validate()?;
        Ok(Self {
            geometry,
            mapping: config.mapping,
            lookup: config.lookup,
            slots: vec![Slot::Empty; geometry.total_lines],
            order: (0..geometry.set_count).map(|_| FifoOrder::default()).collect(),
        })
    }
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
    pub fn set_of(&self, block: BlockId) -> usize {
        self.mapping.set_index(block, self.geometry.set_count)
    }

    fn set_range(&self, set: usize) -> std::ops::Range<usize> {
        let begin = set * self.geometry.set_size;
        begin..begin + self.geometry.set_size
    }

    fn find(&self, block: BlockId, set: usize) -> Option<usize> {
        let range = match self.lookup {
            LookupScope::Global => 0..self.slots.len(),
            LookupScope::Set => self.set_range(set),
        };
        let target = Slot::Resident(block);
        range.into_iter().find(|&i| self.slots[i] == target)
    }

    /// looks `addr` up and installs its block on a miss.
    pub fn access(&mut self, addr: Addr) -> Access {
        let block = addr.block(self.geometry.offset_bits);
        let set = self.set_of(block);
        if let Some(slot) = self.find(block, set) {
            return Access::Hit { slot };
        }
        let range = self.set_range(set);
        let free = range.clone().find(|&i| self.slots[i] == Slot::Empty);
        let (slot, evicted) = match free {
            Some(slot) => {
                self.order[set].admit(slot);
                (slot, None)
            }
            None => {
                let slot = self.order[set]
                    .rotate()
                    .expect("full set has queued lines");
                (slot, self.slots[slot].block())
            }
        };
        if let Some(old) = evicted {
            log::trace!("set {set}: evict {old} from line {slot:03} for {block}");
        }
        self.slots[slot] = Slot::Resident(block);
        Access::Miss { slot, evicted }
    }
}
