use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{what} must be greater than zero")]
    Zero { what: &'static str },
    #[error("line size {line_size} does not divide total size {total_size}")]
    LineSizeNotDivisor { total_size: u32, line_size: u32 },
    #[error("set size {set_size} does not divide the number of lines {total_lines}")]
    SetSizeNotDivisor { total_lines: u32, set_size: u32 },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// direction in which a block identifier is folded onto a set index.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingDirection {
    /// `block mod sets`
    #[default]
    Forward,
    /// `sets - 1 - (block mod sets)`
    Reverse,
}

/// where a lookup searches for a resident block.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupScope {
    /// every line of the cache
    #[default]
    Global,
    /// only the lines of the mapped set
    Set,
}

impl fmt::Display for MappingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingDirection::Forward => write!(f, "forward"),
            MappingDirection::Reverse => write!(f, "reverse"),
        }
    }
}

impl fmt::Display for LookupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupScope::Global => write!(f, "global"),
            LookupScope::Set => write!(f, "set"),
        }
    }
}

/// Parameters of a simulated cache, as given by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// capacity in bytes
    pub total_size: u32,
    /// bytes per line
    pub line_size: u32,
    /// lines per set
    pub set_size: u32,
    #[serde(default)]
    pub mapping: MappingDirection,
    #[serde(default)]
    pub lookup: LookupScope,
}

impl CacheConfig {
    pub fn new(total_size: u32, line_size: u32, set_size: u32) -> Self {
        Self {
            total_size,
            line_size,
            set_size,
            mapping: Default::default(),
            lookup: Default::default(),
        }
    }
    pub fn with_mapping(self, mapping: MappingDirection) -> Self {
        Self { mapping, ..self }
    }
    pub fn with_lookup(self, lookup: LookupScope) -> Self {
        Self { lookup, ..self }
    }

    /// checks the divisibility invariants and derives the cache shape.
    pub fn validate(&self) -> Result<Geometry> {
        macro_rules! non_zero {
            ($field:ident => $what:literal) => {
                if self.$field == 0 {
                    return Err(ConfigError::Zero { what: $what });
                }
            };
        }
        non_zero!(total_size => "total size");
        non_zero!(line_size => "line size");
        non_zero!(set_size => "set size");
        if self.total_size % self.line_size != 0 {
            return Err(ConfigError::LineSizeNotDivisor {
                total_size: self.total_size,
                line_size: self.line_size,
            });
        }
        let total_lines = self.total_size / self.line_size;
        if total_lines % self.set_size != 0 {
            return Err(ConfigError::SetSizeNotDivisor {
                total_lines,
                set_size: self.set_size,
            });
        }
        if !self.line_size.is_power_of_two() {
            log::warn!(
                "line size {} is not a power of two; {} offset bits are discarded",
                self.line_size,
                self.line_size.ilog2()
            );
        }
        Ok(Geometry {
            total_lines: total_lines as usize,
            set_size: self.set_size as usize,
            set_count: (total_lines / self.set_size) as usize,
            offset_bits: self.line_size.ilog2(),
        })
    }
}

/// Shape of a validated cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub total_lines: usize,
    pub set_size: usize,
    pub set_count: usize,
    /// `floor(log2(line_size))`
    pub offset_bits: u32,
}

impl Geometry {
    pub fn organization(&self) -> Organization {
        if self.set_count == 1 {
            Organization::FullyAssociative
        } else if self.set_size == 1 {
            Organization::DirectMapped
        } else {
            Organization::SetAssociative { ways: self.set_size }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Organization {
    DirectMapped,
    SetAssociative { ways: usize },
    FullyAssociative,
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Organization::DirectMapped => write!(f, "direct-mapped"),
            Organization::SetAssociative { ways } => write!(f, "{ways}-way set-associative"),
            Organization::FullyAssociative => write!(f, "fully associative"),
        }
    }
}
