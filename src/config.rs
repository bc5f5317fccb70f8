//! Growable arena configuration.

use crate::align::is_power_of_two;
use crate::error::ConfigError;

/// Configuration for a growable [`Arena`](crate::arena::Arena).
///
/// Validated when the arena is built; immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct ArenaConfig {
    /// Capacity in bytes of the first block, allocated eagerly.
    pub initial_capacity: usize,

    /// Multiplier applied to the youngest block's capacity when the arena
    /// needs a new block. Must be `>= 1.0` so block sizes never shrink,
    /// which keeps the chain at O(log(total_used)) blocks.
    pub growth_factor: f64,

    /// Alignment of every block requested from the system allocator.
    ///
    /// Requests with an alignment up to this value never need leading
    /// padding at the start of a fresh block.
    pub block_align: usize,
}

impl ArenaConfig {
    /// Default first block: one 4KiB page.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 4096;

    /// Default growth factor: doubling.
    pub const DEFAULT_GROWTH_FACTOR: f64 = 2.0;

    /// Default block alignment: enough for any primitive and SSE loads.
    pub const DEFAULT_BLOCK_ALIGN: usize = 16;

    /// Create a config with the given first-block capacity and default
    /// values for everything else.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
            block_align: Self::DEFAULT_BLOCK_ALIGN,
        }
    }

    /// Builder-style override of the growth factor.
    pub fn with_growth_factor(mut self, growth_factor: f64) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    /// Builder-style override of the block alignment.
    pub fn with_block_align(mut self, block_align: usize) -> Self {
        self.block_align = block_align;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !self.growth_factor.is_finite() || self.growth_factor < 1.0 {
            return Err(ConfigError::GrowthFactor(self.growth_factor));
        }
        if !is_power_of_two(self.block_align) {
            return Err(ConfigError::BlockAlign(self.block_align));
        }
        Ok(())
    }

    /// Capacity of the block that follows one of `last` bytes.
    ///
    /// Never smaller than `last`; saturates at `usize::MAX`.
    pub fn next_capacity(&self, last: usize) -> usize {
        let grown = (last as f64 * self.growth_factor).ceil();
        if grown >= usize::MAX as f64 {
            usize::MAX
        } else {
            (grown as usize).max(last)
        }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_CAPACITY)
    }
}
