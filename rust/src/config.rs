//! List options and the fill-factor policy.
//!
//! The fill factor bounds how much a single node may hold, either by entry
//! count or by payload bytes. The helpers here are pure functions over node
//! sizes so the list can ask "may this node grow?" or "may these two nodes
//! merge?" without touching any payload.

use crate::error::{InitResult, QuickListError};
use crate::packed_run::PackedRun;

/// Byte limits selected by negative fill values: -1 => 4 KiB ... -5 => 64 KiB.
pub const SIZE_CLASSES: [usize; 5] = [4096, 8192, 16384, 32768, 65536];

/// Byte ceiling applied to count-based fills so tiny counts of huge entries stay bounded.
pub const SIZE_SAFETY_LIMIT: usize = 8192;

/// Entry ceiling for a count-based fill of 0 ("unbounded").
pub const UNBOUNDED_COUNT_CAP: usize = 64;

/// Largest positive fill accepted; larger values are clamped.
pub const FILL_MAX: i32 = (1 << 15) - 1;

/// Structural ceiling on entries per node (the count field is 16 bits).
pub const NODE_COUNT_LIMIT: usize = u16::MAX as usize;

/// Default packed threshold: the largest size class.
pub const DEFAULT_PACKED_THRESHOLD: usize = 65536;

/// Packed thresholds at or above this are rejected.
pub const MAX_PACKED_THRESHOLD: usize = u32::MAX as usize - (1 << 20) + 1;

/// Per-node fill policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillFactor {
    /// At most this many entries per node; 0 means "unbounded", capped at [`UNBOUNDED_COUNT_CAP`].
    Count(u16),
    /// At most `SIZE_CLASSES[class]` payload bytes per node.
    Size(u8),
}

impl FillFactor {
    /// Decode the signed fill parameter, clamping out-of-range values.
    pub fn from_raw(fill: i32) -> Self {
        if fill >= 0 {
            FillFactor::Count(fill.min(FILL_MAX) as u16)
        } else {
            let class = (fill.unsigned_abs() as usize - 1).min(SIZE_CLASSES.len() - 1);
            FillFactor::Size(class as u8)
        }
    }

    /// The signed fill parameter this policy corresponds to.
    pub fn to_raw(self) -> i32 {
        match self {
            FillFactor::Count(n) => i32::from(n),
            FillFactor::Size(class) => -(i32::from(class) + 1),
        }
    }

    /// `(byte limit, entry limit)` for a node under this policy.
    pub fn limits(self) -> (usize, usize) {
        match self {
            FillFactor::Count(0) => (SIZE_SAFETY_LIMIT, UNBOUNDED_COUNT_CAP),
            FillFactor::Count(n) => (SIZE_SAFETY_LIMIT, usize::from(n)),
            FillFactor::Size(class) => {
                let class = usize::from(class).min(SIZE_CLASSES.len() - 1);
                (SIZE_CLASSES[class], NODE_COUNT_LIMIT)
            }
        }
    }
}

impl Default for FillFactor {
    fn default() -> Self {
        FillFactor::Size(1)
    }
}

/// True when a node of `size` bytes holding `count` entries violates `fill`.
pub fn node_exceeds_limit(fill: FillFactor, size: usize, count: usize) -> bool {
    let (size_limit, count_limit) = fill.limits();
    size > size_limit || count > count_limit
}

/// True when `value`, once encoded into a run, is too large to pack and needs
/// its own PLAIN node.
pub fn is_large_element(value: &[u8], packed_threshold: usize) -> bool {
    PackedRun::entry_size(value) > packed_threshold
}

/// Options controlling node sizing and compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    /// Fill policy for packed nodes.
    pub fill: FillFactor,
    /// Nodes kept uncompressed at each end; 0 disables compression.
    pub compress_depth: u16,
    /// Elements whose encoded size exceeds this are stored unpacked in PLAIN nodes.
    pub packed_threshold: usize,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            fill: FillFactor::default(),
            compress_depth: 0,
            packed_threshold: DEFAULT_PACKED_THRESHOLD,
        }
    }
}

impl ListOptions {
    /// Create a new options builder
    pub fn builder() -> ListOptionsBuilder {
        ListOptionsBuilder::default()
    }

    /// Options with a raw fill value and compression depth.
    pub fn new(fill: i32, compress_depth: u16) -> Self {
        Self {
            fill: FillFactor::from_raw(fill),
            compress_depth,
            ..Self::default()
        }
    }

    /// Reject settings the list cannot honour.
    pub fn validate(&self) -> InitResult<()> {
        validate_packed_threshold(self.packed_threshold)?;
        if let FillFactor::Size(class) = self.fill {
            if usize::from(class) >= SIZE_CLASSES.len() {
                return Err(QuickListError::invalid_option(
                    "fill",
                    &format!("size class {} not in table", class),
                ));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_packed_threshold(threshold: usize) -> InitResult<()> {
    if threshold == 0 || threshold >= MAX_PACKED_THRESHOLD {
        return Err(QuickListError::invalid_option(
            "packed_threshold",
            &format!("{} not in 1..{}", threshold, MAX_PACKED_THRESHOLD),
        ));
    }
    Ok(())
}

/// Builder for ListOptions
#[derive(Default)]
pub struct ListOptionsBuilder {
    options: ListOptions,
}

impl ListOptionsBuilder {
    /// Set the fill from its signed form (positive = entries, negative = size class).
    pub fn fill(mut self, fill: i32) -> Self {
        self.options.fill = FillFactor::from_raw(fill);
        self
    }

    pub fn fill_factor(mut self, fill: FillFactor) -> Self {
        self.options.fill = fill;
        self
    }

    pub fn compress_depth(mut self, depth: u16) -> Self {
        self.options.compress_depth = depth;
        self
    }

    pub fn packed_threshold(mut self, threshold: usize) -> Self {
        self.options.packed_threshold = threshold;
        self
    }

    /// Build the options, validating them.
    pub fn build(self) -> InitResult<ListOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}
