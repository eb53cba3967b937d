//! Construction and configuration logic for QuickList.
//!
//! This module contains the constructors, the default implementation and the
//! setters that change fill, compression depth and packed threshold on a live
//! list.

use tracing::debug;

use crate::compact_arena::CompactArena;
use crate::compression::{Compressor, Lz4Compressor};
use crate::config::{validate_packed_threshold, FillFactor, ListOptions};
use crate::error::{InitResult, ModifyResult};
use crate::packed_run::PackedRun;
use crate::types::{QuickList, NULL_NODE};

impl QuickList<Lz4Compressor> {
    /// Create an empty list with default options: 8 KiB nodes, no compression.
    ///
    /// # Examples
    ///
    /// ```
    /// use quicklist::QuickList;
    ///
    /// let list = QuickList::new();
    /// assert!(list.is_empty());
    /// assert_eq!(list.node_count(), 0);
    /// ```
    pub fn new() -> Self {
        Self::empty(ListOptions::default(), Lz4Compressor)
    }

    /// Create an empty list with the given options and LZ4 compression.
    ///
    /// # Arguments
    ///
    /// * `options` - Fill policy, compression depth and packed threshold
    ///
    /// # Returns
    ///
    /// Returns `Err(QuickListError::InvalidOption)` if the options fail validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use quicklist::{ListOptions, QuickList};
    ///
    /// let list = QuickList::with_options(ListOptions::new(-1, 2)).unwrap();
    /// assert_eq!(list.options().compress_depth, 2);
    /// ```
    pub fn with_options(options: ListOptions) -> InitResult<Self> {
        Self::with_compressor(options, Lz4Compressor)
    }

    /// Build a list holding every element of `run`, in order.
    pub fn from_packed_run(options: ListOptions, run: &PackedRun) -> InitResult<Self> {
        let mut list = Self::with_options(options)?;
        list.append_values_from_packed_run(run)?;
        Ok(list)
    }
}

impl<C: Compressor> QuickList<C> {
    /// Create an empty list that compresses cold nodes with `compressor`.
    pub fn with_compressor(options: ListOptions, compressor: C) -> InitResult<Self> {
        options.validate()?;
        Ok(Self::empty(options, compressor))
    }

    fn empty(options: ListOptions, compressor: C) -> Self {
        Self {
            head: NULL_NODE,
            tail: NULL_NODE,
            count: 0,
            len: 0,
            options,
            nodes: CompactArena::new(),
            compressor,
            version: 0,
        }
    }

    /// Current options.
    pub fn options(&self) -> ListOptions {
        self.options
    }

    /// Change the fill policy from its signed form. Existing nodes are not
    /// reshaped; later inserts and merges follow the new policy.
    pub fn set_fill(&mut self, fill: i32) {
        self.options.fill = FillFactor::from_raw(fill);
        debug!(fill = self.options.fill.to_raw(), "fill changed");
    }

    /// Change the compression depth and re-apply it to every node.
    pub fn set_compress_depth(&mut self, depth: u16) -> ModifyResult<()> {
        if depth == self.options.compress_depth {
            return Ok(());
        }
        self.options.compress_depth = depth;
        self.mutated();
        self.recompress_all()
    }

    /// Change fill and compression depth together.
    pub fn set_options(&mut self, fill: i32, depth: u16) -> ModifyResult<()> {
        self.set_fill(fill);
        self.set_compress_depth(depth)
    }

    /// Change the size above which elements get their own PLAIN node.
    pub fn set_packed_threshold(&mut self, threshold: usize) -> InitResult<()> {
        validate_packed_threshold(threshold)?;
        self.options.packed_threshold = threshold;
        Ok(())
    }
}

impl Default for QuickList<Lz4Compressor> {
    fn default() -> Self {
        Self::new()
    }
}
