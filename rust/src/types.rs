//! Core types and data structures for QuickList.
//!
//! This module contains the list itself, its node type, the payload sum type
//! and the small enums describing node state and list positions.

use crate::compact_arena::CompactArena;
use crate::compression::{Compressor, Lz4Compressor};
use crate::config::ListOptions;
use crate::packed_run::PackedRun;

pub use crate::compact_arena::{NodeId, NULL_NODE};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// A doubly linked list of packed runs.
///
/// Each node stores a run of small elements in one contiguous buffer, which
/// keeps per-element overhead low for long lists. Interior nodes may be held
/// compressed; the `compress_depth` nodes nearest each end are always kept
/// uncompressed so head and tail operations never pay for decompression.
///
/// # Examples
///
/// ```
/// use quicklist::{ListOptions, QuickList, Value};
///
/// let mut list = QuickList::with_options(ListOptions::new(4, 1)).unwrap();
/// for v in ["a", "b", "c", "d", "e"] {
///     list.push_tail(v.as_bytes()).unwrap();
/// }
/// assert_eq!(list.len(), 5);
/// assert_eq!(list.node_count(), 2);
/// assert_eq!(list.index(-1).unwrap().value(), &Value::from("e"));
/// ```
///
/// # Performance Characteristics
///
/// - **Push / pop at either end**: O(node size)
/// - **Index lookup**: O(nodes walked from the nearer end + node size)
/// - **Range delete**: O(nodes spanned)
/// - **Iteration**: O(n), decompressing each cold node once
#[derive(Debug, Clone)]
pub struct QuickList<C: Compressor = Lz4Compressor> {
    pub(crate) head: NodeId,
    pub(crate) tail: NodeId,
    /// Total entries across all nodes.
    pub(crate) count: usize,
    /// Number of linked nodes.
    pub(crate) len: usize,
    pub(crate) options: ListOptions,
    pub(crate) nodes: CompactArena<Node>,
    pub(crate) compressor: C,
    /// Bumped by every mutation; entries remember the version they were read at.
    pub(crate) version: u64,
}

/// One link of the list.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub(crate) prev: NodeId,
    pub(crate) next: NodeId,
    pub(crate) payload: Payload,
    /// Logical entry count, valid even while compressed.
    pub(crate) count: u16,
    /// Logical (uncompressed) payload size in bytes.
    pub(crate) sz: usize,
    pub(crate) container: Container,
    /// Decompressed temporarily; compress again once the reader is done.
    pub(crate) recompress: bool,
    /// Last compression attempt did not shrink the payload.
    pub(crate) attempted_compress: bool,
}

/// Node payload: exactly one representation at a time.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Uncompressed packed run.
    Packed(PackedRun),
    /// A single oversized element stored as-is.
    Plain(Vec<u8>),
    /// Compressed packed run.
    Compressed(CompressedBlob),
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Packed(PackedRun::new())
    }
}

/// Compressed bytes of a packed run plus the size they expand to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedBlob {
    pub(crate) data: Vec<u8>,
    pub(crate) original_size: usize,
}

impl CompressedBlob {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn original_size(&self) -> usize {
        self.original_size
    }
}

// ============================================================================
// ENUMS
// ============================================================================

/// Whether a node's payload is currently stored compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Raw,
    Compressed,
}

/// How a node stores its elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Container {
    /// Many elements in a packed run.
    #[default]
    Packed,
    /// Exactly one oversized element, unpacked.
    Plain,
}

/// Iteration direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Head to tail.
    Forward,
    /// Tail to head.
    Backward,
}

/// End of the list for push and pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Where {
    Head,
    Tail,
}

/// Snapshot of one node's bookkeeping, for inspection and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSummary {
    pub id: NodeId,
    pub entry_count: usize,
    pub byte_size: usize,
    pub encoding: Encoding,
    pub container: Container,
    pub attempted_compress: bool,
    /// Size of the compressed payload, when compressed.
    pub compressed_size: Option<usize>,
}
