//! QuickList: a doubly linked list of packed runs, with optional compression.
//!
//! This crate provides a list of byte-string and integer elements tuned for
//! long lists of small values. Elements are packed densely into per-node runs
//! whose size is bounded by a fill policy; interior nodes can be compressed
//! while the nodes nearest each end stay raw for cheap pushes and pops.

mod compact_arena;
mod compression;
mod config;
mod construction;
mod delete_operations;
mod error;
mod get_operations;
mod insert_operations;
mod iteration;
mod list_structure;
mod node;
mod packed_run;
mod types;
mod validation;

pub use compression::{Compressor, Lz4Compressor, MIN_COMPRESS_BYTES, MIN_COMPRESS_IMPROVE};
pub use config::{
    FillFactor, ListOptions, ListOptionsBuilder, DEFAULT_PACKED_THRESHOLD, FILL_MAX,
    MAX_PACKED_THRESHOLD, NODE_COUNT_LIMIT, SIZE_CLASSES, SIZE_SAFETY_LIMIT, UNBOUNDED_COUNT_CAP,
};
pub use error::{InitResult, ModifyResult, QuickListError, QuickListResult, ResultExt};
pub use get_operations::Entry;
pub use iteration::{ListIterator, ValueIterator};
pub use packed_run::{PackedRun, PackedRunIter, Value};
pub use types::{
    CompressedBlob, Container, Direction, Encoding, Node, NodeId, NodeSummary, QuickList, Where,
    NULL_NODE,
};
