//! Node-level operations for QuickList.
//!
//! A node only knows about its own payload: sizes, compression, splitting
//! its run in two and absorbing a neighbour's run. Linking nodes together
//! and deciding *when* to do any of this is the list's job.

use crate::compression::Compressor;
use crate::config::{is_large_element, node_exceeds_limit, FillFactor};
use crate::error::{QuickListError, QuickListResult};
use crate::packed_run::{PackedRun, Value};
use crate::types::{
    CompressedBlob, Container, Encoding, Node, NodeId, NodeSummary, Payload, NULL_NODE,
};

fn clamp_count(count: usize) -> u16 {
    debug_assert!(count <= usize::from(u16::MAX), "node count {} overflows", count);
    u16::try_from(count).unwrap_or(u16::MAX)
}

impl Node {
    /// A PACKED node holding `run`.
    pub(crate) fn new_packed(run: PackedRun) -> Self {
        Self {
            prev: NULL_NODE,
            next: NULL_NODE,
            count: clamp_count(run.entry_count()),
            sz: run.byte_size(),
            payload: Payload::Packed(run),
            container: Container::Packed,
            recompress: false,
            attempted_compress: false,
        }
    }

    /// A PLAIN node holding one oversized element.
    pub(crate) fn new_plain(value: Vec<u8>) -> Self {
        Self {
            prev: NULL_NODE,
            next: NULL_NODE,
            count: 1,
            sz: value.len(),
            payload: Payload::Plain(value),
            container: Container::Plain,
            recompress: false,
            attempted_compress: false,
        }
    }

    // ============================================================================
    // STATUS
    // ============================================================================

    pub fn entry_count(&self) -> usize {
        usize::from(self.count)
    }

    pub fn byte_size(&self) -> usize {
        self.sz
    }

    pub fn encoding(&self) -> Encoding {
        match self.payload {
            Payload::Compressed(_) => Encoding::Compressed,
            _ => Encoding::Raw,
        }
    }

    pub fn container(&self) -> Container {
        self.container
    }

    pub fn is_plain(&self) -> bool {
        self.container == Container::Plain
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.payload, Payload::Compressed(_))
    }

    pub(crate) fn summary(&self, id: NodeId) -> NodeSummary {
        NodeSummary {
            id,
            entry_count: self.entry_count(),
            byte_size: self.sz,
            encoding: self.encoding(),
            container: self.container,
            attempted_compress: self.attempted_compress,
            compressed_size: match &self.payload {
                Payload::Compressed(blob) => Some(blob.data.len()),
                _ => None,
            },
        }
    }

    // ============================================================================
    // FILL POLICY
    // ============================================================================

    /// True when `value` can be packed into this node without breaking `fill`.
    pub(crate) fn allows_insert(
        &self,
        fill: FillFactor,
        packed_threshold: usize,
        value: &[u8],
    ) -> bool {
        if self.is_plain() || is_large_element(value, packed_threshold) {
            return false;
        }
        let new_sz = self.sz + PackedRun::entry_size(value);
        !node_exceeds_limit(fill, new_sz, self.entry_count() + 1)
    }

    /// True when this node satisfies `fill`. A lone entry is always allowed.
    pub(crate) fn within_fill(&self, fill: FillFactor) -> bool {
        self.is_plain() || self.count <= 1 || !node_exceeds_limit(fill, self.sz, self.entry_count())
    }

    // ============================================================================
    // PAYLOAD ACCESS
    // ============================================================================

    /// The packed run, if this node is PACKED and currently uncompressed.
    pub(crate) fn run(&self) -> Option<&PackedRun> {
        match &self.payload {
            Payload::Packed(run) => Some(run),
            _ => None,
        }
    }

    /// Mutable packed run; changes must be followed by [`Node::sync_sizes`].
    pub(crate) fn run_mut(&mut self) -> QuickListResult<&mut PackedRun> {
        match &mut self.payload {
            Payload::Packed(run) => Ok(run),
            Payload::Plain(_) => Err(QuickListError::PolicyViolation(
                "packed access to a plain node".to_string(),
            )),
            Payload::Compressed(_) => Err(QuickListError::PolicyViolation(
                "packed access to a compressed node".to_string(),
            )),
        }
    }

    /// Refresh count and size after the run changed.
    pub(crate) fn sync_sizes(&mut self) {
        if let Payload::Packed(run) = &self.payload {
            self.count = clamp_count(run.entry_count());
            self.sz = run.byte_size();
        }
        self.attempted_compress = false;
    }

    /// Element at `offset`; the node must be uncompressed.
    pub(crate) fn value_at(&self, offset: usize) -> Option<Value> {
        match &self.payload {
            Payload::Packed(run) => run.get(offset),
            Payload::Plain(bytes) => (offset == 0).then(|| Value::Bytes(bytes.clone())),
            Payload::Compressed(_) => None,
        }
    }

    /// Every element in order; the node must be uncompressed.
    pub(crate) fn values(&self) -> Vec<Value> {
        match &self.payload {
            Payload::Packed(run) => run.values(),
            Payload::Plain(bytes) => vec![Value::Bytes(bytes.clone())],
            Payload::Compressed(_) => Vec::new(),
        }
    }

    // ============================================================================
    // COMPRESSION
    // ============================================================================

    /// Try to compress the payload. Returns true if the node is now compressed.
    ///
    /// PLAIN nodes are never compressed. When the compressor declines, the node
    /// stays raw and is flagged `attempted_compress`.
    pub(crate) fn compress<C: Compressor>(&mut self, compressor: &C) -> bool {
        if self.is_plain() {
            return false;
        }
        let compressed = match &self.payload {
            Payload::Packed(run) => compressor.compress(run.as_bytes()),
            _ => return self.is_compressed(),
        };
        self.recompress = false;
        match compressed {
            Some(data) => {
                self.payload = Payload::Compressed(CompressedBlob {
                    data,
                    original_size: self.sz,
                });
                self.attempted_compress = false;
                true
            }
            None => {
                self.attempted_compress = true;
                false
            }
        }
    }

    /// Restore the raw payload. Returns true if the node was compressed.
    pub(crate) fn decompress<C: Compressor>(&mut self, compressor: &C) -> QuickListResult<bool> {
        let data = match &self.payload {
            Payload::Compressed(blob) => compressor.decompress(&blob.data, blob.original_size)?,
            _ => return Ok(false),
        };
        self.payload = Payload::Packed(PackedRun::from_trusted(data, self.entry_count()));
        Ok(true)
    }

    /// Decompress for a short-lived reader, remembering to compress it again afterwards.
    pub(crate) fn decompress_for_use<C: Compressor>(
        &mut self,
        compressor: &C,
    ) -> QuickListResult<()> {
        if self.decompress(compressor)? {
            self.recompress = true;
        }
        Ok(())
    }

    // ============================================================================
    // SPLIT AND MERGE
    // ============================================================================

    /// Split the run around `offset`, returning the detached fragment as a new node.
    ///
    /// With `after`, this node keeps `[0, offset]` and the fragment gets the rest.
    /// Otherwise this node keeps `[offset, count)` and the fragment gets `[0, offset)`.
    /// Both halves come out raw.
    pub(crate) fn split_payload(&mut self, offset: usize, after: bool) -> QuickListResult<Node> {
        let run = self.run_mut()?;
        let fragment = if after {
            run.split_off(offset + 1)
        } else {
            let kept = run.split_off(offset);
            std::mem::replace(run, kept)
        };
        self.sync_sizes();
        self.recompress = false;
        Ok(Node::new_packed(fragment))
    }

    /// Append every entry of `other` (the right-hand neighbour) to this node.
    pub(crate) fn absorb(&mut self, other: Node) -> QuickListResult<()> {
        let mut tail = match other.payload {
            Payload::Packed(run) => run,
            _ => {
                return Err(QuickListError::PolicyViolation(
                    "merge with a plain or compressed node".to_string(),
                ))
            }
        };
        self.run_mut()?.append(&mut tail);
        self.sync_sizes();
        self.recompress = false;
        Ok(())
    }
}

/// True when two adjacent nodes may be merged under `fill`. Never across PLAIN nodes.
pub(crate) fn nodes_allow_merge(a: &Node, b: &Node, fill: FillFactor) -> bool {
    if a.is_plain() || b.is_plain() {
        return false;
    }
    !node_exceeds_limit(fill, a.sz + b.sz, a.entry_count() + b.entry_count())
}
