//! Validation and debugging utilities for QuickList.
//!
//! This module contains the invariant checker, debugging helpers and the
//! hooks tests use to assert the list is in shape after every operation.

use tracing::debug;

use crate::compression::Compressor;
use crate::error::{QuickListError, QuickListResult};
use crate::packed_run::PackedRun;
use crate::types::{Node, NodeId, Payload, QuickList, NULL_NODE};

// ============================================================================
// VALIDATION METHODS
// ============================================================================

impl<C: Compressor> QuickList<C> {
    /// Returns true if all list invariants hold.
    pub fn check_invariants(&self) -> bool {
        self.check_invariants_detailed().is_ok()
    }

    /// Check invariants with detailed error reporting.
    ///
    /// Fill is checked against the current options, so nodes built under an
    /// older, larger fill are reported too.
    pub fn check_invariants_detailed(&self) -> Result<(), String> {
        let ids = self.check_links()?;

        if ids.len() != self.len {
            return Err(format!("node count {} but {} nodes linked", self.len, ids.len()));
        }
        if self.nodes.len() != self.len {
            return Err(format!(
                "arena holds {} nodes but {} are linked",
                self.nodes.len(),
                self.len
            ));
        }

        let mut total = 0;
        for (index, &id) in ids.iter().enumerate() {
            let node = self.node(id).map_err(|e| e.to_string())?;
            self.check_node(id, node)?;
            self.check_depth(index, ids.len(), id, node)?;
            total += node.entry_count();
        }
        if total != self.count {
            return Err(format!("entry count {} but nodes hold {}", self.count, total));
        }
        Ok(())
    }

    /// Walk head to tail checking both link directions; returns the ids in order.
    fn check_links(&self) -> Result<Vec<NodeId>, String> {
        let mut ids = Vec::with_capacity(self.len);
        let mut prev = NULL_NODE;
        let mut id = self.head;
        while id != NULL_NODE {
            if ids.len() > self.len {
                return Err("forward walk does not terminate".to_string());
            }
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| format!("link to freed node {}", id))?;
            if node.prev != prev {
                return Err(format!("node {} prev is {} but expected {}", id, node.prev, prev));
            }
            ids.push(id);
            prev = id;
            id = node.next;
        }
        if prev != self.tail {
            return Err(format!("tail is {} but walk ended at {}", self.tail, prev));
        }
        Ok(ids)
    }

    fn check_node(&self, id: NodeId, node: &Node) -> Result<(), String> {
        if node.count == 0 {
            return Err(format!("node {} is empty", id));
        }
        match &node.payload {
            Payload::Plain(bytes) => {
                if !node.is_plain() || node.count != 1 || bytes.len() != node.sz {
                    return Err(format!("plain node {} has inconsistent bookkeeping", id));
                }
            }
            Payload::Packed(run) => {
                if node.is_plain() {
                    return Err(format!("node {} is PLAIN but holds a packed run", id));
                }
                if run.entry_count() != node.entry_count() || run.byte_size() != node.sz {
                    return Err(format!(
                        "node {} records {} entries / {} bytes, run has {} / {}",
                        id,
                        node.count,
                        node.sz,
                        run.entry_count(),
                        run.byte_size()
                    ));
                }
            }
            Payload::Compressed(blob) => {
                if blob.original_size != node.sz {
                    return Err(format!(
                        "node {} compressed from {} bytes, records {}",
                        id, blob.original_size, node.sz
                    ));
                }
                let data = self
                    .compressor
                    .decompress(&blob.data, blob.original_size)
                    .map_err(|e| format!("node {}: {}", id, e))?;
                let run = PackedRun::from_bytes(data).map_err(|e| format!("node {}: {}", id, e))?;
                if run.entry_count() != node.entry_count() {
                    return Err(format!(
                        "node {} compressed run holds {} entries, records {}",
                        id,
                        run.entry_count(),
                        node.count
                    ));
                }
            }
        }
        if !node.within_fill(self.options.fill) {
            return Err(format!(
                "node {} with {} entries / {} bytes exceeds fill {}",
                id,
                node.count,
                node.sz,
                self.options.fill.to_raw()
            ));
        }
        Ok(())
    }

    fn check_depth(&self, index: usize, len: usize, id: NodeId, node: &Node) -> Result<(), String> {
        if node.recompress {
            return Err(format!("node {} left decompressed for use", id));
        }
        let depth = usize::from(self.options.compress_depth);
        if depth == 0 {
            if node.is_compressed() {
                return Err(format!("node {} compressed with compression disabled", id));
            }
            return Ok(());
        }
        let in_window = index < depth || index + depth >= len;
        if in_window && node.is_compressed() {
            return Err(format!("node {} at position {} must stay raw", id, index));
        }
        if !in_window && !node.is_plain() && !node.is_compressed() && !node.attempted_compress {
            return Err(format!("interior node {} at position {} was never compressed", id, index));
        }
        Ok(())
    }

    /// Alias for check_invariants_detailed
    pub fn validate(&self) -> Result<(), String> {
        self.check_invariants_detailed()
    }

    /// Run the invariant checker and report a failure as a policy violation.
    pub fn validate_for_operation(&self, operation: &str) -> QuickListResult<()> {
        self.check_invariants_detailed()
            .map_err(|details| {
                QuickListError::PolicyViolation(format!("after {}: {}", operation, details))
            })
    }

    // ============================================================================
    // DEBUGGING HELPERS
    // ============================================================================

    /// Entry count of each node, head to tail.
    pub fn node_sizes(&self) -> Vec<usize> {
        self.node_summaries().iter().map(|s| s.entry_count).collect()
    }

    /// Log the node chain at debug level.
    pub fn print_node_chain(&self) {
        debug!(entries = self.count, nodes = self.len, "quicklist chain");
        for summary in self.node_summaries() {
            debug!(
                node = summary.id,
                entries = summary.entry_count,
                bytes = summary.byte_size,
                encoding = ?summary.encoding,
                container = ?summary.container,
                compressed = ?summary.compressed_size,
                "  node"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ListOptions;
    use crate::types::{Payload, QuickList, NULL_NODE};

    fn sample() -> QuickList {
        let mut list = QuickList::with_options(ListOptions::new(4, 1)).unwrap();
        for i in 0..20 {
            list.push_tail(format!("validation-{}", i)).unwrap();
        }
        list
    }

    #[test]
    fn test_valid_list_passes() {
        let list = sample();
        assert!(list.check_invariants());
        assert_eq!(list.node_sizes(), [4, 4, 4, 4, 4]);
        list.validate_for_operation("setup").unwrap();
        list.print_node_chain();
    }

    #[test]
    fn test_detects_count_mismatch() {
        let mut list = sample();
        list.count += 1;
        assert!(list.check_invariants_detailed().unwrap_err().contains("entry count"));
    }

    #[test]
    fn test_detects_broken_link() {
        let mut list = sample();
        let second = list.next_of(list.head);
        list.nodes.get_mut(second).unwrap().prev = NULL_NODE;
        assert!(!list.check_invariants());
    }

    #[test]
    fn test_detects_oversized_node() {
        let mut list = sample();
        list.set_fill(2);
        let err = list.validate_for_operation("set_fill").unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_detects_raw_window_violation() {
        let mut list = sample();
        let head = list.head;
        let node = list.nodes.get_mut(head).unwrap();
        node.payload = Payload::Compressed(crate::types::CompressedBlob {
            data: Vec::new(),
            original_size: node.sz,
        });
        assert!(list.check_invariants_detailed().is_err());
    }
}
