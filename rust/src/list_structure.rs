//! List structure management operations for QuickList.
//!
//! This module contains everything that reshapes the chain of nodes: size
//! queries, clearing, linking and unlinking nodes, splitting and merging
//! them, and keeping the compression window in shape after each change.

use tracing::{debug, trace, warn};

use crate::compression::Compressor;
use crate::error::{QuickListError, QuickListResult};
use crate::node::nodes_allow_merge;
use crate::types::{Direction, Node, NodeId, QuickList, NULL_NODE};

/// Where the entries of a node ended up after [`QuickList::merge_around`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MergeOutcome {
    /// Node now holding the original entries.
    pub target: NodeId,
    /// Offset of the original first entry inside `target`.
    pub base: usize,
}

// ============================================================================
// LIST STRUCTURE OPERATIONS
// ============================================================================

impl<C: Compressor> QuickList<C> {
    /// Returns the number of elements in the list.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of nodes in the list.
    pub fn node_count(&self) -> usize {
        self.len
    }

    /// Remove every element. The options are kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = NULL_NODE;
        self.tail = NULL_NODE;
        self.count = 0;
        self.len = 0;
        self.mutated();
    }

    /// Record that the list changed; outstanding entries become stale.
    pub(crate) fn mutated(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    // ============================================================================
    // NODE ACCESS
    // ============================================================================

    pub(crate) fn node(&self, id: NodeId) -> QuickListResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| QuickListError::policy_violation(id, "dangling node id"))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> QuickListResult<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| QuickListError::policy_violation(id, "dangling node id"))
    }

    pub(crate) fn next_of(&self, id: NodeId) -> NodeId {
        self.nodes.get(id).map_or(NULL_NODE, |node| node.next)
    }

    pub(crate) fn prev_of(&self, id: NodeId) -> NodeId {
        self.nodes.get(id).map_or(NULL_NODE, |node| node.prev)
    }

    pub(crate) fn step(&self, id: NodeId, direction: Direction) -> NodeId {
        match direction {
            Direction::Forward => self.next_of(id),
            Direction::Backward => self.prev_of(id),
        }
    }

    pub(crate) fn entry_count_of(&self, id: NodeId) -> usize {
        self.nodes.get(id).map_or(0, Node::entry_count)
    }

    // ============================================================================
    // LINKING
    // ============================================================================

    /// Put `node` in the arena without linking it.
    pub(crate) fn create_node(&mut self, node: Node) -> NodeId {
        self.nodes.allocate(node)
    }

    /// Link the unlinked node `new` next to `old` (after it, or before it).
    /// `old` may be [`NULL_NODE`] only when the list has no nodes.
    pub(crate) fn insert_node(
        &mut self,
        old: NodeId,
        new: NodeId,
        after: bool,
    ) -> QuickListResult<()> {
        if self.len == 0 {
            let node = self.node_mut(new)?;
            node.prev = NULL_NODE;
            node.next = NULL_NODE;
            self.head = new;
            self.tail = new;
            self.len = 1;
            return Ok(());
        }

        if after {
            let old_next = self.node(old)?.next;
            {
                let node = self.node_mut(new)?;
                node.prev = old;
                node.next = old_next;
            }
            if let Some(next) = self.nodes.get_mut(old_next) {
                next.prev = new;
            }
            self.node_mut(old)?.next = new;
            if self.tail == old {
                self.tail = new;
            }
        } else {
            let old_prev = self.node(old)?.prev;
            {
                let node = self.node_mut(new)?;
                node.next = old;
                node.prev = old_prev;
            }
            if let Some(prev) = self.nodes.get_mut(old_prev) {
                prev.next = new;
            }
            self.node_mut(old)?.prev = new;
            if self.head == old {
                self.head = new;
            }
        }
        self.len += 1;
        Ok(())
    }

    /// Unlink `id` and free its slot, returning the node. Entry totals are the caller's job.
    pub(crate) fn detach_node(&mut self, id: NodeId) -> QuickListResult<Node> {
        let (prev, next) = {
            let node = self.node(id)?;
            (node.prev, node.next)
        };
        match self.nodes.get_mut(prev) {
            Some(node) => node.next = next,
            None => self.head = next,
        }
        match self.nodes.get_mut(next) {
            Some(node) => node.prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
        self.nodes
            .deallocate(id)
            .ok_or_else(|| QuickListError::policy_violation(id, "node vanished while detaching"))
    }

    /// Unlink `id` together with its entries.
    pub(crate) fn delete_node(&mut self, id: NodeId) -> QuickListResult<Node> {
        let node = self.detach_node(id)?;
        self.count -= node.entry_count();
        trace!(node = id, entries = node.entry_count(), "deleted node");
        Ok(node)
    }

    // ============================================================================
    // COMPRESSION WINDOW
    // ============================================================================

    /// Decompress `id` for a short read or edit; pair with [`QuickList::finish_use`].
    pub(crate) fn decompress_for_use(&mut self, id: NodeId) -> QuickListResult<()> {
        let compressor = &self.compressor;
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| QuickListError::policy_violation(id, "dangling node id"))?;
        node.decompress_for_use(compressor).map_err(|err| {
            warn!(node = id, error = %err, "failed to decompress node");
            err
        })
    }

    /// Compress `id` again if a reader decompressed it and it lies outside the window.
    pub(crate) fn finish_use(&mut self, id: NodeId) {
        let pending = self.nodes.get(id).map_or(false, |node| node.recompress);
        if !pending {
            return;
        }
        if self.in_depth_window(id) {
            if let Some(node) = self.nodes.get_mut(id) {
                node.recompress = false;
            }
        } else {
            self.compress_node(id);
        }
    }

    /// True when `id` is within `compress_depth` nodes of either end.
    pub(crate) fn in_depth_window(&self, id: NodeId) -> bool {
        let depth = usize::from(self.options.compress_depth);
        if depth == 0 {
            return true;
        }
        let (mut back, mut front) = (id, id);
        for _ in 0..depth {
            back = self.prev_of(back);
            front = self.next_of(front);
            if back == NULL_NODE || front == NULL_NODE {
                return true;
            }
        }
        false
    }

    fn compress_node(&mut self, id: NodeId) -> bool {
        let compressor = &self.compressor;
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        let compressed = node.compress(compressor);
        trace!(node = id, compressed, bytes = node.sz, "compression attempt");
        compressed
    }

    fn keep_raw(&mut self, id: NodeId) -> QuickListResult<()> {
        let compressor = &self.compressor;
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| QuickListError::policy_violation(id, "dangling node id"))?;
        node.decompress(compressor).map_err(|err| {
            warn!(node = id, error = %err, "failed to decompress node");
            err
        })?;
        node.recompress = false;
        node.attempted_compress = false;
        Ok(())
    }

    /// Restore the depth invariant after a structural change.
    ///
    /// Nodes within the window are made raw. Each node in `touched` that lies
    /// outside it is compressed, as are raw nodes pushed just past the window
    /// by this change. Ids in `touched` that were freed meanwhile are skipped.
    pub(crate) fn settle(&mut self, touched: &[NodeId]) -> QuickListResult<()> {
        let depth = usize::from(self.options.compress_depth);
        if depth == 0 {
            for &id in touched {
                if let Some(node) = self.nodes.get_mut(id) {
                    node.recompress = false;
                }
            }
            return Ok(());
        }

        let mut window = Vec::with_capacity(2 * depth.min(self.len));
        let (mut forward, mut reverse) = (self.head, self.tail);
        for _ in 0..depth {
            if forward == NULL_NODE {
                break;
            }
            window.push(forward);
            window.push(reverse);
            forward = self.next_of(forward);
            reverse = self.prev_of(reverse);
        }
        for &id in &window {
            self.keep_raw(id)?;
        }

        for &id in touched {
            if self.nodes.contains(id) && !window.contains(&id) {
                self.compress_node(id);
            }
        }

        // A change adds at most one node per touched id, so the window can only
        // have shifted that far.
        let reach = touched.len() + 1;
        for (start, direction) in [(forward, Direction::Forward), (reverse, Direction::Backward)] {
            let mut id = start;
            for _ in 0..reach {
                if id == NULL_NODE || window.contains(&id) {
                    break;
                }
                let stale = self
                    .nodes
                    .get(id)
                    .map_or(false, |n| {
                        !n.is_plain() && !n.is_compressed() && !n.attempted_compress
                    });
                if stale {
                    self.compress_node(id);
                }
                id = self.step(id, direction);
            }
        }
        Ok(())
    }

    /// Re-apply the compression policy to every node, after the depth changed.
    pub(crate) fn recompress_all(&mut self) -> QuickListResult<()> {
        let depth = usize::from(self.options.compress_depth);
        let len = self.len;
        let mut id = self.head;
        let mut index = 0;
        while id != NULL_NODE {
            let next = self.next_of(id);
            if depth == 0 || index < depth || index + depth >= len {
                self.keep_raw(id)?;
            } else if !self.node(id)?.is_compressed() {
                self.compress_node(id);
            }
            id = next;
            index += 1;
        }
        debug!(depth, nodes = len, "recompressed list");
        Ok(())
    }

    // ============================================================================
    // SPLIT AND MERGE
    // ============================================================================

    /// Split `id` around `offset` into a new, unlinked node (see [`Node::split_payload`]).
    /// Returns `None` when the detached fragment would be empty.
    pub(crate) fn split_node(
        &mut self,
        id: NodeId,
        offset: usize,
        after: bool,
    ) -> QuickListResult<Option<NodeId>> {
        self.decompress_for_use(id)?;
        let fragment = self.node_mut(id)?.split_payload(offset, after)?;
        if fragment.entry_count() == 0 {
            return Ok(None);
        }
        trace!(
            node = id,
            offset,
            after,
            moved = fragment.entry_count(),
            "split node"
        );
        Ok(Some(self.create_node(fragment)))
    }

    /// Merge the adjacent nodes `left` and `right` into `left`, if the fill allows.
    pub(crate) fn merge_nodes(
        &mut self,
        left: NodeId,
        right: NodeId,
    ) -> QuickListResult<Option<NodeId>> {
        let allowed = match (self.nodes.get(left), self.nodes.get(right)) {
            (Some(a), Some(b)) => a.next == right && nodes_allow_merge(a, b, self.options.fill),
            _ => false,
        };
        if !allowed {
            return Ok(None);
        }

        self.keep_raw(left)?;
        self.keep_raw(right)?;
        let absorbed = self.detach_node(right)?;
        trace!(left, right, entries = absorbed.entry_count(), "merged nodes");
        let fill = self.options.fill;
        let merged = self.node_mut(left)?;
        merged.absorb(absorbed)?;
        debug_assert!(merged.within_fill(fill), "merge produced an oversized node");
        Ok(Some(left))
    }

    /// Try merging the neighbourhood of `center`: its two left neighbours, its
    /// two right neighbours, then `center` with each side.
    ///
    /// Every node that grew is pushed onto `touched`.
    pub(crate) fn merge_around(
        &mut self,
        center: NodeId,
        touched: &mut Vec<NodeId>,
    ) -> QuickListResult<MergeOutcome> {
        let prev = self.prev_of(center);
        let prev_prev = self.prev_of(prev);
        let next = self.next_of(center);
        let next_next = self.next_of(next);

        if let Some(merged) = self.merge_nodes(prev_prev, prev)? {
            touched.push(merged);
        }
        if let Some(merged) = self.merge_nodes(next, next_next)? {
            touched.push(merged);
        }

        let left = self.prev_of(center);
        let left_count = self.entry_count_of(left);
        let mut outcome = match self.merge_nodes(left, center)? {
            Some(merged) => MergeOutcome {
                target: merged,
                base: left_count,
            },
            None => MergeOutcome {
                target: center,
                base: 0,
            },
        };
        let right = self.next_of(outcome.target);
        if let Some(merged) = self.merge_nodes(outcome.target, right)? {
            outcome.target = merged;
        }
        touched.push(outcome.target);
        Ok(outcome)
    }
}
