//! DELETE operations for QuickList.
//!
//! This module contains every operation that removes elements: range delete,
//! pops at either end, single-entry delete (shared with the iterator) and
//! rotate. Nodes emptied by a delete are unlinked; nodes that merely shrank
//! are offered to their neighbours for merging.

use tracing::trace;

use crate::compression::Compressor;
use crate::error::{ModifyResult, QuickListError};
use crate::list_structure::MergeOutcome;
use crate::packed_run::Value;
use crate::types::{NodeId, QuickList, Where, NULL_NODE};

/// What happened to a node after one of its entries was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeleteOutcome {
    /// The node held only that entry and is gone.
    Removed { prev: NodeId, next: NodeId },
    /// The node survived; its remaining entries now start at `base` inside `target`.
    Shrunk(MergeOutcome),
}

impl<C: Compressor> QuickList<C> {
    // ============================================================================
    // PUBLIC DELETE OPERATIONS
    // ============================================================================

    /// Delete up to `count` elements starting at `start` (negative counts from the tail).
    ///
    /// The range is clamped to the end of the list. Returns how many elements
    /// were removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use quicklist::{ListOptions, QuickList};
    ///
    /// let mut list = QuickList::with_options(ListOptions::new(4, 0)).unwrap();
    /// for i in 0..40 {
    ///     list.push_tail(i.to_string()).unwrap();
    /// }
    /// assert_eq!(list.delete_range(36, 4).unwrap(), 4);
    /// assert_eq!(list.node_count(), 9);
    /// assert_eq!(list.delete_range(-2, 10).unwrap(), 2);
    /// assert_eq!(list.len(), 34);
    /// ```
    pub fn delete_range(&mut self, start: i64, count: usize) -> ModifyResult<usize> {
        if count == 0 {
            return Ok(0);
        }
        let position = self
            .absolute_index(start)
            .ok_or_else(|| QuickListError::index_out_of_range(start, self.count))?;
        let (mut id, mut offset) = self.locate(start)?;
        let mut extent = count.min(self.count - position);
        let removed = extent;
        self.mutated();

        let mut survivors = Vec::with_capacity(2);
        while extent > 0 && id != NULL_NODE {
            let next = self.next_of(id);
            let entries = self.node(id)?.entry_count();
            let delete = (entries - offset).min(extent);
            if offset == 0 && delete == entries {
                self.delete_node(id)?;
            } else {
                self.decompress_for_use(id)?;
                let node = self.node_mut(id)?;
                node.run_mut()?.delete_at(offset, delete);
                node.sync_sizes();
                self.count -= delete;
                survivors.push(id);
            }
            extent -= delete;
            id = next;
            offset = 0;
        }
        if survivors.is_empty() && id != NULL_NODE {
            // The range ended on a node boundary: offer the node after the gap.
            survivors.push(id);
        }

        let mut touched = Vec::with_capacity(4);
        for survivor in survivors {
            if self.nodes.contains(survivor) {
                touched.push(survivor);
                self.merge_around(survivor, &mut touched)?;
            }
        }
        trace!(start, removed, nodes = self.len, "deleted range");
        self.settle(&touched)?;
        Ok(removed)
    }

    /// Remove and return the element at the given end, or `None` when empty.
    pub fn pop(&mut self, whence: Where) -> ModifyResult<Option<Value>> {
        if self.count == 0 {
            return Ok(None);
        }
        let index = match whence {
            Where::Head => 0,
            Where::Tail => -1,
        };
        let entry = self.index(index)?;
        self.mutated();
        self.delete_entry_at(entry.node, entry.offset)?;
        Ok(Some(entry.into_value()))
    }

    pub fn pop_head(&mut self) -> ModifyResult<Option<Value>> {
        self.pop(Where::Head)
    }

    pub fn pop_tail(&mut self) -> ModifyResult<Option<Value>> {
        self.pop(Where::Tail)
    }

    /// Move the last element to the front.
    ///
    /// A PLAIN tail node is relinked at the head as a whole; otherwise the
    /// value is copied to the head and removed from the tail node.
    pub fn rotate(&mut self) -> ModifyResult<()> {
        if self.count <= 1 {
            return Ok(());
        }
        let tail = self.tail;
        if self.node(tail)?.is_plain() {
            self.mutated();
            let node = self.detach_node(tail)?;
            let head = self.head;
            let id = self.create_node(node);
            self.insert_node(head, id, false)?;
            return self.settle(&[head, id]);
        }

        let last = self.index(-1)?.into_value();
        self.push_head(last.to_bytes())?;
        let tail = self.tail;
        let offset = self.node(tail)?.entry_count() - 1;
        self.delete_entry_at(tail, offset)?;
        Ok(())
    }

    // ============================================================================
    // INTERNAL DELETE HELPERS
    // ============================================================================

    /// Delete entry `offset` of node `id`, unlinking the node if it empties and
    /// otherwise merging it with its neighbours where the fill allows.
    pub(crate) fn delete_entry_at(
        &mut self,
        id: NodeId,
        offset: usize,
    ) -> ModifyResult<DeleteOutcome> {
        let (entries, is_plain, prev, next) = {
            let node = self.node(id)?;
            (node.entry_count(), node.is_plain(), node.prev, node.next)
        };
        if offset >= entries {
            return Err(QuickListError::policy_violation(id, "delete offset past node end"));
        }

        if is_plain || entries == 1 {
            self.delete_node(id)?;
            self.settle(&[])?;
            return Ok(DeleteOutcome::Removed { prev, next });
        }

        self.decompress_for_use(id)?;
        let node = self.node_mut(id)?;
        node.run_mut()?.delete_at(offset, 1);
        node.sync_sizes();
        self.count -= 1;

        let mut touched = vec![id];
        let outcome = self.merge_around(id, &mut touched)?;
        self.settle(&touched)?;
        Ok(DeleteOutcome::Shrunk(outcome))
    }
}
