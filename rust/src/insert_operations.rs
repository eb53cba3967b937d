//! INSERT operations for QuickList.
//!
//! This module contains every operation that adds or overwrites elements:
//! pushes at either end, insertion next to an existing entry, positional
//! replace, and bulk appends from packed runs. Full nodes are split and the
//! neighbourhood re-merged so the fill policy holds afterwards.

use tracing::{debug, trace};

use crate::compression::Compressor;
use crate::config::{is_large_element, node_exceeds_limit};
use crate::error::{ModifyResult, QuickListError};
use crate::get_operations::Entry;
use crate::packed_run::PackedRun;
use crate::types::{Node, NodeId, Payload, QuickList, Where};

impl<C: Compressor> QuickList<C> {
    // ============================================================================
    // PUSH OPERATIONS
    // ============================================================================

    /// Add `value` before the first element.
    pub fn push_head(&mut self, value: impl AsRef<[u8]>) -> ModifyResult<()> {
        self.push(Where::Head, value)
    }

    /// Add `value` after the last element.
    ///
    /// # Examples
    ///
    /// ```
    /// use quicklist::{ListOptions, QuickList, Value};
    ///
    /// let mut list = QuickList::with_options(ListOptions::new(2, 0)).unwrap();
    /// list.push_tail("a").unwrap();
    /// list.push_tail("b").unwrap();
    /// list.push_tail("c").unwrap();
    /// assert_eq!(list.node_count(), 2);
    /// assert_eq!(list.to_vec().unwrap().last(), Some(&Value::from("c")));
    /// ```
    pub fn push_tail(&mut self, value: impl AsRef<[u8]>) -> ModifyResult<()> {
        self.push(Where::Tail, value)
    }

    /// Add `value` at the given end. Elements above the packed threshold get a PLAIN node.
    pub fn push(&mut self, whence: Where, value: impl AsRef<[u8]>) -> ModifyResult<()> {
        let value = value.as_ref();
        let after = whence == Where::Tail;
        let end = if after { self.tail } else { self.head };
        let fill = self.options.fill;
        let threshold = self.options.packed_threshold;
        self.mutated();

        let mut touched = vec![end];
        if is_large_element(value, threshold) {
            let id = self.create_node(Node::new_plain(value.to_vec()));
            self.insert_node(end, id, after)?;
            touched.push(id);
            debug!(node = id, bytes = value.len(), "stored large element in plain node");
        } else if self
            .nodes
            .get(end)
            .map_or(false, |node| node.allows_insert(fill, threshold, value))
        {
            self.decompress_for_use(end)?;
            let node = self.node_mut(end)?;
            let run = node.run_mut()?;
            if after {
                run.push_back(value);
            } else {
                run.push_front(value);
            }
            node.sync_sizes();
        } else {
            let id = self.create_node(Node::new_packed(PackedRun::from_values([value])));
            self.insert_node(end, id, after)?;
            touched.push(id);
        }
        self.count += 1;
        self.settle(&touched)
    }

    // ============================================================================
    // POSITIONAL INSERT
    // ============================================================================

    /// Insert `value` immediately before the element `entry` refers to.
    pub fn insert_before(&mut self, entry: &Entry, value: impl AsRef<[u8]>) -> ModifyResult<()> {
        self.check_entry(entry)?;
        self.mutated();
        self.insert_at_entry(entry.node, entry.offset, value.as_ref(), false)
    }

    /// Insert `value` immediately after the element `entry` refers to.
    ///
    /// # Examples
    ///
    /// ```
    /// use quicklist::{QuickList, Value};
    ///
    /// let mut list = QuickList::new();
    /// list.push_tail("a").unwrap();
    /// list.push_tail("c").unwrap();
    /// let a = list.index(0).unwrap();
    /// list.insert_after(&a, "b").unwrap();
    /// assert_eq!(list.get(1).unwrap(), Value::from("b"));
    /// // Entries read before a change are rejected afterwards.
    /// assert!(list.insert_after(&a, "z").is_err());
    /// ```
    pub fn insert_after(&mut self, entry: &Entry, value: impl AsRef<[u8]>) -> ModifyResult<()> {
        self.check_entry(entry)?;
        self.mutated();
        self.insert_at_entry(entry.node, entry.offset, value.as_ref(), true)
    }

    /// Insert `value` so that it ends up at position `index` (0..=len).
    pub fn insert(&mut self, index: usize, value: impl AsRef<[u8]>) -> ModifyResult<()> {
        if index == self.count {
            return self.push_tail(value);
        }
        let signed = i64::try_from(index).unwrap_or(i64::MAX);
        let (id, offset) = self.locate(signed)?;
        self.mutated();
        self.insert_at_entry(id, offset, value.as_ref(), false)
    }

    /// Insert next to entry `offset` of node `id`.
    ///
    /// A node with room takes the value in place. At a node boundary the value
    /// goes to the neighbour if it has room, or else into a fresh node. In the
    /// middle of a full node the node is split at the insertion point, the value
    /// joins the detached half, and the neighbourhood is re-merged.
    pub(crate) fn insert_at_entry(
        &mut self,
        id: NodeId,
        offset: usize,
        value: &[u8],
        after: bool,
    ) -> ModifyResult<()> {
        let fill = self.options.fill;
        let threshold = self.options.packed_threshold;
        let (node_count, prev, next, full) = {
            let node = self.node(id)?;
            (
                node.entry_count(),
                node.prev,
                node.next,
                !node.allows_insert(fill, threshold, value),
            )
        };
        let at_tail = after && offset + 1 == node_count;
        let at_head = !after && offset == 0;

        let mut touched = vec![id];
        if is_large_element(value, threshold) {
            let plain = self.create_node(Node::new_plain(value.to_vec()));
            if self.node(id)?.is_plain() || at_tail || at_head {
                self.insert_node(id, plain, after)?;
            } else {
                let fragment = self.split_node(id, offset, after)?;
                self.insert_node(id, plain, after)?;
                if let Some(fragment) = fragment {
                    self.insert_node(plain, fragment, after)?;
                    touched.push(fragment);
                }
            }
            touched.push(plain);
            debug!(node = plain, bytes = value.len(), "inserted large element in plain node");
        } else if !full {
            self.decompress_for_use(id)?;
            let node = self.node_mut(id)?;
            node.run_mut()?
                .insert_at(if after { offset + 1 } else { offset }, value);
            node.sync_sizes();
        } else if at_tail
            && self
                .nodes
                .get(next)
                .map_or(false, |n| n.allows_insert(fill, threshold, value))
        {
            self.decompress_for_use(next)?;
            let node = self.node_mut(next)?;
            node.run_mut()?.push_front(value);
            node.sync_sizes();
            touched.push(next);
        } else if at_head
            && self
                .nodes
                .get(prev)
                .map_or(false, |n| n.allows_insert(fill, threshold, value))
        {
            self.decompress_for_use(prev)?;
            let node = self.node_mut(prev)?;
            node.run_mut()?.push_back(value);
            node.sync_sizes();
            touched.push(prev);
        } else if at_tail || at_head {
            let fresh = self.create_node(Node::new_packed(PackedRun::from_values([value])));
            self.insert_node(id, fresh, after)?;
            touched.push(fresh);
        } else {
            let fragment = self.split_node(id, offset, after)?.ok_or_else(|| {
                QuickListError::policy_violation(id, "split inside a node left an empty half")
            })?;
            self.insert_node(id, fragment, after)?;
            touched.push(fragment);
            if self.node(fragment)?.allows_insert(fill, threshold, value) {
                let node = self.node_mut(fragment)?;
                let run = node.run_mut()?;
                if after {
                    run.push_front(value);
                } else {
                    run.push_back(value);
                }
                node.sync_sizes();
            } else {
                // The value alone outweighs what the fragment may still take.
                let lone = self.create_node(Node::new_packed(PackedRun::from_values([value])));
                self.insert_node(id, lone, after)?;
                touched.push(lone);
            }
            trace!(node = id, fragment, offset, after, "split full node for insert");
            self.merge_around(id, &mut touched)?;
        }

        self.count += 1;
        self.settle(&touched)
    }

    // ============================================================================
    // REPLACE
    // ============================================================================

    /// Overwrite the element at `index` (negative counts from the tail).
    ///
    /// The element is rewritten in place when its node still satisfies the fill
    /// policy afterwards; otherwise it is deleted and `value` inserted at the
    /// same position, which may split or merge nodes.
    pub fn replace_at_index(&mut self, index: i64, value: impl AsRef<[u8]>) -> ModifyResult<()> {
        let value = value.as_ref();
        let position = self
            .absolute_index(index)
            .ok_or_else(|| QuickListError::index_out_of_range(index, self.count))?;
        let (id, offset) = self.locate(index)?;
        let fill = self.options.fill;
        let large = is_large_element(value, self.options.packed_threshold);
        self.mutated();

        let is_plain = self.node(id)?.is_plain();
        if is_plain && large {
            let node = self.node_mut(id)?;
            node.sz = value.len();
            node.payload = Payload::Plain(value.to_vec());
            return Ok(());
        }

        if !is_plain && !large {
            self.decompress_for_use(id)?;
            let node = self.node_mut(id)?;
            let old_size = node
                .value_at(offset)
                .map(|old| PackedRun::entry_size(&old.to_bytes()))
                .ok_or_else(|| QuickListError::policy_violation(id, "entry missing from node"))?;
            let new_size = node.sz - old_size + PackedRun::entry_size(value);
            if node.count == 1 || !node_exceeds_limit(fill, new_size, node.entry_count()) {
                node.run_mut()?.replace_at(offset, value);
                node.sync_sizes();
                return self.settle(&[id]);
            }
            self.finish_use(id);
        }

        trace!(index, node = id, "replace falls back to delete and insert");
        self.delete_entry_at(id, offset)?;
        if position == self.count {
            self.push_tail(value)
        } else {
            let (id, offset) = self.locate(position as i64)?;
            self.insert_at_entry(id, offset, value, false)
        }
    }

    // ============================================================================
    // BULK APPEND
    // ============================================================================

    /// Append a whole run after the tail.
    ///
    /// A run that fits the fill policy becomes one new node as-is. A larger run,
    /// or one holding an element above the packed threshold, is appended element
    /// by element.
    pub fn append_packed_run(&mut self, run: PackedRun) -> ModifyResult<()> {
        if run.is_empty() {
            return Ok(());
        }
        let threshold = self.options.packed_threshold;
        if node_exceeds_limit(self.options.fill, run.byte_size(), run.entry_count())
            || run
                .iter()
                .any(|value| is_large_element(&value.to_bytes(), threshold))
        {
            return self.append_values_from_packed_run(&run);
        }
        self.mutated();
        let entries = run.entry_count();
        let tail = self.tail;
        let id = self.create_node(Node::new_packed(run));
        self.insert_node(tail, id, true)?;
        self.count += entries;
        self.settle(&[tail, id])
    }

    /// Append every element of `run` after the tail, one push at a time.
    pub fn append_values_from_packed_run(&mut self, run: &PackedRun) -> ModifyResult<()> {
        for value in run.iter() {
            self.push_tail(value.to_bytes())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ListOptions;
    use crate::error::QuickListError;
    use crate::packed_run::{PackedRun, Value};
    use crate::types::{Container, QuickList, Where};

    fn list(fill: i32, depth: u16) -> QuickList {
        QuickList::with_options(ListOptions::new(fill, depth)).unwrap()
    }

    fn strings(list: &QuickList) -> Vec<String> {
        list.to_vec()
            .unwrap()
            .into_iter()
            .map(|v| String::from_utf8(v.to_bytes()).unwrap())
            .collect()
    }

    #[test]
    fn test_push_fills_nodes_in_order() {
        let mut list = list(4, 0);
        for v in ["A", "B", "C", "D", "E"] {
            list.push_tail(v).unwrap();
        }
        assert_eq!(list.node_count(), 2);
        for v in ["F", "G", "H"] {
            list.push_tail(v).unwrap();
        }
        assert_eq!(list.node_count(), 2);
        list.push(Where::Head, "Z").unwrap();
        assert_eq!(strings(&list), ["Z", "A", "B", "C", "D", "E", "F", "G", "H"]);
        assert_eq!(list.node_count(), 3);
        list.check_invariants_detailed().unwrap();
    }

    #[test]
    fn test_insert_after_middle_of_full_node_splits() {
        let mut list = list(4, 0);
        for v in ["a", "b", "c", "d"] {
            list.push_tail(v).unwrap();
        }
        let b = list.index(1).unwrap();
        list.insert_after(&b, "x").unwrap();
        assert_eq!(strings(&list), ["a", "b", "x", "c", "d"]);
        assert_eq!(list.node_count(), 2);
        list.check_invariants_detailed().unwrap();
    }

    #[test]
    fn test_insert_before_head_of_full_node_uses_neighbour() {
        let mut list = list(4, 0);
        for v in ["a", "b", "c", "d", "e", "f"] {
            list.push_tail(v).unwrap();
        }
        // Make room in the first node and fill the second.
        list.pop(Where::Head).unwrap();
        list.push_tail("g").unwrap();
        list.push_tail("h").unwrap();
        let e = list.index(3).unwrap();
        assert_eq!(e.offset(), 0);
        list.insert_before(&e, "y").unwrap();
        assert_eq!(strings(&list), ["b", "c", "d", "y", "e", "f", "g", "h"]);
        assert_eq!(list.node_count(), 2);
        assert_eq!(list.node_summaries()[0].entry_count, 4);
    }

    #[test]
    fn test_insert_by_position() {
        let mut list = list(3, 0);
        list.insert(0, "b").unwrap();
        list.insert(0, "a").unwrap();
        list.insert(2, "d").unwrap();
        list.insert(2, "c").unwrap();
        assert_eq!(strings(&list), ["a", "b", "c", "d"]);
        assert!(matches!(
            list.insert(9, "z"),
            Err(QuickListError::IndexOutOfRange { .. })
        ));
        list.check_invariants_detailed().unwrap();
    }

    #[test]
    fn test_large_element_gets_plain_node() {
        let mut list = list(-2, 0);
        list.set_packed_threshold(16).unwrap();
        list.push_tail("small").unwrap();
        list.push_tail("x".repeat(40)).unwrap();
        list.push_tail("tail").unwrap();
        let summaries = list.node_summaries();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[1].container, Container::Plain);
        assert_eq!(summaries[1].entry_count, 1);
        assert_eq!(list.get(1).unwrap(), Value::Bytes(b"x".repeat(40)));
        list.check_invariants_detailed().unwrap();
    }

    #[test]
    fn test_large_insert_in_middle_splits_around_plain_node() {
        let mut list = list(-2, 0);
        list.set_packed_threshold(16).unwrap();
        for v in ["a", "b", "c", "d"] {
            list.push_tail(v).unwrap();
        }
        let b = list.index(1).unwrap();
        list.insert_after(&b, "L".repeat(32)).unwrap();
        let containers: Vec<_> = list.node_summaries().iter().map(|s| s.container).collect();
        assert_eq!(containers, [Container::Packed, Container::Plain, Container::Packed]);
        assert_eq!(list.len(), 5);
        assert_eq!(list.get(2).unwrap(), Value::Bytes(b"L".repeat(32)));
        list.check_invariants_detailed().unwrap();
    }

    #[test]
    fn test_replace_in_place_and_by_reinsert() {
        let mut list = list(4, 0);
        for v in ["a", "b", "c", "d", "e"] {
            list.push_tail(v).unwrap();
        }
        list.replace_at_index(1, "B").unwrap();
        list.replace_at_index(-1, "42").unwrap();
        assert_eq!(list.get(1).unwrap(), Value::from("B"));
        assert_eq!(list.get(4).unwrap(), Value::Int(42));

        list.set_packed_threshold(8).unwrap();
        list.replace_at_index(2, "a-much-longer-value").unwrap();
        assert_eq!(strings(&list), ["a", "B", "a-much-longer-value", "d", "42"]);
        assert_eq!(list.len(), 5);
        list.check_invariants_detailed().unwrap();

        assert!(list.replace_at_index(5, "x").is_err());
    }

    #[test]
    fn test_append_packed_run() {
        let mut list = list(4, 0);
        list.push_tail("first").unwrap();
        list.append_packed_run(PackedRun::from_values(["a", "b", "c"])).unwrap();
        assert_eq!(list.node_count(), 2);
        list.append_packed_run(PackedRun::from_values(["1", "2", "3", "4", "5"])).unwrap();
        assert_eq!(list.len(), 9);
        assert_eq!(list.get(-1).unwrap(), Value::Int(5));
        list.check_invariants_detailed().unwrap();
    }

    #[test]
    fn test_append_packed_run_with_large_element_unpacks_it() {
        let mut list = list(-2, 0);
        list.set_packed_threshold(16).unwrap();
        let wide = "w".repeat(40);
        list.append_packed_run(PackedRun::from_values(["a", wide.as_str(), "b"]))
            .unwrap();
        let containers: Vec<_> = list.node_summaries().iter().map(|s| s.container).collect();
        assert_eq!(containers, [Container::Packed, Container::Plain, Container::Packed]);
        assert_eq!(strings(&list), ["a", wide.as_str(), "b"]);
        list.check_invariants_detailed().unwrap();
    }
}
