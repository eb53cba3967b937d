//! GET operations for QuickList.
//!
//! This module contains the read side of the list: positional lookup, the
//! [`Entry`] view handed out by lookups and iterators, whole-list snapshots
//! and per-node inspection.

use std::borrow::Cow;

use crate::compression::Compressor;
use crate::error::{QuickListError, QuickListResult, ResultExt};
use crate::packed_run::{PackedRun, Value};
use crate::types::{CompressedBlob, Node, NodeId, NodeSummary, Payload, QuickList, NULL_NODE};

/// A view of one element: where it lives and what it holds.
///
/// An entry is only good until the list changes. Passing a stale entry back
/// to the list yields [`QuickListError::StaleEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub(crate) node: NodeId,
    pub(crate) offset: usize,
    pub(crate) value: Value,
    pub(crate) version: u64,
}

impl Entry {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Node holding the element.
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Position of the element inside its node.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Compare the element with raw bytes; integers compare by value.
    pub fn matches(&self, bytes: impl AsRef<[u8]>) -> bool {
        self.value.matches(bytes.as_ref())
    }
}

impl<C: Compressor> QuickList<C> {
    // ============================================================================
    // PUBLIC GET OPERATIONS
    // ============================================================================

    /// Look up the element at `index`; negative indices count from the tail (-1 is the last).
    ///
    /// The node walk starts from whichever end is nearer. A compressed node is
    /// decompressed for the read and compressed again afterwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use quicklist::{QuickList, Value};
    ///
    /// let mut list = QuickList::new();
    /// list.push_tail("x").unwrap();
    /// list.push_tail("7").unwrap();
    /// assert_eq!(list.index(1).unwrap().value(), &Value::Int(7));
    /// assert!(list.index(-3).is_err());
    /// ```
    pub fn index(&mut self, index: i64) -> QuickListResult<Entry> {
        let (id, offset) = self.locate(index)?;
        self.decompress_for_use(id).with_context("index")?;
        let value = self.node(id)?.value_at(offset);
        self.finish_use(id);
        let value =
            value.ok_or_else(|| QuickListError::policy_violation(id, "entry missing from node"))?;
        Ok(Entry {
            node: id,
            offset,
            value,
            version: self.version,
        })
    }

    /// Read the element at `index` without touching node state.
    pub fn get(&self, index: i64) -> QuickListResult<Value> {
        let (id, offset) = self.locate(index)?;
        let node = self.node(id)?;
        let value = match &node.payload {
            Payload::Plain(bytes) => Some(Value::Bytes(bytes.clone())),
            _ => self.raw_run(node)?.get(offset),
        };
        value.ok_or_else(|| QuickListError::policy_violation(id, "entry missing from node"))
    }

    /// Every element, head to tail.
    pub fn to_vec(&self) -> QuickListResult<Vec<Value>> {
        let mut values = Vec::with_capacity(self.count);
        let mut id = self.head;
        while id != NULL_NODE {
            let node = self.node(id)?;
            match &node.payload {
                Payload::Plain(bytes) => values.push(Value::Bytes(bytes.clone())),
                _ => values.extend(self.raw_run(node)?.iter()),
            }
            id = node.next;
        }
        Ok(values)
    }

    /// Bookkeeping for every node, head to tail.
    pub fn node_summaries(&self) -> Vec<NodeSummary> {
        let mut summaries = Vec::with_capacity(self.len);
        let mut id = self.head;
        while let Some(node) = self.nodes.get(id) {
            summaries.push(node.summary(id));
            id = node.next;
        }
        summaries
    }

    /// The compressed payload of node `id`, if that node is currently compressed.
    pub fn compressed_payload(&self, id: NodeId) -> Option<&CompressedBlob> {
        match &self.nodes.get(id)?.payload {
            Payload::Compressed(blob) => Some(blob),
            _ => None,
        }
    }

    // ============================================================================
    // INTERNAL GET HELPERS
    // ============================================================================

    /// The packed run of `node`, decompressed into a temporary if needed.
    fn raw_run<'a>(&self, node: &'a Node) -> QuickListResult<Cow<'a, PackedRun>> {
        match &node.payload {
            Payload::Packed(run) => Ok(Cow::Borrowed(run)),
            Payload::Compressed(blob) => {
                let data = self.compressor.decompress(&blob.data, blob.original_size)?;
                Ok(Cow::Owned(PackedRun::from_trusted(data, node.entry_count())))
            }
            Payload::Plain(_) => Err(QuickListError::PolicyViolation(
                "plain node has no packed run".to_string(),
            )),
        }
    }

    /// Resolve `index` (negative counts from the tail) to a node and an offset inside it.
    pub(crate) fn locate(&self, index: i64) -> QuickListResult<(NodeId, usize)> {
        let position = self
            .absolute_index(index)
            .ok_or_else(|| QuickListError::index_out_of_range(index, self.count))?;

        if position < self.count / 2 {
            let mut seen = 0;
            let mut id = self.head;
            while let Some(node) = self.nodes.get(id) {
                let count = node.entry_count();
                if position < seen + count {
                    return Ok((id, position - seen));
                }
                seen += count;
                id = node.next;
            }
        } else {
            let from_tail = self.count - 1 - position;
            let mut seen = 0;
            let mut id = self.tail;
            while let Some(node) = self.nodes.get(id) {
                let count = node.entry_count();
                if from_tail < seen + count {
                    return Ok((id, count - 1 - (from_tail - seen)));
                }
                seen += count;
                id = node.prev;
            }
        }
        Err(QuickListError::PolicyViolation(format!(
            "entry totals disagree with nodes while locating {}",
            index
        )))
    }

    /// `index` as a position from the head, or `None` when out of range.
    pub(crate) fn absolute_index(&self, index: i64) -> Option<usize> {
        let position = if index < 0 {
            let back = usize::try_from(index.unsigned_abs()).ok()?;
            self.count.checked_sub(back)?
        } else {
            usize::try_from(index).ok()?
        };
        (position < self.count).then_some(position)
    }

    /// Fail unless `entry` was read at the current version and still names a live element.
    pub(crate) fn check_entry(&self, entry: &Entry) -> QuickListResult<()> {
        if entry.version != self.version {
            return Err(QuickListError::StaleEntry);
        }
        match self.nodes.get(entry.node) {
            Some(node) if entry.offset < node.entry_count() => Ok(()),
            _ => Err(QuickListError::StaleEntry),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ListOptions;
    use crate::error::QuickListError;
    use crate::packed_run::Value;
    use crate::types::QuickList;

    fn numbered(fill: i32, depth: u16, n: i64) -> QuickList {
        let mut list = QuickList::with_options(ListOptions::new(fill, depth)).unwrap();
        for i in 0..n {
            list.push_tail(i.to_string()).unwrap();
        }
        list
    }

    #[test]
    fn test_index_from_both_ends() {
        let mut list = numbered(4, 0, 10);
        assert_eq!(list.index(0).unwrap().value(), &Value::Int(0));
        assert_eq!(list.index(9).unwrap().value(), &Value::Int(9));
        assert_eq!(list.index(-1).unwrap().value(), &Value::Int(9));
        assert_eq!(list.index(-10).unwrap().value(), &Value::Int(0));
        assert_eq!(list.index(6).unwrap().offset(), 2);
    }

    #[test]
    fn test_index_out_of_range() {
        let mut list = numbered(4, 0, 3);
        assert_eq!(
            list.index(3),
            Err(QuickListError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert!(list.index(-4).is_err());
        assert!(list.index(i64::MIN).is_err());
        assert!(QuickList::new().index(0).is_err());
    }

    #[test]
    fn test_index_recompresses_interior_node() {
        let mut list = QuickList::with_options(ListOptions::new(32, 1)).unwrap();
        for i in 0..96 {
            list.push_tail(format!("repetitive-payload-{}", i % 3)).unwrap();
        }
        let middle = list.node_summaries()[1];
        assert!(middle.compressed_size.is_some());

        let entry = list.index(40).unwrap();
        assert!(entry.matches("repetitive-payload-1"));
        assert_eq!(entry.node_id(), middle.id);
        assert!(list.compressed_payload(middle.id).is_some());
        list.check_invariants_detailed().unwrap();
    }

    #[test]
    fn test_get_and_to_vec_read_compressed_nodes() {
        let mut list = QuickList::with_options(ListOptions::new(32, 1)).unwrap();
        for i in 0..128 {
            list.push_tail(format!("payload-payload-{}", i % 4)).unwrap();
        }
        assert_eq!(list.get(50).unwrap(), Value::from("payload-payload-2"));
        let all = list.to_vec().unwrap();
        assert_eq!(all.len(), 128);
        assert_eq!(all[127], Value::from("payload-payload-3"));
    }
}
