//! Iterator implementations for QuickList.
//!
//! [`ListIterator`] walks the list node by node in either direction. Entering
//! a node decompresses it for the duration of the visit; leaving it (or
//! releasing the iterator) compresses it again when the depth policy allows.
//! The iterator can also delete the entry it just yielded and keep going.

use crate::compression::{Compressor, Lz4Compressor};
use crate::delete_operations::DeleteOutcome;
use crate::error::{ModifyResult, QuickListError, QuickListResult, ResultExt};
use crate::get_operations::Entry;
use crate::list_structure::MergeOutcome;
use crate::packed_run::Value;
use crate::types::{Direction, NodeId, QuickList, NULL_NODE};

// ============================================================================
// ITERATOR STRUCTS
// ============================================================================

/// Cursor over the entries of a list.
///
/// Holds the list mutably: nodes are decompressed while visited, and
/// [`ListIterator::delete_entry`] may reshape the list mid-walk.
pub struct ListIterator<'a, C: Compressor = Lz4Compressor> {
    list: &'a mut QuickList<C>,
    direction: Direction,
    current: NodeId,
    /// Offset of the next entry to yield inside `current`; may step off either end.
    offset: isize,
    /// Decoded entries of `current`, filled when the node is entered.
    values: Vec<Value>,
    attached: bool,
    last_yielded: Option<(NodeId, usize)>,
    finished: bool,
}

/// Iterator over element values only.
pub struct ValueIterator<'a, C: Compressor = Lz4Compressor> {
    entries: ListIterator<'a, C>,
}

// ============================================================================
// QUICKLIST ITERATOR METHODS
// ============================================================================

impl<C: Compressor> QuickList<C> {
    /// Iterate from the head (`Forward`) or the tail (`Backward`).
    ///
    /// # Examples
    ///
    /// ```
    /// use quicklist::{Direction, QuickList};
    ///
    /// let mut list = QuickList::new();
    /// for v in ["a", "b", "c"] {
    ///     list.push_tail(v).unwrap();
    /// }
    /// let mut iter = list.iter(Direction::Backward);
    /// let mut seen = Vec::new();
    /// while let Some(entry) = iter.next_entry().unwrap() {
    ///     seen.push(entry.into_value().to_bytes());
    /// }
    /// iter.release();
    /// assert_eq!(seen, [b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
    /// ```
    pub fn iter(&mut self, direction: Direction) -> ListIterator<'_, C> {
        let start = match direction {
            Direction::Forward => self.head,
            Direction::Backward => self.tail,
        };
        let offset = match direction {
            Direction::Forward => 0,
            Direction::Backward => self.entry_count_of(start) as isize - 1,
        };
        ListIterator::new(self, direction, start, offset)
    }

    /// Iterate starting at the element at `index` (negative counts from the tail).
    pub fn iter_at(
        &mut self,
        direction: Direction,
        index: i64,
    ) -> QuickListResult<ListIterator<'_, C>> {
        let (start, offset) = self.locate(index)?;
        Ok(ListIterator::new(self, direction, start, offset as isize))
    }

    /// Values head to tail.
    pub fn values(&mut self) -> ValueIterator<'_, C> {
        ValueIterator {
            entries: self.iter(Direction::Forward),
        }
    }
}

// ============================================================================
// LIST ITERATOR
// ============================================================================

impl<'a, C: Compressor> ListIterator<'a, C> {
    fn new(list: &'a mut QuickList<C>, direction: Direction, start: NodeId, offset: isize) -> Self {
        Self {
            list,
            direction,
            current: start,
            offset,
            values: Vec::new(),
            attached: false,
            last_yielded: None,
            finished: start == NULL_NODE,
        }
    }

    /// Yield the next entry, or `None` once the walk has passed the last one.
    pub fn next_entry(&mut self) -> QuickListResult<Option<Entry>> {
        let result = self.advance();
        if result.is_err() {
            self.detach();
            self.finished = true;
        }
        result
    }

    fn advance(&mut self) -> QuickListResult<Option<Entry>> {
        loop {
            if self.finished || self.current == NULL_NODE {
                self.finished = true;
                return Ok(None);
            }
            if !self.attached {
                self.list
                    .decompress_for_use(self.current)
                    .with_context("iterator")?;
                self.values = self.list.node(self.current)?.values();
                self.attached = true;
            }

            if self.offset >= 0 && (self.offset as usize) < self.values.len() {
                let offset = self.offset as usize;
                self.offset += match self.direction {
                    Direction::Forward => 1,
                    Direction::Backward => -1,
                };
                self.last_yielded = Some((self.current, offset));
                return Ok(Some(Entry {
                    node: self.current,
                    offset,
                    value: self.values[offset].clone(),
                    version: self.list.version,
                }));
            }

            let next = self.list.step(self.current, self.direction);
            self.detach();
            self.enter(next);
        }
    }

    /// Point the cursor at the first entry of `id` in walk order.
    fn enter(&mut self, id: NodeId) {
        self.current = id;
        self.offset = match self.direction {
            Direction::Forward => 0,
            Direction::Backward => self.list.entry_count_of(id) as isize - 1,
        };
    }

    /// Leave the current node, compressing it again if this iterator decompressed it.
    fn detach(&mut self) {
        if self.attached {
            self.list.finish_use(self.current);
            self.attached = false;
            self.values.clear();
        }
    }

    /// Delete the entry this iterator yielded last.
    ///
    /// The cursor is moved so that the next call continues with the element
    /// that followed the deleted one, even if the delete emptied or merged the
    /// node. Any other entry read before the delete is stale afterwards.
    pub fn delete_entry(&mut self, entry: &Entry) -> ModifyResult<()> {
        if entry.version != self.list.version {
            return Err(QuickListError::StaleEntry);
        }
        if self.last_yielded != Some((entry.node, entry.offset)) {
            return Err(QuickListError::NotCurrentEntry);
        }
        self.last_yielded = None;
        self.attached = false;
        self.values.clear();

        self.list.mutated();
        match self.list.delete_entry_at(entry.node, entry.offset)? {
            DeleteOutcome::Removed { prev, next } => match self.direction {
                Direction::Forward => self.enter(next),
                Direction::Backward => self.enter(prev),
            },
            DeleteOutcome::Shrunk(MergeOutcome { target, base }) => {
                self.current = target;
                let position = (base + entry.offset) as isize;
                self.offset = match self.direction {
                    Direction::Forward => position,
                    Direction::Backward => position - 1,
                };
            }
        }
        Ok(())
    }

    /// Finish the walk, compressing the node currently held if it is eligible.
    pub fn release(mut self) {
        self.detach();
    }
}

impl<C: Compressor> Iterator for ListIterator<'_, C> {
    type Item = QuickListResult<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

impl<C: Compressor> Drop for ListIterator<'_, C> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<C: Compressor> Iterator for ValueIterator<'_, C> {
    type Item = QuickListResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries
            .next_entry()
            .map(|entry| entry.map(Entry::into_value))
            .transpose()
    }
}
