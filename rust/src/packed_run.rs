//! Packed run: the densely encoded payload of a single list node.
//!
//! A run is a flat byte buffer of back-to-back entries. Each entry starts with
//! a one-byte tag:
//!
//! - `TAG_INT`: a zigzag LEB128 varint holding an `i64`
//! - `TAG_BYTES`: a LEB128 length followed by that many raw bytes
//!
//! Inputs that are the canonical decimal form of an `i64` ("42", "-7", but
//! not "007" or "+1") are stored as integers and read back as [`Value::Int`].

use crate::error::{QuickListError, QuickListResult};

const TAG_INT: u8 = 0x00;
const TAG_BYTES: u8 = 0x01;

/// Longest decimal representation of an i64 ("-9223372036854775808").
const MAX_INT_STR_LEN: usize = 20;

/// A decoded element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i64),
    Bytes(Vec<u8>),
}

impl Value {
    /// Classify raw bytes the way a packed run stores them.
    pub fn from_slice(bytes: &[u8]) -> Self {
        match parse_canonical_int(bytes) {
            Some(n) => Value::Int(n),
            None => Value::Bytes(bytes.to_vec()),
        }
    }

    /// The byte form of this value; integers render as decimal.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Int(n) => n.to_string().into_bytes(),
            Value::Bytes(b) => b.clone(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bytes(_) => None,
        }
    }

    /// Compare against raw input bytes, treating integers by value.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        match self {
            Value::Int(n) => parse_canonical_int(bytes) == Some(*n),
            Value::Bytes(b) => b.as_slice() == bytes,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::from_slice(bytes)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::from_slice(s.as_bytes())
    }
}

fn parse_canonical_int(bytes: &[u8]) -> Option<i64> {
    if bytes.is_empty() || bytes.len() > MAX_INT_STR_LEN {
        return None;
    }
    let s = std::str::from_utf8(bytes).ok()?;
    let n: i64 = s.parse().ok()?;
    // Reject "+5", "007", "-0" so the value round-trips byte for byte.
    (n.to_string() == s).then_some(n)
}

fn varint_len(mut v: u64) -> usize {
    let mut len = 1;
    while v >= 0x80 {
        v >>= 7;
        len += 1;
    }
    len
}

fn write_varint(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push((v as u8) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

fn read_varint(data: &[u8], mut pos: usize) -> Option<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = *data.get(pos)?;
        pos += 1;
        if shift >= 64 {
            return None;
        }
        result |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Some((result, pos));
        }
        shift += 7;
    }
}

fn zigzag(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

fn unzigzag(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

fn encode_entry(out: &mut Vec<u8>, value: &[u8]) {
    match parse_canonical_int(value) {
        Some(n) => {
            out.push(TAG_INT);
            write_varint(out, zigzag(n));
        }
        None => {
            out.push(TAG_BYTES);
            write_varint(out, value.len() as u64);
            out.extend_from_slice(value);
        }
    }
}

/// Decode the entry starting at `pos`, returning it and the start of the next one.
fn decode_entry(data: &[u8], pos: usize) -> QuickListResult<(Value, usize)> {
    let tag = *data
        .get(pos)
        .ok_or_else(|| QuickListError::corrupted_run(pos, "missing entry tag"))?;
    match tag {
        TAG_INT => {
            let (raw, next) = read_varint(data, pos + 1)
                .ok_or_else(|| QuickListError::corrupted_run(pos, "truncated integer"))?;
            Ok((Value::Int(unzigzag(raw)), next))
        }
        TAG_BYTES => {
            let (len, start) = read_varint(data, pos + 1)
                .ok_or_else(|| QuickListError::corrupted_run(pos, "truncated length"))?;
            let end = usize::try_from(len)
                .ok()
                .and_then(|len| start.checked_add(len))
                .filter(|&end| end <= data.len())
                .ok_or_else(|| QuickListError::corrupted_run(pos, "entry overruns buffer"))?;
            Ok((Value::Bytes(data[start..end].to_vec()), end))
        }
        other => Err(QuickListError::corrupted_run(
            pos,
            &format!("unknown tag {:#04x}", other),
        )),
    }
}

/// Length of the entry starting at `pos`; only called on buffers this module wrote.
fn skip_entry(data: &[u8], pos: usize) -> usize {
    match data[pos] {
        TAG_INT => read_varint(data, pos + 1).map_or(data.len(), |(_, next)| next),
        _ => read_varint(data, pos + 1).map_or(data.len(), |(len, start)| start + len as usize),
    }
}

/// A sequence of length-prefixed entries stored in one contiguous buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedRun {
    data: Vec<u8>,
    count: usize,
}

impl PackedRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a blob produced by [`PackedRun::into_bytes`], validating every entry.
    pub fn from_bytes(blob: Vec<u8>) -> QuickListResult<Self> {
        let mut pos = 0;
        let mut count = 0;
        while pos < blob.len() {
            let (_, next) = decode_entry(&blob, pos)?;
            pos = next;
            count += 1;
        }
        Ok(Self { data: blob, count })
    }

    /// Rebuild a run from bytes this crate produced, with a known entry count.
    pub(crate) fn from_trusted(data: Vec<u8>, count: usize) -> Self {
        Self { data, count }
    }

    /// Build a run holding `values` in order.
    pub fn from_values<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut run = Self::new();
        for value in values {
            run.push_back(value.as_ref());
        }
        run
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    pub fn entry_count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Encoded size `value` would occupy inside a run.
    pub fn entry_size(value: &[u8]) -> usize {
        match parse_canonical_int(value) {
            Some(n) => 1 + varint_len(zigzag(n)),
            None => 1 + varint_len(value.len() as u64) + value.len(),
        }
    }

    /// Byte position of the entry at `offset` (or the end when `offset == count`).
    fn byte_offset(&self, offset: usize) -> usize {
        let mut pos = 0;
        for _ in 0..offset.min(self.count) {
            pos = skip_entry(&self.data, pos);
        }
        pos
    }

    pub fn push_back(&mut self, value: &[u8]) {
        encode_entry(&mut self.data, value);
        self.count += 1;
    }

    pub fn push_front(&mut self, value: &[u8]) {
        self.insert_at(0, value);
    }

    /// Insert `value` so that it becomes the entry at `offset`; offsets past the end append.
    pub fn insert_at(&mut self, offset: usize, value: &[u8]) {
        let pos = self.byte_offset(offset);
        let mut encoded = Vec::with_capacity(Self::entry_size(value));
        encode_entry(&mut encoded, value);
        self.data.splice(pos..pos, encoded);
        self.count += 1;
    }

    /// Remove up to `count` entries starting at `offset`, returning how many went.
    pub fn delete_at(&mut self, offset: usize, count: usize) -> usize {
        if offset >= self.count {
            return 0;
        }
        let removed = count.min(self.count - offset);
        let start = self.byte_offset(offset);
        let mut end = start;
        for _ in 0..removed {
            end = skip_entry(&self.data, end);
        }
        self.data.drain(start..end);
        self.count -= removed;
        removed
    }

    pub fn get(&self, offset: usize) -> Option<Value> {
        if offset >= self.count {
            return None;
        }
        let pos = self.byte_offset(offset);
        decode_entry(&self.data, pos).ok().map(|(value, _)| value)
    }

    pub fn last(&self) -> Option<Value> {
        self.count.checked_sub(1).and_then(|offset| self.get(offset))
    }

    /// Overwrite the entry at `offset`. Returns false when `offset` is out of range.
    pub fn replace_at(&mut self, offset: usize, value: &[u8]) -> bool {
        if offset >= self.count {
            return false;
        }
        let start = self.byte_offset(offset);
        let end = skip_entry(&self.data, start);
        let mut encoded = Vec::with_capacity(Self::entry_size(value));
        encode_entry(&mut encoded, value);
        self.data.splice(start..end, encoded);
        true
    }

    /// Split into `[0, offset)` (kept) and `[offset, count)` (returned).
    pub fn split_off(&mut self, offset: usize) -> PackedRun {
        let offset = offset.min(self.count);
        let pos = self.byte_offset(offset);
        let tail = self.data.split_off(pos);
        let tail_count = self.count - offset;
        self.count = offset;
        PackedRun::from_trusted(tail, tail_count)
    }

    /// Move every entry of `other` onto the end of this run.
    pub fn append(&mut self, other: &mut PackedRun) {
        self.data.append(&mut other.data);
        self.count += other.count;
        other.count = 0;
    }

    pub fn iter(&self) -> PackedRunIter<'_> {
        PackedRunIter {
            data: &self.data,
            pos: 0,
        }
    }

    /// Decode every entry.
    pub fn values(&self) -> Vec<Value> {
        self.iter().collect()
    }
}

/// Forward iterator over the entries of a [`PackedRun`].
pub struct PackedRunIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Iterator for PackedRunIter<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        let (value, next) = decode_entry(self.data, self.pos).ok()?;
        self.pos = next;
        Some(value)
    }
}
