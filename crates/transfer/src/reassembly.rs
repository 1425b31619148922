use std::collections::BTreeMap;

use crate::TransferError;

/// Result of writing one chunk into a [`ReassemblyBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotWrite {
    /// The slot was empty and now holds the payload.
    Filled,
    /// The slot was already filled; the payload was dropped.
    Duplicate,
}

/// Write-once, index-addressed storage for the chunks of one transfer.
///
/// Slots are kept sparse so a hostile `total` costs nothing until chunks
/// actually arrive. The filled count is maintained on every write, so
/// completeness is an O(1) check.
#[derive(Debug, Clone)]
pub struct ReassemblyBuffer {
    slots: BTreeMap<u32, Vec<u8>>,
    total: u32,
    filled: u32,
    bytes: usize,
}

impl ReassemblyBuffer {
    /// Creates an empty buffer for `total` chunks.
    pub fn new(total: u32) -> Self {
        Self {
            slots: BTreeMap::new(),
            total,
            filled: 0,
            bytes: 0,
        }
    }

    /// Stores `payload` at `index`. The first write to a slot wins.
    ///
    /// An index outside `[0, total)` is rejected without touching the buffer.
    pub fn insert(&mut self, index: u32, payload: Vec<u8>) -> Result<SlotWrite, TransferError> {
        if index >= self.total {
            return Err(TransferError::Protocol(format!(
                "chunk index {index} out of range for {} chunks",
                self.total
            )));
        }
        if self.slots.contains_key(&index) {
            return Ok(SlotWrite::Duplicate);
        }
        self.bytes += payload.len();
        self.slots.insert(index, payload);
        self.filled += 1;
        Ok(SlotWrite::Filled)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of filled slots.
    pub fn filled(&self) -> u32 {
        self.filled
    }

    /// Payload bytes held so far.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.total
    }

    /// Concatenates all slots in index order and empties the buffer.
    ///
    /// Returns `None`, leaving the buffer untouched, while any slot is empty.
    /// The filled count is kept so progress stays at 100 % afterwards.
    pub fn take_assembled(&mut self) -> Option<Vec<u8>> {
        if !self.is_full() {
            return None;
        }
        let mut out = Vec::with_capacity(self.bytes);
        for payload in std::mem::take(&mut self.slots).into_values() {
            out.extend_from_slice(&payload);
        }
        self.bytes = 0;
        Some(out)
    }
}
