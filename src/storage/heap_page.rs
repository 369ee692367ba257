use crate::storage::error::{StorageError, StorageResult};

/// Number of tuple slots on a page of `page_size` bytes holding
/// `tuple_size`-byte tuples. One header bit per slot plus the slot bytes
/// must fit in the page: `floor(page_size * 8 / (tuple_size * 8 + 1))`.
pub fn num_slots(page_size: usize, tuple_size: usize) -> usize {
    (page_size * 8) / (tuple_size * 8 + 1)
}

/// Header bytes needed for the slot-availability bitmap.
pub fn header_size(num_slots: usize) -> usize {
    num_slots.div_ceil(8)
}

/// A view over a page's bytes in the heap page format:
/// `[slot bitmap][slot 0][slot 1]..[slot N-1]`, where bit i of the bitmap
/// is set iff slot i holds a valid serialized tuple.
///
/// The view is transient; it borrows the page buffer and carries no state
/// of its own beyond the derived slot geometry.
pub struct HeapPage<'a> {
    data: &'a mut [u8],
    tuple_size: usize,
    num_slots: usize,
}

impl<'a> HeapPage<'a> {
    pub fn new(data: &'a mut [u8], tuple_size: usize) -> Self {
        let num_slots = num_slots(data.len(), tuple_size);
        Self {
            data,
            tuple_size,
            num_slots,
        }
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Whether slot `slot`'s bitmap bit is set.
    pub fn slot_used(&self, slot: u16) -> bool {
        let i = slot as usize;
        self.data[i / 8] & (1 << (i % 8)) != 0
    }

    fn set_slot(&mut self, slot: u16, used: bool) {
        let i = slot as usize;
        if used {
            self.data[i / 8] |= 1 << (i % 8);
        } else {
            self.data[i / 8] &= !(1 << (i % 8));
        }
    }

    /// Number of unoccupied slots.
    pub fn free_slots(&self) -> usize {
        (0..self.num_slots as u16)
            .filter(|&slot| !self.slot_used(slot))
            .count()
    }

    fn slot_offset(&self, slot: u16) -> usize {
        header_size(self.num_slots) + slot as usize * self.tuple_size
    }

    fn check_slot(&self, slot: u16) -> StorageResult<()> {
        if slot as usize >= self.num_slots {
            return Err(StorageError::InvalidSlot {
                slot,
                num_slots: self.num_slots as u16,
            });
        }
        Ok(())
    }

    /// Places `tuple_bytes` in the lowest-indexed free slot and sets its
    /// bit. Returns the slot index, or `PageFull` if no slot is free.
    pub fn insert_tuple(&mut self, tuple_bytes: &[u8]) -> StorageResult<u16> {
        if tuple_bytes.len() != self.tuple_size {
            return Err(StorageError::SchemaMismatch(format!(
                "serialized tuple is {} bytes, slot is {}",
                tuple_bytes.len(),
                self.tuple_size
            )));
        }
        for slot in 0..self.num_slots as u16 {
            if !self.slot_used(slot) {
                let offset = self.slot_offset(slot);
                self.data[offset..offset + self.tuple_size].copy_from_slice(tuple_bytes);
                self.set_slot(slot, true);
                return Ok(slot);
            }
        }
        Err(StorageError::PageFull)
    }

    /// Clears slot `slot`'s bit. The slot bytes are left in place; the
    /// bitmap alone decides validity. No compaction.
    pub fn delete_tuple(&mut self, slot: u16) -> StorageResult<()> {
        self.check_slot(slot)?;
        if !self.slot_used(slot) {
            return Err(StorageError::TupleNotFound { slot });
        }
        self.set_slot(slot, false);
        Ok(())
    }

    /// The serialized bytes of the tuple in `slot`.
    pub fn tuple_bytes(&self, slot: u16) -> StorageResult<&[u8]> {
        self.check_slot(slot)?;
        if !self.slot_used(slot) {
            return Err(StorageError::TupleNotFound { slot });
        }
        let offset = self.slot_offset(slot);
        Ok(&self.data[offset..offset + self.tuple_size])
    }
}
