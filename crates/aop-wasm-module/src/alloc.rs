use tracing::trace;

use crate::error::{BoundaryError, BoundaryResult};
use crate::memory::LinearMemory;

fn align_up(v: u32, align: u32) -> BoundaryResult<u32> {
    debug_assert!(align.is_power_of_two());
    v.checked_add(align - 1)
        .map(|x| x & !(align - 1))
        .ok_or(BoundaryError::AddressSpaceExhausted)
}

/// Bump allocator over linear memory. Nothing is ever reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BumpAllocator {
    cursor: u32,
}

impl BumpAllocator {
    pub fn new(origin: u32) -> Self {
        BumpAllocator { cursor: origin }
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Hands out the cursor rounded up to `align` and advances it by the aligned size.
    /// A zero-size request returns the null offset and leaves the cursor alone.
    pub fn allocate<M>(&mut self, mem: &mut M, size: u32, align: u32) -> BoundaryResult<u32>
    where
        M: LinearMemory + ?Sized,
    {
        if size == 0 {
            return Ok(0);
        }
        let at = align_up(self.cursor, align)?;
        let len = align_up(size, align)?;
        let start = mem.reserve(at, len)?;
        debug_assert_eq!(start % align, 0);
        self.cursor = start
            .checked_add(len)
            .ok_or(BoundaryError::AddressSpaceExhausted)?;
        trace!(size, align, offset = start, "bump allocation");
        Ok(start)
    }
}
