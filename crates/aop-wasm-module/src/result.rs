use aop_contracts::HEAP_ALIGN;
use tracing::debug;

use crate::alloc::BumpAllocator;
use crate::error::{BoundaryError, BoundaryResult};
use crate::memory::LinearMemory;

/// The one outstanding result of the last `handle` call.
///
/// The host reads it in two calls: the offset returned by `handle`, then
/// `getResultLength`. Each `store` replaces the previous result; bytes of the previous
/// result may be overwritten in place when the new one fits its slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultBuffer {
    offset: u32,
    len: u32,
    capacity: u32,
}

impl ResultBuffer {
    pub fn store<M>(
        &mut self,
        heap: &mut BumpAllocator,
        mem: &mut M,
        bytes: &[u8],
    ) -> BoundaryResult<u32>
    where
        M: LinearMemory + ?Sized,
    {
        let len =
            u32::try_from(bytes.len()).map_err(|_| BoundaryError::ResultTooLarge(bytes.len()))?;
        if self.offset == 0 || len > self.capacity {
            self.offset = heap.allocate(mem, len, HEAP_ALIGN)?;
            self.capacity = len;
        }
        mem.write(self.offset, bytes)?;
        self.len = len;
        debug!(offset = self.offset, len, "stored result");
        Ok(self.offset)
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn length(&self) -> u32 {
        self.len
    }

    pub fn bytes<'m, M>(&self, mem: &'m M) -> BoundaryResult<&'m [u8]>
    where
        M: LinearMemory + ?Sized,
    {
        mem.read(self.offset, self.len)
    }
}
