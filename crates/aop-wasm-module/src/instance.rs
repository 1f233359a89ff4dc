use aop_contracts::HEAP_ALIGN;
use aop_process::Processor;
use tracing::debug;

use crate::alloc::BumpAllocator;
use crate::config::ModuleConfig;
use crate::error::{BoundaryError, BoundaryResult};
use crate::memory::LinearMemory;
use crate::result::ResultBuffer;

/// All mutable state of one instantiation of the module.
///
/// Calls must not overlap: the loader invokes `handle`, reads the result, and only
/// then calls again. Nothing here enforces that.
#[derive(Debug)]
pub struct ModuleInstance<M> {
    config: ModuleConfig,
    memory: M,
    heap: BumpAllocator,
    result: ResultBuffer,
    processor: Processor,
}

impl<M: LinearMemory> ModuleInstance<M> {
    pub fn new(config: ModuleConfig, memory: M) -> BoundaryResult<Self> {
        Self::with_processor(config, memory, Processor::default())
    }

    pub fn with_processor(
        config: ModuleConfig,
        memory: M,
        processor: Processor,
    ) -> BoundaryResult<Self> {
        config.validate()?;
        Ok(ModuleInstance {
            config,
            memory,
            heap: BumpAllocator::new(config.heap_origin),
            result: ResultBuffer::default(),
            processor,
        })
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Run one message through the processor and store the envelope.
    ///
    /// Decode problems come back as a failure envelope at the returned offset; an
    /// `Err` here means the inputs or the result could not be moved across the
    /// boundary at all.
    pub fn handle(
        &mut self,
        msg_ptr: u32,
        msg_len: u32,
        env_ptr: u32,
        env_len: u32,
    ) -> BoundaryResult<u32> {
        let out = {
            let msg = read_input(&self.memory, msg_ptr, msg_len)?;
            let env = read_input(&self.memory, env_ptr, env_len)?;
            debug!(msg_len, env_len, "handle");
            self.processor.handle(msg, env)
        };
        self.result.store(&mut self.heap, &mut self.memory, &out)
    }

    pub fn result_length(&self) -> u32 {
        self.result.length()
    }

    pub fn result_bytes(&self) -> BoundaryResult<&[u8]> {
        self.result.bytes(&self.memory)
    }

    pub fn allocate(&mut self, size: u32) -> BoundaryResult<u32> {
        if self.config.host_allocator() {
            return Err(BoundaryError::AllocatorNotExported);
        }
        self.heap.allocate(&mut self.memory, size, HEAP_ALIGN)
    }

    pub fn release(&mut self, _ptr: u32) {}

    /// Copy `bytes` into freshly allocated memory; returns `(offset, len)`.
    pub fn place(&mut self, bytes: &[u8]) -> BoundaryResult<(u32, u32)> {
        let len =
            u32::try_from(bytes.len()).map_err(|_| BoundaryError::ResultTooLarge(bytes.len()))?;
        let offset = self.heap.allocate(&mut self.memory, len, HEAP_ALIGN)?;
        self.memory.write(offset, bytes)?;
        Ok((offset, len))
    }
}

#[cfg(feature = "emscripten-abi")]
impl<M: LinearMemory> ModuleInstance<M> {
    /// No call stack is tracked; the "stack pointer" is the heap cursor.
    pub fn stack_save(&self) -> u32 {
        self.heap.cursor()
    }

    pub fn stack_restore(&mut self, _ptr: u32) {}

    pub fn stack_alloc(&mut self, size: u32) -> BoundaryResult<u32> {
        self.heap.allocate(&mut self.memory, size, aop_contracts::STACK_ALIGN)
    }

    pub fn stack_end(&self) -> u32 {
        self.config.stack_end
    }
}

fn read_input<M: LinearMemory>(mem: &M, ptr: u32, len: u32) -> BoundaryResult<&[u8]> {
    if ptr == 0 || len == 0 {
        return Ok(&[]);
    }
    mem.read(ptr, len)
}
