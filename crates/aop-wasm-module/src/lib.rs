//! wasm32 boundary for the AO process module.
//!
//! The loader writes a message and an environment record into linear memory, calls
//! `handle(msg_ptr, msg_len, env_ptr, env_len)`, receives the offset of a JSON
//! envelope, and then calls `getResultLength` for its size. This crate supplies that
//! contract: a bump allocator, the single result buffer, the emscripten-style stack
//! shims the loader expects, and the exported symbols themselves.
//!
//! The exports are only compiled for `wasm32-unknown-unknown`; everywhere else the
//! same behaviour is reachable through [`ModuleInstance`] over a [`VecMemory`].

pub mod alloc;
pub mod config;
pub mod error;
pub mod instance;
pub mod memory;
pub mod result;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod exports;

pub use alloc::BumpAllocator;
pub use config::{ModuleConfig, ModuleVariant};
pub use error::{BoundaryError, BoundaryResult};
pub use instance::ModuleInstance;
#[cfg(target_arch = "wasm32")]
pub use memory::WasmMemory;
pub use memory::{LinearMemory, PageArena, VecMemory};
pub use result::ResultBuffer;
