//! Symbols the AO loader looks up on the compiled module.
//!
//! Every export goes through the single process-wide [`ModuleInstance`]. Boundary
//! faults have no return channel, so they are logged and turned into a trap.

use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::OnceCell;
use tracing::error;

use crate::config::ModuleConfig;
use crate::error::{BoundaryError, BoundaryResult, TRAP_ABORT};
use crate::instance::ModuleInstance;
use crate::memory::WasmMemory;

static INSTANCE: OnceCell<Mutex<ModuleInstance<WasmMemory>>> = OnceCell::new();

fn instance() -> MutexGuard<'static, ModuleInstance<WasmMemory>> {
    let cell = INSTANCE
        .get_or_try_init(|| {
            ModuleInstance::new(ModuleConfig::for_build(), WasmMemory::new()).map(Mutex::new)
        })
        .unwrap_or_else(|e| trap(e));
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

fn trap(err: BoundaryError) -> ! {
    error!(code = err.trap_code(), error = %err, "module trap");
    core::arch::wasm32::unreachable()
}

fn guarded<T>(f: impl FnOnce() -> BoundaryResult<T> + std::panic::UnwindSafe) -> T {
    std::panic::catch_unwind(f)
        .unwrap_or(Err(BoundaryError::Panicked))
        .unwrap_or_else(|e| trap(e))
}

#[no_mangle]
pub extern "C" fn handle(msg_ptr: u32, msg_len: u32, env_ptr: u32, env_len: u32) -> u32 {
    guarded(|| instance().handle(msg_ptr, msg_len, env_ptr, env_len))
}

#[export_name = "getResultLength"]
pub extern "C" fn result_length() -> u32 {
    instance().result_length()
}

#[cfg(feature = "bump-malloc")]
#[export_name = "malloc"]
pub extern "C" fn allocate(size: u32) -> u32 {
    guarded(|| instance().allocate(size))
}

#[cfg(feature = "bump-malloc")]
#[export_name = "free"]
pub extern "C" fn release(ptr: u32) {
    instance().release(ptr)
}

#[no_mangle]
pub extern "C" fn abort() {
    error!(code = TRAP_ABORT, "abort called");
    core::arch::wasm32::unreachable()
}

#[export_name = "main"]
pub extern "C" fn module_main() {}

/// Nothing is buffered, so there is never anything to flush.
#[export_name = "fflush"]
pub extern "C" fn flush(_stream: u32) -> i32 {
    0
}

#[cfg(feature = "emscripten-abi")]
mod emscripten {
    use super::{guarded, instance};

    #[export_name = "stackSave"]
    pub extern "C" fn stack_save() -> u32 {
        instance().stack_save()
    }

    #[export_name = "stackRestore"]
    pub extern "C" fn stack_restore(ptr: u32) {
        instance().stack_restore(ptr)
    }

    #[export_name = "stackAlloc"]
    pub extern "C" fn stack_alloc(size: u32) -> u32 {
        guarded(|| instance().stack_alloc(size))
    }

    #[export_name = "_emscripten_stack_get_end"]
    pub extern "C" fn stack_end() -> u32 {
        instance().stack_end()
    }

    #[export_name = "emscripten_stack_get_end"]
    pub extern "C" fn stack_end_alias() -> u32 {
        stack_end()
    }

    #[export_name = "_emscripten_stack_init"]
    pub extern "C" fn stack_init() {}

    #[export_name = "emscripten_stack_init"]
    pub extern "C" fn stack_init_alias() {}
}
