//! Shared, pinned protocol identifiers.
//!
//! Every name and number the AO loader observes: envelope field names, fixed error
//! texts, exported symbol names, and the linear-memory layout. Places that must spell
//! a name as a literal (serde renames, `export_name` attributes) are checked against
//! these constants in their crates' tests. Renaming any of them breaks the host
//! contract.

// Envelope (top level).
pub const ENVELOPE_OK_FIELD: &str = "ok";
pub const ENVELOPE_RESPONSE_FIELD: &str = "response";

// ProcessResponse / error record.
pub const RESPONSE_OUTPUT_FIELD: &str = "Output";
pub const RESPONSE_ERROR_FIELD: &str = "Error";
pub const RESPONSE_MESSAGES_FIELD: &str = "Messages";
pub const RESPONSE_SPAWNS_FIELD: &str = "Spawns";
pub const RESPONSE_ASSIGNMENTS_FIELD: &str = "Assignments";
pub const RESPONSE_GAS_USED_FIELD: &str = "GasUsed";

// Inbound message.
pub const MESSAGE_TAGS_FIELD: &str = "Tags";
pub const TAG_NAME_FIELD: &str = "name";
pub const TAG_VALUE_FIELD: &str = "value";

pub const ACTION_TAG_NAME: &str = "Action";
pub const ACTION_DEFAULT: &str = "Default";
pub const ACTION_HELLO: &str = "Hello";

pub const OUTPUT_HELLO: &str = "Hello, world!";
pub const OUTPUT_UNKNOWN_ACTION: &str = "Unknown action";

pub const ERR_INVALID_MESSAGE_JSON: &str = "Invalid message JSON";
pub const ERR_MARSHAL_RESPONSE: &str = "Failed to marshal response";

/// Size of one wasm linear-memory page.
pub const WASM_PAGE_SIZE: u32 = 65536;

/// Heap origin used by both builds: the first byte after the initial page.
pub const DEFAULT_HEAP_ORIGIN: u32 = 65536;

/// Value reported by `emscripten_stack_get_end` (128 KiB).
pub const DEFAULT_STACK_END: u32 = 131072;

pub const HEAP_ALIGN: u32 = 8;
pub const STACK_ALIGN: u32 = 16;

/// Exported symbol names expected by the AO loader.
pub mod symbols {
    pub const HANDLE: &str = "handle";
    pub const RESULT_LENGTH: &str = "getResultLength";
    pub const MALLOC: &str = "malloc";
    pub const FREE: &str = "free";
    pub const ABORT: &str = "abort";
    pub const MAIN: &str = "main";
    pub const FFLUSH: &str = "fflush";
    pub const STACK_SAVE: &str = "stackSave";
    pub const STACK_RESTORE: &str = "stackRestore";
    pub const STACK_ALLOC: &str = "stackAlloc";
    pub const STACK_INIT: &str = "emscripten_stack_init";
    pub const STACK_INIT_INTERNAL: &str = "_emscripten_stack_init";
    pub const STACK_GET_END: &str = "emscripten_stack_get_end";
    pub const STACK_GET_END_INTERNAL: &str = "_emscripten_stack_get_end";

    pub const WASM_CALL_CTORS: &str = "__wasm_call_ctors";
    pub const INDIRECT_FUNCTION_TABLE: &str = "__indirect_function_table";

    /// Symbols defined in Rust by the module itself.
    pub const DEFINED: &[&str] = &[
        HANDLE,
        RESULT_LENGTH,
        MALLOC,
        FREE,
        ABORT,
        MAIN,
        FFLUSH,
        STACK_SAVE,
        STACK_RESTORE,
        STACK_ALLOC,
        STACK_INIT,
        STACK_INIT_INTERNAL,
        STACK_GET_END,
        STACK_GET_END_INTERNAL,
    ];

    /// Symbols the linker synthesizes; the build script asks for them to be exported.
    pub const LINKER_PROVIDED: &[&str] = &[WASM_CALL_CTORS, INDIRECT_FUNCTION_TABLE];
}
