use thiserror::Error;

// Trap code space for boundary faults. There is no channel to hand these to the
// loader; they are logged right before the module traps.
pub const TRAP_OUT_OF_BOUNDS: i32 = 9900;
pub const TRAP_OUT_OF_MEMORY: i32 = 9901;
pub const TRAP_RESULT_TOO_LARGE: i32 = 9902;
pub const TRAP_NO_ALLOCATOR: i32 = 9903;
pub const TRAP_BAD_CONFIG: i32 = 9904;
pub const TRAP_PANIC: i32 = 9905;
pub const TRAP_ABORT: i32 = 9999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundaryError {
    #[error("range {offset}+{len} is outside linear memory of {size} bytes")]
    OutOfBounds { offset: u32, len: u32, size: u64 },

    #[error("linear memory cannot grow by {pages} pages")]
    GrowFailed { pages: u32 },

    #[error("32-bit address space exhausted")]
    AddressSpaceExhausted,

    #[error("result of {0} bytes does not fit a 32-bit length")]
    ResultTooLarge(usize),

    #[error("allocation is served by the toolchain allocator, not this module")]
    AllocatorNotExported,

    #[error("invalid module config: {0}")]
    InvalidConfig(&'static str),

    #[error("panic inside an exported call")]
    Panicked,
}

impl BoundaryError {
    pub fn trap_code(&self) -> i32 {
        match self {
            BoundaryError::OutOfBounds { .. } => TRAP_OUT_OF_BOUNDS,
            BoundaryError::GrowFailed { .. } | BoundaryError::AddressSpaceExhausted => {
                TRAP_OUT_OF_MEMORY
            }
            BoundaryError::ResultTooLarge(_) => TRAP_RESULT_TOO_LARGE,
            BoundaryError::AllocatorNotExported => TRAP_NO_ALLOCATOR,
            BoundaryError::InvalidConfig(_) => TRAP_BAD_CONFIG,
            BoundaryError::Panicked => TRAP_PANIC,
        }
    }
}

pub type BoundaryResult<T> = Result<T, BoundaryError>;
