//! Build variants of the module.
//!
//! The loader accepts two flavours of the same module. They differ only in where the
//! heap starts and in whether `malloc`/`free` come from this module or from the
//! toolchain; everything else is shared.

use aop_contracts::{DEFAULT_HEAP_ORIGIN, DEFAULT_STACK_END, STACK_ALIGN};

use crate::error::{BoundaryError, BoundaryResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ModuleVariant {
    /// Serves `malloc`/`free` from the module's own bump allocator.
    #[default]
    Simple,
    /// Relies on an allocator the toolchain links in.
    ToolchainAllocator,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModuleConfig {
    pub variant: ModuleVariant,
    /// First offset the bump allocator may hand out. Never 0, which is the null offset.
    pub heap_origin: u32,
    /// Reported by `emscripten_stack_get_end`.
    pub stack_end: u32,
}

impl ModuleVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleVariant::Simple => "simple",
            ModuleVariant::ToolchainAllocator => "toolchain-allocator",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "simple" => Some(ModuleVariant::Simple),
            "toolchain-allocator" => Some(ModuleVariant::ToolchainAllocator),
            _ => None,
        }
    }

    pub fn config(self) -> ModuleConfig {
        ModuleConfig {
            variant: self,
            heap_origin: DEFAULT_HEAP_ORIGIN,
            stack_end: DEFAULT_STACK_END,
        }
    }

    /// Variant selected by the crate's Cargo features.
    pub fn for_build() -> Self {
        if cfg!(feature = "bump-malloc") {
            ModuleVariant::Simple
        } else {
            ModuleVariant::ToolchainAllocator
        }
    }
}

impl ModuleConfig {
    pub fn for_build() -> Self {
        ModuleVariant::for_build().config()
    }

    /// True when allocation requests are served outside this module.
    pub fn host_allocator(&self) -> bool {
        self.variant == ModuleVariant::ToolchainAllocator
    }

    pub fn with_heap_origin(mut self, heap_origin: u32) -> Self {
        self.heap_origin = heap_origin;
        self
    }

    pub fn validate(&self) -> BoundaryResult<()> {
        if self.heap_origin == 0 {
            return Err(BoundaryError::InvalidConfig("heap origin must be non-zero"));
        }
        if self.heap_origin % STACK_ALIGN != 0 {
            return Err(BoundaryError::InvalidConfig(
                "heap origin must be 16-byte aligned",
            ));
        }
        if self.stack_end % STACK_ALIGN != 0 {
            return Err(BoundaryError::InvalidConfig(
                "stack end must be 16-byte aligned",
            ));
        }
        Ok(())
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        ModuleVariant::default().config()
    }
}
