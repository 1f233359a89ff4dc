//! Linear memory as seen by the module.
//!
//! On wasm32 this is the module's own address space, grown page by page. Off wasm the
//! same contract is served by a byte vector, which is what hosts embedding the crate
//! (and the tests) use.

use aop_contracts::WASM_PAGE_SIZE;

use crate::error::{BoundaryError, BoundaryResult};

pub trait LinearMemory {
    /// Current size in bytes.
    fn size(&self) -> u64;

    /// Make `len` bytes usable starting at `at` or, if that is impossible, at a later
    /// page-aligned offset. Returns where the bytes start.
    fn reserve(&mut self, at: u32, len: u32) -> BoundaryResult<u32>;

    fn read(&self, offset: u32, len: u32) -> BoundaryResult<&[u8]>;

    fn write(&mut self, offset: u32, bytes: &[u8]) -> BoundaryResult<()>;
}

fn pages_for(len: u64) -> u64 {
    len.div_ceil(WASM_PAGE_SIZE as u64)
}

/// Offset 0 is the null offset: only empty ranges may start there.
fn check_range(offset: u32, len: u32, size: u64) -> BoundaryResult<()> {
    if (offset == 0 && len != 0) || offset as u64 + len as u64 > size {
        return Err(BoundaryError::OutOfBounds { offset, len, size });
    }
    Ok(())
}

/// Vector-backed memory. Grows in whole pages up to an optional page limit.
#[derive(Debug, Clone, Default)]
pub struct VecMemory {
    bytes: Vec<u8>,
    max_pages: Option<u32>,
}

impl VecMemory {
    pub fn new() -> Self {
        VecMemory::default()
    }

    pub fn with_pages(pages: u32) -> Self {
        VecMemory {
            bytes: vec![0; pages as usize * WASM_PAGE_SIZE as usize],
            max_pages: None,
        }
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn pages(&self) -> u32 {
        (self.bytes.len() / WASM_PAGE_SIZE as usize) as u32
    }
}

impl LinearMemory for VecMemory {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn reserve(&mut self, at: u32, len: u32) -> BoundaryResult<u32> {
        let end = at
            .checked_add(len)
            .ok_or(BoundaryError::AddressSpaceExhausted)? as u64;
        if end <= self.size() {
            return Ok(at);
        }
        let pages = pages_for(end);
        if let Some(max) = self.max_pages {
            if pages > max as u64 {
                return Err(BoundaryError::GrowFailed {
                    pages: (pages - self.pages() as u64) as u32,
                });
            }
        }
        self.bytes.resize((pages * WASM_PAGE_SIZE as u64) as usize, 0);
        Ok(at)
    }

    fn read(&self, offset: u32, len: u32) -> BoundaryResult<&[u8]> {
        check_range(offset, len, self.size())?;
        if len == 0 {
            return Ok(&[]);
        }
        let start = offset as usize;
        Ok(&self.bytes[start..start + len as usize])
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> BoundaryResult<()> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| BoundaryError::ResultTooLarge(bytes.len()))?;
        check_range(offset, len, self.size())?;
        let start = offset as usize;
        self.bytes[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// The pages a module grew for itself, tracked as one contiguous arena.
///
/// Requests inside the arena are served in place. Otherwise new pages are grown; if
/// they start exactly at the arena's end the arena is extended, else something else
/// grew memory in between and a fresh arena starts at the new pages. Offsets handed
/// out therefore never overlap memory this arena does not own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageArena {
    start: u32,
    end: u32,
}

impl PageArena {
    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// `grow(pages)` adds pages to the underlying memory and returns its previous size
    /// in pages, or `None` when memory cannot grow.
    pub fn reserve<G>(&mut self, at: u32, len: u32, grow: G) -> BoundaryResult<u32>
    where
        G: FnOnce(u64) -> Option<u64>,
    {
        let end = at
            .checked_add(len)
            .ok_or(BoundaryError::AddressSpaceExhausted)?;
        let in_arena = self.end != 0 && at >= self.start && at <= self.end;
        if in_arena && end <= self.end {
            return Ok(at);
        }
        let pages = pages_for(len as u64);
        let prev = grow(pages).ok_or(BoundaryError::GrowFailed {
            pages: pages as u32,
        })?;
        let start = prev * WASM_PAGE_SIZE as u64;
        let new_end = start + pages * WASM_PAGE_SIZE as u64;
        if new_end > u32::MAX as u64 {
            return Err(BoundaryError::AddressSpaceExhausted);
        }
        if in_arena && start == self.end as u64 {
            self.end = new_end as u32;
            return Ok(at);
        }
        self.start = start as u32;
        self.end = new_end as u32;
        Ok(self.start)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::WasmMemory;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use core::arch::wasm32;

    use aop_contracts::WASM_PAGE_SIZE;

    use super::{check_range, LinearMemory, PageArena};
    use crate::error::{BoundaryError, BoundaryResult};

    /// The module's own memory 0.
    ///
    /// Bump allocations only land in pages grown through the [`PageArena`], so they
    /// cannot overlap the Rust stack, static data, or the global allocator's heap.
    #[derive(Debug, Default)]
    pub struct WasmMemory {
        arena: PageArena,
    }

    impl WasmMemory {
        pub fn new() -> Self {
            WasmMemory::default()
        }
    }

    fn grow(pages: u64) -> Option<u64> {
        let prev = wasm32::memory_grow(0, usize::try_from(pages).ok()?);
        (prev != usize::MAX).then_some(prev as u64)
    }

    impl LinearMemory for WasmMemory {
        fn size(&self) -> u64 {
            wasm32::memory_size(0) as u64 * WASM_PAGE_SIZE as u64
        }

        fn reserve(&mut self, at: u32, len: u32) -> BoundaryResult<u32> {
            self.arena.reserve(at, len, grow)
        }

        fn read(&self, offset: u32, len: u32) -> BoundaryResult<&[u8]> {
            check_range(offset, len, self.size())?;
            if len == 0 {
                return Ok(&[]);
            }
            // SAFETY: the range is non-null and lies inside memory 0, which never shrinks.
            Ok(unsafe { core::slice::from_raw_parts(offset as usize as *const u8, len as usize) })
        }

        fn write(&mut self, offset: u32, bytes: &[u8]) -> BoundaryResult<()> {
            let len = u32::try_from(bytes.len())
                .map_err(|_| BoundaryError::ResultTooLarge(bytes.len()))?;
            check_range(offset, len, self.size())?;
            if len != 0 {
                // SAFETY: bounds and non-null checked above; callers only write into
                // reserved ranges.
                unsafe {
                    core::ptr::copy_nonoverlapping(
                        bytes.as_ptr(),
                        offset as usize as *mut u8,
                        bytes.len(),
                    );
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_grows_in_whole_pages() {
        let mut mem = VecMemory::new();
        assert_eq!(mem.reserve(65536, 8).expect("reserve"), 65536);
        assert_eq!(mem.pages(), 2);
        assert_eq!(mem.reserve(65544, 65536).expect("reserve"), 65544);
        assert_eq!(mem.pages(), 3);
    }

    #[test]
    fn reserve_respects_page_limit() {
        let mut mem = VecMemory::with_pages(1).with_max_pages(2);
        assert!(mem.reserve(65536, 65536).is_ok());
        assert_eq!(
            mem.reserve(131072, 1),
            Err(BoundaryError::GrowFailed { pages: 1 })
        );
    }

    #[test]
    fn reserve_past_u32_is_exhaustion() {
        let mut mem = VecMemory::new();
        assert_eq!(
            mem.reserve(u32::MAX - 3, 8),
            Err(BoundaryError::AddressSpaceExhausted)
        );
    }

    #[test]
    fn reads_and_writes_are_bounds_checked() {
        let mut mem = VecMemory::with_pages(1);
        mem.write(10, b"abc").expect("write");
        assert_eq!(mem.read(10, 3).expect("read"), b"abc");
        assert!(matches!(
            mem.read(65535, 2),
            Err(BoundaryError::OutOfBounds { offset: 65535, len: 2, .. })
        ));
        assert!(mem.write(65534, b"xyz").is_err());
        assert_eq!(mem.read(65536, 0).expect("empty read at end"), b"");
    }

    #[test]
    fn null_offset_only_admits_empty_ranges() {
        let mut mem = VecMemory::with_pages(1);
        assert_eq!(mem.read(0, 0).expect("empty read"), b"");
        assert!(mem.write(0, b"").is_ok());
        assert!(matches!(
            mem.read(0, 1),
            Err(BoundaryError::OutOfBounds { offset: 0, len: 1, .. })
        ));
        assert!(matches!(
            mem.write(0, b"x"),
            Err(BoundaryError::OutOfBounds { offset: 0, len: 1, .. })
        ));
    }

    /// Stand-in for `memory.grow`: a page counter with an optional ceiling.
    struct Pages {
        count: u64,
        max: u64,
    }

    impl Pages {
        fn new(count: u64) -> Self {
            Pages { count, max: 1 << 16 }
        }

        fn grow(&mut self, n: u64) -> Option<u64> {
            if self.count + n > self.max {
                return None;
            }
            let prev = self.count;
            self.count += n;
            Some(prev)
        }
    }

    const PAGE: u32 = WASM_PAGE_SIZE;

    #[test]
    fn first_reservation_starts_at_freshly_grown_pages() {
        let mut pages = Pages::new(17);
        let mut arena = PageArena::default();
        let at = arena
            .reserve(PAGE, 8, |n| pages.grow(n))
            .expect("reserve");
        assert_eq!(at, 17 * PAGE);
        assert_eq!((arena.start(), arena.end()), (17 * PAGE, 18 * PAGE));
    }

    #[test]
    fn requests_inside_the_arena_do_not_grow() {
        let mut pages = Pages::new(2);
        let mut arena = PageArena::default();
        let base = arena.reserve(PAGE, 8, |n| pages.grow(n)).expect("reserve");
        let at = arena
            .reserve(base + 8, PAGE - 8, |n| pages.grow(n))
            .expect("reserve");
        assert_eq!(at, base + 8);
        assert_eq!(pages.count, 3);
    }

    #[test]
    fn contiguous_growth_extends_the_arena() {
        let mut pages = Pages::new(2);
        let mut arena = PageArena::default();
        let base = arena.reserve(PAGE, 8, |n| pages.grow(n)).expect("reserve");
        let at = arena
            .reserve(base + 8, PAGE, |n| pages.grow(n))
            .expect("reserve");
        assert_eq!(at, base + 8, "spans the old and the new page");
        assert_eq!((arena.start(), arena.end()), (base, base + 2 * PAGE));
    }

    #[test]
    fn foreign_growth_starts_a_fresh_arena() {
        let mut pages = Pages::new(2);
        let mut arena = PageArena::default();
        let base = arena.reserve(PAGE, 8, |n| pages.grow(n)).expect("reserve");
        // The global allocator takes a page between two of our requests.
        pages.grow(1).expect("foreign grow");
        let at = arena
            .reserve(base + 8, PAGE, |n| pages.grow(n))
            .expect("reserve");
        assert_eq!(at, base + 2 * PAGE);
        assert_eq!((arena.start(), arena.end()), (at, at + PAGE));
    }

    #[test]
    fn grow_failure_leaves_the_arena_unchanged() {
        let mut pages = Pages::new(2);
        pages.max = 3;
        let mut arena = PageArena::default();
        let base = arena.reserve(PAGE, 8, |n| pages.grow(n)).expect("reserve");
        let before = arena;
        assert_eq!(
            arena.reserve(base + 8, 2 * PAGE, |n| pages.grow(n)),
            Err(BoundaryError::GrowFailed { pages: 2 })
        );
        assert_eq!(arena, before);
    }

    #[test]
    fn arena_past_u32_is_exhaustion() {
        let mut arena = PageArena::default();
        assert_eq!(
            arena.reserve(PAGE, 8, |_| Some(1 << 16)),
            Err(BoundaryError::AddressSpaceExhausted)
        );
    }

    /// Vector memory whose reservations go through a [`PageArena`], with optional
    /// foreign growth between requests.
    struct ArenaMemory {
        bytes: VecMemory,
        pages: Pages,
        arena: PageArena,
    }

    impl LinearMemory for ArenaMemory {
        fn size(&self) -> u64 {
            self.pages.count * WASM_PAGE_SIZE as u64
        }

        fn reserve(&mut self, at: u32, len: u32) -> BoundaryResult<u32> {
            let pages = &mut self.pages;
            let start = self.arena.reserve(at, len, |n| pages.grow(n))?;
            self.bytes.reserve(start, len)
        }

        fn read(&self, offset: u32, len: u32) -> BoundaryResult<&[u8]> {
            self.bytes.read(offset, len)
        }

        fn write(&mut self, offset: u32, bytes: &[u8]) -> BoundaryResult<()> {
            self.bytes.write(offset, bytes)
        }
    }

    proptest::proptest! {
        #[test]
        fn arena_offsets_are_aligned_and_strictly_increasing(
            steps in proptest::collection::vec((1u32..100_000, proptest::bool::ANY, proptest::bool::ANY), 1..48)
        ) {
            use crate::alloc::BumpAllocator;

            let mut mem = ArenaMemory {
                bytes: VecMemory::new(),
                pages: Pages::new(2),
                arena: PageArena::default(),
            };
            let mut heap = BumpAllocator::new(aop_contracts::DEFAULT_HEAP_ORIGIN);
            let mut last = 0u32;
            for (size, stack, foreign) in steps {
                if foreign {
                    mem.pages.grow(1).expect("foreign grow");
                }
                let align = if stack { 16 } else { 8 };
                let p = heap.allocate(&mut mem, size, align).expect("allocate");
                proptest::prop_assert_eq!(p % align, 0);
                proptest::prop_assert!(p > last, "p={} last={}", p, last);
                proptest::prop_assert!(p >= mem.arena.start());
                proptest::prop_assert!(p as u64 + size as u64 <= mem.arena.end() as u64);
                mem.write(p, &vec![0xab; size as usize]).expect("write inside arena");
                last = p;
            }
        }
    }
}
