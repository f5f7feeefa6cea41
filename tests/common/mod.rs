#![allow(dead_code)]

use core::alloc::Layout;
use core::cell::{Cell, RefCell};
use core::ptr::NonNull;
use core::slice;

use flex_secret::alloc::{AllocError, Allocator, Global};
use flex_secret::bytes::is_zeroed;

/// Allocator wrapper which checks that every released region is zeroed,
/// panicking on the first non-zero byte. Released regions are logged before
/// being handed to the raw `deallocate` of the inner allocator.
#[derive(Debug)]
pub struct ZeroCheckAlloc<A: Allocator = Global> {
    alloc: A,
    live: Cell<usize>,
    released: RefCell<Vec<Vec<u8>>>,
}

impl ZeroCheckAlloc {
    pub fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<A: Allocator> ZeroCheckAlloc<A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            alloc,
            live: Cell::new(0),
            released: RefCell::new(Vec::new()),
        }
    }

    /// The number of allocations which have not been released.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// Copies of each released region, in order of release.
    pub fn released(&self) -> Vec<Vec<u8>> {
        self.released.borrow().clone()
    }

    /// Assert that `count` regions were released and all of them were zeroed.
    #[track_caller]
    pub fn assert_released_zeroed(&self, count: usize) {
        let released = self.released.borrow();
        assert_eq!(released.len(), count, "unexpected number of releases");
        for region in released.iter() {
            assert!(!region.is_empty(), "released an empty region");
            assert!(is_zeroed(region), "released memory was not zeroed");
        }
    }
}

unsafe impl<A: Allocator> Allocator for ZeroCheckAlloc<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let ptr = self.alloc.allocate(layout)?;
        self.live.set(self.live.get() + 1);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        let region = unsafe { slice::from_raw_parts(ptr.as_ptr(), layout.size()) };
        assert!(!region.is_empty(), "released an empty region");
        assert!(is_zeroed(region), "released memory was not zeroed");
        self.released.borrow_mut().push(Vec::from(region));
        self.live.set(self.live.get() - 1);
        self.alloc.deallocate(ptr, layout)
    }
}

/// Allocator which always fails, counting the attempts.
#[derive(Debug, Default)]
pub struct FailingAlloc {
    attempts: Cell<usize>,
}

impl FailingAlloc {
    pub fn attempts(&self) -> usize {
        self.attempts.get()
    }
}

unsafe impl Allocator for FailingAlloc {
    fn allocate(&self, _layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.attempts.set(self.attempts.get() + 1);
        Err(AllocError)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {
        panic!("nothing to release");
    }
}
