//! The allocator interface used by secret containers.

#[cfg(any(test, not(feature = "alloc"), not(feature = "allocator-api2")))]
use core::alloc::Layout;
#[cfg(not(feature = "allocator-api2"))]
use core::fmt;
#[cfg(not(feature = "allocator-api2"))]
use core::ptr;
#[cfg(any(not(feature = "alloc"), not(feature = "allocator-api2")))]
use core::ptr::NonNull;

#[cfg(all(feature = "alloc", not(feature = "allocator-api2")))]
use core::mem::transmute;

#[cfg(all(feature = "alloc", not(feature = "allocator-api2")))]
use alloc_crate::alloc::{alloc as raw_alloc, dealloc as raw_dealloc};

#[cfg(all(feature = "alloc", feature = "allocator-api2"))]
pub use allocator_api2::alloc::Global;
#[cfg(feature = "allocator-api2")]
pub use allocator_api2::alloc::{AllocError, Allocator};

#[cfg(all(not(test), feature = "alloc"))]
pub use alloc_crate::alloc::handle_alloc_error;

#[cfg(any(test, not(feature = "alloc")))]
/// Report a failed secret allocation. Without the `alloc` feature, and in
/// unit tests, this panics instead of aborting.
pub fn handle_alloc_error(layout: Layout) -> ! {
    panic!("memory allocation of {} bytes failed", layout.size());
}

#[cfg(all(feature = "alloc", not(feature = "allocator-api2")))]
#[inline]
fn layout_dangling(layout: Layout) -> NonNull<u8> {
    // SAFETY: alignments are non-zero.
    #[allow(clippy::useless_transmute)]
    unsafe {
        NonNull::new_unchecked(transmute(layout.align()))
    }
}

/// An allocator could not provide the memory for a secret buffer.
#[cfg(not(feature = "allocator-api2"))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AllocError;

#[cfg(not(feature = "allocator-api2"))]
impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")
    }
}

#[cfg(all(feature = "std", not(feature = "allocator-api2")))]
impl std::error::Error for AllocError {}

/// An implementation of `Allocator` can allocate and deallocate arbitrary
/// blocks of data described via `Layout`.
///
/// Secret containers never resize their buffers, so only allocation and
/// release are required. The containers erase every buffer before handing
/// it back to `deallocate`: an implementation must not depend on the
/// contents of released memory, and it should not write to the region
/// itself so that the zero-before-release ordering can be observed by
/// wrapping allocators.
///
/// # Safety
/// A returned block must stay valid until it is passed back to `deallocate`,
/// even if the allocator is moved or cloned in between. A clone must accept
/// the blocks produced by the original, since `Secret::clone` releases
/// through the cloned allocator.
#[cfg(not(feature = "allocator-api2"))]
pub unsafe trait Allocator {
    /// Allocate a block for `layout`, or report failure.
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError>;

    /// Release a block. Secret containers only call this on erased memory.
    ///
    /// # Safety
    /// `ptr` must come from this allocator and `layout` must be the layout
    /// it was allocated with.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Allocate a block for `layout` with every byte set to zero. Used by
    /// the in-place fill constructors.
    #[inline]
    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let ptr = self.allocate(layout)?;
        // SAFETY: the result of `allocate` must be properly aligned
        unsafe { ptr::write_bytes(ptr.cast::<u8>().as_ptr(), 0, ptr.len()) };
        Ok(ptr)
    }
}

#[cfg(not(feature = "allocator-api2"))]
unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        (**self).allocate(layout)
    }

    #[inline]
    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        (**self).allocate_zeroed(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).deallocate(ptr, layout)
    }
}

/// Allocators which `Secret::new` and the other allocator-less
/// constructors can produce on their own.
pub trait AllocatorDefault: Allocator + Clone + Default {
    /// The constant initializer for this allocator.
    const DEFAULT: Self;
}

/// The process heap, and the default allocator of `Secret`.
///
/// Requires the `alloc` feature. Without it the type still exists so that
/// `Secret<T>` can name it, but allocating through it panics.
#[cfg(any(not(feature = "alloc"), not(feature = "allocator-api2")))]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "alloc", derive(Default, Copy))]
pub struct Global;

#[cfg(all(feature = "alloc", not(feature = "allocator-api2")))]
unsafe impl Allocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let ptr = if layout.size() == 0 {
            layout_dangling(layout)
        } else {
            let Some(ptr) = NonNull::new(unsafe { raw_alloc(layout) }) else {
                return Err(AllocError);
            };
            ptr
        };
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() > 0 {
            raw_dealloc(ptr.as_ptr(), layout);
        }
    }
}

#[cfg(not(feature = "alloc"))]
unsafe impl Allocator for Global {
    fn allocate(&self, _layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        panic!("the `alloc` feature is required to allocate secrets");
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {
        panic!("the `alloc` feature is required to allocate secrets");
    }
}

#[cfg(feature = "alloc")]
impl AllocatorDefault for Global {
    const DEFAULT: Self = Global;
}
