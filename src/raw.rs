use core::alloc::Layout;
use core::mem;
use core::ptr::{self, NonNull};
use core::slice;

use crate::alloc::Allocator;
use crate::bytes::{secure_erase, ByteRepr};
use crate::error::StorageError;

/// An owned allocation holding a non-empty sequence of secret elements.
///
/// The buffer does not know its allocator and has no destructor: the owning
/// container is responsible for calling `release_in` exactly once.
pub(crate) struct RawSecret<T> {
    ptr: NonNull<[T]>,
}

impl<T: ByteRepr> RawSecret<T> {
    #[inline]
    fn alloc_in<A>(alloc: &A, len: usize, zeroed: bool) -> Result<NonNull<[T]>, StorageError>
    where
        A: Allocator + ?Sized,
    {
        let layout = Layout::array::<T>(len)?;
        assert!(layout.size() > 0, "secret must not be empty");
        let ptr = if zeroed {
            alloc.allocate_zeroed(layout)
        } else {
            alloc.allocate(layout)
        }
        .map_err(|_| StorageError::AllocError(layout))?;
        trace_event!("allocated secret [{}; {}]", core::any::type_name::<T>(), len);
        Ok(NonNull::slice_from_raw_parts(ptr.cast::<T>(), len))
    }

    /// Allocate a new buffer and copy `source` into it.
    pub fn copy_in<A>(alloc: &A, source: &[T]) -> Result<Self, StorageError>
    where
        A: Allocator + ?Sized,
    {
        let ptr = Self::alloc_in(alloc, source.len(), false)?;
        unsafe {
            ptr::copy_nonoverlapping(source.as_ptr(), ptr.as_ptr().cast::<T>(), source.len())
        };
        Ok(Self { ptr })
    }

    /// Allocate a new buffer, copy `source` into it and erase `source`.
    /// The source is erased even when the allocation fails.
    pub fn take_in<A>(alloc: &A, source: &mut [T]) -> Result<Self, StorageError>
    where
        A: Allocator + ?Sized,
    {
        let result = Self::copy_in(alloc, source);
        secure_erase(source);
        result
    }

    /// Call `f` exactly once, copy the result into a new buffer and erase
    /// the temporary value.
    pub fn from_fn_in<A, F, R>(alloc: &A, f: F) -> Result<Self, StorageError>
    where
        A: Allocator + ?Sized,
        F: FnOnce() -> R,
        R: AsMut<[T]>,
    {
        let mut value = f();
        Self::take_in(alloc, value.as_mut())
    }

    /// Allocate a zeroed buffer of `len` elements and initialize it in place.
    /// If `f` panics, the buffer is erased and released before unwinding
    /// continues.
    pub fn fill_in<A, F>(alloc: &A, len: usize, f: F) -> Result<Self, StorageError>
    where
        A: Allocator + ?Sized,
        F: FnOnce(&mut [T]),
    {
        struct ReleaseOnUnwind<'a, T: ByteRepr, A: Allocator + ?Sized> {
            ptr: NonNull<[T]>,
            alloc: &'a A,
        }

        impl<T: ByteRepr, A: Allocator + ?Sized> Drop for ReleaseOnUnwind<'_, T, A> {
            fn drop(&mut self) {
                unsafe { RawSecret { ptr: self.ptr }.release_in(self.alloc) };
            }
        }

        let ptr = Self::alloc_in(alloc, len, true)?;
        let guard = ReleaseOnUnwind { ptr, alloc };
        // SAFETY: the buffer is zero-initialized, which is a valid `T`.
        f(unsafe { &mut *ptr.as_ptr() });
        mem::forget(guard);
        Ok(Self { ptr })
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr().cast::<T>()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.as_ptr(), self.len()) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr().cast::<T>(), self.len()) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ptr.len()
    }

    #[inline]
    pub fn wipe(&mut self) {
        secure_erase(self.as_mut_slice());
    }

    #[inline]
    fn layout(&self) -> Layout {
        Layout::for_value(self.as_slice())
    }

    /// Erase the buffer and return it to the allocator.
    ///
    /// # Safety
    /// `alloc` must be the allocator which produced this buffer, or a clone of it.
    pub unsafe fn release_in<A>(mut self, alloc: &A)
    where
        A: Allocator + ?Sized,
    {
        self.wipe();
        let layout = self.layout();
        trace_event!("releasing secret [{}; {}]", core::any::type_name::<T>(), self.len());
        alloc.deallocate(self.ptr.cast(), layout);
    }
}

unsafe impl<T: Send> Send for RawSecret<T> {}
unsafe impl<T: Sync> Sync for RawSecret<T> {}
