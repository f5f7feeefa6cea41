//! A secret container which is released through a caller-provided allocator.

use core::any::type_name;
use core::fmt;
use core::mem::ManuallyDrop;
use core::ptr;

#[cfg(feature = "rand_core")]
use rand_core::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::alloc::Allocator;
use crate::bytes::ByteRepr;
use crate::error::StorageError;
use crate::expose::ExposeSecret;
use crate::raw::RawSecret;

/// A non-empty sequence of secret elements which does not store its
/// allocator.
///
/// Every operation which allocates or releases memory takes the allocator
/// as an argument. The secret must be released by calling
/// [`deinit`](UnmanagedSecret::deinit) with the allocator that produced it.
/// If it is dropped instead, the content is still zeroed but the allocation
/// is leaked.
///
/// ```
/// use flex_secret::{alloc::Global, UnmanagedSecret};
///
/// let secret = UnmanagedSecret::new_in(b"api-token", &Global);
/// let copy = secret.clone_in(&Global);
/// assert!(secret.ct_eq(&copy));
/// unsafe {
///     copy.deinit(&Global);
///     secret.deinit(&Global);
/// }
/// ```
pub struct UnmanagedSecret<T: ByteRepr> {
    raw: RawSecret<T>,
}

impl<T: ByteRepr> UnmanagedSecret<T> {
    #[inline]
    pub(crate) fn from_raw(raw: RawSecret<T>) -> Self {
        Self { raw }
    }

    #[inline]
    pub(crate) fn into_raw(self) -> RawSecret<T> {
        let slf = ManuallyDrop::new(self);
        unsafe { ptr::read(&slf.raw) }
    }

    /// Copy `source` into a new secret allocated by `alloc`.
    /// The caller remains responsible for erasing `source`.
    ///
    /// # Panics
    /// Panics if `source` is empty or the allocation fails.
    pub fn new_in<A>(source: &[T], alloc: &A) -> Self
    where
        A: Allocator + ?Sized,
    {
        match Self::try_new_in(source, alloc) {
            Ok(slf) => slf,
            Err(e) => e.panic(),
        }
    }

    /// Try to copy `source` into a new secret allocated by `alloc`.
    ///
    /// # Panics
    /// Panics if `source` is empty.
    pub fn try_new_in<A>(source: &[T], alloc: &A) -> Result<Self, StorageError>
    where
        A: Allocator + ?Sized,
    {
        RawSecret::copy_in(alloc, source).map(Self::from_raw)
    }

    /// Copy `source` into a new secret allocated by `alloc`, then erase `source`.
    ///
    /// # Panics
    /// Panics if `source` is empty or the allocation fails.
    pub fn take_in<A>(source: &mut [T], alloc: &A) -> Self
    where
        A: Allocator + ?Sized,
    {
        match Self::try_take_in(source, alloc) {
            Ok(slf) => slf,
            Err(e) => e.panic(),
        }
    }

    /// Try to copy `source` into a new secret allocated by `alloc`.
    /// `source` is erased whether or not the allocation succeeds.
    ///
    /// # Panics
    /// Panics if `source` is empty.
    pub fn try_take_in<A>(source: &mut [T], alloc: &A) -> Result<Self, StorageError>
    where
        A: Allocator + ?Sized,
    {
        RawSecret::take_in(alloc, source).map(Self::from_raw)
    }

    /// Create a new secret allocated by `alloc` from the result of `f`.
    ///
    /// The closure is called exactly once. Its result is copied into the
    /// secret and then erased before being dropped.
    pub fn from_fn_in<A, F, R>(f: F, alloc: &A) -> Self
    where
        A: Allocator + ?Sized,
        F: FnOnce() -> R,
        R: AsMut<[T]>,
    {
        match Self::try_from_fn_in(f, alloc) {
            Ok(slf) => slf,
            Err(e) => e.panic(),
        }
    }

    /// Try to create a new secret allocated by `alloc` from the result of `f`.
    pub fn try_from_fn_in<A, F, R>(f: F, alloc: &A) -> Result<Self, StorageError>
    where
        A: Allocator + ?Sized,
        F: FnOnce() -> R,
        R: AsMut<[T]>,
    {
        RawSecret::from_fn_in(alloc, f).map(Self::from_raw)
    }

    /// Create a new secret of `len` elements allocated by `alloc`. The
    /// zero-initialized content is passed to `f` to be written in place.
    pub fn fill_in<A, F>(len: usize, f: F, alloc: &A) -> Self
    where
        A: Allocator + ?Sized,
        F: FnOnce(&mut [T]),
    {
        match Self::try_fill_in(len, f, alloc) {
            Ok(slf) => slf,
            Err(e) => e.panic(),
        }
    }

    /// Try to create a new secret of `len` elements allocated by `alloc`,
    /// initialized in place by `f`.
    pub fn try_fill_in<A, F>(len: usize, f: F, alloc: &A) -> Result<Self, StorageError>
    where
        A: Allocator + ?Sized,
        F: FnOnce(&mut [T]),
    {
        RawSecret::fill_in(alloc, len, f).map(Self::from_raw)
    }

    /// Generate a new random secret of `len` elements allocated by `alloc`.
    #[cfg(feature = "rand_core")]
    pub fn random_in<A>(mut rng: impl RngCore, len: usize, alloc: &A) -> Self
    where
        A: Allocator + ?Sized,
    {
        Self::fill_in(len, |buf| rng.fill_bytes(T::as_bytes_mut(buf)), alloc)
    }

    /// Expose the secret content for reading.
    #[inline]
    pub fn expose(&self) -> &[T] {
        self.raw.as_slice()
    }

    /// Expose the secret content for updating in place.
    #[inline]
    pub fn expose_mut(&mut self) -> &mut [T] {
        self.raw.as_mut_slice()
    }

    /// The number of elements in the secret. This is never zero.
    #[allow(clippy::len_without_is_empty)]
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Overwrite the secret content with zeros, keeping the allocation.
    #[inline]
    pub fn wipe(&mut self) {
        self.raw.wipe();
    }

    /// Compare against another secret in constant time.
    ///
    /// # Panics
    /// Panics if the two secrets differ in length.
    #[inline]
    pub fn ct_eq<S>(&self, other: &S) -> bool
    where
        S: ExposeSecret<Item = T> + ?Sized,
    {
        ExposeSecret::ct_eq(self, other)
    }

    /// Copy the secret into a new allocation of `alloc`.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn clone_in<A>(&self, alloc: &A) -> Self
    where
        A: Allocator + ?Sized,
    {
        match self.try_clone_in(alloc) {
            Ok(slf) => slf,
            Err(e) => e.panic(),
        }
    }

    /// Try to copy the secret into a new allocation of `alloc`.
    pub fn try_clone_in<A>(&self, alloc: &A) -> Result<Self, StorageError>
    where
        A: Allocator + ?Sized,
    {
        Self::try_new_in(self.expose(), alloc)
    }

    /// Zero the secret content and release the memory.
    ///
    /// # Safety
    /// `alloc` must be the allocator instance which produced this secret,
    /// or a clone of it.
    pub unsafe fn deinit<A>(self, alloc: &A)
    where
        A: Allocator + ?Sized,
    {
        self.into_raw().release_in(alloc);
    }
}

impl<T: ByteRepr> ExposeSecret for UnmanagedSecret<T> {
    type Item = T;

    #[inline]
    fn expose(&self) -> &[T] {
        self.raw.as_slice()
    }

    #[inline]
    fn expose_mut(&mut self) -> &mut [T] {
        self.raw.as_mut_slice()
    }
}

impl<T: ByteRepr> fmt::Debug for UnmanagedSecret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("UnmanagedSecret<{}>", type_name::<T>()))
    }
}

impl<T: ByteRepr> Drop for UnmanagedSecret<T> {
    fn drop(&mut self) {
        // without an allocator the memory cannot be released, only zeroed
        self.raw.wipe();
        warn_event!(
            "UnmanagedSecret<{}> dropped without deinit, {} elements leaked",
            type_name::<T>(),
            self.raw.len()
        );
    }
}

impl<T: ByteRepr> Zeroize for UnmanagedSecret<T> {
    #[inline]
    fn zeroize(&mut self) {
        self.wipe();
    }
}

impl<T: ByteRepr> ZeroizeOnDrop for UnmanagedSecret<T> {}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::UnmanagedSecret;
    use crate::alloc::Global;

    #[test]
    fn unmanaged_debug_redacted() {
        let secret = UnmanagedSecret::new_in(b"hunter2", &Global);
        assert_eq!(format!("{:?}", secret), "UnmanagedSecret<u8>");
        unsafe { secret.deinit(&Global) };
    }

    #[test]
    fn unmanaged_drop_zeroes() {
        let mut secret = UnmanagedSecret::new_in(&[0xffu32; 4], &Global);
        let ptr = secret.expose_mut().as_mut_ptr();
        drop(secret);
        // the allocation is leaked, so it remains readable
        let leaked = unsafe { core::slice::from_raw_parts(ptr, 4) };
        assert_eq!(leaked, &[0; 4]);
    }

    #[test]
    #[should_panic(expected = "secret must not be empty")]
    fn unmanaged_empty() {
        let _ = UnmanagedSecret::<u8>::new_in(&[], &Global);
    }

    #[cfg(feature = "rand_core")]
    #[test]
    fn unmanaged_random() {
        use rand::rngs::OsRng;

        let secret = UnmanagedSecret::<u64>::random_in(OsRng, 4, &Global);
        assert!(secret.expose().iter().any(|v| *v != 0));
        unsafe { secret.deinit(&Global) };
    }
}
