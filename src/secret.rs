//! A secret container which owns its allocator.

use core::any::type_name;
use core::fmt;
use core::mem::ManuallyDrop;
use core::ptr;

#[cfg(feature = "rand_core")]
use rand_core::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::alloc::{Allocator, AllocatorDefault, Global};
use crate::bytes::ByteRepr;
use crate::error::StorageError;
use crate::expose::ExposeSecret;
use crate::raw::RawSecret;
use crate::unmanaged::UnmanagedSecret;

/// A non-empty sequence of secret elements stored in memory owned by the
/// allocator instance `A`.
///
/// - The content is only reachable through [`expose`](Secret::expose) and
///   [`expose_mut`](Secret::expose_mut).
/// - When dropped, the memory is securely zeroed before it is released
///   to the allocator.
/// - Copies are only made by an explicit call to [`clone`](Clone::clone),
///   [`try_clone`](Secret::try_clone) or [`try_clone_in`](Secret::try_clone_in).
/// - Secrets are compared in constant time with [`ct_eq`](Secret::ct_eq).
///
/// The [`Debug`](fmt::Debug) implementation never outputs the content.
///
/// ```
/// use flex_secret::Secret;
///
/// let mut input = *b"correct horse";
/// let secret: Secret<u8> = Secret::take(&mut input);
/// assert_eq!(input, [0u8; 13]);
/// assert_eq!(secret.expose(), b"correct horse");
/// ```
pub struct Secret<T: ByteRepr, A: Allocator = Global> {
    raw: RawSecret<T>,
    alloc: A,
}

impl<T: ByteRepr, A: AllocatorDefault> Secret<T, A> {
    /// Copy `source` into a new secret using the default allocator instance.
    /// The caller remains responsible for erasing `source`.
    ///
    /// # Panics
    /// Panics if `source` is empty or the allocation fails.
    pub fn new(source: &[T]) -> Self {
        Self::new_in(source, A::DEFAULT)
    }

    /// Try to copy `source` into a new secret using the default allocator
    /// instance.
    ///
    /// # Panics
    /// Panics if `source` is empty.
    pub fn try_new(source: &[T]) -> Result<Self, StorageError> {
        Self::try_new_in(source, A::DEFAULT)
    }

    /// Copy `source` into a new secret and erase `source`, using the default
    /// allocator instance.
    ///
    /// # Panics
    /// Panics if `source` is empty or the allocation fails.
    pub fn take(source: &mut [T]) -> Self {
        Self::take_in(source, A::DEFAULT)
    }

    /// Try to copy `source` into a new secret using the default allocator
    /// instance. `source` is erased whether or not the allocation succeeds.
    ///
    /// # Panics
    /// Panics if `source` is empty.
    pub fn try_take(source: &mut [T]) -> Result<Self, StorageError> {
        Self::try_take_in(source, A::DEFAULT)
    }

    /// Create a new secret from the result of `f` using the default
    /// allocator instance.
    pub fn from_fn<F, R>(f: F) -> Self
    where
        F: FnOnce() -> R,
        R: AsMut<[T]>,
    {
        Self::from_fn_in(f, A::DEFAULT)
    }

    /// Try to create a new secret from the result of `f` using the default
    /// allocator instance.
    pub fn try_from_fn<F, R>(f: F) -> Result<Self, StorageError>
    where
        F: FnOnce() -> R,
        R: AsMut<[T]>,
    {
        Self::try_from_fn_in(f, A::DEFAULT)
    }

    /// Create a new secret of `len` elements initialized in place by `f`,
    /// using the default allocator instance.
    pub fn fill<F>(len: usize, f: F) -> Self
    where
        F: FnOnce(&mut [T]),
    {
        Self::fill_in(len, f, A::DEFAULT)
    }

    /// Try to create a new secret of `len` elements initialized in place
    /// by `f`, using the default allocator instance.
    pub fn try_fill<F>(len: usize, f: F) -> Result<Self, StorageError>
    where
        F: FnOnce(&mut [T]),
    {
        Self::try_fill_in(len, f, A::DEFAULT)
    }

    /// Generate a new random secret of `len` elements using the default
    /// allocator instance.
    #[cfg(feature = "rand_core")]
    pub fn random(rng: impl RngCore, len: usize) -> Self {
        Self::random_in(rng, len, A::DEFAULT)
    }
}

impl<T: ByteRepr, A: Allocator> Secret<T, A> {
    /// Copy `source` into a new secret allocated by `alloc`.
    /// The caller remains responsible for erasing `source`.
    ///
    /// # Panics
    /// Panics if `source` is empty or the allocation fails.
    pub fn new_in(source: &[T], alloc: A) -> Self {
        match Self::try_new_in(source, alloc) {
            Ok(slf) => slf,
            Err(e) => e.panic(),
        }
    }

    /// Try to copy `source` into a new secret allocated by `alloc`.
    ///
    /// # Panics
    /// Panics if `source` is empty.
    pub fn try_new_in(source: &[T], alloc: A) -> Result<Self, StorageError> {
        let raw = RawSecret::copy_in(&alloc, source)?;
        Ok(Self { raw, alloc })
    }

    /// Copy `source` into a new secret allocated by `alloc`, then erase `source`.
    ///
    /// # Panics
    /// Panics if `source` is empty or the allocation fails.
    pub fn take_in(source: &mut [T], alloc: A) -> Self {
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
    pub fn try_take_in(source: &mut [T], alloc: A) -> Result<Self, StorageError> {
        let raw = RawSecret::take_in(&alloc, source)?;
        Ok(Self { raw, alloc })
    }

    /// Create a new secret allocated by `alloc` from the result of `f`.
    ///
    /// The closure is called exactly once. Its result is copied into the
    /// secret and then erased before being dropped.
    pub fn from_fn_in<F, R>(f: F, alloc: A) -> Self
    where
        F: FnOnce() -> R,
        R: AsMut<[T]>,
    {
        match Self::try_from_fn_in(f, alloc) {
            Ok(slf) => slf,
            Err(e) => e.panic(),
        }
    }

    /// Try to create a new secret allocated by `alloc` from the result of `f`.
    pub fn try_from_fn_in<F, R>(f: F, alloc: A) -> Result<Self, StorageError>
    where
        F: FnOnce() -> R,
        R: AsMut<[T]>,
    {
        let raw = RawSecret::from_fn_in(&alloc, f)?;
        Ok(Self { raw, alloc })
    }

    /// Create a new secret of `len` elements allocated by `alloc`. The
    /// zero-initialized content is passed to `f` to be written in place.
    pub fn fill_in<F>(len: usize, f: F, alloc: A) -> Self
    where
        F: FnOnce(&mut [T]),
    {
        match Self::try_fill_in(len, f, alloc) {
            Ok(slf) => slf,
            Err(e) => e.panic(),
        }
    }

    /// Try to create a new secret of `len` elements allocated by `alloc`,
    /// initialized in place by `f`. The closure is not called if the
    /// allocation fails.
    pub fn try_fill_in<F>(len: usize, f: F, alloc: A) -> Result<Self, StorageError>
    where
        F: FnOnce(&mut [T]),
    {
        let raw = RawSecret::fill_in(&alloc, len, f)?;
        Ok(Self { raw, alloc })
    }

    /// Generate a new random secret of `len` elements allocated by `alloc`.
    #[cfg(feature = "rand_core")]
    pub fn random_in(rng: impl RngCore, len: usize, alloc: A) -> Self {
        match Self::try_random_in(rng, len, alloc) {
            Ok(slf) => slf,
            Err(e) => e.panic(),
        }
    }

    /// Try to generate a new random secret of `len` elements allocated by `alloc`.
    #[cfg(feature = "rand_core")]
    pub fn try_random_in(
        mut rng: impl RngCore,
        len: usize,
        alloc: A,
    ) -> Result<Self, StorageError> {
        Self::try_fill_in(len, |buf| rng.fill_bytes(T::as_bytes_mut(buf)), alloc)
    }

    /// Get a reference to the allocator instance.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
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

    /// Try to copy the secret into a new allocation of `alloc`.
    pub fn try_clone_in<B: Allocator>(&self, alloc: B) -> Result<Secret<T, B>, StorageError> {
        Secret::try_new_in(self.expose(), alloc)
    }

    /// Try to copy the secret into a new allocation of a clone of the
    /// current allocator.
    pub fn try_clone(&self) -> Result<Self, StorageError>
    where
        A: Clone,
    {
        self.try_clone_in(self.alloc.clone())
    }

    /// Separate the secret from its allocator. The caller becomes
    /// responsible for releasing the memory with
    /// [`UnmanagedSecret::deinit`] and the returned allocator.
    pub fn into_unmanaged(self) -> (UnmanagedSecret<T>, A) {
        let slf = ManuallyDrop::new(self);
        let raw = unsafe { ptr::read(&slf.raw) };
        let alloc = unsafe { ptr::read(&slf.alloc) };
        (UnmanagedSecret::from_raw(raw), alloc)
    }

    /// Attach an allocator to an unmanaged secret.
    ///
    /// # Safety
    /// `alloc` must be the allocator instance which produced the secret,
    /// or a clone of it.
    pub unsafe fn from_unmanaged(secret: UnmanagedSecret<T>, alloc: A) -> Self {
        Self {
            raw: secret.into_raw(),
            alloc,
        }
    }
}

impl<T: ByteRepr, A: Allocator> ExposeSecret for Secret<T, A> {
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

impl<T: ByteRepr, A: Allocator + Clone> Clone for Secret<T, A> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(slf) => slf,
            Err(e) => e.panic(),
        }
    }
}

impl<T: ByteRepr, A: Allocator> fmt::Debug for Secret<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("Secret<{}>", type_name::<T>()))
    }
}

impl<T: ByteRepr, A: Allocator> Drop for Secret<T, A> {
    fn drop(&mut self) {
        unsafe { ptr::read(&self.raw).release_in(&self.alloc) };
    }
}

impl<T: ByteRepr, A: Allocator> Zeroize for Secret<T, A> {
    #[inline]
    fn zeroize(&mut self) {
        self.wipe();
    }
}

impl<T: ByteRepr, A: Allocator> ZeroizeOnDrop for Secret<T, A> {}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use zeroize::Zeroize;

    use super::Secret;
    use crate::alloc::Global;

    #[test]
    fn secret_debug_redacted() {
        let secret: Secret<u8> = Secret::new(b"hunter2");
        let out = format!("{:?}", secret);
        assert_eq!(out, "Secret<u8>");
        assert!(!out.contains("hunter2"));
    }

    #[test]
    fn secret_zeroize() {
        let mut secret: Secret<u16> = Secret::new(&[1, 2, 3]);
        secret.zeroize();
        assert_eq!(secret.expose(), &[0, 0, 0]);
        assert_eq!(secret.len(), 3);
    }

    #[test]
    #[should_panic(expected = "secret must not be empty")]
    fn secret_empty() {
        let _ = Secret::<u8, Global>::new(&[]);
    }

    #[test]
    #[should_panic(expected = "secret must not be empty")]
    fn secret_fill_empty() {
        let _ = Secret::<u8, Global>::fill(0, |_| ());
    }

    #[test]
    #[should_panic(expected = "Layout error")]
    fn secret_fill_overflow() {
        let _ = Secret::<u64, Global>::fill(usize::MAX, |_| ());
    }

    #[test]
    fn secret_round_trip_unmanaged() {
        let secret: Secret<u8> = Secret::new(b"token");
        let ptr = secret.expose().as_ptr();
        let (unmanaged, alloc) = secret.into_unmanaged();
        assert_eq!(unmanaged.expose().as_ptr(), ptr);
        let secret = unsafe { Secret::from_unmanaged(unmanaged, alloc) };
        assert_eq!(secret.expose(), b"token");
    }

    #[cfg(feature = "rand_core")]
    #[test]
    fn secret_random() {
        use rand::rngs::OsRng;

        let secret: Secret<u8> = Secret::random(OsRng, 32);
        assert_eq!(secret.len(), 32);
        assert!(secret.expose() != &[0u8; 32]);
    }
}
