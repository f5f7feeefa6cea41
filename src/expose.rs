//! Shared access to the content of secret containers.

use crate::bytes::{secure_erase, ByteRepr};
use crate::compare;

/// Access the content of a secret container for reading or writing.
///
/// Implemented by both [`Secret`](crate::Secret) and
/// [`UnmanagedSecret`](crate::UnmanagedSecret), so either variant may be
/// compared against the other.
#[allow(clippy::len_without_is_empty)]
pub trait ExposeSecret {
    /// The type of the contained elements.
    type Item: ByteRepr;

    /// Expose the secret content for reading.
    fn expose(&self) -> &[Self::Item];

    /// Expose the secret content for updating in place.
    fn expose_mut(&mut self) -> &mut [Self::Item];

    /// The number of elements in the secret. This is never zero.
    #[inline]
    fn len(&self) -> usize {
        self.expose().len()
    }

    /// Overwrite the secret content with zeros, keeping the allocation.
    #[inline]
    fn wipe(&mut self) {
        secure_erase(self.expose_mut());
    }

    /// Compare against another secret in constant time.
    ///
    /// # Panics
    /// Panics if the two secrets differ in length.
    #[inline]
    fn ct_eq<S>(&self, other: &S) -> bool
    where
        S: ExposeSecret<Item = Self::Item> + ?Sized,
    {
        compare::ct_eq(self.expose(), other.expose())
    }
}
