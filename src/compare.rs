//! Constant-time comparison of secret content.

use subtle::ConstantTimeEq;

use crate::bytes::ByteRepr;

/// Compare two equal-length slices in constant time.
///
/// The running time depends only on the length of the inputs, not on their
/// content or the position of the first difference.
///
/// # Panics
/// Panics if the slices differ in length. Callers must check lengths out
/// of band before comparing.
#[inline]
pub fn ct_eq<T: ByteRepr>(a: &[T], b: &[T]) -> bool {
    assert!(
        a.len() == b.len(),
        "cannot compare secrets of different lengths"
    );
    T::as_bytes(a).ct_eq(T::as_bytes(b)).into()
}

#[cfg(test)]
mod tests {
    use super::ct_eq;

    #[test]
    fn compare_equal() {
        assert!(ct_eq(b"password", b"password"));
        assert!(ct_eq(&[1u32, 2, 3], &[1u32, 2, 3]));
    }

    #[test]
    fn compare_differ() {
        assert!(!ct_eq(b"password", b"passw0rd"));
        assert!(!ct_eq(b"Password", b"password"));
        assert!(!ct_eq(b"passworD", b"password"));
    }

    #[test]
    fn compare_wide_elements() {
        // a single differing byte inside a multi-byte element
        assert!(!ct_eq(&[0x0100u16], &[0x0101u16]));
    }

    #[test]
    #[should_panic(expected = "cannot compare secrets of different lengths")]
    fn compare_length_mismatch() {
        ct_eq(b"hello", b"hello, world!");
    }
}
