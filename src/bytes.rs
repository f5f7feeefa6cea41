//! Byte-level access to secret elements and the secure erase primitive.

use core::mem::size_of_val;
use core::slice;

use zeroize::Zeroize;

/// Element types which may be stored in a secret container.
///
/// # Safety
/// This trait must only be implemented for types without padding bytes, for
/// which the all-zero bit pattern is a legitimate value. Any initialized value
/// must be readable as a sequence of initialized bytes.
pub unsafe trait ByteRepr: Copy + Sized {
    /// Access a slice of elements as a slice of bytes.
    #[inline]
    fn as_bytes(data: &[Self]) -> &[u8] {
        let len: usize = size_of_val(data);
        unsafe { slice::from_raw_parts(data.as_ptr().cast::<u8>(), len) }
    }

    /// Access a slice of elements as a mutable slice of bytes.
    #[inline]
    fn as_bytes_mut(data: &mut [Self]) -> &mut [u8] {
        let len: usize = size_of_val(data);
        unsafe { slice::from_raw_parts_mut(data.as_mut_ptr().cast::<u8>(), len) }
    }
}

macro_rules! impl_byte_repr {
    ($($t:ty),+) => {
        $( unsafe impl ByteRepr for $t {} )+
    };
}

impl_byte_repr!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

unsafe impl<T: ByteRepr, const N: usize> ByteRepr for [T; N] {}

/// Overwrite every byte of `data` with zero.
///
/// The writes are volatile and followed by a compiler fence, so they are
/// performed even when the memory is never read again.
#[inline]
pub fn secure_erase<T: ByteRepr>(data: &mut [T]) {
    T::as_bytes_mut(data).zeroize();
}

/// Check whether every byte of `data` is zero.
///
/// This is not a constant-time operation and is intended for assertions.
pub fn is_zeroed<T: ByteRepr>(data: &[T]) -> bool {
    T::as_bytes(data).iter().all(|b| *b == 0)
}

#[cfg(test)]
mod tests {
    use super::{is_zeroed, secure_erase, ByteRepr};

    #[test]
    fn bytes_view() {
        let data = [0x0102u16, 0x0304];
        let bytes = u16::as_bytes(&data);
        assert_eq!(bytes.len(), 4);
        assert_eq!(&bytes[..2], &0x0102u16.to_ne_bytes());
    }

    #[test]
    fn bytes_view_array() {
        let mut data = [[1u8, 2, 3], [4, 5, 6]];
        let bytes = <[u8; 3]>::as_bytes_mut(&mut data);
        assert_eq!(bytes, &[1, 2, 3, 4, 5, 6]);
        bytes[5] = 9;
        assert_eq!(data[1], [4, 5, 9]);
    }

    #[test]
    fn erase_slice() {
        let mut data = [u64::MAX, 17, 99];
        assert!(!is_zeroed(&data));
        secure_erase(&mut data);
        assert_eq!(data, [0; 3]);
        assert!(is_zeroed(&data));
    }

    #[test]
    fn erase_partial() {
        let mut data = *b"hunter2-hunter2";
        secure_erase(&mut data[..7]);
        assert_eq!(&data, b"\0\0\0\0\0\0\0-hunter2");
    }
}
