//! Errors returned by the fallible secret constructors.

use core::alloc::{Layout, LayoutError};
use core::fmt;

/// Why a `try_` constructor or clone could not produce a secret.
///
/// Input consumed by a failed constructor is still erased.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageError {
    /// A memory allocation failed.
    AllocError(Layout),
    /// The requested length could not be represented as a memory layout.
    LayoutError(LayoutError),
}

impl StorageError {
    /// Short description, without the layout.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllocError(_) => "Allocation error",
            Self::LayoutError(_) => "Layout error",
        }
    }

    /// Abort construction. Allocation failures go through `handle_alloc_error`.
    #[cold]
    #[inline(never)]
    pub fn panic(self) -> ! {
        if let Self::AllocError(layout) = self {
            crate::alloc::handle_alloc_error(layout);
        } else {
            panic!("{}", self.as_str())
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LayoutError> for StorageError {
    fn from(err: LayoutError) -> Self {
        Self::LayoutError(err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StorageError {}
