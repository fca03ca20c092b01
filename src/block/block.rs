use core::fmt;
use core::hash;
use core::ptr::NonNull;
use core::slice;

/// Address and size of a raw memory area.
///
/// A `Block` is produced by [`Hold::alloc`] or [`Hold::realloc`] and consumed
/// by [`Hold::dealloc`] or [`Hold::resize_in_place`]. The requester owns the
/// block until it passes it back to the same `Hold` instance that produced
/// it; handing a block to a different hold is undefined, so owning types
/// store the producing hold reference alongside their block.
///
/// [`Hold::alloc`]: crate::alloc::Hold::alloc
/// [`Hold::realloc`]: crate::alloc::Hold::realloc
/// [`Hold::dealloc`]: crate::alloc::Hold::dealloc
/// [`Hold::resize_in_place`]: crate::alloc::Hold::resize_in_place
#[derive(Clone, Copy)]
pub struct Block {
    /// Non-null pointer to the base address of the memory area.
    data: NonNull<u8>,
    /// Number of bytes in the memory area.
    size: usize,
}

unsafe impl Send for Block {}

unsafe impl Sync for Block {}

impl Block {
    /// Returns a zero-length `Block` with an undereferenceable sentinel pointer.
    #[inline]
    pub const fn empty() -> Block {
        Block {
            data: NonNull::dangling(),
            size: 0,
        }
    }

    /// Constructs a `Block` from a non-null `data` pointer to `size` bytes.
    ///
    /// # Safety
    ///
    /// `data` must be non-null, and the returned `Block` logically takes
    /// ownership of the pointed-to bytes.
    #[inline]
    pub const unsafe fn from_raw_parts(data: *mut u8, size: usize) -> Block {
        Block {
            data: NonNull::new_unchecked(data),
            size,
        }
    }

    /// Returns the number of bytes of memory owned by this `Block`.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns a pointer to the memory owned by this `Block`.
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.data.as_ptr()
    }

    /// Returns a slice of the memory owned by this `Block`.
    ///
    /// # Safety
    ///
    /// Every byte in the block must be initialized.
    #[inline]
    pub unsafe fn as_slice(&self) -> &[u8] {
        slice::from_raw_parts(self.data.as_ptr(), self.size)
    }
}

impl PartialEq for Block {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.data.as_ptr() == other.data.as_ptr() && self.size == other.size
    }
}

impl Eq for Block {}

impl hash::Hash for Block {
    #[inline]
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.data.as_ptr().hash(state)
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("data", &self.data.as_ptr())
            .field("size", &self.size)
            .finish()
    }
}

impl fmt::Pointer for Block {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.data.as_ptr(), f)
    }
}
