use core::cmp;
use core::mem;
use core::num::NonZeroUsize;

use crate::error::{Error, Result};

/// Size and alignment constraints for a memory block.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Required size in bytes of a valid memory block.
    size: usize,
    /// Required power-of-two base address alignment for a valid memory block.
    align: NonZeroUsize,
}

impl Layout {
    /// Returns a zero-sized `Layout` with byte alignment.
    #[inline]
    pub const fn empty() -> Layout {
        unsafe { Layout::from_size_align_unchecked(0, 1) }
    }

    /// Returns a `Layout` with the given size and power-of-two alignment,
    /// without validating the constraints.
    ///
    /// # Safety
    ///
    /// `align` must be a power of two, and `size` rounded up to `align`
    /// must not overflow.
    #[inline]
    pub const unsafe fn from_size_align_unchecked(size: usize, align: usize) -> Layout {
        Layout {
            size,
            align: NonZeroUsize::new_unchecked(align),
        }
    }

    /// Returns a `Layout` with the given size and power-of-two alignment;
    /// fails with `InvalidArgument` for unsatisfiable constraints.
    #[inline]
    pub fn from_size_align(size: usize, align: usize) -> Result<Layout> {
        if !align.is_power_of_two() {
            return Err(Error::InvalidArgument);
        }
        if size > usize::MAX - (align - 1) {
            return Err(Error::InvalidArgument);
        }
        Ok(unsafe { Layout::from_size_align_unchecked(size, align) })
    }

    /// Returns the `Layout` of the parameterized type.
    #[inline]
    pub const fn for_type<T>() -> Layout {
        unsafe { Layout::from_size_align_unchecked(mem::size_of::<T>(), mem::align_of::<T>()) }
    }

    /// Returns the `Layout` of the given `value`.
    #[inline]
    pub fn for_value<T: ?Sized>(value: &T) -> Layout {
        unsafe { Layout::from_size_align_unchecked(mem::size_of_val(value), mem::align_of_val(value)) }
    }

    /// Returns the `Layout` of an array of `len` values of the parameterized
    /// type; fails with `InvalidArgument` on size overflow.
    #[inline]
    pub fn for_array<T>(len: usize) -> Result<Layout> {
        let size = match mem::size_of::<T>().checked_mul(len) {
            Some(size) => size,
            None => return Err(Error::InvalidArgument),
        };
        let align = mem::align_of::<T>();
        if size > usize::MAX - (align - 1) {
            return Err(Error::InvalidArgument);
        }
        Ok(unsafe { Layout::from_size_align_unchecked(size, align) })
    }

    /// Returns the required size in bytes of a valid memory block.
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns the required power-of-two base address alignment for a valid
    /// memory block.
    #[inline]
    pub fn align(&self) -> usize {
        self.align.get()
    }

    /// Returns this layout with its size replaced by `size`; the alignment
    /// constraint is unchanged.
    #[inline]
    pub fn resized(&self, size: usize) -> Layout {
        Layout {
            size,
            align: self.align,
        }
    }

    /// Returns the `Layout` of a struct with this layout as its first member
    /// and `that` layout as its second member, along with the byte offset of
    /// the second member; fails with `InvalidArgument` on size overflow.
    #[inline]
    pub fn extended(&self, that: Layout) -> Result<(Layout, usize)> {
        let next_align = that.align.get();
        let align = cmp::max(self.align.get(), next_align);
        let offset = self
            .size
            .wrapping_add(next_align)
            .wrapping_sub(1)
            & !next_align.wrapping_sub(1);
        if offset < self.size {
            return Err(Error::InvalidArgument);
        }
        let size = match offset.checked_add(that.size) {
            Some(size) => size,
            None => return Err(Error::InvalidArgument),
        };
        if size > usize::MAX - (align - 1) {
            return Err(Error::InvalidArgument);
        }
        Ok((unsafe { Layout::from_size_align_unchecked(size, align) }, offset))
    }
}

impl core::fmt::Debug for Layout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Layout")
            .field("size", &self.size)
            .field("align", &self.align.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_from_size_align() {
        assert!(Layout::from_size_align(16, 8).is_ok());
        assert_eq!(Layout::from_size_align(16, 3), Err(Error::InvalidArgument));
        assert_eq!(
            Layout::from_size_align(usize::MAX, 16),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn test_layout_for_array_overflow() {
        assert_eq!(
            Layout::for_array::<u64>(usize::MAX / 4),
            Err(Error::InvalidArgument)
        );
        let layout = Layout::for_array::<u64>(4).unwrap();
        assert_eq!(layout.size(), 32);
        assert_eq!(layout.align(), mem::align_of::<u64>());
    }

    #[test]
    fn test_layout_extended_offset() {
        let header = Layout::for_type::<u32>();
        let (layout, offset) = header.extended(Layout::for_type::<u64>()).unwrap();
        assert_eq!(offset, 8);
        assert_eq!(layout.size(), 16);
        assert_eq!(layout.align(), 8);
    }
}
