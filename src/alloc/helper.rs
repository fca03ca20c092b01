use core::ptr::{self, NonNull};
use core::slice;

use crate::block::{Block, Layout};
use crate::construct::{try_clone_at, CloneIntoHold, Construct};
use crate::error::{Error, Result};
use crate::trap_unless;

use super::hold::Hold;

/// Allocates and constructs a single `T` in `hold`. Transactional: if
/// construction fails, the allocation is released before the error is
/// returned.
pub fn try_alloc_one<'h, T, A>(hold: &'h dyn Hold, args: A) -> Result<NonNull<T>>
where
    T: Construct<A>,
{
    unsafe {
        let block = hold.alloc(Layout::for_type::<T>())?;
        let data = block.as_ptr() as *mut T;
        if let Err(error) = T::try_construct_at(hold, data, args) {
            hold.dealloc(block, Layout::for_type::<T>());
            return Err(error);
        }
        Ok(NonNull::new_unchecked(data))
    }
}

/// Destroys and deallocates a value produced by [`try_alloc_one`].
///
/// # Safety
///
/// `data` must have been returned by `try_alloc_one` against the same
/// `hold`, and must not be used after this call.
pub unsafe fn dealloc_one<T>(hold: &dyn Hold, data: NonNull<T>) {
    ptr::drop_in_place(data.as_ptr());
    let block = Block::from_raw_parts(data.as_ptr() as *mut u8, Layout::for_type::<T>().size());
    hold.dealloc(block, Layout::for_type::<T>());
}

/// Clones `src` into a fresh allocation in `hold`. Transactional: if the
/// clone fails, the allocation is released before the error is returned.
pub fn try_clone_one<'a, T, S>(hold: &'a dyn Hold, src: &S) -> Result<NonNull<T>>
where
    S: CloneIntoHold<'a, T>,
{
    unsafe {
        let block = hold.alloc(Layout::for_type::<T>())?;
        let data = block.as_ptr() as *mut T;
        if let Err(error) = try_clone_at(hold, data, src) {
            hold.dealloc(block, Layout::for_type::<T>());
            return Err(error);
        }
        Ok(NonNull::new_unchecked(data))
    }
}

/// Allocates and constructs an array of `count` values of `T`, each built
/// from a clone of `args`. Transactional: if element `k` fails to
/// construct, elements `0..k` are destroyed in reverse order and the block
/// is released before the error is returned. A zero `count` fails with
/// `InvalidArgument`.
pub fn try_alloc_array<'h, T, A>(hold: &'h dyn Hold, count: usize, args: A) -> Result<ArrayPtr<'h, T>>
where
    T: Construct<A>,
    A: Clone,
{
    if count == 0 {
        return Err(Error::InvalidArgument);
    }
    let layout = Layout::for_array::<T>(count)?;
    unsafe {
        let block = hold.alloc(layout)?;
        let data = block.as_ptr() as *mut T;
        for index in 0..count {
            if let Err(error) = T::try_construct_at(hold, data.add(index), args.clone()) {
                for undo in (0..index).rev() {
                    ptr::drop_in_place(data.add(undo));
                }
                hold.dealloc(block, layout);
                return Err(error);
            }
        }
        Ok(ArrayPtr {
            data: NonNull::new_unchecked(data),
            count,
            hold,
        })
    }
}

/// Owning handle for a fallibly allocated and constructed array.
///
/// Dropping the handle destroys every element in reverse construction
/// order and returns the block to the hold.
pub struct ArrayPtr<'h, T> {
    data: NonNull<T>,
    count: usize,
    hold: &'h dyn Hold,
}

impl<'h, T> ArrayPtr<'h, T> {
    /// Returns the number of constructed elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns a reference to the element at `index`; fails with
    /// `OutOfBounds` for an invalid index.
    #[inline]
    pub fn at(&self, index: usize) -> Result<&T> {
        if index >= self.count {
            return Err(Error::OutOfBounds);
        }
        Ok(unsafe { &*self.data.as_ptr().add(index) })
    }

    /// Returns a mutable reference to the element at `index`; fails with
    /// `OutOfBounds` for an invalid index.
    #[inline]
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        if index >= self.count {
            return Err(Error::OutOfBounds);
        }
        Ok(unsafe { &mut *self.data.as_ptr().add(index) })
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.count) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.count) }
    }

}

impl<'h, T> core::ops::Index<usize> for ArrayPtr<'h, T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        trap_unless!(index < self.count, "array index out of bounds");
        unsafe { &*self.data.as_ptr().add(index) }
    }
}

impl<'h, T> Drop for ArrayPtr<'h, T> {
    fn drop(&mut self) {
        if self.count == 0 {
            return;
        }
        unsafe {
            for index in (0..self.count).rev() {
                ptr::drop_in_place(self.data.as_ptr().add(index));
            }
            // Layout::for_array succeeded when this handle was created.
            let size = core::mem::size_of::<T>() * self.count;
            let block = Block::from_raw_parts(self.data.as_ptr() as *mut u8, size);
            self.hold.dealloc(block, Layout::for_type::<T>().resized(size));
        }
    }
}

impl<'h, T: core::fmt::Debug> core::fmt::Debug for ArrayPtr<'h, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
