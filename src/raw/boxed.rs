use core::fmt;
use core::mem;
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};

use crate::alloc::{dealloc_one, try_alloc_one, Hold};
use crate::block::{Block, Layout};
use crate::construct::{CloneIntoHold, Construct, TryClone};
use crate::error::Result;

use super::relocate::Relocatable;

/// Single value allocated out of a [`Hold`].
///
/// Construction routes through [`Construct`], so any value already in hand
/// boxes directly while types with a fallible strategy build in place.
pub struct RawBox<'h, T> {
    hold: &'h dyn Hold,
    data: NonNull<T>,
}

impl<'h, T> RawBox<'h, T> {
    /// Allocates and constructs a `T` from `args` in `hold`. Transactional:
    /// if construction fails the allocation is released.
    pub fn try_new<A>(hold: &'h dyn Hold, args: A) -> Result<RawBox<'h, T>>
    where
        T: Construct<A>,
    {
        let data = try_alloc_one(hold, args)?;
        Ok(RawBox { hold, data })
    }

    /// Returns the hold this box was allocated out of.
    #[inline]
    pub fn hold(&self) -> &'h dyn Hold {
        self.hold
    }

    /// Moves the value out of the box and releases the allocation.
    pub fn into_inner(self) -> T {
        unsafe {
            let value = ptr::read(self.data.as_ptr());
            let block =
                Block::from_raw_parts(self.data.as_ptr() as *mut u8, Layout::for_type::<T>().size());
            self.hold.dealloc(block, Layout::for_type::<T>());
            mem::forget(self);
            value
        }
    }
}

impl<'h, T> Deref for RawBox<'h, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        unsafe { self.data.as_ref() }
    }
}

impl<'h, T> DerefMut for RawBox<'h, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        unsafe { self.data.as_mut() }
    }
}

impl<'h, T> Drop for RawBox<'h, T> {
    fn drop(&mut self) {
        unsafe {
            dealloc_one(self.hold, self.data);
        }
    }
}

impl<'h, T: TryClone> TryClone for RawBox<'h, T> {
    /// Deep copy into the same hold.
    fn try_clone(&self) -> Result<RawBox<'h, T>> {
        let value = (**self).try_clone()?;
        RawBox::try_new(self.hold, value)
    }
}

impl<'a, 'h, T> CloneIntoHold<'a, RawBox<'a, T>> for RawBox<'h, T>
where
    T: CloneIntoHold<'a, T>,
{
    fn try_clone_into_hold(&self, hold: &'a dyn Hold) -> Result<RawBox<'a, T>> {
        let value = (**self).try_clone_into_hold(hold)?;
        RawBox::try_new(hold, value)
    }
}

impl<'h, T: fmt::Debug> fmt::Debug for RawBox<'h, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<'h, T: fmt::Display> fmt::Display for RawBox<'h, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl<'h, T> Relocatable for RawBox<'h, T> {
    const RELOCATABLE: bool = true;
}
