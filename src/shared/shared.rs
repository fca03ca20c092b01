use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ops::Deref;
use core::ptr::{self, NonNull};
use core::sync::atomic::Ordering;

use crate::alloc::{dealloc_one, try_alloc_one, Hold};
use crate::construct::Construct;
use crate::error::Result;
use crate::raw::Relocatable;

use super::header::{CombinedBlock, Header, SplitBlock};
use super::self_ref::SharedFromSelf;
use super::weak::Weak;

/// Strong handle to an atomically reference-counted value in a [`Hold`].
///
/// Cloning a handle is infallible; only creation allocates. The value is
/// destroyed when the last strong handle drops, and the backing blocks are
/// returned to the hold once no handle of either kind remains.
///
/// [`Hold`]: crate::alloc::Hold
pub struct Shared<'a, T: ?Sized> {
    pub(super) header: NonNull<Header>,
    pub(super) data: NonNull<T>,
    pub(super) phantom: PhantomData<&'a ()>,
}

unsafe impl<'a, T: ?Sized + Send + Sync> Send for Shared<'a, T> {}

unsafe impl<'a, T: ?Sized + Send + Sync> Sync for Shared<'a, T> {}

impl<'a, T> Shared<'a, T> {
    /// Allocates a value constructed from `args` in a single block holding
    /// both the value and its control header. Transactional: if
    /// construction fails the block is released.
    pub fn try_new<A>(hold: &'a dyn Hold, args: A) -> Result<Shared<'a, T>>
    where
        T: Construct<A>,
    {
        unsafe {
            let combined = CombinedBlock::<T>::try_alloc(hold)?;
            let value = ptr::addr_of_mut!((*combined.as_ptr()).value) as *mut T;
            if let Err(error) = T::try_construct_at(hold, value, args) {
                CombinedBlock::dealloc(combined);
                return Err(error);
            }
            Ok(Shared {
                header: combined.cast(),
                data: NonNull::new_unchecked(value),
                phantom: PhantomData,
            })
        }
    }

    /// Allocates the value and its control header as two separate blocks,
    /// so the value's bytes return to the hold as soon as the last strong
    /// handle drops even while weak handles remain.
    pub fn try_new_split<A>(hold: &'a dyn Hold, args: A) -> Result<Shared<'a, T>>
    where
        T: Construct<A>,
    {
        let value = try_alloc_one::<T, A>(hold, args)?;
        match SplitBlock::try_alloc(hold, value) {
            Ok(split) => Ok(Shared {
                header: split.cast(),
                data: value,
                phantom: PhantomData,
            }),
            Err(error) => {
                unsafe { dealloc_one(hold, value) };
                Err(error)
            }
        }
    }

    /// Allocates a value that holds a weak handle to itself. The closure
    /// receives the not-yet-live weak handle; upgrading it inside the
    /// closure fails with `PointerExpired`. Weak clones taken by the
    /// closure stay valid whether or not construction succeeds.
    pub fn try_new_cyclic<F>(hold: &'a dyn Hold, build: F) -> Result<Shared<'a, T>>
    where
        F: FnOnce(&Weak<'a, T>) -> Result<T>,
    {
        unsafe {
            let combined = CombinedBlock::<T>::try_alloc(hold)?;
            let header: NonNull<Header> = combined.cast();
            let value = ptr::addr_of_mut!((*combined.as_ptr()).value) as *mut T;
            // No strong handle exists until the value is written; the one
            // weak count belongs to the handle lent to the closure.
            header.as_ref().strong.store(0, Ordering::Relaxed);
            let weak = Weak {
                header: Some(header),
                data: NonNull::new_unchecked(value),
                phantom: PhantomData,
            };
            match build(&weak) {
                Ok(inner) => {
                    ptr::write(value, inner);
                    header.as_ref().strong.store(1, Ordering::Release);
                    // The lent weak count transfers to the strong
                    // collective.
                    mem::forget(weak);
                    Ok(Shared {
                        header,
                        data: NonNull::new_unchecked(value),
                        phantom: PhantomData,
                    })
                }
                Err(error) => {
                    // Dropping the lent handle frees the block unless the
                    // closure kept weak clones alive.
                    drop(weak);
                    Err(error)
                }
            }
        }
    }

    /// Allocates a value implementing [`SharedFromSelf`], wiring its self
    /// reference before the handle is returned.
    pub fn try_new_with_self<A>(hold: &'a dyn Hold, args: A) -> Result<Shared<'a, T>>
    where
        T: Construct<A> + SharedFromSelf<'a>,
    {
        let shared: Shared<'a, T> = Shared::try_new(hold, args)?;
        shared.self_ref().install(Shared::downgrade(&shared));
        Ok(shared)
    }
}

impl<'a, T: ?Sized> Shared<'a, T> {
    /// Returns the number of strong handles to the value.
    #[inline]
    pub fn use_count(this: &Shared<'a, T>) -> usize {
        this.header().strong.load(Ordering::Relaxed)
    }

    /// Returns the number of weak handles to the value.
    #[inline]
    pub fn weak_count(this: &Shared<'a, T>) -> usize {
        // One weak count is held collectively by the strong handles.
        this.header().weak.load(Ordering::Relaxed) - 1
    }

    /// Returns whether two handles share one control header.
    #[inline]
    pub fn ptr_eq(this: &Shared<'a, T>, that: &Shared<'a, T>) -> bool {
        this.header.as_ptr() == that.header.as_ptr()
    }

    /// Returns a raw pointer to the value. Valid as long as a strong
    /// handle keeps the value alive.
    #[inline]
    pub fn get(this: &Shared<'a, T>) -> *const T {
        this.data.as_ptr()
    }

    /// Returns a weak handle to the value.
    pub fn downgrade(this: &Shared<'a, T>) -> Weak<'a, T> {
        this.header().weak.fetch_add(1, Ordering::Relaxed);
        Weak {
            header: Some(this.header),
            data: this.data,
            phantom: PhantomData,
        }
    }

    /// Returns a handle to a part of the value, sharing the owner's
    /// control header. The whole value stays alive as long as the
    /// projected handle does.
    pub fn map<U: ?Sized, F>(this: &Shared<'a, T>, project: F) -> Shared<'a, U>
    where
        F: FnOnce(&T) -> &U,
    {
        let data = NonNull::from(project(this.deref()));
        this.header().strong.fetch_add(1, Ordering::Relaxed);
        Shared {
            header: this.header,
            data,
            phantom: PhantomData,
        }
    }

    #[inline]
    fn header(&self) -> &Header {
        unsafe { self.header.as_ref() }
    }
}

impl<'a, T: ?Sized> Deref for Shared<'a, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        unsafe { self.data.as_ref() }
    }
}

impl<'a, T: ?Sized> Clone for Shared<'a, T> {
    fn clone(&self) -> Shared<'a, T> {
        self.header().strong.fetch_add(1, Ordering::Relaxed);
        Shared {
            header: self.header,
            data: self.data,
            phantom: PhantomData,
        }
    }
}

impl<'a, T: ?Sized> Drop for Shared<'a, T> {
    fn drop(&mut self) {
        unsafe {
            Header::release_strong(self.header);
        }
    }
}

/// Handle identity, not value equality.
impl<'a, T: ?Sized> PartialEq for Shared<'a, T> {
    #[inline]
    fn eq(&self, other: &Shared<'a, T>) -> bool {
        ptr::addr_eq(self.data.as_ptr(), other.data.as_ptr())
    }
}

impl<'a, T: ?Sized> Eq for Shared<'a, T> {}

impl<'a, T: ?Sized + fmt::Debug> fmt::Debug for Shared<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.deref(), f)
    }
}

impl<'a, T: ?Sized + fmt::Display> fmt::Display for Shared<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.deref(), f)
    }
}

impl<'a, T: ?Sized> fmt::Pointer for Shared<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.data.as_ptr(), f)
    }
}

/// A handle is a pair of pointers; moving it as bytes is always safe.
impl<'a, T: ?Sized> Relocatable for Shared<'a, T> {
    const RELOCATABLE: bool = true;
}
