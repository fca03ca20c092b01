use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;
use core::sync::atomic::Ordering;

use crate::error::{Error, Result};
use crate::raw::Relocatable;

use super::header::Header;
use super::shared::Shared;

/// Weak handle to an atomically reference-counted value.
///
/// A weak handle never keeps the value alive; it must be upgraded to a
/// [`Shared`] before the value can be read. An unbound handle (from
/// [`Weak::new`]) upgrades to `EmptyPointer`; a handle whose value has
/// been destroyed upgrades to `PointerExpired`.
pub struct Weak<'a, T: ?Sized> {
    pub(super) header: Option<NonNull<Header>>,
    pub(super) data: NonNull<T>,
    pub(super) phantom: PhantomData<&'a ()>,
}

unsafe impl<'a, T: ?Sized + Send + Sync> Send for Weak<'a, T> {}

unsafe impl<'a, T: ?Sized + Send + Sync> Sync for Weak<'a, T> {}

impl<'a, T> Weak<'a, T> {
    /// Returns a weak handle bound to no value.
    #[inline]
    pub fn new() -> Weak<'a, T> {
        Weak {
            header: None,
            data: NonNull::dangling(),
            phantom: PhantomData,
        }
    }
}

impl<'a, T: ?Sized> Weak<'a, T> {
    /// Attempts to obtain a strong handle to the value. Fails with
    /// `EmptyPointer` for an unbound handle and `PointerExpired` once the
    /// value has been destroyed.
    pub fn upgrade(&self) -> Result<Shared<'a, T>> {
        let header = match self.header {
            Some(header) => header,
            None => return Err(Error::EmptyPointer),
        };
        let strong = unsafe { &header.as_ref().strong };
        let mut count = strong.load(Ordering::Relaxed);
        while count != 0 {
            match strong.compare_exchange_weak(
                count,
                count + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    return Ok(Shared {
                        header,
                        data: self.data,
                        phantom: PhantomData,
                    });
                }
                Err(current) => count = current,
            }
        }
        Err(Error::PointerExpired)
    }

    /// Returns whether the value is gone or was never there. A `false`
    /// answer is already stale by the time the caller sees it; only
    /// [`upgrade`] gives an authoritative answer.
    ///
    /// [`upgrade`]: Weak::upgrade
    #[inline]
    pub fn expired(&self) -> bool {
        match self.header {
            Some(header) => unsafe { header.as_ref().strong.load(Ordering::Relaxed) == 0 },
            None => true,
        }
    }

    /// Returns whether two handles share one control header. Unbound
    /// handles compare equal to each other.
    #[inline]
    pub fn ptr_eq(&self, other: &Weak<'a, T>) -> bool {
        match (self.header, other.header) {
            (Some(a), Some(b)) => a.as_ptr() == b.as_ptr(),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<'a, T> Default for Weak<'a, T> {
    #[inline]
    fn default() -> Weak<'a, T> {
        Weak::new()
    }
}

impl<'a, T: ?Sized> Clone for Weak<'a, T> {
    fn clone(&self) -> Weak<'a, T> {
        if let Some(header) = self.header {
            unsafe {
                header.as_ref().weak.fetch_add(1, Ordering::Relaxed);
            }
        }
        Weak {
            header: self.header,
            data: self.data,
            phantom: PhantomData,
        }
    }
}

impl<'a, T: ?Sized> Drop for Weak<'a, T> {
    fn drop(&mut self) {
        if let Some(header) = self.header {
            unsafe {
                Header::release_weak(header);
            }
        }
    }
}

impl<'a, T: ?Sized> fmt::Debug for Weak<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(Weak)")
    }
}

/// A handle is a pair of pointers; moving it as bytes is always safe.
impl<'a, T: ?Sized> Relocatable for Weak<'a, T> {
    const RELOCATABLE: bool = true;
}
