use core::cell::UnsafeCell;

use crate::error::Result;

use super::shared::Shared;
use super::weak::Weak;

/// Slot holding a value's weak handle to itself.
///
/// Embed one in a type and implement [`SharedFromSelf`] over it; creation
/// through [`Shared::try_new_with_self`] fills the slot before the strong
/// handle is handed out. Outside that creation path the slot stays
/// unbound, so `shared_from_self` on a plainly constructed value fails
/// with `EmptyPointer`.
pub struct SelfRef<'a, T> {
    slot: UnsafeCell<Weak<'a, T>>,
}

impl<'a, T> SelfRef<'a, T> {
    /// Returns an unbound slot.
    #[inline]
    pub fn new() -> SelfRef<'a, T> {
        SelfRef {
            slot: UnsafeCell::new(Weak::new()),
        }
    }

    /// Binds the slot. Sound only while no other reference to the slot
    /// exists, which creation guarantees by installing before the value
    /// escapes.
    pub(super) fn install(&self, weak: Weak<'a, T>) {
        unsafe {
            *self.slot.get() = weak;
        }
    }

    #[inline]
    fn get(&self) -> &Weak<'a, T> {
        unsafe { &*self.slot.get() }
    }
}

impl<'a, T> Default for SelfRef<'a, T> {
    #[inline]
    fn default() -> SelfRef<'a, T> {
        SelfRef::new()
    }
}

// The slot is written once before the value is shared and read-only after.
unsafe impl<'a, T: Send + Sync> Send for SelfRef<'a, T> {}

unsafe impl<'a, T: Send + Sync> Sync for SelfRef<'a, T> {}

/// Lets a refcounted value hand out strong handles to itself.
pub trait SharedFromSelf<'a>: Sized {
    /// Returns the value's self-reference slot.
    fn self_ref(&self) -> &SelfRef<'a, Self>;

    /// Returns a strong handle to this value. Fails with `EmptyPointer`
    /// when the value was not created through
    /// [`Shared::try_new_with_self`], and `PointerExpired` while the value
    /// is being torn down.
    fn shared_from_self(&self) -> Result<Shared<'a, Self>> {
        self.self_ref().get().upgrade()
    }
}
