//! Fallible construction dispatch.
//!
//! Types advertise at most one construction strategy; [`Construct`] is the
//! uniform entry point callers go through. The strategy order mirrors the
//! fixed dispatch hierarchy:
//!
//! 1. [`TryConstruct`]: default-construct a shell in place, then finish it
//!    with a fallible hook. The zero-copy path.
//! 2. [`TryAllocate`]: a factory that receives the destination hold.
//! 3. [`TryCreate`]: a self-contained factory.
//! 4. Plain move: any value already in hand constructs infallibly.
//!
//! A strategy is wired to `Construct` with the matching macro
//! ([`construct_by_hook!`], [`construct_by_hold_factory!`],
//! [`construct_by_factory!`], [`construct_by_default!`]); the blanket
//! identity impl covers the plain move tier for every type.

mod clone;

pub use self::clone::{CloneIntoHold, TryClone};

pub(crate) use self::clone::try_clone_at;

use core::ptr;

use crate::alloc::Hold;
use crate::error::Result;

/// Two-phase fallible construction: a default shell finished in place.
///
/// The shell must be inexpensive to default-construct and safe to drop if
/// `try_construct` fails.
pub trait TryConstruct<Args>: Default {
    /// Finishes constructing `self` from `args`; on error `self` is left in
    /// its droppable default state.
    fn try_construct(&mut self, hold: &dyn Hold, args: Args) -> Result<()>;
}

/// Fallible factory that allocates out of an explicit hold.
pub trait TryAllocate<Args>: Sized {
    /// Returns a new instance whose internal allocations come from `hold`.
    fn try_allocate(hold: &dyn Hold, args: Args) -> Result<Self>;
}

/// Self-contained fallible factory.
pub trait TryCreate<Args>: Sized {
    /// Returns a new instance constructed from `args`.
    fn try_create(args: Args) -> Result<Self>;
}

/// Uniform fallible construction entry point.
///
/// Callers that need to build a `T` from `Args` in hold-managed memory go
/// through this trait and stay agnostic of the strategy `T` wired up.
pub trait Construct<Args = Self>: Sized {
    /// Produces a value of `Self` from `args`, allocating out of `hold`
    /// where the strategy calls for it.
    fn try_produce(hold: &dyn Hold, args: Args) -> Result<Self>;

    /// Constructs a value of `Self` from `args` directly into the
    /// uninitialized storage at `dst`. On error `dst` is left
    /// uninitialized.
    ///
    /// # Safety
    ///
    /// `dst` must be valid for writes of `Self` and properly aligned.
    #[inline]
    unsafe fn try_construct_at(hold: &dyn Hold, dst: *mut Self, args: Args) -> Result<()> {
        let value = Self::try_produce(hold, args)?;
        ptr::write(dst, value);
        Ok(())
    }
}

/// Every value constructs itself by moving into place.
impl<T> Construct<T> for T {
    #[inline]
    fn try_produce(_hold: &dyn Hold, args: T) -> Result<T> {
        Ok(args)
    }
}

/// Wires [`Construct`] to the [`TryConstruct`] strategy for a type. The
/// in-place form writes the default shell straight into the destination,
/// dropping it again if the hook fails.
#[macro_export]
macro_rules! construct_by_hook {
    ($type:ty, $args:ty) => {
        impl $crate::construct::Construct<$args> for $type {
            fn try_produce(
                hold: &dyn $crate::alloc::Hold,
                args: $args,
            ) -> $crate::error::Result<Self> {
                let mut shell = <$type as ::core::default::Default>::default();
                $crate::construct::TryConstruct::try_construct(&mut shell, hold, args)?;
                ::core::result::Result::Ok(shell)
            }

            unsafe fn try_construct_at(
                hold: &dyn $crate::alloc::Hold,
                dst: *mut Self,
                args: $args,
            ) -> $crate::error::Result<()> {
                ::core::ptr::write(dst, <$type as ::core::default::Default>::default());
                match $crate::construct::TryConstruct::try_construct(&mut *dst, hold, args) {
                    ::core::result::Result::Ok(()) => ::core::result::Result::Ok(()),
                    ::core::result::Result::Err(error) => {
                        ::core::ptr::drop_in_place(dst);
                        ::core::result::Result::Err(error)
                    }
                }
            }
        }
    };
}

/// Wires [`Construct`] to the [`TryAllocate`] strategy for a type.
#[macro_export]
macro_rules! construct_by_hold_factory {
    ($type:ty, $args:ty) => {
        impl $crate::construct::Construct<$args> for $type {
            #[inline]
            fn try_produce(
                hold: &dyn $crate::alloc::Hold,
                args: $args,
            ) -> $crate::error::Result<Self> {
                <$type as $crate::construct::TryAllocate<$args>>::try_allocate(hold, args)
            }
        }
    };
}

/// Wires [`Construct`] to the [`TryCreate`] strategy for a type.
#[macro_export]
macro_rules! construct_by_factory {
    ($type:ty, $args:ty) => {
        impl $crate::construct::Construct<$args> for $type {
            #[inline]
            fn try_produce(
                _hold: &dyn $crate::alloc::Hold,
                args: $args,
            ) -> $crate::error::Result<Self> {
                <$type as $crate::construct::TryCreate<$args>>::try_create(args)
            }
        }
    };
}

/// Wires argument-free [`Construct`] to a type's `Default` impl.
#[macro_export]
macro_rules! construct_by_default {
    ($type:ty) => {
        impl $crate::construct::Construct<()> for $type {
            #[inline]
            fn try_produce(
                _hold: &dyn $crate::alloc::Hold,
                _args: (),
            ) -> $crate::error::Result<Self> {
                ::core::result::Result::Ok(<$type as ::core::default::Default>::default())
            }
        }
    };
}
