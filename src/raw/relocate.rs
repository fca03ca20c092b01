/// Marker for types whose values may be relocated as raw bytes.
///
/// Containers use the marker to pick their reallocation strategy: for a
/// relocatable element type, growth goes through [`Hold::realloc`] (which
/// may extend the block in place or bulk-copy it) and positional shifts use
/// overlapping byte moves; for any other type, growth takes a fresh
/// allocation and moves one element at a time.
///
/// The marker defaults to non-relocatable. Opt a type in with the
/// [`relocatable!`] macro once every field of the type is itself safe to
/// move as bytes.
///
/// [`Hold::realloc`]: crate::alloc::Hold::realloc
pub trait Relocatable {
    const RELOCATABLE: bool = false;
}

/// Marks one or more types as safe to relocate as raw bytes.
#[macro_export]
macro_rules! relocatable {
    ($($type:ty),* $(,)?) => {
        $(
            impl $crate::raw::Relocatable for $type {
                const RELOCATABLE: bool = true;
            }
        )*
    };
}

relocatable!(());
relocatable!(u8, u16, u32, u64, u128, usize);
relocatable!(i8, i16, i32, i64, i128, isize);
relocatable!(f32, f64);
relocatable!(char, bool);

impl<T> Relocatable for *const T {
    const RELOCATABLE: bool = true;
}

impl<T> Relocatable for *mut T {
    const RELOCATABLE: bool = true;
}

impl<T> Relocatable for core::ptr::NonNull<T> {
    const RELOCATABLE: bool = true;
}

impl<T: Relocatable> Relocatable for Option<T> {
    const RELOCATABLE: bool = T::RELOCATABLE;
}

impl<T0: Relocatable, T1: Relocatable> Relocatable for (T0, T1) {
    const RELOCATABLE: bool = T0::RELOCATABLE && T1::RELOCATABLE;
}

impl<T0: Relocatable, T1: Relocatable, T2: Relocatable> Relocatable for (T0, T1, T2) {
    const RELOCATABLE: bool = T0::RELOCATABLE && T1::RELOCATABLE && T2::RELOCATABLE;
}

impl<T: Relocatable, const N: usize> Relocatable for [T; N] {
    const RELOCATABLE: bool = T::RELOCATABLE;
}
