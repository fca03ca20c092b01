use core::mem::{self, MaybeUninit};
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::alloc::Hold;
use crate::block::{Block, Layout};

/// Erases the borrow on a hold reference for storage inside a block.
///
/// The blocks must stay lifetime-free so the disposer fn pointers can
/// reach them; the handles carry the hold borrow in their `PhantomData`,
/// and every block is freed through a handle, so the stored pointer is
/// never dereferenced after the borrow ends.
fn erase_hold<'a>(hold: &'a dyn Hold) -> *const (dyn Hold + 'static) {
    unsafe { mem::transmute::<&'a dyn Hold, *const (dyn Hold + 'static)>(hold) }
}

/// Control header shared by every handle to one refcounted value.
///
/// `strong` counts the `Shared` handles; the value is destroyed when it
/// reaches zero. `weak` counts the `Weak` handles plus one held
/// collectively by the strong handles; the blocks are freed when it
/// reaches zero. Both counts start at one.
///
/// The header is type-erased: the two disposers are monomorphized for the
/// concrete value type and block shape at creation time, which is what
/// lets handles be re-pointed at fields of the value without changing the
/// header.
pub(crate) struct Header {
    pub(crate) strong: AtomicUsize,
    pub(crate) weak: AtomicUsize,
    /// Destroys the value. Called at most once, by the releaser of the
    /// last strong count.
    drop_value: unsafe fn(*mut Header),
    /// Returns the block (or blocks) to the hold. Called exactly once, by
    /// the releaser of the last weak count.
    drop_block: unsafe fn(*mut Header),
}

impl Header {
    /// Releases one strong count, destroying the value and releasing the
    /// collective weak count when it was the last.
    ///
    /// # Safety
    ///
    /// The caller must own a strong count on `header`.
    pub(crate) unsafe fn release_strong(header: NonNull<Header>) {
        if header.as_ref().strong.fetch_sub(1, Ordering::AcqRel) == 1 {
            (header.as_ref().drop_value)(header.as_ptr());
            Header::release_weak(header);
        }
    }

    /// Releases one weak count, returning the blocks to the hold when it
    /// was the last.
    ///
    /// # Safety
    ///
    /// The caller must own a weak count on `header`.
    pub(crate) unsafe fn release_weak(header: NonNull<Header>) {
        if header.as_ref().weak.fetch_sub(1, Ordering::AcqRel) == 1 {
            (header.as_ref().drop_block)(header.as_ptr());
        }
    }
}

/// Value and header in a single allocation. The header comes first so a
/// header pointer recovers the whole block.
#[repr(C)]
pub(crate) struct CombinedBlock<T> {
    pub(crate) header: Header,
    hold: *const dyn Hold,
    pub(crate) value: MaybeUninit<T>,
}

impl<T> CombinedBlock<T> {
    /// Allocates a combined block out of `hold` with both counts at one
    /// and the value slot uninitialized.
    pub(crate) fn try_alloc(hold: &dyn Hold) -> crate::error::Result<NonNull<CombinedBlock<T>>> {
        unsafe {
            let block = hold.alloc(Layout::for_type::<CombinedBlock<T>>())?;
            let combined = block.as_ptr() as *mut CombinedBlock<T>;
            ptr::addr_of_mut!((*combined).header).write(Header {
                strong: AtomicUsize::new(1),
                weak: AtomicUsize::new(1),
                drop_value: CombinedBlock::<T>::drop_value,
                drop_block: CombinedBlock::<T>::drop_block,
            });
            ptr::addr_of_mut!((*combined).hold).write(erase_hold(hold));
            Ok(NonNull::new_unchecked(combined))
        }
    }

    /// Returns the block to the hold without running either disposer.
    /// Used to unwind a creation that failed before any handle existed.
    pub(crate) unsafe fn dealloc(combined: NonNull<CombinedBlock<T>>) {
        let hold = combined.as_ref().hold;
        let block = Block::from_raw_parts(
            combined.as_ptr() as *mut u8,
            Layout::for_type::<CombinedBlock<T>>().size(),
        );
        (*hold).dealloc(block, Layout::for_type::<CombinedBlock<T>>());
    }

    unsafe fn drop_value(header: *mut Header) {
        let combined = header as *mut CombinedBlock<T>;
        ptr::drop_in_place((*combined).value.as_mut_ptr());
    }

    unsafe fn drop_block(header: *mut Header) {
        let combined = header as *mut CombinedBlock<T>;
        let hold = (*combined).hold;
        let block = Block::from_raw_parts(
            combined as *mut u8,
            Layout::for_type::<CombinedBlock<T>>().size(),
        );
        (*hold).dealloc(block, Layout::for_type::<CombinedBlock<T>>());
    }
}

/// Header allocation pointing at a value allocated separately. Used when
/// the value must be released eagerly on last strong drop while weak
/// handles may outlive it, without keeping the value's bytes around.
#[repr(C)]
pub(crate) struct SplitBlock<T> {
    pub(crate) header: Header,
    hold: *const dyn Hold,
    value: NonNull<T>,
}

impl<T> SplitBlock<T> {
    /// Allocates a header block out of `hold` adopting the already
    /// constructed `value`, with both counts at one.
    pub(crate) fn try_alloc(
        hold: &dyn Hold,
        value: NonNull<T>,
    ) -> crate::error::Result<NonNull<SplitBlock<T>>> {
        unsafe {
            let block = hold.alloc(Layout::for_type::<SplitBlock<T>>())?;
            let split = block.as_ptr() as *mut SplitBlock<T>;
            ptr::addr_of_mut!((*split).header).write(Header {
                strong: AtomicUsize::new(1),
                weak: AtomicUsize::new(1),
                drop_value: SplitBlock::<T>::drop_value,
                drop_block: SplitBlock::<T>::drop_block,
            });
            ptr::addr_of_mut!((*split).hold).write(erase_hold(hold));
            ptr::addr_of_mut!((*split).value).write(value);
            Ok(NonNull::new_unchecked(split))
        }
    }

    unsafe fn drop_value(header: *mut Header) {
        let split = header as *mut SplitBlock<T>;
        let hold = (*split).hold;
        let value = (*split).value;
        ptr::drop_in_place(value.as_ptr());
        let block = Block::from_raw_parts(value.as_ptr() as *mut u8, Layout::for_type::<T>().size());
        (*hold).dealloc(block, Layout::for_type::<T>());
    }

    unsafe fn drop_block(header: *mut Header) {
        let split = header as *mut SplitBlock<T>;
        let hold = (*split).hold;
        let block = Block::from_raw_parts(
            split as *mut u8,
            Layout::for_type::<SplitBlock<T>>().size(),
        );
        (*hold).dealloc(block, Layout::for_type::<SplitBlock<T>>());
    }
}
