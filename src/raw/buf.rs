use core::fmt;
use core::ops::{Index, IndexMut};
use core::ptr::{self, NonNull};
use core::slice;

use crate::alloc::{Hint, Hold};
use crate::block::{Block, Layout};
use crate::construct::{CloneIntoHold, Construct, TryClone};
use crate::error::{Error, Result};
use crate::trap_unless;

use super::relocate::Relocatable;

/// Buffers whose backing store shrinks to or below this byte count on
/// `clear` keep their pages; larger ones are advised reclaimable.
const DISCARD_THRESHOLD: usize = 64 * 1024;

/// Growable element buffer allocated out of a [`Hold`].
///
/// All growth is explicit and fallible. Growth first asks the hold to
/// extend the block in place; failing that, relocatable element types go
/// through [`Hold::realloc`] while other types move one element at a time
/// through a fresh allocation. Mutating operations preserve the buffer
/// unchanged when they fail, except that capacity acquired before the
/// failure is kept.
pub struct RawBuf<'h, T: Relocatable> {
    hold: &'h dyn Hold,
    data: NonNull<T>,
    len: usize,
    cap: usize,
}

impl<'h, T: Relocatable> RawBuf<'h, T> {
    /// Returns a new empty buffer that will allocate out of `hold`.
    /// Allocates nothing until the first reservation.
    #[inline]
    pub fn new(hold: &'h dyn Hold) -> RawBuf<'h, T> {
        RawBuf {
            hold,
            data: NonNull::dangling(),
            len: 0,
            cap: 0,
        }
    }

    /// Returns a new buffer with capacity for at least `cap` elements.
    pub fn try_with_capacity(hold: &'h dyn Hold, cap: usize) -> Result<RawBuf<'h, T>> {
        let mut buf = RawBuf::new(hold);
        if cap != 0 {
            buf.try_reserve(cap)?;
        }
        Ok(buf)
    }

    /// Returns the hold this buffer allocates out of.
    #[inline]
    pub fn hold(&self) -> &'h dyn Hold {
        self.hold
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of elements the buffer can hold without growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.len) }
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Returns a reference to the element at `index`; fails with
    /// `OutOfRange` for an invalid index.
    #[inline]
    pub fn get(&self, index: usize) -> Result<&T> {
        if index >= self.len {
            return Err(Error::OutOfRange);
        }
        Ok(unsafe { &*self.data.as_ptr().add(index) })
    }

    /// Returns a mutable reference to the element at `index`; fails with
    /// `OutOfRange` for an invalid index.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        if index >= self.len {
            return Err(Error::OutOfRange);
        }
        Ok(unsafe { &mut *self.data.as_ptr().add(index) })
    }

    /// Returns a reference to the element at `index`; traps on an invalid
    /// index.
    #[inline]
    pub fn at(&self, index: usize) -> &T {
        trap_unless!(index < self.len, "buffer index out of bounds");
        unsafe { &*self.data.as_ptr().add(index) }
    }

    /// Returns a mutable reference to the element at `index`; traps on an
    /// invalid index.
    #[inline]
    pub fn at_mut(&mut self, index: usize) -> &mut T {
        trap_unless!(index < self.len, "buffer index out of bounds");
        unsafe { &mut *self.data.as_ptr().add(index) }
    }

    /// Returns the base pointer of the buffer; fails with `ContainerEmpty`
    /// when no element is stored.
    #[inline]
    pub fn try_data(&self) -> Result<NonNull<T>> {
        if self.len == 0 {
            return Err(Error::ContainerEmpty);
        }
        Ok(self.data)
    }

    /// Grows the backing store to hold at least `new_cap` elements. Does
    /// nothing when the buffer is already large enough. On failure the
    /// buffer is unchanged.
    pub fn try_reserve(&mut self, new_cap: usize) -> Result<()> {
        if new_cap <= self.cap {
            return Ok(());
        }
        let new_layout = Layout::for_array::<T>(new_cap)?;

        unsafe {
            if self.cap != 0 {
                let block = self.block();
                if self.hold.resize_in_place(block, new_layout.size()).is_ok() {
                    self.cap = new_cap;
                    return Ok(());
                }
            }

            if T::RELOCATABLE {
                let new_block = if self.cap == 0 {
                    self.hold.alloc(new_layout)?
                } else {
                    self.hold.realloc(self.block(), new_layout)?
                };
                self.data = NonNull::new_unchecked(new_block.as_ptr() as *mut T);
            } else {
                let new_block = self.hold.alloc(new_layout)?;
                let new_data = new_block.as_ptr() as *mut T;
                for slot in 0..self.len {
                    let value = ptr::read(self.data.as_ptr().add(slot));
                    ptr::write(new_data.add(slot), value);
                }
                if self.cap != 0 {
                    self.hold.dealloc(self.block(), self.layout());
                }
                self.data = NonNull::new_unchecked(new_data);
            }
            self.cap = new_cap;
        }
        Ok(())
    }

    /// Moves `value` onto the end of the buffer, growing if full. On
    /// failure the buffer contents are unchanged and `value` is dropped.
    pub fn try_push(&mut self, value: T) -> Result<()> {
        self.try_grow_for_one()?;
        unsafe {
            ptr::write(self.data.as_ptr().add(self.len), value);
        }
        self.len += 1;
        Ok(())
    }

    /// Constructs a new element from `args` directly in the slot past the
    /// end of the buffer, growing if full. On failure the buffer contents
    /// are unchanged.
    pub fn try_emplace<A>(&mut self, args: A) -> Result<&mut T>
    where
        T: Construct<A>,
    {
        self.try_grow_for_one()?;
        unsafe {
            let slot = self.data.as_ptr().add(self.len);
            T::try_construct_at(self.hold, slot, args)?;
            self.len += 1;
            Ok(&mut *slot)
        }
    }

    /// Constructs a new element from `args` at position `index`, shifting
    /// later elements up by one. Fails with `OutOfRange` when `index` is
    /// past the end.
    pub fn try_insert<A>(&mut self, index: usize, args: A) -> Result<&mut T>
    where
        T: Construct<A>,
    {
        if index > self.len {
            return Err(Error::OutOfRange);
        }
        self.try_grow_for_one()?;
        unsafe {
            let base = self.data.as_ptr();
            let move_count = self.len - index;
            if move_count != 0 {
                // The shift happens for both strategies; for relocatable
                // types it is a single overlapping byte move, otherwise the
                // slots move highest first so no element is overwritten
                // before it is read.
                if T::RELOCATABLE {
                    ptr::copy(base.add(index), base.add(index + 1), move_count);
                } else {
                    for slot in (index..self.len).rev() {
                        let value = ptr::read(base.add(slot));
                        ptr::write(base.add(slot + 1), value);
                    }
                }
            }
            match T::try_construct_at(self.hold, base.add(index), args) {
                Ok(()) => {
                    self.len += 1;
                    Ok(&mut *base.add(index))
                }
                Err(error) => {
                    // Undo the shift so the buffer reads back unchanged.
                    if move_count != 0 {
                        if T::RELOCATABLE {
                            ptr::copy(base.add(index + 1), base.add(index), move_count);
                        } else {
                            for slot in index..self.len {
                                let value = ptr::read(base.add(slot + 1));
                                ptr::write(base.add(slot), value);
                            }
                        }
                    }
                    Err(error)
                }
            }
        }
    }

    /// Destroys the element at `index`, shifting later elements down by
    /// one. Fails with `OutOfRange` for an invalid index.
    pub fn try_erase(&mut self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(Error::OutOfRange);
        }
        unsafe {
            let base = self.data.as_ptr();
            ptr::drop_in_place(base.add(index));
            let move_count = self.len - index - 1;
            if move_count != 0 {
                if T::RELOCATABLE {
                    ptr::copy(base.add(index + 1), base.add(index), move_count);
                } else {
                    for slot in index..index + move_count {
                        let value = ptr::read(base.add(slot + 1));
                        ptr::write(base.add(slot), value);
                    }
                }
            }
        }
        self.len -= 1;
        Ok(())
    }

    /// Removes and returns the element at `index`, shifting later elements
    /// down by one. Fails with `OutOfRange` for an invalid index.
    pub fn try_remove(&mut self, index: usize) -> Result<T> {
        if index >= self.len {
            return Err(Error::OutOfRange);
        }
        unsafe {
            let base = self.data.as_ptr();
            let value = ptr::read(base.add(index));
            let move_count = self.len - index - 1;
            if move_count != 0 {
                if T::RELOCATABLE {
                    ptr::copy(base.add(index + 1), base.add(index), move_count);
                } else {
                    for slot in index..index + move_count {
                        let moved = ptr::read(base.add(slot + 1));
                        ptr::write(base.add(slot), moved);
                    }
                }
            }
            self.len -= 1;
            Ok(value)
        }
    }

    /// Removes and returns the last element; fails with `OutOfRange` when
    /// the buffer is empty.
    pub fn try_pop(&mut self) -> Result<T> {
        if self.len == 0 {
            return Err(Error::OutOfRange);
        }
        self.len -= 1;
        Ok(unsafe { ptr::read(self.data.as_ptr().add(self.len)) })
    }

    /// Removes and returns the last element, or `None` when the buffer is
    /// empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.try_pop().ok()
    }

    /// Drops every element past `new_len`; does nothing when `new_len`
    /// covers the buffer.
    pub fn truncate(&mut self, new_len: usize) {
        while self.len > new_len {
            self.len -= 1;
            unsafe {
                ptr::drop_in_place(self.data.as_ptr().add(self.len));
            }
        }
    }

    /// Destroys every element, keeping the capacity. Idempotent. Backing
    /// stores of `DISCARD_THRESHOLD` bytes or more are advised reclaimable
    /// so an idle buffer does not pin cold pages.
    pub fn clear(&mut self) {
        self.truncate(0);
        let bytes = self.cap.wrapping_mul(core::mem::size_of::<T>());
        if bytes >= DISCARD_THRESHOLD {
            self.hold.advise(unsafe { self.block() }, Hint::DontNeed);
        }
    }

    /// Releases unused capacity back to the hold, best effort. The buffer
    /// is unchanged when the hold cannot shrink the block.
    pub fn shrink_to_fit(&mut self) {
        if self.len == self.cap {
            return;
        }
        unsafe {
            if self.len == 0 {
                if self.cap != 0 {
                    self.hold.dealloc(self.block(), self.layout());
                    self.data = NonNull::dangling();
                    self.cap = 0;
                }
                return;
            }
            if let Ok(new_layout) = Layout::for_array::<T>(self.len) {
                if T::RELOCATABLE {
                    if let Ok(new_block) = self.hold.realloc(self.block(), new_layout) {
                        self.data = NonNull::new_unchecked(new_block.as_ptr() as *mut T);
                        self.cap = self.len;
                    }
                } else if let Ok(new_block) = self.hold.alloc(new_layout) {
                    let new_data = new_block.as_ptr() as *mut T;
                    for slot in 0..self.len {
                        let value = ptr::read(self.data.as_ptr().add(slot));
                        ptr::write(new_data.add(slot), value);
                    }
                    self.hold.dealloc(self.block(), self.layout());
                    self.data = NonNull::new_unchecked(new_data);
                    self.cap = self.len;
                }
            }
        }
    }

    /// Appends a bulk byte copy of `values` to the end of the buffer,
    /// growing as needed. On failure the buffer is unchanged.
    pub fn try_extend_from_slice(&mut self, values: &[T]) -> Result<()>
    where
        T: Copy,
    {
        if values.is_empty() {
            return Ok(());
        }
        let new_len = match self.len.checked_add(values.len()) {
            Some(new_len) => new_len,
            None => return Err(Error::InvalidArgument),
        };
        if new_len > self.cap {
            self.try_reserve(core::cmp::max(self.cap * 2, new_len))?;
        }
        unsafe {
            ptr::copy_nonoverlapping(values.as_ptr(), self.data.as_ptr().add(self.len), values.len());
        }
        self.len = new_len;
        Ok(())
    }

    /// Replaces the contents with a bulk byte copy of `values`, reusing
    /// the backing store when it fits.
    pub fn try_clone_from_slice(&mut self, values: &[T]) -> Result<()>
    where
        T: Copy,
    {
        self.try_reserve(values.len())?;
        unsafe {
            ptr::copy_nonoverlapping(values.as_ptr(), self.data.as_ptr(), values.len());
        }
        self.len = values.len();
        Ok(())
    }

    /// Returns a deep copy of this buffer allocated in `hold`. Elements of
    /// `Copy` type are duplicated with a single bulk byte copy; see
    /// [`TryClone`] impls for the element-wise path.
    pub fn try_copy_into_hold(&self, hold: &'h dyn Hold) -> Result<RawBuf<'h, T>>
    where
        T: Copy,
    {
        let mut copy = RawBuf::try_with_capacity(hold, self.len)?;
        unsafe {
            ptr::copy_nonoverlapping(self.data.as_ptr(), copy.data.as_ptr(), self.len);
        }
        copy.len = self.len;
        Ok(copy)
    }

    #[inline]
    fn try_grow_for_one(&mut self) -> Result<()> {
        if self.len == self.cap {
            let new_cap = if self.cap == 0 { 8 } else { self.cap * 2 };
            self.try_reserve(new_cap)?;
        }
        Ok(())
    }

    /// Layout the current backing block was allocated with.
    #[inline]
    fn layout(&self) -> Layout {
        Layout::for_type::<T>().resized(core::mem::size_of::<T>() * self.cap)
    }

    #[inline]
    unsafe fn block(&self) -> Block {
        Block::from_raw_parts(self.data.as_ptr() as *mut u8, self.layout().size())
    }
}

impl<'h, T: Relocatable> Drop for RawBuf<'h, T> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.data.as_ptr(), self.len));
            if self.cap != 0 {
                self.hold.dealloc(self.block(), self.layout());
            }
        }
    }
}

impl<'h, T: Relocatable> Index<usize> for RawBuf<'h, T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        self.at(index)
    }
}

impl<'h, T: Relocatable> IndexMut<usize> for RawBuf<'h, T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.at_mut(index)
    }
}

impl<'h, 'b, T: Relocatable> IntoIterator for &'b RawBuf<'h, T> {
    type Item = &'b T;
    type IntoIter = slice::Iter<'b, T>;

    #[inline]
    fn into_iter(self) -> slice::Iter<'b, T> {
        self.iter()
    }
}

impl<'h, T: Relocatable + TryClone> TryClone for RawBuf<'h, T> {
    /// Deep copy into the same hold; on failure the partial copy is
    /// destroyed and the source is unchanged.
    fn try_clone(&self) -> Result<RawBuf<'h, T>> {
        let mut clone = RawBuf::try_with_capacity(self.hold, self.len)?;
        for value in self.iter() {
            clone.try_push(value.try_clone()?)?;
        }
        Ok(clone)
    }
}

impl<'a, 'h, T> CloneIntoHold<'a, RawBuf<'a, T>> for RawBuf<'h, T>
where
    T: Relocatable + CloneIntoHold<'a, T>,
{
    fn try_clone_into_hold(&self, hold: &'a dyn Hold) -> Result<RawBuf<'a, T>> {
        let mut clone = RawBuf::try_with_capacity(hold, self.len)?;
        for value in self.iter() {
            clone.try_push(value.try_clone_into_hold(hold)?)?;
        }
        Ok(clone)
    }
}

impl<'h, T: Relocatable + PartialEq> PartialEq for RawBuf<'h, T> {
    #[inline]
    fn eq(&self, other: &RawBuf<'h, T>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<'h, T: Relocatable + Eq> Eq for RawBuf<'h, T> {}

impl<'h, T: Relocatable + fmt::Debug> fmt::Debug for RawBuf<'h, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// A buffer of relocatable elements is itself relocatable.
impl<'h, T: Relocatable> Relocatable for RawBuf<'h, T> {
    const RELOCATABLE: bool = true;
}
