use core::fmt;
use core::ptr::{self, NonNull};
use core::slice;
use core::str;

use crate::alloc::Hold;
use crate::block::{Block, Layout};
use crate::construct::{CloneIntoHold, TryClone};
use crate::error::{Error, Result};
use crate::trap_unless;

use super::relocate::Relocatable;

/// Shared terminator for strings that have not allocated yet. Read-only;
/// every accessor that writes checks the capacity first.
static EMPTY: u8 = 0;

/// Growable UTF-8 string allocated out of a [`Hold`].
///
/// The backing store always holds `capacity + 1` bytes; the byte past the
/// content is a NUL terminator, kept valid across every mutation, so
/// [`as_c_ptr`] hands out a C-compatible pointer without copying. An
/// unallocated string points at a shared static terminator.
///
/// Operations that would split a multi-byte character fail with
/// `InvalidArgument`.
///
/// [`as_c_ptr`]: RawString::as_c_ptr
pub struct RawString<'h> {
    hold: &'h dyn Hold,
    data: NonNull<u8>,
    len: usize,
    cap: usize,
}

impl<'h> RawString<'h> {
    /// Returns a new empty string that will allocate out of `hold`.
    /// Allocates nothing until the first reservation.
    #[inline]
    pub fn new(hold: &'h dyn Hold) -> RawString<'h> {
        RawString {
            hold,
            data: unsafe { NonNull::new_unchecked(&EMPTY as *const u8 as *mut u8) },
            len: 0,
            cap: 0,
        }
    }

    /// Returns a new string holding a copy of `s`, reserved exactly.
    pub fn try_create(hold: &'h dyn Hold, s: &str) -> Result<RawString<'h>> {
        let mut string = RawString::new(hold);
        if !s.is_empty() {
            string.try_reserve(s.len())?;
            unsafe {
                ptr::copy_nonoverlapping(s.as_ptr(), string.data.as_ptr(), s.len());
                string.len = s.len();
                *string.data.as_ptr().add(string.len) = 0;
            }
        }
        Ok(string)
    }

    /// Returns the hold this string allocates out of.
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

    /// Returns the number of content bytes the string can hold without
    /// growing; the terminator byte is not counted.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        unsafe { str::from_utf8_unchecked(slice::from_raw_parts(self.data.as_ptr(), self.len)) }
    }

    /// Returns a NUL-terminated pointer to the content. Valid until the
    /// next mutation; never null, even for an empty string.
    #[inline]
    pub fn as_c_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Grows the backing store to hold at least `new_cap` content bytes
    /// plus the terminator. Does nothing when already large enough.
    pub fn try_reserve(&mut self, new_cap: usize) -> Result<()> {
        if new_cap <= self.cap {
            return Ok(());
        }
        let bytes = match new_cap.checked_add(1) {
            Some(bytes) => bytes,
            None => return Err(Error::InvalidArgument),
        };
        let new_layout = Layout::for_type::<u8>().resized(bytes);
        unsafe {
            if self.cap != 0 {
                if self.hold.resize_in_place(self.block(), bytes).is_ok() {
                    self.cap = new_cap;
                    return Ok(());
                }
                let new_block = self.hold.realloc(self.block(), new_layout)?;
                self.data = NonNull::new_unchecked(new_block.as_ptr());
            } else {
                let new_block = self.hold.alloc(new_layout)?;
                self.data = NonNull::new_unchecked(new_block.as_ptr());
                *self.data.as_ptr() = 0;
            }
        }
        self.cap = new_cap;
        Ok(())
    }

    /// Appends `s` to the end of the string, growing geometrically when
    /// full. On failure the string is unchanged.
    pub fn try_append(&mut self, s: &str) -> Result<()> {
        if s.is_empty() {
            return Ok(());
        }
        let new_len = self.len + s.len();
        if new_len > self.cap {
            self.try_reserve(core::cmp::max(self.cap * 2, new_len))?;
        }
        unsafe {
            ptr::copy_nonoverlapping(s.as_ptr(), self.data.as_ptr().add(self.len), s.len());
            self.len = new_len;
            *self.data.as_ptr().add(self.len) = 0;
        }
        Ok(())
    }

    /// Appends a single character.
    pub fn try_push(&mut self, c: char) -> Result<()> {
        let mut encoded = [0u8; 4];
        self.try_append(c.encode_utf8(&mut encoded))
    }

    /// Appends formatted text, growing as needed. Allocation failure
    /// surfaces as the underlying error; a formatter-side failure maps to
    /// `UnsupportedOperation`.
    pub fn try_append_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        struct Adapter<'a, 'h> {
            string: &'a mut RawString<'h>,
            error: Option<Error>,
        }

        impl<'a, 'h> fmt::Write for Adapter<'a, 'h> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                match self.string.try_append(s) {
                    Ok(()) => Ok(()),
                    Err(error) => {
                        self.error = Some(error);
                        Err(fmt::Error)
                    }
                }
            }
        }

        let mut adapter = Adapter {
            string: self,
            error: None,
        };
        match fmt::write(&mut adapter, args) {
            Ok(()) => Ok(()),
            Err(_) => Err(match adapter.error {
                Some(error) => error,
                None => Error::UnsupportedOperation,
            }),
        }
    }

    /// Replaces the content with a copy of `s`, reusing the backing store
    /// when it fits.
    pub fn try_assign(&mut self, s: &str) -> Result<()> {
        if s.is_empty() && self.cap == 0 {
            // Unallocated strings point at the read-only terminator.
            return Ok(());
        }
        if s.len() <= self.cap && self.cap != 0 {
            unsafe {
                ptr::copy_nonoverlapping(s.as_ptr(), self.data.as_ptr(), s.len());
                self.len = s.len();
                *self.data.as_ptr().add(self.len) = 0;
            }
            return Ok(());
        }
        let bytes = match s.len().checked_add(1) {
            Some(bytes) => bytes,
            None => return Err(Error::InvalidArgument),
        };
        let new_layout = Layout::for_type::<u8>().resized(bytes);
        unsafe {
            let new_block = self.hold.alloc(new_layout)?;
            if self.cap != 0 {
                self.hold.dealloc(self.block(), self.layout());
            }
            self.data = NonNull::new_unchecked(new_block.as_ptr());
            self.cap = s.len();
            ptr::copy_nonoverlapping(s.as_ptr(), self.data.as_ptr(), s.len());
            self.len = s.len();
            *self.data.as_ptr().add(self.len) = 0;
        }
        Ok(())
    }

    /// Resizes to `new_len` bytes. Shrinking cuts at `new_len`, which must
    /// land on a character boundary; growing appends copies of `fill`,
    /// which must be an ASCII character so the fill stays one byte wide.
    pub fn try_resize(&mut self, new_len: usize, fill: char) -> Result<()> {
        if new_len <= self.len {
            if !self.as_str().is_char_boundary(new_len) {
                return Err(Error::InvalidArgument);
            }
            self.len = new_len;
            if self.cap != 0 {
                unsafe {
                    *self.data.as_ptr().add(self.len) = 0;
                }
            }
            return Ok(());
        }
        if !fill.is_ascii() {
            return Err(Error::InvalidArgument);
        }
        self.try_reserve(new_len)?;
        unsafe {
            ptr::write_bytes(self.data.as_ptr().add(self.len), fill as u8, new_len - self.len);
            self.len = new_len;
            *self.data.as_ptr().add(self.len) = 0;
        }
        Ok(())
    }

    /// Inserts `s` at byte position `pos`, shifting the tail up. Fails
    /// with `OutOfRange` when `pos` is past the end and `InvalidArgument`
    /// when `pos` splits a character.
    pub fn try_insert(&mut self, pos: usize, s: &str) -> Result<()> {
        if pos > self.len {
            return Err(Error::OutOfRange);
        }
        if !self.as_str().is_char_boundary(pos) {
            return Err(Error::InvalidArgument);
        }
        if s.is_empty() {
            return Ok(());
        }
        let new_len = self.len + s.len();
        if new_len > self.cap {
            self.try_reserve(core::cmp::max(self.cap * 2, new_len))?;
        }
        unsafe {
            let base = self.data.as_ptr();
            ptr::copy(base.add(pos), base.add(pos + s.len()), self.len - pos);
            ptr::copy_nonoverlapping(s.as_ptr(), base.add(pos), s.len());
            self.len = new_len;
            *base.add(self.len) = 0;
        }
        Ok(())
    }

    /// Removes `count` bytes starting at byte position `pos`, shifting the
    /// tail down; `count` clamps to the remaining length. Fails with
    /// `OutOfRange` when `pos` is past the end and `InvalidArgument` when
    /// either cut point splits a character.
    pub fn try_erase(&mut self, pos: usize, count: usize) -> Result<()> {
        if pos > self.len {
            return Err(Error::OutOfRange);
        }
        let actual = core::cmp::min(count, self.len - pos);
        let content = self.as_str();
        if !content.is_char_boundary(pos) || !content.is_char_boundary(pos + actual) {
            return Err(Error::InvalidArgument);
        }
        if actual == 0 {
            return Ok(());
        }
        unsafe {
            let base = self.data.as_ptr();
            ptr::copy(base.add(pos + actual), base.add(pos), self.len - pos - actual);
            self.len -= actual;
            *base.add(self.len) = 0;
        }
        Ok(())
    }

    /// Removes and returns the last character; fails with `OutOfRange`
    /// when the string is empty.
    pub fn try_pop(&mut self) -> Result<char> {
        let c = match self.as_str().chars().next_back() {
            Some(c) => c,
            None => return Err(Error::OutOfRange),
        };
        self.len -= c.len_utf8();
        unsafe {
            *self.data.as_ptr().add(self.len) = 0;
        }
        Ok(c)
    }

    /// Empties the string, keeping the capacity. Idempotent.
    pub fn clear(&mut self) {
        self.len = 0;
        if self.cap != 0 {
            unsafe {
                *self.data.as_ptr() = 0;
            }
        }
    }

    /// Releases unused capacity back to the hold; fails with
    /// `AllocationFailed` when the hold cannot produce the smaller block,
    /// leaving the string unchanged.
    pub fn try_shrink_to_fit(&mut self) -> Result<()> {
        if self.cap <= self.len {
            return Ok(());
        }
        unsafe {
            if self.len == 0 {
                self.hold.dealloc(self.block(), self.layout());
                self.data = NonNull::new_unchecked(&EMPTY as *const u8 as *mut u8);
                self.cap = 0;
                return Ok(());
            }
            let new_layout = Layout::for_type::<u8>().resized(self.len + 1);
            let new_block = self.hold.realloc(self.block(), new_layout)?;
            self.data = NonNull::new_unchecked(new_block.as_ptr());
            self.cap = self.len;
        }
        Ok(())
    }

    /// Returns the byte position of the first occurrence of `pattern` at
    /// or after `pos`.
    #[inline]
    pub fn find(&self, pattern: &str, pos: usize) -> Option<usize> {
        if pos > self.len {
            return None;
        }
        self.as_str()[pos..].find(pattern).map(|at| at + pos)
    }

    /// Returns the byte position of the last occurrence of `pattern`.
    #[inline]
    pub fn rfind(&self, pattern: &str) -> Option<usize> {
        self.as_str().rfind(pattern)
    }

    #[inline]
    pub fn contains(&self, pattern: &str) -> bool {
        self.as_str().contains(pattern)
    }

    #[inline]
    pub fn starts_with(&self, pattern: &str) -> bool {
        self.as_str().starts_with(pattern)
    }

    #[inline]
    pub fn ends_with(&self, pattern: &str) -> bool {
        self.as_str().ends_with(pattern)
    }

    /// Returns the byte at position `pos`; traps on an invalid position.
    #[inline]
    pub fn at(&self, pos: usize) -> u8 {
        trap_unless!(pos < self.len, "string index out of bounds");
        unsafe { *self.data.as_ptr().add(pos) }
    }

    /// Layout the current backing block was allocated with.
    #[inline]
    fn layout(&self) -> Layout {
        Layout::for_type::<u8>().resized(self.cap + 1)
    }

    #[inline]
    unsafe fn block(&self) -> Block {
        Block::from_raw_parts(self.data.as_ptr(), self.cap + 1)
    }
}

impl<'h> Drop for RawString<'h> {
    fn drop(&mut self) {
        if self.cap != 0 {
            unsafe {
                self.hold.dealloc(self.block(), self.layout());
            }
        }
    }
}

impl<'h> TryClone for RawString<'h> {
    /// Deep copy into the same hold.
    fn try_clone(&self) -> Result<RawString<'h>> {
        RawString::try_create(self.hold, self.as_str())
    }
}

impl<'a, 'h> CloneIntoHold<'a, RawString<'a>> for RawString<'h> {
    fn try_clone_into_hold(&self, hold: &'a dyn Hold) -> Result<RawString<'a>> {
        RawString::try_create(hold, self.as_str())
    }
}

impl<'h> PartialEq for RawString<'h> {
    #[inline]
    fn eq(&self, other: &RawString<'h>) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<'h> Eq for RawString<'h> {}

impl<'h> PartialEq<str> for RawString<'h> {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<'h> PartialEq<&str> for RawString<'h> {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<'h> PartialOrd for RawString<'h> {
    #[inline]
    fn partial_cmp(&self, other: &RawString<'h>) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<'h> Ord for RawString<'h> {
    #[inline]
    fn cmp(&self, other: &RawString<'h>) -> core::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl<'h> fmt::Display for RawString<'h> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

impl<'h> fmt::Debug for RawString<'h> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<'h> Relocatable for RawString<'h> {
    const RELOCATABLE: bool = true;
}
