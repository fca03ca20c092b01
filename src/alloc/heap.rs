use std::alloc;

use crate::block::{Block, Layout};
use crate::error::{Error, Result};

use super::hold::Hold;

/// Process-lifetime [`Hold`] backed by the system allocator.
///
/// `Heap` never grows a block in place; `resize_in_place` always fails with
/// `InPlaceGrowthFailed`, so reallocation takes the move path. Zero-sized
/// requests succeed with the empty sentinel block and never reach the
/// system allocator.
#[derive(Debug, Default)]
pub struct Heap;

impl Heap {
    #[inline]
    pub const fn new() -> Heap {
        Heap
    }
}

unsafe impl Hold for Heap {
    unsafe fn alloc(&self, layout: Layout) -> Result<Block> {
        if layout.size() == 0 {
            return Ok(Block::empty());
        }
        let std_layout = alloc::Layout::from_size_align(layout.size(), layout.align())
            .map_err(|_| Error::InvalidArgument)?;
        let data = alloc::alloc(std_layout);
        if data.is_null() {
            return Err(Error::AllocationFailed);
        }
        Ok(Block::from_raw_parts(data, layout.size()))
    }

    unsafe fn resize_in_place(&self, _block: Block, _new_size: usize) -> Result<usize> {
        Err(Error::InPlaceGrowthFailed)
    }

    unsafe fn dealloc(&self, block: Block, layout: Layout) {
        if block.size() == 0 {
            return;
        }
        let std_layout =
            alloc::Layout::from_size_align_unchecked(block.size(), layout.align());
        alloc::dealloc(block.as_ptr(), std_layout);
    }
}
