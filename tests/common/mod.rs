use std::sync::atomic::{AtomicUsize, Ordering};

use trymem::alloc::{Heap, Hint, Hold, Metered};
use trymem::block::{Block, Layout};
use trymem::error::{Error, Result};

#[allow(dead_code)]
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Accounting hold that starts failing allocations once its budget is
/// spent. Deallocation always succeeds, so unwinding paths stay exact.
pub struct FlakyHold {
    base: Metered<Heap>,
    budget: AtomicUsize,
    dont_need: AtomicUsize,
}

#[allow(dead_code)]
impl FlakyHold {
    pub fn new(budget: usize) -> FlakyHold {
        FlakyHold {
            base: Metered::new(Heap::new()),
            budget: AtomicUsize::new(budget),
            dont_need: AtomicUsize::new(0),
        }
    }

    pub fn live(&self) -> usize {
        self.base.live()
    }

    pub fn used(&self) -> usize {
        self.base.used()
    }

    pub fn set_budget(&self, budget: usize) {
        self.budget.store(budget, Ordering::SeqCst);
    }

    /// Number of times a block was advised reclaimable.
    pub fn dont_need_advice(&self) -> usize {
        self.dont_need.load(Ordering::SeqCst)
    }

    fn take_ticket(&self) -> Result<()> {
        let mut budget = self.budget.load(Ordering::SeqCst);
        loop {
            if budget == 0 {
                return Err(Error::AllocationFailed);
            }
            match self.budget.compare_exchange_weak(
                budget,
                budget - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Ok(()),
                Err(current) => budget = current,
            }
        }
    }
}

unsafe impl Hold for FlakyHold {
    unsafe fn alloc(&self, layout: Layout) -> Result<Block> {
        self.take_ticket()?;
        self.base.alloc(layout)
    }

    unsafe fn resize_in_place(&self, block: Block, new_size: usize) -> Result<usize> {
        self.base.resize_in_place(block, new_size)
    }

    unsafe fn dealloc(&self, block: Block, layout: Layout) {
        self.base.dealloc(block, layout);
    }

    fn advise(&self, block: Block, hint: Hint) {
        if hint == Hint::DontNeed {
            self.dont_need.fetch_add(1, Ordering::SeqCst);
        }
        self.base.advise(block, hint);
    }
}
