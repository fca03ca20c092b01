//! Logical memory model: the fallible allocator contract, the default
//! process-lifetime backend, an accounting wrapper, and transactional
//! allocate-and-construct helpers.

mod heap;
mod helper;
mod hold;
mod metered;

pub use self::heap::Heap;
pub use self::helper::{dealloc_one, try_alloc_array, try_alloc_one, try_clone_one, ArrayPtr};
pub use self::hold::{global, Hint, Hold};
pub use self::metered::Metered;
