//! Physical memory model: the address/size of a raw memory area, and the
//! size/alignment constraints a valid area must satisfy.

mod block;
mod layout;

pub use self::block::Block;
pub use self::layout::Layout;
