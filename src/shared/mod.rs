//! Atomically reference-counted values allocated out of a [`Hold`].
//!
//! A [`Shared`] handle keeps its value alive; a [`Weak`] handle observes it
//! without keeping it alive. The value and its control header live either
//! in one combined block or in two split blocks, chosen at creation time.
//! The value is destroyed when the last `Shared` drops; the blocks are
//! returned to the hold when the last handle of either kind drops.
//!
//! [`Hold`]: crate::alloc::Hold

mod header;
mod self_ref;
mod shared;
mod weak;

pub use self::self_ref::{SelfRef, SharedFromSelf};
pub use self::shared::Shared;
pub use self::weak::Weak;
