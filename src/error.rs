use thiserror::Error;

/// Failure code for every fallible operation in the crate.
///
/// The enumeration is closed and stable: every fallible operation maps its
/// failure onto exactly one of these variants, including the
/// concurrency/locking codes surfaced by external synchronization
/// collaborators, which share this set for uniformity.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum Error {
    /// The backing allocator could not satisfy the request.
    #[error("allocation failed")]
    AllocationFailed,
    /// The backing allocator could not grow the block without moving it.
    #[error("in-place growth failed")]
    InPlaceGrowthFailed,
    /// The operation will never succeed on this target.
    #[error("unsupported operation")]
    UnsupportedOperation,
    /// A position argument fell outside the valid range.
    #[error("out of range")]
    OutOfRange,
    /// An argument was rejected before any resource was acquired.
    #[error("invalid argument")]
    InvalidArgument,
    /// The entry is already present.
    #[error("already exists")]
    AlreadyExists,
    /// The handle was never bound to an owned object.
    #[error("empty pointer")]
    EmptyPointer,
    /// The pointed-to object has already been dropped.
    #[error("pointer expired")]
    PointerExpired,
    /// No owner is associated with the resource.
    #[error("no owner")]
    NoOwner,
    /// An index fell outside the live element range.
    #[error("out of bounds")]
    OutOfBounds,
    /// Acquiring the lock would deadlock.
    #[error("deadlock")]
    Deadlock,
    /// The caller does not own the resource it tried to release.
    #[error("invalid owner")]
    InvalidOwner,
    /// The resource is still locked.
    #[error("still locked")]
    StillLocked,
    /// The resource is not locked.
    #[error("not locked")]
    NotLocked,
    /// The wait expired before the operation completed.
    #[error("timed out")]
    TimedOut,
    /// Transient contention; retrying may succeed.
    #[error("try again")]
    TryAgain,
    /// The target has not been initialized.
    #[error("not initialized")]
    NotInitialized,
    /// The container holds no elements.
    #[error("container empty")]
    ContainerEmpty,
    /// The requested entry was not found.
    #[error("not found")]
    NotFound,
}

/// The universal fallible-return convention used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
