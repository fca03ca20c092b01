//! Trap for misuse of trapping accessors.
//!
//! Indexing out of bounds through a trapping accessor is a programming
//! error, not a runtime condition: the trap reports the failing expression
//! through a global, replaceable handler and then aborts the process. The
//! checked accessor family returns an [`Error`](crate::error::Error)
//! instead.

use core::panic::Location;
use core::sync::atomic::{AtomicPtr, Ordering::SeqCst};
use std::process;

/// Failure-reporting callback: failing expression text, caller source
/// location, and a message. The process terminates after the handler
/// returns.
pub type TrapHandler = fn(expr: &str, location: &Location, msg: &str);

static HANDLER: AtomicPtr<()> = AtomicPtr::new(default_handler as TrapHandler as *mut ());

fn default_handler(expr: &str, location: &Location, msg: &str) {
    log::error!("trap: {} at {}: {}", expr, location, msg);
    eprintln!("[trymem trap] {} at {}: {}", expr, location, msg);
}

/// Replaces the global trap handler. Process-wide; set once at startup.
pub fn set_handler(handler: TrapHandler) {
    HANDLER.store(handler as *mut (), SeqCst);
}

/// Reports a trap violation and aborts the process.
#[cold]
#[track_caller]
pub fn fail(expr: &str, msg: &str) -> ! {
    let handler = HANDLER.load(SeqCst);
    // The pointer always originates from a `TrapHandler` store above.
    let handler = unsafe { core::mem::transmute::<*mut (), TrapHandler>(handler) };
    handler(expr, Location::caller(), msg);
    process::abort();
}

/// Traps with the given message unless the condition holds.
#[macro_export]
macro_rules! trap_unless {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            $crate::trap::fail(stringify!($cond), $msg);
        }
    };
}
