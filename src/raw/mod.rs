//! Hold-managed containers: a growable element buffer, a growable byte
//! string, and a single-value box. Every owning type stores the hold it
//! allocates from and returns its block there on drop.

mod boxed;
mod buf;
mod relocate;
mod string;

pub use self::boxed::RawBox;
pub use self::buf::RawBuf;
pub use self::relocate::Relocatable;
pub use self::string::RawString;
