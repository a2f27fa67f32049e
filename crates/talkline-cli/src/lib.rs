//! Terminal and socket plumbing for talkline.
//!
//! A thin shell over `talkline-core`: [`transport`] opens the two UDP
//! endpoints, [`term`] switches the terminal between standby and compose
//! modes, and [`runtime`] drives the duplex loop that ties them together.
//! All decisions live in the core crate; this one only performs I/O.

#![deny(missing_docs)]

pub mod runtime;
pub mod term;
pub mod transport;

pub use runtime::{Runtime, RuntimeError};
pub use term::{TermError, TermGuard};
pub use transport::{Endpoints, TransportError, open};
