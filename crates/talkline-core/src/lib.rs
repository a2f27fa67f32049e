//! Core logic for talkline, a bidirectional UDP terminal chat endpoint.
//!
//! Everything in this crate is pure and I/O-free: the duplex two-phase
//! state machine, the outbound send policy, and command-line configuration
//! validation. Socket and terminal plumbing lives in `talkline-cli`, which
//! drives these types from its event loop.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod duplex;
pub mod message;

pub use config::{Config, ConfigError};
pub use duplex::{Duplex, KeyboardAction, Phase};
pub use message::{DISPLAY_PREFIX, MESSAGE_LENGTH};
