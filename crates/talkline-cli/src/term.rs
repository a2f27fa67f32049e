//! Terminal mode controller.
//!
//! The terminal lives in one of two modes. *Standby* (line buffering and
//! echo off) makes stdin readable on the very first keystroke, so the event
//! loop can notice that the user started typing without consuming anything.
//! *Compose* (line buffering and echo on) hands line editing back to the
//! terminal driver: stdin only becomes readable again once a whole line has
//! been flushed.
//!
//! `ISIG` stays enabled in both modes, so Ctrl+C is delivered as a signal
//! and the event loop can shut down cooperatively at its suspension point.
//!
//! The attributes captured at startup are the restore point; [`TermGuard`]
//! re-applies them on `restore` and again from `Drop` as a backstop.

// Terminal attributes and descriptor flags are only reachable through raw
// libc calls.
#![allow(unsafe_code)]

use std::io;
use std::os::fd::{AsRawFd, RawFd};

use thiserror::Error;

/// Terminal controller errors.
#[derive(Debug, Error)]
pub enum TermError {
    /// Reading the startup attributes failed; without them there is no
    /// restore point, so this is fatal before the loop starts.
    #[error("failed to read terminal attributes: {0}")]
    Capture(#[source] io::Error),

    /// Applying a mode switch failed mid-loop.
    #[error("failed to apply terminal attributes: {0}")]
    Apply(#[source] io::Error),

    /// Restoring the startup attributes failed.
    #[error("failed to restore terminal attributes: {0}")]
    Restore(#[source] io::Error),

    /// Changing the stdin descriptor flags failed.
    #[error("failed to change stdin descriptor flags: {0}")]
    Flags(#[source] io::Error),
}

/// Owner of the terminal attribute state.
///
/// Captures a snapshot of the startup attributes plus a working copy that
/// the mode switches mutate. Also puts stdin into nonblocking mode for the
/// lifetime of the guard; the event loop relies on reads returning
/// `WouldBlock` instead of stalling the runtime.
pub struct TermGuard {
    /// Attributes at process start; never mutated, only re-applied.
    initial: libc::termios,
    /// Mutable copy the mode switches toggle.
    working: libc::termios,
    /// Stdin descriptor flags at process start.
    initial_flags: libc::c_int,
    restored: bool,
}

impl TermGuard {
    /// Capture the startup terminal attributes and prepare stdin.
    ///
    /// Must be called once, before the event loop starts. Fails when stdin
    /// is not a terminal.
    pub fn capture() -> Result<Self, TermError> {
        let initial = read_attrs().map_err(TermError::Capture)?;

        let initial_flags = unsafe { libc::fcntl(libc::STDIN_FILENO, libc::F_GETFL) };
        if initial_flags < 0 {
            return Err(TermError::Flags(io::Error::last_os_error()));
        }
        set_flags(initial_flags | libc::O_NONBLOCK).map_err(TermError::Flags)?;

        Ok(Self { initial, working: initial, initial_flags, restored: false })
    }

    /// Enter standby mode: no line buffering, no echo.
    ///
    /// Used while idle so readiness fires on the first keystroke.
    pub fn enter_standby(&mut self) -> Result<(), TermError> {
        self.working.c_lflag &= !(libc::ICANON | libc::ECHO);
        self.apply()
    }

    /// Enter compose mode: line buffering and echo on.
    ///
    /// Used while a message is being typed; the terminal driver provides
    /// editing and delivers the line as one unit.
    pub fn enter_compose(&mut self) -> Result<(), TermError> {
        self.working.c_lflag |= libc::ICANON | libc::ECHO;
        self.apply()
    }

    /// Re-apply the startup attributes and descriptor flags.
    ///
    /// Idempotent; called once during normal cleanup, and again from `Drop`
    /// if an error path skipped it.
    pub fn restore(&mut self) -> Result<(), TermError> {
        if self.restored {
            return Ok(());
        }

        apply_attrs(&self.initial).map_err(TermError::Restore)?;
        set_flags(self.initial_flags).map_err(TermError::Flags)?;
        self.restored = true;
        Ok(())
    }

    fn apply(&self) -> Result<(), TermError> {
        apply_attrs(&self.working).map_err(TermError::Apply)
    }
}

impl Drop for TermGuard {
    fn drop(&mut self) {
        if !self.restored {
            let _ = apply_attrs(&self.initial);
            let _ = set_flags(self.initial_flags);
        }
    }
}

/// Raw stdin descriptor, used to register keyboard readiness with the
/// runtime and to perform bounded nonblocking reads.
#[derive(Debug)]
pub struct Keyboard;

impl AsRawFd for Keyboard {
    fn as_raw_fd(&self) -> RawFd {
        libc::STDIN_FILENO
    }
}

impl Keyboard {
    /// Read at most `buf.len()` bytes from the keyboard.
    ///
    /// In compose mode the terminal driver delivers at most one line per
    /// call; a longer line arrives in `buf.len()`-sized pieces across
    /// successive calls. Returns `WouldBlock` when no completed unit is
    /// available yet.
    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 { Err(io::Error::last_os_error()) } else { Ok(n as usize) }
    }
}

fn read_attrs() -> io::Result<libc::termios> {
    let mut attrs = unsafe { std::mem::zeroed::<libc::termios>() };
    if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &raw mut attrs) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(attrs)
}

fn apply_attrs(attrs: &libc::termios) -> io::Result<()> {
    if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, attrs) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn set_flags(flags: libc::c_int) -> io::Result<()> {
    if unsafe { libc::fcntl(libc::STDIN_FILENO, libc::F_SETFL, flags) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
