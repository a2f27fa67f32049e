//! The duplex event loop.
//!
//! A single task multiplexes three sources with `tokio::select!`: the
//! interrupt signal, keyboard readiness, and receive-socket readiness. The
//! `biased` ordering makes the priorities explicit - interrupt first, then
//! keyboard, then network - so when keyboard and network are ready in the
//! same pass, composition intent wins over incoming display. That ordering
//! is a policy choice inherited from the transition table, not a fairness
//! guarantee.
//!
//! The receive arm carries an `if` guard tied to the duplex phase: while a
//! line is being composed the socket is simply not part of the wait set,
//! which is the whole interleaving guarantee. An unconsumed datagram stays
//! queued in the kernel; the UDP receive buffer is the only backpressure.
//!
//! Every failure here is fatal and propagates to the top-level handler in
//! `main`, which cleans up and exits. Interrupt is not an error: the loop
//! observes it at its one suspension point, restores the terminal, and
//! returns `Ok`.

use std::io::{self, Write};

use thiserror::Error;
use tokio::io::unix::AsyncFd;
use tokio::net::UdpSocket;

use talkline_core::duplex::{Duplex, KeyboardAction};
use talkline_core::message::{self, MESSAGE_LENGTH};

use crate::term::{Keyboard, TermError, TermGuard};
use crate::transport::Endpoints;

/// Event loop errors. All fatal; none are retried.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Registering stdin with the reactor failed.
    #[error("failed to register keyboard with the runtime: {0}")]
    Register(#[source] io::Error),

    /// Listening for the interrupt signal failed.
    #[error("failed to listen for interrupt: {0}")]
    Signal(#[source] io::Error),

    /// The multiplex wait itself failed.
    #[error("multiplex wait failed: {0}")]
    Multiplex(#[source] io::Error),

    /// Reading a completed line from the keyboard failed.
    #[error("failed to read from keyboard: {0}")]
    Keyboard(#[source] io::Error),

    /// Reading a datagram from the receive socket failed.
    #[error("failed to read from network: {0}")]
    Network(#[source] io::Error),

    /// Sending on the connected socket failed.
    #[error("failed to send message: {0}")]
    Send(#[source] io::Error),

    /// Writing an incoming message to the terminal failed.
    #[error("failed to display message: {0}")]
    Display(#[source] io::Error),

    /// A terminal mode switch failed mid-loop.
    #[error(transparent)]
    Term(#[from] TermError),
}

/// The event loop state: duplex phase, sockets, keyboard, terminal modes,
/// and the one reusable message buffer.
pub struct Runtime {
    duplex: Duplex,
    endpoints: Endpoints,
    keyboard: AsyncFd<Keyboard>,
    term: TermGuard,
    /// Reused every iteration; nothing is queued across iterations.
    buf: [u8; MESSAGE_LENGTH],
}

impl Runtime {
    /// Wire the sockets and terminal guard into a runnable loop.
    pub fn new(endpoints: Endpoints, term: TermGuard) -> Result<Self, RuntimeError> {
        let keyboard = AsyncFd::new(Keyboard).map_err(RuntimeError::Register)?;

        Ok(Self {
            duplex: Duplex::new(),
            endpoints,
            keyboard,
            term,
            buf: [0; MESSAGE_LENGTH],
        })
    }

    /// Run until interrupted.
    ///
    /// Returns `Ok` on interrupt shutdown with the terminal already
    /// restored. On error the terminal is restored by the guard's `Drop`.
    pub async fn run(mut self) -> Result<(), RuntimeError> {
        self.term.enter_standby()?;
        tracing::debug!("entering duplex loop");

        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                biased;

                signal = &mut interrupt => {
                    signal.map_err(RuntimeError::Signal)?;
                    tracing::debug!("interrupt received, cleaning up");
                    break;
                }

                ready = self.keyboard.readable() => {
                    let mut guard = ready.map_err(RuntimeError::Multiplex)?;

                    match self.duplex.on_keyboard_ready() {
                        KeyboardAction::BeginCompose => {
                            // Consume nothing: the terminal driver buffers
                            // and echoes the line from here on. The readiness
                            // that carried the first keystroke is stale once
                            // the driver owns the line, so discard it - the
                            // next genuine wake-up is a completed line.
                            self.term.enter_compose()?;
                            guard.clear_ready();
                        },
                        KeyboardAction::FinishCompose => {
                            // Drain every completed unit before returning to
                            // idle, so no stale readiness survives the phase
                            // switch. An over-long line surfaces here as
                            // several independent sends.
                            let mut line_consumed = false;
                            loop {
                                match guard.try_io(|inner| inner.get_ref().read(&mut self.buf)) {
                                    Ok(Ok(n)) => {
                                        line_consumed = true;
                                        if n == 0 {
                                            // EOF: an empty unit, never sent.
                                            break;
                                        }
                                        if let Some(payload) = message::outbound(&self.buf[..n]) {
                                            send_all(&self.endpoints.send, payload).await?;
                                            tracing::trace!(bytes = payload.len(), "line sent");
                                        }
                                    },
                                    Ok(Err(e)) => return Err(RuntimeError::Keyboard(e)),
                                    // No complete line yet: a spurious
                                    // wake-up. Stay in line mode with the
                                    // network muted until one arrives.
                                    Err(_would_block) => break,
                                }
                            }

                            if line_consumed {
                                self.term.enter_standby()?;
                                self.duplex.line_finished();
                            }
                        },
                    }
                }

                ready = self.endpoints.recv.readable(), if self.duplex.wants_network() => {
                    ready.map_err(RuntimeError::Multiplex)?;

                    match self.endpoints.recv.try_recv(&mut self.buf) {
                        Ok(n) => {
                            display(&self.buf[..n])?;
                            tracing::trace!(bytes = n, "datagram displayed");
                        },
                        Err(e) if e.kind() == io::ErrorKind::WouldBlock => {},
                        Err(e) => return Err(RuntimeError::Network(e)),
                    }
                }
            }
        }

        self.term.restore()?;
        Ok(())
    }
}

/// Send the whole payload with byte-offset continuation.
///
/// Repeats until every byte is reported transmitted and aborts on the first
/// error; there is no other retry anywhere in the design.
async fn send_all(socket: &UdpSocket, payload: &[u8]) -> Result<(), RuntimeError> {
    let mut sent = 0;
    while sent < payload.len() {
        let n = socket.send(&payload[sent..]).await.map_err(RuntimeError::Send)?;
        sent += n;
    }
    Ok(())
}

/// Write an incoming payload to the terminal, prefixed and flushed.
fn display(payload: &[u8]) -> Result<(), RuntimeError> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(&message::render(payload)).map_err(RuntimeError::Display)?;
    stdout.flush().map_err(RuntimeError::Display)
}
