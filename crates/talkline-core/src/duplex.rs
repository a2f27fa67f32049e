//! Duplex two-phase state machine.
//!
//! The endpoint is always either idle (watching the network, terminal in
//! standby mode) or composing (terminal in line mode, network muted). This
//! module owns that phase and nothing else; the event loop in `talkline-cli`
//! asks it what a keyboard wake-up means and applies the returned action to
//! the terminal and the sockets.
//!
//! The first keystroke while idle only flips the phase - no bytes are
//! consumed. The terminal driver then buffers and echoes the line, and the
//! next keyboard wake-up delivers it whole.

/// Current phase of the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Watching for incoming datagrams; keyboard readiness means the user
    /// just started typing.
    Idle,
    /// A line is being composed; keyboard readiness means the line is
    /// complete.
    Composing,
}

/// What the event loop must do after a keyboard wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardAction {
    /// Switch the terminal to line mode and leave the pending keystrokes
    /// unread for the terminal driver to buffer.
    BeginCompose,
    /// Read the completed line, switch the terminal back to standby, and
    /// apply the send policy.
    FinishCompose,
}

/// Phase owner.
///
/// While composing, [`Duplex::wants_network`] is false and the event loop
/// must keep the receive socket out of its wait set. That exclusion is what
/// stops an incoming message from tearing through a half-typed line.
#[derive(Debug, Clone, Copy)]
pub struct Duplex {
    phase: Phase,
}

impl Duplex {
    /// Start in the idle phase.
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the receive socket belongs in the wait set.
    pub fn wants_network(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Interpret a keyboard wake-up.
    ///
    /// Idle flips to composing immediately. A wake-up while composing does
    /// not change the phase here: the line read can turn out spurious (no
    /// complete line yet), so the loop confirms via [`Duplex::line_finished`]
    /// only once it actually consumed one.
    pub fn on_keyboard_ready(&mut self) -> KeyboardAction {
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Composing;
                KeyboardAction::BeginCompose
            },
            Phase::Composing => KeyboardAction::FinishCompose,
        }
    }

    /// A complete line was consumed; return to idle.
    pub fn line_finished(&mut self) {
        self.phase = Phase::Idle;
    }
}

impl Default for Duplex {
    fn default() -> Self {
        Self::new()
    }
}
