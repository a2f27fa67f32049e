//! Message limits, send policy, and display formatting.
//!
//! The wire format is a bare UDP payload: the bytes the user typed,
//! newline included, capped at [`MESSAGE_LENGTH`] per datagram. A longer
//! line surfaces from the terminal in [`MESSAGE_LENGTH`]-sized pieces and
//! each piece travels as its own unrelated message.

/// Maximum payload bytes per datagram, and per terminal read.
pub const MESSAGE_LENGTH: usize = 700;

/// Marker prepended to every displayed incoming message.
pub const DISPLAY_PREFIX: &str = ">> ";

/// Send policy for a completed input line.
///
/// Lines of one or two bytes are noise - a lone newline, or a single
/// character plus its terminator - and are silently discarded. Anything
/// longer is forwarded unchanged.
pub fn outbound(line: &[u8]) -> Option<&[u8]> {
    if line.len() <= 2 { None } else { Some(line) }
}

/// Render an incoming payload for the terminal: prefix plus raw bytes.
///
/// No newline is appended; the sender's own line terminator (when present)
/// ends the display line.
pub fn render(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(DISPLAY_PREFIX.len() + payload.len());
    out.extend_from_slice(DISPLAY_PREFIX.as_bytes());
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn short_lines_are_discarded() {
        assert_eq!(outbound(b""), None);
        assert_eq!(outbound(b"\n"), None);
        assert_eq!(outbound(b"a\n"), None);
    }

    #[test]
    fn three_byte_line_is_sent_verbatim() {
        assert_eq!(outbound(b"ab\n"), Some(b"ab\n".as_slice()));
    }

    #[test]
    fn render_prefixes_without_touching_payload() {
        assert_eq!(render(b"hello\n"), b">> hello\n");
        assert_eq!(render(b""), b">> ");
    }

    proptest! {
        #[test]
        fn outbound_threshold_is_exactly_two(line in prop::collection::vec(any::<u8>(), 0..=32)) {
            match outbound(&line) {
                None => prop_assert!(line.len() <= 2),
                Some(sent) => {
                    prop_assert!(line.len() > 2);
                    prop_assert_eq!(sent, line.as_slice());
                },
            }
        }

        #[test]
        fn render_keeps_payload_bytes(payload in prop::collection::vec(any::<u8>(), 0..MESSAGE_LENGTH)) {
            let shown = render(&payload);
            prop_assert_eq!(&shown[..DISPLAY_PREFIX.len()], DISPLAY_PREFIX.as_bytes());
            prop_assert_eq!(&shown[DISPLAY_PREFIX.len()..], payload.as_slice());
        }
    }
}
