//! Command-line configuration validation.
//!
//! Raw argument strings are validated here, before any socket exists, so the
//! binary can report a targeted diagnostic plus usage and exit without
//! cleanup. Both ports default to 12345 when omitted.

use std::net::{Ipv4Addr, SocketAddrV4};

use thiserror::Error;

/// Port used for both sending and listening when not given on the
/// command line.
pub const DEFAULT_PORT: u16 = 12345;

/// Which port argument failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortArg {
    /// The peer's destination port (second argument).
    Send,
    /// The local listen port (third argument).
    Listen,
}

impl std::fmt::Display for PortArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Send => write!(f, "send"),
            Self::Listen => write!(f, "listen"),
        }
    }
}

/// Validation errors for command-line arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The peer address is not a valid IPv4 dotted-decimal literal.
    #[error("{0:?} is not a valid IP address")]
    InvalidAddress(String),

    /// A port argument is not a positive integer in 1..=65535.
    #[error("{value:?} is not a valid {which} port")]
    InvalidPort {
        /// Which argument was malformed.
        which: PortArg,
        /// The rejected input.
        value: String,
    },
}

/// Validated endpoint configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Peer IPv4 address datagrams are sent to.
    pub peer: Ipv4Addr,
    /// Destination port on the peer.
    pub send_port: u16,
    /// Local port datagrams are received on.
    pub listen_port: u16,
}

impl Config {
    /// Validate raw argument strings into a configuration.
    ///
    /// `peer_ip` must be an IPv4 literal; each port, when present, must parse
    /// as an integer in 1..=65535. Omitted ports fall back to
    /// [`DEFAULT_PORT`].
    pub fn from_args(
        peer_ip: &str,
        send_port: Option<&str>,
        listen_port: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let peer: Ipv4Addr = peer_ip
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(peer_ip.to_string()))?;

        let send_port = match send_port {
            Some(raw) => parse_port(raw, PortArg::Send)?,
            None => DEFAULT_PORT,
        };
        let listen_port = match listen_port {
            Some(raw) => parse_port(raw, PortArg::Listen)?,
            None => DEFAULT_PORT,
        };

        Ok(Self { peer, send_port, listen_port })
    }

    /// Remote address the send socket connects to.
    pub fn peer_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.peer, self.send_port)
    }

    /// Wildcard address the receive socket binds to.
    pub fn listen_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.listen_port)
    }
}

/// Parse one port argument. Zero is rejected along with non-numeric input.
fn parse_port(raw: &str, which: PortArg) -> Result<u16, ConfigError> {
    match raw.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort { which, value: raw.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_ports_default_to_12345() {
        let config = Config::from_args("127.0.0.1", None, None).expect("valid config");

        assert_eq!(config.send_port, DEFAULT_PORT);
        assert_eq!(config.listen_port, DEFAULT_PORT);
        assert_eq!(config.peer, Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn explicit_ports_are_independent() {
        let config =
            Config::from_args("10.0.0.2", Some("9000"), Some("9001")).expect("valid config");

        assert_eq!(config.send_port, 9000);
        assert_eq!(config.listen_port, 9001);
        assert_eq!(config.peer_addr().to_string(), "10.0.0.2:9000");
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:9001");
    }

    #[test]
    fn malformed_address_is_rejected() {
        for bad in ["localhost", "300.0.0.1", "1.2.3", "", "::1"] {
            let err = Config::from_args(bad, None, None).expect_err("address must be rejected");
            assert_eq!(err, ConfigError::InvalidAddress(bad.to_string()));
        }
    }

    #[test]
    fn malformed_ports_are_rejected() {
        for bad in ["0", "-1", "port", "", "70000", "12 34"] {
            let err = Config::from_args("127.0.0.1", Some(bad), None)
                .expect_err("send port must be rejected");
            assert_eq!(
                err,
                ConfigError::InvalidPort { which: PortArg::Send, value: bad.to_string() }
            );

            let err = Config::from_args("127.0.0.1", None, Some(bad))
                .expect_err("listen port must be rejected");
            assert_eq!(
                err,
                ConfigError::InvalidPort { which: PortArg::Listen, value: bad.to_string() }
            );
        }
    }
}
