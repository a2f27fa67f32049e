//! Transport setup: the two unicast UDP endpoints.
//!
//! One socket only sends, one socket only receives; nothing couples them
//! beyond sharing the process. The send socket is connected to the peer at
//! startup so later writes never re-specify the destination. Setup happens
//! once - any failure here is fatal for this process instance.

use std::io;

use thiserror::Error;
use tokio::net::UdpSocket;

use talkline_core::Config;

/// Socket setup errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Creating or connecting the send socket failed.
    #[error("failed to open send socket: {0}")]
    Send(#[source] io::Error),

    /// Creating or binding the receive socket failed.
    #[error("failed to open receive socket: {0}")]
    Receive(#[source] io::Error),
}

/// The process-lifetime socket pair.
#[derive(Debug)]
pub struct Endpoints {
    /// Connected to the peer; used only for sending.
    pub send: UdpSocket,
    /// Bound to the wildcard address at the listen port; used only for
    /// receiving.
    pub recv: UdpSocket,
}

/// Open both endpoints from a validated configuration.
pub async fn open(config: &Config) -> Result<Endpoints, TransportError> {
    let send = UdpSocket::bind("0.0.0.0:0").await.map_err(TransportError::Send)?;
    send.connect(config.peer_addr()).await.map_err(TransportError::Send)?;

    let recv = UdpSocket::bind(config.listen_addr()).await.map_err(TransportError::Receive)?;

    Ok(Endpoints { send, recv })
}
