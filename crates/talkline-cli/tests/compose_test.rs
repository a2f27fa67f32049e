//! Pty-backed check of the compose phase.
//!
//! The event loop reads the keyboard through the process stdin, so this
//! test runs it against a pseudo-terminal: the slave side becomes stdin
//! and the master side plays the user. Stdin is process-global state, so
//! this file holds exactly one test.

// Pty plumbing and attribute inspection go through raw libc calls, same
// as the `term` module.
#![allow(unsafe_code)]

use std::io;
use std::net::UdpSocket as StdUdpSocket;
use std::ptr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};

use talkline_cli::{Runtime, TermGuard, transport};
use talkline_core::{Config, MESSAGE_LENGTH};

/// Open a pty pair and make the slave side the process stdin.
///
/// Returns the master descriptor; the pair lives for the whole process.
fn pty_stdin() -> io::Result<libc::c_int> {
    let mut master = 0;
    let mut slave = 0;
    let rc = unsafe { libc::openpty(&mut master, &mut slave, ptr::null_mut(), ptr::null(), ptr::null()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::dup2(slave, libc::STDIN_FILENO) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(master)
}

/// Type on the pty, as the user would.
fn type_keys(master: libc::c_int, bytes: &[u8]) {
    let n = unsafe { libc::write(master, bytes.as_ptr().cast(), bytes.len()) };
    assert_eq!(n, bytes.len() as isize, "short write to pty master");
}

/// Whether stdin currently has line buffering (`ICANON`) enabled.
fn stdin_is_line_buffered() -> bool {
    let mut attrs = unsafe { std::mem::zeroed::<libc::termios>() };
    let rc = unsafe { libc::tcgetattr(libc::STDIN_FILENO, &raw mut attrs) };
    assert_eq!(rc, 0, "tcgetattr on pty stdin");
    attrs.c_lflag & libc::ICANON != 0
}

#[tokio::test]
async fn compose_mode_persists_until_the_line_is_sent() {
    let master = pty_stdin().expect("pty stdin");

    // The peer instance is just a bound socket; the runtime under test
    // sends to it and never needs an answer.
    let peer = UdpSocket::bind("127.0.0.1:0").await.expect("bind peer");
    let peer_port = peer.local_addr().expect("peer addr").port();
    let listen_probe = StdUdpSocket::bind("127.0.0.1:0").expect("bind listen probe");
    let listen_port = listen_probe.local_addr().expect("listen probe addr").port();
    drop(listen_probe);

    let config = Config::from_args(
        "127.0.0.1",
        Some(&peer_port.to_string()),
        Some(&listen_port.to_string()),
    )
    .expect("config");

    let endpoints = transport::open(&config).await.expect("open endpoints");
    let term = TermGuard::capture().expect("capture pty attributes");
    let runtime = Runtime::new(endpoints, term).expect("build runtime");
    let loop_task = tokio::spawn(runtime.run());

    // Idle: standby mode, line buffering off.
    sleep(Duration::from_millis(100)).await;
    assert!(!stdin_is_line_buffered(), "standby must have line buffering off");

    // First keystroke flips to compose mode and must stay there while the
    // rest of the line is still being typed.
    type_keys(master, b"h");
    sleep(Duration::from_millis(300)).await;
    assert!(stdin_is_line_buffered(), "line buffering must persist mid-composition");

    // Finishing the line delivers it as one datagram.
    type_keys(master, b"ello there\n");
    let mut buf = [0u8; MESSAGE_LENGTH];
    let (n, from) = timeout(Duration::from_secs(5), peer.recv_from(&mut buf))
        .await
        .expect("line delivered in time")
        .expect("receive composed line");
    assert_eq!(&buf[..n], b"hello there\n");
    assert!(from.ip().is_loopback());

    // Back to standby once the line is away.
    let mut back_in_standby = false;
    for _ in 0..50 {
        if !stdin_is_line_buffered() {
            back_in_standby = true;
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }
    assert!(back_in_standby, "standby must resume after the line is sent");

    loop_task.abort();
}
