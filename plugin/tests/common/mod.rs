//! Local websocket echo server shared by the integration tests.

#![allow(dead_code)]

use std::io::{ErrorKind, Read};
use std::net::{SocketAddr, TcpStream as StdTcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use bevy_ws_bridge::{BridgeEvent, EventKind, EventReceiver};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Text that makes the server start the close handshake.
pub const CLOSE_REQUEST: &str = "server-close";

/// Start an echo server on its own thread and runtime.
///
/// Text and binary frames are echoed back. [`CLOSE_REQUEST`] makes the server
/// close the connection.
pub fn start_echo_server() -> SocketAddr {
    let (addr_tx, addr_rx) = mpsc::channel();

    thread::Builder::new()
        .name("echo-server".to_string())
        .spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .expect("echo server runtime");

            runtime.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
                addr_tx
                    .send(listener.local_addr().expect("local addr"))
                    .expect("report addr");

                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(echo_connection(stream));
                }
            });
        })
        .expect("spawn echo server");

    addr_rx.recv_timeout(TIMEOUT).expect("echo server address")
}

async fn echo_connection(stream: TcpStream) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };

    while let Some(Ok(msg)) = ws.next().await {
        match msg {
            Message::Text(ref text) if text.as_str() == CLOSE_REQUEST => {
                let _ = ws.close(None).await;
            }
            Message::Text(_) | Message::Binary(_) => {
                if ws.send(msg).await.is_err() {
                    break;
                }
            }
            _ => {}
        }
    }
}

/// An address nothing is listening on.
pub fn closed_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("local addr")
}

/// Wait for the next event of `kind` on `handle`, skipping log events.
///
/// Panics if anything else arrives first.
pub fn expect_event(receiver: &EventReceiver, kind: EventKind) -> BridgeEvent {
    loop {
        let event = receiver
            .recv_timeout(TIMEOUT)
            .unwrap_or_else(|| panic!("timed out waiting for {}", kind));
        if event.kind() == EventKind::Log {
            continue;
        }
        assert_eq!(event.kind(), kind, "unexpected event {:?}", event);
        return event;
    }
}

/// Collect non-log events that arrive within `window`.
pub fn quiet_period(receiver: &EventReceiver, window: Duration) -> Vec<BridgeEvent> {
    let mut events = Vec::new();
    while let Some(event) = receiver.recv_timeout(window) {
        if event.kind() != EventKind::Log {
            events.push(event);
        }
    }
    events
}

/// Wait for the client side of an accepted connection to go away.
///
/// Returns false if the client is still connected after [`TIMEOUT`].
pub fn peer_hung_up(peer: &mut StdTcpStream) -> bool {
    peer.set_read_timeout(Some(TIMEOUT)).expect("read timeout");
    let mut buf = [0u8; 1024];
    loop {
        match peer.read(&mut buf) {
            Ok(0) => return true,
            // The upgrade request; never answered.
            Ok(_) => continue,
            Err(e) if e.kind() == ErrorKind::ConnectionReset => return true,
            Err(_) => return false,
        }
    }
}
