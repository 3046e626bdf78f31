//! Integration tests against a local tokio-tungstenite echo server.

mod common;

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use bevy_ws_bridge::{
    BridgeConfig, BridgeEvent, ChannelSink, ConnectionRegistry, ConnectionState, EventKind,
    EventReceiver,
};
use common::{
    CLOSE_REQUEST, closed_port, expect_event, peer_hung_up, quiet_period, start_echo_server,
};

fn registry() -> (ConnectionRegistry, EventReceiver) {
    let registry = ConnectionRegistry::with_tungstenite(BridgeConfig::default());
    let (sink, receiver) = ChannelSink::new(64);
    registry.register_sink(Arc::new(sink));
    (registry, receiver)
}

#[test]
fn echo_round_trip() {
    let addr = start_echo_server();
    let (registry, events) = registry();

    let handle = registry.create(&format!("ws://{}/echo", addr)).unwrap();
    assert_eq!(expect_event(&events, EventKind::Opened).handle(), handle);
    assert_eq!(registry.state(handle), Some(ConnectionState::Open));

    registry.send(handle, "hello").unwrap();
    assert_eq!(
        expect_event(&events, EventKind::Message),
        BridgeEvent::Message {
            handle,
            text: "hello".to_string()
        }
    );

    registry.close(handle);
    assert_eq!(expect_event(&events, EventKind::Closed).handle(), handle);
    assert_eq!(registry.state(handle), Some(ConnectionState::Closed));
    assert!(registry.send(handle, "late").is_err());

    registry.destroy(handle);
    assert!(registry.is_empty());
}

#[test]
fn http_scheme_is_upgraded() {
    let addr = start_echo_server();
    let (registry, events) = registry();

    let handle = registry.create(&format!("http://{}/echo", addr)).unwrap();
    assert_eq!(registry.uri(handle).unwrap().scheme(), "ws");
    expect_event(&events, EventKind::Opened);
}

#[test]
fn server_close_is_reported() {
    let addr = start_echo_server();
    let (registry, events) = registry();

    let handle = registry.create(&format!("ws://{}/echo", addr)).unwrap();
    expect_event(&events, EventKind::Opened);

    registry.send(handle, CLOSE_REQUEST).unwrap();
    assert_eq!(expect_event(&events, EventKind::Closed).handle(), handle);
    assert_eq!(registry.ready_state(handle), 3);
}

#[test]
fn clients_are_independent() {
    let addr = start_echo_server();
    let (registry, events) = registry();
    let url = format!("ws://{}/echo", addr);

    let first = registry.create(&url).unwrap();
    let second = registry.create(&url).unwrap();
    assert_ne!(first, second);

    let mut opened = vec![
        expect_event(&events, EventKind::Opened).handle(),
        expect_event(&events, EventKind::Opened).handle(),
    ];
    opened.sort();
    assert_eq!(opened, vec![first, second]);

    registry.send(first, "one").unwrap();
    assert_eq!(
        expect_event(&events, EventKind::Message),
        BridgeEvent::Message {
            handle: first,
            text: "one".to_string()
        }
    );

    registry.destroy(first);
    registry.send(second, "two").unwrap();
    assert_eq!(
        expect_event(&events, EventKind::Message),
        BridgeEvent::Message {
            handle: second,
            text: "two".to_string()
        }
    );
    assert_eq!(registry.handles(), vec![second]);
}

#[test]
fn connect_failure_reports_error_only() {
    let (registry, events) = registry();

    let handle = registry
        .create(&format!("ws://{}/echo", closed_port()))
        .unwrap();

    let event = expect_event(&events, EventKind::Error);
    assert_eq!(event.handle(), handle);
    assert!(event.text().unwrap().starts_with("Error:"), "{:?}", event);
    assert_eq!(registry.state(handle), Some(ConnectionState::Failed));

    assert!(quiet_period(&events, Duration::from_millis(300)).is_empty());
}

#[test]
fn destroy_silences_connection() {
    let addr = start_echo_server();
    let (registry, events) = registry();

    let handle = registry.create(&format!("ws://{}/echo", addr)).unwrap();
    expect_event(&events, EventKind::Opened);

    registry.destroy(handle);
    assert_eq!(registry.state(handle), None);

    let late: Vec<_> = quiet_period(&events, Duration::from_millis(300))
        .into_iter()
        .filter(|event| event.handle() == handle)
        .collect();
    assert!(late.is_empty(), "{:?}", late);
}

#[test]
fn destroy_releases_a_stalled_handshake() {
    // Accepts TCP but never answers the upgrade request.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let (registry, events) = registry();

    let handle = registry
        .create(&format!("ws://{}/echo", listener.local_addr().unwrap()))
        .unwrap();
    let (mut peer, _) = listener.accept().unwrap();
    assert_eq!(registry.state(handle), Some(ConnectionState::Connecting));

    registry.destroy(handle);
    assert!(peer_hung_up(&mut peer), "client socket still open after destroy");
    assert!(registry.is_empty());
    assert!(quiet_period(&events, Duration::from_millis(300)).is_empty());
}

#[test]
fn close_abandons_a_stalled_handshake() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let (registry, events) = registry();

    let handle = registry
        .create(&format!("ws://{}/echo", listener.local_addr().unwrap()))
        .unwrap();
    let (mut peer, _) = listener.accept().unwrap();

    registry.close(handle);
    assert_eq!(expect_event(&events, EventKind::Closed).handle(), handle);
    assert_eq!(registry.state(handle), Some(ConnectionState::Closed));
    assert!(peer_hung_up(&mut peer), "client socket still open after close");
}
