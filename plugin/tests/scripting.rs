//! `BridgeSocket` driven from a Boa context against a local echo server.

mod common;

use std::sync::mpsc::{self, Receiver, Sender};

use boa_engine::{Context, JsError, JsString, JsValue, NativeFunction};
use boa_gc::{Finalize, Trace, empty_trace};
use bevy_ws_bridge::BridgeConfig;
use bevy_ws_bridge::js::{
    JsEngineBuilder, JsEngineClient, JsEngineExtension, JsEngineThread, WebSocketExtension,
};
use common::{TIMEOUT, start_echo_server};

/// Installs `__probe(text)`, which reports back to the test thread.
struct Probe(Sender<String>);

#[derive(Clone, Finalize)]
struct ProbeSender(Sender<String>);

unsafe impl Trace for ProbeSender {
    empty_trace!();
}

impl JsEngineExtension for Probe {
    fn register(&self, context: &mut Context, _client: JsEngineClient) -> Result<(), JsError> {
        context.register_global_callable(
            JsString::from("__probe"),
            1,
            NativeFunction::from_copy_closure_with_captures(
                |_this: &JsValue, args: &[JsValue], probe: &ProbeSender, ctx: &mut Context| {
                    let text = match args.first() {
                        Some(value) => value.to_string(ctx)?.to_std_string_escaped(),
                        None => String::new(),
                    };
                    let _ = probe.0.send(text);
                    Ok(JsValue::undefined())
                },
                ProbeSender(self.0.clone()),
            ),
        )?;
        Ok(())
    }
}

fn start_engine() -> (JsEngineThread, Receiver<String>) {
    let (tx, rx) = mpsc::channel();
    let engine = JsEngineBuilder::new()
        .with_extension(WebSocketExtension::new(BridgeConfig::default()))
        .with_extension(Probe(tx))
        .build()
        .spawn()
        .unwrap();
    (engine, rx)
}

fn next_probe(rx: &Receiver<String>) -> String {
    rx.recv_timeout(TIMEOUT).expect("script did not report")
}

#[test]
fn bridge_socket_echo() {
    let addr = start_echo_server();
    let (engine, rx) = start_engine();

    engine.client().execute(format!(
        r#"
        var socket = new BridgeSocket('ws://{addr}/echo');
        socket.onopen = function() {{
            __probe('open:' + socket.readyState);
            socket.send('ping');
        }};
        socket.addEventListener('message', function(e) {{
            __probe('message:' + e.data);
            socket.close();
        }});
        socket.onclose = function() {{
            __probe('close:' + socket.readyState);
            socket.destroy();
        }};
        "#
    ));

    assert_eq!(next_probe(&rx), "open:1");
    assert_eq!(next_probe(&rx), "message:ping");
    assert_eq!(next_probe(&rx), "close:3");

    engine.shutdown();
}

#[test]
fn invalid_url_throws_type_error() {
    let (engine, rx) = start_engine();

    engine.client().execute(
        r#"
        try {
            new BridgeSocket('ftp://example.com');
            __probe('created');
        } catch (e) {
            __probe(e instanceof TypeError ? 'type-error' : 'other:' + e);
        }
        "#,
    );

    assert_eq!(next_probe(&rx), "type-error");
    engine.shutdown();
}

#[test]
fn send_before_open_throws() {
    let addr = common::closed_port();
    let (engine, rx) = start_engine();

    engine.client().execute(format!(
        r#"
        var socket = new BridgeSocket('ws://{addr}/');
        socket.onerror = function(e) {{ __probe('error:' + e.data.startsWith('Error:')); }};
        try {{
            socket.send('too early');
            __probe('sent');
        }} catch (e) {{
            __probe('throws');
        }}
        "#
    ));

    assert_eq!(next_probe(&rx), "throws");
    assert_eq!(next_probe(&rx), "error:true");
    engine.shutdown();
}
