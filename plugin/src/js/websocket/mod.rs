//! WebSocket bridge for the Boa JS engine.
//!
//! Scripts create connections through `BridgeSocket`, backed by a
//! [`ConnectionRegistry`](crate::bridge::ConnectionRegistry). Events raised on
//! native I/O threads are pushed onto the engine thread via
//! `JsEngineClient::execute()`, so script handlers always run on the script
//! thread.

mod extension;
mod shim;
mod sink;

pub use extension::WebSocketExtension;
pub use sink::ScriptSink;
