//! Native WebSocket clients for Bevy.
//!
//! - [`bridge`]: the handle-based connection registry and event dispatcher
//! - [`native`]: the native client seam and its tokio-tungstenite implementation
//! - [`js`]: a Boa engine thread with a `BridgeSocket` class for scripts
//! - [`js_bevy`] / [`bridge_bevy`]: Bevy plugins
//! - [`ffi`]: a C ABI over a process-wide registry

pub mod bridge;
pub mod bridge_bevy;
pub mod ffi;
pub mod js;
pub mod js_bevy;
pub mod native;

pub use bridge::{
    BridgeConfig, BridgeError, BridgeEvent, BridgeResult, ChannelSink, ClientHandle,
    ConnectionRegistry, ConnectionState, EventKind, EventReceiver, EventSink,
};
pub use bridge_bevy::{WebSocketBridge, WebSocketBridgePlugin, WsEvent};
pub use js_bevy::{JsClientResource, JsPlugin, JsPluginConfig};
