//! WebSocket Bridge Bevy Plugin
//!
//! Exposes a connection registry to ECS systems and turns native websocket
//! events into Bevy messages on the main schedule.

mod plugin;

pub use plugin::{BridgeEventReceiver, WebSocketBridge, WebSocketBridgePlugin, WsEvent};
