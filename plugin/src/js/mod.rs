//! JavaScript Engine Module
//!
//! A Boa JS engine running on a dedicated thread, driven over a command
//! channel, plus the websocket extension that exposes the bridge to scripts.
//! No Bevy dependencies - this can be used standalone.

mod builder;
mod client;
mod engine;
mod websocket;

pub use builder::{JsEngineBuilder, JsEngineExtension};
pub use client::JsEngineClient;
pub use engine::{JsCommand, JsEngine, JsEngineThread};
pub use websocket::{ScriptSink, WebSocketExtension};
