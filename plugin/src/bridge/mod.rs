//! Connection Registry and Event Dispatcher
//!
//! The platform-agnostic core of the bridge. Callers create connections by
//! URI and get back an integer handle; native clients report events through
//! the dispatcher, which forwards them to whichever sinks are registered.
//! No Bevy or scripting dependencies - this can be used standalone.

mod config;
mod connection;
mod dispatcher;
pub mod endpoint;
mod error;
mod event;
mod handle;
mod registry;
mod state;

pub use config::BridgeConfig;
pub use dispatcher::{EventDispatcher, HandleSink, TextSink};
pub use error::{BridgeError, BridgeResult};
pub use event::{BridgeEvent, ChannelSink, EventKind, EventReceiver, EventSink};
pub use handle::ClientHandle;
pub use registry::ConnectionRegistry;
pub use state::{ConnectionState, WS_CLOSED, WS_CLOSING, WS_CONNECTING, WS_OPEN};
