//! Native client capability interface
//!
//! A native client wraps one platform websocket implementation. The registry
//! only ever asks it to connect, send, close, or terminate; everything the
//! client observes comes back through its [`NativeDelegate`].

mod ws_client;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use url::Url;

use crate::bridge::{BridgeConfig, ClientHandle, EventDispatcher};

pub use ws_client::{TungsteniteClient, TungsteniteFactory};

/// Operations the registry performs on a native websocket client.
///
/// None of these may block on network I/O.
pub trait NativeClient: Send + Sync + 'static {
    /// Begin the asynchronous connect. Called once, right after creation.
    fn connect(&self);

    /// Queue a text message for transmission.
    fn send(&self, text: String);

    /// Begin an orderly close handshake.
    fn close(&self);

    /// Release the client immediately, without waiting for a close handshake.
    fn terminate(&self);
}

/// Builds native clients for new connections.
pub trait NativeClientFactory: Send + Sync + 'static {
    fn create(&self, uri: &Url, config: &BridgeConfig, delegate: NativeDelegate)
    -> Arc<dyn NativeClient>;
}

/// Callback target handed to a native client, bound to one handle.
///
/// Once the connection is destroyed the delegate is detached and every call
/// becomes a no-op.
#[derive(Clone)]
pub struct NativeDelegate {
    handle: ClientHandle,
    dispatcher: Weak<EventDispatcher>,
    attached: Arc<AtomicBool>,
}

impl NativeDelegate {
    pub(crate) fn new(
        handle: ClientHandle,
        dispatcher: Weak<EventDispatcher>,
        attached: Arc<AtomicBool>,
    ) -> Self {
        Self {
            handle,
            dispatcher,
            attached,
        }
    }

    pub fn handle(&self) -> ClientHandle {
        self.handle
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn dispatcher(&self) -> Option<Arc<EventDispatcher>> {
        if !self.is_attached() {
            log::debug!("[WebSocket {}] Delegate detached, ignoring event", self.handle);
            return None;
        }
        self.dispatcher.upgrade()
    }

    pub fn opened(&self) {
        if let Some(dispatcher) = self.dispatcher() {
            dispatcher.on_opened(self.handle);
        }
    }

    pub fn closed(&self) {
        if let Some(dispatcher) = self.dispatcher() {
            dispatcher.on_closed(self.handle);
        }
    }

    pub fn message(&self, text: &str) {
        if let Some(dispatcher) = self.dispatcher() {
            dispatcher.on_message(self.handle, text);
        }
    }

    pub fn log(&self, text: &str) {
        if let Some(dispatcher) = self.dispatcher() {
            dispatcher.on_log(self.handle, text);
        }
    }

    pub fn error(&self, text: &str) {
        if let Some(dispatcher) = self.dispatcher() {
            dispatcher.on_error(self.handle, text);
        }
    }
}
