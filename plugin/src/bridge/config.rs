use serde::{Deserialize, Serialize};

use crate::bridge::BridgeResult;

/// Settings shared by a registry and the native clients it creates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Origin header sent with the opening handshake.
    pub origin: Option<String>,
    /// Offered `Sec-WebSocket-Protocol` values.
    pub subprotocols: Vec<String>,
    /// Tokio worker threads for each connection's I/O runtime.
    pub worker_threads: usize,
    /// Rewrite every target to the `/broadcast/<server>/<conn>/websocket` form.
    pub broadcast_endpoint: bool,
    /// Keep TLS for https/wss targets. When false they are downgraded to ws.
    pub allow_tls: bool,
    /// Route error events that have no error sink to the log sink.
    pub forward_unhandled_errors: bool,
    /// Bound of the channel used to marshal events onto the Bevy main thread.
    /// Events beyond it are dropped until the next frame drains the channel.
    pub event_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            origin: None,
            subprotocols: Vec::new(),
            worker_threads: 2,
            broadcast_endpoint: false,
            allow_tls: true,
            forward_unhandled_errors: true,
            event_capacity: 256,
        }
    }
}

impl BridgeConfig {
    pub fn from_json(source: &str) -> BridgeResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_subprotocol(mut self, protocol: impl Into<String>) -> Self {
        self.subprotocols.push(protocol.into());
        self
    }

    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads.max(1);
        self
    }

    pub fn with_broadcast_endpoint(mut self, enabled: bool) -> Self {
        self.broadcast_endpoint = enabled;
        self
    }

    pub fn with_allow_tls(mut self, allow_tls: bool) -> Self {
        self.allow_tls = allow_tls;
        self
    }

    pub fn with_forward_unhandled_errors(mut self, enabled: bool) -> Self {
        self.forward_unhandled_errors = enabled;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
