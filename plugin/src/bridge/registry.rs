//! Connection Registry
//!
//! Owns every connection, keyed by handle. Create/close/destroy and the
//! dispatcher's per-event lookups all go through one table lock; native
//! client calls are made after the lock is released.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use url::Url;

use crate::bridge::connection::{Connection, ConnectionTable};
use crate::bridge::endpoint::{broadcast_endpoint, parse_target};
use crate::bridge::{
    BridgeConfig, BridgeError, BridgeResult, ClientHandle, ConnectionState, EventDispatcher,
    EventSink, WS_CLOSED,
};
use crate::native::{NativeClient, NativeClientFactory, NativeDelegate, TungsteniteFactory};

pub struct ConnectionRegistry {
    config: BridgeConfig,
    factory: Arc<dyn NativeClientFactory>,
    connections: Arc<ConnectionTable>,
    dispatcher: Arc<EventDispatcher>,
    next_handle: AtomicI32,
}

impl ConnectionRegistry {
    pub fn new(config: BridgeConfig, factory: Arc<dyn NativeClientFactory>) -> Self {
        let connections = Arc::new(ConnectionTable::default());
        let dispatcher = Arc::new(EventDispatcher::new(
            connections.clone(),
            config.forward_unhandled_errors,
        ));
        Self {
            config,
            factory,
            connections,
            dispatcher,
            next_handle: AtomicI32::new(1),
        }
    }

    /// Registry whose connections use the tokio-tungstenite native client.
    pub fn with_tungstenite(config: BridgeConfig) -> Self {
        Self::new(config, Arc::new(TungsteniteFactory::new()))
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// Route all five event kinds to `sink`, replacing whatever was registered.
    pub fn register_sink(&self, sink: Arc<dyn EventSink>) {
        self.dispatcher.register(sink);
    }

    /// Create a connection to `uri` and start connecting in the background.
    ///
    /// Only a malformed target fails here. Network failures arrive later as an
    /// error event.
    pub fn create(&self, uri: &str) -> BridgeResult<ClientHandle> {
        let target = if self.config.broadcast_endpoint {
            broadcast_endpoint(uri, self.config.allow_tls)?
        } else {
            parse_target(uri, self.config.allow_tls)?
        };

        let handle = self.allocate()?;
        let attached = Arc::new(AtomicBool::new(true));
        let delegate = NativeDelegate::new(handle, Arc::downgrade(&self.dispatcher), attached.clone());
        let client = self.factory.create(&target, &self.config, delegate);

        log::info!("[WebSocket {}] Created for {}", handle, target);
        self.connections
            .lock()
            .insert(handle, Connection::new(target, client.clone(), attached));

        client.connect();
        Ok(handle)
    }

    /// Queue `message` on an open connection.
    pub fn send(&self, handle: ClientHandle, message: impl Into<String>) -> BridgeResult<()> {
        let client = self
            .with_connection(handle, |connection| {
                (connection.state == ConnectionState::Open).then(|| connection.client.clone())
            })
            .ok()
            .flatten()
            .ok_or(BridgeError::NotConnected(handle))?;

        let message = message.into();
        log::debug!("[WebSocket {}] Sending {} bytes", handle, message.len());
        client.send(message);
        Ok(())
    }

    /// Request an orderly close. Unknown or already closing handles are ignored.
    pub fn close(&self, handle: ClientHandle) {
        let client = self.with_connection(handle, |connection| match connection.state {
            ConnectionState::Connecting | ConnectionState::Open => {
                connection.state = ConnectionState::Closing;
                Some(connection.client.clone())
            }
            ConnectionState::Closing | ConnectionState::Closed | ConnectionState::Failed => None,
        });

        match client {
            Ok(Some(client)) => {
                log::info!("[WebSocket {}] Closing", handle);
                client.close();
            }
            Ok(None) => {}
            Err(e) => log::debug!("Ignoring close: {}", e),
        }
    }

    /// Remove the connection and release its native client immediately.
    ///
    /// Events the native client raises afterwards are dropped.
    pub fn destroy(&self, handle: ClientHandle) {
        let removed = self.connections.lock().remove(&handle);
        match removed {
            Some(connection) => release(handle, connection),
            None => log::debug!("Ignoring destroy: {}", BridgeError::UnknownHandle(handle)),
        }
    }

    /// Destroy every connection.
    pub fn destroy_all(&self) {
        let drained: Vec<(ClientHandle, Connection)> = self.connections.lock().drain().collect();
        for (handle, connection) in drained {
            release(handle, connection);
        }
    }

    pub fn state(&self, handle: ClientHandle) -> Option<ConnectionState> {
        self.with_connection(handle, |connection| connection.state).ok()
    }

    /// Browser-style ready state; unknown handles read as closed.
    pub fn ready_state(&self, handle: ClientHandle) -> u32 {
        self.state(handle)
            .map(ConnectionState::ready_state)
            .unwrap_or(WS_CLOSED)
    }

    pub fn uri(&self, handle: ClientHandle) -> Option<Url> {
        self.with_connection(handle, |connection| connection.uri.clone()).ok()
    }

    pub fn handles(&self) -> Vec<ClientHandle> {
        let mut handles: Vec<ClientHandle> = self.connections.lock().keys().copied().collect();
        handles.sort();
        handles
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate(&self) -> BridgeResult<ClientHandle> {
        self.next_handle
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| next.checked_add(1))
            .map(ClientHandle::from_raw)
            .map_err(|_| BridgeError::HandlesExhausted)
    }

    fn with_connection<T>(
        &self,
        handle: ClientHandle,
        f: impl FnOnce(&mut Connection) -> T,
    ) -> BridgeResult<T> {
        let mut connections = self.connections.lock();
        connections
            .get_mut(&handle)
            .map(f)
            .ok_or(BridgeError::UnknownHandle(handle))
    }
}

impl Drop for ConnectionRegistry {
    fn drop(&mut self) {
        if !self.is_empty() {
            log::info!("Dropping registry, destroying {} connections", self.len());
        }
        self.destroy_all();
    }
}

fn release(handle: ClientHandle, connection: Connection) {
    connection.detach();
    let client: Arc<dyn NativeClient> = connection.client;
    client.terminate();
    log::info!("[WebSocket {}] Destroyed", handle);
}
