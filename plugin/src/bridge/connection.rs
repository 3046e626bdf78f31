use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use url::Url;

use crate::bridge::{ClientHandle, ConnectionState, EventKind};
use crate::native::NativeClient;

/// One live websocket client and its bookkeeping.
pub(crate) struct Connection {
    pub(crate) uri: Url,
    pub(crate) state: ConnectionState,
    opened: bool,
    pub(crate) client: Arc<dyn NativeClient>,
    attached: Arc<AtomicBool>,
}

impl Connection {
    pub(crate) fn new(uri: Url, client: Arc<dyn NativeClient>, attached: Arc<AtomicBool>) -> Self {
        Self {
            uri,
            state: ConnectionState::Connecting,
            opened: false,
            client,
            attached,
        }
    }

    /// Apply the state transition for `kind` and report whether the event may
    /// be dispatched.
    pub(crate) fn apply(&mut self, kind: EventKind) -> bool {
        match kind {
            EventKind::Opened => {
                if self.state != ConnectionState::Connecting {
                    return false;
                }
                self.state = ConnectionState::Open;
                self.opened = true;
                true
            }
            EventKind::Message => {
                self.opened && matches!(self.state, ConnectionState::Open | ConnectionState::Closing)
            }
            EventKind::Closed => {
                if self.state.is_terminal() {
                    return false;
                }
                self.state = ConnectionState::Closed;
                true
            }
            EventKind::Error => {
                if self.state.is_terminal() {
                    return false;
                }
                self.state = ConnectionState::Failed;
                true
            }
            EventKind::Log => true,
        }
    }

    pub(crate) fn attached(&self) -> Arc<AtomicBool> {
        self.attached.clone()
    }

    /// Neutralize the native client's delegate so late events become no-ops.
    pub(crate) fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }
}

/// Handle-keyed connection map shared by the registry and the dispatcher.
#[derive(Default)]
pub(crate) struct ConnectionTable {
    connections: Mutex<HashMap<ClientHandle, Connection>>,
}

impl ConnectionTable {
    pub(crate) fn lock(&self) -> MutexGuard<'_, HashMap<ClientHandle, Connection>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
