use std::fmt;
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};

use serde::{Deserialize, Serialize};

use crate::bridge::ClientHandle;

/// The five event kinds a native client can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Opened,
    Closed,
    Message,
    Log,
    Error,
}

impl EventKind {
    /// Name used by the script-side dispatch function.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opened => "open",
            Self::Closed => "close",
            Self::Message => "message",
            Self::Log => "log",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An owned event, for adapters that move events to another thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeEvent {
    Opened { handle: ClientHandle },
    Closed { handle: ClientHandle },
    Message { handle: ClientHandle, text: String },
    Log { handle: ClientHandle, text: String },
    Error { handle: ClientHandle, text: String },
}

impl BridgeEvent {
    pub fn handle(&self) -> ClientHandle {
        match self {
            Self::Opened { handle }
            | Self::Closed { handle }
            | Self::Message { handle, .. }
            | Self::Log { handle, .. }
            | Self::Error { handle, .. } => *handle,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Opened { .. } => EventKind::Opened,
            Self::Closed { .. } => EventKind::Closed,
            Self::Message { .. } => EventKind::Message,
            Self::Log { .. } => EventKind::Log,
            Self::Error { .. } => EventKind::Error,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Message { text, .. } | Self::Log { text, .. } | Self::Error { text, .. } => {
                Some(text)
            }
            Self::Opened { .. } | Self::Closed { .. } => None,
        }
    }
}

/// Caller-side receiver of bridge events, one method per kind.
///
/// Methods run synchronously on the native I/O thread that raised the event,
/// after the registry lock has been released. Implementations should return
/// quickly; calling back into the registry is allowed.
pub trait EventSink: Send + Sync + 'static {
    fn opened(&self, _handle: ClientHandle) {}

    fn closed(&self, _handle: ClientHandle) {}

    fn message(&self, _handle: ClientHandle, _text: &str) {}

    fn log(&self, _handle: ClientHandle, _text: &str) {}

    fn error(&self, _handle: ClientHandle, _text: &str) {}
}

/// Sink that forwards owned events over a bounded channel.
///
/// Never blocks the native thread: when the receiver falls `capacity` events
/// behind, further events are dropped with a warning until it catches up.
pub struct ChannelSink {
    tx: SyncSender<BridgeEvent>,
}

/// Receiving end of a [`ChannelSink`].
pub struct EventReceiver {
    rx: Mutex<Receiver<BridgeEvent>>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (ChannelSink, EventReceiver) {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        (
            ChannelSink { tx },
            EventReceiver { rx: Mutex::new(rx) },
        )
    }

    fn forward(&self, event: BridgeEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                log::warn!(
                    "[WebSocket {}] Event channel full, dropping {} event",
                    event.handle(),
                    event.kind()
                );
            }
            Err(TrySendError::Disconnected(event)) => {
                log::debug!("Event receiver gone, dropping {:?}", event.kind());
            }
        }
    }
}

impl EventSink for ChannelSink {
    fn opened(&self, handle: ClientHandle) {
        self.forward(BridgeEvent::Opened { handle });
    }

    fn closed(&self, handle: ClientHandle) {
        self.forward(BridgeEvent::Closed { handle });
    }

    fn message(&self, handle: ClientHandle, text: &str) {
        self.forward(BridgeEvent::Message {
            handle,
            text: text.to_string(),
        });
    }

    fn log(&self, handle: ClientHandle, text: &str) {
        self.forward(BridgeEvent::Log {
            handle,
            text: text.to_string(),
        });
    }

    fn error(&self, handle: ClientHandle, text: &str) {
        self.forward(BridgeEvent::Error {
            handle,
            text: text.to_string(),
        });
    }
}

impl EventReceiver {
    /// Try to receive the next event without blocking.
    pub fn try_recv(&self) -> Option<BridgeEvent> {
        let rx = self.rx.lock().ok()?;
        match rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block until an event arrives or `timeout` elapses.
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<BridgeEvent> {
        self.rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    /// Drain everything queued so far.
    pub fn drain(&self) -> Vec<BridgeEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn full_channel_drops_instead_of_blocking() {
        let (sink, receiver) = ChannelSink::new(1);
        let handle = ClientHandle::from_raw(1);
        let (done_tx, done_rx) = mpsc::channel();

        thread::spawn(move || {
            sink.opened(handle);
            sink.message(handle, "one");
            sink.message(handle, "two");
            let _ = done_tx.send(());
        });

        assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
        assert_eq!(receiver.drain(), vec![BridgeEvent::Opened { handle }]);
    }

    #[test]
    fn delivery_resumes_once_drained() {
        let (sink, receiver) = ChannelSink::new(1);
        let handle = ClientHandle::from_raw(7);

        sink.log(handle, "first");
        sink.log(handle, "dropped");
        assert_eq!(receiver.drain().len(), 1);

        sink.closed(handle);
        assert_eq!(receiver.try_recv(), Some(BridgeEvent::Closed { handle }));
    }

    #[test]
    fn dropped_receiver_is_harmless() {
        let (sink, receiver) = ChannelSink::new(4);
        drop(receiver);
        sink.error(ClientHandle::from_raw(1), "Error: gone");
    }
}
