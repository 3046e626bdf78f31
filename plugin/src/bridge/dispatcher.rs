//! Event Dispatcher
//!
//! Every native-client callback funnels through here. The dispatcher resolves
//! the handle against the connection table, applies the state transition, and
//! then invokes the registered sink with the table lock released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::bridge::connection::ConnectionTable;
use crate::bridge::{ClientHandle, EventKind, EventSink};

/// Sink for events that only carry a handle (opened, closed).
pub type HandleSink = Arc<dyn Fn(ClientHandle) + Send + Sync>;

/// Sink for events that carry text (message, log, error).
pub type TextSink = Arc<dyn Fn(ClientHandle, &str) + Send + Sync>;

#[derive(Clone, Default)]
struct EventSinks {
    opened: Option<HandleSink>,
    closed: Option<HandleSink>,
    message: Option<TextSink>,
    log: Option<TextSink>,
    error: Option<TextSink>,
}

pub struct EventDispatcher {
    connections: Arc<ConnectionTable>,
    sinks: RwLock<EventSinks>,
    forward_unhandled_errors: bool,
}

impl EventDispatcher {
    pub(crate) fn new(connections: Arc<ConnectionTable>, forward_unhandled_errors: bool) -> Self {
        Self {
            connections,
            sinks: RwLock::new(EventSinks::default()),
            forward_unhandled_errors,
        }
    }

    fn sinks(&self) -> RwLockReadGuard<'_, EventSinks> {
        self.sinks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn sinks_mut(&self) -> RwLockWriteGuard<'_, EventSinks> {
        self.sinks.write().unwrap_or_else(PoisonError::into_inner)
    }

    // Registration. Each kind has one slot; registering replaces the old sink.

    pub fn set_opened_sink(&self, sink: impl Fn(ClientHandle) + Send + Sync + 'static) {
        self.sinks_mut().opened = Some(Arc::new(sink));
    }

    pub fn set_closed_sink(&self, sink: impl Fn(ClientHandle) + Send + Sync + 'static) {
        self.sinks_mut().closed = Some(Arc::new(sink));
    }

    pub fn set_message_sink(&self, sink: impl Fn(ClientHandle, &str) + Send + Sync + 'static) {
        self.sinks_mut().message = Some(Arc::new(sink));
    }

    pub fn set_log_sink(&self, sink: impl Fn(ClientHandle, &str) + Send + Sync + 'static) {
        self.sinks_mut().log = Some(Arc::new(sink));
    }

    pub fn set_error_sink(&self, sink: impl Fn(ClientHandle, &str) + Send + Sync + 'static) {
        self.sinks_mut().error = Some(Arc::new(sink));
    }

    /// Point all five slots at one typed sink.
    pub fn register(&self, sink: Arc<dyn EventSink>) {
        let opened = sink.clone();
        let closed = sink.clone();
        let message = sink.clone();
        let log = sink.clone();
        let error = sink;

        *self.sinks_mut() = EventSinks {
            opened: Some(Arc::new(move |h| opened.opened(h))),
            closed: Some(Arc::new(move |h| closed.closed(h))),
            message: Some(Arc::new(move |h, t: &str| message.message(h, t))),
            log: Some(Arc::new(move |h, t: &str| log.log(h, t))),
            error: Some(Arc::new(move |h, t: &str| error.error(h, t))),
        };
    }

    pub fn clear_sink(&self, kind: EventKind) {
        let mut sinks = self.sinks_mut();
        match kind {
            EventKind::Opened => sinks.opened = None,
            EventKind::Closed => sinks.closed = None,
            EventKind::Message => sinks.message = None,
            EventKind::Log => sinks.log = None,
            EventKind::Error => sinks.error = None,
        }
    }

    pub fn clear_sinks(&self) {
        *self.sinks_mut() = EventSinks::default();
    }

    pub fn has_sink(&self, kind: EventKind) -> bool {
        let sinks = self.sinks();
        match kind {
            EventKind::Opened => sinks.opened.is_some(),
            EventKind::Closed => sinks.closed.is_some(),
            EventKind::Message => sinks.message.is_some(),
            EventKind::Log => sinks.log.is_some(),
            EventKind::Error => sinks.error.is_some(),
        }
    }

    // Dispatch.

    pub fn on_opened(&self, handle: ClientHandle) {
        let Some(attached) = self.admit(handle, EventKind::Opened) else {
            return;
        };
        log::info!("[WebSocket {}] Opened", handle);
        let sink = self.sinks().opened.clone();
        if let Some(sink) = sink.filter(|_| still_attached(handle, &attached)) {
            sink(handle);
        }
    }

    pub fn on_closed(&self, handle: ClientHandle) {
        let Some(attached) = self.admit(handle, EventKind::Closed) else {
            return;
        };
        log::info!("[WebSocket {}] Closed", handle);
        let sink = self.sinks().closed.clone();
        if let Some(sink) = sink.filter(|_| still_attached(handle, &attached)) {
            sink(handle);
        }
    }

    pub fn on_message(&self, handle: ClientHandle, text: &str) {
        let Some(attached) = self.admit(handle, EventKind::Message) else {
            return;
        };
        log::debug!("[WebSocket {}] Message: {}", handle, preview(text));
        let sink = self.sinks().message.clone();
        if let Some(sink) = sink.filter(|_| still_attached(handle, &attached)) {
            sink(handle, text);
        }
    }

    pub fn on_log(&self, handle: ClientHandle, text: &str) {
        let Some(attached) = self.admit(handle, EventKind::Log) else {
            return;
        };
        log::debug!("[WebSocket {}] {}", handle, text);
        let sink = self.sinks().log.clone();
        if let Some(sink) = sink.filter(|_| still_attached(handle, &attached)) {
            sink(handle, text);
        }
    }

    pub fn on_error(&self, handle: ClientHandle, text: &str) {
        let Some(attached) = self.admit(handle, EventKind::Error) else {
            return;
        };
        log::error!("[WebSocket {}] {}", handle, text);

        let (error_sink, log_sink) = {
            let sinks = self.sinks();
            (sinks.error.clone(), sinks.log.clone())
        };

        if !still_attached(handle, &attached) {
            return;
        }

        match (error_sink, log_sink) {
            (Some(sink), _) => sink(handle, text),
            (None, Some(log_sink)) if self.forward_unhandled_errors => {
                log_sink(handle, &format!("unhandled error: {}", text));
            }
            (None, _) => {
                log::warn!("[WebSocket {}] No error sink registered, dropping error", handle);
            }
        }
    }

    /// Resolve the handle and apply the transition while holding the table lock.
    ///
    /// Returns the connection's attached flag, checked again right before the
    /// sink runs. A destroy that lands after that check cannot stop the one
    /// sink call already under way.
    fn admit(&self, handle: ClientHandle, kind: EventKind) -> Option<Arc<AtomicBool>> {
        let mut connections = self.connections.lock();
        let Some(connection) = connections.get_mut(&handle) else {
            log::warn!("[WebSocket {}] Unknown handle, dropping {} event", handle, kind);
            return None;
        };
        if !connection.apply(kind) {
            log::debug!(
                "[WebSocket {}] Dropping {} event in state {:?}",
                handle,
                kind,
                connection.state
            );
            return None;
        }
        Some(connection.attached())
    }
}

fn still_attached(handle: ClientHandle, attached: &AtomicBool) -> bool {
    let attached = attached.load(Ordering::SeqCst);
    if !attached {
        log::debug!("[WebSocket {}] Destroyed during dispatch, dropping event", handle);
    }
    attached
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(100) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{BridgeConfig, ConnectionRegistry};
    use crate::native::testing::MockFactory;

    #[test]
    fn destroy_after_admission_skips_the_sink() {
        let registry = ConnectionRegistry::new(BridgeConfig::default(), MockFactory::new());
        let handle = registry.create("ws://host/echo").unwrap();
        let dispatcher = registry.dispatcher();

        let attached = dispatcher.admit(handle, EventKind::Opened).unwrap();
        assert!(still_attached(handle, &attached));

        // Destroy lands between admission and the sink call.
        registry.destroy(handle);
        assert!(!still_attached(handle, &attached));
        assert!(dispatcher.admit(handle, EventKind::Message).is_none());
    }

    #[test]
    fn preview_truncates_long_text() {
        let long = "x".repeat(150);
        assert_eq!(preview(&long).len(), 100);
        assert_eq!(preview("short"), "short");
    }
}
