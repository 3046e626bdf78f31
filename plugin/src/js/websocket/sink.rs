use crate::bridge::{ClientHandle, EventKind, EventSink};
use crate::js::JsEngineClient;

/// Event sink that re-enters the script thread.
///
/// Each event becomes a `__ws_dispatch_event(handle, kind, text)` call queued
/// on the engine's command channel. Text is encoded as a JSON string literal.
pub struct ScriptSink {
    client: JsEngineClient,
}

impl ScriptSink {
    pub fn new(client: JsEngineClient) -> Self {
        Self { client }
    }

    fn dispatch(&self, handle: ClientHandle, kind: EventKind, text: Option<&str>) {
        log::debug!("[WebSocket {}] Dispatching {} event to JS", handle, kind);
        self.client.execute(dispatch_script(handle, kind, text));
    }
}

impl EventSink for ScriptSink {
    fn opened(&self, handle: ClientHandle) {
        self.dispatch(handle, EventKind::Opened, None);
    }

    fn closed(&self, handle: ClientHandle) {
        self.dispatch(handle, EventKind::Closed, None);
    }

    fn message(&self, handle: ClientHandle, text: &str) {
        self.dispatch(handle, EventKind::Message, Some(text));
    }

    fn log(&self, handle: ClientHandle, text: &str) {
        self.dispatch(handle, EventKind::Log, Some(text));
    }

    fn error(&self, handle: ClientHandle, text: &str) {
        self.dispatch(handle, EventKind::Error, Some(text));
    }
}

pub(crate) fn dispatch_script(handle: ClientHandle, kind: EventKind, text: Option<&str>) -> String {
    let payload = match text {
        Some(text) => serde_json::Value::String(text.to_string()).to_string(),
        None => "null".to_string(),
    };
    format!("__ws_dispatch_event({}, '{}', {});", handle, kind.as_str(), payload)
}
