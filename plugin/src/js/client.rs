use std::sync::mpsc;

use crate::js::JsCommand;

/// Client handle for communicating with the JS engine thread.
///
/// Cheap to clone and safe to use from any thread, including native
/// websocket I/O threads.
#[derive(Clone)]
pub struct JsEngineClient {
    pub(crate) sender: mpsc::Sender<JsCommand>,
}

impl JsEngineClient {
    /// Send a tick command to flush the JS event loop.
    pub fn flush_event_loop(&self) {
        if let Err(e) = self.sender.send(JsCommand::FlushEventLoop) {
            log::warn!("Failed to send flush event loop command: {}", e);
        }
    }

    /// Execute a script on the engine thread.
    pub fn execute(&self, source: impl Into<String>) {
        if let Err(e) = self.sender.send(JsCommand::Execute {
            source: source.into(),
        }) {
            log::error!("Failed to send execute command: {}", e);
        }
    }

    /// Shutdown the JS engine.
    pub fn shutdown(&self) {
        let _ = self.sender.send(JsCommand::Shutdown);
    }
}
