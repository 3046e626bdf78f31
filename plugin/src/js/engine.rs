//! JavaScript Engine
//!
//! Runs the Boa context on a dedicated worker thread. Everything that touches
//! the context arrives as a [`JsCommand`], so callers on other threads never
//! need to be on the script thread themselves.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use boa_engine::{Context, JsError, Source};

use crate::js::JsEngineClient;

/// Commands that can be sent to the JS engine thread.
#[derive(Debug)]
pub enum JsCommand {
    /// Execute a JS script (non-module).
    Execute { source: String },
    /// Run pending jobs and timers.
    FlushEventLoop,
    /// Shutdown the JS engine.
    Shutdown,
}

type ContextBuilder = Box<dyn FnOnce() -> Result<Context, JsError> + Send>;

/// A configured engine that has not started yet.
pub struct JsEngine {
    pub(crate) client: JsEngineClient,
    pub(crate) context_builder: ContextBuilder,
    pub(crate) receiver: Receiver<JsCommand>,
}

impl JsEngine {
    /// Get a client handle for communicating with the engine.
    pub fn client(&self) -> JsEngineClient {
        self.client.clone()
    }

    /// Start the engine on its own thread.
    pub fn spawn(self) -> std::io::Result<JsEngineThread> {
        let JsEngine {
            client,
            context_builder,
            receiver,
        } = self;

        let handle = thread::Builder::new()
            .name("js-engine".to_string())
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    run_js_loop(context_builder, receiver);
                }));

                if let Err(e) = result {
                    log::error!("JS engine panicked: {:?}", e);
                }
            })?;

        Ok(JsEngineThread {
            client,
            handle: Some(handle),
        })
    }
}

/// A running engine. Dropping it asks the engine thread to stop.
pub struct JsEngineThread {
    client: JsEngineClient,
    handle: Option<JoinHandle<()>>,
}

impl JsEngineThread {
    pub fn client(&self) -> JsEngineClient {
        self.client.clone()
    }

    /// Stop the engine and wait for its thread to finish.
    pub fn shutdown(mut self) {
        self.client.shutdown();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("JS engine thread panicked during shutdown");
            }
        }
    }
}

impl Drop for JsEngineThread {
    fn drop(&mut self) {
        self.client.shutdown();
    }
}

/// Main loop for the JS engine thread.
fn run_js_loop(context_builder: ContextBuilder, receiver: Receiver<JsCommand>) {
    log::info!("JS engine thread started");

    let mut context = match context_builder() {
        Ok(context) => context,
        Err(e) => {
            log::error!("Failed to initialize JS runtime: {}", e);
            return;
        }
    };

    log::info!("JS runtime initialized");

    loop {
        match receiver.recv() {
            Ok(JsCommand::Execute { source }) => {
                log::debug!("Executing script ({} bytes)...", source.len());

                if let Err(e) = context.eval(Source::from_bytes(source.as_bytes())) {
                    log::error!("Failed to execute script: {}", e);
                }

                flush_event_loop(&mut context);
            }
            Ok(JsCommand::FlushEventLoop) => {
                flush_event_loop(&mut context);
            }
            Ok(JsCommand::Shutdown) => {
                log::info!("JS engine shutting down");
                break;
            }
            Err(e) => {
                log::debug!("JS engine channel closed: {}", e);
                break;
            }
        }
    }

    log::info!("JS engine thread stopped");
}

/// Run microtasks (jobs) and due timers.
fn flush_event_loop(context: &mut Context) {
    if let Err(e) = context.run_jobs() {
        log::error!("Error running Boa jobs: {}", e);
    }
}
