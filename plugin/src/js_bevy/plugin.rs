//! JavaScript Bevy Plugin Implementation

use bevy::prelude::*;
use std::ops::Deref;
use std::sync::Mutex;

use crate::js::{JsEngineBuilder, JsEngineClient, JsEngineExtension, JsEngineThread};

/// Configuration for the JavaScript plugin.
pub struct JsPluginConfig {
    /// Extensions to install into the JS context (wrapped for interior mutability).
    extensions: Mutex<Option<Vec<Box<dyn JsEngineExtension>>>>,
}

impl Default for JsPluginConfig {
    fn default() -> Self {
        Self {
            extensions: Mutex::new(Some(Vec::new())),
        }
    }
}

impl JsPluginConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension with the JS engine.
    pub fn with_extension(self, extension: impl JsEngineExtension) -> Self {
        if let Ok(mut guard) = self.extensions.lock() {
            if let Some(ref mut extensions) = *guard {
                extensions.push(Box::new(extension));
            }
        }
        self
    }

    /// Take the extensions out of the config.
    fn take_extensions(&self) -> Vec<Box<dyn JsEngineExtension>> {
        self.extensions
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
            .unwrap_or_default()
    }
}

/// Bevy Resource wrapper for JsEngineClient.
///
/// This allows the JsEngineClient to be used as a Bevy Resource while
/// keeping the js module free of Bevy dependencies.
#[derive(Resource, Clone)]
pub struct JsClientResource(JsEngineClient);

impl JsClientResource {
    /// Get the inner JsEngineClient.
    pub fn inner(&self) -> &JsEngineClient {
        &self.0
    }
}

impl Deref for JsClientResource {
    type Target = JsEngineClient;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Bevy Resource wrapper for the engine thread (keeps the thread alive).
#[derive(Resource)]
struct JsEngineResource(#[allow(dead_code)] JsEngineThread);

/// Bevy plugin for JavaScript engine integration.
///
/// This plugin:
/// - Starts the JS engine on a dedicated thread
/// - Exposes `JsClientResource` as a Bevy resource for script execution
/// - Flushes the JS event loop each frame
///
/// ## Usage
///
/// ```ignore
/// App::new()
///     .add_plugins(JsPlugin::new(JsPluginConfig::new()))
///     .run();
/// ```
pub struct JsPlugin {
    config: JsPluginConfig,
}

impl JsPlugin {
    pub fn new(config: JsPluginConfig) -> Self {
        Self { config }
    }
}

impl Plugin for JsPlugin {
    fn build(&self, app: &mut App) {
        let builder = self
            .config
            .take_extensions()
            .into_iter()
            .fold(JsEngineBuilder::new(), JsEngineBuilder::with_boxed_extension);

        log::info!("Starting JS engine...");
        let engine = match builder.build().spawn() {
            Ok(engine) => engine,
            Err(e) => {
                log::error!("Failed to start JS engine: {}", e);
                return;
            }
        };

        // Store the client as a resource for systems to use
        app.insert_resource(JsClientResource(engine.client()));
        // Store the engine (keeps the thread alive)
        app.insert_resource(JsEngineResource(engine));

        app.add_systems(Update, tick_js_engine);

        log::info!("JS engine configured");
    }
}

/// Flush the JS event loop each frame.
fn tick_js_engine(client: Option<Res<JsClientResource>>) {
    if let Some(client) = client {
        client.flush_event_loop();
    }
}
