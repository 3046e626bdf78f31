use std::ops::Deref;
use std::sync::Arc;

use bevy::prelude::*;

use crate::bridge::{BridgeConfig, BridgeEvent, ChannelSink, ConnectionRegistry, EventReceiver};
use crate::js::WebSocketExtension;
use crate::js_bevy::{JsPlugin, JsPluginConfig};
use crate::native::{NativeClientFactory, TungsteniteFactory};

/// A websocket event, delivered on the main schedule.
#[derive(Message, Clone, Debug, PartialEq, Eq)]
pub struct WsEvent(pub BridgeEvent);

impl Deref for WsEvent {
    type Target = BridgeEvent;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The connection registry used by ECS systems.
#[derive(Resource, Clone)]
pub struct WebSocketBridge(Arc<ConnectionRegistry>);

impl WebSocketBridge {
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.0
    }
}

impl Deref for WebSocketBridge {
    type Target = ConnectionRegistry;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Events queued by native I/O threads, waiting for the next frame.
#[derive(Resource)]
pub struct BridgeEventReceiver(pub EventReceiver);

/// Bevy plugin for native websocket clients.
///
/// ## Usage
///
/// ```ignore
/// fn connect(bridge: Res<WebSocketBridge>) {
///     let handle = bridge.create("ws://localhost:9001/echo").unwrap();
/// }
///
/// fn on_events(mut events: MessageReader<WsEvent>) {
///     for event in events.read() {
///         info!("{:?}", event.0);
///     }
/// }
///
/// App::new()
///     .add_plugins(WebSocketBridgePlugin::default())
///     .add_systems(Startup, connect)
///     .add_systems(Update, on_events)
///     .run();
/// ```
pub struct WebSocketBridgePlugin {
    config: BridgeConfig,
    factory: Arc<dyn NativeClientFactory>,
    scripting: bool,
}

impl Default for WebSocketBridgePlugin {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl WebSocketBridgePlugin {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            factory: Arc::new(TungsteniteFactory::new()),
            scripting: false,
        }
    }

    /// Use a different native client implementation.
    pub fn with_factory(mut self, factory: Arc<dyn NativeClientFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Also start the JS engine with `BridgeSocket` available to scripts.
    ///
    /// Scripts get their own registry; their handles and events never mix
    /// with the ECS ones.
    pub fn with_scripting(mut self) -> Self {
        self.scripting = true;
        self
    }
}

impl Plugin for WebSocketBridgePlugin {
    fn build(&self, app: &mut App) {
        log::info!("Building WebSocket bridge plugin...");

        let registry = Arc::new(ConnectionRegistry::new(
            self.config.clone(),
            self.factory.clone(),
        ));
        let (sink, receiver) = ChannelSink::new(self.config.event_capacity);
        registry.register_sink(Arc::new(sink));

        app.insert_resource(WebSocketBridge(registry))
            .insert_resource(BridgeEventReceiver(receiver))
            .add_message::<WsEvent>()
            .add_systems(PreUpdate, forward_bridge_events);

        if self.scripting {
            let extension =
                WebSocketExtension::with_factory(self.config.clone(), self.factory.clone());
            app.add_plugins(JsPlugin::new(
                JsPluginConfig::new().with_extension(extension),
            ));
        }

        log::info!("WebSocket bridge plugin configured");
    }
}

/// Move events raised on native threads into Bevy messages.
fn forward_bridge_events(
    receiver: Option<Res<BridgeEventReceiver>>,
    mut writer: MessageWriter<WsEvent>,
) {
    let Some(receiver) = receiver else {
        return;
    };

    while let Some(event) = receiver.0.try_recv() {
        writer.write(WsEvent(event));
    }
}
