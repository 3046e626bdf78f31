use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_ws_bridge::{BridgeEvent, ClientHandle, WebSocketBridge, WebSocketBridgePlugin, WsEvent};

const DEFAULT_URL: &str = "ws://127.0.0.1:9001/echo";

#[derive(Resource)]
struct EchoTarget(String);

#[derive(Resource)]
struct EchoClient(ClientHandle);

fn main() {
    let url = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_URL.to_string());

    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(16))),
        )
        .add_plugins(LogPlugin::default())
        .add_plugins(WebSocketBridgePlugin::default())
        .insert_resource(EchoTarget(url))
        .add_systems(Startup, connect)
        .add_systems(Update, handle_events)
        .run();
}

fn connect(
    mut commands: Commands,
    bridge: Res<WebSocketBridge>,
    target: Res<EchoTarget>,
    mut exit: MessageWriter<AppExit>,
) {
    match bridge.create(&target.0) {
        Ok(handle) => {
            info!("Connecting to {} as {}", target.0, handle);
            commands.insert_resource(EchoClient(handle));
        }
        Err(e) => {
            error!("{}", e);
            exit.write(AppExit::error());
        }
    }
}

fn handle_events(
    bridge: Res<WebSocketBridge>,
    client: Option<Res<EchoClient>>,
    mut events: MessageReader<WsEvent>,
    mut exit: MessageWriter<AppExit>,
) {
    let Some(client) = client else {
        return;
    };

    for event in events.read() {
        if event.handle() != client.0 {
            continue;
        }

        match &event.0 {
            BridgeEvent::Opened { handle } => {
                if let Err(e) = bridge.send(*handle, "hello from bevy") {
                    error!("{}", e);
                }
            }
            BridgeEvent::Message { handle, text } => {
                info!("Echo: {}", text);
                bridge.close(*handle);
            }
            BridgeEvent::Log { text, .. } => debug!("{}", text),
            BridgeEvent::Error { handle, text } => {
                error!("{}", text);
                bridge.destroy(*handle);
                exit.write(AppExit::error());
            }
            BridgeEvent::Closed { handle } => {
                info!("Connection {} closed", handle);
                bridge.destroy(*handle);
                exit.write(AppExit::Success);
            }
        }
    }
}
