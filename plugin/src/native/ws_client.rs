//! Native client backed by tokio-tungstenite.
//!
//! Each connection gets its own OS thread running a small tokio runtime, so a
//! connection's events are always raised from that connection's I/O thread.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use url::Url;

use crate::bridge::{BridgeConfig, BridgeError, BridgeResult};
use crate::native::{NativeClient, NativeClientFactory, NativeDelegate};

#[derive(Debug)]
enum ClientCommand {
    Send(String),
    Close,
    Terminate,
}

/// Creates a [`TungsteniteClient`] per connection.
#[derive(Clone, Copy, Debug, Default)]
pub struct TungsteniteFactory;

impl TungsteniteFactory {
    pub fn new() -> Self {
        Self
    }
}

impl NativeClientFactory for TungsteniteFactory {
    fn create(
        &self,
        uri: &Url,
        config: &BridgeConfig,
        delegate: NativeDelegate,
    ) -> Arc<dyn NativeClient> {
        Arc::new(TungsteniteClient::new(uri.clone(), config.clone(), delegate))
    }
}

pub struct TungsteniteClient {
    uri: Url,
    config: BridgeConfig,
    delegate: NativeDelegate,
    commands: mpsc::UnboundedSender<ClientCommand>,
    pending: Mutex<Option<mpsc::UnboundedReceiver<ClientCommand>>>,
}

impl TungsteniteClient {
    pub fn new(uri: Url, config: BridgeConfig, delegate: NativeDelegate) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        Self {
            uri,
            config,
            delegate,
            commands,
            pending: Mutex::new(Some(receiver)),
        }
    }

    fn command(&self, command: ClientCommand) {
        if let Err(e) = self.commands.send(command) {
            log::debug!(
                "[WebSocket {}] I/O loop stopped, dropping {:?}",
                self.delegate.handle(),
                e.0
            );
        }
    }
}

impl NativeClient for TungsteniteClient {
    fn connect(&self) {
        let receiver = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(receiver) = receiver else {
            log::warn!("[WebSocket {}] connect called twice", self.delegate.handle());
            return;
        };

        let uri = self.uri.clone();
        let config = self.config.clone();
        let delegate = self.delegate.clone();

        let spawned = thread::Builder::new()
            .name(format!("ws-client-{}", self.delegate.handle()))
            .spawn(move || run_client(uri, config, delegate, receiver));

        if let Err(e) = spawned {
            log::error!("[WebSocket {}] Failed to spawn I/O thread: {}", self.delegate.handle(), e);
            self.delegate
                .error(&format!("Error: {}", BridgeError::Transport(e.to_string())));
        }
    }

    fn send(&self, text: String) {
        self.command(ClientCommand::Send(text));
    }

    fn close(&self) {
        self.command(ClientCommand::Close);
    }

    fn terminate(&self) {
        self.command(ClientCommand::Terminate);
    }
}

fn run_client(
    uri: Url,
    config: BridgeConfig,
    delegate: NativeDelegate,
    commands: mpsc::UnboundedReceiver<ClientCommand>,
) {
    let handle = delegate.handle();
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(config.worker_threads.max(1))
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("[WebSocket {}] Failed to create runtime: {}", handle, e);
            delegate.error(&format!("Error: {}", BridgeError::Transport(e.to_string())));
            return;
        }
    };

    rt.block_on(drive(uri, config, delegate, commands));
    // Don't wait on a DNS lookup still parked on a blocking thread.
    rt.shutdown_background();
    log::info!("[WebSocket {}] Connection ended", handle);
}

async fn drive(
    uri: Url,
    config: BridgeConfig,
    delegate: NativeDelegate,
    mut commands: mpsc::UnboundedReceiver<ClientCommand>,
) {
    let handle = delegate.handle();
    log::info!("[WebSocket {}] Connecting to {}", handle, uri);
    delegate.log(&format!("Connecting to {}", uri));

    let request = match build_request(&uri, &config) {
        Ok(request) => request,
        Err(e) => {
            log::error!("[WebSocket {}] Failed to create request: {}", handle, e);
            delegate.error(&format!("Error: {}", e));
            return;
        }
    };

    // The handshake has no timeout of its own, so commands are watched while
    // it runs. Dropping the connect future releases the socket.
    let connect = tokio_tungstenite::connect_async(request);
    tokio::pin!(connect);

    let stream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok((stream, response)) => {
                    log::info!(
                        "[WebSocket {}] Connected successfully (status: {})",
                        handle,
                        response.status()
                    );
                    break stream;
                }
                Err(e) => {
                    log::error!("[WebSocket {}] Handshake failed: {}", handle, e);
                    delegate.error(&format!("Error: {}", classify(e)));
                    return;
                }
            },
            command = commands.recv() => match command {
                Some(ClientCommand::Close) => {
                    log::info!("[WebSocket {}] Closed before the handshake completed", handle);
                    delegate.log("Connect abandoned");
                    delegate.closed();
                    return;
                }
                Some(ClientCommand::Terminate) | None => {
                    log::info!("[WebSocket {}] Terminated while connecting", handle);
                    return;
                }
                Some(ClientCommand::Send(_)) => {
                    log::debug!("[WebSocket {}] Not open yet, dropping send", handle);
                }
            }
        }
    };

    // Destroyed between the handshake and here.
    if !delegate.is_attached() {
        return;
    }

    delegate.opened();
    delegate.log("Connected");

    let (mut write, mut read) = stream.split();
    let mut closing = false;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(ClientCommand::Send(text)) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        log::error!("[WebSocket {}] Send error: {}", handle, e);
                        delegate.error(&format!("Error: {}", classify(e)));
                        break;
                    }
                }
                Some(ClientCommand::Close) => {
                    if closing {
                        continue;
                    }
                    closing = true;
                    log::info!("[WebSocket {}] Closing", handle);
                    delegate.log("Closing");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        log::debug!("[WebSocket {}] Close frame not sent: {}", handle, e);
                        delegate.closed();
                        break;
                    }
                }
                Some(ClientCommand::Terminate) | None => {
                    log::info!("[WebSocket {}] Terminated", handle);
                    break;
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    delegate.message(text.as_str());
                }
                Some(Ok(Message::Binary(data))) => {
                    delegate.log(&format!("Ignoring binary message ({} bytes)", data.len()));
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.to_string()))
                        .unwrap_or((1005, String::new()));
                    log::info!("[WebSocket {}] Received close: {} {}", handle, code, reason);
                    // Flush the close reply; the peer may already be gone.
                    let _ = write.close().await;
                    delegate.closed();
                    break;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    delegate.closed();
                    break;
                }
                Some(Err(e)) => {
                    log::error!("[WebSocket {}] Read error: {}", handle, e);
                    delegate.error(&format!("Error: {}", classify(e)));
                    break;
                }
            }
        }
    }
}

fn build_request(uri: &Url, config: &BridgeConfig) -> BridgeResult<Request> {
    let mut request = uri.as_str().into_client_request().map_err(classify)?;

    if let Some(origin) = &config.origin {
        let value = HeaderValue::from_str(origin)
            .map_err(|e| BridgeError::Protocol(format!("invalid Origin header: {}", e)))?;
        request.headers_mut().insert("Origin", value);
    }

    if !config.subprotocols.is_empty() {
        let value = HeaderValue::from_str(&config.subprotocols.join(", ")).map_err(|e| {
            BridgeError::Protocol(format!("invalid Sec-WebSocket-Protocol header: {}", e))
        })?;
        request.headers_mut().insert("Sec-WebSocket-Protocol", value);
    }

    Ok(request)
}

fn classify(error: WsError) -> BridgeError {
    match error {
        WsError::Protocol(_) | WsError::Capacity(_) | WsError::Http(_) => {
            BridgeError::Protocol(error.to_string())
        }
        other => BridgeError::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_configured_headers() {
        let uri = Url::parse("ws://localhost:9001/echo").unwrap();
        let config = BridgeConfig::default()
            .with_origin("http://localhost:5173")
            .with_subprotocol("vite-hmr")
            .with_subprotocol("ortc");

        let request = build_request(&uri, &config).unwrap();
        assert_eq!(request.headers()["Origin"], "http://localhost:5173");
        assert_eq!(request.headers()["Sec-WebSocket-Protocol"], "vite-hmr, ortc");
    }

    #[test]
    fn bad_origin_is_rejected_before_connecting() {
        let uri = Url::parse("ws://localhost:9001/echo").unwrap();
        let config = BridgeConfig::default().with_origin("bad\norigin");
        assert!(matches!(
            build_request(&uri, &config),
            Err(BridgeError::Protocol(_))
        ));
    }
}
