//! Scripted native client for unit tests.

use std::sync::{Arc, Mutex};

use url::Url;

use crate::bridge::{BridgeConfig, ClientHandle};
use crate::native::{NativeClient, NativeClientFactory, NativeDelegate};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Connect,
    Send(String),
    Close,
    Terminate,
}

/// Client that ignores every command.
pub(crate) struct NullClient;

impl NativeClient for NullClient {
    fn connect(&self) {}
    fn send(&self, _text: String) {}
    fn close(&self) {}
    fn terminate(&self) {}
}

/// Client that records commands; tests raise events through its delegate.
pub(crate) struct MockClient {
    pub(crate) uri: Url,
    pub(crate) delegate: NativeDelegate,
    commands: Mutex<Vec<Command>>,
}

impl MockClient {
    pub(crate) fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    fn record(&self, command: Command) {
        self.commands.lock().unwrap().push(command);
    }
}

impl NativeClient for MockClient {
    fn connect(&self) {
        self.record(Command::Connect);
    }

    fn send(&self, text: String) {
        self.record(Command::Send(text));
    }

    fn close(&self) {
        self.record(Command::Close);
    }

    fn terminate(&self) {
        self.record(Command::Terminate);
    }
}

#[derive(Default)]
pub(crate) struct MockFactory {
    clients: Mutex<Vec<Arc<MockClient>>>,
}

impl MockFactory {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn client(&self, handle: ClientHandle) -> Arc<MockClient> {
        self.clients
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.delegate.handle() == handle)
            .cloned()
            .expect("no mock client for handle")
    }

    pub(crate) fn created(&self) -> usize {
        self.clients.lock().unwrap().len()
    }
}

impl NativeClientFactory for MockFactory {
    fn create(
        &self,
        uri: &Url,
        _config: &BridgeConfig,
        delegate: NativeDelegate,
    ) -> Arc<dyn NativeClient> {
        let client = Arc::new(MockClient {
            uri: uri.clone(),
            delegate,
            commands: Mutex::new(Vec::new()),
        });
        self.clients.lock().unwrap().push(client.clone());
        client
    }
}
