use std::sync::mpsc::{self, Receiver};

use boa_engine::{Context, JsError};
use boa_runtime::extensions::{ConsoleExtension, MicrotaskExtension, TimeoutExtension};

use crate::js::{JsCommand, JsEngine, JsEngineClient};

pub struct JsEngineBuilder {
    extensions: Vec<Box<dyn JsEngineExtension>>,
    client: JsEngineClient,
    receiver: Receiver<JsCommand>,
}

impl Default for JsEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl JsEngineBuilder {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        JsEngineBuilder {
            extensions: vec![],
            client: JsEngineClient { sender },
            receiver,
        }
    }

    pub fn with_extension(mut self, extension: impl JsEngineExtension) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    pub fn with_boxed_extension(mut self, extension: Box<dyn JsEngineExtension>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn build(self) -> JsEngine {
        let client = self.client.clone();
        let extensions = self.extensions;

        JsEngine {
            client: self.client,
            context_builder: Box::new(move || build_context(&extensions, client)),
            receiver: self.receiver,
        }
    }
}

/// A subsystem that installs native functions into the JS context.
///
/// `register` runs on the engine thread once the context exists. The client
/// lets the extension push work back onto that thread later.
pub trait JsEngineExtension: Send + Sync + 'static {
    fn register(&self, context: &mut Context, client: JsEngineClient) -> Result<(), JsError>;
}

fn build_context(
    extensions: &[Box<dyn JsEngineExtension>],
    client: JsEngineClient,
) -> Result<Context, JsError> {
    let mut context = Context::default();

    // Register Boa runtime extensions
    boa_runtime::register(
        (
            ConsoleExtension::default(),
            TimeoutExtension {},
            MicrotaskExtension {},
        ),
        None,
        &mut context,
    )?;

    for extension in extensions {
        extension.register(&mut context, client.clone())?;
    }

    Ok(context)
}
