use std::sync::Arc;

use boa_engine::{Context, JsError, JsNativeError, JsResult, JsString, JsValue, NativeFunction};
use boa_gc::{Finalize, Trace, empty_trace};

use crate::bridge::{BridgeConfig, BridgeError, ClientHandle, ConnectionRegistry};
use crate::js::websocket::shim::register_websocket_shim;
use crate::js::websocket::sink::ScriptSink;
use crate::js::{JsEngineClient, JsEngineExtension};
use crate::native::{NativeClientFactory, TungsteniteFactory};

/// Installs `BridgeSocket` and its native functions into a JS context.
///
/// Every context gets its own registry, independent of any other bridge
/// instance in the process.
pub struct WebSocketExtension {
    config: BridgeConfig,
    factory: Arc<dyn NativeClientFactory>,
}

impl WebSocketExtension {
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_factory(config, Arc::new(TungsteniteFactory::new()))
    }

    pub fn with_factory(config: BridgeConfig, factory: Arc<dyn NativeClientFactory>) -> Self {
        Self { config, factory }
    }
}

impl JsEngineExtension for WebSocketExtension {
    fn register(&self, context: &mut Context, client: JsEngineClient) -> Result<(), JsError> {
        let registry = Arc::new(ConnectionRegistry::new(
            self.config.clone(),
            self.factory.clone(),
        ));
        registry.register_sink(Arc::new(ScriptSink::new(client)));

        register_websocket_functions(context, ScriptRegistry(registry))?;
        register_websocket_shim(context)?;
        Ok(())
    }
}

/// Registry captured by the native functions.
#[derive(Clone, Finalize)]
struct ScriptRegistry(Arc<ConnectionRegistry>);

unsafe impl Trace for ScriptRegistry {
    empty_trace!();
}

/// Register WebSocket native functions in the JS global scope.
fn register_websocket_functions(context: &mut Context, registry: ScriptRegistry) -> JsResult<()> {
    // __ws_create(url: string) -> number
    context.register_global_callable(
        JsString::from("__ws_create"),
        1,
        NativeFunction::from_copy_closure_with_captures(
            |_this: &JsValue, args: &[JsValue], registry: &ScriptRegistry, _ctx: &mut Context| {
                let url = string_arg(args, 0);
                log::info!("[WebSocket Native] create({})", url);
                match registry.0.create(&url) {
                    Ok(handle) => Ok(JsValue::from(handle.raw())),
                    Err(e) => Err(JsNativeError::typ().with_message(e.to_string()).into()),
                }
            },
            registry.clone(),
        ),
    )?;

    // __ws_send(id: number, data: string) -> void
    context.register_global_callable(
        JsString::from("__ws_send"),
        2,
        NativeFunction::from_copy_closure_with_captures(
            |_this: &JsValue, args: &[JsValue], registry: &ScriptRegistry, ctx: &mut Context| {
                let handle = handle_arg(args, ctx)?;
                let data = string_arg(args, 1);
                match registry.0.send(handle, data) {
                    Ok(()) => Ok(JsValue::undefined()),
                    Err(e @ BridgeError::NotConnected(_)) => {
                        Err(JsNativeError::error().with_message(e.to_string()).into())
                    }
                    Err(e) => Err(JsNativeError::typ().with_message(e.to_string()).into()),
                }
            },
            registry.clone(),
        ),
    )?;

    // __ws_close(id: number) -> void
    context.register_global_callable(
        JsString::from("__ws_close"),
        1,
        NativeFunction::from_copy_closure_with_captures(
            |_this: &JsValue, args: &[JsValue], registry: &ScriptRegistry, ctx: &mut Context| {
                let handle = handle_arg(args, ctx)?;
                registry.0.close(handle);
                Ok(JsValue::undefined())
            },
            registry.clone(),
        ),
    )?;

    // __ws_destroy(id: number) -> void
    context.register_global_callable(
        JsString::from("__ws_destroy"),
        1,
        NativeFunction::from_copy_closure_with_captures(
            |_this: &JsValue, args: &[JsValue], registry: &ScriptRegistry, ctx: &mut Context| {
                let handle = handle_arg(args, ctx)?;
                registry.0.destroy(handle);
                Ok(JsValue::undefined())
            },
            registry.clone(),
        ),
    )?;

    // __ws_ready_state(id: number) -> number
    context.register_global_callable(
        JsString::from("__ws_ready_state"),
        1,
        NativeFunction::from_copy_closure_with_captures(
            |_this: &JsValue, args: &[JsValue], registry: &ScriptRegistry, ctx: &mut Context| {
                let handle = handle_arg(args, ctx)?;
                Ok(JsValue::from(registry.0.ready_state(handle)))
            },
            registry,
        ),
    )?;

    log::info!("Registered WebSocket native functions");
    Ok(())
}

fn string_arg(args: &[JsValue], index: usize) -> String {
    args.get(index)
        .and_then(|v| v.as_string())
        .map(|s| s.to_std_string_escaped())
        .unwrap_or_default()
}

fn handle_arg(args: &[JsValue], ctx: &mut Context) -> JsResult<ClientHandle> {
    let raw = match args.first() {
        Some(value) => value.to_i32(ctx)?,
        None => 0,
    };
    Ok(ClientHandle::from_raw(raw))
}
