//! C ABI
//!
//! A process-wide registry for hosts that load the library as a `cdylib`.
//! Each event kind has one callback slot. Strings passed to callbacks are
//! only valid for the duration of the call.
//!
//! Callbacks run on native I/O threads, never on the thread that called
//! `ws_bridge_create`.

use std::ffi::{CStr, CString, c_char};

use once_cell::sync::Lazy;

use crate::bridge::{BridgeConfig, BridgeError, ClientHandle, ConnectionRegistry, EventKind};

/// Callback for events without a payload (opened, closed).
pub type WsHandleCallback = extern "C" fn(handle: i32);

/// Callback for events with a text payload (message, log, error).
pub type WsTextCallback = extern "C" fn(handle: i32, text: *const c_char);

static REGISTRY: Lazy<ConnectionRegistry> =
    Lazy::new(|| ConnectionRegistry::with_tungstenite(BridgeConfig::default()));

fn to_c_string(text: &str) -> CString {
    // Interior NULs would truncate the string on the C side anyway.
    CString::new(text.replace('\0', "")).unwrap_or_default()
}

fn call_text(callback: WsTextCallback, handle: ClientHandle, text: &str) {
    let text = to_c_string(text);
    callback(handle.raw(), text.as_ptr());
}

/// Reads a borrowed C string. `None` for null or non-UTF-8 input.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: Caller guarantees a NUL-terminated string.
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

#[unsafe(no_mangle)]
pub extern "C" fn ws_bridge_register_opened(callback: Option<WsHandleCallback>) {
    let dispatcher = REGISTRY.dispatcher();
    match callback {
        Some(callback) => dispatcher.set_opened_sink(move |handle| callback(handle.raw())),
        None => dispatcher.clear_sink(EventKind::Opened),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn ws_bridge_register_closed(callback: Option<WsHandleCallback>) {
    let dispatcher = REGISTRY.dispatcher();
    match callback {
        Some(callback) => dispatcher.set_closed_sink(move |handle| callback(handle.raw())),
        None => dispatcher.clear_sink(EventKind::Closed),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn ws_bridge_register_message(callback: Option<WsTextCallback>) {
    let dispatcher = REGISTRY.dispatcher();
    match callback {
        Some(callback) => {
            dispatcher.set_message_sink(move |handle, text| call_text(callback, handle, text))
        }
        None => dispatcher.clear_sink(EventKind::Message),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn ws_bridge_register_log(callback: Option<WsTextCallback>) {
    let dispatcher = REGISTRY.dispatcher();
    match callback {
        Some(callback) => {
            dispatcher.set_log_sink(move |handle, text| call_text(callback, handle, text))
        }
        None => dispatcher.clear_sink(EventKind::Log),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn ws_bridge_register_error(callback: Option<WsTextCallback>) {
    let dispatcher = REGISTRY.dispatcher();
    match callback {
        Some(callback) => {
            dispatcher.set_error_sink(move |handle, text| call_text(callback, handle, text))
        }
        None => dispatcher.clear_sink(EventKind::Error),
    }
}

/// Create a connection and start connecting.
///
/// Returns the new handle, or -1 if `uri` is null, not UTF-8, or not a
/// websocket address.
///
/// # Safety
///
/// `uri` must be null or point to a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ws_bridge_create(uri: *const c_char) -> i32 {
    // SAFETY: Forwarded from the caller.
    let Some(uri) = (unsafe { read_str(uri) }) else {
        log::error!("ws_bridge_create called with an unreadable uri");
        return -1;
    };

    match REGISTRY.create(uri) {
        Ok(handle) => handle.raw(),
        Err(e) => {
            log::error!("ws_bridge_create failed: {}", e);
            -1
        }
    }
}

/// Queue a text message.
///
/// Returns 0 on success, -1 if the connection is not open, -2 if `message`
/// is null or not UTF-8.
///
/// # Safety
///
/// `message` must be null or point to a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ws_bridge_send(handle: i32, message: *const c_char) -> i32 {
    // SAFETY: Forwarded from the caller.
    let Some(message) = (unsafe { read_str(message) }) else {
        return -2;
    };

    match REGISTRY.send(ClientHandle::from_raw(handle), message) {
        Ok(()) => 0,
        Err(BridgeError::NotConnected(_)) => -1,
        Err(e) => {
            log::warn!("ws_bridge_send failed: {}", e);
            -1
        }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn ws_bridge_close(handle: i32) {
    REGISTRY.close(ClientHandle::from_raw(handle));
}

#[unsafe(no_mangle)]
pub extern "C" fn ws_bridge_destroy(handle: i32) {
    REGISTRY.destroy(ClientHandle::from_raw(handle));
}

/// Destroy every connection and clear every callback slot.
#[unsafe(no_mangle)]
pub extern "C" fn ws_bridge_shutdown() {
    log::info!("Shutting down WebSocket bridge");
    REGISTRY.destroy_all();
    REGISTRY.dispatcher().clear_sinks();
}
