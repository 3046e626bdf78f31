use boa_engine::{Context, JsResult, Source};

/// Register the `BridgeSocket` JavaScript shim.
pub(crate) fn register_websocket_shim(context: &mut Context) -> JsResult<()> {
    let shim = r#"
(function() {
    // Live sockets by handle
    var sockets = {};

    // Event dispatch function called from Rust
    globalThis.__ws_dispatch_event = function(id, type, data) {
        var socket = sockets[id];
        if (!socket) {
            return;
        }
        socket._emit({ type: type, target: socket, handle: id, data: data });
    };

    function BridgeSocket(url) {
        if (!(this instanceof BridgeSocket)) {
            throw new TypeError("Failed to construct 'BridgeSocket': Please use the 'new' operator");
        }

        this._url = url;
        this._listeners = {};
        this._destroyed = false;

        this.onopen = null;
        this.onclose = null;
        this.onmessage = null;
        this.onlog = null;
        this.onerror = null;

        // Throws a TypeError for a malformed url
        this._id = __ws_create(url);
        sockets[this._id] = this;
    }

    BridgeSocket.CONNECTING = 0;
    BridgeSocket.OPEN = 1;
    BridgeSocket.CLOSING = 2;
    BridgeSocket.CLOSED = 3;

    Object.defineProperties(BridgeSocket.prototype, {
        url: { get: function() { return this._url; } },
        handle: { get: function() { return this._id; } },
        readyState: {
            get: function() {
                return this._destroyed ? BridgeSocket.CLOSED : __ws_ready_state(this._id);
            }
        }
    });

    BridgeSocket.prototype.send = function(data) {
        var text = (typeof data === 'string') ? data : JSON.stringify(data);
        __ws_send(this._id, text);
    };

    BridgeSocket.prototype.close = function() {
        __ws_close(this._id);
    };

    BridgeSocket.prototype.destroy = function() {
        if (this._destroyed) return;
        this._destroyed = true;
        delete sockets[this._id];
        __ws_destroy(this._id);
    };

    BridgeSocket.prototype.addEventListener = function(type, listener) {
        if (!this._listeners[type]) this._listeners[type] = [];
        this._listeners[type].push(listener);
    };

    BridgeSocket.prototype.removeEventListener = function(type, listener) {
        var listeners = this._listeners[type];
        if (!listeners) return;
        var idx = listeners.indexOf(listener);
        if (idx !== -1) listeners.splice(idx, 1);
    };

    BridgeSocket.prototype._emit = function(event) {
        var handler = this['on' + event.type];
        if (handler) {
            try { handler.call(this, event); } catch (e) { console.error('[BridgeSocket] on' + event.type + ' error:', e); }
        }
        var listeners = (this._listeners[event.type] || []).slice();
        for (var i = 0; i < listeners.length; i++) {
            try { listeners[i].call(this, event); } catch (e) { console.error('[BridgeSocket] listener error:', e); }
        }
    };

    globalThis.BridgeSocket = BridgeSocket;
})();
    "#;

    context.eval(Source::from_bytes(shim.as_bytes()))?;
    Ok(())
}
