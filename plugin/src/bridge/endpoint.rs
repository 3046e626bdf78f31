//! Target URI validation and the broadcast endpoint rewrite.

use rand::Rng;
use url::Url;

use crate::bridge::{BridgeError, BridgeResult};

/// Parse a connection target, mapping http(s) onto ws(s).
///
/// With `allow_tls == false` secure targets are downgraded to plain `ws`.
pub fn parse_target(uri: &str, allow_tls: bool) -> BridgeResult<Url> {
    let mut url = Url::parse(uri.trim()).map_err(|e| BridgeError::invalid_uri(uri, e))?;

    let scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" if allow_tls => "wss",
        "wss" | "https" => {
            log::warn!("TLS disabled, downgrading {} to ws", uri);
            "ws"
        }
        other => {
            return Err(BridgeError::invalid_uri(
                uri,
                format!("unsupported scheme '{}'", other),
            ));
        }
    };

    if url.host_str().is_none_or(str::is_empty) {
        return Err(BridgeError::invalid_uri(uri, "missing host"));
    }

    if url.scheme() != scheme {
        // Keep the port the caller actually meant when swapping schemes.
        let port = url.port_or_known_default();
        url.set_scheme(scheme)
            .map_err(|_| BridgeError::invalid_uri(uri, "cannot change scheme"))?;
        if url.port().is_none() && port != url.port_or_known_default() {
            url.set_port(port)
                .map_err(|_| BridgeError::invalid_uri(uri, "cannot set port"))?;
        }
    }

    Ok(url)
}

/// Build `<ws|wss>://<host>:<port>/broadcast/<server-id>/<connection-id>/websocket`.
///
/// The server id is a random integer in `[1, 1000)` and the connection id is
/// eight random uppercase letters.
pub fn broadcast_endpoint(uri: &str, allow_tls: bool) -> BridgeResult<Url> {
    let target = parse_target(uri, allow_tls)?;
    let host = target
        .host_str()
        .ok_or_else(|| BridgeError::invalid_uri(uri, "missing host"))?;
    let port = target
        .port_or_known_default()
        .ok_or_else(|| BridgeError::invalid_uri(uri, "missing port"))?;

    let mut rng = rand::rng();
    let server_id: u32 = rng.random_range(1..1000);
    let connection_id: String = (0..8)
        .map(|_| char::from(rng.random_range(b'A'..=b'Z')))
        .collect();

    let endpoint = format!(
        "{}://{}:{}/broadcast/{}/{}/websocket",
        target.scheme(),
        host,
        port,
        server_id,
        connection_id
    );
    Url::parse(&endpoint).map_err(|e| BridgeError::invalid_uri(uri, e))
}
