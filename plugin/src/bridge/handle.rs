use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of one connection, issued by a [`ConnectionRegistry`].
///
/// Handles are allocated monotonically starting at 1 and are never reused
/// while the registry is alive, so a late event carrying a stale handle can
/// never be mistaken for a newer connection.
///
/// [`ConnectionRegistry`]: crate::bridge::ConnectionRegistry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientHandle(i32);

impl ClientHandle {
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The integer form used across runtime boundaries.
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ClientHandle> for i32 {
    fn from(handle: ClientHandle) -> Self {
        handle.0
    }
}
