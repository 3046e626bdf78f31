use serde::{Deserialize, Serialize};

/// Ready-state codes as seen by script callers (browser numbering).
pub const WS_CONNECTING: u32 = 0;
pub const WS_OPEN: u32 = 1;
pub const WS_CLOSING: u32 = 2;
pub const WS_CLOSED: u32 = 3;

/// Lifecycle of a single connection.
///
/// `Connecting -> Open -> Closing -> Closed`, with `Connecting | Open -> Failed`
/// on error. `Closed` and `Failed` are terminal; the entry stays in the
/// registry until it is destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
    Failed,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }

    pub fn ready_state(self) -> u32 {
        match self {
            Self::Connecting => WS_CONNECTING,
            Self::Open => WS_OPEN,
            Self::Closing => WS_CLOSING,
            Self::Closed | Self::Failed => WS_CLOSED,
        }
    }
}
