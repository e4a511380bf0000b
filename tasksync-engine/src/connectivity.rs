//! Session-level connectivity state.

use serde::Serialize;

/// Which path an engine operation takes. Decided once at the operation's
/// entry by the probe; only [`Connectivity::degrade`] changes it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Online,
    Offline,
}

impl Connectivity {
    pub fn from_probe(online: bool) -> Self {
        if online { Self::Online } else { Self::Offline }
    }

    pub fn is_online(self) -> bool {
        self == Self::Online
    }

    /// Online -> Offline, after a remote phase failed mid-operation.
    pub fn degrade(&mut self) {
        *self = Self::Offline;
    }
}
