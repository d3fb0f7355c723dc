//! Plugs: movable parts that dock into compatible sockets

use serde::{Deserialize, Serialize};

use crate::socket::SocketId;
use crate::xfo::Xfo;

/// Handle of a plug inside an [`Assembly`](crate::Assembly)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlugId(pub usize);

impl std::fmt::Display for PlugId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "plug#{}", self.0)
    }
}

/// Plug-side connection state.
///
/// The paired socket lives inside the variant, so a connected plug always
/// knows its socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "socket", rename_all = "lowercase")]
pub enum PlugState {
    /// Docking disabled, transforms pass through untouched
    #[default]
    Disabled,
    Unconnected,
    /// Tracking a socket while sliding in
    Paired(SocketId),
    /// Seated for good
    Connected(SocketId),
}

impl PlugState {
    pub fn paired_socket(&self) -> Option<SocketId> {
        match self {
            PlugState::Paired(socket) | PlugState::Connected(socket) => Some(*socket),
            PlugState::Disabled | PlugState::Unconnected => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, PlugState::Connected(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlugState::Disabled => "disabled",
            PlugState::Unconnected => "unconnected",
            PlugState::Paired(_) => "paired",
            PlugState::Connected(_) => "connected",
        }
    }
}

/// Display extents of a plug
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlugParams {
    pub size: f64,
    pub length: f64,
}

impl Default for PlugParams {
    fn default() -> Self {
        Self {
            size: 0.2,
            length: 0.05,
        }
    }
}

/// A movable part
#[derive(Debug, Clone)]
pub struct Plug {
    id: PlugId,
    name: String,
    params: PlugParams,
    sockets: Vec<SocketId>,
    state: PlugState,
    xfo: Xfo,
}

impl Plug {
    pub(crate) fn new(id: PlugId, name: String, params: PlugParams, xfo: Xfo) -> Self {
        Self {
            id,
            name,
            params,
            sockets: Vec::new(),
            state: PlugState::Disabled,
            xfo,
        }
    }

    pub fn id(&self) -> PlugId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &PlugParams {
        &self.params
    }

    /// Compatible sockets in registration order
    pub fn sockets(&self) -> &[SocketId] {
        &self.sockets
    }

    pub fn state(&self) -> PlugState {
        self.state
    }

    pub fn paired_socket(&self) -> Option<SocketId> {
        self.state.paired_socket()
    }

    /// Last corrected world transform
    pub fn xfo(&self) -> &Xfo {
        &self.xfo
    }

    pub(crate) fn add_connectable_socket(&mut self, socket: SocketId) {
        if !self.sockets.contains(&socket) {
            self.sockets.push(socket);
        }
    }

    pub(crate) fn set_xfo(&mut self, xfo: Xfo) {
        self.xfo = xfo;
    }

    pub(crate) fn activate(&mut self) -> bool {
        if self.state == PlugState::Disabled {
            self.state = PlugState::Unconnected;
            true
        } else {
            false
        }
    }

    pub(crate) fn pair(&mut self, socket: SocketId) {
        debug_assert_eq!(self.state, PlugState::Unconnected);
        self.state = PlugState::Paired(socket);
    }

    pub(crate) fn release(&mut self) {
        debug_assert!(matches!(self.state, PlugState::Paired(_)));
        self.state = PlugState::Unconnected;
    }

    pub(crate) fn seat(&mut self, socket: SocketId) {
        debug_assert_eq!(self.state, PlugState::Paired(socket));
        self.state = PlugState::Connected(socket);
    }
}
