//! Connection registry: owns every socket and plug and applies docking results

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::docking::{self, Transition};
use crate::feedback::Feedback;
use crate::plug::{Plug, PlugId, PlugParams, PlugState};
use crate::socket::{ConnectionMode, Plugged, Socket, SocketId, SocketParams};
use crate::xfo::Xfo;

/// Result of one [`Assembly::clean_global_xfo`] call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockingReport {
    pub plug: PlugId,
    /// Transform the caller must adopt for the plug
    pub xfo: Xfo,
    pub transition: Option<Transition>,
    /// Highlight request for the rendering layer
    pub feedback: Option<Feedback>,
    /// Set when the socket transitioned into `Connected`
    pub plugged: Option<Plugged>,
}

/// All sockets and plugs of one assembly.
///
/// Sockets and plugs refer to each other through [`SocketId`] / [`PlugId`]
/// handles into this registry.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    name: String,
    sockets: Vec<Socket>,
    plugs: Vec<Plug>,
}

impl Assembly {
    /// Create a new empty assembly
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sockets: Vec::new(),
            plugs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a socket at a world transform
    pub fn add_socket(&mut self, name: impl Into<String>, params: SocketParams, xfo: Xfo) -> SocketId {
        let id = SocketId(self.sockets.len());
        self.sockets.push(Socket::new(id, name.into(), params, xfo));
        id
    }

    /// Register a plug; it starts disabled
    pub fn add_plug(&mut self, name: impl Into<String>, params: PlugParams, xfo: Xfo) -> PlugId {
        let id = PlugId(self.plugs.len());
        self.plugs.push(Plug::new(id, name.into(), params, xfo));
        id
    }

    /// Require `dependent` to be connected before `socket` accepts a plug
    pub fn add_dependent_socket(&mut self, socket: SocketId, dependent: SocketId) {
        if self.sockets.get(dependent.0).is_none() {
            warn!(%socket, %dependent, "Ignoring unknown dependent socket");
            return;
        }
        if let Some(s) = self.sockets.get_mut(socket.0) {
            s.add_dependent_socket(dependent);
        }
    }

    /// Allow `plug` to dock into `socket`. Registration order is scan order.
    pub fn add_connectable_socket(&mut self, plug: PlugId, socket: SocketId) {
        if self.sockets.get(socket.0).is_none() {
            warn!(%plug, %socket, "Ignoring unknown connectable socket");
            return;
        }
        if let Some(p) = self.plugs.get_mut(plug.0) {
            p.add_connectable_socket(socket);
        }
    }

    /// Enable docking for a disabled plug. Returns false if it was already active.
    pub fn activate_plug(&mut self, plug: PlugId) -> bool {
        let Some(p) = self.plugs.get_mut(plug.0) else {
            return false;
        };
        let activated = p.activate();
        if activated {
            debug!(plug = %p.name(), "Plug activated");
        }
        activated
    }

    pub fn socket(&self, id: SocketId) -> Option<&Socket> {
        self.sockets.get(id.0)
    }

    pub fn plug(&self, id: PlugId) -> Option<&Plug> {
        self.plugs.get(id.0)
    }

    pub fn sockets(&self) -> &[Socket] {
        &self.sockets
    }

    pub fn plugs(&self) -> &[Plug] {
        &self.plugs
    }

    pub fn socket_by_name(&self, name: &str) -> Option<&Socket> {
        self.sockets.iter().find(|s| s.name() == name)
    }

    pub fn plug_by_name(&self, name: &str) -> Option<&Plug> {
        self.plugs.iter().find(|p| p.name() == name)
    }

    /// True iff every prerequisite of `socket` is connected
    pub fn are_dependent_sockets_plugged(&self, socket: SocketId) -> bool {
        let Some(s) = self.socket(socket) else {
            return false;
        };
        s.dependent_sockets()
            .iter()
            .all(|dep| self.socket(*dep).is_some_and(Socket::is_connected))
    }

    /// Move a socket (e.g. its parent part moved)
    pub fn set_socket_xfo(&mut self, socket: SocketId, xfo: Xfo) {
        if let Some(s) = self.sockets.get_mut(socket.0) {
            s.set_xfo(xfo);
        }
    }

    /// Attach `socket` to `plug` at an offset expressed in the plug's frame.
    ///
    /// The socket then follows every corrected transform of the plug.
    pub fn mount_socket(&mut self, socket: SocketId, plug: PlugId, local: Xfo) {
        let Some(carrier) = self.plugs.get(plug.0).map(|p| *p.xfo()) else {
            warn!(%socket, %plug, "Ignoring mount on unknown plug");
            return;
        };
        if let Some(s) = self.sockets.get_mut(socket.0) {
            s.set_mount(plug, local);
            s.set_xfo(carrier.mul_xfo(&local));
        }
    }

    /// Place a plug without running the docking test (authoring time)
    pub fn set_plug_xfo(&mut self, plug: PlugId, xfo: Xfo) {
        if let Some(p) = self.plugs.get_mut(plug.0) {
            p.set_xfo(xfo);
            self.propagate_from(plug);
        }
    }

    /// Run the docking engine for `plug` on a candidate transform and apply
    /// the resulting state transition.
    ///
    /// The returned transform is authoritative for the plug.
    pub fn clean_global_xfo(&mut self, plug: PlugId, candidate: Xfo) -> DockingReport {
        let outcome = docking::dock(self, plug, candidate);
        let mut plugged = None;

        if let Some(transition) = outcome.transition {
            plugged = self.apply_transition(plug, transition);
        }

        if let Some(p) = self.plugs.get_mut(plug.0) {
            p.set_xfo(outcome.xfo);
            self.propagate_from(plug);
        }

        DockingReport {
            plug,
            xfo: outcome.xfo,
            transition: outcome.transition,
            feedback: outcome.feedback,
            plugged,
        }
    }

    fn apply_transition(&mut self, plug: PlugId, transition: Transition) -> Option<Plugged> {
        let socket_id = transition.socket();
        let (Some(p), Some(s)) = (self.plugs.get_mut(plug.0), self.sockets.get_mut(socket_id.0))
        else {
            return None;
        };

        match transition {
            Transition::Paired(_) => {
                p.pair(socket_id);
                s.set_connected_plug(Some(plug), ConnectionMode::Paired);
                info!(plug = %p.name(), socket = %s.name(), "Plug paired");
                None
            }
            Transition::Released(_) => {
                s.set_connected_plug(None, ConnectionMode::Unconnected);
                p.release();
                info!(plug = %p.name(), socket = %s.name(), "Plug released");
                None
            }
            Transition::Seated(_) => {
                p.seat(socket_id);
                let plugged = s.set_connected_plug(Some(plug), ConnectionMode::Connected);
                info!(plug = %p.name(), socket = %s.name(), "Plug seated");
                plugged
            }
        }
    }

    /// Refresh sockets mounted on `plug`, and plugs seated in them, transitively
    fn propagate_from(&mut self, plug: PlugId) {
        let mut pending = vec![plug];
        // bounded so a malformed mount cycle cannot spin forever
        let mut budget = self.plugs.len() + self.sockets.len();

        while let Some(carrier) = pending.pop() {
            if budget == 0 {
                warn!(%plug, "Mount propagation aborted, mount graph has a cycle");
                return;
            }
            budget -= 1;

            let Some(carrier_xfo) = self.plugs.get(carrier.0).map(|p| *p.xfo()) else {
                continue;
            };
            for socket in &mut self.sockets {
                let Some((mount_plug, local)) = socket.mount().copied() else {
                    continue;
                };
                if mount_plug != carrier {
                    continue;
                }
                socket.set_xfo(carrier_xfo.mul_xfo(&local));

                if let (Some(seated), true) = (socket.connected_plug(), socket.is_connected()) {
                    if let Some(p) = self.plugs.get_mut(seated.0) {
                        p.set_xfo(*socket.xfo());
                        pending.push(seated);
                    }
                }
            }
        }
    }

    /// Number of plugs in the connected state
    pub fn seated_count(&self) -> usize {
        self.plugs.iter().filter(|p| p.state().is_connected()).count()
    }

    /// Number of plugs that take part in docking
    pub fn active_count(&self) -> usize {
        self.plugs
            .iter()
            .filter(|p| p.state() != PlugState::Disabled)
            .count()
    }

    /// Every active plug is seated
    pub fn is_complete(&self) -> bool {
        self.active_count() > 0 && self.seated_count() == self.active_count()
    }

    /// Serializable view of the current connection state
    pub fn snapshot(&self) -> AssemblySnapshot {
        let socket_name = |id: SocketId| self.socket(id).map(|s| s.name().to_string());
        let plug_name = |id: PlugId| self.plug(id).map(|p| p.name().to_string());

        AssemblySnapshot {
            name: self.name.clone(),
            plugs: self
                .plugs
                .iter()
                .map(|p| PlugSnapshot {
                    name: p.name().to_string(),
                    state: p.state().label().to_string(),
                    socket: p.paired_socket().and_then(socket_name),
                    position: p.xfo().translation.to_array(),
                })
                .collect(),
            sockets: self
                .sockets
                .iter()
                .map(|s| SocketSnapshot {
                    name: s.name().to_string(),
                    mode: s.connected_plug_mode(),
                    plug: s.connected_plug().and_then(plug_name),
                    position: s.xfo().translation.to_array(),
                })
                .collect(),
            seated: self.seated_count(),
            active: self.active_count(),
        }
    }
}

/// Plug entry of an [`AssemblySnapshot`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlugSnapshot {
    pub name: String,
    pub state: String,
    pub socket: Option<String>,
    pub position: [f64; 3],
}

/// Socket entry of an [`AssemblySnapshot`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketSnapshot {
    pub name: String,
    pub mode: ConnectionMode,
    pub plug: Option<String>,
    pub position: [f64; 3],
}

/// Serializable connection state of a whole assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblySnapshot {
    pub name: String,
    pub plugs: Vec<PlugSnapshot>,
    pub sockets: Vec<SocketSnapshot>,
    pub seated: usize,
    pub active: usize,
}
