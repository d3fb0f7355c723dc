//! Sockets: fixed capture sites that plugs slide into

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::plug::PlugId;
use crate::xfo::Xfo;

/// Handle of a socket inside an [`Assembly`](crate::Assembly)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SocketId(pub usize);

impl std::fmt::Display for SocketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "socket#{}", self.0)
    }
}

/// Connection mode as seen from the socket side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    #[default]
    Unconnected,
    Paired,
    Connected,
}

/// Capture envelope of a socket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocketParams {
    /// Display size of the locator
    #[serde(default = "default_size")]
    pub size: f64,
    /// Capture radius around the socket mouth, also the seating depth
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// Length of the capture cylinder along local +Z
    #[serde(default = "default_slide_dist")]
    pub slide_dist: f64,
    /// Max angle between socket and plug X axes (radians)
    #[serde(default = "default_radial_constraint")]
    pub radial_constraint: f64,
    /// Max angle between socket and plug Z axes when pairing (radians)
    #[serde(default = "default_axial_constraint")]
    pub axial_constraint: f64,
    /// Accept plugs approaching from either end of the axis
    #[serde(default = "default_axial_flip")]
    pub axial_flip: bool,
}

fn default_size() -> f64 {
    0.2
}

fn default_radius() -> f64 {
    0.05
}

fn default_slide_dist() -> f64 {
    0.05
}

fn default_radial_constraint() -> f64 {
    PI * 2.0
}

fn default_axial_constraint() -> f64 {
    PI * 0.2
}

fn default_axial_flip() -> bool {
    true
}

impl Default for SocketParams {
    fn default() -> Self {
        Self {
            size: default_size(),
            radius: default_radius(),
            slide_dist: default_slide_dist(),
            radial_constraint: default_radial_constraint(),
            axial_constraint: default_axial_constraint(),
            axial_flip: default_axial_flip(),
        }
    }
}

impl SocketParams {
    pub fn new(radius: f64, slide_dist: f64) -> Self {
        Self {
            size: radius * 5.0,
            radius,
            slide_dist,
            ..Default::default()
        }
    }

    pub fn with_radial_constraint(mut self, radians: f64) -> Self {
        self.radial_constraint = radians;
        self
    }

    pub fn with_axial_constraint(mut self, radians: f64) -> Self {
        self.axial_constraint = radians;
        self
    }

    pub fn with_axial_flip(mut self, flip: bool) -> Self {
        self.axial_flip = flip;
        self
    }
}

/// Emitted when a socket transitions into [`ConnectionMode::Connected`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugged {
    pub socket: SocketId,
    pub plug: PlugId,
}

/// A named capture site
#[derive(Debug, Clone)]
pub struct Socket {
    id: SocketId,
    name: String,
    params: SocketParams,
    xfo: Xfo,
    dependent_sockets: Vec<SocketId>,
    connected_plug: Option<PlugId>,
    mode: ConnectionMode,
    /// Plug carrying this socket and the socket's offset in that plug's frame
    mount: Option<(PlugId, Xfo)>,
}

impl Socket {
    pub(crate) fn new(id: SocketId, name: String, params: SocketParams, xfo: Xfo) -> Self {
        Self {
            id,
            name,
            params,
            xfo,
            dependent_sockets: Vec::new(),
            connected_plug: None,
            mode: ConnectionMode::Unconnected,
            mount: None,
        }
    }

    pub fn id(&self) -> SocketId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &SocketParams {
        &self.params
    }

    /// Current world transform
    pub fn xfo(&self) -> &Xfo {
        &self.xfo
    }

    /// Prerequisite sockets in insertion order
    pub fn dependent_sockets(&self) -> &[SocketId] {
        &self.dependent_sockets
    }

    pub fn connected_plug(&self) -> Option<PlugId> {
        self.connected_plug
    }

    pub fn connected_plug_mode(&self) -> ConnectionMode {
        self.mode
    }

    pub fn is_connected(&self) -> bool {
        self.mode == ConnectionMode::Connected
    }

    pub fn mount(&self) -> Option<&(PlugId, Xfo)> {
        self.mount.as_ref()
    }

    /// Local +Z axis in world space
    pub fn axis(&self) -> bevy_math::DVec3 {
        self.xfo.z_axis()
    }

    /// Point at the mouth of the capture cylinder
    pub fn end_point(&self) -> bevy_math::DVec3 {
        self.xfo.translation + self.axis() * self.params.slide_dist
    }

    pub(crate) fn add_dependent_socket(&mut self, socket: SocketId) {
        self.dependent_sockets.push(socket);
    }

    pub(crate) fn set_xfo(&mut self, xfo: Xfo) {
        self.xfo = xfo;
    }

    pub(crate) fn set_mount(&mut self, plug: PlugId, local: Xfo) {
        self.mount = Some((plug, local));
    }

    /// Set the occupying plug and mode.
    ///
    /// Returns a [`Plugged`] event only on a transition into `Connected`.
    pub(crate) fn set_connected_plug(
        &mut self,
        plug: Option<PlugId>,
        mode: ConnectionMode,
    ) -> Option<Plugged> {
        let was_connected = self.is_connected();
        self.connected_plug = plug;
        self.mode = mode;

        match (was_connected, mode, plug) {
            (false, ConnectionMode::Connected, Some(plug)) => Some(Plugged {
                socket: self.id,
                plug,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_math::DVec3;

    fn socket() -> Socket {
        Socket::new(
            SocketId(0),
            "bore".to_string(),
            SocketParams::new(0.25, 1.0),
            Xfo::from_translation(DVec3::new(0.0, 0.0, 1.0)),
        )
    }

    #[test]
    fn test_params_defaults() {
        let params = SocketParams::default();
        assert_eq!(params.radius, 0.05);
        assert_eq!(params.slide_dist, 0.05);
        assert_eq!(params.radial_constraint, PI * 2.0);
        assert!(params.axial_flip);

        let params = SocketParams::new(0.007, 0.085);
        assert!((params.size - 0.035).abs() < 1e-12);
    }

    #[test]
    fn test_end_point() {
        let s = socket();
        assert_eq!(s.end_point(), DVec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_plugged_fires_once() {
        let mut s = socket();
        assert_eq!(s.set_connected_plug(Some(PlugId(3)), ConnectionMode::Paired), None);
        assert_eq!(s.connected_plug_mode(), ConnectionMode::Paired);

        let event = s.set_connected_plug(Some(PlugId(3)), ConnectionMode::Connected);
        assert_eq!(
            event,
            Some(Plugged {
                socket: SocketId(0),
                plug: PlugId(3)
            })
        );
        assert!(s.is_connected());

        assert_eq!(s.set_connected_plug(Some(PlugId(3)), ConnectionMode::Connected), None);
    }

    #[test]
    fn test_release() {
        let mut s = socket();
        s.set_connected_plug(Some(PlugId(1)), ConnectionMode::Paired);
        s.set_connected_plug(None, ConnectionMode::Unconnected);
        assert_eq!(s.connected_plug(), None);
        assert_eq!(s.connected_plug_mode(), ConnectionMode::Unconnected);
    }
}
