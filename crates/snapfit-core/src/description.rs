//! Assembly descriptions - TOML authoring format for sockets and plugs
//!
//! Each `[[socket]]` entry creates a socket named after the entry and a plug
//! named `<name>Plug` whose home socket it is. Positions are world
//! coordinates at authoring time; a `mount` turns them into an offset from
//! the carrying plug.

use bevy_math::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::assembly::Assembly;
use crate::plug::PlugParams;
use crate::socket::{SocketId, SocketParams};
use crate::xfo::Xfo;

#[derive(Error, Debug)]
pub enum DescriptionError {
    #[error("Failed to read assembly description: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse assembly description: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize assembly description: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Duplicate socket name: {0}")]
    DuplicateName(String),
    #[error("Socket {socket} references unknown socket {reference}")]
    UnknownSocket { socket: String, reference: String },
    #[error("Socket {0} has invalid geometry: {1}")]
    InvalidGeometry(String, String),
    #[error("Dependency cycle through socket {0}")]
    DependencyCycle(String),
    #[error("Mount cycle through socket {0}")]
    MountCycle(String),
}

/// One socket and its plug
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketDescription {
    pub name: String,
    /// Socket base in world space
    pub position: [f64; 3],
    /// Insertion axis (local +Z)
    #[serde(default = "default_direction")]
    pub direction: [f64; 3],
    #[serde(default = "default_up")]
    pub up: [f64; 3],
    pub radius: f64,
    pub slide_dist: f64,
    /// Plug length, display only
    #[serde(default)]
    pub plug_length: f64,
    #[serde(default)]
    pub radial_constraint: Option<f64>,
    #[serde(default)]
    pub axial_constraint: Option<f64>,
    #[serde(default)]
    pub axial_flip: Option<bool>,
    /// Sockets that must be connected before this one accepts its plug
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Other sockets this entry's plug may enter, tried after its own
    #[serde(default)]
    pub compatible_with: Vec<String>,
    /// Socket whose plug carries this socket
    #[serde(default)]
    pub mount: Option<String>,
    /// Initial plug position; the plug keeps the socket orientation
    #[serde(default)]
    pub start: Option<[f64; 3]>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_direction() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

fn default_up() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

fn default_enabled() -> bool {
    true
}

impl SocketDescription {
    pub fn plug_name(&self) -> String {
        format!("{}Plug", self.name)
    }

    fn xfo(&self) -> Xfo {
        Xfo::from_direction_and_up(
            DVec3::from_array(self.position),
            DVec3::from_array(self.direction),
            DVec3::from_array(self.up),
        )
    }

    fn params(&self) -> SocketParams {
        let mut params = SocketParams::new(self.radius, self.slide_dist);
        if let Some(radians) = self.radial_constraint {
            params = params.with_radial_constraint(radians);
        }
        if let Some(radians) = self.axial_constraint {
            params = params.with_axial_constraint(radians);
        }
        if let Some(flip) = self.axial_flip {
            params = params.with_axial_flip(flip);
        }
        params
    }
}

/// A complete assembly
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyDescription {
    pub name: String,
    #[serde(default, rename = "socket")]
    pub sockets: Vec<SocketDescription>,
}

impl AssemblyDescription {
    /// Load a description from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, DescriptionError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a description from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, DescriptionError> {
        let description: AssemblyDescription = toml::from_str(content)?;
        description.validate()?;
        Ok(description)
    }

    pub fn to_toml(&self) -> Result<String, DescriptionError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn find(&self, name: &str) -> Option<&SocketDescription> {
        self.sockets.iter().find(|s| s.name == name)
    }

    /// Check names, geometry and both reference graphs
    pub fn validate(&self) -> Result<(), DescriptionError> {
        let mut index = HashMap::new();
        for (i, socket) in self.sockets.iter().enumerate() {
            if index.insert(socket.name.as_str(), i).is_some() {
                return Err(DescriptionError::DuplicateName(socket.name.clone()));
            }
            if socket.radius.is_nan() || socket.radius <= 0.0 {
                return Err(DescriptionError::InvalidGeometry(
                    socket.name.clone(),
                    format!("radius must be positive, got {}", socket.radius),
                ));
            }
            if socket.slide_dist.is_nan() || socket.slide_dist < 0.0 {
                return Err(DescriptionError::InvalidGeometry(
                    socket.name.clone(),
                    format!("slide_dist must not be negative, got {}", socket.slide_dist),
                ));
            }
        }

        for socket in &self.sockets {
            let references = socket
                .depends_on
                .iter()
                .chain(&socket.compatible_with)
                .chain(socket.mount.iter());
            for reference in references {
                if !index.contains_key(reference.as_str()) {
                    return Err(DescriptionError::UnknownSocket {
                        socket: socket.name.clone(),
                        reference: reference.clone(),
                    });
                }
            }
        }

        let depends: Vec<Vec<usize>> = self
            .sockets
            .iter()
            .map(|s| s.depends_on.iter().filter_map(|d| index.get(d.as_str()).copied()).collect())
            .collect();
        if let Some(i) = find_cycle(&depends) {
            return Err(DescriptionError::DependencyCycle(self.sockets[i].name.clone()));
        }

        let mounts: Vec<Vec<usize>> = self
            .sockets
            .iter()
            .map(|s| s.mount.iter().filter_map(|m| index.get(m.as_str()).copied()).collect())
            .collect();
        if let Some(i) = find_cycle(&mounts) {
            return Err(DescriptionError::MountCycle(self.sockets[i].name.clone()));
        }

        Ok(())
    }

    /// Build a ready-to-use [`Assembly`]
    pub fn build(&self) -> Result<Assembly, DescriptionError> {
        self.validate()?;

        let mut assembly = Assembly::new(self.name.clone());
        let mut ids: HashMap<&str, SocketId> = HashMap::new();

        // Sockets first so plugs and dependencies can refer to any of them
        for socket in &self.sockets {
            let id = assembly.add_socket(socket.name.clone(), socket.params(), socket.xfo());
            ids.insert(socket.name.as_str(), id);
        }

        // Plugs start on their home socket so mounts can capture offsets
        let mut plugs = Vec::with_capacity(self.sockets.len());
        for socket in &self.sockets {
            let params = PlugParams {
                size: socket.radius * 5.0,
                length: socket.plug_length,
            };
            let plug = assembly.add_plug(socket.plug_name(), params, socket.xfo());
            assembly.add_connectable_socket(plug, ids[socket.name.as_str()]);
            for other in &socket.compatible_with {
                assembly.add_connectable_socket(plug, ids[other.as_str()]);
            }
            plugs.push(plug);
        }

        for (i, socket) in self.sockets.iter().enumerate() {
            let id = SocketId(i);
            for dependency in &socket.depends_on {
                assembly.add_dependent_socket(id, ids[dependency.as_str()]);
            }
            if let Some(carrier) = &socket.mount {
                let carrier_index = ids[carrier.as_str()].0;
                let carrier_xfo = self.sockets[carrier_index].xfo();
                let local = carrier_xfo.inverse().mul_xfo(&socket.xfo());
                assembly.mount_socket(id, plugs[carrier_index], local);
                debug!(socket = %socket.name, carrier = %carrier, "Socket mounted");
            }
        }

        for (socket, &plug) in self.sockets.iter().zip(&plugs) {
            if let Some(start) = socket.start {
                let mut xfo = socket.xfo();
                xfo.translation = DVec3::from_array(start);
                assembly.set_plug_xfo(plug, xfo);
            }
            if socket.enabled {
                assembly.activate_plug(plug);
            }
        }

        info!(
            assembly = %self.name,
            sockets = self.sockets.len(),
            active = assembly.active_count(),
            "Assembly built"
        );
        Ok(assembly)
    }
}

/// Return a node on a cycle of the directed graph, if any
fn find_cycle(edges: &[Vec<usize>]) -> Option<usize> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    let mut marks = vec![Mark::New; edges.len()];
    for root in 0..edges.len() {
        if marks[root] != Mark::New {
            continue;
        }
        // iterative DFS: (node, next edge index)
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::Active;
        while let Some((node, edge)) = stack.last_mut() {
            let node = *node;
            if let Some(&next) = edges[node].get(*edge) {
                *edge += 1;
                match marks[next] {
                    Mark::Active => return Some(next),
                    Mark::New => {
                        marks[next] = Mark::Active;
                        stack.push((next, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docking::Transition;
    use crate::plug::PlugState;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PISTON: &str = r#"
name = "piston"

[[socket]]
name = "bore"
position = [0.0, 0.0, 0.0]
direction = [0.0, 1.0, 0.0]
up = [0.0, 0.0, 1.0]
radius = 0.01
slide_dist = 0.1
start = [0.0, 0.4, 0.0]

[[socket]]
name = "seal"
position = [0.0, 0.02, 0.0]
direction = [0.0, 1.0, 0.0]
up = [0.0, 0.0, 1.0]
radius = 0.005
slide_dist = 0.01
mount = "bore"

[[socket]]
name = "clip"
position = [0.0, 0.12, 0.0]
direction = [0.0, 1.0, 0.0]
up = [0.0, 0.0, 1.0]
radius = 0.005
slide_dist = 0.02
depends_on = ["bore", "seal"]
enabled = false
"#;

    #[test]
    fn test_parse_and_build() {
        let description = AssemblyDescription::from_toml(PISTON).unwrap();
        assert_eq!(description.sockets.len(), 3);
        assert_eq!(description.find("seal").unwrap().plug_name(), "sealPlug");

        let assembly = description.build().unwrap();
        assert_eq!(assembly.name(), "piston");
        assert_eq!(assembly.active_count(), 2);

        let clip = assembly.socket_by_name("clip").unwrap();
        assert_eq!(clip.dependent_sockets(), &[SocketId(0), SocketId(1)]);
        assert!(clip.params().axial_flip);
        assert_eq!(assembly.plug_by_name("clipPlug").unwrap().state(), PlugState::Disabled);

        // the bore plug starts away from its socket and carries the seal socket along
        let bore_plug = assembly.plug_by_name("borePlug").unwrap();
        assert!(bore_plug.xfo().translation.distance(DVec3::new(0.0, 0.4, 0.0)) < 1e-12);
        let seal = assembly.socket_by_name("seal").unwrap();
        assert!(seal.xfo().translation.distance(DVec3::new(0.0, 0.42, 0.0)) < 1e-12);
        assert!(seal.axis().distance(DVec3::Y) < 1e-12);
    }

    #[test]
    fn test_compatible_sockets_follow_home_socket() {
        let content = r#"
name = "swap"

[[socket]]
name = "a"
position = [0.0, 0.0, 0.0]
radius = 0.01
slide_dist = 0.05
compatible_with = ["b", "a"]

[[socket]]
name = "b"
position = [1.0, 0.0, 0.0]
radius = 0.01
slide_dist = 0.05
"#;
        let assembly = AssemblyDescription::from_toml(content).unwrap().build().unwrap();
        let plug = assembly.plug_by_name("aPlug").unwrap();
        assert_eq!(plug.sockets(), &[SocketId(0), SocketId(1)]);
    }

    #[test]
    fn test_rejects_unknown_reference() {
        let content = r#"
name = "broken"

[[socket]]
name = "a"
position = [0.0, 0.0, 0.0]
radius = 0.01
slide_dist = 0.05
depends_on = ["missing"]
"#;
        let err = AssemblyDescription::from_toml(content).unwrap_err();
        assert!(matches!(
            err,
            DescriptionError::UnknownSocket { ref reference, .. } if reference == "missing"
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_cycles() {
        let duplicate = r#"
name = "dup"

[[socket]]
name = "a"
position = [0.0, 0.0, 0.0]
radius = 0.01
slide_dist = 0.05

[[socket]]
name = "a"
position = [0.0, 0.0, 0.0]
radius = 0.01
slide_dist = 0.05
"#;
        assert!(matches!(
            AssemblyDescription::from_toml(duplicate),
            Err(DescriptionError::DuplicateName(_))
        ));

        let cycle = r#"
name = "cycle"

[[socket]]
name = "a"
position = [0.0, 0.0, 0.0]
radius = 0.01
slide_dist = 0.05
depends_on = ["b"]

[[socket]]
name = "b"
position = [0.0, 0.0, 0.0]
radius = 0.01
slide_dist = 0.05
depends_on = ["a"]
"#;
        assert!(matches!(
            AssemblyDescription::from_toml(cycle),
            Err(DescriptionError::DependencyCycle(_))
        ));

        let mount_cycle = r#"
name = "mounts"

[[socket]]
name = "a"
position = [0.0, 0.0, 0.0]
radius = 0.01
slide_dist = 0.05
mount = "a"
"#;
        assert!(matches!(
            AssemblyDescription::from_toml(mount_cycle),
            Err(DescriptionError::MountCycle(_))
        ));
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let content = r#"
name = "flat"

[[socket]]
name = "a"
position = [0.0, 0.0, 0.0]
radius = 0.0
slide_dist = 0.05
"#;
        assert!(matches!(
            AssemblyDescription::from_toml(content),
            Err(DescriptionError::InvalidGeometry(..))
        ));
    }

    #[test]
    fn test_find_cycle() {
        assert_eq!(find_cycle(&[vec![1], vec![2], vec![]]), None);
        assert!(find_cycle(&[vec![1], vec![2], vec![0]]).is_some());
        // diamond is not a cycle
        assert_eq!(find_cycle(&[vec![1, 2], vec![3], vec![3], vec![]]), None);
    }

    #[test]
    fn test_load_from_file_and_seat() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(PISTON.as_bytes()).unwrap();

        let description = AssemblyDescription::from_file(file.path()).unwrap();
        let mut assembly = description.build().unwrap();

        let plug = assembly.plug_by_name("borePlug").unwrap().id();
        let bore = assembly.socket_by_name("bore").unwrap().clone();
        let mut candidate = *bore.xfo();
        candidate.translation = bore.xfo().translation + bore.axis() * 0.105;
        let report = assembly.clean_global_xfo(plug, candidate);
        assert_eq!(report.transition, Some(Transition::Paired(bore.id())));

        candidate.translation = bore.xfo().translation + bore.axis() * 0.002;
        let report = assembly.clean_global_xfo(plug, candidate);
        assert!(report.plugged.is_some());

        // seal socket was carried back into place by its seated carrier
        let seal = assembly.socket_by_name("seal").unwrap();
        assert!(seal.xfo().translation.distance(DVec3::new(0.0, 0.02, 0.0)) < 1e-12);
    }

    #[test]
    fn test_toml_round_trip_keeps_defaults() {
        let description = AssemblyDescription::from_toml(PISTON).unwrap();
        let text = description.to_toml().unwrap();
        let again = AssemblyDescription::from_toml(&text).unwrap();
        assert_eq!(again.sockets[2].depends_on, vec!["bore", "seal"]);
        assert!(!again.sockets[2].enabled);
        assert_eq!(again.sockets[0].up, [0.0, 0.0, 1.0]);
    }
}
