//! Shared components, resources and messages for docking in a Bevy world

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use snapfit_core::{
    Assembly, CutawayReveal, HighlightState, PlugId, SeatingProgress, SocketId, Xfo,
};

/// The connection registry driven by the scene
#[derive(Resource, Debug, Clone, Deref, DerefMut)]
pub struct AssemblyResource(pub Assembly);

/// Marker component for plug entities
#[derive(Component, Debug, Clone, Copy)]
pub struct PlugEntity {
    pub plug: PlugId,
}

/// Marker component for socket locator entities
#[derive(Component, Debug, Clone, Copy)]
pub struct SocketEntity {
    pub socket: SocketId,
}

/// Highlight of a plug with its pending auto-clear
#[derive(Component, Debug, Clone, Default, Deref, DerefMut)]
pub struct PlugHighlight(pub HighlightState);

/// A drag produced a new candidate transform for a plug
#[derive(Message, Debug, Clone, Copy)]
pub struct DragPlug {
    pub plug: Entity,
    pub candidate: Transform,
}

/// Pointer entered or left a plug
#[derive(Message, Debug, Clone, Copy)]
pub struct PlugHover {
    pub plug: Entity,
    pub hovered: bool,
}

/// A plug was seated in a socket
#[derive(Message, Debug, Clone, Copy)]
pub struct SocketPlugged {
    pub socket: SocketId,
    pub plug: PlugId,
    pub plug_entity: Entity,
}

/// Every tracked plug is seated
#[derive(Message, Debug, Clone, Copy)]
pub struct AssemblyCompleted;

/// Seating progress of the active plugs
#[derive(Resource, Debug, Clone, Default, Deref, DerefMut)]
pub struct SeatingTracker(pub SeatingProgress);

/// Completion sequence options
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct RevealSettings {
    /// Run the cutaway reveal once the assembly is complete
    pub enabled: bool,
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Cut plane applied to the housing parts
#[derive(Resource, Debug, Clone)]
pub struct CutawayPlane {
    pub normal: Vec3,
    pub distance: f32,
    pub enabled: bool,
    /// Running reveal animation, if any
    pub reveal: Option<CutawayReveal>,
}

impl Default for CutawayPlane {
    fn default() -> Self {
        let reveal = CutawayReveal::default();
        Self {
            normal: Vec3::X,
            distance: reveal.value() as f32,
            enabled: true,
            reveal: None,
        }
    }
}

impl CutawayPlane {
    /// Restart the reveal from the closed position
    pub fn start_reveal(&mut self) {
        let reveal = CutawayReveal::default();
        self.distance = reveal.value() as f32;
        self.enabled = true;
        self.reveal = Some(reveal);
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.is_some()
    }
}

/// Convert a double precision transform to a Bevy [`Transform`]
pub fn xfo_to_transform(xfo: &Xfo) -> Transform {
    Transform {
        translation: xfo.translation.as_vec3(),
        rotation: xfo.rotation.as_quat(),
        scale: xfo.scale.as_vec3(),
    }
}

/// Convert a Bevy [`Transform`] to a double precision transform
pub fn transform_to_xfo(transform: &Transform) -> Xfo {
    Xfo {
        translation: transform.translation.as_dvec3(),
        rotation: transform.rotation.as_dquat(),
        scale: transform.scale.as_dvec3(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::DVec3;

    #[test]
    fn test_transform_conversion() {
        let xfo = Xfo::from_direction_and_up(DVec3::new(0.0, -0.195, 0.0), DVec3::Y, DVec3::Z);
        let transform = xfo_to_transform(&xfo);
        assert!((transform.translation - Vec3::new(0.0, -0.195, 0.0)).length() < 1e-6);
        assert!((transform.forward().as_vec3() + Vec3::Y).length() < 1e-6);

        let back = transform_to_xfo(&transform);
        assert!(back.approx_eq(&xfo, 1e-6));
    }

    #[test]
    fn test_cutaway_reveal_restart() {
        let mut plane = CutawayPlane::default();
        assert!(!plane.is_revealing());
        plane.start_reveal();
        assert!(plane.is_revealing());
        assert!((plane.distance + 0.2).abs() < 1e-6);
    }
}
