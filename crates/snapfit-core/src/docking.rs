//! Docking engine: decides how a plug's candidate transform is corrected
//!
//! [`dock`] is a pure function of the registry and the candidate transform.
//! It returns the corrected transform together with the state transition and
//! the highlight request it implies; [`Assembly::clean_global_xfo`] applies
//! them.
//!
//! Per-socket test, for a socket with radius `r` and slide distance `d`:
//! - while searching, the plug must be within `r` of the socket mouth and
//!   outside the exclusion zone along the socket's side, all prerequisite
//!   sockets must be connected, and the plug axis must be within the axial
//!   tolerance
//! - while paired, the plug is snapped onto the socket axis and rotated into
//!   alignment as it slides; once it is less than `r` from the socket base it
//!   is seated
//! - in both cases the X axes must agree within the radial tolerance
//!
//! [`Assembly::clean_global_xfo`]: crate::Assembly::clean_global_xfo

use bevy_math::DQuat;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use tracing::debug;

use crate::assembly::Assembly;
use crate::feedback::{Feedback, HighlightRequest};
use crate::plug::{PlugId, PlugState};
use crate::socket::{Socket, SocketId};
use crate::xfo::{angle_between, Xfo};

/// Lateral extent of the approach exclusion zone, in socket radii
pub const EXCLUSION_RADIUS_FACTOR: f64 = 4.0;

/// State change decided by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "socket", rename_all = "lowercase")]
pub enum Transition {
    /// Unconnected plug started tracking a socket
    Paired(SocketId),
    /// Paired plug was pulled away
    Released(SocketId),
    /// Paired plug reached the socket base
    Seated(SocketId),
}

impl Transition {
    pub fn socket(&self) -> SocketId {
        match self {
            Transition::Paired(s) | Transition::Released(s) | Transition::Seated(s) => *s,
        }
    }
}

/// Why a socket turned a candidate down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Plug is alongside the socket rather than at its mouth
    ApproachExclusion,
    /// Plug is farther than the capture radius from the socket mouth
    OutOfReach,
    /// A prerequisite socket is not connected yet
    DependentsUnmet,
    /// Plug axis is tilted beyond the axial tolerance
    AxialTolerance,
    /// Plug X axis is twisted beyond the radial tolerance
    RadialTolerance,
    /// Paired plug moved back out past the socket mouth
    SlidOut,
    /// Socket is held by another plug
    Occupied,
}

impl Rejection {
    /// Rejections the user should see as a warning highlight
    pub fn is_displayed(&self) -> bool {
        matches!(
            self,
            Rejection::ApproachExclusion
                | Rejection::DependentsUnmet
                | Rejection::AxialTolerance
                | Rejection::RadialTolerance
        )
    }
}

/// Result of testing one socket against a candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SocketFit {
    Rejected(Rejection),
    /// Acceptable; carries the corrected transform
    Tracking(Xfo),
    /// Fully seated; carries the socket-aligned transform
    Seated(Xfo),
}

impl SocketFit {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, SocketFit::Rejected(_))
    }
}

/// Everything the engine decided for one evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockingOutcome {
    pub xfo: Xfo,
    pub transition: Option<Transition>,
    pub feedback: Option<Feedback>,
}

impl DockingOutcome {
    fn pass_through(xfo: Xfo) -> Self {
        Self {
            xfo,
            transition: None,
            feedback: None,
        }
    }
}

/// Test a candidate transform against one socket.
///
/// `paired` selects between the tracking test (plug already following this
/// socket) and the search test.
pub fn test_socket(
    socket: &Socket,
    dependents_plugged: bool,
    candidate: &Xfo,
    paired: bool,
) -> SocketFit {
    let socket_xfo = socket.xfo();
    let params = socket.params();
    let radius = params.radius;
    let slide_dist = params.slide_dist;

    let mut socket_axis = socket.axis();
    let end_point = socket.end_point();
    let plug_offset = candidate.translation - socket_xfo.translation;
    let plug_slide_dist = plug_offset.dot(socket_axis);
    let projected_pos = socket_xfo.translation + socket_axis * plug_slide_dist;

    let mut xfo = *candidate;

    if paired {
        if plug_slide_dist > slide_dist && projected_pos.distance(end_point) > radius {
            return SocketFit::Rejected(Rejection::SlidOut);
        }
        xfo.translation = projected_pos;
    } else {
        let dist_to_axis = (plug_offset - socket_axis * plug_slide_dist).length();
        if plug_slide_dist > -radius
            && plug_slide_dist < slide_dist
            && dist_to_axis < radius * EXCLUSION_RADIUS_FACTOR
        {
            return SocketFit::Rejected(Rejection::ApproachExclusion);
        }
        if candidate.translation.distance(end_point) > radius {
            return SocketFit::Rejected(Rejection::OutOfReach);
        }
        if !dependents_plugged {
            return SocketFit::Rejected(Rejection::DependentsUnmet);
        }
    }

    let plug_axis = xfo.z_axis();
    let mut axial_offset = angle_between(socket_axis, plug_axis);
    if params.axial_flip && axial_offset > FRAC_PI_2 {
        // offset goes negative: any reversed approach passes the tolerance
        axial_offset -= PI;
        socket_axis = -socket_axis;
    }

    if paired {
        let align = DQuat::from_rotation_arc(plug_axis.normalize(), socket_axis.normalize());
        xfo.rotation = (align * xfo.rotation).normalize();
    } else if axial_offset > params.axial_constraint {
        return SocketFit::Rejected(Rejection::AxialTolerance);
    }

    let radial_offset = angle_between(socket_xfo.x_axis(), xfo.x_axis());
    if radial_offset > params.radial_constraint {
        return SocketFit::Rejected(Rejection::RadialTolerance);
    }

    if paired && plug_slide_dist < radius {
        xfo.translation = socket_xfo.translation;
        xfo.rotation = socket_xfo.rotation;
        return SocketFit::Seated(xfo);
    }

    SocketFit::Tracking(xfo)
}

/// Decide the corrected transform and state change for `plug`.
///
/// Unknown plugs and disabled plugs pass the candidate through.
pub fn dock(assembly: &Assembly, plug_id: PlugId, candidate: Xfo) -> DockingOutcome {
    let Some(plug) = assembly.plug(plug_id) else {
        return DockingOutcome::pass_through(candidate);
    };

    match plug.state() {
        PlugState::Disabled => DockingOutcome::pass_through(candidate),
        PlugState::Connected(socket_id) => {
            let xfo = assembly
                .socket(socket_id)
                .map(|s| *s.xfo())
                .unwrap_or(candidate);
            DockingOutcome::pass_through(xfo)
        }
        PlugState::Paired(socket_id) => {
            let Some(socket) = assembly.socket(socket_id) else {
                return DockingOutcome::pass_through(candidate);
            };
            let plugged = assembly.are_dependent_sockets_plugged(socket_id);
            match test_socket(socket, plugged, &candidate, true) {
                SocketFit::Tracking(xfo) => DockingOutcome::pass_through(xfo),
                SocketFit::Seated(xfo) => DockingOutcome {
                    xfo,
                    transition: Some(Transition::Seated(socket_id)),
                    feedback: Some(Feedback::Highlight(HighlightRequest::seated())),
                },
                SocketFit::Rejected(reason) => {
                    debug!(plug = %plug.name(), socket = %socket.name(), ?reason, "Paired plug released");
                    DockingOutcome {
                        xfo: candidate,
                        transition: Some(Transition::Released(socket_id)),
                        feedback: Some(Feedback::ClearHighlight),
                    }
                }
            }
        }
        PlugState::Unconnected => {
            let mut display_error = false;
            let mut found = None;

            for &socket_id in plug.sockets() {
                let Some(socket) = assembly.socket(socket_id) else {
                    continue;
                };
                let fit = match socket.connected_plug() {
                    Some(other) if other != plug_id => SocketFit::Rejected(Rejection::Occupied),
                    _ => test_socket(
                        socket,
                        assembly.are_dependent_sockets_plugged(socket_id),
                        &candidate,
                        false,
                    ),
                };
                match fit {
                    SocketFit::Rejected(reason) => {
                        if reason.is_displayed() {
                            debug!(plug = %plug.name(), socket = %socket.name(), ?reason, "Socket rejected plug");
                        }
                        display_error |= reason.is_displayed();
                    }
                    SocketFit::Tracking(_) | SocketFit::Seated(_) => {
                        found = Some(socket_id);
                        break;
                    }
                }
            }

            match found {
                Some(socket_id) => DockingOutcome {
                    xfo: candidate,
                    transition: Some(Transition::Paired(socket_id)),
                    feedback: Some(Feedback::Highlight(HighlightRequest::paired())),
                },
                None if display_error => DockingOutcome {
                    xfo: candidate,
                    transition: None,
                    feedback: Some(Feedback::Highlight(HighlightRequest::error())),
                },
                None => DockingOutcome::pass_through(candidate),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::{ConnectionMode, SocketParams};
    use bevy_math::DVec3;

    /// Socket at the origin along +Z with r = 0.25, d = 1.0
    fn bore() -> Socket {
        bore_with(SocketParams::new(0.25, 1.0))
    }

    fn bore_with(params: SocketParams) -> Socket {
        Socket::new(SocketId(0), "bore".to_string(), params, Xfo::IDENTITY)
    }

    fn at(x: f64, y: f64, z: f64) -> Xfo {
        Xfo::from_translation(DVec3::new(x, y, z))
    }

    #[test]
    fn test_capture_boundary() {
        let socket = bore();
        assert!(test_socket(&socket, true, &at(0.0, 0.0, 1.25), false).is_accepted());
        assert_eq!(
            test_socket(&socket, true, &at(0.0, 0.0, 1.25 + 1e-9), false),
            SocketFit::Rejected(Rejection::OutOfReach)
        );
    }

    #[test]
    fn test_exclusion_zone() {
        let socket = bore();
        // within reach of the mouth but alongside the socket body
        let candidate = at(0.1, 0.0, 0.9);
        assert!(candidate.translation.distance(socket.end_point()) < 0.25);
        let fit = test_socket(&socket, true, &candidate, false);
        assert_eq!(fit, SocketFit::Rejected(Rejection::ApproachExclusion));
        assert!(Rejection::ApproachExclusion.is_displayed());

        // same depth, lateral distance beyond 4r: out of the zone, out of reach
        let fit = test_socket(&socket, true, &at(1.0, 0.0, 0.9), false);
        assert_eq!(fit, SocketFit::Rejected(Rejection::OutOfReach));
    }

    #[test]
    fn test_dependents_unmet() {
        let socket = bore();
        let fit = test_socket(&socket, false, &at(0.0, 0.0, 1.1), false);
        assert_eq!(fit, SocketFit::Rejected(Rejection::DependentsUnmet));
    }

    #[test]
    fn test_axial_tolerance_and_flip() {
        let socket = bore();
        let mut tilted = at(0.0, 0.0, 1.1);
        tilted.rotation = DQuat::from_rotation_x(PI * 0.3);
        assert_eq!(
            test_socket(&socket, true, &tilted, false),
            SocketFit::Rejected(Rejection::AxialTolerance)
        );

        // upside down plug is accepted through the flip
        let mut flipped = at(0.0, 0.0, 1.1);
        flipped.rotation = DQuat::from_rotation_x(PI);
        assert!(test_socket(&socket, true, &flipped, false).is_accepted());

        // past 90° the flip always accepts, even when tilted off the reversed axis
        flipped.rotation = DQuat::from_rotation_x(PI * 0.7);
        assert!(test_socket(&socket, true, &flipped, false).is_accepted());
    }

    #[test]
    fn test_flipped_plug_is_guided_onto_reversed_axis() {
        let socket = bore();
        let mut flipped = at(0.1, 0.0, 0.6);
        flipped.rotation = DQuat::from_rotation_x(PI * 0.7);
        let SocketFit::Tracking(xfo) = test_socket(&socket, true, &flipped, true) else {
            panic!("flipped plug should keep tracking");
        };
        assert!(xfo.z_axis().distance(DVec3::NEG_Z) < 1e-9);
        assert!(xfo.translation.distance(DVec3::new(0.0, 0.0, 0.6)) < 1e-12);
    }

    #[test]
    fn test_no_flip_rejects_reverse_approach() {
        let socket = bore_with(SocketParams::new(0.25, 1.0).with_axial_flip(false));
        let mut flipped = at(0.0, 0.0, 1.1);
        flipped.rotation = DQuat::from_rotation_x(PI);
        assert_eq!(
            test_socket(&socket, true, &flipped, false),
            SocketFit::Rejected(Rejection::AxialTolerance)
        );
    }

    #[test]
    fn test_radial_tolerance() {
        let socket = bore_with(SocketParams::new(0.25, 1.0).with_radial_constraint(0.1));
        let mut twisted = at(0.0, 0.0, 1.1);
        twisted.rotation = DQuat::from_rotation_z(0.5);
        assert_eq!(
            test_socket(&socket, true, &twisted, false),
            SocketFit::Rejected(Rejection::RadialTolerance)
        );
        twisted.rotation = DQuat::from_rotation_z(0.05);
        assert!(test_socket(&socket, true, &twisted, false).is_accepted());
    }

    #[test]
    fn test_paired_snaps_to_axis_and_aligns() {
        let socket = bore();
        let mut candidate = at(0.1, -0.05, 0.5);
        candidate.rotation = DQuat::from_rotation_y(0.4);

        let SocketFit::Tracking(xfo) = test_socket(&socket, true, &candidate, true) else {
            panic!("expected tracking fit");
        };
        assert!(xfo.translation.distance(DVec3::new(0.0, 0.0, 0.5)) < 1e-12);
        assert!(xfo.z_axis().distance(DVec3::Z) < 1e-9);
    }

    #[test]
    fn test_paired_slid_out() {
        let socket = bore();
        assert!(test_socket(&socket, true, &at(0.0, 0.0, 1.2), true).is_accepted());
        assert_eq!(
            test_socket(&socket, true, &at(0.0, 0.0, 1.3), true),
            SocketFit::Rejected(Rejection::SlidOut)
        );
    }

    #[test]
    fn test_paired_seats_below_radius() {
        let socket = bore();
        let mut candidate = at(0.02, 0.0, 0.2);
        candidate.scale = DVec3::splat(2.0);
        let SocketFit::Seated(xfo) = test_socket(&socket, true, &candidate, true) else {
            panic!("expected seated fit");
        };
        assert_eq!(xfo.translation, DVec3::ZERO);
        assert_eq!(xfo.rotation, socket.xfo().rotation);
        assert_eq!(xfo.scale, DVec3::splat(2.0));
    }

    #[test]
    fn test_socket_mode_untouched_by_test() {
        let socket = bore();
        test_socket(&socket, true, &at(0.0, 0.0, 0.1), true);
        assert_eq!(socket.connected_plug_mode(), ConnectionMode::Unconnected);
    }
}
