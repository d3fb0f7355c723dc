//! Automatic assembly: drives every active plug into its home socket in
//! dependency order, the way a user would drag it

use snapfit_core::{Assembly, PlugId, PlugState, SocketId, Xfo};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::session::Session;

/// Active plugs ordered so that every socket's prerequisites are filled
/// before it
pub fn plan_order(assembly: &Assembly) -> Vec<PlugId> {
    let homes: HashMap<SocketId, PlugId> = assembly
        .plugs()
        .iter()
        .filter(|p| p.state() != PlugState::Disabled)
        .filter_map(|p| p.sockets().first().map(|s| (*s, p.id())))
        .collect();

    let mut order = Vec::with_capacity(homes.len());
    let mut done: HashSet<SocketId> = HashSet::new();

    for plug in assembly.plugs() {
        let Some(&home) = plug.sockets().first() else {
            continue;
        };
        if !homes.contains_key(&home) || done.contains(&home) {
            continue;
        }

        // iterative post-order walk over prerequisites
        let mut stack = vec![(home, false)];
        let mut entered: HashSet<SocketId> = HashSet::new();
        while let Some((socket, expanded)) = stack.pop() {
            if done.contains(&socket) {
                continue;
            }
            if expanded {
                done.insert(socket);
                if let Some(&plug) = homes.get(&socket) {
                    order.push(plug);
                }
                continue;
            }
            if !entered.insert(socket) {
                // already on the stack: a cycle, which descriptions reject
                continue;
            }
            stack.push((socket, true));
            if let Some(s) = assembly.socket(socket) {
                for dep in s.dependent_sockets().iter().rev() {
                    if !done.contains(dep) {
                        stack.push((*dep, false));
                    }
                }
            }
        }
    }
    order
}

fn state_of(session: &Session, plug: PlugId) -> PlugState {
    session
        .assembly()
        .plug(plug)
        .map(|p| p.state())
        .unwrap_or_default()
}

/// Drag one plug onto its home socket and slide it down to the base.
///
/// Returns whether the plug ended up seated.
pub fn seat_plug(session: &mut Session, plug: PlugId, config: &SimulationConfig) -> bool {
    let Some(p) = session.assembly().plug(plug) else {
        return false;
    };
    if p.state().is_connected() {
        return true;
    }
    let name = p.name().to_string();
    let start = *p.xfo();
    let Some(socket) = p.sockets().first().and_then(|s| session.assembly().socket(*s)) else {
        warn!(plug = %name, "Plug has no home socket");
        return false;
    };
    let home = socket.id();
    let socket_xfo = *socket.xfo();
    let axis = socket.axis();
    let radius = socket.params().radius;
    let slide_dist = socket.params().slide_dist;

    let at = |position| Xfo {
        translation: position,
        rotation: socket_xfo.rotation,
        scale: start.scale,
    };
    let staging = socket.end_point() + axis * (radius * 0.5);

    let approach_steps = config.approach_steps.max(1);
    for i in 1..=approach_steps {
        let t = f64::from(i) / f64::from(approach_steps);
        session.drag(plug, at(start.translation.lerp(staging, t)));
    }

    if let PlugState::Paired(other) = state_of(session, plug) {
        if other != home {
            debug!(plug = %name, "Picked up by another socket on the way, backing out");
            session.drag(plug, at(start.translation));
            session.drag(plug, at(staging));
        }
    }
    if state_of(session, plug) != PlugState::Paired(home) {
        warn!(plug = %name, state = state_of(session, plug).label(), "Plug did not pair with its socket");
        return false;
    }

    let seat_steps = config.seat_steps.max(1);
    let entry = slide_dist + radius * 0.5;
    for i in 0..=seat_steps {
        let depth = entry * (1.0 - f64::from(i) / f64::from(seat_steps));
        session.drag(plug, at(socket_xfo.translation + axis * depth));
    }

    let seated = state_of(session, plug).is_connected();
    if seated {
        debug!(plug = %name, "Plug seated");
    } else {
        warn!(plug = %name, "Plug did not seat");
    }
    seated
}

/// Seat every active plug; returns the number seated by this run
pub fn run_planner(session: &mut Session, config: &SimulationConfig) -> usize {
    let order = plan_order(session.assembly());
    info!(plugs = order.len(), "Planning assembly");

    let seated = order
        .into_iter()
        .filter(|plug| seat_plug(session, *plug, config))
        .count();

    if !session.assembly().is_complete() {
        warn!(
            seated = session.assembly().seated_count(),
            active = session.assembly().active_count(),
            "Assembly left incomplete"
        );
    }
    seated
}
