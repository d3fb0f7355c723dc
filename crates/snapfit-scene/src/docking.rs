//! Systems that feed plug drags to the docking engine and carry out its results

use bevy::prelude::*;
use snapfit_core::feedback::{Feedback, HighlightRequest, HOVER_COLOR};
use tracing::{debug, info};

use crate::types::*;

/// Run the docking engine for every drag received this frame
pub fn apply_drags(
    mut drags: MessageReader<DragPlug>,
    mut assembly: ResMut<AssemblyResource>,
    mut plugs: Query<(&PlugEntity, &mut PlugHighlight)>,
    mut plugged: MessageWriter<SocketPlugged>,
) {
    for drag in drags.read() {
        let Ok((plug, mut highlight)) = plugs.get_mut(drag.plug) else {
            debug!("Ignoring drag for non-plug entity {:?}", drag.plug);
            continue;
        };

        let report = assembly.clean_global_xfo(plug.plug, transform_to_xfo(&drag.candidate));

        if let Some(feedback) = report.feedback {
            highlight.apply(feedback);
        }
        if let Some(event) = report.plugged {
            plugged.write(SocketPlugged {
                socket: event.socket,
                plug: event.plug,
                plug_entity: drag.plug,
            });
        }
    }
}

/// Show the hover highlight on plugs that are not highlighted for another reason
pub fn apply_hover(mut hovers: MessageReader<PlugHover>, mut plugs: Query<&mut PlugHighlight>) {
    for hover in hovers.read() {
        let Ok(mut highlight) = plugs.get_mut(hover.plug) else {
            continue;
        };
        let showing_hover = highlight.current().is_some_and(|h| h.color == HOVER_COLOR);
        if hover.hovered && !highlight.is_enabled() {
            highlight.apply(Feedback::Highlight(HighlightRequest::hover()));
        } else if !hover.hovered && showing_hover {
            highlight.apply(Feedback::ClearHighlight);
        }
    }
}

/// Count seated plugs and start the completion sequence after the last one
pub fn track_completion(
    mut plugged: MessageReader<SocketPlugged>,
    mut tracker: ResMut<SeatingTracker>,
    settings: Res<RevealSettings>,
    mut cutaway: ResMut<CutawayPlane>,
    mut highlights: Query<&mut PlugHighlight>,
    mut completed: MessageWriter<AssemblyCompleted>,
) {
    for event in plugged.read() {
        if !tracker.on_plugged(&snapfit_core::Plugged {
            socket: event.socket,
            plug: event.plug,
        }) {
            continue;
        }

        info!(seated = tracker.total(), "Assembly complete");
        for mut highlight in highlights.iter_mut() {
            highlight.apply(Feedback::Highlight(HighlightRequest::seated()));
        }
        if settings.enabled {
            cutaway.start_reveal();
        }
        completed.write(AssemblyCompleted);
    }
}

/// Copy corrected transforms from the registry onto plug and socket entities
pub fn sync_transforms(
    assembly: Res<AssemblyResource>,
    mut plugs: Query<(&PlugEntity, &mut Transform), Without<SocketEntity>>,
    mut sockets: Query<(&SocketEntity, &mut Transform), Without<PlugEntity>>,
) {
    if !assembly.is_changed() {
        return;
    }
    for (plug, mut transform) in plugs.iter_mut() {
        if let Some(p) = assembly.plug(plug.plug) {
            *transform = xfo_to_transform(p.xfo());
        }
    }
    for (socket, mut transform) in sockets.iter_mut() {
        if let Some(s) = assembly.socket(socket.socket) {
            *transform = xfo_to_transform(s.xfo());
        }
    }
}

/// Expire timed highlights
pub fn tick_highlights(time: Res<Time>, mut highlights: Query<&mut PlugHighlight>) {
    let delta = time.delta();
    for mut highlight in highlights.iter_mut() {
        if highlight.current().is_some() {
            highlight.tick(delta);
        }
    }
}

/// Advance the running cutaway reveal
pub fn advance_reveal(time: Res<Time>, mut cutaway: ResMut<CutawayPlane>) {
    let cutaway = &mut *cutaway;
    let Some(reveal) = cutaway.reveal.as_mut() else {
        return;
    };
    if let Some(distance) = reveal.tick(time.delta()) {
        cutaway.distance = distance as f32;
    }
    if reveal.is_finished() {
        info!("Cutaway reveal finished");
        cutaway.reveal = None;
    }
}
