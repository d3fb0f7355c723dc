//! Entity creation for an assembly loaded into the world

use bevy::prelude::*;
use tracing::info;

use crate::types::*;

/// Spawn one entity per plug and socket of the [`AssemblyResource`] and start
/// tracking seating progress for its active plugs.
pub fn spawn_assembly(
    mut commands: Commands,
    assembly: Res<AssemblyResource>,
    mut tracker: ResMut<SeatingTracker>,
) {
    for socket in assembly.sockets() {
        commands.spawn((
            Name::new(socket.name().to_string()),
            SocketEntity { socket: socket.id() },
            xfo_to_transform(socket.xfo()),
        ));
    }

    for plug in assembly.plugs() {
        commands.spawn((
            Name::new(plug.name().to_string()),
            PlugEntity { plug: plug.id() },
            PlugHighlight::default(),
            xfo_to_transform(plug.xfo()),
        ));
    }

    tracker.0 = snapfit_core::SeatingProgress::for_active_plugs(&assembly);
    info!(
        assembly = %assembly.name(),
        plugs = assembly.plugs().len(),
        tracked = tracker.total(),
        "Assembly spawned"
    );
}
