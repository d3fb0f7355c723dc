//! Snapfit Scene - Bevy adapter for the docking engine
//!
//! This crate wires [`snapfit_core`] into a Bevy app:
//! - plug and socket entities spawned from an [`AssemblyResource`]
//! - [`DragPlug`] messages evaluated by the docking engine, corrected
//!   transforms written back to the entities
//! - highlight feedback with auto-clear, hover highlighting
//! - [`SocketPlugged`] / [`AssemblyCompleted`] messages and the cutaway reveal
//!
//! [`SnapfitPlugin`] only needs [`MinimalPlugins`]; [`SnapfitRenderPlugin`]
//! adds material tinting and requires the PBR plugins.

pub mod docking;
pub mod render;
pub mod spawn;
pub mod types;

use bevy::prelude::*;

/// Plugin that runs docking for plug entities
pub struct SnapfitPlugin;

impl Plugin for SnapfitPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<DragPlug>()
            .add_message::<PlugHover>()
            .add_message::<SocketPlugged>()
            .add_message::<AssemblyCompleted>()
            .init_resource::<SeatingTracker>()
            .init_resource::<RevealSettings>()
            .init_resource::<CutawayPlane>()
            .add_systems(
                Startup,
                spawn::spawn_assembly.run_if(resource_exists::<AssemblyResource>),
            )
            .add_systems(
                Update,
                (
                    docking::apply_hover,
                    docking::apply_drags,
                    docking::track_completion,
                    docking::sync_transforms,
                    docking::tick_highlights,
                    docking::advance_reveal,
                )
                    .chain()
                    .run_if(resource_exists::<AssemblyResource>),
            );
    }
}

// Re-export commonly used types
pub use render::SnapfitRenderPlugin;
pub use types::*;
