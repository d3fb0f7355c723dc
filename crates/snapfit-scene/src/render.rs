//! Material highlighting for plug meshes

use bevy::color::LinearRgba;
use bevy::prelude::*;
use std::collections::HashMap;

use crate::types::PlugHighlight;

/// Original material properties to restore when a highlight is cleared
#[derive(Clone)]
struct OriginalMaterialProps {
    base_color: Color,
    emissive: LinearRgba,
}

/// Plugin that renders [`PlugHighlight`] state onto plug materials
pub struct SnapfitRenderPlugin;

impl Plugin for SnapfitRenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            update_plug_highlighting.after(crate::docking::tick_highlights),
        );
    }
}

/// Tint each highlighted plug with the requested color.
///
/// Each plug owns a clone of its material, created on first use.
fn update_plug_highlighting(
    mut commands: Commands,
    plugs: Query<
        (Entity, &PlugHighlight, &MeshMaterial3d<StandardMaterial>),
        Changed<PlugHighlight>,
    >,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut plug_materials: Local<HashMap<Entity, (Handle<StandardMaterial>, OriginalMaterialProps)>>,
) {
    for (entity, highlight, material_handle) in plugs.iter() {
        let (own_material_handle, original_props) =
            plug_materials.entry(entity).or_insert_with(|| {
                if let Some(original_material) = materials.get(&material_handle.0).cloned() {
                    let props = OriginalMaterialProps {
                        base_color: original_material.base_color,
                        emissive: original_material.emissive,
                    };
                    let handle = materials.add(original_material);
                    commands.entity(entity).insert(MeshMaterial3d(handle.clone()));
                    (handle, props)
                } else {
                    let props = OriginalMaterialProps {
                        base_color: Color::srgba(0.5, 0.5, 0.5, 1.0),
                        emissive: LinearRgba::new(0.0, 0.0, 0.0, 1.0),
                    };
                    (material_handle.0.clone(), props)
                }
            });

        let Some(material) = materials.get_mut(own_material_handle) else {
            continue;
        };
        match highlight.current() {
            Some(request) => {
                let c = request.color;
                let base = original_props.base_color.to_linear();
                let fill = request.fill.clamp(0.0, 1.0);
                material.base_color = Color::LinearRgba(LinearRgba::new(
                    base.red + (c.r - base.red) * fill,
                    base.green + (c.g - base.green) * fill,
                    base.blue + (c.b - base.blue) * fill,
                    base.alpha,
                ));
                material.emissive = LinearRgba::new(c.r * 0.3, c.g * 0.3, c.b * 0.3, 1.0);
            }
            None => {
                material.base_color = original_props.base_color;
                material.emissive = original_props.emissive;
            }
        }
    }
}
