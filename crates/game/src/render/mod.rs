//! Rendering: the instanced scene pass followed by the overlay.

mod overlay;

use anyhow::Result;
use engine_core::{Hidden, MeshInstance, Pose, Tint};
use physics::PhysicsBody;
use renderer::{DrawBatch, InstanceData};
use std::collections::BTreeMap;

use crate::GameState;

/// Run all render passes. Called from `GameState::render()`.
pub fn run(state: &mut GameState) -> Result<()> {
    let (output, mut encoder) = match state.renderer.begin_frame() {
        Ok(frame) => frame,
        Err(e) => {
            if let Some(surface_err) = e.downcast_ref::<wgpu::SurfaceError>() {
                if matches!(surface_err, wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) {
                    log::debug!("Surface {:?}, reconfiguring", surface_err);
                    state.renderer.reconfigure();
                    return Ok(());
                }
            }
            return Err(e);
        }
    };
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    state.renderer.update_camera(&state.viewer.camera);

    let instances = collect_instances(state);
    let batches: Vec<DrawBatch<'_>> = instances
        .iter()
        .filter_map(|(mesh_id, instances)| {
            let mesh = state.meshes.get(*mesh_id);
            if mesh.is_none() {
                log::warn!("No mesh uploaded for id {}", mesh_id);
            }
            mesh.map(|mesh| DrawBatch { mesh, instances })
        })
        .collect();
    state.renderer.render_scene(&mut encoder, &view, &batches);

    let (sw, sh) = state.renderer.dimensions();
    let ob = overlay::build(state, sw as f32, sh as f32);
    state
        .renderer
        .render_overlay(&mut encoder, &view, &ob.vertices, &ob.indices);

    state.renderer.end_frame(output, encoder);
    Ok(())
}

/// Visible instances grouped by mesh. Authored poses win; bodies without
/// one are drawn at their interpolated physics pose.
fn collect_instances(state: &GameState) -> BTreeMap<u32, Vec<InstanceData>> {
    let alpha = state.time.interpolation_alpha();
    let mut by_mesh: BTreeMap<u32, Vec<InstanceData>> = BTreeMap::new();

    let mut query = state
        .world
        .query::<(&MeshInstance, &Tint, Option<&Pose>, Option<&PhysicsBody>)>()
        .without::<&Hidden>();
    for (_, (mesh, tint, pose, body)) in query.iter() {
        let pose: Option<Pose> = match (pose, body) {
            (Some(pose), _) => Some(*pose),
            (None, Some(body)) => state.physics.render_pose(body.rigid_body, alpha),
            (None, None) => None,
        };
        let Some(pose) = pose else {
            continue;
        };
        let model = pose.to_matrix(mesh.scale);
        by_mesh
            .entry(mesh.mesh_id)
            .or_default()
            .push(InstanceData::new(model.to_cols_array_2d(), tint.base).with_emission(tint.emission));
    }
    by_mesh
}
