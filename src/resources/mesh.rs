use crate::data_structures::model::{MeshData, ModelVertex};

/**
 * Converts triangulated, single-indexed obj models into CPU meshes.
 *
 * Texture coordinates are flipped vertically because obj files put the origin
 * at the bottom left while wgpu samples from the top left. Models exported
 * without normals get smooth normals computed from their faces.
 */
pub fn to_meshes(models: &[tobj::Model]) -> Vec<(String, MeshData, Option<usize>)> {
    models
        .iter()
        .filter(|m| !m.mesh.indices.is_empty())
        .map(|m| {
            let vertices = (0..m.mesh.positions.len() / 3)
                .map(|i| {
                    ModelVertex::new(
                        [
                            m.mesh.positions[i * 3],
                            m.mesh.positions[i * 3 + 1],
                            m.mesh.positions[i * 3 + 2],
                        ],
                        [
                            m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                            1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                        ],
                        [
                            m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                            m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                            m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                        ],
                    )
                })
                .collect::<Vec<_>>();

            let mut mesh = MeshData {
                vertices,
                indices: m.mesh.indices.clone(),
            };
            if m.mesh.normals.is_empty() {
                mesh.compute_smooth_normals();
            }
            (m.name.clone(), mesh, m.mesh.material_id)
        })
        .collect()
}
