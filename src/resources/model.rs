//! Textured model loading from an obj geometry file and its mtl material file.
//!
//! Loading runs in two stages. The material definition (and the diffuse
//! textures it names) is decoded first; only when that succeeds is the
//! geometry fetched and decoded against those materials.

use std::{
    io::{BufReader, Cursor},
    rc::Rc,
};

use image::RgbaImage;

use crate::{
    data_structures::model::MeshData,
    resources::{
        LoadFailure, fetch, mesh,
        source::{AssetSource, sibling},
        texture::decode_texture,
    },
};

#[derive(Clone, Debug)]
pub struct ModelMaterial {
    pub name: String,
    pub color: [f32; 3],
    pub opacity: f32,
    pub texture: Option<RgbaImage>,
}

#[derive(Clone, Debug)]
pub struct ModelMesh {
    pub name: String,
    pub mesh: MeshData,
    /// Index into [`ModelAsset::materials`].
    pub material: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct ModelAsset {
    pub meshes: Vec<ModelMesh>,
    pub materials: Vec<ModelMaterial>,
}

pub(crate) async fn load_model(
    source: Rc<dyn AssetSource>,
    geometry_path: String,
    material_path: String,
) -> Result<ModelAsset, LoadFailure> {
    // Stage 1: material definition
    let mtl_bytes = fetch(&*source, &material_path).await?;
    let (obj_materials, names) =
        tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mtl_bytes)))
            .map_err(|e| LoadFailure::malformed(&material_path, e))?;

    let mut materials = Vec::with_capacity(obj_materials.len());
    for m in &obj_materials {
        let texture = match &m.diffuse_texture {
            Some(file_name) => {
                let path = sibling(&material_path, file_name);
                let decoded = match fetch(&*source, &path).await {
                    Ok(bytes) => decode_texture(&path, &bytes),
                    Err(e) => Err(e),
                };
                match decoded {
                    Ok(img) => Some(img),
                    Err(e) => {
                        log::warn!("Material {} falls back to its flat colour: {}", m.name, e);
                        None
                    }
                }
            }
            None => None,
        };
        materials.push(ModelMaterial {
            name: m.name.clone(),
            color: m.diffuse.unwrap_or([1.0, 1.0, 1.0]),
            opacity: m.dissolve.unwrap_or(1.0),
            texture,
        });
    }

    // Stage 2: geometry, resolved against the already decoded materials
    let obj_bytes = fetch(&*source, &geometry_path).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_bytes));
    let (models, _) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        move |_| {
            let decoded = (obj_materials.clone(), names.clone());
            async move { Ok(decoded) }
        },
    )
    .await
    .map_err(|e| LoadFailure::malformed(&geometry_path, e))?;

    let meshes: Vec<ModelMesh> = mesh::to_meshes(&models)
        .into_iter()
        .map(|(name, mesh, material)| ModelMesh {
            name,
            mesh,
            material: material.filter(|&idx| idx < materials.len()),
        })
        .collect();
    if meshes.is_empty() {
        return Err(LoadFailure::malformed(&geometry_path, "no triangles"));
    }

    Ok(ModelAsset { meshes, materials })
}
