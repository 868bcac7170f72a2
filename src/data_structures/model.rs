//! CPU-side geometry, materials and the asset library.
//!
//! Nodes never own their geometry or material. They reference entries of the
//! [`Library`] through small copyable handles, which lets the renderer batch
//! every node that shares a (geometry, material) pair into one instanced draw
//! and lets asynchronous loads attach textures to materials after the fact.

use cgmath::InnerSpace;
use image::RgbaImage;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl ModelVertex {
    pub fn new(position: [f32; 3], tex_coords: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position,
            tex_coords,
            normal,
        }
    }
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Indexed triangle list ready to be uploaded into vertex/index buffers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Appends `other`, rebasing its indices onto the current vertex count.
    pub fn append(&mut self, other: MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }

    /**
     * Obj files may come without normals. Accumulates face normals per vertex
     * and normalises them so lighting still works on such meshes.
     */
    pub fn compute_smooth_normals(&mut self) {
        let mut normals = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); self.vertices.len()];
        for c in self.indices.chunks_exact(3) {
            let p0: cgmath::Vector3<f32> = self.vertices[c[0] as usize].position.into();
            let p1: cgmath::Vector3<f32> = self.vertices[c[1] as usize].position.into();
            let p2: cgmath::Vector3<f32> = self.vertices[c[2] as usize].position.into();
            // Unnormalised on purpose: larger faces weigh more
            let face = (p1 - p0).cross(p2 - p0);
            for &i in c {
                normals[i as usize] += face;
            }
        }
        for (vertex, n) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = if n.magnitude2() > f32::EPSILON {
                n.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            };
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) usize);

/// How a material reacts to the scene light.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shading {
    /// Diffuse + ambient lighting from the scene light.
    Lit,
    /// Colour (and texture) as is, e.g. for the sky dome and text.
    Unlit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    /// Linear RGBA multiplier applied on top of the texture.
    pub color: [f32; 4],
    pub texture: Option<TextureId>,
    pub shading: Shading,
    /// Transparent materials are alpha blended and drawn after opaque ones.
    pub transparent: bool,
}

impl Material {
    pub fn lit(name: &str, color: [f32; 3]) -> Self {
        Self {
            name: name.to_string(),
            color: [color[0], color[1], color[2], 1.0],
            texture: None,
            shading: Shading::Lit,
            transparent: false,
        }
    }

    pub fn unlit(name: &str, color: [f32; 3]) -> Self {
        Self {
            shading: Shading::Unlit,
            ..Self::lit(name, color)
        }
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.color[3] = opacity;
        self.transparent = opacity < 1.0 || self.transparent;
        self
    }

    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }
}

/// Add-only registry of geometries, materials and decoded textures.
#[derive(Debug, Default)]
pub struct Library {
    geometries: Vec<MeshData>,
    materials: Vec<Material>,
    textures: Vec<RgbaImage>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&mut self, mesh: MeshData) -> GeometryId {
        self.geometries.push(mesh);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn add_texture(&mut self, image: RgbaImage) -> TextureId {
        self.textures.push(image);
        TextureId(self.textures.len() - 1)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&MeshData> {
        self.geometries.get(id.0)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    pub fn texture(&self, id: TextureId) -> Option<&RgbaImage> {
        self.textures.get(id.0)
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}
