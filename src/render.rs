//! Drawing a [`Scene`] with instanced draw calls.
//!
//! Every frame the scene graph is flattened into [`Batch`]es: all drawable
//! nodes that share a geometry and a material become instances of one draw.
//! Opaque batches come first, transparent ones after them so that blending
//! sees what is behind.
//!
//! GPU copies of library entries are created lazily the first time a batch
//! needs them. Materials are compared against their cached copy every frame,
//! so a texture attached by a finished load shows up in the next frame.

use std::collections::{BTreeMap, HashMap};

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        model::{GeometryId, Library, Material, MaterialId, MeshData, TextureId},
        scene_graph::Scene,
        texture::Texture,
        transform::InstanceRaw,
    },
    pipelines::basic::{MaterialUniform, mk_basic_pipeline, mk_material_layout, mk_transparent_pipeline},
};

/// All instances of one (geometry, material) pair.
#[derive(Debug)]
pub struct Batch {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub transparent: bool,
    pub instances: Vec<InstanceRaw>,
}

/**
 * Groups the drawable nodes of `scene` by geometry and material.
 *
 * Nodes referring to unknown library entries are skipped. Batches are ordered
 * opaque first, then by geometry and material ids, which keeps the draw order
 * stable across frames.
 */
pub fn batch(scene: &Scene) -> Vec<Batch> {
    let mut groups: BTreeMap<(bool, GeometryId, MaterialId), Vec<InstanceRaw>> = BTreeMap::new();
    for (id, world) in scene.graph.world_matrices() {
        let Some(node) = scene.graph.node(id) else {
            continue;
        };
        let (Some(geometry), Some(material)) = (node.geometry, node.material) else {
            continue;
        };
        let Some(transparent) = scene.library.material(material).map(|m| m.transparent) else {
            continue;
        };
        if scene.library.geometry(geometry).is_none() {
            continue;
        }
        groups
            .entry((transparent, geometry, material))
            .or_default()
            .push(InstanceRaw::from_matrix(world));
    }
    groups
        .into_iter()
        .map(|((transparent, geometry, material), instances)| Batch {
            geometry,
            material,
            transparent,
            instances,
        })
        .collect()
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_elements: u32,
}

impl GpuMesh {
    fn new(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            num_elements: mesh.indices.len() as u32,
        }
    }
}

struct GpuMaterial {
    /// Library state this bind group was built from.
    source: Material,
    bind_group: wgpu::BindGroup,
}

/// Owns the pipelines and GPU copies of the library.
pub struct Renderer {
    basic: wgpu::RenderPipeline,
    transparent: wgpu::RenderPipeline,
    material_layout: wgpu::BindGroupLayout,
    white: Texture,
    meshes: HashMap<GeometryId, GpuMesh>,
    textures: HashMap<TextureId, Texture>,
    materials: HashMap<MaterialId, GpuMaterial>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("meshes", &self.meshes.len())
            .field("textures", &self.textures.len())
            .field("materials", &self.materials.len())
            .field("instance_capacity", &self.instance_capacity)
            .finish()
    }
}

const INITIAL_INSTANCE_CAPACITY: usize = 256;

fn mk_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let material_layout = mk_material_layout(device);
        let basic = mk_basic_pipeline(
            device,
            config,
            &material_layout,
            camera_bind_group_layout,
            light_bind_group_layout,
        );
        let transparent = mk_transparent_pipeline(
            device,
            config,
            &material_layout,
            camera_bind_group_layout,
            light_bind_group_layout,
        );
        Self {
            basic,
            transparent,
            material_layout,
            white: Texture::create_white(device, queue),
            meshes: HashMap::new(),
            textures: HashMap::new(),
            materials: HashMap::new(),
            instance_buffer: mk_instance_buffer(device, INITIAL_INSTANCE_CAPACITY),
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
        }
    }

    /**
     * Uploads whatever `batches` need and is not on the GPU yet, then writes
     * all instances into the shared instance buffer.
     *
     * Returns the instance range of every batch inside that buffer.
     */
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        library: &Library,
        batches: &[Batch],
    ) -> Vec<std::ops::Range<u32>> {
        for batch in batches {
            if !self.meshes.contains_key(&batch.geometry) {
                if let Some(mesh) = library.geometry(batch.geometry) {
                    let label = format!("{:?}", batch.geometry);
                    self.meshes.insert(batch.geometry, GpuMesh::new(device, mesh, &label));
                }
            }
            if let Some(material) = library.material(batch.material) {
                self.ensure_material(device, queue, library, batch.material, material);
            }
        }

        let instances: Vec<InstanceRaw> = batches
            .iter()
            .flat_map(|batch| batch.instances.iter().copied())
            .collect();
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = mk_instance_buffer(device, self.instance_capacity);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut start = 0u32;
        batches
            .iter()
            .map(|batch| {
                let end = start + batch.instances.len() as u32;
                let range = start..end;
                start = end;
                range
            })
            .collect()
    }

    fn ensure_material(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        library: &Library,
        id: MaterialId,
        material: &Material,
    ) {
        if self
            .materials
            .get(&id)
            .is_some_and(|cached| cached.source == *material)
        {
            return;
        }

        if let Some(texture_id) = material.texture {
            if !self.textures.contains_key(&texture_id) {
                if let Some(img) = library.texture(texture_id) {
                    match Texture::try_from_image(device, queue, img, Some(&material.name)) {
                        Ok(texture) => {
                            self.textures.insert(texture_id, texture);
                        }
                        Err(e) => log::warn!("Drawing {} without its texture: {}", material.name, e),
                    }
                }
            }
        }
        let texture = material
            .texture
            .and_then(|texture_id| self.textures.get(&texture_id))
            .unwrap_or(&self.white);

        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Buffer"),
            contents: bytemuck::cast_slice(&[MaterialUniform::new(material)]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
            label: Some(&material.name),
        });
        log::debug!("(Re)built bind group of material {}", material.name);
        self.materials.insert(
            id,
            GpuMaterial {
                source: material.clone(),
                bind_group,
            },
        );
    }

    /// Records one draw per batch. `ranges` comes from [`Renderer::prepare`].
    pub fn draw<'pass>(
        &self,
        render_pass: &mut wgpu::RenderPass<'pass>,
        batches: &[Batch],
        ranges: &[std::ops::Range<u32>],
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    ) {
        let mut current_transparent = None;
        for (batch, range) in batches.iter().zip(ranges) {
            let (Some(mesh), Some(material)) = (
                self.meshes.get(&batch.geometry),
                self.materials.get(&batch.material),
            ) else {
                continue;
            };
            if range.is_empty() {
                continue;
            }
            if current_transparent != Some(batch.transparent) {
                render_pass.set_pipeline(if batch.transparent {
                    &self.transparent
                } else {
                    &self.basic
                });
                render_pass.set_bind_group(1, camera_bind_group, &[]);
                render_pass.set_bind_group(2, light_bind_group, &[]);
                render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                current_transparent = Some(batch.transparent);
            }
            render_pass.set_bind_group(0, &material.bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.num_elements, 0, range.clone());
        }
    }
}
