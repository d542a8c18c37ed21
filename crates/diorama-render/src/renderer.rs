//! Draws a [`Scene`] through the scene pipeline.
//!
//! Each frame the drawables are ordered (opaque in scene order, then blended
//! back to front), their meshes and maps are uploaded on first sight, and
//! one uniform slot per drawable is written into a dynamic-offset buffer.
//! GPU resources whose geometry or image no node in the scene references,
//! hidden nodes included, are dropped after the frame.

use std::sync::Arc;

use diorama_scene::{Camera, Color, Drawable, GeometryId, Scene, TextureId};
use glam::Vec3;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::buffer::{BufferAllocator, MeshBuffer};
use crate::depth::DepthBuffer;
use crate::gpu::{RenderContext, SurfaceError};
use crate::pass::{FrameEncoder, RenderPassBuilder, clear_color};
use crate::pipeline::{FrameUniform, ObjectUniform, PipelineKey, ScenePipeline};
use crate::texture::{ManagedTexture, TextureManager};

const INITIAL_OBJECT_CAPACITY: u64 = 128;

/// What one frame submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub triangles: u64,
}

struct DrawCall {
    geometry: GeometryId,
    texture: Arc<ManagedTexture>,
    key: PipelineKey,
    offset: u32,
}

pub struct SceneRenderer {
    pipeline: ScenePipeline,
    depth: DepthBuffer,
    textures: TextureManager,
    meshes: FxHashMap<GeometryId, MeshBuffer>,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_capacity: u64,
    object_stride: u64,
    staging: Vec<u8>,
}

impl SceneRenderer {
    pub fn new(ctx: &RenderContext) -> Self {
        let device = &ctx.device;
        let textures = TextureManager::new(device, &ctx.queue);
        let pipeline = ScenePipeline::new(device, ctx.surface_format, textures.bind_group_layout());
        let (width, height) = ctx.size();
        let depth = DepthBuffer::new(device, width, height);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame-uniform"),
            size: size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind-group"),
            layout: &pipeline.frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let object_stride = object_stride(device.limits().min_uniform_buffer_offset_alignment);
        let (object_buffer, object_bind_group) = create_object_buffer(
            device,
            &pipeline.object_layout,
            INITIAL_OBJECT_CAPACITY,
            object_stride,
        );

        Self {
            pipeline,
            depth,
            textures,
            meshes: FxHashMap::default(),
            frame_buffer,
            frame_bind_group,
            object_buffer,
            object_bind_group,
            object_capacity: INITIAL_OBJECT_CAPACITY,
            object_stride,
            staging: Vec::new(),
        }
    }

    /// Match the depth buffer to the surface after a resize.
    pub fn resize(&mut self, ctx: &RenderContext) {
        let (width, height) = ctx.size();
        self.depth.resize(&ctx.device, width, height);
    }

    /// Render one frame cleared to `sky`.
    pub fn render(
        &mut self,
        ctx: &RenderContext,
        scene: &Scene,
        camera: &Camera,
        sky: Color,
    ) -> Result<FrameStats, SurfaceError> {
        let drawables = scene.drawables();
        let order = draw_order(&drawables, camera.position);

        let frame = FrameUniform {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            lights: scene.lights.to_uniform(),
        };
        ctx.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        let mut stats = FrameStats::default();
        let draws = self.prepare(ctx, scene, &drawables, &order, &mut stats);

        let surface_texture = ctx.get_current_texture()?;
        let builder = RenderPassBuilder::new()
            .clear_color(clear_color(sky))
            .depth(DepthBuffer::CLEAR_VALUE)
            .label("scene-pass");
        let mut encoder = FrameEncoder::new(&ctx.device, &ctx.queue, surface_texture);
        if let Some(mut pass) = encoder.begin_render_pass(&builder, Some(&self.depth.view)) {
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            let mut bound: Option<PipelineKey> = None;
            for draw in &draws {
                let Some(mesh) = self.meshes.get(&draw.geometry) else {
                    continue;
                };
                if bound != Some(draw.key) {
                    pass.set_pipeline(self.pipeline.variant(draw.key));
                    bound = Some(draw.key);
                }
                pass.set_bind_group(1, &self.object_bind_group, &[draw.offset]);
                pass.set_bind_group(2, &draw.texture.bind_group, &[]);
                mesh.bind(&mut pass);
                mesh.draw(&mut pass);
            }
        }
        encoder.submit();

        Ok(stats)
    }

    /// Upload what is missing, fill the object uniforms, and prune caches.
    fn prepare(
        &mut self,
        ctx: &RenderContext,
        scene: &Scene,
        drawables: &[Drawable<'_>],
        order: &[usize],
        stats: &mut FrameStats,
    ) -> Vec<DrawCall> {
        let (live_meshes, live_textures) = live_resources(scene);
        let mut draws = Vec::with_capacity(order.len());
        self.staging.clear();

        for &index in order {
            let drawable = &drawables[index];
            let geometry = &drawable.instance.geometry;
            let material = &drawable.instance.material;

            if !self.meshes.contains_key(&geometry.id()) {
                let allocator = BufferAllocator::new(&ctx.device);
                match allocator.create_mesh(&format!("mesh-{}", geometry.id().0), geometry) {
                    Some(mesh) => {
                        self.meshes.insert(geometry.id(), mesh);
                    }
                    None => continue,
                }
            }

            let texture = match &material.map {
                Some(image) => {
                    match self.textures.get_or_create(&ctx.device, &ctx.queue, image) {
                        Ok(texture) => texture,
                        Err(e) => {
                            log::warn!("Texture '{}' not uploaded: {e}", image.name);
                            Arc::clone(self.textures.white())
                        }
                    }
                }
                None => Arc::clone(self.textures.white()),
            };

            let offset = self.staging.len() as u64;
            let uniform = ObjectUniform::new(drawable.world, material);
            self.staging.extend_from_slice(bytemuck::bytes_of(&uniform));
            self.staging.resize((offset + self.object_stride) as usize, 0);

            stats.draw_calls += 1;
            stats.triangles += geometry.triangle_count() as u64;
            draws.push(DrawCall {
                geometry: geometry.id(),
                texture,
                key: PipelineKey::for_material(material),
                offset: offset as u32,
            });
        }

        let needed = draws.len() as u64;
        if needed > self.object_capacity {
            let capacity = needed.next_power_of_two();
            let (buffer, bind_group) = create_object_buffer(
                &ctx.device,
                &self.pipeline.object_layout,
                capacity,
                self.object_stride,
            );
            self.object_buffer = buffer;
            self.object_bind_group = bind_group;
            self.object_capacity = capacity;
            log::debug!("Object uniform buffer grown to {capacity} slots");
        }
        if !self.staging.is_empty() {
            ctx.queue
                .write_buffer(&self.object_buffer, 0, &self.staging);
        }

        let before = self.meshes.len();
        self.meshes.retain(|id, _| live_meshes.contains(id));
        let dropped_meshes = before - self.meshes.len();
        let dropped_textures = self.textures.retain(&live_textures);
        if dropped_meshes + dropped_textures > 0 {
            log::debug!("Released {dropped_meshes} meshes and {dropped_textures} textures");
        }

        draws
    }
}

/// Geometry and image ids referenced by any mesh node. Hidden nodes count,
/// so the sun and moon keep their buffers through the phases they are off.
pub fn live_resources(scene: &Scene) -> (FxHashSet<GeometryId>, FxHashSet<TextureId>) {
    let mut meshes = FxHashSet::default();
    let mut textures = FxHashSet::default();
    for instance in scene.mesh_instances() {
        meshes.insert(instance.geometry.id());
        if let Some(image) = &instance.material.map {
            textures.insert(image.id());
        }
    }
    (meshes, textures)
}

/// Uniform slot size: the object uniform rounded up to the device's dynamic
/// offset alignment.
fn object_stride(alignment: u32) -> u64 {
    let size = size_of::<ObjectUniform>() as u64;
    size.next_multiple_of(u64::from(alignment.max(1)))
}

fn create_object_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    capacity: u64,
    stride: u64,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("object-uniforms"),
        size: capacity * stride,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("object-bind-group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(size_of::<ObjectUniform>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}

/// Opaque drawables in scene order, then blended ones farthest first.
pub fn draw_order(drawables: &[Drawable<'_>], eye: Vec3) -> Vec<usize> {
    let (mut blended, opaque): (Vec<usize>, Vec<usize>) =
        (0..drawables.len()).partition(|&i| drawables[i].instance.material.transparent);

    let distance = |i: usize| {
        drawables[i]
            .world
            .w_axis
            .truncate()
            .distance_squared(eye)
    };
    blended.sort_by(|&a, &b| distance(b).total_cmp(&distance(a)));

    let mut order = opaque;
    order.extend(blended);
    order
}
