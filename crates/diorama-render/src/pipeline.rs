//! The scene pipeline: one shader, four variants (opaque or blended, culled
//! or double-sided).
//!
//! Bind groups: 0 = camera and lights, 1 = per-object uniform addressed by a
//! dynamic offset, 2 = material map and sampler.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use diorama_scene::{LightsUniform, Material, Shading};
use glam::Mat4;

use crate::buffer::vertex_layout;
use crate::depth::DepthBuffer;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub lights: LightsUniform,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of `model`, padded to a mat4.
    pub normal: [[f32; 4]; 4],
    /// rgb = linear base color, a = opacity.
    pub color: [f32; 4],
    /// x = 1 when lit, y = alpha-test threshold.
    pub params: [f32; 4],
}

impl ObjectUniform {
    pub fn new(world: Mat4, material: &Material) -> Self {
        let normal = if world.determinant().abs() > f32::EPSILON {
            world.inverse().transpose()
        } else {
            Mat4::IDENTITY
        };
        let [r, g, b] = material.color.to_array();
        let lit = match material.shading {
            Shading::Lit => 1.0,
            Shading::Unlit => 0.0,
        };
        Self {
            model: world.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
            color: [r, g, b, material.effective_opacity()],
            params: [lit, material.alpha_test, 0.0, 0.0],
        }
    }
}

pub const SCENE_SHADER_SOURCE: &str = r#"
struct Lights {
    ambient: vec4<f32>,
    direction_intensity: vec4<f32>,
    directional_color: vec4<f32>,
};

struct Frame {
    view_proj: mat4x4<f32>,
    lights: Lights,
};

struct Object {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> frame: Frame;
@group(1) @binding(0) var<uniform> object: Object;
@group(2) @binding(0) var t_map: texture_2d<f32>;
@group(2) @binding(1) var s_map: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = object.model * vec4<f32>(in.position, 1.0);
    out.clip_position = frame.view_proj * world;
    out.normal = (object.normal * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    let texel = textureSample(t_map, s_map, in.uv);
    let alpha = object.color.a * texel.a;
    if alpha < object.params.y {
        discard;
    }
    var color = object.color.rgb * texel.rgb;
    if object.params.x > 0.5 {
        var n = in.normal;
        if dot(n, n) > 0.0 {
            n = normalize(n);
        }
        if !front {
            n = -n;
        }
        let to_light = -frame.lights.direction_intensity.xyz;
        let diffuse = max(dot(n, to_light), 0.0) * frame.lights.direction_intensity.w;
        color = color * (frame.lights.ambient.rgb + frame.lights.directional_color.rgb * diffuse);
    }
    return vec4<f32>(color, alpha);
}
"#;

/// Which of the four pipeline variants a material needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub transparent: bool,
    pub double_sided: bool,
}

impl PipelineKey {
    pub fn for_material(material: &Material) -> Self {
        Self {
            transparent: material.transparent,
            double_sided: material.double_sided,
        }
    }

    fn index(self) -> usize {
        usize::from(self.transparent) * 2 + usize::from(self.double_sided)
    }
}

pub struct ScenePipeline {
    variants: [wgpu::RenderPipeline; 4],
    pub frame_layout: wgpu::BindGroupLayout,
    pub object_layout: wgpu::BindGroupLayout,
}

impl ScenePipeline {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        texture_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-bind-group-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(size_of::<FrameUniform>() as u64),
                },
                count: None,
            }],
        });
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object-bind-group-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(size_of::<ObjectUniform>() as u64),
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[&frame_layout, &object_layout, texture_layout],
            immediate_size: 0,
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene-shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER_SOURCE.into()),
        });

        let build = |key: PipelineKey, label: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[vertex_layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: (!key.double_sided).then_some(wgpu::Face::Back),
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: Some(DepthBuffer::depth_stencil_state(true)),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: key
                            .transparent
                            .then_some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        };

        let key = |transparent, double_sided| PipelineKey {
            transparent,
            double_sided,
        };
        let variants = [
            build(key(false, false), "scene-opaque"),
            build(key(false, true), "scene-opaque-double-sided"),
            build(key(true, false), "scene-blended"),
            build(key(true, true), "scene-blended-double-sided"),
        ];
        log::debug!("Scene pipelines created for {surface_format:?}");

        Self {
            variants,
            frame_layout,
            object_layout,
        }
    }

    pub fn variant(&self, key: PipelineKey) -> &wgpu::RenderPipeline {
        &self.variants[key.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diorama_scene::Color;
    use glam::Vec3;

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(size_of::<FrameUniform>(), 112);
        assert_eq!(size_of::<ObjectUniform>(), 160);
        assert_eq!(size_of::<FrameUniform>() % 16, 0);
    }

    #[test]
    fn test_object_uniform_packs_material() {
        let material = Material::basic(Color::linear(0.1, 0.2, 0.3)).with_opacity(0.8);
        let uniform = ObjectUniform::new(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)), &material);
        assert_eq!(uniform.color, [0.1, 0.2, 0.3, 0.8]);
        assert_eq!(uniform.params[0], 0.0);
        assert_eq!(uniform.model[3], [1.0, 2.0, 3.0, 1.0]);

        let lit = ObjectUniform::new(Mat4::IDENTITY, &Material::lit(Color::WHITE).with_alpha_test(0.5));
        assert_eq!(lit.params, [1.0, 0.5, 0.0, 0.0]);
        assert_eq!(lit.color[3], 1.0);
    }

    #[test]
    fn test_degenerate_world_keeps_finite_normals() {
        let uniform = ObjectUniform::new(Mat4::from_scale(Vec3::ZERO), &Material::basic(Color::WHITE));
        assert_eq!(uniform.normal, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn test_pipeline_key_indices_distinct() {
        let mut seen = [false; 4];
        for transparent in [false, true] {
            for double_sided in [false, true] {
                let key = PipelineKey {
                    transparent,
                    double_sided,
                };
                assert!(!seen[key.index()]);
                seen[key.index()] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_pipelines_build() {
        let Some((device, queue)) = crate::depth::tests::create_test_device() else {
            return;
        };
        let textures = crate::texture::TextureManager::new(&device, &queue);
        let pipeline = ScenePipeline::new(
            &device,
            wgpu::TextureFormat::Bgra8UnormSrgb,
            textures.bind_group_layout(),
        );
        let _ = pipeline.variant(PipelineKey {
            transparent: true,
            double_sided: true,
        });
    }
}
