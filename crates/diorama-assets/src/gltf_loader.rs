//! glTF model loading.
//!
//! Walks the default scene's node tree, bakes each node's accumulated
//! transform into its primitives' vertices, and turns every triangle
//! primitive into a [`ModelPart`] with a lit material. Textures referenced
//! by several primitives are decoded once and shared.

use std::path::Path;
use std::sync::Arc;

use diorama_scene::{
    Color, Geometry, ImageData, Material, ModelPart, ModelTemplate, Vertex,
};
use glam::{Mat3, Mat4, Vec3};
use rustc_hash::FxHashMap;

use crate::error::AssetError;

/// Load a `.gltf`/`.glb` file into a model template.
pub fn load_model(path: &Path) -> Result<ModelTemplate, AssetError> {
    let (document, buffers, images) = gltf::import(path).map_err(|source| AssetError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    let mut ctx = LoadContext {
        path,
        buffers: &buffers,
        images: &images,
        textures: FxHashMap::default(),
        parts: Vec::new(),
    };

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    if let Some(scene) = scene {
        for node in scene.nodes() {
            ctx.process_node(&node, Mat4::IDENTITY)?;
        }
    }

    let parts = ctx.parts;
    if parts.is_empty() {
        return Err(AssetError::EmptyModel {
            path: path.to_path_buf(),
        });
    }

    let name = path
        .parent()
        .and_then(|p| p.file_name())
        .or_else(|| path.file_stem())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    let template = ModelTemplate { name, parts };

    tracing::info!(
        model = %template.name,
        parts = template.parts.len(),
        triangles = template.triangle_count(),
        "Loaded glTF model from {}",
        path.display()
    );
    Ok(template)
}

struct LoadContext<'a> {
    path: &'a Path,
    buffers: &'a [gltf::buffer::Data],
    images: &'a [gltf::image::Data],
    textures: FxHashMap<usize, Option<Arc<ImageData>>>,
    parts: Vec<ModelPart>,
}

impl LoadContext<'_> {
    fn process_node(&mut self, node: &gltf::Node, parent: Mat4) -> Result<(), AssetError> {
        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            let mesh_name = mesh
                .name()
                .or_else(|| node.name())
                .unwrap_or("mesh")
                .to_string();

            for (i, primitive) in mesh.primitives().enumerate() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    tracing::debug!(mesh = %mesh_name, mode = ?primitive.mode(), "skipping non-triangle primitive");
                    continue;
                }
                let geometry = self.read_geometry(&primitive, &mesh_name, world)?;
                let material = self.read_material(&primitive.material());
                self.parts.push(ModelPart {
                    name: format!("{mesh_name}.{i}"),
                    geometry: Arc::new(geometry),
                    material,
                });
            }
        }

        for child in node.children() {
            self.process_node(&child, world)?;
        }
        Ok(())
    }

    fn read_geometry(
        &self,
        primitive: &gltf::Primitive,
        mesh_name: &str,
        world: Mat4,
    ) -> Result<Geometry, AssetError> {
        let reader = primitive.reader(|buffer| self.buffers.get(buffer.index()).map(|d| &d[..]));

        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| AssetError::MissingPositions {
                path: self.path.to_path_buf(),
                mesh: mesh_name.to_string(),
            })?
            .map(|p| world.transform_point3(Vec3::from(p)))
            .collect();

        let indices: Vec<u32> = reader
            .read_indices()
            .map(|iter| iter.into_u32().collect())
            .unwrap_or_else(|| (0..positions.len() as u32).collect());

        let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
        let normals: Vec<Vec3> = match reader.read_normals() {
            Some(iter) => iter
                .map(|n| (normal_matrix * Vec3::from(n)).normalize_or_zero())
                .collect(),
            None => smooth_normals(&positions, &indices),
        };

        let tex_set = primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_texture()
            .map(|info| info.tex_coord())
            .unwrap_or(0);
        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(tex_set)
            .map(|tc| tc.into_f32().collect())
            .unwrap_or_default();

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let normal = normals.get(i).copied().unwrap_or(Vec3::Y);
                let uv = uvs.get(i).copied().unwrap_or([0.0, 0.0]);
                Vertex::new(p, normal, uv)
            })
            .collect();

        // Drop triangles that reference vertices past the end.
        let vertex_count = positions.len() as u32;
        let indices = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| i < vertex_count))
            .flatten()
            .copied()
            .collect();

        Ok(Geometry::new(vertices, indices))
    }

    fn read_material(&mut self, material: &gltf::Material) -> Material {
        let pbr = material.pbr_metallic_roughness();
        let [r, g, b, a] = pbr.base_color_factor();
        // glTF factors are already linear.
        let mut out = Material::lit(Color::linear(r, g, b));

        if let Some(info) = pbr.base_color_texture() {
            let index = info.texture().source().index();
            if let Some(image) = self.texture(index) {
                out = out.with_map(image);
            }
        }

        match material.alpha_mode() {
            gltf::material::AlphaMode::Blend => out = out.with_opacity(a),
            gltf::material::AlphaMode::Mask => {
                out = out.with_alpha_test(material.alpha_cutoff().unwrap_or(0.5));
            }
            gltf::material::AlphaMode::Opaque => {}
        }
        if material.double_sided() {
            out = out.with_double_sided();
        }
        out
    }

    fn texture(&mut self, index: usize) -> Option<Arc<ImageData>> {
        if let Some(cached) = self.textures.get(&index) {
            return cached.clone();
        }
        let converted = self.images.get(index).and_then(|data| {
            let rgba = to_rgba8(data);
            if rgba.is_none() {
                tracing::warn!(
                    image = index,
                    format = ?data.format,
                    "unsupported glTF image format in {}, drawing untextured",
                    self.path.display()
                );
            }
            rgba.map(|rgba| {
                Arc::new(ImageData::new(
                    format!("{}#{index}", self.path.display()),
                    data.width,
                    data.height,
                    rgba,
                ))
            })
        });
        self.textures.insert(index, converted.clone());
        converted
    }
}

fn to_rgba8(data: &gltf::image::Data) -> Option<Vec<u8>> {
    use gltf::image::Format;
    match data.format {
        Format::R8G8B8A8 => Some(data.pixels.clone()),
        Format::R8G8B8 => Some(
            data.pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
        ),
        Format::R8 => Some(data.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect()),
        Format::R8G8 => Some(
            data.pixels
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
        ),
        _ => None,
    }
}

/// Area-weighted vertex normals for meshes that ship without them.
fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| n.normalize_or(Vec3::Y))
        .collect()
}
