//! Indexed triangle geometry and the primitive generators the diorama uses.
//!
//! All generators produce counter-clockwise front faces. Planes and rings
//! lie in the XY plane facing +Z; callers rotate them flat with a transform.
//! Texture coordinates have `v = 0` at the top edge of the image.

use std::f32::consts::{PI, TAU};
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique geometry handle. The renderer keys its GPU mesh cache on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u64);

/// Interleaved vertex: position, normal, texture coordinate.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
        }
    }
}

/// Immutable indexed triangle list.
#[derive(Debug)]
pub struct Geometry {
    id: GeometryId,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// Wrap vertex and index data, assigning a fresh id.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            id: GeometryId(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed)),
            vertices,
            indices,
        }
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bake a transform into a copy of this geometry. Normals go through the
    /// inverse-transpose so non-uniform scale keeps them perpendicular.
    pub fn transformed(&self, matrix: Mat4) -> Geometry {
        let normal_matrix = Mat3::from_mat4(matrix).inverse().transpose();
        let vertices = self
            .vertices
            .iter()
            .map(|v| {
                let position = matrix.transform_point3(Vec3::from(v.position));
                let normal = (normal_matrix * Vec3::from(v.normal)).normalize_or_zero();
                Vertex::new(position, normal, v.uv)
            })
            .collect();
        Geometry::new(vertices, self.indices.clone())
    }

    /// `width` × `height` quad centered on the origin.
    pub fn plane(width: f32, height: f32) -> Geometry {
        let mut builder = Builder::default();
        builder.face(
            Vec3::ZERO,
            Vec3::X * (width * 0.5),
            Vec3::Y * (height * 0.5),
        );
        builder.finish()
    }

    /// Axis-aligned box centered on the origin.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Geometry {
        let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);
        let mut builder = Builder::default();
        // (normal * half extent, right, up); right × up points along the normal.
        builder.face(Vec3::X * hx, Vec3::NEG_Z * hz, Vec3::Y * hy);
        builder.face(Vec3::NEG_X * hx, Vec3::Z * hz, Vec3::Y * hy);
        builder.face(Vec3::Y * hy, Vec3::X * hx, Vec3::NEG_Z * hz);
        builder.face(Vec3::NEG_Y * hy, Vec3::X * hx, Vec3::Z * hz);
        builder.face(Vec3::Z * hz, Vec3::X * hx, Vec3::Y * hy);
        builder.face(Vec3::NEG_Z * hz, Vec3::NEG_X * hx, Vec3::Y * hy);
        builder.finish()
    }

    /// UV sphere with `width_segments` around and `height_segments` pole to pole.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Geometry {
        let ws = width_segments.max(3);
        let hs = height_segments.max(2);
        let mut vertices = Vec::with_capacity(((ws + 1) * (hs + 1)) as usize);

        for iy in 0..=hs {
            let v = iy as f32 / hs as f32;
            for ix in 0..=ws {
                let u = ix as f32 / ws as f32;
                let normal = Vec3::new(
                    -(u * TAU).cos() * (v * PI).sin(),
                    (v * PI).cos(),
                    (u * TAU).sin() * (v * PI).sin(),
                );
                vertices.push(Vertex::new(normal * radius, normal, [u, v]));
            }
        }

        let row = ws + 1;
        let mut indices = Vec::with_capacity((ws * hs * 6) as usize);
        for iy in 0..hs {
            for ix in 0..ws {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                // The pole rows collapse to a single triangle per segment.
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != hs - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        Geometry::new(vertices, indices)
    }

    /// Flat annulus between `inner_radius` and `outer_radius`.
    pub fn ring(inner_radius: f32, outer_radius: f32, theta_segments: u32) -> Geometry {
        let segments = theta_segments.max(3);
        let mut vertices = Vec::with_capacity(((segments + 1) * 2) as usize);

        for radius in [inner_radius, outer_radius] {
            for i in 0..=segments {
                let theta = i as f32 / segments as f32 * TAU;
                let position = Vec3::new(radius * theta.cos(), radius * theta.sin(), 0.0);
                let uv = [
                    (position.x / outer_radius + 1.0) * 0.5,
                    1.0 - (position.y / outer_radius + 1.0) * 0.5,
                ];
                vertices.push(Vertex::new(position, Vec3::Z, uv));
            }
        }

        let mut indices = Vec::with_capacity((segments * 6) as usize);
        for i in 0..segments {
            let a = i;
            let b = i + segments + 1;
            let c = i + segments + 2;
            let d = i + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
        Geometry::new(vertices, indices)
    }
}

#[derive(Default)]
struct Builder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Builder {
    /// Quad centered at `center`, spanning ±`right` and ±`up`.
    fn face(&mut self, center: Vec3, right: Vec3, up: Vec3) {
        let normal = right.cross(up).normalize();
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[
            Vertex::new(center - right + up, normal, [0.0, 0.0]),
            Vertex::new(center + right + up, normal, [1.0, 0.0]),
            Vertex::new(center - right - up, normal, [0.0, 1.0]),
            Vertex::new(center + right - up, normal, [1.0, 1.0]),
        ]);
        self.indices
            .extend_from_slice(&[base, base + 2, base + 1, base + 2, base + 3, base + 1]);
    }

    fn finish(self) -> Geometry {
        Geometry::new(self.vertices, self.indices)
    }
}
