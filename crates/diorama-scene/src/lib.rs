//! Retained scene graph for the castle diorama.
//!
//! Nodes carry a transform, a visibility flag, and optionally a mesh
//! instance (shared geometry plus a material). The renderer walks the graph
//! every frame through [`Scene::drawables`]; nothing here touches the GPU.

pub mod camera;
pub mod color;
pub mod geometry;
pub mod graph;
pub mod light;
pub mod material;
pub mod model;
pub mod transform;

pub use camera::Camera;
pub use color::Color;
pub use geometry::{Geometry, GeometryId, Vertex};
pub use graph::{Drawable, MeshInstance, Node, NodeId, Scene};
pub use light::{AmbientLight, DirectionalLight, Lights, LightsUniform};
pub use material::{ImageData, Material, Shading, TextureId};
pub use model::{ModelPart, ModelTemplate};
pub use transform::Transform;
