//! Asset loading for the castle diorama.
//!
//! Textures decode synchronously through the `image` crate. glTF models are
//! flattened into [`ModelTemplate`]s, either inline via [`load_model`] or on a
//! background worker via [`AsyncModelLoader`], whose results the frame loop
//! drains once per frame.
//!
//! [`ModelTemplate`]: diorama_scene::ModelTemplate

mod error;
mod gltf_loader;
mod image_loader;
mod loader;

pub use error::AssetError;
pub use gltf_loader::load_model;
pub use image_loader::{load_image, solid_image};
pub use loader::{AsyncModelLoader, LoadedModel, ModelRequest};
