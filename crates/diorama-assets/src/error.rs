//! Asset loading error types.

use std::path::PathBuf;

/// Errors raised while reading or decoding assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load glTF {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    /// A mesh primitive without a POSITION attribute.
    #[error("mesh `{mesh}` in {path} has no vertex positions")]
    MissingPositions { path: PathBuf, mesh: String },

    /// The model decoded but contained nothing drawable.
    #[error("{path} contains no triangle meshes")]
    EmptyModel { path: PathBuf },

    #[error("failed to spawn asset worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// The request queue is full or the workers have shut down.
    #[error("asset loader cannot accept `{key}`: {reason}")]
    Rejected { key: String, reason: &'static str },
}
