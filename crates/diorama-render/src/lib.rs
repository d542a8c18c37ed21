//! wgpu renderer for the castle diorama: surface management, a reverse-Z
//! depth buffer, and one scene pipeline that draws the retained scene graph.

pub mod buffer;
pub mod depth;
pub mod gpu;
pub mod pass;
pub mod pipeline;
pub mod renderer;
pub mod texture;

pub use buffer::{BufferAllocator, MeshBuffer, vertex_layout};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use pass::{FrameEncoder, RenderPassBuilder, clear_color};
pub use pipeline::{FrameUniform, ObjectUniform, PipelineKey, SCENE_SHADER_SOURCE, ScenePipeline};
pub use renderer::{FrameStats, SceneRenderer, draw_order, live_resources};
pub use texture::{ManagedTexture, TextureError, TextureManager};
