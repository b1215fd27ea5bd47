//! Interactive viewer for a small textured scene: a lotion bottle on a
//! granite plane, lit by a single point light and explored with a free-fly
//! camera.
//!
//! Everything except [`render::Renderer`] runs without a window or GPU, so
//! the per-frame logic can be driven from tests and headless tools.

pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod input;
pub mod interaction;
pub mod mesh;
pub mod render;
pub mod shader;
pub mod texture;

pub use app::{Frame, LoopState, SceneAssets, Viewer};
pub use camera::{Camera, CameraMovement};
pub use config::ViewerConfig;
pub use error::{ShaderStage, ViewerError};
pub use input::{InputState, KeyCode, MouseButton, NamedKey};
pub use interaction::{InteractionState, Light, ProjectionMode};
pub use mesh::{MeshData, MeshPart};
pub use render::{FramePlan, Renderer, SurfaceTexture, Transform};
pub use texture::{TextureImage, WrapMode};
