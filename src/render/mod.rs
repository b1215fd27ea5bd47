pub mod frame;
pub mod renderer;
pub(crate) mod resources;
pub mod shaders;
pub mod uniforms;

pub use frame::{plan_frame, DrawCall, Drawable, FramePlan, Placement, ProgramId, SurfaceTexture, Transform};
pub use renderer::Renderer;
pub use resources::vertex_layout;
pub use uniforms::{DrawUniforms, LitUniforms, SamplerBorder, UnlitUniforms};
