use std::ops::Range;

use glam::{Mat4, Vec3};

use crate::config::ViewerConfig;
use crate::interaction::InteractionState;
use crate::mesh::{MeshData, MeshPart};
use crate::render::uniforms::{DrawUniforms, Lighting};

/// Position and scale of a drawable; the scene has no rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub fn new(position: Vec3, scale: Vec3) -> Self {
        Self { position, scale }
    }

    /// Scale first, then translate.
    pub fn model(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(self.scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProgramId {
    Object,
    Plane,
    Lamp,
}

impl ProgramId {
    pub const ALL: [ProgramId; 3] = [ProgramId::Object, ProgramId::Plane, ProgramId::Lamp];

    pub fn name(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Plane => "plane",
            Self::Lamp => "lamp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceTexture {
    Object,
    Plane,
}

/// Where a drawable sits each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Fixed(Transform),
    /// Follows the light's position at the light's marker scale.
    Light,
}

impl Placement {
    fn transform(&self, state: &InteractionState) -> Transform {
        match self {
            Self::Fixed(transform) => *transform,
            Self::Light => Transform::new(state.light.position, state.light.scale),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    LitTextured {
        program: ProgramId,
        texture: SurfaceTexture,
        placement: Placement,
        vertices: Range<u32>,
    },
    Unlit {
        program: ProgramId,
        placement: Placement,
        vertices: Range<u32>,
    },
}

impl Drawable {
    /// Object, plane and lamp in draw order. The lamp reuses the bottle's
    /// vertices.
    pub fn scene(config: &ViewerConfig, mesh: &MeshData) -> Vec<Drawable> {
        let bottle = mesh.range(MeshPart::Bottle);
        vec![
            Drawable::LitTextured {
                program: ProgramId::Object,
                texture: SurfaceTexture::Object,
                placement: Placement::Fixed(config.object),
                vertices: bottle.clone(),
            },
            Drawable::LitTextured {
                program: ProgramId::Plane,
                texture: SurfaceTexture::Plane,
                placement: Placement::Fixed(config.plane),
                vertices: mesh.range(MeshPart::Plane),
            },
            Drawable::Unlit {
                program: ProgramId::Lamp,
                placement: Placement::Light,
                vertices: bottle,
            },
        ]
    }

    /// Builds the draw call for this drawable against the current state.
    pub fn issue_draw(&self, state: &InteractionState, view: Mat4, projection: Mat4) -> DrawCall {
        match self {
            Self::LitTextured {
                program,
                texture,
                placement,
                vertices,
            } => {
                let lighting = Lighting {
                    object_color: state.object_color,
                    light_color: state.light.color,
                    light_pos: state.light.position,
                    view_position: state.camera.position(),
                    uv_scale: state.uv_scale,
                };
                let model = placement.transform(state).model();
                DrawCall {
                    program: *program,
                    texture: Some(*texture),
                    vertices: vertices.clone(),
                    uniforms: DrawUniforms::lit(model, view, projection, &lighting),
                }
            }
            Self::Unlit {
                program,
                placement,
                vertices,
            } => DrawCall {
                program: *program,
                texture: None,
                vertices: vertices.clone(),
                uniforms: DrawUniforms::unlit(placement.transform(state).model(), view, projection),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub texture: Option<SurfaceTexture>,
    pub vertices: Range<u32>,
    pub uniforms: DrawUniforms,
}

/// Everything the GPU needs to produce one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub clear_color: [f64; 4],
    pub draws: Vec<DrawCall>,
}

pub fn plan_frame(drawables: &[Drawable], state: &InteractionState, clear_color: [f64; 4]) -> FramePlan {
    let view = state.camera.view_matrix();
    let projection = state.projection_matrix();
    FramePlan {
        clear_color,
        draws: drawables
            .iter()
            .map(|drawable| drawable.issue_draw(state, view, projection))
            .collect(),
    }
}
