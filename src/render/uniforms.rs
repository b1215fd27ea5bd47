use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::texture::SamplerState;

/// Uniform block of the lit programs, laid out to match `Uniforms` in WGSL.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable, PartialEq)]
pub struct LitUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub object_color: [f32; 4],
    pub light_color: [f32; 4],
    pub light_pos: [f32; 4],
    pub view_position: [f32; 4],
    pub uv_scale: [f32; 2],
    pub _padding: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable, PartialEq)]
pub struct UnlitUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

/// Per-texture border parameters read by the lit fragment stage.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable, PartialEq)]
pub struct SamplerBorder {
    pub color: [f32; 4],
    pub enabled: u32,
    pub _padding: [u32; 3],
}

impl SamplerBorder {
    pub fn from_state(state: &SamplerState) -> Self {
        match state.active_border() {
            Some(color) => Self {
                color,
                enabled: 1,
                _padding: [0; 3],
            },
            None => Self::zeroed(),
        }
    }
}

/// Scene values shared by every lit draw of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub object_color: Vec3,
    pub light_color: Vec3,
    pub light_pos: Vec3,
    pub view_position: Vec3,
    pub uv_scale: Vec2,
}

/// Uniform values for one draw, tagged by program contract.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawUniforms {
    Lit(LitUniforms),
    Unlit(UnlitUniforms),
}

impl DrawUniforms {
    pub fn lit(model: Mat4, view: Mat4, projection: Mat4, lighting: &Lighting) -> Self {
        Self::Lit(LitUniforms {
            model: model.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            object_color: lighting.object_color.extend(0.0).to_array(),
            light_color: lighting.light_color.extend(0.0).to_array(),
            light_pos: lighting.light_pos.extend(0.0).to_array(),
            view_position: lighting.view_position.extend(0.0).to_array(),
            uv_scale: lighting.uv_scale.to_array(),
            _padding: [0.0; 2],
        })
    }

    pub fn unlit(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self::Unlit(UnlitUniforms {
            model: model.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Lit(uniforms) => bytes_of(uniforms),
            Self::Unlit(uniforms) => bytes_of(uniforms),
        }
    }

    pub fn model(&self) -> Mat4 {
        match self {
            Self::Lit(uniforms) => Mat4::from_cols_array_2d(&uniforms.model),
            Self::Unlit(uniforms) => Mat4::from_cols_array_2d(&uniforms.model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{WrapMode, BORDER_COLOR};

    #[test]
    fn block_sizes_follow_wgsl_layout() {
        assert_eq!(std::mem::size_of::<LitUniforms>(), 272);
        assert_eq!(std::mem::size_of::<UnlitUniforms>(), 192);
        assert_eq!(std::mem::size_of::<SamplerBorder>(), 32);
    }

    #[test]
    fn border_is_enabled_only_when_clamping_to_border() {
        let mut state = SamplerState::default();
        assert_eq!(SamplerBorder::from_state(&state).enabled, 0);

        for update in state.wrap_updates(WrapMode::ClampToBorder) {
            state.apply(update);
        }
        let border = SamplerBorder::from_state(&state);
        assert_eq!(border.enabled, 1);
        assert_eq!(border.color, BORDER_COLOR);
    }

    #[test]
    fn lit_uniforms_pack_vectors() {
        let lighting = Lighting {
            object_color: Vec3::new(1.0, 0.2, 0.0),
            light_color: Vec3::ONE,
            light_pos: Vec3::new(1.5, 7.5, 4.0),
            view_position: Vec3::new(0.0, 0.0, 7.0),
            uv_scale: Vec2::splat(5.0),
        };
        let model = Mat4::from_translation(Vec3::X);
        let uniforms = DrawUniforms::lit(model, Mat4::IDENTITY, Mat4::IDENTITY, &lighting);
        assert_eq!(uniforms.bytes().len(), 272);
        assert_eq!(uniforms.model(), model);
        let DrawUniforms::Lit(lit) = uniforms else {
            panic!("expected lit uniforms");
        };
        assert_eq!(lit.light_pos, [1.5, 7.5, 4.0, 0.0]);
        assert_eq!(lit.uv_scale, [5.0, 5.0]);
    }
}
