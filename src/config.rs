use std::path::PathBuf;

use glam::{Vec2, Vec3};

use crate::interaction::{Light, ProjectionMode};
use crate::render::Transform;

/// Fixed constants describing the viewer and its scene.
///
/// Nothing here is read from flags, files or the environment; the defaults
/// are the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub textures: TexturePaths,
    pub camera_position: Vec3,
    pub object: Transform,
    pub plane: Transform,
    pub light: Light,
    pub object_color: Vec3,
    pub uv_scale: Vec2,
    pub projection: ProjectionConfig,
    pub clear_color: [f64; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl WindowConfig {
    /// Aspect ratio of the initial window. Projections keep using it after
    /// resizes.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Window centre, the seed for the last observed cursor position.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TexturePaths {
    pub object: PathBuf,
    pub plane: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionConfig {
    pub initial: ProjectionMode,
    pub near: f32,
    pub far: f32,
    /// Half width and half height of the orthographic view volume.
    pub ortho_half_extent: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig {
                title: "3D Scene".to_string(),
                width: 800,
                height: 600,
            },
            textures: TexturePaths {
                object: PathBuf::from("resources/textures/NeonPinkPlastic.jpg"),
                plane: PathBuf::from("resources/textures/granite.jpg"),
            },
            camera_position: Vec3::new(0.0, 0.0, 7.0),
            object: Transform::new(Vec3::ZERO, Vec3::splat(2.0)),
            plane: Transform::new(Vec3::ZERO, Vec3::splat(5.0)),
            light: Light {
                position: Vec3::new(1.5, 7.5, 4.0),
                color: Vec3::ONE,
                scale: Vec3::splat(0.3),
            },
            object_color: Vec3::new(1.0, 0.2, 0.0),
            uv_scale: Vec2::splat(5.0),
            projection: ProjectionConfig {
                initial: ProjectionMode::Perspective,
                near: 0.1,
                far: 100.0,
                ortho_half_extent: 5.0,
            },
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}
