//! Mutable viewer state and the input handlers that change it.

use std::fmt;

use glam::{Mat4, Vec2, Vec3};
use log::{debug, info};

use crate::camera::{Camera, CameraMovement};
use crate::config::{ProjectionConfig, ViewerConfig};
use crate::input::{InputState, KeyCode, NamedKey};
use crate::texture::WrapMode;

/// UV scale change per frame while a bracket key is held.
pub const UV_SCALE_STEP: f32 = 0.1;

const MOVEMENT_KEYS: [(char, CameraMovement); 6] = [
    ('W', CameraMovement::Forward),
    ('S', CameraMovement::Backward),
    ('A', CameraMovement::Left),
    ('D', CameraMovement::Right),
    ('Q', CameraMovement::Down),
    ('E', CameraMovement::Up),
];

/// Checked in order; the first held key whose mode differs wins.
const WRAP_KEYS: [(u8, WrapMode); 4] = [
    (1, WrapMode::Repeat),
    (2, WrapMode::MirroredRepeat),
    (3, WrapMode::ClampToEdge),
    (4, WrapMode::ClampToBorder),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionMode {
    Perspective,
    Orthographic,
}

impl ProjectionMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Perspective => Self::Orthographic,
            Self::Orthographic => Self::Perspective,
        }
    }
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Perspective => "perspective",
            Self::Orthographic => "orthographic",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    /// Size of the lamp marker drawn at `position`.
    pub scale: Vec3,
}

/// Converts absolute cursor positions into look offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseTracker {
    last: Vec2,
    first_event: bool,
}

impl MouseTracker {
    pub fn new(start: Vec2) -> Self {
        Self {
            last: start,
            first_event: true,
        }
    }

    /// Offset since the previous position with Y pointing up. The first
    /// position only seeds the tracker and yields zero.
    pub fn offset(&mut self, position: Vec2) -> Vec2 {
        if self.first_event {
            self.last = position;
            self.first_event = false;
        }
        let offset = Vec2::new(position.x - self.last.x, self.last.y - position.y);
        self.last = position;
        offset
    }

    pub fn last_position(&self) -> Vec2 {
        self.last
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameClock {
    last_frame: f64,
}

impl FrameClock {
    /// Records a frame at `now` seconds and returns the elapsed time.
    pub fn tick(&mut self, now: f64) -> f32 {
        let delta_time = (now - self.last_frame) as f32;
        self.last_frame = now;
        delta_time
    }
}

/// What keyboard handling changed during one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameChanges {
    pub close_requested: bool,
    pub wrap_mode: Option<WrapMode>,
    pub uv_scale_changed: bool,
    pub projection_toggled: bool,
}

/// Everything input can change, owned by the render loop.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionState {
    pub camera: Camera,
    pub light: Light,
    pub object_color: Vec3,
    pub uv_scale: Vec2,
    pub wrap_mode: WrapMode,
    pub projection: ProjectionMode,
    pub mouse: MouseTracker,
    pub clock: FrameClock,
    lens: ProjectionConfig,
    aspect: f32,
}

impl InteractionState {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            camera: Camera::new(config.camera_position),
            light: config.light,
            object_color: config.object_color,
            uv_scale: config.uv_scale,
            wrap_mode: WrapMode::Repeat,
            projection: config.projection.initial,
            mouse: MouseTracker::new(config.window.center()),
            clock: FrameClock::default(),
            lens: config.projection,
            aspect: config.window.aspect_ratio(),
        }
    }

    /// Applies held and pressed keys for one frame.
    pub fn apply_keyboard(&mut self, input: &InputState, delta_time: f32) -> FrameChanges {
        let mut changes = FrameChanges {
            close_requested: input.is_key_down(KeyCode::Named(NamedKey::Escape)),
            ..FrameChanges::default()
        };

        for (key, movement) in MOVEMENT_KEYS {
            if input.is_key_down(KeyCode::Character(key)) {
                self.camera.process_keyboard(movement, delta_time);
            }
        }

        changes.wrap_mode = WRAP_KEYS
            .iter()
            .find(|(digit, mode)| input.is_key_down(KeyCode::Digit(*digit)) && self.wrap_mode != *mode)
            .and_then(|(_, mode)| self.request_wrap_mode(*mode));

        if input.is_key_down(KeyCode::Named(NamedKey::RightBracket)) {
            self.adjust_uv_scale(UV_SCALE_STEP);
            changes.uv_scale_changed = true;
        } else if input.is_key_down(KeyCode::Named(NamedKey::LeftBracket)) {
            self.adjust_uv_scale(-UV_SCALE_STEP);
            changes.uv_scale_changed = true;
        }

        if input.was_key_pressed(KeyCode::Character('P')) {
            self.toggle_projection();
            changes.projection_toggled = true;
        }

        changes
    }

    /// Switches the wrap mode, returning the new mode only if it changed.
    pub fn request_wrap_mode(&mut self, mode: WrapMode) -> Option<WrapMode> {
        if self.wrap_mode == mode {
            return None;
        }
        self.wrap_mode = mode;
        info!("current texture wrapping mode: {mode}");
        Some(mode)
    }

    /// Adds `step` to both UV components. The scale is never clamped.
    pub fn adjust_uv_scale(&mut self, step: f32) {
        self.uv_scale += Vec2::splat(step);
        info!("current scale ({}, {})", self.uv_scale.x, self.uv_scale.y);
    }

    pub fn toggle_projection(&mut self) {
        self.projection = self.projection.toggled();
        info!("projection: {}", self.projection);
    }

    /// Feeds queued cursor positions to the camera in arrival order.
    pub fn apply_cursor(&mut self, positions: &[Vec2]) {
        for &position in positions {
            let offset = self.mouse.offset(position);
            self.camera.process_mouse_movement(offset.x, offset.y);
        }
    }

    pub fn apply_scroll(&mut self, y_offset: f32) {
        if y_offset != 0.0 {
            self.camera.process_mouse_scroll(y_offset);
            debug!("zoom {:.1}", self.camera.zoom());
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let ProjectionConfig {
            near,
            far,
            ortho_half_extent: extent,
            ..
        } = self.lens;
        match self.projection {
            ProjectionMode::Perspective => {
                Mat4::perspective_rh(self.camera.zoom().to_radians(), self.aspect, near, far)
            }
            ProjectionMode::Orthographic => {
                Mat4::orthographic_rh(-extent, extent, -extent, extent, near, far)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> InteractionState {
        InteractionState::new(&ViewerConfig::default())
    }

    fn held(keys: &[KeyCode]) -> InputState {
        let mut input = InputState::new();
        for key in keys {
            input.set_key_down(*key);
        }
        input
    }

    #[test]
    fn uv_scale_steps_are_additive() {
        let mut state = state();
        assert_eq!(state.uv_scale, Vec2::splat(5.0));
        let down = held(&[KeyCode::Named(NamedKey::LeftBracket)]);
        let up = held(&[KeyCode::Named(NamedKey::RightBracket)]);
        for _ in 0..10 {
            state.apply_keyboard(&down, 0.016);
        }
        assert!((state.uv_scale - Vec2::splat(4.0)).abs().max_element() < 1e-5);
        for _ in 0..10 {
            state.apply_keyboard(&up, 0.016);
        }
        assert!((state.uv_scale - Vec2::splat(5.0)).abs().max_element() < 1e-5);
    }

    #[test]
    fn uv_scale_is_not_clamped() {
        let mut state = state();
        for _ in 0..60 {
            state.adjust_uv_scale(-UV_SCALE_STEP);
        }
        assert!(state.uv_scale.x < 0.0);
    }

    #[test]
    fn right_bracket_wins_over_left() {
        let mut state = state();
        let both = held(&[
            KeyCode::Named(NamedKey::LeftBracket),
            KeyCode::Named(NamedKey::RightBracket),
        ]);
        state.apply_keyboard(&both, 0.016);
        assert!((state.uv_scale.x - 5.1).abs() < 1e-5);
    }

    #[test]
    fn first_mouse_event_has_no_offset() {
        let mut tracker = MouseTracker::new(Vec2::new(400.0, 300.0));
        assert_eq!(tracker.offset(Vec2::new(10.0, 900.0)), Vec2::ZERO);
        assert_eq!(tracker.offset(Vec2::new(15.0, 880.0)), Vec2::new(5.0, 20.0));
        assert_eq!(tracker.last_position(), Vec2::new(15.0, 880.0));
    }

    #[test]
    fn first_cursor_position_leaves_camera_still() {
        let mut state = state();
        let before = state.camera.clone();
        state.apply_cursor(&[Vec2::new(-250.0, 1234.0)]);
        assert_eq!(state.camera, before);
        state.apply_cursor(&[Vec2::new(-240.0, 1234.0)]);
        assert_ne!(state.camera.front(), before.front());
    }

    #[test]
    fn look_keeps_turning_past_the_window_edge() {
        let mut state = state();
        let mut input = InputState::new();
        input.push_cursor_motion(Vec2::new(400.0, 300.0));
        state.apply_cursor(input.cursor_positions());
        input.end_frame();

        // eight frames of steady rightward motion carry the cursor far past x=800
        let mut front = state.camera.front();
        for _ in 0..8 {
            input.push_cursor_motion(Vec2::new(250.0, 0.0));
            state.apply_cursor(input.cursor_positions());
            input.end_frame();
            assert_ne!(state.camera.front(), front);
            front = state.camera.front();
        }
        assert_eq!(state.mouse.last_position(), Vec2::new(2400.0, 300.0));
    }

    #[test]
    fn wrap_requests_are_idempotent() {
        let mut state = state();
        assert_eq!(state.request_wrap_mode(WrapMode::Repeat), None);
        assert_eq!(
            state.request_wrap_mode(WrapMode::ClampToEdge),
            Some(WrapMode::ClampToEdge)
        );
        assert_eq!(state.request_wrap_mode(WrapMode::ClampToEdge), None);
    }

    #[test]
    fn wrap_keys_use_first_differing_mode() {
        let mut state = state();
        let keys = held(&[KeyCode::Digit(1), KeyCode::Digit(3), KeyCode::Digit(4)]);
        let changes = state.apply_keyboard(&keys, 0.016);
        assert_eq!(changes.wrap_mode, Some(WrapMode::ClampToEdge));

        let border = held(&[KeyCode::Digit(4)]);
        assert_eq!(
            state.apply_keyboard(&border, 0.016).wrap_mode,
            Some(WrapMode::ClampToBorder)
        );
        assert_eq!(state.apply_keyboard(&border, 0.016).wrap_mode, None);
        assert_eq!(state.wrap_mode, WrapMode::ClampToBorder);
    }

    #[test]
    fn projection_toggles_on_press_only() {
        let mut state = state();
        assert_eq!(state.projection, ProjectionMode::Perspective);
        let mut input = held(&[KeyCode::Character('P')]);
        assert!(state.apply_keyboard(&input, 0.016).projection_toggled);
        assert_eq!(state.projection, ProjectionMode::Orthographic);
        input.end_frame();
        for _ in 0..5 {
            assert!(!state.apply_keyboard(&input, 0.016).projection_toggled);
        }
        assert_eq!(state.projection, ProjectionMode::Orthographic);
    }

    #[test]
    fn escape_requests_close() {
        let mut state = state();
        let input = held(&[KeyCode::Named(NamedKey::Escape)]);
        assert!(state.apply_keyboard(&input, 0.016).close_requested);
        assert!(!state.apply_keyboard(&InputState::new(), 0.016).close_requested);
    }

    #[test]
    fn movement_keys_move_camera() {
        let mut state = state();
        let input = held(&[KeyCode::Character('W')]);
        state.apply_keyboard(&input, 1.0);
        assert!((state.camera.position().z - 4.5).abs() < 1e-5);
    }

    #[test]
    fn clock_reports_elapsed_time() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.tick(0.5), 0.5);
        assert!((clock.tick(0.75) - 0.25).abs() < 1e-6);
        assert!((clock.tick(0.75)).abs() < 1e-6);
    }

    #[test]
    fn orthographic_projection_ignores_zoom() {
        let mut state = state();
        state.toggle_projection();
        let before = state.projection_matrix();
        state.apply_scroll(10.0);
        assert_eq!(state.projection_matrix(), before);
        state.toggle_projection();
        assert_ne!(state.projection_matrix(), before);
    }
}
