use std::collections::HashSet;

use glam::Vec2;

/// Height of one scroll line in pixels, for devices that report pixel deltas.
pub const PIXELS_PER_LINE: f32 = 20.0;

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
}

/// Keys the viewer reacts to that are neither letters nor digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Escape,
    LeftBracket,
    RightBracket,
}

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const RIGHT: Self = Self(1);
    pub const MIDDLE: Self = Self(2);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    /// Display name for the three buttons the viewer reports.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::LEFT => Some("Left"),
            Self::RIGHT => Some("Right"),
            Self::MIDDLE => Some("Middle"),
            _ => None,
        }
    }
}

/// Input gathered between two frames.
///
/// Held keys persist across frames; key presses, cursor positions and scroll
/// offsets are cleared by [`InputState::end_frame`]. Relative mouse motion
/// moves an unbounded virtual cursor that survives across frames.
#[derive(Debug, Default)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    pressed: HashSet<KeyCode>,
    cursor_positions: Vec<Vec2>,
    virtual_cursor: Vec2,
    scroll: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as held. Auto-repeat of an already held key is not a
    /// new press.
    pub fn set_key_down(&mut self, key: KeyCode) {
        if self.keys.insert(key) {
            self.pressed.insert(key);
        }
    }

    pub fn set_key_up(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    /// Moves the virtual cursor by a raw device delta and queues the result.
    /// The position is never clamped to the window.
    pub fn push_cursor_motion(&mut self, delta: Vec2) {
        self.virtual_cursor += delta;
        self.cursor_positions.push(self.virtual_cursor);
    }

    pub fn add_scroll(&mut self, y_offset: f32) {
        self.scroll += y_offset;
    }

    /// Adds a pixel-based scroll offset converted to lines.
    pub fn add_scroll_pixels(&mut self, y_pixels: f32) {
        self.add_scroll(y_pixels / PIXELS_PER_LINE);
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    /// True only on the frame the key went down.
    pub fn was_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// Cursor positions in arrival order since the last frame.
    pub fn cursor_positions(&self) -> &[Vec2] {
        &self.cursor_positions
    }

    pub fn scroll_delta(&self) -> f32 {
        self.scroll
    }

    pub fn end_frame(&mut self) {
        self.pressed.clear();
        self.cursor_positions.clear();
        self.scroll = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_state_tracks_keys() {
        let mut state = InputState::new();
        state.set_key_down(KeyCode::Character('W'));
        assert!(state.is_key_down(KeyCode::Character('W')));
        assert!(!state.is_key_down(KeyCode::Character('S')));
        state.set_key_up(KeyCode::Character('W'));
        assert!(!state.is_key_down(KeyCode::Character('W')));
    }

    #[test]
    fn press_is_reported_for_one_frame() {
        let mut state = InputState::new();
        let p = KeyCode::Character('P');
        state.set_key_down(p);
        assert!(state.was_key_pressed(p));
        state.end_frame();
        state.set_key_down(p);
        assert!(state.is_key_down(p));
        assert!(!state.was_key_pressed(p));
        state.set_key_up(p);
        state.set_key_down(p);
        assert!(state.was_key_pressed(p));
    }

    #[test]
    fn pointer_events_are_queued_until_end_of_frame() {
        let mut state = InputState::new();
        state.push_cursor_motion(Vec2::new(1.0, 2.0));
        state.push_cursor_motion(Vec2::new(3.0, 4.0));
        state.add_scroll(1.0);
        state.add_scroll(0.5);
        assert_eq!(state.cursor_positions().len(), 2);
        assert_eq!(state.scroll_delta(), 1.5);
        state.end_frame();
        assert!(state.cursor_positions().is_empty());
        assert_eq!(state.scroll_delta(), 0.0);
    }

    #[test]
    fn mouse_buttons_have_labels() {
        assert_eq!(MouseButton::LEFT.label(), Some("Left"));
        assert_eq!(MouseButton::new(2).label(), Some("Middle"));
        assert_eq!(MouseButton::new(7).label(), None);
    }

    #[test]
    fn motion_accumulates_past_previous_frames() {
        let mut state = InputState::new();
        state.push_cursor_motion(Vec2::new(600.0, -10.0));
        state.push_cursor_motion(Vec2::new(600.0, -10.0));
        assert_eq!(
            state.cursor_positions(),
            &[Vec2::new(600.0, -10.0), Vec2::new(1200.0, -20.0)]
        );
        state.end_frame();
        state.push_cursor_motion(Vec2::new(-200.0, 0.0));
        assert_eq!(state.cursor_positions(), &[Vec2::new(1000.0, -20.0)]);
    }

    #[test]
    fn pixel_scroll_is_converted_to_lines() {
        let mut state = InputState::new();
        state.add_scroll_pixels(50.0);
        assert!((state.scroll_delta() - 2.5).abs() < 1e-6);
        state.add_scroll(1.0);
        assert!((state.scroll_delta() - 3.5).abs() < 1e-6);
    }
}
