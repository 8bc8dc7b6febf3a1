//! Direct (non-console) visitor input: keyboard, mouse, touch.
//!
//! Polled into a plain snapshot once per frame so stage logic never touches
//! the windowing layer and stays testable headless. The arrow keys stand in
//! for the three console buttons on a keyboard-only install.

use macroquad::input::{
    KeyCode, MouseButton, get_keys_pressed, is_key_down, is_key_pressed, is_mouse_button_pressed,
    touches,
};

use crate::hardware::BUTTON_COUNT;

/// Keyboard stand-ins for Button1..Button3, in button order.
const BUTTON_KEYS: [KeyCode; BUTTON_COUNT] = [KeyCode::Left, KeyCode::Down, KeyCode::Right];

/// One frame's worth of direct visitor input.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    /// Any key, mouse button or touch went down this frame.
    pub any_pressed: bool,
    /// Per-button stand-in key went down this frame.
    pub pressed: [bool; BUTTON_COUNT],
    /// Per-button stand-in key currently held.
    pub held: [bool; BUTTON_COUNT],
}

impl FrameInput {
    /// Snapshot with only the anonymous "some input happened" signal set.
    pub fn any() -> Self {
        Self {
            any_pressed: true,
            ..Self::default()
        }
    }

    /// Snapshot for a single stand-in button press.
    pub fn press(index: usize) -> Self {
        let mut input = Self::any();
        input.pressed[index] = true;
        input.held[index] = true;
        input
    }
}

/// Poll macroquad for this frame's direct input. Call once per frame.
pub fn poll_frame_input() -> FrameInput {
    let mut input = FrameInput::default();

    for (i, key) in BUTTON_KEYS.iter().enumerate() {
        input.pressed[i] = is_key_pressed(*key);
        input.held[i] = is_key_down(*key);
    }

    input.any_pressed = !get_keys_pressed().is_empty()
        || is_mouse_button_pressed(MouseButton::Left)
        || is_mouse_button_pressed(MouseButton::Right)
        || is_mouse_button_pressed(MouseButton::Middle)
        || !touches().is_empty();

    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_quiet() {
        let input = FrameInput::default();
        assert!(!input.any_pressed);
        assert!(input.pressed.iter().all(|p| !p));
        assert!(input.held.iter().all(|h| !h));
    }

    #[test]
    fn test_press_snapshot_sets_any() {
        let input = FrameInput::press(2);
        assert!(input.any_pressed);
        assert!(input.pressed[2]);
        assert!(input.held[2]);
        assert!(!input.pressed[0]);
    }
}
