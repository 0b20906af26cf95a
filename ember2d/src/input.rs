use std::collections::{HashMap, HashSet};

pub use winit::{event::MouseButton, keyboard::KeyCode};

use crate::math::Vec2;

/// A discrete input event collected by the platform for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    MouseDown { button: MouseButton, position: Vec2 },
    MouseUp { button: MouseButton, position: Vec2 },
    MouseMotion { position: Vec2 },
    /// The window was asked to close.
    Quit,
}

impl InputEvent {
    pub fn is_quit(&self) -> bool {
        matches!(self, InputEvent::Quit)
    }
}

/// Tracks keyboard and mouse state across frames.
///
/// `update` is called once per frame with that frame's events; the
/// pressed/released sets only describe the most recent frame.
#[derive(Debug, Default)]
pub struct InputState {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,

    mouse_position: Vec2,
    mouse_held: [bool; 8],
    mouse_pressed: [bool; 8],
    mouse_released: [bool; 8],

    action_map: HashMap<String, KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame flags and apply this frame's events.
    pub fn update(&mut self, events: &[InputEvent]) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_pressed.fill(false);
        self.mouse_released.fill(false);

        for event in events {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown(key) => {
                if self.keys_held.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            InputEvent::KeyUp(key) => {
                self.keys_held.remove(&key);
                self.keys_released.insert(key);
            }
            InputEvent::MouseDown { button, position } => {
                self.mouse_position = position;
                if let Some(idx) = mouse_button_index(button) {
                    if !self.mouse_held[idx] {
                        self.mouse_pressed[idx] = true;
                    }
                    self.mouse_held[idx] = true;
                }
            }
            InputEvent::MouseUp { button, position } => {
                self.mouse_position = position;
                if let Some(idx) = mouse_button_index(button) {
                    self.mouse_held[idx] = false;
                    self.mouse_released[idx] = true;
                }
            }
            InputEvent::MouseMotion { position } => {
                self.mouse_position = position;
            }
            InputEvent::Quit => {}
        }
    }

    /// Returns true if the key went down this frame.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the key is currently held down.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Returns true if the key was released this frame.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        mouse_button_index(button)
            .map(|idx| self.mouse_pressed[idx])
            .unwrap_or(false)
    }

    pub fn is_mouse_held(&self, button: MouseButton) -> bool {
        mouse_button_index(button)
            .map(|idx| self.mouse_held[idx])
            .unwrap_or(false)
    }

    pub fn is_mouse_released(&self, button: MouseButton) -> bool {
        mouse_button_index(button)
            .map(|idx| self.mouse_released[idx])
            .unwrap_or(false)
    }

    /// Last known pointer position in window pixels.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Bind `action` to a key. An action maps to one key; rebinding replaces it.
    pub fn map_action(&mut self, action: impl Into<String>, key: KeyCode) {
        self.action_map.insert(action.into(), key);
    }

    pub fn clear_action_map(&mut self) {
        self.action_map.clear();
    }

    pub fn is_action_pressed(&self, action: &str) -> bool {
        self.action_map
            .get(action)
            .is_some_and(|&key| self.is_key_pressed(key))
    }

    pub fn is_action_held(&self, action: &str) -> bool {
        self.action_map
            .get(action)
            .is_some_and(|&key| self.is_key_held(key))
    }

    pub fn is_action_released(&self, action: &str) -> bool {
        self.action_map
            .get(action)
            .is_some_and(|&key| self.is_key_released(key))
    }

    /// -1, 0 or 1 depending on which of the two keys are held.
    pub fn axis(&self, negative: KeyCode, positive: KeyCode) -> f64 {
        let mut value = 0.0;
        if self.is_key_held(negative) {
            value -= 1.0;
        }
        if self.is_key_held(positive) {
            value += 1.0;
        }
        value
    }
}

fn mouse_button_index(button: MouseButton) -> Option<usize> {
    match button {
        MouseButton::Left => Some(0),
        MouseButton::Right => Some(1),
        MouseButton::Middle => Some(2),
        MouseButton::Back => Some(3),
        MouseButton::Forward => Some(4),
        MouseButton::Other(id) => {
            let idx = 5 + id as usize;
            (idx < 8).then_some(idx)
        }
    }
}
