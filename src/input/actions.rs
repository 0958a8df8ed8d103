//! Key commands and their bindings

use std::collections::HashMap;
use macroquad::input::KeyCode;
use crate::camera::CameraMove;

/// Everything a key press can ask the editor to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Translate or roll the camera one step
    Camera(CameraMove),
    /// Capture the current pose at the playhead
    AddKeyFrame,
    /// Start playback, or stop it if running
    TogglePlayback,
    /// Put every bone back in rest pose
    ResetScene,
    /// Load the scene bound to a number key slot (0-based)
    LoadScene(usize),
}

/// Number keys in slot order
const SCENE_KEYS: [KeyCode; 8] = [
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Key4,
    KeyCode::Key5,
    KeyCode::Key6,
    KeyCode::Key7,
    KeyCode::Key8,
];

/// Key to command dispatch table
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    bindings: HashMap<KeyCode, Command>,
}

impl KeyBindings {
    /// A table with nothing bound
    pub fn empty() -> Self {
        Self { bindings: HashMap::new() }
    }

    pub fn bind(&mut self, key: KeyCode, command: Command) -> &mut Self {
        self.bindings.insert(key, command);
        self
    }

    pub fn unbind(&mut self, key: KeyCode) -> Option<Command> {
        self.bindings.remove(&key)
    }

    pub fn command(&self, key: KeyCode) -> Option<Command> {
        self.bindings.get(&key).copied()
    }

    /// Keys bound to a command, in no particular order
    pub fn keys_for(&self, command: Command) -> impl Iterator<Item = KeyCode> + '_ {
        self.bindings
            .iter()
            .filter(move |(_, c)| **c == command)
            .map(|(k, _)| *k)
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings
            // Camera translate
            .bind(KeyCode::W, Command::Camera(CameraMove::Forward))
            .bind(KeyCode::S, Command::Camera(CameraMove::Backward))
            .bind(KeyCode::A, Command::Camera(CameraMove::Left))
            .bind(KeyCode::D, Command::Camera(CameraMove::Right))
            .bind(KeyCode::Up, Command::Camera(CameraMove::Up))
            .bind(KeyCode::Down, Command::Camera(CameraMove::Down))
            // Camera roll
            .bind(KeyCode::Left, Command::Camera(CameraMove::RollLeft))
            .bind(KeyCode::Right, Command::Camera(CameraMove::RollRight))
            // Timeline
            .bind(KeyCode::K, Command::AddKeyFrame)
            .bind(KeyCode::Space, Command::TogglePlayback)
            .bind(KeyCode::P, Command::TogglePlayback)
            .bind(KeyCode::R, Command::ResetScene);

        for (slot, key) in SCENE_KEYS.iter().enumerate() {
            bindings.bind(*key, Command::LoadScene(slot));
        }
        bindings
    }
}
