//! Keyboard state between host events and the simulation
//!
//! Host key events land here; once per frame `snapshot` turns them into a
//! `TickInput`. No raw event objects reach the simulation.

use crate::Millis;
use crate::sim::TickInput;

/// A held direction not refreshed by key repeat within this window is
/// treated as a lost key-up and released
pub const STUCK_KEY_TIMEOUT_MS: Millis = 10_000;

/// Keys whose state is "held"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Fire,
}

impl Key {
    const ALL: [Key; 5] = [Key::Left, Key::Right, Key::Up, Key::Down, Key::Fire];

    fn slot(self) -> usize {
        match self {
            Key::Left => 0,
            Key::Right => 1,
            Key::Up => 2,
            Key::Down => 3,
            Key::Fire => 4,
        }
    }
}

/// What a host key does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Hold(Key),
    /// Flip auto-fire on press
    AutoFire,
    /// Start a run or leave game over
    Start,
    /// Demo mode on/off
    Autopilot,
}

impl Binding {
    /// Map a `KeyboardEvent.key` value
    pub fn from_key_name(name: &str) -> Option<Self> {
        let binding = match name {
            "ArrowLeft" | "a" | "A" => Binding::Hold(Key::Left),
            "ArrowRight" | "d" | "D" => Binding::Hold(Key::Right),
            "ArrowUp" | "w" | "W" => Binding::Hold(Key::Up),
            "ArrowDown" | "s" | "S" => Binding::Hold(Key::Down),
            " " => Binding::Hold(Key::Fire),
            "f" | "F" => Binding::AutoFire,
            "Enter" => Binding::Start,
            "i" | "I" => Binding::Autopilot,
            _ => return None,
        };
        Some(binding)
    }
}

/// Held keys plus one-shot presses waiting for the next frame
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Last press or repeat time per held key
    held: [Option<Millis>; 5],
    auto_fire_pressed: bool,
    start_pressed: bool,
    pub autopilot: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key down (or key repeat) at `now`
    pub fn press(&mut self, binding: Binding, now: Millis) {
        match binding {
            Binding::Hold(key) => self.held[key.slot()] = Some(now),
            Binding::AutoFire => self.auto_fire_pressed = true,
            Binding::Start => self.start_pressed = true,
            Binding::Autopilot => {
                self.autopilot = !self.autopilot;
                log::info!("autopilot: {}", self.autopilot);
            }
        }
    }

    pub fn release(&mut self, binding: Binding) {
        if let Binding::Hold(key) = binding {
            self.held[key.slot()] = None;
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held[key.slot()].is_some()
    }

    /// Forget everything held or pending. Called on blur, focus, hidden
    /// tab and whenever play stops.
    pub fn release_all(&mut self) {
        self.held = [None; 5];
        self.auto_fire_pressed = false;
        self.start_pressed = false;
    }

    /// Release keys held past the stuck-key window. Returns how many.
    pub fn release_stale(&mut self, now: Millis) -> usize {
        let mut released = 0;
        for key in Key::ALL {
            if let Some(since) = self.held[key.slot()]
                && now.saturating_sub(since) > STUCK_KEY_TIMEOUT_MS
            {
                self.held[key.slot()] = None;
                released += 1;
            }
        }
        if released > 0 {
            log::warn!("released {released} stuck key(s)");
        }
        released
    }

    /// This frame's intents. One-shot presses are consumed.
    pub fn snapshot(&mut self, now: Millis) -> TickInput {
        self.release_stale(now);
        let start = std::mem::take(&mut self.start_pressed);
        TickInput {
            left: self.is_held(Key::Left),
            right: self.is_held(Key::Right),
            up: self.is_held(Key::Up),
            down: self.is_held(Key::Down),
            fire: self.is_held(Key::Fire),
            auto_fire_toggle: std::mem::take(&mut self.auto_fire_pressed),
            start,
            restart: start,
            autopilot: self.autopilot,
        }
    }
}
