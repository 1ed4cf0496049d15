//! Per-tick player intents.
//!
//! One `PlayerInput` per player per frame. Local keyboard input and the
//! external controller produce the same struct, so the simulation cannot
//! tell them apart.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Bitflags for one player's input state, packed into a u16.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct PlayerInput {
    pub bits: u16,
}

impl PlayerInput {
    pub const UP: u16 = 1 << 0;
    pub const DOWN: u16 = 1 << 1;
    pub const LEFT: u16 = 1 << 2;
    pub const RIGHT: u16 = 1 << 3;
    pub const FIRE: u16 = 1 << 4;

    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self { bits }
    }

    #[inline]
    pub const fn is_pressed(&self, input: u16) -> bool {
        self.bits & input != 0
    }

    #[inline]
    pub fn set(&mut self, input: u16, pressed: bool) {
        if pressed {
            self.bits |= input;
        } else {
            self.bits &= !input;
        }
    }

    #[inline]
    pub const fn fire(&self) -> bool {
        self.is_pressed(Self::FIRE)
    }

    /// Horizontal axis as -1, 0 or 1; opposing keys cancel.
    pub const fn horizontal(&self) -> i8 {
        match (self.is_pressed(Self::LEFT), self.is_pressed(Self::RIGHT)) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }

    /// Vertical axis as -1, 0 or 1; positive is down.
    pub const fn vertical(&self) -> i8 {
        match (self.is_pressed(Self::UP), self.is_pressed(Self::DOWN)) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_round_trip() {
        let mut input = PlayerInput::new();
        assert!(!input.fire());

        input.set(PlayerInput::FIRE, true);
        input.set(PlayerInput::LEFT, true);
        assert!(input.fire());
        assert_eq!(input.horizontal(), -1);

        input.set(PlayerInput::FIRE, false);
        assert!(!input.fire());
    }

    #[test]
    fn opposing_axes_cancel() {
        let mut input = PlayerInput::from_bits(PlayerInput::LEFT | PlayerInput::RIGHT);
        assert_eq!(input.horizontal(), 0);

        input.set(PlayerInput::LEFT, false);
        assert_eq!(input.horizontal(), 1);

        input.set(PlayerInput::UP, true);
        input.set(PlayerInput::DOWN, true);
        assert_eq!(input.vertical(), 0);
    }
}
