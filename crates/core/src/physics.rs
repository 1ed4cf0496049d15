//! Collision primitives and playfield geometry.
//!
//! Simple axis-aligned overlap tests - no physics engine, the game only
//! needs rectangle overlap with exact tie-break semantics.

use bincode::{Decode, Encode};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Positional footprint shared by every entity kind: center point plus
/// full width/height.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Encode, Decode)]
pub struct Body {
    #[bincode(with_serde)]
    pub pos: Vec2,
    #[bincode(with_serde)]
    pub size: Vec2,
}

impl Body {
    pub const fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    pub fn half_size(&self) -> Vec2 {
        self.size * 0.5
    }
}

/// AABB overlap with closed-center semantics: the center distance must be
/// strictly less than the half-size sum on both axes. Two bodies exactly
/// touching edge to edge do not collide.
#[inline]
pub fn collides(a: &Body, b: &Body) -> bool {
    let diff = (a.pos - b.pos).abs();
    let reach = (a.size + b.size) * 0.5;
    diff.x < reach.x && diff.y < reach.y
}

/// The playable area. `hud_line` is the top boundary below the score HUD;
/// `item_line` is the bottom of the band ships may occupy. Projectiles and
/// items are culled once they leave the `hud_line..height` range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Encode, Decode)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
    pub hud_line: f32,
    pub item_line: f32,
}

impl Playfield {
    pub const fn new(width: f32, height: f32, hud_line: f32, item_line: f32) -> Self {
        Self {
            width,
            height,
            hud_line,
            item_line,
        }
    }

    /// True once a vertically-moving body has left the scoring area.
    pub fn is_past_vertical_bounds(&self, body: &Body) -> bool {
        body.pos.y < self.hud_line || body.pos.y > self.height
    }

    /// True once a body is fully outside the field on any side.
    pub fn is_offscreen(&self, body: &Body) -> bool {
        let half = body.half_size();
        body.pos.x + half.x < 0.0
            || body.pos.x - half.x > self.width
            || body.pos.y + half.y < 0.0
            || body.pos.y - half.y > self.height
    }

    /// Clamps a ship center into the band it is allowed to occupy.
    pub fn clamp_to_ship_band(&self, body: &Body) -> Vec2 {
        let half = body.half_size();
        Vec2::new(
            body.pos.x.clamp(half.x, self.width - half.x),
            body.pos.y.clamp(self.hud_line + half.y, self.item_line - half.y),
        )
    }
}

impl Default for Playfield {
    fn default() -> Self {
        // Classic 448x520 field with a 45px HUD strip and the item shelf
        // at 400px.
        Self::new(448.0, 520.0, 45.0, 400.0)
    }
}
