//! Match-wide mutable state and the collaborator seams.
//!
//! The scoreboard is the only place lives, scores and currency change; the
//! resolution engine mutates it through the narrow methods below.
//! Achievements and the HUD live outside this crate and are reached
//! through injected trait objects so tests can supply fakes.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::entities::{BulletOwner, PlayerId};

/// External achievement collaborator. The core fires triggers; storage and
/// unlock bookkeeping belong to the host.
pub trait AchievementSink {
    fn unlock_achievement(&mut self, name: &str);
    fn on_enemy_defeated(&mut self);
}

/// External HUD collaborator for popup text. Write-only from the core.
pub trait Hud {
    fn show_health_popup(&mut self, text: &str);
}

/// No-op collaborators for headless runs and tests.
#[derive(Debug, Default)]
pub struct NoopAchievements;

impl AchievementSink for NoopAchievements {
    fn unlock_achievement(&mut self, _name: &str) {}
    fn on_enemy_defeated(&mut self) {}
}

#[derive(Debug, Default)]
pub struct NoopHud;

impl Hud for NoopHud {
    fn show_health_popup(&mut self, _text: &str) {}
}

#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct Scoreboard {
    pub two_player: bool,
    pub max_lives: i32,
    pub lives_p1: i32,
    pub lives_p2: i32,
    /// Legacy total, maintained alongside the per-player scores.
    pub score_total: i32,
    pub score_p1: i32,
    pub score_p2: i32,
    pub coin: i32,
    pub bullets_shot: u32,
    pub ships_destroyed: u32,
    /// Set once the match ends; collision families that only apply during
    /// active play are gated on this.
    pub level_finished: bool,
}

impl Scoreboard {
    pub fn new(max_lives: i32, two_player: bool) -> Self {
        Self {
            two_player,
            max_lives,
            lives_p1: max_lives,
            lives_p2: if two_player { max_lives } else { 0 },
            score_total: 0,
            score_p1: 0,
            score_p2: 0,
            coin: 0,
            bullets_shot: 0,
            ships_destroyed: 0,
            level_finished: false,
        }
    }

    /// Credits points to the owning player. Anything that is not a
    /// P2-owned bullet (enemy fire, legacy, boss) lands on P1; the total
    /// is always maintained.
    pub fn add_points_for(&mut self, owner: Option<PlayerId>, points: i32) {
        match owner {
            Some(PlayerId::P2) => self.score_p2 += points,
            _ => self.score_p1 += points,
        }
        self.score_total += points;
    }

    /// Canonical points-to-currency rule: floor division by ten.
    pub fn convert_points_to_coin(&mut self, points: i32) {
        self.coin += points / 10;
    }

    pub fn record_ship_destroyed(&mut self) {
        self.ships_destroyed += 1;
    }

    pub fn lives(&self, player: PlayerId) -> i32 {
        match player {
            PlayerId::P1 => self.lives_p1,
            PlayerId::P2 => self.lives_p2,
        }
    }

    /// Removes one life and returns the remaining count.
    pub fn lose_life(&mut self, player: PlayerId) -> i32 {
        let lives = match player {
            PlayerId::P1 => &mut self.lives_p1,
            PlayerId::P2 => &mut self.lives_p2,
        };
        *lives -= 1;
        *lives
    }

    /// Adds one life, capped at the match maximum.
    pub fn gain_life(&mut self, player: PlayerId) {
        let lives = match player {
            PlayerId::P1 => &mut self.lives_p1,
            PlayerId::P2 => &mut self.lives_p2,
        };
        if *lives < self.max_lives {
            *lives += 1;
        }
    }

    pub fn all_lives_spent(&self) -> bool {
        self.lives_p1 <= 0 && (!self.two_player || self.lives_p2 <= 0)
    }
}

/// Maps a bullet owner to the player credited for its kills.
pub fn credited_player(owner: BulletOwner) -> Option<PlayerId> {
    match owner {
        BulletOwner::Player(player) => Some(player),
        _ => None,
    }
}
