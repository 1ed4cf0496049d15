//! Boss state machines.
//!
//! Both bosses derive their phase purely from the health ratio and
//! transition to destroyed exactly once, at the tick health first reaches
//! zero. The defeat side effects (score, achievement, next-boss spawn) hang
//! off that single transition in the resolution engine; `take_damage` on a
//! destroyed boss is a no-op so later ticks can never re-fire them.

use bincode::{Decode, Encode};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entities::BossBullet;
use crate::physics::{Body, Playfield};

/// Frames a boss explosion stays on screen before the slot is free for the
/// next phase.
pub const BOSS_EXPLOSION_FRAMES: u32 = 36;

/// Attack-pattern mode, a pure function of current/max health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum BossPhase {
    Cruising,
    Enraged,
}

fn phase_for(health: i32, max_health: i32) -> BossPhase {
    if health * 4 <= max_health {
        BossPhase::Enraged
    } else {
        BossPhase::Cruising
    }
}

// ---------------------------------------------------------------------------
// Mid boss

const MID_BOSS_SPEED: f32 = 1.5;
const MID_BOSS_DESCENT: f32 = 0.25;

/// The mid-encounter boss: a sweeping bruiser with no bullet patterns of
/// its own. Contact and player fire are the whole exchange.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct MidBoss {
    pub body: Body,
    pub health: i32,
    pub max_health: i32,
    pub destroyed: bool,
    pub explosion_frames: u32,
    direction: f32,
}

impl MidBoss {
    pub const SIZE: Vec2 = Vec2::new(64.0, 40.0);
    pub const MAX_HEALTH: i32 = 120;
    pub const POINT_VALUE: i32 = 500;
    /// Lowest point of the descent, above the ship band.
    const FLOOR_MARGIN: f32 = 120.0;

    pub fn new(field: &Playfield) -> Self {
        Self {
            body: Body::new(
                Vec2::new(field.width * 0.5, field.hud_line + 40.0),
                Self::SIZE,
            ),
            health: Self::MAX_HEALTH,
            max_health: Self::MAX_HEALTH,
            destroyed: false,
            explosion_frames: 0,
            direction: 1.0,
        }
    }

    pub fn phase(&self) -> BossPhase {
        phase_for(self.health, self.max_health)
    }

    pub fn update(&mut self, field: &Playfield) {
        if self.destroyed {
            if self.explosion_frames > 0 {
                self.explosion_frames -= 1;
            }
            return;
        }

        let speed = match self.phase() {
            BossPhase::Cruising => MID_BOSS_SPEED,
            BossPhase::Enraged => MID_BOSS_SPEED * 1.5,
        };
        self.body.pos.x += speed * self.direction;

        let half = self.body.half_size().x;
        if self.body.pos.x - half <= 0.0 {
            self.body.pos.x = half;
            self.direction = 1.0;
        } else if self.body.pos.x + half >= field.width {
            self.body.pos.x = field.width - half;
            self.direction = -1.0;
        }

        let floor = field.item_line - Self::FLOOR_MARGIN;
        if self.body.pos.y < floor {
            self.body.pos.y += MID_BOSS_DESCENT;
        }
    }

    pub fn take_damage(&mut self, damage: i32) {
        if self.destroyed {
            return;
        }
        self.health = (self.health - damage).max(0);
    }

    pub fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.explosion_frames = BOSS_EXPLOSION_FRAMES;
        }
    }

    /// Explosion finished; the encounter may move on.
    pub fn is_gone(&self) -> bool {
        self.destroyed && self.explosion_frames == 0
    }
}

// ---------------------------------------------------------------------------
// Final boss

const FINAL_BOSS_SPEED: f32 = 1.0;
const SPREAD_INTERVAL: u32 = 60;
const AIMED_INTERVAL: u32 = 90;
const BARRAGE_INTERVAL: u32 = 45;

#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct FinalBoss {
    pub body: Body,
    pub health: i32,
    pub max_health: i32,
    pub destroyed: bool,
    pub explosion_frames: u32,
    direction: f32,
    spread_timer: u32,
    aimed_timer: u32,
    barrage_timer: u32,
    enrage_cleared: bool,
}

impl FinalBoss {
    pub const SIZE: Vec2 = Vec2::new(100.0, 60.0);
    pub const MAX_HEALTH: i32 = 300;
    pub const POINT_VALUE: i32 = 1000;

    pub fn new(field: &Playfield) -> Self {
        Self {
            body: Body::new(
                Vec2::new(field.width * 0.5, field.hud_line + 60.0),
                Self::SIZE,
            ),
            health: Self::MAX_HEALTH,
            max_health: Self::MAX_HEALTH,
            destroyed: false,
            explosion_frames: 0,
            direction: 1.0,
            spread_timer: SPREAD_INTERVAL,
            aimed_timer: AIMED_INTERVAL,
            barrage_timer: BARRAGE_INTERVAL,
            enrage_cleared: false,
        }
    }

    pub fn phase(&self) -> BossPhase {
        phase_for(self.health, self.max_health)
    }

    pub fn update(&mut self, field: &Playfield) {
        if self.destroyed {
            if self.explosion_frames > 0 {
                self.explosion_frames -= 1;
            }
            return;
        }

        self.body.pos.x += FINAL_BOSS_SPEED * self.direction;
        let half = self.body.half_size().x;
        if self.body.pos.x - half <= 0.0 {
            self.body.pos.x = half;
            self.direction = 1.0;
        } else if self.body.pos.x + half >= field.width {
            self.body.pos.x = field.width - half;
            self.direction = -1.0;
        }
    }

    /// Fan of three slow bullets straight down. Active while cruising.
    pub fn shoot_spread(&mut self) -> Vec<BossBullet> {
        if self.spread_timer > 0 {
            self.spread_timer -= 1;
            return Vec::new();
        }
        self.spread_timer = SPREAD_INTERVAL;

        let muzzle = self.body.pos + Vec2::new(0.0, self.body.half_size().y);
        vec![
            BossBullet::new(muzzle, Vec2::new(-1.5, 3.0)),
            BossBullet::new(muzzle, Vec2::new(0.0, 3.5)),
            BossBullet::new(muzzle, Vec2::new(1.5, 3.0)),
        ]
    }

    /// Single bullet aimed at a ship. Active while cruising.
    pub fn shoot_aimed(&mut self, target: Vec2) -> Vec<BossBullet> {
        if self.aimed_timer > 0 {
            self.aimed_timer -= 1;
            return Vec::new();
        }
        self.aimed_timer = AIMED_INTERVAL;

        let muzzle = self.body.pos + Vec2::new(0.0, self.body.half_size().y);
        let direction = (target - muzzle).normalize_or_zero();
        if direction == Vec2::ZERO {
            return Vec::new();
        }
        vec![BossBullet::new(muzzle, direction * 4.0)]
    }

    /// Wide five-way fan, the enraged pattern.
    pub fn shoot_barrage(&mut self) -> Vec<BossBullet> {
        if self.barrage_timer > 0 {
            self.barrage_timer -= 1;
            return Vec::new();
        }
        self.barrage_timer = BARRAGE_INTERVAL;

        let muzzle = self.body.pos + Vec2::new(0.0, self.body.half_size().y);
        [-60.0f32, -30.0, 0.0, 30.0, 60.0]
            .iter()
            .map(|degrees| {
                let radians = degrees.to_radians();
                let velocity = Vec2::new(radians.sin(), radians.cos()) * 3.5;
                BossBullet::new(muzzle, velocity)
            })
            .collect()
    }

    /// True exactly once, at the tick the boss first drops into the
    /// enraged phase; the caller clears all in-flight boss bullets.
    pub fn begin_enrage(&mut self) -> bool {
        if self.phase() == BossPhase::Enraged && !self.enrage_cleared {
            self.enrage_cleared = true;
            true
        } else {
            false
        }
    }

    pub fn take_damage(&mut self, damage: i32) {
        if self.destroyed {
            return;
        }
        self.health = (self.health - damage).max(0);
    }

    pub fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.explosion_frames = BOSS_EXPLOSION_FRAMES;
        }
    }

    pub fn is_gone(&self) -> bool {
        self.destroyed && self.explosion_frames == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_thresholds() {
        assert_eq!(phase_for(100, 100), BossPhase::Cruising);
        assert_eq!(phase_for(26, 100), BossPhase::Cruising);
        assert_eq!(phase_for(25, 100), BossPhase::Enraged);
        assert_eq!(phase_for(0, 100), BossPhase::Enraged);
    }

    #[test]
    fn mid_boss_destroyed_exactly_once() {
        let field = Playfield::default();
        let mut boss = MidBoss::new(&field);
        boss.take_damage(MidBoss::MAX_HEALTH);
        assert_eq!(boss.health, 0);
        assert!(!boss.destroyed);

        boss.destroy();
        assert!(boss.destroyed);
        let frames = boss.explosion_frames;

        // No-ops once destroyed.
        boss.take_damage(10);
        boss.destroy();
        assert_eq!(boss.health, 0);
        assert_eq!(boss.explosion_frames, frames);
    }

    #[test]
    fn mid_boss_is_gone_after_explosion() {
        let field = Playfield::default();
        let mut boss = MidBoss::new(&field);
        boss.take_damage(MidBoss::MAX_HEALTH);
        boss.destroy();
        assert!(!boss.is_gone());

        for _ in 0..BOSS_EXPLOSION_FRAMES {
            boss.update(&field);
        }
        assert!(boss.is_gone());
    }

    #[test]
    fn mid_boss_stays_on_field() {
        let field = Playfield::default();
        let mut boss = MidBoss::new(&field);
        for _ in 0..5000 {
            boss.update(&field);
            let half = boss.body.half_size().x;
            assert!(boss.body.pos.x - half >= 0.0);
            assert!(boss.body.pos.x + half <= field.width);
            assert!(boss.body.pos.y <= field.item_line);
        }
    }

    #[test]
    fn spread_fires_on_cooldown() {
        let field = Playfield::default();
        let mut boss = FinalBoss::new(&field);

        let mut bursts = 0;
        for _ in 0..=(SPREAD_INTERVAL * 2 + 1) {
            let shots = boss.shoot_spread();
            if !shots.is_empty() {
                assert_eq!(shots.len(), 3);
                bursts += 1;
            }
        }
        assert_eq!(bursts, 2);
    }

    #[test]
    fn aimed_shot_tracks_target() {
        let field = Playfield::default();
        let mut boss = FinalBoss::new(&field);
        boss.aimed_timer = 0;

        let target = Vec2::new(boss.body.pos.x - 80.0, 400.0);
        let shots = boss.shoot_aimed(target);
        assert_eq!(shots.len(), 1);
        assert!(shots[0].velocity.x < 0.0);
        assert!(shots[0].velocity.y > 0.0);
    }

    #[test]
    fn barrage_is_wider_than_spread() {
        let field = Playfield::default();
        let mut boss = FinalBoss::new(&field);
        boss.barrage_timer = 0;
        let shots = boss.shoot_barrage();
        assert_eq!(shots.len(), 5);
        // All bullets travel downward.
        assert!(shots.iter().all(|b| b.velocity.y > 0.0));
    }

    #[test]
    fn enrage_transition_fires_once() {
        let field = Playfield::default();
        let mut boss = FinalBoss::new(&field);
        assert!(!boss.begin_enrage());

        boss.take_damage(FinalBoss::MAX_HEALTH * 3 / 4);
        assert_eq!(boss.phase(), BossPhase::Enraged);
        assert!(boss.begin_enrage());
        assert!(!boss.begin_enrage());
    }
}
