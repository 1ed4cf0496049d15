//! Enemy formations.
//!
//! The grid formation owns the classic sweep (step sideways, reverse and
//! descend at an edge) plus the slowdown and pushback modifiers applied to
//! it as a whole. The special formation is a timed spawner of bonus ships
//! crossing the top of the field. Both obey the same eviction discipline:
//! `destroy` only marks a member, the member leaves iteration on the next
//! `update` once its explosion grace has elapsed.

pub mod infinite;

use bincode::{Decode, Encode};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entities::{
    Bullet, BulletOwner, EnemyClass, EnemyShip, EntityId, EntityIdGenerator,
};
use crate::level::LevelConfig;
use crate::physics::Playfield;
use crate::pool::BulletPool;
use crate::random::SeededRandom;

const COLUMN_SPACING: f32 = 40.0;
const ROW_SPACING: f32 = 32.0;
const SIDE_MARGIN: f32 = 40.0;
const TOP_MARGIN: f32 = 30.0;
const HORIZONTAL_STEP: f32 = 8.0;
const DESCENT_STEP: f32 = 16.0;
/// Frames the Slow drop stretches the movement cadence.
const SLOWDOWN_FRAMES: u32 = 600;

#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct EnemyFormation {
    pub members: Vec<EnemyShip>,
    direction: f32,
    move_timer: u32,
    movement_interval: u32,
    shoot_timer: u32,
    shooting_interval: u32,
    slowdown_frames: u32,
}

impl EnemyFormation {
    pub fn new(level: &LevelConfig, field: &Playfield, ids: &mut EntityIdGenerator) -> Self {
        let mut members = Vec::with_capacity((level.formation_columns * level.formation_rows) as usize);
        // Back rows are worth more: top third C, middle third B, rest A.
        let third = level.formation_rows.div_ceil(3);
        for row in 0..level.formation_rows {
            let class = if row < third {
                EnemyClass::C
            } else if row < third * 2 {
                EnemyClass::B
            } else {
                EnemyClass::A
            };
            for column in 0..level.formation_columns {
                let pos = Vec2::new(
                    SIDE_MARGIN + column as f32 * COLUMN_SPACING,
                    field.hud_line + TOP_MARGIN + row as f32 * ROW_SPACING,
                );
                members.push(EnemyShip::new(ids.next(), pos, class));
            }
        }

        Self {
            members,
            direction: 1.0,
            move_timer: level.movement_interval,
            movement_interval: level.movement_interval,
            shoot_timer: level.shooting_interval,
            shooting_interval: level.shooting_interval,
            slowdown_frames: 0,
        }
    }

    /// Movement cadence, stretched while a slowdown is active.
    fn effective_interval(&self) -> u32 {
        if self.slowdown_frames > 0 {
            self.movement_interval * 2
        } else {
            self.movement_interval
        }
    }

    /// Advances explosions, evicts finished members and applies the sweep
    /// movement. Destroyed members never move but stay in iteration until
    /// their explosion ends.
    pub fn update(&mut self, field: &Playfield) {
        if self.slowdown_frames > 0 {
            self.slowdown_frames -= 1;
        }

        for member in &mut self.members {
            if member.destroyed && member.explosion_frames > 0 {
                member.explosion_frames -= 1;
            }
        }
        self.members.retain(|member| !member.is_explosion_finished());

        if self.move_timer > 0 {
            self.move_timer -= 1;
            return;
        }
        self.move_timer = self.effective_interval();

        let step = HORIZONTAL_STEP * self.direction;
        let would_cross_edge = self.members.iter().filter(|m| !m.destroyed).any(|m| {
            let next_x = m.body.pos.x + step;
            let half = m.body.half_size().x;
            next_x - half < 0.0 || next_x + half > field.width
        });

        if would_cross_edge {
            self.direction = -self.direction;
            for member in &mut self.members {
                if !member.destroyed {
                    member.body.pos.y += DESCENT_STEP;
                }
            }
        } else {
            for member in &mut self.members {
                if !member.destroyed {
                    member.body.pos.x += step;
                }
            }
        }
    }

    /// Fires one enemy bullet from a random live member at the level's
    /// cadence.
    pub fn shoot(
        &mut self,
        rng: &mut SeededRandom,
        pool: &mut BulletPool,
        bullets: &mut Vec<Bullet>,
    ) {
        if self.shoot_timer > 0 {
            self.shoot_timer -= 1;
            return;
        }
        self.shoot_timer = self.shooting_interval;

        let shooters: Vec<usize> = self
            .members
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.destroyed)
            .map(|(i, _)| i)
            .collect();
        if let Some(pick) = rng.pick_index(&shooters) {
            let shooter = &self.members[shooters[pick]];
            let muzzle = shooter.body.pos + Vec2::new(0.0, shooter.body.half_size().y);
            bullets.push(pool.acquire(muzzle, Bullet::ENEMY_SPEED, BulletOwner::Enemy, 0));
        }
    }

    /// Marks one member destroyed; eviction happens on a later `update`.
    pub fn destroy(&mut self, id: EntityId) {
        if let Some(member) = self.members.iter_mut().find(|m| m.id == id) {
            member.destroy();
        }
    }

    /// All members are either destroyed or already evicted; gates the
    /// wave-to-boss transition.
    pub fn is_cleared(&self) -> bool {
        self.members.iter().all(|m| m.destroyed)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.members.iter().filter(|m| !m.destroyed).count()
    }

    /// Displaces the formation backward (up the field).
    pub fn push_back(&mut self, distance: f32) {
        for member in &mut self.members {
            member.body.pos.y -= distance;
        }
    }

    pub fn activate_slowdown(&mut self) {
        self.slowdown_frames = SLOWDOWN_FRAMES;
    }

    pub fn is_slowed(&self) -> bool {
        self.slowdown_frames > 0
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}

// ---------------------------------------------------------------------------
// Special (bonus) formation

const SPECIAL_INTERVAL: u32 = 1200;
const SPECIAL_VARIANCE: u32 = 600;
const SPECIAL_SPEED: f32 = 2.0;

/// Bonus ships that cross the top of the field on a timer. All live
/// members drift in the direction they spawned with; offscreen members
/// despawn silently.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct SpecialFormation {
    pub members: Vec<EnemyShip>,
    drift: f32,
    spawn_timer: u32,
}

impl SpecialFormation {
    pub fn new(rng: &mut SeededRandom) -> Self {
        Self {
            members: Vec::new(),
            drift: SPECIAL_SPEED,
            spawn_timer: SPECIAL_INTERVAL + rng.next_int(SPECIAL_VARIANCE),
        }
    }

    pub fn update(
        &mut self,
        field: &Playfield,
        rng: &mut SeededRandom,
        ids: &mut EntityIdGenerator,
    ) {
        for member in &mut self.members {
            if member.destroyed {
                if member.explosion_frames > 0 {
                    member.explosion_frames -= 1;
                }
            } else {
                member.body.pos.x += self.drift;
            }
        }
        // Members spawn just outside the entry edge, so only the exit edge
        // despawns them.
        let drift = self.drift;
        self.members.retain(|m| {
            if m.is_explosion_finished() {
                return false;
            }
            let half = m.body.half_size().x;
            if drift > 0.0 {
                m.body.pos.x - half <= field.width
            } else {
                m.body.pos.x + half >= 0.0
            }
        });

        if self.spawn_timer > 0 {
            self.spawn_timer -= 1;
            return;
        }
        self.spawn_timer = SPECIAL_INTERVAL + rng.next_int(SPECIAL_VARIANCE);

        // Alternate entry side; the drift applies to the whole wave.
        let from_left = rng.roll(0.5);
        self.drift = if from_left { SPECIAL_SPEED } else { -SPECIAL_SPEED };
        let x = if from_left {
            -EnemyShip::SIZE.x
        } else {
            field.width + EnemyShip::SIZE.x
        };
        let pos = Vec2::new(x, field.hud_line + 20.0);
        self.members
            .push(EnemyShip::new(ids.next(), pos, EnemyClass::Special));
    }

    pub fn destroy(&mut self, id: EntityId) {
        if let Some(member) = self.members.iter_mut().find(|m| m.id == id) {
            member.destroy();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formation() -> (EnemyFormation, Playfield) {
        let field = Playfield::default();
        let mut ids = EntityIdGenerator::new();
        let level = LevelConfig {
            formation_columns: 5,
            formation_rows: 4,
            movement_interval: 2,
            shooting_interval: 3,
            ..LevelConfig::default()
        };
        (EnemyFormation::new(&level, &field, &mut ids), field)
    }

    #[test]
    fn builds_full_grid() {
        let (formation, _) = formation();
        assert_eq!(formation.members.len(), 20);
        assert!(!formation.is_cleared());
        assert!(!formation.is_empty());
    }

    #[test]
    fn back_rows_are_tougher() {
        let field = Playfield::default();
        let mut ids = EntityIdGenerator::new();
        let level = LevelConfig {
            formation_columns: 5,
            formation_rows: 6,
            ..LevelConfig::default()
        };
        let formation = EnemyFormation::new(&level, &field, &mut ids);

        // 6 rows, ceil(6/3) = 2: rows 0-1 are C, 2-3 are B, 4-5 are A.
        assert_eq!(formation.members[0].class, EnemyClass::C);
        assert_eq!(formation.members[2 * 5].class, EnemyClass::B);
        assert_eq!(formation.members[4 * 5].class, EnemyClass::A);
        assert_eq!(formation.members[5 * 5 + 4].class, EnemyClass::A);
    }

    #[test]
    fn destroy_marks_but_does_not_evict() {
        let (mut formation, field) = formation();
        let id = formation.members[0].id;
        formation.destroy(id);

        assert!(formation.members[0].destroyed);
        assert_eq!(formation.members.len(), 20);

        // Still present while the explosion plays out.
        formation.update(&field);
        assert_eq!(formation.members.len(), 20);

        for _ in 0..crate::entities::ENEMY_EXPLOSION_FRAMES {
            formation.update(&field);
        }
        assert_eq!(formation.members.len(), 19);
    }

    #[test]
    fn destroying_everything_clears_the_wave() {
        let (mut formation, _) = formation();
        let ids: Vec<EntityId> = formation.members.iter().map(|m| m.id).collect();
        for id in ids {
            formation.destroy(id);
        }
        assert!(formation.is_cleared());
        assert_eq!(formation.live_count(), 0);
    }

    #[test]
    fn formation_moves_over_time() {
        let (mut formation, field) = formation();
        let start = formation.members[0].body.pos;
        for _ in 0..30 {
            formation.update(&field);
        }
        assert_ne!(formation.members[0].body.pos, start);
    }

    #[test]
    fn slowdown_stretches_the_cadence() {
        let (mut normal, field) = formation();
        let (mut slowed, _) = formation();
        slowed.activate_slowdown();
        assert!(slowed.is_slowed());

        for _ in 0..12 {
            normal.update(&field);
            slowed.update(&field);
        }
        // Both sweep right from the same origin; the slowed formation has
        // taken fewer steps.
        assert!(slowed.members[0].body.pos.x < normal.members[0].body.pos.x);
    }

    #[test]
    fn pushback_moves_members_up() {
        let (mut formation, _) = formation();
        let before = formation.members[0].body.pos.y;
        formation.push_back(20.0);
        assert_eq!(formation.members[0].body.pos.y, before - 20.0);
    }

    #[test]
    fn shoot_emits_enemy_bullets() {
        let (mut formation, _) = formation();
        let mut rng = SeededRandom::new(11);
        let mut pool = BulletPool::new();
        let mut bullets = Vec::new();

        for _ in 0..10 {
            formation.shoot(&mut rng, &mut pool, &mut bullets);
        }
        assert!(!bullets.is_empty());
        assert!(bullets.iter().all(|b| b.owner == BulletOwner::Enemy && b.speed > 0.0));
    }

    #[test]
    fn special_formation_spawns_on_timer() {
        let field = Playfield::default();
        let mut rng = SeededRandom::new(5);
        let mut ids = EntityIdGenerator::new();
        let mut special = SpecialFormation::new(&mut rng);

        let mut spawned_at = None;
        for tick in 0..=(SPECIAL_INTERVAL + SPECIAL_VARIANCE) {
            special.update(&field, &mut rng, &mut ids);
            if !special.is_empty() {
                spawned_at = Some(tick);
                break;
            }
        }

        assert!(spawned_at.is_some(), "a special ship appears within one interval");
        assert!(spawned_at.unwrap() >= SPECIAL_INTERVAL - 1);
        assert_eq!(special.members[0].class, EnemyClass::Special);
    }
}
