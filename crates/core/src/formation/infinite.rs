//! Free-floating formation for infinite mode.
//!
//! No grid: enemies stream in from the top and sides with per-member
//! movement patterns and self-report when they have left the field or
//! finished exploding. The formation evicts on either condition during
//! `update`, counting despawns and kills separately. Spawning accelerates
//! over time and later spawns carry bonus health.

use bincode::{Decode, Encode};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entities::{Bullet, BulletOwner, EntityId, EntityIdGenerator, ENEMY_EXPLOSION_FRAMES};
use crate::physics::{Body, Playfield};
use crate::pool::BulletPool;
use crate::random::SeededRandom;

const STRAIGHT_SPEED_Y: f32 = 4.0;
const ZIGZAG_SPEED_X: f32 = 3.0;
const ZIGZAG_SPEED_Y: f32 = 2.5;
const HORIZONTAL_SPEED_X: f32 = 4.5;

/// Frames between formation-level shots.
const FORMATION_SHOOT_INTERVAL: u32 = 12;
/// Frames between shots from any single member.
const MEMBER_SHOOT_INTERVAL: u32 = 90;

/// Spawn schedule: start at one spawn per second, tighten every twenty
/// seconds down to the floor.
const INITIAL_SPAWN_INTERVAL: u32 = 60;
const MIN_SPAWN_INTERVAL: u32 = 12;
const SPAWN_INTERVAL_DECREASE: u32 = 6;
const DIFFICULTY_STEP_FRAMES: u32 = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum MovementPattern {
    StraightDown,
    ZigzagDown,
    Horizontal,
}

impl MovementPattern {
    pub fn point_value(&self) -> i32 {
        match self {
            MovementPattern::StraightDown => 10,
            MovementPattern::ZigzagDown => 15,
            MovementPattern::Horizontal => 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct InfiniteEnemy {
    pub id: EntityId,
    pub body: Body,
    pub pattern: MovementPattern,
    pub health: i32,
    pub max_health: i32,
    pub destroyed: bool,
    pub explosion_frames: u32,
    speed_x: f32,
    speed_y: f32,
    zigzag_direction: f32,
    shoot_cooldown: u32,
}

impl InfiniteEnemy {
    pub const SIZE: Vec2 = Vec2::new(24.0, 16.0);

    pub fn new(
        id: EntityId,
        pos: Vec2,
        pattern: MovementPattern,
        health: i32,
        rng: &mut SeededRandom,
    ) -> Self {
        let (speed_x, speed_y, zigzag_direction) = match pattern {
            MovementPattern::StraightDown => (0.0, STRAIGHT_SPEED_Y, 1.0),
            MovementPattern::ZigzagDown => (
                ZIGZAG_SPEED_X,
                ZIGZAG_SPEED_Y,
                if rng.roll(0.5) { 1.0 } else { -1.0 },
            ),
            MovementPattern::Horizontal => {
                // Entering from the left moves right, and vice versa.
                let speed = if pos.x < 0.0 {
                    HORIZONTAL_SPEED_X
                } else {
                    -HORIZONTAL_SPEED_X
                };
                (speed, 0.0, 1.0)
            }
        };

        Self {
            id,
            body: Body::new(pos, Self::SIZE),
            pattern,
            health,
            max_health: health,
            destroyed: false,
            explosion_frames: 0,
            speed_x,
            speed_y,
            zigzag_direction,
            shoot_cooldown: MEMBER_SHOOT_INTERVAL,
        }
    }

    pub fn update(&mut self, field: &Playfield) {
        if self.destroyed {
            if self.explosion_frames > 0 {
                self.explosion_frames -= 1;
            }
            return;
        }

        if self.shoot_cooldown > 0 {
            self.shoot_cooldown -= 1;
        }

        match self.pattern {
            MovementPattern::StraightDown => {
                self.body.pos.y += self.speed_y;
            }
            MovementPattern::ZigzagDown => {
                self.body.pos.y += self.speed_y;
                self.body.pos.x += self.speed_x * self.zigzag_direction;

                let half = self.body.half_size().x;
                if self.body.pos.x - half <= 0.0 {
                    self.body.pos.x = half;
                    self.zigzag_direction = 1.0;
                } else if self.body.pos.x + half >= field.width {
                    self.body.pos.x = field.width - half;
                    self.zigzag_direction = -1.0;
                }
            }
            MovementPattern::Horizontal => {
                self.body.pos.x += self.speed_x;
            }
        }
    }

    /// Off the field in its direction of travel.
    pub fn should_despawn(&self, field: &Playfield) -> bool {
        match self.pattern {
            MovementPattern::StraightDown | MovementPattern::ZigzagDown => {
                self.body.pos.y - self.body.half_size().y > field.height
            }
            MovementPattern::Horizontal => {
                if self.speed_x > 0.0 {
                    self.body.pos.x - self.body.half_size().x > field.width
                } else {
                    self.body.pos.x + self.body.half_size().x < 0.0
                }
            }
        }
    }

    pub fn take_damage(&mut self, damage: i32) {
        if self.destroyed {
            return;
        }
        self.health = (self.health - damage).max(0);
        if self.health == 0 {
            self.destroy();
        }
    }

    pub fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.explosion_frames = ENEMY_EXPLOSION_FRAMES;
        }
    }

    pub fn is_explosion_finished(&self) -> bool {
        self.destroyed && self.explosion_frames == 0
    }

    pub fn can_shoot(&self) -> bool {
        !self.destroyed && self.shoot_cooldown == 0
    }

    pub fn point_value(&self) -> i32 {
        self.pattern.point_value()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct InfiniteFormation {
    pub members: Vec<InfiniteEnemy>,
    shoot_timer: u32,
    spawn_timer: u32,
    spawn_interval: u32,
    difficulty_timer: u32,
    difficulty_steps: u32,
    destroyed_count: u32,
    despawned_count: u32,
}

impl InfiniteFormation {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            shoot_timer: FORMATION_SHOOT_INTERVAL,
            spawn_timer: INITIAL_SPAWN_INTERVAL,
            spawn_interval: INITIAL_SPAWN_INTERVAL,
            difficulty_timer: DIFFICULTY_STEP_FRAMES,
            difficulty_steps: 0,
            destroyed_count: 0,
            despawned_count: 0,
        }
    }

    /// Advances members, evicting any that left the field (despawn count)
    /// or finished exploding (kill count).
    pub fn update(&mut self, field: &Playfield) {
        for member in &mut self.members {
            member.update(field);
        }

        let mut kept = Vec::with_capacity(self.members.len());
        for member in self.members.drain(..) {
            if !member.destroyed && member.should_despawn(field) {
                self.despawned_count += 1;
            } else if member.is_explosion_finished() {
                self.destroyed_count += 1;
            } else {
                kept.push(member);
            }
        }
        self.members = kept;

        if self.difficulty_timer > 0 {
            self.difficulty_timer -= 1;
        } else {
            self.difficulty_timer = DIFFICULTY_STEP_FRAMES;
            self.difficulty_steps += 1;
            self.spawn_interval =
                (self.spawn_interval.saturating_sub(SPAWN_INTERVAL_DECREASE)).max(MIN_SPAWN_INTERVAL);
        }
    }

    /// Streams in a new enemy once the spawn timer elapses. Later waves
    /// carry bonus health.
    pub fn spawn(
        &mut self,
        field: &Playfield,
        rng: &mut SeededRandom,
        ids: &mut EntityIdGenerator,
    ) {
        if self.spawn_timer > 0 {
            self.spawn_timer -= 1;
            return;
        }
        self.spawn_timer = self.spawn_interval;

        let health = 1 + (self.difficulty_steps / 3) as i32;
        let roll = rng.next();
        let (pattern, pos) = if roll < 0.5 {
            (
                MovementPattern::StraightDown,
                Vec2::new(rng.next_range(20.0, field.width - 20.0), field.hud_line),
            )
        } else if roll < 0.8 {
            (
                MovementPattern::ZigzagDown,
                Vec2::new(rng.next_range(20.0, field.width - 20.0), field.hud_line),
            )
        } else {
            let from_left = rng.roll(0.5);
            let x = if from_left {
                -InfiniteEnemy::SIZE.x
            } else {
                field.width + InfiniteEnemy::SIZE.x
            };
            (
                MovementPattern::Horizontal,
                Vec2::new(x, rng.next_range(field.hud_line + 20.0, field.item_line * 0.5)),
            )
        };

        self.members
            .push(InfiniteEnemy::new(ids.next(), pos, pattern, health, rng));
    }

    /// One shot per formation cadence, from a random eligible member.
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
        self.shoot_timer = FORMATION_SHOOT_INTERVAL;

        let shooters: Vec<usize> = self
            .members
            .iter()
            .enumerate()
            .filter(|(_, m)| m.can_shoot())
            .map(|(i, _)| i)
            .collect();
        if let Some(pick) = rng.pick_index(&shooters) {
            let shooter = &mut self.members[shooters[pick]];
            let muzzle = shooter.body.pos + Vec2::new(0.0, shooter.body.half_size().y);
            shooter.shoot_cooldown = MEMBER_SHOOT_INTERVAL;
            bullets.push(pool.acquire(muzzle, Bullet::ENEMY_SPEED, BulletOwner::Enemy, 0));
        }
    }

    pub fn destroy(&mut self, id: EntityId) {
        if let Some(member) = self.members.iter_mut().find(|m| m.id == id) {
            member.destroy();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Evicts every member without touching the kill or despawn counters.
    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn destroyed_count(&self) -> u32 {
        self.destroyed_count
    }

    pub fn despawned_count(&self) -> u32 {
        self.despawned_count
    }
}

impl Default for InfiniteFormation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_one(formation: &mut InfiniteFormation, field: &Playfield) {
        let mut rng = SeededRandom::new(99);
        let mut ids = EntityIdGenerator::new();
        for _ in 0..=INITIAL_SPAWN_INTERVAL {
            formation.spawn(field, &mut rng, &mut ids);
        }
        assert!(!formation.is_empty());
    }

    #[test]
    fn spawns_after_interval() {
        let field = Playfield::default();
        let mut formation = InfiniteFormation::new();
        spawn_one(&mut formation, &field);
    }

    #[test]
    fn kills_and_despawns_are_counted_separately() {
        let field = Playfield::default();
        let mut rng = SeededRandom::new(3);
        let mut ids = EntityIdGenerator::new();
        let mut formation = InfiniteFormation::new();

        // One enemy destroyed in place, one walked off the bottom edge.
        let mut killed = InfiniteEnemy::new(
            ids.next(),
            Vec2::new(100.0, 100.0),
            MovementPattern::StraightDown,
            1,
            &mut rng,
        );
        killed.take_damage(1);
        let mut gone = InfiniteEnemy::new(
            ids.next(),
            Vec2::new(200.0, 100.0),
            MovementPattern::StraightDown,
            1,
            &mut rng,
        );
        gone.body.pos.y = field.height + 30.0;
        formation.members.push(killed);
        formation.members.push(gone);

        for _ in 0..=ENEMY_EXPLOSION_FRAMES {
            formation.update(&field);
        }

        assert!(formation.is_empty());
        assert_eq!(formation.destroyed_count(), 1);
        assert_eq!(formation.despawned_count(), 1);
    }

    #[test]
    fn zigzag_bounces_off_edges() {
        let field = Playfield::default();
        let mut rng = SeededRandom::new(8);
        let mut ids = EntityIdGenerator::new();
        let mut enemy = InfiniteEnemy::new(
            ids.next(),
            Vec2::new(5.0, 100.0),
            MovementPattern::ZigzagDown,
            1,
            &mut rng,
        );

        for _ in 0..200 {
            enemy.update(&field);
            let half = enemy.body.half_size().x;
            assert!(enemy.body.pos.x - half >= 0.0);
            assert!(enemy.body.pos.x + half <= field.width);
        }
    }

    #[test]
    fn damage_destroys_at_zero() {
        let mut rng = SeededRandom::new(8);
        let mut ids = EntityIdGenerator::new();
        let mut enemy = InfiniteEnemy::new(
            ids.next(),
            Vec2::new(100.0, 100.0),
            MovementPattern::Horizontal,
            2,
            &mut rng,
        );
        enemy.take_damage(1);
        assert!(!enemy.destroyed);
        enemy.take_damage(1);
        assert!(enemy.destroyed);

        // Already destroyed: further damage is a no-op.
        enemy.take_damage(5);
        assert_eq!(enemy.health, 0);
    }

    #[test]
    fn spawn_interval_tightens_over_time() {
        let field = Playfield::default();
        let mut formation = InfiniteFormation::new();
        for _ in 0..(DIFFICULTY_STEP_FRAMES + 1) {
            formation.update(&field);
        }
        assert!(formation.spawn_interval < INITIAL_SPAWN_INTERVAL);
    }
}
