//! Entity types for the combat core.
//!
//! Every kind is a plain struct embedding a positional `Body` plus its own
//! payload, dispatched by enum tags rather than a type hierarchy. Entities
//! are owned by the formation or pool that created them; a destroyed entity
//! may linger in its collection until the explosion grace period elapses.

use bincode::{Decode, Encode};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::physics::Body;

/// Unique identifier, handed out where identity matters across ticks
/// (penetration de-dup against formation members).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Default, Serialize, Deserialize, Encode, Decode)]
pub struct EntityIdGenerator {
    next_id: u32,
}

impl EntityIdGenerator {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    pub fn next(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum PlayerId {
    P1,
    P2,
}

// ---------------------------------------------------------------------------
// Ships

/// Frames of explosion grace before a downed ship respawns.
pub const SHIP_RESPAWN_FRAMES: u32 = 60;
/// Frames of shield invincibility granted by the Shield drop.
pub const SHIELD_FRAMES: u32 = 300;

/// Player ship: lives are tracked by the scoreboard, the ship itself only
/// knows whether it is currently blown up and whether it is untouchable.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct Ship {
    pub player: PlayerId,
    pub body: Body,
    pub destroyed: bool,
    pub respawn_frames: u32,
    pub invincibility_frames: u32,
    pub fire_cooldown: u32,
}

impl Ship {
    pub const SIZE: Vec2 = Vec2::new(24.0, 16.0);
    pub const SPEED: f32 = 2.5;
    pub const FIRE_RATE: u32 = 30;

    pub fn new(player: PlayerId, pos: Vec2) -> Self {
        Self {
            player,
            body: Body::new(pos, Self::SIZE),
            destroyed: false,
            respawn_frames: 0,
            invincibility_frames: 0,
            fire_cooldown: 0,
        }
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility_frames > 0
    }

    pub fn activate_invincibility(&mut self, frames: u32) {
        self.invincibility_frames = self.invincibility_frames.max(frames);
    }

    /// Marks the ship blown up and starts the respawn countdown. No-op if
    /// it is already down.
    pub fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.respawn_frames = SHIP_RESPAWN_FRAMES;
        }
    }

    /// Advances per-tick countdowns; the ship revives once its explosion
    /// grace elapses.
    pub fn update(&mut self) {
        if self.fire_cooldown > 0 {
            self.fire_cooldown -= 1;
        }
        if self.invincibility_frames > 0 {
            self.invincibility_frames -= 1;
        }
        if self.destroyed {
            if self.respawn_frames > 0 {
                self.respawn_frames -= 1;
            }
            if self.respawn_frames == 0 {
                self.destroyed = false;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Bullets

/// Who fired a bullet. Scoring follows the owner; direction follows the
/// speed sign (positive is down, toward the ships).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum BulletOwner {
    Enemy,
    Player(PlayerId),
    Boss,
}

#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct Bullet {
    pub body: Body,
    /// Signed vertical speed; positive moves down.
    pub speed: f32,
    pub owner: BulletOwner,
    pub penetration_count: u32,
    pub max_penetration: u32,
    /// Enemies already credited to this bullet while penetrating.
    pub already_hit: Vec<EntityId>,
    /// Removal mark, applied in bulk after the sub-pass that set it.
    pub consumed: bool,
}

impl Bullet {
    pub const SIZE: Vec2 = Vec2::new(6.0, 10.0);
    pub const PLAYER_SPEED: f32 = -6.0;
    pub const ENEMY_SPEED: f32 = 4.0;

    pub fn new(pos: Vec2, speed: f32, owner: BulletOwner, max_penetration: u32) -> Self {
        Self {
            body: Body::new(pos, Self::SIZE),
            speed,
            owner,
            penetration_count: 0,
            max_penetration,
            already_hit: Vec::new(),
            consumed: false,
        }
    }

    pub fn update(&mut self) {
        self.body.pos.y += self.speed;
    }

    /// Books one hit against the penetration budget. Returns true while
    /// the bullet may stay in flight; a false return means the budget is
    /// exhausted and the bullet must be removed.
    pub fn penetrate(&mut self) -> bool {
        self.penetration_count += 1;
        self.penetration_count <= self.max_penetration
    }

    /// Non-mutating pre-check: can this bullet still pass through another
    /// enemy after a further hit?
    pub fn can_penetrate(&self) -> bool {
        self.penetration_count < self.max_penetration
    }

    pub fn was_already_hit(&self, id: EntityId) -> bool {
        self.already_hit.contains(&id)
    }

    pub fn record_hit(&mut self, id: EntityId) {
        self.already_hit.push(id);
    }
}

/// Boss pattern bullet. Travels along an arbitrary velocity and is
/// allocated per pattern burst rather than pooled.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct BossBullet {
    pub body: Body,
    #[bincode(with_serde)]
    pub velocity: Vec2,
    pub consumed: bool,
}

impl BossBullet {
    pub const SIZE: Vec2 = Vec2::new(8.0, 8.0);

    pub fn new(pos: Vec2, velocity: Vec2) -> Self {
        Self {
            body: Body::new(pos, Self::SIZE),
            velocity,
            consumed: false,
        }
    }

    pub fn update(&mut self) {
        self.body.pos += self.velocity;
    }
}

// ---------------------------------------------------------------------------
// Enemies

/// Frames an enemy explosion stays on screen before eviction.
pub const ENEMY_EXPLOSION_FRAMES: u32 = 30;

/// Formation enemy classes with the classic stat table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum EnemyClass {
    A,
    B,
    C,
    Special,
}

impl EnemyClass {
    pub fn max_health(&self) -> i32 {
        match self {
            EnemyClass::A => 1,
            EnemyClass::B => 2,
            EnemyClass::C => 3,
            EnemyClass::Special => 1,
        }
    }

    pub fn point_value(&self) -> i32 {
        match self {
            EnemyClass::A => 10,
            EnemyClass::B => 20,
            EnemyClass::C => 30,
            EnemyClass::Special => 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct EnemyShip {
    pub id: EntityId,
    pub body: Body,
    pub class: EnemyClass,
    pub health: i32,
    pub max_health: i32,
    pub destroyed: bool,
    pub explosion_frames: u32,
}

impl EnemyShip {
    pub const SIZE: Vec2 = Vec2::new(24.0, 16.0);

    pub fn new(id: EntityId, pos: Vec2, class: EnemyClass) -> Self {
        Self {
            id,
            body: Body::new(pos, Self::SIZE),
            class,
            health: class.max_health(),
            max_health: class.max_health(),
            destroyed: false,
            explosion_frames: 0,
        }
    }

    pub fn point_value(&self) -> i32 {
        self.class.point_value()
    }

    /// Applies damage; destroys the enemy the first time health reaches
    /// zero. Damage to an already-destroyed enemy is ignored.
    pub fn take_damage(&mut self, damage: i32) {
        if self.destroyed {
            return;
        }
        self.health = (self.health - damage).max(0);
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
}

// ---------------------------------------------------------------------------
// Drop items

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum ItemKind {
    Heal,
    Shield,
    Stop,
    Push,
    Explode,
    Slow,
}

impl ItemKind {
    pub const ALL: [ItemKind; 6] = [
        ItemKind::Heal,
        ItemKind::Shield,
        ItemKind::Stop,
        ItemKind::Push,
        ItemKind::Explode,
        ItemKind::Slow,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Heal => "heal",
            ItemKind::Shield => "shield",
            ItemKind::Stop => "stop",
            ItemKind::Push => "push",
            ItemKind::Explode => "explode",
            ItemKind::Slow => "slow",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct DropItem {
    pub body: Body,
    pub kind: ItemKind,
    pub fall_speed: f32,
    pub consumed: bool,
}

impl DropItem {
    pub const SIZE: Vec2 = Vec2::new(16.0, 16.0);
    pub const FALL_SPEED: f32 = 2.0;

    pub fn new(pos: Vec2, kind: ItemKind) -> Self {
        Self {
            body: Body::new(pos, Self::SIZE),
            kind,
            fall_speed: Self::FALL_SPEED,
            consumed: false,
        }
    }

    pub fn update(&mut self) {
        self.body.pos.y += self.fall_speed;
    }
}
