//! Recycling pools for bullets and drop items.
//!
//! The resolution engine removes consumed instances in bulk after each
//! sub-pass and hands them back here; `acquire` reuses them with all
//! per-flight state wiped. An instance handed out is never aliased with
//! another live one, and the already-hit set is always cleared on recycle
//! so a reused bullet starts with a clean penetration record.

use bincode::{Decode, Encode};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entities::{Bullet, BulletOwner, DropItem, ItemKind};

#[derive(Debug, Default, Serialize, Deserialize, Encode, Decode)]
pub struct BulletPool {
    free: Vec<Bullet>,
}

impl BulletPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(
        &mut self,
        pos: Vec2,
        speed: f32,
        owner: BulletOwner,
        max_penetration: u32,
    ) -> Bullet {
        match self.free.pop() {
            Some(mut bullet) => {
                bullet.body.pos = pos;
                bullet.speed = speed;
                bullet.owner = owner;
                bullet.penetration_count = 0;
                bullet.max_penetration = max_penetration;
                bullet.already_hit.clear();
                bullet.consumed = false;
                bullet
            }
            None => Bullet::new(pos, speed, owner, max_penetration),
        }
    }

    pub fn recycle(&mut self, bullet: Bullet) {
        self.free.push(bullet);
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Encode, Decode)]
pub struct ItemPool {
    free: Vec<DropItem>,
}

impl ItemPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, pos: Vec2, kind: ItemKind) -> DropItem {
        match self.free.pop() {
            Some(mut item) => {
                item.body.pos = pos;
                item.kind = kind;
                item.fall_speed = DropItem::FALL_SPEED;
                item.consumed = false;
                item
            }
            None => DropItem::new(pos, kind),
        }
    }

    pub fn recycle(&mut self, item: DropItem) {
        self.free.push(item);
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

/// Both pools, owned by the simulation and threaded through the resolution
/// engine. Free lists are capacity caches only and never appear in
/// snapshots.
#[derive(Debug, Default)]
pub struct Pools {
    pub bullets: BulletPool,
    pub items: ItemPool,
}

impl Pools {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Drains every consumed bullet out of the live set into the pool. Called
/// once after each sub-pass that marks bullets, so a bullet consumed in an
/// earlier sub-pass can never be recycled twice in the same tick.
pub fn recycle_consumed_bullets(bullets: &mut Vec<Bullet>, pool: &mut BulletPool) {
    let mut kept = Vec::with_capacity(bullets.len());
    for bullet in bullets.drain(..) {
        if bullet.consumed {
            pool.recycle(bullet);
        } else {
            kept.push(bullet);
        }
    }
    *bullets = kept;
}

/// Same bulk-removal discipline for drop items.
pub fn recycle_consumed_items(items: &mut Vec<DropItem>, pool: &mut ItemPool) {
    let mut kept = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if item.consumed {
            pool.recycle(item);
        } else {
            kept.push(item);
        }
    }
    *items = kept;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntityId, PlayerId};

    #[test]
    fn acquire_reuses_recycled_instances() {
        let mut pool = BulletPool::new();
        let bullet = pool.acquire(Vec2::ZERO, -6.0, BulletOwner::Player(PlayerId::P1), 0);
        pool.recycle(bullet);
        assert_eq!(pool.free_count(), 1);

        let _again = pool.acquire(Vec2::new(5.0, 5.0), 4.0, BulletOwner::Enemy, 0);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn recycle_clears_flight_state() {
        let mut pool = BulletPool::new();
        let mut bullet = pool.acquire(Vec2::ZERO, -6.0, BulletOwner::Player(PlayerId::P1), 2);
        bullet.record_hit(EntityId(3));
        bullet.penetrate();
        bullet.consumed = true;
        pool.recycle(bullet);

        let reused = pool.acquire(Vec2::ZERO, -6.0, BulletOwner::Player(PlayerId::P2), 2);
        assert!(reused.already_hit.is_empty());
        assert_eq!(reused.penetration_count, 0);
        assert!(!reused.consumed);
        assert_eq!(reused.owner, BulletOwner::Player(PlayerId::P2));
    }

    #[test]
    fn consumed_bullets_are_drained_once() {
        let mut pool = BulletPool::new();
        let mut live = vec![
            pool.acquire(Vec2::ZERO, -6.0, BulletOwner::Player(PlayerId::P1), 0),
            pool.acquire(Vec2::ZERO, 4.0, BulletOwner::Enemy, 0),
        ];
        live[0].consumed = true;

        recycle_consumed_bullets(&mut live, &mut pool);
        assert_eq!(live.len(), 1);
        assert_eq!(pool.free_count(), 1);

        // A second drain finds nothing left to recycle.
        recycle_consumed_bullets(&mut live, &mut pool);
        assert_eq!(live.len(), 1);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn item_pool_round_trip() {
        let mut pool = ItemPool::new();
        let mut item = pool.acquire(Vec2::new(10.0, 10.0), ItemKind::Heal);
        item.consumed = true;
        pool.recycle(item);

        let reused = pool.acquire(Vec2::ZERO, ItemKind::Slow);
        assert_eq!(reused.kind, ItemKind::Slow);
        assert!(!reused.consumed);
    }
}
