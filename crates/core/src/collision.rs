//! The per-tick collision resolution engine.
//!
//! Runs exactly once per frame over a borrowed view of the world. The four
//! sub-passes execute in a fixed order - boss bullets, then bullets, then
//! body contact, then item pickups - and the order is observable: it
//! decides which collision wins when several apply in the same tick, so it
//! must not be rearranged.
//!
//! Removal discipline: no collection is mutated while it is being
//! iterated. Hits set the `consumed` mark (or the per-entity destroyed
//! flag) and the marked instances are bulk-removed and recycled after the
//! sub-pass that marked them.

use glam::Vec2;
use tracing::info;

use crate::boss::{FinalBoss, MidBoss};
use crate::entities::{
    BossBullet, Bullet, DropItem, EnemyClass, ItemKind, PlayerId, Ship, SHIELD_FRAMES,
};
use crate::formation::infinite::InfiniteFormation;
use crate::formation::{EnemyFormation, SpecialFormation};
use crate::level::LevelConfig;
use crate::physics::collides;
use crate::pool::{recycle_consumed_bullets, recycle_consumed_items, Pools};
use crate::random::SeededRandom;
use crate::score::{credited_player, AchievementSink, Hud, Scoreboard};
use crate::simulation::FreezeTimer;

/// Frames of global enemy freeze granted by the Stop drop.
pub const FREEZE_FRAMES: u32 = 180;
/// How far the Push drop displaces the grid formation backward.
pub const PUSHBACK_DISTANCE: f32 = 20.0;
/// Flat drop chance on infinite-mode kills (uniform item kind).
const INFINITE_DROP_CHANCE: f32 = 0.15;
/// Bullet damage per hit against the mid boss.
const MID_BOSS_BULLET_DAMAGE: i32 = 2;

const BOSS_SLAYER: &str = "Boss Slayer";

/// Everything the engine reads and mutates during one tick. Inactive
/// slots (`None`) short-circuit their collision family with no effect.
pub struct CombatContext<'a> {
    pub bullets: &'a mut Vec<Bullet>,
    pub boss_bullets: &'a mut Vec<BossBullet>,
    pub formation: Option<&'a mut EnemyFormation>,
    pub special: Option<&'a mut SpecialFormation>,
    pub infinite: Option<&'a mut InfiniteFormation>,
    pub drop_items: &'a mut Vec<DropItem>,
    pub ship: Option<&'a mut Ship>,
    pub ship_p2: Option<&'a mut Ship>,
    pub mid_boss: Option<&'a mut MidBoss>,
    pub final_boss: Option<&'a mut FinalBoss>,
    pub scoreboard: &'a mut Scoreboard,
    pub level: &'a LevelConfig,
    pub pools: &'a mut Pools,
    pub freeze: &'a mut FreezeTimer,
    pub rng: &'a mut SeededRandom,
    pub achievements: &'a mut dyn AchievementSink,
    pub hud: &'a mut dyn Hud,
}

/// Resolves every collision family for the current tick.
pub fn resolve(ctx: &mut CombatContext<'_>) {
    resolve_boss_bullets(ctx);
    resolve_bullets(ctx);
    resolve_ship_contact(ctx);
    resolve_item_pickups(ctx);
}

// ---------------------------------------------------------------------------
// Sub-pass 1: boss bullets vs ships

fn resolve_boss_bullets(ctx: &mut CombatContext<'_>) {
    let CombatContext {
        boss_bullets,
        ship,
        ship_p2,
        scoreboard,
        ..
    } = ctx;

    for bullet in boss_bullets.iter_mut() {
        let hit_p1 = match ship.as_deref_mut() {
            Some(p1) if scoreboard.lives(PlayerId::P1) > 0 && collides(&bullet.body, &p1.body) => {
                if !p1.is_invincible() && !p1.destroyed {
                    p1.destroy();
                    let remaining = scoreboard.lose_life(PlayerId::P1);
                    info!(remaining, "boss bullet hit player ship");
                }
                bullet.consumed = true;
                true
            }
            _ => false,
        };
        if hit_p1 {
            continue;
        }

        if let Some(p2) = ship_p2.as_deref_mut() {
            if scoreboard.two_player
                && scoreboard.lives(PlayerId::P2) > 0
                && !p2.destroyed
                && collides(&bullet.body, &p2.body)
            {
                if !p2.is_invincible() {
                    p2.destroy();
                    let remaining = scoreboard.lose_life(PlayerId::P2);
                    info!(remaining, "boss bullet hit player two ship");
                }
                bullet.consumed = true;
            }
        }
    }

    boss_bullets.retain(|b| !b.consumed);
}

// ---------------------------------------------------------------------------
// Sub-pass 2: bullets vs ships, formations and bosses

fn resolve_bullets(ctx: &mut CombatContext<'_>) {
    let CombatContext {
        bullets,
        formation,
        special,
        infinite,
        mid_boss,
        final_boss,
        ship,
        ship_p2,
        drop_items,
        scoreboard,
        level,
        pools,
        rng,
        achievements,
        hud,
        ..
    } = ctx;

    let level_active = !scoreboard.level_finished;

    for bullet in bullets.iter_mut() {
        if bullet.speed > 0.0 {
            // Hostile bullet, moving toward the ships.
            if !level_active {
                continue;
            }

            let hit_p1 = match ship.as_deref_mut() {
                Some(p1) if scoreboard.lives(PlayerId::P1) > 0 && collides(&bullet.body, &p1.body) => {
                    bullet.consumed = true;
                    if !p1.is_invincible() && !p1.destroyed {
                        p1.destroy();
                        let remaining = scoreboard.lose_life(PlayerId::P1);
                        hud.show_health_popup("-1 Health");
                        info!(remaining, "player ship hit");
                    }
                    true
                }
                _ => false,
            };
            if hit_p1 {
                continue;
            }

            if let Some(p2) = ship_p2.as_deref_mut() {
                if scoreboard.two_player
                    && scoreboard.lives(PlayerId::P2) > 0
                    && !p2.destroyed
                    && collides(&bullet.body, &p2.body)
                {
                    bullet.consumed = true;
                    if !p2.is_invincible() {
                        p2.destroy();
                        let remaining = scoreboard.lose_life(PlayerId::P2);
                        hud.show_health_popup("-1 Health");
                        info!(remaining, "player two ship hit");
                    }
                }
            }
            continue;
        }

        // Player bullet: grid formation first.
        if let Some(formation) = formation.as_deref_mut() {
            for index in 0..formation.members.len() {
                if formation.members[index].destroyed
                    || !collides(&bullet.body, &formation.members[index].body)
                {
                    continue;
                }
                let enemy_id = formation.members[index].id;
                if bullet.was_already_hit(enemy_id) {
                    continue;
                }
                bullet.record_hit(enemy_id);

                let lethal = {
                    let enemy = &mut formation.members[index];
                    let had_health = enemy.health != 0;
                    enemy.take_damage(1);
                    had_health && enemy.health == 0
                };

                if lethal {
                    let enemy = &formation.members[index];
                    let points = enemy.point_value();
                    let class = enemy.class;
                    let center = enemy.body.pos;

                    scoreboard.add_points_for(credited_player(bullet.owner), points);
                    scoreboard.convert_points_to_coin(points);
                    scoreboard.record_ship_destroyed();
                    formation.destroy(enemy_id);
                    achievements.on_enemy_defeated();
                    info!(points, "enemy destroyed");

                    roll_drop_table(level, class, center, rng, pools, drop_items);
                }

                if !bullet.penetrate() {
                    bullet.consumed = true;
                    break;
                }
            }
        }

        // Infinite-mode formation.
        if let Some(infinite) = infinite.as_deref_mut() {
            for index in 0..infinite.members.len() {
                if infinite.members[index].destroyed
                    || !collides(&bullet.body, &infinite.members[index].body)
                {
                    continue;
                }
                let enemy_id = infinite.members[index].id;
                if bullet.was_already_hit(enemy_id) {
                    continue;
                }
                bullet.record_hit(enemy_id);
                infinite.members[index].take_damage(1);

                if infinite.members[index].destroyed {
                    let points = infinite.members[index].point_value();
                    let center = infinite.members[index].body.pos;

                    scoreboard.add_points_for(credited_player(bullet.owner), points);
                    scoreboard.convert_points_to_coin(points);
                    scoreboard.record_ship_destroyed();
                    achievements.on_enemy_defeated();
                    info!(points, "infinite enemy destroyed");

                    if rng.roll(INFINITE_DROP_CHANCE) {
                        if let Some(pick) = rng.pick_index(&ItemKind::ALL) {
                            let kind = ItemKind::ALL[pick];
                            drop_items.push(pools.items.acquire(center, kind));
                            info!(item = kind.name(), "item dropped");
                        }
                    }
                }

                if !bullet.penetrate() {
                    bullet.consumed = true;
                    break;
                }
            }
        }

        // Special bonus formation: one-shot kills, bullet spent on hit.
        if let Some(special) = special.as_deref_mut() {
            for index in 0..special.members.len() {
                if special.members[index].destroyed
                    || !collides(&bullet.body, &special.members[index].body)
                {
                    continue;
                }
                let enemy_id = special.members[index].id;
                let points = special.members[index].point_value();

                scoreboard.add_points_for(credited_player(bullet.owner), points);
                scoreboard.convert_points_to_coin(points);
                scoreboard.record_ship_destroyed();
                special.destroy(enemy_id);
                info!(points, "special enemy destroyed");
                bullet.consumed = true;
            }
        }

        // Mid boss: heavier hits, defeat signal fires exactly once.
        if let Some(boss) = mid_boss.as_deref_mut() {
            if !boss.destroyed && collides(&bullet.body, &boss.body) {
                boss.take_damage(MID_BOSS_BULLET_DAMAGE);
                if boss.health <= 0 {
                    scoreboard.record_ship_destroyed();
                    scoreboard.add_points_for(credited_player(bullet.owner), MidBoss::POINT_VALUE);
                    scoreboard.convert_points_to_coin(MidBoss::POINT_VALUE);
                    boss.destroy();
                    achievements.unlock_achievement(BOSS_SLAYER);
                    info!("mid boss destroyed");
                }
                bullet.consumed = true;
            }
        }

        // Final boss.
        if let Some(boss) = final_boss.as_deref_mut() {
            if !boss.destroyed && collides(&bullet.body, &boss.body) {
                boss.take_damage(1);
                if boss.health <= 0 {
                    scoreboard.add_points_for(credited_player(bullet.owner), FinalBoss::POINT_VALUE);
                    scoreboard.convert_points_to_coin(FinalBoss::POINT_VALUE);
                    boss.destroy();
                    achievements.unlock_achievement(BOSS_SLAYER);
                    info!("final boss destroyed");
                }
                bullet.consumed = true;
            }
        }
    }

    recycle_consumed_bullets(bullets, &mut pools.bullets);
}

fn roll_drop_table(
    level: &LevelConfig,
    class: EnemyClass,
    center: Vec2,
    rng: &mut SeededRandom,
    pools: &mut Pools,
    drop_items: &mut Vec<DropItem>,
) {
    let successes: Vec<ItemKind> = level
        .drops_for(class)
        .filter(|drop| rng.roll(drop.chance))
        .map(|drop| drop.kind)
        .collect();

    if let Some(pick) = rng.pick_index(&successes) {
        let kind = successes[pick];
        drop_items.push(pools.items.acquire(center, kind));
        info!(item = kind.name(), "item dropped");
    }
}

// ---------------------------------------------------------------------------
// Sub-pass 3: ship body contact

fn resolve_ship_contact(ctx: &mut CombatContext<'_>) {
    if ctx.scoreboard.level_finished {
        return;
    }
    resolve_contact_for(ctx, PlayerId::P1);
    if ctx.scoreboard.two_player {
        resolve_contact_for(ctx, PlayerId::P2);
    }
}

/// At most one body collision is resolved per ship per tick; families are
/// checked in formation, infinite, special, mid boss, final boss order and
/// the first match wins.
fn resolve_contact_for(ctx: &mut CombatContext<'_>, player: PlayerId) {
    let CombatContext {
        formation,
        special,
        infinite,
        mid_boss,
        final_boss,
        ship,
        ship_p2,
        scoreboard,
        hud,
        ..
    } = ctx;

    let ship = match player {
        PlayerId::P1 => ship.as_deref_mut(),
        PlayerId::P2 => ship_p2.as_deref_mut(),
    };
    let Some(ship) = ship else {
        return;
    };
    if scoreboard.lives(player) <= 0 || ship.destroyed || ship.is_invincible() {
        return;
    }

    if let Some(formation) = formation.as_deref_mut() {
        let hit = formation
            .members
            .iter()
            .find(|m| !m.destroyed && collides(&ship.body, &m.body))
            .map(|m| m.id);
        if let Some(enemy_id) = hit {
            formation.destroy(enemy_id);
            ship.destroy();
            let remaining = scoreboard.lose_life(player);
            hud.show_health_popup("-1 Life (Collision!)");
            info!(remaining, "ship collided with enemy");
            return;
        }
    }

    if let Some(infinite) = infinite.as_deref_mut() {
        let hit = infinite
            .members
            .iter()
            .find(|m| !m.destroyed && collides(&ship.body, &m.body))
            .map(|m| m.id);
        if let Some(enemy_id) = hit {
            infinite.destroy(enemy_id);
            ship.destroy();
            let remaining = scoreboard.lose_life(player);
            hud.show_health_popup("-1 Life (Collision!)");
            info!(remaining, "ship collided with infinite enemy");
            return;
        }
    }

    if let Some(special) = special.as_deref_mut() {
        let hit = special
            .members
            .iter()
            .find(|m| !m.destroyed && collides(&ship.body, &m.body))
            .map(|m| m.id);
        if let Some(enemy_id) = hit {
            special.destroy(enemy_id);
            ship.destroy();
            let remaining = scoreboard.lose_life(player);
            hud.show_health_popup("-1 Life (Collision!)");
            info!(remaining, "ship collided with special enemy");
            return;
        }
    }

    if let Some(boss) = mid_boss.as_deref_mut() {
        if !boss.destroyed && collides(&ship.body, &boss.body) {
            ship.destroy();
            let remaining = scoreboard.lose_life(player);
            hud.show_health_popup("-1 Life (Boss Collision!)");
            info!(remaining, "ship collided with mid boss");
            return;
        }
    }

    if let Some(boss) = final_boss.as_deref_mut() {
        if !boss.destroyed && collides(&ship.body, &boss.body) {
            ship.destroy();
            let remaining = scoreboard.lose_life(player);
            hud.show_health_popup("-1 Life (Boss Collision!)");
            info!(remaining, "ship collided with final boss");
        }
    }
}

// ---------------------------------------------------------------------------
// Sub-pass 4: drop-item pickups

fn resolve_item_pickups(ctx: &mut CombatContext<'_>) {
    if ctx.scoreboard.level_finished {
        return;
    }

    for index in 0..ctx.drop_items.len() {
        if ctx.drop_items[index].consumed {
            continue;
        }
        let item_body = ctx.drop_items[index].body;
        let kind = ctx.drop_items[index].kind;

        let p1_collects = match ctx.ship.as_deref() {
            Some(ship) => {
                ctx.scoreboard.lives(PlayerId::P1) > 0
                    && !ship.destroyed
                    && collides(&ship.body, &item_body)
            }
            None => false,
        };
        let p2_collects = !p1_collects
            && ctx.scoreboard.two_player
            && match ctx.ship_p2.as_deref() {
                Some(ship) => {
                    ctx.scoreboard.lives(PlayerId::P2) > 0
                        && !ship.destroyed
                        && collides(&ship.body, &item_body)
                }
                None => false,
            };

        let collector = if p1_collects {
            PlayerId::P1
        } else if p2_collects {
            PlayerId::P2
        } else {
            continue;
        };

        info!(item = kind.name(), "player acquired drop item");
        apply_item_effect(ctx, collector, kind);
        ctx.drop_items[index].consumed = true;
    }

    recycle_consumed_items(ctx.drop_items, &mut ctx.pools.items);
}

fn apply_item_effect(ctx: &mut CombatContext<'_>, collector: PlayerId, kind: ItemKind) {
    let CombatContext {
        formation,
        infinite,
        ship,
        ship_p2,
        scoreboard,
        freeze,
        ..
    } = ctx;

    match kind {
        ItemKind::Heal => {
            scoreboard.gain_life(collector);
        }
        ItemKind::Shield => {
            let ship = match collector {
                PlayerId::P1 => ship.as_deref_mut(),
                PlayerId::P2 => ship_p2.as_deref_mut(),
            };
            if let Some(ship) = ship {
                ship.activate_invincibility(SHIELD_FRAMES);
            }
        }
        ItemKind::Stop => {
            freeze.activate(FREEZE_FRAMES);
        }
        ItemKind::Push => {
            if let Some(formation) = formation.as_deref_mut() {
                formation.push_back(PUSHBACK_DISTANCE);
            }
        }
        ItemKind::Explode => {
            let mut points = 0;
            if let Some(formation) = formation.as_deref_mut() {
                for index in 0..formation.members.len() {
                    if formation.members[index].destroyed {
                        continue;
                    }
                    formation.members[index].take_damage(1);
                    if formation.members[index].health == 0 {
                        points += formation.members[index].point_value();
                        let enemy_id = formation.members[index].id;
                        scoreboard.record_ship_destroyed();
                        formation.destroy(enemy_id);
                    }
                }
            }
            if let Some(infinite) = infinite.as_deref_mut() {
                for member in infinite.members.iter_mut() {
                    if member.destroyed {
                        continue;
                    }
                    member.take_damage(1);
                    if member.destroyed {
                        points += member.point_value();
                        scoreboard.record_ship_destroyed();
                    }
                }
            }
            scoreboard.add_points_for(Some(collector), points);
            scoreboard.convert_points_to_coin(points);
        }
        ItemKind::Slow => {
            if let Some(formation) = formation.as_deref_mut() {
                formation.activate_slowdown();
                info!("enemy formation slowed down");
            }
        }
    }
}
