//! Per-tick simulation driver.
//!
//! The host calls `tick` once per frame (60 Hz): ship intents are applied,
//! formations and bosses advance, items fall, then the collision engine
//! resolves the frame and offscreen projectiles are recycled. Everything
//! lives in `WorldState`, which snapshots whole through bincode for the
//! external controller boundary.

use bincode::{Decode, Encode};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::boss::{BossPhase, FinalBoss, MidBoss};
use crate::collision::{self, CombatContext};
use crate::entities::{
    BossBullet, Bullet, BulletOwner, DropItem, EntityIdGenerator, PlayerId, Ship,
};
use crate::formation::infinite::InfiniteFormation;
use crate::formation::{EnemyFormation, SpecialFormation};
use crate::input::PlayerInput;
use crate::level::{BossKind, LevelConfig};
use crate::physics::Playfield;
use crate::pool::{recycle_consumed_bullets, recycle_consumed_items, Pools};
use crate::random::SeededRandom;
use crate::score::{AchievementSink, Hud, NoopAchievements, NoopHud, Scoreboard};

/// Frames between the level finishing and the match closing down.
const FINISH_FRAMES: u32 = 90;
/// End-of-level score bonus per spare life.
const LIFE_SCORE: i32 = 100;
/// Frames between infinite-mode boss visits (two minutes at 60 Hz).
const BOSS_VISIT_FRAMES: u32 = 7200;

/// Global enemy freeze from the Stop drop: a countdown re-evaluated each
/// tick, never a wall-clock wait.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Encode, Decode)]
pub struct FreezeTimer {
    frames: u32,
}

impl FreezeTimer {
    pub fn activate(&mut self, frames: u32) {
        self.frames = self.frames.max(frames);
    }

    pub fn is_active(&self) -> bool {
        self.frames > 0
    }

    pub fn tick(&mut self) {
        self.frames = self.frames.saturating_sub(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum StagePhase {
    Wave,
    BossWave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum GameMode {
    /// Grid formation waves followed by the level's boss encounter.
    Campaign,
    /// Endless free-floating spawns, no bosses.
    Infinite,
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub field: Playfield,
    pub mode: GameMode,
    pub two_player: bool,
    pub max_lives: i32,
    /// Extra enemies a player bullet may pass through after its first hit.
    pub bullet_penetration: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            field: Playfield::default(),
            mode: GameMode::Campaign,
            two_player: false,
            max_lives: 3,
            bullet_penetration: 0,
        }
    }
}

/// The complete mutable match state - everything a snapshot must carry.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct WorldState {
    pub frame: u32,
    pub scoreboard: Scoreboard,
    pub ship: Ship,
    pub ship_p2: Option<Ship>,
    pub bullets: Vec<Bullet>,
    pub boss_bullets: Vec<BossBullet>,
    pub formation: Option<EnemyFormation>,
    pub special: Option<SpecialFormation>,
    pub infinite: Option<InfiniteFormation>,
    pub mid_boss: Option<MidBoss>,
    pub final_boss: Option<FinalBoss>,
    pub drop_items: Vec<DropItem>,
    pub freeze: FreezeTimer,
    pub phase: StagePhase,
    pub finish_timer: u32,
    /// Counts down to the next infinite-mode boss visit.
    pub boss_visit_timer: u32,
    pub boss_visits: u32,
    pub running: bool,
    pub rng: SeededRandom,
    pub ids: EntityIdGenerator,
}

pub struct Simulation {
    pub config: SimulationConfig,
    pub level: LevelConfig,
    pub state: WorldState,
    pub pools: Pools,
}

impl Simulation {
    pub fn new(config: SimulationConfig, level: LevelConfig, seed: u32) -> Self {
        let mut rng = SeededRandom::new(seed);
        let mut ids = EntityIdGenerator::new();
        let field = config.field;

        let ship_y = field.item_line - 20.0;
        let (ship, ship_p2) = if config.two_player {
            (
                Ship::new(PlayerId::P1, Vec2::new(field.width * 0.5 - 100.0, ship_y)),
                Some(Ship::new(
                    PlayerId::P2,
                    Vec2::new(field.width * 0.5 + 100.0, ship_y),
                )),
            )
        } else {
            (Ship::new(PlayerId::P1, Vec2::new(field.width * 0.5, ship_y)), None)
        };

        let (formation, special, infinite) = match config.mode {
            GameMode::Campaign => (
                Some(EnemyFormation::new(&level, &field, &mut ids)),
                Some(SpecialFormation::new(&mut rng)),
                None,
            ),
            GameMode::Infinite => (None, None, Some(InfiniteFormation::new())),
        };

        let state = WorldState {
            frame: 0,
            scoreboard: Scoreboard::new(config.max_lives, config.two_player),
            ship,
            ship_p2,
            bullets: Vec::with_capacity(64),
            boss_bullets: Vec::with_capacity(64),
            formation,
            special,
            infinite,
            mid_boss: None,
            final_boss: None,
            drop_items: Vec::with_capacity(16),
            freeze: FreezeTimer::default(),
            phase: StagePhase::Wave,
            finish_timer: 0,
            boss_visit_timer: BOSS_VISIT_FRAMES,
            boss_visits: 0,
            running: true,
            rng,
            ids,
        };

        Self {
            config,
            level,
            state,
            pools: Pools::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn frame(&self) -> u32 {
        self.state.frame
    }

    /// Advances the simulation by one frame. Inputs are indexed by player;
    /// missing entries read as no input.
    pub fn tick(
        &mut self,
        inputs: &[PlayerInput],
        achievements: &mut dyn AchievementSink,
        hud: &mut dyn Hud,
    ) {
        if !self.state.running {
            return;
        }
        self.state.frame += 1;

        if !self.state.scoreboard.level_finished {
            self.apply_ship_intents(inputs);

            match self.config.mode {
                GameMode::Campaign => self.advance_stage(),
                GameMode::Infinite => self.advance_infinite(),
            }

            self.state.ship.update();
            if let Some(p2) = &mut self.state.ship_p2 {
                p2.update();
            }
            if let Some(special) = &mut self.state.special {
                special.update(&self.config.field, &mut self.state.rng, &mut self.state.ids);
            }
            self.state.freeze.tick();
        }

        // Items fall before resolution, bullets advance after it.
        for item in &mut self.state.drop_items {
            item.update();
            if self.config.field.is_past_vertical_bounds(&item.body) {
                item.consumed = true;
            }
        }
        recycle_consumed_items(&mut self.state.drop_items, &mut self.pools.items);

        let mut ctx = CombatContext {
            bullets: &mut self.state.bullets,
            boss_bullets: &mut self.state.boss_bullets,
            formation: self.state.formation.as_mut(),
            special: self.state.special.as_mut(),
            infinite: self.state.infinite.as_mut(),
            drop_items: &mut self.state.drop_items,
            ship: Some(&mut self.state.ship),
            ship_p2: self.state.ship_p2.as_mut(),
            mid_boss: self.state.mid_boss.as_mut(),
            final_boss: self.state.final_boss.as_mut(),
            scoreboard: &mut self.state.scoreboard,
            level: &self.level,
            pools: &mut self.pools,
            freeze: &mut self.state.freeze,
            rng: &mut self.state.rng,
            achievements: &mut *achievements,
            hud: &mut *hud,
        };
        collision::resolve(&mut ctx);

        for bullet in &mut self.state.bullets {
            bullet.update();
            if self.config.field.is_past_vertical_bounds(&bullet.body) {
                bullet.consumed = true;
            }
        }
        recycle_consumed_bullets(&mut self.state.bullets, &mut self.pools.bullets);

        if self.state.scoreboard.all_lives_spent() && !self.state.scoreboard.level_finished {
            info!("all lives spent, match over");
            self.finish_level();
        }

        if self.state.scoreboard.level_finished {
            if self.state.finish_timer > 0 {
                self.state.finish_timer -= 1;
            } else {
                self.close_out_level(achievements);
            }
        }
    }

    /// Convenience for tests and headless hosts: no collaborators attached.
    pub fn tick_headless(&mut self, inputs: &[PlayerInput]) {
        let mut achievements = NoopAchievements;
        let mut hud = NoopHud;
        self.tick(inputs, &mut achievements, &mut hud);
    }

    fn apply_ship_intents(&mut self, inputs: &[PlayerInput]) {
        let field = self.config.field;
        let penetration = self.config.bullet_penetration;

        let p1_input = inputs.first().copied().unwrap_or_default();
        if self.state.scoreboard.lives(PlayerId::P1) > 0 && !self.state.ship.destroyed {
            steer_ship(&mut self.state.ship, p1_input, &field);
            if p1_input.fire() && self.state.ship.fire_cooldown == 0 {
                self.state.ship.fire_cooldown = Ship::FIRE_RATE;
                let muzzle = self.state.ship.body.pos
                    - Vec2::new(0.0, self.state.ship.body.half_size().y + Bullet::SIZE.y * 0.5);
                self.state.bullets.push(self.pools.bullets.acquire(
                    muzzle,
                    Bullet::PLAYER_SPEED,
                    BulletOwner::Player(PlayerId::P1),
                    penetration,
                ));
                self.state.scoreboard.bullets_shot += 1;
            }
        }

        if !self.config.two_player {
            return;
        }
        let p2_input = inputs.get(1).copied().unwrap_or_default();
        if let Some(p2) = &mut self.state.ship_p2 {
            if self.state.scoreboard.lives(PlayerId::P2) > 0 && !p2.destroyed {
                steer_ship(p2, p2_input, &field);
                if p2_input.fire() && p2.fire_cooldown == 0 {
                    p2.fire_cooldown = Ship::FIRE_RATE;
                    let muzzle =
                        p2.body.pos - Vec2::new(0.0, p2.body.half_size().y + Bullet::SIZE.y * 0.5);
                    self.state.bullets.push(self.pools.bullets.acquire(
                        muzzle,
                        Bullet::PLAYER_SPEED,
                        BulletOwner::Player(PlayerId::P2),
                        penetration,
                    ));
                    self.state.scoreboard.bullets_shot += 1;
                }
            }
        }
    }

    /// Campaign stage machine: formation waves, then the boss encounter.
    fn advance_stage(&mut self) {
        match self.state.phase {
            StagePhase::Wave => {
                let mut cleared = false;
                if let Some(formation) = &mut self.state.formation {
                    if !self.state.freeze.is_active() {
                        formation.update(&self.config.field);
                        formation.shoot(
                            &mut self.state.rng,
                            &mut self.pools.bullets,
                            &mut self.state.bullets,
                        );
                    }
                    cleared = formation.is_cleared();
                }
                if cleared {
                    info!("wave cleared, boss phase begins");
                    self.state.phase = StagePhase::BossWave;
                }
            }
            StagePhase::BossWave => {
                if self.state.mid_boss.is_none() && self.state.final_boss.is_none() {
                    self.reveal_boss();
                }
                if self.state.final_boss.is_some() {
                    self.manage_final_boss();
                } else if self.state.mid_boss.is_some() {
                    self.manage_mid_boss();
                }
            }
        }
    }

    /// Spawns the encounter the level asks for. No boss id means the wave
    /// itself was the whole level.
    fn reveal_boss(&mut self) {
        if let Some(formation) = &mut self.state.formation {
            formation.clear();
        }
        match self.level.boss {
            Some(BossKind::Mid) | Some(BossKind::MidThenFinal) => {
                self.state.mid_boss = Some(MidBoss::new(&self.config.field));
                info!("mid boss has spawned");
            }
            Some(BossKind::Final) => {
                self.state.final_boss = Some(FinalBoss::new(&self.config.field));
                info!("final boss has spawned");
            }
            None => {
                info!("no boss for this level, proceeding to finish");
                self.finish_level();
            }
        }
    }

    fn manage_mid_boss(&mut self) {
        let mut defeated = false;
        if let Some(boss) = &mut self.state.mid_boss {
            boss.update(&self.config.field);
            defeated = boss.destroyed;
        }
        if !defeated {
            return;
        }
        if self.level.boss == Some(BossKind::MidThenFinal) {
            self.state.mid_boss = None;
            self.state.final_boss = Some(FinalBoss::new(&self.config.field));
            info!("final boss has spawned");
        } else {
            self.finish_level();
        }
    }

    fn manage_final_boss(&mut self) {
        if self.drive_final_boss() {
            self.finish_level();
        }
    }

    /// Advances the final boss, its phase-gated patterns and the pattern
    /// bullets in flight. Returns true while the boss is destroyed.
    fn drive_final_boss(&mut self) -> bool {
        let field = self.config.field;
        let mut defeated = false;

        // Aim at whichever ship is still in the fight.
        let target = if self.state.scoreboard.lives(PlayerId::P1) > 0 && !self.state.ship.destroyed
        {
            Some(self.state.ship.body.pos)
        } else {
            self.state
                .ship_p2
                .as_ref()
                .filter(|p2| self.state.scoreboard.lives(PlayerId::P2) > 0 && !p2.destroyed)
                .map(|p2| p2.body.pos)
        };

        if let Some(boss) = &mut self.state.final_boss {
            boss.update(&field);
            if !boss.destroyed {
                match boss.phase() {
                    BossPhase::Cruising => {
                        self.state.boss_bullets.extend(boss.shoot_spread());
                        if let Some(target) = target {
                            self.state.boss_bullets.extend(boss.shoot_aimed(target));
                        }
                    }
                    BossPhase::Enraged => {
                        if boss.begin_enrage() {
                            // One-time rage transition wipes the screen.
                            self.state.boss_bullets.clear();
                            info!("final boss is enraged");
                        } else {
                            self.state.boss_bullets.extend(boss.shoot_barrage());
                        }
                    }
                }

                for bullet in &mut self.state.boss_bullets {
                    bullet.update();
                }
                self.state
                    .boss_bullets
                    .retain(|b| !field.is_offscreen(&b.body));
            }
            defeated = boss.destroyed;
        }

        defeated
    }

    fn advance_infinite(&mut self) {
        if self.state.freeze.is_active() {
            return;
        }

        self.cycle_infinite_bosses();
        let boss_active = self.state.mid_boss.is_some() || self.state.final_boss.is_some();

        if let Some(infinite) = &mut self.state.infinite {
            infinite.update(&self.config.field);
            // Regular spawns pause while a boss holds the field.
            if !boss_active {
                infinite.spawn(&self.config.field, &mut self.state.rng, &mut self.state.ids);
            }
            infinite.shoot(
                &mut self.state.rng,
                &mut self.pools.bullets,
                &mut self.state.bullets,
            );
        }

        if self.state.final_boss.is_some() {
            self.drive_final_boss();
        } else if let Some(boss) = &mut self.state.mid_boss {
            boss.update(&self.config.field);
        }
    }

    /// Infinite-mode boss visits arrive on a fixed cadence: the first one
    /// clears the field for the mid boss, every later one brings the final
    /// boss. A defeated boss frees its slot once the explosion ends, and
    /// regular spawning resumes.
    fn cycle_infinite_bosses(&mut self) {
        if self.state.mid_boss.as_ref().is_some_and(|b| b.is_gone()) {
            self.state.mid_boss = None;
        }
        if self.state.final_boss.as_ref().is_some_and(|b| b.is_gone()) {
            self.state.final_boss = None;
        }
        if self.state.mid_boss.is_some() || self.state.final_boss.is_some() {
            return;
        }

        if self.state.boss_visit_timer > 0 {
            self.state.boss_visit_timer -= 1;
            return;
        }
        self.state.boss_visit_timer = BOSS_VISIT_FRAMES;

        if let Some(infinite) = &mut self.state.infinite {
            infinite.clear();
        }
        if self.state.boss_visits == 0 {
            self.state.mid_boss = Some(MidBoss::new(&self.config.field));
            info!("mid boss has spawned");
        } else {
            self.state.final_boss = Some(FinalBoss::new(&self.config.field));
            info!("final boss has spawned");
        }
        self.state.boss_visits += 1;
    }

    fn finish_level(&mut self) {
        if !self.state.scoreboard.level_finished {
            self.state.scoreboard.level_finished = true;
            self.state.finish_timer = FINISH_FRAMES;
        }
    }

    /// Applies the end-of-level rewards once the finish countdown elapses
    /// and stops the match.
    fn close_out_level(&mut self, achievements: &mut dyn AchievementSink) {
        let board = &mut self.state.scoreboard;
        let survived = board.lives_p1 > 0 || (board.two_player && board.lives_p2 > 0);

        if survived {
            if board.lives_p1 > 0 {
                board.add_points_for(Some(PlayerId::P1), LIFE_SCORE * (board.lives_p1 - 1));
            }
            if board.two_player && board.lives_p2 > 0 {
                board.add_points_for(Some(PlayerId::P2), LIFE_SCORE * (board.lives_p2 - 1));
            }

            if self.level.completion_bonus > 0 {
                board.coin += self.level.completion_bonus;
                info!(
                    bonus = self.level.completion_bonus,
                    "awarded completion currency"
                );
            }
            match &self.level.achievement_trigger {
                Some(name) if !name.is_empty() => {
                    achievements.unlock_achievement(name);
                    info!(achievement = name.as_str(), "level achievement unlocked");
                }
                Some(_) => warn!("level defines an empty achievement trigger"),
                None => {}
            }
        }

        info!(
            score = board.score_total,
            coin = board.coin,
            "match closed"
        );
        self.state.running = false;
    }

    /// Serializes the full world state for the external controller.
    pub fn serialize_state(&self) -> Vec<u8> {
        bincode::encode_to_vec(&self.state, bincode::config::standard())
            .expect("serialization should not fail")
    }

    /// Restores a previously serialized world state.
    pub fn deserialize_state(&mut self, data: &[u8]) -> Result<(), bincode::error::DecodeError> {
        let (state, _): (WorldState, _) =
            bincode::decode_from_slice(data, bincode::config::standard())?;
        self.state = state;
        Ok(())
    }
}

fn steer_ship(ship: &mut Ship, input: PlayerInput, field: &Playfield) {
    let delta = Vec2::new(input.horizontal() as f32, input.vertical() as f32) * Ship::SPEED;
    ship.body.pos += delta;
    ship.body.pos = field.clamp_to_ship_band(&ship.body);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign() -> Simulation {
        Simulation::new(SimulationConfig::default(), LevelConfig::default(), 12345)
    }

    #[test]
    fn simulation_determinism() {
        let mut a = campaign();
        let mut b = campaign();
        let inputs = vec![PlayerInput::from_bits(PlayerInput::FIRE | PlayerInput::LEFT)];

        for _ in 0..600 {
            a.tick_headless(&inputs);
            b.tick_headless(&inputs);
        }

        assert_eq!(a.state.frame, b.state.frame);
        assert_eq!(a.state.scoreboard.score_total, b.state.scoreboard.score_total);
        assert_eq!(a.state.ship.body.pos, b.state.ship.body.pos);
        assert_eq!(a.state.bullets.len(), b.state.bullets.len());
    }

    #[test]
    fn state_serialization_round_trip() {
        let mut sim = campaign();
        let inputs = vec![PlayerInput::from_bits(PlayerInput::FIRE)];
        for _ in 0..120 {
            sim.tick_headless(&inputs);
        }

        let snapshot = sim.serialize_state();
        let mut restored = campaign();
        restored.deserialize_state(&snapshot).unwrap();

        assert_eq!(sim.state.frame, restored.state.frame);
        assert_eq!(
            sim.state.scoreboard.score_total,
            restored.state.scoreboard.score_total
        );
        assert_eq!(sim.state.bullets.len(), restored.state.bullets.len());
    }

    #[test]
    fn firing_spends_the_cooldown_and_counts_shots() {
        let mut sim = campaign();
        let inputs = vec![PlayerInput::from_bits(PlayerInput::FIRE)];
        sim.tick_headless(&inputs);

        assert_eq!(sim.state.scoreboard.bullets_shot, 1);
        assert_eq!(sim.state.bullets.len(), 1);
        assert!(sim.state.bullets[0].speed < 0.0);

        // Held fire does not spam: next shot waits for the cooldown.
        sim.tick_headless(&inputs);
        assert_eq!(sim.state.scoreboard.bullets_shot, 1);
    }

    #[test]
    fn cleared_wave_enters_boss_phase() {
        let mut sim = campaign();
        sim.level.boss = Some(BossKind::Mid);

        let ids: Vec<_> = sim
            .state
            .formation
            .as_ref()
            .unwrap()
            .members
            .iter()
            .map(|m| m.id)
            .collect();
        for id in ids {
            sim.state.formation.as_mut().unwrap().destroy(id);
        }

        sim.tick_headless(&[]);
        assert_eq!(sim.state.phase, StagePhase::BossWave);

        sim.tick_headless(&[]);
        assert!(sim.state.mid_boss.is_some());
        assert!(sim.state.formation.as_ref().unwrap().is_empty());
    }

    #[test]
    fn mid_boss_defeat_chains_into_final_boss() {
        let mut sim = campaign();
        sim.level.boss = Some(BossKind::MidThenFinal);
        sim.state.phase = StagePhase::BossWave;

        sim.tick_headless(&[]);
        assert!(sim.state.mid_boss.is_some());

        sim.state.mid_boss.as_mut().unwrap().take_damage(MidBoss::MAX_HEALTH);
        sim.state.mid_boss.as_mut().unwrap().destroy();
        sim.tick_headless(&[]);

        assert!(sim.state.mid_boss.is_none());
        assert!(sim.state.final_boss.is_some());
        assert!(!sim.state.scoreboard.level_finished);
    }

    #[test]
    fn lone_mid_boss_defeat_finishes_the_level() {
        let mut sim = campaign();
        sim.level.boss = Some(BossKind::Mid);
        sim.state.phase = StagePhase::BossWave;
        sim.tick_headless(&[]);

        sim.state.mid_boss.as_mut().unwrap().take_damage(MidBoss::MAX_HEALTH);
        sim.state.mid_boss.as_mut().unwrap().destroy();
        sim.tick_headless(&[]);

        assert!(sim.state.scoreboard.level_finished);
    }

    #[test]
    fn final_boss_fires_patterns_and_enrages_once() {
        let mut sim = campaign();
        sim.level.boss = Some(BossKind::Final);
        sim.state.phase = StagePhase::BossWave;
        sim.tick_headless(&[]);
        assert!(sim.state.final_boss.is_some());

        for _ in 0..120 {
            sim.tick_headless(&[]);
        }
        assert!(!sim.state.boss_bullets.is_empty(), "cruising patterns fire");

        // Drop the boss into the enraged band: the screen wipes once.
        let boss = sim.state.final_boss.as_mut().unwrap();
        boss.take_damage(FinalBoss::MAX_HEALTH * 3 / 4);
        sim.tick_headless(&[]);
        assert!(sim.state.boss_bullets.is_empty(), "enrage clears the screen");

        for _ in 0..60 {
            sim.tick_headless(&[]);
        }
        assert!(!sim.state.boss_bullets.is_empty(), "barrage resumes fire");
    }

    #[test]
    fn freeze_halts_the_formation() {
        let mut sim = campaign();
        sim.state.freeze.activate(30);

        let before: Vec<Vec2> = sim
            .state
            .formation
            .as_ref()
            .unwrap()
            .members
            .iter()
            .map(|m| m.body.pos)
            .collect();
        for _ in 0..20 {
            sim.tick_headless(&[]);
        }
        let after: Vec<Vec2> = sim
            .state
            .formation
            .as_ref()
            .unwrap()
            .members
            .iter()
            .map(|m| m.body.pos)
            .collect();

        assert_eq!(before, after);
    }

    #[test]
    fn spent_lives_end_the_match() {
        let mut sim = campaign();
        sim.state.scoreboard.lives_p1 = 0;

        sim.tick_headless(&[]);
        assert!(sim.state.scoreboard.level_finished);

        for _ in 0..=FINISH_FRAMES {
            sim.tick_headless(&[]);
        }
        assert!(!sim.is_running());
    }

    #[test]
    fn completion_rewards_apply_once() {
        struct Recorder(Vec<String>);
        impl AchievementSink for Recorder {
            fn unlock_achievement(&mut self, name: &str) {
                self.0.push(name.to_string());
            }
            fn on_enemy_defeated(&mut self) {}
        }

        let mut sim = campaign();
        sim.level.completion_bonus = 50;
        sim.level.achievement_trigger = Some("Wave Breaker".to_string());
        sim.level.boss = None;
        sim.state.phase = StagePhase::BossWave;

        let mut recorder = Recorder(Vec::new());
        let mut hud = NoopHud;
        let coin_before = sim.state.scoreboard.coin;
        for _ in 0..(FINISH_FRAMES + 5) {
            sim.tick(&[], &mut recorder, &mut hud);
        }

        assert!(!sim.is_running());
        assert_eq!(sim.state.scoreboard.coin, coin_before + 50);
        assert_eq!(recorder.0, vec!["Wave Breaker".to_string()]);

        // Further ticks are no-ops.
        let frame = sim.state.frame;
        sim.tick(&[], &mut recorder, &mut hud);
        assert_eq!(sim.state.frame, frame);
        assert_eq!(recorder.0.len(), 1);
    }

    #[test]
    fn infinite_boss_visits_cycle_mid_then_final() {
        let config = SimulationConfig {
            mode: GameMode::Infinite,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(config, LevelConfig::default(), 5);

        // Let the field fill up, then force the first visit.
        for _ in 0..120 {
            sim.tick_headless(&[]);
        }
        sim.state.boss_visit_timer = 0;
        sim.tick_headless(&[]);

        assert!(sim.state.mid_boss.is_some());
        assert!(
            sim.state.infinite.as_ref().unwrap().is_empty(),
            "the visit clears regular enemies"
        );

        // Down the mid boss; the slot frees once the explosion ends.
        sim.state.mid_boss.as_mut().unwrap().take_damage(MidBoss::MAX_HEALTH);
        sim.state.mid_boss.as_mut().unwrap().destroy();
        for _ in 0..=crate::boss::BOSS_EXPLOSION_FRAMES {
            sim.tick_headless(&[]);
        }
        assert!(sim.state.mid_boss.is_none());

        // The next visit brings the final boss, and nothing ends the match.
        sim.state.boss_visit_timer = 0;
        sim.tick_headless(&[]);
        assert!(sim.state.final_boss.is_some());
        assert!(!sim.state.scoreboard.level_finished);
    }

    #[test]
    fn infinite_mode_streams_enemies() {
        let config = SimulationConfig {
            mode: GameMode::Infinite,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(config, LevelConfig::default(), 7);

        for _ in 0..180 {
            sim.tick_headless(&[]);
        }
        let infinite = sim.state.infinite.as_ref().unwrap();
        assert!(!infinite.is_empty());
        assert!(sim.state.formation.is_none());
    }
}
