//! Level configuration consumed by the combat core.
//!
//! The host loads level content (JSON, campaign tables) and hands the core
//! this plain struct. Missing pieces are represented as `None`/empty and
//! mean "nothing to do", never an error.

use serde::{Deserialize, Serialize};

use crate::entities::{EnemyClass, ItemKind};

/// Which boss encounter follows the wave phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossKind {
    Mid,
    Final,
    /// Mid boss first; its defeat spawns the final boss.
    MidThenFinal,
}

/// One drop-table entry: destroying an enemy of `enemy_class` rolls
/// `chance` for an item of `kind`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ItemDrop {
    pub enemy_class: EnemyClass,
    pub kind: ItemKind,
    pub chance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    /// Grid formation dimensions.
    pub formation_columns: u32,
    pub formation_rows: u32,
    /// Frames between formation movement steps.
    pub movement_interval: u32,
    /// Frames between formation shots.
    pub shooting_interval: u32,
    pub boss: Option<BossKind>,
    pub item_drops: Vec<ItemDrop>,
    /// Currency awarded when the level is completed with a survivor.
    pub completion_bonus: i32,
    /// Achievement unlocked on completion, if the level defines one.
    pub achievement_trigger: Option<String>,
}

impl LevelConfig {
    /// Drop-table entries matching a destroyed enemy's class.
    pub fn drops_for(&self, class: EnemyClass) -> impl Iterator<Item = &ItemDrop> {
        self.item_drops
            .iter()
            .filter(move |drop| drop.enemy_class == class)
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            name: "wave 1".into(),
            formation_columns: 7,
            formation_rows: 5,
            movement_interval: 30,
            shooting_interval: 120,
            boss: None,
            item_drops: Vec::new(),
            completion_bonus: 0,
            achievement_trigger: None,
        }
    }
}
