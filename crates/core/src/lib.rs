//! Starfall Core - Combat Resolution Simulation
//!
//! This crate contains the per-tick combat core of the game: entity
//! collections, formations, boss state machines, the drop-item economy and
//! the collision resolution engine that ties them together. The host owns
//! rendering, audio, input capture and persistence; it advances the
//! simulation once per frame and reads back state for drawing.
//!
//! # Determinism Rules
//!
//! 1. No `thread_rng` - all randomness flows through `SeededRandom`
//! 2. No system time - timed effects are frame countdowns
//! 3. Ordered iteration - `Vec` everywhere, no hash-ordered containers
//! 4. No async - one synchronous `tick` per frame, driven by the host

pub mod boss;
pub mod collision;
pub mod entities;
pub mod formation;
pub mod input;
pub mod level;
pub mod physics;
pub mod pool;
pub mod random;
pub mod score;
pub mod simulation;

pub use input::PlayerInput;
pub use level::LevelConfig;
pub use physics::Playfield;
pub use random::SeededRandom;
pub use score::{AchievementSink, Hud, Scoreboard};
pub use simulation::{Simulation, SimulationConfig};
