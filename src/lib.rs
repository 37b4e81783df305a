pub mod audio;
pub mod boss;
pub mod combat;
pub mod config;
pub mod entities;
pub mod events;
pub mod feedback;
pub mod geometry;
pub mod level;
pub mod player;
pub mod plugin;
pub mod preferences;
pub mod spawn;
pub mod timers;

pub use config::DirectorConfig;
pub use level::{EncounterDirector, LevelPhase, TickInput};
pub use plugin::EncounterPlugin;
