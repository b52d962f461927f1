//! Ray-casting core: wall, floor and sprite casters plus the frame
//! orchestrator that schedules them.

mod buffers;
mod config;
#[allow(clippy::module_inception)]
mod engine;
mod floor;
mod lighting;
mod pool;
mod sort;
mod sprites;
mod types;
mod walls;

pub use buffers::{ColumnSlice, FloorBuffer, LevelBuffer, SpriteLevels};
pub use config::{ConfigError, INITIAL_SPRITE_CAPACITY, MAX_CONCURRENT, RenderConfig};
pub use engine::{Engine, EngineError};
pub use floor::{row_distance, wall_base};
pub use lighting::Lighting;
pub use pool::SpritePool;
pub use sort::comb_sort;
pub use sprites::{SpriteProjection, project_sprite};
pub use types::{ColumnHit, FrameView, HitKind, Side, Tint};
pub use walls::cast_ray;
