mod camera;
mod grid;
mod sprite;
mod texture;

pub use camera::{Camera, EDGE_DISTANCE, Stances, Vector2};
pub use grid::{Grid, GridMap, Map, MapError};
pub use sprite::{Billboard, Sprite, SpriteTexture};
pub use texture::{Raster, TexRect, TextureError, TextureHandler, TextureId};
