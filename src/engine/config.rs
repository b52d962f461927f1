use smallvec::{SmallVec, smallvec};

use crate::{
    engine::lighting::Lighting,
    world::{EDGE_DISTANCE, Stances},
};

/// Default cap on concurrently running sprite casts.
pub const MAX_CONCURRENT: usize = 100;

/// Sprite slots allocated up front; grows by doubling.
pub const INITIAL_SPRITE_CAPACITY: usize = 16;

/// Everything tunable about the engine.  Fixed for the engine's lifetime
/// except the viewport, which [`crate::engine::Engine::resize`] changes.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Wall/floor texture edge, in texels.
    pub tex_size: usize,

    pub fov_degrees: f64,
    pub fov_depth: f64,

    /// Tick rate the game loop should aim for; the engine only reports it.
    pub target_tps: u32,

    /// Worker count of the sprite pool.
    pub max_concurrent: usize,
    pub initial_sprite_capacity: usize,

    pub edge_distance: f64,
    pub stances: Stances,
    pub lighting: Lighting,

    /// `(from, to)` texture-number swaps applied to hits on east/west faces.
    /// Lets asymmetric wall textures read correctly from both sides.
    pub side_x_remap: SmallVec<[(i32, i32); 4]>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            tex_size: 256,
            fov_degrees: 70.0,
            fov_depth: 1.0,
            target_tps: 60,
            max_concurrent: MAX_CONCURRENT,
            initial_sprite_capacity: INITIAL_SPRITE_CAPACITY,
            edge_distance: EDGE_DISTANCE,
            stances: Stances::default(),
            lighting: Lighting::default(),
            side_x_remap: smallvec![(3, 4), (4, 3), (1, 4), (2, 3)],
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("viewport {0}x{1} has no pixels")]
    EmptyViewport(usize, usize),

    #[error("texture size must be non-zero")]
    ZeroTexSize,

    #[error("sprite pool needs at least one worker")]
    ZeroConcurrency,

    #[error("field of view {0}° must be inside (0, 180)")]
    BadFov(f64),

    #[error("fov depth {0} must be positive")]
    BadFovDepth(f64),
}

impl RenderConfig {
    pub fn with_viewport(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_tex_size(mut self, tex_size: usize) -> Self {
        self.tex_size = tex_size;
        self
    }

    pub fn with_fov(mut self, fov_degrees: f64) -> Self {
        self.fov_degrees = fov_degrees;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_lighting(mut self, lighting: Lighting) -> Self {
        self.lighting = lighting;
        self
    }

    /// Replace the east/west texture remap; pass `&[]` to disable it.
    pub fn with_side_x_remap(mut self, remap: &[(i32, i32)]) -> Self {
        self.side_x_remap = SmallVec::from_slice(remap);
        self
    }

    #[inline]
    pub fn fov_radians(&self) -> f64 {
        self.fov_degrees.to_radians()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyViewport(self.width, self.height));
        }
        if self.tex_size == 0 {
            return Err(ConfigError::ZeroTexSize);
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::BadFov(self.fov_degrees));
        }
        if !(self.fov_depth > 0.0) {
            return Err(ConfigError::BadFovDepth(self.fov_depth));
        }
        Ok(())
    }

    /// Texture number to draw for an east/west hit on `tex_num`.
    #[inline]
    pub fn remap_side_x(remap: &[(i32, i32)], tex_num: i32) -> i32 {
        remap
            .iter()
            .find(|(from, _)| *from == tex_num)
            .map_or(tex_num, |&(_, to)| to)
    }
}
