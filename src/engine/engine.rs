use rayon::ThreadPoolBuildError;
use tracing::{debug, info, trace_span};

use crate::{
    engine::{
        buffers::{FloorBuffer, LevelBuffer, SpriteLevels},
        config::{ConfigError, RenderConfig},
        floor::cast_floor_column,
        pool::SpritePool,
        sort::comb_sort,
        sprites::cast_sprite,
        types::{ColumnHit, FrameView},
        walls::{cast_column, cast_level, cast_ray},
    },
    world::{Billboard, Camera, Map, MapError, Raster, Sprite, TextureError, TextureHandler},
};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("texture handler uses {textures}px textures, config expects {config}px")]
    TexSizeMismatch { textures: usize, config: usize },

    #[error("could not start the sprite pool: {0}")]
    Pool(#[from] ThreadPoolBuildError),
}

/// Ray-casting engine: owns the camera, the collaborators and every
/// per-frame buffer.
///
/// [`Engine::update`] runs one frame in two fork-join phases:
///
/// 1. one task per map level casts its wall slices; the ground level also
///    fills the z-buffer and spawns one floor task per column.
/// 2. sprites are sorted far to near and cast on the [`SpritePool`], each
///    into its own slot, tested against the z-buffer.
///
/// Both phases finish before `update` returns, so the buffers read by the
/// presentation layer are complete until the next call.
pub struct Engine<M: Map> {
    pub camera: Camera,
    /// Tiles may be edited between frames; the level count may change too.
    pub map: M,

    textures: TextureHandler,
    config: RenderConfig,

    levels: Vec<LevelBuffer>,
    floor: FloorBuffer,
    z_buffer: Vec<f64>,

    sprite_levels: SpriteLevels,
    sprite_order: Vec<usize>,
    sprite_distance: Vec<f64>,
    sprite_count: usize,

    pool: SpritePool,
}

impl<M: Map> Engine<M> {
    /// Engine with its own sprite pool of `config.max_concurrent` workers.
    pub fn new(
        config: RenderConfig,
        map: M,
        textures: TextureHandler,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let pool = SpritePool::new(config.max_concurrent)?;
        Self::with_pool(config, map, textures, pool)
    }

    /// Engine casting sprites on a caller-supplied pool.
    pub fn with_pool(
        config: RenderConfig,
        map: M,
        textures: TextureHandler,
        pool: SpritePool,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if textures.tex_size() != config.tex_size {
            return Err(EngineError::TexSizeMismatch {
                textures: textures.tex_size(),
                config: config.tex_size,
            });
        }
        let num_levels = map.num_levels();
        if num_levels == 0 {
            return Err(MapError::NoLevels.into());
        }

        let (w, h) = (config.width, config.height);
        let size = map.size();
        let camera = Camera::new(config.fov_radians(), config.fov_depth, (w, h), (size, size))
            .with_edge_distance(config.edge_distance)
            .with_stances(config.stances);

        info!(
            width = w,
            height = h,
            levels = num_levels,
            map_size = size,
            tex_size = config.tex_size,
            sprite_threads = pool.threads(),
            "raycaster engine created"
        );

        let mut engine = Self {
            camera,
            map,
            textures,
            levels: (0..num_levels).map(|_| LevelBuffer::new(w, h)).collect(),
            floor: FloorBuffer::new(w, h),
            z_buffer: vec![f64::INFINITY; w],
            sprite_levels: SpriteLevels::new(config.initial_sprite_capacity),
            sprite_order: Vec::with_capacity(config.initial_sprite_capacity),
            sprite_distance: Vec::with_capacity(config.initial_sprite_capacity),
            sprite_count: 0,
            config,
            pool,
        };

        // buffers hold a valid frame before the first update
        engine.update::<Billboard>(&[]);
        Ok(engine)
    }

    /*────────────────────────────── frame ───────────────────────────────*/

    /// Cast a full frame for the current camera pose and `sprites`.
    pub fn update<S: Sprite>(&mut self, sprites: &[S]) {
        self.cast_walls();
        self.cast_sprites(sprites);
    }

    /// Phase 1: walls for every level, z-buffer and floor from level 0.
    fn cast_walls(&mut self) {
        let num_levels = self.map.num_levels();
        if num_levels != self.levels.len() {
            debug!(from = self.levels.len(), to = num_levels, "level count changed");
            let (w, h) = (self.config.width, self.config.height);
            self.levels.resize_with(num_levels, || LevelBuffer::new(w, h));
        }
        // nothing to cast against, and no level 0 to size the map from
        if num_levels == 0 {
            self.z_buffer.fill(f64::INFINITY);
            self.floor.clear();
            self.floor.resolve();
            return;
        }
        let size = self.map.size();
        self.camera.set_map_size(size, size);

        let _span = trace_span!("walls", levels = num_levels).entered();

        self.floor.clear();
        let view = FrameView::new(&self.camera, &self.config);
        let map = &self.map;
        let textures = &self.textures;
        let floor_tex = textures.floor();
        let floor_columns = self.floor.columns_mut();
        let z_buffer = &mut self.z_buffer;

        let Some((ground, upper)) = self.levels.split_first_mut() else {
            return;
        };

        rayon::scope(|s| {
            for (i, buf) in upper.iter_mut().enumerate() {
                let level = i + 1;
                s.spawn(move |_| cast_level(&view, map.level(level), textures, level, buf));
            }

            s.spawn(move |s| {
                let grid = map.level(0);
                for (x, (z, column)) in z_buffer.iter_mut().zip(floor_columns).enumerate() {
                    let hit = cast_column(&view, grid, textures, 0, x, ground);
                    *z = hit.perp_wall_dist;
                    s.spawn(move |_| cast_floor_column(&view, &hit, floor_tex, column));
                }
            });
        });

        self.floor.resolve();
    }

    /// Phase 2: sort, then one pool task per sprite slot.
    fn cast_sprites<S: Sprite>(&mut self, sprites: &[S]) {
        let count = sprites.len();
        self.sprite_count = count;
        if self.sprite_levels.prepare(count) {
            debug!(
                sprites = count,
                capacity = self.sprite_levels.capacity(),
                "sprite slots grown"
            );
        }
        if count == 0 {
            self.sprite_order.clear();
            self.sprite_distance.clear();
            return;
        }

        let _span = trace_span!("sprites", count).entered();

        let pos = self.camera.pos();
        self.sprite_order.clear();
        self.sprite_order.extend(0..count);
        self.sprite_distance.clear();
        self.sprite_distance
            .extend(sprites.iter().map(|s| pos.distance_squared(s.pos())));
        comb_sort(&mut self.sprite_order, &mut self.sprite_distance);

        let view = FrameView::new(&self.camera, &self.config);
        let z_buffer = &self.z_buffer;
        let order = &self.sprite_order;
        let slots = self.sprite_levels.slots_mut(count);

        self.pool.scope(|s| {
            for (slot, &index) in slots.iter_mut().zip(order) {
                let sprite = &sprites[index];
                s.spawn(move |_| cast_sprite(&view, sprite, z_buffer, slot));
            }
        });
    }

    /// Change the viewport; reallocates every per-column buffer and recasts
    /// the walls.  Sprite slots are cleared until the next [`Self::update`].
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyViewport(width, height));
        }
        debug!(width, height, "viewport resized");

        self.config.width = width;
        self.config.height = height;
        self.camera.set_viewport(width, height);

        for buf in &mut self.levels {
            *buf = LevelBuffer::new(width, height);
        }
        self.floor = FloorBuffer::new(width, height);
        self.z_buffer = vec![f64::INFINITY; width];

        self.cast_walls();
        self.cast_sprites::<Billboard>(&[]);
        Ok(())
    }

    /// Cast a single ray without touching any buffer.
    pub fn cast_ray(&self, level: usize, x: usize) -> Option<ColumnHit> {
        if level >= self.map.num_levels() || x >= self.config.width {
            return None;
        }
        let view = FrameView::new(&self.camera, &self.config);
        Some(cast_ray(&view, self.map.level(level), x as i32, level))
    }

    /*──────────────────────────── accessors ─────────────────────────────*/

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[inline]
    pub fn target_tps(&self) -> u32 {
        self.config.target_tps
    }

    #[inline]
    pub fn pool(&self) -> &SpritePool {
        &self.pool
    }

    #[inline]
    pub fn textures(&self) -> &TextureHandler {
        &self.textures
    }

    /// In-place edits (new sheets, floor, sky) keep the texture size.
    #[inline]
    pub fn textures_mut(&mut self) -> &mut TextureHandler {
        &mut self.textures
    }

    /// Swap in another texture set; returns the previous one.
    pub fn set_textures(
        &mut self,
        textures: TextureHandler,
    ) -> Result<TextureHandler, EngineError> {
        if textures.tex_size() != self.config.tex_size {
            return Err(EngineError::TexSizeMismatch {
                textures: textures.tex_size(),
                config: self.config.tex_size,
            });
        }
        Ok(std::mem::replace(&mut self.textures, textures))
    }

    /// Wall slices of `level` from the last frame.
    #[inline]
    pub fn level(&self, level: usize) -> Option<&LevelBuffer> {
        self.levels.get(level)
    }

    /// Wall slices of every level, ground first.
    #[inline]
    pub fn levels(&self) -> &[LevelBuffer] {
        &self.levels
    }

    /// Row-major RGBA floor raster.
    #[inline]
    pub fn floor(&self) -> &Raster {
        self.floor.raster()
    }

    #[inline]
    pub fn sky(&self) -> Option<&Raster> {
        self.textures.sky()
    }

    /// Perpendicular wall distance per column of the ground level.
    #[inline]
    pub fn z_buffer(&self) -> &[f64] {
        &self.z_buffer
    }

    /// Sprite slot `index` in far-to-near order, `None` if nothing of it is
    /// visible.
    #[inline]
    pub fn sprite_level(&self, index: usize) -> Option<&LevelBuffer> {
        if index < self.sprite_count {
            self.sprite_levels.get(index)
        } else {
            None
        }
    }

    #[inline]
    pub fn sprite_levels(&self) -> &SpriteLevels {
        &self.sprite_levels
    }

    /// Sprite indices of the last frame, farthest first.
    #[inline]
    pub fn sprite_order(&self) -> &[usize] {
        &self.sprite_order
    }

    /// Squared camera distances matching [`Self::sprite_order`].
    #[inline]
    pub fn sprite_distance(&self) -> &[f64] {
        &self.sprite_distance
    }

    #[inline]
    pub fn sprite_count(&self) -> usize {
        self.sprite_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Grid, GridMap, SpriteTexture};
    use glam::DVec2;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn textures(size: usize) -> TextureHandler {
        let mut t = TextureHandler::new(size).unwrap();
        for shade in [60u8, 120, 180, 240] {
            t.insert_wall(Raster::from_fn(size, size, |_, _| [shade, shade, shade, 255]))
                .unwrap();
        }
        t
    }

    fn engine(levels: usize) -> Engine<GridMap> {
        let mut grid = vec![vec![0; 8]; 8];
        grid[6] = vec![1; 8];
        let mut all = vec![grid];
        for _ in 1..levels {
            all.push(all[0].clone());
        }
        let map = GridMap::new(all).unwrap();
        let cfg = RenderConfig::default()
            .with_viewport(32, 24)
            .with_tex_size(8)
            .with_max_concurrent(4);
        let mut e = Engine::new(cfg, map, textures(8)).unwrap();
        e.camera.set_position(DVec2::new(2.5, 4.5));
        e
    }

    #[test]
    fn new_rejects_mismatched_texture_size() {
        let map = GridMap::new(vec![vec![vec![0; 4]; 4]]).unwrap();
        let cfg = RenderConfig::default().with_viewport(8, 8).with_tex_size(16);
        let err = Engine::new(cfg, map, textures(8)).err().unwrap();
        assert!(matches!(
            err,
            EngineError::TexSizeMismatch { textures: 8, config: 16 }
        ));
    }

    #[test]
    fn construction_casts_an_initial_frame() {
        let e = engine(1);
        assert_eq!(e.levels().len(), 1);
        assert!(e.z_buffer().iter().all(|z| z.is_finite()));
        assert_eq!(e.sprite_count(), 0);
        assert_eq!(e.camera.fov_depth(), e.config().fov_depth);
        assert_eq!(e.camera.edge_distance(), e.config().edge_distance);
    }

    #[test]
    fn update_fills_every_level_and_the_z_buffer() {
        let mut e = engine(2);
        e.update::<Billboard>(&[]);

        let ground = e.level(0).unwrap();
        assert_eq!(ground.columns().count(), 32);
        assert_eq!(e.level(1).unwrap().columns().count(), 32);
        // x = 6 wall, camera at x = 2.5 facing east
        assert!((e.z_buffer()[16] - 3.5).abs() < 1e-9);

        // floor pixels below the wall are written, above are not
        let floor = e.floor();
        assert_eq!(floor.rgba_at(16, 0)[3], 0);
        assert_eq!(floor.rgba_at(16, 23)[3], 255);
    }

    #[test]
    fn sprites_are_sorted_far_to_near() {
        let mut e = engine(1);
        let tex = SpriteTexture { id: 0, w: 8, h: 8 };
        let sprites = [
            Billboard::new(DVec2::new(3.5, 4.5), tex),
            Billboard::new(DVec2::new(5.5, 4.5), tex),
            Billboard::new(DVec2::new(4.5, 4.5), tex),
        ];
        e.update(&sprites);

        assert_eq!(e.sprite_order(), &[1, 2, 0]);
        assert_eq!(e.sprite_distance(), &[9.0, 4.0, 1.0]);
        assert!(e.sprite_level(0).is_some());
        assert!(e.sprite_level(3).is_none());
    }

    #[test]
    fn resize_reallocates_buffers() {
        let mut e = engine(2);
        e.resize(16, 12).unwrap();
        assert_eq!(e.z_buffer().len(), 16);
        assert_eq!(e.level(1).unwrap().width(), 16);
        assert_eq!((e.floor().w, e.floor().h), (16, 12));
        assert_eq!(e.camera.viewport(), (16, 12));
        assert!(e.resize(0, 12).is_err());
    }

    #[test]
    fn texture_swaps_are_size_checked() {
        let mut e = engine(1);
        let err = e.set_textures(textures(4)).err().unwrap();
        assert!(matches!(
            err,
            EngineError::TexSizeMismatch { textures: 4, config: 8 }
        ));
        assert_eq!(e.textures().tex_size(), 8);

        let old = e.set_textures(textures(8)).unwrap();
        assert_eq!(old.wall_count(), 4);
        e.update::<Billboard>(&[]);
        assert_eq!(e.floor().rgba_at(16, 23)[3], 255);
    }

    #[test]
    fn replaced_handler_with_other_size_still_renders() {
        let mut e = engine(1);
        // bypasses the size check; the frame must still complete
        *e.textures_mut() = textures(4);
        e.update::<Billboard>(&[]);
        assert_eq!(e.level(0).unwrap().columns().count(), 32);
        assert_eq!(e.floor().rgba_at(16, 23)[3], 255);
    }

    /// Map whose level count can drop after construction.
    struct Shrinking {
        grid: GridMap,
        levels: AtomicUsize,
    }

    impl Map for Shrinking {
        fn num_levels(&self) -> usize {
            self.levels.load(Ordering::Relaxed)
        }
        fn level(&self, index: usize) -> &Grid {
            assert!(index < self.num_levels(), "level {index} does not exist");
            self.grid.level(index)
        }
    }

    #[test]
    fn map_without_levels_yields_an_empty_frame() {
        let map = Shrinking {
            grid: GridMap::new(vec![vec![vec![0; 4]; 4]]).unwrap(),
            levels: AtomicUsize::new(1),
        };
        let cfg = RenderConfig::default()
            .with_viewport(8, 6)
            .with_tex_size(8)
            .with_max_concurrent(2);
        let mut e = Engine::new(cfg, map, textures(8)).unwrap();
        assert_eq!(e.levels().len(), 1);

        e.map.levels.store(0, Ordering::Relaxed);
        let tex = SpriteTexture { id: 0, w: 8, h: 8 };
        e.update(&[Billboard::new(DVec2::new(3.5, 2.0), tex)]);

        assert!(e.levels().is_empty());
        assert!(e.z_buffer().iter().all(|z| z.is_infinite()));
        assert!(e.floor().pixels.iter().all(|&b| b == 0));
        assert!(e.cast_ray(0, 0).is_none());
    }

    #[test]
    fn pool_is_sized_from_the_config() {
        let e = engine(1);
        assert_eq!(e.pool().capacity(), 4);
        assert!(e.pool().threads() >= 1 && e.pool().threads() <= 4);
    }

    #[test]
    fn single_ray_matches_the_frame() {
        let mut e = engine(1);
        e.update::<Billboard>(&[]);
        let hit = e.cast_ray(0, 16).unwrap();
        assert_eq!((hit.map_x, hit.map_y), (6, 4));
        assert_eq!(hit.perp_wall_dist, e.z_buffer()[16]);
        assert!(e.cast_ray(1, 0).is_none());
        assert!(e.cast_ray(0, 32).is_none());
    }
}
