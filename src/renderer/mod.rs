//! Presentation layer.
//!
//! *The engine never touches a frame-buffer.*  It leaves per-column draw
//! instructions (wall levels, the floor raster, sorted sprite slots) that a
//! type implementing [`Renderer`] turns into pixels.
//!
//! * Back-ends can be swapped without touching the casters.
//! * The blanket [`RendererExt`] adds `draw_frame`, which composites a whole
//!   [`Engine`] frame in the right order.

use crate::{
    engine::{Engine, LevelBuffer},
    world::{Map, Raster, TextureHandler},
};

/// Pixel format of the software frame-buffer (0x00RRGGBB).
pub type Rgba = u32;

/// A renderer that owns an internal scratch buffer for the whole frame.
///
/// `end_frame` hands the finished buffer to a user-supplied closure.
pub trait Renderer {
    /// (Re)allocate internal scratch for the requested resolution and clear it.
    fn begin_frame(&mut self, width: usize, height: usize);

    /// Sky (if any) behind everything, then the projected floor raster.
    fn draw_background(&mut self, sky: Option<&Raster>, floor: &Raster);

    /// Stretch every column of `level` over its screen span.
    fn draw_level(&mut self, level: &LevelBuffer, textures: &TextureHandler);

    /// Finish the frame and **loan** the finished buffer to `submit`.
    ///
    /// Software callers pass `|fb, w, h| window.update_with_buffer(fb, w, h)`.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize);
}

/// Convenience blanket-impl with a one-liner `draw_frame` adaptor.
pub trait RendererExt: Renderer {
    /// Composite the engine's last frame: background, wall levels ground
    /// first, then sprites far to near.
    fn draw_frame<M, F>(&mut self, engine: &Engine<M>, submit: F)
    where
        M: Map,
        F: FnOnce(&[Rgba], usize, usize),
    {
        let cfg = engine.config();
        self.begin_frame(cfg.width, cfg.height);
        self.draw_background(engine.sky(), engine.floor());
        for level in engine.levels() {
            self.draw_level(level, engine.textures());
        }
        for i in 0..engine.sprite_count() {
            if let Some(sprite) = engine.sprite_level(i) {
                self.draw_level(sprite, engine.textures());
            }
        }
        self.end_frame(submit);
    }
}
impl<T: Renderer + ?Sized> RendererExt for T {}

pub mod software;
