//! ---------------------------------------------------------------------------
//! Software (CPU) column compositor
//!
//! * Fills a `Vec<u32>` frame-buffer in **0x00RRGGBB** format.
//! * Relies on the caller to submit layers back to front (background, wall
//!   levels, then sprites far to near); texels with zero alpha are skipped,
//!   so later layers simply paint over earlier ones.
//! ---------------------------------------------------------------------------

use crate::{
    engine::LevelBuffer,
    renderer::{Renderer, Rgba},
    world::{Raster, TextureHandler},
};

const CLEAR: Rgba = 0x00_20_20_20;

/*───────────────────────────────────────────────────────────────────────*/
/*                              Backend                                 */
/*───────────────────────────────────────────────────────────────────────*/

#[derive(Default)]
pub struct Software {
    scratch: Vec<Rgba>,
    width: usize,
    height: usize,
}

impl Software {
    /// The last composited frame, row-major.
    pub fn frame(&self) -> &[Rgba] {
        &self.scratch
    }
}

/*──────────────────────── Renderer trait impl ────────────────────────*/
impl Renderer for Software {
    fn begin_frame(&mut self, w: usize, h: usize) {
        // (re)allocate if resolution changed
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.scratch.resize(w * h, 0);
        }
        self.scratch.fill(CLEAR);
    }

    fn draw_background(&mut self, sky: Option<&Raster>, floor: &Raster) {
        let (w, h) = (self.width, self.height);

        if let Some(sky) = sky.filter(|s| s.w > 0 && s.h > 0) {
            // nearest-neighbour stretch over the whole viewport
            for y in 0..h {
                let sy = y * sky.h / h;
                let row = &mut self.scratch[y * w..(y + 1) * w];
                for (x, px) in row.iter_mut().enumerate() {
                    *px = pack(sky.rgba_at(x * sky.w / w, sy));
                }
            }
        }

        for y in 0..h.min(floor.h) {
            for x in 0..w.min(floor.w) {
                let texel = floor.rgba_at(x, y);
                if texel[3] != 0 {
                    self.scratch[y * w + x] = pack(texel);
                }
            }
        }
    }

    fn draw_level(&mut self, level: &LevelBuffer, textures: &TextureHandler) {
        for col in level.columns() {
            let Ok(tex) = textures.texture(col.tex) else {
                continue;
            };
            if col.x >= self.width {
                continue;
            }

            let (src_h, dst_h) = (col.cts.height() as i64, col.sv.height() as i64);
            if src_h <= 0 || dst_h <= 0 {
                continue;
            }
            let u = col.cts.min_x;
            if u < 0 || u as usize >= tex.w {
                continue;
            }

            // clip rows to the screen, keep the unclipped span for sampling
            let y0 = col.sv.min_y.max(0) as i64;
            let y1 = (col.sv.max_y as i64).min(self.height as i64);
            for y in y0..y1 {
                let v = col.cts.min_y as i64 + (y - col.sv.min_y as i64) * src_h / dst_h;
                if v < 0 || v as usize >= tex.h {
                    continue;
                }
                let texel = tex.rgba_at(u as usize, v as usize);
                if texel[3] == 0 {
                    continue;
                }
                self.scratch[y as usize * self.width + col.x] = pack(col.st.shade(texel));
            }
        }
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        submit(&self.scratch, self.width, self.height);
    }
}

#[inline]
fn pack([r, g, b, _]: [u8; 4]) -> Rgba {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/*──────────────────────────────── Tests ───────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::{Engine, RenderConfig, Tint},
        renderer::RendererExt,
        world::{Billboard, GridMap, TexRect},
    };
    use glam::DVec2;

    fn red_bank(size: usize) -> TextureHandler {
        let mut bank = TextureHandler::new(size).unwrap();
        bank.insert_wall(Raster::from_fn(size, size, |_, _| [200, 0, 0, 255]))
            .unwrap();
        bank
    }

    #[test]
    fn engine_frame_draws_wall_with_tint() {
        let mut grid = vec![vec![0; 8]; 8];
        grid[6] = vec![1; 8];
        let map = GridMap::new(vec![grid]).unwrap();
        let cfg = RenderConfig::default()
            .with_viewport(32, 24)
            .with_tex_size(8)
            .with_max_concurrent(2);
        let mut engine = Engine::new(cfg, map, red_bank(8)).unwrap();
        engine.camera.set_position(DVec2::new(2.5, 4.5));
        engine.update::<Billboard>(&[]);

        let mut sw = Software::default();
        let mut out = Vec::new();
        sw.draw_frame(&engine, |fb, w, h| {
            assert_eq!((w, h), (32, 24));
            out = fb.to_vec();
        });

        // 3.5 tiles away the torch still saturates: 200 * 255 / 256
        assert_eq!(out[12 * 32 + 16], 0x00_C7_00_00);
        // floor fills the bottom row
        assert_ne!(out[23 * 32 + 16], CLEAR);
    }

    #[test]
    fn zero_alpha_texels_are_skipped() {
        let mut bank = red_bank(4);
        let sheet = bank.insert_sprite(Raster::from_fn(4, 4, |x, _| {
            if x == 0 { [0, 0, 255, 0] } else { [0, 0, 255, 255] }
        }))
        .unwrap();

        let mut level = LevelBuffer::new(2, 4);
        level.set_column(0, Some(sheet), TexRect::new(0, 0, 1, 4), (0, 4), Tint::WHITE);
        level.set_column(1, Some(sheet), TexRect::new(1, 0, 2, 4), (0, 4), Tint::WHITE);

        let mut sw = Software::default();
        sw.begin_frame(2, 4);
        sw.draw_level(&level, &bank);

        let fb = sw.frame();
        assert_eq!(fb[0], CLEAR);
        assert_eq!(fb[1], 0x00_00_00_FE);
    }

    #[test]
    fn slice_is_stretched_and_clipped() {
        let bank = {
            let mut b = TextureHandler::new(2).unwrap();
            b.insert_wall(Raster::from_fn(2, 2, |_, y| [0, if y == 0 { 100 } else { 200 }, 0, 255]))
                .unwrap();
            b
        };
        let mut level = LevelBuffer::new(1, 4);
        // 8 rows tall starting above the screen: rows -2..6, clipped to 0..4
        level.set_column(0, Some(0), TexRect::new(0, 0, 1, 2), (-2, 6), Tint::WHITE);

        let mut sw = Software::default();
        sw.begin_frame(1, 4);
        sw.draw_level(&level, &bank);

        let g = |px: Rgba| (px >> 8) & 0xFF;
        let fb = sw.frame();
        assert_eq!(g(fb[0]), 99); // texel row 0
        assert_eq!(g(fb[1]), 99);
        assert_eq!(g(fb[2]), 199); // texel row 1
        assert_eq!(g(fb[3]), 199);
    }
}
