use glam::DVec2;

use crate::{
    engine::{config::RenderConfig, lighting::Lighting},
    world::Camera,
};

/// RGBA multiplier applied to a drawn column (lighting).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Tint {
    pub const WHITE: Tint = Tint::grey(255);

    #[inline]
    pub const fn grey(v: u8) -> Self {
        Self {
            r: v,
            g: v,
            b: v,
            a: 255,
        }
    }

    /// Multiply an RGBA8 pixel by this tint (`c * t / 256`), alpha untouched.
    #[inline]
    pub fn shade(self, px: [u8; 4]) -> [u8; 4] {
        let mul = |c: u8, t: u8| (c as u32 * t as u32 / 256) as u8;
        [mul(px[0], self.r), mul(px[1], self.g), mul(px[2], self.b), px[3]]
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Which family of grid lines a ray crossed last.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Stepped in X: east/west facing wall.
    X = 0,
    /// Stepped in Y: north/south facing wall.
    Y = 1,
}

/// How the DDA walk ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitKind {
    Wall,
    /// Left the map without meeting a wall.
    Boundary,
}

/// Everything one column cast learned about its ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnHit {
    pub ray_dir: DVec2,
    pub map_x: i32,
    pub map_y: i32,
    pub side: Side,
    pub kind: HitKind,
    /// Distance to the wall along the view direction (no fisheye).
    pub perp_wall_dist: f64,
    /// Fractional hit position along the wall face, `0..1`.
    pub wall_x: f64,
    /// Wall texture number after side remapping, `-1` for none.
    pub tex_num: i32,
    /// Texel column to sample, `0..tex_size`.
    pub tex_x: i32,
    pub line_height: i32,
    pub draw_start: i32,
    pub draw_end: i32,
}

/// Per-frame constants shared by every cast task.
///
/// A plain copy of the camera pose plus the render settings, so tasks never
/// touch the engine while it is being written.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub pos: DVec2,
    pub pos_z: f64,
    pub dir: DVec2,
    pub plane: DVec2,
    pub pitch: i32,
    pub w: i32,
    pub h: i32,
    pub tex_size: i32,
    pub map_width: i32,
    pub map_height: i32,
    pub lighting: Lighting,
    /// Texture remap for hits on `Side::X`.
    pub side_x_remap: &'a [(i32, i32)],
}

impl<'a> FrameView<'a> {
    pub fn new(camera: &Camera, config: &'a RenderConfig) -> Self {
        let (w, h) = camera.viewport();
        let (map_width, map_height) = camera.map_size();
        Self {
            pos: camera.pos(),
            pos_z: camera.pos_z(),
            dir: camera.dir(),
            plane: camera.plane(),
            pitch: camera.pitch(),
            w,
            h,
            tex_size: config.tex_size as i32,
            map_width: map_width as i32,
            map_height: map_height as i32,
            lighting: config.lighting,
            side_x_remap: &config.side_x_remap,
        }
    }

    #[inline]
    pub fn in_map(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.map_width && y < self.map_height
    }
}

/// Saturating `f64 → i32` pixel conversion; truncates toward zero and maps
/// NaN to 0.
#[inline]
pub(crate) fn px(v: f64) -> i32 {
    v as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shade_scales_rgb_keeps_alpha() {
        let t = Tint::grey(128);
        assert_eq!(t.shade([255, 100, 0, 77]), [127, 50, 0, 77]);
        assert_eq!(Tint::WHITE.shade([255, 255, 255, 255]), [254, 254, 254, 255]);
    }

    #[test]
    fn px_saturates() {
        assert_eq!(px(f64::INFINITY), i32::MAX);
        assert_eq!(px(f64::NEG_INFINITY), i32::MIN);
        assert_eq!(px(f64::NAN), 0);
        assert_eq!(px(-2.7), -2);
    }
}
