//! Floor projector: per-pixel inverse-perspective texture sampling for the
//! rows under a ground-level wall slice.

use glam::DVec2;

use crate::{
    engine::types::{ColumnHit, FrameView, Side},
    world::Raster,
};

/// World position of the floor at the foot of the wall `hit` struck.
#[inline]
pub fn wall_base(hit: &ColumnHit) -> DVec2 {
    let (mx, my) = (hit.map_x as f64, hit.map_y as f64);
    match hit.side {
        Side::X if hit.ray_dir.x > 0.0 => DVec2::new(mx, my + hit.wall_x),
        Side::X => DVec2::new(mx + 1.0, my + hit.wall_x),
        Side::Y if hit.ray_dir.y > 0.0 => DVec2::new(mx + hit.wall_x, my),
        Side::Y => DVec2::new(mx + hit.wall_x, my + 1.0),
    }
}

/// View-space depth of the floor seen on screen row `y`.
#[inline]
pub fn row_distance(view: &FrameView, y: i32) -> f64 {
    (view.h as f64 + 2.0 * view.pos_z) / (2.0 * (y - view.pitch) as f64 - view.h as f64)
}

/// Fill `column` (one pixel per screen row) with shaded floor texels from
/// just below the wall slice down to the bottom of the screen.
pub(crate) fn cast_floor_column(
    view: &FrameView,
    hit: &ColumnHit,
    floor_tex: &Raster,
    column: &mut [[u8; 4]],
) {
    let floor_wall = wall_base(hit);
    let dist_wall = hit.perp_wall_dist;
    let dist_player = 0.0;

    let draw_end = if hit.draw_end < 0 { view.h } else { hit.draw_end };
    let first = draw_end.saturating_add(1).max(0);
    let (fw, fh) = (floor_tex.w as i64, floor_tex.h as i64);
    if fw == 0 || fh == 0 {
        return;
    }

    for y in first..view.h {
        let current_dist = row_distance(view, y);
        let weight = (current_dist - dist_player) / (dist_wall - dist_player);
        let floor = floor_wall * weight + view.pos * (1.0 - weight);

        // wrap into the floor raster, whatever its size
        let tx = ((floor.x * fw as f64) as i64).rem_euclid(fw) as usize;
        let ty = ((floor.y * fh as f64) as i64).rem_euclid(fh) as usize;

        let tint = view.lighting.tint(255, current_dist);
        column[y as usize] = tint.shade(floor_tex.rgba_at(tx, ty));
    }
}
