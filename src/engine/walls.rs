//! Column wall caster.
//!
//! One ray per screen column, walked through the tile grid with a DDA
//! (Digital Differential Analyzer) until it enters a wall or leaves the
//! map.  The ray/grid loop follows the classic Lode Vandevenne raycasting
//! tutorial.

use glam::DVec2;

use crate::{
    engine::{
        buffers::LevelBuffer,
        config::RenderConfig,
        types::{ColumnHit, FrameView, HitKind, Side, px},
    },
    world::{Grid, TextureHandler},
};

/// Walk the ray for screen column `x` through `grid`.
///
/// Rays that leave the map resolve as [`HitKind::Boundary`] with
/// `tex_num = -1`; a frame is always produced.
pub fn cast_ray(view: &FrameView, grid: &Grid, x: i32, level: usize) -> ColumnHit {
    // x-coordinate in camera space, -1 (left) .. 1 (right)
    let camera_x = 2.0 * x as f64 / view.w as f64 - 1.0;
    let ray_dir = view.dir + view.plane * camera_x;
    let ray_pos = view.pos;

    // which box of the map we're in
    let mut map_x = ray_pos.x as i32;
    let mut map_y = ray_pos.y as i32;

    // length of ray from one x or y-side to the next
    let delta = DVec2::new((1.0 / ray_dir.x).abs(), (1.0 / ray_dir.y).abs());

    let (step_x, mut side_dist_x) = if ray_dir.x < 0.0 {
        (-1, (ray_pos.x - map_x as f64) * delta.x)
    } else {
        (1, (map_x as f64 + 1.0 - ray_pos.x) * delta.x)
    };
    let (step_y, mut side_dist_y) = if ray_dir.y < 0.0 {
        (-1, (ray_pos.y - map_y as f64) * delta.y)
    } else {
        (1, (map_y as f64 + 1.0 - ray_pos.y) * delta.y)
    };

    /* ───────────── DDA ───────────── */
    let mut side;
    let kind = loop {
        if side_dist_x < side_dist_y {
            side_dist_x += delta.x;
            map_x += step_x;
            side = Side::X;
        } else {
            side_dist_y += delta.y;
            map_y += step_y;
            side = Side::Y;
        }

        if !view.in_map(map_x, map_y) {
            break HitKind::Boundary;
        }
        match tile(grid, map_x, map_y) {
            Some(t) if t > 0 => break HitKind::Wall,
            Some(_) => {}
            // ragged grid: treat the missing cell like the map edge
            None => break HitKind::Boundary,
        }
    };

    // perpendicular distance; the oblique ray length would give fisheye
    let perp_wall_dist = match side {
        Side::X => (map_x as f64 - ray_pos.x + (1 - step_x) as f64 / 2.0) / ray_dir.x,
        Side::Y => (map_y as f64 - ray_pos.y + (1 - step_y) as f64 / 2.0) / ray_dir.y,
    };

    /* ───────── vertical extent ───────── */
    let h = view.h as i64;
    let line_height = px(view.h as f64 / perp_wall_dist) as i64;
    let draw_start = -line_height / 2 + h / 2
        + view.pitch as i64
        + px(view.pos_z / perp_wall_dist) as i64
        - line_height * level as i64;
    let draw_end = draw_start + line_height;

    /* ───────── texturing ───────── */
    let mut tex_num = match kind {
        HitKind::Wall => tile(grid, map_x, map_y).map_or(-1, |t| t - 1),
        HitKind::Boundary => -1,
    };
    if side == Side::X {
        tex_num = RenderConfig::remap_side_x(view.side_x_remap, tex_num);
    }

    // where exactly the wall was hit
    let mut wall_x = match side {
        Side::X => ray_pos.y + perp_wall_dist * ray_dir.y,
        Side::Y => ray_pos.x + perp_wall_dist * ray_dir.x,
    };
    wall_x -= wall_x.floor();

    let ts = view.tex_size;
    let mut tex_x = px(wall_x * ts as f64);
    if (side == Side::X && ray_dir.x > 0.0) || (side == Side::Y && ray_dir.y < 0.0) {
        tex_x = ts - tex_x - 1;
    }

    ColumnHit {
        ray_dir,
        map_x,
        map_y,
        side,
        kind,
        perp_wall_dist,
        wall_x,
        tex_num,
        tex_x: tex_x.clamp(0, ts - 1),
        line_height: saturate(line_height),
        draw_start: saturate(draw_start),
        draw_end: saturate(draw_end),
    }
}

/// Cast column `x` and store its wall slice in `buf`.
pub(crate) fn cast_column(
    view: &FrameView,
    grid: &Grid,
    textures: &TextureHandler,
    level: usize,
    x: usize,
    buf: &mut LevelBuffer,
) -> ColumnHit {
    let hit = cast_ray(view, grid, x as i32, level);
    let st = view
        .lighting
        .wall_tint(hit.side == Side::Y, hit.perp_wall_dist);
    buf.set_column(
        x,
        textures.wall(hit.tex_num),
        textures.slice(hit.tex_x as usize),
        (hit.draw_start, hit.draw_end),
        st,
    );
    hit
}

/// Cast every column of one level, left to right.
pub(crate) fn cast_level(
    view: &FrameView,
    grid: &Grid,
    textures: &TextureHandler,
    level: usize,
    buf: &mut LevelBuffer,
) {
    for x in 0..buf.width() {
        cast_column(view, grid, textures, level, x, buf);
    }
}

#[inline]
fn tile(grid: &Grid, x: i32, y: i32) -> Option<i32> {
    grid.get(x as usize)?.get(y as usize).copied()
}

#[inline]
fn saturate(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
