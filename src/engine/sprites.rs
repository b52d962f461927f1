//! Billboard sprite caster: camera-space transform, projection, per-column
//! z-test against the ground level's wall distances.

use crate::{
    engine::{
        buffers::SpriteSlot,
        types::{FrameView, px},
    },
    world::{Sprite, TexRect},
};

/// Screen-space footprint of a sprite for the current camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteProjection {
    /// Depth inside the screen (camera-space Y).
    pub depth: f64,
    pub screen_x: i32,
    pub width: i32,
    pub height: i32,
    /// Vertical screen shift from height, pitch and camera parallax.
    pub v_move_screen: i32,
    /// Clamped to the viewport; `start` inclusive, `end` exclusive.
    pub draw_x: (i32, i32),
    pub draw_y: (i32, i32),
}

/// Project `sprite` onto the screen, `None` if it is behind the camera or
/// too small to cover a pixel.
pub fn project_sprite<S: Sprite + ?Sized>(view: &FrameView, sprite: &S) -> Option<SpriteProjection> {
    // translate sprite position relative to camera
    let rel = sprite.pos() - view.pos;

    // inverse camera matrix
    // [ plane.x  dir.x ] -1                                      [ dir.y    -dir.x  ]
    // [                ]    = 1/(plane.x*dir.y - dir.x*plane.y) *  [                  ]
    // [ plane.y  dir.y ]                                         [ -plane.y  plane.x ]
    let inv_det = 1.0 / (view.plane.x * view.dir.y - view.dir.x * view.plane.y);
    let transform_x = inv_det * (view.dir.y * rel.x - view.dir.x * rel.y);
    let depth = inv_det * (-view.plane.y * rel.x + view.plane.x * rel.y);

    // NaN fails this too
    if !(depth > 0.0) {
        return None;
    }

    let (w, h) = (view.w, view.h);
    let screen_x = px(w as f64 / 2.0 * (1.0 + transform_x / depth));

    // scaling and moving the sprite
    let div = 1.0 / sprite.scale();
    let v_move = -(sprite.pos_z() - 0.5) * view.tex_size as f64 * 2.0 + sprite.vertical_offset();
    let v_move_screen = px(v_move / depth)
        .saturating_add(view.pitch)
        .saturating_add(px(view.pos_z / depth));

    // using depth instead of the real distance prevents fisheye
    let size = (h as f64 / depth).abs() / div;
    let height = px(size);
    let width = px(size);
    if height <= 0 || width <= 0 {
        return None;
    }

    let mid = h / 2;
    let draw_start_y = (mid - height / 2).saturating_add(v_move_screen).max(0);
    let draw_end_y = (mid + height / 2).saturating_add(v_move_screen).min(h - 1);
    let draw_start_x = screen_x.saturating_sub(width / 2).max(0);
    let draw_end_x = screen_x.saturating_add(width / 2).min(w - 1);

    Some(SpriteProjection {
        depth,
        screen_x,
        width,
        height,
        v_move_screen,
        draw_x: (draw_start_x, draw_end_x),
        draw_y: (draw_start_y, draw_end_y),
    })
}

/// Cast one sprite into `slot`.  The slot stays empty unless at least one
/// column survives the z-test and texture clipping.
pub(crate) fn cast_sprite<S: Sprite + ?Sized>(
    view: &FrameView,
    sprite: &S,
    z_buffer: &[f64],
    slot: &mut SpriteSlot,
) {
    slot.clear();
    let Some(p) = project_sprite(view, sprite) else {
        return;
    };

    let tex = sprite.texture();
    let rect = sprite.texture_rect();
    let (tex_w, tex_h) = (rect.width() as i64, rect.height() as i64);
    if tex_w <= 0 || tex_h <= 0 {
        return;
    }

    let (h, sh, sw) = (view.h as i64, p.height as i64, p.width as i64);
    let left = p.screen_x as i64 - sw / 2;

    // texture rows covered by the visible screen rows; 256/128 factors keep
    // this in integers
    let v_move = p.v_move_screen as i64;
    let d = (p.draw_y.0 as i64 - v_move) * 256 - h * 128 + sh * 128;
    let tex_start_y = (d * tex_h / sh) / 256;
    let d = (p.draw_y.1 as i64 - 1 - v_move) * 256 - h * 128 + sh * 128;
    let tex_end_y = (d * tex_h / sh) / 256;
    if tex_start_y < 0 || tex_start_y >= tex_end_y || tex_end_y >= tex_h {
        return;
    }

    let st = view.lighting.tint(255, p.depth);

    for stripe in p.draw_x.0..p.draw_x.1 {
        if stripe < 0 {
            continue;
        }
        match z_buffer.get(stripe as usize) {
            Some(&wall_dist) if p.depth < wall_dist => {}
            _ => continue,
        }

        let tex_x = (256 * (stripe as i64 - left) * tex_w / sw) / 256;
        if tex_x < 0 || tex_x >= tex_w {
            continue;
        }

        let cts = TexRect::new(
            rect.min_x + tex_x as i32,
            rect.min_y + tex_start_y as i32 + 1,
            rect.min_x + tex_x as i32 + 1,
            rect.min_y + tex_end_y as i32,
        );
        let buf = slot.begin(view.w as usize, view.h as usize);
        buf.set_column(
            stripe as usize,
            Some(tex.id),
            cts,
            (p.draw_y.0 + 1, p.draw_y.1),
            st,
        );
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
