//! Per-frame draw-instruction buffers.
//!
//! Every buffer is a set of flat arrays indexed by screen column and
//! allocated once per viewport size.  Cast tasks own disjoint columns (or
//! disjoint sprite slots), so the arrays are handed out as exclusive slices
//! and never need a lock.

use rayon::prelude::*;

use crate::{
    engine::types::Tint,
    world::{Raster, TexRect, TextureId},
};

/// One drawable column: sample `cts` of `tex`, stretch it over the rows of
/// `sv`, multiply by `st`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnSlice {
    pub x: usize,
    pub tex: TextureId,
    pub cts: TexRect,
    pub sv: TexRect,
    pub st: Tint,
}

/// Draw instructions for one wall level (or one sprite), four parallel
/// arrays indexed by screen column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelBuffer {
    /// Texture for the column, `None` = draw nothing.
    pub curr_tex: Vec<Option<TextureId>>,
    /// Source texel rectangle.
    pub cts: Vec<TexRect>,
    /// Destination screen rectangle; `min_y..max_y` are the rows.
    pub sv: Vec<TexRect>,
    /// Lighting tint.
    pub st: Vec<Tint>,
}

impl LevelBuffer {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            curr_tex: vec![None; w],
            cts: vec![TexRect::default(); w],
            sv: slice_view(w, h),
            st: vec![Tint::WHITE; w],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.curr_tex.len()
    }

    /// Forget every column, keeping the allocation.
    pub fn reset(&mut self, h: usize) {
        self.curr_tex.fill(None);
        self.cts.fill(TexRect::default());
        for (x, sv) in self.sv.iter_mut().enumerate() {
            *sv = TexRect::new(x as i32, 0, x as i32 + 1, h as i32);
        }
        self.st.fill(Tint::WHITE);
    }

    #[inline]
    pub(crate) fn set_column(
        &mut self,
        x: usize,
        tex: Option<TextureId>,
        cts: TexRect,
        (min_y, max_y): (i32, i32),
        st: Tint,
    ) {
        self.curr_tex[x] = tex;
        self.cts[x] = cts;
        self.sv[x].min_y = min_y;
        self.sv[x].max_y = max_y;
        self.st[x] = st;
    }

    /// Column `x`, if it has something to draw.
    pub fn column(&self, x: usize) -> Option<ColumnSlice> {
        let tex = (*self.curr_tex.get(x)?)?;
        Some(ColumnSlice {
            x,
            tex,
            cts: self.cts[x],
            sv: self.sv[x],
            st: self.st[x],
        })
    }

    /// All columns that have something to draw, left to right.
    pub fn columns(&self) -> impl Iterator<Item = ColumnSlice> + '_ {
        (0..self.width()).filter_map(|x| self.column(x))
    }
}

/// One-pixel-wide full-height rectangle per column.
fn slice_view(w: usize, h: usize) -> Vec<TexRect> {
    (0..w as i32)
        .map(|x| TexRect::new(x, 0, x + 1, h as i32))
        .collect()
}

/*──────────────────────────── floor ─────────────────────────────────*/

/// Shaded floor pixels for the whole viewport.
///
/// The floor projector writes column by column, so the pixels are first
/// gathered in a column-major scratch arena (`h` texels per column, one
/// exclusive chunk per task) and transposed into the row-major
/// [`Raster`] once all columns are done.
#[derive(Clone, Debug)]
pub struct FloorBuffer {
    w: usize,
    h: usize,
    columns: Vec<[u8; 4]>,
    hor_buffer: Raster,
}

impl FloorBuffer {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            columns: vec![[0; 4]; w * h],
            hor_buffer: Raster::new(w, h),
        }
    }

    /// Reset every pixel to transparent before a new frame is projected.
    pub fn clear(&mut self) {
        self.columns.fill([0; 4]);
    }

    /// One `h`-long pixel column per screen column, left to right.
    pub(crate) fn columns_mut(&mut self) -> std::slice::ChunksMut<'_, [u8; 4]> {
        self.columns.chunks_mut(self.h.max(1))
    }

    /// Publish the column scratch into the row-major raster.
    pub(crate) fn resolve(&mut self) {
        let (w, h) = (self.w, self.h);
        let columns = &self.columns;
        self.hor_buffer
            .pixels
            .par_chunks_mut(w * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    px.copy_from_slice(&columns[x * h + y]);
                }
            });
    }

    /// Row-major RGBA floor raster of the last frame.
    #[inline]
    pub fn raster(&self) -> &Raster {
        &self.hor_buffer
    }
}

/*──────────────────────────── sprites ───────────────────────────────*/

/// Lazily allocated draw buffer for one sorted sprite position.
#[derive(Debug, Default)]
pub(crate) struct SpriteSlot {
    buffer: Option<LevelBuffer>,
    visible: bool,
}

impl SpriteSlot {
    /// Buffer to write this frame's columns into; allocated on first use,
    /// wiped on the first write of each frame.
    pub(crate) fn begin(&mut self, w: usize, h: usize) -> &mut LevelBuffer {
        let first_write = !self.visible;
        self.visible = true;
        let buf = self.buffer.get_or_insert_with(|| LevelBuffer::new(w, h));
        if first_write && buf.width() == w {
            buf.reset(h);
        } else if buf.width() != w {
            *buf = LevelBuffer::new(w, h);
        }
        buf
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.visible = false;
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<&LevelBuffer> {
        if self.is_visible() {
            self.buffer.as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Sprite draw buffers, one slot per sprite in back-to-front order.
#[derive(Debug)]
pub struct SpriteLevels {
    slots: Vec<SpriteSlot>,
}

impl SpriteLevels {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(capacity, SpriteSlot::default);
        Self { slots }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Make room for `count` sprites and clear every slot.
    ///
    /// Grows by doubling until the capacity exceeds `count`; returns `true`
    /// if it had to grow.
    pub fn prepare(&mut self, count: usize) -> bool {
        let mut capacity = self.capacity().max(1);
        let grow = count > self.capacity();
        if grow {
            while capacity <= count {
                capacity *= 2;
            }
            self.slots.resize_with(capacity, SpriteSlot::default);
        }
        self.slots.iter_mut().for_each(SpriteSlot::clear);
        grow
    }

    /// Draw buffer for sorted sprite `index`, `None` if nothing is visible.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&LevelBuffer> {
        self.slots.get(index).and_then(SpriteSlot::get)
    }

    /// Visible sprite buffers in back-to-front order.
    pub fn visible(&self) -> impl Iterator<Item = &LevelBuffer> + '_ {
        self.slots.iter().filter_map(SpriteSlot::get)
    }

    pub(crate) fn slots_mut(&mut self, count: usize) -> &mut [SpriteSlot] {
        let n = count.min(self.slots.len());
        &mut self.slots[..n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_buffer_columns_skip_empty() {
        let mut buf = LevelBuffer::new(4, 10);
        assert_eq!(buf.sv[2], TexRect::new(2, 0, 3, 10));
        buf.set_column(1, Some(3), TexRect::new(5, 0, 6, 64), (2, 8), Tint::grey(200));
        let cols: Vec<_> = buf.columns().collect();
        assert_eq!(cols.len(), 1);
        assert_eq!(cols[0].x, 1);
        assert_eq!(cols[0].sv, TexRect::new(1, 2, 2, 8));

        buf.reset(10);
        assert_eq!(buf.columns().count(), 0);
        assert_eq!(buf.sv[1], TexRect::new(1, 0, 2, 10));
    }

    #[test]
    fn floor_resolve_transposes_columns() {
        let mut floor = FloorBuffer::new(3, 2);
        for (x, col) in floor.columns_mut().enumerate() {
            for (y, px) in col.iter_mut().enumerate() {
                *px = [x as u8, y as u8, 0, 255];
            }
        }
        floor.resolve();
        assert_eq!(floor.raster().rgba_at(2, 1), [2, 1, 0, 255]);
        assert_eq!(floor.raster().rgba_at(0, 1), [0, 1, 0, 255]);

        floor.clear();
        floor.resolve();
        assert!(floor.raster().pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn sprite_capacity_doubles() {
        let mut lv = SpriteLevels::new(16);
        assert!(!lv.prepare(16));
        assert_eq!(lv.capacity(), 16);
        assert!(lv.prepare(17));
        assert_eq!(lv.capacity(), 32);
        assert!(lv.prepare(64));
        assert_eq!(lv.capacity(), 128);
    }

    #[test]
    fn slot_is_empty_until_written_and_after_clear() {
        let mut lv = SpriteLevels::new(2);
        assert!(lv.get(0).is_none());

        let slot = &mut lv.slots_mut(1)[0];
        let buf = slot.begin(4, 4);
        buf.set_column(0, Some(1), TexRect::default(), (0, 4), Tint::WHITE);
        assert!(slot.is_visible());
        assert_eq!(lv.get(0).map(|b| b.columns().count()), Some(1));
        assert_eq!(lv.visible().count(), 1);

        lv.prepare(1);
        assert!(lv.get(0).is_none());

        // reused allocation starts blank
        let buf = lv.slots_mut(1)[0].begin(4, 4);
        assert_eq!(buf.columns().count(), 0);
    }
}
