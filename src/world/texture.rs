// Format-agnostic store of decoded images.
// The caster only hands out `TextureId`s and texel rectangles; sampling is the
// presentation layer's job, except for the floor raster which the floor
// projector reads pixel by pixel.

/// Runtime handle for an image in a [`TextureHandler`].
///
/// Wall textures occupy ids `0..wall_count()`, so a tile code `n` maps to id
/// `n - 1`.  Sprite sheets are appended after them.
pub type TextureId = u16;

/// Integer rectangle, `min` inclusive and `max` exclusive.
///
/// Used both for texel regions (which texture column to sample) and for
/// screen regions (which rows of a column to fill).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TexRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TexRect {
    #[inline]
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    #[inline]
    pub const fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub const fn height(&self) -> i32 {
        self.max_y - self.min_y
    }
}

/// CPU-side RGBA8 image in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pub w: usize,
    pub h: usize,
    pub pixels: Vec<u8>,
}

impl Raster {
    /// Fully transparent black raster.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            pixels: vec![0; w * h * 4],
        }
    }

    pub fn from_rgba(w: usize, h: usize, pixels: Vec<u8>) -> Result<Self, TextureError> {
        let expected = w * h * 4;
        if pixels.len() != expected {
            return Err(TextureError::BadBuffer {
                got: pixels.len(),
                expected,
            });
        }
        Ok(Self { w, h, pixels })
    }

    /// Build a raster by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(w: usize, h: usize, mut f: impl FnMut(usize, usize) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(w * h * 4);
        for y in 0..h {
            for x in 0..w {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Self { w, h, pixels }
    }

    /// Grey checkerboard with 8-texel cells, handy as a placeholder.
    pub fn checker(size: usize) -> Self {
        Self::from_fn(size, size, |x, y| {
            if ((x / 8) ^ (y / 8)) & 1 == 0 {
                [0x90, 0x90, 0x90, 0xFF]
            } else {
                [0x50, 0x50, 0x50, 0xFF]
            }
        })
    }

    /// Byte offset of pixel `(x, y)` in `pixels`.
    #[inline(always)]
    pub fn pix_offset(&self, x: usize, y: usize) -> usize {
        (y * self.w + x) * 4
    }

    #[inline]
    pub fn rgba_at(&self, x: usize, y: usize) -> [u8; 4] {
        let o = self.pix_offset(x, y);
        [
            self.pixels[o],
            self.pixels[o + 1],
            self.pixels[o + 2],
            self.pixels[o + 3],
        ]
    }

    #[inline]
    pub fn set_rgba(&mut self, x: usize, y: usize, px: [u8; 4]) {
        let o = self.pix_offset(x, y);
        self.pixels[o..o + 4].copy_from_slice(&px);
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }
}

/// Things that can go wrong when using the handler.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    /// Requested ID is outside `0 .. handler.len()`.
    #[error("texture id {0} out of range")]
    BadId(TextureId),

    /// Wall and floor textures must be exactly `tex_size × tex_size`.
    #[error("texture is {w}x{h}, expected {size}x{size}")]
    WrongSize { w: usize, h: usize, size: usize },

    #[error("pixel buffer holds {got} bytes, expected {expected}")]
    BadBuffer { got: usize, expected: usize },

    #[error("texture size must be non-zero")]
    ZeroSize,

    /// Wall textures must be inserted before any sprite sheet.
    #[error("wall textures must precede sprite sheets")]
    WallAfterSprite,

    /// Every [`TextureId`] is taken.
    #[error("texture handler is full ({0} images)")]
    Full(usize),
}

/// Image store the caster draws from.
///
/// * Wall textures are square, `tex_size` texels per side, and are addressed
///   column by column through the pre-sliced [`TexRect`]s of [`Self::slice`].
/// * One floor raster of the same size is sampled per pixel.
/// * An optional sky raster is carried for the presentation layer only.
///
/// All reads are immutable, so the handler is shared by every cast task.
pub struct TextureHandler {
    tex_size: usize,
    data: Vec<Raster>,
    walls: usize,
    slices: Vec<TexRect>,
    floor: Raster,
    sky: Option<Raster>,
}

impl TextureHandler {
    // ---------------------------------------------------------------------
    // Constructors
    // ---------------------------------------------------------------------

    /// Empty handler with a checkerboard floor.
    pub fn new(tex_size: usize) -> Result<Self, TextureError> {
        if tex_size == 0 {
            return Err(TextureError::ZeroSize);
        }
        let side = tex_size as i32;
        let slices = (0..side).map(|x| TexRect::new(x, 0, x + 1, side)).collect();
        Ok(Self {
            tex_size,
            data: Vec::new(),
            walls: 0,
            slices,
            floor: Raster::checker(tex_size),
            sky: None,
        })
    }

    // ---------------------------------------------------------------------
    // Query helpers
    // ---------------------------------------------------------------------

    #[inline]
    pub fn tex_size(&self) -> usize {
        self.tex_size
    }

    /// Number of images stored (walls and sprite sheets).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn wall_count(&self) -> usize {
        self.walls
    }

    /// Texture to draw for wall texture number `tex_num` (tile code - 1).
    /// Unknown or negative numbers resolve to `None`: nothing is drawn.
    #[inline]
    pub fn wall(&self, tex_num: i32) -> Option<TextureId> {
        usize::try_from(tex_num)
            .ok()
            .filter(|&n| n < self.walls)
            .map(|n| n as TextureId)
    }

    /// One-texel-wide source rectangle for wall texture column `tex_x`.
    #[inline]
    pub fn slice(&self, tex_x: usize) -> TexRect {
        self.slices[tex_x.min(self.tex_size - 1)]
    }

    /// Borrow an image by id, with bounds-checking.
    pub fn texture(&self, id: TextureId) -> Result<&Raster, TextureError> {
        self.data.get(id as usize).ok_or(TextureError::BadId(id))
    }

    #[inline]
    pub fn floor(&self) -> &Raster {
        &self.floor
    }

    #[inline]
    pub fn sky(&self) -> Option<&Raster> {
        self.sky.as_ref()
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Append a wall texture; returns its id (= tile code - 1).
    pub fn insert_wall(&mut self, tex: Raster) -> Result<TextureId, TextureError> {
        if self.walls != self.data.len() {
            return Err(TextureError::WallAfterSprite);
        }
        self.check_size(&tex)?;
        let id = self.push(tex)?;
        self.walls += 1;
        Ok(id)
    }

    /// Append a sprite sheet of any size.
    pub fn insert_sprite(&mut self, tex: Raster) -> Result<TextureId, TextureError> {
        self.push(tex)
    }

    pub fn set_floor_texture(&mut self, floor: Raster) -> Result<(), TextureError> {
        self.check_size(&floor)?;
        self.floor = floor;
        Ok(())
    }

    pub fn set_sky_texture(&mut self, sky: Raster) {
        self.sky = Some(sky);
    }

    fn push(&mut self, tex: Raster) -> Result<TextureId, TextureError> {
        let id = TextureId::try_from(self.data.len())
            .map_err(|_| TextureError::Full(self.data.len()))?;
        self.data.push(tex);
        Ok(id)
    }

    fn check_size(&self, tex: &Raster) -> Result<(), TextureError> {
        if tex.w != self.tex_size || tex.h != self.tex_size {
            return Err(TextureError::WrongSize {
                w: tex.w,
                h: tex.h,
                size: self.tex_size,
            });
        }
        Ok(())
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn solid(size: usize, c: u8) -> Raster {
        Raster::from_fn(size, size, |_, _| [c, c, c, 0xFF])
    }

    #[test]
    fn insert_and_lookup() {
        let mut tex = TextureHandler::new(4).unwrap();
        let a = tex.insert_wall(solid(4, 0x10)).unwrap();
        let b = tex.insert_wall(solid(4, 0x20)).unwrap();
        let s = tex.insert_sprite(solid(16, 0x30)).unwrap();

        assert_eq!((a, b, s), (0, 1, 2));
        assert_eq!(tex.wall(0), Some(0));
        assert_eq!(tex.wall(1), Some(1));
        // sprite sheets are never wall textures
        assert_eq!(tex.wall(2), None);
        assert_eq!(tex.wall(-1), None);
        assert_eq!(tex.texture(s).unwrap().w, 16);
    }

    #[test]
    fn size_and_order_guards() {
        let mut tex = TextureHandler::new(4).unwrap();
        assert_eq!(
            tex.insert_wall(solid(8, 0)).unwrap_err(),
            TextureError::WrongSize { w: 8, h: 8, size: 4 }
        );
        assert!(tex.set_floor_texture(solid(3, 0)).is_err());

        tex.insert_sprite(solid(2, 0)).unwrap();
        assert_eq!(
            tex.insert_wall(solid(4, 0)).unwrap_err(),
            TextureError::WallAfterSprite
        );
        assert_eq!(TextureHandler::new(0).err(), Some(TextureError::ZeroSize));
    }

    #[test]
    fn ids_never_wrap() {
        let mut tex = TextureHandler::new(1).unwrap();
        for i in 0..=TextureId::MAX as usize {
            assert_eq!(tex.insert_sprite(Raster::new(1, 1)).unwrap() as usize, i);
        }
        let full = TextureId::MAX as usize + 1;
        assert_eq!(tex.insert_sprite(Raster::new(1, 1)), Err(TextureError::Full(full)));
        assert_eq!(tex.len(), full);
        assert_eq!(tex.texture(TextureId::MAX).unwrap().w, 1);
    }

    #[test]
    fn slices_are_one_texel_wide() {
        let tex = TextureHandler::new(8).unwrap();
        assert_eq!(tex.slice(3), TexRect::new(3, 0, 4, 8));
        assert_eq!(tex.slice(3).width(), 1);
        // clamped, never panics
        assert_eq!(tex.slice(99), TexRect::new(7, 0, 8, 8));
    }

    #[test]
    fn raster_pixel_access() {
        let mut r = Raster::new(3, 2);
        assert_eq!(r.pix_offset(2, 1), 20);
        r.set_rgba(2, 1, [1, 2, 3, 4]);
        assert_eq!(r.rgba_at(2, 1), [1, 2, 3, 4]);
        assert_eq!(
            Raster::from_rgba(2, 2, vec![0; 3]).unwrap_err(),
            TextureError::BadBuffer {
                got: 3,
                expected: 16
            }
        );
    }
}
