use std::sync::Arc;

use glam::DVec2;

use crate::world::texture::{TexRect, TextureId};

/// Image a sprite is cut from, with its full size in texels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpriteTexture {
    pub id: TextureId,
    pub w: i32,
    pub h: i32,
}

/// Billboard source consumed by the sprite caster.
///
/// Game code implements this for its own entity types; the engine never
/// looks past these accessors.
pub trait Sprite: Send + Sync {
    /// World position on the map plane.
    fn pos(&self) -> DVec2;

    /// Height above the floor; `0.5` rests a full-size sprite on the floor.
    fn pos_z(&self) -> f64;

    fn texture(&self) -> SpriteTexture;

    /// Region of [`Sprite::texture`] holding the current frame.
    fn texture_rect(&self) -> TexRect;

    /// On-screen size multiplier, `1.0` = one wall tile tall.
    fn scale(&self) -> f64;

    /// Extra vertical shift in texture pixels, applied before perspective.
    fn vertical_offset(&self) -> f64;
}

impl<T: Sprite + ?Sized> Sprite for &T {
    fn pos(&self) -> DVec2 {
        (**self).pos()
    }
    fn pos_z(&self) -> f64 {
        (**self).pos_z()
    }
    fn texture(&self) -> SpriteTexture {
        (**self).texture()
    }
    fn texture_rect(&self) -> TexRect {
        (**self).texture_rect()
    }
    fn scale(&self) -> f64 {
        (**self).scale()
    }
    fn vertical_offset(&self) -> f64 {
        (**self).vertical_offset()
    }
}

impl<T: Sprite + ?Sized> Sprite for Box<T> {
    fn pos(&self) -> DVec2 {
        (**self).pos()
    }
    fn pos_z(&self) -> f64 {
        (**self).pos_z()
    }
    fn texture(&self) -> SpriteTexture {
        (**self).texture()
    }
    fn texture_rect(&self) -> TexRect {
        (**self).texture_rect()
    }
    fn scale(&self) -> f64 {
        (**self).scale()
    }
    fn vertical_offset(&self) -> f64 {
        (**self).vertical_offset()
    }
}

impl<T: Sprite + ?Sized> Sprite for Arc<T> {
    fn pos(&self) -> DVec2 {
        (**self).pos()
    }
    fn pos_z(&self) -> f64 {
        (**self).pos_z()
    }
    fn texture(&self) -> SpriteTexture {
        (**self).texture()
    }
    fn texture_rect(&self) -> TexRect {
        (**self).texture_rect()
    }
    fn scale(&self) -> f64 {
        (**self).scale()
    }
    fn vertical_offset(&self) -> f64 {
        (**self).vertical_offset()
    }
}

/// Static, single-frame sprite.
#[derive(Clone, Debug, PartialEq)]
pub struct Billboard {
    pub pos: DVec2,
    pub pos_z: f64,
    pub texture: SpriteTexture,
    pub rect: TexRect,
    pub scale: f64,
    pub vertical_offset: f64,
}

impl Billboard {
    /// Full-size sprite standing on the floor at `pos`, showing the whole
    /// texture.
    pub fn new(pos: DVec2, texture: SpriteTexture) -> Self {
        Self {
            pos,
            pos_z: 0.5,
            texture,
            rect: TexRect::new(0, 0, texture.w, texture.h),
            scale: 1.0,
            vertical_offset: 0.0,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_pos_z(mut self, pos_z: f64) -> Self {
        self.pos_z = pos_z;
        self
    }

    pub fn with_vertical_offset(mut self, offset: f64) -> Self {
        self.vertical_offset = offset;
        self
    }

    /// Show `rect` of the sheet instead of the whole texture.
    pub fn with_rect(mut self, rect: TexRect) -> Self {
        self.rect = rect;
        self
    }
}

impl Sprite for Billboard {
    #[inline]
    fn pos(&self) -> DVec2 {
        self.pos
    }
    #[inline]
    fn pos_z(&self) -> f64 {
        self.pos_z
    }
    #[inline]
    fn texture(&self) -> SpriteTexture {
        self.texture
    }
    #[inline]
    fn texture_rect(&self) -> TexRect {
        self.rect
    }
    #[inline]
    fn scale(&self) -> f64 {
        self.scale
    }
    #[inline]
    fn vertical_offset(&self) -> f64 {
        self.vertical_offset
    }
}
