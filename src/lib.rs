//! Multi-level ray-casting renderer core.
//!
//! * [`world`] – the collaborators the caster reads: tile [`world::Map`]s,
//!   the [`world::TextureHandler`], [`world::Sprite`]s and the
//!   [`world::Camera`].
//! * [`engine`] – per-frame wall, floor and sprite casting, scheduled over
//!   rayon; produces per-column draw instructions.
//! * [`renderer`] – a reference CPU compositor that turns those
//!   instructions into a frame-buffer.

pub mod engine;
pub mod renderer;
pub mod world;
