//! Interactive ray-casting demo on a procedural two-level map.
//!
//! ```bash
//! cargo run --release -- --width 1024 --height 768
//! ```
//!
//! W/S or ↑/↓ move, A/D strafe, ←/→ turn, PgUp/PgDn look, C crouch,
//! Z prone, hold Space to jump, Esc quits.

use std::{
    f64::consts::TAU,
    time::{Duration, Instant},
};

use clap::Parser;
use glam::DVec2;
use minifb::{Key, Window, WindowOptions};
use tracing::info;

use raycaster_rs::{
    engine::{Engine, Lighting, RenderConfig},
    renderer::{RendererExt, software::Software},
    world::{GridMap, Raster, Sprite, SpriteTexture, TexRect, TextureHandler, Vector2},
};

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    #[arg(long, default_value_t = 1024)]
    width: usize,

    #[arg(long, default_value_t = 768)]
    height: usize,

    /// Wall/floor texture edge in texels
    #[arg(long, default_value_t = 256)]
    tex_size: usize,

    /// Horizontal field of view in degrees
    #[arg(long, default_value_t = 70.0)]
    fov: f64,

    /// Upper bound on concurrent sprite casts
    #[arg(long, default_value_t = raycaster_rs::engine::MAX_CONCURRENT)]
    threads: usize,

    /// Ambient light added to every surface; lower it for a darker level
    #[arg(long, default_value_t = 300.0)]
    sun: f64,
}

const MAP_SIZE: usize = 24;
const MOVE_SPEED: f64 = 3.0; // tiles per second
const TURN_SPEED: f64 = 2.0; // radians per second
const PITCH_SPEED: f64 = 400.0; // pixels per second
const FRAME: usize = 64; // sprite frame edge

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let opts = Opts::parse();

    let cfg = RenderConfig::default()
        .with_viewport(opts.width, opts.height)
        .with_tex_size(opts.tex_size)
        .with_fov(opts.fov)
        .with_max_concurrent(opts.threads)
        .with_lighting(Lighting {
            sun_light: opts.sun,
            ..Lighting::default()
        });

    let mut textures = TextureHandler::new(cfg.tex_size)?;
    for style in 0..5 {
        textures.insert_wall(wall_texture(cfg.tex_size, style))?;
    }
    textures.set_floor_texture(floor_texture(cfg.tex_size))?;
    textures.set_sky_texture(sky_texture(512, 256));
    let sheet = textures.insert_sprite(lamp_sheet())?;
    let sheet = SpriteTexture {
        id: sheet,
        w: (FRAME * 4) as i32,
        h: FRAME as i32,
    };

    let map = GridMap::new(vec![ground_level(), upper_level()])?;
    let mut engine = Engine::new(cfg, map, textures)?;
    engine.camera.set_position(DVec2::new(1.5, 1.5));
    engine.camera.set_heading_angle(TAU / 8.0);

    let mut lamps: Vec<Lamp> = [
        (5.5, 5.5),
        (11.5, 3.5),
        (3.5, 11.5),
        (12.5, 12.5),
        (18.5, 6.5),
        (6.5, 18.5),
        (19.5, 19.5),
        (15.5, 9.5),
    ]
    .iter()
    .enumerate()
    .map(|(i, &(x, y))| Lamp {
        pos: DVec2::new(x, y),
        sheet,
        phase: i as f64 * 0.7,
        frame: 0,
        bob: 0.0,
    })
    .collect();

    info!(sprite_threads = engine.pool().threads(), "demo ready");
    let (w, h) = (engine.config().width, engine.config().height);
    let mut renderer = Software::default();
    let mut win = Window::new("Ray-casting renderer", w, h, WindowOptions::default())?;
    win.set_target_fps(engine.target_tps() as usize);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();
    let started = Instant::now();
    let mut last_tick = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let dt = last_tick.elapsed().as_secs_f64();
        last_tick = Instant::now();

        /* movement --------------------------------------------------------- */
        let cam = &mut engine.camera;
        let map = &engine.map;
        if win.is_key_down(Key::W) || win.is_key_down(Key::Up) {
            cam.move_camera(MOVE_SPEED * dt, map);
        }
        if win.is_key_down(Key::S) || win.is_key_down(Key::Down) {
            cam.move_camera(-MOVE_SPEED * dt, map);
        }
        // plane points to the right of the view
        if win.is_key_down(Key::A) {
            cam.strafe_camera(-MOVE_SPEED * dt, map);
        }
        if win.is_key_down(Key::D) {
            cam.strafe_camera(MOVE_SPEED * dt, map);
        }
        if win.is_key_down(Key::Left) {
            cam.rotate_camera(TURN_SPEED * dt);
        }
        if win.is_key_down(Key::Right) {
            cam.rotate_camera(-TURN_SPEED * dt);
        }
        if win.is_key_down(Key::PageUp) {
            cam.pitch_camera((PITCH_SPEED * dt) as i32);
        }
        if win.is_key_down(Key::PageDown) {
            cam.pitch_camera(-(PITCH_SPEED * dt) as i32);
        }

        /* stance ----------------------------------------------------------- */
        if win.is_key_down(Key::Space) {
            cam.jump_camera();
        } else if win.is_key_down(Key::C) {
            cam.crouch_camera();
        } else if win.is_key_down(Key::Z) {
            cam.prone_camera();
        } else {
            cam.stand_camera();
        }

        /* animate ---------------------------------------------------------- */
        let t = started.elapsed().as_secs_f64();
        for lamp in &mut lamps {
            lamp.tick(t);
        }

        /* draw ------------------------------------------------------------- */
        let t0 = Instant::now();
        engine.update(&lamps);

        let mut shown = Ok(());
        renderer.draw_frame(&engine, |fb, w, h| {
            shown = win.update_with_buffer(fb, w, h);
        });
        shown?;

        acc_time += t0.elapsed();
        acc_frames += 1;
        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            info!(avg_ms, fps = 1000.0 / avg_ms, "render timing");
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}

/*──────────────────────────── sprites ───────────────────────────────*/

/// Flickering floating lamp: cycles through four frames of the sheet and
/// bobs up and down.
struct Lamp {
    pos: Vector2,
    sheet: SpriteTexture,
    phase: f64,
    frame: i32,
    bob: f64,
}

impl Lamp {
    fn tick(&mut self, t: f64) {
        self.frame = ((t * 6.0 + self.phase) as i32).rem_euclid(4);
        self.bob = ((t * 2.0 + self.phase).sin()) * 20.0;
    }
}

impl Sprite for Lamp {
    fn pos(&self) -> DVec2 {
        self.pos
    }
    fn pos_z(&self) -> f64 {
        0.5
    }
    fn texture(&self) -> SpriteTexture {
        self.sheet
    }
    fn texture_rect(&self) -> TexRect {
        let x = self.frame * FRAME as i32;
        TexRect::new(x, 0, x + FRAME as i32, FRAME as i32)
    }
    fn scale(&self) -> f64 {
        0.5
    }
    fn vertical_offset(&self) -> f64 {
        self.bob
    }
}

/*──────────────────────────── map ───────────────────────────────────*/

fn ground_level() -> Vec<Vec<i32>> {
    let n = MAP_SIZE;
    let mut g = vec![vec![0; n]; n];
    for i in 0..n {
        g[i][0] = 1;
        g[i][n - 1] = 1;
        g[0][i] = 2;
        g[n - 1][i] = 2;
    }
    // inner rooms with doorways
    for i in 4..20 {
        if i != 8 && i != 15 {
            g[8][i] = 3;
            g[i][16] = 4;
        }
    }
    for (x, y) in [(4, 4), (14, 5), (20, 12), (12, 20), (10, 10)] {
        g[x][y] = 5;
    }
    g
}

/// Battlements on top of the outer wall and a second storey over the
/// inner room.
fn upper_level() -> Vec<Vec<i32>> {
    let n = MAP_SIZE;
    let mut g = vec![vec![0; n]; n];
    for i in (0..n).step_by(2) {
        g[i][0] = 2;
        g[i][n - 1] = 2;
        g[0][i] = 2;
        g[n - 1][i] = 2;
    }
    for i in 4..20 {
        if i != 8 && i != 15 {
            g[i][16] = 1;
        }
    }
    g
}

/*──────────────────────────── textures ──────────────────────────────*/

fn wall_texture(size: usize, style: usize) -> Raster {
    Raster::from_fn(size, size, |x, y| {
        let (u, v) = (x * 64 / size, y * 64 / size);
        match style {
            // brick
            0 => {
                let offset = if (v / 8) % 2 == 0 { 0 } else { 8 };
                if v % 8 == 0 || (u + offset) % 16 == 0 {
                    [90, 90, 90, 255]
                } else {
                    [150, 50, 40, 255]
                }
            }
            // stone blocks
            1 => {
                let c = 100 + ((u ^ v) % 40) as u8;
                if u % 32 == 0 || v % 32 == 0 { [60, 60, 60, 255] } else { [c, c, c, 255] }
            }
            // wood planks
            2 => {
                let grain = ((v * 7 + u / 16 * 13) % 20) as u8;
                if u % 16 == 0 { [60, 35, 15, 255] } else { [120 + grain, 80, 40, 255] }
            }
            // riveted metal
            3 => {
                if u % 16 == 4 && v % 16 == 4 {
                    [220, 220, 230, 255]
                } else {
                    [80, 90, 110, 255]
                }
            }
            // warning stripes, asymmetric so mirroring is visible
            _ => {
                if (u + v) % 16 < 8 { [200, 170, 0, 255] } else { [30, 30, 30, 255] }
            }
        }
    })
}

fn floor_texture(size: usize) -> Raster {
    Raster::from_fn(size, size, |x, y| {
        let (u, v) = (x * 64 / size, y * 64 / size);
        if u % 32 == 0 || v % 32 == 0 {
            [40, 40, 40, 255]
        } else {
            let c = 90 + ((u * 3 + v * 5) % 25) as u8;
            [c, c - 10, c - 20, 255]
        }
    })
}

fn sky_texture(w: usize, h: usize) -> Raster {
    Raster::from_fn(w, h, |_, y| {
        let t = y as f64 / h as f64;
        [(40.0 + 80.0 * t) as u8, (70.0 + 90.0 * t) as u8, (140.0 + 80.0 * t) as u8, 255]
    })
}

/// Four lamp frames side by side; the glow grows and shrinks.
fn lamp_sheet() -> Raster {
    Raster::from_fn(FRAME * 4, FRAME, |x, y| {
        let frame = x / FRAME;
        let (dx, dy) = ((x % FRAME) as i32 - 32, y as i32 - 24);
        let r2 = dx * dx + dy * dy;
        let glow = 10 + frame as i32 * 2;
        if r2 < glow * glow {
            [255, 220 - (frame * 20) as u8, 120, 255]
        } else if dx.abs() < 3 && y > 36 {
            [70, 70, 70, 255]
        } else {
            [0, 0, 0, 0]
        }
    })
}
