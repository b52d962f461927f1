use std::f64::consts::TAU;

use glam::DVec2;

use crate::world::grid::{Grid, Map};

/// 2-D vector used for position, facing and the camera plane.
pub type Vector2 = DVec2;

/// Minimum distance kept between the camera and the map edge.
pub const EDGE_DISTANCE: f64 = 0.1;

/// Discrete camera heights (`pos_z`) for the stance helpers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stances {
    pub stand: f64,
    pub crouch: f64,
    pub prone: f64,
    pub jump: f64,
}

impl Default for Stances {
    fn default() -> Self {
        Self {
            stand: 0.0,
            crouch: -150.0,
            prone: -280.0,
            jump: 200.0,
        }
    }
}

/// Ray-casting view-point.
///
/// * `dir` – facing, its length is the FOV depth.
/// * `plane` – the 2-D camera plane; `dir ± plane` are the edges of the view
///   frustum, so the two vectors are always updated together.
/// * `pitch` – vertical look offset in screen pixels.
/// * `pos_z` – vertical camera offset (jump/crouch), in the same units as
///   screen pixels at distance 1.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pos: DVec2,
    pos_z: f64,
    dir: DVec2,
    plane: DVec2,
    pitch: i32,

    w: i32,
    h: i32,

    fov_angle: f64, // radians
    fov_depth: f64,

    map_width: usize,
    map_height: usize,
    edge_distance: f64,
    stances: Stances,
}

impl Camera {
    /// Camera at `(1, 1)` looking east (+X).
    pub fn new(
        fov_angle: f64,
        fov_depth: f64,
        (w, h): (usize, usize),
        (map_width, map_height): (usize, usize),
    ) -> Self {
        let mut cam = Self {
            pos: DVec2::new(1.0, 1.0),
            pos_z: 0.0,
            dir: DVec2::ZERO,
            plane: DVec2::ZERO,
            pitch: 0,
            w: w as i32,
            h: h as i32,
            fov_angle,
            fov_depth,
            map_width,
            map_height,
            edge_distance: EDGE_DISTANCE,
            stances: Stances::default(),
        };
        cam.set_heading_angle(0.0);
        cam
    }

    pub fn with_edge_distance(mut self, edge_distance: f64) -> Self {
        self.edge_distance = edge_distance;
        self
    }

    pub fn with_stances(mut self, stances: Stances) -> Self {
        self.stances = stances;
        self
    }

    /*──────────────────────────── accessors ─────────────────────────────*/

    #[inline]
    pub fn pos(&self) -> DVec2 {
        self.pos
    }

    #[inline]
    pub fn pos_z(&self) -> f64 {
        self.pos_z
    }

    #[inline]
    pub fn dir(&self) -> DVec2 {
        self.dir
    }

    #[inline]
    pub fn plane(&self) -> DVec2 {
        self.plane
    }

    #[inline]
    pub fn pitch(&self) -> i32 {
        self.pitch
    }

    /// Viewport `(w, h)` in pixels.
    #[inline]
    pub fn viewport(&self) -> (i32, i32) {
        (self.w, self.h)
    }

    #[inline]
    pub fn map_size(&self) -> (usize, usize) {
        (self.map_width, self.map_height)
    }

    #[inline]
    pub fn fov_angle(&self) -> f64 {
        self.fov_angle
    }

    #[inline]
    pub fn fov_depth(&self) -> f64 {
        self.fov_depth
    }

    #[inline]
    pub fn edge_distance(&self) -> f64 {
        self.edge_distance
    }

    /// Current heading in radians (0 = east, counter-clockwise).
    #[inline]
    pub fn heading(&self) -> f64 {
        Self::angle_from_vec(self.dir)
    }

    /*────────────────────────────── pose ────────────────────────────────*/

    pub fn set_position(&mut self, pos: DVec2) {
        self.pos = pos;
    }

    pub fn set_position_z(&mut self, pos_z: f64) {
        self.pos_z = pos_z;
    }

    /// Point the camera at `heading` radians; recomputes `dir` and `plane`.
    pub fn set_heading_angle(&mut self, heading: f64) {
        self.dir = self.vec_for_angle(heading);
        self.plane = self.vec_for_fov(self.dir);
    }

    /// Look up/down by `pitch` radians, stored as a pixel offset.
    pub fn set_pitch_angle(&mut self, pitch: f64) {
        let adjacent = (self.h / 2) as f64;
        self.pitch = (pitch.tan() * adjacent) as i32;
    }

    /// Change the horizontal field of view, keeping the heading.
    pub fn set_fov_angle(&mut self, fov_angle: f64) {
        self.fov_angle = fov_angle;
        self.plane = self.vec_for_fov(self.dir);
    }

    pub(crate) fn set_viewport(&mut self, w: usize, h: usize) {
        self.w = w as i32;
        self.h = h as i32;
        self.pitch = self.pitch.clamp(-self.h / 2, self.h / 2);
    }

    pub(crate) fn set_map_size(&mut self, map_width: usize, map_height: usize) {
        self.map_width = map_width;
        self.map_height = map_height;
    }

    /*──────────────────────── movement helpers ──────────────────────────*/

    /// Move along `dir` by `speed`, subject to the ground-level collision
    /// check.
    pub fn move_camera<M: Map + ?Sized>(&mut self, speed: f64, map: &M) {
        let target = self.pos + self.dir * speed;
        self.pos = self.valid_move(target, map.level(0));
    }

    /// Move along `plane` (sideways) by `speed`.
    pub fn strafe_camera<M: Map + ?Sized>(&mut self, speed: f64, map: &M) {
        let target = self.pos + self.plane * speed;
        self.pos = self.valid_move(target, map.level(0));
    }

    /// Turn by `angle` radians (positive = counter-clockwise).
    pub fn rotate_camera(&mut self, angle: f64) {
        let rot = DVec2::from_angle(angle);
        self.dir = rot.rotate(self.dir);
        self.plane = rot.rotate(self.plane);
    }

    /// Shift pitch by `delta` pixels, clamped to half the viewport height.
    pub fn pitch_camera(&mut self, delta: i32) {
        let half = self.h / 2;
        self.pitch = self.pitch.saturating_add(delta).clamp(-half, half);
    }

    pub fn stand_camera(&mut self) {
        self.pos_z = self.stances.stand;
    }

    pub fn crouch_camera(&mut self) {
        self.pos_z = self.stances.crouch;
    }

    pub fn prone_camera(&mut self) {
        self.pos_z = self.stances.prone;
    }

    pub fn jump_camera(&mut self) {
        self.pos_z = self.stances.jump;
    }

    /// Resolve a requested move to `target` against the ground level.
    ///
    /// The target is first pulled at least `edge_distance` inside the map;
    /// the clamped position is accepted only if its tile is passable,
    /// otherwise the current position is returned.  Upper levels are not
    /// consulted.
    pub fn valid_move(&self, target: DVec2, ground: &Grid) -> DVec2 {
        if target == self.pos || !target.is_finite() {
            return self.pos;
        }

        let (x, ix) = Self::clamp_axis(target.x, self.map_width, self.edge_distance);
        let (y, iy) = Self::clamp_axis(target.y, self.map_height, self.edge_distance);

        let passable = ground
            .get(ix)
            .and_then(|col| col.get(iy))
            .is_some_and(|&tile| tile <= 0);

        if passable { DVec2::new(x, y) } else { self.pos }
    }

    fn clamp_axis(v: f64, size: usize, edge: f64) -> (f64, usize) {
        let i = v as i64; // truncation, like the grid lookup
        if i < 0 || v < 0.0 {
            (edge, 0)
        } else if i >= size as i64 {
            let v = size as f64 - edge;
            (v, v.max(0.0) as usize)
        } else {
            (v, i as usize)
        }
    }

    /*──────────────────────── FOV vector algebra ────────────────────────*/

    #[inline]
    pub fn angle_from_vec(v: DVec2) -> f64 {
        v.y.atan2(v.x)
    }

    #[inline]
    pub fn vec_for_angle_length(angle: f64, length: f64) -> DVec2 {
        let (s, c) = angle.sin_cos();
        DVec2::new(length * c, length * s)
    }

    /// Facing vector for `angle`, `fov_depth` long.
    #[inline]
    pub fn vec_for_angle(&self, angle: f64) -> DVec2 {
        Self::vec_for_angle_length(angle, self.fov_depth)
    }

    /// Camera plane for facing `dir` and the configured FOV.
    ///
    /// ```text
    ///      dir + plane ... dir ... dir - plane
    ///             \         |         /
    ///              \  fov/2 | fov/2  /
    ///                     camera
    /// ```
    pub fn vec_for_fov(&self, dir: DVec2) -> DVec2 {
        let angle = Self::angle_from_vec(dir);
        let half = self.fov_angle / 2.0;
        let hypotenuse = dir.length() / half.cos();
        dir - Self::vec_for_angle_length(angle + half, hypotenuse)
    }

    /// Field of view (radians) spanned by `dir ± plane`.
    pub fn fov_from_vec(dir: DVec2, plane: DVec2) -> f64 {
        let left = dir - plane;
        let right = dir + plane;
        (Self::angle_from_vec(left) - Self::angle_from_vec(right)).rem_euclid(TAU)
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
