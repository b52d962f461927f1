use crate::engine::types::Tint;

/// Distance-based shading shared by walls, floor and sprites.
///
/// ```text
/// channel = clamp(base + sqrt(distance) * light_falloff + sun_light, 0, 255)
/// ```
///
/// `light_falloff` is a radial "torch" carried by the camera (negative:
/// light fades with distance), `sun_light` a flat ambient term.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    /// Decrease to make the torch dimmer.
    pub light_falloff: f64,
    /// Global illumination.
    pub sun_light: f64,
    /// Flat darkening of north/south (`Side::Y`) walls.
    pub side_shade: u8,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            light_falloff: -100.0,
            sun_light: 300.0,
            side_shade: 12,
        }
    }
}

impl Lighting {
    /// Tint for something `distance` away, starting from a `base` grey.
    #[inline]
    pub fn tint(&self, base: u8, distance: f64) -> Tint {
        let shadow = distance.sqrt() * self.light_falloff;
        let v = (base as f64 + shadow + self.sun_light) as i32;
        Tint::grey(v.clamp(0, 255) as u8)
    }

    /// Wall tint: north/south faces start `side_shade` darker.
    #[inline]
    pub fn wall_tint(&self, north_south: bool, distance: f64) -> Tint {
        let base = if north_south {
            255 - self.side_shade
        } else {
            255
        };
        self.tint(base, distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_things_saturate_far_things_fade() {
        let l = Lighting::default();
        // 255 + 0 + 300 → clamped
        assert_eq!(l.tint(255, 0.0), Tint::grey(255));
        // 255 - 100*sqrt(16) + 300 = 155
        assert_eq!(l.tint(255, 16.0), Tint::grey(155));
        // 255 - 100*sqrt(100) + 300 < 0 → clamped
        assert_eq!(l.tint(255, 100.0), Tint::grey(0));
    }

    #[test]
    fn north_south_walls_are_darker() {
        let l = Lighting::default();
        let ew = l.wall_tint(false, 16.0);
        let ns = l.wall_tint(true, 16.0);
        assert_eq!(ew.r - ns.r, 12);
        assert_eq!(ns.a, 255);
    }

    #[test]
    fn negative_distance_does_not_panic() {
        // sqrt(-1) is NaN, which lands on 0 before clamping
        let l = Lighting::default();
        assert_eq!(l.tint(255, -1.0), Tint::grey(0));
    }
}
