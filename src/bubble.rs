use std::time::Duration;

use crate::vectors::Vector2D;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BubbleId(pub u64);

/// Straight (non-premultiplied) colour with a fractional alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 1.0);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 1.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Component-wise interpolation, `t` in `[0, 1]`.
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0., 1.);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bubble {
    pub id: BubbleId,
    /// Centre of the circle in viewport pixels.
    pub position: Vector2D,
    /// Pixels per simulation tick.
    pub velocity: Vector2D,
    /// Diameter in pixels, fixed at creation.
    pub size: f32,
    pub color: Rgba,
    pub speed_factor: f32,
    /// Pool clock reading when the bubble was created.
    pub born_at: Duration,
}

impl Bubble {
    pub fn radius(&self) -> f32 {
        self.size / 2.
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn contains(&self, point: Vector2D) -> bool {
        self.position.distance_squared(point) <= self.radius() * self.radius()
    }
}
