#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::bubble::Rgba;
use crate::vectors::Vector2D;

pub const BYTES_PER_PIXEL: usize = 4;

const HIGHLIGHT_INNER: Rgba = Rgba::new(255, 255, 255, 0.9);
const HIGHLIGHT_OUTER: Rgba = Rgba::new(255, 255, 255, 0.2);
// Fraction of the gradient extent where the highlight gives way to the tint.
const HIGHLIGHT_STOP: f32 = 0.4;
// Gradient centre, as a fraction of the bounding box from its top-left corner.
const FOCAL_FRACTION: f32 = 0.3;

const SHADOW_ALPHA: f32 = 0.05;
const SHADOW_BLUR: f32 = 8.;
const DROP_SHADOW_OFFSET: Vector2D = Vector2D::new(0., 2.);
const INSET_SHADOW_OFFSET: Vector2D = Vector2D::new(-2., -2.);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: Vector2D,
    pub max: Vector2D,
}

impl Rect {
    pub fn new(min: Vector2D, max: Vector2D) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, point: Vector2D) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }
}

/// An RGBA8 frame buffer, row-major, always fully opaque.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: usize, height: usize) -> Self {
        debug_assert!(frame.len() >= width * height * BYTES_PER_PIXEL);
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let idx = (y * self.width + x) * BYTES_PER_PIXEL;
        [
            self.frame[idx],
            self.frame[idx + 1],
            self.frame[idx + 2],
            self.frame[idx + 3],
        ]
    }

    pub fn clear(&mut self, color: Rgba) {
        let fill = [color.r, color.g, color.b, 255];
        #[cfg(target_arch = "wasm32")]
        for chunk in self.frame.chunks_exact_mut(BYTES_PER_PIXEL) {
            chunk.copy_from_slice(&fill)
        }
        #[cfg(not(target_arch = "wasm32"))]
        self.frame
            .par_chunks_mut(BYTES_PER_PIXEL)
            .for_each(|chunk| chunk.copy_from_slice(&fill));
    }

    /// Composites `color` over the pixel, with its alpha scaled by `coverage`.
    fn blend(&mut self, x: usize, y: usize, color: Rgba, coverage: f32) {
        let alpha = (color.a * coverage).clamp(0., 1.);
        if alpha <= 0. {
            return;
        }
        let idx = (y * self.width + x) * BYTES_PER_PIXEL;
        if idx + 3 >= self.frame.len() {
            return;
        }

        let curr_r = self.frame[idx];
        let curr_g = self.frame[idx + 1];
        let curr_b = self.frame[idx + 2];

        self.frame[idx] = (curr_r as f32 * (1.0 - alpha) + color.r as f32 * alpha) as u8;
        self.frame[idx + 1] = (curr_g as f32 * (1.0 - alpha) + color.g as f32 * alpha) as u8;
        self.frame[idx + 2] = (curr_b as f32 * (1.0 - alpha) + color.b as f32 * alpha) as u8;
        self.frame[idx + 3] = 255;
    }

    /// Pixel bounds of the box around `center`, clipped to the canvas.
    fn clip_box(&self, center: Vector2D, reach: f32) -> Option<(usize, usize, usize, usize)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let min_x = (center.x - reach).floor().max(0.);
        let min_y = (center.y - reach).floor().max(0.);
        let max_x = (center.x + reach).ceil().min(self.width as f32 - 1.);
        let max_y = (center.y + reach).ceil().min(self.height as f32 - 1.);
        if min_x > max_x || min_y > max_y {
            return None;
        }
        Some((min_x as usize, min_y as usize, max_x as usize, max_y as usize))
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let center = (rect.min + rect.max) / 2.;
        let half = (rect.max - rect.min) / 2.;
        let Some((min_x, min_y, max_x, max_y)) = self.clip_box(center, half.max_element()) else {
            return;
        };
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if rect.contains(Vector2D::new(x as f32, y as f32)) {
                    self.blend(x, y, color, 1.);
                }
            }
        }
    }

    /// Paints a glossy bubble: a soft drop shadow, a radial gradient from a
    /// white highlight towards the upper left out to `tint`, and a faint
    /// inner shadow on the lower right rim.
    pub fn draw_bubble(&mut self, center: Vector2D, diameter: f32, tint: Rgba, opacity: f32) {
        let radius = diameter / 2.;
        if radius <= 0. || opacity <= 0. {
            return;
        }
        let reach = radius + SHADOW_BLUR + DROP_SHADOW_OFFSET.length();
        let Some((min_x, min_y, max_x, max_y)) = self.clip_box(center, reach) else {
            return;
        };

        let top_left = center - Vector2D::splat(radius);
        let focal = top_left + Vector2D::splat(diameter * FOCAL_FRACTION);
        // CSS farthest-corner: from the focal point to the bottom-right corner.
        let extent = (diameter * (1. - FOCAL_FRACTION)) * std::f32::consts::SQRT_2;
        let shadow = Rgba::BLACK.with_alpha(SHADOW_ALPHA);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let sample = Vector2D::new(x as f32, y as f32);
                let distance = sample.distance(center);
                // Anti-aliased edge, one pixel wide.
                let coverage = (radius + 0.5 - distance).clamp(0., 1.);

                if coverage < 1. {
                    let outside = sample.distance(center + DROP_SHADOW_OFFSET) - radius;
                    if outside < SHADOW_BLUR {
                        let falloff = 1. - outside.max(0.) / SHADOW_BLUR;
                        self.blend(x, y, shadow, falloff * (1. - coverage) * opacity);
                    }
                }
                if coverage <= 0. {
                    continue;
                }

                let t = (sample.distance(focal) / extent).min(1.);
                let color = if t <= HIGHLIGHT_STOP {
                    HIGHLIGHT_INNER.lerp(HIGHLIGHT_OUTER, t / HIGHLIGHT_STOP)
                } else {
                    HIGHLIGHT_OUTER.lerp(tint, (t - HIGHLIGHT_STOP) / (1. - HIGHLIGHT_STOP))
                };
                self.blend(x, y, color, coverage * opacity);

                let inside = radius - sample.distance(center + INSET_SHADOW_OFFSET);
                if inside < SHADOW_BLUR {
                    let falloff = 1. - inside.max(0.) / SHADOW_BLUR;
                    self.blend(x, y, shadow, falloff * coverage * opacity);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_frame(width: usize, height: usize) -> Vec<u8> {
        vec![255; width * height * BYTES_PER_PIXEL]
    }

    #[test]
    fn clear_fills_every_pixel() {
        let mut frame = vec![0; 8 * 4 * BYTES_PER_PIXEL];
        let mut canvas = Canvas::new(&mut frame, 8, 4);
        canvas.clear(Rgba::new(10, 20, 30, 1.));
        assert!(frame.chunks_exact(4).all(|px| px == [10, 20, 30, 255]));
    }

    #[test]
    fn bubble_tints_its_rim_and_highlights_upper_left() {
        let mut frame = white_frame(100, 100);
        let mut canvas = Canvas::new(&mut frame, 100, 100);
        let tint = Rgba::new(186, 225, 255, 0.9);
        canvas.draw_bubble(Vector2D::new(50., 50.), 80., tint, 1.);

        // Lower right rim leans towards the tint's dominant blue, away from red.
        let rim = canvas.pixel(76, 76);
        assert!(rim[0] < 240, "rim {rim:?}");
        assert!(rim[2] > rim[0] + 10, "rim {rim:?}");

        // Focal point stays close to white.
        let highlight = canvas.pixel(34, 34);
        assert!(highlight.iter().take(3).all(|&c| c > 240), "highlight {highlight:?}");
    }

    #[test]
    fn pixels_far_outside_are_untouched() {
        let mut frame = white_frame(100, 100);
        let mut canvas = Canvas::new(&mut frame, 100, 100);
        canvas.draw_bubble(Vector2D::new(50., 50.), 20., Rgba::new(255, 183, 178, 0.9), 1.);
        assert_eq!(canvas.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(canvas.pixel(99, 99), [255, 255, 255, 255]);
    }

    #[test]
    fn zero_opacity_draws_nothing() {
        let mut frame = white_frame(40, 40);
        let mut canvas = Canvas::new(&mut frame, 40, 40);
        canvas.draw_bubble(Vector2D::new(20., 20.), 30., Rgba::new(0, 0, 0, 1.), 0.);
        assert!(frame.iter().all(|&c| c == 255));
    }

    #[test]
    fn offscreen_bubbles_are_clipped() {
        let mut frame = white_frame(40, 40);
        let mut canvas = Canvas::new(&mut frame, 40, 40);
        canvas.draw_bubble(Vector2D::new(-500., 900.), 100., Rgba::new(0, 0, 0, 1.), 1.);
        canvas.draw_bubble(Vector2D::new(-10., 20.), 30., Rgba::new(0, 0, 0, 1.), 1.);
        assert_eq!(canvas.pixel(39, 39), [255, 255, 255, 255]);
    }

    #[test]
    fn fill_rect_covers_only_the_rect() {
        let mut frame = white_frame(20, 20);
        let mut canvas = Canvas::new(&mut frame, 20, 20);
        canvas.fill_rect(
            Rect::new(Vector2D::new(5., 5.), Vector2D::new(10., 15.)),
            Rgba::new(0, 0, 0, 1.),
        );
        assert_eq!(canvas.pixel(5, 5), [0, 0, 0, 255]);
        assert_eq!(canvas.pixel(9, 14), [0, 0, 0, 255]);
        assert_eq!(canvas.pixel(10, 5), [255, 255, 255, 255]);
        assert_eq!(canvas.pixel(4, 10), [255, 255, 255, 255]);
    }
}
