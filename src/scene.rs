use std::time::Duration;

use log::debug;

use crate::bubble::{Bubble, BubbleId, Rgba};
use crate::config::{Layer, SimulationConfig, Viewport};
use crate::draw::{Canvas, Rect};
use crate::pointer::PointerTracker;
use crate::pool::BubblePool;
use crate::vectors::Vector2D;

const BACKGROUND: Rgba = Rgba::WHITE;
const TRANSITION: Duration = Duration::from_millis(500);
const HOVER_SCALE: f32 = 1.05;
const POP_SCALE: f32 = 1.5;

/// Stand-in for the page content painted between the two layers. Stored as
/// fractions of the viewport so it follows resizes.
#[derive(Clone, Copy, Debug)]
pub struct ContentPanel {
    pub min: Vector2D,
    pub max: Vector2D,
    pub color: Rgba,
}

impl ContentPanel {
    pub fn centered(width_fraction: f32, height_fraction: f32, color: Rgba) -> Self {
        let half = Vector2D::new(width_fraction, height_fraction) / 2.;
        Self {
            min: Vector2D::splat(0.5) - half,
            max: Vector2D::splat(0.5) + half,
            color,
        }
    }

    pub fn rect(&self, viewport: Viewport) -> Rect {
        let scale = Vector2D::new(viewport.width, viewport.height);
        Rect::new(self.min * scale, self.max * scale)
    }
}

struct PopEffect {
    bubble: Bubble,
    layer: Layer,
    started: Duration,
}

fn progress(since: Duration, now: Duration) -> f32 {
    let age = now.saturating_sub(since);
    (age.as_secs_f32() / TRANSITION.as_secs_f32()).min(1.)
}

/// Back pool, content, front pool, and the pointer they share.
pub struct Scene {
    back: BubblePool,
    front: BubblePool,
    pointer: PointerTracker,
    panels: Vec<ContentPanel>,
    pops: Vec<PopEffect>,
    viewport: Viewport,
    clock: Duration,
}

impl Scene {
    pub fn new(viewport: Viewport, sim: SimulationConfig) -> Self {
        Self::from_pools(
            BubblePool::new(Layer::Back, sim.clone(), viewport),
            BubblePool::new(Layer::Front, sim, viewport),
        )
    }

    pub fn from_pools(back: BubblePool, front: BubblePool) -> Self {
        let viewport = back.viewport();
        Self {
            back,
            front,
            pointer: PointerTracker::new(),
            panels: vec![],
            pops: vec![],
            viewport,
            clock: Duration::ZERO,
        }
    }

    pub fn with_panel(mut self, panel: ContentPanel) -> Self {
        self.panels.push(panel);
        self
    }

    pub fn pool(&self, layer: Layer) -> &BubblePool {
        match layer {
            Layer::Back => &self.back,
            Layer::Front => &self.front,
        }
    }

    fn pool_mut(&mut self, layer: Layer) -> &mut BubblePool {
        match layer {
            Layer::Back => &mut self.back,
            Layer::Front => &mut self.front,
        }
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub fn pointer_mut(&mut self) -> &mut PointerTracker {
        &mut self.pointer
    }

    pub fn bubble_count(&self) -> usize {
        self.back.len() + self.front.len()
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.back.resize(viewport);
        self.front.resize(viewport);
        self.pops.clear();
    }

    pub fn update(&mut self, elapsed: Duration) {
        self.clock = self.clock.max(elapsed);
        let pointer = self.pointer.position();
        self.back.advance(self.clock, pointer);
        self.front.advance(self.clock, pointer);

        let now = self.clock;
        self.pops.retain(|pop| now.saturating_sub(pop.started) < TRANSITION);
    }

    fn covered_by_content(&self, point: Vector2D) -> bool {
        self.panels
            .iter()
            .any(|panel| panel.rect(self.viewport).contains(point))
    }

    /// The bubble a click at `point` would land on. The front layer sits on
    /// top of everything; the back layer is only reachable where no content
    /// covers it.
    pub fn hit_test(&self, point: Vector2D) -> Option<(Layer, BubbleId)> {
        if let Some(id) = self.front.hit_test(point) {
            return Some((Layer::Front, id));
        }
        if self.covered_by_content(point) {
            return None;
        }
        self.back.hit_test(point).map(|id| (Layer::Back, id))
    }

    pub fn hovered(&self) -> Option<(Layer, BubbleId)> {
        self.hit_test(self.pointer.position())
    }

    pub fn click(&mut self, point: Vector2D) -> Option<(Layer, BubbleId)> {
        let (layer, id) = self.hit_test(point)?;
        let bubble = self.pool_mut(layer).pop(id)?;
        debug!("click at ({}, {}) popped {} bubble {}", point.x, point.y, layer.name(), id.0);
        self.pops.push(PopEffect {
            bubble,
            layer,
            started: self.clock,
        });
        Some((layer, id))
    }

    /// Tears down both pools. Nothing is spawned afterwards.
    pub fn shutdown(&mut self) {
        self.back.shutdown();
        self.front.shutdown();
        self.pops.clear();
    }

    fn draw_layer(&self, canvas: &mut Canvas, layer: Layer, hovered: Option<(Layer, BubbleId)>) {
        for bubble in self.pool(layer).bubbles() {
            let grow = progress(bubble.born_at, self.clock);
            let hover = if hovered == Some((layer, bubble.id)) {
                HOVER_SCALE
            } else {
                1.
            };
            canvas.draw_bubble(bubble.position, bubble.size * grow * hover, bubble.color, grow);
        }

        for pop in self.pops.iter().filter(|pop| pop.layer == layer) {
            let t = progress(pop.started, self.clock);
            let scale = 1. + (POP_SCALE - 1.) * t;
            canvas.draw_bubble(pop.bubble.position, pop.bubble.size * scale, pop.bubble.color, 1. - t);
        }
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        let hovered = self.hovered();
        canvas.clear(BACKGROUND);
        self.draw_layer(canvas, Layer::Back, hovered);
        for panel in &self.panels {
            canvas.fill_rect(panel.rect(self.viewport), panel.color);
        }
        self.draw_layer(canvas, Layer::Front, hovered);
    }
}
