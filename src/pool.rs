use std::time::Duration;

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use web_time::{SystemTime, UNIX_EPOCH};

use crate::bubble::{Bubble, BubbleId};
use crate::config::{Layer, LayerConfig, SimulationConfig, Viewport};
use crate::simulation::{self, FrameInput};
use crate::tasks::DelayedTasks;
use crate::vectors::Vector2D;

#[derive(Clone, Copy, Debug)]
struct Respawn {
    replaces: BubbleId,
}

/// Owns every live bubble of one layer, plus the respawns still waiting to
/// fire.
pub struct BubblePool {
    layer: Layer,
    layer_config: LayerConfig,
    sim: SimulationConfig,
    viewport: Viewport,
    bubbles: Vec<Bubble>,
    respawns: DelayedTasks<Respawn>,
    next_id: u64,
    clock: Duration,
    rng: SmallRng,
    live: bool,
}

fn clock_seed(layer: Layer) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_nanos() as u64)
        .unwrap_or(0x5eed);
    // keep two pools created in the same instant from mirroring each other
    nanos ^ (layer as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

impl BubblePool {
    pub fn new(layer: Layer, sim: SimulationConfig, viewport: Viewport) -> Self {
        Self::with_rng(
            layer,
            LayerConfig::for_layer(layer),
            sim,
            viewport,
            SmallRng::seed_from_u64(clock_seed(layer)),
        )
    }

    /// # Panics
    ///
    /// In debug builds, if either config fails `validate`. Release builds
    /// panic later, on the first draw from an empty range.
    pub fn with_rng(
        layer: Layer,
        layer_config: LayerConfig,
        sim: SimulationConfig,
        viewport: Viewport,
        rng: SmallRng,
    ) -> Self {
        debug_assert!(layer_config.validate().is_ok(), "{layer_config:?}");
        debug_assert!(sim.validate().is_ok(), "{sim:?}");
        let mut pool = Self {
            layer,
            layer_config,
            sim,
            viewport,
            bubbles: vec![],
            respawns: DelayedTasks::new(),
            next_id: 0,
            clock: Duration::ZERO,
            rng,
            live: true,
        };
        pool.populate();
        pool
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    pub fn get(&self, id: BubbleId) -> Option<&Bubble> {
        self.bubbles.iter().find(|bubble| bubble.id == id)
    }

    pub fn pending_respawns(&self) -> usize {
        self.respawns.len()
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    fn allocate_id(&mut self) -> BubbleId {
        let id = BubbleId(self.next_id);
        self.next_id += 1;
        id
    }

    fn drift_velocity(&mut self) -> f32 {
        (self.rng.random::<f32>() - 0.5) * self.sim.initial_velocity_spread
    }

    fn new_bubble(&mut self, position: Vector2D, velocity: Vector2D) -> Bubble {
        let id = self.allocate_id();
        let size = self.rng.random_range(self.layer_config.size_range.clone());
        let palette = self.sim.palette;
        let color = palette[self.rng.random_range(0..palette.len())];
        let speed_factor = self.rng.random_range(self.sim.speed_factor_range.clone());
        Bubble {
            id,
            position,
            velocity,
            size,
            color,
            speed_factor,
            born_at: self.clock,
        }
    }

    fn populate(&mut self) {
        let count = self
            .layer_config
            .population(self.viewport, self.sim.mobile_breakpoint);
        let mut bubbles = Vec::with_capacity(count);
        for _ in 0..count {
            let position = Vector2D::new(
                self.rng.random::<f32>() * self.viewport.width,
                self.rng.random::<f32>() * self.viewport.height,
            );
            let velocity = Vector2D::new(self.drift_velocity(), self.drift_velocity());
            bubbles.push(self.new_bubble(position, velocity));
        }
        self.bubbles = bubbles;
        info!(
            "{} pool: {} bubbles for {}x{}",
            self.layer.name(),
            count,
            self.viewport.width,
            self.viewport.height
        );
    }

    /// Re-initializes the pool when the viewport changed. Returns whether it did.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        if !self.live || viewport == self.viewport {
            return false;
        }
        debug!(
            "{} pool: resize {}x{} -> {}x{}",
            self.layer.name(),
            self.viewport.width,
            self.viewport.height,
            viewport.width,
            viewport.height
        );
        self.viewport = viewport;
        self.respawns.cancel_all();
        self.populate();
        true
    }

    fn spawn_from_below(&mut self, respawn: Respawn) {
        let position = Vector2D::new(
            self.rng.random::<f32>() * self.viewport.width,
            self.viewport.height
                + self.sim.respawn_offset
                + self.rng.random::<f32>() * self.sim.respawn_slack,
        );
        let velocity = Vector2D::new(
            self.drift_velocity(),
            self.rng.random_range(self.sim.respawn_rise_speed.clone()),
        );
        let bubble = self.new_bubble(position, velocity);
        debug!(
            "{} pool: bubble {} respawned as {}",
            self.layer.name(),
            respawn.replaces.0,
            bubble.id.0
        );
        self.bubbles.push(bubble);
    }

    /// Runs one frame: inserts due respawns, then swaps in the next
    /// generation computed from one shared pointer snapshot and timestamp.
    pub fn advance(&mut self, elapsed: Duration, pointer: Vector2D) {
        if !self.live {
            return;
        }
        self.clock = self.clock.max(elapsed);
        for respawn in self.respawns.take_due(self.clock) {
            self.spawn_from_below(respawn);
        }

        let frame = FrameInput {
            pointer,
            time: self.clock.as_secs_f32(),
        };
        let layer = &self.layer_config;
        let sim = &self.sim;
        let viewport = self.viewport;
        let next: Vec<Bubble> = self
            .bubbles
            .par_iter()
            .map(|bubble| simulation::step(bubble, &frame, layer, sim, viewport))
            .collect();
        self.bubbles = next;
    }

    /// Removes a bubble right away and schedules its replacement.
    pub fn pop(&mut self, id: BubbleId) -> Option<Bubble> {
        if !self.live {
            return None;
        }
        let index = self.bubbles.iter().position(|bubble| bubble.id == id)?;
        let popped = self.bubbles.remove(index);

        let delay = self.rng.random_range(self.sim.respawn_delay.clone());
        self.respawns
            .schedule(self.clock + delay, Respawn { replaces: id });
        debug!(
            "{} pool: popped bubble {}, respawn in {:?}",
            self.layer.name(),
            id.0,
            delay
        );
        Some(popped)
    }

    /// Topmost bubble under `point`, i.e. the last drawn one.
    pub fn hit_test(&self, point: Vector2D) -> Option<BubbleId> {
        self.bubbles
            .iter()
            .rev()
            .find(|bubble| bubble.contains(point))
            .map(|bubble| bubble.id)
    }

    /// Cancels pending respawns and drops all bubbles. Later calls to
    /// `advance`, `pop` and `resize` do nothing.
    pub fn shutdown(&mut self) {
        if !self.live {
            return;
        }
        let cancelled = self.respawns.cancel_all();
        self.bubbles.clear();
        self.live = false;
        debug!(
            "{} pool: shut down, {} respawns cancelled",
            self.layer.name(),
            cancelled
        );
    }
}

impl Drop for BubblePool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::OFFSCREEN;

    fn seeded(layer: Layer, viewport: Viewport, seed: u64) -> BubblePool {
        BubblePool::with_rng(
            layer,
            LayerConfig::for_layer(layer),
            SimulationConfig::default(),
            viewport,
            SmallRng::seed_from_u64(seed),
        )
    }

    #[test]
    fn desktop_back_layer_population() {
        let pool = seeded(Layer::Back, Viewport::new(1024., 768.), 1);
        assert_eq!(pool.len(), 50);
        for bubble in pool.bubbles() {
            assert!((40.0..120.0).contains(&bubble.size));
            assert!((0.0..=1024.0).contains(&bubble.position.x));
            assert!((0.0..=768.0).contains(&bubble.position.y));
            assert!((0.2..0.5).contains(&bubble.speed_factor));
            assert!(bubble.velocity.x.abs() <= 0.075);
            assert!(bubble.velocity.y.abs() <= 0.075);
            assert!(crate::config::PALETTE.contains(&bubble.color));
        }
    }

    #[test]
    fn mobile_front_layer_population() {
        let pool = seeded(Layer::Front, Viewport::new(390., 844.), 2);
        assert_eq!(pool.len(), 15);
        assert!(pool.bubbles().iter().all(|b| (15.0..55.0).contains(&b.size)));
    }

    #[test]
    fn ids_are_unique() {
        let pool = seeded(Layer::Back, Viewport::new(1280., 720.), 3);
        let mut ids: Vec<_> = pool.bubbles().iter().map(|b| b.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), pool.len());
    }

    #[test]
    fn zero_viewport_is_empty() {
        let mut pool = seeded(Layer::Back, Viewport::new(0., 0.), 4);
        assert!(pool.is_empty());
        pool.advance(Duration::from_millis(16), OFFSCREEN);
        assert!(pool.is_empty());
    }

    #[test]
    fn pop_then_respawn_restores_count() {
        let mut pool = seeded(Layer::Front, Viewport::new(1024., 768.), 5);
        pool.advance(Duration::from_millis(16), OFFSCREEN);
        let before = pool.len();
        let victim = pool.bubbles()[3].id;

        let popped = pool.pop(victim).unwrap();
        assert_eq!(popped.id, victim);
        assert_eq!(pool.len(), before - 1);
        assert!(pool.get(victim).is_none());
        assert_eq!(pool.pending_respawns(), 1);

        pool.advance(Duration::from_millis(500), OFFSCREEN);
        assert_eq!(pool.len(), before - 1);

        pool.advance(Duration::from_millis(1100), OFFSCREEN);
        assert_eq!(pool.len(), before);
        assert_eq!(pool.pending_respawns(), 0);

        let newcomer = pool.bubbles().last().unwrap();
        assert_ne!(newcomer.id, victim);
        assert!(newcomer.position.y > 768.);
        assert!(newcomer.velocity.y < 0.);
        assert_eq!(newcomer.born_at, Duration::from_millis(1100));
    }

    #[test]
    fn popping_unknown_id_is_noop() {
        let mut pool = seeded(Layer::Back, Viewport::new(1024., 768.), 6);
        assert!(pool.pop(BubbleId(9999)).is_none());
        assert_eq!(pool.pending_respawns(), 0);
    }

    #[test]
    fn resize_replaces_the_set() {
        let mut pool = seeded(Layer::Back, Viewport::new(1024., 768.), 7);
        let first = pool.bubbles()[0].id;
        pool.pop(first);

        assert!(!pool.resize(Viewport::new(1024., 768.)));
        assert!(pool.resize(Viewport::new(500., 900.)));
        assert_eq!(pool.len(), 30);
        assert_eq!(pool.pending_respawns(), 0);
        assert!(pool.bubbles().iter().all(|b| b.position.x <= 500.));
    }

    #[test]
    fn shutdown_suppresses_respawns() {
        let mut pool = seeded(Layer::Front, Viewport::new(1024., 768.), 8);
        let victim = pool.bubbles()[0].id;
        pool.pop(victim);
        pool.shutdown();

        assert!(!pool.is_live());
        assert_eq!(pool.pending_respawns(), 0);
        pool.advance(Duration::from_secs(5), OFFSCREEN);
        assert!(pool.is_empty());
        assert!(pool.pop(BubbleId(1)).is_none());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn empty_palette_is_caught_at_construction() {
        BubblePool::with_rng(
            Layer::Back,
            LayerConfig::for_layer(Layer::Back),
            SimulationConfig {
                palette: &[],
                ..SimulationConfig::default()
            },
            Viewport::new(0., 0.),
            SmallRng::seed_from_u64(10),
        );
    }

    #[test]
    fn hit_test_prefers_last_drawn() {
        let mut pool = seeded(Layer::Back, Viewport::new(1024., 768.), 9);
        let target = pool.bubbles()[0].position;
        let last = pool.bubbles().len() - 1;
        pool.bubbles[last].position = target;
        let top = pool.bubbles[last].id;
        assert_eq!(pool.hit_test(target), Some(top));
        assert_eq!(pool.hit_test(Vector2D::new(-5000., -5000.)), None);
    }
}
