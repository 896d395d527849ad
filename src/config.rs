use std::ops::Range;
use std::time::Duration;

use crate::bubble::Rgba;
use crate::error::{Error, Result};

/// Which side of the page content a pool is painted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Back,
    Front,
}

impl Layer {
    pub fn name(self) -> &'static str {
        match self {
            Layer::Back => "back",
            Layer::Front => "front",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0. || self.height <= 0.
    }
}

/// Per-layer tuning. The back layer is denser and larger, the front layer
/// is sparser, smaller and reacts more strongly to the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerConfig {
    pub mobile_count: usize,
    pub desktop_count: usize,
    pub size_range: Range<f32>,
    pub repulsion_radius: f32,
    pub push_strength: f32,
    pub max_speed: f32,
}

impl LayerConfig {
    pub fn for_layer(layer: Layer) -> Self {
        match layer {
            Layer::Back => Self {
                mobile_count: 30,
                desktop_count: 50,
                size_range: 40.0..120.0,
                repulsion_radius: 100.,
                push_strength: 0.04,
                max_speed: 0.3,
            },
            Layer::Front => Self {
                mobile_count: 15,
                desktop_count: 25,
                size_range: 15.0..55.0,
                repulsion_radius: 150.,
                push_strength: 0.08,
                max_speed: 0.6,
            },
        }
    }

    /// Sizes are drawn from `size_range`, so it must not be empty.
    pub fn validate(&self) -> Result<()> {
        if self.size_range.is_empty() {
            return Err(Error::InvalidConfig("size_range is empty"));
        }
        Ok(())
    }

    pub fn population(&self, viewport: Viewport, mobile_breakpoint: f32) -> usize {
        if viewport.is_empty() {
            return 0;
        }
        if viewport.width < mobile_breakpoint {
            self.mobile_count
        } else {
            self.desktop_count
        }
    }
}

/// Constants shared by both layers.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub mobile_breakpoint: f32,
    pub friction: f32,
    pub wrap_buffer: f32,
    pub drift_strength: f32,
    pub drift_phase_per_id: f32,
    /// Each initial velocity component is drawn from `±initial_velocity_spread / 2`.
    pub initial_velocity_spread: f32,
    pub speed_factor_range: Range<f32>,
    pub respawn_delay: Range<Duration>,
    pub respawn_offset: f32,
    pub respawn_slack: f32,
    pub respawn_rise_speed: Range<f32>,
    pub palette: &'static [Rgba],
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: 768.,
            friction: 0.99,
            wrap_buffer: 100.,
            drift_strength: 0.0003,
            drift_phase_per_id: 0.1,
            initial_velocity_spread: 0.15,
            speed_factor_range: 0.2..0.5,
            respawn_delay: Duration::from_millis(600)..Duration::from_millis(1000),
            respawn_offset: 50.,
            respawn_slack: 40.,
            respawn_rise_speed: -0.4..-0.2,
            palette: &PALETTE,
        }
    }
}

impl SimulationConfig {
    /// Every range here is sampled from, and the palette is indexed into.
    pub fn validate(&self) -> Result<()> {
        if self.speed_factor_range.is_empty() {
            return Err(Error::InvalidConfig("speed_factor_range is empty"));
        }
        if self.respawn_delay.is_empty() {
            return Err(Error::InvalidConfig("respawn_delay is empty"));
        }
        if self.respawn_rise_speed.is_empty() {
            return Err(Error::InvalidConfig("respawn_rise_speed is empty"));
        }
        if self.palette.is_empty() {
            return Err(Error::InvalidConfig("palette is empty"));
        }
        Ok(())
    }
}

pub const PALETTE: [Rgba; 7] = [
    Rgba::new(255, 183, 178, 0.9),
    Rgba::new(255, 223, 186, 0.9),
    Rgba::new(255, 255, 186, 0.9),
    Rgba::new(186, 255, 201, 0.9),
    Rgba::new(186, 225, 255, 0.9),
    Rgba::new(226, 194, 255, 0.9),
    Rgba::new(255, 192, 203, 0.9),
];
