use crate::bubble::Bubble;
use crate::config::{LayerConfig, SimulationConfig, Viewport};
use crate::vectors::{Vector2D, VectorDirections};

/// Everything a frame shares between all bubbles of a pool: one pointer
/// snapshot and one timestamp.
#[derive(Clone, Copy, Debug)]
pub struct FrameInput {
    pub pointer: Vector2D,
    /// Seconds since the animation started.
    pub time: f32,
}

/// Small periodic nudge; the id shifts the phase so bubbles drift apart.
pub fn ambient_drift(bubble: &Bubble, time: f32, sim: &SimulationConfig) -> Vector2D {
    let phase = time + bubble.id.0 as f32 * sim.drift_phase_per_id;
    Vector2D::new(phase.sin(), phase.cos()) * sim.drift_strength * bubble.speed_factor
}

/// Push away from the pointer, zero at or beyond the radius and growing
/// linearly towards the pointer.
pub fn repulsion(position: Vector2D, pointer: Vector2D, layer: &LayerConfig) -> Vector2D {
    let offset = position - pointer;
    let distance = offset.length();
    if distance >= layer.repulsion_radius {
        return Vector2D::ZERO;
    }

    // Coincident centres have no direction of their own.
    let direction = if distance > 0. {
        offset / distance
    } else {
        Vector2D::RIGHT
    };
    let force = (layer.repulsion_radius - distance) / layer.repulsion_radius;
    direction * force * layer.push_strength
}

pub fn clamp_speed(velocity: Vector2D, max_speed: f32) -> Vector2D {
    let speed = velocity.length();
    if speed > max_speed {
        velocity * (max_speed / speed)
    } else {
        velocity
    }
}

fn wrap_axis(value: f32, extent: f32, buffer: f32) -> f32 {
    if value < -buffer {
        extent + buffer
    } else if value > extent + buffer {
        -buffer
    } else {
        value
    }
}

pub fn wrap(position: Vector2D, viewport: Viewport, buffer: f32) -> Vector2D {
    Vector2D::new(
        wrap_axis(position.x, viewport.width, buffer),
        wrap_axis(position.y, viewport.height, buffer),
    )
}

/// Advance one bubble by one tick. Repulsion is added before the clamp so
/// the pointer can never exceed the layer's speed ceiling, and friction is
/// applied after integration so it only affects the next tick.
pub fn step(
    bubble: &Bubble,
    frame: &FrameInput,
    layer: &LayerConfig,
    sim: &SimulationConfig,
    viewport: Viewport,
) -> Bubble {
    let mut velocity = bubble.velocity + ambient_drift(bubble, frame.time, sim);
    velocity += repulsion(bubble.position, frame.pointer, layer);
    velocity = clamp_speed(velocity, layer.max_speed);

    let position = bubble.position + velocity;
    velocity *= sim.friction;

    Bubble {
        position: wrap(position, viewport, sim.wrap_buffer),
        velocity,
        ..bubble.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bubble::{BubbleId, Rgba};
    use crate::config::Layer;
    use crate::pointer::OFFSCREEN;

    const VIEWPORT: Viewport = Viewport::new(1024., 768.);

    fn bubble(x: f32, y: f32, vx: f32, vy: f32) -> Bubble {
        Bubble {
            id: BubbleId(7),
            position: Vector2D::new(x, y),
            velocity: Vector2D::new(vx, vy),
            size: 60.,
            color: Rgba::WHITE,
            speed_factor: 0.3,
            born_at: Duration::ZERO,
        }
    }

    fn quiet_frame() -> FrameInput {
        FrameInput {
            pointer: OFFSCREEN,
            time: 1.5,
        }
    }

    #[test]
    fn repulsion_points_away_from_pointer() {
        let back = LayerConfig::for_layer(Layer::Back);
        let push = repulsion(Vector2D::new(510., 500.), Vector2D::new(500., 500.), &back);
        assert!(push.x > 0.);
        assert_eq!(push.y, 0.);
    }

    #[test]
    fn repulsion_has_a_hard_cutoff() {
        let back = LayerConfig::for_layer(Layer::Back);
        let pointer = Vector2D::new(0., 0.);
        assert_eq!(repulsion(Vector2D::new(100., 0.), pointer, &back), Vector2D::ZERO);
        assert_eq!(repulsion(Vector2D::new(300., 0.), pointer, &back), Vector2D::ZERO);
        assert!(repulsion(Vector2D::new(99., 0.), pointer, &back).length() > 0.);
    }

    #[test]
    fn repulsion_weakens_with_distance() {
        let front = LayerConfig::for_layer(Layer::Front);
        let pointer = Vector2D::new(200., 200.);
        let mut previous = f32::INFINITY;
        for d in [1., 10., 40., 80., 120., 149.] {
            let force = repulsion(pointer + Vector2D::new(0., d), pointer, &front).length();
            assert!(force < previous, "force at {d} should be below {previous}");
            previous = force;
        }
    }

    #[test]
    fn coincident_pointer_pushes_with_full_strength() {
        let back = LayerConfig::for_layer(Layer::Back);
        let at = Vector2D::new(42., 42.);
        let push = repulsion(at, at, &back);
        assert!(push.is_finite());
        assert!((push.length() - back.push_strength).abs() < 1e-6);
    }

    #[test]
    fn clamp_preserves_direction() {
        let clamped = clamp_speed(Vector2D::new(3., 4.), 1.);
        assert!((clamped.length() - 1.).abs() < 1e-6);
        assert!((clamped.x / clamped.y - 0.75).abs() < 1e-6);
        assert_eq!(clamp_speed(Vector2D::new(0.1, 0.), 1.), Vector2D::new(0.1, 0.));
    }

    #[test]
    fn step_respects_speed_ceiling_under_strong_push() {
        let front = LayerConfig::for_layer(Layer::Front);
        let sim = SimulationConfig::default();
        let frame = FrameInput {
            pointer: Vector2D::new(500., 500.),
            time: 0.,
        };
        let next = step(&bubble(501., 500., 5., 5.), &frame, &front, &sim, VIEWPORT);
        assert!(next.speed() <= front.max_speed + 1e-5);
    }

    #[test]
    fn friction_applies_after_integration() {
        let back = LayerConfig::for_layer(Layer::Back);
        let sim = SimulationConfig {
            drift_strength: 0.,
            ..SimulationConfig::default()
        };
        let next = step(&bubble(100., 100., 0.2, 0.), &quiet_frame(), &back, &sim, VIEWPORT);
        assert!((next.position.x - 100.2).abs() < 1e-4);
        assert!((next.velocity.x - 0.2 * 0.99).abs() < 1e-6);
    }

    #[test]
    fn wraps_past_the_buffer() {
        let back = LayerConfig::for_layer(Layer::Back);
        let sim = SimulationConfig::default();
        let start = VIEWPORT.width + sim.wrap_buffer + 1.;
        let next = step(&bubble(start, 300., 0., 0.), &quiet_frame(), &back, &sim, VIEWPORT);
        assert_eq!(next.position.x, -sim.wrap_buffer);

        let next = step(&bubble(300., -sim.wrap_buffer - 1., 0., 0.), &quiet_frame(), &back, &sim, VIEWPORT);
        assert_eq!(next.position.y, VIEWPORT.height + sim.wrap_buffer);
    }

    #[test]
    fn drift_depends_on_id() {
        let sim = SimulationConfig::default();
        let a = bubble(0., 0., 0., 0.);
        let b = Bubble {
            id: BubbleId(8),
            ..a.clone()
        };
        assert_ne!(ambient_drift(&a, 2., &sim), ambient_drift(&b, 2.0, &sim));
    }

    #[test]
    fn step_keeps_identity_and_size() {
        let back = LayerConfig::for_layer(Layer::Back);
        let sim = SimulationConfig::default();
        let before = bubble(10., 10., 0.1, 0.1);
        let after = step(&before, &quiet_frame(), &back, &sim, VIEWPORT);
        assert_eq!(after.id, before.id);
        assert_eq!(after.size, before.size);
        assert_eq!(after.color, before.color);
    }
}
