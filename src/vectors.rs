pub trait VectorDirections {
    const RIGHT: Self;
}

pub type Vector2D = glam::Vec2;

impl VectorDirections for Vector2D {
    const RIGHT: Self = Self::new(1.0, 0.);
}
