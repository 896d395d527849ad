use crate::vectors::Vector2D;

/// Where the pointer sits before any input arrives, far enough away that no
/// repulsion radius can reach a bubble.
pub const OFFSCREEN: Vector2D = Vector2D::new(-1000., -1000.);

/// Latest pointer or primary-touch position in viewport pixels.
#[derive(Clone, Debug)]
pub struct PointerTracker {
    position: Vector2D,
    active_touch: Option<u64>,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerTracker {
    pub fn new() -> Self {
        Self {
            position: OFFSCREEN,
            active_touch: None,
        }
    }

    pub fn position(&self) -> Vector2D {
        self.position
    }

    pub fn pointer_moved(&mut self, position: Vector2D) {
        self.position = position;
    }

    /// Returns true when this touch became the tracked one.
    pub fn touch_started(&mut self, id: u64, position: Vector2D) -> bool {
        if self.active_touch.is_some() {
            return false;
        }
        self.active_touch = Some(id);
        self.position = position;
        true
    }

    pub fn touch_moved(&mut self, id: u64, position: Vector2D) {
        match self.active_touch {
            Some(active) if active == id => self.position = position,
            // a move without a start (e.g. started outside the window) adopts the touch
            None => {
                self.active_touch = Some(id);
                self.position = position;
            }
            _ => {}
        }
    }

    pub fn touch_ended(&mut self, id: u64) {
        if self.active_touch == Some(id) {
            self.active_touch = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_offscreen() {
        assert_eq!(PointerTracker::new().position(), OFFSCREEN);
    }

    #[test]
    fn last_write_wins() {
        let mut tracker = PointerTracker::new();
        tracker.pointer_moved(Vector2D::new(10., 20.));
        tracker.pointer_moved(Vector2D::new(30., 40.));
        assert_eq!(tracker.position(), Vector2D::new(30., 40.));
    }

    #[test]
    fn follows_first_touch_only() {
        let mut tracker = PointerTracker::new();
        assert!(tracker.touch_started(1, Vector2D::new(5., 5.)));
        assert!(!tracker.touch_started(2, Vector2D::new(50., 50.)));
        tracker.touch_moved(2, Vector2D::new(60., 60.));
        assert_eq!(tracker.position(), Vector2D::new(5., 5.));

        tracker.touch_moved(1, Vector2D::new(7., 8.));
        assert_eq!(tracker.position(), Vector2D::new(7., 8.));

        tracker.touch_ended(1);
        assert!(tracker.touch_started(2, Vector2D::new(1., 2.)));
        assert_eq!(tracker.position(), Vector2D::new(1., 2.));
    }

    #[test]
    fn mouse_and_touch_share_the_position() {
        let mut tracker = PointerTracker::new();
        tracker.touch_started(3, Vector2D::new(1., 1.));
        tracker.pointer_moved(Vector2D::new(9., 9.));
        assert_eq!(tracker.position(), Vector2D::new(9., 9.));
    }
}
