//! Container overflow check

use super::state::{BallView, Container};

/// Fires when any live ball's top edge reaches the container top
#[derive(Debug, Clone, Copy)]
pub struct GameOverDetector {
    epsilon: f32,
}

impl GameOverDetector {
    pub fn new(epsilon: f32) -> Self {
        Self { epsilon }
    }

    /// True if the container has overflowed.
    ///
    /// Uses the top of each ball (`y - radius`), not its centre.
    pub fn evaluate(&self, live_balls: &[BallView], container: &Container) -> bool {
        let limit = container.top() + self.epsilon;
        live_balls.iter().any(|b| b.pos.y - b.radius < limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn ball(y: f32, radius: f32) -> BallView {
        BallView {
            id: 1,
            pos: Vec2::new(100.0, y),
            rank: 0,
            radius,
            visual_key: String::new(),
        }
    }

    #[test]
    fn test_top_edge_at_boundary_overflows() {
        let c = Container::new(0.0, 50.0, 400.0, 600.0);
        let detector = GameOverDetector::new(0.0);
        // Exactly at the top counts once epsilon is applied
        assert!(!detector.evaluate(&[ball(66.0, 16.0)], &c));
        let detector = GameOverDetector::new(2.0);
        assert!(detector.evaluate(&[ball(66.0, 16.0)], &c));
        assert!(detector.evaluate(&[ball(40.0, 16.0)], &c));
    }

    #[test]
    fn test_ball_below_top_is_safe() {
        let c = Container::new(0.0, 50.0, 400.0, 600.0);
        let detector = GameOverDetector::new(2.0);
        // Drop height: top + r + 8
        assert!(!detector.evaluate(&[ball(50.0 + 16.0 + 8.0, 16.0)], &c));
        assert!(!detector.evaluate(&[], &c));
    }

    #[test]
    fn test_any_single_ball_triggers() {
        let c = Container::new(0.0, 50.0, 400.0, 600.0);
        let detector = GameOverDetector::new(2.0);
        let balls = [ball(500.0, 20.0), ball(300.0, 20.0), ball(60.0, 20.0)];
        assert!(detector.evaluate(&balls, &c));
    }
}
