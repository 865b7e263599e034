//! Demo pilot for attract mode and the headless host
//!
//! Steers toward the base with a simple proportional controller: lean toward
//! the pad to build horizontal speed, keep only a shallow lean for the final
//! drift correction near the ground and fire the engine whenever the craft
//! sinks faster than the target descent rate. Hazards are ignored.

use super::game::{FrameInput, Game};

/// Angle error tolerated before turning (radians)
const ANGLE_DEADBAND: f32 = 0.05;
/// Steepest lean the pilot allows (radians)
const MAX_LEAN: f32 = 0.4;
/// Below this height above the pad the craft only leans slightly
const FLARE_HEIGHT: f32 = 25.0;
/// Steepest lean during the flare (radians)
const FLARE_LEAN: f32 = 0.15;
const MAX_HORIZONTAL_SPEED: f32 = 20.0;
/// Horizontal speed limit during the flare
const FLARE_HORIZONTAL_SPEED: f32 = 4.0;

/// Pick the buttons for this frame
pub fn autopilot(game: &Game) -> FrameInput {
    if game.outcome().landed {
        return FrameInput::default();
    }
    let Some(body) = game.space.body(game.state.player.body) else {
        return FrameInput::default();
    };
    let base = game.base_pose().position;
    let to_base = base - body.position;
    let height = -to_base.y;

    let (max_speed, max_lean) = if height < FLARE_HEIGHT {
        (FLARE_HORIZONTAL_SPEED, FLARE_LEAN)
    } else {
        (MAX_HORIZONTAL_SPEED, MAX_LEAN)
    };
    let wanted_vx = (to_base.x * 0.5).clamp(-max_speed, max_speed);
    // Positive angle tilts the nozzle right, pushing the craft left
    let lean = (-(wanted_vx - body.velocity.x) * 0.03).clamp(-max_lean, max_lean);

    let wanted_vy = -(height * 0.3).clamp(2.0, 15.0);
    FrameInput {
        left: body.angle < lean - ANGLE_DEADBAND,
        right: body.angle > lean + ANGLE_DEADBAND,
        up: body.velocity.y < wanted_vy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_idle_once_landed() {
        let mut game = Game::new(5);
        game.state.outcome.crash();
        assert_eq!(autopilot(&game), FrameInput::default());
    }

    #[test]
    fn test_brakes_fast_descent() {
        let mut game = Game::new(5);
        let body = game.space.body_mut(game.state.player.body).expect("alive");
        body.velocity = Vec2::new(0.0, -40.0);
        assert!(autopilot(&game).up);
    }

    #[test]
    fn test_leans_toward_base() {
        let mut game = Game::new(5);
        let base = game.base_pose().position;
        let body = game.space.body_mut(game.state.player.body).expect("alive");
        body.position = base + Vec2::new(-150.0, 80.0);
        body.velocity = Vec2::ZERO;
        body.angle = 0.0;
        let input = autopilot(&game);
        // Base to the right: rotate clockwise
        assert!(input.right && !input.left);

        let body = game.space.body_mut(game.state.player.body).expect("alive");
        body.position = base + Vec2::new(150.0, 80.0);
        let input = autopilot(&game);
        assert!(input.left && !input.right);
    }

    #[test]
    fn test_only_shallow_lean_near_the_pad() {
        let mut game = Game::new(5);
        let base = game.base_pose().position;
        let body = game.space.body_mut(game.state.player.body).expect("alive");
        body.position = base + Vec2::new(40.0, 10.0);
        body.velocity = Vec2::ZERO;
        body.angle = 0.3;
        let input = autopilot(&game);
        assert!(input.right && !input.left);
    }

    #[test]
    fn test_corrects_drift_during_flare() {
        let mut game = Game::new(5);
        let base = game.base_pose().position;
        let body = game.space.body_mut(game.state.player.body).expect("alive");
        // Pad to the right and drifting left
        body.position = base + Vec2::new(-10.0, 10.0);
        body.velocity = Vec2::new(-3.0, 0.0);
        body.angle = 0.0;
        let input = autopilot(&game);
        assert!(input.right && !input.left);

        // Pad to the left and drifting right
        let body = game.space.body_mut(game.state.player.body).expect("alive");
        body.position = base + Vec2::new(10.0, 10.0);
        body.velocity = Vec2::new(3.0, 0.0);
        let input = autopilot(&game);
        assert!(input.left && !input.right);

        // Centered and still: stay upright
        let body = game.space.body_mut(game.state.player.body).expect("alive");
        body.position = base + Vec2::new(0.0, 10.0);
        body.velocity = Vec2::ZERO;
        let input = autopilot(&game);
        assert!(!input.left && !input.right);
    }
}
