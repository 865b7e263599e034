//! Game controller: world setup, per-frame update and drawing

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::handlers::lander_handlers;
use super::particles::ParticleSystem;
use super::state::{Base, LanderState, Outcome, PLAYER_VERTS, Planet, Player, Pose, planet_color};
use super::terrain::Terrain;
use crate::consts::{DEFEAT_MESSAGE, FRAME_DT, HEIGHT, PARTICLE_GROUP, VICTORY_MESSAGE, WIDTH};
use crate::error::Result;
use crate::physics::{
    Aabb, Body, CollisionType, Geometry, HandlerTable, Shape, ShapeFilter, Space, moment_for_circle,
};
use crate::renderer::{Camera, Canvas, Color, FONT_WIDTH};
use crate::screen;
use crate::tuning::Tuning;

/// Buttons held during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Turn counter-clockwise
    pub left: bool,
    /// Turn clockwise
    pub right: bool,
    /// Fire the engine
    pub up: bool,
}

/// One round of the lander game
pub struct Game {
    pub space: Space,
    handlers: HandlerTable<LanderState>,
    pub state: LanderState,
    pub camera: Camera,
    seed: u64,
    frame: u64,
}

impl Game {
    /// New round with the default tuning
    pub fn new(seed: u64) -> Self {
        Self::build(seed, Tuning::default())
    }

    /// New round with custom tuning, rejected when invalid
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Result<Self> {
        tuning.validate()?;
        Ok(Self::build(seed, tuning))
    }

    fn build(seed: u64, tuning: Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut space = Space::new(tuning.gravity).with_friction(tuning.friction);
        let start = screen() / 2.0;

        let player_body = Body::new_dynamic(tuning.player_mass, tuning.player_moment).with_position(start);
        let (body, shape) = space.add_body_with_shape(player_body, |b| {
            Shape::new(b, Geometry::poly(&PLAYER_VERTS))
                .with_collision_type(CollisionType::Player)
                .with_filter(ShapeFilter::group(PARTICLE_GROUP))
                .with_friction(tuning.friction)
        });
        let player = Player {
            body,
            shape,
            pose: Pose {
                position: start,
                angle: 0.0,
            },
        };

        let particles = ParticleSystem::new(rng.random(), &tuning);

        let base_pos = start + Vec2::new(rng.random_range(-WIDTH..=WIDTH), -tuning.base_drop * HEIGHT);
        let size = tuning.base_size;
        let (body, shape) = space.add_body_with_shape(Body::new_static().with_position(base_pos), |b| {
            Shape::new(b, Geometry::boxed(size.x, size.y))
                .with_collision_type(CollisionType::Base)
                .with_friction(tuning.friction)
        });
        let base = Base { body, shape };
        let footprint = Aabb::from_points(&[base_pos - size / 2.0, base_pos + size / 2.0], 0.0);
        let terrain = Terrain::generate(&mut space, &footprint, &tuning, &mut rng);

        let mut camera = Camera::new(screen());
        camera.follow(start);

        log::info!(
            "New round (seed {seed}): base at ({:.1}, {:.1}), {} terrain segments",
            base_pos.x,
            base_pos.y,
            terrain.segment_count()
        );

        Self {
            space,
            handlers: lander_handlers(),
            state: LanderState {
                tuning,
                player,
                base,
                terrain,
                planets: Vec::new(),
                outcome: Outcome::default(),
                particles,
                rng,
            },
            camera,
            seed,
            frame: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Frames simulated so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn outcome(&self) -> Outcome {
        self.state.outcome
    }

    pub fn tuning(&self) -> &Tuning {
        &self.state.tuning
    }

    /// Last known pose of the craft
    pub fn player_pose(&self) -> Pose {
        self.state.player.pose
    }

    pub fn player_alive(&self) -> bool {
        self.space.contains_body(self.state.player.body)
    }

    pub fn planets(&self) -> &[Planet] {
        &self.state.planets
    }

    pub fn particle_count(&self) -> usize {
        self.state.particles.len()
    }

    /// Pose of the landing pad
    pub fn base_pose(&self) -> Pose {
        self.space
            .body(self.state.base.body)
            .map(Pose::of)
            .unwrap_or_default()
    }

    /// Terminal message once the round is decided
    pub fn status_message(&self) -> Option<&'static str> {
        let outcome = self.state.outcome;
        match (outcome.landed, outcome.victory) {
            (false, _) => None,
            (true, true) => Some(VICTORY_MESSAGE),
            (true, false) => Some(DEFEAT_MESSAGE),
        }
    }

    /// Advance one frame
    pub fn update(&mut self, input: &FrameInput) {
        if !self.state.outcome.landed {
            self.steer(input);
        }

        self.spawn_planets();
        self.state.particles.update(&mut self.space);
        let sub_steps = self.state.tuning.sub_steps;
        self.space.step(FRAME_DT, sub_steps, &mut self.handlers, &mut self.state);

        if let Some(body) = self.space.body(self.state.player.body) {
            self.state.player.pose = Pose::of(body);
        }
        self.camera.follow(self.state.player.pose.position);
        self.frame += 1;
    }

    fn steer(&mut self, input: &FrameInput) {
        let tuning = &self.state.tuning;
        let turn = tuning.angular_speed.to_radians();
        let thrust = tuning.thrust() * tuning.thrust_multiplier;
        let (burst, speed) = (tuning.exhaust_burst, tuning.exhaust_speed);

        let Some(body) = self.space.body_mut(self.state.player.body) else {
            return;
        };
        body.angular_velocity = if input.left {
            turn
        } else if input.right {
            -turn
        } else {
            0.0
        };
        if !input.up {
            return;
        }
        body.apply_force_at_local_point(thrust, Vec2::ZERO);
        let pose = Pose::of(body);
        self.state
            .particles
            .emit_burst(&mut self.space, burst, speed, pose.heading(), |rng| pose.engine_point(rng));
    }

    /// Roll for a new hazard above the craft
    pub fn spawn_planets(&mut self) -> bool {
        let tuning = &self.state.tuning;
        let rng = &mut self.state.rng;
        if !rng.random_bool(tuning.planet_spawn_chance) {
            return false;
        }
        let dx = rng.random_range(-WIDTH..=WIDTH);
        let radius = rng.random_range(tuning.planet_min_radius..=tuning.planet_max_radius);
        let (r, mass) = (radius as f32, 2.0 * radius as f32);
        let color = planet_color(radius);
        let position = self.state.player.pose.position + Vec2::new(dx, HEIGHT);

        let body = Body::new_dynamic(mass, moment_for_circle(mass, 0.0, r, Vec2::ZERO)).with_position(position);
        let friction = tuning.friction;
        let (body, shape) = self.space.add_body_with_shape(body, |b| {
            Shape::new(b, Geometry::Circle { offset: Vec2::ZERO, radius: r })
                .with_collision_type(CollisionType::Planet)
                .with_friction(friction)
                .with_color(color)
        });
        self.state.planets.push(Planet {
            body,
            shape,
            radius,
            color,
        });
        log::debug!(
            "Hazard spawned: radius {radius} at ({:.1}, {:.1})",
            position.x,
            position.y
        );
        true
    }

    /// Render the frame; clears the hazards once the round is decided
    pub fn draw(&mut self, canvas: &mut impl Canvas) {
        canvas.cls(Color::Black);
        let camera = self.camera;
        camera.draw_body(canvas, &self.space, self.space.static_body(), Color::White);
        camera.draw_body(canvas, &self.space, self.state.base.body, Color::Orange);
        self.state.particles.draw(&camera, canvas, &self.space);
        self.draw_player(canvas);

        if self.state.outcome.landed {
            self.state.clear_planets(&mut self.space);
        } else {
            for planet in &self.state.planets {
                camera.draw_shape(canvas, &self.space, planet.shape, planet.color);
            }
        }

        if let Some(msg) = self.status_message() {
            let x = WIDTH / 2.0 - msg.len() as f32 * FONT_WIDTH / 2.0;
            let y = (HEIGHT / 2.0).floor() - 20.0;
            canvas.text(Vec2::new(x, y), msg, Color::Red);
        }
    }

    fn draw_player(&self, canvas: &mut impl Canvas) {
        if self.space.contains_shape(self.state.player.shape) {
            self.camera
                .draw_shape(canvas, &self.space, self.state.player.shape, Color::Pink);
        } else {
            let pose = self.state.player.pose;
            let verts = PLAYER_VERTS.map(|v| pose.local_to_world(v));
            self.camera.poly(canvas, &verts, Color::Pink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Arbiter, ContactPoint, Manifold, ShapeHandle};
    use crate::renderer::{DrawCommand, DrawList};

    const SEED: u64 = 12345;

    fn arbiter(shapes: [ShapeHandle; 2], first: bool) -> Arbiter {
        let manifold = Manifold {
            normal: Vec2::Y,
            points: vec![ContactPoint {
                point_a: Vec2::new(40.0, 60.0),
                point_b: Vec2::new(40.0, 59.0),
                depth: 1.0,
            }],
        };
        Arbiter::new(shapes, manifold, first)
    }

    fn post_solve(game: &mut Game, types: (CollisionType, CollisionType), arbiter: &Arbiter) {
        game.handlers
            .post_solve(arbiter, types, &mut game.space, &mut game.state);
    }

    fn land_with_impulse(game: &mut Game, impulse: f32) {
        let shapes = [game.state.player.shape, game.state.base.shape];
        let arb = arbiter(shapes, true).with_normal_impulse(impulse);
        post_solve(game, (CollisionType::Player, CollisionType::Base), &arb);
    }

    /// Drop a tracked hazard at `position`
    fn spawn_at(game: &mut Game, position: Vec2) -> Planet {
        while !game.spawn_planets() {}
        let planet = *game.planets().last().expect("just spawned");
        game.space.body_mut(planet.body).expect("hazard body").position = position;
        planet
    }

    #[test]
    fn test_new_game_setup() {
        let game = Game::new(SEED);
        assert_eq!(game.outcome(), Outcome::default());
        assert_eq!(game.status_message(), None);
        assert_eq!(game.state.terrain.segment_count(), 84);
        assert_eq!(game.handlers.len(), 5);
        assert!(game.player_alive());
        assert_eq!(game.player_pose().position, Vec2::new(128.0, 98.0));
        let base = game.base_pose().position;
        assert!((base.y - (98.0 - 0.45 * 196.0)).abs() < 1e-3);
        assert!((base.x - 128.0).abs() <= 256.0);
        // Terrain hangs off the base's bottom corners
        assert!((game.state.terrain.right.points[0] - (base + Vec2::new(12.5, -2.5))).length() < 1e-3);
        assert!((game.state.terrain.left.points[0] - (base + Vec2::new(-12.5, -2.5))).length() < 1e-3);
    }

    #[test]
    fn test_same_seed_same_world() {
        let a = Game::new(99);
        let b = Game::new(99);
        assert_eq!(a.base_pose(), b.base_pose());
        assert_eq!(a.state.terrain.left.points, b.state.terrain.left.points);
        assert_eq!(a.state.terrain.right.points, b.state.terrain.right.points);
    }

    #[test]
    fn test_with_tuning_rejects_invalid() {
        let tuning = Tuning {
            sub_steps: 0,
            ..Tuning::default()
        };
        assert!(Game::with_tuning(1, tuning).is_err());
        let game = Game::with_tuning(1, Tuning { floor_n: 5, ..Tuning::default() }).expect("valid");
        assert_eq!(game.state.terrain.segment_count(), 10);
    }

    #[test]
    fn test_soft_landing_wins() {
        let mut game = Game::new(SEED);
        land_with_impulse(&mut game, 10.0);
        assert_eq!(game.outcome(), Outcome { landed: true, victory: true });
        assert_eq!(game.status_message(), Some("PARABENS!"));
    }

    #[test]
    fn test_hard_landing_loses() {
        let mut game = Game::new(SEED);
        land_with_impulse(&mut game, 50.0);
        assert_eq!(game.outcome(), Outcome { landed: true, victory: false });
        assert_eq!(game.status_message(), Some("PERDEU :("));
    }

    #[test]
    fn test_impulse_threshold_is_strict() {
        let mut game = Game::new(SEED);
        land_with_impulse(&mut game, 30.0);
        assert!(!game.outcome().victory);
    }

    #[test]
    fn test_first_touch_down_decides() {
        let mut game = Game::new(SEED);
        land_with_impulse(&mut game, 10.0);
        land_with_impulse(&mut game, 50.0);
        assert_eq!(game.outcome(), Outcome { landed: true, victory: true });
    }

    #[test]
    fn test_floor_crash() {
        let mut game = Game::new(SEED);
        let floor = game.state.terrain.right.shapes[0];
        let arb = arbiter([game.state.player.shape, floor], true);
        let before = game.particle_count();

        let accepted = game.handlers.begin(
            &arb,
            (CollisionType::Player, CollisionType::Floor),
            &mut game.space,
            &mut game.state,
        );

        assert!(accepted);
        assert_eq!(game.outcome(), Outcome { landed: true, victory: false });
        assert!(!game.player_alive());
        assert!(!game.space.contains_shape(game.state.player.shape));
        assert_eq!(game.particle_count(), before + 200);
    }

    #[test]
    fn test_planet_crash_after_landing_still_loses() {
        let mut game = Game::new(SEED);
        land_with_impulse(&mut game, 10.0);
        let planet = spawn_at(&mut game, Vec2::new(40.0, 70.0));
        let arb = arbiter([game.state.player.shape, planet.shape], false);
        post_solve(&mut game, (CollisionType::Player, CollisionType::Planet), &arb);

        assert_eq!(game.outcome(), Outcome { landed: true, victory: false });
        assert!(!game.player_alive());
        assert_eq!(game.particle_count(), 200);
        // Wreckage starts at the impact point
        for p in game.state.particles.particles() {
            let body = game.space.body(p.body).expect("particle body");
            assert_eq!(body.position, Vec2::new(40.0, 59.0));
        }
    }

    #[test]
    fn test_planet_on_base_removal() {
        let mut game = Game::new(SEED);
        let types = (CollisionType::Planet, CollisionType::Base);

        // Nothing tracked: nothing removed
        let stray = game.space.add_body_with_shape(Body::new_dynamic(1.0, 1.0), |b| {
            Shape::new(b, Geometry::Circle { offset: Vec2::ZERO, radius: 1.0 })
                .with_collision_type(CollisionType::Planet)
        });
        let arb = arbiter([stray.1, game.state.base.shape], true);
        post_solve(&mut game, types, &arb);
        assert!(game.space.contains_shape(stray.1));

        let a = spawn_at(&mut game, Vec2::new(0.0, 500.0));
        let b = spawn_at(&mut game, Vec2::new(50.0, 500.0));

        // Only the first contact counts
        let arb = arbiter([a.shape, game.state.base.shape], false);
        post_solve(&mut game, types, &arb);
        assert_eq!(game.planets().len(), 2);

        let arb = arbiter([a.shape, game.state.base.shape], true);
        post_solve(&mut game, types, &arb);
        assert_eq!(game.planets(), &[b]);
        assert!(!game.space.contains_shape(a.shape));
        assert!(!game.space.contains_body(a.body));
        assert!(game.space.contains_shape(b.shape));
        assert_eq!(game.particle_count(), 0);
    }

    #[test]
    fn test_planet_on_floor_breaks_into_debris() {
        let mut game = Game::new(SEED);
        let planet = spawn_at(&mut game, Vec2::new(300.0, 20.0));
        let floor = game.state.terrain.right.shapes[3];
        let arb = arbiter([planet.shape, floor], true);
        post_solve(&mut game, (CollisionType::Planet, CollisionType::Floor), &arb);

        assert!(game.planets().is_empty());
        assert!(!game.space.contains_body(planet.body));
        assert_eq!(game.particle_count(), 20);
        for p in game.state.particles.particles() {
            let body = game.space.body(p.body).expect("debris body");
            // Thrown downward from just below the hazard's center
            assert!(body.velocity.y <= -100.0);
            assert!((body.position.y - 17.0).abs() < 1e-4);
        }
        assert_eq!(game.outcome(), Outcome::default());
    }

    #[test]
    fn test_planet_on_floor_needs_tracked_hazard_and_first_contact() {
        let mut game = Game::new(SEED);
        let types = (CollisionType::Planet, CollisionType::Floor);
        let floor = game.state.terrain.left.shapes[2];

        // Nothing tracked: the shape stays and no debris flies
        let (_, stray) = game.space.add_body_with_shape(Body::new_dynamic(1.0, 1.0), |b| {
            Shape::new(b, Geometry::Circle { offset: Vec2::ZERO, radius: 1.0 })
                .with_collision_type(CollisionType::Planet)
        });
        let arb = arbiter([stray, floor], true);
        post_solve(&mut game, types, &arb);
        assert!(game.space.contains_shape(stray));
        assert_eq!(game.particle_count(), 0);

        // Resting contact after the first one: ignored
        let planet = spawn_at(&mut game, Vec2::new(-300.0, 20.0));
        let arb = arbiter([planet.shape, floor], false);
        post_solve(&mut game, types, &arb);
        assert_eq!(game.planets(), &[planet]);
        assert!(game.space.contains_body(planet.body));
        assert_eq!(game.particle_count(), 0);
    }

    #[test]
    fn test_spawn_rate_converges() {
        let mut game = Game::new(7);
        let n = 8000;
        let spawned = (0..n).filter(|_| game.spawn_planets()).count();
        let rate = spawned as f64 / n as f64;
        assert!((rate - 0.125).abs() < 0.015, "spawn rate {rate}");
        assert_eq!(game.planets().len(), spawned);
        for planet in game.planets() {
            assert!((1..=12).contains(&planet.radius));
            assert_eq!(planet.color, planet_color(planet.radius));
            let body = game.space.body(planet.body).expect("hazard body");
            assert_eq!(body.mass, 2.0 * planet.radius as f32);
            assert!((body.position.y - (98.0 + 196.0)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_steering() {
        let mut game = Game::new(SEED);
        let turn = std::f32::consts::PI;
        let body = game.state.player.body;

        game.update(&FrameInput { left: true, ..Default::default() });
        assert!((game.space.body(body).expect("alive").angular_velocity - turn).abs() < 1e-4);

        game.update(&FrameInput { right: true, ..Default::default() });
        assert!((game.space.body(body).expect("alive").angular_velocity + turn).abs() < 1e-4);

        game.update(&FrameInput::default());
        assert_eq!(game.space.body(body).expect("alive").angular_velocity, 0.0);
        assert_eq!(game.frame(), 3);
    }

    #[test]
    fn test_thrust_climbs_and_emits_exhaust() {
        let mut game = Game::new(SEED);
        game.update(&FrameInput { up: true, ..Default::default() });
        assert_eq!(game.particle_count(), 2);
        // Force of 4 * 75 lasts one sub-step, gravity all four
        let v = game.space.body(game.state.player.body).expect("alive").velocity;
        let expected = 300.0 * FRAME_DT / 4.0 - 25.0 * FRAME_DT;
        assert!((v.y - expected).abs() < 1e-3);
        let on_screen = game.camera.to_screen(game.player_pose().position);
        assert!((on_screen - Vec2::new(128.0, 98.0)).length() < 1e-3);
    }

    #[test]
    fn test_input_ignored_after_landing() {
        let mut game = Game::new(SEED);
        land_with_impulse(&mut game, 10.0);
        game.update(&FrameInput { up: true, left: true, right: false });
        let body = game.space.body(game.state.player.body).expect("alive");
        assert_eq!(body.angular_velocity, 0.0);
        assert_eq!(game.particle_count(), 0);
    }

    #[test]
    fn test_draw_status_only_when_landed() {
        let mut game = Game::new(SEED);
        let mut canvas = DrawList::new(256, 196);
        game.draw(&mut canvas);
        assert_eq!(canvas.texts().count(), 0);
        assert_eq!(canvas.commands[0], DrawCommand::Cls(Color::Black));
        assert!(canvas.count_color(Color::Pink) > 0);
        assert!(canvas.count_color(Color::Orange) > 0);

        land_with_impulse(&mut game, 10.0);
        canvas.clear();
        game.draw(&mut canvas);
        let text = canvas.commands.iter().find_map(|c| match c {
            DrawCommand::Text { pos, text, color } => Some((*pos, text.clone(), *color)),
            _ => None,
        });
        let (pos, text, color) = text.expect("status text drawn");
        assert_eq!(text, "PARABENS!");
        assert_eq!(color, Color::Red);
        assert_eq!(pos, Vec2::new(128.0 - 9.0 * 2.0, 78.0));
    }

    #[test]
    fn test_draw_clears_planets_after_landing() {
        let mut game = Game::new(SEED);
        let a = spawn_at(&mut game, Vec2::new(0.0, 500.0));
        let mut canvas = DrawList::new(256, 196);
        game.draw(&mut canvas);
        assert_eq!(game.planets().len(), 1);

        land_with_impulse(&mut game, 50.0);
        game.draw(&mut canvas);
        assert!(game.planets().is_empty());
        assert!(!game.space.contains_body(a.body));
    }

    #[test]
    fn test_wreck_still_drawn_after_crash() {
        let mut game = Game::new(SEED);
        let floor = game.state.terrain.left.shapes[0];
        let arb = arbiter([game.state.player.shape, floor], true);
        game.handlers.begin(
            &arb,
            (CollisionType::Player, CollisionType::Floor),
            &mut game.space,
            &mut game.state,
        );
        let mut canvas = DrawList::new(256, 196);
        game.draw(&mut canvas);
        assert!(canvas.count_color(Color::Pink) > 0);
        assert_eq!(canvas.texts().collect::<Vec<_>>(), vec!["PERDEU :("]);
    }

    #[test]
    fn test_free_fall_ends_the_round() {
        let mut game = Game::new(SEED);
        for _ in 0..300 {
            game.update(&FrameInput::default());
            if game.outcome().landed {
                break;
            }
        }
        assert_eq!(game.outcome(), Outcome { landed: true, victory: false });
        assert_eq!(game.status_message(), Some("PERDEU :("));
    }

    #[test]
    fn test_gentle_drop_on_base_wins() {
        let mut game = Game::new(SEED);
        let base = game.base_pose().position;
        let body = game
            .space
            .body_mut(game.state.player.body)
            .expect("alive");
        // Nozzle half a unit above the pad
        body.position = base + Vec2::new(0.0, 2.5 + 3.0 + 0.5);
        body.velocity = Vec2::ZERO;
        body.angle = 0.0;

        for _ in 0..30 {
            game.update(&FrameInput::default());
        }
        assert_eq!(game.outcome(), Outcome { landed: true, victory: true });
        assert!(game.player_alive());
        let pose = game.player_pose();
        assert!((pose.position.y - (base.y + 5.5)).abs() < 0.5);
    }
}
