//! Collision handlers driving the landing state machine

use crate::physics::{Arbiter, CollisionHandler, CollisionType, HandlerTable, Space};

use super::state::{LanderState, Pose};

/// Craft touching the base: the first touch-down decides the round
pub struct Landing;

impl CollisionHandler<LanderState> for Landing {
    fn post_solve(&mut self, arbiter: &Arbiter, _space: &mut Space, state: &mut LanderState) {
        let first = !state.outcome.landed;
        let impulse = arbiter.total_impulse().length();
        state.outcome.touch_down(impulse < state.tuning.max_impulse);
        if first {
            log::info!(
                "Touch-down with impulse {impulse:.1}: {}",
                if state.outcome.victory { "soft" } else { "too hard" }
            );
        }
    }
}

/// Craft hitting the terrain
pub struct FloorCrash;

impl CollisionHandler<LanderState> for FloorCrash {
    fn begin(&mut self, _arbiter: &Arbiter, space: &mut Space, state: &mut LanderState) -> bool {
        state.crash_player(space, None);
        true
    }
}

/// Craft hit by a hazard; wreckage comes from the impact point
pub struct PlanetCrash;

impl CollisionHandler<LanderState> for PlanetCrash {
    fn post_solve(&mut self, arbiter: &Arbiter, space: &mut Space, state: &mut LanderState) {
        let origin = arbiter.contact_points().first().map(|c| c.point_b);
        state.crash_player(space, origin);
    }
}

/// Hazard reaching the base disappears
pub struct PlanetOnBase;

impl CollisionHandler<LanderState> for PlanetOnBase {
    fn post_solve(&mut self, arbiter: &Arbiter, space: &mut Space, state: &mut LanderState) {
        if !state.planets.is_empty() && arbiter.is_first_contact() {
            state.remove_planet(space, arbiter.shapes()[0]);
        }
    }
}

/// Hazard reaching the terrain breaks into debris
pub struct PlanetOnFloor;

impl CollisionHandler<LanderState> for PlanetOnFloor {
    fn post_solve(&mut self, arbiter: &Arbiter, space: &mut Space, state: &mut LanderState) {
        if state.planets.is_empty() || !arbiter.is_first_contact() {
            return;
        }
        let hazard = arbiter.shapes()[0];
        let pose = space
            .shape(hazard)
            .and_then(|s| space.body(s.body))
            .map(Pose::of);
        let ground = space.body(space.static_body()).map(Pose::of).unwrap_or_default();
        if let Some(pose) = pose {
            state.particles.emit_burst(
                space,
                state.tuning.debris_burst,
                state.tuning.debris_speed,
                ground.heading(),
                |rng| pose.engine_point(rng),
            );
        }
        state.remove_planet(space, hazard);
    }
}

/// The five handlers of a round
pub fn lander_handlers() -> HandlerTable<LanderState> {
    let mut table = HandlerTable::new();
    table.register(CollisionType::Player, CollisionType::Base, Landing);
    table.register(CollisionType::Player, CollisionType::Floor, FloorCrash);
    table.register(CollisionType::Player, CollisionType::Planet, PlanetCrash);
    table.register(CollisionType::Planet, CollisionType::Base, PlanetOnBase);
    table.register(CollisionType::Planet, CollisionType::Floor, PlanetOnFloor);
    table
}
