//! Moon Lander headless entry point
//!
//! Plays one round with the demo pilot at the fixed frame rate, rendering
//! every frame into a software framebuffer.
//!
//! Environment:
//! - `LANDER_CONFIG`: path to a JSON tuning file
//! - `LANDER_SEED`: round seed (defaults to the clock)
//! - `LANDER_FRAMES`: frame limit (defaults to two minutes)
//! - `LANDER_SNAPSHOT`: write the last frame to this PPM file
//! - `RUST_LOG`: log filter, e.g. `RUST_LOG=moon_lander=debug`

use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

use moon_lander::consts::{FPS, HEIGHT, WIDTH};
use moon_lander::error::Result;
use moon_lander::renderer::Framebuffer;
use moon_lander::sim::autopilot;
use moon_lander::{Game, Tuning};

/// Frames kept running after the round is decided, so the wreck settles
const LINGER_FRAMES: u64 = FPS as u64;

fn env_u64(key: &str) -> Option<u64> {
    let value = env::var(key).ok()?;
    match value.parse() {
        Ok(n) => Some(n),
        Err(e) => {
            log::warn!("Ignoring {key}={value}: {e}");
            None
        }
    }
}

fn run() -> Result<()> {
    let tuning = match env::var("LANDER_CONFIG") {
        Ok(path) => Tuning::load(path)?,
        Err(_) => Tuning::default(),
    };
    let seed = env_u64("LANDER_SEED").unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    });
    let max_frames = env_u64("LANDER_FRAMES").unwrap_or(FPS as u64 * 120);

    let mut game = Game::with_tuning(seed, tuning)?;
    let mut canvas = Framebuffer::new(WIDTH as u32, HEIGHT as u32);
    let mut decided_at = None;

    for frame in 0..max_frames {
        let input = autopilot(&game);
        game.update(&input);
        game.draw(&mut canvas);

        if game.outcome().landed {
            let decided = *decided_at.get_or_insert(frame);
            if frame - decided >= LINGER_FRAMES {
                break;
            }
        }
    }

    let outcome = game.outcome();
    let pose = game.player_pose();
    log::info!(
        "Round over after {} frames: landed={} victory={} at ({:.1}, {:.1})",
        game.frame(),
        outcome.landed,
        outcome.victory,
        pose.position.x,
        pose.position.y
    );
    println!(
        "seed {seed}: {}",
        game.status_message().unwrap_or("still flying")
    );

    if let Ok(path) = env::var("LANDER_SNAPSHOT") {
        canvas.save_ppm(path)?;
    }
    Ok(())
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Moon Lander (headless) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
