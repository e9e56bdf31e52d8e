//! Bubble World headless demo
//!
//! Drops a handful of bubbles into a phone-sized container, tilts the
//! "device", drags the container around and logs a frame every second.
//!
//! Usage: `bubble-world [tuning.json]`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bubble_world::sim::{Bubble, Frame};
use bubble_world::{BubbleWorld, SimError, Tuning};

const CONTAINER_WIDTH: f32 = 1080.0;
const CONTAINER_HEIGHT: f32 = 1920.0;
const BUBBLE_COUNT: u32 = 10;
const BUBBLE_STAGGER: Duration = Duration::from_millis(50);
const RUN_TIME: Duration = Duration::from_secs(6);

fn main() {
    env_logger::init();
    log::info!("Bubble World (headless) starting...");

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), SimError> {
    let tuning = match std::env::args().nth(1) {
        Some(path) => Tuning::from_file(path)?,
        None => Tuning::default(),
    };
    let log_every = tuning.tick_rate.round().max(1.0) as u64;

    let frames = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&frames);
    let world = BubbleWorld::new(tuning, move |frame: &Frame| {
        counter.fetch_add(1, Ordering::Relaxed);
        if frame.tick % log_every == 0 {
            match serde_json::to_string(frame) {
                Ok(json) => log::info!("{}", json),
                Err(e) => log::warn!("Frame {} not serializable: {}", frame.tick, e),
            }
        }
    })?;

    world.init_for_container(CONTAINER_WIDTH, CONTAINER_HEIGHT)?;
    world.start()?;

    let bubbles = (0..BUBBLE_COUNT)
        .map(|i| Bubble::new(i, 40.0 + 8.0 * (i % 5) as f32))
        .collect::<Result<Vec<_>, _>>()?;
    let spawner = world.add_bubbles(BUBBLE_STAGGER, bubbles)?;

    // Upright device
    world.update_gravity(0.0, 9.81);
    thread::sleep(Duration::from_secs(2));

    // Tilt left, then shake
    world.update_gravity(-6.0, 7.5);
    thread::sleep(Duration::from_secs(1));
    world.update_linear_acceleration(3.0, -2.0);
    thread::sleep(Duration::from_millis(250));
    world.update_linear_acceleration(0.0, 0.0);
    world.update_gravity(0.0, 9.81);

    // Drag the container up and back down, one step per tick
    let center_x = CONTAINER_WIDTH * 0.5;
    let tick = world.with_world(|w| w.tuning().tick_interval());
    for step in (0..60).chain((0..60).rev()) {
        world.move_barrier(center_x, -5.0 * step as f32)?;
        thread::sleep(tick);
    }

    match spawner.join() {
        Ok(results) => {
            let failed = results.iter().filter(|r| r.is_err()).count();
            log::info!("Spawned {} bubbles ({} failed)", results.len(), failed);
        }
        Err(_) => log::warn!("Bubble spawner panicked"),
    }

    let remaining = RUN_TIME.saturating_sub(Duration::from_millis(3250) + tick * 120);
    thread::sleep(remaining);
    world.cancel();

    let frame = world.frame();
    log::info!(
        "Stopped after {} ticks ({} callbacks), {} bubbles",
        frame.tick,
        frames.load(Ordering::Relaxed),
        frame.bubbles.len()
    );
    Ok(())
}
