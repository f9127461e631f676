mod pendulum;

use anyhow::Context;
use pendulum_evo::neuroevo::{engine::Engine, population::Arena, settings::Settings};

use crate::pendulum::PendulumArena;

const DT: f64 = 0.02;
const MAX_TICKS: usize = 3000;
const BEST_BRAIN_PATH: &str = "best_brain.ron";

/// Usage: `pendulum_evo [settings.ron] [generations]`
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut arena = PendulumArena::standard();
    let mut args = std::env::args().skip(1);

    let settings = match args.next() {
        Some(path) => Settings::load(&path).with_context(|| format!("loading settings from {path}"))?,
        None => Settings {
            seed: Some(2),
            ..Settings::standard(arena.input_size(), 5, 1)
        },
    };
    let generations: usize = match args.next() {
        Some(text) => text.parse().with_context(|| format!("invalid generation count {text:?}"))?,
        None => 30,
    };

    if settings.n_inputs() != arena.input_size() {
        log::warn!(
            "settings expect {} inputs but the arena senses {}, every agent will be excluded",
            settings.n_inputs(),
            arena.input_size()
        );
    }

    let mut engine = Engine::new(settings, arena.input_size())?;
    log::info!(
        "training {} agents with topology {:?} for {generations} generations",
        engine.settings().population_size,
        engine.settings().layer_sizes
    );
    for _ in 0..generations {
        let summary = engine.run_generation(&mut arena, DT, MAX_TICKS)?;
        println!(
            "gen: {}; best: {:.2}; avg: {:.2}",
            summary.generation, summary.best_fitness, summary.average_fitness
        );
    }

    if let Some(snapshot) = engine.best_snapshot() {
        snapshot.save(BEST_BRAIN_PATH).with_context(|| format!("saving {BEST_BRAIN_PATH}"))?;
        println!("{}", snapshot.to_mermaid());
    }
    Ok(())
}
