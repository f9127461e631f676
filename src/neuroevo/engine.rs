//! Generation lifecycle: spawn, tick, evolve.
//!
//! The driver owns the loop. It calls [`Engine::tick`] (or drives the
//! population itself) until no agent is alive, then [`Engine::evolve`].
//! [`Engine::run_generation`] does both for the common case.

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::{
    error::{EvolutionError, Result},
    network::Network,
    population::{AgentIndex, Arena, Population},
    settings::Settings,
    snapshot::NetworkSnapshot,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationSummary {
    pub generation: usize,
    pub best_fitness: f64,
    pub average_fitness: f64,
    pub participating: usize,
}

pub struct Engine<R: RngCore = Xoshiro256PlusPlus> {
    settings: Settings,
    rng: R,
    n_inputs: usize,
    population: Population,
    best_brain: Option<Network>,
    generation: usize,
}

impl Engine<Xoshiro256PlusPlus> {
    /// Seeds from `settings.seed`, or from OS entropy when unset.
    pub fn new(settings: Settings, n_inputs: usize) -> Result<Self> {
        let rng = match settings.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        Engine::with_rng(settings, n_inputs, rng)
    }
}

impl<R: RngCore> Engine<R> {
    /// `n_inputs` is the input length the driver will sense for each agent.
    pub fn with_rng(settings: Settings, n_inputs: usize, mut rng: R) -> Result<Self> {
        settings.validate()?;
        let population = Population::init(&mut rng, &settings, n_inputs)?;
        let best_brain = population.iter().find(|agent| agent.is_participating()).map(|agent| agent.brain().clone());
        log::info!("starting generation 1");

        Ok(Engine {
            settings,
            rng,
            n_inputs,
            population,
            best_brain,
            generation: 1,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    pub fn is_generation_alive(&self) -> bool {
        self.population.is_any_alive()
    }

    /// Best network of the last completed generation. Before the first
    /// evolve this is the first participating agent's network, or `None`
    /// when no agent participates.
    pub fn best_brain(&self) -> Option<&Network> {
        self.best_brain.as_ref()
    }

    pub fn best_snapshot(&self) -> Option<NetworkSnapshot> {
        self.best_brain.as_ref().map(NetworkSnapshot::from)
    }

    /// Evaluates every live agent once and feeds the outputs back to the
    /// arena. Returns how many agents are still alive.
    pub fn tick<A: Arena + Sync>(&mut self, arena: &mut A, dt: f64) -> Result<usize> {
        let all_outputs = self.population.activate_all(&*arena)?;
        for (i, outputs) in all_outputs.into_iter().enumerate() {
            if let Some(outputs) = outputs {
                let index = AgentIndex(i);
                let step = arena.act(index, &outputs, dt);
                let agent = &mut self.population[index];
                agent.reward(step.reward);
                if !step.alive {
                    agent.kill();
                }
            }
        }

        Ok(self.population.iter().filter(|agent| agent.is_alive()).count())
    }

    /// Ranks the finished generation, breeds its successor and spawns it.
    /// Every agent must be dead first, otherwise this fails with
    /// `GenerationInProgress` and leaves the population untouched.
    pub fn evolve(&mut self) -> Result<GenerationSummary> {
        let alive = self.population.iter().filter(|agent| agent.is_alive()).count();
        if alive > 0 {
            return Err(EvolutionError::GenerationInProgress { alive });
        }

        let ranked = self.population.ranked();
        let summary = GenerationSummary {
            generation: self.generation,
            best_fitness: ranked.first().map_or(0., |&i| self.population[i].fitness()),
            average_fitness: self.population.average_fitness(),
            participating: ranked.len(),
        };

        if let Some(&champion) = ranked.first() {
            self.best_brain = Some(self.population[champion].brain().clone());
            log::debug!("saved best brain of generation {}", self.generation);
        }
        log::info!(
            "generation {} complete: best fitness {:.2} | average fitness {:.2}",
            summary.generation,
            summary.best_fitness,
            summary.average_fitness
        );

        let brains = self.population.next_generation_brains(&mut self.rng, &self.settings)?;
        self.generation += 1;
        log::info!("starting generation {}", self.generation);
        self.population = Population::spawn(brains, self.n_inputs);

        Ok(summary)
    }

    /// Resets the arena, ticks until every agent is dead or `max_ticks` have
    /// passed, then evolves.
    pub fn run_generation<A: Arena + Sync>(&mut self, arena: &mut A, dt: f64, max_ticks: usize) -> Result<GenerationSummary> {
        arena.reset(self.population.len());
        let mut ticks = 0;
        while self.population.is_any_alive() && ticks < max_ticks {
            self.tick(arena, dt)?;
            ticks += 1;
        }

        if self.population.is_any_alive() {
            log::debug!("tick limit {max_ticks} reached, ending generation {}", self.generation);
            self.population.kill_all();
        }
        self.evolve()
    }
}
