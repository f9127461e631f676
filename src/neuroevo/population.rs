use std::ops::{Index, IndexMut};

use itertools::Itertools;
use rand::{Rng, RngCore};
use rayon::prelude::*;

use super::{error::{EvolutionError, Result}, network::{self, Network}, settings::Settings};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentIndex(pub usize);

/// Outcome of one agent's action during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub alive: bool,
    pub reward: f64,
}

/// The simulation side of training. Sensing must be callable from several
/// threads at once, acting happens serially.
pub trait Arena {
    /// Length of the input vector produced by `sense`.
    fn input_size(&self) -> usize;
    fn reset(&mut self, population_size: usize);
    fn sense(&self, agent: AgentIndex) -> Vec<f64>;
    fn act(&mut self, agent: AgentIndex, outputs: &[f64], dt: f64) -> Step;
}

#[derive(Clone, Debug)]
pub struct Agent {
    brain: Network,
    fitness: f64,
    alive: bool,
    participating: bool,
}

impl Agent {
    fn spawn(index: usize, brain: Network, n_inputs: usize) -> Agent {
        let participating = brain.n_inputs() == n_inputs;
        if !participating {
            log::error!(
                "agent {index}: expected {n_inputs} inputs but its network takes {}, excluding it",
                brain.n_inputs()
            );
        }

        Agent {
            brain,
            fitness: 0.,
            alive: participating,
            participating,
        }
    }

    pub fn brain(&self) -> &Network {
        &self.brain
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_participating(&self) -> bool {
        self.participating
    }

    /// Fitness only grows, negative rewards are ignored.
    pub fn reward(&mut self, amount: f64) {
        if self.participating && amount > 0. {
            self.fitness += amount;
        }
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    pub fn activate(&self, inputs: &[f64]) -> Result<Vec<f64>> {
        self.brain.feed_forward(inputs)
    }
}

/// The agents of one generation, in spawn order.
#[derive(Clone, Debug)]
pub struct Population {
    agents: Vec<Agent>,
}

impl Population {
    /// The i-th brain goes to the i-th agent.
    pub fn spawn(brains: Vec<Network>, n_inputs: usize) -> Population {
        let agents = brains
            .into_iter()
            .enumerate()
            .map(|(i, brain)| Agent::spawn(i, brain, n_inputs))
            .collect();
        Population { agents }
    }

    pub fn init<R: RngCore>(rng: &mut R, settings: &Settings, n_inputs: usize) -> Result<Population> {
        let brains: Vec<Network> = (0..settings.population_size)
            .map(|_| Network::new_random(rng, &settings.layer_sizes))
            .collect::<Result<_>>()?;
        log::info!("initialized population of {} with topology {:?}", brains.len(), settings.layer_sizes);
        Ok(Population::spawn(brains, n_inputs))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Agent> {
        self.agents.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Agent> {
        self.agents.iter_mut()
    }

    pub fn is_any_alive(&self) -> bool {
        self.agents.iter().any(|agent| agent.alive)
    }

    pub fn kill_all(&mut self) {
        for agent in self.iter_mut() {
            agent.kill();
        }
    }

    pub fn n_participating(&self) -> usize {
        self.agents.iter().filter(|agent| agent.participating).count()
    }

    /// Participating agents by descending fitness. Ties keep spawn order.
    pub fn ranked(&self) -> Vec<AgentIndex> {
        self.agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| agent.participating)
            .sorted_by(|(_, a), (_, b)| b.fitness.total_cmp(&a.fitness))
            .map(|(i, _)| AgentIndex(i))
            .collect()
    }

    pub fn average_fitness(&self) -> f64 {
        let n = self.n_participating();
        if n == 0 {
            return 0.;
        }
        let total: f64 = self.agents.iter().filter(|agent| agent.participating).map(|agent| agent.fitness).sum();
        total / n as f64
    }

    /// Runs every live agent's network on the inputs the arena senses for it.
    /// Dead agents yield `None`.
    pub fn activate_all<A: Arena + Sync>(&self, arena: &A) -> Result<Vec<Option<Vec<f64>>>> {
        self.agents
            .par_iter()
            .enumerate()
            .map(|(i, agent)| {
                if agent.alive {
                    let inputs = arena.sense(AgentIndex(i));
                    agent.activate(&inputs).map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect()
    }

    /// Elites first, in rank order, then mutated children of the parent pool
    /// until the population is full.
    pub fn next_generation_brains<R: RngCore>(&self, rng: &mut R, settings: &Settings) -> Result<Vec<Network>> {
        let n_brains = settings.population_size;
        let ranked = self.ranked();
        let mut brains = Vec::with_capacity(n_brains);

        brains.extend(
            ranked
                .iter()
                .take(settings.elitism_count().min(n_brains))
                .map(|&i| self[i].brain.clone()),
        );
        let n_elites = brains.len();

        let parent_pool = ranked.iter().take(settings.parent_pool_size()).map(|&i| &self[i].brain).collect_vec();
        if brains.len() < n_brains && parent_pool.is_empty() {
            return Err(EvolutionError::EmptyParentPool);
        }

        while brains.len() < n_brains {
            let parent_1 = parent_pool[rng.gen_range(0..parent_pool.len())];
            let parent_2 = parent_pool[rng.gen_range(0..parent_pool.len())];
            let mut child = network::cross_over(rng, parent_1, parent_2)?;
            child.mutate(rng, settings.mutation_rate, settings.mutation_strength);
            brains.push(child);
        }

        log::debug!("bred {} children from {} parents, kept {} elites", brains.len() - n_elites, parent_pool.len(), n_elites);
        Ok(brains)
    }
}

impl Index<AgentIndex> for Population {
    type Output = Agent;
    fn index(&self, index: AgentIndex) -> &Self::Output {
        &self.agents[index.0]
    }
}

impl IndexMut<AgentIndex> for Population {
    fn index_mut(&mut self, index: AgentIndex) -> &mut Self::Output {
        &mut self.agents[index.0]
    }
}
