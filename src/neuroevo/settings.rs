//! Genetic algorithm and topology settings, loadable from RON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{EvolutionError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Input layer, hidden layers, output layer.
    pub layer_sizes: Vec<usize>,
    pub population_size: usize,
    /// Share of the population copied unchanged into the next generation.
    pub elitism_percent: f64,
    /// Share of the population (the best) eligible as crossover parents.
    pub parent_percent: f64,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
    /// Largest perturbation a single mutation can apply.
    pub mutation_strength: f64,
    /// Seeds the engine's random stream when set.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            layer_sizes: vec![7, 5, 1],
            population_size: 50,
            elitism_percent: 0.1,
            parent_percent: 0.5,
            mutation_rate: 0.01,
            mutation_strength: 0.1,
            seed: None,
        }
    }
}

impl Settings {
    /// Defaults with a single hidden layer of `n_hidden` neurons.
    pub fn standard(n_inputs: usize, n_hidden: usize, n_outputs: usize) -> Settings {
        Settings {
            layer_sizes: vec![n_inputs, n_hidden, n_outputs],
            ..Settings::default()
        }
    }

    pub fn from_ron_str(text: &str) -> Result<Settings> {
        let settings: Settings = ron::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let text = std::fs::read_to_string(path)?;
        Settings::from_ron_str(&text)
    }

    pub fn n_inputs(&self) -> usize {
        self.layer_sizes.first().copied().unwrap_or(0)
    }

    pub fn elitism_count(&self) -> usize {
        (self.population_size as f64 * self.elitism_percent).floor() as usize
    }

    pub fn parent_pool_size(&self) -> usize {
        (self.population_size as f64 * self.parent_percent).floor() as usize
    }

    /// Rejects out-of-range parameters instead of clamping them.
    pub fn validate(&self) -> Result<()> {
        if self.layer_sizes.len() < 2 || self.layer_sizes.contains(&0) {
            return Err(EvolutionError::InvalidTopology(self.layer_sizes.clone()));
        }
        if self.population_size == 0 {
            return Err(EvolutionError::InvalidSettings("population_size must be positive".into()));
        }

        let fractions = [
            ("elitism_percent", self.elitism_percent),
            ("parent_percent", self.parent_percent),
            ("mutation_rate", self.mutation_rate),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(EvolutionError::InvalidSettings(format!("{name} must lie in [0, 1], got {value}")));
            }
        }

        if !self.mutation_strength.is_finite() || self.mutation_strength < 0.0 {
            return Err(EvolutionError::InvalidSettings(format!(
                "mutation_strength must be finite and non-negative, got {}",
                self.mutation_strength
            )));
        }

        if self.elitism_count() < self.population_size && self.parent_pool_size() == 0 {
            return Err(EvolutionError::EmptyParentPool);
        }

        Ok(())
    }
}
