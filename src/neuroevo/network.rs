use rand::{Rng, RngCore};
use rand_distr::{Distribution, Uniform};

use super::error::{EvolutionError, Result};

/// Connections from one layer into the next.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    n_inputs: usize,
    /// Row-major `[n_outputs][n_inputs]`, one row per destination neuron.
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl Layer {
    fn init<R: RngCore>(rng: &mut R, between: &Uniform<f64>, n_inputs: usize, n_outputs: usize) -> Layer {
        let biases = (0..n_outputs).map(|_| between.sample(rng)).collect();
        let weights = (0..n_inputs * n_outputs).map(|_| between.sample(rng)).collect();
        Layer { n_inputs, weights, biases }
    }

    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub fn n_outputs(&self) -> usize {
        self.biases.len()
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.weights.chunks_exact(self.n_inputs)
    }

    fn activate(&self, inputs: &[f64]) -> Vec<f64> {
        self.rows()
            .zip(self.biases.iter())
            .map(|(row, bias)| {
                let active_sum = row.iter().zip(inputs).fold(0., |acc, (w, x)| acc + w * x);
                (active_sum + bias).tanh()
            })
            .collect()
    }

    fn genes(&self) -> impl Iterator<Item = &f64> {
        self.biases.iter().chain(self.weights.iter())
    }

    fn genes_mut(&mut self) -> impl Iterator<Item = &mut f64> {
        self.biases.iter_mut().chain(self.weights.iter_mut())
    }
}

/// Fully connected feed-forward network with `tanh` activations.
///
/// Every weight and bias is a gene: the unit that crossover inherits and
/// mutation perturbs independently.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    layer_sizes: Vec<usize>,
    layers: Vec<Layer>,
}

fn check_topology(layer_sizes: &[usize]) -> Result<()> {
    if layer_sizes.len() < 2 || layer_sizes.contains(&0) {
        return Err(EvolutionError::InvalidTopology(layer_sizes.to_vec()));
    }
    Ok(())
}

impl Network {
    /// Every gene is drawn uniformly from `[-1, 1)`.
    pub fn new_random<R: RngCore>(rng: &mut R, layer_sizes: &[usize]) -> Result<Network> {
        check_topology(layer_sizes)?;
        let between = Uniform::from(-1.0..1.0);
        let layers = layer_sizes
            .windows(2)
            .map(|pair| Layer::init(rng, &between, pair[0], pair[1]))
            .collect();

        Ok(Network { layer_sizes: layer_sizes.to_vec(), layers })
    }

    /// Builds a network from explicit parameters.
    ///
    /// `weights[i][j][k]` connects neuron `k` of layer `i` to neuron `j` of
    /// layer `i + 1`; `biases[i]` belongs to layer `i + 1`.
    pub fn from_parts(layer_sizes: &[usize], weights: Vec<Vec<Vec<f64>>>, biases: Vec<Vec<f64>>) -> Result<Network> {
        check_topology(layer_sizes)?;
        let n_transitions = layer_sizes.len() - 1;
        if weights.len() != n_transitions || biases.len() != n_transitions {
            return Err(EvolutionError::TopologyMismatch {
                expected: layer_sizes.to_vec(),
                actual: weights.iter().map(|matrix| matrix.len()).collect(),
            });
        }

        let mut layers = Vec::with_capacity(n_transitions);
        for ((pair, matrix), layer_biases) in layer_sizes.windows(2).zip(weights).zip(biases) {
            let (n_inputs, n_outputs) = (pair[0], pair[1]);
            let shape_ok = matrix.len() == n_outputs
                && layer_biases.len() == n_outputs
                && matrix.iter().all(|row| row.len() == n_inputs);
            if !shape_ok {
                return Err(EvolutionError::TopologyMismatch {
                    expected: vec![n_inputs, n_outputs],
                    actual: vec![matrix.first().map_or(0, |row| row.len()), matrix.len()],
                });
            }
            layers.push(Layer {
                n_inputs,
                weights: matrix.into_iter().flatten().collect(),
                biases: layer_biases,
            });
        }

        Ok(Network { layer_sizes: layer_sizes.to_vec(), layers })
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn n_inputs(&self) -> usize {
        self.layer_sizes[0]
    }

    pub fn n_outputs(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    pub fn n_genes(&self) -> usize {
        self.layers.iter().map(|layer| layer.weights.len() + layer.biases.len()).sum()
    }

    /// Biases of every layer, then its weights, layer by layer.
    pub fn genes(&self) -> impl Iterator<Item = &f64> {
        self.layers.iter().flat_map(|layer| layer.genes())
    }

    fn genes_mut(&mut self) -> impl Iterator<Item = &mut f64> {
        self.layers.iter_mut().flat_map(|layer| layer.genes_mut())
    }

    /// Returns the output layer's activations in a freshly allocated vector.
    pub fn feed_forward(&self, inputs: &[f64]) -> Result<Vec<f64>> {
        if inputs.len() != self.n_inputs() {
            return Err(EvolutionError::InputSizeMismatch { expected: self.n_inputs(), actual: inputs.len() });
        }

        let mut activations = inputs.to_vec();
        for layer in &self.layers {
            activations = layer.activate(&activations);
        }
        Ok(activations)
    }

    /// With probability `rate` per gene, adds a perturbation drawn from
    /// `[-strength, strength]`.
    pub fn mutate<R: RngCore>(&mut self, rng: &mut R, rate: f64, strength: f64) {
        let between = Uniform::from(0.0..1.0);
        for gene in self.genes_mut() {
            let r = between.sample(rng);
            if r < rate {
                *gene += strength * rng.gen_range(-1.0..=1.0_f64);
            }
        }
    }
}

/// Per-gene uniform crossover: each gene comes from `parent_1` or `parent_2`
/// with equal probability.
pub fn cross_over<R: RngCore>(rng: &mut R, parent_1: &Network, parent_2: &Network) -> Result<Network> {
    if parent_1.layer_sizes != parent_2.layer_sizes {
        return Err(EvolutionError::TopologyMismatch {
            expected: parent_1.layer_sizes.clone(),
            actual: parent_2.layer_sizes.clone(),
        });
    }

    let between = Uniform::from(0.0..1.0);
    let mut child = parent_1.clone();
    for (gene, &other) in child.genes_mut().zip(parent_2.genes()) {
        if between.sample(rng) >= 0.5 {
            *gene = other;
        }
    }
    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng() -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(2)
    }

    fn network_sample_3_2_1() -> Network {
        Network::from_parts(
            &[3, 2, 1],
            vec![
                vec![vec![0.5, -0.2, 0.1], vec![-0.7, 0.3, 0.9]],
                vec![vec![1.2, -0.4]],
            ],
            vec![vec![0.1, -0.1], vec![0.05]],
        )
        .unwrap()
    }

    #[test]
    fn network_init() {
        let mut rng = rng();
        let network = Network::new_random(&mut rng, &[7, 5, 1]).unwrap();
        assert_eq!(network.layer_sizes(), &[7, 5, 1]);
        assert_eq!(network.layers().len(), 2);
        assert_eq!(network.layers()[0].rows().len(), 5);
        assert_eq!(network.layers()[0].n_inputs(), 7);
        assert_eq!(network.layers()[1].biases().len(), 1);
        assert_eq!(network.n_genes(), 7 * 5 + 5 + 5 + 1);
        assert_eq!(network.genes().count(), network.n_genes());
    }

    #[test]
    fn random_genes_in_range() {
        let mut rng = rng();
        for topology in [vec![1, 1], vec![7, 5, 1], vec![4, 8, 8, 3]] {
            let network = Network::new_random(&mut rng, &topology).unwrap();
            assert!(network.genes().all(|&g| (-1.0..1.0).contains(&g)));
        }
    }

    #[test]
    fn invalid_topology() {
        let mut rng = rng();
        assert!(matches!(Network::new_random(&mut rng, &[3]), Err(EvolutionError::InvalidTopology(_))));
        assert!(matches!(Network::new_random(&mut rng, &[]), Err(EvolutionError::InvalidTopology(_))));
        assert!(matches!(Network::new_random(&mut rng, &[3, 0, 1]), Err(EvolutionError::InvalidTopology(_))));
    }

    #[test]
    fn from_parts_rejects_bad_shapes() {
        let result = Network::from_parts(&[2, 1], vec![vec![vec![1.0]]], vec![vec![0.0]]);
        assert!(matches!(result, Err(EvolutionError::TopologyMismatch { .. })));

        let result = Network::from_parts(&[2, 1], vec![], vec![]);
        assert!(matches!(result, Err(EvolutionError::TopologyMismatch { .. })));
    }

    #[test]
    fn feed_forward_single_neuron() {
        let network = Network::from_parts(&[1, 1], vec![vec![vec![2.0]]], vec![vec![0.0]]).unwrap();
        let output = network.feed_forward(&[0.5]).unwrap();
        assert_eq!(output.len(), 1);
        assert_approx_eq!(output[0], 0.7615941559557649, 1e-15);
    }

    #[test]
    fn feed_forward() {
        let network = network_sample_3_2_1();
        let output = network.feed_forward(&[1.0, 0.5, -1.0]).unwrap();

        let h0 = (0.5 - 0.1 - 0.1 + 0.1_f64).tanh();
        let h1 = (-0.7 + 0.15 - 0.9 - 0.1_f64).tanh();
        let expected = (1.2 * h0 - 0.4 * h1 + 0.05).tanh();
        assert_approx_eq!(output[0], expected);
    }

    #[test]
    fn feed_forward_is_repeatable() {
        let mut rng = rng();
        let network = Network::new_random(&mut rng, &[7, 5, 1]).unwrap();
        let inputs = [0.1, -0.3, 0.5, 0.0, 0.9, -1.0, 0.25];
        let first = network.feed_forward(&inputs).unwrap();
        let second = network.feed_forward(&inputs).unwrap();
        assert_eq!(first[0].to_bits(), second[0].to_bits());
    }

    #[test]
    fn feed_forward_wrong_input_size() {
        let network = network_sample_3_2_1();
        let result = network.feed_forward(&[1.0, 0.5]);
        assert!(matches!(result, Err(EvolutionError::InputSizeMismatch { expected: 3, actual: 2 })));
    }

    #[test]
    fn clone_is_independent() {
        let mut rng = rng();
        let original = Network::new_random(&mut rng, &[3, 4, 2]).unwrap();
        let mut copy = original.clone();
        assert_eq!(copy, original);

        copy.mutate(&mut rng, 1.0, 0.5);
        assert_ne!(copy, original);
        let reference = original.clone();
        assert_eq!(original, reference);
    }

    #[test]
    fn cross_over_with_self() {
        let mut rng = rng();
        let network = Network::new_random(&mut rng, &[3, 4, 2]).unwrap();
        let child = cross_over(&mut rng, &network, &network).unwrap();
        assert_eq!(child, network);
    }

    #[test]
    fn cross_over_picks_parent_genes() {
        let mut rng = rng();
        let parent_1 = Network::new_random(&mut rng, &[10, 20, 10]).unwrap();
        let parent_2 = Network::new_random(&mut rng, &[10, 20, 10]).unwrap();
        let child = cross_over(&mut rng, &parent_1, &parent_2).unwrap();

        let mut from_1 = 0;
        let mut from_2 = 0;
        for ((&c, &a), &b) in child.genes().zip(parent_1.genes()).zip(parent_2.genes()) {
            assert!(c == a || c == b);
            if c == a {
                from_1 += 1;
            }
            if c == b {
                from_2 += 1;
            }
        }
        // 430 genes, both parents contribute
        assert!(from_1 > 100);
        assert!(from_2 > 100);
    }

    #[test]
    fn cross_over_topology_mismatch() {
        let mut rng = rng();
        let parent_1 = Network::new_random(&mut rng, &[3, 2, 1]).unwrap();
        let parent_2 = Network::new_random(&mut rng, &[3, 3, 1]).unwrap();
        let result = cross_over(&mut rng, &parent_1, &parent_2);
        assert!(matches!(result, Err(EvolutionError::TopologyMismatch { .. })));
    }

    #[test]
    fn mutate_zero_rate() {
        let mut rng = rng();
        let original = Network::new_random(&mut rng, &[5, 5, 2]).unwrap();
        let mut mutated = original.clone();
        mutated.mutate(&mut rng, 0.0, 100.0);
        assert_eq!(mutated, original);
    }

    #[test]
    fn mutate_full_rate_stays_within_strength() {
        let mut rng = rng();
        let original = Network::new_random(&mut rng, &[5, 5, 2]).unwrap();
        let mut mutated = original.clone();
        mutated.mutate(&mut rng, 1.0, 0.3);

        let mut changed = 0;
        for (&m, &o) in mutated.genes().zip(original.genes()) {
            assert!((m - o).abs() <= 0.3 + 1e-12);
            if m != o {
                changed += 1;
            }
        }
        assert!(changed > original.n_genes() / 2);
    }
}
