//! Read-only export of a network's parameters, for rendering and saving.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{EvolutionError, Result};
use super::network::Network;

/// Owned copy of a network's topology, weights and biases.
///
/// Shapes follow [`Network::from_parts`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub layer_sizes: Vec<usize>,
    pub weights: Vec<Vec<Vec<f64>>>,
    pub biases: Vec<Vec<f64>>,
}

impl From<&Network> for NetworkSnapshot {
    fn from(network: &Network) -> Self {
        let weights = network
            .layers()
            .iter()
            .map(|layer| layer.rows().map(|row| row.to_vec()).collect())
            .collect();
        let biases = network.layers().iter().map(|layer| layer.biases().to_vec()).collect();

        NetworkSnapshot {
            layer_sizes: network.layer_sizes().to_vec(),
            weights,
            biases,
        }
    }
}

impl TryFrom<NetworkSnapshot> for Network {
    type Error = EvolutionError;

    fn try_from(snapshot: NetworkSnapshot) -> Result<Network> {
        Network::from_parts(&snapshot.layer_sizes, snapshot.weights, snapshot.biases)
    }
}

impl NetworkSnapshot {
    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn from_ron_str(text: &str) -> Result<NetworkSnapshot> {
        Ok(ron::from_str(text)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<NetworkSnapshot> {
        NetworkSnapshot::from_ron_str(&std::fs::read_to_string(path)?)
    }

    /// Mermaid flowchart, inputs on the left. Every weight becomes an edge
    /// labelled with its value and classed `pos` or `neg` by sign.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph LR\n");
        for (layer_index, &size) in self.layer_sizes.iter().enumerate() {
            for node_index in 0..size {
                out.push_str(&format!("L{layer_index}N{node_index}((L{layer_index}:{node_index}))\n"));
            }
        }

        let mut edge_classes = Vec::new();
        for (layer_index, matrix) in self.weights.iter().enumerate() {
            for (out_index, row) in matrix.iter().enumerate() {
                for (in_index, weight) in row.iter().enumerate() {
                    out.push_str(&format!(
                        "L{layer_index}N{in_index} -->|{weight:.4}| L{}N{out_index}\n",
                        layer_index + 1
                    ));
                    edge_classes.push(*weight >= 0.0);
                }
            }
        }

        for (edge_index, positive) in edge_classes.into_iter().enumerate() {
            let colour = if positive { "green" } else { "red" };
            out.push_str(&format!("linkStyle {edge_index} stroke:{colour}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn snapshot_sample() -> NetworkSnapshot {
        NetworkSnapshot {
            layer_sizes: vec![2, 1],
            weights: vec![vec![vec![0.5, -0.25]]],
            biases: vec![vec![0.1]],
        }
    }

    #[test]
    fn snapshot_matches_network() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let network = Network::new_random(&mut rng, &[3, 4, 2]).unwrap();
        let snapshot = NetworkSnapshot::from(&network);

        assert_eq!(snapshot.layer_sizes, vec![3, 4, 2]);
        assert_eq!(snapshot.weights[0].len(), 4);
        assert_eq!(snapshot.weights[0][0].len(), 3);
        assert_eq!(snapshot.biases[1].len(), 2);
        assert_eq!(snapshot.weights[1][1][3], network.layers()[1].rows().nth(1).unwrap()[3]);

        let restored = Network::try_from(snapshot).unwrap();
        assert_eq!(restored, network);
    }

    #[test]
    fn ron_restores_snapshot() {
        let snapshot = snapshot_sample();
        let text = snapshot.to_ron().unwrap();
        assert_eq!(NetworkSnapshot::from_ron_str(&text).unwrap(), snapshot);
    }

    #[test]
    fn malformed_snapshot_is_rejected() {
        let snapshot = NetworkSnapshot { biases: vec![vec![0.1, 0.2]], ..snapshot_sample() };
        assert!(matches!(Network::try_from(snapshot), Err(EvolutionError::TopologyMismatch { .. })));
    }

    #[test]
    fn mermaid_graph() {
        let graph = snapshot_sample().to_mermaid();
        assert!(graph.starts_with("graph LR\n"));
        assert!(graph.contains("L0N0 -->|0.5000| L1N0"));
        assert!(graph.contains("L0N1 -->|-0.2500| L1N0"));
        assert!(graph.contains("linkStyle 0 stroke:green"));
        assert!(graph.contains("linkStyle 1 stroke:red"));
    }
}
