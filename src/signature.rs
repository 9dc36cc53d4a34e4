//! Per node diffusion signatures.
//!
//! For each node a one hot signal is diffused through the wavelet operator
//! and the diffused mass is partitioned by breadth first hop distance from
//! the node, capped at the configured radius. The per hop partial sums form
//! the signature, a vector of length hop + 1 treated downstream as a
//! probability like histogram.
//!
//! In multi scale mode the per scale signatures are either concatenated or
//! summed coefficient wise, the two modes are exclusive.


use anyhow::{anyhow, Result};

use ndarray::Array1;

use crate::chebyshev::WaveletOperator;
use crate::graph::{HsdGraph, UNREACHED};
use crate::model::MultiScaleMode;


/// builds diffusion signatures for every node of a graph at a fixed hop radius
pub struct SignatureBuilder<'a> {
    graph: &'a HsdGraph,
    /// maximum breadth first radius, signature length is hop + 1
    hop: usize,
} // end of struct SignatureBuilder


impl<'a> SignatureBuilder<'a> {

    pub fn new(graph: &'a HsdGraph, hop: usize) -> Self {
        SignatureBuilder { graph, hop }
    }

    /// get hop radius
    pub fn get_hop(&self) -> usize {
        self.hop
    }

    /// signature of one node for the given wavelet operator.
    /// Deterministic : same graph, scale and hop always give the same vector.
    pub fn node_signature(&self, operator: &WaveletOperator, node: usize) -> Array1<f64> {
        let nb_nodes = self.graph.get_nb_nodes();
        assert!(node < nb_nodes);
        let mut one_hot = Array1::<f64>::zeros(nb_nodes);
        one_hot[node] = 1.;
        let diffused = operator.diffuse(&one_hot);
        let hops = self.graph.hop_distances(node, self.hop);
        let mut signature = Array1::<f64>::zeros(self.hop + 1);
        for (other, hop) in hops.iter().enumerate() {
            if *hop != UNREACHED {
                // chebyshev truncation can leave small negative residues
                signature[*hop] += diffused[other].max(0.);
            }
        }
        signature
    } // end of node_signature


    /// signatures of all nodes at one scale
    pub fn signatures(&self, operator: &WaveletOperator) -> Vec<Array1<f64>> {
        let nb_nodes = self.graph.get_nb_nodes();
        log::debug!("computing signatures for {} nodes, scale = {:.3e}, hop = {}",
                nb_nodes, operator.get_scale(), self.hop);
        (0..nb_nodes).map(|node| self.node_signature(operator, node)).collect()
    } // end of signatures


    /// multi scale signatures, aggregated according to mode :
    /// - Concat : per scale signatures laid side by side, length n_scales * (hop + 1)
    /// - CoeffSum : per scale signatures summed, length hop + 1
    pub fn multi_scale_signatures(&self, scales: &[f64], order: usize, mode: MultiScaleMode)
            -> Result<Vec<Array1<f64>>> {
        if scales.is_empty() {
            return Err(anyhow!("multi_scale_signatures : empty scale list"));
        }
        let nb_nodes = self.graph.get_nb_nodes();
        let width = self.hop + 1;
        let mut aggregated: Vec<Array1<f64>> = match mode {
            MultiScaleMode::Concat => {
                (0..nb_nodes).map(|_| Array1::<f64>::zeros(width * scales.len())).collect()
            }
            MultiScaleMode::CoeffSum => {
                (0..nb_nodes).map(|_| Array1::<f64>::zeros(width)).collect()
            }
        };
        for (scale_idx, scale) in scales.iter().enumerate() {
            let operator = WaveletOperator::new(self.graph, *scale, order)?;
            for node in 0..nb_nodes {
                let signature = self.node_signature(&operator, node);
                match mode {
                    MultiScaleMode::Concat => {
                        let start = scale_idx * width;
                        for k in 0..width {
                            aggregated[node][start + k] = signature[k];
                        }
                    }
                    MultiScaleMode::CoeffSum => {
                        aggregated[node] += &signature;
                    }
                }
            }
        }
        Ok(aggregated)
    } // end of multi_scale_signatures

} // end of impl SignatureBuilder


//========================================================================


#[cfg(test)]
mod tests {

    use super::*;
    use crate::graph::NodeIndexation;
    use sprs::TriMatI;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // cycle 0 - 1 - 2 - 3 - 0
    fn cycle4() -> HsdGraph {
        let mut indexation = NodeIndexation::new();
        for i in 0..4 {
            indexation.insert(i.to_string());
        }
        let mut trimat = TriMatI::<f64, usize>::new((4, 4));
        for (i, j) in [(0usize, 1usize), (1, 2), (2, 3), (3, 0)] {
            trimat.add_triplet(i, j, 1.);
            trimat.add_triplet(j, i, 1.);
        }
        HsdGraph::from_trimat(trimat, indexation).unwrap()
    }

    #[test]
    fn test_signature_shape_and_mass() {
        log_init_test();
        let graph = cycle4();
        let builder = SignatureBuilder::new(&graph, 1);
        let operator = WaveletOperator::new(&graph, 1.0, 30).unwrap();
        let signature = builder.node_signature(&operator, 0);
        assert_eq!(signature.len(), 2);
        // diffused mass is non negative and positive in total
        assert!(signature.iter().all(|x| *x >= 0.));
        assert!(signature.sum() > 0.);
    } // end of test_signature_shape_and_mass

    #[test]
    fn test_signature_deterministic() {
        log_init_test();
        let graph = cycle4();
        let builder = SignatureBuilder::new(&graph, 2);
        let operator = WaveletOperator::new(&graph, 0.8, 30).unwrap();
        let s1 = builder.node_signature(&operator, 1);
        let s2 = builder.node_signature(&operator, 1);
        for (a, b) in s1.iter().zip(s2.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    } // end of test_signature_deterministic

    #[test]
    fn test_multi_scale_modes() {
        log_init_test();
        let graph = cycle4();
        let builder = SignatureBuilder::new(&graph, 1);
        let scales = [0.5, 1.0, 2.0];
        let concat = builder
            .multi_scale_signatures(&scales, 20, MultiScaleMode::Concat)
            .unwrap();
        assert_eq!(concat.len(), 4);
        assert_eq!(concat[0].len(), 3 * 2);
        let summed = builder
            .multi_scale_signatures(&scales, 20, MultiScaleMode::CoeffSum)
            .unwrap();
        assert_eq!(summed[0].len(), 2);
        // coefficient sum equals the sum of the concatenated blocks
        let block_sum: f64 = concat[0].iter().sum();
        assert!((block_sum - summed[0].sum()).abs() < 1.0e-12);
    } // end of test_multi_scale_modes

} // end of mod tests
