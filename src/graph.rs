//! Graph representation used throughout the crate.
//!
//! The graph is stored as a symmetric compressed sparse row adjacency matrix
//! together with the node indexation built once at load time.
//! Node identifiers (as found in the datafile) are mapped to their rank in an
//! IndexSet, and every array of the pipeline is indexed by that rank.
//! The normalized laplacian L = I - D^(-1/2) A D^(-1/2) is built once and
//! shared by the wavelet operator and the spectrum estimation.


use anyhow::{anyhow, Result};

use std::collections::VecDeque;

use indexmap::IndexSet;
use ndarray::Array1;
use sprs::{CsMatI, TriMatI};

/// association of an original node identifier to its rank.
/// given a node id we get its rank with IndexSet::get_index_of,
/// given a rank we get the original id with IndexSet::get_index
pub type NodeIndexation = IndexSet<String>;

/// hop distance sentinel for nodes beyond the explored radius
pub const UNREACHED: usize = usize::MAX;


/// An undirected weighted graph with its node indexation and normalized laplacian.
pub struct HsdGraph {
    /// symmetric adjacency in csr form
    adjacency: CsMatI<f64, usize>,
    /// normalized laplacian, same dimension as adjacency
    laplacian: CsMatI<f64, usize>,
    /// node id <-> rank bijection
    indexation: NodeIndexation,
} // end of struct HsdGraph


impl HsdGraph {

    /// build from a triplet matrix (as returned by [crate::io::csv::csv_to_trimat])
    /// and the indexation collected while reading the datafile.
    /// The triplet matrix must contain both (i,j) and (j,i) entries.
    pub fn from_trimat(trimat: TriMatI<f64, usize>, indexation: NodeIndexation) -> Result<Self> {
        let shape = trimat.shape();
        if shape.0 != shape.1 {
            return Err(anyhow!("adjacency matrix must be square, got shape {:?}", shape));
        }
        if shape.0 != indexation.len() {
            return Err(anyhow!("adjacency dimension {} does not match indexation size {}",
                    shape.0, indexation.len()));
        }
        let adjacency = trimat.to_csr();
        let laplacian = normalized_laplacian(&adjacency)?;
        Ok(HsdGraph { adjacency, laplacian, indexation })
    } // end of from_trimat


    /// get number of nodes
    pub fn get_nb_nodes(&self) -> usize {
        self.adjacency.rows()
    }

    /// get the adjacency matrix
    pub fn get_adjacency(&self) -> &CsMatI<f64, usize> {
        &self.adjacency
    }

    /// get the normalized laplacian
    pub fn get_laplacian(&self) -> &CsMatI<f64, usize> {
        &self.laplacian
    }

    /// get the node indexation
    pub fn get_indexation(&self) -> &NodeIndexation {
        &self.indexation
    }

    /// get rank of a node id
    pub fn get_node_rank(&self, node_id: &str) -> Option<usize> {
        self.indexation.get_index_of(node_id)
    }

    /// get node id given its rank
    pub fn get_node_id(&self, rank: usize) -> Option<&String> {
        self.indexation.get_index(rank)
    }

    /// weighted degree of each node
    pub fn get_degrees(&self) -> Array1<f64> {
        let nb_nodes = self.get_nb_nodes();
        let mut degrees = Array1::<f64>::zeros(nb_nodes);
        for (row, row_vec) in self.adjacency.outer_iterator().enumerate() {
            let mut d = 0.;
            for (_, w) in row_vec.iter() {
                d += *w;
            }
            degrees[row] = d;
        }
        degrees
    } // end of get_degrees


    /// breadth first hop distance from source, capped at max_hop.
    /// returns a vector of size nb_nodes filled with the hop of each node,
    /// [UNREACHED] for nodes farther than max_hop (or disconnected).
    pub fn hop_distances(&self, source: usize, max_hop: usize) -> Vec<usize> {
        let nb_nodes = self.get_nb_nodes();
        assert!(source < nb_nodes);
        let mut hops = vec![UNREACHED; nb_nodes];
        hops[source] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(source);
        while let Some(node) = queue.pop_front() {
            let hop = hops[node];
            if hop >= max_hop {
                continue;
            }
            if let Some(row_vec) = self.adjacency.outer_view(node) {
                for (neighbour, _) in row_vec.iter() {
                    if hops[neighbour] == UNREACHED {
                        hops[neighbour] = hop + 1;
                        queue.push_back(neighbour);
                    }
                }
            }
        }
        hops
    } // end of hop_distances

} // end of impl HsdGraph


// normalized laplacian L = I - D^(-1/2) A D^(-1/2).
// isolated nodes get a bare diagonal 1.
fn normalized_laplacian(adjacency: &CsMatI<f64, usize>) -> Result<CsMatI<f64, usize>> {
    let nb_nodes = adjacency.rows();
    let mut degrees = Array1::<f64>::zeros(nb_nodes);
    for (row, row_vec) in adjacency.outer_iterator().enumerate() {
        let mut d = 0.;
        for (_, w) in row_vec.iter() {
            if *w < 0. {
                return Err(anyhow!("negative edge weight {} at row {}", w, row));
            }
            d += *w;
        }
        degrees[row] = d;
    }
    let mut trimat = TriMatI::<f64, usize>::new((nb_nodes, nb_nodes));
    for i in 0..nb_nodes {
        trimat.add_triplet(i, i, 1.);
    }
    for (row, row_vec) in adjacency.outer_iterator().enumerate() {
        for (col, w) in row_vec.iter() {
            if row == col {
                continue;
            }
            let dprod = degrees[row] * degrees[col];
            if dprod > 0. {
                trimat.add_triplet(row, col, -w / dprod.sqrt());
            }
        }
    }
    Ok(trimat.to_csr())
} // end of normalized_laplacian


/// sparse matrix * dense vector product, used by the wavelet operator
/// and the spectrum estimation
pub(crate) fn matvec(mat: &CsMatI<f64, usize>, v: &Array1<f64>) -> Array1<f64> {
    assert_eq!(mat.cols(), v.len());
    let mut out = Array1::<f64>::zeros(mat.rows());
    for (row, row_vec) in mat.outer_iterator().enumerate() {
        let mut s = 0.;
        for (col, w) in row_vec.iter() {
            s += w * v[col];
        }
        out[row] = s;
    }
    out
} // end of matvec


//========================================================================


// end of mod tests
