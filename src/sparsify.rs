//! Sparsification of the dense distance matrix.
//!
//! All unordered pairs are enumerated row major over the upper triangle,
//! stable sorted by decreasing distance and truncated to the ratio bound.
//! The pipeline keeps the *largest* distances as the important edges; the
//! retained list is later reconsumed as a dissimilarity graph by the
//! downstream embedding steps.


use anyhow::{anyhow, Result};

use ndarray::Array2;

use crate::graph::NodeIndexation;


/// an edge retained by sparsification : (node id, node id, distance)
pub type DistanceEdge = (String, String, f64);


/// keep at most (ratio * len) + 1 edges with the largest distances.
/// The sort is stable so ties keep their enumeration order.
pub fn filter_edgelist(mut edgelist: Vec<DistanceEdge>, ratio: f64) -> Result<Vec<DistanceEdge>> {
    if !(ratio > 0. && ratio <= 1.) {
        return Err(anyhow!("sparsify ratio must be in (0, 1], got {}", ratio));
    }
    edgelist.sort_by(|a, b| b.2.total_cmp(&a.2));
    let keep = (edgelist.len() as f64 * ratio) as usize + 1;
    edgelist.truncate(keep);
    Ok(edgelist)
} // end of filter_edgelist


/// enumerate the upper triangle of the distance matrix as an edge list and
/// filter it down to the ratio bound.
pub fn filter_distance_matrix(dist_mat: &Array2<f64>, indexation: &NodeIndexation, ratio: f64)
        -> Result<Vec<DistanceEdge>> {
    let (rows, cols) = dist_mat.dim();
    if rows != cols {
        return Err(anyhow!("distance matrix must be square, got ({}, {})", rows, cols));
    }
    if rows != indexation.len() {
        return Err(anyhow!("distance matrix dimension {} does not match node count {}",
                rows, indexation.len()));
    }
    let mut edgelist = Vec::<DistanceEdge>::with_capacity(rows * (rows - 1) / 2);
    for i in 0..rows {
        // indexation covers every rank below its len
        let node_i = indexation.get_index(i).unwrap();
        for j in (i + 1)..rows {
            let node_j = indexation.get_index(j).unwrap();
            edgelist.push((node_i.clone(), node_j.clone(), dist_mat[[i, j]]));
        }
    }
    log::debug!("sparsifying {} pairs at ratio {}", edgelist.len(), ratio);
    filter_edgelist(edgelist, ratio)
} // end of filter_distance_matrix


//========================================================================


// end of mod tests
