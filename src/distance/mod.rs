//! Pairwise structural distance computation.
//!
//! The node set is split into near equal contiguous batches, one per worker.
//! Each worker handles every pair (i, j > i) for its batch and writes the
//! result at both [i][j] and [j][i], so the matrix is symmetric by
//! construction and never recomputed. Rows are held behind a RwLock, each
//! cell is written by exactly one worker exactly once and the final matrix is
//! independent of scheduling order.
//! Any worker error aborts the whole pass, no partial matrix is returned.


pub mod cache;
pub mod metrics;
pub mod partition;

use anyhow::{anyhow, Result};

use ndarray::{Array1, Array2};

use parking_lot::RwLock;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::sync::Arc;

use std::time::SystemTime;
use cpu_time::ProcessTime;

use self::cache::DistanceCache;
use self::metrics::DistanceKind;
use self::partition::partition;


pub type MatrixRow = Arc<RwLock<Array1<f64>>>;


/// computes the dense symmetric distance matrix between node signatures
pub struct DistanceEngine<'a> {
    /// one signature per node, all of the same length
    signatures: &'a [Array1<f64>],
    ///
    kind: DistanceKind,
    /// worker pool size
    n_workers: usize,
} // end of struct DistanceEngine


impl<'a> DistanceEngine<'a> {

    pub fn new(signatures: &'a [Array1<f64>], kind: DistanceKind, n_workers: usize) -> Result<Self> {
        if n_workers < 1 {
            return Err(anyhow!("DistanceEngine needs at least one worker, got {}", n_workers));
        }
        if signatures.is_empty() {
            return Err(anyhow!("DistanceEngine got an empty signature set"));
        }
        Ok(DistanceEngine { signatures, kind, n_workers })
    } // end of new


    // signature set consistency : equal lengths, finite positive mass.
    // Drifted wavelet or hop configuration is detected here, never truncated.
    fn check_signatures(&self) -> Result<()> {
        let width = self.signatures[0].len();
        for (node, signature) in self.signatures.iter().enumerate() {
            if signature.len() != width {
                return Err(anyhow!(
                    "signature length mismatch : node {} has length {}, node 0 has length {}",
                    node, signature.len(), width));
            }
            let mass = signature.sum();
            if !mass.is_finite() || mass <= 0. {
                return Err(anyhow!("signature of node {} has non positive mass {:.3e}", node, mass));
            }
        }
        Ok(())
    } // end of check_signatures


    /// compute the full distance matrix.
    /// If a cache is given, each pair is first looked up in it and only the
    /// missing pairs are computed; cached values are taken as is.
    pub fn compute(&self, cache: Option<&DistanceCache>) -> Result<Array2<f64>> {
        self.check_signatures()?;
        let nb_nodes = self.signatures.len();
        let distance_fn = self.kind.get_distance_fn();
        //
        let rows: Vec<MatrixRow> = (0..nb_nodes)
            .map(|_| Arc::new(RwLock::new(Array1::<f64>::zeros(nb_nodes))))
            .collect();
        let partitions = partition(nb_nodes, self.n_workers);
        log::debug!("distance pass : {} nodes, {} batches, metric {:?}",
                nb_nodes, partitions.len(), self.kind);
        //
        let cpu_start = ProcessTime::now();
        let sys_start = SystemTime::now();
        let res: Result<Vec<()>> = partitions
            .into_par_iter()
            .map(|range| {
                for i in range {
                    let sig_i = self.signatures[i].as_slice().unwrap();
                    for j in (i + 1)..nb_nodes {
                        let d = match cache.and_then(|c| c.get(i, j)) {
                            Some(d) => d,
                            None => distance_fn(sig_i, self.signatures[j].as_slice().unwrap()),
                        };
                        if !d.is_finite() || d < 0. {
                            return Err(anyhow!("invalid distance {:.3e} between nodes {} and {}", d, i, j));
                        }
                        rows[i].write()[j] = d;
                        rows[j].write()[i] = d;
                    }
                }
                Ok(())
            })
            .collect();
        res?;
        log::info!(" distance pass sys time(s) {:.2e} cpu time(s) {:.2e}",
                sys_start.elapsed().unwrap().as_secs_f64(), cpu_start.elapsed().as_secs_f64());
        //
        let mut dist_mat = Array2::<f64>::zeros((nb_nodes, nb_nodes));
        for i in 0..nb_nodes {
            let row_read = rows[i].read();
            for j in 0..nb_nodes {
                dist_mat[[i, j]] = row_read[j];
            }
        }
        Ok(dist_mat)
    } // end of compute

} // end of impl DistanceEngine


//========================================================================


// end of mod tests
