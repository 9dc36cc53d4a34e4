//! Orchestration of the structural distance pipeline.
//!
//! The [Hsd] model owns the graph and an immutable configuration and drives :
//! scale resolution (auto from the spectrum or fixed), signature
//! construction, the parallel distance pass (single or multi scale, with
//! optional reuse of cached per scale distance files) and sparsification.


use anyhow::{anyhow, Context, Result};

use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::distance::cache::DistanceCache;
use crate::distance::metrics::DistanceKind;
use crate::distance::DistanceEngine;
use crate::graph::HsdGraph;
use crate::io::edgelist::save_distance_edgelist;
use crate::signature::SignatureBuilder;
use crate::sparsify::{filter_distance_matrix, DistanceEdge};
use crate::spectrum::{eigenvalue_sample, recommend_scale, scale_band};


/// how the diffusion scale is chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleMode {
    /// derive the scale from the laplacian spectrum extremes
    Auto,
    /// user supplied scale
    Fixed(f64),
} // end of enum ScaleMode


/// aggregation of per scale signatures in multi scale mode.
/// When no aggregation is selected the engine instead accumulates per scale
/// distance matrices, which is the mode interacting with the reuse cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiScaleMode {
    /// per scale signatures laid side by side
    Concat,
    /// per scale signatures summed coefficient wise
    CoeffSum,
} // end of enum MultiScaleMode


/// immutable configuration of a run, validated before any computation
#[derive(Debug, Clone)]
pub struct HsdParams {
    ///
    pub scale: ScaleMode,
    /// breadth first radius of the signatures
    pub hop: usize,
    ///
    pub metric: DistanceKind,
    /// chebyshev expansion order
    pub order: usize,
    /// multi scale mode if on
    pub multi_scales: bool,
    /// number of scales in multi scale mode
    pub n_scales: usize,
    /// signature aggregation in multi scale mode, None means per scale
    /// distance accumulation
    pub aggregation: Option<MultiScaleMode>,
    /// worker pool size of the distance pass
    pub n_workers: usize,
    /// read per scale distance files back when present
    pub reuse: bool,
    /// fraction of pairs kept by sparsification, in (0, 1]
    pub sparsify_ratio: f64,
    /// directory for distance files, enables persistence and reuse
    pub cache_dir: Option<PathBuf>,
} // end of struct HsdParams


impl HsdParams {

    /// configuration errors fail here, before any computation starts
    pub fn validate(&self) -> Result<()> {
        if let ScaleMode::Fixed(scale) = self.scale {
            if !scale.is_finite() || scale <= 0. {
                return Err(anyhow!("scale must be positive and finite, got {}", scale));
            }
        }
        if self.order < 1 {
            return Err(anyhow!("chebyshev order must be >= 1, got {}", self.order));
        }
        if self.n_workers < 1 {
            return Err(anyhow!("n_workers must be >= 1, got {}", self.n_workers));
        }
        if !(self.sparsify_ratio > 0. && self.sparsify_ratio <= 1.) {
            return Err(anyhow!("sparsify ratio must be in (0, 1], got {}", self.sparsify_ratio));
        }
        if self.multi_scales && self.n_scales < 1 {
            return Err(anyhow!("multi scale mode needs n_scales >= 1, got {}", self.n_scales));
        }
        Ok(())
    } // end of validate

} // end of impl HsdParams


impl Default for HsdParams {
    fn default() -> Self {
        HsdParams {
            scale: ScaleMode::Auto,
            hop: 2,
            metric: DistanceKind::Wasserstein,
            order: 30,
            multi_scales: false,
            n_scales: 1,
            aggregation: None,
            n_workers: num_cpus::get(),
            reuse: false,
            sparsify_ratio: 0.2,
            cache_dir: None,
        }
    }
} // end of impl Default


/// the structural distance model
pub struct Hsd {
    ///
    graph: HsdGraph,
    /// used to name persisted distance files
    graph_name: String,
    ///
    params: HsdParams,
} // end of struct Hsd


impl Hsd {

    pub fn new(graph: HsdGraph, graph_name: &str, params: HsdParams) -> Result<Self> {
        params.validate()?;
        Ok(Hsd { graph, graph_name: graph_name.to_string(), params })
    } // end of new


    /// get the graph
    pub fn get_graph(&self) -> &HsdGraph {
        &self.graph
    }

    /// get the configuration
    pub fn get_params(&self) -> &HsdParams {
        &self.params
    }


    /// the effective single diffusion scale : the fixed value, or the
    /// spectrum recommendation in auto mode
    pub fn resolve_scale(&self) -> Result<f64> {
        match self.params.scale {
            ScaleMode::Fixed(scale) => Ok(scale),
            ScaleMode::Auto => {
                let sample = eigenvalue_sample(&self.graph)?;
                let scale = recommend_scale(&sample)?;
                log::info!("auto scale for graph {} : {:.4e}", self.graph_name, scale);
                Ok(scale)
            }
        }
    } // end of resolve_scale


    // distance file path for one scale
    fn distance_file_path(&self, dir: &Path, scale_tag: &str) -> PathBuf {
        dir.join(format!("HSD_{}_{}_{}_hop{}.edgelist",
                self.graph_name, self.params.metric, scale_tag, self.params.hop))
    }

    // one engine pass over a signature set, honoring a reloaded cache.
    // errors are tagged with the active scale and hop so a failure in a multi
    // scale run identifies the offending pass.
    fn distance_pass(&self, signatures: &[ndarray::Array1<f64>], scale_label: &str,
            cache_path: Option<&Path>) -> Result<Array2<f64>> {
        let pass_context = || format!("distance pass at scale {}, hop {}", scale_label, self.params.hop);
        let cache = match cache_path {
            Some(path) if self.params.reuse && path.exists() => {
                Some(DistanceCache::from_file(path, self.graph.get_indexation()).with_context(pass_context)?)
            }
            _ => None,
        };
        let engine = DistanceEngine::new(signatures, self.params.metric, self.params.n_workers)?;
        let dist_mat = engine.compute(cache.as_ref()).with_context(pass_context)?;
        if let Some(cache) = &cache {
            log::info!("distance cache : {} hits, {} misses", cache.get_hits(), cache.get_misses());
        }
        if let Some(path) = cache_path {
            save_distance_edgelist(path, &dist_mat, self.graph.get_indexation())?;
        }
        Ok(dist_mat)
    } // end of distance_pass


    /// compute the dense structural distance matrix according to the
    /// configuration : single scale, multi scale with signature aggregation,
    /// or multi scale with per scale distance accumulation
    pub fn compute_distance(&self) -> Result<Array2<f64>> {
        let builder = SignatureBuilder::new(&self.graph, self.params.hop);
        if !self.params.multi_scales {
            let scale = self.resolve_scale()?;
            let operator = crate::chebyshev::WaveletOperator::new(&self.graph, scale, self.params.order)?;
            let signatures = builder.signatures(&operator);
            let cache_path = self.params.cache_dir.as_ref()
                .map(|dir| self.distance_file_path(dir, &format!("scale{:.4}", scale)));
            return self.distance_pass(&signatures, &format!("{:.4e}", scale), cache_path.as_deref());
        }
        // multi scale : scales spread over the recommended band
        let sample = eigenvalue_sample(&self.graph)?;
        let scales = scale_band(&sample, self.params.n_scales)?;
        log::info!("multi scale run on graph {} : {} scales in [{:.4e}, {:.4e}]",
                self.graph_name, scales.len(), scales[0], scales[scales.len() - 1]);
        match self.params.aggregation {
            Some(mode) => {
                // signatures aggregated across scales, one distance pass
                let signatures = builder.multi_scale_signatures(&scales, self.params.order, mode)?;
                let label = format!("band [{:.4e}, {:.4e}]", scales[0], scales[scales.len() - 1]);
                self.distance_pass(&signatures, &label, None)
            }
            None => {
                // per scale distance contributions accumulated, each scale
                // with its own cache file
                let nb_nodes = self.graph.get_nb_nodes();
                let mut accumulated = Array2::<f64>::zeros((nb_nodes, nb_nodes));
                for (scale_idx, scale) in scales.iter().enumerate() {
                    let operator = crate::chebyshev::WaveletOperator::new(&self.graph, *scale, self.params.order)?;
                    let signatures = builder.signatures(&operator);
                    let cache_path = self.params.cache_dir.as_ref()
                        .map(|dir| self.distance_file_path(dir, &format!("multi{}", scale_idx)));
                    let dist_mat = self.distance_pass(&signatures, &format!("{:.4e}", scale), cache_path.as_deref())?;
                    accumulated += &dist_mat;
                }
                Ok(accumulated)
            }
        }
    } // end of compute_distance


    /// filter the dense matrix down to the configured ratio of strongest edges
    pub fn sparsify(&self, dist_mat: &Array2<f64>) -> Result<Vec<DistanceEdge>> {
        filter_distance_matrix(dist_mat, self.graph.get_indexation(), self.params.sparsify_ratio)
    } // end of sparsify

} // end of impl Hsd


//========================================================================


#[cfg(test)]
mod tests {

    use super::*;
    use crate::graph::NodeIndexation;
    use sprs::TriMatI;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn graph_from_edges(n: usize, edges: &[(usize, usize)]) -> HsdGraph {
        let mut indexation = NodeIndexation::new();
        for i in 0..n {
            indexation.insert(i.to_string());
        }
        let mut trimat = TriMatI::<f64, usize>::new((n, n));
        for (i, j) in edges {
            trimat.add_triplet(*i, *j, 1.);
            trimat.add_triplet(*j, *i, 1.);
        }
        HsdGraph::from_trimat(trimat, indexation).unwrap()
    }

    fn cycle4() -> HsdGraph {
        graph_from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)])
    }

    // star : node 0 is the hub
    fn star5() -> HsdGraph {
        graph_from_edges(5, &[(0, 1), (0, 2), (0, 3), (0, 4)])
    }

    #[test]
    fn test_params_validation() {
        log_init_test();
        let mut params = HsdParams::default();
        params.n_workers = 0;
        assert!(params.validate().is_err());
        let mut params = HsdParams::default();
        params.sparsify_ratio = 1.5;
        assert!(params.validate().is_err());
        let mut params = HsdParams::default();
        params.scale = ScaleMode::Fixed(-2.);
        assert!(params.validate().is_err());
        let mut params = HsdParams::default();
        params.multi_scales = true;
        params.n_scales = 0;
        assert!(params.validate().is_err());
    } // end of test_params_validation

    #[test]
    fn test_cycle4_hellinger_end_to_end() {
        log_init_test();
        // 4 node cycle, unit weights, scale 1, hop 1, hellinger, 2 workers
        let params = HsdParams {
            scale: ScaleMode::Fixed(1.0),
            hop: 1,
            metric: DistanceKind::Hellinger,
            n_workers: 2,
            ..Default::default()
        };
        let hsd = Hsd::new(cycle4(), "cycle4", params).unwrap();
        let dist = hsd.compute_distance().unwrap();
        assert_eq!(dist.dim(), (4, 4));
        for i in 0..4 {
            assert_eq!(dist[[i, i]], 0.);
            for j in 0..4 {
                assert_eq!(dist[[i, j]], dist[[j, i]]);
                assert!(dist[[i, j]] >= 0.);
            }
        }
        // opposite corners have identical 1 hop neighbourhoods
        assert!(dist[[0, 2]] < 1.0e-6, "d(0,2) = {}", dist[[0, 2]]);
        assert!(dist[[1, 3]] < 1.0e-6, "d(1,3) = {}", dist[[1, 3]]);
    } // end of test_cycle4_hellinger_end_to_end

    #[test]
    fn test_star_separates_hub_from_leaves() {
        log_init_test();
        let params = HsdParams {
            scale: ScaleMode::Fixed(0.8),
            hop: 1,
            metric: DistanceKind::Wasserstein,
            n_workers: 2,
            ..Default::default()
        };
        let hsd = Hsd::new(star5(), "star5", params).unwrap();
        let dist = hsd.compute_distance().unwrap();
        // hub and leaf play different structural roles
        assert!(dist[[0, 1]] > 1.0e-6, "d(hub, leaf) = {}", dist[[0, 1]]);
        // leaves are exchangeable
        assert!(dist[[1, 2]] < 1.0e-9, "d(leaf, leaf) = {}", dist[[1, 2]]);
    } // end of test_star_separates_hub_from_leaves

    #[test]
    fn test_auto_scale_runs() {
        log_init_test();
        let params = HsdParams {
            scale: ScaleMode::Auto,
            hop: 2,
            metric: DistanceKind::Hellinger,
            order: 20,
            n_workers: 2,
            ..Default::default()
        };
        let hsd = Hsd::new(star5(), "star5", params).unwrap();
        let scale = hsd.resolve_scale().unwrap();
        assert!(scale.is_finite() && scale > 0.);
        let dist = hsd.compute_distance().unwrap();
        assert_eq!(dist.dim(), (5, 5));
    } // end of test_auto_scale_runs

    #[test]
    fn test_multi_scale_reuse_roundtrip() {
        log_init_test();
        let cache_dir = std::env::temp_dir().join("hsdist_test_multi_reuse");
        let _ = std::fs::remove_dir_all(&cache_dir);
        std::fs::create_dir_all(&cache_dir).unwrap();
        let params = HsdParams {
            scale: ScaleMode::Auto,
            hop: 1,
            metric: DistanceKind::Wasserstein,
            order: 20,
            multi_scales: true,
            n_scales: 3,
            aggregation: None,
            n_workers: 2,
            reuse: true,
            sparsify_ratio: 0.5,
            cache_dir: Some(cache_dir.clone()),
        };
        let hsd = Hsd::new(star5(), "star5", params).unwrap();
        // first run computes and persists per scale files
        let d1 = hsd.compute_distance().unwrap();
        // second run reloads every pair from the persisted files
        let d2 = hsd.compute_distance().unwrap();
        assert_eq!(d1, d2);
        let _ = std::fs::remove_dir_all(&cache_dir);
    } // end of test_multi_scale_reuse_roundtrip

    #[test]
    fn test_error_names_scale_and_hop() {
        log_init_test();
        // a cached negative distance makes the engine fail, the surfaced
        // error must identify the node pair and the active scale and hop
        let cache_dir = std::env::temp_dir().join("hsdist_test_error_context");
        let _ = std::fs::remove_dir_all(&cache_dir);
        std::fs::create_dir_all(&cache_dir).unwrap();
        let cache_file = cache_dir.join("HSD_star5_wasserstein_scale1.0000_hop1.edgelist");
        std::fs::write(&cache_file, "0 1 -5.0\n").unwrap();
        let params = HsdParams {
            scale: ScaleMode::Fixed(1.0),
            hop: 1,
            metric: DistanceKind::Wasserstein,
            n_workers: 2,
            reuse: true,
            cache_dir: Some(cache_dir.clone()),
            ..Default::default()
        };
        let hsd = Hsd::new(star5(), "star5", params).unwrap();
        let res = hsd.compute_distance();
        assert!(res.is_err());
        let msg = format!("{:?}", res.err().unwrap());
        assert!(msg.contains("scale 1.0000e0"), "got : {}", msg);
        assert!(msg.contains("hop 1"), "got : {}", msg);
        assert!(msg.contains("nodes 0 and 1"), "got : {}", msg);
        let _ = std::fs::remove_dir_all(&cache_dir);
    } // end of test_error_names_scale_and_hop

    #[test]
    fn test_multi_scale_aggregation_modes() {
        log_init_test();
        for mode in [MultiScaleMode::Concat, MultiScaleMode::CoeffSum] {
            let params = HsdParams {
                scale: ScaleMode::Auto,
                hop: 1,
                metric: DistanceKind::Hellinger,
                order: 20,
                multi_scales: true,
                n_scales: 3,
                aggregation: Some(mode),
                n_workers: 2,
                ..Default::default()
            };
            let hsd = Hsd::new(star5(), "star5", params).unwrap();
            let dist = hsd.compute_distance().unwrap();
            assert_eq!(dist.dim(), (5, 5));
            for i in 0..5 {
                assert_eq!(dist[[i, i]], 0.);
            }
        }
    } // end of test_multi_scale_aggregation_modes

    #[test]
    fn test_sparsify_pipeline() {
        log_init_test();
        let params = HsdParams {
            scale: ScaleMode::Fixed(1.0),
            hop: 1,
            metric: DistanceKind::Wasserstein,
            n_workers: 2,
            sparsify_ratio: 0.3,
            ..Default::default()
        };
        let hsd = Hsd::new(star5(), "star5", params).unwrap();
        let dist = hsd.compute_distance().unwrap();
        let edges = hsd.sparsify(&dist).unwrap();
        let n_pairs = 5 * 4 / 2;
        assert!(edges.len() <= (n_pairs as f64 * 0.3) as usize + 1);
        assert!(!edges.is_empty());
    } // end of test_sparsify_pipeline

} // end of mod tests
