//! To re-export the most useful items of the crate


pub use crate::graph::{HsdGraph, NodeIndexation};

pub use crate::spectrum::{eigenvalue_sample, recommend_scale, scale_boundary};

pub use crate::chebyshev::{chebyshev_coefficients, WaveletOperator};

pub use crate::signature::SignatureBuilder;

pub use crate::distance::{metrics::DistanceKind, cache::DistanceCache, DistanceEngine};

pub use crate::sparsify::{filter_distance_matrix, filter_edgelist};

pub use crate::model::{Hsd, HsdParams, MultiScaleMode, ScaleMode};

pub use crate::io::csv::csv_to_trimat;

pub use crate::io::edgelist::{read_distance_edgelist, save_distance_edgelist, save_edgelist};
