//! Spectral scale recommendation.
//!
//! The diffusion scale is derived from the extremes of the normalized
//! laplacian spectrum as in the graphwave heuristic : with e1 the smallest
//! eigenvalue above 0.001 and eN the largest one, t = sqrt(e1 * eN) and the
//! recommended scale is the midpoint of [-ln(0.95)/t , -ln(0.85)/t].
//!
//! The eigenvalue sample is estimated by power iteration on the sparse
//! laplacian, a full eigendecomposition is never required.


use anyhow::{anyhow, Result};

use ndarray::Array1;
use rand::distributions::Uniform;
use rand::Rng;

use crate::graph::{matvec, HsdGraph};

const ETA: f64 = 0.85;
const GAMMA: f64 = 0.95;

// power iteration parameters
const MAX_ITER: usize = 500;
const EPSIL: f64 = 1.0e-9;


/// recommended diffusion scale from a sample of laplacian eigenvalues.
/// The result is invariant to the ordering of the sample.
/// Fails if fewer than 2 eigenvalues are supplied or if the sample is
/// degenerate (t evaluates to zero or non finite).
pub fn recommend_scale(eigenvalues: &[f64]) -> Result<f64> {
    if eigenvalues.len() < 2 {
        return Err(anyhow!("recommend_scale needs at least 2 eigenvalues, got {}", eigenvalues.len()));
    }
    let mut sorted = eigenvalues.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let e1 = smallest_nontrivial(&sorted);
    let e_n = sorted[sorted.len() - 1];
    let (scale_min, scale_max) = scale_boundary(e1, e_n)?;
    let scale = (scale_min + scale_max) / 2.;
    log::debug!("recommend_scale : e1 = {:.3e}, eN = {:.3e}, scale = {:.3e}", e1, e_n, scale);
    Ok(scale)
} // end of recommend_scale


/// scale interval [scale_min, scale_max] associated to the spectrum extremes
pub fn scale_boundary(e1: f64, e_n: f64) -> Result<(f64, f64)> {
    let t = (e1 * e_n).sqrt();
    if !t.is_finite() || t <= 0. {
        return Err(anyhow!("degenerate eigenvalue sample : sqrt({:.3e} * {:.3e}) = {:.3e}", e1, e_n, t));
    }
    let scale_min = -GAMMA.ln() / t;
    let scale_max = -ETA.ln() / t;
    Ok((scale_min, scale_max))
} // end of scale_boundary


/// n_scales diffusion scales evenly spread over the recommended band.
/// Used by the multi scale pipeline.
pub fn scale_band(eigenvalues: &[f64], n_scales: usize) -> Result<Vec<f64>> {
    if n_scales < 1 {
        return Err(anyhow!("scale_band needs at least 1 scale, got {}", n_scales));
    }
    if eigenvalues.len() < 2 {
        return Err(anyhow!("scale_band needs at least 2 eigenvalues, got {}", eigenvalues.len()));
    }
    let mut sorted = eigenvalues.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let e1 = smallest_nontrivial(&sorted);
    let (scale_min, scale_max) = scale_boundary(e1, sorted[sorted.len() - 1])?;
    if n_scales == 1 {
        return Ok(vec![(scale_min + scale_max) / 2.]);
    }
    let step = (scale_max - scale_min) / (n_scales - 1) as f64;
    Ok((0..n_scales).map(|k| scale_min + k as f64 * step).collect())
} // end of scale_band


// smallest eigenvalue above the trivial zero threshold, falling back to the
// overall smallest when the whole sample sits below it.
// expects a sorted slice.
fn smallest_nontrivial(sorted: &[f64]) -> f64 {
    for e in sorted {
        if *e > 0.001 {
            return *e;
        }
    }
    sorted[0]
} // end of smallest_nontrivial


/// estimate a small eigenvalue sample of the normalized laplacian :
/// the trivial 0, the smallest non trivial eigenvalue and the largest one.
/// Largest eigenvalue by plain power iteration, smallest non trivial one by
/// power iteration on the spectrum-reversed operator lambda_max * I - L with
/// the known null vector D^(1/2) * 1 deflated at each step.
pub fn eigenvalue_sample(graph: &HsdGraph) -> Result<Vec<f64>> {
    let laplacian = graph.get_laplacian();
    let nb_nodes = graph.get_nb_nodes();
    if nb_nodes < 2 {
        return Err(anyhow!("eigenvalue_sample : graph has {} node(s), need at least 2", nb_nodes));
    }
    //
    let mut rng = rand::thread_rng();
    let unif = Uniform::new(-1., 1.);
    let random_start = |rng: &mut rand::rngs::ThreadRng| {
        Array1::<f64>::from_iter((0..nb_nodes).map(|_| rng.sample(unif)))
    };
    //
    // largest eigenvalue
    //
    let mut v = random_start(&mut rng);
    normalize(&mut v)?;
    let mut lambda_max = 0.;
    for iter in 0..MAX_ITER {
        let w = matvec(laplacian, &v);
        let rayleigh = v.dot(&w);
        if iter > 0 && (rayleigh - lambda_max).abs() < EPSIL * rayleigh.abs().max(1.) {
            lambda_max = rayleigh;
            log::trace!("lambda_max converged at iteration {}", iter);
            break;
        }
        lambda_max = rayleigh;
        v = w;
        normalize(&mut v)?;
    }
    if !lambda_max.is_finite() || lambda_max <= 0. {
        return Err(anyhow!("power iteration failed, lambda_max = {:.3e}", lambda_max));
    }
    //
    // null vector of the normalized laplacian, deflated below
    //
    let degrees = graph.get_degrees();
    let mut nullvec = degrees.mapv(f64::sqrt);
    let null_norm = nullvec.dot(&nullvec).sqrt();
    let has_nullvec = null_norm > 0.;
    if has_nullvec {
        nullvec /= null_norm;
    }
    //
    // smallest non trivial eigenvalue via lambda_max * I - L
    //
    let mut v = random_start(&mut rng);
    if has_nullvec {
        deflate(&mut v, &nullvec);
    }
    normalize(&mut v)?;
    let mut mu = 0.;
    for iter in 0..MAX_ITER {
        let mut w = &v * lambda_max - matvec(laplacian, &v);
        if has_nullvec {
            deflate(&mut w, &nullvec);
        }
        let rayleigh = v.dot(&w);
        if iter > 0 && (rayleigh - mu).abs() < EPSIL * rayleigh.abs().max(1.) {
            mu = rayleigh;
            log::trace!("mu converged at iteration {}", iter);
            break;
        }
        mu = rayleigh;
        let norm = w.dot(&w).sqrt();
        if norm <= EPSIL {
            // the reversed operator annihilates the deflated subspace,
            // every non trivial eigenvalue equals lambda_max
            mu = 0.;
            break;
        }
        v = w / norm;
    }
    let lambda_1 = (lambda_max - mu).max(0.);
    log::debug!("eigenvalue_sample : lambda_1 = {:.3e}, lambda_max = {:.3e}", lambda_1, lambda_max);
    //
    Ok(vec![0., lambda_1, lambda_max])
} // end of eigenvalue_sample


fn normalize(v: &mut Array1<f64>) -> Result<()> {
    let norm = v.dot(v).sqrt();
    if !norm.is_finite() || norm <= 0. {
        return Err(anyhow!("cannot normalize vector, norm = {:.3e}", norm));
    }
    *v /= norm;
    Ok(())
}

// remove the component along direction (direction must be unit norm)
fn deflate(v: &mut Array1<f64>, direction: &Array1<f64>) {
    let proj = v.dot(direction);
    v.scaled_add(-proj, direction);
}


//========================================================================


// end of mod tests
