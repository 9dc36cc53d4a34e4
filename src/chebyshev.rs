//! Chebyshev approximation of the heat kernel wavelet.
//!
//! The filter exp(-scale * lambda) with lambda in the normalized laplacian
//! spectrum [0, 2] is approximated by a chebyshev expansion of the first
//! kind sampled at the chebyshev nodes x_i = cos((2i-1) pi / (2 order)),
//! i = 1..order, with the weight function exp(-scale * (x + 1)) so that the
//! shift x = lambda - 1 maps the spectrum onto [-1, 1].
//! Applying the expansion to a graph signal then only needs repeated sparse
//! products against the shifted laplacian L - I, no eigendecomposition.


use anyhow::{anyhow, Result};

use ndarray::Array1;
use sprs::CsMatI;

use crate::graph::{matvec, HsdGraph};


/// chebyshev expansion coefficients of the heat kernel at a given scale.
/// Pure function of (scale, order), deterministic, safe to memoize per scale.
pub fn chebyshev_coefficients(scale: f64, order: usize) -> Result<Vec<f64>> {
    if order < 1 {
        return Err(anyhow!("chebyshev order must be >= 1, got {}", order));
    }
    if !scale.is_finite() || scale <= 0. {
        return Err(anyhow!("scale must be positive and finite, got {}", scale));
    }
    // chebyshev nodes
    let xx: Vec<f64> = (1..=order)
        .map(|i| ((2 * i - 1) as f64 / (2 * order) as f64 * std::f64::consts::PI).cos())
        .collect();
    // basis rows T_0 .. T_{order-1} evaluated at the nodes
    let mut basis = Vec::<Vec<f64>>::with_capacity(order);
    basis.push(vec![1.; order]);
    if order > 1 {
        basis.push(xx.clone());
    }
    for _ in 2..order {
        let last = &basis[basis.len() - 1];
        let before = &basis[basis.len() - 2];
        let row: Vec<f64> = (0..order).map(|j| 2. * xx[j] * last[j] - before[j]).collect();
        basis.push(row);
    }
    // weight each row by the filter sampled at the nodes and sum
    let f: Vec<f64> = xx.iter().map(|x| (-scale * (x + 1.)).exp()).collect();
    let mut coeffs: Vec<f64> = basis
        .iter()
        .map(|row| 2. / order as f64 * row.iter().zip(f.iter()).map(|(t, w)| t * w).sum::<f64>())
        .collect();
    // standard DC term correction
    coeffs[0] /= 2.;
    Ok(coeffs)
} // end of chebyshev_coefficients


/// The wavelet operator for one scale : the chebyshev coefficients bound to
/// the graph laplacian. Immutable once built.
pub struct WaveletOperator<'a> {
    /// normalized laplacian of the graph
    laplacian: &'a CsMatI<f64, usize>,
    ///
    scale: f64,
    /// expansion coefficients, length = order
    coeffs: Vec<f64>,
} // end of struct WaveletOperator


impl<'a> WaveletOperator<'a> {

    pub fn new(graph: &'a HsdGraph, scale: f64, order: usize) -> Result<Self> {
        let coeffs = chebyshev_coefficients(scale, order)?;
        Ok(WaveletOperator { laplacian: graph.get_laplacian(), scale, coeffs })
    }

    /// get scale
    pub fn get_scale(&self) -> f64 {
        self.scale
    }

    /// get expansion order
    pub fn get_order(&self) -> usize {
        self.coeffs.len()
    }

    // product of the shifted laplacian L - I with v
    fn shifted_matvec(&self, v: &Array1<f64>) -> Array1<f64> {
        matvec(self.laplacian, v) - v
    }

    /// diffuse a signal through the approximated heat kernel :
    /// sum_k c_k T_k(L - I) signal, by the chebyshev recursion on vectors.
    pub fn diffuse(&self, signal: &Array1<f64>) -> Array1<f64> {
        let order = self.coeffs.len();
        // T_0 term
        let mut t_before = signal.clone();
        let mut diffused = &t_before * self.coeffs[0];
        if order == 1 {
            return diffused;
        }
        // T_1 term
        let mut t_last = self.shifted_matvec(signal);
        diffused.scaled_add(self.coeffs[1], &t_last);
        // recursion T_k = 2 (L - I) T_{k-1} - T_{k-2}
        for k in 2..order {
            let t_next = 2. * self.shifted_matvec(&t_last) - &t_before;
            diffused.scaled_add(self.coeffs[k], &t_next);
            t_before = t_last;
            t_last = t_next;
        }
        diffused
    } // end of diffuse

} // end of impl WaveletOperator


//========================================================================


#[cfg(test)]
mod tests {

    use super::*;
    use crate::graph::NodeIndexation;
    use sprs::TriMatI;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn triangle() -> HsdGraph {
        let mut indexation = NodeIndexation::new();
        for i in 0..3 {
            indexation.insert(i.to_string());
        }
        let mut trimat = TriMatI::<f64, usize>::new((3, 3));
        for (i, j) in [(0usize, 1usize), (1, 2), (2, 0)] {
            trimat.add_triplet(i, j, 1.);
            trimat.add_triplet(j, i, 1.);
        }
        HsdGraph::from_trimat(trimat, indexation).unwrap()
    }

    #[test]
    fn test_coefficients_deterministic() {
        log_init_test();
        let c1 = chebyshev_coefficients(0.7, 30).unwrap();
        let c2 = chebyshev_coefficients(0.7, 30).unwrap();
        assert_eq!(c1.len(), 30);
        for (a, b) in c1.iter().zip(c2.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    } // end of test_coefficients_deterministic

    #[test]
    fn test_coefficients_order_one() {
        log_init_test();
        // order 1 : single node x = cos(pi/2) ~ 0, c0 = f(x) ~ exp(-scale)
        let scale = 0.5;
        let coeffs = chebyshev_coefficients(scale, 1).unwrap();
        assert_eq!(coeffs.len(), 1);
        assert!((coeffs[0] - (-scale).exp()).abs() < 1.0e-12);
    } // end of test_coefficients_order_one

    #[test]
    fn test_coefficients_bad_args() {
        log_init_test();
        assert!(chebyshev_coefficients(1., 0).is_err());
        assert!(chebyshev_coefficients(0., 10).is_err());
        assert!(chebyshev_coefficients(-1., 10).is_err());
    } // end of test_coefficients_bad_args

    #[test]
    fn test_diffuse_against_exact_kernel() {
        log_init_test();
        // triangle graph : normalized laplacian spectrum {0, 3/2, 3/2}.
        // exact heat kernel of a one hot signal : exp(-s L) e_i
        //   = 1/3 + (e_i - 1/3) * exp(-1.5 s) componentwise in the eigenbasis
        let graph = triangle();
        let scale = 1.0;
        let op = WaveletOperator::new(&graph, scale, 50).unwrap();
        let mut one_hot = ndarray::Array1::<f64>::zeros(3);
        one_hot[0] = 1.;
        let diffused = op.diffuse(&one_hot);
        let decay = (-1.5f64 * scale).exp();
        let expected_self = 1. / 3. + 2. / 3. * decay;
        let expected_other = 1. / 3. - 1. / 3. * decay;
        assert!((diffused[0] - expected_self).abs() < 1.0e-8, "got {}", diffused[0]);
        assert!((diffused[1] - expected_other).abs() < 1.0e-8, "got {}", diffused[1]);
        assert!((diffused[2] - expected_other).abs() < 1.0e-8, "got {}", diffused[2]);
    } // end of test_diffuse_against_exact_kernel

} // end of mod tests
