//! Statistical distances between diffusion signatures.
//!
//! The metric is a closed enum resolved once at configuration time into a
//! concrete function, never dispatched on strings in the pairwise loop.


use anyhow::{anyhow, Error};


/// distance function between two signatures of equal length
pub type DistanceFn = fn(&[f64], &[f64]) -> f64;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceKind {
    /// 1-d earth mover distance on the raw per hop histograms
    Wasserstein,
    /// hellinger distance on unit mass normalized histograms
    Hellinger,
} // end of enum DistanceKind


impl DistanceKind {
    /// resolve to the concrete distance function
    pub fn get_distance_fn(self) -> DistanceFn {
        match self {
            DistanceKind::Wasserstein => wasserstein,
            DistanceKind::Hellinger => hellinger,
        }
    }
} // end of impl DistanceKind


impl std::fmt::Display for DistanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceKind::Wasserstein => write!(f, "wasserstein"),
            DistanceKind::Hellinger => write!(f, "hellinger"),
        }
    }
} // end of impl Display


impl std::str::FromStr for DistanceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "wasserstein" => Ok(DistanceKind::Wasserstein),
            "hellinger" => Ok(DistanceKind::Hellinger),
            _ => Err(anyhow!("unknown metric {}, expected wasserstein or hellinger", s)),
        }
    }
} // end of impl FromStr


/// 1-d earth mover distance between two histograms on rank ordered bins :
/// the l1 distance of their prefix sums. Histograms are compared raw so the
/// distance is zero iff the two signatures are identical.
pub fn wasserstein(p: &[f64], q: &[f64]) -> f64 {
    debug_assert_eq!(p.len(), q.len());
    let mut cum_p = 0.;
    let mut cum_q = 0.;
    let mut dist = 0.;
    for k in 0..p.len() {
        cum_p += p[k];
        cum_q += q[k];
        dist += (cum_p - cum_q).abs();
    }
    dist
} // end of wasserstein


/// hellinger distance sqrt(1 - sum(sqrt(p_i * q_i))) with both histograms
/// normalized to unit mass beforehand. Bounded in [0, 1].
pub fn hellinger(p: &[f64], q: &[f64]) -> f64 {
    debug_assert_eq!(p.len(), q.len());
    let mass_p: f64 = p.iter().sum();
    let mass_q: f64 = q.iter().sum();
    let mut bhattacharyya = 0.;
    for k in 0..p.len() {
        bhattacharyya += (p[k] / mass_p * q[k] / mass_q).sqrt();
    }
    // clamp float residues so the metric stays in [0, 1]
    (1. - bhattacharyya.min(1.)).sqrt()
} // end of hellinger


//========================================================================


// end of mod tests
