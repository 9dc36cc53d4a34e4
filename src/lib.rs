//! lib target
//!
//! Structural distance between graph nodes through heat wavelet diffusion
//! signatures. The pipeline is : graph -> spectrum scale recommendation ->
//! chebyshev wavelet approximation -> per hop diffusion signatures ->
//! parallel pairwise distance (wasserstein or hellinger) -> sparsified edge list.


use env_logger::Builder;

#[macro_use]
extern crate lazy_static;

lazy_static! {
    static ref LOG: u64 = {
        let res = init_log();
        res
    };
}

// install a logger facility
fn init_log() -> u64 {
    Builder::from_default_env().init();
    println!("\n ************** initializing logger *****************\n");
    return 1;
}

pub mod io;

pub mod graph;

pub mod spectrum;

pub mod chebyshev;

pub mod signature;

pub mod distance;

pub mod sparsify;

pub mod model;

pub mod prelude;
