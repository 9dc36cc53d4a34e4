//! an executable computing structural distances from an edge list file
//! example usage:
//! hsd --csv "mkarate.edgelist" --metric hellinger --hop 2 --scale auto --workers 4 --ratio 0.2
//! hsd --csv "bio_dmela.edgelist" --metric wasserstein --multiscale yes --nscales 50 --reuse yes --cachedir ../distance
//!
//! The dense distance matrix upper triangle is persisted when --cachedir is
//! given, the sparsified edge list is written to --output.


use anyhow::anyhow;
use clap::{arg, Arg, ArgMatches, Command};

use std::path::{Path, PathBuf};
use std::str::FromStr;

use std::time::SystemTime;
use cpu_time::ProcessTime;

use hsdist::prelude::*;
use hsdist::distance::metrics::DistanceKind;


fn parse_params(matches: &ArgMatches) -> Result<HsdParams, anyhow::Error> {
    log::debug!("in parse_params");
    // get scale, a float or "auto"
    let scale = match matches.value_of("scale") {
        Some("auto") | None => ScaleMode::Auto,
        Some(str) => {
            let res = str.parse::<f64>();
            if res.is_ok() {
                ScaleMode::Fixed(res.unwrap())
            }
            else {
                return Err(anyhow!("error parsing scale, expected a float or auto"));
            }
        }
    }; // end match

    // get hop radius
    let hop = match matches.value_of("hop") {
        Some(str) => {
            let res = str.parse::<usize>();
            if res.is_ok() {
                res.unwrap()
            }
            else {
                return Err(anyhow!("error parsing hop"));
            }
        }
        _ => 2,
    }; // end match

    // get metric
    let metric = match matches.value_of("metric") {
        Some(str) => DistanceKind::from_str(str)?,
        _ => DistanceKind::Wasserstein,
    }; // end match

    // get chebyshev order
    let order = match matches.value_of("order") {
        Some(str) => {
            let res = str.parse::<usize>();
            if res.is_ok() {
                res.unwrap()
            }
            else {
                return Err(anyhow!("error parsing order"));
            }
        }
        _ => 30,
    }; // end match

    // get multi scale mode
    let multi_scales = match matches.value_of("multiscale") {
        Some(str) => match str.to_lowercase().as_str() {
            "yes" => true,
            "no" => false,
            _ => {
                return Err(anyhow!("multiscale should be yes/no"));
            }
        },
        _ => false,
    }; // end match

    // get number of scales
    let n_scales = match matches.value_of("nscales") {
        Some(str) => {
            let res = str.parse::<usize>();
            if res.is_ok() {
                res.unwrap()
            }
            else {
                return Err(anyhow!("error parsing nscales"));
            }
        }
        _ => 200,
    }; // end match

    // get signature aggregation
    let aggregation = match matches.value_of("aggregation") {
        Some("concat") => Some(MultiScaleMode::Concat),
        Some("coeffsum") => Some(MultiScaleMode::CoeffSum),
        Some("none") | None => None,
        Some(other) => {
            return Err(anyhow!("unknown aggregation {}, expected concat, coeffsum or none", other));
        }
    }; // end match

    // get workers
    let n_workers = match matches.value_of("workers") {
        Some(str) => {
            let res = str.parse::<usize>();
            if res.is_ok() {
                res.unwrap()
            }
            else {
                return Err(anyhow!("error parsing workers"));
            }
        }
        _ => num_cpus::get(),
    }; // end match

    // get reuse flag
    let reuse = match matches.value_of("reuse") {
        Some(str) => match str.to_lowercase().as_str() {
            "yes" => true,
            "no" => false,
            _ => {
                return Err(anyhow!("reuse should be yes/no"));
            }
        },
        _ => false,
    }; // end match

    // get sparsify ratio
    let sparsify_ratio = match matches.value_of("ratio") {
        Some(str) => {
            let res = str.parse::<f64>();
            if res.is_ok() {
                res.unwrap()
            }
            else {
                return Err(anyhow!("error parsing ratio"));
            }
        }
        _ => 0.2,
    }; // end match

    // get cache directory
    let cache_dir = matches.value_of("cachedir").map(PathBuf::from);

    let params = HsdParams {
        scale,
        hop,
        metric,
        order,
        multi_scales,
        n_scales,
        aggregation,
        n_workers,
        reuse,
        sparsify_ratio,
        cache_dir,
    };
    params.validate()?;
    return Ok(params);
} // end of parse_params


pub fn main() {
    //
    let _ = env_logger::builder().try_init();
    log::info!("logger initialized");
    //
    let matches = Command::new("hsd")
        .arg_required_else_help(true)
        .arg(Arg::new("csvfile")
            .long("csv")
            .takes_value(true)
            .required(true)
            .help("expecting an edge list file"))
        .args(&[
            arg!(--scale <scale> "diffusion scale, a float or auto").required(false),
            arg!(--hop <hop> "breadth first radius of signatures").required(false),
            arg!(--metric <metric> "wasserstein or hellinger").required(false),
            arg!(--order <order> "chebyshev expansion order").required(false),
            arg!(--multiscale <multiscale> "yes or no").required(false),
            arg!(--nscales <nscales> "number of scales in multi scale mode").required(false),
            arg!(--aggregation <aggregation> "concat, coeffsum or none").required(false),
            arg!(--workers <workers> "worker pool size").required(false),
            arg!(--reuse <reuse> "yes to reload cached distance files").required(false),
            arg!(--ratio <ratio> "fraction of pairs kept by sparsification").required(false),
            arg!(--cachedir <cachedir> "directory for distance files").required(false),
            arg!(--output <output> "sparsified edge list output file").required(false),
        ])
        .get_matches();

    // decode args

    let fname = match matches.value_of("csvfile") {
        Some(str) => String::from(str),
        _ => {
            log::error!("parsing of csv file argument failed");
            std::process::exit(1);
        }
    };

    let params = match parse_params(&matches) {
        Ok(params) => params,
        Err(err) => {
            log::error!("error : {:?}", err);
            std::process::exit(1);
        }
    };
    log::info!("params : {:?}", params);

    //
    // load the graph, trying the usual delimiters
    //
    let path = Path::new(&fname);
    let delimiters = [b'\t', b',', b' '];
    let mut res: anyhow::Result<(sprs::TriMatI<f64, usize>, NodeIndexation)> = Err(anyhow!("not initialized"));
    for delim in delimiters {
        log::info!("hsd trying to read {:?} with delimiter {}", path, delim);
        res = csv_to_trimat(path, delim);
        if res.is_err() {
            log::error!("hsd failed in csv_to_trimat, reading {:?}, trying delimiter {} ", path, delim);
        }
        else {
            break;
        }
    }
    if res.is_err() {
        log::error!("error : {:?}", res.as_ref().err());
        log::error!("hsd failed in csv_to_trimat, reading {:?}", path);
        std::process::exit(1);
    }
    let (trimat, indexation) = res.unwrap();
    //
    let graph_name = path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| String::from("graph"));
    let graph = match HsdGraph::from_trimat(trimat, indexation) {
        Ok(graph) => graph,
        Err(err) => {
            log::error!("error : {:?}", err);
            std::process::exit(1);
        }
    };
    log::info!("graph {} : {} nodes", graph_name, graph.get_nb_nodes());

    //
    // run the pipeline
    //
    let cpu_start = ProcessTime::now();
    let sys_start = SystemTime::now();
    let hsd = match Hsd::new(graph, &graph_name, params) {
        Ok(hsd) => hsd,
        Err(err) => {
            log::error!("error : {:?}", err);
            std::process::exit(1);
        }
    };
    let dist_mat = match hsd.compute_distance() {
        Ok(dist_mat) => dist_mat,
        Err(err) => {
            log::error!("error : {:?}", err);
            log::error!("hsd distance computation failed");
            std::process::exit(1);
        }
    };
    let edges = match hsd.sparsify(&dist_mat) {
        Ok(edges) => edges,
        Err(err) => {
            log::error!("error : {:?}", err);
            log::error!("hsd sparsification failed");
            std::process::exit(1);
        }
    };
    println!(" hsd sys time(s) {:.2e} cpu time(s) {:.2e}",
            sys_start.elapsed().unwrap().as_secs_f64(), cpu_start.elapsed().as_secs_f64());

    //
    // persist the sparsified edge list
    //
    let output = match matches.value_of("output") {
        Some(str) => PathBuf::from(str),
        _ => PathBuf::from(format!("HSD_{}_sparsified.edgelist", graph_name)),
    };
    if let Err(err) = save_edgelist(&output, &edges) {
        log::error!("error : {:?}", err);
        std::process::exit(1);
    }
    log::info!("kept {} edges, written to {:?}", edges.len(), output);
    //
} // end of main
