//! Construct a graph from an edge list datafile.
//!
//! Expected lines are "node_a node_b" or "node_a node_b weight" with a tab,
//! comma or space delimiter, lines beginning with # or % are comments.
//! The weight defaults to 1.0 when absent. The graph is undirected so both
//! (i, j) and (j, i) triplets are emitted.
//! The node indexation is built once here and reused by every downstream
//! array indexed by node rank.


use anyhow::{anyhow, Result};

use log::*;

use std::fs::OpenOptions;
use std::path::Path;

use csv::ReaderBuilder;

use sprs::TriMatI;

use crate::graph::NodeIndexation;


/// read an edge list file into a triplet matrix and the node indexation
pub fn csv_to_trimat(filepath: &Path, delim: u8) -> Result<(TriMatI<f64, usize>, NodeIndexation)> {
    //
    let fileres = OpenOptions::new().read(true).open(filepath);
    if fileres.is_err() {
        log::error!("csv_to_trimat : could not open file {:?}", filepath.as_os_str());
        return Err(anyhow!("csv_to_trimat could not open file {:?}", filepath.as_os_str()));
    }
    let file = fileres.unwrap();
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .delimiter(delim)
        .from_reader(file);
    //
    let mut indexation = NodeIndexation::new();
    let mut edges = Vec::<(usize, usize, f64)>::new();
    let mut nb_record = 0;
    for result in rdr.records() {
        let record = result?;
        nb_record += 1;
        if log::log_enabled!(Level::Trace) {
            log::trace!("{:?}", record);
        }
        if record.len() == 0 {
            continue;
        }
        let field_a = record.get(0).unwrap().trim();
        if field_a.is_empty() || field_a.starts_with('%') {
            continue;
        }
        if record.len() < 2 {
            return Err(anyhow!("record {} in {:?} has {} field(s), expected 2 or 3",
                    nb_record, filepath.as_os_str(), record.len()));
        }
        let field_b = record.get(1).unwrap().trim();
        let weight = match record.get(2) {
            Some(w) if !w.trim().is_empty() => w.trim().parse::<f64>().map_err(|_| {
                anyhow!("record {} in {:?} : cannot parse weight {}", nb_record, filepath.as_os_str(), w)
            })?,
            _ => 1.0,
        };
        if weight < 0. {
            return Err(anyhow!("record {} in {:?} : negative weight {}", nb_record, filepath.as_os_str(), weight));
        }
        let (rank_a, _) = indexation.insert_full(field_a.to_string());
        let (rank_b, _) = indexation.insert_full(field_b.to_string());
        edges.push((rank_a, rank_b, weight));
    }
    let nb_nodes = indexation.len();
    if nb_nodes == 0 {
        return Err(anyhow!("no edge read from {:?}", filepath.as_os_str()));
    }
    log::info!("csv_to_trimat : read {} records, {} nodes from {:?}", nb_record, nb_nodes, filepath.as_os_str());
    //
    let mut trimat = TriMatI::<f64, usize>::new((nb_nodes, nb_nodes));
    for (rank_a, rank_b, weight) in edges {
        if rank_a == rank_b {
            continue;
        }
        trimat.add_triplet(rank_a, rank_b, weight);
        trimat.add_triplet(rank_b, rank_a, weight);
    }
    Ok((trimat, indexation))
} // end of csv_to_trimat


//========================================================================


#[cfg(test)]
mod tests {

    use super::*;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_load_weighted_edgelist() {
        log_init_test();
        let path = std::env::temp_dir().join("hsdist_test_load_weighted.edgelist");
        std::fs::write(&path, "# a comment\n0 1 2.0\n1 2\n2 0 0.5\n").unwrap();
        let (trimat, indexation) = csv_to_trimat(&path, b' ').unwrap();
        assert_eq!(indexation.len(), 3);
        let csr: sprs::CsMatI<f64, usize> = trimat.to_csr();
        assert_eq!(*csr.get(0, 1).unwrap(), 2.0);
        assert_eq!(*csr.get(1, 0).unwrap(), 2.0);
        // default weight
        assert_eq!(*csr.get(1, 2).unwrap(), 1.0);
        assert_eq!(*csr.get(2, 0).unwrap(), 0.5);
        let _ = std::fs::remove_file(&path);
    } // end of test_load_weighted_edgelist

    #[test]
    fn test_load_bad_record() {
        log_init_test();
        let path = std::env::temp_dir().join("hsdist_test_load_bad.edgelist");
        std::fs::write(&path, "0 1 not_a_weight\n").unwrap();
        assert!(csv_to_trimat(&path, b' ').is_err());
        let _ = std::fs::remove_file(&path);
    } // end of test_load_bad_record

    #[test]
    fn test_indexation_order() {
        log_init_test();
        // ranks follow first appearance order in the file
        let path = std::env::temp_dir().join("hsdist_test_load_order.edgelist");
        std::fs::write(&path, "b a\nc b\n").unwrap();
        let (_, indexation) = csv_to_trimat(&path, b' ').unwrap();
        assert_eq!(indexation.get_index_of("b"), Some(0));
        assert_eq!(indexation.get_index_of("a"), Some(1));
        assert_eq!(indexation.get_index_of("c"), Some(2));
        let _ = std::fs::remove_file(&path);
    } // end of test_indexation_order

} // end of mod tests
