//! Persistence of distance edge lists.
//!
//! The distance file stores the upper triangle only, one line per pair :
//! "node_a node_b distance". Reloading fills both [i][j] and [j][i] of the
//! dense matrix.


use anyhow::{anyhow, Result};

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use ndarray::Array2;

use crate::graph::NodeIndexation;
use crate::sparsify::DistanceEdge;


/// dump the upper triangle of a distance matrix, row major
pub fn save_distance_edgelist(path: &Path, dist_mat: &Array2<f64>, indexation: &NodeIndexation) -> Result<()> {
    let (rows, cols) = dist_mat.dim();
    if rows != cols || rows != indexation.len() {
        return Err(anyhow!("save_distance_edgelist : matrix shape ({}, {}) does not match {} nodes",
                rows, cols, indexation.len()));
    }
    let file = OpenOptions::new().write(true).create(true).truncate(true).open(path)
        .map_err(|e| anyhow!("could not create file {:?} : {}", path.as_os_str(), e))?;
    let mut writer = BufWriter::new(file);
    for i in 0..rows {
        let node_i = indexation.get_index(i).unwrap();
        for j in (i + 1)..rows {
            let node_j = indexation.get_index(j).unwrap();
            writeln!(writer, "{} {} {}", node_i, node_j, dist_mat[[i, j]])?;
        }
    }
    writer.flush()?;
    log::info!("saved {} distance pairs to {:?}", rows * (rows - 1) / 2, path.as_os_str());
    Ok(())
} // end of save_distance_edgelist


/// dump a sparsified edge list, keeping its order
pub fn save_edgelist(path: &Path, edges: &[DistanceEdge]) -> Result<()> {
    let file = OpenOptions::new().write(true).create(true).truncate(true).open(path)
        .map_err(|e| anyhow!("could not create file {:?} : {}", path.as_os_str(), e))?;
    let mut writer = BufWriter::new(file);
    for (node_a, node_b, distance) in edges {
        writeln!(writer, "{} {} {}", node_a, node_b, distance)?;
    }
    writer.flush()?;
    log::info!("saved {} edges to {:?}", edges.len(), path.as_os_str());
    Ok(())
} // end of save_edgelist


/// reload a full distance matrix from an upper triangle file.
/// Unknown node identifiers are a fatal consistency error.
pub fn read_distance_edgelist(path: &Path, indexation: &NodeIndexation) -> Result<Array2<f64>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("could not read file {:?} : {}", path.as_os_str(), e))?;
    let nb_nodes = indexation.len();
    let mut dist_mat = Array2::<f64>::zeros((nb_nodes, nb_nodes));
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(anyhow!("bad distance line {} in {:?} : {}", line_no + 1, path.as_os_str(), line));
        }
        let rank_a = indexation.get_index_of(fields[0]).ok_or_else(|| {
            anyhow!("distance file {:?} references unknown node {}", path.as_os_str(), fields[0])
        })?;
        let rank_b = indexation.get_index_of(fields[1]).ok_or_else(|| {
            anyhow!("distance file {:?} references unknown node {}", path.as_os_str(), fields[1])
        })?;
        let distance = fields[2].parse::<f64>().map_err(|_| {
            anyhow!("bad distance value at line {} in {:?} : {}", line_no + 1, path.as_os_str(), fields[2])
        })?;
        dist_mat[[rank_a, rank_b]] = distance;
        dist_mat[[rank_b, rank_a]] = distance;
    }
    Ok(dist_mat)
} // end of read_distance_edgelist


//========================================================================


#[cfg(test)]
mod tests {

    use super::*;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn indexation(n: usize) -> NodeIndexation {
        let mut indexation = NodeIndexation::new();
        for i in 0..n {
            indexation.insert(i.to_string());
        }
        indexation
    }

    #[test]
    fn test_distance_roundtrip() {
        log_init_test();
        let n = 4;
        let indexation = indexation(n);
        let mut dist = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let d = (i + 2 * j) as f64 / 10.;
                dist[[i, j]] = d;
                dist[[j, i]] = d;
            }
        }
        let path = std::env::temp_dir().join("hsdist_test_distance_roundtrip.edgelist");
        save_distance_edgelist(&path, &dist, &indexation).unwrap();
        let reloaded = read_distance_edgelist(&path, &indexation).unwrap();
        assert_eq!(dist, reloaded);
        let _ = std::fs::remove_file(&path);
    } // end of test_distance_roundtrip

    #[test]
    fn test_reload_unknown_node() {
        log_init_test();
        let path = std::env::temp_dir().join("hsdist_test_distance_unknown.edgelist");
        std::fs::write(&path, "0 9 1.5\n").unwrap();
        assert!(read_distance_edgelist(&path, &indexation(3)).is_err());
        let _ = std::fs::remove_file(&path);
    } // end of test_reload_unknown_node

} // end of mod tests
