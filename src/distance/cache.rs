//! Cache of previously computed pairwise distances.
//!
//! A cache holds the upper triangle pairs reloaded from a distance edge list
//! file. The engine consults it per pair and falls back to computation for
//! any missing entry, so a partial file is tolerated.
//! Hit and miss counts are kept for instrumentation and tests.


use anyhow::{anyhow, Result};

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::graph::NodeIndexation;


pub struct DistanceCache {
    /// keys are (min rank, max rank)
    pairs: HashMap<(usize, usize), f64, ahash::RandomState>,
    ///
    hits: AtomicUsize,
    ///
    misses: AtomicUsize,
} // end of struct DistanceCache


impl DistanceCache {

    pub fn new() -> Self {
        DistanceCache {
            pairs: HashMap::default(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// reload a cache from a distance edge list file with lines
    /// "node_a node_b distance". A node id absent from the indexation is a
    /// fatal consistency error.
    pub fn from_file(path: &Path, indexation: &NodeIndexation) -> Result<Self> {
        let file = OpenOptions::new().read(true).open(path).map_err(|e| {
            anyhow!("DistanceCache could not open file {:?} : {}", path.as_os_str(), e)
        })?;
        let reader = BufReader::new(file);
        let mut cache = DistanceCache::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                return Err(anyhow!("bad distance line {} in {:?} : {}", line_no + 1, path.as_os_str(), line));
            }
            let rank_a = indexation.get_index_of(fields[0]).ok_or_else(|| {
                anyhow!("cache file {:?} references unknown node {}", path.as_os_str(), fields[0])
            })?;
            let rank_b = indexation.get_index_of(fields[1]).ok_or_else(|| {
                anyhow!("cache file {:?} references unknown node {}", path.as_os_str(), fields[1])
            })?;
            let distance = fields[2].parse::<f64>().map_err(|_| {
                anyhow!("bad distance value at line {} in {:?} : {}", line_no + 1, path.as_os_str(), fields[2])
            })?;
            cache.insert(rank_a, rank_b, distance);
        }
        log::info!("reloaded {} cached distances from {:?}", cache.len(), path.as_os_str());
        Ok(cache)
    } // end of from_file


    /// record a distance for a pair, keyed on the unordered pair
    pub fn insert(&mut self, i: usize, j: usize, distance: f64) {
        self.pairs.insert((i.min(j), i.max(j)), distance);
    }

    /// lookup a pair, counting hit or miss
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        match self.pairs.get(&(i.min(j), i.max(j))) {
            Some(d) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(*d)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    } // end of get

    /// number of cached pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    ///
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// number of lookups served from the cache
    pub fn get_hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// number of lookups that fell back to computation
    pub fn get_misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

} // end of impl DistanceCache


impl Default for DistanceCache {
    fn default() -> Self {
        DistanceCache::new()
    }
}


//========================================================================


#[cfg(test)]
mod tests {

    use super::*;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_cache_counters() {
        log_init_test();
        let mut cache = DistanceCache::new();
        cache.insert(2, 0, 0.5);
        // lookup is unordered
        assert_eq!(cache.get(0, 2), Some(0.5));
        assert_eq!(cache.get(2, 0), Some(0.5));
        assert_eq!(cache.get(0, 1), None);
        assert_eq!(cache.get_hits(), 2);
        assert_eq!(cache.get_misses(), 1);
    } // end of test_cache_counters

    #[test]
    fn test_cache_unknown_node() {
        log_init_test();
        let mut indexation = NodeIndexation::new();
        indexation.insert(String::from("0"));
        indexation.insert(String::from("1"));
        let path = std::env::temp_dir().join("hsdist_test_cache_unknown.edgelist");
        std::fs::write(&path, "0 7 0.25\n").unwrap();
        let res = DistanceCache::from_file(&path, &indexation);
        assert!(res.is_err());
        let _ = std::fs::remove_file(&path);
    } // end of test_cache_unknown_node

    #[test]
    fn test_cache_reload() {
        log_init_test();
        let mut indexation = NodeIndexation::new();
        for i in 0..3 {
            indexation.insert(i.to_string());
        }
        let path = std::env::temp_dir().join("hsdist_test_cache_reload.edgelist");
        std::fs::write(&path, "0 1 0.25\n1 2 0.75\n").unwrap();
        let cache = DistanceCache::from_file(&path, &indexation).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1, 0), Some(0.25));
        assert_eq!(cache.get(2, 1), Some(0.75));
        assert_eq!(cache.get(0, 2), None);
        let _ = std::fs::remove_file(&path);
    } // end of test_cache_reload

} // end of mod tests
