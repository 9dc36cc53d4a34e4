//! Graph and distance file io


pub mod csv;

pub mod edgelist;
