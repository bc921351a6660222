//! Local assembler for small peak regions.
//!
//! Pipeline: indexed read store -> optional k-mer error correction ->
//! overlap graph -> unitig compaction -> optional graph cleaning ->
//! unitig output. Designed for many independent small regions: fast and
//! memory-light per invocation, no state across invocations.

pub mod config;
pub mod correct;
pub mod error;
pub mod graph;
pub mod io;
pub mod kmer;
pub mod pipeline;
pub mod read;
