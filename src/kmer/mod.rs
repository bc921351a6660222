//! K-mer encoding, scanning, and the occurrence index.

pub mod auto_k;
pub mod index;
pub mod kmer;

pub use index::{KmerIndex, Occurrence};
pub use kmer::Strand;
